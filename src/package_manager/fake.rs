//! 内存中的假 pacman，用于测试
//!
//! 记录每一次调用，并按真实 pacman 的输出格式回答查询，
//! 安装 / 卸载会修改内部状态，因此可以验证多轮收敛。

use super::error::{PacmanError, Result};
use super::executor::{CommandRunner, Invocation};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone)]
struct FakePackage {
    version: String,
    foreign: bool,
    explicit: bool,
    required: bool,
}

#[derive(Debug, Default)]
pub struct FakePacman {
    packages: RefCell<BTreeMap<String, FakePackage>>,
    unavailable: BTreeSet<String>,
    query_failure: Option<String>,
    commands: RefCell<Vec<String>>,
}

impl FakePacman {
    pub fn new() -> Self {
        Self::default()
    }

    fn with(self, name: &str, foreign: bool, explicit: bool, required: bool) -> Self {
        self.packages.borrow_mut().insert(
            name.to_string(),
            FakePackage {
                version: "1.0-1".to_string(),
                foreign,
                explicit,
                required,
            },
        );
        self
    }

    pub fn with_native(self, name: &str) -> Self {
        self.with(name, false, true, false)
    }

    /// 显式安装且被其他包依赖
    pub fn with_required_native(self, name: &str) -> Self {
        self.with(name, false, true, true)
    }

    /// 作为依赖被拉进来的包
    pub fn with_dependency(self, name: &str) -> Self {
        self.with(name, false, false, true)
    }

    pub fn with_foreign(self, name: &str) -> Self {
        self.with(name, true, true, false)
    }

    /// 仓库里不存在的包，安装会失败
    pub fn with_unavailable(mut self, name: &str) -> Self {
        self.unavailable.insert(name.to_string());
        self
    }

    /// 所有 -Q 查询都以给定输出失败
    pub fn failing_queries(mut self, output: &str) -> Self {
        self.query_failure = Some(output.to_string());
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.borrow().clone()
    }

    /// 只保留安装 / 卸载命令
    pub fn mutations(&self) -> Vec<String> {
        self.commands
            .borrow()
            .iter()
            .filter(|c| !c.starts_with("pacman -Q"))
            .cloned()
            .collect()
    }

    pub fn clear_commands(&self) {
        self.commands.borrow_mut().clear();
    }

    pub fn is_native(&self, name: &str) -> bool {
        self.packages
            .borrow()
            .get(name)
            .map(|p| !p.foreign)
            .unwrap_or(false)
    }

    pub fn is_present(&self, name: &str) -> bool {
        self.packages.borrow().contains_key(name)
    }

    fn fail(command: &str, output: impl Into<String>) -> Result<String> {
        Err(PacmanError::Execution {
            command: command.to_string(),
            output: output.into(),
        })
    }

    fn render(name: &str, pkg: &FakePackage) -> String {
        format!(
            "Name            : {}\n\
             Version         : {}\n\
             Depends On      : glibc\n\
             Required By     : {}\n\
             Install Reason  : {}\n\
             Validated By    : Signature\n",
            name,
            pkg.version,
            if pkg.required { "other-package" } else { "None" },
            if pkg.explicit {
                "Explicitly installed"
            } else {
                "Installed as a dependency for another package"
            },
        )
    }

    fn query_all(&self, command: &str, foreign: bool) -> Result<String> {
        if let Some(output) = &self.query_failure {
            return Self::fail(command, output.clone());
        }
        let blocks: Vec<String> = self
            .packages
            .borrow()
            .iter()
            .filter(|(_, p)| p.foreign == foreign)
            .map(|(name, p)| Self::render(name, p))
            .collect();
        if blocks.is_empty() {
            // 和真实 pacman 一样：没有匹配时静默返回 1
            return Self::fail(command, "");
        }
        Ok(blocks.join("\n"))
    }

    fn query_one(&self, command: &str, name: &str) -> Result<String> {
        if let Some(output) = &self.query_failure {
            return Self::fail(command, output.clone());
        }
        match self.packages.borrow().get(name) {
            Some(pkg) => Ok(Self::render(name, pkg)),
            None => Self::fail(command, format!("error: package '{}' was not found\n", name)),
        }
    }

    fn install(&self, command: &str, name: &str) -> Result<String> {
        if self.unavailable.contains(name) {
            return Self::fail(command, format!("error: target not found: {}\n", name));
        }
        let mut packages = self.packages.borrow_mut();
        let pkg = packages.entry(name.to_string()).or_insert(FakePackage {
            version: "1.0-1".to_string(),
            foreign: false,
            explicit: true,
            required: false,
        });
        pkg.foreign = false;
        Ok(format!("installing {}...\n", name))
    }

    fn remove(&self, command: &str, name: &str) -> Result<String> {
        let mut packages = self.packages.borrow_mut();
        let required = match packages.get(name) {
            Some(pkg) => pkg.required,
            None => return Self::fail(command, format!("error: target not found: {}\n", name)),
        };
        if required {
            return Self::fail(
                command,
                format!(
                    "error: failed to prepare transaction (could not satisfy dependencies)\n\
                     :: removing {} breaks dependency '{}' required by other-package\n",
                    name, name
                ),
            );
        }
        packages.remove(name);
        Ok(format!("removing {}...\n", name))
    }
}

impl CommandRunner for FakePacman {
    fn run(&self, invocation: &Invocation) -> Result<String> {
        let command = invocation.to_string();
        self.commands.borrow_mut().push(command.clone());

        let mut argv: Vec<&str> = std::iter::once(invocation.program.as_str())
            .chain(invocation.args.iter().map(|s| s.as_str()))
            .collect();
        if argv.first() == Some(&"sudo") {
            argv.remove(0);
            if argv.first() == Some(&"-S") {
                argv.remove(0);
            }
        }
        assert_eq!(argv.first(), Some(&"pacman"), "unexpected command: {}", command);

        match &argv[1..] {
            ["-Qni"] => self.query_all(&command, false),
            ["-Qmi"] => self.query_all(&command, true),
            ["-Qi", name] => self.query_one(&command, name),
            ["-S", name, "--noconfirm"] => self.install(&command, name),
            ["-R", "--noconfirm", name] | ["-Rs", "--noconfirm", name] => {
                self.remove(&command, name)
            }
            _ => panic!("unexpected command: {}", command),
        }
    }
}
