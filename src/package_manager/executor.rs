//! 外部命令执行（可选 sudo 提权）
//!
//! 所有 pacman 调用都经过 [`CommandRunner`]：生产环境用 [`SystemRunner`]，
//! 测试里换成内存中的假 pacman。

use super::error::{PacmanError, Result};
use serde::Deserialize;
use std::fmt;
use std::io::{BufRead, BufReader, Read};

/// sudo 密码。Debug 输出会被遮蔽，避免出现在日志里
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SudoPassword(String);

impl SudoPassword {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SudoPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("SudoPassword(\"\")")
        } else {
            f.write_str("SudoPassword(***)")
        }
    }
}

/// 一次待执行的命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// 通过 stdin 喂给 `sudo -S` 的密码
    pub stdin: Option<SudoPassword>,
}

impl Invocation {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            stdin: None,
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// 需要 root 权限的命令如何提权
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Elevation {
    /// 已是 root，直接执行
    Root,
    /// `sudo -S`，密码从 stdin 读入
    Password(SudoPassword),
    /// `sudo`，由 sudo 自己决定是否交互询问（NOPASSWD 或凭证缓存时无需输入）
    Interactive,
}

impl Elevation {
    /// 根据密码和当前身份决定提权方式。密码优先：即使已是 root，给了密码也走 `sudo -S`
    pub fn resolve(secret: &SudoPassword, is_root: bool) -> Self {
        if !secret.is_empty() {
            Elevation::Password(secret.clone())
        } else if is_root {
            Elevation::Root
        } else {
            Elevation::Interactive
        }
    }

    /// 按当前进程的有效 UID 判断是否为 root
    pub fn detect(secret: &SudoPassword) -> Self {
        let is_root = unsafe { libc::geteuid() } == 0;
        Self::resolve(secret, is_root)
    }

    pub fn wrap(&self, program: &str, args: &[&str]) -> Invocation {
        match self {
            Elevation::Root => Invocation::new(program, args),
            Elevation::Password(secret) => {
                let mut inv = Invocation::new("sudo", &["-S", program]);
                inv.args.extend(args.iter().map(|s| s.to_string()));
                inv.stdin = Some(secret.clone());
                inv
            }
            Elevation::Interactive => {
                let mut inv = Invocation::new("sudo", &[program]);
                inv.args.extend(args.iter().map(|s| s.to_string()));
                inv
            }
        }
    }
}

/// 执行命令并返回合并后的 stdout/stderr；非零退出码转换为 [`PacmanError::Execution`]
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> Result<String>;
}

/// 生产实现：基于 duct 启动真实进程
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<String> {
        let command = invocation.to_string();
        log::debug!("执行: {}", command);

        // 固定 C locale，保证字段名和错误提示是英文
        let mut expr = duct::cmd(invocation.program.as_str(), invocation.args.iter())
            .env("LC_ALL", "C")
            .stderr_to_stdout()
            .unchecked();
        if let Some(secret) = &invocation.stdin {
            expr = expr.stdin_bytes(format!("{}\n", secret.expose()));
        }

        let reader = expr.reader().map_err(|e| spawn_error(&command, e))?;
        // stdout 与 stderr 共用一个管道，边产生边读，读到 EOF 时 duct 已回收子进程
        let output = read_stream_lines(&reader).map_err(|e| spawn_error(&command, e))?;
        let success = reader
            .try_wait()
            .map_err(|e| spawn_error(&command, e))?
            .map(|o| o.status.success())
            .unwrap_or(false);

        if success {
            Ok(output)
        } else {
            Err(PacmanError::Execution { command, output })
        }
    }
}

fn spawn_error(command: &str, source: std::io::Error) -> PacmanError {
    PacmanError::Spawn {
        command: command.to_string(),
        source,
    }
}

/// 逐行读取输出流，非 UTF-8 内容按 lossy 处理
fn read_stream_lines(stream: impl Read) -> std::io::Result<String> {
    let mut reader = BufReader::new(stream);
    let mut result = String::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let chunk = String::from_utf8_lossy(&buf);
        let line = chunk.trim_end_matches(&['\n', '\r'][..]);
        log::debug!("  | {}", line);
        result.push_str(line);
        result.push('\n');
    }

    Ok(result)
}
