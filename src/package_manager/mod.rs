//! 包管理器模块 — 对 pacman 的封装

pub mod error;
pub mod executor;
#[cfg(test)]
pub mod fake;
pub mod parser;
pub mod types;

// 重新导出常用类型和函数
pub use error::{PacmanError, Result};
pub use executor::{CommandRunner, Elevation, Invocation, SudoPassword, SystemRunner};
pub use types::{Action, DesiredPackage, PackageRecord, PackageSummary, QueryView};

use parser::parse_installed_packages;
use std::collections::BTreeMap;

const PACMAN: &str = "pacman";

#[derive(Debug, Clone, Default)]
pub struct PackageManager<R = SystemRunner> {
    runner: R,
}

impl PackageManager<SystemRunner> {
    pub fn system() -> Self {
        Self::new(SystemRunner)
    }
}

impl<R: CommandRunner> PackageManager<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    // ===== 查询 =====

    /// 查询某一视图下显式安装的包 (pacman -Qni / -Qmi)
    pub fn query_installed(&self, view: QueryView) -> Result<BTreeMap<String, PackageRecord>> {
        let output = match self.runner.run(&Invocation::new(PACMAN, &[view.flag()])) {
            Ok(output) => output,
            // 没有任何匹配的包时 pacman 不输出内容并返回 1
            Err(PacmanError::Execution { output, .. }) if output.trim().is_empty() => String::new(),
            Err(e) => return Err(e),
        };
        Ok(parse_installed_packages(&output, view))
    }

    /// 合并官方仓库与外部来源两个视图，得到完整的显式安装状态
    pub fn installed_state(&self) -> Result<BTreeMap<String, PackageRecord>> {
        let mut state = self.query_installed(QueryView::Foreign)?;
        // 两个视图按 pacman 的定义互不相交
        state.extend(self.query_installed(QueryView::Native)?);
        Ok(state)
    }

    /// 官方仓库安装的包摘要，按名称排序
    pub fn list_packages(&self) -> Result<Vec<PackageSummary>> {
        Ok(self
            .query_installed(QueryView::Native)?
            .values()
            .map(PackageSummary::from)
            .collect())
    }

    /// 获取单个包的详情原文 (pacman -Qi)，包不存在时返回 [`PacmanError::NotFound`]
    ///
    /// 依赖 pacman 的英文错误提示 `error: package '<name>' was not found`，
    /// 执行器固定了 `LC_ALL=C`，换了 pacman 版本后措辞可能变化。
    pub fn query_package(&self, name: &str) -> Result<String> {
        match self.runner.run(&Invocation::new(PACMAN, &["-Qi", name])) {
            Err(PacmanError::Execution { output, .. })
                if output
                    .trim_start()
                    .starts_with(&format!("error: package '{}' was not found", name)) =>
            {
                Err(PacmanError::NotFound(name.to_string()))
            }
            other => other,
        }
    }

    pub fn is_installed(&self, name: &str) -> Result<bool> {
        match self.query_package(name) {
            Ok(_) => Ok(true),
            Err(PacmanError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    // ===== 安装 / 卸载 =====

    pub fn install(&self, name: &str, elevation: &Elevation) -> Result<()> {
        log::info!("安装 {}", name);
        self.runner
            .run(&elevation.wrap(PACMAN, &["-S", name, "--noconfirm"]))?;
        Ok(())
    }

    /// 卸载包；`cascade` 为真时用 `-Rs` 连带移除不再被需要的依赖
    pub fn uninstall(&self, name: &str, cascade: bool, elevation: &Elevation) -> Result<()> {
        let flag = if cascade { "-Rs" } else { "-R" };
        log::info!("卸载 {} ({})", name, flag);
        self.runner
            .run(&elevation.wrap(PACMAN, &[flag, "--noconfirm", name]))?;
        Ok(())
    }
}
