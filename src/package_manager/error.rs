//! 包管理器错误类型

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PacmanError {
    /// 进程无法启动（命令不存在、权限不足等）
    #[error("无法执行 `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// 进程以非零状态退出，`output` 为合并后的 stdout/stderr 全文
    #[error("Pacman error: {output}")]
    Execution { command: String, output: String },

    /// `pacman -Qi` 报告该包不存在
    #[error("软件包 '{0}' 未安装")]
    NotFound(String),

    /// 声明的包已存在于系统中，但不是经由官方仓库安装的
    #[error("软件包 <{0}> 不是由 pacman 从仓库安装的，请将其从 packages 中移除后重试")]
    ForeignPackage(String),
}

impl PacmanError {
    /// 失败命令捕获到的输出（仅 Execution 有）
    #[allow(dead_code)]
    pub fn output(&self) -> Option<&str> {
        match self {
            PacmanError::Execution { output, .. } => Some(output),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PacmanError>;
