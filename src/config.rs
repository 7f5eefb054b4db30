use crate::package_manager::{DesiredPackage, SudoPassword};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// 声明文件，例如：
///
/// ```toml
/// cascade_on_delete = true
///
/// [[packages]]
/// name = "zip"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub packages: Vec<DesiredPackage>,
    /// 卸载时使用 pacman -Rs 代替 pacman -R
    pub cascade_on_delete: bool,
    /// 提供时通过 stdin 传给 `sudo -S`；否则只有 root 或 NOPASSWD sudo 才能免交互运行
    pub sudo_password: SudoPassword,
    /// 设置后每次变更操作都会保存一份收敛报告
    pub report_dir: Option<PathBuf>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("LIAN_PACSTATE_CONFIG") {
            return PathBuf::from(path);
        }
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".config/lian-pacstate/config.toml")
    }

    pub fn load_or_default() -> Result<Self> {
        let mut config = Self::load_from(&Self::default_path())?;

        // sudo 密码优先级：配置文件 > 环境变量
        if config.sudo_password.is_empty() {
            if let Ok(secret) = std::env::var("LIAN_SUDO_PASSWORD") {
                config.sudo_password = SudoPassword::new(secret);
            }
        }
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("配置文件 {} 不存在，使用默认配置", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件 {} 失败", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("解析配置文件 {} 失败", path.display()))?;
        Ok(config)
    }
}
