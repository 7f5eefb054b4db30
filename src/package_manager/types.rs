//! PackageManager 相关数据类型定义

use serde::{Deserialize, Serialize};

/// pacman 报告的一个已安装包（每次查询重新构造，不缓存）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageRecord {
    pub name: String,
    /// 原样保存，不做版本号解析
    pub version: String,
    /// 是否有其他已安装包依赖它（`Required By` 不为 `None`）
    pub has_dependents: bool,
    /// 是否经由官方仓库（非 foreign）安装，即是否归本工具管理
    pub managed_by_system: bool,
}

/// 已安装包的查询视图
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryView {
    /// 官方仓库安装的包 (pacman -Qni)
    Native,
    /// 手动构建 / AUR 等外部来源安装的包 (pacman -Qmi)
    Foreign,
}

impl QueryView {
    pub fn flag(self) -> &'static str {
        match self {
            QueryView::Native => "-Qni",
            QueryView::Foreign => "-Qmi",
        }
    }

    /// 该视图下找到的包是否视为系统管理
    pub fn managed_by_system(self) -> bool {
        matches!(self, QueryView::Native)
    }
}

/// 声明配置中的一项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredPackage {
    pub name: String,
    /// 仅用于输出，反映实际状态，配置中写了也会被忽略
    #[serde(default, skip_deserializing)]
    pub installed: bool,
}

impl DesiredPackage {
    #[allow(dead_code)]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            installed: false,
        }
    }
}

/// 只读查询接口输出的包摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageSummary {
    pub name: String,
    pub version: String,
}

impl From<&PackageRecord> for PackageSummary {
    fn from(record: &PackageRecord) -> Self {
        Self {
            name: record.name.clone(),
            version: record.version.clone(),
        }
    }
}

/// 收敛过程中实际执行过的一次操作
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Install { name: String },
    Uninstall { name: String, cascade: bool },
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Install { name } => write!(f, "安装 {}", name),
            Action::Uninstall { name, cascade: true } => write!(f, "卸载 {}（含无用依赖）", name),
            Action::Uninstall { name, cascade: false } => write!(f, "卸载 {}", name),
        }
    }
}
