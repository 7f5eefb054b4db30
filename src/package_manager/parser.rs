//! 输出解析函数

use super::types::{PackageRecord, QueryView};
use std::collections::BTreeMap;

const LABEL_NAME: &str = "Name";
const LABEL_VERSION: &str = "Version";
const LABEL_REQUIRED_BY: &str = "Required By";
const LABEL_INSTALL_REASON: &str = "Install Reason";

const EXPLICITLY_INSTALLED: &str = "Explicitly installed";
const NO_DEPENDENTS: &str = "None";

/// 单个 `pacman -Qi` 块中收集到的字段
#[derive(Debug, Default)]
struct Block {
    name: Option<String>,
    version: String,
    required_by: Option<String>,
    install_reason: Option<String>,
}

impl Block {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.required_by.is_none() && self.install_reason.is_none()
    }

    fn feed(&mut self, line: &str) {
        if let Some(val) = label_value(line, LABEL_NAME) {
            self.name = Some(val.to_string());
        } else if let Some(val) = label_value(line, LABEL_VERSION) {
            self.version = val.to_string();
        } else if let Some(val) = label_value(line, LABEL_REQUIRED_BY) {
            self.required_by = Some(val.to_string());
        } else if let Some(val) = label_value(line, LABEL_INSTALL_REASON) {
            self.install_reason = Some(val.to_string());
        }
    }

    fn explicitly_installed(&self) -> bool {
        self.install_reason.as_deref() == Some(EXPLICITLY_INSTALLED)
    }

    /// 缺少 `Required By` 时保守地认为有依赖者
    fn has_dependents(&self) -> bool {
        self.required_by.as_deref() != Some(NO_DEPENDENTS)
    }

    fn into_record(self, view: QueryView) -> Option<PackageRecord> {
        if !self.explicitly_installed() {
            return None;
        }
        let has_dependents = self.has_dependents();
        match self.name {
            Some(name) if !name.is_empty() => Some(PackageRecord {
                name,
                version: self.version,
                has_dependents,
                managed_by_system: view.managed_by_system(),
            }),
            _ => {
                log::warn!("跳过缺少 Name 字段的包信息块（version={:?}）", self.version);
                None
            }
        }
    }
}

/// 行首匹配字段名，返回第一个冒号之后去掉空白的值
fn label_value<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    if !line.starts_with(label) {
        return None;
    }
    line.split_once(':').map(|(_, val)| val.trim())
}

/// 解析 `pacman -Qni` / `pacman -Qmi` 输出，只保留显式安装的包
///
/// 每个包是一组 `字段 : 值` 行，包与包之间以空行分隔。
/// `managed_by_system` 完全由查询视图决定。
pub fn parse_installed_packages(output: &str, view: QueryView) -> BTreeMap<String, PackageRecord> {
    let mut packages = BTreeMap::new();
    let mut block = Block::default();

    for line in output.lines() {
        if line.trim().is_empty() {
            let done = std::mem::take(&mut block);
            if !done.is_empty() {
                if let Some(record) = done.into_record(view) {
                    packages.insert(record.name.clone(), record);
                }
            }
            continue;
        }
        block.feed(line);
    }

    if !block.is_empty() {
        if let Some(record) = block.into_record(view) {
            packages.insert(record.name.clone(), record);
        }
    }

    packages
}
