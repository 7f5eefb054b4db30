use crate::package_manager::{Action, DesiredPackage};
use anyhow::Result;
use chrono::{DateTime, Local};
use std::fs;
use std::path::PathBuf;

pub struct ReportSaver {
    base_dir: PathBuf,
}

impl ReportSaver {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// 保存一次收敛的报告，`observed` 为空表示该操作没有重新读取状态
    pub fn save(
        &self,
        operation: &str,
        actions: &[Action],
        observed: &[DesiredPackage],
    ) -> Result<PathBuf> {
        self.save_at(Local::now(), operation, actions, observed)
    }

    fn save_at(
        &self,
        now: DateTime<Local>,
        operation: &str,
        actions: &[Action],
        observed: &[DesiredPackage],
    ) -> Result<PathBuf> {
        // 目录结构: YYYY/MM/DD/
        let dir = self
            .base_dir
            .join(now.format("%Y").to_string())
            .join(now.format("%m").to_string())
            .join(now.format("%d").to_string());
        fs::create_dir_all(&dir)?;

        let filepath = dir.join(now.format("%H-%M-%S.txt").to_string());
        fs::write(&filepath, render(now, operation, actions, observed))?;

        Ok(filepath)
    }
}

fn render(
    now: DateTime<Local>,
    operation: &str,
    actions: &[Action],
    observed: &[DesiredPackage],
) -> String {
    let mut content = format!(
        "pacman 收敛报告 ({})\n生成时间: {}\n\n",
        operation,
        now.format("%Y-%m-%d %H:%M:%S")
    );

    if actions.is_empty() {
        content.push_str("无需任何操作\n");
    } else {
        content.push_str(&format!("执行了 {} 个操作:\n", actions.len()));
        for action in actions {
            content.push_str(&format!("  {}\n", action));
        }
    }

    if !observed.is_empty() {
        content.push_str(&format!("\n当前显式安装的包 ({}):\n", observed.len()));
        for pkg in observed {
            content.push_str(&format!("  {}\n", pkg.name));
        }
    }

    content
}
