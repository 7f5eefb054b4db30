//! 声明状态与 pacman 实际状态之间的收敛
//!
//! 每个操作开始时都重新查询 pacman，不在操作之间缓存任何状态。
//! 所有操作串行执行，遇到第一个失败即返回，已完成的安装 / 卸载不会回滚；
//! 再次执行同一操作会从当前实际状态继续收敛。

use crate::package_manager::{
    Action, CommandRunner, DesiredPackage, Elevation, PackageManager, PacmanError, QueryView,
    Result, SystemRunner,
};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// 资源级别的设置，随每次操作传入
#[derive(Debug, Clone)]
pub struct ResourceSettings {
    /// 卸载时使用 `-Rs` 代替 `-R`
    pub cascade_on_delete: bool,
    pub elevation: Elevation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateOutcome {
    pub actions: Vec<Action>,
    /// 收敛后重新读取到的实际状态
    pub observed: Vec<DesiredPackage>,
}

pub struct Reconciler<R = SystemRunner> {
    pm: PackageManager<R>,
    settings: ResourceSettings,
}

/// 去重并保持声明顺序
fn declared_names(desired: &[DesiredPackage]) -> Vec<&str> {
    let mut seen = HashSet::new();
    desired
        .iter()
        .map(|p| p.name.as_str())
        .filter(|name| seen.insert(*name))
        .collect()
}

impl<R: CommandRunner> Reconciler<R> {
    pub fn new(pm: PackageManager<R>, settings: ResourceSettings) -> Self {
        Self { pm, settings }
    }

    pub fn package_manager(&self) -> &PackageManager<R> {
        &self.pm
    }

    /// 安装声明中尚未安装的包
    ///
    /// 先检查整个声明集合：只要有一个包是 foreign 安装的，就不执行任何安装。
    pub fn create(&self, desired: &[DesiredPackage]) -> Result<Vec<Action>> {
        let names = declared_names(desired);
        let actual = self.pm.installed_state()?;

        if let Some(conflict) = names
            .iter()
            .find(|name| matches!(actual.get(**name), Some(r) if !r.managed_by_system))
        {
            return Err(PacmanError::ForeignPackage(conflict.to_string()));
        }

        let mut actions = Vec::new();
        for name in names {
            if actual.contains_key(name) {
                log::debug!("{} 已安装，跳过", name);
                continue;
            }
            self.pm.install(name, &self.settings.elevation)?;
            actions.push(Action::Install {
                name: name.to_string(),
            });
        }
        Ok(actions)
    }

    /// 报告所有由官方仓库显式安装的包，不限于声明过的
    pub fn read(&self) -> Result<Vec<DesiredPackage>> {
        Ok(self
            .pm
            .query_installed(QueryView::Native)?
            .into_keys()
            .map(|name| DesiredPackage {
                name,
                installed: true,
            })
            .collect())
    }

    /// 先卸载多余的系统管理包，再安装缺失的包，最后重新读取实际状态
    ///
    /// 两个阶段都按包名排序执行。foreign 包既不会被卸载，也不会被重新安装。
    pub fn update(&self, desired: &[DesiredPackage]) -> Result<UpdateOutcome> {
        let wanted: BTreeSet<&str> = declared_names(desired).into_iter().collect();
        let actual = self.pm.installed_state()?;
        let cascade = self.settings.cascade_on_delete;
        let mut actions = Vec::new();

        for (name, record) in &actual {
            if wanted.contains(name.as_str()) {
                continue;
            }
            if !record.managed_by_system {
                log::debug!("{} 不是由 pacman 从仓库安装的，保持不动", name);
                continue;
            }
            if record.has_dependents && !cascade {
                log::warn!("{} 仍被其他包依赖，卸载可能失败", name);
            }
            self.pm.uninstall(name, cascade, &self.settings.elevation)?;
            actions.push(Action::Uninstall {
                name: name.clone(),
                cascade,
            });
        }

        for name in wanted {
            if actual.contains_key(name) {
                continue;
            }
            self.pm.install(name, &self.settings.elevation)?;
            actions.push(Action::Install {
                name: name.to_string(),
            });
        }

        Ok(UpdateOutcome {
            actions,
            observed: self.read()?,
        })
    }

    /// 卸载声明中的每一个包，不区分是否由系统管理
    pub fn delete(&self, desired: &[DesiredPackage]) -> Result<Vec<Action>> {
        let cascade = self.settings.cascade_on_delete;
        let mut actions = Vec::new();
        for name in declared_names(desired) {
            self.pm.uninstall(name, cascade, &self.settings.elevation)?;
            actions.push(Action::Uninstall {
                name: name.to_string(),
                cascade,
            });
        }
        Ok(actions)
    }
}
