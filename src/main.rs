mod config;
mod package_manager;
mod reconciler;
mod report;

use anyhow::{anyhow, Result};
use package_manager::{Action, DesiredPackage, Elevation, PackageManager};
use reconciler::{Reconciler, ResourceSettings};
use report::ReportSaver;
use serde_json::{json, Value};

const USAGE: &str = "用法: lian-pacstate <create|read|update|delete|list|status <包名>>";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Create,
    Read,
    Update,
    Delete,
    List,
    Status(String),
}

impl Command {
    fn parse(args: &[String]) -> Result<Self> {
        let args: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
        match args.as_slice() {
            ["create"] => Ok(Command::Create),
            ["read"] => Ok(Command::Read),
            ["update"] => Ok(Command::Update),
            ["delete"] => Ok(Command::Delete),
            ["list"] => Ok(Command::List),
            ["status", name] => Ok(Command::Status(name.to_string())),
            _ => Err(anyhow!("无法识别的参数: {:?}", args)),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Command::Create => "create",
            Command::Read => "read",
            Command::Update => "update",
            Command::Delete => "delete",
            Command::List => "list",
            Command::Status(_) => "status",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args).unwrap_or_else(|e| {
        eprintln!("错误: {}", e);
        eprintln!("{}", USAGE);
        std::process::exit(2);
    });

    let config = config::Config::load_or_default()?;

    // pacman 调用全部是阻塞的，放到专门的线程里串行执行
    let output = tokio::task::spawn_blocking(move || execute(command, &config)).await??;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

fn execute(command: Command, config: &config::Config) -> Result<Value> {
    let reconciler = Reconciler::new(
        PackageManager::system(),
        ResourceSettings {
            cascade_on_delete: config.cascade_on_delete,
            elevation: Elevation::detect(&config.sudo_password),
        },
    );

    let (actions, observed) = match &command {
        Command::Create => (reconciler.create(&config.packages)?, Vec::new()),
        Command::Update => {
            let outcome = reconciler.update(&config.packages)?;
            (outcome.actions, outcome.observed)
        }
        Command::Delete => (reconciler.delete(&config.packages)?, Vec::new()),
        Command::Read => return Ok(json!({ "packages": reconciler.read()? })),
        Command::List => {
            let packages = reconciler.package_manager().list_packages()?;
            return Ok(json!({ "packages": packages }));
        }
        Command::Status(name) => {
            let installed = reconciler.package_manager().is_installed(name)?;
            return Ok(json!({ "name": name, "installed": installed }));
        }
    };

    save_report(config, command.label(), &actions, &observed);
    Ok(json!({ "actions": actions, "packages": observed }))
}

fn save_report(
    config: &config::Config,
    operation: &str,
    actions: &[Action],
    observed: &[DesiredPackage],
) {
    let Some(dir) = &config.report_dir else {
        return;
    };
    match ReportSaver::new(dir.clone()).save(operation, actions, observed) {
        Ok(path) => log::info!("报告已保存到 {}", path.display()),
        Err(e) => log::error!("保存报告失败: {}", e),
    }
}
