//! # 命令行前端
//!
//! 针对真实的宿主安装目录驱动同步控制器。命令行没有实时 UI：
//! - 打开文件列表未知（所有已分组文件都视为打开）
//! - 重新加载请求只记录日志
//! - 通知直接打印到终端

use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::commands::{config, groups, patch};
use crate::error::EngineError;
use crate::models::config::EngineConfig;
use crate::models::group::GroupsOverview;
use crate::models::notice::{Notice, NoticeLevel};
use crate::services::binding_script::BindingScriptGenerator;
use crate::services::group_store::GroupStore;
use crate::services::persistence::JsonFileSnapshot;
use crate::services::resource_patcher::{ReloadSignal, ResourcePatcher};
use crate::services::sync_controller::{HostBridge, SyncController};
use crate::utils::path;

#[derive(Debug, Parser)]
#[command(
    name = "tab-groups",
    version,
    about = "Colored tab groups for a VS Code style editor",
    after_help = "Examples:\n  tab-groups --install-dir /usr/share/code/resources/app create Backend\n  tab-groups add Backend ./src/server.ts --create\n  tab-groups show\n  tab-groups restore"
)]
pub struct Cli {
    /// Host install directory (overrides hostInstallDir).
    #[arg(long, global = true)]
    pub install_dir: Option<PathBuf>,
    /// Group snapshot file (overrides snapshotPath).
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,
    /// Do not ask the host to reload after patching.
    #[arg(long, global = true)]
    pub no_reload: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an empty group.
    Create { name: String },
    /// Delete a group; without a name, list the groups that could be deleted.
    Delete {
        name: Option<String>,
        /// Only offer groups containing this file.
        #[arg(long)]
        path: Option<String>,
    },
    /// Add a file to a group, moving it out of its current group.
    Add {
        group: String,
        path: String,
        /// Display name (defaults to the file name).
        #[arg(long)]
        name: Option<String>,
        /// Create the group if it does not exist.
        #[arg(long)]
        create: bool,
    },
    /// Remove a file from its group.
    Remove {
        path: String,
        #[arg(long)]
        group: Option<String>,
    },
    /// Tell the engine a document was closed in the host.
    Close { path: String },
    /// Show all groups and their files.
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Regenerate the binding script and patch the host resource.
    Repaint {
        #[arg(long)]
        reload: bool,
    },
    /// Restore the host resource from its backup.
    Restore,
    /// Show the patch status of the host resource.
    Status,
}

/// 命令行宿主：没有 UI，信号只落到日志与终端
#[derive(Debug, Clone, Copy, Default)]
pub struct CliHost;

impl HostBridge for CliHost {
    fn open_paths(&self) -> Option<HashSet<String>> {
        None
    }

    fn update_affordances(&self, has_groups: bool, grouped_paths: &BTreeSet<String>) {
        log::debug!(
            "affordances: has_groups={}, grouped={}",
            has_groups,
            grouped_paths.len()
        );
    }

    fn notify(&self, notice: &Notice) {
        print_notice(notice);
    }
}

impl ReloadSignal for CliHost {
    fn request_reload(&self) {
        log::info!("已请求宿主重新加载窗口");
    }
}

/// 执行一条命令
pub async fn run(cli: Cli) -> Result<ExitCode, EngineError> {
    let mut config = config::read_engine_config().await;
    if let Some(dir) = cli.install_dir {
        config.host_install_dir = Some(dir);
    }
    if let Some(snapshot) = cli.snapshot {
        config.snapshot_path = Some(snapshot);
    }
    if cli.no_reload {
        config.reload_after_patch = false;
    }

    let mut controller = build_controller(&config)?;

    let notice = match cli.command {
        Command::Create { name } => Some(groups::create_group(&mut controller, &name)),
        Command::Delete { name: Some(name), .. } => {
            Some(groups::delete_group(&mut controller, &name).await)
        }
        Command::Delete { name: None, path } => {
            let scope = path.as_deref().map(absolute);
            for name in groups::delete_candidates(&controller, scope.as_deref()) {
                println!("{}", name);
            }
            None
        }
        Command::Add {
            group,
            path,
            name,
            create,
        } => Some(
            groups::add_file_to_group(
                &mut controller,
                &group,
                &absolute(&path),
                name.as_deref(),
                create,
            )
            .await,
        ),
        Command::Remove { path, group } => Some(
            groups::remove_file_from_group(&mut controller, group.as_deref(), &absolute(&path))
                .await,
        ),
        Command::Close { path } => groups::close_document(&mut controller, &absolute(&path)).await,
        Command::Show { json } => {
            let overview = groups::show_groups(&controller);
            if json {
                print_json(&overview);
            } else {
                print_overview(&overview);
            }
            None
        }
        Command::Repaint { reload } => match patch::repaint(&mut controller, reload).await {
            Some(notice) => Some(notice),
            // 失败已经通过宿主通知打印
            None => return Ok(ExitCode::FAILURE),
        },
        Command::Restore => Some(patch::restore_backup(&controller).await),
        Command::Status => {
            print_json(&patch::patch_status(&controller).await?);
            None
        }
    };

    match notice {
        Some(notice) => {
            print_notice(&notice);
            Ok(exit_code(&notice))
        }
        None => Ok(ExitCode::SUCCESS),
    }
}

fn build_controller(
    config: &EngineConfig,
) -> Result<SyncController<JsonFileSnapshot, CliHost>, EngineError> {
    let install_dir = config.host_install_dir.clone().ok_or_else(|| {
        EngineError::Config("未配置宿主安装目录（hostInstallDir 或 --install-dir）".to_string())
    })?;
    let snapshot_path = match &config.snapshot_path {
        Some(p) => p.clone(),
        None => path::get_default_snapshot_path().map_err(EngineError::Config)?,
    };
    log::debug!(
        "宿主安装目录: {}, 分组快照: {}",
        install_dir.display(),
        snapshot_path.display()
    );

    let store = GroupStore::load(JsonFileSnapshot::new(snapshot_path))?;
    let patcher = ResourcePatcher::new(install_dir, Arc::new(CliHost));
    Ok(SyncController::new(
        store,
        BindingScriptGenerator::from_config(config),
        patcher,
        CliHost,
        config.reload_after_patch,
    ))
}

/// 相对路径按当前工作目录补全为绝对路径
fn absolute(raw: &str) -> String {
    std::path::absolute(raw)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

fn exit_code(notice: &Notice) -> ExitCode {
    match notice.level {
        NoticeLevel::Error => ExitCode::FAILURE,
        NoticeLevel::Info | NoticeLevel::Warning => ExitCode::SUCCESS,
    }
}

fn print_notice(notice: &Notice) {
    match notice.level {
        NoticeLevel::Info => println!("{}", notice),
        NoticeLevel::Warning => eprintln!("warning: {}", notice),
        NoticeLevel::Error => eprintln!("error: {}", notice),
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("序列化输出失败: {}", e),
    }
}

fn print_overview(overview: &GroupsOverview) {
    if overview.groups.is_empty() {
        println!("(no groups)");
    }
    for group in &overview.groups {
        println!("{} {} ({})", group.name, group.color, group.file_count);
        for file in &group.files {
            println!("  {}  {}", file.name, file.path);
        }
    }
    if !overview.ungrouped_open.is_empty() {
        println!("ungrouped:");
        for path in &overview.ungrouped_open {
            println!("  {}", path);
        }
    }
}
