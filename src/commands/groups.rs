//! # 分组命令
//!
//! 面向用户的分组操作入口，每个命令都返回一条 `Notice`（消息 key + 参数）：
//! - `create_group` - 创建分组
//! - `delete_candidates` / `delete_group` - 删除分组（可按文件路径缩小候选范围）
//! - `add_file_to_group` - 将文件加入分组，可选在分组不存在时自动创建
//! - `remove_file_from_group` - 将文件移出分组
//! - `close_document` - 宿主关闭文档
//! - `show_groups` - 分组总览

use crate::error::EngineError;
use crate::models::group::{GroupSummary, GroupsOverview};
use crate::models::notice::Notice;
use crate::services::persistence::SnapshotPort;
use crate::services::sync_controller::{HostBridge, SyncController};
use crate::utils::path;

/// 创建分组
pub fn create_group<P: SnapshotPort, H: HostBridge>(
    controller: &mut SyncController<P, H>,
    name: &str,
) -> Notice {
    match controller.create_group(name) {
        Ok(color) => Notice::info("group.created", vec![name.to_string(), color]),
        Err(e) => report(e),
    }
}

/// 删除分组时可供选择的分组
///
/// 指定 `path` 时只返回包含该文件的分组，否则返回所有分组（按创建顺序）。
pub fn delete_candidates<P: SnapshotPort, H: HostBridge>(
    controller: &SyncController<P, H>,
    path: Option<&str>,
) -> Vec<String> {
    match path {
        Some(path) => controller.store().groups_containing(path),
        None => controller.store().groups().keys().cloned().collect(),
    }
}

/// 删除分组
pub async fn delete_group<P: SnapshotPort, H: HostBridge>(
    controller: &mut SyncController<P, H>,
    name: &str,
) -> Notice {
    match controller.remove_group(name).await {
        Ok(()) => Notice::info("group.deleted", vec![name.to_string()]),
        Err(e) => report(e),
    }
}

/// 将文件加入分组
///
/// # 参数
/// - `group` - 目标分组名
/// - `file_path` - 文件绝对路径
/// - `display_name` - 展示名称；为空时使用基础文件名
/// - `create_if_missing` - 分组不存在时是否先创建
pub async fn add_file_to_group<P: SnapshotPort, H: HostBridge>(
    controller: &mut SyncController<P, H>,
    group: &str,
    file_path: &str,
    display_name: Option<&str>,
    create_if_missing: bool,
) -> Notice {
    if create_if_missing && controller.store().group(group).is_none() {
        // 快照保存失败时分组已在内存中创建，继续加入文件
        if let Err(e) = controller.create_group(group) {
            if !matches!(e, EngineError::Persistence(_)) {
                return report(e);
            }
        }
    }

    let name = display_name.unwrap_or_else(|| path::basename(file_path));
    match controller.add_file(group, name, file_path).await {
        Ok(outcome) => match outcome.moved_from {
            Some(from) => Notice::info(
                "file.moved",
                vec![name.to_string(), from, group.to_string()],
            ),
            None => Notice::info("file.added", vec![name.to_string(), group.to_string()]),
        },
        Err(e) => report(e),
    }
}

/// 将文件移出分组
///
/// 未指定分组时使用文件当前所在的分组；路径不在该分组中时返回 `file.not_member`。
pub async fn remove_file_from_group<P: SnapshotPort, H: HostBridge>(
    controller: &mut SyncController<P, H>,
    group: Option<&str>,
    file_path: &str,
) -> Notice {
    let group = match group {
        Some(group) => group.to_string(),
        None => match controller.store().groups_containing(file_path).into_iter().next() {
            Some(group) => group,
            None => return Notice::warning("file.not_grouped", vec![file_path.to_string()]),
        },
    };

    // 按确切路径移除，展示名称只用于通知
    match controller.remove_path_from(&group, file_path).await {
        Ok(outcome) if outcome.group_deleted => Notice::info(
            "file.removed_group_deleted",
            vec![outcome.file.name, group],
        ),
        Ok(outcome) => Notice::info("file.removed", vec![outcome.file.name, group]),
        Err(e) => report(e),
    }
}

/// 宿主关闭文档；文件不在任何分组中时不产生通知
pub async fn close_document<P: SnapshotPort, H: HostBridge>(
    controller: &mut SyncController<P, H>,
    file_path: &str,
) -> Option<Notice> {
    match controller.on_document_closed(file_path).await {
        Ok(Some(outcome)) => Some(Notice::info(
            "file.closed",
            vec![outcome.file.name, outcome.group],
        )),
        Ok(None) => None,
        Err(e) => Some(report(e)),
    }
}

/// 分组总览
pub fn show_groups<P: SnapshotPort, H: HostBridge>(
    controller: &SyncController<P, H>,
) -> GroupsOverview {
    let store = controller.store();
    let groups = store
        .groups()
        .iter()
        .map(|(name, group)| GroupSummary {
            name: name.clone(),
            color: group.color.clone(),
            file_count: group.files.len(),
            files: group.files.clone(),
        })
        .collect();

    let grouped = store.grouped_paths();
    let mut ungrouped_open: Vec<String> = controller
        .host()
        .open_paths()
        .unwrap_or_default()
        .into_iter()
        .filter(|p| !grouped.contains(p))
        .collect();
    ungrouped_open.sort();

    GroupsOverview {
        groups,
        ungrouped_open,
    }
}

fn report(e: EngineError) -> Notice {
    if e.is_warning() {
        log::info!("{}", e);
    } else {
        log::warn!("{}", e);
    }
    e.to_notice()
}
