//! # 工作台补丁命令
//!
//! - `repaint` - 按当前分组状态重新补丁工作台资源
//! - `restore_backup` - 从备份恢复工作台资源
//! - `patch_status` - 查询补丁状态

use crate::error::EngineError;
use crate::models::notice::Notice;
use crate::services::persistence::SnapshotPort;
use crate::services::resource_patcher::PatchStatus;
use crate::services::sync_controller::{HostBridge, SyncController};

/// 手动重绘
///
/// 不请求重新加载时走启动入口 `activate()`（重绘后同时刷新宿主信号）。
/// 失败时控制器已通过宿主通知报告过一次，此时返回 `None`。
pub async fn repaint<P: SnapshotPort, H: HostBridge>(
    controller: &mut SyncController<P, H>,
    reload: bool,
) -> Option<Notice> {
    let result = if reload {
        controller.repaint(true).await
    } else {
        controller.activate().await
    };
    result
        .ok()
        .map(|resource| Notice::info("patch.applied", vec![resource.display().to_string()]))
}

/// 从备份恢复宿主工作台资源，移除所有注入内容
pub async fn restore_backup<P: SnapshotPort, H: HostBridge>(
    controller: &SyncController<P, H>,
) -> Notice {
    match controller.restore().await {
        Ok(resource) => Notice::info("patch.restored", vec![resource.display().to_string()]),
        Err(e) => {
            log::warn!("{}", e);
            e.to_notice()
        }
    }
}

pub async fn patch_status<P: SnapshotPort, H: HostBridge>(
    controller: &SyncController<P, H>,
) -> Result<PatchStatus, EngineError> {
    controller.patcher().status().await
}
