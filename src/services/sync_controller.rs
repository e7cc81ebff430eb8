//! # 同步控制器
//!
//! 决定分组变更何时需要"完整重绘"，何时只需"轻量刷新"：
//! - **完整重绘**（重新生成脚本并补丁工作台资源，涉及文件读取、解析与写入）：
//!   加入文件、移除文件、删除分组，以及宿主关闭文档导致的文件列表变化
//! - **轻量刷新**（不触碰宿主资源）：可见编辑器变化、活动编辑器变化、窗口焦点变化，
//!   只向宿主推送"是否存在分组"和"已分组路径集合"两个信号
//!
//! 启动时执行且只执行一次不重新加载的重绘，使已持久化的快照立即生效。
//! 长期运行的宿主集成负责在加载完成后调用一次 `activate()`；
//! 命令行每次只执行一条命令，由 `repaint` 子命令（不带 `--reload`）走同一入口。
//!
//! 补丁失败只记录日志并向宿主报告一次，不自动重试；
//! 分组仓库始终是可信数据源，失败时界面退化为"无可视分组"。

use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;

use crate::error::EngineError;
use crate::models::notice::Notice;
use crate::services::binding_script::BindingScriptGenerator;
use crate::services::group_store::{AddOutcome, GroupStore, RemoveOutcome};
use crate::services::persistence::SnapshotPort;
use crate::services::resource_patcher::ResourcePatcher;

/// 宿主侧协作方
pub trait HostBridge {
    /// 宿主当前打开的文件路径；宿主无法提供时返回 `None`
    fn open_paths(&self) -> Option<HashSet<String>>;

    /// 接收轻量刷新信号，用于启用/禁用菜单项
    fn update_affordances(&self, has_groups: bool, grouped_paths: &BTreeSet<String>);

    /// 展示一条用户通知
    fn notify(&self, notice: &Notice);
}

pub struct SyncController<P, H> {
    store: GroupStore<P>,
    generator: BindingScriptGenerator,
    patcher: ResourcePatcher,
    host: H,
    reload_after_patch: bool,
}

impl<P: SnapshotPort, H: HostBridge> SyncController<P, H> {
    pub fn new(
        store: GroupStore<P>,
        generator: BindingScriptGenerator,
        patcher: ResourcePatcher,
        host: H,
        reload_after_patch: bool,
    ) -> Self {
        Self {
            store,
            generator,
            patcher,
            host,
            reload_after_patch,
        }
    }

    pub fn store(&self) -> &GroupStore<P> {
        &self.store
    }

    pub fn patcher(&self) -> &ResourcePatcher {
        &self.patcher
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// 启动：一次不重新加载的重绘，然后刷新宿主信号
    pub async fn activate(&mut self) -> Result<PathBuf, EngineError> {
        let result = self.repaint(false).await;
        self.refresh_affordances();
        result
    }

    // ======== 变更入口 ========

    /// 创建分组（空分组不绑定任何标签页，只刷新宿主信号）
    pub fn create_group(&mut self, name: &str) -> Result<String, EngineError> {
        let result = self.store.create_group(name).map(|group| group.color.clone());
        if state_changed(&result) {
            self.refresh_affordances();
        }
        result
    }

    pub async fn add_file(
        &mut self,
        group_name: &str,
        display_name: &str,
        path: &str,
    ) -> Result<AddOutcome, EngineError> {
        let result = self.store.add_file(group_name, display_name, path);
        self.settle(&result).await;
        result
    }

    pub async fn remove_file(
        &mut self,
        group_name: &str,
        display_name: &str,
    ) -> Result<RemoveOutcome, EngineError> {
        let result = self.store.remove_file(group_name, display_name);
        self.settle(&result).await;
        result
    }

    /// 按确切路径从指定分组移除文件
    pub async fn remove_path_from(
        &mut self,
        group_name: &str,
        path: &str,
    ) -> Result<RemoveOutcome, EngineError> {
        let result = self.store.remove_path_from(group_name, path);
        self.settle(&result).await;
        result
    }

    pub async fn remove_group(&mut self, name: &str) -> Result<(), EngineError> {
        let result = self.store.remove_group(name).map(|_| ());
        self.settle(&result).await;
        result
    }

    // ======== 宿主生命周期事件 ========

    /// 宿主关闭文档：按路径（而非展示名称）移除文件，避免同名歧义
    pub async fn on_document_closed(
        &mut self,
        path: &str,
    ) -> Result<Option<RemoveOutcome>, EngineError> {
        let result = self.store.remove_path(path);
        let changed = match &result {
            Ok(removed) => removed.is_some(),
            Err(e) => matches!(e, EngineError::Persistence(_)),
        };
        if changed {
            self.repaint(self.reload_after_patch).await.ok();
        }
        self.refresh_affordances();
        result
    }

    pub fn on_visible_editors_changed(&self) {
        self.refresh_affordances();
    }

    pub fn on_active_editor_changed(&self) {
        self.refresh_affordances();
    }

    pub fn on_window_state_changed(&self) {
        self.refresh_affordances();
    }

    // ======== 刷新与重绘 ========

    /// 轻量刷新：不涉及任何文件 I/O
    pub fn refresh_affordances(&self) {
        let grouped = self.store.grouped_paths();
        log::debug!(
            "刷新宿主信号: has_groups={}, grouped={}",
            self.store.has_groups(),
            grouped.len()
        );
        self.host.update_affordances(self.store.has_groups(), &grouped);
    }

    /// 完整重绘：根据当前状态生成脚本并补丁工作台资源
    ///
    /// 失败时记录日志并向宿主报告一次，然后原样返回错误。
    pub async fn repaint(&self, reload: bool) -> Result<PathBuf, EngineError> {
        let open = self.host.open_paths();
        let bundle = self.generator.generate(self.store.groups(), open.as_ref());

        match self
            .patcher
            .write_patch(&bundle.script, &bundle.style, reload)
            .await
        {
            Ok(resource) => Ok(resource),
            Err(e) => {
                log::error!("补丁工作台资源失败: {}", e);
                self.host.notify(&e.to_notice());
                Err(e)
            }
        }
    }

    /// 从备份恢复工作台资源
    pub async fn restore(&self) -> Result<PathBuf, EngineError> {
        self.patcher.restore_patch().await
    }

    /// 变更之后：状态确有变化时重绘并刷新
    async fn settle<T>(&self, result: &Result<T, EngineError>) {
        if state_changed(result) {
            self.repaint(self.reload_after_patch).await.ok();
            self.refresh_affordances();
        }
    }
}

/// 操作成功，或仅快照保存失败（内存状态已变更）
fn state_changed<T>(result: &Result<T, EngineError>) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => matches!(e, EngineError::Persistence(_)),
    }
}
