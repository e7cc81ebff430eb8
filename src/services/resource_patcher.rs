//! # 工作台资源补丁服务
//!
//! 对宿主应用的静态 UI 资源（工作台 HTML）执行"先备份、后补丁"以及"从备份恢复"的生命周期，
//! 保证多次补丁不会累积重复注入，也不会破坏宿主文件。
//!
//! ## 备份（仅一次）
//! 第一次补丁前，将未经修改的资源复制到同目录下的固定备份文件
//! （`workbench.tab-groups.bak.html`）。这是回到原始宿主状态的唯一途径，
//! 之后的任何补丁都不会覆盖它。
//!
//! ## 补丁流程
//! 1. 按固定顺序尝试已知的目录布局，定位资源文件
//! 2. 备份不存在时创建备份
//! 3. 解析文档，移除 CSP meta 节点
//! 4. 移除旧的注入节点后插入新节点（幂等）
//! 5. 写回原路径；I/O 失败直接上报，不重试，写入不保证原子性
//! 6. 需要时发出宿主重新加载信号
//!
//! ## 并发
//! 补丁与恢复操作通过内部的在途互斥锁串行执行，
//! 避免两次"读取-解析-写回"交错导致更新丢失或文档损坏。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::EngineError;
use crate::services::workbench_document::WorkbenchDocument;

/// 工作台资源相对于宿主安装目录的候选路径（按顺序尝试）
pub const RESOURCE_CANDIDATES: [&str; 2] = [
    "out/vs/code/electron-sandbox/workbench/workbench.html",
    "out/vs/code/electron-browser/workbench/workbench.html",
];

/// 与资源同目录的备份文件名
pub const BACKUP_FILE_NAME: &str = "workbench.tab-groups.bak.html";

/// 宿主重新加载信号（发出即忘）
pub trait ReloadSignal: Send + Sync {
    fn request_reload(&self);
}

/// 补丁状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchStatus {
    /// 解析到的资源文件路径
    pub resource: PathBuf,
    /// 备份文件路径
    pub backup: PathBuf,
    /// 备份是否存在
    pub has_backup: bool,
    /// 资源当前是否带有注入节点
    pub patched: bool,
}

pub struct ResourcePatcher {
    install_dir: PathBuf,
    reload: Arc<dyn ReloadSignal>,
    in_flight: Mutex<()>,
}

impl ResourcePatcher {
    pub fn new(install_dir: impl Into<PathBuf>, reload: Arc<dyn ReloadSignal>) -> Self {
        Self {
            install_dir: install_dir.into(),
            reload,
            in_flight: Mutex::new(()),
        }
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    /// 按顺序尝试候选布局，返回第一个存在的资源路径
    ///
    /// # 错误
    /// 所有候选路径都不存在时返回 `ResourceNotFound`（附带已尝试的路径）
    pub fn resolve_resource(&self) -> Result<PathBuf, EngineError> {
        let candidates: Vec<PathBuf> = RESOURCE_CANDIDATES
            .iter()
            .map(|relative| self.install_dir.join(relative))
            .collect();

        if let Some(found) = candidates.iter().find(|path| path.is_file()) {
            return Ok(found.clone());
        }
        Err(EngineError::ResourceNotFound(candidates))
    }

    /// 资源文件对应的备份路径
    pub fn backup_path_for(resource: &Path) -> PathBuf {
        resource.with_file_name(BACKUP_FILE_NAME)
    }

    /// 将样式与脚本注入工作台资源
    ///
    /// # 参数
    /// - `script` - 运行时绑定脚本正文
    /// - `style` - 样式正文
    /// - `reload` - 写入成功后是否请求宿主重新加载
    ///
    /// # 返回值
    /// 被写入的资源文件路径
    pub async fn write_patch(
        &self,
        script: &str,
        style: &str,
        reload: bool,
    ) -> Result<PathBuf, EngineError> {
        let _guard = self.in_flight.lock().await;

        // 1. 定位资源
        let resource = self.resolve_resource()?;

        // 2. 首次补丁前创建一次性备份
        let backup = Self::backup_path_for(&resource);
        let content = tokio::fs::read_to_string(&resource)
            .await
            .map_err(|e| EngineError::WriteFailure(format!("读取工作台资源失败: {}", e)))?;
        let mut document = WorkbenchDocument::parse(content);

        if !backup.exists() {
            if document.is_patched() {
                // 资源已带有注入但备份丢失：备份去掉注入节点后的内容
                log::warn!("工作台资源已被修改但缺少备份，备份将移除旧的注入节点（已移除的 CSP 无法找回）");
                let mut cleaned = document.clone();
                cleaned.remove_injected();
                tokio::fs::write(&backup, cleaned.as_str())
                    .await
                    .map_err(|e| EngineError::WriteFailure(format!("创建备份失败: {}", e)))?;
            } else {
                tokio::fs::copy(&resource, &backup)
                    .await
                    .map_err(|e| EngineError::WriteFailure(format!("创建备份失败: {}", e)))?;
            }
            log::info!("已创建工作台资源备份: {}", backup.display());
        }

        // 3. 放宽 CSP，4. 替换注入节点
        let stripped = document.strip_content_security_policy();
        if stripped > 0 {
            log::debug!("已移除 {} 个 CSP meta 节点", stripped);
        }
        document.inject(style, script);

        // 5. 写回
        tokio::fs::write(&resource, document.into_string())
            .await
            .map_err(|e| EngineError::WriteFailure(format!("写入工作台资源失败: {}", e)))?;
        log::info!("已更新工作台资源: {}", resource.display());

        // 6. 请求重新加载
        if reload {
            self.reload.request_reload();
        }

        Ok(resource)
    }

    /// 用备份覆盖工作台资源，并请求宿主重新加载
    ///
    /// # 错误
    /// 备份不存在时返回 `NoBackup`
    pub async fn restore_patch(&self) -> Result<PathBuf, EngineError> {
        let _guard = self.in_flight.lock().await;

        let resource = self.resolve_resource()?;
        let backup = Self::backup_path_for(&resource);
        if !backup.exists() {
            return Err(EngineError::NoBackup(backup));
        }

        tokio::fs::copy(&backup, &resource)
            .await
            .map_err(|e| EngineError::WriteFailure(format!("从备份恢复失败: {}", e)))?;
        log::info!("已从备份恢复工作台资源: {}", resource.display());

        self.reload.request_reload();
        Ok(resource)
    }

    /// 查询当前补丁状态（只读）
    pub async fn status(&self) -> Result<PatchStatus, EngineError> {
        let _guard = self.in_flight.lock().await;

        let resource = self.resolve_resource()?;
        let backup = Self::backup_path_for(&resource);
        let content = tokio::fs::read_to_string(&resource)
            .await
            .map_err(|e| EngineError::WriteFailure(format!("读取工作台资源失败: {}", e)))?;

        Ok(PatchStatus {
            has_backup: backup.exists(),
            patched: WorkbenchDocument::parse(content).is_patched(),
            resource,
            backup,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) const PRISTINE: &str = "<!DOCTYPE html>\n<html>\n\t<head>\n\t\t<meta http-equiv=\"Content-Security-Policy\" content=\"default-src 'none'; script-src 'self';\">\n\t</head>\n\t<body></body>\n</html>\n";

    #[derive(Default)]
    pub(crate) struct ReloadCounter(pub AtomicUsize);

    impl ReloadSignal for ReloadCounter {
        fn request_reload(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// 在临时目录中搭建宿主安装目录，资源位于指定的候选布局
    pub(crate) fn install(candidate: usize) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let resource = dir.path().join(RESOURCE_CANDIDATES[candidate]);
        std::fs::create_dir_all(resource.parent().unwrap()).unwrap();
        std::fs::write(&resource, PRISTINE).unwrap();
        (dir, resource)
    }

    fn patcher(dir: &Path) -> (ResourcePatcher, Arc<ReloadCounter>) {
        let counter = Arc::new(ReloadCounter::default());
        (ResourcePatcher::new(dir, counter.clone()), counter)
    }

    #[tokio::test]
    async fn test_missing_resource() {
        let dir = tempfile::tempdir().unwrap();
        let (patcher, _) = patcher(dir.path());
        let err = patcher.write_patch("x", "s", false).await.unwrap_err();
        match err {
            EngineError::ResourceNotFound(tried) => assert_eq!(tried.len(), 2),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resolves_second_layout() {
        let (dir, resource) = install(1);
        let (patcher, _) = patcher(dir.path());
        assert_eq!(patcher.resolve_resource().unwrap(), resource);
    }

    #[tokio::test]
    async fn test_patch_twice_is_idempotent() {
        let (dir, resource) = install(0);
        let (patcher, reloads) = patcher(dir.path());

        patcher.write_patch("console.log(1);", ".a{}", false).await.unwrap();
        let first = std::fs::read_to_string(&resource).unwrap();
        patcher.write_patch("console.log(1);", ".a{}", true).await.unwrap();
        let second = std::fs::read_to_string(&resource).unwrap();

        assert_eq!(first, second);
        let doc = WorkbenchDocument::parse(second);
        assert_eq!(doc.injected_counts(), (1, 1));
        assert!(!doc.has_content_security_policy());
        assert_eq!(reloads.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_backup_is_created_once() {
        let (dir, resource) = install(0);
        let (patcher, _) = patcher(dir.path());
        let backup = ResourcePatcher::backup_path_for(&resource);

        patcher.write_patch("one", "s", false).await.unwrap();
        patcher.write_patch("two", "s", false).await.unwrap();
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), PRISTINE);
    }

    #[tokio::test]
    async fn test_restore_is_byte_identical() {
        let (dir, resource) = install(0);
        let (patcher, reloads) = patcher(dir.path());

        for i in 0..3 {
            patcher
                .write_patch(&format!("console.log({});", i), ".a{}", false)
                .await
                .unwrap();
        }
        patcher.restore_patch().await.unwrap();

        assert_eq!(std::fs::read(&resource).unwrap(), PRISTINE.as_bytes());
        assert_eq!(reloads.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_backup_of_patched_resource_drops_injected_nodes() {
        let (dir, resource) = install(0);
        let mut stale = WorkbenchDocument::parse(PRISTINE);
        stale.inject(".old{}", "old();");
        std::fs::write(&resource, stale.as_str()).unwrap();
        let (patcher, _) = patcher(dir.path());

        patcher.write_patch("new();", ".new{}", false).await.unwrap();

        let backup = std::fs::read_to_string(ResourcePatcher::backup_path_for(&resource)).unwrap();
        assert_eq!(WorkbenchDocument::parse(backup.as_str()).injected_counts(), (0, 0));
        assert_eq!(backup, PRISTINE);

        patcher.restore_patch().await.unwrap();
        assert_eq!(std::fs::read_to_string(&resource).unwrap(), PRISTINE);
    }

    #[tokio::test]
    async fn test_restore_without_backup() {
        let (dir, _) = install(0);
        let (patcher, reloads) = patcher(dir.path());
        let err = patcher.restore_patch().await.unwrap_err();
        assert!(matches!(err, EngineError::NoBackup(_)));
        assert_eq!(reloads.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrent_patches_are_serialized() {
        let (dir, resource) = install(0);
        let (patcher, _) = patcher(dir.path());

        let (a, b) = tokio::join!(
            patcher.write_patch("a();", ".a{}", false),
            patcher.write_patch("b();", ".b{}", false),
        );
        a.unwrap();
        b.unwrap();

        let doc = WorkbenchDocument::parse(std::fs::read_to_string(&resource).unwrap());
        assert_eq!(doc.injected_counts(), (1, 1));
    }

    #[tokio::test]
    async fn test_status() {
        let (dir, _) = install(0);
        let (patcher, _) = patcher(dir.path());

        let before = patcher.status().await.unwrap();
        assert!(!before.patched && !before.has_backup);

        patcher.write_patch("x", "s", false).await.unwrap();
        let after = patcher.status().await.unwrap();
        assert!(after.patched && after.has_backup);
    }
}
