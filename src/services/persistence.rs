//! # 分组快照持久化端口
//!
//! 分组仓库通过注入的 `SnapshotPort` 加载和保存快照，不依赖任何全局状态：
//! - 启动时调用一次 `load()`，快照不存在时返回空映射
//! - 每次变更操作之后调用 `save()`
//!
//! 提供两个实现：
//! - `JsonFileSnapshot` - 保存为带缩进的 JSON 文件（默认 `~/.mo/TabGroups/groups.json`）
//! - `MemorySnapshot` - 纯内存实现，供嵌入方和测试使用

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::models::group::GroupSnapshot;

/// 快照加载/保存端口
pub trait SnapshotPort {
    /// 加载快照；不存在时返回空映射
    fn load(&self) -> Result<GroupSnapshot, String>;

    /// 保存完整快照
    fn save(&self, snapshot: &GroupSnapshot) -> Result<(), String>;
}

/// JSON 文件快照
pub struct JsonFileSnapshot {
    path: PathBuf,
}

impl JsonFileSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotPort for JsonFileSnapshot {
    fn load(&self) -> Result<GroupSnapshot, String> {
        // 快照文件不存在（首次使用）时返回空映射
        if !self.path.exists() {
            return Ok(GroupSnapshot::new());
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| format!("读取分组快照失败: {}", e))?;

        // 空文件视为空快照
        if content.trim().is_empty() {
            return Ok(GroupSnapshot::new());
        }

        serde_json::from_str(&content).map_err(|e| format!("解析分组快照失败: {}", e))
    }

    fn save(&self, snapshot: &GroupSnapshot) -> Result<(), String> {
        // 确保快照目录存在，递归创建所有缺失的父目录
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("创建快照目录失败: {}", e))?;
            }
        }

        let content = serde_json::to_string_pretty(snapshot)
            .map_err(|e| format!("序列化分组快照失败: {}", e))?;

        std::fs::write(&self.path, content).map_err(|e| format!("写入分组快照失败: {}", e))
    }
}

/// 内存快照
///
/// 克隆出的实例共享同一份数据，调用方可以保留一个副本观察保存结果。
#[derive(Clone, Default)]
pub struct MemorySnapshot {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    snapshot: GroupSnapshot,
    saves: usize,
}

impl MemorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以已有快照作为初始内容
    pub fn with_snapshot(snapshot: GroupSnapshot) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryState { snapshot, saves: 0 })),
        }
    }

    /// 最近一次保存的快照
    pub fn saved(&self) -> GroupSnapshot {
        self.inner
            .lock()
            .map(|state| state.snapshot.clone())
            .unwrap_or_default()
    }

    /// 累计保存次数
    pub fn save_count(&self) -> usize {
        self.inner.lock().map(|state| state.saves).unwrap_or(0)
    }
}

impl SnapshotPort for MemorySnapshot {
    fn load(&self) -> Result<GroupSnapshot, String> {
        self.inner
            .lock()
            .map(|state| state.snapshot.clone())
            .map_err(|_| "内存快照锁已失效".to_string())
    }

    fn save(&self, snapshot: &GroupSnapshot) -> Result<(), String> {
        let mut state = self
            .inner
            .lock()
            .map_err(|_| "内存快照锁已失效".to_string())?;
        state.snapshot = snapshot.clone();
        state.saves += 1;
        Ok(())
    }
}
