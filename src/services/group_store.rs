//! # 分组仓库
//!
//! 分组与文件状态的唯一可信数据源，持有全部分组数据和注入的快照端口。
//!
//! ## 不变量
//! 1. 同一个 `path` 在任意时刻至多属于一个分组（加入新分组会隐式地从旧分组移除）
//! 2. 移除文件导致分组文件列表变空时，该分组在同一操作内被删除
//! 3. 分组名在仓库内唯一
//!
//! ## 错误语义
//! 失败的操作不改变任何状态。唯一的例外是快照保存失败（`Persistence`）：
//! 内存中的变更已经生效（内存状态才是可信数据源），错误仅用于提示保存失败。

use std::collections::BTreeSet;

use rand::rngs::StdRng;

use crate::error::EngineError;
use crate::models::group::{FileRef, Group, GroupSnapshot};
use crate::services::color::ColorAllocator;
use crate::services::persistence::SnapshotPort;

/// `add_file` 的执行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    /// 文件原先所属的分组（被移动时）
    pub moved_from: Option<String>,
    /// 原分组是否因此变空并被删除
    pub source_deleted: bool,
}

/// `remove_file` / `remove_path` 的执行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveOutcome {
    /// 文件被移出的分组
    pub group: String,
    /// 被移除的文件
    pub file: FileRef,
    /// 分组是否因此变空并被删除
    pub group_deleted: bool,
}

pub struct GroupStore<P> {
    groups: GroupSnapshot,
    port: P,
    colors: ColorAllocator<StdRng>,
}

impl<P: SnapshotPort> GroupStore<P> {
    /// 通过快照端口加载分组仓库（启动时调用一次）
    pub fn load(port: P) -> Result<Self, EngineError> {
        Self::load_with_colors(port, ColorAllocator::new())
    }

    /// 使用指定的颜色分配器加载（测试中可注入固定种子）
    pub fn load_with_colors(
        port: P,
        colors: ColorAllocator<StdRng>,
    ) -> Result<Self, EngineError> {
        let snapshot = port.load().map_err(EngineError::Persistence)?;
        let groups = normalize(snapshot);
        log::debug!("已加载 {} 个分组", groups.len());
        Ok(Self {
            groups,
            port,
            colors,
        })
    }

    // ======== 变更操作 ========

    /// 创建分组并分配颜色
    ///
    /// 重名时拒绝创建，返回 `DuplicateGroup`，已有分组保持不变。
    pub fn create_group(&mut self, name: &str) -> Result<&Group, EngineError> {
        if self.groups.contains_key(name) {
            return Err(EngineError::DuplicateGroup(name.to_string()));
        }

        let color = self.colors.next_color();
        log::debug!("创建分组 {} ({})", name, color);
        self.groups.insert(name.to_string(), Group::new(color));
        self.persist()?;

        self.groups
            .get(name)
            .ok_or_else(|| EngineError::GroupNotFound(name.to_string()))
    }

    /// 将文件加入分组
    ///
    /// - 分组不存在：`GroupNotFound`
    /// - 文件已在该分组：空操作，返回 `AlreadyMember` 提示
    /// - 文件属于其他分组：先从原分组移除（原分组变空则删除），再追加到目标分组末尾
    pub fn add_file(
        &mut self,
        group_name: &str,
        display_name: &str,
        path: &str,
    ) -> Result<AddOutcome, EngineError> {
        let target = self
            .groups
            .get(group_name)
            .ok_or_else(|| EngineError::GroupNotFound(group_name.to_string()))?;

        if target.contains_path(path) {
            return Err(EngineError::AlreadyMember {
                group: group_name.to_string(),
                path: path.to_string(),
            });
        }

        let detached = self.detach_path(path);

        if let Some(group) = self.groups.get_mut(group_name) {
            group.files.push(FileRef::new(display_name, path));
        }
        log::debug!("文件 {} 加入分组 {}", path, group_name);

        let outcome = match detached {
            Some(removed) => AddOutcome {
                moved_from: Some(removed.group),
                source_deleted: removed.group_deleted,
            },
            None => AddOutcome {
                moved_from: None,
                source_deleted: false,
            },
        };

        self.persist()?;
        Ok(outcome)
    }

    /// 按展示名称从分组中移除文件
    ///
    /// 同一分组内若存在多个同名文件，只移除第一个（展示名称无法区分它们）。
    pub fn remove_file(
        &mut self,
        group_name: &str,
        display_name: &str,
    ) -> Result<RemoveOutcome, EngineError> {
        let group = self
            .groups
            .get_mut(group_name)
            .ok_or_else(|| EngineError::GroupNotFound(group_name.to_string()))?;

        let index = group
            .files
            .iter()
            .position(|f| f.name == display_name)
            .ok_or_else(|| EngineError::NotMember {
                group: group_name.to_string(),
                name: display_name.to_string(),
            })?;

        let file = group.files.remove(index);
        let group_deleted = group.files.is_empty();
        if group_deleted {
            self.groups.shift_remove(group_name);
        }
        log::debug!(
            "文件 {} 移出分组 {}{}",
            file.path,
            group_name,
            if group_deleted { "（分组已清空并删除）" } else { "" }
        );

        self.persist()?;
        Ok(RemoveOutcome {
            group: group_name.to_string(),
            file,
            group_deleted,
        })
    }

    /// 按路径从指定分组中移除文件
    ///
    /// 调用方已知确切路径时使用，不受展示名称重名影响。
    /// 路径不在该分组中时返回 `NotMember`，状态不变。
    pub fn remove_path_from(
        &mut self,
        group_name: &str,
        path: &str,
    ) -> Result<RemoveOutcome, EngineError> {
        let group = self
            .groups
            .get(group_name)
            .ok_or_else(|| EngineError::GroupNotFound(group_name.to_string()))?;

        if !group.contains_path(path) {
            return Err(EngineError::NotMember {
                group: group_name.to_string(),
                name: path.to_string(),
            });
        }

        // 互斥不变量保证持有该路径的分组就是 group_name
        let removed = self
            .detach_path(path)
            .ok_or_else(|| EngineError::NotMember {
                group: group_name.to_string(),
                name: path.to_string(),
            })?;
        log::debug!(
            "文件 {} 移出分组 {}{}",
            path,
            group_name,
            if removed.group_deleted { "（分组已清空并删除）" } else { "" }
        );

        self.persist()?;
        Ok(removed)
    }

    /// 删除整个分组
    pub fn remove_group(&mut self, name: &str) -> Result<Group, EngineError> {
        let group = self
            .groups
            .shift_remove(name)
            .ok_or_else(|| EngineError::GroupNotFound(name.to_string()))?;
        log::debug!("删除分组 {}（{} 个文件）", name, group.files.len());

        self.persist()?;
        Ok(group)
    }

    /// 按路径移除文件（宿主关闭文档时使用）
    ///
    /// 路径未被任何分组持有时返回 `Ok(None)`，不会触发保存。
    pub fn remove_path(&mut self, path: &str) -> Result<Option<RemoveOutcome>, EngineError> {
        let Some(removed) = self.detach_path(path) else {
            return Ok(None);
        };
        log::debug!("已关闭的文件 {} 移出分组 {}", path, removed.group);

        self.persist()?;
        Ok(Some(removed))
    }

    // ======== 查询操作 ========

    /// 按展示名称查找文件所属的分组（按分组顺序线性扫描，返回第一个匹配）
    ///
    /// 不同目录下存在同名文件时结果有歧义。
    pub fn find_group_for_file(&self, display_name: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|(_, group)| group.files.iter().any(|f| f.name == display_name))
            .map(|(name, _)| name.as_str())
    }

    /// 持有指定路径的分组名称列表
    ///
    /// 在互斥不变量下至多一个元素。
    pub fn groups_containing(&self, path: &str) -> Vec<String> {
        self.groups
            .iter()
            .filter(|(_, group)| group.contains_path(path))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// 所有已分组文件的路径集合
    pub fn grouped_paths(&self) -> BTreeSet<String> {
        self.groups
            .values()
            .flat_map(|group| group.files.iter().map(|f| f.path.clone()))
            .collect()
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    /// 全部分组（按创建顺序）
    pub fn groups(&self) -> &GroupSnapshot {
        &self.groups
    }

    pub fn has_groups(&self) -> bool {
        !self.groups.is_empty()
    }

    /// 当前状态的完整快照副本
    pub fn snapshot(&self) -> GroupSnapshot {
        self.groups.clone()
    }

    // ======== 内部辅助函数 ========

    /// 将路径从所属分组中摘除，分组变空时一并删除
    fn detach_path(&mut self, path: &str) -> Option<RemoveOutcome> {
        let (index, group_name, group) = self
            .groups
            .iter_mut()
            .enumerate()
            .find(|(_, (_, group))| group.contains_path(path))
            .map(|(index, (name, group))| (index, name.clone(), group))?;

        let position = group.files.iter().position(|f| f.path == path)?;
        let file = group.files.remove(position);
        let group_deleted = group.files.is_empty();
        if group_deleted {
            self.groups.shift_remove_index(index);
        }

        Some(RemoveOutcome {
            group: group_name,
            file,
            group_deleted,
        })
    }

    fn persist(&self) -> Result<(), EngineError> {
        self.port.save(&self.groups).map_err(|e| {
            log::error!("保存分组快照失败: {}", e);
            EngineError::Persistence(e)
        })
    }
}

/// 加载时修复违反互斥不变量的快照：同一路径只保留第一次出现的位置
///
/// 显式创建但尚未加入文件的空分组原样保留；
/// 仅因去重而变空的分组会被删除。
fn normalize(snapshot: GroupSnapshot) -> GroupSnapshot {
    let mut seen = BTreeSet::new();
    let mut result = GroupSnapshot::new();

    for (name, mut group) in snapshot {
        let was_empty = group.files.is_empty();
        group.files.retain(|file| {
            let fresh = seen.insert(file.path.clone());
            if !fresh {
                log::warn!("快照中文件 {} 重复出现，已从分组 {} 移除", file.path, name);
            }
            fresh
        });
        if was_empty || !group.files.is_empty() {
            result.insert(name, group);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::persistence::MemorySnapshot;
    use rand::SeedableRng;

    fn store() -> (GroupStore<MemorySnapshot>, MemorySnapshot) {
        let port = MemorySnapshot::new();
        let colors = ColorAllocator::with_rng(StdRng::seed_from_u64(42));
        let store = GroupStore::load_with_colors(port.clone(), colors).unwrap();
        (store, port)
    }

    /// 互斥不变量
    fn assert_invariants<P: SnapshotPort>(store: &GroupStore<P>) {
        let mut seen = BTreeSet::new();
        for group in store.groups().values() {
            for file in &group.files {
                assert!(seen.insert(file.path.clone()), "{} 出现在多个分组中", file.path);
            }
        }
    }

    #[test]
    fn test_create_then_add_single_file() {
        let (mut store, port) = store();
        store.create_group("Backend").unwrap();
        store.add_file("Backend", "a.ts", "/x/a.ts").unwrap();

        assert_eq!(store.groups().len(), 1);
        assert_eq!(store.group("Backend").unwrap().files.len(), 1);
        assert_eq!(
            store.grouped_paths(),
            BTreeSet::from(["/x/a.ts".to_string()])
        );
        // 每次变更后都会保存
        assert_eq!(port.save_count(), 2);
        assert_eq!(port.saved(), store.snapshot());
    }

    #[test]
    fn test_move_deletes_emptied_source() {
        let (mut store, _) = store();
        store.create_group("Backend").unwrap();
        store.add_file("Backend", "a.ts", "/x/a.ts").unwrap();
        store.create_group("Frontend").unwrap();

        let outcome = store.add_file("Frontend", "a.ts", "/x/a.ts").unwrap();
        assert_eq!(outcome.moved_from.as_deref(), Some("Backend"));
        assert!(outcome.source_deleted);

        assert!(store.group("Backend").is_none());
        let frontend = store.group("Frontend").unwrap();
        assert_eq!(frontend.files, vec![FileRef::new("a.ts", "/x/a.ts")]);
        assert_invariants(&store);
    }

    #[test]
    fn test_move_keeps_non_empty_source() {
        let (mut store, _) = store();
        store.create_group("Backend").unwrap();
        store.add_file("Backend", "a.ts", "/x/a.ts").unwrap();
        store.add_file("Backend", "b.ts", "/x/b.ts").unwrap();
        store.create_group("Frontend").unwrap();

        let outcome = store.add_file("Frontend", "a.ts", "/x/a.ts").unwrap();
        assert!(!outcome.source_deleted);
        assert_eq!(
            store.group("Backend").unwrap().files,
            vec![FileRef::new("b.ts", "/x/b.ts")]
        );
        assert_invariants(&store);
    }

    #[test]
    fn test_remove_last_file_deletes_group() {
        let (mut store, _) = store();
        store.create_group("Backend").unwrap();
        store.add_file("Backend", "a.ts", "/x/a.ts").unwrap();

        let outcome = store.remove_file("Backend", "a.ts").unwrap();
        assert!(outcome.group_deleted);
        assert!(store.group("Backend").is_none());
        assert!(!store.has_groups());
    }

    #[test]
    fn test_remove_missing_group_leaves_store_unchanged() {
        let (mut store, port) = store();
        store.create_group("Backend").unwrap();
        let before = store.snapshot();
        let saves = port.save_count();

        let err = store.remove_group("DoesNotExist").unwrap_err();
        assert_eq!(err, EngineError::GroupNotFound("DoesNotExist".into()));
        assert_eq!(store.snapshot(), before);
        assert_eq!(port.save_count(), saves);
    }

    #[test]
    fn test_add_to_missing_group() {
        let (mut store, _) = store();
        let err = store.add_file("Nope", "a.ts", "/x/a.ts").unwrap_err();
        assert_eq!(err, EngineError::GroupNotFound("Nope".into()));
        assert!(store.grouped_paths().is_empty());
    }

    #[test]
    fn test_already_member_is_noop() {
        let (mut store, port) = store();
        store.create_group("Backend").unwrap();
        store.add_file("Backend", "a.ts", "/x/a.ts").unwrap();
        let saves = port.save_count();

        let err = store.add_file("Backend", "a.ts", "/x/a.ts").unwrap_err();
        assert!(err.is_warning());
        assert_eq!(store.group("Backend").unwrap().files.len(), 1);
        assert_eq!(port.save_count(), saves);
    }

    #[test]
    fn test_remove_unknown_display_name() {
        let (mut store, _) = store();
        store.create_group("Backend").unwrap();
        store.add_file("Backend", "a.ts", "/x/a.ts").unwrap();

        let err = store.remove_file("Backend", "b.ts").unwrap_err();
        assert!(matches!(err, EngineError::NotMember { .. }));
        assert_eq!(store.group("Backend").unwrap().files.len(), 1);
    }

    #[test]
    fn test_duplicate_group_is_rejected() {
        let (mut store, _) = store();
        store.create_group("Backend").unwrap();
        store.add_file("Backend", "a.ts", "/x/a.ts").unwrap();
        let color = store.group("Backend").unwrap().color.clone();

        let err = store.create_group("Backend").unwrap_err();
        assert_eq!(err, EngineError::DuplicateGroup("Backend".into()));
        let group = store.group("Backend").unwrap();
        assert_eq!(group.color, color);
        assert_eq!(group.files.len(), 1);
    }

    #[test]
    fn test_remove_path_cascades() {
        let (mut store, _) = store();
        store.create_group("Backend").unwrap();
        store.add_file("Backend", "a.ts", "/x/a.ts").unwrap();

        assert_eq!(store.remove_path("/elsewhere.ts").unwrap(), None);
        let removed = store.remove_path("/x/a.ts").unwrap().unwrap();
        assert_eq!(removed.group, "Backend");
        assert!(removed.group_deleted);
        assert!(store.group("Backend").is_none());
    }

    #[test]
    fn test_find_group_for_file_returns_first_match() {
        let (mut store, _) = store();
        store.create_group("One").unwrap();
        store.create_group("Two").unwrap();
        store.add_file("One", "mod.rs", "/a/mod.rs").unwrap();
        store.add_file("Two", "mod.rs", "/b/mod.rs").unwrap();

        assert_eq!(store.find_group_for_file("mod.rs"), Some("One"));
        assert_eq!(store.find_group_for_file("lib.rs"), None);
        assert_eq!(store.groups_containing("/b/mod.rs"), vec!["Two".to_string()]);
    }

    #[test]
    fn test_files_keep_insertion_order() {
        let (mut store, _) = store();
        store.create_group("G").unwrap();
        for name in ["c", "a", "b"] {
            store.add_file("G", name, &format!("/p/{}", name)).unwrap();
        }
        let names: Vec<&str> = store
            .group("G")
            .unwrap()
            .files
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_remove_path_from_ignores_display_name_collisions() {
        let (mut store, _) = store();
        store.create_group("A").unwrap();
        store.add_file("A", "mod.rs", "/a/mod.rs").unwrap();
        store.add_file("A", "mod.rs", "/b/mod.rs").unwrap();

        let removed = store.remove_path_from("A", "/b/mod.rs").unwrap();
        assert_eq!(removed.file, FileRef::new("mod.rs", "/b/mod.rs"));
        assert!(!removed.group_deleted);
        assert_eq!(
            store.group("A").unwrap().files,
            vec![FileRef::new("mod.rs", "/a/mod.rs")]
        );
    }

    #[test]
    fn test_remove_path_from_rejects_unknown_path() {
        let (mut store, port) = store();
        store.create_group("B").unwrap();
        store.add_file("B", "x.rs", "/c/x.rs").unwrap();
        store.add_file("B", "keep.rs", "/c/keep.rs").unwrap();
        let before = store.snapshot();
        let saves = port.save_count();

        let err = store.remove_path_from("B", "/elsewhere/x.rs").unwrap_err();
        assert_eq!(
            err,
            EngineError::NotMember {
                group: "B".into(),
                name: "/elsewhere/x.rs".into(),
            }
        );
        assert_eq!(store.snapshot(), before);
        assert_eq!(port.save_count(), saves);

        let err = store.remove_path_from("Nope", "/c/x.rs").unwrap_err();
        assert_eq!(err, EngineError::GroupNotFound("Nope".into()));
    }

    #[test]
    fn test_remove_path_from_cascades() {
        let (mut store, _) = store();
        store.create_group("G").unwrap();
        store.add_file("G", "a.ts", "/x/a.ts").unwrap();

        let removed = store.remove_path_from("G", "/x/a.ts").unwrap();
        assert!(removed.group_deleted);
        assert!(store.group("G").is_none());
    }

    #[test]
    fn test_random_mutations_preserve_invariants() {
        use rand::Rng;

        let (mut store, _) = store();
        let mut rng = StdRng::seed_from_u64(1234);
        let names = ["A", "B", "C"];
        // 显式创建后尚未加入过文件的分组，允许为空
        let mut never_filled: BTreeSet<String> = BTreeSet::new();

        for _ in 0..500 {
            let group = names[rng.gen_range(0..names.len())];
            let file = rng.gen_range(0..6);
            let path = format!("/p/f{}.rs", file);
            let display = format!("f{}.rs", file);

            match rng.gen_range(0..5) {
                0 => {
                    if store.create_group(group).is_ok() {
                        never_filled.insert(group.to_string());
                    }
                }
                1 => {
                    if let Ok(outcome) = store.add_file(group, &display, &path) {
                        never_filled.remove(group);
                        if let Some(source) = outcome.moved_from {
                            assert_eq!(outcome.source_deleted, store.group(&source).is_none());
                        }
                    }
                }
                2 => {
                    if let Ok(outcome) = store.remove_file(group, &display) {
                        assert_eq!(outcome.group_deleted, store.group(group).is_none());
                    }
                }
                3 => {
                    if let Ok(outcome) = store.remove_path_from(group, &path) {
                        assert_eq!(outcome.group_deleted, store.group(group).is_none());
                    }
                }
                _ => {
                    if let Ok(Some(outcome)) = store.remove_path(&path) {
                        assert_eq!(
                            outcome.group_deleted,
                            store.group(&outcome.group).is_none()
                        );
                    }
                }
            }
            assert_invariants(&store);

            // 被删除的分组不再豁免
            never_filled.retain(|name| store.group(name).is_some());
            for (name, group) in store.groups() {
                assert!(
                    !group.files.is_empty() || never_filled.contains(name),
                    "分组 {} 被清空后仍然存在",
                    name
                );
            }
        }
    }

    #[test]
    fn test_load_normalizes_duplicate_paths() {
        let mut snapshot = GroupSnapshot::new();
        let mut first = Group::new("#000000");
        first.files.push(FileRef::new("a.ts", "/x/a.ts"));
        snapshot.insert("First".into(), first);
        let mut second = Group::new("#111111");
        second.files.push(FileRef::new("a.ts", "/x/a.ts"));
        snapshot.insert("Second".into(), second);
        snapshot.insert("Empty".into(), Group::new("#222222"));

        let store = GroupStore::load(MemorySnapshot::with_snapshot(snapshot)).unwrap();
        assert!(store.group("First").is_some());
        // 因去重而变空的分组被删除，显式创建的空分组保留
        assert!(store.group("Second").is_none());
        assert!(store.group("Empty").is_some());
    }
}
