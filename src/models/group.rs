//! # 分组数据模型
//!
//! 定义了文件引用（FileRef）、分组（Group）、持久化快照（GroupSnapshot）
//! 以及分组总览（GroupsOverview）的 Rust 结构体。
//!
//! 快照的 JSON 形状与宿主端保存的数据保持一致：
//! ```json
//! {
//!   "Backend": {
//!     "color": "#1a2b3c",
//!     "files": [{ "name": "a.ts", "path": "/x/a.ts" }]
//!   }
//! }
//! ```
//! 分组名作为映射的 key，不在 Group 结构体内部重复存储。

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// 文件引用
///
/// `path` 是唯一身份标识；`name` 仅用于展示，不保证唯一
/// （不同目录下的同名文件会拥有相同的 `name`）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// 展示名称：通常是宿主标签页上显示的文件名
    pub name: String,

    /// 文件的绝对路径
    pub path: String,
}

impl FileRef {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// 分组
///
/// 文件列表按加入顺序排列，该顺序会影响展示顺序。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// 分组颜色：`#rrggbb` 格式
    pub color: String,

    /// 分组内的文件列表（按加入顺序）
    #[serde(default)]
    pub files: Vec<FileRef>,
}

impl Group {
    pub fn new(color: impl Into<String>) -> Self {
        Self {
            color: color.into(),
            files: Vec::new(),
        }
    }

    /// 分组中是否包含指定路径的文件
    pub fn contains_path(&self, path: &str) -> bool {
        self.files.iter().any(|f| f.path == path)
    }
}

/// 持久化快照：分组名 → 分组
///
/// 使用 `IndexMap` 保留分组的创建顺序，序列化后的 JSON 对象同样按该顺序输出。
pub type GroupSnapshot = IndexMap<String, Group>;

/// 分组总览中的单个分组
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub name: String,
    pub color: String,
    pub file_count: usize,
    pub files: Vec<FileRef>,
}

/// 分组总览：所有分组，以及当前打开但未加入任何分组的文件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupsOverview {
    pub groups: Vec<GroupSummary>,
    /// 宿主无法提供打开文件列表时为空
    pub ungrouped_open: Vec<String>,
}
