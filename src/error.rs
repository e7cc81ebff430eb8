//! # 引擎错误分类
//!
//! - 分组仓库层错误（`GroupNotFound`、`DuplicateGroup`、`AlreadyMember`、`NotMember`）
//!   返回给直接调用方并作为用户通知展示；失败的操作不会改变仓库状态。
//! - 资源补丁层错误（`ResourceNotFound`、`NoBackup`、`WriteFailure`）不会影响逻辑状态，
//!   失败时引擎退化为"无可视分组"，分组仓库仍是唯一可信数据源。

use std::path::PathBuf;

use thiserror::Error;

use crate::models::notice::Notice;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("分组 {0} 不存在")]
    GroupNotFound(String),

    #[error("分组 {0} 已存在")]
    DuplicateGroup(String),

    #[error("文件 {path} 已在分组 {group} 中")]
    AlreadyMember { group: String, path: String },

    #[error("文件 {name} 不在分组 {group} 中")]
    NotMember { group: String, name: String },

    #[error("未找到宿主工作台资源，已尝试: {0:?}")]
    ResourceNotFound(Vec<PathBuf>),

    #[error("工作台资源没有备份: {0}")]
    NoBackup(PathBuf),

    #[error("写入工作台资源失败: {0}")]
    WriteFailure(String),

    #[error("保存分组快照失败: {0}")]
    Persistence(String),

    #[error("配置错误: {0}")]
    Config(String),
}

impl EngineError {
    /// 非致命的提示性错误：操作为空操作，但不视为失败
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            EngineError::AlreadyMember { .. } | EngineError::NotMember { .. }
        )
    }

    /// 外部消息目录中的 key
    pub fn message_key(&self) -> &'static str {
        match self {
            EngineError::GroupNotFound(_) => "group.not_found",
            EngineError::DuplicateGroup(_) => "group.duplicate",
            EngineError::AlreadyMember { .. } => "file.already_member",
            EngineError::NotMember { .. } => "file.not_member",
            EngineError::ResourceNotFound(_) => "patch.resource_not_found",
            EngineError::NoBackup(_) => "patch.no_backup",
            EngineError::WriteFailure(_) => "patch.write_failure",
            EngineError::Persistence(_) => "store.persistence_failure",
            EngineError::Config(_) => "config.invalid",
        }
    }

    /// 消息目录使用的位置参数
    fn message_params(&self) -> Vec<String> {
        match self {
            EngineError::GroupNotFound(name) | EngineError::DuplicateGroup(name) => {
                vec![name.clone()]
            }
            EngineError::AlreadyMember { group, path } => vec![path.clone(), group.clone()],
            EngineError::NotMember { group, name } => vec![name.clone(), group.clone()],
            EngineError::ResourceNotFound(candidates) => candidates
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            EngineError::NoBackup(path) => vec![path.display().to_string()],
            EngineError::WriteFailure(detail)
            | EngineError::Persistence(detail)
            | EngineError::Config(detail) => vec![detail.clone()],
        }
    }

    /// 转换为用户通知：提示性错误使用 warning 级别
    pub fn to_notice(&self) -> Notice {
        if self.is_warning() {
            Notice::warning(self.message_key(), self.message_params())
        } else {
            Notice::error(self.message_key(), self.message_params())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notice::NoticeLevel;

    #[test]
    fn test_membership_errors_are_warnings() {
        let err = EngineError::AlreadyMember {
            group: "Backend".into(),
            path: "/x/a.ts".into(),
        };
        assert!(err.is_warning());
        let notice = err.to_notice();
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert_eq!(notice.key, "file.already_member");
        assert_eq!(notice.params, vec!["/x/a.ts", "Backend"]);

        assert!(!EngineError::GroupNotFound("x".into()).is_warning());
    }
}
