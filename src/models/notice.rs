//! # 用户通知数据模型
//!
//! 引擎只负责给出消息 key 与位置参数，文案解析和本地化由外部消息目录完成。

use std::fmt;

use serde::Serialize;

/// 通知级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// 一条待展示给用户的通知
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    /// 消息目录中的 key（如 `group.created`）
    pub key: &'static str,
    /// 按位置填充的参数
    pub params: Vec<String>,
}

impl Notice {
    pub fn info(key: &'static str, params: Vec<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            key,
            params,
        }
    }

    pub fn warning(key: &'static str, params: Vec<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            key,
            params,
        }
    }

    pub fn error(key: &'static str, params: Vec<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            key,
            params,
        }
    }
}

/// 没有消息目录时的兜底展示：`key [参数1, 参数2]`
impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{} [{}]", self.key, self.params.join(", "))
        }
    }
}
