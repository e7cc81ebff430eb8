//! # 数据模型模块
//!
//! 定义了引擎内部与持久化快照共用的 Rust 数据结构：
//! - `group` - 文件引用、分组以及持久化快照
//! - `binding` - 运行时绑定描述和渲染产物
//! - `config` - 引擎配置
//! - `notice` - 交给外部消息目录解析的用户通知

pub mod binding;
pub mod config;
pub mod group;
pub mod notice;
