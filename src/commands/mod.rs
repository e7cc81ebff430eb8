//! # 命令处理模块
//!
//! 面向用户的命令入口，每个子模块对应一个功能域：
//! - `groups` - 分组的创建、删除、文件增删与总览
//! - `patch` - 工作台资源的重绘、恢复与状态查询
//! - `config` - 引擎配置的读写

pub mod config;
pub mod groups;
pub mod patch;
