//! # Tab Groups - 编辑器标签页分组引擎
//!
//! 为宿主编辑器提供"带颜色的标签页分组"：
//! - 维护分组仓库（每个文件最多属于一个分组，空分组自动删除）
//! - 为每个分组分配足够深的随机颜色
//! - 生成运行时绑定脚本，并以"先备份、后补丁"的方式注入宿主工作台资源
//! - 区分完整重绘与轻量刷新，响应分组变更和宿主生命周期事件
//!
//! ## 模块结构
//! - `commands/` - 面向用户的命令入口（返回消息 key + 参数）
//! - `models/` - 数据模型（分组快照、绑定描述、配置、通知）
//! - `services/` - 核心逻辑（分组仓库、颜色、脚本生成、资源补丁、同步控制）
//! - `utils/` - 通用工具函数
//! - `cli` - 命令行前端
//! - `error` - 错误分类

pub mod cli;
pub mod commands;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
