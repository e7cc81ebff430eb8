//! # 核心服务模块
//!
//! 与命令层解耦的核心逻辑：
//! - `color` - 颜色分配：亮度拒绝采样，保证颜色足够深
//! - `persistence` - 分组快照持久化端口（JSON 文件 / 内存实现）
//! - `group_store` - 分组仓库：文件与分组的唯一可信数据源
//! - `binding_script` - 将分组快照编译为运行时绑定脚本与样式
//! - `workbench_document` - 工作台 HTML 的最小结构化视图
//! - `resource_patcher` - 工作台资源的备份、补丁与恢复
//! - `sync_controller` - 决定完整重绘与轻量刷新的时机

pub mod binding_script;
pub mod color;
pub mod group_store;
pub mod persistence;
pub mod resource_patcher;
pub mod sync_controller;
pub mod workbench_document;
