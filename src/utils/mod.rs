//! # 通用工具函数
//!
//! - `path` - 配置目录定位、主目录前缀折叠、基础文件名提取

pub mod path;
