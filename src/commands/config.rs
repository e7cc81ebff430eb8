//! # 引擎配置读写
//!
//! 配置文件路径：`~/.mo/TabGroups/config.json`。
//! 读取时文件缺失、无法读取或 JSON 解析失败都静默回退到默认配置；
//! 保存时自动创建配置目录。

use std::path::Path;

use crate::models::config::EngineConfig;
use crate::utils::path;

const CONFIG_FILE_NAME: &str = "config.json";

/// 读取引擎配置，任何失败都回退到默认配置
pub async fn read_engine_config() -> EngineConfig {
    match path::get_config_dir() {
        Ok(dir) => read_engine_config_at(&dir.join(CONFIG_FILE_NAME)).await,
        Err(_) => EngineConfig::default(),
    }
}

/// 从指定路径读取引擎配置
pub async fn read_engine_config_at(config_path: &Path) -> EngineConfig {
    if !config_path.exists() {
        return EngineConfig::default();
    }

    match tokio::fs::read_to_string(config_path).await {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("解析配置文件失败，使用默认配置: {}", e);
            EngineConfig::default()
        }),
        Err(_) => EngineConfig::default(),
    }
}

/// 保存引擎配置到 `~/.mo/TabGroups/config.json`
pub async fn save_engine_config(config: &EngineConfig) -> Result<(), String> {
    let dir = path::get_config_dir()?;
    save_engine_config_at(&dir.join(CONFIG_FILE_NAME), config).await
}

pub async fn save_engine_config_at(config_path: &Path, config: &EngineConfig) -> Result<(), String> {
    if let Some(parent) = config_path.parent() {
        if !parent.exists() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("创建配置目录失败: {}", e))?;
        }
    }

    let content =
        serde_json::to_string_pretty(config).map_err(|e| format!("序列化配置失败: {}", e))?;

    tokio::fs::write(config_path, content)
        .await
        .map_err(|e| format!("写入配置文件失败: {}", e))
}
