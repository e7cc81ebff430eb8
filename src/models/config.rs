//! # 引擎配置数据模型
//!
//! 对应配置文件 `~/.mo/TabGroups/config.json`。
//! 所有字段都有默认值，配置文件缺失或字段缺失时使用默认配置。

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// 引擎配置
///
/// ```json
/// {
///   "hostInstallDir": "/usr/share/code/resources/app",
///   "snapshotPath": null,
///   "reloadAfterPatch": true,
///   "homeAlias": "~"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// 宿主安装目录（工作台资源的候选路径都相对于此目录解析）
    pub host_install_dir: Option<PathBuf>,

    /// 分组快照文件路径；为空时使用 `~/.mo/TabGroups/groups.json`
    pub snapshot_path: Option<PathBuf>,

    /// 增删文件后是否请求宿主重新加载，使补丁立即生效
    pub reload_after_patch: bool,

    /// 折叠主目录前缀时使用的短别名
    pub home_alias: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            host_install_dir: None,
            snapshot_path: None,
            reload_after_patch: true,
            home_alias: "~".to_string(),
        }
    }
}
