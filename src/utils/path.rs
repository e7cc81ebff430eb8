//! # 路径工具函数
//!
//! 提供与文件路径相关的工具函数，包括：
//! - 获取 Tab Groups 自身配置目录路径（`~/.mo/TabGroups/`）
//! - 获取默认的分组快照文件路径
//! - 将绝对路径中的主目录前缀折叠为短别名，减少不同安装环境之间的差异
//! - 提取路径的基础文件名

use std::path::PathBuf;

/// 获取 Tab Groups 配置目录的绝对路径
///
/// 配置数据独立存储在 `~/.mo/TabGroups/` 目录下，
/// 与宿主编辑器自身的数据分离，避免对宿主文件造成意外污染。
///
/// # 错误
/// 如果无法确定用户主目录，返回错误信息。
pub fn get_config_dir() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or_else(|| "无法获取用户主目录".to_string())?;
    Ok(home.join(".mo").join("TabGroups"))
}

/// 获取默认分组快照文件路径（`~/.mo/TabGroups/groups.json`）
pub fn get_default_snapshot_path() -> Result<PathBuf, String> {
    Ok(get_config_dir()?.join("groups.json"))
}

/// 将路径中的主目录前缀折叠为短别名
///
/// 宿主标签页的提示文本通常以 `~` 表示主目录，
/// 折叠后生成的路径标签在不同用户、不同机器之间保持一致。
/// 只在前缀之后紧跟路径分隔符（或路径恰好等于主目录）时才折叠，
/// 避免 `/home/al` 误匹配 `/home/alice/...`。
///
/// # 参数
/// - `path` - 文件的绝对路径
/// - `home` - 用户主目录；为 `None` 时原样返回
/// - `alias` - 替换主目录的短别名（如 `~`）
pub fn collapse_home(path: &str, home: Option<&str>, alias: &str) -> String {
    let Some(home) = home.map(|h| h.trim_end_matches(['/', '\\'])) else {
        return path.to_string();
    };
    if home.is_empty() {
        return path.to_string();
    }

    match path.strip_prefix(home) {
        Some("") => alias.to_string(),
        Some(rest) if rest.starts_with(['/', '\\']) => format!("{}{}", alias, rest),
        _ => path.to_string(),
    }
}

/// 提取路径的基础文件名，同时兼容 `/` 与 `\` 两种分隔符
pub fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\'])
        .find(|segment| !segment.is_empty())
        .unwrap_or(path)
}

/// 当前用户主目录的字符串形式
pub fn home_dir_string() -> Option<String> {
    dirs::home_dir().map(|h| h.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_home_prefix() {
        assert_eq!(
            collapse_home("/home/alice/src/a.ts", Some("/home/alice"), "~"),
            "~/src/a.ts"
        );
        // 主目录末尾带分隔符时同样生效
        assert_eq!(
            collapse_home("/home/alice/src/a.ts", Some("/home/alice/"), "~"),
            "~/src/a.ts"
        );
    }

    #[test]
    fn test_collapse_home_requires_separator_boundary() {
        assert_eq!(
            collapse_home("/home/alice2/a.ts", Some("/home/alice"), "~"),
            "/home/alice2/a.ts"
        );
        assert_eq!(collapse_home("/srv/a.ts", None, "~"), "/srv/a.ts");
    }

    #[test]
    fn test_collapse_home_windows() {
        assert_eq!(
            collapse_home(r"C:\Users\bob\proj\main.rs", Some(r"C:\Users\bob"), "~"),
            r"~\proj\main.rs"
        );
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("/x/y/a.ts"), "a.ts");
        assert_eq!(basename(r"C:\proj\main.rs"), "main.rs");
        assert_eq!(basename("plain.txt"), "plain.txt");
        assert_eq!(basename("/x/dir/"), "dir");
    }
}
