//! # 工作台文档
//!
//! 宿主工作台 HTML 的最小结构化视图，只识别补丁需要关心的三类节点：
//! - 内容安全策略（CSP）`<meta http-equiv="Content-Security-Policy">` 节点
//! - 由本引擎注入的 `<style id="tab-groups-style">` 节点
//! - 由本引擎注入的 `<script id="tab-groups-script">` 节点
//!
//! 文档其余部分按原始字节保留，不做任何重排或格式化。
//!
//! 注入格式固定为 `<style id=…>\n…\n</style>\n`（script 同理），
//! 移除时连同末尾换行一起移除，保证多次补丁之后文档字节稳定。

use std::sync::LazyLock;

use regex::Regex;

/// 注入样式节点的固定 id
pub const STYLE_NODE_ID: &str = "tab-groups-style";

/// 注入脚本节点的固定 id
pub const SCRIPT_NODE_ID: &str = "tab-groups-script";

/// CSP meta 节点（属性值可能跨越多行）
static CSP_META_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)[ \t]*<meta\b[^>]*\bhttp-equiv\s*=\s*["']?content-security-policy["']?[^>]*>[ \t]*(?:\r?\n)?"#,
    )
    .unwrap()
});

/// 已注入的样式节点
static INJECTED_STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<style\b[^>]*\bid\s*=\s*["']tab-groups-style["'][^>]*>.*?</style\s*>[ \t]*(?:\r?\n)?"#,
    )
    .unwrap()
});

/// 已注入的脚本节点
static INJECTED_SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<script\b[^>]*\bid\s*=\s*["']tab-groups-script["'][^>]*>.*?</script\s*>[ \t]*(?:\r?\n)?"#,
    )
    .unwrap()
});

static HEAD_CLOSE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</head\s*>").unwrap());

static HTML_CLOSE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</html\s*>").unwrap());

/// 节点正文中不能出现的结束标签（会提前闭合注入节点）
static STYLE_END_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</(style)").unwrap());

static SCRIPT_END_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</(script)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkbenchDocument {
    source: String,
}

impl WorkbenchDocument {
    pub fn parse(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// 移除 CSP meta 节点，使注入的内联脚本可以执行
    ///
    /// 这是仅针对这一个文件的、范围很窄的安全放宽。返回移除的节点数。
    pub fn strip_content_security_policy(&mut self) -> usize {
        remove_all(&mut self.source, &CSP_META_RE)
    }

    /// 移除此前注入的样式与脚本节点，返回移除的节点数
    pub fn remove_injected(&mut self) -> usize {
        remove_all(&mut self.source, &INJECTED_STYLE_RE)
            + remove_all(&mut self.source, &INJECTED_SCRIPT_RE)
    }

    /// 注入样式与脚本节点
    ///
    /// 先移除旧节点，因此无论调用多少次，文档中都只有一个样式节点和一个脚本节点。
    /// 样式插入到 `</head>` 之前（缺失时插入到文档开头），
    /// 脚本插入到 `</html>` 之前（缺失时追加到文档末尾）。
    pub fn inject(&mut self, style: &str, script: &str) {
        self.remove_injected();

        let style_node = format!(
            "<style id=\"{}\">\n{}\n</style>\n",
            STYLE_NODE_ID,
            STYLE_END_RE.replace_all(style, r"<\/$1")
        );
        let at = HEAD_CLOSE_RE
            .find(&self.source)
            .map(|m| m.start())
            .unwrap_or(0);
        self.source.insert_str(at, &style_node);

        let script_node = format!(
            "<script id=\"{}\">\n{}\n</script>\n",
            SCRIPT_NODE_ID,
            SCRIPT_END_RE.replace_all(script, r"<\/$1")
        );
        match HTML_CLOSE_RE.find(&self.source).map(|m| m.start()) {
            Some(at) => self.source.insert_str(at, &script_node),
            None => {
                if !self.source.is_empty() && !self.source.ends_with('\n') {
                    self.source.push('\n');
                }
                self.source.push_str(&script_node);
            }
        }
    }

    /// 已注入的 (样式节点数, 脚本节点数)
    pub fn injected_counts(&self) -> (usize, usize) {
        (
            INJECTED_STYLE_RE.find_iter(&self.source).count(),
            INJECTED_SCRIPT_RE.find_iter(&self.source).count(),
        )
    }

    pub fn is_patched(&self) -> bool {
        let (styles, scripts) = self.injected_counts();
        styles > 0 || scripts > 0
    }

    pub fn has_content_security_policy(&self) -> bool {
        CSP_META_RE.is_match(&self.source)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn into_string(self) -> String {
        self.source
    }
}

fn remove_all(source: &mut String, re: &Regex) -> usize {
    let count = re.find_iter(source.as_str()).count();
    if count > 0 {
        *source = re.replace_all(source.as_str(), "").into_owned();
    }
    count
}
