//! # 绑定描述数据模型
//!
//! 生成器在文档渲染之前运行，无法访问宿主的实时 UI 树，
//! 因此它为每个"已分组且当前打开"的文件输出一条声明式的查找描述，
//! 由运行时脚本中唯一的解释循环统一消费。

use serde::Serialize;

/// 单个已分组文件的绑定描述
///
/// 序列化为 camelCase JSON 后直接嵌入运行时脚本。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingDescriptor {
    /// 规范化的完整路径标签：主目录前缀已折叠为短别名（如 `~/x/a.ts`）
    pub path_label: String,

    /// 兜底匹配标签：仅文件基础名（如 `a.ts`）
    pub basename_fallback: String,

    /// 所属分组名称，显示在标签页的分组小标签上
    pub group_name: String,

    /// 分组颜色（`#rrggbb`）
    pub color: String,

    /// 分组在仓库中的序号，用于把同组标签页聚集在一起
    pub order: usize,
}

/// 渲染产物：待注入宿主文档的脚本与样式文本
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBundle {
    pub script: String,
    pub style: String,
}
