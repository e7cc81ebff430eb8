//! # 分组颜色分配
//!
//! 使用亮度拒绝采样生成分组颜色：均匀随机抽取 RGB 三元组，
//! 计算感知亮度 `L = 0.2126R + 0.7152G + 0.0722B`，当 `L > 200` 时丢弃重抽。
//!
//! 运行时脚本在分组小标签上使用固定的浅色文字（`#e8e8e8`），
//! 亮度上限保证所有分配出的颜色都足够暗，与浅色文字形成对比。
//! RGB 立方体中绝大部分颜色满足该上限，期望重抽次数很小。

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 允许的最大感知亮度
pub const MAX_LUMINANCE: f64 = 200.0;

/// 计算 RGB 颜色的感知亮度（Rec. 709 系数）
pub fn luminance(r: u8, g: u8, b: u8) -> f64 {
    0.2126 * f64::from(r) + 0.7152 * f64::from(g) + 0.0722 * f64::from(b)
}

/// 颜色分配器
///
/// 不持有任何共享状态；随机源由调用方注入，测试中可以使用固定种子。
pub struct ColorAllocator<R> {
    rng: R,
}

impl ColorAllocator<StdRng> {
    /// 使用操作系统熵源播种的随机源创建分配器
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for ColorAllocator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> ColorAllocator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// 分配下一个颜色，返回 `#rrggbb` 格式字符串
    pub fn next_color(&mut self) -> String {
        loop {
            let r: u8 = self.rng.gen_range(0..=255);
            let g: u8 = self.rng.gen_range(0..=255);
            let b: u8 = self.rng.gen_range(0..=255);
            if luminance(r, g, b) <= MAX_LUMINANCE {
                return format!("#{:02x}{:02x}{:02x}", r, g, b);
            }
        }
    }
}

/// 解析 `#rrggbb` 格式的颜色
pub fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}
