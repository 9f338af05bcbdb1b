//! # 区域标签与配色
//!
//! 区域只是一个分组标签，附带绘图颜色。颜色沿用 matplotlib 的 tab10 顺序。
//!
//! ## 依赖关系
//! - 被 `commands/analyze.rs` 和 `analysis/plot.rs` 使用

/// tab10 调色板（RGB）
pub const REGION_COLORS: [(u8, u8, u8); 10] = [
    (0x1f, 0x77, 0xb4), // Blue
    (0xff, 0x7f, 0x0e), // Orange
    (0x2c, 0xa0, 0x2c), // Green
    (0xd6, 0x27, 0x28), // Red
    (0x94, 0x67, 0xbd), // Purple
    (0x8c, 0x56, 0x4b), // Brown
    (0xe3, 0x77, 0xc2), // Pink
    (0x7f, 0x7f, 0x7f), // Gray
    (0xbc, 0xbd, 0x22), // Olive
    (0x17, 0xbe, 0xcf), // Cyan
];

/// 第 `index` 个区域的颜色（循环使用）
pub fn region_color(index: usize) -> (u8, u8, u8) {
    REGION_COLORS[index % REGION_COLORS.len()]
}

/// 默认区域标签: "Region 1", "Region 2", ...
pub fn default_label(index: usize) -> String {
    format!("Region {}", index + 1)
}

/// 解析逗号分隔的标签列表，缺少的位置使用默认标签
pub fn resolve_labels(labels: Option<&str>, count: usize) -> Vec<String> {
    let given: Vec<String> = labels
        .map(|s| {
            s.split(',')
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect()
        })
        .unwrap_or_default();

    (0..count)
        .map(|i| given.get(i).cloned().unwrap_or_else(|| default_label(i)))
        .collect()
}
