//! # 畴宽汇总
//!
//! 由同一剖面上相邻极小值的距离得到畴宽，并按区域合并。
//! 不同区域之间不混合。
//!
//! ## 依赖关系
//! - 被 `commands/analyze.rs` 调用
//! - 使用 `analysis/minima.rs` 的 Minimum

use crate::analysis::Minimum;

/// 相邻位置之差
pub fn consecutive_distances(positions: &[f64]) -> Vec<f64> {
    positions.windows(2).map(|w| w[1] - w[0]).collect()
}

/// 一条剖面的畴宽；0 或 1 个极小值时为空
pub fn consecutive_widths(minima: &[Minimum]) -> Vec<f64> {
    let positions: Vec<f64> = minima.iter().map(|m| m.position).collect();
    consecutive_distances(&positions)
}

/// 单个区域的合并结果
#[derive(Debug, Clone, Default)]
pub struct RegionWidths {
    /// 区域标签
    pub label: String,
    /// 剖面数量
    pub profiles: usize,
    /// 极小值总数
    pub minima: usize,
    /// 不足两个极小值（不贡献畴宽）的剖面数
    pub empty_profiles: usize,
    /// 合并后的畴宽
    pub widths: Vec<f64>,
}

/// 按区域合并畴宽，区域按首次出现顺序排列
#[derive(Debug, Default)]
pub struct WidthAggregator {
    regions: Vec<RegionWidths>,
}

impl WidthAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入一条剖面的检测结果
    pub fn add_profile(&mut self, region: &str, minima: &[Minimum]) {
        let entry = match self.regions.iter().position(|r| r.label == region) {
            Some(i) => &mut self.regions[i],
            None => {
                self.regions.push(RegionWidths {
                    label: region.to_string(),
                    ..RegionWidths::default()
                });
                let last = self.regions.len() - 1;
                &mut self.regions[last]
            }
        };

        let widths = consecutive_widths(minima);
        entry.profiles += 1;
        entry.minima += minima.len();
        if widths.is_empty() {
            entry.empty_profiles += 1;
        }
        entry.widths.extend(widths);
    }

    pub fn regions(&self) -> &[RegionWidths] {
        &self.regions
    }

    pub fn into_regions(self) -> Vec<RegionWidths> {
        self.regions
    }
}

/// 百分位数（线性插值，与 numpy 默认一致）；`sorted` 须已升序
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// IQR 离群值剔除，返回（保留值, 剔除数量）
///
/// 保留 `[Q1 - k·IQR, Q3 + k·IQR]` 内的值，保持原顺序。少于 4 个值时不处理。
pub fn reject_outliers(widths: &[f64], factor: f64) -> (Vec<f64>, usize) {
    if widths.len() < 4 {
        return (widths.to_vec(), 0);
    }

    let mut sorted = widths.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let (q1, q3) = match (percentile(&sorted, 25.0), percentile(&sorted, 75.0)) {
        (Some(q1), Some(q3)) => (q1, q3),
        _ => return (widths.to_vec(), 0),
    };
    let iqr = q3 - q1;
    let lower = q1 - factor * iqr;
    let upper = q3 + factor * iqr;

    let kept: Vec<f64> = widths
        .iter()
        .copied()
        .filter(|w| *w >= lower && *w <= upper)
        .collect();
    let removed = widths.len() - kept.len();
    (kept, removed)
}
