//! # 强度极小值检测
//!
//! 在线剖面上寻找强度极小值（畴壁位置）。
//!
//! ## 算法概述
//! 1. 可选中值滤波平滑
//! 2. 对取负后的信号寻找局部极大（支持平台，取平台中点）
//! 3. 计算每个候选点的显著度（prominence）
//! 4. 在半显著度处插值计算峰宽
//! 5. 按显著度、峰宽阈值过滤
//! 6. 按最小间距去除过近的候选点，保留显著度最高者
//!
//! ## 参考
//! - scipy.signal.find_peaks
//! - py-findpeaks (Yoan Tournade)
//!
//! ## 依赖关系
//! - 被 `commands/` 调用
//! - 使用 `models/profile.rs` 的 Profile
//! - 使用 `analysis/smoothing.rs`

use crate::analysis::smoothing::median_filter;
use crate::error::{DomainError, Result};
use crate::models::profile::{mean_spacing, Profile};

use serde::Serialize;
use std::cmp::Ordering;

/// 中值滤波窗口上限（采样点数）
pub const MAX_SMOOTH_WINDOW: usize = 10_001;

/// 检测参数
#[derive(Debug, Clone)]
pub struct MinimaConfig {
    /// 中值滤波窗口（采样点数，1 = 不平滑）
    pub smooth: usize,
    /// 相邻极小值最小间距（距离单位）
    pub min_separation: f64,
    /// 最小显著度（强度单位）
    pub min_prominence: f64,
    /// 半显著度处最小峰宽（距离单位）
    pub min_width: f64,
}

impl Default for MinimaConfig {
    fn default() -> Self {
        MinimaConfig {
            smooth: 1,
            min_separation: 0.0,
            min_prominence: 0.0,
            min_width: 1.2,
        }
    }
}

impl MinimaConfig {
    /// 检查参数合法性
    pub fn validate(&self) -> Result<()> {
        if self.smooth > MAX_SMOOTH_WINDOW {
            return Err(DomainError::InvalidArgument(format!(
                "smooth window must be at most {} samples, got {}",
                MAX_SMOOTH_WINDOW, self.smooth
            )));
        }

        let checks = [
            ("min-separation", self.min_separation),
            ("min-prominence", self.min_prominence),
            ("min-width", self.min_width),
        ];
        for (name, value) in checks {
            if !value.is_finite() || value < 0.0 {
                return Err(DomainError::InvalidArgument(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// 检测到的极小值
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Minimum {
    /// 采样点索引
    pub index: usize,
    /// 距离轴位置
    pub position: f64,
    /// 原始强度
    pub intensity: f64,
    /// 显著度
    pub prominence: f64,
    /// 半显著度峰宽（距离单位）
    pub width: f64,
}

/// 候选极值（在取负后的信号上）
#[derive(Debug, Clone)]
struct Candidate {
    index: usize,
    left_base: usize,
    right_base: usize,
    prominence: f64,
}

/// 极小值检测器
pub struct MinimaFinder {
    config: MinimaConfig,
}

impl MinimaFinder {
    /// 创建新的检测器
    pub fn new(config: MinimaConfig) -> Self {
        Self { config }
    }

    /// 检测一条剖面上的极小值
    pub fn find(&self, profile: &Profile) -> Vec<Minimum> {
        self.find_in(&profile.distance, &profile.intensity)
    }

    /// 检测极小值，结果按位置升序排列；平坦或过短的剖面返回空列表
    pub fn find_in(&self, distance: &[f64], intensity: &[f64]) -> Vec<Minimum> {
        let n = intensity.len().min(distance.len());
        if n < 3 {
            return Vec::new();
        }

        let smoothed = median_filter(&intensity[..n], self.config.smooth);
        let signal: Vec<f64> = smoothed.iter().map(|v| -v).collect();

        let spacing = mean_spacing(&distance[..n]);

        let mut minima: Vec<Minimum> = local_maxima(&signal)
            .into_iter()
            .map(|index| prominence(&signal, index))
            .filter(|c| c.prominence >= self.config.min_prominence)
            .filter_map(|c| {
                let width = peak_width(&signal, &c) * spacing;
                (width >= self.config.min_width).then(|| Minimum {
                    index: c.index,
                    position: distance[c.index],
                    intensity: intensity[c.index],
                    prominence: c.prominence,
                    width,
                })
            })
            .collect();

        if self.config.min_separation > 0.0 {
            minima = select_by_separation(minima, self.config.min_separation);
        }

        minima
    }
}

/// 寻找局部极大值（平台取中点，端点不计）
fn local_maxima(x: &[f64]) -> Vec<usize> {
    let n = x.len();
    let mut peaks = Vec::new();
    let mut i = 1;

    while i + 1 < n {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead + 1 < n && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                let left_edge = i;
                let right_edge = ahead - 1;
                peaks.push((left_edge + right_edge) / 2);
                i = ahead;
            }
        }
        i += 1;
    }

    peaks
}

/// 计算显著度及左右基点
fn prominence(x: &[f64], peak: usize) -> Candidate {
    let height = x[peak];

    // 向左搜索，直到遇到更高的点或到达边缘
    let mut left_base = peak;
    let mut left_min = height;
    let mut i = peak;
    loop {
        if x[i] > height {
            break;
        }
        if x[i] < left_min {
            left_min = x[i];
            left_base = i;
        }
        if i == 0 {
            break;
        }
        i -= 1;
    }

    // 向右搜索
    let mut right_base = peak;
    let mut right_min = height;
    for (j, &v) in x.iter().enumerate().skip(peak) {
        if v > height {
            break;
        }
        if v < right_min {
            right_min = v;
            right_base = j;
        }
    }

    Candidate {
        index: peak,
        left_base,
        right_base,
        prominence: height - left_min.max(right_min),
    }
}

/// 半显著度处的峰宽（采样点数，线性插值）
fn peak_width(x: &[f64], c: &Candidate) -> f64 {
    let peak = c.index;
    let height = x[peak] - 0.5 * c.prominence;

    let mut i = peak;
    while c.left_base < i && height < x[i] {
        i -= 1;
    }
    let mut left_ip = i as f64;
    if x[i] < height {
        left_ip += (height - x[i]) / (x[i + 1] - x[i]);
    }

    let mut i = peak;
    while i < c.right_base && height < x[i] {
        i += 1;
    }
    let mut right_ip = i as f64;
    if x[i] < height {
        right_ip -= (height - x[i]) / (x[i - 1] - x[i]);
    }

    right_ip - left_ip
}

/// 按最小间距筛选：显著度高者优先，其次更深，再次靠左
fn select_by_separation(minima: Vec<Minimum>, separation: f64) -> Vec<Minimum> {
    let n = minima.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        let (ma, mb) = (&minima[a], &minima[b]);
        mb.prominence
            .partial_cmp(&ma.prominence)
            .unwrap_or(Ordering::Equal)
            .then(
                ma.intensity
                    .partial_cmp(&mb.intensity)
                    .unwrap_or(Ordering::Equal),
            )
            .then(a.cmp(&b))
    });

    let mut keep = vec![true; n];
    for &i in &order {
        if !keep[i] {
            continue;
        }
        let pos = minima[i].position;

        let mut j = i;
        while j > 0 && pos - minima[j - 1].position < separation {
            j -= 1;
            keep[j] = false;
        }
        let mut j = i + 1;
        while j < n && minima[j].position - pos < separation {
            keep[j] = false;
            j += 1;
        }
    }

    minima
        .into_iter()
        .zip(keep)
        .filter_map(|(m, k)| k.then_some(m))
        .collect()
}
