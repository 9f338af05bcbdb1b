//! # 畴宽直方图
//!
//! 等宽分箱，边界与 `numpy.linspace(start, end, edges)` 相同：
//! 各箱左闭右开，最后一箱右闭；范围外的值忽略。
//!
//! ## 依赖关系
//! - 被 `analysis/summary.rs`、`analysis/plot.rs`、`analysis/export.rs` 使用

use crate::error::{DomainError, Result};

/// 分箱设置
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinSpec {
    pub start: f64,
    pub end: f64,
    /// 边界数量（箱数 + 1）
    pub edges: usize,
}

impl Default for BinSpec {
    fn default() -> Self {
        BinSpec {
            start: 0.0,
            end: 160.0,
            edges: 50,
        }
    }
}

impl BinSpec {
    /// 解析 "start:end:edges"（例如 "0:160:50"）
    pub fn parse(spec: &str) -> Result<Self> {
        let parts: Vec<&str> = spec.split(':').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(DomainError::InvalidRange(format!(
                "{} (expected start:end:edges)",
                spec
            )));
        }

        let start: f64 = parts[0]
            .parse()
            .map_err(|_| DomainError::InvalidRange(spec.to_string()))?;
        let end: f64 = parts[1]
            .parse()
            .map_err(|_| DomainError::InvalidRange(spec.to_string()))?;
        let edges: usize = parts[2]
            .parse()
            .map_err(|_| DomainError::InvalidRange(spec.to_string()))?;

        if !start.is_finite() || !end.is_finite() || end <= start || edges < 2 {
            return Err(DomainError::InvalidRange(format!(
                "{} (must be start < end and at least 2 edges)",
                spec
            )));
        }

        Ok(BinSpec { start, end, edges })
    }

    pub fn bin_count(&self) -> usize {
        self.edges - 1
    }

    pub fn bin_width(&self) -> f64 {
        (self.end - self.start) / self.bin_count() as f64
    }

    /// 所有边界
    pub fn edge_values(&self) -> Vec<f64> {
        let step = self.bin_width();
        (0..self.edges)
            .map(|i| {
                if i + 1 == self.edges {
                    self.end
                } else {
                    self.start + i as f64 * step
                }
            })
            .collect()
    }
}

/// 直方图
#[derive(Debug, Clone)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<u64>,
}

impl Histogram {
    /// 统计样本
    pub fn from_samples(spec: &BinSpec, samples: &[f64]) -> Self {
        let edges = spec.edge_values();
        let nbins = spec.bin_count();
        let width = spec.bin_width();
        let mut counts = vec![0u64; nbins];

        for &v in samples {
            if !(v >= spec.start && v <= spec.end) {
                continue;
            }
            let mut idx = (((v - spec.start) / width) as usize).min(nbins - 1);
            // 修正浮点舍入造成的越界
            if idx > 0 && v < edges[idx] {
                idx -= 1;
            } else if idx + 1 < nbins && v >= edges[idx + 1] {
                idx += 1;
            }
            counts[idx] += 1;
        }

        Histogram { edges, counts }
    }

    /// 各箱左边界
    pub fn bin_starts(&self) -> &[f64] {
        &self.edges[..self.edges.len() - 1]
    }

    /// 各箱中心
    pub fn centers(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
    }

    pub fn max_count(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// 非空箱数量
    pub fn occupied_bins(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }
}
