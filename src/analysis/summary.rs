//! # 区域统计汇总
//!
//! 对每个区域合并后的畴宽：IQR 剔除离群值 → 直方图 → 矩估计 + 最小二乘高斯拟合。
//! 拟合失败只记录在结果中，不影响其他区域，也不影响直方图绘制。
//!
//! ## 依赖关系
//! - 被 `commands/analyze.rs` 调用
//! - 使用 `analysis/widths.rs`, `analysis/histogram.rs`, `analysis/fit.rs`

use crate::analysis::fit::{
    estimate_normal, GaussianFit, GaussianFitter, GaussianParams, NormalEstimate,
};
use crate::analysis::histogram::{BinSpec, Histogram};
use crate::analysis::widths::{reject_outliers, RegionWidths};
use crate::error::FitError;

/// 汇总选项
#[derive(Debug, Clone)]
pub struct SummaryOptions {
    pub bins: BinSpec,
    /// IQR 系数；None 表示不剔除离群值
    pub iqr_factor: Option<f64>,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        SummaryOptions {
            bins: BinSpec::default(),
            iqr_factor: Some(1.5),
        }
    }
}

/// 单个区域的统计结果
#[derive(Debug, Clone)]
pub struct RegionSummary {
    pub label: String,
    /// 区域序号（决定绘图颜色）
    pub index: usize,
    pub profiles: usize,
    pub empty_profiles: usize,
    pub minima: usize,
    /// 剔除离群值后的畴宽
    pub widths: Vec<f64>,
    /// 被剔除的离群值数量
    pub outliers: usize,
    pub histogram: Histogram,
    pub normal: Result<NormalEstimate, FitError>,
    pub fit: Result<GaussianFit, FitError>,
}

impl RegionSummary {
    /// 拟合是否收敛
    pub fn is_fitted(&self) -> bool {
        self.fit.is_ok()
    }
}

/// 汇总一个区域
pub fn summarize(
    index: usize,
    region: &RegionWidths,
    options: &SummaryOptions,
) -> RegionSummary {
    let (widths, outliers) = match options.iqr_factor {
        Some(factor) => reject_outliers(&region.widths, factor),
        None => (region.widths.clone(), 0),
    };

    let histogram = Histogram::from_samples(&options.bins, &widths);
    let normal = estimate_normal(&widths);
    let fit = normal
        .clone()
        .and_then(|est| fit_histogram(&histogram, &est));

    RegionSummary {
        label: region.label.clone(),
        index,
        profiles: region.profiles,
        empty_profiles: region.empty_profiles,
        minima: region.minima,
        widths,
        outliers,
        histogram,
        normal,
        fit,
    }
}

/// 以矩估计为初值，对直方图（箱中心, 计数）做最小二乘拟合
pub fn fit_histogram(
    histogram: &Histogram,
    estimate: &NormalEstimate,
) -> Result<GaussianFit, FitError> {
    if histogram.occupied_bins() < 2 {
        return Err(FitError::Degenerate(format!(
            "samples fall into {} histogram bin(s)",
            histogram.occupied_bins()
        )));
    }

    let x = histogram.centers();
    let y: Vec<f64> = histogram.counts.iter().map(|&c| c as f64).collect();

    let initial = GaussianParams {
        amplitude: histogram.max_count() as f64,
        center: estimate.mean,
        sigma: estimate.std,
        offset: 0.0,
    };

    GaussianFitter::default().fit(&x, &y, initial)
}
