//! # analyze 子命令 CLI 定义
//!
//! 完整分析流程：读取剖面 → 检测极小值 → 按区域合并畴宽 → 拟合 → 出图。
//!
//! 同时定义与 `minima` 子命令共享的输入参数和检测参数。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/analyze.rs`

use crate::analysis::MinimaConfig;

use clap::{Args, ValueEnum};
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────
// 共享参数
// ─────────────────────────────────────────────────────────────

/// CSV 列布局
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum ProfileLayout {
    /// First column is the shared distance axis, other columns are intensities
    #[default]
    Shared,
    /// Alternating distance/intensity column pairs, one pair per profile
    Paired,
}

impl std::fmt::Display for ProfileLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileLayout::Shared => write!(f, "shared"),
            ProfileLayout::Paired => write!(f, "paired"),
        }
    }
}

/// 剖面输入参数
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Column layout of the profile CSV
    #[arg(long, value_enum, default_value = "shared")]
    pub layout: ProfileLayout,

    /// Distance calibration: every distance value is multiplied by this (nm per pixel)
    #[arg(long, env = "DOMAINWIDTH_NM_PER_PIXEL", default_value_t = 1.0)]
    pub nm_per_pixel: f64,
}

/// 极小值检测参数
#[derive(Args, Debug, Clone)]
pub struct DetectionArgs {
    /// Median filter window in samples applied before detection (1 = off)
    #[arg(long, default_value_t = 1)]
    pub smooth: usize,

    /// Minimum distance between accepted minima (distance units, 0 = off)
    #[arg(long, default_value_t = 0.0)]
    pub min_separation: f64,

    /// Minimum prominence of a minimum (intensity units)
    #[arg(long, default_value_t = 0.0)]
    pub min_prominence: f64,

    /// Minimum width at half prominence (distance units)
    #[arg(long, default_value_t = 1.2)]
    pub min_width: f64,
}

impl DetectionArgs {
    pub fn to_config(&self) -> MinimaConfig {
        MinimaConfig {
            smooth: self.smooth,
            min_separation: self.min_separation,
            min_prominence: self.min_prominence,
            min_width: self.min_width,
        }
    }
}

// ─────────────────────────────────────────────────────────────
// analyze 子命令
// ─────────────────────────────────────────────────────────────

/// 区域分组方式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum GroupBy {
    /// One region per input file
    #[default]
    File,
    /// Region taken from the column header via --region-pattern
    Column,
}

impl std::fmt::Display for GroupBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupBy::File => write!(f, "file"),
            GroupBy::Column => write!(f, "column"),
        }
    }
}

/// 图像输出格式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum FigureFormat {
    /// PNG image
    Png,
    /// SVG vector image
    Svg,
}

/// analyze 子命令参数
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Profile CSV files, or directories to scan with --pattern
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Glob pattern for profile files inside input directories
    #[arg(long, default_value = "profiledata*.csv")]
    pub pattern: String,

    /// Recurse into subdirectories
    #[arg(long, default_value_t = false)]
    pub recursive: bool,

    #[command(flatten)]
    pub data: InputArgs,

    #[command(flatten)]
    pub detection: DetectionArgs,

    // ─────────────────────────────────────────────────────────────
    // 分组与统计
    // ─────────────────────────────────────────────────────────────
    /// How profiles are grouped into regions
    #[arg(long, value_enum, default_value = "file")]
    pub group_by: GroupBy,

    /// Regex whose first capture group names the region (with --group-by column)
    #[arg(long, default_value = r"^(.+?)[\s_-]*\d+$")]
    pub region_pattern: String,

    /// Comma-separated region labels, in input file order (default: "Region 1", ...)
    #[arg(long)]
    pub labels: Option<String>,

    /// Histogram bins as start:end:edges
    #[arg(long, default_value = "0:160:50")]
    pub bins: String,

    /// IQR multiplier for outlier rejection
    #[arg(long, default_value_t = 1.5)]
    pub iqr_factor: f64,

    /// Keep all widths (skip IQR outlier rejection)
    #[arg(long, default_value_t = false)]
    pub no_outlier_filter: bool,

    /// Directory for per-region histogram and width CSV files
    #[arg(long)]
    pub export_hist: Option<PathBuf>,

    // ─────────────────────────────────────────────────────────────
    // 图表参数
    // ─────────────────────────────────────────────────────────────
    /// Output figure path
    #[arg(short, long, default_value = "RealSpaceMethod.png")]
    pub output: PathBuf,

    /// Figure format (auto-detected from extension if not specified)
    #[arg(short, long, value_enum)]
    pub format: Option<FigureFormat>,

    /// Skip figure generation
    #[arg(long, default_value_t = false)]
    pub no_plot: bool,

    /// Micrograph shown in panel (a)
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Micrograph calibration in nm per pixel (for the scale bar)
    #[arg(long, env = "DOMAINWIDTH_IMAGE_NM_PER_PIXEL", default_value_t = 1.0)]
    pub image_nm_per_pixel: f64,

    /// Scale bar length in nm drawn under the micrograph
    #[arg(long)]
    pub scale_bar: Option<f64>,

    /// Label drawn on the micrograph at image pixel X,Y (repeatable)
    #[arg(long = "region-label-at", value_name = "TEXT@X,Y")]
    pub region_label_at: Vec<String>,

    /// Number of example profiles in panel (b)
    #[arg(long, default_value_t = 4)]
    pub example_profiles: usize,

    /// Vertical offset between example profiles
    #[arg(long, default_value_t = 200.0)]
    pub profile_offset: f64,

    /// Upper x limit of the histogram panel (default: end of the bin range)
    #[arg(long)]
    pub hist_xmax: Option<f64>,

    /// Figure width in pixels (for PNG) or points (for SVG)
    #[arg(long, default_value_t = 1800)]
    pub width: u32,

    /// Figure height in pixels (for PNG) or points (for SVG)
    #[arg(long, default_value_t = 960)]
    pub height: u32,
}
