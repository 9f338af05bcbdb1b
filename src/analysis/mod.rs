//! # 畴宽分析模块
//!
//! 从线剖面提取纳米畴宽度并统计。
//!
//! ## 子模块
//! - `smoothing`: 中值滤波
//! - `minima`: 强度极小值检测
//! - `widths`: 畴宽计算、按区域合并、离群值剔除
//! - `histogram`: 分箱统计
//! - `fit`: 高斯拟合
//! - `summary`: 区域统计汇总
//! - `plot`: 三联图生成
//! - `export`: 数据导出
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `models/profile.rs`

pub mod export;
pub mod fit;
pub mod histogram;
pub mod minima;
pub mod plot;
pub mod smoothing;
pub mod summary;
pub mod widths;

pub use histogram::BinSpec;
pub use minima::{MinimaConfig, MinimaFinder, Minimum};
pub use summary::{summarize, RegionSummary, SummaryOptions};
pub use widths::WidthAggregator;
