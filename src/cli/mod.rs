//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `analyze`: 完整畴宽分析与三联图
//! - `minima`: 单文件极小值检查
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: analyze, minima

pub mod analyze;
pub mod minima;

use clap::{Parser, Subcommand};

/// domainwidth - 铁电纳米畴宽度分析
#[derive(Parser)]
#[command(name = "domainwidth")]
#[command(version)]
#[command(
    about = "Measure ferroelectric nano-domain widths from TEM line profiles",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Extract domain widths, fit their distribution and render the figure
    Analyze(analyze::AnalyzeArgs),

    /// List the intensity minima detected in each profile of one file
    Minima(minima::MinimaArgs),
}
