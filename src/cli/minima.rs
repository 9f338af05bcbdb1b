//! # minima 子命令 CLI 定义
//!
//! 检查单个文件中每条剖面检测到的极小值，用于调节检测参数。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/minima.rs`

use super::analyze::{DetectionArgs, InputArgs};
use clap::Args;
use std::path::PathBuf;

/// minima 子命令参数
#[derive(Args, Debug)]
pub struct MinimaArgs {
    /// Profile CSV file
    pub input: PathBuf,

    #[command(flatten)]
    pub data: InputArgs,

    #[command(flatten)]
    pub detection: DetectionArgs,

    /// Only inspect the first N profiles
    #[arg(long)]
    pub limit: Option<usize>,

    /// Write every detected minimum to this CSV file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
