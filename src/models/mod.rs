//! # 数据模型模块
//!
//! 定义线剖面数据集和区域标签。
//!
//! ## 依赖关系
//! - 被 `parsers/`、`analysis/` 和 `commands/` 使用
//! - 子模块: profile, region

pub mod profile;
pub mod region;

pub use profile::{Profile, ProfileDataset};
