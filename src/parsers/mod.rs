//! # 解析器模块
//!
//! 读取 ImageJ 导出的线剖面 CSV 文件。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: profile_csv

pub mod profile_csv;

pub use profile_csv::{parse_profile_file, LoadOptions};
