//! # 批量输入模块
//!
//! 从文件和目录参数收集剖面文件列表。
//!
//! ## 依赖关系
//! - 被 `commands/analyze.rs` 使用
//! - 使用 `walkdir`, `glob`

pub mod collector;

pub use collector::FileCollector;
