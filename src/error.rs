//! # 统一错误处理模块
//!
//! 定义 domainwidth 的所有错误类型，使用 `thiserror` 派生。
//!
//! 拟合失败（`FitError`）不是致命错误，单独定义，由调用方降级为警告。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// domainwidth 统一错误类型
#[derive(Error, Debug)]
pub enum DomainError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 数据格式错误
    // ─────────────────────────────────────────────────────────────
    #[error("Malformed profile data in {path}\nReason: {reason}")]
    DataFormat { path: String, reason: String },

    #[error("Failed to decode image: {path}\nReason: {reason}")]
    ImageError { path: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid range format: {0}")]
    InvalidRange(String),

    #[error("Invalid region pattern: {0}")]
    InvalidPattern(String),

    // ─────────────────────────────────────────────────────────────
    // CSV 错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    // ─────────────────────────────────────────────────────────────
    // 绘图错误
    // ─────────────────────────────────────────────────────────────
    #[error("Plotting failed: {0}")]
    PlotError(String),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("No matching files found with pattern: {pattern}")]
    NoFilesFound { pattern: String },
}

/// 统计拟合失败原因
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("too few samples ({count}, need at least {required})")]
    TooFewSamples { count: usize, required: usize },

    #[error("degenerate distribution: {0}")]
    Degenerate(String),

    #[error("fit not converged after {iterations} iterations")]
    NotConverged { iterations: usize },
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, DomainError>;
