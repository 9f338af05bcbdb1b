//! # 数据导出
//!
//! 导出直方图、合并畴宽和极小值列表到 CSV。
//!
//! ## 支持格式
//! - 直方图: bin_start, count
//! - 畴宽: region, width
//! - 极小值: profile, region, index, position, intensity, prominence, width
//!
//! ## 依赖关系
//! - 被 `commands/analyze.rs`, `commands/minima.rs` 调用
//! - 使用 `csv` + `serde` 写入 CSV 文件

use crate::analysis::histogram::Histogram;
use crate::analysis::Minimum;
use crate::error::{DomainError, Result};

use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct HistogramRow {
    bin_start: f64,
    count: u64,
}

#[derive(Debug, Serialize)]
struct WidthRow<'a> {
    region: &'a str,
    width: f64,
}

/// 极小值导出行
#[derive(Debug, Serialize)]
pub struct MinimumRow<'a> {
    pub profile: &'a str,
    pub region: &'a str,
    pub index: usize,
    pub position: f64,
    pub intensity: f64,
    pub prominence: f64,
    pub width: f64,
}

impl<'a> MinimumRow<'a> {
    pub fn new(profile: &'a str, region: &'a str, minimum: &Minimum) -> Self {
        MinimumRow {
            profile,
            region,
            index: minimum.index,
            position: minimum.position,
            intensity: minimum.intensity,
            prominence: minimum.prominence,
            width: minimum.width,
        }
    }
}

/// 导出直方图
pub fn histogram_to_csv(histogram: &Histogram, output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    for (bin_start, count) in histogram.bin_starts().iter().zip(&histogram.counts) {
        wtr.serialize(HistogramRow {
            bin_start: *bin_start,
            count: *count,
        })?;
    }

    flush(wtr, output_path)
}

/// 导出某区域的全部畴宽
pub fn widths_to_csv(region: &str, widths: &[f64], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    for &width in widths {
        wtr.serialize(WidthRow { region, width })?;
    }

    flush(wtr, output_path)
}

/// 导出极小值列表
pub fn minima_to_csv(rows: &[MinimumRow<'_>], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    for row in rows {
        wtr.serialize(row)?;
    }

    flush(wtr, output_path)
}

fn flush(mut wtr: csv::Writer<std::fs::File>, output_path: &Path) -> Result<()> {
    wtr.flush().map_err(|e| DomainError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })
}
