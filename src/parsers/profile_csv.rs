//! # ImageJ 线剖面 CSV 解析器
//!
//! 支持两种列布局：
//! - `shared`: 第一列为公共距离轴，其余每列为一条强度剖面
//! - `paired`: x/y 列交替出现，每对一条剖面，允许不同长度（尾部留空）
//!
//! 所有校验失败（空文件、非数值、列不齐、距离轴非递增）均为致命的
//! `DataFormat` 错误，在分析开始前中止。
//!
//! ## 依赖关系
//! - 被 `commands/` 调用
//! - 使用 `models/profile.rs` 的 Profile, ProfileDataset 结构
//! - 使用 `csv` 读取，`regex` 做按列名分组

use crate::cli::analyze::ProfileLayout;
use crate::error::{DomainError, Result};
use crate::models::{Profile, ProfileDataset};

use regex::Regex;
use std::fs;
use std::path::Path;

/// 加载选项
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// 列布局
    pub layout: ProfileLayout,
    /// 距离标定系数（nm/pixel），距离轴整体乘以该值
    pub nm_per_pixel: f64,
    /// 文件级区域标签
    pub region: String,
    /// 按列名分组时使用的正则（第一个捕获组为区域名）
    pub region_pattern: Option<Regex>,
}

impl LoadOptions {
    pub fn new(region: impl Into<String>) -> Self {
        LoadOptions {
            layout: ProfileLayout::Shared,
            nm_per_pixel: 1.0,
            region: region.into(),
            region_pattern: None,
        }
    }

    /// 由列名推断区域；未匹配时归入文件级区域
    fn region_for(&self, column: &str) -> String {
        self.region_pattern
            .as_ref()
            .and_then(|re| re.captures(column))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.region.clone())
    }
}

/// 从文件解析剖面数据
pub fn parse_profile_file(path: &Path, options: &LoadOptions) -> Result<ProfileDataset> {
    if !path.exists() {
        return Err(DomainError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let content = fs::read_to_string(path).map_err(|e| DomainError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_profile_content(&content, &path.display().to_string(), options)
}

/// 从字符串解析剖面数据
pub fn parse_profile_content(
    content: &str,
    source: &str,
    options: &LoadOptions,
) -> Result<ProfileDataset> {
    let format_err = |reason: String| DomainError::DataFormat {
        path: source.to_string(),
        reason,
    };

    if !options.nm_per_pixel.is_finite() || options.nm_per_pixel <= 0.0 {
        return Err(DomainError::InvalidArgument(format!(
            "nm-per-pixel must be positive, got {}",
            options.nm_per_pixel
        )));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    if headers.len() < 2 {
        return Err(format_err(format!(
            "expected at least 2 columns, found {}",
            headers.len()
        )));
    }

    // 读入所有单元格，缺失单元格记为 None；同时记录源文件行号
    let mut lines: Vec<u64> = Vec::new();
    let mut rows: Vec<Vec<Option<f64>>> = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(i as u64 + 2);

        if record.len() > headers.len() {
            return Err(format_err(format!(
                "row {} has {} cells but the header has {}",
                line,
                record.len(),
                headers.len()
            )));
        }

        let mut row = Vec::with_capacity(headers.len());
        for col in 0..headers.len() {
            let cell = record.get(col).unwrap_or("");
            row.push(parse_cell(cell).map_err(|reason| {
                format_err(format!(
                    "row {}, column '{}': {}",
                    line, headers[col], reason
                ))
            })?);
        }

        if row.iter().all(Option::is_none) {
            continue;
        }
        lines.push(line);
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(format_err("no data rows found".to_string()));
    }

    let mut dataset = ProfileDataset::new(source, options.region.clone());

    match options.layout {
        ProfileLayout::Shared => {
            let mut distance = Vec::with_capacity(rows.len());
            let mut columns: Vec<Vec<f64>> =
                vec![Vec::with_capacity(rows.len()); headers.len() - 1];

            for (row, &line) in rows.iter().zip(&lines) {
                for (col, cell) in row.iter().enumerate() {
                    let value = cell.ok_or_else(|| {
                        format_err(format!(
                            "ragged data: row {}, column '{}' is empty",
                            line, headers[col]
                        ))
                    })?;
                    if col == 0 {
                        distance.push(value * options.nm_per_pixel);
                    } else {
                        columns[col - 1].push(value);
                    }
                }
            }

            check_increasing(&distance, &lines).map_err(|reason| {
                format_err(format!("distance column '{}': {}", headers[0], reason))
            })?;

            for (name, intensity) in headers.iter().skip(1).zip(columns) {
                dataset.profiles.push(Profile::new(
                    name.clone(),
                    options.region_for(name),
                    distance.clone(),
                    intensity,
                ));
            }
        }
        ProfileLayout::Paired => {
            if headers.len() % 2 != 0 {
                return Err(format_err(format!(
                    "paired layout needs an even number of columns, found {}",
                    headers.len()
                )));
            }

            for pair in 0..headers.len() / 2 {
                let (xc, yc) = (2 * pair, 2 * pair + 1);
                let mut x = Vec::new();
                let mut y = Vec::new();
                let mut ended = false;

                for (row, &line) in rows.iter().zip(&lines) {
                    match (row[xc], row[yc]) {
                        (Some(xv), Some(yv)) => {
                            if ended {
                                return Err(format_err(format!(
                                    "ragged data: row {}, columns '{}'/'{}' resume after ending",
                                    line, headers[xc], headers[yc]
                                )));
                            }
                            x.push(xv * options.nm_per_pixel);
                            y.push(yv);
                        }
                        (None, None) => ended = true,
                        _ => {
                            return Err(format_err(format!(
                                "ragged data: row {}, columns '{}'/'{}' have only one of x/y",
                                line, headers[xc], headers[yc]
                            )));
                        }
                    }
                }

                if y.is_empty() {
                    return Err(format_err(format!(
                        "column '{}' contains no data",
                        headers[yc]
                    )));
                }

                check_increasing(&x, &lines).map_err(|reason| {
                    format_err(format!("distance column '{}': {}", headers[xc], reason))
                })?;

                let name = &headers[yc];
                dataset.profiles.push(Profile::new(
                    name.clone(),
                    options.region_for(name),
                    x,
                    y,
                ));
            }
        }
    }

    Ok(dataset)
}

/// 解析单元格：空白为 None，非数值或非有限值报错
fn parse_cell(cell: &str) -> std::result::Result<Option<f64>, String> {
    if cell.is_empty() {
        return Ok(None);
    }
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        Ok(_) => Err(format!("non-finite value '{}'", cell)),
        Err(_) => Err(format!("non-numeric value '{}'", cell)),
    }
}

/// 距离轴必须严格递增；`lines[i]` 为第 i 个值所在的源文件行号
fn check_increasing(axis: &[f64], lines: &[u64]) -> std::result::Result<(), String> {
    for (i, w) in axis.windows(2).enumerate() {
        if w[1] <= w[0] {
            return Err(format!(
                "not strictly increasing at row {} ({} -> {})",
                lines[i + 1],
                w[0],
                w[1]
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared() -> LoadOptions {
        LoadOptions::new("Region 1")
    }

    fn paired() -> LoadOptions {
        LoadOptions {
            layout: ProfileLayout::Paired,
            ..LoadOptions::new("Region 1")
        }
    }

    #[test]
    fn test_parse_shared_layout() {
        let content = "Distance,Line1,Line2\n0,10,20\n1,11,21\n2,12,22\n";
        let ds = parse_profile_content(content, "test", &shared()).unwrap();
        assert_eq!(ds.profiles.len(), 2);
        assert_eq!(ds.profiles[0].name, "Line1");
        assert_eq!(ds.profiles[1].intensity, vec![20.0, 21.0, 22.0]);
        assert_eq!(ds.profiles[0].distance, ds.profiles[1].distance);
        assert_eq!(ds.profiles[0].region, "Region 1");
    }

    #[test]
    fn test_scale_applied_to_distance() {
        let content = "Distance,Line1\n0,1\n1,2\n2,3\n";
        let options = LoadOptions {
            nm_per_pixel: 0.25,
            ..shared()
        };
        let ds = parse_profile_content(content, "test", &options).unwrap();
        assert_eq!(ds.profiles[0].distance, vec![0.0, 0.25, 0.5]);
        assert_eq!(ds.profiles[0].intensity, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_parse_paired_layout_uneven_lengths() {
        let content = "X0,Y0,X1,Y1\n0,5,0,7\n1,6,1,8\n2,7,,\n";
        let ds = parse_profile_content(content, "test", &paired()).unwrap();
        assert_eq!(ds.profiles.len(), 2);
        assert_eq!(ds.profiles[0].len(), 3);
        assert_eq!(ds.profiles[1].len(), 2);
        assert_eq!(ds.profiles[1].name, "Y1");
    }

    #[test]
    fn test_ragged_shared_rejected() {
        let content = "Distance,Line1,Line2\n0,10,20\n1,11\n";
        let err = parse_profile_content(content, "test", &shared()).unwrap_err();
        assert!(matches!(err, DomainError::DataFormat { .. }));
        assert!(err.to_string().contains("ragged"));
    }

    #[test]
    fn test_half_pair_rejected() {
        let content = "X0,Y0\n0,5\n1,\n";
        let err = parse_profile_content(content, "test", &paired()).unwrap_err();
        assert!(err.to_string().contains("only one of x/y"));
    }

    #[test]
    fn test_resumed_pair_rejected() {
        let content = "X0,Y0,X1,Y1\n0,5,0,1\n,,1,2\n2,7,2,3\n";
        let err = parse_profile_content(content, "test", &paired()).unwrap_err();
        assert!(err.to_string().contains("row 4"));
        assert!(err.to_string().contains("resume after ending"));
    }

    #[test]
    fn test_non_numeric_rejected() {
        let content = "Distance,Line1\n0,10\n1,abc\n";
        let err = parse_profile_content(content, "test", &shared()).unwrap_err();
        assert!(err.to_string().contains("non-numeric value 'abc'"));
        assert!(err.to_string().contains("row 3"));
    }

    #[test]
    fn test_single_column_rejected() {
        let err = parse_profile_content("Distance\n0\n1\n", "test", &shared()).unwrap_err();
        assert!(matches!(err, DomainError::DataFormat { .. }));
    }

    #[test]
    fn test_header_only_rejected() {
        let err = parse_profile_content("Distance,Line1\n", "test", &shared()).unwrap_err();
        assert!(err.to_string().contains("no data rows"));
    }

    #[test]
    fn test_decreasing_axis_rejected() {
        let content = "Distance,Line1\n0,1\n2,2\n1,3\n";
        let err = parse_profile_content(content, "test", &shared()).unwrap_err();
        assert!(err.to_string().contains("strictly increasing"));
    }

    #[test]
    fn test_errors_report_source_line_after_blank_rows() {
        let content = "Distance,Line1\n0,1\n,\n1,2\n2,\n";
        let err = parse_profile_content(content, "test", &shared()).unwrap_err();
        assert!(err.to_string().contains("row 5, column 'Line1' is empty"), "{}", err);

        let content = "Distance,Line1\n0,1\n,\n1,2\n1,3\n";
        let err = parse_profile_content(content, "test", &shared()).unwrap_err();
        assert!(err.to_string().contains("increasing at row 5"), "{}", err);

        let content = "X0,Y0\n0,1\n,\n1,2\n2,\n";
        let err = parse_profile_content(content, "test", &paired()).unwrap_err();
        assert!(err.to_string().contains("row 5"), "{}", err);
    }

    #[test]
    fn test_odd_paired_columns_rejected() {
        let content = "X0,Y0,X1\n0,1,0\n";
        let err = parse_profile_content(content, "test", &paired()).unwrap_err();
        assert!(err.to_string().contains("even number"));
    }

    #[test]
    fn test_region_from_column_name() {
        let content = "Distance,Tetra_1,Tetra_2,Rhombo_1,Y\n0,1,1,1,1\n1,2,2,2,2\n";
        let options = LoadOptions {
            region_pattern: Some(Regex::new(r"^(.+?)[\s_-]*\d+$").unwrap()),
            ..shared()
        };
        let ds = parse_profile_content(content, "test", &options).unwrap();
        let regions: Vec<&str> = ds.profiles.iter().map(|p| p.region.as_str()).collect();
        assert_eq!(regions, vec!["Tetra", "Tetra", "Rhombo", "Region 1"]);
    }
}
