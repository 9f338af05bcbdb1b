//! # analyze 命令实现
//!
//! 完整的畴宽分析流程。
//!
//! ## 流程
//! 1. 校验参数，收集输入文件
//! 2. 读取全部剖面（格式错误在分析开始前中止）
//! 3. 检测每条剖面的极小值，按区域合并畴宽
//! 4. 每个区域: 离群值剔除 → 直方图 → 矩估计 + 高斯拟合
//! 5. 打印汇总表，可选导出 CSV，生成三联图
//!
//! 单个区域拟合失败只产生警告，不影响其他区域。
//!
//! ## 依赖关系
//! - 使用 `cli/analyze.rs` 定义的参数
//! - 使用 `batch/`, `parsers/`, `analysis/`
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use crate::analysis::export;
use crate::analysis::plot::{self, ExampleProfile, FigureOptions, ImageLabel};
use crate::analysis::{
    summarize, BinSpec, MinimaFinder, RegionSummary, SummaryOptions, WidthAggregator,
};
use crate::batch::FileCollector;
use crate::cli::analyze::{AnalyzeArgs, FigureFormat, GroupBy};
use crate::error::{DomainError, Result};
use crate::models::region;
use crate::models::ProfileDataset;
use crate::parsers::{self, LoadOptions};
use crate::utils::{output, progress};

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};

/// 区域汇总表格行
#[derive(Debug, Clone, Tabled)]
struct SummaryRow {
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Profiles")]
    profiles: usize,
    #[tabled(rename = "Minima")]
    minima: usize,
    #[tabled(rename = "Widths")]
    widths: usize,
    #[tabled(rename = "Outliers")]
    outliers: usize,
    #[tabled(rename = "Mean (nm)")]
    mean: String,
    #[tabled(rename = "Std (nm)")]
    std: String,
    #[tabled(rename = "Fit center (nm)")]
    center: String,
    #[tabled(rename = "Fit σ (nm)")]
    sigma: String,
}

/// 执行 analyze 命令
pub fn execute(args: AnalyzeArgs) -> Result<()> {
    output::print_header("Nano-domain Width Analysis");

    // 参数检查
    validate_args(&args)?;
    let config = args.detection.to_config();
    config.validate()?;
    let bins = BinSpec::parse(&args.bins)?;
    let image_labels = parse_image_labels(&args)?;
    let region_pattern = match args.group_by {
        GroupBy::Column => Some(
            Regex::new(&args.region_pattern)
                .map_err(|e| DomainError::InvalidPattern(e.to_string()))?,
        ),
        GroupBy::File => None,
    };

    // 收集输入文件
    let files = collect_inputs(&args.inputs, &args.pattern, args.recursive)?;
    output::print_info(&format!(
        "Found {} profile file(s), layout: {}, grouping: {}",
        files.len(),
        args.data.layout,
        args.group_by
    ));

    // 读取全部数据
    let labels = region::resolve_labels(args.labels.as_deref(), files.len());
    let mut datasets: Vec<ProfileDataset> = Vec::with_capacity(files.len());
    for (file, label) in files.iter().zip(labels) {
        let options = LoadOptions {
            layout: args.data.layout,
            nm_per_pixel: args.data.nm_per_pixel,
            region: label,
            region_pattern: region_pattern.clone(),
        };
        let dataset = parsers::parse_profile_file(file, &options)?;
        output::print_loaded(&dataset.source, &dataset.regions(), dataset.profiles.len());
        datasets.push(dataset);
    }

    // 检测极小值并按区域合并
    let finder = MinimaFinder::new(config);
    let total: usize = datasets.iter().map(|d| d.profiles.len()).sum();
    let pb = progress::create_progress_bar(total as u64, "Finding minima");

    let mut aggregator = WidthAggregator::new();
    let mut examples: Vec<ExampleProfile> = Vec::new();

    for (i, dataset) in datasets.iter().enumerate() {
        for profile in &dataset.profiles {
            let minima = finder.find(profile);
            aggregator.add_profile(&profile.region, &minima);

            if i == 0 && examples.len() < args.example_profiles {
                examples.push(ExampleProfile {
                    profile: profile.clone(),
                    minima,
                });
            }
            pb.inc(1);
        }
    }
    pb.finish_and_clear();

    // 区域统计
    let options = SummaryOptions {
        bins,
        iqr_factor: (!args.no_outlier_filter).then_some(args.iqr_factor),
    };
    let summaries: Vec<RegionSummary> = aggregator
        .into_regions()
        .iter()
        .enumerate()
        .map(|(i, r)| summarize(i, r, &options))
        .collect();

    report(&summaries);

    // 导出
    if let Some(ref dir) = args.export_hist {
        export_regions(&summaries, dir)?;
        output::print_success(&format!(
            "Histograms and widths exported to '{}'",
            dir.display()
        ));
    }

    // 出图
    if args.no_plot {
        output::print_skip("Figure generation disabled (--no-plot)");
    } else {
        let format = args
            .format
            .unwrap_or_else(|| guess_format_from_extension(&args.output));
        let figure = FigureOptions {
            width: args.width,
            height: args.height,
            image: args.image.clone(),
            image_nm_per_pixel: args.image_nm_per_pixel,
            scale_bar_nm: args.scale_bar,
            profile_offset: args.profile_offset,
            hist_x_max: args.hist_xmax,
            labels: image_labels,
        };
        plot::generate_figure(
            &examples,
            &summaries,
            &figure,
            &args.output,
            format == FigureFormat::Svg,
        )?;
        output::print_success(&format!("Figure saved to '{}'", args.output.display()));
    }

    output::print_done(&format!(
        "{} region(s), {} width(s) analyzed, {} fitted",
        summaries.len(),
        summaries.iter().map(|s| s.widths.len()).sum::<usize>(),
        summaries.iter().filter(|s| s.is_fitted()).count()
    ));

    Ok(())
}

/// 解析 `--region-label-at`；没有显微图像时标注被忽略
fn parse_image_labels(args: &AnalyzeArgs) -> Result<Vec<ImageLabel>> {
    let labels = args
        .region_label_at
        .iter()
        .map(|s| ImageLabel::parse(s))
        .collect::<Result<Vec<_>>>()?;

    if !labels.is_empty() && args.image.is_none() {
        output::print_warning("--region-label-at has no effect without --image");
    }
    Ok(labels)
}

/// 校验与数据无关的数值参数
fn validate_args(args: &AnalyzeArgs) -> Result<()> {
    let positive = [
        ("--nm-per-pixel", args.data.nm_per_pixel),
        ("--image-nm-per-pixel", args.image_nm_per_pixel),
    ];
    for (name, value) in positive {
        if !value.is_finite() || value <= 0.0 {
            return Err(DomainError::InvalidArgument(format!(
                "{} must be a positive number, got {}",
                name, value
            )));
        }
    }

    if !args.iqr_factor.is_finite() || args.iqr_factor < 0.0 {
        return Err(DomainError::InvalidArgument(format!(
            "--iqr-factor must be non-negative, got {}",
            args.iqr_factor
        )));
    }

    if let Some(bar) = args.scale_bar {
        if !bar.is_finite() || bar <= 0.0 {
            return Err(DomainError::InvalidArgument(format!(
                "--scale-bar must be a positive length, got {}",
                bar
            )));
        }
    }

    if !args.profile_offset.is_finite() {
        return Err(DomainError::InvalidArgument(
            "--profile-offset must be finite".to_string(),
        ));
    }

    if args.width == 0 || args.height == 0 {
        return Err(DomainError::InvalidArgument(format!(
            "Figure size must be non-zero, got {}x{}",
            args.width, args.height
        )));
    }

    Ok(())
}

/// 收集输入文件（文件直接使用，目录按模式扫描）
fn collect_inputs(inputs: &[PathBuf], pattern: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if !input.exists() {
            return Err(DomainError::FileNotFound {
                path: input.display().to_string(),
            });
        }
        let found = FileCollector::new(input)
            .with_pattern(pattern)
            .recursive(recursive)
            .collect()?;
        for file in found {
            if !files.contains(&file) {
                files.push(file);
            }
        }
    }

    if files.is_empty() {
        return Err(DomainError::NoFilesFound {
            pattern: pattern.to_string(),
        });
    }

    Ok(files)
}

/// 打印区域汇总表和非致命问题
fn report(summaries: &[RegionSummary]) {
    for s in summaries {
        if s.empty_profiles > 0 {
            output::print_skip(&format!(
                "{}: {} of {} profile(s) had fewer than two minima",
                s.label, s.empty_profiles, s.profiles
            ));
        }
        if s.outliers > 0 {
            output::print_info(&format!(
                "{}: {} outlier width(s) rejected",
                s.label, s.outliers
            ));
        }
        let outside = (s.widths.len() as u64).saturating_sub(s.histogram.total());
        if outside > 0 {
            output::print_info(&format!(
                "{}: {} width(s) outside the histogram range",
                s.label, outside
            ));
        }
        match s.fit {
            Ok(ref fit) => output::print_info(&format!(
                "{}: fit converged in {} iteration(s), residual {:.3}",
                s.label, fit.iterations, fit.rss
            )),
            Err(ref e) => {
                output::print_warning(&format!("{}: fit not converged ({})", s.label, e))
            }
        }
    }

    let rows: Vec<SummaryRow> = summaries.iter().map(summary_row).collect();
    output::print_header("Domain Width Summary");
    println!("{}", Table::new(&rows));
    output::print_separator();
}

fn summary_row(s: &RegionSummary) -> SummaryRow {
    let (mean, std) = match s.normal {
        Ok(ref n) => (format!("{:.2}", n.mean), format!("{:.2}", n.std)),
        Err(_) => ("-".to_string(), "-".to_string()),
    };
    let (center, sigma) = match s.fit {
        Ok(ref f) => (
            format!("{:.2} ± {:.2}", f.params.center, f.errors.center),
            format!("{:.2} ± {:.2}", f.params.sigma, f.errors.sigma),
        ),
        Err(_) => ("-".to_string(), "-".to_string()),
    };

    SummaryRow {
        region: s.label.clone(),
        profiles: s.profiles,
        minima: s.minima,
        widths: s.widths.len(),
        outliers: s.outliers,
        mean,
        std,
        center,
        sigma,
    }
}

/// 导出每个区域的直方图和畴宽: hist_<n>.csv, widths_<n>.csv
fn export_regions(summaries: &[RegionSummary], dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| DomainError::FileWriteError {
        path: dir.display().to_string(),
        source: e,
    })?;

    for s in summaries {
        let n = s.index + 1;
        export::histogram_to_csv(&s.histogram, &dir.join(format!("hist_{}.csv", n)))?;
        export::widths_to_csv(&s.label, &s.widths, &dir.join(format!("widths_{}.csv", n)))?;
    }
    Ok(())
}

/// 从文件扩展名推断图像格式
fn guess_format_from_extension(path: &Path) -> FigureFormat {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .as_deref()
    {
        Some("svg") => FigureFormat::Svg,
        _ => FigureFormat::Png,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "domainwidth_analyze_{}_{}",
            std::process::id(),
            name
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn parse(argv: &[&str]) -> AnalyzeArgs {
        match Cli::try_parse_from(argv).unwrap().command {
            crate::cli::Commands::Analyze(args) => args,
            _ => panic!("expected analyze"),
        }
    }

    /// 周期为 `period` 的余弦剖面，极小值位于 period/2 + k·period
    fn periodic_csv(period: f64, columns: usize, samples: usize) -> String {
        let mut text = String::from("Distance");
        for c in 0..columns {
            text.push_str(&format!(",Line{}", c + 1));
        }
        text.push('\n');
        for i in 0..samples {
            let x = i as f64 * 0.5;
            text.push_str(&format!("{}", x));
            for c in 0..columns {
                let phase = c as f64 * 0.1;
                let y = 100.0 + 50.0 * (2.0 * std::f64::consts::PI * x / period + phase).cos();
                text.push_str(&format!(",{:.4}", y));
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_guess_format() {
        assert_eq!(guess_format_from_extension(Path::new("a.svg")), FigureFormat::Svg);
        assert_eq!(guess_format_from_extension(Path::new("a.SVG")), FigureFormat::Svg);
        assert_eq!(guess_format_from_extension(Path::new("a.png")), FigureFormat::Png);
        assert_eq!(guess_format_from_extension(Path::new("figure")), FigureFormat::Png);
    }

    #[test]
    fn test_collect_inputs_missing_path() {
        let result = collect_inputs(&[PathBuf::from("/nonexistent/profiles")], "*.csv", false);
        assert!(matches!(result, Err(DomainError::FileNotFound { .. })));
    }

    #[test]
    fn test_collect_inputs_empty_dir() {
        let dir = temp_dir("empty");
        let result = collect_inputs(&[dir.clone()], "profiledata*.csv", false);
        fs::remove_dir_all(&dir).ok();
        assert!(matches!(result, Err(DomainError::NoFilesFound { .. })));
    }

    #[test]
    fn test_collect_inputs_deduplicates() {
        let dir = temp_dir("dedup");
        let file = dir.join("profiledata1.csv");
        fs::write(&file, "").unwrap();
        let inputs = [dir.clone(), file.clone()];
        let files = collect_inputs(&inputs, "profiledata*.csv", false).unwrap();
        fs::remove_dir_all(&dir).ok();
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn test_validate_rejects_bad_calibration() {
        let args = parse(&["domainwidth", "analyze", "x.csv", "--nm-per-pixel", "0"]);
        assert!(matches!(
            validate_args(&args),
            Err(DomainError::InvalidArgument(_))
        ));

        let args = parse(&["domainwidth", "analyze", "x.csv", "--scale-bar=-5"]);
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_parse_image_labels() {
        let args = parse(&[
            "domainwidth",
            "analyze",
            "x.csv",
            "--image",
            "tem.tif",
            "--region-label-at",
            "Region 1@305,80",
            "--region-label-at",
            "Region 2@1200,80",
        ]);
        let labels = parse_image_labels(&args).unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].text, "Region 1");
        assert_eq!((labels[1].x, labels[1].y), (1200.0, 80.0));

        let args = parse(&["domainwidth", "analyze", "x.csv", "--region-label-at", "Region 1"]);
        assert!(matches!(
            parse_image_labels(&args),
            Err(DomainError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_execute_end_to_end() {
        let dir = temp_dir("e2e");
        fs::write(dir.join("profiledata1.csv"), periodic_csv(8.0, 3, 161)).unwrap();
        fs::write(dir.join("profiledata2.csv"), periodic_csv(12.0, 3, 161)).unwrap();
        let export_dir = dir.join("export");

        let args = parse(&[
            "domainwidth",
            "analyze",
            dir.to_str().unwrap(),
            "--labels",
            "A,B",
            "--bins",
            "0:20:41",
            "--export-hist",
            export_dir.to_str().unwrap(),
            "--no-plot",
        ]);
        let result = execute(args);

        let hist1 = fs::read_to_string(export_dir.join("hist_1.csv"));
        let widths2 = fs::read_to_string(export_dir.join("widths_2.csv"));
        fs::remove_dir_all(&dir).ok();

        assert!(result.is_ok(), "{:?}", result);
        assert!(hist1.unwrap().starts_with("bin_start,count\n"));
        let widths2 = widths2.unwrap();
        assert!(widths2.starts_with("region,width\nB,"));
    }

    #[test]
    fn test_execute_rejects_malformed_file() {
        let dir = temp_dir("malformed");
        fs::write(dir.join("profiledata1.csv"), "Distance,Line1\n0,1\n1,abc\n").unwrap();

        let args = parse(&["domainwidth", "analyze", dir.to_str().unwrap(), "--no-plot"]);
        let result = execute(args);
        fs::remove_dir_all(&dir).ok();

        assert!(matches!(result, Err(DomainError::DataFormat { .. })));
    }
}
