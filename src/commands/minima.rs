//! # minima 命令实现
//!
//! 列出单个文件中每条剖面检测到的极小值，便于调节检测参数。
//!
//! ## 依赖关系
//! - 使用 `cli/minima.rs` 定义的参数
//! - 使用 `parsers/`, `analysis/minima.rs`, `analysis/export.rs`
//! - 使用 `utils/output.rs`

use crate::analysis::export::{self, MinimumRow};
use crate::analysis::widths::consecutive_widths;
use crate::analysis::{MinimaFinder, Minimum};
use crate::cli::minima::MinimaArgs;
use crate::error::Result;
use crate::models::{region, Profile};
use crate::parsers::{self, LoadOptions};
use crate::utils::output;

use tabled::{Table, Tabled};

/// 每条剖面显示的极小值位置个数上限
const MAX_LISTED_POSITIONS: usize = 6;

/// 剖面概览表格行
#[derive(Debug, Clone, Tabled)]
struct ProfileRow {
    #[tabled(rename = "Profile")]
    profile: String,
    #[tabled(rename = "Samples")]
    samples: usize,
    #[tabled(rename = "Step (nm)")]
    step: String,
    #[tabled(rename = "Minima")]
    minima: usize,
    #[tabled(rename = "Mean width (nm)")]
    mean_width: String,
    #[tabled(rename = "Positions (nm)")]
    positions: String,
}

/// 执行 minima 命令
pub fn execute(args: MinimaArgs) -> Result<()> {
    output::print_header("Intensity Minima");

    let config = args.detection.to_config();
    config.validate()?;

    let options = LoadOptions {
        layout: args.data.layout,
        nm_per_pixel: args.data.nm_per_pixel,
        ..LoadOptions::new(region::default_label(0))
    };
    let dataset = parsers::parse_profile_file(&args.input, &options)?;
    output::print_info(&format!(
        "Loaded {} profile(s) from '{}'",
        dataset.profiles.len(),
        dataset.source
    ));

    let finder = MinimaFinder::new(config);
    let limit = args.limit.unwrap_or(dataset.profiles.len());
    let results: Vec<(&Profile, Vec<Minimum>)> = dataset
        .profiles
        .iter()
        .take(limit)
        .map(|p| (p, finder.find(p)))
        .collect();

    let rows: Vec<ProfileRow> = results.iter().map(|(p, m)| profile_row(p, m)).collect();
    println!("{}", Table::new(&rows));

    let sparse = results.iter().filter(|(_, m)| m.len() < 2).count();
    if sparse > 0 {
        output::print_warning(&format!(
            "{} profile(s) have fewer than two minima and yield no widths",
            sparse
        ));
    }

    if let Some(ref path) = args.output {
        let csv_rows: Vec<MinimumRow> = results
            .iter()
            .flat_map(|(p, minima)| {
                minima
                    .iter()
                    .map(move |m| MinimumRow::new(&p.name, &p.region, m))
            })
            .collect();
        export::minima_to_csv(&csv_rows, path)?;
        output::print_success(&format!(
            "{} minima saved to '{}'",
            csv_rows.len(),
            path.display()
        ));
    }

    Ok(())
}

fn profile_row(profile: &Profile, minima: &[Minimum]) -> ProfileRow {
    let widths = consecutive_widths(minima);
    let mean_width = if widths.is_empty() {
        "-".to_string()
    } else {
        format!("{:.2}", widths.iter().sum::<f64>() / widths.len() as f64)
    };

    let mut positions: Vec<String> = minima
        .iter()
        .take(MAX_LISTED_POSITIONS)
        .map(|m| format!("{:.1}", m.position))
        .collect();
    if minima.len() > MAX_LISTED_POSITIONS {
        positions.push("…".to_string());
    }

    ProfileRow {
        profile: profile.name.clone(),
        samples: profile.len(),
        step: format!("{:.3}", profile.mean_spacing()),
        minima: minima.len(),
        mean_width,
        positions: positions.join(", "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;

    fn minimum(position: f64) -> Minimum {
        Minimum {
            index: 0,
            position,
            intensity: 10.0,
            prominence: 5.0,
            width: 2.0,
        }
    }

    #[test]
    fn test_profile_row() {
        let profile = Profile::new("Line1", "Region 1", vec![0.0, 1.0, 2.0], vec![1.0, 0.0, 1.0]);
        let row = profile_row(&profile, &[minimum(0.0), minimum(5.0), minimum(12.0)]);
        assert_eq!(row.minima, 3);
        assert_eq!(row.samples, 3);
        assert_eq!(row.step, "1.000");
        assert_eq!(row.mean_width, "6.00");
        assert_eq!(row.positions, "0.0, 5.0, 12.0");
    }

    #[test]
    fn test_profile_row_without_widths() {
        let profile = Profile::new("Line1", "Region 1", vec![0.0, 1.0], vec![1.0, 2.0]);
        let row = profile_row(&profile, &[minimum(3.0)]);
        assert_eq!(row.mean_width, "-");
    }

    #[test]
    fn test_execute_writes_csv() {
        let dir = std::env::temp_dir().join(format!("domainwidth_minima_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let input = dir.join("profiles.csv");
        let output = dir.join("minima.csv");
        fs::write(
            &input,
            "Distance,Line1\n0,9\n1,5\n2,1\n3,5\n4,9\n5,5\n6,1\n7,5\n8,9\n",
        )
        .unwrap();

        let args = match Cli::try_parse_from([
            "domainwidth",
            "minima",
            input.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ])
        .unwrap()
        .command
        {
            Commands::Minima(args) => args,
            _ => panic!("expected minima"),
        };
        let result = execute(args);
        let text = fs::read_to_string(&output);
        fs::remove_dir_all(&dir).ok();

        assert!(result.is_ok());
        let text = text.unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("Line1,Region 1,2,2.0,1.0,"));
        assert!(lines[2].starts_with("Line1,Region 1,6,6.0,1.0,"));
    }
}
