//! # 三联图生成
//!
//! 使用 `plotters` 库生成论文用三联图：
//! - (a) 左侧：显微图像（可选），附比例尺
//! - (b) 右上：示例线剖面（纵向错开），红色刻线标出检测到的极小值
//! - (c) 右下：各区域畴宽直方图（阶梯线）与拟合高斯曲线（虚线）
//!
//! 纯展示用途，不回馈到数值计算。
//!
//! ## 依赖关系
//! - 被 `commands/analyze.rs` 调用
//! - 使用 `analysis/summary.rs` 的 RegionSummary
//! - 使用 `plotters` 渲染图表，`image` 读取显微图像

use crate::analysis::summary::RegionSummary;
use crate::analysis::Minimum;
use crate::error::{DomainError, Result};
use crate::models::region::region_color;
use crate::models::Profile;

use image::imageops::FilterType;
use image::RgbImage;
use plotters::coord::Shift;
use plotters::element::BitMapElement;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use std::path::{Path, PathBuf};

const PROFILE_COLOR: RGBColor = RGBColor(128, 128, 128);

/// 图表选项
#[derive(Debug, Clone)]
pub struct FigureOptions {
    pub width: u32,
    pub height: u32,
    /// 显微图像路径
    pub image: Option<PathBuf>,
    /// 显微图像标定（nm/pixel），用于比例尺
    pub image_nm_per_pixel: f64,
    /// 比例尺长度（nm）
    pub scale_bar_nm: Option<f64>,
    /// 示例剖面之间的纵向偏移
    pub profile_offset: f64,
    /// 直方图 x 轴上限；None 时使用分箱上限
    pub hist_x_max: Option<f64>,
    /// 显微图像上的区域标注
    pub labels: Vec<ImageLabel>,
}

/// 显微图像上的文字标注，坐标为原图像素
#[derive(Debug, Clone, PartialEq)]
pub struct ImageLabel {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

impl ImageLabel {
    /// 解析 `TEXT@X,Y`，例如 `Region 1@305,80`
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = || {
            DomainError::InvalidArgument(format!(
                "image label '{}' must look like TEXT@X,Y",
                spec
            ))
        };

        let (text, position) = spec.rsplit_once('@').ok_or_else(invalid)?;
        let (x, y) = position.split_once(',').ok_or_else(invalid)?;
        let x: f64 = x.trim().parse().map_err(|_| invalid())?;
        let y: f64 = y.trim().parse().map_err(|_| invalid())?;

        let text = text.trim();
        if text.is_empty() || !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 {
            return Err(invalid());
        }

        Ok(ImageLabel {
            text: text.to_string(),
            x,
            y,
        })
    }
}

/// 示例剖面及其极小值
pub struct ExampleProfile {
    pub profile: Profile,
    pub minima: Vec<Minimum>,
}

/// 生成三联图
pub fn generate_figure(
    examples: &[ExampleProfile],
    regions: &[RegionSummary],
    options: &FigureOptions,
    output_path: &Path,
    use_svg: bool,
) -> Result<()> {
    let image = options.image.as_deref().map(load_image).transpose()?;
    let size = (options.width, options.height);

    if use_svg {
        let root = SVGBackend::new(output_path, size).into_drawing_area();
        draw_figure(&root, image.as_ref(), examples, regions, options)?;
        root.present().map_err(plot_err)?;
    } else {
        let root = BitMapBackend::new(output_path, size).into_drawing_area();
        draw_figure(&root, image.as_ref(), examples, regions, options)?;
        root.present().map_err(plot_err)?;
    }
    Ok(())
}

/// 读取显微图像
pub fn load_image(path: &Path) -> Result<RgbImage> {
    if !path.exists() {
        return Err(DomainError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    image::open(path)
        .map(|img| img.to_rgb8())
        .map_err(|e| DomainError::ImageError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
}

fn plot_err<E: std::fmt::Debug>(e: E) -> DomainError {
    DomainError::PlotError(format!("{:?}", e))
}

/// 绘制三联图的核心逻辑
fn draw_figure<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    image: Option<&RgbImage>,
    examples: &[ExampleProfile],
    regions: &[RegionSummary],
    options: &FigureOptions,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(plot_err)?;

    let (w, h) = root.dim_in_pixel();
    let (left, right) = root.split_horizontally((w / 2) as i32);
    let (top, bottom) = right.split_vertically((h * 5 / 9) as i32);

    draw_image_panel(&left, image, options)?;
    draw_profile_panel(&top, examples, options.profile_offset)?;
    draw_histogram_panel(&bottom, regions, options.hist_x_max)?;

    Ok(())
}

/// (a) 显微图像
fn draw_image_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    image: Option<&RgbImage>,
    options: &FigureOptions,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let area = area.titled("(a) Image", ("sans-serif", 18)).map_err(plot_err)?;
    let (aw, ah) = area.dim_in_pixel();

    let image = match image {
        Some(img) if img.width() > 0 && img.height() > 0 => img,
        _ => {
            area.draw(&Text::new(
                "No image supplied",
                (aw as i32 / 2 - 70, ah as i32 / 2),
                ("sans-serif", 16).into_font().color(&BLACK),
            ))
            .map_err(plot_err)?;
            return Ok(());
        }
    };

    // 底部留出比例尺空间
    let margin = 10.0;
    let avail_w = (aw as f64 - 2.0 * margin).max(1.0);
    let avail_h = (ah as f64 - 2.0 * margin - 40.0).max(1.0);
    let scale = (avail_w / image.width() as f64).min(avail_h / image.height() as f64);
    let tw = ((image.width() as f64 * scale) as u32).max(1);
    let th = ((image.height() as f64 * scale) as u32).max(1);

    let resized = image::imageops::resize(image, tw, th, FilterType::Triangle);
    let origin = (margin as i32, margin as i32);
    let bitmap: BitMapElement<(i32, i32)> =
        BitMapElement::with_owned_buffer(origin, (tw, th), resized.into_raw())
            .ok_or_else(|| DomainError::PlotError("image buffer size mismatch".to_string()))?;
    area.draw(&bitmap).map_err(plot_err)?;

    for label in &options.labels {
        let pos = (
            origin.0 + (label.x * scale).round() as i32,
            origin.1 + (label.y * scale).round() as i32,
        );
        area.draw(&Text::new(
            label.text.as_str(),
            pos,
            ("sans-serif", 22).into_font().color(&WHITE),
        ))
        .map_err(plot_err)?;
    }

    if let Some(bar_nm) = options.scale_bar_nm {
        let bar_px = (bar_nm / options.image_nm_per_pixel * scale).round() as i32;
        let y0 = origin.1 + th as i32 + 12;
        area.draw(&Rectangle::new(
            [(origin.0, y0), (origin.0 + bar_px, y0 + 8)],
            BLACK.filled(),
        ))
        .map_err(plot_err)?;
        area.draw(&Text::new(
            format!("{} nm", bar_nm),
            (origin.0 + bar_px + 10, y0 - 4),
            ("sans-serif", 16).into_font().color(&BLACK),
        ))
        .map_err(plot_err)?;
    }

    Ok(())
}

/// (b) 示例剖面
fn draw_profile_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    examples: &[ExampleProfile],
    offset: f64,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let caption = "(b) Line profile examples";
    let drawn: Vec<&ExampleProfile> = examples.iter().filter(|e| !e.profile.is_empty()).collect();

    let x_min = drawn
        .iter()
        .filter_map(|e| e.profile.distance.first().copied())
        .fold(f64::INFINITY, f64::min);
    let x_max = drawn
        .iter()
        .filter_map(|e| e.profile.distance.last().copied())
        .fold(f64::NEG_INFINITY, f64::max);

    if drawn.is_empty() || !x_min.is_finite() || !x_max.is_finite() {
        let area = area.titled(caption, ("sans-serif", 18)).map_err(plot_err)?;
        area.draw(&Text::new(
            "No profiles to show",
            (20, 20),
            ("sans-serif", 16).into_font().color(&BLACK),
        ))
        .map_err(plot_err)?;
        return Ok(());
    }

    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for (i, e) in drawn.iter().enumerate() {
        let shift = offset * i as f64;
        for v in &e.profile.intensity {
            y_min = y_min.min(v + shift);
            y_max = y_max.max(v + shift);
        }
    }
    let pad = ((y_max - y_min) * 0.05).max(1.0);
    let x_max = if x_max > x_min { x_max } else { x_min + 1.0 };

    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 18))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(10)
        .build_cartesian_2d(x_min..x_max, (y_min - pad)..(y_max + pad))
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .y_labels(0)
        .x_desc("Distance (nm)")
        .x_label_style(("sans-serif", 14))
        .axis_desc_style(("sans-serif", 16))
        .draw()
        .map_err(plot_err)?;

    for (i, e) in drawn.iter().enumerate() {
        let shift = offset * i as f64;
        chart
            .draw_series(LineSeries::new(
                e.profile
                    .distance
                    .iter()
                    .zip(&e.profile.intensity)
                    .map(|(&x, &y)| (x, y + shift)),
                PROFILE_COLOR.stroke_width(1),
            ))
            .map_err(plot_err)?;

        chart
            .draw_series(e.minima.iter().map(|m| {
                EmptyElement::at((m.position, m.intensity + shift))
                    + PathElement::new(vec![(0, -6), (0, 6)], RED.stroke_width(2))
            }))
            .map_err(plot_err)?;
    }

    Ok(())
}

/// (c) 畴宽分布
fn draw_histogram_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    regions: &[RegionSummary],
    hist_x_max: Option<f64>,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let x_min = regions
        .first()
        .and_then(|r| r.histogram.edges.first().copied())
        .unwrap_or(0.0);
    let x_max = hist_x_max
        .or_else(|| regions.first().and_then(|r| r.histogram.edges.last().copied()))
        .unwrap_or(100.0);
    let x_max = if x_max > x_min { x_max } else { x_min + 1.0 };

    let y_max = regions
        .iter()
        .map(|r| r.histogram.max_count())
        .max()
        .unwrap_or(0)
        .max(1) as f64
        * 1.15;

    let mut chart = ChartBuilder::on(area)
        .caption("(c) Nanodomain width distribution", ("sans-serif", 18))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(30)
        .build_cartesian_2d(x_min..x_max, 0.0..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .y_labels(0)
        .x_desc("Width (nm)")
        .y_desc("Frequency")
        .x_label_style(("sans-serif", 14))
        .axis_desc_style(("sans-serif", 16))
        .draw()
        .map_err(plot_err)?;

    let mut fit_labelled = false;

    for region in regions {
        let (r, g, b) = region_color(region.index);
        let color = RGBColor(r, g, b);

        chart
            .draw_series(LineSeries::new(
                step_points(&region.histogram.edges, &region.histogram.counts, x_max),
                color.stroke_width(1),
            ))
            .map_err(plot_err)?
            .label(region.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));

        if let Ok(fit) = &region.fit {
            let n = 300;
            let curve: Vec<(f64, f64)> = (0..=n)
                .map(|i| {
                    let x = x_min + (x_max - x_min) * i as f64 / n as f64;
                    (x, fit.params.eval(x).clamp(0.0, y_max))
                })
                .collect();

            let anno = chart
                .draw_series(DashedLineSeries::new(
                    curve,
                    6,
                    4,
                    color.stroke_width(1),
                ))
                .map_err(plot_err)?;
            if !fit_labelled {
                anno.label("Fit")
                    .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 8, y)], &PROFILE_COLOR));
                fit_labelled = true;
            }
        }
    }

    if !regions.is_empty() {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .label_font(("sans-serif", 14))
            .draw()
            .map_err(plot_err)?;
    }

    Ok(())
}

/// 直方图阶梯线顶点，裁剪到 `x_max`
fn step_points(edges: &[f64], counts: &[u64], x_max: f64) -> Vec<(f64, f64)> {
    let mut points = Vec::with_capacity(2 * counts.len() + 2);
    let Some(&first) = edges.first() else {
        return points;
    };
    points.push((first, 0.0));

    for (i, &c) in counts.iter().enumerate() {
        let (lo, hi) = (edges[i], edges[i + 1]);
        if lo >= x_max {
            break;
        }
        let c = c as f64;
        points.push((lo, c));
        points.push((hi.min(x_max), c));
        if hi >= x_max {
            return points;
        }
    }

    if let Some(&(last_x, _)) = points.last() {
        points.push((last_x, 0.0));
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fit::normal_samples;
    use crate::analysis::summary::{summarize, SummaryOptions};
    use crate::analysis::widths::RegionWidths;
    use crate::error::FitError;

    #[test]
    fn test_step_points() {
        let edges = [0.0, 1.0, 2.0];
        let counts = [3, 1];
        assert_eq!(
            step_points(&edges, &counts, 10.0),
            vec![
                (0.0, 0.0),
                (0.0, 3.0),
                (1.0, 3.0),
                (1.0, 1.0),
                (2.0, 1.0),
                (2.0, 0.0)
            ]
        );
    }

    #[test]
    fn test_step_points_clipped() {
        let edges = [0.0, 1.0, 2.0, 3.0];
        let counts = [3, 1, 5];
        let pts = step_points(&edges, &counts, 1.5);
        assert_eq!(pts.last(), Some(&(1.5, 1.0)));
        assert!(pts.iter().all(|(x, _)| *x <= 1.5));
    }

    fn figure_options() -> FigureOptions {
        FigureOptions {
            width: 900,
            height: 480,
            image: None,
            image_nm_per_pixel: 1.0,
            scale_bar_nm: None,
            profile_offset: 200.0,
            hist_x_max: None,
            labels: vec![],
        }
    }

    fn example() -> ExampleProfile {
        ExampleProfile {
            profile: Profile::new(
                "Line1",
                "Region 1",
                vec![0.0, 1.0, 2.0, 3.0, 4.0],
                vec![5.0, 2.0, 5.0, 1.0, 5.0],
            ),
            minima: vec![],
        }
    }

    fn regions() -> Vec<RegionSummary> {
        let sparse = RegionWidths {
            label: "Tetragonal".to_string(),
            profiles: 1,
            minima: 2,
            empty_profiles: 0,
            widths: vec![42.0],
        };
        let dense = RegionWidths {
            label: "Rhombohedral".to_string(),
            profiles: 20,
            minima: 420,
            empty_profiles: 0,
            widths: normal_samples(400, 60.0, 8.0, 11),
        };
        let options = SummaryOptions::default();
        vec![summarize(0, &sparse, &options), summarize(1, &dense, &options)]
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("domainwidth_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_render_svg_with_unfitted_region() {
        let regions = regions();
        assert!(matches!(
            regions[0].fit,
            Err(FitError::TooFewSamples { .. })
        ));
        assert!(regions[1].is_fitted());

        let path = temp_path("figure.svg");
        let result = generate_figure(&[example()], &regions, &figure_options(), &path, true);
        let svg = std::fs::read_to_string(&path);
        std::fs::remove_file(&path).ok();

        assert!(result.is_ok(), "{:?}", result);
        let svg = svg.unwrap();
        assert!(svg.contains("Nanodomain width distribution"));
        assert!(svg.contains("Tetragonal"));
        assert!(svg.contains("Rhombohedral"));
    }

    #[test]
    fn test_render_svg_with_micrograph_labels() {
        let image_path = temp_path("micrograph.png");
        RgbImage::from_pixel(40, 20, image::Rgb([90, 90, 90]))
            .save(&image_path)
            .unwrap();

        let options = FigureOptions {
            image: Some(image_path.clone()),
            image_nm_per_pixel: 0.5,
            scale_bar_nm: Some(5.0),
            labels: vec![
                ImageLabel::parse("Region 1@5,5").unwrap(),
                ImageLabel::parse("Region 2@25,12").unwrap(),
            ],
            ..figure_options()
        };
        let path = temp_path("labelled.svg");
        let result = generate_figure(&[example()], &regions(), &options, &path, true);
        let svg = std::fs::read_to_string(&path);
        std::fs::remove_file(&path).ok();
        std::fs::remove_file(&image_path).ok();

        assert!(result.is_ok(), "{:?}", result);
        let svg = svg.unwrap();
        assert!(svg.contains("Region 2"));
        assert!(svg.contains("5 nm"));
    }

    #[test]
    fn test_parse_image_label() {
        assert_eq!(
            ImageLabel::parse("Region 1@305,80").unwrap(),
            ImageLabel {
                text: "Region 1".to_string(),
                x: 305.0,
                y: 80.0
            }
        );
        assert_eq!(ImageLabel::parse("a@b@1, 2").unwrap().text, "a@b");

        for bad in ["Region 1", "@1,2", "R@1", "R@x,2", "R@-1,2"] {
            assert!(
                matches!(ImageLabel::parse(bad), Err(DomainError::InvalidArgument(_))),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn test_missing_image_reported() {
        let err = load_image(Path::new("/nonexistent/micrograph.png")).unwrap_err();
        assert!(matches!(err, DomainError::FileNotFound { .. }));
    }
}
