//! Chart image export
//!
//! Frames are drawn with plotters' SVG backend. PNG output rasterizes that
//! SVG with resvg so both formats come from the same drawing code.

use dash_core::{ChartType, Rgb};
use plotters::coord::Shift;
use plotters::prelude::*;
use resvg::{tiny_skia, usvg};
use std::f64::consts::{FRAC_PI_2, TAU};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::chart::{ChartFrame, FrameBody, LegendEntry, SeriesData};

/// Width of the legend column in exported images
const LEGEND_WIDTH: u32 = 170;
const FONT: &str = "sans-serif";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("an export of this chart is already running")]
    Busy,

    #[error("the capture region is empty")]
    EmptyRegion,

    #[error("drawing failed: {0}")]
    Render(String),

    #[error("rasterization failed: {0}")]
    Rasterize(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn render_err(e: impl std::fmt::Display) -> ExportError {
    ExportError::Render(e.to_string())
}

/// Image format of a single-chart export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Svg,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Svg => "svg",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Svg => "image/svg+xml",
        }
    }

    pub fn filter_name(&self) -> &'static str {
        match self {
            ExportFormat::Png => "PNG Image",
            ExportFormat::Svg => "SVG Vector Graphics",
        }
    }
}

/// Export options for charts
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub width: u32,
    pub height: u32,
    pub background: Rgb,
    pub include_legend: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            width: 960,
            height: 540,
            background: Rgb::new(255, 255, 255),
            include_legend: true,
        }
    }
}

/// A finished export, ready to be written to disk
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    /// Write into `dir` under the artifact's file name
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// Encode `frame` in `format`
pub fn render(
    frame: &ChartFrame,
    format: ExportFormat,
    options: &ExportOptions,
) -> Result<Vec<u8>, ExportError> {
    let svg = render_svg(frame, options)?;
    match format {
        ExportFormat::Svg => Ok(svg.into_bytes()),
        ExportFormat::Png => svg_to_png(&svg, options.width, options.height),
    }
}

pub fn render_svg(frame: &ChartFrame, options: &ExportOptions) -> Result<String, ExportError> {
    if options.width == 0 || options.height == 0 {
        return Err(ExportError::EmptyRegion);
    }
    let mut svg = String::new();
    draw_svg(frame, options, &mut svg)?;
    debug!("Rendered '{}' to {} bytes of SVG", frame.title, svg.len());
    Ok(svg)
}

/// Rasterize SVG text into a pixmap of the given size
pub fn rasterize(svg: &str, width: u32, height: u32) -> Result<tiny_skia::Pixmap, ExportError> {
    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &options)
        .map_err(|e| ExportError::Rasterize(e.to_string()))?;
    let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or(ExportError::EmptyRegion)?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
    Ok(pixmap)
}

pub fn svg_to_png(svg: &str, width: u32, height: u32) -> Result<Vec<u8>, ExportError> {
    rasterize(svg, width, height)?
        .encode_png()
        .map_err(|e| ExportError::Rasterize(e.to_string()))
}

fn color(c: Rgb) -> RGBColor {
    RGBColor(c.0, c.1, c.2)
}

fn text_style(size: f64, c: Rgb) -> TextStyle<'static> {
    (FONT, size).into_font().color(&color(c))
}

const INK: Rgb = Rgb::new(0x33, 0x41, 0x55);
const FAINT: Rgb = Rgb::new(0x94, 0xa3, 0xb8);

fn draw_svg(
    frame: &ChartFrame,
    options: &ExportOptions,
    svg: &mut String,
) -> Result<(), ExportError> {
    let root = SVGBackend::with_string(svg, (options.width, options.height)).into_drawing_area();
    root.fill(&color(options.background)).map_err(render_err)?;

    let show_legend = options.include_legend
        && !frame.legend.is_empty()
        && options.width > LEGEND_WIDTH * 2;
    let (plot, legend) = if show_legend {
        let (plot, legend) = root.split_horizontally((options.width - LEGEND_WIDTH) as i32);
        (plot, Some(legend))
    } else {
        (root.clone(), None)
    };

    match &frame.body {
        FrameBody::Empty(reason) => draw_empty(&plot, &frame.title, reason.message())?,
        FrameBody::Sequential { labels, series } => draw_sequential(&plot, frame, labels, series)?,
        FrameBody::Radar { axes, series } => draw_radar(&plot, &frame.title, axes, series)?,
        FrameBody::Pie { slices } => {
            let visible: Vec<(String, f64, Rgb)> = slices
                .iter()
                .filter(|s| !s.hidden)
                .map(|s| (s.label.clone(), s.value, s.color))
                .collect();
            draw_pie(&plot, &frame.title, &visible)?
        }
        FrameBody::Scatter { .. } => draw_scatter(&plot, frame)?,
    }

    if let Some(legend) = legend {
        draw_legend(&legend, &frame.legend)?;
    }
    root.present().map_err(render_err)?;
    Ok(())
}

fn draw_empty<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    message: &str,
) -> Result<(), ExportError> {
    let (w, h) = area.dim_in_pixel();
    area.draw(&Text::new(title.to_string(), (16, 16), text_style(20.0, INK)))
        .map_err(render_err)?;
    let x = (w as i32 / 2 - message.len() as i32 * 4).max(0);
    area.draw(&Text::new(message.to_string(), (x, h as i32 / 2), text_style(16.0, FAINT)))
        .map_err(render_err)?;
    Ok(())
}

fn label_at(labels: &[String], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

/// Runs of consecutive present values, so gaps break the line
pub(crate) fn segments(values: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for (i, v) in values.iter().enumerate() {
        match v {
            Some(v) => current.push((i as f64, *v)),
            None if !current.is_empty() => out.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn draw_sequential<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    frame: &ChartFrame,
    labels: &[String],
    series: &[SeriesData],
) -> Result<(), ExportError> {
    let n = labels.len().max(1);
    let (min, max) = frame.value_range().unwrap_or((0.0, 1.0));
    let pad = (max - min) * 0.05;

    let mut chart = ChartBuilder::on(area)
        .caption(&frame.title, (FONT, 20.0).into_font())
        .margin(16)
        .x_label_area_size(36)
        .y_label_area_size(52)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), min..(max + pad))
        .map_err(render_err)?;

    let x_fmt = |x: &f64| label_at(labels, *x);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n.min(12))
        .x_label_formatter(&x_fmt)
        .x_desc(frame.x_axis.as_str())
        .draw()
        .map_err(render_err)?;

    let visible: Vec<&SeriesData> = series.iter().filter(|s| !s.hidden).collect();
    match frame.chart_type {
        ChartType::Bar => {
            let slot = 0.8 / visible.len().max(1) as f64;
            for (k, s) in visible.iter().enumerate() {
                let c = color(s.color);
                let bars = s.values.iter().enumerate().filter_map(|(i, v)| {
                    let v = (*v)?;
                    let x0 = i as f64 - 0.4 + k as f64 * slot;
                    Some(Rectangle::new([(x0, 0.0), (x0 + slot * 0.9, v)], c.filled()))
                });
                chart.draw_series(bars).map_err(render_err)?;
            }
        }
        ChartType::Area => {
            for s in &visible {
                let c = color(s.color);
                for run in segments(&s.values) {
                    chart
                        .draw_series(
                            AreaSeries::new(run, 0.0, c.mix(0.25).filled())
                                .border_style(c.stroke_width(2)),
                        )
                        .map_err(render_err)?;
                }
            }
        }
        _ => {
            for s in &visible {
                let c = color(s.color);
                for run in segments(&s.values) {
                    chart
                        .draw_series(LineSeries::new(run, c.stroke_width(2)))
                        .map_err(render_err)?;
                }
            }
        }
    }
    Ok(())
}

/// Aspect-corrected square range for polar layouts
fn polar_ranges(area_dim: (u32, u32)) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
    let (w, h) = (area_dim.0.max(1) as f64, area_dim.1.max(1) as f64);
    let r = 1.35;
    if w >= h {
        (-r * w / h..r * w / h, -r..r)
    } else {
        (-r..r, -r * h / w..r * h / w)
    }
}

fn polar(angle: f64, radius: f64) -> (f64, f64) {
    (radius * angle.cos(), radius * angle.sin())
}

fn draw_pie<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    slices: &[(String, f64, Rgb)],
) -> Result<(), ExportError> {
    let (x_range, y_range) = polar_ranges(area.dim_in_pixel());
    let mut chart = ChartBuilder::on(area)
        .caption(title, (FONT, 20.0).into_font())
        .margin(16)
        .build_cartesian_2d(x_range, y_range)
        .map_err(render_err)?;

    let total: f64 = slices.iter().map(|s| s.1).sum();
    if total <= 0.0 {
        return Ok(());
    }
    let mut start = FRAC_PI_2;
    for (label, value, c) in slices {
        let sweep = value / total * TAU;
        let steps = ((sweep / TAU) * 96.0).ceil().max(2.0) as usize;
        let mut points = vec![(0.0, 0.0)];
        points.extend((0..=steps).map(|i| polar(start - sweep * i as f64 / steps as f64, 1.0)));
        chart
            .draw_series(std::iter::once(Polygon::new(points, color(*c).filled())))
            .map_err(render_err)?;

        let (lx, ly) = polar(start - sweep / 2.0, 1.15);
        let text = format!("{} ({:.0}%)", label, value / total * 100.0);
        chart
            .draw_series(std::iter::once(Text::new(text, (lx, ly), text_style(12.0, INK))))
            .map_err(render_err)?;
        start -= sweep;
    }
    Ok(())
}

fn draw_radar<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    axes: &[String],
    series: &[SeriesData],
) -> Result<(), ExportError> {
    let (x_range, y_range) = polar_ranges(area.dim_in_pixel());
    let mut chart = ChartBuilder::on(area)
        .caption(title, (FONT, 20.0).into_font())
        .margin(16)
        .build_cartesian_2d(x_range, y_range)
        .map_err(render_err)?;

    let n = axes.len();
    if n == 0 {
        return Ok(());
    }
    let angle = |i: usize| FRAC_PI_2 - TAU * i as f64 / n as f64;
    let grid = color(FAINT);

    for ring in [0.25, 0.5, 0.75, 1.0] {
        let mut outline: Vec<(f64, f64)> = (0..n).map(|i| polar(angle(i), ring)).collect();
        outline.push(polar(angle(0), ring));
        chart
            .draw_series(std::iter::once(PathElement::new(outline, grid.stroke_width(1))))
            .map_err(render_err)?;
    }
    for (i, label) in axes.iter().enumerate() {
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(0.0, 0.0), polar(angle(i), 1.0)],
                grid.stroke_width(1),
            )))
            .map_err(render_err)?;
        chart
            .draw_series(std::iter::once(Text::new(
                label.clone(),
                polar(angle(i), 1.12),
                text_style(11.0, INK),
            )))
            .map_err(render_err)?;
    }

    let max = series
        .iter()
        .filter(|s| !s.hidden)
        .flat_map(|s| s.values.iter().flatten().copied())
        .fold(0.0f64, f64::max);
    if max <= 0.0 {
        return Ok(());
    }
    for s in series.iter().filter(|s| !s.hidden) {
        let c = color(s.color);
        let points: Vec<(f64, f64)> = s
            .values
            .iter()
            .enumerate()
            .map(|(i, v)| polar(angle(i), v.unwrap_or(0.0).max(0.0) / max))
            .collect();
        let mut outline = points.clone();
        if let Some(first) = points.first() {
            outline.push(*first);
        }
        chart
            .draw_series(std::iter::once(Polygon::new(points, c.mix(0.2).filled())))
            .map_err(render_err)?;
        chart
            .draw_series(std::iter::once(PathElement::new(outline, c.stroke_width(2))))
            .map_err(render_err)?;
    }
    Ok(())
}

fn draw_scatter<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    frame: &ChartFrame,
) -> Result<(), ExportError> {
    let FrameBody::Scatter { groups } = &frame.body else {
        return Ok(());
    };
    let xs: Vec<f64> = groups
        .iter()
        .filter(|g| !g.hidden)
        .flat_map(|g| g.points.iter().map(|p| p.0))
        .collect();
    let x_min = xs.iter().copied().fold(f64::INFINITY, f64::min);
    let x_max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (x_min, x_max) = if x_min.is_finite() && x_max > x_min {
        (x_min, x_max)
    } else if x_min.is_finite() {
        (x_min - 1.0, x_min + 1.0)
    } else {
        (0.0, 1.0)
    };
    let (y_min, y_max) = frame.value_range().unwrap_or((0.0, 1.0));
    let x_pad = (x_max - x_min) * 0.05;
    let y_pad = (y_max - y_min) * 0.05;

    let mut chart = ChartBuilder::on(area)
        .caption(&frame.title, (FONT, 20.0).into_font())
        .margin(16)
        .x_label_area_size(36)
        .y_label_area_size(52)
        .build_cartesian_2d((x_min - x_pad)..(x_max + x_pad), (y_min - y_pad)..(y_max + y_pad))
        .map_err(render_err)?;
    chart
        .configure_mesh()
        .x_desc(frame.x_axis.as_str())
        .y_desc(frame.y_axis.as_str())
        .draw()
        .map_err(render_err)?;

    for group in groups.iter().filter(|g| !g.hidden) {
        let c = color(group.color);
        chart
            .draw_series(group.points.iter().map(|p| Circle::new(*p, 4, c.mix(0.8).filled())))
            .map_err(render_err)?;
    }
    Ok(())
}

fn draw_legend<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    entries: &[LegendEntry],
) -> Result<(), ExportError> {
    let mut y = 48;
    for entry in entries {
        let swatch = color(entry.swatch());
        area.draw(&Rectangle::new([(8, y), (20, y + 12)], swatch.filled()))
            .map_err(render_err)?;
        let ink = if entry.hidden { FAINT } else { INK };
        area.draw(&Text::new(entry.key.clone(), (28, y), text_style(13.0, ink)))
            .map_err(render_err)?;
        if entry.hidden {
            let width = (entry.key.chars().count() as i32 * 7).min(LEGEND_WIDTH as i32 - 32);
            let strike = vec![(28, y + 7), (28 + width, y + 7)];
            area.draw(&PathElement::new(strike, color(FAINT).stroke_width(1)))
                .map_err(render_err)?;
        }
        y += 22;
    }
    Ok(())
}
