//! Report exporters
//!
//! Every exporter takes shared references and returns an [`ExportArtifact`];
//! none of them touches the dataset or any chart's view state.

pub mod csv;
pub mod markdown;
pub mod pdf;
pub mod slug;

use dash_core::{DataRow, Report};
use resvg::tiny_skia::{self, Pixmap, PixmapPaint, Transform};
use tracing::{debug, info};

use crate::chart::ChartFrame;
use crate::export::{self, ExportArtifact, ExportError, ExportOptions};
use pdf::RgbImage;
use slug::slugify;

/// Vertical gap between stacked charts in a dashboard snapshot
const SNAPSHOT_GAP: u32 = 16;

/// Builds downloadable artifacts for one report
pub struct ReportExporter<'a> {
    report: &'a Report,
    options: ExportOptions,
}

impl<'a> ReportExporter<'a> {
    pub fn new(report: &'a Report) -> Self {
        Self {
            report,
            options: ExportOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    fn file_name(&self, suffix: &str, extension: &str) -> String {
        format!("{}{}.{}", slugify(&self.report.name, "report"), suffix, extension)
    }

    /// The given rows (normally the filtered view) as CSV
    pub fn csv(&self, rows: &[DataRow]) -> Result<ExportArtifact, ExportError> {
        let bytes = self::csv::to_csv(rows)?;
        debug!("CSV export: {} rows, {} bytes", rows.len(), bytes.len());
        Ok(ExportArtifact {
            file_name: self.file_name("", "csv"),
            mime: "text/csv",
            bytes,
        })
    }

    pub fn markdown(&self) -> ExportArtifact {
        ExportArtifact {
            file_name: self.file_name("", "md"),
            mime: "text/markdown",
            bytes: markdown::to_markdown(self.report).into_bytes(),
        }
    }

    pub fn pdf(&self) -> ExportArtifact {
        let bytes = pdf::report_pdf(self.report);
        info!("Report PDF for '{}': {} bytes", self.report.name, bytes.len());
        ExportArtifact {
            file_name: self.file_name("", "pdf"),
            mime: "application/pdf",
            bytes,
        }
    }

    /// Every frame rendered and stacked into one PNG
    pub fn snapshot_png(&self, frames: &[ChartFrame]) -> Result<ExportArtifact, ExportError> {
        let pixmap = stack_frames(frames, &self.options)?;
        let bytes = pixmap
            .encode_png()
            .map_err(|e| ExportError::Rasterize(e.to_string()))?;
        Ok(ExportArtifact {
            file_name: self.file_name("-dashboard", "png"),
            mime: "image/png",
            bytes,
        })
    }

    /// The stacked snapshot tiled across as many PDF pages as it needs
    pub fn snapshot_pdf(&self, frames: &[ChartFrame]) -> Result<ExportArtifact, ExportError> {
        let pixmap = stack_frames(frames, &self.options)?;
        let image = to_rgb(&pixmap);
        let bytes = pdf::tiled_image_pdf(&self.report.name, &image);
        info!(
            "Dashboard PDF for '{}': {} charts, {}x{} px",
            self.report.name,
            frames.len(),
            image.width,
            image.height
        );
        Ok(ExportArtifact {
            file_name: self.file_name("-dashboard", "pdf"),
            mime: "application/pdf",
            bytes,
        })
    }
}

/// Rasterize each frame and stack them top to bottom on the background
fn stack_frames(frames: &[ChartFrame], options: &ExportOptions) -> Result<Pixmap, ExportError> {
    if frames.is_empty() || options.width == 0 || options.height == 0 {
        return Err(ExportError::EmptyRegion);
    }
    let count = frames.len() as u32;
    let total_height = options.height * count + SNAPSHOT_GAP * (count - 1);
    let mut canvas = Pixmap::new(options.width, total_height).ok_or(ExportError::EmptyRegion)?;
    let bg = options.background;
    canvas.fill(tiny_skia::Color::from_rgba8(bg.0, bg.1, bg.2, 255));

    for (i, frame) in frames.iter().enumerate() {
        let svg = export::render_svg(frame, options)?;
        let tile = export::rasterize(&svg, options.width, options.height)?;
        let y = (i as u32 * (options.height + SNAPSHOT_GAP)) as i32;
        canvas.draw_pixmap(
            0,
            y,
            tile.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }
    Ok(canvas)
}

/// Flatten premultiplied RGBA onto white
fn to_rgb(pixmap: &Pixmap) -> RgbImage {
    let pixels = pixmap
        .data()
        .chunks_exact(4)
        .flat_map(|px| {
            let under = 255 - px[3];
            [
                px[0].saturating_add(under),
                px[1].saturating_add(under),
                px[2].saturating_add(under),
            ]
        })
        .collect();
    RgbImage {
        width: pixmap.width(),
        height: pixmap.height(),
        pixels,
    }
}
