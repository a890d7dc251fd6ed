//! A small PDF writer
//!
//! Only what the exporters need: A4 pages, the two base Helvetica fonts,
//! wrapped text with automatic page breaks and raw RGB images. Objects are
//! written uncompressed with a classic xref table.

use dash_core::Report;
use std::fmt::Write;

pub const PAGE_WIDTH: f64 = 595.0;
pub const PAGE_HEIGHT: f64 = 842.0;
pub const MARGIN: f64 = 50.0;

const LINE_SPACING: f64 = 1.4;
/// Average Helvetica glyph width as a fraction of the font size
const GLYPH_WIDTH: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

/// An 8-bit RGB image, rows top to bottom
#[derive(Debug, Clone)]
pub struct RgbImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Default)]
struct Page {
    content: String,
    images: Vec<usize>,
}

/// Page-by-page document builder with a text cursor
#[derive(Debug)]
pub struct PdfDocument {
    pages: Vec<Page>,
    images: Vec<RgbImage>,
    cursor: f64,
}

impl Default for PdfDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfDocument {
    pub fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            images: Vec::new(),
            cursor: PAGE_HEIGHT - MARGIN,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.cursor = PAGE_HEIGHT - MARGIN;
    }

    fn page(&mut self) -> &mut Page {
        if self.pages.is_empty() {
            self.pages.push(Page::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Vertical space, breaking the page if it runs past the bottom margin
    pub fn gap(&mut self, height: f64) {
        self.cursor -= height;
        if self.cursor < MARGIN {
            self.new_page();
        }
    }

    /// Wrapped text starting at the cursor
    pub fn text(&mut self, text: &str, size: f64, font: Font) {
        self.indented_text(text, size, font, 0.0);
    }

    fn indented_text(&mut self, text: &str, size: f64, font: Font, indent: f64) {
        let line_height = size * LINE_SPACING;
        let width = PAGE_WIDTH - 2.0 * MARGIN - indent;
        for line in wrap(text, chars_per_line(width, size)) {
            if self.cursor - line_height < MARGIN {
                self.new_page();
            }
            self.cursor -= line_height;
            let y = self.cursor;
            let _ = writeln!(
                self.page().content,
                "BT /{} {} Tf {:.2} {:.2} Td ({}) Tj ET",
                font.resource(),
                size,
                MARGIN + indent,
                y,
                escape(&line)
            );
        }
    }

    pub fn heading(&mut self, text: &str) {
        self.gap(8.0);
        self.text(text, 15.0, Font::Bold);
        self.gap(2.0);
    }

    pub fn bullet(&mut self, text: &str, size: f64) {
        let line_height = size * LINE_SPACING;
        if self.cursor - line_height < MARGIN {
            self.new_page();
        }
        let y = self.cursor - line_height;
        let _ = writeln!(
            self.page().content,
            "BT /F1 {} Tf {:.2} {:.2} Td (-) Tj ET",
            size,
            MARGIN + 4.0,
            y
        );
        self.indented_text(text, size, Font::Regular, 16.0);
    }

    /// Place `image` at the top-left corner `(x, top)` in points, scaled to
    /// `width` points wide
    pub fn image(&mut self, image: RgbImage, x: f64, top: f64, width: f64) {
        let height = width * image.height as f64 / image.width.max(1) as f64;
        let index = self.images.len();
        self.images.push(image);
        let page = self.page();
        page.images.push(index);
        let _ = writeln!(
            page.content,
            "q {:.2} 0 0 {:.2} {:.2} {:.2} cm /Im{} Do Q",
            width,
            height,
            x,
            top - height,
            index
        );
    }

    /// Serialize the document
    pub fn finish(self) -> Vec<u8> {
        let mut out = PdfBuffer::new();
        out.raw(b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n");

        // Fixed objects: 1 catalog, 2 page tree, 3 and 4 fonts.
        let first_image = 5;
        let first_page = first_image + self.images.len();
        let page_ids: Vec<usize> = (0..self.pages.len()).map(|i| first_page + i * 2).collect();

        out.object(1, "<< /Type /Catalog /Pages 2 0 R >>");
        let kids: Vec<String> = page_ids.iter().map(|id| format!("{} 0 R", id)).collect();
        out.object(
            2,
            &format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids.join(" "), page_ids.len()),
        );
        out.object(
            3,
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
        );
        out.object(
            4,
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold \
             /Encoding /WinAnsiEncoding >>",
        );

        for (i, image) in self.images.iter().enumerate() {
            let dict = format!(
                "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                 /ColorSpace /DeviceRGB /BitsPerComponent 8 /Length {} >>",
                image.width,
                image.height,
                image.pixels.len()
            );
            out.stream(first_image + i, &dict, &image.pixels);
        }

        for (page, id) in self.pages.iter().zip(&page_ids) {
            let xobjects: String = page
                .images
                .iter()
                .map(|i| format!("/Im{} {} 0 R ", i, first_image + i))
                .collect();
            out.object(
                *id,
                &format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                     /Resources << /Font << /F1 3 0 R /F2 4 0 R >> /XObject << {}>> >> \
                     /Contents {} 0 R >>",
                    PAGE_WIDTH,
                    PAGE_HEIGHT,
                    xobjects,
                    id + 1
                ),
            );
            let content = page.content.as_bytes();
            out.stream(id + 1, &format!("<< /Length {} >>", content.len()), content);
        }

        out.finish()
    }
}

/// Byte buffer that records object offsets for the xref table
struct PdfBuffer {
    bytes: Vec<u8>,
    offsets: Vec<(usize, usize)>,
}

impl PdfBuffer {
    fn new() -> Self {
        Self {
            bytes: Vec::new(),
            offsets: Vec::new(),
        }
    }

    fn raw(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    fn object(&mut self, id: usize, body: &str) {
        self.offsets.push((id, self.bytes.len()));
        self.raw(format!("{} 0 obj\n{}\nendobj\n", id, body).as_bytes());
    }

    fn stream(&mut self, id: usize, dict: &str, data: &[u8]) {
        self.offsets.push((id, self.bytes.len()));
        self.raw(format!("{} 0 obj\n{}\nstream\n", id, dict).as_bytes());
        self.raw(data);
        self.raw(b"\nendstream\nendobj\n");
    }

    fn finish(mut self) -> Vec<u8> {
        self.offsets.sort_unstable();
        let size = self.offsets.len() + 1;
        let xref = self.bytes.len();

        let mut table = format!("xref\n0 {}\n0000000000 65535 f \n", size);
        for (_, offset) in &self.offsets {
            let _ = writeln!(table, "{:010} 00000 n ", offset);
        }
        let _ = write!(
            table,
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            size, xref
        );
        self.raw(table.as_bytes());
        self.bytes
    }
}

fn chars_per_line(width: f64, size: f64) -> usize {
    ((width / (size * GLYPH_WIDTH)).floor() as usize).max(8)
}

/// Greedy word wrap; words longer than a line are split
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_chars {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                lines.push(word.drain(..max_chars).collect());
            }
            let word: String = word.into_iter().collect();
            let needed =
                line.chars().count() + usize::from(!line.is_empty()) + word.chars().count();
            if needed > max_chars && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&word);
        }
        lines.push(line);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Escape a string for a PDF literal in WinAnsi encoding
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            '\u{a0}'..='\u{ff}' => {
                let _ = write!(out, "\\{:03o}", c as u32);
            }
            _ => out.push('?'),
        }
    }
    out
}

/// Summary, statistics, insights and performance pulse, paginated
pub fn report_pdf(report: &Report) -> Vec<u8> {
    let analysis = &report.analysis;
    let mut doc = PdfDocument::new();

    doc.text(&report.name, 22.0, Font::Bold);
    doc.text(&format!("Generated {}", report.date), 10.0, Font::Regular);

    doc.heading("Summary");
    doc.text(analysis.summary.trim(), 11.0, Font::Regular);

    doc.heading("Key Statistics");
    for stat in &analysis.statistics {
        doc.bullet(&format!("{}: {}", stat.label, stat.value), 11.0);
    }

    doc.heading("Insights");
    for insight in &analysis.insights {
        doc.bullet(insight, 11.0);
    }

    let pulse = &analysis.performance_pulse;
    if !pulse.strengths.is_empty() || !pulse.risks.is_empty() {
        doc.heading("Performance Pulse");
        for strength in &pulse.strengths {
            doc.bullet(&format!("Strength: {}", strength), 11.0);
        }
        for risk in &pulse.risks {
            doc.bullet(&format!("Risk: {}", risk), 11.0);
        }
    }
    doc.finish()
}

/// Lay a tall image across as many pages as it needs, full content width
pub fn tiled_image_pdf(title: &str, image: &RgbImage) -> Vec<u8> {
    let mut doc = PdfDocument::new();
    doc.text(title, 16.0, Font::Bold);
    doc.gap(6.0);

    let content_width = PAGE_WIDTH - 2.0 * MARGIN;
    let scale = content_width / image.width.max(1) as f64;
    let stride = image.width as usize * 3;

    let mut row = 0u32;
    let mut top = doc.cursor;
    while row < image.height {
        let rows_fit = ((top - MARGIN) / scale).floor().max(1.0) as u32;
        let rows = rows_fit.min(image.height - row);
        let start = row as usize * stride;
        let end = (row + rows) as usize * stride;
        let slice = RgbImage {
            width: image.width,
            height: rows,
            pixels: image.pixels[start..end].to_vec(),
        };
        doc.image(slice, MARGIN, top, content_width);
        row += rows;
        if row < image.height {
            doc.new_page();
            top = doc.cursor;
        }
    }
    doc.finish()
}
