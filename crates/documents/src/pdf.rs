//! PDF rendering of [`InvoiceLayout`] bands.
//!
//! Pages are A4 in points. Text uses the base-14 Helvetica faces with
//! WinAnsi encoding, so no font program is embedded.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use thiserror::Error;

use exportdesk_invoicing::Invoice;

use crate::layout::{
    Align, Band, BandKind, Cell, CellBody, Field, InvoiceLayout, Line, invoice_layout,
};

const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const MARGIN: f32 = 30.0;
const BODY_SIZE: f32 = 8.0;
const TITLE_SIZE: f32 = 14.0;
const FOOTER_SIZE: f32 = 7.0;
const LINE_HEIGHT: f32 = BODY_SIZE * 1.25;
const PADDING: f32 = 4.0;
const SHADE: f32 = 0.93;

const REGULAR: &str = "F1";
const BOLD: &str = "F2";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("pdf encoding failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("pdf write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Render the invoice as a PDF document.
pub fn render_invoice_pdf(invoice: &Invoice) -> Result<Vec<u8>, RenderError> {
    let layout = invoice_layout(invoice);
    let pages = paginate(&layout);
    tracing::debug!(
        invoice_no = %invoice.invoice_no,
        pages = pages.len(),
        "invoice rendered"
    );
    assemble(&layout.title, pages)
}

/// Download name for an invoice PDF. Characters that are unsafe in a
/// `Content-Disposition` filename become `_`.
pub fn invoice_filename(invoice_no: &str) -> String {
    let safe: String = invoice_no
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("Invoice-{safe}.pdf")
}

// ---------------------------------------------------------------------------
// Text metrics
// ---------------------------------------------------------------------------

/// Helvetica advance widths in 1/1000 em (regular face).
fn glyph_width(c: char) -> u16 {
    match c {
        'i' | 'j' | 'l' | '\'' | '|' => 222,
        ' ' | '!' | ',' | '.' | '/' | ':' | ';' | 'I' | '[' | ']' | '\\' | 'f' | 't' => 278,
        '(' | ')' | '-' | 'r' | '"' => 333,
        'J' | 'c' | 'k' | 's' | 'v' | 'x' | 'y' | 'z' => 500,
        '0'..='9' | 'a' | 'b' | 'd' | 'e' | 'g' | 'h' | 'n' | 'o' | 'p' | 'q' | 'u' | '#' | '$'
        | '_' | '?' => 556,
        'F' | 'T' | 'Z' => 611,
        'A' | 'B' | 'E' | 'K' | 'P' | 'S' | 'V' | 'X' | 'Y' | '&' => 667,
        'C' | 'D' | 'H' | 'N' | 'R' | 'U' | 'w' => 722,
        'G' | 'O' | 'Q' => 778,
        'M' | 'm' => 833,
        '%' => 889,
        'W' => 944,
        _ => 556,
    }
}

fn text_width(text: &str, size: f32, bold: bool) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(glyph_width(c))).sum();
    let factor = if bold { 1.06 } else { 1.0 };
    units as f32 / 1000.0 * size * factor
}

/// Greedy word wrap; words wider than the box are broken by character.
fn wrap(text: &str, max_width: f32, size: f32, bold: bool) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width(&candidate, size, bold) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        for c in word.chars() {
            current.push(c);
            if text_width(&current, size, bold) > max_width && current.chars().count() > 1 {
                current.pop();
                lines.push(std::mem::take(&mut current));
                current.push(c);
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Map to WinAnsiEncoding bytes; anything outside it prints as `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .filter_map(|c| match c {
            '\t' => Some(b' '),
            c if c.is_control() => None,
            c if (c as u32) < 0x80 => Some(c as u8),
            c if (0xA0..=0xFF).contains(&(c as u32)) => Some(c as u32 as u8),
            '€' => Some(0x80),
            '‘' => Some(0x91),
            '’' => Some(0x92),
            '“' => Some(0x93),
            '”' => Some(0x94),
            '•' => Some(0x95),
            '–' => Some(0x96),
            '—' => Some(0x97),
            _ => Some(b'?'),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Measuring
// ---------------------------------------------------------------------------

fn field_height(field: &Field, width: f32) -> f32 {
    let inner = width - 2.0 * PADDING;
    let lines = wrap(&field.label, inner, BODY_SIZE, true).len()
        + wrap(&field.value, inner, BODY_SIZE, false).len();
    lines as f32 * LINE_HEIGHT + 2.0 * PADDING
}

fn sub_row_height(row: &[Field], width: f32) -> f32 {
    let each = width / row.len().max(1) as f32;
    row.iter()
        .map(|f| field_height(f, each))
        .fold(0.0, f32::max)
}

fn cell_height(cell: &Cell, width: f32) -> f32 {
    match &cell.body {
        CellBody::Lines(lines) => {
            let inner = width - 2.0 * PADDING;
            let count: usize = lines
                .iter()
                .map(|l| wrap(&l.text, inner, BODY_SIZE, l.bold).len())
                .sum();
            count as f32 * LINE_HEIGHT + 2.0 * PADDING
        }
        CellBody::Fields(rows) => rows.iter().map(|r| sub_row_height(r, width)).sum(),
    }
}

fn band_height(band: &Band, width: f32) -> f32 {
    if band.kind == BandKind::Title {
        return TITLE_SIZE * 1.25 + PADDING * 2.0;
    }
    band.cells
        .iter()
        .map(|c| cell_height(c, c.width * width))
        .fold(band.min_height, f32::max)
}

// ---------------------------------------------------------------------------
// Painting
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Canvas {
    ops: Vec<Operation>,
}

impl Canvas {
    fn new() -> Self {
        let mut canvas = Self::default();
        canvas.ops.push(Operation::new("w", vec![0.75f32.into()]));
        canvas
    }

    fn text(&mut self, x: f32, y: f32, size: f32, bold: bool, text: &str) {
        let font = if bold { BOLD } else { REGULAR };
        self.ops.push(Operation::new("BT", vec![]));
        self.ops.push(Operation::new("Tf", vec![font.into(), size.into()]));
        self.ops.push(Operation::new("Td", vec![x.into(), y.into()]));
        self.ops.push(Operation::new("Tj", vec![Object::string_literal(win_ansi(text))]));
        self.ops.push(Operation::new("ET", vec![]));
    }

    fn aligned_text(&mut self, x: f32, width: f32, y: f32, align: Align, bold: bool, text: &str) {
        let w = text_width(text, BODY_SIZE, bold);
        let tx = match align {
            Align::Left => x + PADDING,
            Align::Right => x + width - PADDING - w,
            Align::Center => x + (width - w) / 2.0,
        };
        self.text(tx, y, BODY_SIZE, bold, text);
    }

    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.ops.push(Operation::new("re", vec![x.into(), y.into(), w.into(), h.into()]));
        self.ops.push(Operation::new("S", vec![]));
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, gray: f32) {
        self.ops.push(Operation::new("g", vec![gray.into()]));
        self.ops.push(Operation::new("re", vec![x.into(), y.into(), w.into(), h.into()]));
        self.ops.push(Operation::new("f", vec![]));
        self.ops.push(Operation::new("g", vec![0.into()]));
    }

    fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.ops.push(Operation::new("m", vec![x1.into(), y1.into()]));
        self.ops.push(Operation::new("l", vec![x2.into(), y2.into()]));
        self.ops.push(Operation::new("S", vec![]));
    }

    fn draw_band(&mut self, band: &Band, left: f32, top: f32, width: f32, height: f32) {
        if band.kind == BandKind::Title {
            for cell in &band.cells {
                if let CellBody::Lines(lines) = &cell.body {
                    for line in lines {
                        let w = text_width(&line.text, TITLE_SIZE, true);
                        let x = left + (width - w) / 2.0;
                        self.text(x, top - PADDING - TITLE_SIZE, TITLE_SIZE, true, &line.text);
                    }
                }
            }
            return;
        }

        if band.shaded {
            self.fill_rect(left, top - height, width, height, SHADE);
        }

        let mut x = left;
        for cell in &band.cells {
            let cw = cell.width * width;
            self.stroke_rect(x, top - height, cw, height);
            self.draw_cell(cell, x, top, cw);
            x += cw;
        }
    }

    fn draw_cell(&mut self, cell: &Cell, x: f32, top: f32, width: f32) {
        let inner = width - 2.0 * PADDING;
        match &cell.body {
            CellBody::Lines(lines) => {
                let mut y = top - PADDING - BODY_SIZE;
                for line in lines {
                    for piece in wrap(&line.text, inner, BODY_SIZE, line.bold) {
                        self.aligned_text(x, width, y, cell.align, line.bold, &piece);
                        y -= LINE_HEIGHT;
                    }
                }
            }
            CellBody::Fields(rows) => {
                let mut sub_top = top;
                for (idx, row) in rows.iter().enumerate() {
                    let h = sub_row_height(row, width);
                    let each = width / row.len().max(1) as f32;
                    for (col, field) in row.iter().enumerate() {
                        let fx = x + col as f32 * each;
                        if col > 0 {
                            self.line(fx, sub_top, fx, sub_top - h);
                        }
                        let field_inner = each - 2.0 * PADDING;
                        let mut y = sub_top - PADDING - BODY_SIZE;
                        for piece in wrap(&field.label, field_inner, BODY_SIZE, true) {
                            self.aligned_text(fx, each, y, Align::Left, true, &piece);
                            y -= LINE_HEIGHT;
                        }
                        for piece in wrap(&field.value, field_inner, BODY_SIZE, false) {
                            self.aligned_text(fx, each, y, Align::Left, false, &piece);
                            y -= LINE_HEIGHT;
                        }
                    }
                    sub_top -= h;
                    if idx + 1 < rows.len() {
                        self.line(x, sub_top, x + width, sub_top);
                    }
                }
            }
        }
    }
}

/// Split a band so its first part is at most `avail` points tall. Cell text
/// is pre-wrapped and cut line by line; field cells are flattened to
/// label/value lines. `None` when not even one line fits; the tail is `None`
/// when every line made it into the head.
fn split_band(band: &Band, width: f32, avail: f32) -> Option<(Band, Option<Band>)> {
    let fit = ((avail - 2.0 * PADDING) / LINE_HEIGHT).floor();
    if fit < 1.0 {
        return None;
    }
    let fit = fit as usize;

    let mut head = Vec::with_capacity(band.cells.len());
    let mut tail = Vec::with_capacity(band.cells.len());
    for cell in &band.cells {
        let mut lines = wrapped_lines(cell, cell.width * width);
        let rest = lines.split_off(fit.min(lines.len()));
        head.push(Cell { width: cell.width, align: cell.align, body: CellBody::Lines(lines) });
        tail.push(Cell { width: cell.width, align: cell.align, body: CellBody::Lines(rest) });
    }

    let part = |cells| Band { kind: band.kind, cells, shaded: band.shaded, min_height: 0.0 };
    let spilled = tail
        .iter()
        .any(|c| matches!(&c.body, CellBody::Lines(lines) if !lines.is_empty()));
    Some((part(head), spilled.then(|| part(tail))))
}

fn wrapped_lines(cell: &Cell, width: f32) -> Vec<Line> {
    let inner = width - 2.0 * PADDING;
    let pieces = |text: &str, bold: bool| {
        wrap(text, inner, BODY_SIZE, bold)
            .into_iter()
            .map(move |text| Line { text, bold })
    };
    match &cell.body {
        CellBody::Lines(lines) => lines.iter().flat_map(|l| pieces(&l.text, l.bold)).collect(),
        CellBody::Fields(rows) => rows
            .iter()
            .flatten()
            .flat_map(|f| pieces(&f.label, true).chain(pieces(&f.value, false)))
            .collect(),
    }
}

const TOP: f32 = PAGE_HEIGHT - MARGIN;
const BOTTOM: f32 = MARGIN + FOOTER_SIZE * 2.0;

struct Pager<'a> {
    width: f32,
    pages: Vec<Canvas>,
    canvas: Canvas,
    y: f32,
    on_page: usize,
    table_header: Option<&'a Band>,
}

impl<'a> Pager<'a> {
    fn new() -> Self {
        Self {
            width: PAGE_WIDTH - 2.0 * MARGIN,
            pages: Vec::new(),
            canvas: Canvas::new(),
            y: TOP,
            on_page: 0,
            table_header: None,
        }
    }

    fn header_height(&self, kind: BandKind) -> f32 {
        match (kind, self.table_header) {
            (BandKind::Item, Some(header)) => band_height(header, self.width),
            _ => 0.0,
        }
    }

    fn new_page(&mut self, kind: BandKind) {
        self.pages.push(std::mem::replace(&mut self.canvas, Canvas::new()));
        self.y = TOP;
        self.on_page = 0;
        if kind == BandKind::Item {
            if let Some(header) = self.table_header {
                let hh = band_height(header, self.width);
                self.canvas.draw_band(header, MARGIN, self.y, self.width, hh);
                self.y -= hh;
            }
        }
    }

    fn draw(&mut self, band: &Band, height: f32) {
        self.canvas.draw_band(band, MARGIN, self.y, self.width, height);
        self.y -= height;
        self.on_page += 1;
    }

    /// Place one band: on this page if it fits, else on a fresh page; bands
    /// taller than a whole page are cut across as many pages as they need.
    fn place(&mut self, band: &'a Band) {
        if band.kind == BandKind::TableHeader {
            self.table_header = Some(band);
        }

        let mut pending = band.clone();
        loop {
            let h = band_height(&pending, self.width);
            if self.y - h >= BOTTOM {
                self.draw(&pending, h);
                return;
            }

            let fresh_room = TOP - BOTTOM - self.header_height(pending.kind);
            if h <= fresh_room && self.on_page > 0 {
                self.new_page(pending.kind);
                continue;
            }

            match split_band(&pending, self.width, self.y - BOTTOM) {
                Some((head, tail)) => {
                    let hh = band_height(&head, self.width);
                    self.draw(&head, hh);
                    let Some(tail) = tail else { return };
                    self.new_page(pending.kind);
                    pending = tail;
                }
                None if self.on_page > 0 => self.new_page(pending.kind),
                None => {
                    self.draw(&pending, h);
                    return;
                }
            }
        }
    }

    fn finish(mut self) -> Vec<Canvas> {
        self.pages.push(self.canvas);
        let total = self.pages.len();
        for (idx, page) in self.pages.iter_mut().enumerate() {
            let label = format!("Page {} of {}", idx + 1, total);
            let w = text_width(&label, FOOTER_SIZE, false);
            page.text(PAGE_WIDTH - MARGIN - w, MARGIN, FOOTER_SIZE, false, &label);
        }
        self.pages
    }
}

/// Lay bands top to bottom, starting a new page when the next band does not
/// fit. Item rows that spill over get the table header repeated above them.
fn paginate(layout: &InvoiceLayout) -> Vec<Canvas> {
    let mut pager = Pager::new();
    for band in &layout.bands {
        pager.place(band);
    }
    pager.finish()
}

fn font(doc: &mut Document, base: &str) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    })
}

fn assemble(title: &str, pages: Vec<Canvas>) -> Result<Vec<u8>, RenderError> {
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let regular = font(&mut doc, "Helvetica");
    let bold = font(&mut doc, "Helvetica-Bold");
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            REGULAR => regular,
            BOLD => bold,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let content = Content { operations: page.ops };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(win_ansi(title)),
        "Producer" => Object::string_literal("exportdesk"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}
