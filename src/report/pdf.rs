//! Minimal paginated document writer emitting PDF 1.4.
//!
//! Layout is fixed-width text only: headings, wrapped paragraphs and
//! column-aligned tables on A4 pages in the standard Courier faces. Output has
//! no creation date, producer or document ID, so identical input produces
//! identical bytes.

use std::io::Write;

use crate::crypto::sha256_hex;
use crate::domain::GstRiskReport;

use super::ReportError;

/// Footer printed on every page.
pub const DISCLAIMER: &str = "DISCLAIMER: Generated from user-supplied invoices and a simulated GSTR-2B ledger. Not tax or legal advice.";

const PAGE_WIDTH: u32 = 595;
const PAGE_HEIGHT: u32 = 842;
const MARGIN_LEFT: u32 = 40;
const TOP_Y: u32 = 800;
const LEADING: u32 = 12;
const LINES_PER_PAGE: usize = 60;
const BODY_SIZE: u32 = 9;
const HEADING_SIZE: u32 = 11;
const FOOTER_SIZE: u32 = 7;
/// Courier at 9pt fits this many glyphs between the margins.
pub const LINE_WIDTH: usize = 92;

/// A rendered document and the digest of its exact bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Heading(String),
    Text(String),
    Blank,
}

/// Accumulates styled lines and paginates them into a PDF.
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    lines: Vec<Line>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bold section heading preceded by a blank line (except at the top).
    pub fn heading(&mut self, text: &str) -> &mut Self {
        if !self.lines.is_empty() {
            self.lines.push(Line::Blank);
        }
        self.lines.push(Line::Heading(truncate(text, LINE_WIDTH)));
        self
    }

    /// Word-wrapped body text.
    pub fn paragraph(&mut self, text: &str) -> &mut Self {
        for line in wrap(text, LINE_WIDTH) {
            self.lines.push(Line::Text(line));
        }
        self
    }

    /// Column-aligned table. Cells wider than their column are truncated.
    pub fn table(&mut self, headers: &[&str], widths: &[usize], rows: &[Vec<String>]) -> &mut Self {
        let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        self.lines
            .push(Line::Heading(format_row(&header_cells, widths)));
        let rule_width = widths.iter().sum::<usize>() + widths.len().saturating_sub(1);
        self.lines
            .push(Line::Text("-".repeat(rule_width.min(LINE_WIDTH))));
        if rows.is_empty() {
            self.lines.push(Line::Text("(none)".to_string()));
        }
        for row in rows {
            self.lines.push(Line::Text(format_row(row, widths)));
        }
        self
    }

    /// Paginate and serialize. `footer` is printed on every page.
    pub fn finish(&self, footer: &str) -> std::io::Result<Vec<u8>> {
        let pages: Vec<&[Line]> = if self.lines.is_empty() {
            vec![&self.lines[..]]
        } else {
            self.lines.chunks(LINES_PER_PAGE).collect()
        };
        let page_count = pages.len();

        let mut streams = Vec::with_capacity(page_count);
        for (i, lines) in pages.iter().enumerate() {
            streams.push(page_stream(lines, footer, i + 1, page_count)?);
        }

        write_pdf(&streams)
    }
}

fn page_stream(lines: &[Line], footer: &str, page: usize, pages: usize) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let y = TOP_Y - (i as u32) * LEADING;
        match line {
            Line::Heading(text) => text_op(&mut out, "F2", HEADING_SIZE, MARGIN_LEFT, y, text)?,
            Line::Text(text) => text_op(&mut out, "F1", BODY_SIZE, MARGIN_LEFT, y, text)?,
            Line::Blank => {}
        }
    }

    let footer_lines = wrap(footer, 130);
    let mut y = 20 + LEADING * footer_lines.len() as u32;
    for line in &footer_lines {
        text_op(&mut out, "F1", FOOTER_SIZE, MARGIN_LEFT, y, line)?;
        y -= LEADING - 3;
    }
    text_op(
        &mut out,
        "F1",
        FOOTER_SIZE,
        PAGE_WIDTH - MARGIN_LEFT - 60,
        20,
        &format!("Page {page} of {pages}"),
    )?;
    Ok(out)
}

fn text_op(out: &mut Vec<u8>, font: &str, size: u32, x: u32, y: u32, text: &str) -> std::io::Result<()> {
    writeln!(out, "BT /{font} {size} Tf {x} {y} Td ({}) Tj ET", escape(text))
}

fn write_pdf(streams: &[Vec<u8>]) -> std::io::Result<Vec<u8>> {
    // 1 catalog, 2 page tree, 3-4 fonts, then a page/content pair per page
    let page_ids: Vec<usize> = (0..streams.len()).map(|i| 5 + 2 * i).collect();
    let object_count = 4 + 2 * streams.len();

    let mut out: Vec<u8> = Vec::new();
    let mut offsets = Vec::with_capacity(object_count);
    out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    offsets.push(out.len());
    writeln!(out, "1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj")?;

    offsets.push(out.len());
    let kids: Vec<String> = page_ids.iter().map(|id| format!("{id} 0 R")).collect();
    writeln!(
        out,
        "2 0 obj\n<< /Type /Pages /Kids [{}] /Count {} >>\nendobj",
        kids.join(" "),
        page_ids.len()
    )?;

    for (id, face) in [(3, "Courier"), (4, "Courier-Bold")] {
        offsets.push(out.len());
        writeln!(
            out,
            "{id} 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /{face} /Encoding /WinAnsiEncoding >>\nendobj"
        )?;
    }

    for (stream, page_id) in streams.iter().zip(&page_ids) {
        let content_id = page_id + 1;
        offsets.push(out.len());
        writeln!(
            out,
            "{page_id} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
             /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {content_id} 0 R >>\nendobj"
        )?;

        offsets.push(out.len());
        writeln!(out, "{content_id} 0 obj\n<< /Length {} >>\nstream", stream.len())?;
        out.extend_from_slice(stream);
        writeln!(out, "endstream\nendobj")?;
    }

    let xref_offset = out.len();
    writeln!(out, "xref\n0 {}", object_count + 1)?;
    write!(out, "0000000000 65535 f \n")?;
    for offset in &offsets {
        write!(out, "{offset:010} 00000 n \n")?;
    }
    write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
        object_count + 1
    )?;
    Ok(out)
}

/// Escape a string literal; anything outside printable ASCII becomes `?`.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '(' | ')' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('~');
        cut
    }
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let row = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", truncate(cell, *width), width = *width))
        .collect::<Vec<_>>()
        .join(" ");
    truncate(row.trim_end(), LINE_WIDTH)
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let word = truncate(word, width);
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn amount(value: f64) -> String {
    format!("{value:.2}")
}

/// Render the document view of a synthesized report.
pub fn render_report(report: &GstRiskReport) -> Result<RenderedDocument, ReportError> {
    let mut doc = DocumentBuilder::new();

    doc.heading("GST Trust Report").paragraph(&format!(
        "Business: {}   GSTIN: {}   Tenant: {}",
        report.business.name, report.business.gstin, report.business.tenant_id
    ));

    let s = &report.summary;
    doc.heading("Reconciliation Summary").table(
        &["Metric", "Value"],
        &[32, 20],
        &[
            vec!["Total invoices".into(), s.total_invoices.to_string()],
            vec!["Matched".into(), s.matched_count.to_string()],
            vec!["Partial match".into(), s.partial_match_count.to_string()],
            vec!["Missing in GSTR-2B".into(), s.missing_in_2b_count.to_string()],
            vec!["Risky ITC invoices".into(), s.risky_itc_count.to_string()],
            vec!["Total taxable value".into(), amount(s.total_taxable_value)],
            vec!["Total ITC available".into(), amount(s.total_itc_available)],
            vec!["ITC at risk".into(), amount(s.risky_itc_amount)],
        ],
    );

    let vendor_rows: Vec<Vec<String>> = report
        .vendor_summary
        .iter()
        .map(|v| {
            vec![
                v.vendor_gstin.clone(),
                v.total_invoices.to_string(),
                v.risky_count.to_string(),
                amount(v.risky_itc_amount),
                v.risk_level.to_string(),
            ]
        })
        .collect();
    doc.heading("Vendor Risk Summary").table(
        &["Vendor GSTIN", "Invoices", "Risky", "Risky ITC", "Risk"],
        &[16, 9, 6, 16, 7],
        &vendor_rows,
    );

    let detail_rows: Vec<Vec<String>> = report
        .invoice_details
        .iter()
        .map(|d| {
            vec![
                d.invoice_number.clone(),
                d.gstin.clone(),
                d.status.to_string(),
                amount(d.taxable_value),
                amount(d.itc_amount),
                d.suggested_action.clone(),
            ]
        })
        .collect();
    doc.heading("Invoice Details").table(
        &["Invoice", "GSTIN", "Status", "Taxable", "ITC", "Action"],
        &[14, 15, 13, 12, 10, 23],
        &detail_rows,
    );

    let r = &report.risk_assessment;
    doc.heading("Risk Assessment")
        .paragraph(&format!("Risk score: {:.2} / 100", r.risk_score))
        .paragraph(&format!("Finding: {}", r.finding_summary))
        .paragraph(&format!("Recommendation: {}", r.recommendation));

    let a = &report.audit;
    doc.heading("Audit")
        .paragraph(&format!("Report ID: {}", a.report_id))
        .paragraph(&format!("Reconciliation version: {}", a.reconciliation_version))
        .paragraph(&format!("Data sources: {}", a.data_sources.join(", ")));

    let bytes = doc
        .finish(DISCLAIMER)
        .map_err(|e| ReportError::Render(e.to_string()))?;
    let sha256 = sha256_hex(&bytes);
    Ok(RenderedDocument { bytes, sha256 })
}
