//! Line reconstruction from positioned text.
//!
//! Turns a page's blocks or words into visual [`Line`]s. Word-form pages are
//! grouped by their rounded top coordinate; block-form pages keep the
//! extractor's own line split.

use std::collections::BTreeMap;

use crate::model::{DocumentLayout, PageLayout, Span, Word};

/// A visual line of text on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// Spans in left-to-right order
    pub spans: Vec<Span>,
    /// 0-based page index
    pub page: usize,
    /// Index of the block the line belongs to on its page
    pub block: usize,
    /// Position within the block, counting blank lines
    pub line: usize,
    /// Top edge of the owning block
    pub block_top: f32,
    /// Top edge of the line
    pub top: f32,
    /// Left edge of the first span
    pub x0: f32,
    /// Right edge of the last span
    pub x1: f32,
    /// Space-joined span text
    pub text: String,
}

impl Line {
    /// Build a line, deriving its text. Returns `None` for blank lines.
    pub fn new(
        spans: Vec<Span>,
        page: usize,
        block: usize,
        block_top: f32,
        top: f32,
        x0: f32,
        x1: f32,
    ) -> Option<Self> {
        let text = join_span_text(&spans, " ");
        if text.is_empty() {
            return None;
        }
        Some(Self {
            spans,
            page,
            block,
            line: 0,
            block_top,
            top,
            x0,
            x1,
            text,
        })
    }

    /// Set the position within the owning block.
    pub fn with_line_index(mut self, line: usize) -> Self {
        self.line = line;
        self
    }

    /// Font size of the first span.
    pub fn font_size(&self) -> f32 {
        self.spans.first().map(|s| s.size).unwrap_or(0.0)
    }

    /// Font name of the first span.
    pub fn font_name(&self) -> &str {
        self.spans.first().map(|s| s.font.as_str()).unwrap_or("")
    }

    /// Span texts concatenated without separators.
    pub fn compact_text(&self) -> String {
        join_span_text(&self.spans, "")
    }
}

/// Join trimmed span texts with `sep`, trimming the result.
fn join_span_text(spans: &[Span], sep: &str) -> String {
    spans
        .iter()
        .map(|s| s.text.trim())
        .collect::<Vec<_>>()
        .join(sep)
        .trim()
        .to_string()
}

/// The reconstructed lines of one page, with the page geometry.
#[derive(Debug, Clone)]
pub struct PageLines {
    pub index: usize,
    pub width: f32,
    pub height: f32,
    pub lines: Vec<Line>,
}

impl PageLines {
    /// Lines grouped by owning block, in page order.
    pub fn blocks(&self) -> impl Iterator<Item = &[Line]> {
        self.lines.chunk_by(|a, b| a.block == b.block)
    }
}

/// Groups positioned text into lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineReconstructor;

impl LineReconstructor {
    /// Create a reconstructor.
    pub fn new() -> Self {
        Self
    }

    /// Reconstruct the lines of every page of a document.
    pub fn document(&self, doc: &DocumentLayout) -> Vec<PageLines> {
        doc.pages
            .iter()
            .enumerate()
            .map(|(index, page)| self.page(index, page))
            .collect()
    }

    /// Reconstruct one page, preferring the block form when present.
    pub fn page(&self, index: usize, page: &PageLayout) -> PageLines {
        let lines = if page.blocks.is_empty() {
            self.from_words(index, &page.words)
        } else {
            self.from_blocks(index, page)
        };

        PageLines {
            index,
            width: page.width,
            height: page.height,
            lines,
        }
    }

    /// Group words sharing a rounded top coordinate into lines.
    ///
    /// Each resulting line is its own block.
    pub fn from_words(&self, page: usize, words: &[Word]) -> Vec<Line> {
        let mut rows: BTreeMap<i64, Vec<&Word>> = BTreeMap::new();
        for word in words {
            rows.entry(round_top(word.top)).or_default().push(word);
        }

        let mut lines = Vec::with_capacity(rows.len());
        for (top, mut row) in rows {
            row.sort_by(|a, b| a.x0.partial_cmp(&b.x0).unwrap_or(std::cmp::Ordering::Equal));

            let x0 = row.first().map(|w| w.x0).unwrap_or(0.0);
            let x1 = row.last().map(|w| w.x1).unwrap_or(0.0);
            let spans = row
                .into_iter()
                .map(|w| {
                    Span::new(w.text.clone(), w.size, w.fontname.clone())
                        .with_bbox([w.x0, w.top, w.x1, w.top + w.size])
                })
                .collect();

            let top = top as f32;
            if let Some(line) = Line::new(spans, page, lines.len(), top, top, x0, x1) {
                lines.push(line);
            }
        }
        lines
    }

    /// Take the extractor's block lines as-is.
    pub fn from_blocks(&self, page: usize, layout: &PageLayout) -> Vec<Line> {
        let mut lines = Vec::new();
        for (block_idx, block) in layout.blocks.iter().enumerate() {
            for (line_idx, layout_line) in block.lines.iter().enumerate() {
                if layout_line.spans.is_empty() {
                    continue;
                }
                let spans = layout_line.spans.clone();
                let top = spans
                    .iter()
                    .filter_map(|s| s.bbox.map(|b| b[1]))
                    .fold(None, |acc: Option<f32>, t| Some(acc.map_or(t, |a| a.min(t))))
                    .unwrap_or(block.bbox[1]);
                let x0 = spans
                    .first()
                    .and_then(|s| s.bbox.map(|b| b[0]))
                    .unwrap_or(block.bbox[0]);
                let x1 = spans
                    .last()
                    .and_then(|s| s.bbox.map(|b| b[2]))
                    .unwrap_or(block.bbox[2]);

                if let Some(line) = Line::new(spans, page, block_idx, block.top(), top, x0, x1) {
                    lines.push(line.with_line_index(line_idx));
                }
            }
        }
        lines
    }
}

/// Round half to even, matching the extractor-side grouping key.
fn round_top(top: f32) -> i64 {
    (top as f64).round_ties_even() as i64
}
