//! Multi-pass rule engine for outline extraction.
//!
//! Pass 1 picks the title from the largest first-page font, pass 2 finds
//! fixed introductory headings, pass 3 finds numbered headings and pass 4
//! maps their font sizes to levels.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use super::assembler::OutlineAssembler;
use super::classifier::HeadingClassifier;
use crate::model::{
    DocumentLayout, HeadingCandidate, HeadingLevel, LineLabel, OutlineReport, TitleSource,
};
use crate::parser::{FeatureVector, Line, LineReconstructor, PageLines};

fn numbered_heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+[\.\d]*\s+").expect("valid numbered heading regex"))
}

/// Default phrase marking the page where numbered content starts.
pub const DEFAULT_ANCHOR_PHRASE: &str = "1. Introduction to the Foundation Level Extensions";

/// Configuration for the rule engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOptions {
    /// Exact line texts treated as introductory H1 headings
    pub intro_keywords: Vec<String>,
    /// Introductory headings must be strictly larger than this
    pub intro_min_size: f32,
    /// Number of leading pages searched for introductory headings
    pub intro_pages: usize,
    /// Numbered headings are searched from the first page containing this phrase
    pub anchor_phrase: Option<String>,
    /// Numbered headings must be strictly larger than this
    pub body_size_threshold: f32,
    /// Title candidates must start above this fraction of the page height
    pub footer_ratio: f32,
    /// Subtracted from 1-based page numbers in the final outline
    pub page_shift: u32,
}

impl RuleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the introductory keyword set.
    pub fn with_intro_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.intro_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Set or clear the anchor phrase.
    pub fn with_anchor_phrase(mut self, phrase: Option<String>) -> Self {
        self.anchor_phrase = phrase;
        self
    }

    /// Set the body text size threshold.
    pub fn with_body_size_threshold(mut self, size: f32) -> Self {
        self.body_size_threshold = size;
        self
    }

    /// Set the page shift.
    pub fn with_page_shift(mut self, shift: u32) -> Self {
        self.page_shift = shift;
        self
    }
}

impl Default for RuleOptions {
    fn default() -> Self {
        Self {
            intro_keywords: vec![
                "Revision History".to_string(),
                "Table of Contents".to_string(),
                "Acknowledgements".to_string(),
            ],
            intro_min_size: 14.0,
            intro_pages: 5,
            anchor_phrase: Some(DEFAULT_ANCHOR_PHRASE.to_string()),
            body_size_threshold: 11.0,
            footer_ratio: 0.85,
            page_shift: 1,
        }
    }
}

/// A numbered heading found in pass 3, before level assignment.
#[derive(Debug, Clone)]
struct NumberedHeading {
    text: String,
    size_key: i64,
    page: u32,
}

/// Font size rounded to two decimals, as an orderable key.
fn size_key(size: f32) -> i64 {
    (size as f64 * 100.0).round() as i64
}

/// Deterministic multi-pass heading rule engine.
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    options: RuleOptions,
    lines: LineReconstructor,
}

impl RuleEngine {
    pub fn new(options: RuleOptions) -> Self {
        Self {
            options,
            lines: LineReconstructor::new(),
        }
    }

    pub fn options(&self) -> &RuleOptions {
        &self.options
    }

    fn is_intro_heading(&self, line: &Line) -> bool {
        line.font_size() > self.options.intro_min_size
            && self.options.intro_keywords.iter().any(|k| *k == line.text)
    }

    fn is_numbered_heading(&self, line: &Line) -> bool {
        numbered_heading_re().is_match(&line.text)
            && size_key(line.font_size()) > size_key(self.options.body_size_threshold)
    }

    /// Pass 1: text of the largest span above the footer on the first page.
    fn find_title(&self, first: &PageLines) -> String {
        let footer = first.height * self.options.footer_ratio;
        let mut max_size = 0.0f32;
        let mut title = String::new();

        for line in first.lines.iter().filter(|l| l.block_top < footer) {
            for span in &line.spans {
                let text = span.text.trim();
                if text.is_empty() || span.size <= 0.0 {
                    continue;
                }
                // Ties go to the later span.
                if span.size >= max_size {
                    max_size = span.size;
                    title = text.to_string();
                }
            }
        }
        title
    }

    /// Pass 2: fixed introductory headings on the leading pages.
    fn find_intro_headings(&self, pages: &[PageLines]) -> Vec<HeadingCandidate> {
        pages
            .iter()
            .take(self.options.intro_pages)
            .flat_map(|page| {
                page.lines
                    .iter()
                    .filter(|l| self.is_intro_heading(l))
                    .map(move |l| {
                        HeadingCandidate::new(
                            format!("{} ", l.text),
                            HeadingLevel::H1,
                            page.index as u32 + 1,
                            l.font_size(),
                        )
                    })
            })
            .collect()
    }

    /// First page whose text contains the anchor phrase, or 0.
    fn content_start(&self, pages: &[PageLines]) -> usize {
        let Some(anchor) = self.options.anchor_phrase.as_deref() else {
            return 0;
        };
        let anchor = anchor.to_lowercase();

        pages
            .iter()
            .position(|page| {
                page.lines
                    .iter()
                    .map(|l| l.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
                    .to_lowercase()
                    .contains(&anchor)
            })
            .unwrap_or(0)
    }

    /// Pass 3: numbered headings, merging one un-numbered continuation line.
    fn find_numbered_headings(&self, pages: &[PageLines]) -> Vec<NumberedHeading> {
        let start = self.content_start(pages);
        log::debug!("Numbered headings scanned from page {}", start);

        let mut found = Vec::new();
        for page in pages.iter().skip(start) {
            for block in page.blocks() {
                for (idx, line) in block.iter().enumerate() {
                    if !self.is_numbered_heading(line) {
                        continue;
                    }

                    // Only the directly following line; a blank one merges nothing.
                    let mut text = line.text.clone();
                    let next = block.get(idx + 1).filter(|next| next.line == line.line + 1);
                    if let Some(next) = next {
                        let next_text = next.compact_text();
                        if !numbered_heading_re().is_match(&next_text) {
                            text.push_str(&next_text);
                        }
                    }

                    found.push(NumberedHeading {
                        text,
                        size_key: size_key(line.font_size()),
                        page: page.index as u32 + 1,
                    });
                }
            }
        }
        found
    }

    /// Pass 4: largest distinct size becomes H1, the next H2, and so on.
    fn assign_levels(&self, numbered: Vec<NumberedHeading>) -> Vec<HeadingCandidate> {
        let mut sizes: Vec<i64> = numbered.iter().map(|h| h.size_key).collect();
        sizes.sort_unstable_by(|a, b| b.cmp(a));
        sizes.dedup();

        let levels: BTreeMap<i64, HeadingLevel> = sizes
            .iter()
            .enumerate()
            .map(|(i, size)| (*size, HeadingLevel::new((i + 1).min(u8::MAX as usize) as u8)))
            .collect();

        numbered
            .into_iter()
            .map(|h| {
                let level = levels
                    .get(&h.size_key)
                    .copied()
                    .unwrap_or(HeadingLevel::LOWEST);
                HeadingCandidate::new(
                    format!("{} ", h.text),
                    level,
                    h.page,
                    h.size_key as f32 / 100.0,
                )
            })
            .collect()
    }
}

impl HeadingClassifier for RuleEngine {
    fn name(&self) -> &str {
        "rules"
    }

    /// Per-line view of passes 2 and 3. Numbered headings get the lowest
    /// level here; document-wide level mapping happens in [`outline`].
    ///
    /// [`outline`]: HeadingClassifier::outline
    fn classify(&self, line: &Line, _features: &FeatureVector, page_index: usize) -> LineLabel {
        if page_index < self.options.intro_pages && self.is_intro_heading(line) {
            LineLabel::Heading(HeadingLevel::H1)
        } else if self.is_numbered_heading(line) {
            LineLabel::Heading(HeadingLevel::LOWEST)
        } else {
            LineLabel::Paragraph
        }
    }

    fn outline(&self, doc: &DocumentLayout) -> OutlineReport {
        if !doc.has_text() {
            log::warn!("{}: no extractable text", doc.name);
            return OutlineReport::empty();
        }

        let pages = self.lines.document(doc);
        let title = pages
            .first()
            .map(|p| self.find_title(p))
            .unwrap_or_default();

        let mut candidates = self.find_intro_headings(&pages);
        let numbered = self.find_numbered_headings(&pages);
        log::debug!(
            "{}: {} introductory, {} numbered headings",
            doc.name,
            candidates.len(),
            numbered.len()
        );
        candidates.extend(self.assign_levels(numbered));

        for candidate in &mut candidates {
            candidate.page = candidate.page.saturating_sub(self.options.page_shift);
        }

        let title_source = if title.is_empty() {
            TitleSource::Missing
        } else {
            TitleSource::LargestSpan
        };

        OutlineReport {
            outline: OutlineAssembler::new().assemble(title, candidates),
            title_source,
        }
    }
}
