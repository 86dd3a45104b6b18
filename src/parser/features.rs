//! Per-line typographic and positional features.
//!
//! The same [`FeatureVector`] feeds the rule engine and the statistical
//! classifier, so every column here has exactly one definition.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use super::lines::{Line, PageLines};
use crate::error::Error;

fn numbering_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+(\.\d+)*").expect("valid numbering regex"))
}

fn heading_pattern_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^((\d+\.)+|[A-Z]\.|[IVXLCDM]+\.)\s").expect("valid heading pattern regex")
    })
}

fn heading_keyword_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(Abstract|Introduction|Conclusion|References|Index Terms)")
            .expect("valid heading keyword regex")
    })
}

/// Capitalization shape of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextCase {
    Upper,
    Title,
    Other,
}

impl TextCase {
    /// Classify text: all cased characters uppercase, title case, or neither.
    pub fn of(text: &str) -> Self {
        if is_upper(text) {
            TextCase::Upper
        } else if is_title(text) {
            TextCase::Title
        } else {
            TextCase::Other
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TextCase::Upper => "upper",
            TextCase::Title => "title",
            TextCase::Other => "other",
        }
    }
}

impl fmt::Display for TextCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// At least one cased character and no lowercase ones.
fn is_upper(text: &str) -> bool {
    let mut cased = false;
    for c in text.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

/// Every cased run starts with one uppercase character followed by lowercase.
fn is_title(text: &str) -> bool {
    let mut cased = false;
    let mut prev_cased = false;
    for c in text.chars() {
        if c.is_uppercase() {
            if prev_cased {
                return false;
            }
            prev_cased = true;
            cased = true;
        } else if c.is_lowercase() {
            if !prev_cased {
                return false;
            }
            prev_cased = true;
            cased = true;
        } else {
            prev_cased = false;
        }
    }
    cased
}

/// Whether text starts with `1`, `1.2`, `3.4.5` ...
pub fn starts_with_numbering(text: &str) -> bool {
    numbering_re().is_match(text)
}

/// Whether text starts like a heading: `1.`, `A.`, `IV.` followed by
/// whitespace, or a common front/back-matter keyword.
pub fn starts_with_heading_pattern(text: &str) -> bool {
    let text = text.trim();
    heading_pattern_re().is_match(text) || heading_keyword_re().is_match(text)
}

/// Style of the previous non-blank line, carried across a document scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleState {
    pub size: f32,
    pub font_name: String,
}

impl StyleState {
    /// The state at document start.
    pub fn new() -> Self {
        Self::default()
    }

    /// The state after `line` has been seen.
    pub fn after(line: &Line) -> Self {
        Self {
            size: line.font_size(),
            font_name: line.font_name().to_string(),
        }
    }
}

/// Options for feature extraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureOptions {
    /// Fraction of page width within which margins count as centered
    pub center_tolerance: f32,
}

impl FeatureOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the centering tolerance.
    pub fn with_center_tolerance(mut self, tolerance: f32) -> Self {
        self.center_tolerance = tolerance;
        self
    }
}

impl Default for FeatureOptions {
    fn default() -> Self {
        Self {
            center_tolerance: 0.2,
        }
    }
}

/// Features of one line.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub font_size: f32,
    pub is_bold: bool,
    pub word_count: usize,
    pub size_diff_from_prev: f32,
    pub starts_with_numbering: bool,
    pub starts_with_pattern: bool,
    pub text_case: TextCase,
    /// Line top over page height
    pub y_position: f32,
    pub is_centered: bool,
}

impl FeatureVector {
    /// Value of a named column as the model consumes it.
    pub fn value(&self, column: FeatureColumn) -> f64 {
        fn flag(b: bool) -> f64 {
            if b {
                1.0
            } else {
                0.0
            }
        }

        match column {
            FeatureColumn::FontSize => self.font_size as f64,
            FeatureColumn::IsBold => flag(self.is_bold),
            FeatureColumn::WordCount => self.word_count as f64,
            FeatureColumn::SizeDiffFromPrev => self.size_diff_from_prev as f64,
            FeatureColumn::StartsWithNumbering => flag(self.starts_with_numbering),
            FeatureColumn::StartsWithPattern => flag(self.starts_with_pattern),
            FeatureColumn::YPosition => self.y_position as f64,
            FeatureColumn::IsCentered => flag(self.is_centered),
            FeatureColumn::TextCaseTitle => flag(self.text_case == TextCase::Title),
            FeatureColumn::TextCaseUpper => flag(self.text_case == TextCase::Upper),
            FeatureColumn::TextCaseOther => flag(self.text_case == TextCase::Other),
        }
    }

    /// Row of values in the given column order.
    pub fn row(&self, columns: &[FeatureColumn]) -> Vec<f64> {
        columns.iter().map(|c| self.value(*c)).collect()
    }
}

/// A named feature column of the training schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureColumn {
    FontSize,
    IsBold,
    WordCount,
    SizeDiffFromPrev,
    StartsWithNumbering,
    StartsWithPattern,
    YPosition,
    IsCentered,
    TextCaseTitle,
    TextCaseUpper,
    TextCaseOther,
}

impl FeatureColumn {
    /// Column order of the basic training schema.
    pub const BASIC: [FeatureColumn; 7] = [
        FeatureColumn::FontSize,
        FeatureColumn::IsBold,
        FeatureColumn::WordCount,
        FeatureColumn::SizeDiffFromPrev,
        FeatureColumn::StartsWithNumbering,
        FeatureColumn::YPosition,
        FeatureColumn::IsCentered,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FeatureColumn::FontSize => "font_size",
            FeatureColumn::IsBold => "is_bold",
            FeatureColumn::WordCount => "word_count",
            FeatureColumn::SizeDiffFromPrev => "size_diff_from_prev",
            FeatureColumn::StartsWithNumbering => "starts_with_numbering",
            FeatureColumn::StartsWithPattern => "starts_with_pattern",
            FeatureColumn::YPosition => "y_position",
            FeatureColumn::IsCentered => "is_centered",
            FeatureColumn::TextCaseTitle => "text_case_title",
            FeatureColumn::TextCaseUpper => "text_case_upper",
            FeatureColumn::TextCaseOther => "text_case_other",
        }
    }
}

impl FromStr for FeatureColumn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let column = match s {
            "font_size" => FeatureColumn::FontSize,
            "is_bold" => FeatureColumn::IsBold,
            "word_count" => FeatureColumn::WordCount,
            "size_diff_from_prev" => FeatureColumn::SizeDiffFromPrev,
            "starts_with_numbering" => FeatureColumn::StartsWithNumbering,
            "starts_with_pattern" => FeatureColumn::StartsWithPattern,
            "y_position" => FeatureColumn::YPosition,
            "is_centered" => FeatureColumn::IsCentered,
            "text_case_title" => FeatureColumn::TextCaseTitle,
            "text_case_upper" => FeatureColumn::TextCaseUpper,
            "text_case_other" => FeatureColumn::TextCaseOther,
            other => {
                return Err(Error::SchemaMismatch(format!(
                    "unknown feature column '{other}'"
                )))
            }
        };
        Ok(column)
    }
}

/// Derives [`FeatureVector`]s from lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor {
    options: FeatureOptions,
}

impl FeatureExtractor {
    pub fn new(options: FeatureOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FeatureOptions {
        &self.options
    }

    /// Features of `line` given the page geometry and the previous style.
    ///
    /// Pure: the caller advances the style with [`StyleState::after`].
    pub fn extract(&self, line: &Line, page: &PageLines, prev: &StyleState) -> FeatureVector {
        let font_size = line.font_size();
        let left_margin = line.x0;
        let right_margin = page.width - line.x1;
        let y_position = if page.height > 0.0 {
            line.top / page.height
        } else {
            0.0
        };

        FeatureVector {
            font_size,
            is_bold: line.font_name().to_lowercase().contains("bold"),
            word_count: line.text.split_whitespace().count(),
            size_diff_from_prev: font_size - prev.size,
            starts_with_numbering: starts_with_numbering(&line.text),
            starts_with_pattern: starts_with_heading_pattern(&line.text),
            text_case: TextCase::of(&line.text),
            y_position,
            is_centered: (left_margin - right_margin).abs()
                < self.options.center_tolerance * page.width,
        }
    }

    /// Features for every line of a document, threading the style state.
    ///
    /// The state starts fresh here and is never shared across documents.
    pub fn document<'a>(
        &self,
        pages: &'a [PageLines],
    ) -> Vec<(&'a PageLines, &'a Line, FeatureVector)> {
        let mut state = StyleState::new();
        let mut out = Vec::new();
        for page in pages {
            for line in &page.lines {
                let features = self.extract(line, page, &state);
                state = StyleState::after(line);
                out.push((page, line, features));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Span;

    fn page_with(lines: Vec<Line>) -> PageLines {
        PageLines {
            index: 0,
            width: 600.0,
            height: 800.0,
            lines,
        }
    }

    fn line(text: &str, size: f32, font: &str, top: f32, x0: f32, x1: f32) -> Line {
        Line::new(vec![Span::new(text, size, font)], 0, 0, top, top, x0, x1).unwrap()
    }

    #[test]
    fn test_text_case() {
        assert_eq!(TextCase::of("TABLE OF CONTENTS"), TextCase::Upper);
        assert_eq!(TextCase::of("1. INTRODUCTION"), TextCase::Upper);
        assert_eq!(TextCase::of("Table Of Contents"), TextCase::Title);
        assert_eq!(TextCase::of("Table of Contents"), TextCase::Other);
        assert_eq!(TextCase::of("McDonald"), TextCase::Other);
        assert_eq!(TextCase::of("2024"), TextCase::Other);
    }

    #[test]
    fn test_numbering_patterns() {
        assert!(starts_with_numbering("1. Introduction"));
        assert!(starts_with_numbering("2.3 Scope"));
        assert!(!starts_with_numbering("Chapter 1"));

        assert!(starts_with_heading_pattern("2.1. Goals"));
        assert!(starts_with_heading_pattern("A. Appendix"));
        assert!(starts_with_heading_pattern("IV. Results"));
        assert!(starts_with_heading_pattern("abstract"));
        assert!(starts_with_heading_pattern("Index Terms—pdf"));
        assert!(!starts_with_heading_pattern("2.1 Goals"));
        assert!(!starts_with_heading_pattern("Overview"));
    }

    #[test]
    fn test_extract_features() {
        let l = line("1. Overview Of Scope", 16.0, "Arial-BoldMT", 80.0, 200.0, 400.0);
        let page = page_with(vec![l.clone()]);
        let prev = StyleState {
            size: 10.0,
            font_name: "Arial".into(),
        };

        let fv = FeatureExtractor::default().extract(&l, &page, &prev);
        assert_eq!(fv.font_size, 16.0);
        assert!(fv.is_bold);
        assert_eq!(fv.word_count, 4);
        assert_eq!(fv.size_diff_from_prev, 6.0);
        assert!(fv.starts_with_numbering);
        assert!(fv.starts_with_pattern);
        assert_eq!(fv.text_case, TextCase::Title);
        assert!((fv.y_position - 0.1).abs() < 1e-6);
        assert!(fv.is_centered);
    }

    #[test]
    fn test_extract_is_pure() {
        let l = line("Body text here", 10.0, "Times", 300.0, 72.0, 540.0);
        let page = page_with(vec![l.clone()]);
        let prev = StyleState::new();
        let extractor = FeatureExtractor::default();
        assert_eq!(
            extractor.extract(&l, &page, &prev),
            extractor.extract(&l, &page, &prev)
        );
    }

    #[test]
    fn test_centering_tolerance() {
        // left 72, right 600 - 300 = 300, diff 228
        let l = line("Left aligned", 10.0, "Times", 100.0, 72.0, 300.0);
        let page = page_with(vec![l.clone()]);
        let prev = StyleState::new();
        assert!(!FeatureExtractor::default().extract(&l, &page, &prev).is_centered);
        let wide = FeatureExtractor::new(FeatureOptions::new().with_center_tolerance(0.4));
        assert!(wide.extract(&l, &page, &prev).is_centered);
    }

    #[test]
    fn test_size_diff_carries_across_pages() {
        let first = PageLines {
            index: 0,
            width: 600.0,
            height: 800.0,
            lines: vec![line("Title Page", 20.0, "Arial", 100.0, 72.0, 300.0)],
        };
        let mut second_line = line("Body", 10.0, "Arial", 50.0, 72.0, 300.0);
        second_line.page = 1;
        let second = PageLines {
            index: 1,
            width: 600.0,
            height: 800.0,
            lines: vec![second_line],
        };
        let pages = vec![first, second];

        let rows = FeatureExtractor::default().document(&pages);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].2.size_diff_from_prev, 20.0);
        assert_eq!(rows[1].2.size_diff_from_prev, -10.0);
    }

    #[test]
    fn test_feature_columns() {
        let l = line("SUMMARY", 12.0, "Arial", 100.0, 72.0, 300.0);
        let page = page_with(vec![l.clone()]);
        let fv = FeatureExtractor::default().extract(&l, &page, &StyleState::new());
        assert_eq!(fv.value(FeatureColumn::TextCaseUpper), 1.0);
        assert_eq!(fv.value(FeatureColumn::TextCaseTitle), 0.0);
        assert_eq!(fv.row(&FeatureColumn::BASIC).len(), 7);
        assert_eq!("y_position".parse::<FeatureColumn>().unwrap(), FeatureColumn::YPosition);
        assert!(matches!(
            "line_height".parse::<FeatureColumn>(),
            Err(Error::SchemaMismatch(_))
        ));
    }
}
