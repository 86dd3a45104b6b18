//! Outline types: line labels, heading candidates and the final outline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Deepest heading level an outline may carry.
pub const MAX_HEADING_LEVEL: u8 = 9;

/// A heading level, serialized as `"H1"` .. `"H9"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    /// Top-level heading.
    pub const H1: HeadingLevel = HeadingLevel(1);

    /// Fallback level for headings outside the size map.
    pub const LOWEST: HeadingLevel = HeadingLevel(MAX_HEADING_LEVEL);

    /// Create a level, clamping into `1..=9`.
    pub fn new(level: u8) -> Self {
        Self(level.clamp(1, MAX_HEADING_LEVEL))
    }

    /// Numeric depth (1 = top level).
    pub fn depth(self) -> u8 {
        self.0
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H{}", self.0)
    }
}

impl From<HeadingLevel> for String {
    fn from(level: HeadingLevel) -> Self {
        level.to_string()
    }
}

impl TryFrom<String> for HeadingLevel {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for HeadingLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix('H')
            .and_then(|n| n.parse::<u8>().ok())
            .filter(|n| (1..=MAX_HEADING_LEVEL).contains(n))
            .map(HeadingLevel)
            .ok_or_else(|| Error::Other(format!("invalid heading level: {s}")))
    }
}

/// The label a classifier assigns to a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineLabel {
    /// Body text
    Paragraph,
    /// Part of the document title
    Title,
    /// A heading at the given level
    Heading(HeadingLevel),
}

impl LineLabel {
    /// Whether the label marks a heading of any level.
    pub fn is_heading(self) -> bool {
        matches!(self, LineLabel::Heading(_))
    }
}

impl fmt::Display for LineLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineLabel::Paragraph => f.write_str("paragraph"),
            LineLabel::Title => f.write_str("Title"),
            LineLabel::Heading(level) => level.fmt(f),
        }
    }
}

impl FromStr for LineLabel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paragraph" => Ok(LineLabel::Paragraph),
            "Title" => Ok(LineLabel::Title),
            other => other.parse().map(LineLabel::Heading),
        }
    }
}

/// A classified heading before outline assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingCandidate {
    /// Heading text as it will appear in the outline
    pub text: String,
    /// Assigned level
    pub level: HeadingLevel,
    /// Source page
    pub page: u32,
    /// Font size of the heading line (internal only)
    pub font_size: f32,
}

impl HeadingCandidate {
    /// Create a candidate.
    pub fn new(text: impl Into<String>, level: HeadingLevel, page: u32, font_size: f32) -> Self {
        Self {
            text: text.into(),
            level,
            page,
            font_size,
        }
    }
}

/// One entry of the final outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub level: HeadingLevel,
    pub text: String,
    pub page: u32,
}

impl From<HeadingCandidate> for OutlineEntry {
    fn from(candidate: HeadingCandidate) -> Self {
        Self {
            level: candidate.level,
            text: candidate.text,
            page: candidate.page,
        }
    }
}

/// A document outline: title plus ordered headings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outline {
    pub title: String,
    pub outline: Vec<OutlineEntry>,
}

impl Outline {
    /// The empty outline returned for unreadable or textless documents.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check whether the outline has neither title nor headings.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.outline.is_empty()
    }
}

/// Where the outline title came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleSource {
    /// Largest font on the first page
    LargestSpan,
    /// Lines the classifier labelled as title
    Predicted,
    /// No title was predicted; the first first-page H1 was promoted
    PromotedHeading,
    /// No title could be determined
    Missing,
}

/// An outline together with how its title was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineReport {
    pub outline: Outline,
    pub title_source: TitleSource,
}

impl OutlineReport {
    /// The fail-soft result: empty outline, no title.
    pub fn empty() -> Self {
        Self {
            outline: Outline::empty(),
            title_source: TitleSource::Missing,
        }
    }
}
