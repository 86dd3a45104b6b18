//! Positioned-text layout types.
//!
//! These mirror what an external PDF text extractor hands over: either the
//! nested block form (`blocks[].lines[].spans[]`) or a flat word list with
//! coordinates. Both forms deserialize from the same page object.

use serde::{Deserialize, Serialize};

/// Bold bit in the span `flags` field of the block form.
pub const BOLD_FLAG: u32 = 16;

/// A whole document as produced by the layout extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentLayout {
    /// Source file name (e.g. `guide.pdf`)
    #[serde(default)]
    pub name: String,

    /// Pages in reading order
    #[serde(default)]
    pub pages: Vec<PageLayout>,
}

impl DocumentLayout {
    /// Create an empty layout for the named document.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pages: Vec::new(),
        }
    }

    /// Add a page.
    pub fn add_page(&mut self, page: PageLayout) {
        self.pages.push(page);
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Check whether any page carries non-blank text.
    pub fn has_text(&self) -> bool {
        self.pages.iter().any(PageLayout::has_text)
    }
}

/// A single page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLayout {
    /// Page width in points
    pub width: f32,

    /// Page height in points
    pub height: f32,

    /// Block form content
    #[serde(default)]
    pub blocks: Vec<LayoutBlock>,

    /// Word-list form content
    #[serde(default)]
    pub words: Vec<Word>,
}

impl PageLayout {
    /// Create an empty page with the given dimensions.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            blocks: Vec::new(),
            words: Vec::new(),
        }
    }

    /// Create an empty Letter-sized page.
    pub fn letter() -> Self {
        Self::new(612.0, 792.0)
    }

    /// Add a block.
    pub fn add_block(&mut self, block: LayoutBlock) {
        self.blocks.push(block);
    }

    /// Add a word.
    pub fn add_word(&mut self, word: Word) {
        self.words.push(word);
    }

    /// Check whether the page carries any non-blank text.
    pub fn has_text(&self) -> bool {
        self.blocks
            .iter()
            .flat_map(|b| b.lines.iter())
            .flat_map(|l| l.spans.iter())
            .any(|s| !s.text.trim().is_empty())
            || self.words.iter().any(|w| !w.text.trim().is_empty())
    }
}

/// A text block: `bbox` is `[x0, top, x1, bottom]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutBlock {
    #[serde(default)]
    pub bbox: [f32; 4],

    #[serde(default)]
    pub lines: Vec<LayoutLine>,
}

impl LayoutBlock {
    /// Create a block with the given bounding box.
    pub fn new(bbox: [f32; 4]) -> Self {
        Self {
            bbox,
            lines: Vec::new(),
        }
    }

    /// Builder-style line append.
    pub fn with_line(mut self, line: LayoutLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Top edge of the block.
    pub fn top(&self) -> f32 {
        self.bbox[1]
    }
}

/// One visual line inside a block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutLine {
    #[serde(default)]
    pub spans: Vec<Span>,
}

impl LayoutLine {
    /// A line made of a single span.
    pub fn single(span: Span) -> Self {
        Self { spans: vec![span] }
    }
}

/// A run of text sharing one font.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// The text content
    pub text: String,

    /// Font size in points
    pub size: f32,

    /// Font name (e.g. "Arial-BoldMT")
    #[serde(default)]
    pub font: String,

    /// Extractor style flags (bit 16 = bold)
    #[serde(default)]
    pub flags: u32,

    /// `[x0, top, x1, bottom]`, when the extractor provides it
    #[serde(default)]
    pub bbox: Option<[f32; 4]>,
}

impl Span {
    /// Create a span without flags or position.
    pub fn new(text: impl Into<String>, size: f32, font: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            size,
            font: font.into(),
            flags: 0,
            bbox: None,
        }
    }

    /// Set the style flags.
    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    /// Set the bounding box.
    pub fn with_bbox(mut self, bbox: [f32; 4]) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Whether the extractor flagged this span as bold.
    pub fn has_bold_flag(&self) -> bool {
        self.flags & BOLD_FLAG != 0
    }

    /// Whether the font name marks the span as bold.
    pub fn has_bold_name(&self) -> bool {
        self.font.to_lowercase().contains("bold")
    }
}

/// A word from the flat word-list form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub x0: f32,
    pub x1: f32,
    pub top: f32,
    #[serde(default)]
    pub fontname: String,
    pub size: f32,
}

impl Word {
    /// Create a word.
    pub fn new(
        text: impl Into<String>,
        x0: f32,
        x1: f32,
        top: f32,
        fontname: impl Into<String>,
        size: f32,
    ) -> Self {
        Self {
            text: text.into(),
            x0,
            x1,
            top,
            fontname: fontname.into(),
            size,
        }
    }
}
