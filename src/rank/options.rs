//! Segmentation and ranking options.

use crate::model::BOLD_FLAG;

/// Heading texts dropped from the candidate pool by default.
pub const DEFAULT_BLACKLIST: [&str; 4] = ["introduction", "conclusion", "references", "abstract"];

/// Options for splitting a document into sections.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentOptions {
    /// Number of leading pages sampled for the median font size
    pub median_sample_pages: usize,

    /// A block is a heading when its first span exceeds `median * ratio`
    pub heading_size_ratio: f32,

    /// Span flag bit that marks a block as a heading
    pub bold_flag: u32,

    /// Median used when the sample holds no spans
    pub default_median: f32,

    /// Pages past this count are not scanned
    pub max_pages: usize,

    /// Heading of the section that is open before the first heading block
    pub initial_heading: String,
}

impl SegmentOptions {
    /// Create segment options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the heading size ratio.
    pub fn with_heading_size_ratio(mut self, ratio: f32) -> Self {
        self.heading_size_ratio = ratio;
        self
    }

    /// Set the maximum number of scanned pages.
    pub fn with_max_pages(mut self, pages: usize) -> Self {
        self.max_pages = pages;
        self
    }

    /// Set the number of pages sampled for the median.
    pub fn with_median_sample_pages(mut self, pages: usize) -> Self {
        self.median_sample_pages = pages;
        self
    }

    /// Set the heading of the leading section.
    pub fn with_initial_heading(mut self, heading: impl Into<String>) -> Self {
        self.initial_heading = heading.into();
        self
    }
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            median_sample_pages: 5,
            heading_size_ratio: 1.15,
            bold_flag: BOLD_FLAG,
            default_median: 12.0,
            max_pages: 50,
            initial_heading: "Introduction".to_string(),
        }
    }
}

/// Options for the ranking pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingOptions {
    /// Candidates kept after semantic ranking
    pub candidate_limit: usize,

    /// Number of `extracted_sections` rows
    pub extracted_count: usize,

    /// Number of `sub_section_analysis` rows, taken from the top of the ranking
    pub subsection_count: usize,

    /// Lowercase headings filtered out of the candidate pool
    pub blacklist: Vec<String>,

    /// Worker threads for document extraction (None = rayon default)
    pub threads: Option<usize>,

    /// How documents are split into sections
    pub segment: SegmentOptions,
}

impl RankingOptions {
    /// Create ranking options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the candidate limit.
    pub fn with_candidate_limit(mut self, limit: usize) -> Self {
        self.candidate_limit = limit;
        self
    }

    /// Set how many sections are reported.
    pub fn with_extracted_count(mut self, count: usize) -> Self {
        self.extracted_count = count;
        self
    }

    /// Set how many sections get a sub-section analysis.
    pub fn with_subsection_count(mut self, count: usize) -> Self {
        self.subsection_count = count;
        self
    }

    /// Replace the heading blacklist. Entries are lowercased.
    pub fn with_blacklist<I, S>(mut self, headings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.blacklist = headings
            .into_iter()
            .map(|h| h.as_ref().trim().to_lowercase())
            .collect();
        self
    }

    /// Set the worker thread count.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Set segment options.
    pub fn with_segment(mut self, segment: SegmentOptions) -> Self {
        self.segment = segment;
        self
    }
}

impl Default for RankingOptions {
    fn default() -> Self {
        Self {
            candidate_limit: 20,
            extracted_count: 10,
            subsection_count: 5,
            blacklist: DEFAULT_BLACKLIST.iter().map(|s| s.to_string()).collect(),
            threads: None,
            segment: SegmentOptions::default(),
        }
    }
}
