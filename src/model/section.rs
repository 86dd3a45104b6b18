//! Section and ranking result types.

use serde::{Deserialize, Serialize};

/// A heading with the body text that follows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    pub content: String,
    /// 0-based page index
    pub page: u32,
    /// Document the section was extracted from
    pub source_doc: String,
}

impl Section {
    /// Create a section.
    pub fn new(
        heading: impl Into<String>,
        content: impl Into<String>,
        page: u32,
        source_doc: impl Into<String>,
    ) -> Self {
        Self {
            heading: heading.into(),
            content: content.into(),
            page,
            source_doc: source_doc.into(),
        }
    }

    /// Text handed to the relevance model: heading, newline, content.
    pub fn passage(&self) -> String {
        format!("{}\n{}", self.heading, self.content)
    }
}

/// The sections extracted from one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentStructure {
    pub title: String,
    pub sections: Vec<Section>,
}

impl DocumentStructure {
    /// A structure with no sections, used for unreadable documents.
    pub fn empty(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            sections: Vec::new(),
        }
    }
}

/// A section with its final 1-based rank.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedSection {
    pub section: Section,
    pub importance_rank: usize,
}

/// One row of `extracted_sections`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedSection {
    pub document: String,
    pub page_number: u32,
    pub section_title: String,
    pub importance_rank: usize,
}

impl From<&RankedSection> for ExtractedSection {
    fn from(ranked: &RankedSection) -> Self {
        Self {
            document: ranked.section.source_doc.clone(),
            page_number: ranked.section.page,
            section_title: ranked.section.heading.clone(),
            importance_rank: ranked.importance_rank,
        }
    }
}

/// One row of `sub_section_analysis`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubSectionAnalysis {
    pub document: String,
    pub page_number: u32,
    pub refined_text: String,
}

impl From<&RankedSection> for SubSectionAnalysis {
    fn from(ranked: &RankedSection) -> Self {
        Self {
            document: ranked.section.source_doc.clone(),
            page_number: ranked.section.page,
            refined_text: ranked.section.content.clone(),
        }
    }
}

/// The ranking output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingResult {
    pub extracted_sections: Vec<ExtractedSection>,
    pub sub_section_analysis: Vec<SubSectionAnalysis>,
}

impl RankingResult {
    /// Check whether nothing was ranked.
    pub fn is_empty(&self) -> bool {
        self.extracted_sections.is_empty() && self.sub_section_analysis.is_empty()
    }
}

/// Run metadata attached around a ranking result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionMetadata {
    pub input_documents: Vec<String>,
    pub persona: String,
    pub job_to_be_done: String,
    pub processing_timestamp: String,
}

/// A ranking result with its metadata block, as persisted per collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionOutput {
    pub metadata: CollectionMetadata,
    #[serde(flatten)]
    pub result: RankingResult,
}
