//! Data model types.
//!
//! Layout types describe the positioned text handed over by the PDF
//! extractor; outline and section types describe what the analysis produces.

mod layout;
mod outline;
mod section;

pub use layout::{DocumentLayout, LayoutBlock, LayoutLine, PageLayout, Span, Word, BOLD_FLAG};
pub use outline::{
    HeadingCandidate, HeadingLevel, LineLabel, Outline, OutlineEntry, OutlineReport, TitleSource,
    MAX_HEADING_LEVEL,
};
pub use section::{
    CollectionMetadata, CollectionOutput, DocumentStructure, ExtractedSection, RankedSection,
    RankingResult, Section, SubSectionAnalysis,
};
