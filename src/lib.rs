//! # pdfsift
//!
//! Document outline reconstruction and persona-driven section ranking
//! over positioned PDF text.
//!
//! The crate consumes the per-page layout an external PDF text extractor
//! produces (blocks of spans, or a flat word list) and offers two pipelines:
//!
//! - **Outline**: title plus `H1`..`H9` headings with pages, via a
//!   deterministic rule engine or a pretrained random-forest model.
//! - **Ranking**: split a collection into heading-led sections, score them
//!   against a persona + task query, optionally let a language model
//!   reorder the best candidates, and report the top sections.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfsift::{extract_outline_from_file, render};
//!
//! fn main() -> pdfsift::Result<()> {
//!     let outline = extract_outline_from_file("layouts/file01.json")?;
//!     println!("{}", render::to_json(&outline, render::JsonFormat::Pretty)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Two heading strategies** behind one [`HeadingClassifier`] trait
//! - **Shared feature schema** for rules and the statistical model
//! - **Tagged fallbacks**: reports say which stage produced the answer
//! - **Parallel processing**: documents are handled on a Rayon pool

pub mod error;
pub mod model;
pub mod outline;
pub mod parser;
pub mod rank;
pub mod render;

// Re-export commonly used types
pub use error::{Error, Result};
pub use model::{
    DocumentLayout, DocumentStructure, HeadingLevel, LineLabel, Outline, OutlineEntry,
    OutlineReport, PageLayout, RankingResult, Section, TitleSource,
};
pub use outline::{
    ForestModel, HeadingClassifier, OutlineExtractor, RuleEngine, RuleOptions,
    StatisticalClassifier,
};
pub use parser::{
    FeatureExtractor, FeatureVector, JsonLayoutSource, LayoutSource, LineReconstructor,
    MemoryLayoutSource,
};
pub use rank::{
    LlmReranker, OnnxCrossEncoder, RankingOptions, RankingPipeline, RankingReport,
    RelevanceModel, SectionSegmenter, SegmentOptions,
};
pub use render::JsonFormat;

use std::path::Path;
use std::sync::Arc;

/// Outline a layout with the default rule engine.
///
/// # Example
///
/// ```no_run
/// use pdfsift::{extract_outline, parser::layout_from_file};
///
/// let layout = layout_from_file("layouts/file01.json").unwrap();
/// let outline = extract_outline(&layout);
/// println!("{}", outline.title);
/// ```
pub fn extract_outline(layout: &DocumentLayout) -> Outline {
    RuleEngine::default().outline(layout).outline
}

/// Load a layout JSON file and outline it with the default rule engine.
pub fn extract_outline_from_file<P: AsRef<Path>>(path: P) -> Result<Outline> {
    let layout = parser::layout_from_file(path)?;
    Ok(extract_outline(&layout))
}

/// Outline a layout with a pretrained heading model.
///
/// Fails only if the model cannot be loaded.
pub fn extract_outline_with_model<P: AsRef<Path>>(
    layout: &DocumentLayout,
    model_path: P,
) -> Result<Outline> {
    let classifier = StatisticalClassifier::from_file(model_path)?;
    Ok(classifier.outline(layout).outline)
}

/// Split a layout into heading-led sections with default options.
pub fn segment_document(layout: &DocumentLayout) -> DocumentStructure {
    SectionSegmenter::default().segment(layout)
}

/// Rank a collection's sections with the cross-encoder exported to
/// `model_dir` and no language model.
///
/// Fails if the model cannot be loaded.
///
/// # Example
///
/// ```no_run
/// use pdfsift::{rank::DEFAULT_CROSS_ENCODER_DIR, rank_documents, JsonLayoutSource};
///
/// let source = JsonLayoutSource::new("layouts");
/// let docs = vec!["south_of_france.pdf".to_string()];
/// let result = rank_documents(
///     &source,
///     &docs,
///     "Travel Planner",
///     "Plan a trip",
///     DEFAULT_CROSS_ENCODER_DIR,
/// )?;
/// # Ok::<(), pdfsift::Error>(())
/// ```
pub fn rank_documents<P: AsRef<Path>>(
    source: &dyn LayoutSource,
    documents: &[String],
    persona: &str,
    task: &str,
    model_dir: P,
) -> Result<RankingResult> {
    let scorer = OnnxCrossEncoder::from_dir(model_dir)?;
    let pipeline = RankingPipeline::new(Arc::new(scorer), RankingOptions::default());
    Ok(pipeline.run(source, documents, persona, task)?.result)
}
