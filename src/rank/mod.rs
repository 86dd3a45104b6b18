//! Persona-driven section ranking.
//!
//! Documents are split into heading-led sections, scored against a
//! persona + task query by a pretrained cross-encoder, optionally reordered
//! by a language model, and the top sections are reported.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use pdfsift::parser::JsonLayoutSource;
//! use pdfsift::rank::{
//!     OnnxCrossEncoder, RankingOptions, RankingPipeline, DEFAULT_CROSS_ENCODER_DIR,
//! };
//!
//! let source = JsonLayoutSource::new("layouts");
//! let scorer = OnnxCrossEncoder::from_dir(DEFAULT_CROSS_ENCODER_DIR)?;
//! let pipeline = RankingPipeline::new(Arc::new(scorer), RankingOptions::default());
//! let docs = vec!["guide.pdf".to_string()];
//! let report = pipeline.run(&source, &docs, "Travel Planner", "Plan a 4-day trip")?;
//! println!("{} sections ranked", report.result.extracted_sections.len());
//! # Ok::<(), pdfsift::Error>(())
//! ```

mod cross_encoder;
mod llm;
mod options;
mod pipeline;
mod segmenter;
mod semantic;

pub use cross_encoder::{OnnxCrossEncoder, DEFAULT_CROSS_ENCODER_DIR};
pub use llm::{
    merge_order, parse_indices, ChatModel, FallbackReason, LlmReranker, OllamaClient,
    RankingStage, RerankOutcome, DEFAULT_LLM_MODEL, DEFAULT_OLLAMA_HOST,
};
pub use options::{RankingOptions, SegmentOptions, DEFAULT_BLACKLIST};
pub use pipeline::{RankingPipeline, RankingReport};
pub use segmenter::SectionSegmenter;
pub use semantic::{
    build_query, CrossEncoderClient, FilterOutcome, RelevanceModel, SemanticOutcome,
    SemanticRanker, DEFAULT_CROSS_ENCODER_MODEL,
};
