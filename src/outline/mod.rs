//! Outline reconstruction: heading classification and assembly.
//!
//! Two interchangeable [`HeadingClassifier`] strategies are provided:
//! the deterministic [`RuleEngine`] and the model-backed
//! [`StatisticalClassifier`]. Callers pick one when they build an
//! [`OutlineExtractor`]; the choice is never made per line.

mod assembler;
mod classifier;
mod forest;
mod rules;
mod statistical;

pub use assembler::OutlineAssembler;
pub use classifier::HeadingClassifier;
pub use forest::ForestModel;
pub use rules::{RuleEngine, RuleOptions, DEFAULT_ANCHOR_PHRASE};
pub use statistical::{StatisticalClassifier, DEFAULT_TITLE_CUTOFF};

use std::sync::Arc;

use rayon::prelude::*;

use crate::model::{Outline, OutlineReport};
use crate::parser::LayoutSource;

/// Runs one classifier strategy over documents.
#[derive(Clone)]
pub struct OutlineExtractor {
    classifier: Arc<dyn HeadingClassifier>,
}

impl OutlineExtractor {
    /// Use the given strategy.
    pub fn new(classifier: Arc<dyn HeadingClassifier>) -> Self {
        Self { classifier }
    }

    /// Use the rule engine with default options.
    pub fn rules() -> Self {
        Self::new(Arc::new(RuleEngine::default()))
    }

    pub fn classifier(&self) -> &dyn HeadingClassifier {
        self.classifier.as_ref()
    }

    /// Outline one document loaded from `source`.
    ///
    /// An unreadable document yields the empty outline.
    pub fn extract(&self, source: &dyn LayoutSource, document: &str) -> OutlineReport {
        match source.load(document) {
            Ok(layout) => self.classifier.outline(&layout),
            Err(e) => {
                log::warn!("Skipping {}: {}", document, e);
                OutlineReport::empty()
            }
        }
    }

    /// Outline several documents in parallel, keeping input order.
    pub fn extract_all(&self, source: &dyn LayoutSource, documents: &[String]) -> Vec<Outline> {
        documents
            .par_iter()
            .map(|doc| {
                log::debug!("Outlining {} with {}", doc, self.classifier.name());
                self.extract(source, doc).outline
            })
            .collect()
    }
}

impl Default for OutlineExtractor {
    fn default() -> Self {
        Self::rules()
    }
}
