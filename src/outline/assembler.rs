//! Final outline assembly.

use std::collections::HashSet;

use crate::model::{HeadingCandidate, Outline, OutlineEntry};

/// Orders, deduplicates and strips heading candidates into an [`Outline`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OutlineAssembler;

impl OutlineAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Assemble the outline.
    ///
    /// Candidates are stably sorted by page, so equal pages keep the order
    /// they were produced in. The first occurrence of each exact text wins.
    pub fn assemble(&self, title: impl Into<String>, mut candidates: Vec<HeadingCandidate>) -> Outline {
        candidates.sort_by_key(|c| c.page);

        let mut seen = HashSet::new();
        let outline = candidates
            .into_iter()
            .filter(|c| seen.insert(c.text.clone()))
            .map(OutlineEntry::from)
            .collect();

        Outline {
            title: title.into(),
            outline,
        }
    }
}
