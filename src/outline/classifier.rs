//! The heading classifier seam.

use crate::model::{DocumentLayout, LineLabel, OutlineReport};
use crate::parser::{FeatureVector, Line};

/// A heading classification strategy.
///
/// Implementations are chosen once, when the caller builds its extractor,
/// and are shared read-only across document tasks.
pub trait HeadingClassifier: Send + Sync {
    /// Short strategy name for logging.
    fn name(&self) -> &str;

    /// Label a single line.
    fn classify(&self, line: &Line, features: &FeatureVector, page_index: usize) -> LineLabel;

    /// Build the outline of a whole document.
    ///
    /// Never fails: unusable input yields [`OutlineReport::empty`].
    fn outline(&self, doc: &DocumentLayout) -> OutlineReport;
}
