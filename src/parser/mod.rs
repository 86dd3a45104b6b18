//! Layout parsing: sources, line reconstruction and line features.

mod features;
mod lines;
mod source;

pub use features::{
    starts_with_heading_pattern, starts_with_numbering, FeatureColumn, FeatureExtractor,
    FeatureOptions, FeatureVector, StyleState, TextCase,
};
pub use lines::{Line, LineReconstructor, PageLines};
pub use source::{
    layout_from_bytes, layout_from_file, layout_from_reader, JsonLayoutSource, LayoutSource,
    MemoryLayoutSource,
};
