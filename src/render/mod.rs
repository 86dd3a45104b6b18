//! Rendering of outlines and ranking results.

mod json;
mod text;

pub use json::{to_json, JsonFormat};
pub use text::{outline_to_text, ranking_to_text};
