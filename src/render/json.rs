//! JSON rendering for outlines and ranking results.

use serde::Serialize;

use crate::error::{Error, Result};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize any result value to JSON.
pub fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HeadingLevel, Outline, OutlineEntry, RankingResult};

    fn outline() -> Outline {
        Outline {
            title: "Overview  ".to_string(),
            outline: vec![OutlineEntry {
                level: HeadingLevel::H1,
                text: "1. Introduction ".to_string(),
                page: 0,
            }],
        }
    }

    #[test]
    fn test_outline_pretty() {
        let json = to_json(&outline(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"level\": \"H1\""));
        assert!(json.contains("\"text\": \"1. Introduction \""));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_outline_compact() {
        let json = to_json(&outline(), JsonFormat::Compact).unwrap();
        assert_eq!(
            json,
            r#"{"title":"Overview  ","outline":[{"level":"H1","text":"1. Introduction ","page":0}]}"#
        );
    }

    #[test]
    fn test_empty_ranking() {
        let json = to_json(&RankingResult::default(), JsonFormat::Compact).unwrap();
        assert_eq!(json, r#"{"extracted_sections":[],"sub_section_analysis":[]}"#);
    }
}
