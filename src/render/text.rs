//! Plain text rendering for terminal output.

use crate::model::{Outline, RankingResult};

/// Render an outline as an indented heading list.
pub fn outline_to_text(outline: &Outline) -> String {
    let mut output = String::new();
    if !outline.title.trim().is_empty() {
        output.push_str(outline.title.trim());
        output.push('\n');
    }

    for entry in &outline.outline {
        let indent = "  ".repeat(entry.level.depth().saturating_sub(1) as usize);
        output.push_str(&format!(
            "{}{} {} (p. {})\n",
            indent,
            entry.level,
            entry.text.trim(),
            entry.page
        ));
    }
    output
}

/// Render ranked sections as a numbered list.
pub fn ranking_to_text(result: &RankingResult) -> String {
    result
        .extracted_sections
        .iter()
        .map(|s| {
            format!(
                "{:>2}. {} [{} p. {}]\n",
                s.importance_rank, s.section_title, s.document, s.page_number
            )
        })
        .collect()
}
