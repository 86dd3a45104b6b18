//! Model-driven heading classification.

use std::path::Path;
use std::sync::Arc;

use super::assembler::OutlineAssembler;
use super::classifier::HeadingClassifier;
use super::forest::ForestModel;
use crate::error::Result;
use crate::model::{
    DocumentLayout, HeadingCandidate, HeadingLevel, LineLabel, OutlineReport, TitleSource,
};
use crate::parser::{FeatureExtractor, FeatureVector, Line, LineReconstructor};

/// Lines predicted as title must start above this fraction of the page.
pub const DEFAULT_TITLE_CUTOFF: f32 = 0.5;

/// Heading classifier backed by a pretrained [`ForestModel`].
#[derive(Debug, Clone)]
pub struct StatisticalClassifier {
    model: Arc<ForestModel>,
    features: FeatureExtractor,
    lines: LineReconstructor,
    title_cutoff: f32,
}

impl StatisticalClassifier {
    /// Wrap a loaded model.
    pub fn new(model: Arc<ForestModel>) -> Self {
        Self {
            model,
            features: FeatureExtractor::default(),
            lines: LineReconstructor::new(),
            title_cutoff: DEFAULT_TITLE_CUTOFF,
        }
    }

    /// Load the model from disk. Fails if the file is missing or its
    /// feature schema is not one this crate produces.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(Arc::new(ForestModel::load(path)?)))
    }

    /// Set the vertical cutoff for accepting title predictions.
    pub fn with_title_cutoff(mut self, cutoff: f32) -> Self {
        self.title_cutoff = cutoff;
        self
    }

    pub fn model(&self) -> &ForestModel {
        &self.model
    }
}

impl HeadingClassifier for StatisticalClassifier {
    fn name(&self) -> &str {
        "statistical"
    }

    /// Model prediction with positional guards: titles only count on the
    /// first page, and a title in the lower part of it becomes H1.
    fn classify(&self, _line: &Line, features: &FeatureVector, page_index: usize) -> LineLabel {
        match self.model.predict(features) {
            LineLabel::Title if page_index != 0 => LineLabel::Paragraph,
            LineLabel::Title if features.y_position >= self.title_cutoff => {
                LineLabel::Heading(HeadingLevel::H1)
            }
            label => label,
        }
    }

    fn outline(&self, doc: &DocumentLayout) -> OutlineReport {
        if !doc.has_text() {
            log::warn!("{}: no extractable text", doc.name);
            return OutlineReport::empty();
        }

        let pages = self.lines.document(doc);
        let mut title_parts: Vec<&str> = Vec::new();
        let mut candidates = Vec::new();

        for (page, line, features) in self.features.document(&pages) {
            match self.classify(line, &features, page.index) {
                LineLabel::Title => title_parts.push(&line.text),
                LineLabel::Heading(level) => candidates.push(HeadingCandidate::new(
                    line.text.clone(),
                    level,
                    page.index as u32,
                    line.font_size(),
                )),
                LineLabel::Paragraph => {}
            }
        }

        let mut title = title_parts.join(" ");
        let title_source = if !title.is_empty() {
            TitleSource::Predicted
        } else if let Some(pos) = candidates
            .iter()
            .position(|c| c.level == HeadingLevel::H1 && c.page == 0)
        {
            title = candidates.remove(pos).text;
            TitleSource::PromotedHeading
        } else {
            TitleSource::Missing
        };

        log::debug!(
            "{}: {} headings, title {:?}",
            doc.name,
            candidates.len(),
            title_source
        );

        OutlineReport {
            outline: OutlineAssembler::new().assemble(title, candidates),
            title_source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PageLayout, Word};
    use crate::outline::forest::tests::SMALL_MODEL;

    fn classifier() -> StatisticalClassifier {
        StatisticalClassifier::new(Arc::new(ForestModel::from_json(SMALL_MODEL).unwrap()))
    }

    fn words_line(page: &mut PageLayout, text: &str, top: f32, size: f32) {
        let mut x = 72.0;
        for w in text.split_whitespace() {
            page.add_word(Word::new(w, x, x + 40.0, top, "Helvetica", size));
            x += 45.0;
        }
    }

    fn doc(pages: Vec<PageLayout>) -> DocumentLayout {
        let mut d = DocumentLayout::new("flyer.pdf");
        for p in pages {
            d.add_page(p);
        }
        d
    }

    #[test]
    fn test_title_fragments_join() {
        let mut p = PageLayout::new(600.0, 800.0);
        words_line(&mut p, "Annual Community", 60.0, 24.0);
        words_line(&mut p, "Garden Report", 90.0, 24.0);
        words_line(&mut p, "Plots", 300.0, 12.0);
        words_line(&mut p, "Most plots were planted in spring.", 330.0, 10.0);

        let report = classifier().outline(&doc(vec![p]));
        assert_eq!(report.title_source, TitleSource::Predicted);
        assert_eq!(report.outline.title, "Annual Community Garden Report");
        assert_eq!(report.outline.outline.len(), 1);
        assert_eq!(report.outline.outline[0].text, "Plots");
        assert_eq!(report.outline.outline[0].level, HeadingLevel::new(2));
        assert_eq!(report.outline.outline[0].page, 0);
    }

    #[test]
    fn test_low_title_becomes_h1() {
        let mut p = PageLayout::new(600.0, 800.0);
        words_line(&mut p, "Some body text", 100.0, 10.0);
        words_line(&mut p, "HOPE TO SEE YOU THERE", 450.0, 24.0);

        let c = classifier();
        let pages = LineReconstructor::new().document(&doc(vec![p.clone()]));
        let rows = FeatureExtractor::default().document(&pages);
        let (page, line, fv) = &rows[1];
        // Raw model says Title, positional guard says H1.
        assert_eq!(c.model().predict(fv), LineLabel::Title);
        assert_eq!(
            c.classify(line, fv, page.index),
            LineLabel::Heading(HeadingLevel::H1)
        );

        // No title survives, so the first-page H1 is promoted.
        let report = c.outline(&doc(vec![p]));
        assert_eq!(report.title_source, TitleSource::PromotedHeading);
        assert_eq!(report.outline.title, "HOPE TO SEE YOU THERE");
        assert!(report.outline.outline.is_empty());
    }

    #[test]
    fn test_title_cutoff_configurable() {
        let mut p = PageLayout::new(600.0, 800.0);
        words_line(&mut p, "Some body text", 100.0, 10.0);
        words_line(&mut p, "HOPE TO SEE YOU THERE", 450.0, 24.0);

        let report = classifier().with_title_cutoff(0.6).outline(&doc(vec![p]));
        assert_eq!(report.title_source, TitleSource::Predicted);
        assert_eq!(report.outline.title, "HOPE TO SEE YOU THERE");
    }

    #[test]
    fn test_title_on_later_page_ignored() {
        let mut first = PageLayout::new(600.0, 800.0);
        words_line(&mut first, "Body only", 100.0, 10.0);
        let mut second = PageLayout::new(600.0, 800.0);
        words_line(&mut second, "Big Banner", 60.0, 24.0);

        let report = classifier().outline(&doc(vec![first, second]));
        assert_eq!(report.title_source, TitleSource::Missing);
        assert_eq!(report.outline.title, "");
        assert!(report.outline.outline.is_empty());
    }

    #[test]
    fn test_no_text_fails_soft() {
        let report = classifier().outline(&doc(vec![PageLayout::letter()]));
        assert_eq!(report, OutlineReport::empty());
    }
}
