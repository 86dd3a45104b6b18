//! End-to-end section ranking across a document collection.

use std::sync::Arc;

use rayon::prelude::*;

use super::llm::{FallbackReason, LlmReranker, RankingStage, RerankOutcome};
use super::options::RankingOptions;
use super::segmenter::SectionSegmenter;
use super::semantic::{build_query, FilterOutcome, RelevanceModel, SemanticRanker};
use crate::error::{Error, Result};
use crate::model::{
    DocumentStructure, ExtractedSection, RankedSection, RankingResult, Section, SubSectionAnalysis,
};
use crate::parser::LayoutSource;

/// A ranking result with the stages that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingReport {
    pub result: RankingResult,
    /// Stage whose order was used
    pub stage: RankingStage,
    /// Effect of the heading blacklist
    pub filter: FilterOutcome,
    /// Sections in the pool before semantic ranking
    pub candidate_count: usize,
}

impl RankingReport {
    fn empty() -> Self {
        Self {
            result: RankingResult::default(),
            stage: RankingStage::Semantic {
                reason: FallbackReason::Empty,
            },
            filter: FilterOutcome::Skipped,
            candidate_count: 0,
        }
    }
}

/// Segments documents, ranks their sections and formats the top ones.
pub struct RankingPipeline {
    relevance: Arc<dyn RelevanceModel>,
    reranker: Option<LlmReranker>,
    segmenter: SectionSegmenter,
    options: RankingOptions,
}

impl RankingPipeline {
    /// Create a pipeline without LLM reranking.
    pub fn new(relevance: Arc<dyn RelevanceModel>, options: RankingOptions) -> Self {
        Self {
            relevance,
            reranker: None,
            segmenter: SectionSegmenter::new(options.segment.clone()),
            options,
        }
    }

    /// Rerank semantic candidates with a language model.
    pub fn with_reranker(mut self, reranker: LlmReranker) -> Self {
        self.reranker = Some(reranker);
        self
    }

    pub fn options(&self) -> &RankingOptions {
        &self.options
    }

    /// Segment every document, one task per document, keeping input order.
    ///
    /// A document that cannot be loaded becomes an empty structure named
    /// after it.
    pub fn extract_structures(
        &self,
        source: &dyn LayoutSource,
        documents: &[String],
    ) -> Result<Vec<DocumentStructure>> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(threads) = self.options.threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder
            .build()
            .map_err(|e| Error::Other(format!("failed to start worker pool: {e}")))?;

        let structures: Vec<DocumentStructure> = pool.install(|| {
            documents
                .par_iter()
                .map(|name| match source.load(name) {
                    Ok(layout) => self.segmenter.segment(&layout),
                    Err(e) => {
                        log::warn!("Could not open {}: {}", name, e);
                        DocumentStructure::empty(name.clone())
                    }
                })
                .collect()
        });
        Ok(structures)
    }

    /// Rank the sections of already segmented documents.
    ///
    /// An empty pool returns an empty result without calling either
    /// ranker. LLM failures fall back to the semantic order; relevance
    /// model failures are returned.
    pub fn rank(
        &self,
        structures: Vec<DocumentStructure>,
        persona: &str,
        task: &str,
    ) -> Result<RankingReport> {
        let pool: Vec<Section> = structures
            .into_iter()
            .flat_map(|doc| {
                let title = doc.title;
                doc.sections.into_iter().map(move |mut s| {
                    s.source_doc = title.clone();
                    s
                })
            })
            .collect();

        if pool.is_empty() {
            log::info!("No sections were extracted from the documents");
            return Ok(RankingReport::empty());
        }
        let candidate_count = pool.len();

        let query = build_query(persona, task);
        log::info!(
            "Scoring {} sections for \"{}\" with {}",
            candidate_count,
            query,
            self.relevance.name()
        );
        let semantic =
            SemanticRanker::new(&self.options).rank(self.relevance.as_ref(), &query, pool)?;

        let rerank = match &self.reranker {
            Some(reranker) => reranker.rerank(persona, task, &semantic.candidates),
            None => RerankOutcome::fallback(semantic.candidates.len(), FallbackReason::Disabled),
        };

        let mut slots: Vec<Option<Section>> = semantic.candidates.into_iter().map(Some).collect();
        let ranked: Vec<RankedSection> = rerank
            .order
            .iter()
            .filter_map(|&i| slots.get_mut(i).and_then(Option::take))
            .take(self.options.extracted_count)
            .enumerate()
            .map(|(i, section)| RankedSection {
                section,
                importance_rank: i + 1,
            })
            .collect();

        let result = RankingResult {
            extracted_sections: ranked.iter().map(ExtractedSection::from).collect(),
            sub_section_analysis: ranked
                .iter()
                .take(self.options.subsection_count)
                .map(SubSectionAnalysis::from)
                .collect(),
        };

        Ok(RankingReport {
            result,
            stage: rerank.stage,
            filter: semantic.filter,
            candidate_count,
        })
    }

    /// Load, segment and rank a collection.
    pub fn run(
        &self,
        source: &dyn LayoutSource,
        documents: &[String],
        persona: &str,
        task: &str,
    ) -> Result<RankingReport> {
        let structures = self.extract_structures(source, documents)?;
        self.rank(structures, persona, task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts passage words that also occur in the query.
    struct WordOverlap;

    impl RelevanceModel for WordOverlap {
        fn name(&self) -> &str {
            "word-overlap"
        }

        fn score(&self, query: &str, passages: &[String]) -> Result<Vec<f32>> {
            let query = query.to_lowercase();
            let terms: Vec<&str> = query.split_whitespace().collect();
            Ok(passages
                .iter()
                .map(|p| {
                    p.to_lowercase()
                        .split_whitespace()
                        .filter(|w| terms.contains(w))
                        .count() as f32
                })
                .collect())
        }
    }

    fn structure(title: &str, headings: &[&str]) -> DocumentStructure {
        DocumentStructure {
            title: title.to_string(),
            sections: headings
                .iter()
                .enumerate()
                .map(|(i, h)| Section::new(*h, format!("about {h}"), i as u32, ""))
                .collect(),
        }
    }

    #[test]
    fn test_empty_pool_short_circuits() {
        let pipeline =
            RankingPipeline::new(Arc::new(WordOverlap), RankingOptions::default());
        let report = pipeline
            .rank(vec![DocumentStructure::empty("a.pdf")], "p", "t")
            .unwrap();
        assert!(report.result.is_empty());
        assert_eq!(report.candidate_count, 0);
    }

    #[test]
    fn test_sections_tagged_and_counted() {
        let options = RankingOptions::new()
            .with_extracted_count(3)
            .with_subsection_count(2);
        let pipeline = RankingPipeline::new(Arc::new(WordOverlap), options);
        let report = pipeline
            .rank(
                vec![
                    structure("a.pdf", &["Hotels", "Food"]),
                    structure("b.pdf", &["Beaches", "Museums"]),
                ],
                "Traveler",
                "find beaches",
            )
            .unwrap();

        assert_eq!(report.candidate_count, 4);
        assert_eq!(
            report.stage,
            RankingStage::Semantic {
                reason: FallbackReason::Disabled
            }
        );
        let top = &report.result.extracted_sections;
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].section_title, "Beaches");
        assert_eq!(top[0].document, "b.pdf");
        assert_eq!(top[0].page_number, 0);
        assert_eq!(
            top.iter().map(|s| s.importance_rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(report.result.sub_section_analysis.len(), 2);
        assert_eq!(report.result.sub_section_analysis[0].refined_text, "about Beaches");
    }
}
