//! First-stage relevance ranking.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::options::RankingOptions;
use crate::error::{Error, Result};
use crate::model::Section;

/// Default cross-encoder model name.
pub const DEFAULT_CROSS_ENCODER_MODEL: &str = "cross-encoder/ms-marco-MiniLM-L-6-v2";

/// Scores passages against a query; higher is more relevant.
///
/// Implementations are shared read-only across the whole run.
pub trait RelevanceModel: Send + Sync {
    /// Short model name for logging.
    fn name(&self) -> &str;

    /// One score per passage, in passage order.
    fn score(&self, query: &str, passages: &[String]) -> Result<Vec<f32>>;
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    query: &'a str,
    texts: &'a [String],
    truncate: bool,
}

#[derive(Deserialize)]
struct RerankScore {
    index: usize,
    score: f32,
}

/// Client for a hosted cross-encoder `/rerank` endpoint.
#[derive(Debug, Clone)]
pub struct CrossEncoderClient {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
}

impl CrossEncoderClient {
    /// Connect to the service at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: DEFAULT_CROSS_ENCODER_MODEL.to_string(),
            client,
        })
    }

    /// Name the model the service hosts, for logs.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

impl RelevanceModel for CrossEncoderClient {
    fn name(&self) -> &str {
        &self.model
    }

    fn score(&self, query: &str, passages: &[String]) -> Result<Vec<f32>> {
        if passages.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(format!("{}/rerank", self.base_url))
            .json(&RerankRequest {
                query,
                texts: passages,
                truncate: true,
            })
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::Scorer(format!("{}: {} {}", self.base_url, status, body)));
        }

        let ranked: Vec<RerankScore> = response.json()?;
        let mut scores = vec![None; passages.len()];
        for r in ranked {
            match scores.get_mut(r.index) {
                Some(slot) => *slot = Some(r.score),
                None => {
                    return Err(Error::Scorer(format!(
                        "score for passage {} of {}",
                        r.index,
                        passages.len()
                    )))
                }
            }
        }
        scores
            .into_iter()
            .enumerate()
            .map(|(i, s)| s.ok_or_else(|| Error::Scorer(format!("no score for passage {i}"))))
            .collect()
    }
}

/// Whether the heading blacklist took effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    /// Blacklisted headings were dropped
    Applied { removed: usize },
    /// Filtering would have left nothing, so the unfiltered order was kept
    Skipped,
}

/// Candidates after semantic ranking, best first.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticOutcome {
    pub candidates: Vec<Section>,
    pub filter: FilterOutcome,
}

/// The persona + task query every section is scored against.
pub fn build_query(persona: &str, task: &str) -> String {
    format!("{persona} needs to: {task}")
}

/// Scores, filters and truncates the candidate pool.
#[derive(Debug, Clone)]
pub struct SemanticRanker {
    blacklist: HashSet<String>,
    limit: usize,
}

impl SemanticRanker {
    pub fn new(options: &RankingOptions) -> Self {
        Self {
            blacklist: options.blacklist.iter().cloned().collect(),
            limit: options.candidate_limit,
        }
    }

    fn is_blacklisted(&self, section: &Section) -> bool {
        self.blacklist
            .contains(&section.heading.trim().to_lowercase())
    }

    /// Rank `sections` for the query, best first.
    ///
    /// Ties keep their input order. Scorer failures propagate.
    pub fn rank(
        &self,
        model: &dyn RelevanceModel,
        query: &str,
        sections: Vec<Section>,
    ) -> Result<SemanticOutcome> {
        let passages: Vec<String> = sections.iter().map(Section::passage).collect();
        let scores = model.score(query, &passages)?;
        if scores.len() != sections.len() {
            return Err(Error::Scorer(format!(
                "{} returned {} scores for {} passages",
                model.name(),
                scores.len(),
                sections.len()
            )));
        }

        // NaN ranks below every real score.
        let key = |score: f32| if score.is_nan() { f32::NEG_INFINITY } else { score };
        let mut scored: Vec<(Section, f32)> = sections.into_iter().zip(scores).collect();
        scored.sort_by(|a, b| key(b.1).total_cmp(&key(a.1)));
        let ranked: Vec<Section> = scored.into_iter().map(|(s, _)| s).collect();

        let total = ranked.len();
        let filtered: Vec<Section> = ranked
            .iter()
            .filter(|s| !self.is_blacklisted(s))
            .cloned()
            .collect();

        let (mut candidates, filter) = if filtered.is_empty() {
            log::info!("Heading filter would remove every candidate; keeping all");
            (ranked, FilterOutcome::Skipped)
        } else {
            let removed = total - filtered.len();
            (filtered, FilterOutcome::Applied { removed })
        };
        candidates.truncate(self.limit);

        log::debug!(
            "Semantic ranking with {}: {} of {} candidates kept",
            model.name(),
            candidates.len(),
            total
        );
        Ok(SemanticOutcome { candidates, filter })
    }
}
