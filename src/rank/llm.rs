//! Best-effort LLM reranking.
//!
//! The model is asked for a bare JSON array of candidate indices. Anything
//! else, including a transport error, falls back to the semantic order.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::Section;

/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

/// Default chat model.
pub const DEFAULT_LLM_MODEL: &str = "tinyllama:1.1b-chat-v0.6-q2_K";

/// Characters of section content shown per candidate in the prompt.
const PREVIEW_CHARS: usize = 150;

/// A chat-style language model: prompt in, raw text out.
pub trait ChatModel: Send + Sync {
    /// Model name for logging.
    fn name(&self) -> &str;

    /// Send one user message and return the reply text.
    fn chat(&self, prompt: &str) -> Result<String>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    format: &'static str,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Blocking client for Ollama's `/api/chat`, in JSON mode.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    host: String,
    model: String,
    client: reqwest::blocking::Client,
}

impl OllamaClient {
    /// Create a client for `host` with a request timeout.
    pub fn new(host: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            host: host.into().trim_end_matches('/').to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            client,
        })
    }

    /// Use a different model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

impl ChatModel for OllamaClient {
    fn name(&self) -> &str {
        &self.model
    }

    fn chat(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            format: "json",
            stream: false,
        };

        let response: ChatResponse = self
            .client
            .post(format!("{}/api/chat", self.host))
            .json(&request)
            .send()?
            .error_for_status()?
            .json()?;
        Ok(response.message.content)
    }
}

/// Why the semantic order was kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// No language model configured
    Disabled,
    /// The request failed
    Transport,
    /// The reply was not JSON
    NotJson,
    /// The reply was JSON but not an array of integers
    WrongShape,
    /// The reply was an empty array
    Empty,
}

/// Which stage produced the final order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingStage {
    Llm,
    Semantic { reason: FallbackReason },
}

impl RankingStage {
    pub fn is_fallback(self) -> bool {
        matches!(self, RankingStage::Semantic { .. })
    }
}

/// A permutation of the candidate indices and the stage that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RerankOutcome {
    pub order: Vec<usize>,
    pub stage: RankingStage,
}

impl RerankOutcome {
    /// The identity order, tagged with why reranking did not happen.
    pub fn fallback(len: usize, reason: FallbackReason) -> Self {
        Self {
            order: (0..len).collect(),
            stage: RankingStage::Semantic { reason },
        }
    }
}

/// Parse a reply that must be exactly a JSON array of integers.
///
/// Integers above `i64::MAX` saturate; they are out of range for any
/// candidate list and get skipped by [`merge_order`].
pub fn parse_indices(reply: &str) -> std::result::Result<Vec<i64>, FallbackReason> {
    let value: serde_json::Value =
        serde_json::from_str(reply).map_err(|_| FallbackReason::NotJson)?;
    let items = value.as_array().ok_or(FallbackReason::WrongShape)?;
    let indices = items
        .iter()
        .map(|v| {
            v.as_i64()
                .or_else(|| v.as_u64().map(|_| i64::MAX))
                .ok_or(FallbackReason::WrongShape)
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;
    if indices.is_empty() {
        return Err(FallbackReason::Empty);
    }
    Ok(indices)
}

/// Returned indices first, then every candidate they missed, in order.
///
/// Out-of-range, negative and repeated indices are skipped, so the result
/// is always a permutation of `0..len`.
pub fn merge_order(indices: &[i64], len: usize) -> Vec<usize> {
    let mut seen = HashSet::with_capacity(len);
    let mut order = Vec::with_capacity(len);
    for &i in indices {
        if let Ok(i) = usize::try_from(i) {
            if i < len && seen.insert(i) {
                order.push(i);
            }
        }
    }
    order.extend((0..len).filter(|i| !seen.contains(i)));
    order
}

/// Asks a chat model to reorder semantic candidates by usefulness.
pub struct LlmReranker {
    model: Box<dyn ChatModel>,
}

impl LlmReranker {
    pub fn new(model: Box<dyn ChatModel>) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Render the reranking prompt.
    pub fn prompt(persona: &str, task: &str, candidates: &[Section]) -> String {
        let listing = candidates
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let preview: String = s.content.chars().take(PREVIEW_CHARS).collect();
                format!("{i}: {} - {preview}...", s.heading)
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "\nYou are an expert {persona}. Your task is to analyze the following sections of \
             text and re-rank them based on their usefulness for accomplishing this specific \
             job: \"{task}\".\n\n\
             **CRITICAL RULES:**\n\
             1.  Your entire response MUST be a valid JSON list of the original indices, \
             ordered from most useful to least useful.\n\
             2.  Do not include any other text, explanations, or markdown formatting.\n\
             3.  The list should start with `[` and end with `]`.\n\n\
             ---\n\
             **SECTIONS TO RANK (with their original index):**\n\
             {listing}\n\
             ---\n\n\
             Produce the JSON list of indices now.\n\
             Example: [3, 1, 0, 2]\n"
        )
    }

    /// Rerank `candidates`. Never fails; failures keep the input order.
    pub fn rerank(&self, persona: &str, task: &str, candidates: &[Section]) -> RerankOutcome {
        if candidates.is_empty() {
            return RerankOutcome::fallback(0, FallbackReason::Empty);
        }

        let prompt = Self::prompt(persona, task, candidates);
        let reply = match self.model.chat(&prompt) {
            Ok(reply) => reply,
            Err(e) => {
                log::warn!("LLM reranking failed ({}): {}", self.model.name(), e);
                return RerankOutcome::fallback(candidates.len(), FallbackReason::Transport);
            }
        };

        match parse_indices(reply.trim()) {
            Ok(indices) => {
                log::info!("LLM reranked {} candidates", candidates.len());
                RerankOutcome {
                    order: merge_order(&indices, candidates.len()),
                    stage: RankingStage::Llm,
                }
            }
            Err(reason) => {
                log::warn!("LLM reply unusable ({:?}); keeping semantic order", reason);
                RerankOutcome::fallback(candidates.len(), reason)
            }
        }
    }
}
