//! Integration tests for the ranking pipeline.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use pdfsift::error::{Error, Result};
use pdfsift::model::{
    CollectionMetadata, CollectionOutput, DocumentLayout, LayoutBlock, LayoutLine, PageLayout,
    Span,
};
use pdfsift::rank::{
    ChatModel, FallbackReason, FilterOutcome, LlmReranker, RankingOptions, RankingPipeline,
    RankingStage, RelevanceModel,
};
use pdfsift::render::{to_json, JsonFormat};
use pdfsift::MemoryLayoutSource;

/// Scores a passage by its heading line.
struct HeadingScores {
    scores: HashMap<&'static str, f32>,
    calls: AtomicUsize,
}

impl HeadingScores {
    fn new(scores: &[(&'static str, f32)]) -> Self {
        Self {
            scores: scores.iter().copied().collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl RelevanceModel for HeadingScores {
    fn name(&self) -> &str {
        "heading-scores"
    }

    fn score(&self, _query: &str, passages: &[String]) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(passages
            .iter()
            .map(|p| {
                let heading = p.lines().next().unwrap_or_default();
                self.scores.get(heading).copied().unwrap_or(0.0)
            })
            .collect())
    }
}

/// Replies with a canned answer and records the prompts it saw.
struct ScriptedChat {
    reply: std::result::Result<String, String>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedChat {
    fn new(reply: std::result::Result<&str, &str>) -> (Self, Arc<Mutex<Vec<String>>>) {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let chat = Self {
            reply: reply.map(str::to_string).map_err(str::to_string),
            prompts: Arc::clone(&prompts),
        };
        (chat, prompts)
    }
}

impl ChatModel for ScriptedChat {
    fn name(&self) -> &str {
        "scripted"
    }

    fn chat(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map_err(Error::Other)
    }
}

fn block(text: &str, size: f32) -> LayoutBlock {
    LayoutBlock::new([72.0, 0.0, 500.0, 20.0])
        .with_line(LayoutLine::single(Span::new(text, size, "Times")))
}

fn page(blocks: Vec<LayoutBlock>) -> PageLayout {
    let mut p = PageLayout::letter();
    for b in blocks {
        p.add_block(b);
    }
    p
}

fn collection() -> MemoryLayoutSource {
    let mut a = DocumentLayout::new("a.pdf");
    a.add_page(page(vec![
        block("Beaches", 18.0),
        block("Sandy coves near Nice.", 10.0),
        block("Nightlife", 18.0),
        block("Clubs and bars.", 10.0),
    ]));
    a.add_page(page(vec![block("Open until dawn.", 10.0)]));

    let mut b = DocumentLayout::new("b.pdf");
    b.add_page(page(vec![
        block("Welcome to the region.", 10.0),
        block("Cuisine", 18.0),
        block("Try local seafood.", 10.0),
    ]));

    MemoryLayoutSource::new().with(a).with(b)
}

fn documents() -> Vec<String> {
    vec!["a.pdf".into(), "c.pdf".into(), "b.pdf".into()]
}

fn scores() -> Arc<HeadingScores> {
    Arc::new(HeadingScores::new(&[
        ("Beaches", 0.9),
        ("Nightlife", 0.2),
        ("Introduction", 0.95),
        ("Cuisine", 0.5),
    ]))
}

fn titles(report: &pdfsift::RankingReport) -> Vec<&str> {
    report
        .result
        .extracted_sections
        .iter()
        .map(|s| s.section_title.as_str())
        .collect()
}

#[test]
fn test_extract_structures_keeps_order() {
    let pipeline = RankingPipeline::new(scores(), RankingOptions::new().with_threads(2));
    let structures = pipeline
        .extract_structures(&collection(), &documents())
        .unwrap();

    assert_eq!(structures.len(), 3);
    assert_eq!(structures[0].title, "a.pdf");
    assert_eq!(structures[0].sections.len(), 2);
    assert_eq!(structures[0].sections[0].page, 0);
    assert_eq!(structures[0].sections[1].heading, "Nightlife");
    assert_eq!(structures[0].sections[1].content, "Clubs and bars. Open until dawn.");
    assert_eq!(structures[0].sections[1].page, 1);
    assert_eq!(structures[1].title, "c.pdf");
    assert!(structures[1].sections.is_empty());
    assert_eq!(structures[2].sections[0].heading, "Introduction");
}

#[test]
fn test_semantic_only() {
    let pipeline = RankingPipeline::new(scores(), RankingOptions::default());
    let report = pipeline
        .run(&collection(), &documents(), "Travel Planner", "Plan a trip")
        .unwrap();

    assert_eq!(report.candidate_count, 4);
    assert_eq!(report.filter, FilterOutcome::Applied { removed: 1 });
    assert_eq!(
        report.stage,
        RankingStage::Semantic {
            reason: FallbackReason::Disabled
        }
    );
    assert_eq!(titles(&report), vec!["Beaches", "Cuisine", "Nightlife"]);

    let first = &report.result.extracted_sections[0];
    assert_eq!(first.document, "a.pdf");
    assert_eq!(first.importance_rank, 1);
    assert_eq!(report.result.sub_section_analysis.len(), 3);
    assert_eq!(
        report.result.sub_section_analysis[1].refined_text,
        "Try local seafood."
    );
}

#[test]
fn test_llm_order_used() {
    let (chat, prompts) = ScriptedChat::new(Ok("[2, 0]"));
    let pipeline = RankingPipeline::new(scores(), RankingOptions::default())
        .with_reranker(LlmReranker::new(Box::new(chat)));
    let report = pipeline
        .run(&collection(), &documents(), "Travel Planner", "Plan a trip")
        .unwrap();

    assert_eq!(report.stage, RankingStage::Llm);
    assert_eq!(titles(&report), vec!["Nightlife", "Beaches", "Cuisine"]);
    assert_eq!(
        report
            .result
            .extracted_sections
            .iter()
            .map(|s| s.importance_rank)
            .collect::<Vec<_>>(),
        vec![1, 2, 3]
    );

    let prompts = prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("0: Beaches - Sandy coves near Nice...."));
    assert!(prompts[0].contains("2: Nightlife - Clubs and bars. Open until dawn...."));
    assert!(!prompts[0].contains("Introduction -"));
}

#[test]
fn test_llm_failures_keep_semantic_order() {
    let cases = [
        (Err("connection refused"), FallbackReason::Transport),
        (Ok("Sure! [1, 0]"), FallbackReason::NotJson),
        (Ok("[\"1\", \"0\"]"), FallbackReason::WrongShape),
    ];
    for (reply, reason) in cases {
        let (chat, _) = ScriptedChat::new(reply);
        let pipeline = RankingPipeline::new(scores(), RankingOptions::default())
            .with_reranker(LlmReranker::new(Box::new(chat)));
        let report = pipeline
            .run(&collection(), &documents(), "Travel Planner", "Plan a trip")
            .unwrap();

        assert_eq!(report.stage, RankingStage::Semantic { reason });
        assert_eq!(titles(&report), vec!["Beaches", "Cuisine", "Nightlife"]);
    }
}

#[test]
fn test_empty_collection_skips_models() {
    let relevance = scores();
    let (chat, prompts) = ScriptedChat::new(Ok("[0]"));
    let pipeline = RankingPipeline::new(relevance.clone(), RankingOptions::default())
        .with_reranker(LlmReranker::new(Box::new(chat)));

    let report = pipeline
        .run(&MemoryLayoutSource::new(), &["gone.pdf".to_string()], "p", "t")
        .unwrap();

    assert!(report.result.is_empty());
    assert_eq!(relevance.calls.load(Ordering::SeqCst), 0);
    assert!(prompts.lock().unwrap().is_empty());
}

#[test]
fn test_collection_output_json() {
    let pipeline = RankingPipeline::new(scores(), RankingOptions::default());
    let report = pipeline
        .run(&collection(), &documents(), "Travel Planner", "Plan a trip")
        .unwrap();

    let output = CollectionOutput {
        metadata: CollectionMetadata {
            input_documents: documents(),
            persona: "Travel Planner".into(),
            job_to_be_done: "Plan a trip".into(),
            processing_timestamp: "2025-07-10T12:00:00".into(),
        },
        result: report.result,
    };
    let json = to_json(&output, JsonFormat::Pretty).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["metadata"]["persona"], "Travel Planner");
    assert_eq!(value["extracted_sections"][0]["section_title"], "Beaches");
    assert_eq!(value["extracted_sections"][0]["page_number"], 0);
    assert_eq!(value["sub_section_analysis"][0]["document"], "a.pdf");
}
