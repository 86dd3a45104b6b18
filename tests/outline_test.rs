//! Integration tests for outline extraction.

use std::sync::Arc;

use pdfsift::model::{HeadingLevel, TitleSource};
use pdfsift::parser::{layout_from_bytes, FeatureExtractor, StyleState};
use pdfsift::render::{to_json, JsonFormat};
use pdfsift::{
    Error, ForestModel, HeadingClassifier, JsonLayoutSource, LineReconstructor, OutlineExtractor,
    RuleEngine, RuleOptions, StatisticalClassifier,
};

const BLOCK_LAYOUT: &str = r#"{
    "pages": [{
        "width": 600, "height": 800,
        "blocks": [
            {"bbox": [72, 50, 300, 70],
             "lines": [{"spans": [{"text": "1. Introduction", "size": 16, "font": "Arial-Bold", "flags": 16}]}]},
            {"bbox": [72, 80, 300, 95],
             "lines": [{"spans": [{"text": "This is body text.", "size": 10, "font": "Arial"}]}]}
        ]
    }]
}"#;

const WORD_LAYOUT: &str = r#"{
    "pages": [{
        "width": 600, "height": 800,
        "words": [
            {"text": "Introduction", "x0": 90, "x1": 170, "top": 50.4, "fontname": "Arial-Bold", "size": 16},
            {"text": "1.", "x0": 72, "x1": 84, "top": 49.6, "fontname": "Arial-Bold", "size": 16},
            {"text": "This", "x0": 72, "x1": 96, "top": 80, "fontname": "Arial", "size": 10},
            {"text": "is", "x0": 100, "x1": 110, "top": 80, "fontname": "Arial", "size": 10},
            {"text": "body", "x0": 114, "x1": 140, "top": 80, "fontname": "Arial", "size": 10},
            {"text": "text.", "x0": 144, "x1": 170, "top": 80, "fontname": "Arial", "size": 10}
        ]
    }]
}"#;

/// Multi-page manual: intro page, anchor page, then numbered chapters.
fn manual_layout() -> String {
    let block = |top: u32, text: &str, size: u32| {
        format!(
            r#"{{"bbox": [72, {top}, 500, {}], "lines": [{{"spans": [{{"text": "{text}", "size": {size}, "font": "Arial"}}]}}]}}"#,
            top + 20
        )
    };
    let page = |blocks: Vec<String>| {
        format!(r#"{{"width": 600, "height": 800, "blocks": [{}]}}"#, blocks.join(","))
    };

    let pages = [
        page(vec![
            block(40, "Overview", 24),
            block(100, "Foundation Level Extensions", 18),
            block(760, "Copyright notice in a very large footer font", 30),
        ]),
        page(vec![
            block(40, "Revision History", 16),
            block(80, "1. Old draft mention", 10),
        ]),
        page(vec![
            block(40, "1. Introduction to the Foundation Level Extensions", 18),
            block(80, "Body text about the extensions.", 10),
            block(120, "1.1 Intended Audience", 14),
        ]),
        page(vec![
            block(40, "2. Overview of the Syllabus", 18),
            block(80, "2.1 Business Outcomes", 14),
            block(120, "1.1 Intended Audience", 14),
        ]),
    ];
    format!(r#"{{"pages": [{}]}}"#, pages.join(","))
}

#[test]
fn test_single_page_block_layout() {
    let layout = layout_from_bytes("file01.pdf", BLOCK_LAYOUT.as_bytes()).unwrap();
    let report = RuleEngine::default().outline(&layout);

    assert_eq!(report.title_source, TitleSource::LargestSpan);
    assert_eq!(report.outline.outline.len(), 1);
    assert_eq!(report.outline.outline[0].level, HeadingLevel::H1);
    assert_eq!(report.outline.outline[0].text, "1. Introduction ");
    assert_eq!(report.outline.outline[0].page, 0);

    let json = to_json(&report.outline, JsonFormat::Compact).unwrap();
    assert!(json.ends_with(r#""outline":[{"level":"H1","text":"1. Introduction ","page":0}]}"#));
}

#[test]
fn test_word_layout_matches_block_layout() {
    let words = layout_from_bytes("file01.pdf", WORD_LAYOUT.as_bytes()).unwrap();
    let blocks = layout_from_bytes("file01.pdf", BLOCK_LAYOUT.as_bytes()).unwrap();

    let engine = RuleEngine::default();
    assert_eq!(
        engine.outline(&words).outline.outline,
        engine.outline(&blocks).outline.outline
    );
}

#[test]
fn test_multi_page_manual() {
    let layout = layout_from_bytes("manual.pdf", manual_layout().as_bytes()).unwrap();
    let outline = RuleEngine::default().outline(&layout).outline;

    // The footer block is ignored for the title.
    assert_eq!(outline.title, "Overview");

    let entries: Vec<(String, &str, u32)> = outline
        .outline
        .iter()
        .map(|e| (e.level.to_string(), e.text.as_str(), e.page))
        .collect();
    assert_eq!(
        entries,
        vec![
            ("H1".to_string(), "Revision History ", 1),
            (
                "H1".to_string(),
                "1. Introduction to the Foundation Level Extensions ",
                2
            ),
            ("H2".to_string(), "1.1 Intended Audience ", 2),
            ("H1".to_string(), "2. Overview of the Syllabus ", 3),
            ("H2".to_string(), "2.1 Business Outcomes ", 3),
        ]
    );
}

#[test]
fn test_level_mapping_is_monotonic() {
    let layout = layout_from_bytes("manual.pdf", manual_layout().as_bytes()).unwrap();
    let options = RuleOptions::new().with_anchor_phrase(None);
    let outline = RuleEngine::new(options).outline(&layout).outline;

    let lines = LineReconstructor::new().document(&layout);
    let size_of = |text: &str| {
        lines
            .iter()
            .flat_map(|p| p.lines.iter())
            .find(|l| format!("{} ", l.text) == text)
            .map(|l| l.font_size())
            .unwrap()
    };

    for a in &outline.outline {
        for b in &outline.outline {
            if size_of(&a.text) > size_of(&b.text) && a.text.starts_with(char::is_numeric) {
                assert!(a.level <= b.level, "{} vs {}", a.text, b.text);
            }
        }
    }
}

#[test]
fn test_features_are_pure() {
    let layout = layout_from_bytes("file01.pdf", BLOCK_LAYOUT.as_bytes()).unwrap();
    let pages = LineReconstructor::new().document(&layout);
    let extractor = FeatureExtractor::default();
    let state = StyleState {
        size: 12.0,
        font_name: "Arial".to_string(),
    };

    let line = &pages[0].lines[0];
    let a = extractor.extract(line, &pages[0], &state);
    let b = extractor.extract(line, &pages[0], &state);
    assert_eq!(a, b);
    assert_eq!(a.size_diff_from_prev, 4.0);
    assert!(a.is_bold);
    assert!(a.starts_with_numbering);
}

#[test]
fn test_json_source_and_extractor() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("file01.json"), BLOCK_LAYOUT).unwrap();
    std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();

    let source = JsonLayoutSource::new(dir.path());
    let docs = vec![
        "file01.pdf".to_string(),
        "broken.pdf".to_string(),
        "missing.pdf".to_string(),
    ];
    let outlines = OutlineExtractor::rules().extract_all(&source, &docs);

    assert_eq!(outlines.len(), 3);
    assert_eq!(outlines[0].outline.len(), 1);
    assert!(outlines[1].is_empty());
    assert!(outlines[2].is_empty());
}

#[test]
fn test_unreadable_layout_error() {
    let err = layout_from_bytes("broken.pdf", b"[1, 2").unwrap_err();
    assert!(matches!(err, Error::UnreadableDocument(name, _) if name == "broken.pdf"));
}

#[test]
fn test_statistical_model_from_file() {
    let model = r#"{
        "feature_names": ["font_size", "is_bold", "word_count", "size_diff_from_prev",
                          "starts_with_numbering", "y_position", "is_centered"],
        "classes": ["H1", "Title", "paragraph"],
        "trees": [{"nodes": [
            {"feature": 0, "threshold": 12.0, "left": 1, "right": 2},
            {"value": [0, 0, 10]},
            {"feature": 4, "threshold": 0.5, "left": 3, "right": 4},
            {"value": [0, 10, 0]},
            {"value": [10, 0, 0]}
        ]}]
    }"#;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("heading_forest.json");
    std::fs::write(&path, model).unwrap();

    let classifier = StatisticalClassifier::from_file(&path).unwrap();
    assert_eq!(classifier.model().columns().len(), 7);

    let layout = layout_from_bytes("file01.pdf", BLOCK_LAYOUT.as_bytes()).unwrap();
    let report = OutlineExtractor::new(Arc::new(classifier)).classifier().outline(&layout);

    // Numbered large line is H1 and gets promoted into the empty title slot.
    assert_eq!(report.title_source, TitleSource::PromotedHeading);
    assert_eq!(report.outline.title, "1. Introduction");
    assert!(report.outline.outline.is_empty());
}

#[test]
fn test_model_schema_mismatch_is_fatal() {
    let model = r#"{
        "feature_names": ["font_size", "line_spacing"],
        "classes": ["paragraph"],
        "trees": [{"nodes": [{"value": [1]}]}]
    }"#;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("heading_forest.json");
    std::fs::write(&path, model).unwrap();

    assert!(matches!(
        ForestModel::load(&path),
        Err(Error::SchemaMismatch(_))
    ));
}
