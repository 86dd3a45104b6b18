//! pdfsift CLI - outline extraction and section ranking over PDF layouts

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;

use pdfsift::model::{CollectionMetadata, CollectionOutput};
use pdfsift::parser::layout_from_file;
use pdfsift::rank::{
    CrossEncoderClient, FallbackReason, FilterOutcome, LlmReranker, OllamaClient, RankingStage,
    DEFAULT_CROSS_ENCODER_DIR, DEFAULT_LLM_MODEL, DEFAULT_OLLAMA_HOST,
};
use pdfsift::render::{outline_to_text, ranking_to_text, to_json};
use pdfsift::{
    HeadingClassifier, JsonFormat, JsonLayoutSource, LineReconstructor, OnnxCrossEncoder, Outline,
    RankingOptions, RankingPipeline, RelevanceModel, RuleEngine, SectionSegmenter,
    StatisticalClassifier,
};

#[derive(Parser)]
#[command(name = "pdfsift")]
#[command(version)]
#[command(about = "Extract PDF outlines and rank sections for a persona", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract title and headings from layout JSON files
    Outline {
        /// Layout JSON files or directories of them
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory (stdout for a single file if not specified)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Pretrained heading model (rule engine if not specified)
        #[arg(long, value_name = "FILE", env = "PDFSIFT_HEADING_MODEL")]
        model: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputKind,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Rank the sections of a document collection for a persona and task
    Rank {
        /// Collection input JSON (documents, persona, job_to_be_done)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Directory holding one layout JSON per document (default: <INPUT dir>/layouts)
        #[arg(long, value_name = "DIR")]
        layouts: Option<PathBuf>,

        /// Output file (default: <INPUT dir>/challenge1b_output.json)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Skip LLM reranking
        #[arg(long)]
        no_llm: bool,

        /// Ollama server
        #[arg(long, env = "OLLAMA_HOST", default_value = DEFAULT_OLLAMA_HOST)]
        ollama_host: String,

        /// Chat model used for reranking
        #[arg(long, env = "PDFSIFT_LLM_MODEL", default_value = DEFAULT_LLM_MODEL)]
        llm_model: String,

        /// LLM request timeout in seconds
        #[arg(long, default_value = "120")]
        llm_timeout: u64,

        /// Directory with the cross-encoder ONNX export (model.onnx, tokenizer.json)
        #[arg(
            long,
            value_name = "DIR",
            env = "PDFSIFT_CROSS_ENCODER_MODEL",
            default_value = DEFAULT_CROSS_ENCODER_DIR
        )]
        cross_encoder_model: PathBuf,

        /// Hosted cross-encoder rerank service, used instead of the local model
        #[arg(long, env = "PDFSIFT_CROSS_ENCODER_URL")]
        cross_encoder_url: Option<String>,

        /// Worker threads for document extraction
        #[arg(long)]
        threads: Option<usize>,

        /// Print the ranking instead of writing it
        #[arg(long)]
        dry_run: bool,
    },

    /// Show layout information
    Info {
        /// Layout JSON file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputKind {
    /// Outline JSON
    Json,
    /// Indented heading list
    Text,
}

/// Collection input as written by the task author.
#[derive(Deserialize)]
struct CollectionInput {
    #[serde(default)]
    documents: Vec<InputDocument>,
    persona: Option<Persona>,
    job_to_be_done: Option<Job>,
}

#[derive(Deserialize)]
struct InputDocument {
    filename: String,
}

#[derive(Deserialize)]
struct Persona {
    role: Option<String>,
}

#[derive(Deserialize)]
struct Job {
    task: Option<String>,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Outline {
            inputs,
            output,
            model,
            format,
            compact,
        } => cmd_outline(&inputs, output.as_deref(), model.as_deref(), format, compact),
        Commands::Rank {
            input,
            layouts,
            output,
            no_llm,
            ollama_host,
            llm_model,
            llm_timeout,
            cross_encoder_model,
            cross_encoder_url,
            threads,
            dry_run,
        } => cmd_rank(RankArgs {
            input,
            layouts,
            output,
            no_llm,
            ollama_host,
            llm_model,
            llm_timeout,
            cross_encoder_model,
            cross_encoder_url,
            threads,
            dry_run,
        }),
        Commands::Info { input } => cmd_info(&input),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb
}

/// Expand directories into their `.json` files, sorted by name.
fn collect_layouts(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = fs::read_dir(input)?
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}

fn render_outline(
    outline: &Outline,
    format: OutputKind,
    compact: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        OutputKind::Text => outline_to_text(outline),
        OutputKind::Json => {
            let json_format = if compact {
                JsonFormat::Compact
            } else {
                JsonFormat::Pretty
            };
            to_json(outline, json_format)?
        }
    })
}

fn cmd_outline(
    inputs: &[PathBuf],
    output: Option<&Path>,
    model: Option<&Path>,
    format: OutputKind,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // A missing or mismatched model is fatal; nothing is processed.
    let classifier: Arc<dyn HeadingClassifier> = match model {
        Some(path) => Arc::new(StatisticalClassifier::from_file(path)?),
        None => Arc::new(RuleEngine::default()),
    };

    let files = collect_layouts(inputs)?;
    if files.is_empty() {
        println!("{}", "No layout files found".yellow());
        return Ok(());
    }

    let outline_of = |path: &Path| match layout_from_file(path) {
        Ok(layout) => classifier.outline(&layout).outline,
        Err(e) => {
            log::warn!("{}", e);
            Outline::empty()
        }
    };

    let Some(output_dir) = output else {
        if files.len() == 1 {
            println!("{}", render_outline(&outline_of(&files[0]), format, compact)?);
            return Ok(());
        }
        return Err("multiple inputs need an output directory (-o)".into());
    };

    fs::create_dir_all(output_dir)?;
    let extension = match format {
        OutputKind::Json => "json",
        OutputKind::Text => "txt",
    };

    let pb = progress_bar(files.len() as u64);
    let start = Instant::now();
    for path in &files {
        let stem = path.file_stem().unwrap_or_default().to_string_lossy();
        pb.set_message(stem.to_string());
        let rendered = render_outline(&outline_of(path), format, compact)?;
        fs::write(output_dir.join(format!("{stem}.{extension}")), rendered)?;
        pb.inc(1);
    }
    pb.finish_with_message("Done!");

    println!(
        "\n{} {} outlines written to {} in {:.2?} ({})",
        "Done!".green().bold(),
        files.len(),
        output_dir.display(),
        start.elapsed(),
        classifier.name()
    );
    Ok(())
}

struct RankArgs {
    input: PathBuf,
    layouts: Option<PathBuf>,
    output: Option<PathBuf>,
    no_llm: bool,
    ollama_host: String,
    llm_model: String,
    llm_timeout: u64,
    cross_encoder_model: PathBuf,
    cross_encoder_url: Option<String>,
    threads: Option<usize>,
    dry_run: bool,
}

fn describe_stage(stage: RankingStage) -> String {
    match stage {
        RankingStage::Llm => "LLM rerank".to_string(),
        RankingStage::Semantic {
            reason: FallbackReason::Disabled,
        } => "semantic".to_string(),
        RankingStage::Semantic { reason } => format!("semantic (LLM fallback: {:?})", reason),
    }
}

fn cmd_rank(args: RankArgs) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read_to_string(&args.input)
        .map_err(|e| format!("{}: {}", args.input.display(), e))?;
    let input: CollectionInput = serde_json::from_str(&data)
        .map_err(|e| format!("{} is not a valid collection input: {}", args.input.display(), e))?;

    let persona = input
        .persona
        .and_then(|p| p.role)
        .unwrap_or_else(|| "Default Persona".to_string());
    let task = input
        .job_to_be_done
        .and_then(|j| j.task)
        .unwrap_or_else(|| "Default Task".to_string());
    let documents: Vec<String> = input.documents.into_iter().map(|d| d.filename).collect();

    let collection_dir = args
        .input
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let layouts = args
        .layouts
        .unwrap_or_else(|| collection_dir.join("layouts"));
    let output = args
        .output
        .unwrap_or_else(|| collection_dir.join("challenge1b_output.json"));

    println!("{}", "Collection".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Persona".bold(), persona);
    println!("{}: {}", "Task".bold(), task);
    println!("{}: {}", "Documents".bold(), documents.len());

    let source = JsonLayoutSource::new(&layouts);
    for doc in &documents {
        let path = source.path_for(doc);
        if !path.exists() {
            println!("{} {} ({})", "Missing layout:".yellow(), doc, path.display());
        }
    }

    let relevance: Arc<dyn RelevanceModel> = match args.cross_encoder_url {
        Some(url) => Arc::new(CrossEncoderClient::new(url, Duration::from_secs(60))?),
        None => Arc::new(OnnxCrossEncoder::from_dir(&args.cross_encoder_model)?),
    };

    let mut options = RankingOptions::default();
    if let Some(threads) = args.threads {
        options = options.with_threads(threads);
    }

    let mut pipeline = RankingPipeline::new(relevance, options);
    if !args.no_llm {
        let client = OllamaClient::new(args.ollama_host, Duration::from_secs(args.llm_timeout))?
            .with_model(args.llm_model);
        pipeline = pipeline.with_reranker(LlmReranker::new(Box::new(client)));
    }

    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Ranking sections...");
    let start = Instant::now();
    let report = pipeline.run(&source, &documents, &persona, &task)?;
    pb.finish_and_clear();

    println!("{}: {}", "Candidates".bold(), report.candidate_count);
    println!("{}: {}", "Order".bold(), describe_stage(report.stage));
    if report.filter == FilterOutcome::Skipped && report.candidate_count > 0 {
        println!("{}", "Heading filter skipped: it would remove every section".yellow());
    }

    if report.result.is_empty() {
        println!("{}", "No relevant sections found; nothing written".yellow());
        return Ok(());
    }

    println!();
    print!("{}", ranking_to_text(&report.result));

    if args.dry_run {
        return Ok(());
    }

    let collection = CollectionOutput {
        metadata: CollectionMetadata {
            input_documents: documents,
            persona,
            job_to_be_done: task,
            processing_timestamp: chrono::Local::now()
                .format("%Y-%m-%dT%H:%M:%S%.6f")
                .to_string(),
        },
        result: report.result,
    };
    fs::write(&output, to_json(&collection, JsonFormat::Pretty)?)?;

    println!(
        "\n{} {} in {:.2?}",
        "Saved to".green(),
        output.display(),
        start.elapsed()
    );
    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let layout = layout_from_file(input)?;
    let pages = LineReconstructor::new().document(&layout);
    let segmenter = SectionSegmenter::default();
    let structure = segmenter.segment(&layout);
    let outline = RuleEngine::default().outline(&layout).outline;

    println!("{}", "Layout Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Pages".bold(), layout.page_count());
    println!(
        "{}: {}",
        "Lines".bold(),
        pages.iter().map(|p| p.lines.len()).sum::<usize>()
    );
    println!(
        "{}: {:.1}",
        "Median font size".bold(),
        segmenter.median_font_size(&layout)
    );

    println!();
    println!("{}", "Structure".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    if !outline.title.trim().is_empty() {
        println!("{}: {}", "Title".bold(), outline.title.trim());
    }
    println!("{}: {}", "Headings".bold(), outline.outline.len());
    println!("{}: {}", "Sections".bold(), structure.sections.len());

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdfsift".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF outline extraction and section ranking");
    println!();
    println!("License: MIT");
}
