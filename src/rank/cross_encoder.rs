//! Local cross-encoder inference on ONNX Runtime.
//!
//! The model directory holds an ONNX export of a sequence-classification
//! cross-encoder (one logit per query/passage pair) and its tokenizer:
//!
//! - `<dir>/model.onnx`
//! - `<dir>/tokenizer.json`
//!
//! The default directory is [`DEFAULT_CROSS_ENCODER_DIR`], an export of
//! `cross-encoder/ms-marco-MiniLM-L-6-v2`.

use std::path::Path;
use std::sync::Mutex;

use ndarray::Array2;
use ort::{session::Session, value::Value};
use tokenizers::{Tokenizer, TruncationParams, TruncationStrategy};

use super::semantic::{RelevanceModel, DEFAULT_CROSS_ENCODER_MODEL};
use crate::error::{Error, Result};

/// Where the CLI looks for the cross-encoder export by default.
pub const DEFAULT_CROSS_ENCODER_DIR: &str = "models/ms-marco-MiniLM-L-6-v2";

const MODEL_FILE: &str = "model.onnx";
const TOKENIZER_FILE: &str = "tokenizer.json";

/// Maximum tokens per query/passage pair
const MAX_SEQ_LEN: usize = 512;

/// Pairs per inference call
const BATCH_SIZE: usize = 16;

/// Token ids of one encoded query/passage pair.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PairTokens {
    ids: Vec<u32>,
    type_ids: Vec<u32>,
}

/// Padded `[batch, seq]` model inputs.
#[derive(Debug, PartialEq)]
struct PairBatch {
    input_ids: Array2<i64>,
    attention_mask: Array2<i64>,
    token_type_ids: Array2<i64>,
}

impl PairBatch {
    /// Right-pad every row with zeros to the longest row.
    fn pad(rows: &[PairTokens]) -> Self {
        let width = rows.iter().map(|r| r.ids.len()).max().unwrap_or(0);
        let shape = (rows.len(), width);
        let mut input_ids = Array2::<i64>::zeros(shape);
        let mut attention_mask = Array2::<i64>::zeros(shape);
        let mut token_type_ids = Array2::<i64>::zeros(shape);

        for (r, row) in rows.iter().enumerate() {
            for (c, (&id, &type_id)) in row.ids.iter().zip(&row.type_ids).enumerate() {
                input_ids[[r, c]] = i64::from(id);
                attention_mask[[r, c]] = 1;
                token_type_ids[[r, c]] = i64::from(type_id);
            }
        }

        Self {
            input_ids,
            attention_mask,
            token_type_ids,
        }
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// A pretrained cross-encoder run in-process.
///
/// Scores are the sigmoid of the model's relevance logit, so they fall in
/// `(0, 1)`.
pub struct OnnxCrossEncoder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    name: String,
}

impl OnnxCrossEncoder {
    /// Load the model and tokenizer from `dir`.
    ///
    /// A missing file is [`Error::ModelNotFound`].
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let model_path = dir.join(MODEL_FILE);
        let tokenizer_path = dir.join(TOKENIZER_FILE);
        for path in [&model_path, &tokenizer_path] {
            if !path.exists() {
                return Err(Error::ModelNotFound(path.clone()));
            }
        }

        log::info!("Loading cross-encoder from {}", model_path.display());
        let session = Session::builder()
            .and_then(|b| b.with_intra_threads(num_threads()))
            .and_then(|b| b.commit_from_file(&model_path))
            .map_err(|e| Error::Inference(format!("{}: {e}", model_path.display())))?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| Error::Inference(format!("{}: {e}", tokenizer_path.display())))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQ_LEN,
                strategy: TruncationStrategy::OnlySecond,
                ..Default::default()
            }))
            .map_err(|e| Error::Inference(format!("tokenizer truncation: {e}")))?;
        tokenizer.with_padding(None);

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            name: DEFAULT_CROSS_ENCODER_MODEL.to_string(),
        })
    }

    /// Name the exported model, for logs.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn encode(&self, query: &str, passage: &str) -> Result<PairTokens> {
        let encoding = self
            .tokenizer
            .encode((query, passage), true)
            .map_err(|e| Error::Inference(format!("tokenization failed: {e}")))?;
        Ok(PairTokens {
            ids: encoding.get_ids().to_vec(),
            type_ids: encoding.get_type_ids().to_vec(),
        })
    }

    fn run(&self, batch: PairBatch) -> Result<Vec<f32>> {
        let rows = batch.input_ids.nrows();
        let tensor = |array: Array2<i64>| {
            Value::from_array(array).map_err(|e| Error::Inference(format!("input tensor: {e}")))
        };
        let input_ids = tensor(batch.input_ids)?;
        let attention_mask = tensor(batch.attention_mask)?;
        let token_type_ids = tensor(batch.token_type_ids)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| Error::Inference("cross-encoder session poisoned".to_string()))?;
        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
                "token_type_ids" => token_type_ids,
            ])
            .map_err(|e| Error::Inference(format!("cross-encoder inference: {e}")))?;

        // logits: [batch, 1]
        let (_, logits) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::Inference(format!("cross-encoder output: {e}")))?;
        if logits.len() != rows {
            return Err(Error::Scorer(format!(
                "{} returned {} logits for {} pairs",
                self.name,
                logits.len(),
                rows
            )));
        }
        Ok(logits.iter().map(|&x| sigmoid(x)).collect())
    }
}

fn num_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl RelevanceModel for OnnxCrossEncoder {
    fn name(&self) -> &str {
        &self.name
    }

    fn score(&self, query: &str, passages: &[String]) -> Result<Vec<f32>> {
        let mut scores = Vec::with_capacity(passages.len());
        for chunk in passages.chunks(BATCH_SIZE) {
            let rows = chunk
                .iter()
                .map(|p| self.encode(query, p))
                .collect::<Result<Vec<_>>>()?;
            scores.extend(self.run(PairBatch::pad(&rows))?);
        }
        log::debug!("{} scored {} passages", self.name, scores.len());
        Ok(scores)
    }
}
