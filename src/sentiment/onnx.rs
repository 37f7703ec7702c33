// Local ONNX polarity model using a DistilBERT SST-2 sentiment classifier.
//
// Runs entirely on the local CPU. The model emits two logits per text
// (negative, positive); polarity is p(positive) - p(negative) after softmax,
// which lands in [-1, 1] with zero meaning "can't tell".
//
// Model: Xenova/distilbert-base-uncased-finetuned-sst-2-english (quantized, ~67MB)

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::debug;

use super::download::{MODEL_FILE, TOKENIZER_FILE};
use super::traits::PolarityModel;

/// DistilBERT's positional limit.
const MAX_SEQUENCE_LEN: usize = 512;

/// Output order of the SST-2 head.
const NEGATIVE_INDEX: usize = 0;
const POSITIVE_INDEX: usize = 1;

pub struct OnnxPolarityModel {
    // ort::Session::run takes &mut self. Scoring already happens on a
    // blocking thread, so a plain Mutex is enough.
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

impl OnnxPolarityModel {
    /// Load the ONNX model and tokenizer from the given directory.
    ///
    /// Expects `model_quantized.onnx` and `tokenizer.json` to exist in `model_dir`.
    /// Call `download::download_model()` first if they don't.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let model_path = model_dir.join(MODEL_FILE);
        let tokenizer_path = model_dir.join(TOKENIZER_FILE);

        if !model_path.exists() {
            anyhow::bail!(
                "Model file not found: {}\nRun `gavel download-model` to download it.",
                model_path.display()
            );
        }
        if !tokenizer_path.exists() {
            anyhow::bail!(
                "Tokenizer file not found: {}\nRun `gavel download-model` to download it.",
                tokenizer_path.display()
            );
        }

        let session = Session::builder()
            .context("Failed to create ONNX session builder")?
            .commit_from_file(&model_path)
            .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LEN,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure truncation: {}", e))?;

        debug!("Loaded ONNX sentiment model from {}", model_dir.display());

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
        })
    }
}

impl PolarityModel for OnnxPolarityModel {
    fn polarity(&self, text: &str) -> Result<f64> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        let shape = [1_i64, input_ids.len() as i64];

        let input_ids_tensor = Tensor::from_array((shape, input_ids))
            .context("Failed to create input_ids tensor")?;
        let attention_mask_tensor = Tensor::from_array((shape, attention_mask))
            .context("Failed to create attention_mask tensor")?;

        let logits = {
            let mut session = self
                .session
                .lock()
                .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

            let outputs = session
                .run(ort::inputs! {
                    "input_ids" => input_ids_tensor,
                    "attention_mask" => attention_mask_tensor
                })
                .context("ONNX inference failed")?;

            // Output shape: [1, 2], raw logits
            let (_out_shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .context("Failed to extract output tensor")?;

            data.to_vec()
        };

        if logits.len() <= POSITIVE_INDEX {
            anyhow::bail!("Expected 2 logits, model returned {}", logits.len());
        }

        let probs = softmax(&logits[..=POSITIVE_INDEX]);
        let polarity = probs[POSITIVE_INDEX] - probs[NEGATIVE_INDEX];

        debug!(
            polarity,
            text_preview = %crate::output::truncate_chars(text, 50),
            "ONNX scored text"
        );

        Ok(polarity)
    }
}

/// Numerically stable softmax.
fn softmax(logits: &[f32]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
    let exps: Vec<f64> = logits.iter().map(|&l| (l as f64 - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[2.0, -1.0]);
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-10);
        assert!(probs[0] > probs[1]);
    }

    #[test]
    fn test_softmax_equal_logits() {
        let probs = softmax(&[0.7, 0.7]);
        assert!((probs[0] - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_softmax_large_logits_do_not_overflow() {
        let probs = softmax(&[1000.0, 0.0]);
        assert!((probs[0] - 1.0).abs() < 1e-10);
        assert!(probs[1].is_finite());
    }

    #[test]
    fn test_load_missing_model_is_an_error() {
        let dir = std::env::temp_dir().join("gavel-test-no-model");
        let err = OnnxPolarityModel::load(&dir).err().expect("load should fail");
        assert!(err.to_string().contains("download-model"));
    }
}
