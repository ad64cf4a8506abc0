use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, ensure, Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use serde::Deserialize;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use docqa_core::traits::Embedder;
use docqa_core::Error;

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::{pad_token_id, tokenize_batch_on_device};

#[derive(Deserialize)]
struct ModelShape {
    hidden_size: usize,
}

/// A BERT-family sentence encoder loaded from a local model directory
/// (`tokenizer.json`, `config.json`, and `model.safetensors` or
/// `pytorch_model.bin`). Sentence vectors are the masked mean of the last
/// hidden state, L2-normalised.
pub struct CandleEmbedder {
    id: String,
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
    pad_id: u32,
}

impl CandleEmbedder {
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = select_device();
        info!(model_dir = %model_dir.display(), "loading embedding model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let pad_id = pad_token_id(&tokenizer);

        let config_path = model_dir.join("config.json");
        let raw = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: BertConfig = serde_json::from_str(&raw)?;
        let shape: ModelShape = serde_json::from_str(&raw)?;

        let vb = load_weights(model_dir, &device)?;
        let model = BertModel::load(vb, &config)?;

        let name = model_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());
        info!(model = %name, dim = shape.hidden_size, "embedding model loaded");
        Ok(Self {
            id: format!("candle:{name}:d{}", shape.hidden_size),
            model,
            tokenizer,
            device,
            dim: shape.hidden_size,
            max_len,
            pad_id,
        })
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let start = Instant::now();
        let (input_ids, attention_mask) =
            tokenize_batch_on_device(&self.tokenizer, texts, self.max_len, self.pad_id, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let vectors: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_vec2()?;
        ensure!(
            vectors.len() == texts.len(),
            "model returned {} vectors for {} texts",
            vectors.len(),
            texts.len()
        );
        debug!(texts = texts.len(), elapsed_ms = start.elapsed().as_millis() as u64, "batch embedded");
        Ok(vectors)
    }
}

impl Embedder for CandleEmbedder {
    fn embedder_id(&self) -> &str {
        &self.id
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn max_len(&self) -> usize {
        self.max_len
    }

    fn embed_batch(&self, texts: &[String]) -> docqa_core::Result<Vec<Vec<f32>>> {
        self.encode(texts).map_err(|e| Error::Embedding(format!("{e:#}")))
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        // SAFETY: the weights file is not modified while the model is alive.
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors], DType::F32, device)? };
        return Ok(vb);
    }
    let pickle: PathBuf = model_dir.join("pytorch_model.bin");
    ensure!(pickle.exists(), "No model weights found in {}", model_dir.display());
    let weights: HashMap<String, Tensor> = candle_core::pickle::read_all(&pickle)?.into_iter().collect();
    Ok(VarBuilder::from_tensors(weights, DType::F32, device))
}
