use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

/// Token id used to pad batches: the tokenizer's own pad token when it has one.
pub fn pad_token_id(tokenizer: &Tokenizer) -> u32 {
    tokenizer
        .get_padding()
        .map(|p| p.pad_id)
        .or_else(|| tokenizer.token_to_id("<pad>"))
        .or_else(|| tokenizer.token_to_id("[PAD]"))
        .unwrap_or(0)
}

/// Encode `texts` into `[B, T]` id and mask tensors. Each row is truncated to
/// `max_len` tokens and padded to the longest row of the batch.
pub fn tokenize_batch_on_device(
    tokenizer: &Tokenizer,
    texts: &[String],
    max_len: usize,
    pad_id: u32,
    device: &Device,
) -> Result<(Tensor, Tensor)> {
    let encodings = tokenizer
        .encode_batch(texts.to_vec(), true)
        .map_err(|e| anyhow!("Tokenization failed: {}", e))?;

    let rows: Vec<(Vec<u32>, Vec<u32>)> = encodings
        .iter()
        .map(|enc| {
            let n = enc.get_ids().len().min(max_len);
            (enc.get_ids()[..n].to_vec(), enc.get_attention_mask()[..n].to_vec())
        })
        .collect();
    let seq_len = rows.iter().map(|(ids, _)| ids.len()).max().unwrap_or(0).max(1);

    let mut ids_flat = Vec::with_capacity(rows.len() * seq_len);
    let mut mask_flat = Vec::with_capacity(rows.len() * seq_len);
    for (mut ids, mut mask) in rows {
        ids.resize(seq_len, pad_id);
        mask.resize(seq_len, 0);
        ids_flat.extend(ids);
        mask_flat.extend(mask);
    }

    let batch = texts.len();
    let input_ids = Tensor::from_vec(ids_flat, (batch, seq_len), device)?;
    let attention_mask = Tensor::from_vec(mask_flat, (batch, seq_len), device)?;
    Ok((input_ids, attention_mask))
}
