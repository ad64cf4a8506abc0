use std::ops::Range;

use docqa_core::config::BatchingConfig;

/// Split `total` chunks into embedding batches.
///
/// Corpora smaller than `small_corpus_threshold` go in a single batch;
/// larger ones are cut into `batch_size` pieces, the last possibly shorter.
pub fn plan_batches(total: usize, config: &BatchingConfig) -> Vec<Range<usize>> {
    if total == 0 {
        return Vec::new();
    }
    if total < config.small_corpus_threshold {
        return vec![0..total];
    }
    let size = config.batch_size.max(1);
    (0..total).step_by(size).map(|start| start..(start + size).min(total)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_corpus_is_one_batch() {
        let cfg = BatchingConfig::default();
        assert_eq!(plan_batches(99, &cfg), vec![0..99]);
        assert!(plan_batches(0, &cfg).is_empty());
    }

    #[test]
    fn large_corpus_uses_fixed_batches() {
        let cfg = BatchingConfig::default();
        assert_eq!(plan_batches(100, &cfg), vec![0..50, 50..100]);
        assert_eq!(plan_batches(120, &cfg), vec![0..50, 50..100, 100..120]);
    }
}
