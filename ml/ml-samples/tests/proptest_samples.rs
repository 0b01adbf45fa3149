//! Property-based tests for sample set operations.
//!
//! Run with: cargo test -p ml-samples -- proptest

use ml_samples::Samples;
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

/// Generate a sample set with `1..=width` features per sample.
fn arb_samples(max_len: usize, max_width: usize) -> impl Strategy<Value = Samples> {
    (0..=max_len, 1..=max_width).prop_flat_map(|(len, width)| {
        (
            prop::collection::vec(-1000.0..1000.0f32, len * width),
            prop::collection::vec(-5..5i64, len),
        )
            .prop_map(move |(features, targets)| {
                Samples::new(features, vec![width], targets).unwrap()
            })
    })
}

/// Generate two sample sets sharing a feature width.
fn arb_pair(max_len: usize) -> impl Strategy<Value = (Samples, Samples)> {
    (0..=max_len, 0..=max_len, 1..=4usize).prop_flat_map(|(a, b, width)| {
        (
            prop::collection::vec(-10.0..10.0f32, a * width),
            prop::collection::vec(0..3i64, a),
            prop::collection::vec(-10.0..10.0f32, b * width),
            prop::collection::vec(0..3i64, b),
        )
            .prop_map(move |(fa, ta, fb, tb)| {
                (
                    Samples::new(fa, vec![width], ta).unwrap(),
                    Samples::new(fb, vec![width], tb).unwrap(),
                )
            })
    })
}

// =============================================================================
// Shuffle
// =============================================================================

proptest! {
    /// Shuffling keeps the length and the set of targets.
    #[test]
    fn shuffle_preserves_len_and_targets(samples in arb_samples(40, 4), seed in any::<u64>()) {
        let shuffled = samples.shuffle_seeded(seed);
        prop_assert_eq!(shuffled.len(), samples.len());
        prop_assert_eq!(shuffled.targets_set(), samples.targets_set());
    }

    /// Shuffling permutes whole samples: sorted multisets are unchanged.
    #[test]
    fn shuffle_is_a_permutation(samples in arb_samples(30, 3), seed in any::<u64>()) {
        let key = |s: &Samples| {
            let mut pairs: Vec<(Vec<u32>, i64)> = s
                .iter()
                .map(|(f, t)| (f.iter().map(|v| v.to_bits()).collect(), t))
                .collect();
            pairs.sort();
            pairs
        };
        prop_assert_eq!(key(&samples.shuffle_seeded(seed)), key(&samples));
    }
}

// =============================================================================
// Batching
// =============================================================================

proptest! {
    /// Concatenated batches rebuild the set; only the last batch may be short.
    #[test]
    fn batches_reconstruct(samples in arb_samples(50, 3), batch_size in 1..12usize) {
        let batches: Vec<Samples> = samples.batches(batch_size).unwrap().collect();
        prop_assert_eq!(batches.len(), samples.len().div_ceil(batch_size));

        if let Some((last, rest)) = batches.split_last() {
            for batch in rest {
                prop_assert_eq!(batch.len(), batch_size);
            }
            prop_assert!(!last.is_empty() && last.len() <= batch_size);
        }

        let rebuilt = batches
            .iter()
            .try_fold(Samples::empty(samples.feature_shape().to_vec()), |acc, b| acc.append(b))
            .unwrap();
        prop_assert_eq!(rebuilt, samples);
    }

    /// Raw batches cover the same data as owned batches.
    #[test]
    fn raw_batches_match_batches(samples in arb_samples(30, 3), batch_size in 1..8usize) {
        let owned = samples.batches(batch_size).unwrap();
        let raw = samples.raw_batches(batch_size).unwrap();
        prop_assert_eq!(owned.len(), raw.len());
        for (batch, (features, targets)) in owned.zip(raw) {
            prop_assert_eq!(batch.features(), features);
            prop_assert_eq!(batch.targets(), targets);
        }
    }
}

// =============================================================================
// Append / slice / map
// =============================================================================

proptest! {
    /// Appending then slicing returns both operands.
    #[test]
    fn append_then_slice((a, b) in arb_pair(20)) {
        let joined = a.append(&b).unwrap();
        prop_assert_eq!(joined.len(), a.len() + b.len());
        prop_assert_eq!(joined.slice(0..a.len()).unwrap(), a.clone());
        prop_assert_eq!(joined.slice(a.len()..joined.len()).unwrap(), b);
    }

    /// Mapping with the identity leaves the set unchanged.
    #[test]
    fn map_identity(samples in arb_samples(30, 5)) {
        let mapped = samples
            .map(|f| Ok::<_, std::convert::Infallible>(f.to_vec()))
            .unwrap();
        prop_assert_eq!(mapped, samples);
    }
}
