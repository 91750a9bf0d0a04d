//! Distribution validation
//!
//! Statistical checks of the primitive decoders. Seeds are fixed, so the
//! tolerances only have to hold for these particular streams.

use crate::samples;
use quill::decode::{flip_biased_coin, gen_uint_range, gen_weighted_index};
use quill::*;

const DRAWS: usize = 10_000;

fn stream(seed: u64) -> BitStream {
    BitStream::random(Seed::from_u64(seed), DRAWS * 4)
}

/// Biased coins land heads roughly `p` of the time
pub fn test_biased_coin_frequencies() {
    for (seed, p) in [(1, 0.1), (2, 0.5), (3, 0.9)] {
        let mut bits = stream(seed);
        let heads = (0..DRAWS)
            .filter(|_| flip_biased_coin(&mut bits, p).unwrap())
            .count();
        let observed = heads as f64 / DRAWS as f64;
        assert!(
            (observed - p).abs() < 0.03,
            "coin with p = {p} came up heads {observed}"
        );
    }

    let mut bits = stream(4);
    assert!(!flip_biased_coin(&mut bits, 0.0).unwrap());
    assert!(flip_biased_coin(&mut bits, 1.0).unwrap());
    assert!(bits.data().is_empty());
    println!("✓ Biased coin frequencies passed");
}

/// Weighted indices follow their weights
pub fn test_frequency_weights() {
    let weights = [1, 3, 6];
    let mut bits = stream(5);
    let mut counts = [0usize; 3];
    for _ in 0..DRAWS {
        counts[gen_weighted_index(&mut bits, &weights).unwrap()] += 1;
    }
    for (count, weight) in counts.iter().zip(weights) {
        let observed = *count as f64 / DRAWS as f64;
        let expected = weight as f64 / 10.0;
        assert!(
            (observed - expected).abs() < 0.03,
            "weight {weight} drawn {observed} of the time"
        );
    }

    let gen = Gen::frequency(vec![(1, Gen::just('a')), (9, Gen::just('b'))]);
    let drawn = samples(&gen, 6, 2000);
    let a = drawn.iter().filter(|&&c| c == 'a').count();
    assert!((100..=320).contains(&a), "'a' drawn {a} times out of 2000");
    println!("✓ Frequency weights passed");
}

/// Biased draws favour small values; unbiased ones spread out
pub fn test_bias_prefers_small_values() {
    let mut biased = stream(7);
    let mut unbiased = stream(8);
    let small = |x: u64| x < 1 << 16;

    let biased_small = (0..DRAWS)
        .filter(|_| small(gen_uint_range(&mut biased, 0, u64::MAX, true).unwrap()))
        .count();
    let unbiased_small = (0..DRAWS)
        .filter(|_| small(gen_uint_range(&mut unbiased, 0, u64::MAX, false).unwrap()))
        .count();

    assert!(biased_small > DRAWS / 4, "biased draws were small {biased_small} times");
    assert!(unbiased_small < 10, "unbiased draws were small {unbiased_small} times");
    println!("✓ Bias prefers small values passed");
}
