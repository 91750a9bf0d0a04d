//! Seeds and run configuration.

use crate::error::{QuillError, Result};
use std::fmt;

/// Splittable random seed for deterministic test generation.
///
/// Every attempt of a run gets its own seed split off the run seed, so a run
/// is reproducible from the single `u64` it reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seed(pub u64, pub u64);

impl Seed {
    /// Create a new seed from a single value.
    pub fn from_u64(value: u64) -> Self {
        let state = splitmix64_mix(value);
        let gamma = mix_gamma(state);
        Seed(state, gamma)
    }

    /// Split a seed into two independent seeds.
    pub fn split(self) -> (Self, Self) {
        let Seed(state, gamma) = self;
        let new_state = state.wrapping_add(gamma);
        let output = splitmix64_mix(new_state);
        let new_gamma = mix_gamma(output);

        (Seed(new_state, gamma), Seed(output, new_gamma))
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seed({}, {})", self.0, self.1)
    }
}

/// Configuration for property testing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Number of passing executions required.
    pub test_limit: usize,

    /// Maximum number of candidate replays while shrinking.
    pub shrink_limit: usize,

    /// Invalid executions tolerated per requested test before giving up.
    pub discard_ratio: usize,

    /// Word budget of one random execution.
    pub max_words: usize,

    /// Attempts a filter gets before the draw is invalid.
    pub filter_tries: usize,

    /// Fixed run seed; a fresh one is picked (and reported) when `None`.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            test_limit: 100,
            shrink_limit: 1000,
            discard_ratio: 10,
            max_words: 8192,
            filter_tries: 100,
            seed: None,
        }
    }
}

impl Config {
    /// Create a new config with the given number of tests.
    pub fn with_tests(mut self, tests: usize) -> Self {
        self.test_limit = tests;
        self
    }

    /// Create a new config with the given shrink limit.
    pub fn with_shrinks(mut self, shrinks: usize) -> Self {
        self.shrink_limit = shrinks;
        self
    }

    pub fn with_discard_ratio(mut self, ratio: usize) -> Self {
        self.discard_ratio = ratio;
        self
    }

    /// Create a new config with the given per-execution word budget.
    pub fn with_max_words(mut self, words: usize) -> Self {
        self.max_words = words;
        self
    }

    pub fn with_filter_tries(mut self, tries: usize) -> Self {
        self.filter_tries = tries;
        self
    }

    /// Pin the run seed, e.g. to reproduce a reported failure.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Invalid executions a run may see before it gives up.
    ///
    /// The allowance scales with `test_limit`, so a run only gives up once
    /// its invalid-to-valid ratio is certain to exceed `discard_ratio`.
    pub fn discard_limit(&self) -> usize {
        self.discard_ratio.saturating_mul(self.test_limit.max(1))
    }

    /// Reject configurations the runner cannot make progress with.
    pub fn validate(&self) -> Result<()> {
        if self.max_words == 0 {
            return Err(QuillError::InvalidConfig {
                message: "max_words must be at least 1".to_string(),
            });
        }
        if self.filter_tries == 0 {
            return Err(QuillError::InvalidConfig {
                message: "filter_tries must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// The configured seed, or a fresh one from the thread RNG.
    pub fn resolve_seed(&self) -> u64 {
        use rand::Rng;
        self.seed.unwrap_or_else(|| rand::thread_rng().gen())
    }
}

/// SplitMix64 mixing function for high-quality output.
fn splitmix64_mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e3779b97f4a7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

/// Generate a good gamma value for SplitMix64 splitting.
fn mix_gamma(mut z: u64) -> u64 {
    z = splitmix64_mix(z);
    // Ensure gamma is odd for maximal period
    (z | 1).wrapping_mul(0x9e3779b97f4a7c15)
}
