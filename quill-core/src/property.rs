//! Property definitions and the randomized runner.

use crate::bits::{BitStream, Recording};
use crate::case::Case;
use crate::data::{Config, Seed};
use crate::error::{render_draws, Drawn, Failure, Invalid, Stop, TestResult};
use crate::fault;
use crate::gen::Gen;
use crate::shrink::{Counterexample, Shrinker};
use crate::tree::Tree;
use std::fmt::Debug;
use tracing::{debug, info, trace, warn};

/// Entropy exhaustion may grow the word budget up to this multiple of `max_words`.
const MAX_BUDGET_GROWTH: usize = 8;

type TestFn = dyn Fn(&mut Case) -> Result<(), Stop>;

/// How one execution ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Passed,
    Invalid(Invalid),
    Failed(Failure),
}

/// One run of a property against one bit stream.
#[derive(Debug, Clone)]
pub struct Execution {
    pub outcome: Outcome,
    /// Top-level draws, in order.
    pub draws: Vec<Drawn>,
    pub recording: Recording,
}

impl Execution {
    pub fn failure(&self) -> Option<&Failure> {
        match &self.outcome {
            Outcome::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn counterexample(&self) -> String {
        render_draws(&self.draws)
    }
}

/// A property that can be tested with generated inputs.
///
/// The test draws whatever it needs from its [`Case`] and reports failure
/// through `Err` (see [`ensure!`](crate::ensure)) or by panicking.
pub struct Property {
    test: Box<TestFn>,
}

impl Property {
    pub fn new<F>(test: F) -> Self
    where
        F: Fn(&mut Case) -> Result<(), Stop> + 'static,
    {
        Property {
            test: Box::new(test),
        }
    }

    /// Create a property that checks a boolean condition.
    pub fn for_all<T, F>(generator: Gen<T>, condition: F) -> Self
    where
        T: Debug + 'static,
        F: Fn(&T) -> bool + 'static,
    {
        Self::for_all_named(generator, "", condition)
    }

    /// Create a property that checks a boolean condition with a named variable.
    pub fn for_all_named<T, F>(generator: Gen<T>, variable_name: &str, condition: F) -> Self
    where
        T: Debug + 'static,
        F: Fn(&T) -> bool + 'static,
    {
        let label = variable_name.to_string();
        Property::new(move |case| {
            let value = case.draw(&generator, &label)?;
            if condition(&value) {
                Ok(())
            } else {
                Err(case.fail("condition returned false"))
            }
        })
    }

    /// Execute the property once against `bits`, catching panics.
    pub fn execute(&self, bits: BitStream, filter_tries: usize) -> Execution {
        let mut case = Case::new(bits, filter_tries);
        let outcome = match fault::catch(|| (self.test)(&mut case)) {
            Ok(Ok(())) => Outcome::Passed,
            Ok(Err(Stop::Invalid(invalid))) => Outcome::Invalid(invalid),
            Ok(Err(Stop::Failed(failure))) => Outcome::Failed(failure),
            Err(mut panicked) => {
                panicked.generator_path = case.open_generators();
                Outcome::Failed(panicked)
            }
        };
        let (draws, recording) = case.finish();
        Execution {
            outcome,
            draws,
            recording,
        }
    }

    /// Re-execute a recorded word sequence with the default configuration.
    pub fn replay(&self, words: &[u64]) -> Execution {
        self.replay_with(words, &Config::default())
    }

    /// Re-execute a recorded word sequence.
    pub fn replay_with(&self, words: &[u64], config: &Config) -> Execution {
        self.execute(BitStream::replay(words.to_vec()), config.filter_tries)
    }

    /// Run this property with the given configuration.
    pub fn run(&self, config: &Config) -> TestResult {
        self.run_with_context(config, None, None)
    }

    /// Run this property with the given configuration and context information.
    ///
    /// # Panics
    ///
    /// If `config` does not validate.
    pub fn run_with_context(
        &self,
        config: &Config,
        property_name: Option<&str>,
        module_path: Option<&str>,
    ) -> TestResult {
        if let Err(err) = config.validate() {
            panic!("{err}");
        }

        let seed = config.resolve_seed();
        let mut attempt_seed = Seed::from_u64(seed);
        let max_budget = config.max_words.saturating_mul(MAX_BUDGET_GROWTH);
        let discard_limit = config.discard_limit();
        let mut max_words = config.max_words;
        let mut passed = 0;
        let mut discarded = 0;
        let property_name = property_name.map(str::to_string);
        let module_path = module_path.map(str::to_string);

        debug!(
            seed,
            tests = config.test_limit,
            property = property_name.as_deref().unwrap_or(""),
            "running property"
        );

        while passed < config.test_limit {
            let (this_seed, next_seed) = attempt_seed.split();
            attempt_seed = next_seed;

            let Execution {
                outcome,
                draws,
                recording,
            } = self.execute(BitStream::random(this_seed, max_words), config.filter_tries);

            match outcome {
                Outcome::Passed => {
                    passed += 1;
                    trace!(passed, words = recording.data.len(), "execution passed");
                }
                Outcome::Invalid(reason) => {
                    discarded += 1;
                    trace!(discarded, %reason, "execution discarded");

                    if matches!(reason, Invalid::Exhausted { .. }) && max_words < max_budget {
                        max_words = max_words.saturating_mul(2).min(max_budget);
                        warn!(max_words, "entropy budget exhausted, growing it");
                    }

                    if discarded > discard_limit {
                        warn!(seed, passed, discarded, %reason, "giving up after too many discards");
                        return TestResult::Discard {
                            limit: discard_limit,
                            tests_run: passed,
                            reason,
                            seed,
                            property_name,
                            module_path,
                        };
                    }
                }
                Outcome::Failed(failure) => {
                    let tests_run = passed + 1;
                    info!(seed, tests_run, failure = %failure, "property failed, shrinking");

                    let failing = Counterexample {
                        failure,
                        draws,
                        recording,
                    };
                    let shrunk = Shrinker::new(self, config, failing).shrink();
                    let best = shrunk.best;
                    let tree = Tree::from_recording(&best.recording);
                    debug!(
                        nodes = tree.count_nodes(),
                        depth = tree.depth(),
                        "minimal case structure"
                    );

                    return TestResult::Fail {
                        counterexample: render_draws(&best.draws),
                        trace: tree.render(),
                        bits: best.recording.data,
                        draws: best.draws,
                        failure: best.failure,
                        tests_run,
                        shrinks_performed: shrunk.shrinks,
                        seed,
                        property_name,
                        module_path,
                        shrink_steps: shrunk.steps,
                    };
                }
            }
        }

        TestResult::Pass {
            tests_run: passed,
            discarded,
            seed,
            property_name,
            module_path,
        }
    }

    /// Run the property and panic with the report unless it passed.
    pub fn check(&self, config: &Config) {
        let result = self.run(config);
        if !result.is_pass() {
            panic!("\n{result}");
        }
    }
}

/// Create a property from a test function over a [`Case`].
pub fn property<F>(test: F) -> Property
where
    F: Fn(&mut Case) -> Result<(), Stop> + 'static,
{
    Property::new(test)
}

/// Create a property that checks a boolean condition.
pub fn for_all<T, F>(generator: Gen<T>, condition: F) -> Property
where
    T: Debug + 'static,
    F: Fn(&T) -> bool + 'static,
{
    Property::for_all(generator, condition)
}

/// Create a property that checks a boolean condition with a named variable.
pub fn for_all_named<T, F>(generator: Gen<T>, variable_name: &str, condition: F) -> Property
where
    T: Debug + 'static,
    F: Fn(&T) -> bool + 'static,
{
    Property::for_all_named(generator, variable_name, condition)
}
