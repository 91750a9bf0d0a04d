//! Error types and reports for quill property testing.

use std::fmt;
use thiserror::Error;

/// Main error type for quill.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuillError {
    /// Property test failed with a counterexample.
    #[error("Property test failed: {counterexample}")]
    PropertyFailed {
        counterexample: String,
        tests_run: usize,
        shrinks_performed: usize,
    },

    /// Too many test cases were discarded.
    #[error("Too many test cases discarded (limit: {limit}, last reason: {reason})")]
    TooManyDiscards { limit: usize, reason: Invalid },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Invalid generator construction.
    #[error("Invalid generator: {message}")]
    InvalidGenerator { message: String },

    /// A recorded word sequence could not be decoded.
    #[error("Invalid replay data: {message}")]
    InvalidReplay { message: String },
}

/// Result type for quill operations.
pub type Result<T> = std::result::Result<T, QuillError>;

/// Why an execution was discarded without passing or failing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Invalid {
    /// Replay ran past the end of the recorded words.
    #[error("replay overran the recorded bit stream")]
    Overrun,

    /// Random mode used up its word budget.
    #[error("entropy budget of {max_words} words exhausted")]
    Exhausted { max_words: usize },

    /// A filter rejected every candidate.
    #[error("failed to find a suitable value in {tries} tries")]
    Unsatisfied { tries: usize },

    /// A collection rejected too many elements before reaching its minimum size.
    #[error("too many rejected elements in {label}")]
    TooManyRejections { label: String },

    /// The property called `assume` with a false condition.
    #[error("assumption failed: {0}")]
    Assumption(String),
}

/// Source position of an assertion or panic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Site {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl Site {
    pub fn new(file: &str, line: u32, column: u32) -> Self {
        Site {
            file: file.to_string(),
            line,
            column,
        }
    }
}

impl From<&std::panic::Location<'_>> for Site {
    fn from(location: &std::panic::Location<'_>) -> Self {
        Site::new(location.file(), location.line(), location.column())
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// How a failing execution failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The property reported a failure through `Err`.
    Assertion,
    /// The property or a generator panicked.
    RuntimeFault,
}

/// Where a runtime fault was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultOrigin {
    /// Inside quill itself, e.g. a decoder invariant.
    Engine,
    /// In the property, a generator closure, or a library it calls.
    User,
}

/// A failed execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
    pub site: Option<Site>,
    /// Only set for runtime faults.
    pub origin: Option<FaultOrigin>,
    /// Captured backtrace of a runtime fault (respects `RUST_BACKTRACE`).
    pub backtrace: Option<String>,
    /// Generator groups open when the failure happened, innermost last.
    pub generator_path: Vec<String>,
}

impl Failure {
    /// An assertion failure raised at `site`.
    pub fn assertion(message: impl Into<String>, site: Site) -> Self {
        Failure {
            kind: FailureKind::Assertion,
            message: message.into(),
            site: Some(site),
            origin: None,
            backtrace: None,
            generator_path: Vec::new(),
        }
    }

    /// Failures with the same key are considered the same bug while shrinking.
    pub fn key(&self) -> (FailureKind, Option<&Site>) {
        (self.kind, self.site.as_ref())
    }

    pub fn title(&self) -> String {
        let kind = match (self.kind, self.origin) {
            (FailureKind::Assertion, _) => "Assertion Failure",
            (FailureKind::RuntimeFault, Some(FaultOrigin::Engine)) => "Engine Fault",
            (FailureKind::RuntimeFault, _) => "Runtime Fault",
        };
        match &self.site {
            Some(site) => format!("{kind} at {site}"),
            None => kind.to_string(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title(), self.message)
    }
}

/// Early exit from a draw or a property.
#[derive(Debug, Clone, PartialEq)]
pub enum Stop {
    Invalid(Invalid),
    Failed(Failure),
}

impl From<Invalid> for Stop {
    fn from(invalid: Invalid) -> Self {
        Stop::Invalid(invalid)
    }
}

impl From<Failure> for Stop {
    fn from(failure: Failure) -> Self {
        Stop::Failed(failure)
    }
}

impl fmt::Display for Stop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stop::Invalid(invalid) => write!(f, "invalid: {invalid}"),
            Stop::Failed(failure) => write!(f, "{failure}"),
        }
    }
}

impl std::error::Error for Stop {}

/// A top-level value drawn by a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drawn {
    pub label: String,
    pub value: String,
}

impl fmt::Display for Drawn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.label.is_empty() {
            write!(f, "{}", self.value)
        } else {
            write!(f, "{} = {}", self.label, self.value)
        }
    }
}

/// Render a list of draws on one line.
pub fn render_draws(draws: &[Drawn]) -> String {
    if draws.is_empty() {
        return "(no draws)".to_string();
    }
    draws
        .iter()
        .map(|drawn| drawn.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A shrinking step in the failure progression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShrinkStep {
    /// The counterexample value at this step.
    pub counterexample: String,
    /// The step number (0 = original, 1+ = accepted shrinks).
    pub step: usize,
    /// Words recorded for this step.
    pub bits: Vec<u64>,
    /// Shrink move that produced this step.
    pub pass: &'static str,
}

/// Outcome of a property test.
#[derive(Debug, Clone, PartialEq)]
pub enum TestResult {
    /// Test passed successfully.
    Pass {
        tests_run: usize,
        discarded: usize,
        seed: u64,
        property_name: Option<String>,
        module_path: Option<String>,
    },

    /// Test failed with a counterexample.
    Fail {
        counterexample: String,
        draws: Vec<Drawn>,
        /// Minimal replayable word sequence.
        bits: Vec<u64>,
        failure: Failure,
        /// Rendered group structure of the minimal case.
        trace: String,
        tests_run: usize,
        shrinks_performed: usize,
        seed: u64,
        property_name: Option<String>,
        module_path: Option<String>,
        /// The shrinking progression showing how we reached the minimal counterexample.
        shrink_steps: Vec<ShrinkStep>,
    },

    /// Too many test cases were discarded.
    Discard {
        limit: usize,
        tests_run: usize,
        reason: Invalid,
        seed: u64,
        property_name: Option<String>,
        module_path: Option<String>,
    },
}

/// Shrink steps shown in a failure report.
const REPORTED_STEPS: usize = 10;

impl TestResult {
    pub fn is_pass(&self) -> bool {
        matches!(self, TestResult::Pass { .. })
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, TestResult::Fail { .. })
    }

    /// Convert into a `Result`, keeping pass counts.
    pub fn into_result(self) -> Result<usize> {
        match self {
            TestResult::Pass { tests_run, .. } => Ok(tests_run),
            TestResult::Fail {
                counterexample,
                tests_run,
                shrinks_performed,
                ..
            } => Err(QuillError::PropertyFailed {
                counterexample,
                tests_run,
                shrinks_performed,
            }),
            TestResult::Discard { limit, reason, .. } => {
                Err(QuillError::TooManyDiscards { limit, reason })
            }
        }
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestResult::Pass {
                tests_run,
                discarded,
                property_name,
                module_path,
                ..
            } => {
                if let Some(module) = module_path {
                    writeln!(f, "━━━ {} ━━━", module)?;
                }

                let prop_name = property_name.as_deref().unwrap_or("property");
                write!(f, "  ✓ {} passed {} tests", prop_name, tests_run)?;
                if *discarded > 0 {
                    write!(f, " ({} discarded)", discarded)?;
                }
                write!(f, ".")
            }
            TestResult::Fail {
                counterexample,
                draws,
                bits,
                failure,
                trace,
                tests_run,
                shrinks_performed,
                seed,
                property_name,
                module_path,
                shrink_steps,
            } => {
                if let Some(module) = module_path {
                    writeln!(f, "━━━ {} ━━━", module)?;
                }

                let prop_name = property_name.as_deref().unwrap_or("property");
                writeln!(
                    f,
                    "  ✗ {} failed after {} tests and {} shrinks.",
                    prop_name, tests_run, shrinks_performed
                )?;

                if !shrink_steps.is_empty() {
                    writeln!(f)?;
                    writeln!(f, "    Shrinking progression:")?;
                    let skipped = shrink_steps.len().saturating_sub(REPORTED_STEPS);
                    if skipped > 0 {
                        writeln!(f, "      │ Original: {}", shrink_steps[0].counterexample)?;
                        writeln!(f, "      │ … {} more steps", skipped - 1)?;
                    }
                    for step in &shrink_steps[skipped..] {
                        if step.step == 0 {
                            writeln!(f, "      │ Original: {}", step.counterexample)?;
                        } else {
                            writeln!(
                                f,
                                "      │ Step {} ({}): {}",
                                step.step, step.pass, step.counterexample
                            )?;
                        }
                    }
                    writeln!(f)?;
                }

                writeln!(f, "    === {} ===", failure.title())?;
                writeln!(f, "    {}", failure.message)?;
                if !failure.generator_path.is_empty() {
                    writeln!(f, "    while drawing: {}", failure.generator_path.join(" → "))?;
                }
                if let Some(backtrace) = &failure.backtrace {
                    writeln!(f, "    backtrace:")?;
                    for line in backtrace.lines() {
                        writeln!(f, "      {}", line)?;
                    }
                }

                if !draws.is_empty() {
                    writeln!(f)?;
                    writeln!(f, "    Draws:")?;
                    for drawn in draws {
                        writeln!(f, "      {}", drawn)?;
                    }
                }
                if !trace.is_empty() {
                    writeln!(f)?;
                    writeln!(f, "    Draw structure:")?;
                    for line in trace.lines() {
                        writeln!(f, "      {}", line)?;
                    }
                }

                writeln!(f)?;
                writeln!(f, "    Replay bits: {:x?}", bits)?;
                writeln!(f, "    Seed: {}", seed)?;
                write!(f, "    Minimal counterexample: {}", counterexample)
            }
            TestResult::Discard {
                limit,
                tests_run,
                reason,
                property_name,
                module_path,
                ..
            } => {
                if let Some(module) = module_path {
                    writeln!(f, "━━━ {} ━━━", module)?;
                }

                let prop_name = property_name.as_deref().unwrap_or("property");
                write!(
                    f,
                    "  ⚐ {} gave up after {} discards and {} passed tests ({})",
                    prop_name, limit, tests_run, reason
                )
            }
        }
    }
}
