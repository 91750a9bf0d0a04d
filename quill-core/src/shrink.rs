//! Minimisation of a failing bit stream.
//!
//! The shrinker never looks at values, only at the recorded words and the
//! groups the generators left around them. Every candidate is a rewritten word
//! sequence that is replayed against the property; it is adopted when it fails
//! the same way and records a strictly simpler stream.

use crate::bits::{compare_bits, Group, Recording};
use crate::data::Config;
use crate::error::{render_draws, Drawn, Failure, ShrinkStep};
use crate::property::{Outcome, Property};
use crate::tree::Tree;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, trace};

const ORIGINAL: &str = "original";
const DELETE_GROUP: &str = "delete_group";
const ZERO_GROUP: &str = "zero_group";
const MINIMIZE_WORD: &str = "minimize_word";
const MINIMIZE_DUPLICATES: &str = "minimize_duplicates";
const DEDUPE_SIBLINGS: &str = "dedupe_siblings";
const SORT_SIBLINGS: &str = "sort_siblings";

/// Values tried before anything smarter when minimising a word.
const SMALL_VALUES: u64 = 5;

/// A failing execution.
#[derive(Debug, Clone)]
pub struct Counterexample {
    pub failure: Failure,
    pub draws: Vec<Drawn>,
    pub recording: Recording,
}

/// Result of shrinking a counterexample.
#[derive(Debug, Clone)]
pub struct Shrunk {
    pub best: Counterexample,
    /// Accepted shrinks.
    pub shrinks: usize,
    /// Candidates replayed.
    pub tries: usize,
    /// The original counterexample followed by every accepted shrink.
    pub steps: Vec<ShrinkStep>,
}

pub struct Shrinker<'a> {
    property: &'a Property,
    config: &'a Config,
    best: Counterexample,
    cache: HashSet<Vec<u64>>,
    tries: usize,
    shrinks: usize,
    steps: Vec<ShrinkStep>,
}

impl<'a> Shrinker<'a> {
    pub fn new(property: &'a Property, config: &'a Config, failing: Counterexample) -> Self {
        let original = ShrinkStep {
            counterexample: render_draws(&failing.draws),
            step: 0,
            bits: failing.recording.data.clone(),
            pass: ORIGINAL,
        };
        let mut cache = HashSet::new();
        cache.insert(failing.recording.data.clone());
        Shrinker {
            property,
            config,
            best: failing,
            cache,
            tries: 0,
            shrinks: 0,
            steps: vec![original],
        }
    }

    /// Run shrink passes until one adopts nothing or the budget is spent.
    pub fn shrink(mut self) -> Shrunk {
        debug!(
            words = self.best.recording.data.len(),
            groups = self.best.recording.groups.len(),
            budget = self.config.shrink_limit,
            "shrinking"
        );

        loop {
            let before = self.shrinks;
            self.delete_groups();
            self.zero_groups();
            self.minimize_words();
            self.minimize_duplicates();
            self.reorder_siblings();
            if self.shrinks == before || self.exhausted() {
                break;
            }
        }

        info!(
            shrinks = self.shrinks,
            tries = self.tries,
            words = self.best.recording.data.len(),
            counterexample = %render_draws(&self.best.draws),
            "shrinking finished"
        );

        Shrunk {
            best: self.best,
            shrinks: self.shrinks,
            tries: self.tries,
            steps: self.steps,
        }
    }

    fn exhausted(&self) -> bool {
        self.tries >= self.config.shrink_limit
    }

    /// Replay `candidate`; adopt it if it still fails the same way.
    fn accept(&mut self, candidate: Vec<u64>, pass: &'static str) -> bool {
        if self.exhausted()
            || compare_bits(&candidate, &self.best.recording.data) != Ordering::Less
            || !self.cache.insert(candidate.clone())
        {
            return false;
        }

        self.tries += 1;
        let execution = self.property.replay_with(&candidate, self.config);
        let failure = match execution.outcome {
            Outcome::Failed(failure) => failure,
            outcome => {
                trace!(pass, ?outcome, "candidate rejected");
                return false;
            }
        };
        if failure.key() != self.best.failure.key() {
            trace!(pass, failure = %failure, "candidate fails differently");
            return false;
        }

        let recording = execution.recording;
        self.cache.insert(recording.data.clone());
        self.shrinks += 1;
        debug!(
            pass,
            shrinks = self.shrinks,
            words = recording.data.len(),
            groups = %Tree::from_recording(&recording).render_compact(),
            "adopted shrink"
        );
        self.steps.push(ShrinkStep {
            counterexample: render_draws(&execution.draws),
            step: self.shrinks,
            bits: recording.data.clone(),
            pass,
        });
        self.best = Counterexample {
            failure,
            draws: execution.draws,
            recording,
        };
        true
    }

    /// Non-empty spans of the groups selected by `select`, in recording order.
    fn spans(&self, select: impl Fn(&Group) -> bool) -> Vec<(usize, usize)> {
        let mut spans: Vec<(usize, usize)> = self
            .best
            .recording
            .groups
            .iter()
            .filter(|group| select(group))
            .filter_map(Group::span)
            .filter(|(begin, end)| begin < end)
            .collect();
        spans.dedup();
        spans
    }

    fn delete_groups(&mut self) {
        for discarded in [true, false] {
            let mut index = 0;
            while !self.exhausted() {
                let spans = self.spans(|group| {
                    if discarded {
                        group.discard
                    } else {
                        group.standalone && !group.discard
                    }
                });
                let Some(&(begin, end)) = spans.get(index) else {
                    break;
                };

                let data = &self.best.recording.data;
                let mut candidate = data[..begin].to_vec();
                candidate.extend_from_slice(&data[end..]);
                if !self.accept(candidate, DELETE_GROUP) {
                    index += 1;
                }
            }
        }
    }

    fn zero_groups(&mut self) {
        let mut index = 0;
        while !self.exhausted() {
            let spans = self.spans(|_| true);
            let Some(&(begin, end)) = spans.get(index) else {
                break;
            };

            let data = &self.best.recording.data;
            if data[begin..end].iter().any(|&word| word != 0) {
                let mut candidate = data.clone();
                candidate[begin..end].fill(0);
                if self.accept(candidate, ZERO_GROUP) {
                    continue;
                }
            }
            index += 1;
        }
    }

    fn minimize_words(&mut self) {
        let mut index = 0;
        while index < self.best.recording.data.len() && !self.exhausted() {
            let current = self.best.recording.data[index];
            minimize(current, |value| {
                let data = &self.best.recording.data;
                if index >= data.len() {
                    return false;
                }
                let mut candidate = data.clone();
                candidate[index] = value;
                self.accept(candidate, MINIMIZE_WORD)
            });
            index += 1;
        }
    }

    /// Lower every copy of a repeated non-zero word together.
    fn minimize_duplicates(&mut self) {
        let mut counts: BTreeMap<u64, usize> = BTreeMap::new();
        for &word in self.best.recording.data.iter().filter(|&&word| word != 0) {
            *counts.entry(word).or_default() += 1;
        }

        for (value, _) in counts.into_iter().filter(|&(_, count)| count > 1) {
            if self.exhausted() {
                break;
            }
            let positions: Vec<usize> = self
                .best
                .recording
                .data
                .iter()
                .enumerate()
                .filter(|&(_, &word)| word == value)
                .map(|(index, _)| index)
                .collect();
            if positions.len() < 2 {
                continue;
            }
            minimize(value, |lower| {
                let data = &self.best.recording.data;
                if positions.iter().any(|&index| index >= data.len()) {
                    return false;
                }
                let mut candidate = data.clone();
                for &index in &positions {
                    candidate[index] = lower;
                }
                self.accept(candidate, MINIMIZE_DUPLICATES)
            });
        }
    }

    fn reorder_siblings(&mut self) {
        let mut index = 0;
        while !self.exhausted() {
            let runs = sibling_runs(&self.best.recording);
            let Some(run) = runs.get(index) else {
                break;
            };

            let data = &self.best.recording.data;
            let (start, end) = (run[0].0, run[run.len() - 1].1);
            let elements: Vec<&[u64]> = run.iter().map(|&(b, e)| &data[b..e]).collect();

            let mut candidates = Vec::new();
            let mut deduped = elements.clone();
            deduped.dedup();
            if deduped.len() < elements.len() {
                candidates.push((splice(data, start, end, &deduped), DEDUPE_SIBLINGS));
            }
            let mut sorted = elements.clone();
            sorted.sort_by(|a, b| compare_bits(a, b));
            if sorted != elements {
                candidates.push((splice(data, start, end, &sorted), SORT_SIBLINGS));
            }

            let adopted = candidates
                .into_iter()
                .any(|(candidate, pass)| self.accept(candidate, pass));
            if !adopted {
                index += 1;
            }
        }
    }
}

/// `data` with `[start, end)` replaced by the concatenation of `parts`.
fn splice(data: &[u64], start: usize, end: usize, parts: &[&[u64]]) -> Vec<u64> {
    let mut out = data[..start].to_vec();
    for part in parts {
        out.extend_from_slice(part);
    }
    out.extend_from_slice(&data[end..]);
    out
}

/// Maximal runs (length two or more) of adjacent standalone siblings sharing a label.
fn sibling_runs(recording: &Recording) -> Vec<Vec<(usize, usize)>> {
    let mut families: BTreeMap<Option<usize>, Vec<&Group>> = BTreeMap::new();
    for group in &recording.groups {
        if group.standalone && !group.is_empty() {
            families.entry(group.parent).or_default().push(group);
        }
    }

    let mut runs = Vec::new();
    for siblings in families.values() {
        let mut run: Vec<(usize, usize)> = Vec::new();
        let mut label = None;
        for group in siblings {
            let Some((begin, end)) = group.span() else {
                continue;
            };
            let adjacent = run.last().is_some_and(|&(_, last_end)| last_end == begin);
            if label != Some(&group.label) || !adjacent {
                if run.len() > 1 {
                    runs.push(std::mem::take(&mut run));
                } else {
                    run.clear();
                }
            }
            run.push((begin, end));
            label = Some(&group.label);
        }
        if run.len() > 1 {
            runs.push(run);
        }
    }
    runs.sort_by_key(|run| run[0].0);
    runs
}

/// Smallest value `v <= u` the search finds with `cond(v)`, assuming `cond(u)`.
///
/// `cond` is only ever called with values below the best one found so far.
pub(crate) fn minimize(u: u64, mut cond: impl FnMut(u64) -> bool) -> u64 {
    for v in 0..u.min(SMALL_VALUES) {
        if cond(v) {
            return v;
        }
    }
    if u <= SMALL_VALUES {
        return u;
    }

    let mut best = u;
    while best >> 1 >= SMALL_VALUES && cond(best >> 1) {
        best >>= 1;
    }

    for bit in (0..64).rev() {
        let cleared = best & !(1u64 << bit);
        if cleared != best && cleared >= SMALL_VALUES && cond(cleared) {
            best = cleared;
        }
    }

    // Everything below SMALL_VALUES passed.
    let mut lo = SMALL_VALUES - 1;
    let mut hi = best;
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if cond(mid) {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    hi
}
