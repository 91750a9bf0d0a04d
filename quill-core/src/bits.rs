//! Replayable bit streams backing a single property execution.
//!
//! Every value a generator produces is decoded from a sequence of 64-bit
//! words. In random mode the words come from a seeded PRNG and are recorded as
//! they are consumed; in replay mode they come from a previously recorded
//! sequence. Generators bracket their consumption with labeled groups, which
//! is what lets the shrinker delete or zero whole sub-draws at once.

use crate::data::Seed;
use crate::error::{Invalid, QuillError, Result};
use rand::{rngs::StdRng, RngCore, SeedableRng};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Mask with the lowest `n` bits set (`n <= 64`).
pub fn bitmask64(n: u32) -> u64 {
    debug_assert!(n <= 64, "bitmask64({n})");
    if n >= 64 {
        u64::MAX
    } else {
        (1u64 << n) - 1
    }
}

/// Label attached to a group of words.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupLabel {
    /// A fixed label used by the engine's own decoders.
    Internal(&'static str),
    /// The name of a generator.
    Gen(Arc<str>),
}

impl GroupLabel {
    pub fn as_str(&self) -> &str {
        match self {
            GroupLabel::Internal(label) => label,
            GroupLabel::Gen(name) => name,
        }
    }
}

impl fmt::Display for GroupLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&'static str> for GroupLabel {
    fn from(label: &'static str) -> Self {
        GroupLabel::Internal(label)
    }
}

/// A labeled span of the recorded words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub label: GroupLabel,
    /// Offset of the first word consumed inside the group.
    pub begin: usize,
    /// Offset one past the last word, `None` while the group is open.
    pub end: Option<usize>,
    /// Index of the enclosing group.
    pub parent: Option<usize>,
    /// Generator-boundary group, as opposed to a sub-field of one draw.
    pub standalone: bool,
    /// The value drawn inside was rejected (filter retry, duplicate key).
    pub discard: bool,
}

impl Group {
    /// Closed span, if the group was ended.
    pub fn span(&self) -> Option<(usize, usize)> {
        self.end.map(|end| (self.begin, end))
    }

    pub fn is_empty(&self) -> bool {
        self.end.map_or(true, |end| end == self.begin)
    }
}

/// Handle returned by [`BitStream::begin_group`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupToken(usize);

enum Mode {
    Random { rng: StdRng, max_words: usize },
    Replay { buf: Vec<u64>, cursor: usize },
}

/// Source of bits for one execution.
pub struct BitStream {
    mode: Mode,
    data: Vec<u64>,
    groups: Vec<Group>,
    open: Vec<usize>,
}

impl BitStream {
    /// Fresh pseudorandom stream with a budget of `max_words` words.
    pub fn random(seed: Seed, max_words: usize) -> Self {
        BitStream {
            mode: Mode::Random {
                rng: StdRng::seed_from_u64(seed.0 ^ seed.1.rotate_left(32)),
                max_words,
            },
            data: Vec::new(),
            groups: Vec::new(),
            open: Vec::new(),
        }
    }

    /// Stream that replays `words` and fails with [`Invalid::Overrun`] past their end.
    pub fn replay(words: Vec<u64>) -> Self {
        BitStream {
            mode: Mode::Replay {
                buf: words,
                cursor: 0,
            },
            data: Vec::new(),
            groups: Vec::new(),
            open: Vec::new(),
        }
    }

    /// Draw the next word, keeping only its lowest `width` bits.
    pub fn draw_bits(&mut self, width: u32) -> std::result::Result<u64, Invalid> {
        debug_assert!(width <= 64, "draw_bits({width})");
        if width == 0 {
            return Ok(0);
        }

        let raw = match &mut self.mode {
            Mode::Random { rng, max_words } => {
                if self.data.len() >= *max_words {
                    return Err(Invalid::Exhausted {
                        max_words: *max_words,
                    });
                }
                rng.next_u64()
            }
            Mode::Replay { buf, cursor } => {
                let word = buf.get(*cursor).copied().ok_or(Invalid::Overrun)?;
                *cursor += 1;
                word
            }
        };

        let value = raw & bitmask64(width);
        self.data.push(value);
        Ok(value)
    }

    /// Open a group at the current position.
    pub fn begin_group(&mut self, label: impl Into<GroupLabel>, standalone: bool) -> GroupToken {
        let index = self.groups.len();
        self.groups.push(Group {
            label: label.into(),
            begin: self.data.len(),
            end: None,
            parent: self.open.last().copied(),
            standalone,
            discard: false,
        });
        self.open.push(index);
        GroupToken(index)
    }

    /// Close a group (and anything still open inside it).
    pub fn end_group(&mut self, token: GroupToken, discard: bool) {
        let GroupToken(index) = token;
        let Some(position) = self.open.iter().rposition(|&open| open == index) else {
            debug_assert!(false, "group {index} ended twice");
            return;
        };

        let end = self.data.len();
        for open in self.open.drain(position..) {
            self.groups[open].end = Some(end);
        }
        self.groups[index].discard = discard;
    }

    /// Labels of the generator groups still open, outermost first.
    pub fn open_generators(&self) -> Vec<String> {
        self.open
            .iter()
            .map(|&index| &self.groups[index])
            .filter(|group| group.standalone)
            .map(|group| group.label.to_string())
            .collect()
    }

    /// Words consumed so far.
    pub fn data(&self) -> &[u64] {
        &self.data
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Finish the stream; groups left open by a panic end at the last word.
    pub fn into_recording(mut self) -> Recording {
        let end = self.data.len();
        for group in self.groups.iter_mut().filter(|group| group.end.is_none()) {
            group.end = Some(end);
        }
        Recording {
            data: self.data,
            groups: self.groups,
        }
    }
}

/// Words and groups consumed by one execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recording {
    pub data: Vec<u64>,
    pub groups: Vec<Group>,
}

impl Recording {
    /// Opaque byte form of the words (little-endian).
    pub fn to_bytes(&self) -> Vec<u8> {
        self.data.iter().flat_map(|word| word.to_le_bytes()).collect()
    }

    /// Inverse of [`Recording::to_bytes`].
    pub fn words_from_bytes(bytes: &[u8]) -> Result<Vec<u64>> {
        if bytes.len() % 8 != 0 {
            return Err(QuillError::InvalidReplay {
                message: format!("{} bytes is not a whole number of words", bytes.len()),
            });
        }
        Ok(bytes
            .chunks_exact(8)
            .map(|chunk| {
                let mut word = [0u8; 8];
                word.copy_from_slice(chunk);
                u64::from_le_bytes(word)
            })
            .collect())
    }

    /// Children of `parent` (`None` for the roots), in recording order.
    pub fn children(&self, parent: Option<usize>) -> impl Iterator<Item = (usize, &Group)> + '_ {
        self.groups
            .iter()
            .enumerate()
            .filter(move |(_, group)| group.parent == parent)
    }
}

/// Order streams by simplicity: shorter first, then word-by-word.
pub fn compare_bits(a: &[u64], b: &[u64]) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
