//! Character and string generators.

use crate::collections::{bound_name, bounds, Repeat};
use crate::decode::gen_uint_range;
use crate::error::Result;
use crate::gen::{invalid_generator, must, Gen};

const SURROGATES: u32 = 0x800;
const SURROGATE_START: u32 = 0xD800;

/// Position of `c` among the Unicode scalar values.
fn scalar_index(c: char) -> u32 {
    let u = c as u32;
    if u < SURROGATE_START {
        u
    } else {
        u - SURROGATES
    }
}

fn from_scalar_index(index: u32) -> char {
    let u = if index < SURROGATE_START {
        index
    } else {
        index + SURROGATES
    };
    char::from_u32(u).unwrap_or(char::REPLACEMENT_CHARACTER)
}

impl Gen<char> {
    /// Generate any Unicode scalar value, biased toward low code points.
    pub fn any() -> Self {
        Self::range('\0', char::MAX).named("chars()")
    }

    /// Generate characters in `[min, max]`, skipping surrogates.
    #[track_caller]
    pub fn range(min: char, max: char) -> Self {
        must(Self::try_range(min, max))
    }

    pub fn try_range(min: char, max: char) -> Result<Self> {
        if min > max {
            return Err(invalid_generator(format!(
                "invalid range [{min:?}, {max:?}] for char"
            )));
        }
        let (lo, hi) = (scalar_index(min) as u64, scalar_index(max) as u64);
        Ok(Gen::new(format!("char_range({min:?}, {max:?})"), move |case| {
            let index = gen_uint_range(case.bits(), lo, hi, true)?;
            Ok(from_scalar_index(index as u32))
        }))
    }

    /// Generate printable ASCII characters.
    pub fn ascii() -> Self {
        Self::range(' ', '~').named("ascii()")
    }

    pub fn ascii_alpha() -> Self {
        let letters = ('a'..='z').chain('A'..='Z').collect();
        Gen::sampled_from(letters).named("ascii_alpha()")
    }

    pub fn ascii_alphanumeric() -> Self {
        let chars = ('a'..='z').chain('A'..='Z').chain('0'..='9').collect();
        Gen::sampled_from(chars).named("ascii_alphanumeric()")
    }
}

impl Gen<String> {
    /// Generate strings of any length from `chars`.
    pub fn string_of(chars: Gen<char>) -> Self {
        let name = format!("string_of({})", chars.name());
        Self::string_of_n(chars, None, None).named(name)
    }

    /// Generate strings with a character count in `[min, max]`.
    #[track_caller]
    pub fn string_of_n(chars: Gen<char>, min: Option<usize>, max: Option<usize>) -> Self {
        must(Self::try_string_of_n(chars, min, max))
    }

    pub fn try_string_of_n(chars: Gen<char>, min: Option<usize>, max: Option<usize>) -> Result<Self> {
        let (lo, hi) = bounds(min, max, "string")?;
        let name = format!(
            "string_of_n({}, {}, {})",
            chars.name(),
            bound_name(min),
            bound_name(max)
        );
        Ok(Gen::new(name.clone(), move |case| {
            let mut s = String::new();
            let mut repeat = Repeat::new(lo, hi, &name);
            while repeat.more(case.bits())? {
                s.push(chars.draw_in(case)?);
            }
            Ok(s)
        }))
    }

    /// Generate strings of printable ASCII.
    pub fn ascii() -> Self {
        Self::string_of(Gen::<char>::ascii())
    }

    pub fn ascii_alpha() -> Self {
        Self::string_of(Gen::<char>::ascii_alpha())
    }
}
