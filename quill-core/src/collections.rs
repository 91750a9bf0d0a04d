//! Collection generators.
//!
//! Collections are drawn one element at a time. Every element is a
//! standalone group that starts with a continue coin, so deleting an element
//! group leaves a stream that still decodes to a (shorter) collection.

use crate::bits::{BitStream, GroupToken};
use crate::case::Case;
use crate::decode::flip_biased_coin;
use crate::error::{Invalid, Result, Stop};
use crate::gen::{invalid_generator, must, Gen};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

pub(crate) const ELEMENT_LABEL: &str = "elem";

/// Average length used when the maximum leaves room for it.
const SMALL_AVERAGE: f64 = 10.0;

/// Rejections tolerated before a collection stops growing.
const MIN_REJECTIONS: usize = 10;

/// Continue-coin bookkeeping for one collection draw.
pub(crate) struct Repeat {
    min: usize,
    max: usize,
    p_continue: f64,
    count: usize,
    rejections: usize,
    rejected: bool,
    force_stop: bool,
    group: Option<GroupToken>,
    label: String,
}

impl Repeat {
    pub(crate) fn new(min: usize, max: usize, label: &str) -> Self {
        let average = average_len(min, max);
        Repeat {
            min,
            max,
            p_continue: 1.0 - 1.0 / (1.0 + average - min as f64),
            count: 0,
            rejections: 0,
            rejected: false,
            force_stop: false,
            group: None,
            label: label.to_string(),
        }
    }

    /// Whether another element should be drawn. Opens the element's group.
    pub(crate) fn more(&mut self, bits: &mut BitStream) -> std::result::Result<bool, Invalid> {
        if let Some(group) = self.group.take() {
            bits.end_group(group, self.rejected);
            self.rejected = false;
        }

        let p = if self.force_stop || self.count >= self.max {
            0.0
        } else if self.count < self.min {
            1.0
        } else {
            self.p_continue
        };

        let group = bits.begin_group(ELEMENT_LABEL, true);
        match flip_biased_coin(bits, p) {
            Ok(true) => {
                self.count += 1;
                self.group = Some(group);
                Ok(true)
            }
            Ok(false) => {
                bits.end_group(group, false);
                Ok(false)
            }
            Err(invalid) => {
                bits.end_group(group, false);
                Err(invalid)
            }
        }
    }

    /// The element just drawn was not kept.
    pub(crate) fn reject(&mut self) -> std::result::Result<(), Invalid> {
        debug_assert!(self.count > 0);
        self.count -= 1;
        self.rejections += 1;
        self.rejected = true;

        if self.rejections > MIN_REJECTIONS.max(self.count * 2) {
            if self.count >= self.min {
                self.force_stop = true;
            } else {
                return Err(Invalid::TooManyRejections {
                    label: self.label.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Default average length for a collection with the given bounds.
pub(crate) fn average_len(min: usize, max: usize) -> f64 {
    let (min, max) = (min as f64, max as f64);
    min + f64::min(f64::max(min, SMALL_AVERAGE), (max - min) / 2.0)
}

/// Resolve optional bounds, rejecting inverted ones.
pub(crate) fn bounds(min: Option<usize>, max: Option<usize>, what: &str) -> Result<(usize, usize)> {
    let min = min.unwrap_or(0);
    let max = max.unwrap_or(usize::MAX);
    if min > max {
        return Err(invalid_generator(format!(
            "invalid {what} length bounds [{min}, {max}]"
        )));
    }
    Ok((min, max))
}

pub(crate) fn bound_name(bound: Option<usize>) -> String {
    bound.map_or_else(|| "..".to_string(), |bound| bound.to_string())
}

/// Draw up to the bounds, keeping elements that `keep` accepts.
fn draw_repeated<T, F>(
    case: &mut Case,
    elem: &Gen<T>,
    min: usize,
    max: usize,
    label: &str,
    mut keep: F,
) -> std::result::Result<(), Stop>
where
    F: FnMut(T) -> bool,
{
    let mut repeat = Repeat::new(min, max, label);
    while repeat.more(case.bits())? {
        let value = elem.draw_in(case)?;
        if !keep(value) {
            repeat.reject()?;
        }
    }
    Ok(())
}

impl<T> Gen<Vec<T>>
where
    T: 'static,
{
    /// Generate vectors of any length.
    pub fn vec_of(elem: Gen<T>) -> Self {
        let name = format!("vec_of({})", elem.name());
        Self::vec_of_n(elem, None, None).named(name)
    }

    /// Generate vectors with a length in `[min, max]`; `None` means unbounded.
    #[track_caller]
    pub fn vec_of_n(elem: Gen<T>, min: Option<usize>, max: Option<usize>) -> Self {
        must(Self::try_vec_of_n(elem, min, max))
    }

    pub fn try_vec_of_n(elem: Gen<T>, min: Option<usize>, max: Option<usize>) -> Result<Self> {
        let (lo, hi) = bounds(min, max, "vec")?;
        let name = format!(
            "vec_of_n({}, {}, {})",
            elem.name(),
            bound_name(min),
            bound_name(max)
        );
        Ok(Gen::new(name.clone(), move |case| {
            let mut values = Vec::new();
            draw_repeated(case, &elem, lo, hi, &name, |value| {
                values.push(value);
                true
            })?;
            Ok(values)
        }))
    }
}

impl<T> Gen<HashSet<T>>
where
    T: Eq + Hash + 'static,
{
    pub fn hash_set_of(elem: Gen<T>) -> Self {
        let name = format!("hash_set_of({})", elem.name());
        Self::hash_set_of_n(elem, None, None).named(name)
    }

    /// Generate sets with a size in `[min, max]`. Duplicate draws are rejected.
    #[track_caller]
    pub fn hash_set_of_n(elem: Gen<T>, min: Option<usize>, max: Option<usize>) -> Self {
        must(Self::try_hash_set_of_n(elem, min, max))
    }

    pub fn try_hash_set_of_n(elem: Gen<T>, min: Option<usize>, max: Option<usize>) -> Result<Self> {
        let (lo, hi) = bounds(min, max, "hash set")?;
        let name = format!(
            "hash_set_of_n({}, {}, {})",
            elem.name(),
            bound_name(min),
            bound_name(max)
        );
        Ok(Gen::new(name.clone(), move |case| {
            let mut set = HashSet::new();
            draw_repeated(case, &elem, lo, hi, &name, |value| set.insert(value))?;
            Ok(set)
        }))
    }
}

impl<K, V> Gen<HashMap<K, V>>
where
    K: Eq + Hash + 'static,
    V: 'static,
{
    pub fn hash_map_of(keys: Gen<K>, values: Gen<V>) -> Self {
        let name = format!("hash_map_of({}, {})", keys.name(), values.name());
        Self::hash_map_of_n(keys, values, None, None).named(name)
    }

    /// Generate maps with a size in `[min, max]`. Entries whose key was
    /// already drawn are rejected.
    #[track_caller]
    pub fn hash_map_of_n(
        keys: Gen<K>,
        values: Gen<V>,
        min: Option<usize>,
        max: Option<usize>,
    ) -> Self {
        must(Self::try_hash_map_of_n(keys, values, min, max))
    }

    pub fn try_hash_map_of_n(
        keys: Gen<K>,
        values: Gen<V>,
        min: Option<usize>,
        max: Option<usize>,
    ) -> Result<Self> {
        let (lo, hi) = bounds(min, max, "hash map")?;
        let name = format!(
            "hash_map_of_n({}, {}, {}, {})",
            keys.name(),
            values.name(),
            bound_name(min),
            bound_name(max)
        );
        let entries = Gen::tuple_of(keys, values);
        Ok(Gen::new(name.clone(), move |case| {
            let mut map = HashMap::new();
            draw_repeated(case, &entries, lo, hi, &name, |(key, value)| {
                if map.contains_key(&key) {
                    return false;
                }
                map.insert(key, value);
                true
            })?;
            Ok(map)
        }))
    }

    /// Generate maps by drawing values and deriving each key from its value.
    ///
    /// ```
    /// use quill_core::*;
    ///
    /// let by_len = Gen::hash_map_of_n_values(
    ///     Gen::<String>::ascii_alpha(),
    ///     Some(1),
    ///     Some(5),
    ///     |s: &String| s.len(),
    /// );
    /// assert!(by_len.name().starts_with("hash_map_of_n_values("));
    /// ```
    #[track_caller]
    pub fn hash_map_of_n_values<F>(
        values: Gen<V>,
        min: Option<usize>,
        max: Option<usize>,
        key_fn: F,
    ) -> Self
    where
        F: Fn(&V) -> K + Send + Sync + 'static,
    {
        must(Self::try_hash_map_of_n_values(values, min, max, key_fn))
    }

    pub fn try_hash_map_of_n_values<F>(
        values: Gen<V>,
        min: Option<usize>,
        max: Option<usize>,
        key_fn: F,
    ) -> Result<Self>
    where
        F: Fn(&V) -> K + Send + Sync + 'static,
    {
        let (lo, hi) = bounds(min, max, "hash map")?;
        let name = format!(
            "hash_map_of_n_values({}, {}, {})",
            values.name(),
            bound_name(min),
            bound_name(max)
        );
        Ok(Gen::new(name.clone(), move |case| {
            let mut map = HashMap::new();
            draw_repeated(case, &values, lo, hi, &name, |value| {
                let key = key_fn(&value);
                if map.contains_key(&key) {
                    return false;
                }
                map.insert(key, value);
                true
            })?;
            Ok(map)
        }))
    }
}
