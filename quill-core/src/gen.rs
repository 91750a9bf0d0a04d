//! Generator combinators for property-based testing.

use crate::bits::GroupLabel;
use crate::case::Case;
use crate::decode::{flip_biased_coin, gen_index, gen_int_range, gen_uint_range, gen_weighted_index};
use crate::error::{Invalid, QuillError, Result, Stop};
use std::fmt;
use std::fmt::Debug;
use std::sync::Arc;

const FILTER_LABEL: &str = "try";
const ONE_OF_LABEL: &str = "oneof";

type DrawFn<T> = dyn Fn(&mut Case) -> std::result::Result<T, Stop> + Send + Sync;

/// A generator for test data of type `T`.
///
/// A generator is a name plus a decoder reading from the bit stream of the
/// current [`Case`]. Decoding is a pure function of the bits consumed, so
/// replaying the same bits always reproduces the same value.
pub struct Gen<T> {
    name: Arc<str>,
    draw: Arc<DrawFn<T>>,
}

impl<T> Clone for Gen<T> {
    fn clone(&self) -> Self {
        Gen {
            name: Arc::clone(&self.name),
            draw: Arc::clone(&self.draw),
        }
    }
}

impl<T> fmt::Debug for Gen<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Gen").field(&self.name).finish()
    }
}

impl<T> fmt::Display for Gen<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Unwrap a generator constructor result, panicking with its message.
#[track_caller]
pub(crate) fn must<T>(gen: Result<Gen<T>>) -> Gen<T> {
    match gen {
        Ok(gen) => gen,
        Err(err) => panic!("{err}"),
    }
}

pub(crate) fn invalid_generator(message: impl Into<String>) -> QuillError {
    QuillError::InvalidGenerator {
        message: message.into(),
    }
}

/// Short form of a type name, without module paths.
pub(crate) fn short_type_name<T>() -> String {
    let full = std::any::type_name::<T>();
    let mut short = String::with_capacity(full.len());
    let mut path = String::new();
    for c in full.chars() {
        if c.is_alphanumeric() || c == '_' || c == ':' {
            path.push(c);
        } else {
            short.push_str(path.rsplit("::").next().unwrap_or_default());
            path.clear();
            short.push(c);
        }
    }
    short.push_str(path.rsplit("::").next().unwrap_or_default());
    short
}

impl<T> Gen<T> {
    /// Create a new generator from a name and a decoding function.
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut Case) -> std::result::Result<T, Stop> + Send + Sync + 'static,
    {
        Gen {
            name: Arc::from(name.into()),
            draw: Arc::new(f),
        }
    }

    /// Human-readable description of how this generator was built.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the generator's name.
    pub fn named(self, name: impl Into<String>) -> Self {
        Gen {
            name: Arc::from(name.into()),
            draw: self.draw,
        }
    }

    /// Decode one value inside a group labeled with this generator's name.
    pub fn draw_in(&self, case: &mut Case) -> std::result::Result<T, Stop> {
        let group = case
            .bits()
            .begin_group(GroupLabel::Gen(Arc::clone(&self.name)), true);
        let value = (self.draw)(case);
        case.bits().end_group(group, false);
        value
    }
}

impl<T> Gen<T>
where
    T: 'static,
{
    /// A generator built from arbitrary draws.
    ///
    /// ```
    /// use quill_core::*;
    ///
    /// let ordered = Gen::custom(|case| {
    ///     let lo = case.draw(&Gen::<i32>::range(0, 100), "lo")?;
    ///     let hi = case.draw(&Gen::<i32>::range(lo, 200), "hi")?;
    ///     Ok((lo, hi))
    /// });
    /// assert_eq!(ordered.name(), "custom::<(i32, i32)>");
    /// ```
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&mut Case) -> std::result::Result<T, Stop> + Send + Sync + 'static,
    {
        Gen::new(format!("custom::<{}>", short_type_name::<T>()), f)
    }

    /// Map a function over the generated values.
    pub fn map<U, F>(self, f: F) -> Gen<U>
    where
        F: Fn(T) -> U + Send + Sync + 'static,
        U: 'static,
    {
        let name = format!("{}.map::<{}>()", self.name, short_type_name::<U>());
        Gen::new(name, move |case| Ok(f(self.draw_in(case)?)))
    }

    /// Bind/flatmap for dependent generation.
    pub fn bind<U, F>(self, f: F) -> Gen<U>
    where
        F: Fn(T) -> Gen<U> + Send + Sync + 'static,
        U: 'static,
    {
        let name = format!("{}.bind::<{}>()", self.name, short_type_name::<U>());
        Gen::new(name, move |case| {
            let value = self.draw_in(case)?;
            f(value).draw_in(case)
        })
    }

    /// Filter generated values by a predicate.
    ///
    /// Each attempt is a separate group; rejected attempts are marked as
    /// discarded so the shrinker deletes them first. When every attempt is
    /// rejected the execution is invalid rather than failed.
    pub fn filter<F>(self, predicate: F) -> Gen<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let name = format!("{}.filter(..)", self.name);
        Gen::new(name, move |case| {
            let tries = case.filter_tries();
            for _ in 0..tries {
                let group = case.bits().begin_group(FILTER_LABEL, false);
                let value = self.draw_in(case);
                let rejected = matches!(&value, Ok(value) if !predicate(value));
                case.bits().end_group(group, rejected);
                let value = value?;
                if !rejected {
                    return Ok(value);
                }
            }
            Err(Invalid::Unsatisfied { tries }.into())
        })
    }

    /// Pick one of `gens`, preferring earlier ones.
    #[track_caller]
    pub fn one_of(gens: Vec<Gen<T>>) -> Self {
        must(Self::try_one_of(gens))
    }

    pub fn try_one_of(gens: Vec<Gen<T>>) -> Result<Self> {
        if gens.is_empty() {
            return Err(invalid_generator("one_of requires at least one generator"));
        }
        let names: Vec<&str> = gens.iter().map(|gen| gen.name()).collect();
        let name = format!("one_of({})", names.join(", "));
        Ok(Gen::new(name, move |case| {
            let group = case.bits().begin_group(ONE_OF_LABEL, false);
            let index = gen_index(case.bits(), gens.len(), true);
            case.bits().end_group(group, false);
            gens[index?].draw_in(case)
        }))
    }

    /// Pick one of `gens` with probability proportional to its weight.
    #[track_caller]
    pub fn frequency(gens: Vec<(u64, Gen<T>)>) -> Self {
        must(Self::try_frequency(gens))
    }

    pub fn try_frequency(gens: Vec<(u64, Gen<T>)>) -> Result<Self> {
        let total = gens
            .iter()
            .try_fold(0u64, |total, (weight, _)| total.checked_add(*weight));
        match total {
            None => return Err(invalid_generator("frequency weights overflow")),
            Some(0) => return Err(invalid_generator("frequency requires a positive total weight")),
            Some(_) => {}
        }

        let names: Vec<String> = gens
            .iter()
            .map(|(weight, gen)| format!("{weight}: {}", gen.name()))
            .collect();
        let name = format!("frequency({})", names.join(", "));
        let (weights, gens): (Vec<u64>, Vec<Gen<T>>) = gens.into_iter().unzip();
        Ok(Gen::new(name, move |case| {
            let group = case.bits().begin_group(ONE_OF_LABEL, false);
            let index = gen_weighted_index(case.bits(), &weights);
            case.bits().end_group(group, false);
            gens[index?].draw_in(case)
        }))
    }

    /// Generate optional values. The zero bit pattern decodes to `None`;
    /// with `allow_none == false` the value is always present and no coin is
    /// drawn.
    pub fn option_of(gen: Gen<T>, allow_none: bool) -> Gen<Option<T>> {
        let name = if allow_none {
            format!("option_of({})", gen.name())
        } else {
            format!("some_of({})", gen.name())
        };
        Gen::new(name, move |case| {
            if allow_none && !flip_biased_coin(case.bits(), 0.5)? {
                return Ok(None);
            }
            Ok(Some(gen.draw_in(case)?))
        })
    }

    /// Draw generators left to right and combine the values into a tuple.
    ///
    /// ```
    /// use quill_core::*;
    ///
    /// let point = Gen::tuple((Gen::<i32>::any(), Gen::<i32>::any(), Gen::bool()));
    /// assert_eq!(point.name(), "tuple(i32s(), i32s(), bool())");
    /// ```
    pub fn tuple<G>(gens: G) -> Gen<T>
    where
        G: GenTuple<Output = T>,
    {
        gens.into_gen()
    }
}

impl<A: 'static, B: 'static> Gen<(A, B)> {
    /// Generate pairs from two generators.
    pub fn tuple_of(first: Gen<A>, second: Gen<B>) -> Self {
        Gen::tuple((first, second))
    }
}

impl<T> Gen<T>
where
    T: Clone + Debug + Send + Sync + 'static,
{
    /// Create a generator that always produces the same value.
    pub fn just(value: T) -> Self {
        Gen::new(format!("just({value:?})"), move |_case| Ok(value.clone()))
    }

    /// Create a generator that always produces the same value.
    pub fn constant(value: T) -> Self {
        Self::just(value)
    }

    /// Pick one of `values`, preferring earlier ones.
    #[track_caller]
    pub fn sampled_from(values: Vec<T>) -> Self {
        must(Self::try_sampled_from(values))
    }

    pub fn try_sampled_from(values: Vec<T>) -> Result<Self> {
        if values.is_empty() {
            return Err(invalid_generator("sampled_from requires at least one value"));
        }
        let name = format!("sampled_from({values:?})");
        Ok(Gen::new(name, move |case| {
            let index = gen_index(case.bits(), values.len(), true)?;
            Ok(values[index].clone())
        }))
    }
}

/// Tuples of generators that can be drawn as one generator.
pub trait GenTuple {
    type Output;

    fn into_gen(self) -> Gen<Self::Output>;
}

macro_rules! impl_gen_tuple {
    ($($gen:ident: $t:ident),+) => {
        impl<$($t: 'static),+> GenTuple for ($(Gen<$t>,)+) {
            type Output = ($($t,)+);

            fn into_gen(self) -> Gen<Self::Output> {
                let ($($gen,)+) = self;
                let names = [$($gen.name()),+];
                let name = format!("tuple({})", names.join(", "));
                Gen::new(name, move |case| Ok(($($gen.draw_in(case)?,)+)))
            }
        }
    };
}

impl_gen_tuple!(a: A, b: B);
impl_gen_tuple!(a: A, b: B, c: C);
impl_gen_tuple!(a: A, b: B, c: C, d: D);
impl_gen_tuple!(a: A, b: B, c: C, d: D, e: E);
impl_gen_tuple!(a: A, b: B, c: C, d: D, e: E, f: F);

/// Primitive generators.
impl Gen<bool> {
    /// Generate a random boolean.
    pub fn bool() -> Self {
        Gen::new("bool()", |case| Ok(case.bits().draw_bits(1)? == 1))
    }
}

impl Gen<u8> {
    /// Generate a uniformly distributed byte.
    pub fn byte() -> Self {
        Gen::new("byte()", |case| Ok(case.bits().draw_bits(8)? as u8))
    }
}

fn range_name<T: PartialEq + fmt::Display>(prefix: &str, min: T, max: T, lowest: T, highest: T) -> String {
    match (min != lowest, max != highest) {
        (true, true) => format!("{prefix}_range({min}, {max})"),
        (true, false) => format!("{prefix}_min({min})"),
        (false, true) => format!("{prefix}_max({max})"),
        (false, false) => format!("{prefix}s()"),
    }
}

macro_rules! int_gens {
    ($($t:ident => $draw:ident as $wide:ty),+ $(,)?) => {
        $(
            impl Gen<$t> {
                /// Generate integers over the whole domain, biased toward small
                /// magnitudes and the domain bounds.
                pub fn any() -> Self {
                    Self::range($t::MIN, $t::MAX)
                }

                /// Generate integers in `[min, max]`.
                ///
                /// # Panics
                ///
                /// Panics if `min > max`.
                #[track_caller]
                pub fn range(min: $t, max: $t) -> Self {
                    must(Self::try_range(min, max))
                }

                pub fn try_range(min: $t, max: $t) -> Result<Self> {
                    if min > max {
                        return Err(invalid_generator(format!(
                            "invalid range [{min}, {max}] for {}",
                            stringify!($t)
                        )));
                    }
                    let name = range_name(stringify!($t), min, max, $t::MIN, $t::MAX);
                    Ok(Gen::new(name, move |case| {
                        let value = $draw(case.bits(), min as $wide, max as $wide, true)?;
                        Ok(value as $t)
                    }))
                }

                /// Generate integers greater than or equal to `min`.
                #[track_caller]
                pub fn at_least(min: $t) -> Self {
                    Self::range(min, $t::MAX)
                }

                /// Generate integers less than or equal to `max`.
                #[track_caller]
                pub fn at_most(max: $t) -> Self {
                    Self::range($t::MIN, max)
                }
            }
        )+
    };
}

int_gens!(
    i8 => gen_int_range as i64,
    i16 => gen_int_range as i64,
    i32 => gen_int_range as i64,
    i64 => gen_int_range as i64,
    isize => gen_int_range as i64,
    u8 => gen_uint_range as u64,
    u16 => gen_uint_range as u64,
    u32 => gen_uint_range as u64,
    u64 => gen_uint_range as u64,
    usize => gen_uint_range as u64,
);
