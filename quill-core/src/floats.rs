//! Floating-point decoding.
//!
//! A float is decoded as a sign, an exponent and a significand, each drawn so
//! that zeroed words give simple values: small exponents, short integer parts
//! and fractions with few significant bits. Values are assembled in the `f64`
//! layout; `f32` draws restrict the exponent band and the significand width
//! so every result is exactly representable in `f32`.

use crate::bits::{bitmask64, BitStream};
use crate::decode::{flip_biased_coin, gen_int_range, gen_uint_range, gen_uint_range_width};
use crate::error::{Invalid, Result};
use crate::gen::{invalid_generator, must, Gen};
use std::fmt::Debug;

pub const F32_EXP_BITS: u32 = 8;
pub const F32_SIGNIF_BITS: u32 = 23;
pub const F64_EXP_BITS: u32 = 11;
pub const F64_SIGNIF_BITS: u32 = 52;

const FLOAT_EXP_LABEL: &str = "floatexp";
const FLOAT_SIGNIF_LABEL: &str = "floatsignif";

type Draw<T> = std::result::Result<T, Invalid>;

/// Number of fractional significand bits at unbiased exponent `e`.
pub fn ufloat_frac_bits(e: i32, signif_bits: u32) -> u32 {
    if e <= 0 {
        signif_bits
    } else if (e as u32) < signif_bits {
        signif_bits - e as u32
    } else {
        0
    }
}

/// Split `|f|` into `(exponent, integer significand, fractional significand)`
/// for a float layout with the given widths. The exponent is clamped to the
/// normal range of that layout.
pub fn ufloat_parts(f: f64, exp_bits: u32, signif_bits: u32) -> (i32, u64, u64) {
    let u = f.to_bits() & (i64::MAX as u64);

    let b = bitmask64(exp_bits - 1) as i32;
    let e = ((u >> F64_SIGNIF_BITS) as i32 - bitmask64(F64_EXP_BITS - 1) as i32).clamp(-b + 1, b);

    let s = (u & bitmask64(F64_SIGNIF_BITS)) >> (F64_SIGNIF_BITS - signif_bits);
    let n = ufloat_frac_bits(e, signif_bits);

    (e, s >> n, s & bitmask64(n))
}

/// Non-negative float in `[min, max]`.
pub fn gen_ufloat_range(
    bits: &mut BitStream,
    min: f64,
    max: f64,
    exp_bits: u32,
    signif_bits: u32,
) -> Draw<f64> {
    debug_assert!(min >= 0.0 && min <= max, "invalid range [{min}, {max}]");

    let (min_exp, min_signif_i, min_signif_f) = ufloat_parts(min, exp_bits, signif_bits);
    let (max_exp, max_signif_i, max_signif_f) = ufloat_parts(max, exp_bits, signif_bits);

    let group = bits.begin_group(FLOAT_EXP_LABEL, false);
    let e = gen_int_range(bits, min_exp as i64, max_exp as i64, true);
    bits.end_group(group, false);
    let e = e? as i32;

    let frac_bits = ufloat_frac_bits(e, signif_bits);
    let int_mask = bitmask64(signif_bits - frac_bits);

    let group = bits.begin_group(FLOAT_SIGNIF_LABEL, false);
    let (si_min, si_max) = if min_exp == max_exp {
        (min_signif_i, max_signif_i)
    } else if e == min_exp {
        (min_signif_i, int_mask)
    } else if e == max_exp {
        (0, max_signif_i)
    } else {
        (0, int_mask)
    };
    let parts = gen_uint_range(bits, si_min, si_max, false).and_then(|si| {
        let (sf_min, sf_max) = if min_exp == max_exp && min_signif_i == max_signif_i {
            (min_signif_f, max_signif_f)
        } else if e == min_exp && si == min_signif_i {
            (min_signif_f, bitmask64(frac_bits))
        } else if e == max_exp && si == max_signif_i {
            (0, max_signif_f)
        } else {
            (0, bitmask64(frac_bits))
        };
        let (sf, width) = gen_uint_range_width(bits, sf_min, sf_max, true)?;
        Ok((si, sf, sf_min, sf_max, width))
    });
    bits.end_group(group, false);
    let (si, mut sf, sf_min, sf_max, width) = parts?;

    // Move the drawn fraction bits to the top so short draws mean few
    // significant bits.
    for _ in width..frac_bits {
        let shifted = sf << 1;
        if shifted < sf_min || shifted > sf_max || shifted < sf {
            break;
        }
        sf = shifted;
    }

    let exponent = ((e as i64 + bitmask64(F64_EXP_BITS - 1) as i64) as u64) << F64_SIGNIF_BITS;
    let significand = ((si << frac_bits) | sf) << (F64_SIGNIF_BITS - signif_bits);

    Ok(f64::from_bits(exponent | significand))
}

/// Float in `[min, max]` for a layout with the given widths.
///
/// When the range crosses zero, the sign coin is weighted by
/// `log1p(log1p(|bound|))` of each side so both halves get fair coverage
/// whatever their magnitudes.
pub fn gen_float_range(
    bits: &mut BitStream,
    min: f64,
    max: f64,
    exp_bits: u32,
    signif_bits: u32,
) -> Draw<f64> {
    debug_assert!(min <= max, "invalid range [{min}, {max}]");

    let (pos_min, neg_min, p_neg) = if min >= 0.0 {
        (min, 0.0, 0.0)
    } else if max <= 0.0 {
        (0.0, -max, 1.0)
    } else {
        let pos = max.ln_1p().ln_1p();
        let neg = (-min).ln_1p().ln_1p();
        let p_neg = neg / (neg + pos);
        (0.0, 0.0, if p_neg.is_nan() { 0.5 } else { p_neg })
    };

    let f = if flip_biased_coin(bits, p_neg)? {
        -gen_ufloat_range(bits, neg_min, -min, exp_bits, signif_bits)?
    } else {
        gen_ufloat_range(bits, pos_min, max, exp_bits, signif_bits)?
    };

    // Bounds in the subnormal band decode to the nearest normal; pull them back.
    Ok(f.clamp(min, max))
}

fn float_name<T: PartialEq + Debug>(prefix: &str, min: T, max: T, lowest: T, highest: T) -> String {
    match (min != lowest, max != highest) {
        (true, true) => format!("{prefix}_range({min:?}, {max:?})"),
        (true, false) => format!("{prefix}_min({min:?})"),
        (false, true) => format!("{prefix}_max({max:?})"),
        (false, false) => format!("{prefix}s()"),
    }
}

fn check_float_range<T: Into<f64> + Copy + Debug>(min: T, max: T, what: &str) -> Result<()> {
    let (lo, hi): (f64, f64) = (min.into(), max.into());
    if lo.is_nan() || hi.is_nan() {
        return Err(invalid_generator(format!("{what} bounds must not be NaN")));
    }
    if lo > hi {
        return Err(invalid_generator(format!(
            "invalid range [{min:?}, {max:?}] for {what}"
        )));
    }
    Ok(())
}

impl Gen<f64> {
    /// Generate finite `f64` values, biased toward simple ones.
    pub fn any() -> Self {
        Self::range(-f64::MAX, f64::MAX)
    }

    /// Generate `f64` values in `[min, max]`.
    ///
    /// # Panics
    ///
    /// Panics if a bound is NaN or `min > max`.
    #[track_caller]
    pub fn range(min: f64, max: f64) -> Self {
        must(Self::try_range(min, max))
    }

    pub fn try_range(min: f64, max: f64) -> Result<Self> {
        check_float_range(min, max, "f64")?;
        let name = float_name("f64", min, max, -f64::MAX, f64::MAX);
        if min == max {
            return Ok(Gen::new(name, move |_case| Ok(min)));
        }
        Ok(Gen::new(name, move |case| {
            Ok(gen_float_range(case.bits(), min, max, F64_EXP_BITS, F64_SIGNIF_BITS)?)
        }))
    }

    #[track_caller]
    pub fn at_least(min: f64) -> Self {
        Self::range(min, f64::MAX)
    }

    #[track_caller]
    pub fn at_most(max: f64) -> Self {
        Self::range(-f64::MAX, max)
    }
}

impl Gen<f32> {
    /// Generate finite `f32` values, biased toward simple ones.
    pub fn any() -> Self {
        Self::range(-f32::MAX, f32::MAX)
    }

    /// Generate `f32` values in `[min, max]`.
    ///
    /// # Panics
    ///
    /// Panics if a bound is NaN or `min > max`.
    #[track_caller]
    pub fn range(min: f32, max: f32) -> Self {
        must(Self::try_range(min, max))
    }

    pub fn try_range(min: f32, max: f32) -> Result<Self> {
        check_float_range(min, max, "f32")?;
        let name = float_name("f32", min, max, -f32::MAX, f32::MAX);
        let (lo, hi) = (min as f64, max as f64);
        if min == max {
            return Ok(Gen::new(name, move |_case| Ok(min)));
        }
        Ok(Gen::new(name, move |case| {
            let f = gen_float_range(case.bits(), lo, hi, F32_EXP_BITS, F32_SIGNIF_BITS)?;
            Ok(f as f32)
        }))
    }

    #[track_caller]
    pub fn at_least(min: f32) -> Self {
        Self::range(min, f32::MAX)
    }

    #[track_caller]
    pub fn at_most(max: f32) -> Self {
        Self::range(-f32::MAX, max)
    }
}
