//! Primitive decoders turning raw words into booleans and integers.
//!
//! The decoders are shrink-friendly: the all-zero word sequence always decodes
//! to the simplest value (the lower bound, the value closest to zero, `false`),
//! and smaller words decode to simpler values.

use crate::bits::BitStream;
use crate::error::Invalid;

pub(crate) const COIN_LABEL: &str = "coinflip";
pub(crate) const BIAS_LABEL: &str = "bias";
pub(crate) const INT_BITS_LABEL: &str = "intbits";

type Draw<T> = std::result::Result<T, Invalid>;

pub(crate) fn bit_len(u: u64) -> u32 {
    64 - u.leading_zeros()
}

/// Uniform float in `[0, 1)` from 53 bits.
pub fn gen_float01(bits: &mut BitStream) -> Draw<f64> {
    Ok(bits.draw_bits(53)? as f64 * (1.0 / (1u64 << 53) as f64))
}

/// Geometrically distributed count of failures before the first success
/// with success probability `p`.
pub fn gen_geom(bits: &mut BitStream, p: f64) -> Draw<u64> {
    debug_assert!(p > 0.0 && p <= 1.0, "gen_geom({p})");
    if p >= 1.0 {
        return Ok(0);
    }
    let f = gen_float01(bits)?;
    Ok(((-f).ln_1p() / (-p).ln_1p()) as u64)
}

/// `true` with probability `p`. Certain outcomes consume no entropy.
pub fn flip_biased_coin(bits: &mut BitStream, p: f64) -> Draw<bool> {
    debug_assert!((0.0..=1.0).contains(&p), "flip_biased_coin({p})");
    if p <= 0.0 {
        return Ok(false);
    }
    if p >= 1.0 {
        return Ok(true);
    }

    let group = bits.begin_group(COIN_LABEL, false);
    let f = gen_float01(bits);
    bits.end_group(group, false);
    Ok(f? >= 1.0 - p)
}

fn gen_uint_n_unbiased(bits: &mut BitStream, max: u64) -> Draw<u64> {
    let width = bit_len(max);
    loop {
        let group = bits.begin_group(INT_BITS_LABEL, false);
        let u = bits.draw_bits(width);
        let rejected = matches!(u, Ok(u) if u > max);
        bits.end_group(group, rejected);
        let u = u?;
        if !rejected {
            return Ok(u);
        }
    }
}

fn gen_uint_n_biased(bits: &mut BitStream, max: u64) -> Draw<(u64, u32)> {
    let width = bit_len(max);
    let m = f64::max(8.0, (width as f64 + 48.0) / 7.0);

    let group = bits.begin_group(BIAS_LABEL, false);
    let n = gen_geom(bits, 1.0 / (m + 1.0));
    bits.end_group(group, false);
    let n = n?.saturating_add(1);

    let (width, to_max) = if n < width as u64 {
        (n as u32, false)
    } else {
        (width, n as f64 >= 64.0 - (16.0 - m.trunc()) * 4.0)
    };

    // The magnitude word is drawn even when it is ignored, so lowering the
    // width draw never changes how many words follow it.
    let u = bits.draw_bits(width)?;
    if to_max {
        return Ok((max, 64));
    }
    Ok((u.min(max), width))
}

/// Value in `[0, max]` together with the number of bits its magnitude used.
pub fn gen_uint_n_width(bits: &mut BitStream, max: u64, bias: bool) -> Draw<(u64, u32)> {
    if max == 0 {
        return Ok((0, 0));
    }
    if bias {
        gen_uint_n_biased(bits, max)
    } else {
        Ok((gen_uint_n_unbiased(bits, max)?, bit_len(max)))
    }
}

/// Value in `[lo, hi]`, see [`gen_uint_range`]. Also returns the bit width drawn.
pub fn gen_uint_range_width(
    bits: &mut BitStream,
    lo: u64,
    hi: u64,
    bias: bool,
) -> Draw<(u64, u32)> {
    debug_assert!(lo <= hi, "invalid range [{lo}, {hi}]");
    let (u, width) = gen_uint_n_width(bits, hi - lo, bias)?;
    Ok((lo + u, width))
}

/// Value in `[lo, hi]`.
///
/// Unbiased draws rejection-sample the minimal width covering `hi - lo`.
/// Biased draws pick a geometric width first, so small offsets from `lo`
/// dominate and a tail of the distribution lands on `hi` itself.
pub fn gen_uint_range(bits: &mut BitStream, lo: u64, hi: u64, bias: bool) -> Draw<u64> {
    Ok(gen_uint_range_width(bits, lo, hi, bias)?.0)
}

/// Signed value in `[lo, hi]`: a sign coin followed by the magnitude.
pub fn gen_int_range(bits: &mut BitStream, lo: i64, hi: i64, bias: bool) -> Draw<i64> {
    debug_assert!(lo <= hi, "invalid range [{lo}, {hi}]");

    let (pos_min, neg_min, p_neg) = if lo >= 0 {
        (lo as u64, 0, 0.0)
    } else if hi <= 0 {
        (0, hi.unsigned_abs(), 1.0)
    } else if bias {
        (0, 1, 0.5)
    } else {
        let pos = hi as u64 as f64 + 1.0;
        let neg = lo.unsigned_abs() as f64;
        (0, 1, neg / (neg + pos))
    };

    if flip_biased_coin(bits, p_neg)? {
        let magnitude = gen_uint_range(bits, neg_min, lo.unsigned_abs(), bias)?;
        Ok((magnitude as i64).wrapping_neg())
    } else {
        Ok(gen_uint_range(bits, pos_min, hi as u64, bias)? as i64)
    }
}

/// Index in `[0, n)`; `n` must be positive.
pub fn gen_index(bits: &mut BitStream, n: usize, bias: bool) -> Draw<usize> {
    debug_assert!(n > 0);
    Ok(gen_uint_range(bits, 0, n as u64 - 1, bias)? as usize)
}

/// Index drawn with probability proportional to `weights[i]`.
pub fn gen_weighted_index(bits: &mut BitStream, weights: &[u64]) -> Draw<usize> {
    let total: u64 = weights.iter().sum();
    debug_assert!(total > 0);
    let mut target = gen_uint_range(bits, 0, total - 1, false)?;
    for (index, &weight) in weights.iter().enumerate() {
        if target < weight {
            return Ok(index);
        }
        target -= weight;
    }
    Ok(weights.len() - 1)
}
