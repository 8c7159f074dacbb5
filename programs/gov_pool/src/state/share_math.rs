//! Wide-integer helpers for the share ledger.
//!
//! Share balances are scaled u128 values and the pool supply is a raw u64, so
//! `shares * supply` style products need a 256-bit intermediate. Rounding
//! direction is always explicit at the call site: `mul_div_floor` truncates
//! toward zero, `mul_div_ceil` rounds away from it.

use crate::{math_error, prelude::GovPoolResult};

/// Multiply two u128 values into (lo, hi) 128-bit words.
fn mul_u128_wide(a: u128, b: u128) -> (u128, u128) {
    let a_lo = a as u64 as u128;
    let a_hi = a >> 64;
    let b_lo = b as u64 as u128;
    let b_hi = b >> 64;

    let lo_lo = a_lo * b_lo;
    let lo_hi = a_lo * b_hi;
    let hi_lo = a_hi * b_lo;
    let hi_hi = a_hi * b_hi;

    let (mid, mid_carry) = lo_hi.overflowing_add(hi_lo);
    let (lo, lo_carry) = lo_lo.overflowing_add(mid << 64);
    let hi = hi_hi
        + (mid >> 64)
        + ((mid_carry as u128) << 64)
        + lo_carry as u128;

    (lo, hi)
}

/// Restoring long division of a 256-bit dividend by a u128 divisor.
/// Returns (quotient, remainder); the quotient must fit in u128.
fn div_rem_wide(lo: u128, hi: u128, divisor: u128) -> Option<(u128, u128)> {
    if divisor == 0 {
        return None;
    }
    if hi == 0 {
        return Some((lo / divisor, lo % divisor));
    }
    // Quotient overflows u128 exactly when the high word reaches the divisor.
    if hi >= divisor {
        return None;
    }

    let mut rem: u128 = hi;
    let mut quotient: u128 = 0;
    for i in (0..128).rev() {
        let bit = (lo >> i) & 1;
        let carry = rem >> 127;
        rem = (rem << 1) | bit;
        if carry == 1 || rem >= divisor {
            rem = rem.wrapping_sub(divisor);
            quotient |= 1 << i;
        }
    }

    Some((quotient, rem))
}

/// `a * b / d`, truncating toward zero.
pub fn mul_div_floor(a: u128, b: u128, d: u128) -> GovPoolResult<u128> {
    let (lo, hi) = mul_u128_wide(a, b);
    let (quotient, _) = div_rem_wide(lo, hi, d).ok_or_else(math_error!())?;
    Ok(quotient)
}

/// `a * b / d`, rounding away from zero.
pub fn mul_div_ceil(a: u128, b: u128, d: u128) -> GovPoolResult<u128> {
    let (lo, hi) = mul_u128_wide(a, b);
    let (quotient, rem) = div_rem_wide(lo, hi, d).ok_or_else(math_error!())?;
    if rem == 0 {
        Ok(quotient)
    } else {
        Ok(quotient.checked_add(1).ok_or_else(math_error!())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case(0, 1, 1, 0)]
    #[test_case(10, 3, 4, 7 ; "truncates toward zero")]
    #[test_case(100, 100, 100, 100 ; "exact")]
    fn floor_cases(a: u128, b: u128, d: u128, expected: u128) {
        assert_eq!(mul_div_floor(a, b, d).unwrap(), expected);
    }

    #[test_case(10, 3, 4, 8 ; "rounds up")]
    #[test_case(100, 100, 100, 100 ; "exact stays exact")]
    fn ceil_cases(a: u128, b: u128, d: u128, expected: u128) {
        assert_eq!(mul_div_ceil(a, b, d).unwrap(), expected);
    }

    #[test]
    fn wide_mul_crosses_u128() {
        // shares at full scale times a u64 supply overflows u128 but the
        // quotient comes back down
        let shares = u128::from(u64::MAX) * 10_000_000_000;
        let supply = u64::MAX as u128;
        let total_shares = shares;
        assert_eq!(
            mul_div_floor(shares, supply, total_shares).unwrap(),
            supply
        );
    }

    #[test]
    fn wide_mul_identity() {
        let a = u128::MAX / 7;
        assert_eq!(mul_div_floor(a, 14, 2).unwrap(), a * 7);
    }

    #[test]
    fn division_by_zero_errors() {
        assert!(mul_div_floor(1, 1, 0).is_err());
    }

    #[test]
    fn quotient_overflow_errors() {
        assert!(mul_div_floor(u128::MAX, u128::MAX, 1).is_err());
    }

    #[test]
    fn remainder_tracked_across_words() {
        // (2^128 + 3) / 2 == 2^127 + 1 rem 1
        let (q, r) = super::div_rem_wide(3, 1, 2).unwrap();
        assert_eq!(q, (1u128 << 127) + 1);
        assert_eq!(r, 1);
    }
}
