//! Conversions between whole-token decimal amounts and integer base units.
//!
//! Amounts are parsed as arbitrary-precision decimals and scaled on their
//! digits, so no binary floating point and no precision limit sits between
//! the input file and the integers written to the output file.

use std::str::FromStr;

use alloy_primitives::U256;
use bigdecimal::{BigDecimal, RoundingMode, Signed};
use num_bigint::BigUint;

use crate::airdrop::tools::error::{Result, ToolError};

/// Largest exponent for which `10^exp` fits in 256 bits.
pub const MAX_DECIMALS: u8 = 77;

/// Returns `10^exp` as a 256-bit integer.
pub fn pow10(exp: u32) -> Result<U256> {
    U256::from(10u64)
        .checked_pow(U256::from(exp))
        .ok_or_else(|| ToolError::UnsupportedDecimals(exp.to_string()))
}

/// Parses an amount written in whole tokens. Plain and scientific notation
/// are accepted, with any number of digits. Returns `None` for anything
/// else, including `NaN` and infinities.
pub fn parse_amount(text: &str) -> Option<BigDecimal> {
    BigDecimal::from_str(text.trim()).ok()
}

/// Computes `trunc(|amount| * 10^decimals)`.
///
/// The result always rounds toward zero: `1.999995` with five decimals is
/// `199999`, never `200000`. The sign is left to the caller.
pub fn scale_amount(amount: &BigDecimal, decimals: u8) -> Result<U256> {
    let (digits, exponent) = amount.as_bigint_and_exponent();
    let magnitude = digits.magnitude();
    if magnitude.bits() == 0 {
        return Ok(U256::ZERO);
    }

    let shift = i64::from(decimals) - exponent;
    let scaled = if shift >= 0 {
        // A non-zero magnitude times 10^78 no longer fits.
        if shift > i64::from(MAX_DECIMALS) {
            return Err(ToolError::AmountOverflow(amount.to_string()));
        }
        magnitude * BigUint::from(10u32).pow(shift as u32)
    } else {
        let dropped = shift.unsigned_abs();
        if dropped > magnitude.bits() {
            return Ok(U256::ZERO);
        }
        magnitude / BigUint::from(10u32).pow(dropped as u32)
    };

    U256::try_from_le_slice(&scaled.to_bytes_le())
        .ok_or_else(|| ToolError::AmountOverflow(amount.to_string()))
}

/// Renders an amount of base units as whole tokens with exactly `places`
/// fractional digits, rounding half to even.
pub fn format_units(value: U256, decimals: u8, places: u32) -> Result<String> {
    let decimals = u32::from(decimals);
    if places >= decimals {
        let digits = value.to_string() + &"0".repeat((places - decimals) as usize);
        return Ok(fixed_point(false, &digits, places));
    }

    let divisor = pow10(decimals - places)?;
    let quotient = value / divisor;
    let remainder = value % divisor;
    let half = divisor / U256::from(2u64);
    let quantised = if remainder > half || (remainder == half && quotient.bit(0)) {
        quotient + U256::from(1u64)
    } else {
        quotient
    };
    Ok(fixed_point(false, &quantised.to_string(), places))
}

/// Renders a decimal with exactly `places` fractional digits, rounding half
/// to even.
pub fn format_decimal(value: &BigDecimal, places: u32) -> String {
    let rounded = value.with_scale_round(i64::from(places), RoundingMode::HalfEven);
    let (digits, _) = rounded.as_bigint_and_exponent();
    fixed_point(digits.is_negative(), &digits.magnitude().to_string(), places)
}

/// Renders a decimal in positional notation, keeping the scale it was
/// written with (`0.010` stays `0.010`).
pub fn format_plain(value: &BigDecimal) -> String {
    let (digits, exponent) = value.as_bigint_and_exponent();
    if exponent <= 0 {
        let zeros = if digits.magnitude().bits() == 0 {
            0
        } else {
            exponent.unsigned_abs() as usize
        };
        return format!("{digits}{}", "0".repeat(zeros));
    }
    fixed_point(
        digits.is_negative(),
        &digits.magnitude().to_string(),
        exponent as u32,
    )
}

/// Places a decimal point `places` digits from the right of `digits`.
fn fixed_point(negative: bool, digits: &str, places: u32) -> String {
    let places = places as usize;
    let sign = if negative { "-" } else { "" };
    if places == 0 {
        return format!("{sign}{digits}");
    }
    let padded = format!("{digits:0>width$}", width = places + 1);
    let (whole, fraction) = padded.split_at(padded.len() - places);
    format!("{sign}{whole}.{fraction}")
}
