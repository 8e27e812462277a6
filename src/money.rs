//! Money Conversion Module
//!
//! Conversion between internal i64 minor-unit representation and the
//! client-facing decimal string representation. All conversions go through
//! this module.
//!
//! ## Internal Representation
//! - Balances and amounts are `i64` minor units (e.g. cents for USD)
//! - The scale factor is `10^exponent`, where the exponent comes from the
//!   account's currency (`currency_exponent`)
//!
//! Parsing is strict: no silent truncation, no ambiguous formats like `.5`
//! or `5.`, zero and negative amounts rejected.

use thiserror::Error;

/// Money conversion errors
#[derive(Debug, Error)]
pub enum MoneyError {
    #[error("Precision overflow: provided {provided} decimals, max allowed {max}")]
    PrecisionOverflow { provided: u32, max: u32 },

    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Amount too large, would overflow")]
    Overflow,

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Minor-unit exponent for a currency code.
///
/// The dashboard's accounts are fiat; everything observed is exponent 2
/// except the zero-decimal currencies. Unknown codes fall back to 2.
pub fn currency_exponent(currency: &str) -> u32 {
    match currency {
        "JPY" | "KRW" => 0,
        _ => 2,
    }
}

/// Convert a client amount string to internal i64 minor units
///
/// # Errors
/// * `PrecisionOverflow` - more decimal places than the currency allows
/// * `InvalidAmount` - zero or negative amount
/// * `Overflow` - result would overflow i64
/// * `InvalidFormat` - malformed string
pub fn parse_amount(amount_str: &str, exponent: u32) -> Result<i64, MoneyError> {
    let amount_str = amount_str.trim();
    if amount_str.is_empty() {
        return Err(MoneyError::InvalidFormat("empty string".into()));
    }

    if amount_str.starts_with('-') || amount_str.starts_with('+') {
        return Err(MoneyError::InvalidAmount);
    }

    let parts: Vec<&str> = amount_str.split('.').collect();
    let (whole, frac) = match parts.len() {
        1 => (parts[0], ""),
        2 => {
            // Require both sides of the dot to be non-empty. This rejects
            // ambiguous forms like ".5" and "5.".
            if parts[0].is_empty() {
                return Err(MoneyError::InvalidFormat(
                    "missing leading zero (e.g., use 0.5 instead of .5)".into(),
                ));
            }
            if parts[1].is_empty() {
                return Err(MoneyError::InvalidFormat(
                    "missing fractional part (e.g., use 5.0 instead of 5.)".into(),
                ));
            }
            if exponent == 0 {
                return Err(MoneyError::InvalidFormat(
                    "currency has no minor units, but dot provided".into(),
                ));
            }
            (parts[0], parts[1])
        }
        _ => return Err(MoneyError::InvalidFormat("multiple decimal points".into())),
    };

    // Digits only on both sides, before anything else looks at the content.
    // i64::from_str tolerates a sign prefix, so "1.-5" would otherwise parse
    // the fraction as -5 and quietly move a different amount than the caller
    // stated.
    if !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MoneyError::InvalidFormat(format!(
            "invalid character in whole part: {}",
            whole
        )));
    }
    if !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MoneyError::InvalidFormat(format!(
            "invalid character in fractional part: {}",
            frac
        )));
    }

    // Reject instead of truncating when the input is finer than the currency.
    if frac.len() > exponent as usize {
        return Err(MoneyError::PrecisionOverflow {
            provided: frac.len() as u32,
            max: exponent,
        });
    }

    // All digits, so a parse failure can only mean overflow.
    let whole_num: i64 = whole.parse::<i64>().map_err(|_| MoneyError::Overflow)?;

    let frac_num: i64 = if exponent == 0 || frac.is_empty() {
        0
    } else {
        let frac_padded = format!("{:0<width$}", frac, width = exponent as usize);
        frac_padded[..exponent as usize]
            .parse::<i64>()
            .map_err(|_| MoneyError::InvalidFormat("invalid fractional part".into()))?
    };

    let multiplier = 10i64.pow(exponent);
    let amount = whole_num
        .checked_mul(multiplier)
        .and_then(|v| v.checked_add(frac_num))
        .ok_or(MoneyError::Overflow)?;

    if amount == 0 {
        return Err(MoneyError::InvalidAmount);
    }

    Ok(amount)
}

/// Convert internal minor units to a full-precision display string
///
/// ```text
/// format_amount(3000, 2) == "30.00"
/// ```
pub fn format_amount(value: i64, exponent: u32) -> String {
    let abs = value.unsigned_abs();
    let divisor = 10u64.pow(exponent);
    let whole = abs / divisor;
    let sign = if value < 0 { "-" } else { "" };
    if exponent == 0 {
        format!("{}{}", sign, whole)
    } else {
        let frac = abs % divisor;
        format!("{}{}.{:0>width$}", sign, whole, frac, width = exponent as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_amount_variations() {
        assert_eq!(parse_amount("1.23", 2).unwrap(), 123);
        assert_eq!(parse_amount("30.00", 2).unwrap(), 3000);
        assert_eq!(parse_amount("001.23", 2).unwrap(), 123);
        assert_eq!(parse_amount("0.01", 2).unwrap(), 1);
        assert_eq!(parse_amount("100", 0).unwrap(), 100);

        // Zero and negatives rejected
        assert!(parse_amount("0", 2).is_err());
        assert!(parse_amount("0.00", 2).is_err());
        assert!(parse_amount("-5.00", 2).is_err());
        assert!(parse_amount("+5.00", 2).is_err());
    }

    #[test]
    fn parse_amount_invalid_formats() {
        for case in ["1,000.00", "1.2.3", "1. 23", "1e2", "0x12", ".", ".5", "5."] {
            assert!(parse_amount(case, 2).is_err(), "should reject: {}", case);
        }
        // Dot with exponent 0 rejected
        assert!(parse_amount("100.0", 0).is_err());
    }

    #[test]
    fn parse_amount_signed_fraction_rejected() {
        // A sign inside the fractional part must not reach i64::from_str:
        // "1.-5" would otherwise become 0.95 and "1.+5" become 1.05.
        for case in ["1.-5", "1.+5", "1.-05", "0.-1"] {
            assert!(
                matches!(parse_amount(case, 2), Err(MoneyError::InvalidFormat(_))),
                "should reject signed fraction: {}",
                case
            );
        }
    }

    #[test]
    fn parse_amount_precision_limits() {
        assert!(parse_amount("1.23", 2).is_ok());
        assert!(matches!(
            parse_amount("1.234", 2),
            Err(MoneyError::PrecisionOverflow { provided: 3, max: 2 })
        ));
    }

    #[test]
    fn parse_amount_overflow() {
        assert!(matches!(
            parse_amount("999999999999999999999", 0),
            Err(MoneyError::Overflow)
        ));
        assert!(matches!(
            parse_amount("92233720368547758.08", 2),
            Err(MoneyError::Overflow)
        ));
    }

    #[test]
    fn format_amount_roundtrip() {
        for s in ["1.50", "0.01", "1234.56", "70.00"] {
            let minor = parse_amount(s, 2).unwrap();
            assert_eq!(format_amount(minor, 2), s);
        }
        assert_eq!(format_amount(-3000, 2), "-30.00");
        assert_eq!(format_amount(5, 0), "5");
    }

    #[test]
    fn currency_exponents() {
        assert_eq!(currency_exponent("USD"), 2);
        assert_eq!(currency_exponent("EUR"), 2);
        assert_eq!(currency_exponent("JPY"), 0);
    }
}
