//! Lenient parsing of user-entered amounts.

use rust_decimal::Decimal;

/// Coerce a raw text field into a `Decimal`, treating anything unparsable
/// as zero.
///
/// This is the policy the whole editing flow relies on: a discount field
/// left as an empty string, or a half-typed number, must not break the
/// total-computation pipeline. Leading zeros are stripped the way the
/// back office always has ("007" reads as 7).
pub fn sanitize_amount(raw: &str) -> Decimal {
    let trimmed = raw.trim();
    let unpadded = trimmed.trim_start_matches('0');

    // Stripping zeros can eat the integer part of "0.5"; restore it.
    if let Some(rest) = unpadded.strip_prefix('.') {
        return format!("0.{rest}").parse().unwrap_or(Decimal::ZERO);
    }

    unpadded.parse().unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn plain_numbers_parse() {
        assert_eq!(sanitize_amount("12.75"), dec!(12.75));
        assert_eq!(sanitize_amount(" 3 "), dec!(3));
    }

    #[test]
    fn leading_zeros_are_stripped() {
        assert_eq!(sanitize_amount("007"), dec!(7));
        assert_eq!(sanitize_amount("007.5"), dec!(7.5));
    }

    #[test]
    fn fractional_values_survive_zero_stripping() {
        assert_eq!(sanitize_amount("0.5"), dec!(0.5));
        assert_eq!(sanitize_amount("00.25"), dec!(0.25));
    }

    #[test]
    fn unparsable_input_is_zero() {
        assert_eq!(sanitize_amount(""), Decimal::ZERO);
        assert_eq!(sanitize_amount("abc"), Decimal::ZERO);
        assert_eq!(sanitize_amount("12,50"), Decimal::ZERO);
        assert_eq!(sanitize_amount("0"), Decimal::ZERO);
    }
}
