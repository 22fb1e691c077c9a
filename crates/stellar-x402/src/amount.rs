use crate::constants::NATIVE_DECIMALS;
use crate::error::X402Error;

/// Parse a decimal XLM amount (e.g. `"1"`, `"0.5"`) into stroops.
///
/// Integer-only parsing, no f64 anywhere. More than seven fractional digits,
/// zero, and values that overflow an `i64` are rejected.
pub fn parse_native_amount(amount: &str) -> Result<i64, X402Error> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(X402Error::InvalidAmount("empty amount".to_string()));
    }

    let (integer_part, fractional_part) = trimmed.split_once('.').unwrap_or((trimmed, ""));

    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(integer_part) || !all_digits(fractional_part) {
        return Err(X402Error::InvalidAmount(format!(
            "invalid amount '{amount}': not a decimal number"
        )));
    }
    if integer_part.is_empty() && fractional_part.is_empty() {
        return Err(X402Error::InvalidAmount(format!(
            "invalid amount '{amount}': no numeric content"
        )));
    }

    let decimals = NATIVE_DECIMALS as usize;
    if fractional_part.len() > decimals {
        return Err(X402Error::InvalidAmount(format!(
            "invalid amount '{amount}': more than {decimals} decimal places"
        )));
    }

    let overflow = || X402Error::InvalidAmount(format!("invalid amount '{amount}': overflow"));

    let integer: i64 = if integer_part.is_empty() {
        0
    } else {
        integer_part.parse().map_err(|_| overflow())?
    };

    let fractional: i64 = if fractional_part.is_empty() {
        0
    } else {
        fractional_part.parse().map_err(|_| overflow())?
    };
    let scale = 10i64.pow((decimals - fractional_part.len()) as u32);

    let stroops = integer
        .checked_mul(10i64.pow(NATIVE_DECIMALS))
        .and_then(|whole| whole.checked_add(fractional * scale))
        .ok_or_else(overflow)?;

    if stroops == 0 {
        return Err(X402Error::InvalidAmount(format!(
            "invalid amount '{amount}': must be positive"
        )));
    }

    Ok(stroops)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whole_xlm() {
        assert_eq!(parse_native_amount("1").unwrap(), 10_000_000);
    }

    #[test]
    fn test_parse_fractional_xlm() {
        assert_eq!(parse_native_amount("0.5").unwrap(), 5_000_000);
        assert_eq!(parse_native_amount("12.0000001").unwrap(), 120_000_001);
        assert_eq!(parse_native_amount(".25").unwrap(), 2_500_000);
    }

    #[test]
    fn test_parse_rejects_extra_precision() {
        assert!(parse_native_amount("0.00000001").is_err());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_native_amount("").is_err());
        assert!(parse_native_amount(".").is_err());
        assert!(parse_native_amount("$1").is_err());
        assert!(parse_native_amount("-1").is_err());
        assert!(parse_native_amount("0").is_err());
    }

    #[test]
    fn test_parse_overflow_fails() {
        assert!(parse_native_amount("99999999999999999999").is_err());
        assert!(parse_native_amount("922337203686").is_err());
    }
}
