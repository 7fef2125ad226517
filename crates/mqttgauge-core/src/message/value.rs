//! Numeric value parsing.

use crate::error::{MqttGaugeError, Result};

/// Parse a gauge value.
///
/// Accepts integer, decimal and exponent notation (`123`, `-0.5`, `1e3`).
/// Non-finite results (`NaN`, `inf`, overflow) are refused: a gauge must
/// carry a real measurement.
pub fn parse_value(raw: &str) -> Result<f64> {
    let value: f64 = raw
        .parse()
        .map_err(|_| MqttGaugeError::InvalidValue(format!("'{raw}' is not a number")))?;

    if !value.is_finite() {
        return Err(MqttGaugeError::InvalidValue(format!("'{raw}' is not finite")));
    }
    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_integers_and_decimals() {
        assert_eq!(parse_value("123").unwrap(), 123.0);
        assert_eq!(parse_value("123.46").unwrap(), 123.46);
        assert_eq!(parse_value("-40").unwrap(), -40.0);
        assert_eq!(parse_value("1e3").unwrap(), 1000.0);
    }

    #[test]
    fn refuses_non_finite() {
        for raw in ["NaN", "inf", "-infinity", "1e400"] {
            let err = parse_value(raw).unwrap_err();
            assert_eq!(err.code().as_str(), "INVALID_VALUE", "{raw}");
        }
    }

    #[test]
    fn refuses_garbage() {
        for raw in ["", "abc", "12abc", " 12"] {
            assert!(parse_value(raw).is_err(), "{raw}");
        }
    }
}
