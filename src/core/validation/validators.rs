//! Reusable field validators for `#[validate(custom(function = ...))]`

use crate::finance::gst::{is_percentage, is_valid_gstin, resolve_state};
use crate::finance::round2;
use rust_decimal::Decimal;
use validator::ValidationError;

const MAX_DAYS_IN_MONTH: Decimal = Decimal::from_parts(31, 0, 0, false, 0);

fn invalid(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// GSTIN must be 15 characters in the official layout
pub fn gstin(value: &str) -> Result<(), ValidationError> {
    if is_valid_gstin(value) {
        Ok(())
    } else {
        Err(invalid("gstin", format!("'{}' is not a valid GSTIN", value)))
    }
}

/// State must be a known Indian state or union territory (name, code or GSTIN)
pub fn state(value: &str) -> Result<(), ValidationError> {
    resolve_state(value)
        .map(|_| ())
        .map_err(|e| invalid("state", e.to_string()))
}

/// Money amounts are never negative
pub fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        Err(invalid("non_negative", format!("must not be negative (got {})", value)))
    } else {
        Ok(())
    }
}

/// Strictly greater than zero once rounded to paise
pub fn positive(value: &Decimal) -> Result<(), ValidationError> {
    if round2(*value) > Decimal::ZERO {
        Ok(())
    } else {
        Err(invalid(
            "positive",
            format!("must be at least 0.01 (got {})", value),
        ))
    }
}

/// Percentages lie in 0..=100
pub fn percentage(value: &Decimal) -> Result<(), ValidationError> {
    if is_percentage(*value) {
        Ok(())
    } else {
        Err(invalid(
            "percentage",
            format!("must be between 0 and 100 (got {})", value),
        ))
    }
}

/// Working days in a month: above zero, at most 31
pub fn working_days(value: &Decimal) -> Result<(), ValidationError> {
    if *value > Decimal::ZERO && *value <= MAX_DAYS_IN_MONTH {
        Ok(())
    } else {
        Err(invalid(
            "working_days",
            format!("must be above 0 and at most 31 (got {})", value),
        ))
    }
}

/// Calendar month 1..=12
pub fn month(value: u32) -> Result<(), ValidationError> {
    if (1..=12).contains(&value) {
        Ok(())
    } else {
        Err(invalid("month", format!("month must be 1-12 (got {})", value)))
    }
}

/// Trimmed string is not empty
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(invalid("not_blank", "must not be blank".to_string()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::money::d;

    #[test]
    fn test_gstin_validator() {
        assert!(gstin("27AAPFU0939F1ZV").is_ok());
        let err = gstin("27AAPFU").unwrap_err();
        assert_eq!(err.code, "gstin");
    }

    #[test]
    fn test_state_validator() {
        assert!(state("Maharashtra").is_ok());
        assert!(state("karnataka").is_ok());
        assert!(state("Atlantis").is_err());
    }

    #[test]
    fn test_numeric_validators() {
        assert!(non_negative(&Decimal::ZERO).is_ok());
        assert!(non_negative(&d("-0.01")).is_err());
        assert!(percentage(&Decimal::ONE_HUNDRED).is_ok());
        assert!(percentage(&d("100.5")).is_err());
        assert!(month(12).is_ok());
        assert!(month(0).is_err());
        assert!(not_blank("  ").is_err());
    }

    #[test]
    fn test_positive_rejects_sub_paisa() {
        assert!(positive(&d("0.01")).is_ok());
        assert!(positive(&d("0.005")).is_ok());
        let err = positive(&d("0.001")).unwrap_err();
        assert_eq!(err.code, "positive");
        assert!(positive(&Decimal::ZERO).is_err());
    }

    #[test]
    fn test_working_days() {
        assert!(working_days(&d("26")).is_ok());
        assert!(working_days(&d("31")).is_ok());
        assert!(working_days(&d("31.5")).is_err());
        assert!(working_days(&Decimal::ZERO).is_err());
    }
}
