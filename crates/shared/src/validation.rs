//! Common validation utilities.

use validator::ValidationError;

/// Upper bound on the reminder / lookahead window, in days.
const MAX_DAYS_AHEAD: i32 = 30;

/// Validates that a monetary threshold is finite and non-negative.
pub fn validate_amount(amount: f64) -> Result<(), ValidationError> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("amount_range");
        err.message = Some("Amount must be a non-negative number".into());
        Err(err)
    }
}

/// Validates that a percentage is within 0 to 100.
pub fn validate_percent(percent: i32) -> Result<(), ValidationError> {
    if (0..=100).contains(&percent) {
        Ok(())
    } else {
        let mut err = ValidationError::new("percent_range");
        err.message = Some("Percentage must be between 0 and 100".into());
        Err(err)
    }
}

/// Validates that a multiplier is finite and at least 1.0.
pub fn validate_multiplier(multiplier: f64) -> Result<(), ValidationError> {
    if multiplier.is_finite() && multiplier >= 1.0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("multiplier_range");
        err.message = Some("Multiplier must be at least 1.0".into());
        Err(err)
    }
}

/// Validates a days-ahead window (0 to 30).
pub fn validate_days_ahead(days: i32) -> Result<(), ValidationError> {
    if (0..=MAX_DAYS_AHEAD).contains(&days) {
        Ok(())
    } else {
        let mut err = ValidationError::new("days_ahead_range");
        err.message = Some("Days ahead must be between 0 and 30".into());
        Err(err)
    }
}

/// Validates a wall-clock time in `HH:MM` (24h) format.
pub fn validate_clock_time(value: &str) -> Result<(), ValidationError> {
    let valid = match value.split_once(':') {
        Some((h, m)) if h.len() == 2 && m.len() == 2 => matches!(
            (h.parse::<u8>(), m.parse::<u8>()),
            (Ok(h), Ok(m)) if h < 24 && m < 60
        ),
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("clock_time_format");
        err.message = Some("Time must be in HH:MM format".into());
        Err(err)
    }
}
