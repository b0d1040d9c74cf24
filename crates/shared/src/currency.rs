//! Currency formatting for user-facing copy.

/// Formats an amount as US dollars with two decimals, e.g. `$1250.50`.
///
/// Negative amounts keep their sign in front of the symbol (`-$12.00`).
pub fn format_usd(amount: f64) -> String {
    if amount < 0.0 {
        format!("-${:.2}", amount.abs())
    } else {
        format!("${:.2}", amount)
    }
}

/// Formats an optional amount, falling back to `$TBD` when unknown.
pub fn format_usd_or_tbd(amount: Option<f64>) -> String {
    amount.map(format_usd).unwrap_or_else(|| "$TBD".to_string())
}
