//! Display helpers for prices and print durations.

use crate::coerce::clamp_min0;

/// Currency suffix
pub const CURRENCY: &str = "Kč";

/// Whole currency units: `483.4` -> `"483 Kč"`. Negative amounts show as 0.
pub fn format_price(amount: f64) -> String {
    format!("{} {}", clamp_min0(amount).round(), CURRENCY)
}

/// Two decimals, as the admin preview shows them: `"150.00 Kč"`.
pub fn format_price_precise(amount: f64) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    format!("{:.2} {}", amount, CURRENCY)
}

/// `"42 min"` under an hour, `"1h 5min"` from an hour on. Seconds are dropped.
pub fn format_duration(seconds: f64) -> String {
    let total = clamp_min0(seconds).floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    if hours == 0 {
        format!("{} min", minutes)
    } else {
        format!("{}h {}min", hours, minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(483.4), "483 Kč");
        assert_eq!(format_price(482.5), "483 Kč");
        assert_eq!(format_price(-10.0), "0 Kč");
        assert_eq!(format_price(f64::NAN), "0 Kč");
    }

    #[test]
    fn test_format_price_precise() {
        assert_eq!(format_price_precise(150.0), "150.00 Kč");
        assert_eq!(format_price_precise(f64::INFINITY), "0.00 Kč");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(2520.0), "42 min");
        assert_eq!(format_duration(3900.0), "1h 5min");
        assert_eq!(format_duration(59.9), "0 min");
        assert_eq!(format_duration(-5.0), "0 min");
        assert_eq!(format_duration(7200.0), "2h 0min");
    }
}
