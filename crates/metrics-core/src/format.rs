//! Display formatting for metric values.

use crate::models::MetricKind;

const NOT_AVAILABLE: &str = "n/a";

/// Format a value according to how its metric is displayed.
pub fn format_value(kind: MetricKind, value: f64) -> String {
    match kind {
        MetricKind::UsdPrice => format_usd_price(value),
        MetricKind::UsdAmount => format_usd_amount(value),
        MetricKind::Count => format_count(value),
        MetricKind::Rate => format_rate(value),
    }
}

/// `$2.1M`, `$850.0K`, `$12.34`.
pub fn format_usd_amount(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    let sign = if value < 0.0 { "-" } else { "" };
    match compact(value.abs()) {
        Some(short) => format!("{}${}", sign, short),
        None => format!("{}${:.2}", sign, value.abs()),
    }
}

/// Token prices keep more precision below one dollar.
pub fn format_usd_price(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    if value.abs() >= 1.0 {
        format!("${:.2}", value)
    } else {
        format!("${:.4}", value)
    }
}

/// `25.8K`, `2.8M`, `512`.
pub fn format_count(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    let sign = if value < 0.0 { "-" } else { "" };
    match compact(value.abs()) {
        Some(short) => format!("{}{}", sign, short),
        None => format!("{:.0}", value),
    }
}

pub fn format_rate(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    format!("{:.1}", value)
}

/// Signed percentage with two decimals, e.g. `+5.40%`.
pub fn format_percent_change(percent: f64) -> String {
    if !percent.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    let sign = if percent >= 0.0 { "+" } else { "" };
    format!("{}{:.2}%", sign, percent)
}

fn compact(value: f64) -> Option<String> {
    if value >= 1e9 {
        Some(format!("{:.1}B", value / 1e9))
    } else if value >= 1e6 {
        Some(format!("{:.1}M", value / 1e6))
    } else if value >= 1e3 {
        Some(format!("{:.1}K", value / 1e3))
    } else {
        None
    }
}
