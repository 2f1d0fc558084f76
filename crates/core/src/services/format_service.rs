//! Display formatting for prices, percentages and market caps.

const NOT_AVAILABLE: &str = "N/A";

/// Symbol prefix for a display currency. Unknown codes are shown as the
/// uppercase code followed by a space.
pub fn currency_symbol(currency: &str) -> String {
    match currency.to_uppercase().as_str() {
        "USD" => "$".to_string(),
        "EUR" => "€".to_string(),
        "GBP" => "£".to_string(),
        "JPY" => "¥".to_string(),
        "INR" => "₹".to_string(),
        other => format!("{other} "),
    }
}

/// Format a price in the display currency, e.g. `$43,250.12`, `¥6,500,000`,
/// `$0.000123`.
///
/// Whole-unit currencies (JPY) get no decimals. Sub-unit prices keep up to
/// six decimals so small-cap coins do not collapse to `0.00`.
pub fn format_price(value: f64, currency: &str) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }

    let symbol = currency_symbol(currency);
    let abs = value.abs();
    let body = if currency.eq_ignore_ascii_case("JPY") && abs >= 1.0 {
        format_number(abs, 0)
    } else if abs > 0.0 && abs < 1.0 {
        trim_decimals(format_number(abs, 6), 2)
    } else {
        format_number(abs, 2)
    };

    if value < 0.0 && body.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{symbol}{body}")
    } else {
        format!("{symbol}{body}")
    }
}

/// Format an optional price, `N/A` when missing.
pub fn format_optional_price(value: Option<f64>, currency: &str) -> String {
    match value {
        Some(v) => format_price(v, currency),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Two decimals and a percent sign, e.g. `2.50%`, `-0.31%`.
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.2}%"),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Compact market cap: `1.23 T`, `456.70 B`, `12.00 M`; smaller values are
/// formatted as a full price.
pub fn format_market_cap(value: Option<f64>, currency: &str) -> String {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return NOT_AVAILABLE.to_string();
    };
    if v > 1e12 {
        format!("{:.2} T", v / 1e12)
    } else if v > 1e9 {
        format!("{:.2} B", v / 1e9)
    } else if v > 1e6 {
        format!("{:.2} M", v / 1e6)
    } else {
        format_price(v, currency)
    }
}

/// Supply with its ticker, e.g. `120,250,000.5 ETH`; `N/A` when missing.
pub fn format_supply(value: Option<f64>, symbol: &str) -> String {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return NOT_AVAILABLE.to_string();
    };
    let body = format_number(v.abs(), 3);
    let body = body.trim_end_matches('0').trim_end_matches('.');
    format!("{body} {}", symbol.to_uppercase())
}

/// Max supply; a coin without a cap is shown as `∞`.
pub fn format_max_supply(value: Option<f64>, symbol: &str) -> String {
    match value {
        Some(_) => format_supply(value, symbol),
        None => "∞".to_string(),
    }
}

/// Whether a 24h change should be shown as a gain (zero counts as a gain).
pub fn is_gain(change: Option<f64>) -> bool {
    change.is_some_and(|c| c >= 0.0)
}

/// Fixed decimals with `,` thousands separators. Expects a non-negative value.
fn format_number(value: f64, decimals: usize) -> String {
    let raw = format!("{value:.decimals$}");
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (raw.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(f) => format!("{grouped}.{f}"),
        None => grouped,
    }
}

/// Drop trailing zeros but keep at least `min_decimals`.
fn trim_decimals(formatted: String, min_decimals: usize) -> String {
    let Some(dot) = formatted.find('.') else {
        return formatted;
    };
    let keep = dot + 1 + min_decimals;
    let trimmed = formatted.trim_end_matches('0');
    if trimmed.len() < keep {
        formatted[..keep].to_string()
    } else {
        trimmed.to_string()
    }
}
