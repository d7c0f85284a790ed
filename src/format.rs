//! Token amount formatting
//!
//! Wallet balances and routes carry raw integer amounts in base units; these
//! helpers turn them into something that can be shown and spoken.

/// Default decimals when a token record does not say
const DEFAULT_DECIMALS: u32 = 18;

/// Fractional digits kept for display
const DISPLAY_DECIMALS: usize = 6;

/// Convert a base-unit integer string into a decimal string
///
/// Strings that already contain a decimal point are returned unchanged.
/// Trailing fractional zeros are trimmed.
pub fn format_units(raw: &str, decimals: Option<u32>) -> String {
    let raw = raw.trim();
    let raw = if raw.is_empty() { "0" } else { raw };
    let decimals = decimals.unwrap_or(DEFAULT_DECIMALS) as usize;

    if raw.contains('.') || decimals == 0 {
        return raw.to_string();
    }

    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };

    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return raw.to_string();
    }

    let (whole, frac) = if digits.len() > decimals {
        let split = digits.len() - decimals;
        (digits[..split].to_string(), digits[split..].to_string())
    } else {
        ("0".to_string(), format!("{:0>width$}", digits, width = decimals))
    };

    let frac = frac.trim_end_matches('0');
    let sign = if negative { "-" } else { "" };
    if frac.is_empty() {
        format!("{}{}", sign, whole)
    } else {
        format!("{}{}.{}", sign, whole, frac)
    }
}

/// Human-friendly amount for display and speech
pub fn format_amount_display(raw: &str, decimals: Option<u32>) -> String {
    let units = format_units(raw, decimals);
    let n: f64 = match units.parse() {
        Ok(n) => n,
        Err(_) => return units,
    };
    if !n.is_finite() {
        return units;
    }

    if n == 0.0 {
        return "0".to_string();
    }
    if n.abs() < 0.000_001 {
        return format!("{:.2e}", n);
    }
    if n.abs() < 1.0 {
        return trim_fraction(&format!("{:.*}", DISPLAY_DECIMALS, n));
    }

    let fixed = trim_fraction(&format!("{:.*}", DISPLAY_DECIMALS, n));
    group_thousands(&fixed)
}

/// Group a plain number for speech, keeping at most three fractional digits
pub fn format_grouped(n: f64) -> String {
    if !n.is_finite() {
        return "0".to_string();
    }
    group_thousands(&trim_fraction(&format!("{:.3}", n)))
}

fn trim_fraction(s: &str) -> String {
    if !s.contains('.') {
        return s.to_string();
    }
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn group_thousands(s: &str) -> String {
    let (sign, rest) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s),
    };
    let (whole, frac) = match rest.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (rest, None),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match frac {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}
