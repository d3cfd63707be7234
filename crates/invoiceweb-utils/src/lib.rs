//! Display formatting helpers

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Format an integer string with a thousands separator
pub fn format_number<T: ToString>(n: T, separator: &str) -> String {
    let s = n.to_string();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.as_str()),
    };

    let mut groups: Vec<String> = Vec::new();
    let mut current = String::new();
    for (count, c) in digits.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            groups.push(current.chars().rev().collect());
            current.clear();
        }
        current.push(c);
    }
    if !current.is_empty() {
        groups.push(current.chars().rev().collect());
    }
    groups.reverse();
    format!("{}{}", sign, groups.join(separator))
}

/// Format a monetary amount, e.g. `1 500,00 €`
pub fn format_amount(
    amount: Decimal,
    decimal_places: u32,
    thousands_separator: &str,
    decimal_separator: &str,
    symbol: &str,
) -> String {
    let rounded = amount.round_dp(decimal_places);
    let text = format!("{:.prec$}", rounded, prec = decimal_places as usize);
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (text, None),
    };

    let mut out = format_number(int_part, thousands_separator);
    if let Some(frac) = frac_part {
        out.push_str(decimal_separator);
        out.push_str(&frac);
    }
    if !symbol.is_empty() {
        out.push(' ');
        out.push_str(symbol);
    }
    out
}

/// Format a timestamp as `DD/MM/YYYY`
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Escape text for inclusion in HTML content or attributes
pub fn escape_html(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for c in content.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Generate a unique opaque token
pub fn generate_id() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{:x}-{:x}", now, seq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1500, ","), "1,500");
        assert_eq!(format_number(999, ","), "999");
        assert_eq!(format_number(1234567, " "), "1 234 567");
        assert_eq!(format_number(-1500, "."), "-1.500");
    }

    #[test]
    fn test_format_amount() {
        let amount = Decimal::from_str("1500").unwrap();
        assert_eq!(format_amount(amount, 2, " ", ",", "€"), "1 500,00 €");

        let amount = Decimal::from_str("1234.567").unwrap();
        assert_eq!(format_amount(amount, 2, ",", ".", ""), "1,234.57");

        let amount = Decimal::from_str("42").unwrap();
        assert_eq!(format_amount(amount, 0, " ", ",", "€"), "42 €");
    }

    #[test]
    fn test_format_date() {
        let date = Utc.with_ymd_and_hms(2020, 1, 5, 13, 0, 0).unwrap();
        assert_eq!(format_date(&date), "05/01/2020");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>A & B</b>"), "&lt;b&gt;A &amp; B&lt;/b&gt;");
        assert_eq!(escape_html("l'été"), "l&#39;été");
    }

    #[test]
    fn test_generate_id_unique() {
        assert_ne!(generate_id(), generate_id());
    }
}
