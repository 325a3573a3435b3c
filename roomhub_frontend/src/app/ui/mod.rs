use chrono::{DateTime, Utc};

mod dashboard;
mod feed;
mod listing_form;
mod room;
mod settings;

pub(crate) fn format_timestamp(ts: &str) -> String {
    DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.with_timezone(&Utc).format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| ts.to_string())
}

/// Naira amount with thousands separators, e.g. `₦150,000`.
pub(crate) fn format_price(price: f64) -> String {
    let whole = price.trunc().abs() as u64;
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if price < 0.0 { "-" } else { "" };
    format!("{sign}₦{grouped}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prices_are_grouped_by_thousands() {
        assert_eq!(format_price(0.0), "₦0");
        assert_eq!(format_price(950.0), "₦950");
        assert_eq!(format_price(150000.0), "₦150,000");
        assert_eq!(format_price(1250000.4), "₦1,250,000");
    }

    #[test]
    fn timestamps_fall_back_to_raw_text() {
        assert_eq!(format_timestamp("2024-03-01T10:00:00Z"), "2024-03-01");
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }
}
