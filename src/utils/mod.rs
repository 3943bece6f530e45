//! Formatting utilities for consistent display of currency and percent
//! values throughout the application.

use rust_decimal::Decimal;

/// Core formatting function with full control over output.
///
/// Formats a Decimal value using US locale conventions:
/// - Thousands separator: `,` (comma)
/// - Decimal separator: `.` (period)
///
/// # Arguments
/// * `value` - The decimal value to format
/// * `decimals` - Number of fractional digits to keep
/// * `prefix` - Currency symbol or other prefix ("" for none)
///
/// # Examples
/// ```
/// use folio::utils::format_amount;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_amount(dec!(1234.56), 2, "$"), "$1,234.56");
/// assert_eq!(format_amount(dec!(-500), 2, "$"), "$-500.00");
/// assert_eq!(format_amount(dec!(9876543), 0, ""), "9,876,543");
/// ```
pub fn format_amount(value: Decimal, decimals: usize, prefix: &str) -> String {
    let is_negative = value < Decimal::ZERO;
    let abs_value = value.abs();

    let formatted = format!("{:.*}", decimals, abs_value);
    let parts: Vec<&str> = formatted.split('.').collect();

    let integer_part = parts[0];
    let decimal_part = parts.get(1).copied();

    // Add thousands separators (,) to the integer part
    let with_separators: String = integer_part
        .chars()
        .rev()
        .enumerate()
        .flat_map(|(i, c)| {
            if i > 0 && i % 3 == 0 {
                vec![',', c]
            } else {
                vec![c]
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    let sign = if is_negative { "-" } else { "" };
    match decimal_part {
        Some(frac) => format!("{}{}{}.{}", prefix, sign, with_separators, frac),
        None => format!("{}{}{}", prefix, sign, with_separators),
    }
}

/// Format as US dollars: "$1,234.56"
///
/// # Examples
/// ```
/// use folio::utils::format_currency;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_currency(dec!(15500)), "$15,500.00");
/// assert_eq!(format_currency(dec!(-0.5)), "$-0.50");
/// ```
pub fn format_currency(value: Decimal) -> String {
    format_amount(value, 2, "$")
}

/// Format in the given currency's display convention. Yen amounts carry
/// no fractional digits; unknown codes fall back to a code prefix.
///
/// # Examples
/// ```
/// use folio::utils::format_money;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_money(dec!(150.25), "USD"), "$150.25");
/// assert_eq!(format_money(dec!(28400), "JPY"), "¥28,400");
/// assert_eq!(format_money(dec!(99.9), "EUR"), "EUR 99.90");
/// ```
pub fn format_money(value: Decimal, currency: &str) -> String {
    match currency {
        "USD" => format_amount(value, 2, "$"),
        "JPY" => format_amount(value, 0, "¥"),
        other => format!("{} {}", other, format_amount(value, 2, "")),
    }
}

/// Format a percentage with the given number of fractional digits.
///
/// # Examples
/// ```
/// use folio::utils::format_percent;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_percent(dec!(100), 1), "100.0%");
/// assert_eq!(format_percent(dec!(9.6774), 1), "9.7%");
/// ```
pub fn format_percent(value: Decimal, decimals: usize) -> String {
    format!("{:.*}%", decimals, value)
}

/// Format a percentage with an explicit sign, two fractional digits.
///
/// # Examples
/// ```
/// use folio::utils::format_signed_percent;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_signed_percent(dec!(1.35)), "+1.35%");
/// assert_eq!(format_signed_percent(dec!(-6.2)), "-6.20%");
/// assert_eq!(format_signed_percent(dec!(0)), "+0.00%");
/// ```
pub fn format_signed_percent(value: Decimal) -> String {
    if value >= Decimal::ZERO {
        format!("+{:.2}%", value)
    } else {
        format!("{:.2}%", value)
    }
}
