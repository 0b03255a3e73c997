//! Number formatting for totals.

/// Formats `value` with two decimals and `,` as thousands separator.
///
/// ```
/// use energy_map::render::format::format_thousands;
///
/// assert_eq!(format_thousands(1_234_567.891), "1,234,567.89");
/// assert_eq!(format_thousands(-1234.5), "-1,234.50");
/// ```
pub fn format_thousands(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    // "-0.00" reads as noise
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}
