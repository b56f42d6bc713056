/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use orderlens_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5, 1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    // Handle the sign separately so the thousands grouping works on the
    // absolute value.
    let negative = value < 0.0;
    let abs_value = value.abs();

    // Round to the requested decimal places. A half-ULP nudge avoids IEEE 754
    // binary-representation surprises at exact midpoints.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let integer_part = rounded.trunc() as u64;
    let frac_part = rounded - rounded.trunc();

    let grouped = group_thousands(&integer_part.to_string());

    let result = if decimals == 0 {
        grouped
    } else {
        let frac_str = format!("{:.prec$}", frac_part, prec = decimals as usize);
        // `frac_str` starts with "0.", e.g. "0.50". Strip the leading "0".
        format!("{}{}", grouped, &frac_str[1..])
    };

    if negative {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format a duration in minutes as a human-readable string.
///
/// # Examples
///
/// ```
/// use orderlens_core::formatting::format_minutes;
///
/// assert_eq!(format_minutes(45.0), "45m");
/// assert_eq!(format_minutes(60.0), "1h");
/// assert_eq!(format_minutes(225.0), "3h 45m");
/// assert_eq!(format_minutes(0.0), "0m");
/// ```
pub fn format_minutes(minutes: f64) -> String {
    let total_mins = minutes.round() as i64;
    if total_mins < 60 {
        format!("{}m", total_mins)
    } else {
        let hours = total_mins / 60;
        let mins = total_mins % 60;
        if mins == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h {}m", hours, mins)
        }
    }
}

/// Calculate `(part / whole) * 100`, rounded to `decimal_places`.
///
/// Returns `0.0` if `whole` is zero to avoid division by zero.
///
/// # Examples
///
/// ```
/// use orderlens_core::formatting::percentage;
///
/// assert!((percentage(12.0, 200.0, 1) - 6.0).abs() < 1e-9);
/// assert_eq!(percentage(5.0, 0.0, 2), 0.0);
/// ```
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    let raw = (part / whole) * 100.0;
    let factor = 10_f64.powi(decimal_places as i32);
    (raw * factor).round() / factor
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
