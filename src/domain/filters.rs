//! Small text helpers for user-facing output.

/// Format an integer string with thousands separators (`12345` → `12,345`).
/// Anything that is not an integer is returned unchanged.
pub fn number_format(value: &str) -> String {
    let Ok(number) = value.trim().parse::<i64>() else {
        return value.to_string();
    };
    let digits = number.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if number < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
