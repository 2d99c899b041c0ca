//! Presupuesto (budget) text
//!
//! Budgets are kept as formatted text like `"$1.500.000"`. The numeric value
//! is always the digits of that text read as one integer.

/// Integer value of a formatted budget; non-digits are ignored
pub fn parse_presupuesto(text: &str) -> i64 {
    text.chars()
        .filter_map(|c| c.to_digit(10))
        .fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add(d as i64))
}

/// Colombian peso format with dot thousands separators, e.g. `$1.500.000`
pub fn format_presupuesto(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    if amount < 0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}
