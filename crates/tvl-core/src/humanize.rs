//! Compact human-readable formatting of TVL amounts for report messages.

const UNITS: [&str; 5] = ["", "k", "M", "B", "T"];

/// Format `value` with two decimals and a magnitude suffix,
/// e.g. `1234567.0` → `"1.23M"`.
pub fn humanize_number(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let mut scaled = value.abs();
    let mut unit = 0;
    while scaled >= 1000.0 && unit < UNITS.len() - 1 {
        scaled /= 1000.0;
        unit += 1;
    }
    format!("{sign}{scaled:.2}{}", UNITS[unit])
}
