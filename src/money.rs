/// Formats an amount in cents as a dollar string, e.g. `12345` -> `"$123.45"`.
///
/// Negative amounts keep the sign after the currency symbol (`"$-1.50"`).
pub fn format_dollars(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("${sign}{}.{:02}", abs / 100, abs % 100)
}
