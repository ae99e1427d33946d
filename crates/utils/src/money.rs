//! Currency formatting matching the `ru-RU` locale with whole rubles.

/// Group separator and the gap before the currency sign (U+00A0 NO-BREAK SPACE).
pub const NBSP: char = '\u{a0}';
pub const CURRENCY_SIGN: &str = "₽";

/// The locale leaves four-digit amounts ungrouped ("1000 ₽", but "10 000 ₽").
const MIN_GROUPING_DIGITS: usize = 5;

/// Render a whole-currency amount with zero fractional digits, e.g. `1 860 000 ₽`.
pub fn format_price(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() * 2 + CURRENCY_SIGN.len() + 2);

    if amount < 0 {
        out.push('-');
    }

    let grouped = digits.len() >= MIN_GROUPING_DIGITS;
    for (i, ch) in digits.chars().enumerate() {
        if grouped && i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(NBSP);
        }
        out.push(ch);
    }

    out.push(NBSP);
    out.push_str(CURRENCY_SIGN);
    out
}
