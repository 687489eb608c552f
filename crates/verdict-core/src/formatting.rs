#![forbid(unsafe_code)]

//! String formatting helpers shared by rules and converters.

/// Replace `{word}` placeholders in one pass.
///
/// A placeholder is `{` followed by one or more word characters and `}`.
/// Placeholders with no replacement are left as written, and replacement
/// text is never rescanned.
///
/// ```rust
/// use verdict_core::formatting::replace_placeholders;
///
/// let text = replace_placeholders("{name} must be at least {minimum}.", &[("minimum", "3")]);
/// assert_eq!(text, "{name} must be at least 3.");
/// ```
#[must_use]
pub fn replace_placeholders(template: &str, replacements: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let word_len = after
            .char_indices()
            .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
            .map_or(after.len(), |(index, _)| index);
        let closes = after[word_len..].starts_with('}');
        if word_len == 0 || !closes {
            out.push('{');
            rest = after;
            continue;
        }
        let key = &after[..word_len];
        match replacements.iter().find(|(candidate, _)| *candidate == key) {
            Some((_, replacement)) => out.push_str(replacement),
            None => {
                out.push('{');
                out.push_str(key);
                out.push('}');
            }
        }
        rest = &after[word_len + 1..];
    }
    out.push_str(rest);
    out
}

/// Insert `thousands` between every group of three digits in the whole
/// part of `number`. The fractional part, after `decimal`, is untouched.
///
/// ```rust
/// use verdict_core::formatting::add_thousands_separator;
///
/// assert_eq!(add_thousands_separator("-1234567.891", ',', '.'), "-1,234,567.891");
/// ```
#[must_use]
pub fn add_thousands_separator(number: &str, thousands: char, decimal: char) -> String {
    let (whole, fraction) = match number.find(decimal) {
        Some(index) => number.split_at(index),
        None => (number, ""),
    };
    let digits_start = whole
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(whole.len());
    let (prefix, digits) = whole.split_at(digits_start);

    let mut out = String::with_capacity(number.len() + digits.len() / 3);
    out.push_str(prefix);
    let count = digits.chars().count();
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (count - index) % 3 == 0 {
            out.push(thousands);
        }
        out.push(digit);
    }
    out.push_str(fraction);
    out
}

/// Left-pad `text` with `fill` up to `width` characters.
#[must_use]
pub fn pad(text: &str, fill: char, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }
    let mut out: String = std::iter::repeat_n(fill, width - len).collect();
    out.push_str(text);
    out
}
