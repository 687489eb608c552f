#![forbid(unsafe_code)]

//! Locale-aware recognition, parsing and formatting of numeric entry.

use regex::Regex;

use crate::error::ConfigError;
use crate::formatting::add_thousands_separator;

/// Separators and currency conventions for numeric text.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NumericSettings {
    pub decimal_separator: char,
    pub thousands_separator: char,
    pub currency_sign: String,
    /// Digits after the decimal separator in a minor currency amount.
    pub currency_minor_unit_places: usize,
}

impl Default for NumericSettings {
    fn default() -> Self {
        Self {
            decimal_separator: '.',
            thousands_separator: ',',
            currency_sign: "£".to_string(),
            currency_minor_unit_places: 2,
        }
    }
}

/// Flags decoded from a format string such as `"C,.c"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FormatOptions {
    currency_sign: bool,
    thousands_separator: bool,
    /// `None` keeps the natural representation.
    decimal_places: Option<usize>,
}

/// Recognizes and converts numeric text for one set of [`NumericSettings`].
///
/// ```rust
/// use verdict_core::{NumericHelper, NumericSettings};
///
/// let helper = NumericHelper::new(NumericSettings::default())?;
/// assert!(helper.is_integer("1,234"));
/// assert!(!helper.is_integer("12,34"));
/// assert_eq!(helper.parse("£1,234.50"), Some(1234.5));
/// assert_eq!(helper.format(-1234.5, "C,.c"), "-£1,234.50");
/// # Ok::<(), verdict_core::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct NumericHelper {
    settings: NumericSettings,
    integer: Regex,
    float: Regex,
    currency_major: Regex,
    currency_major_minor: Regex,
}

impl NumericHelper {
    /// Build a helper, compiling the entry patterns for `settings`.
    pub fn new(settings: NumericSettings) -> Result<Self, ConfigError> {
        let decimal = settings.decimal_separator;
        let thousands = settings.thousands_separator;
        if decimal == thousands || decimal.is_ascii_digit() || thousands.is_ascii_digit() {
            return Err(ConfigError::InvalidSeparators { decimal, thousands });
        }

        let thousands_escaped = regex::escape(&thousands.to_string());
        let decimal_escaped = regex::escape(&decimal.to_string());
        let sign_escaped = regex::escape(&settings.currency_sign);
        let integer = format!(r"\d+({thousands_escaped}\d{{3}})*");
        let currency_major = format!("({sign_escaped})?{integer}");
        let currency_major_minor = format!(
            r"{currency_major}({decimal_escaped}\d{{{}}})?",
            settings.currency_minor_unit_places
        );
        let float = format!(r"{integer}({decimal_escaped}\d+)?");

        Ok(Self {
            integer: anchored(&integer)?,
            float: anchored(&float)?,
            currency_major: anchored(&currency_major)?,
            currency_major_minor: anchored(&currency_major_minor)?,
            settings,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &NumericSettings {
        &self.settings
    }

    #[must_use]
    pub fn is_integer(&self, text: &str) -> bool {
        self.integer.is_match(text)
    }

    #[must_use]
    pub fn is_float(&self, text: &str) -> bool {
        self.float.is_match(text)
    }

    #[must_use]
    pub fn is_currency_major(&self, text: &str) -> bool {
        self.currency_major.is_match(text)
    }

    #[must_use]
    pub fn is_currency_major_minor(&self, text: &str) -> bool {
        self.currency_major_minor.is_match(text)
    }

    /// Strip the currency sign and thousands separators and normalize the
    /// decimal separator to `.`.
    #[must_use]
    pub fn unformat(&self, text: &str) -> String {
        let settings = &self.settings;
        let mut out = if settings.currency_sign.is_empty() {
            text.to_string()
        } else {
            text.replace(settings.currency_sign.as_str(), "")
        };
        out.retain(|c| c != settings.thousands_separator);
        if settings.decimal_separator != '.' {
            out = out.replace(settings.decimal_separator, ".");
        }
        out
    }

    /// Parse numeric text in this helper's conventions.
    #[must_use]
    pub fn parse(&self, text: &str) -> Option<f64> {
        self.unformat(text).trim().parse::<f64>().ok()
    }

    /// Parse whole-number text exactly. `None` when the text is not an
    /// integer or does not fit in an `i64`.
    #[must_use]
    pub fn parse_integer(&self, text: &str) -> Option<i64> {
        self.unformat(text).trim().parse::<i64>().ok()
    }

    /// Insert thousands separators into already-localized numeric text.
    #[must_use]
    pub fn add_thousands_separator(&self, text: &str) -> String {
        add_thousands_separator(
            text,
            self.settings.thousands_separator,
            self.settings.decimal_separator,
        )
    }

    /// Render `value` according to `format`.
    ///
    /// `C` prefixes the currency sign, `,` adds thousands separators, a
    /// trailing `.` keeps the natural decimal representation, `.c` uses the
    /// currency minor-unit places and `.N` uses `N` places. Without a `.`
    /// the value is rounded to a whole number.
    #[must_use]
    pub fn format(&self, value: f64, format: &str) -> String {
        let options = self.format_options(format);
        let magnitude = value.abs();
        let text = match options.decimal_places {
            Some(places) => format!("{magnitude:.places$}"),
            None => format!("{magnitude}"),
        };
        // Values that round to zero lose their sign.
        let negative = value < 0.0 && text.bytes().any(|b| matches!(b, b'1'..=b'9'));
        self.decorate(text, negative, options)
    }

    /// Render a whole number according to `format` without going through
    /// floating point.
    #[must_use]
    pub fn format_integer(&self, value: i64, format: &str) -> String {
        let options = self.format_options(format);
        let mut text = value.unsigned_abs().to_string();
        if let Some(places) = options.decimal_places.filter(|places| *places > 0) {
            text.push('.');
            text.extend(std::iter::repeat_n('0', places));
        }
        self.decorate(text, value < 0, options)
    }

    fn decorate(&self, mut text: String, negative: bool, options: FormatOptions) -> String {
        if self.settings.decimal_separator != '.' {
            text = text.replacen('.', &self.settings.decimal_separator.to_string(), 1);
        }
        if options.thousands_separator {
            text = self.add_thousands_separator(&text);
        }

        let mut out = String::with_capacity(text.len() + 4);
        if negative {
            out.push('-');
        }
        if options.currency_sign {
            out.push_str(&self.settings.currency_sign);
        }
        out.push_str(&text);
        out
    }

    fn format_options(&self, format: &str) -> FormatOptions {
        let decimal_places = match format.find('.') {
            None => Some(0),
            Some(index) if index == format.len() - 1 => None,
            Some(index) => {
                let places = &format[index + 1..];
                if places.starts_with('c') {
                    Some(self.settings.currency_minor_unit_places)
                } else {
                    Some(places.parse().unwrap_or(0))
                }
            }
        };
        FormatOptions {
            currency_sign: format.contains('C'),
            thousands_separator: format.contains(','),
            decimal_places,
        }
    }
}

fn anchored(body: &str) -> Result<Regex, ConfigError> {
    let pattern = format!("^-?{body}$");
    Regex::new(&pattern).map_err(|source| ConfigError::InvalidPattern { pattern, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn helper() -> NumericHelper {
        NumericHelper::new(NumericSettings::default()).expect("default settings are valid")
    }

    fn continental() -> NumericHelper {
        NumericHelper::new(NumericSettings {
            decimal_separator: ',',
            thousands_separator: '.',
            currency_sign: "€".into(),
            currency_minor_unit_places: 2,
        })
        .expect("continental settings are valid")
    }

    #[test]
    fn recognizes_integer_forms() {
        let helper = helper();
        assert!(helper.is_integer("42"));
        assert!(helper.is_integer("-42"));
        assert!(helper.is_integer("1,234,567"));
        assert!(!helper.is_integer("1,23"));
        assert!(!helper.is_integer("4.2"));
        assert!(!helper.is_integer(""));
    }

    #[test]
    fn recognizes_float_and_currency_forms() {
        let helper = helper();
        assert!(helper.is_float("1,234.5678"));
        assert!(!helper.is_float("1.2.3"));
        assert!(helper.is_currency_major("£1,000"));
        assert!(helper.is_currency_major("1000"));
        assert!(!helper.is_currency_major("£10.50"));
        assert!(helper.is_currency_major_minor("£10.50"));
        assert!(helper.is_currency_major_minor("-£10"));
        assert!(!helper.is_currency_major_minor("£10.5"));
    }

    #[test]
    fn unformat_strips_every_separator() {
        let helper = helper();
        assert_eq!(helper.unformat("£1,234,567.25"), "1234567.25");
        assert_eq!(helper.parse("1,234,567"), Some(1_234_567.0));
        assert_eq!(helper.parse("abc"), None);
    }

    #[test]
    fn format_flags() {
        let helper = helper();
        assert_eq!(helper.format(1234.567, ""), "1235");
        assert_eq!(helper.format(1234.567, ","), "1,235");
        assert_eq!(helper.format(1234.5, ",."), "1,234.5");
        assert_eq!(helper.format(1234.5, "C,.c"), "£1,234.50");
        assert_eq!(helper.format(1234.5, ".3"), "1234.500");
        assert_eq!(helper.format(-5.0, "C"), "-£5");
    }

    #[test]
    fn negative_values_rounding_to_zero_drop_the_sign() {
        let helper = helper();
        assert_eq!(helper.format(-0.4, ""), "0");
        assert_eq!(helper.format(-0.004, ".c"), "0.00");
        assert_eq!(helper.format(-0.6, ""), "-1");
        assert_eq!(helper.format(-0.0, "C,.c"), "£0.00");
    }

    #[test]
    fn integers_parse_and_format_exactly() {
        let helper = helper();
        assert_eq!(
            helper.parse_integer("9,007,199,254,740,993"),
            Some(9_007_199_254_740_993)
        );
        assert_eq!(helper.parse_integer("-42"), Some(-42));
        assert_eq!(helper.parse_integer("99999999999999999999"), None);
        assert_eq!(
            helper.format_integer(9_007_199_254_740_993, ","),
            "9,007,199,254,740,993"
        );
        assert_eq!(helper.format_integer(-1234, "C,.c"), "-£1,234.00");
        assert_eq!(helper.format_integer(i64::MIN, ""), "-9223372036854775808");
    }

    #[test]
    fn continental_separators() {
        let helper = continental();
        assert!(helper.is_float("1.234,5"));
        assert_eq!(helper.parse("€1.234,50"), Some(1234.5));
        assert_eq!(helper.format(1234.5, "C,.c"), "€1.234,50");
    }

    #[test]
    fn identical_separators_are_rejected() {
        let err = NumericHelper::new(NumericSettings {
            decimal_separator: ',',
            thousands_separator: ',',
            ..NumericSettings::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSeparators { .. }));
    }
}
