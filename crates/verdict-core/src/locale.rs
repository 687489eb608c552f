#![forbid(unsafe_code)]

//! Locale conventions for numeric and date entry.
//!
//! A [`LocaleConfig`] picks the separators, currency sign and date field
//! order that converters use. Locales are detected from the environment the
//! same way POSIX tools do: `VERDICT_LOCALE` first, then `LC_ALL`, then
//! `LANG`, with codeset and modifier suffixes ignored.

use std::env;

use crate::numeric::NumericSettings;

/// Locale used when nothing else is configured.
pub const DEFAULT_LOCALE: &str = "en-GB";

/// Conventions used by converters for one locale.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocaleConfig {
    /// Normalized locale tag, e.g. `en-US`.
    pub locale: String,
    pub numeric: NumericSettings,
    /// `true` for month/day/year dates.
    pub month_before_date: bool,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self::for_locale(DEFAULT_LOCALE)
    }
}

impl LocaleConfig {
    /// Conventions for `locale`. Unknown languages fall back to `en-GB`
    /// conventions but keep their own tag.
    #[must_use]
    pub fn for_locale(locale: &str) -> Self {
        let tag = normalize_locale_raw(locale).unwrap_or_else(|| DEFAULT_LOCALE.to_string());
        let (language, region) = match tag.split_once('-') {
            Some((language, region)) => (language.to_ascii_lowercase(), region.to_ascii_uppercase()),
            None => (tag.to_ascii_lowercase(), String::new()),
        };

        let (numeric, month_before_date) = match (language.as_str(), region.as_str()) {
            ("en", "US") => (numeric('.', ',', "$", 2), true),
            ("en", _) => (NumericSettings::default(), false),
            ("de", _) => (numeric(',', '.', "€", 2), false),
            ("fr", _) => (numeric(',', '\u{202f}', "€", 2), false),
            ("ja", _) => (numeric('.', ',', "¥", 0), false),
            _ => {
                tracing::debug!(locale = %tag, "no conventions for locale, using en-GB");
                (NumericSettings::default(), false)
            }
        };

        Self {
            locale: tag,
            numeric,
            month_before_date,
        }
    }

    /// Detect the locale from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        let explicit = env::var("VERDICT_LOCALE").ok();
        let lc_all = env::var("LC_ALL").ok();
        let lang = env::var("LANG").ok();
        Self::for_locale(&detect_locale_from(
            explicit.as_deref(),
            lc_all.as_deref(),
            lang.as_deref(),
        ))
    }
}

fn numeric(decimal: char, thousands: char, sign: &str, places: usize) -> NumericSettings {
    NumericSettings {
        decimal_separator: decimal,
        thousands_separator: thousands,
        currency_sign: sign.to_string(),
        currency_minor_unit_places: places,
    }
}

fn detect_locale_from(explicit: Option<&str>, lc_all: Option<&str>, lang: Option<&str>) -> String {
    explicit
        .and_then(normalize_locale_raw)
        .or_else(|| lc_all.and_then(normalize_locale_raw))
        .or_else(|| lang.and_then(normalize_locale_raw))
        .unwrap_or_else(|| DEFAULT_LOCALE.to_string())
}

fn normalize_locale_raw(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let raw = raw.split('@').next().unwrap_or(raw);
    let raw = raw.split('.').next().unwrap_or(raw).trim();
    if raw.is_empty() {
        return None;
    }
    if raw.eq_ignore_ascii_case("c") || raw.eq_ignore_ascii_case("posix") {
        return Some("en".to_string());
    }
    Some(raw.replace('_', "-"))
}
