#![forbid(unsafe_code)]

//! Converters between entered text and [`Value`]s.
//!
//! A converter renders a value for display (optionally guided by a format
//! string) and parses entered text back into a value. Parsing returns
//! `None` for text that is not a valid entry; callers record that as an
//! entry failure rather than an error.

use std::fmt;
use std::rc::Rc;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::error::ConfigError;
use crate::formatting::pad;
use crate::locale::LocaleConfig;
use crate::numeric::NumericHelper;
use crate::value::Value;

static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d\d?)[-/](\d\d?)[-/](\d{4})$").expect("date pattern is valid")
});

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,4}$").expect("email pattern is valid")
});

/// Renders values as text and parses entered text.
pub trait Converter {
    /// Render `value`. `Null` renders as an empty string.
    fn format(&self, value: &Value, format: Option<&str>) -> String;

    /// Parse entered text; `None` means the text is not a valid entry.
    fn parse(&self, text: &str) -> Option<Value>;

    /// Short identifier used in logs.
    fn name(&self) -> &'static str;
}

/// Text in, text out.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl Converter for PassThrough {
    fn format(&self, value: &Value, _format: Option<&str>) -> String {
        value.to_string()
    }

    fn parse(&self, text: &str) -> Option<Value> {
        Some(Value::Text(text.to_string()))
    }

    fn name(&self) -> &'static str {
        "pass_through"
    }
}

/// Day/month/year dates (or month/day/year).
#[derive(Debug, Clone, Copy, Default)]
pub struct DateConverter {
    pub month_before_date: bool,
}

impl DateConverter {
    #[must_use]
    pub fn new(month_before_date: bool) -> Self {
        Self { month_before_date }
    }
}

impl Converter for DateConverter {
    fn format(&self, value: &Value, _format: Option<&str>) -> String {
        let Value::Date(date) = value else {
            return value.to_string();
        };
        let day = pad(&date.day().to_string(), '0', 2);
        let month = pad(&date.month().to_string(), '0', 2);
        let (first, second) = if self.month_before_date {
            (month, day)
        } else {
            (day, month)
        };
        format!("{first}/{second}/{}", date.year())
    }

    fn parse(&self, text: &str) -> Option<Value> {
        let captures = DATE_PATTERN.captures(text)?;
        let first: u32 = captures[1].parse().ok()?;
        let second: u32 = captures[2].parse().ok()?;
        let year: i32 = captures[3].parse().ok()?;
        let (day, month) = if self.month_before_date {
            (second, first)
        } else {
            (first, second)
        };
        NaiveDate::from_ymd_opt(year, month, day).map(Value::Date)
    }

    fn name(&self) -> &'static str {
        "date"
    }
}

/// E-mail addresses, normalized to lower case.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailConverter;

impl Converter for EmailConverter {
    fn format(&self, value: &Value, _format: Option<&str>) -> String {
        value.to_string()
    }

    fn parse(&self, text: &str) -> Option<Value> {
        EMAIL_PATTERN
            .is_match(text)
            .then(|| Value::Text(text.to_lowercase()))
    }

    fn name(&self) -> &'static str {
        "email"
    }
}

/// Any numeric literal Rust can parse.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberConverter;

impl Converter for NumberConverter {
    fn format(&self, value: &Value, _format: Option<&str>) -> String {
        value.to_string()
    }

    fn parse(&self, text: &str) -> Option<Value> {
        let number: f64 = text.trim().parse().ok()?;
        (!number.is_nan()).then_some(Value::Float(number))
    }

    fn name(&self) -> &'static str {
        "number"
    }
}

/// Which entry form a [`NumericConverter`] accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericForm {
    /// Whole numbers with optional thousands separators.
    Integer,
    /// Whole numbers with an optional fractional part.
    Float,
    /// Whole currency amounts with an optional currency sign.
    CurrencyMajor,
    /// Currency amounts with exactly the minor-unit places, if any.
    CurrencyMajorMinor,
}

/// Locale-aware numeric entry backed by a [`NumericHelper`].
#[derive(Clone)]
pub struct NumericConverter {
    helper: Rc<NumericHelper>,
    form: NumericForm,
}

impl NumericConverter {
    #[must_use]
    pub fn new(helper: Rc<NumericHelper>, form: NumericForm) -> Self {
        Self { helper, form }
    }

    #[must_use]
    pub fn form(&self) -> NumericForm {
        self.form
    }

    #[must_use]
    pub fn helper(&self) -> &NumericHelper {
        &self.helper
    }
}

impl fmt::Debug for NumericConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NumericConverter")
            .field("form", &self.form)
            .field("settings", self.helper.settings())
            .finish()
    }
}

impl Converter for NumericConverter {
    fn format(&self, value: &Value, format: Option<&str>) -> String {
        let format = format.unwrap_or("");
        match value {
            Value::Integer(number) => self.helper.format_integer(*number, format),
            _ => match value.as_f64() {
                Some(number) => self.helper.format(number, format),
                None => value.to_string(),
            },
        }
    }

    fn parse(&self, text: &str) -> Option<Value> {
        let helper = &self.helper;
        let recognized = match self.form {
            NumericForm::Integer => helper.is_integer(text),
            NumericForm::Float => helper.is_float(text),
            NumericForm::CurrencyMajor => helper.is_currency_major(text),
            NumericForm::CurrencyMajorMinor => helper.is_currency_major_minor(text),
        };
        if !recognized {
            return None;
        }
        match self.form {
            NumericForm::Integer => helper.parse_integer(text).map(Value::Integer),
            _ => helper.parse(text).map(Value::Float),
        }
    }

    fn name(&self) -> &'static str {
        match self.form {
            NumericForm::Integer => "integer",
            NumericForm::Float => "float",
            NumericForm::CurrencyMajor => "currency_major",
            NumericForm::CurrencyMajorMinor => "currency_major_minor",
        }
    }
}

/// One shared instance of every built-in converter for a locale.
#[derive(Clone)]
pub struct ConverterSet {
    pub pass_through: Rc<dyn Converter>,
    pub date: Rc<dyn Converter>,
    pub email: Rc<dyn Converter>,
    pub number: Rc<dyn Converter>,
    pub integer: Rc<dyn Converter>,
    pub float: Rc<dyn Converter>,
    pub currency_major: Rc<dyn Converter>,
    pub currency_major_minor: Rc<dyn Converter>,
}

impl ConverterSet {
    /// Build converters for `locale`.
    pub fn new(locale: &LocaleConfig) -> Result<Self, ConfigError> {
        let helper = Rc::new(NumericHelper::new(locale.numeric.clone())?);
        let numeric = |form| -> Rc<dyn Converter> {
            Rc::new(NumericConverter::new(Rc::clone(&helper), form))
        };
        Ok(Self {
            pass_through: Rc::new(PassThrough),
            date: Rc::new(DateConverter::new(locale.month_before_date)),
            email: Rc::new(EmailConverter),
            number: Rc::new(NumberConverter),
            integer: numeric(NumericForm::Integer),
            float: numeric(NumericForm::Float),
            currency_major: numeric(NumericForm::CurrencyMajor),
            currency_major_minor: numeric(NumericForm::CurrencyMajorMinor),
        })
    }
}

impl fmt::Debug for ConverterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterSet").finish_non_exhaustive()
    }
}
