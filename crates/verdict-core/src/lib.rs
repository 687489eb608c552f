#![forbid(unsafe_code)]

//! Leaf types for verdict: values, results, rules and converters.
//!
//! Nothing in this crate is reactive. Rules are pure functions of a
//! [`Value`] and their bounds; converters turn entered text into values and
//! back; [`ValidationResult`] is the tri-state outcome everything else
//! aggregates.
//!
//! # Example
//!
//! ```rust
//! use verdict_core::rules::{OneOf, Rule};
//! use verdict_core::Value;
//!
//! let rule = OneOf::new(["a", "b"]);
//! assert!(rule.test(&Value::from("c")).is_failed());
//! assert!(rule.test(&Value::from("a")).is_passed());
//! ```

pub mod converters;
pub mod error;
pub mod formatting;
pub mod locale;
pub mod numeric;
pub mod result;
pub mod rules;
pub mod value;

pub use converters::{
    Converter, ConverterSet, DateConverter, EmailConverter, NumberConverter, NumericConverter,
    NumericForm, PassThrough,
};
pub use error::ConfigError;
pub use locale::{DEFAULT_LOCALE, LocaleConfig};
pub use numeric::{NumericHelper, NumericSettings};
pub use result::{ResultState, ValidationResult};
pub use rules::{Custom, Expression, Length, NoneOf, OneOf, Range, Rule, RuleSettings};
pub use value::{Dynamic, Value};
