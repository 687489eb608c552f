#![forbid(unsafe_code)]

//! Dynamic values held by validated cells, and value-or-function parameters.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A value held by a validated cell.
///
/// Equality is strict: `Integer` and `Float` compare numerically with each
/// other, every other pair of different variants is unequal. Ordering is
/// available through [`Value::compare`].
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// No value.
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    List(Vec<Value>),
}

impl Value {
    /// `true` for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The default missing test: null, empty text or an empty list.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.is_empty(),
            Self::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Character count for text, item count for lists.
    #[must_use]
    pub fn length(&self) -> Option<usize> {
        match self {
            Self::Text(text) => Some(text.chars().count()),
            Self::List(items) => Some(items.len()),
            _ => None,
        }
    }

    /// Numeric view of `Integer` and `Float`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(date) => Some(*date),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Order two values.
    ///
    /// Numbers compare across `Integer`/`Float`; text compared with a number
    /// is parsed as a number first. Dates, booleans and text compare with
    /// their own kind. Everything else (including `Null`) is incomparable.
    #[must_use]
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Integer(_) | Self::Float(_), Self::Integer(_) | Self::Float(_)) => {
                self.as_f64()?.partial_cmp(&other.as_f64()?)
            }
            (Self::Text(text), Self::Integer(_) | Self::Float(_)) => {
                parse_number(text)?.partial_cmp(&other.as_f64()?)
            }
            (Self::Integer(_) | Self::Float(_), Self::Text(text)) => {
                self.as_f64()?.partial_cmp(&parse_number(text)?)
            }
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok()
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Integer(_) | Self::Float(_), Self::Integer(_) | Self::Float(_)) => {
                self.as_f64() == other.as_f64()
            }
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Text(text) => f.write_str(text),
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

macro_rules! value_from {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$source> for Value {
                fn from(value: $source) -> Self {
                    Value::$variant(value.into())
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i32 => Integer,
    u32 => Integer,
    i64 => Integer,
    f32 => Float,
    f64 => Float,
    String => Text,
    &str => Text,
    NaiveDate => Date,
    Vec<Value> => List,
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

// ---------------------------------------------------------------------------
// Dynamic
// ---------------------------------------------------------------------------

/// A parameter that is either fixed or re-evaluated on every read.
///
/// Reads of a `Computed` parameter happen inside whatever evaluation asks
/// for them, so a closure that reads reactive cells makes the caller depend
/// on those cells.
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use verdict_core::{Dynamic, Value};
///
/// let fixed: Dynamic<Value> = 5.into();
/// assert_eq!(fixed.get(), Value::Integer(5));
///
/// let limit = Rc::new(Cell::new(10));
/// let moving = {
///     let limit = Rc::clone(&limit);
///     Dynamic::computed(move || Value::from(limit.get()))
/// };
/// limit.set(20);
/// assert_eq!(moving.get(), Value::Integer(20));
/// ```
pub enum Dynamic<T> {
    Fixed(T),
    Computed(Rc<dyn Fn() -> T>),
}

impl<T: Clone> Dynamic<T> {
    /// Current value.
    #[must_use]
    pub fn get(&self) -> T {
        match self {
            Self::Fixed(value) => value.clone(),
            Self::Computed(f) => f(),
        }
    }
}

impl<T> Dynamic<T> {
    /// Wrap a zero-argument accessor.
    #[must_use]
    pub fn computed(f: impl Fn() -> T + 'static) -> Self {
        Self::Computed(Rc::new(f))
    }

    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed(_))
    }
}

impl<T: Clone + 'static> Dynamic<T> {
    /// Transform the produced value, keeping fixed parameters fixed.
    #[must_use]
    pub fn map<U: 'static>(self, f: impl Fn(T) -> U + 'static) -> Dynamic<U> {
        match self {
            Self::Fixed(value) => Dynamic::Fixed(f(value)),
            Self::Computed(g) => Dynamic::Computed(Rc::new(move || f(g()))),
        }
    }
}

impl Dynamic<Value> {
    /// An absent bound.
    #[must_use]
    pub fn absent() -> Self {
        Self::Fixed(Value::Null)
    }
}

impl<T: Clone> Clone for Dynamic<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Fixed(value) => Self::Fixed(value.clone()),
            Self::Computed(f) => Self::Computed(Rc::clone(f)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Dynamic<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl<T: Default> Default for Dynamic<T> {
    fn default() -> Self {
        Self::Fixed(T::default())
    }
}

macro_rules! dynamic_value_from {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for Dynamic<Value> {
                fn from(value: $source) -> Self {
                    Dynamic::Fixed(Value::from(value))
                }
            }
        )*
    };
}

dynamic_value_from!(Value, bool, i32, u32, i64, f32, f64, String, &str, NaiveDate);

impl<T: Into<Value>> From<Option<T>> for Dynamic<Value> {
    fn from(value: Option<T>) -> Self {
        Dynamic::Fixed(Value::from(value))
    }
}

impl From<bool> for Dynamic<bool> {
    fn from(value: bool) -> Self {
        Dynamic::Fixed(value)
    }
}

impl From<String> for Dynamic<String> {
    fn from(value: String) -> Self {
        Dynamic::Fixed(value)
    }
}

impl From<&str> for Dynamic<String> {
    fn from(value: &str) -> Self {
        Dynamic::Fixed(value.to_string())
    }
}

impl From<Vec<Value>> for Dynamic<Vec<Value>> {
    fn from(values: Vec<Value>) -> Self {
        Dynamic::Fixed(values)
    }
}

impl<V: Into<Value>, const N: usize> From<[V; N]> for Dynamic<Vec<Value>> {
    fn from(values: [V; N]) -> Self {
        Dynamic::Fixed(values.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_compare_across_variants() {
        assert_eq!(Value::Integer(3), Value::Float(3.0));
        assert_ne!(Value::Integer(3), Value::Text("3".into()));
        assert_eq!(
            Value::Integer(2).compare(&Value::Float(2.5)),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn text_compared_with_number_is_parsed() {
        assert_eq!(
            Value::from("10").compare(&Value::Integer(9)),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::from("ten").compare(&Value::Integer(9)), None);
    }

    #[test]
    fn null_is_incomparable() {
        assert_eq!(Value::Null.compare(&Value::Integer(0)), None);
        assert_eq!(Value::Integer(0).compare(&Value::Null), None);
    }

    #[test]
    fn missing_values() {
        assert!(Value::Null.is_missing());
        assert!(Value::from("").is_missing());
        assert!(Value::List(Vec::new()).is_missing());
        assert!(!Value::from(" ").is_missing());
        assert!(!Value::Integer(0).is_missing());
        assert!(!Value::Bool(false).is_missing());
    }

    #[test]
    fn length_counts_chars_and_items() {
        assert_eq!(Value::from("héllo").length(), Some(5));
        assert_eq!(Value::List(vec![1.into(), 2.into()]).length(), Some(2));
        assert_eq!(Value::Integer(12345).length(), None);
    }

    #[test]
    fn display_forms() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 9).map(Value::Date).unwrap_or_default();
        assert_eq!(date.to_string(), "2024-02-09");
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::Float(3.0).to_string(), "3");
        assert_eq!(
            Value::List(vec!["a".into(), 1.into()]).to_string(),
            "a,1"
        );
    }

    #[test]
    fn option_maps_none_to_null() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Text("x".into()));
    }

    #[test]
    fn dynamic_map_keeps_fixed() {
        let fixed: Dynamic<Value> = 4.into();
        let doubled = fixed.map(|v| v.as_f64().unwrap_or_default() * 2.0);
        assert!(doubled.is_fixed());
        assert_eq!(doubled.get(), 8.0);
    }
}
