//! Runtime values rendered into SQL literals.
//!
//! [`Value`] is what builders and raw queries carry until a [`Connection`]
//! quotes it. Conversions exist for the common scalar types so call sites can
//! pass plain Rust values:
//!
//! ```ignore
//! use dbshim::Value;
//!
//! let v: Value = 18.into();
//! let names: Value = vec!["a", "b"].into();
//! let missing: Value = Option::<i32>::None.into();
//! ```
//!
//! [`Connection`]: crate::Connection

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

/// A value that can be rendered as a SQL literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL
    Null,
    /// TRUE / FALSE
    Bool(bool),
    /// Integer literal
    Int(i64),
    /// Decimal literal
    Float(f64),
    /// String literal (escaped by the driver)
    Text(String),
    /// Ordered list of values, rendered comma-separated (for `IN (...)`)
    List(Vec<Value>),
    /// Raw SQL expression, inserted verbatim.
    ///
    /// # Safety
    /// Never build this from user input.
    Expr(String),
}

impl Value {
    /// Create a raw SQL expression value.
    pub fn expr(sql: impl Into<String>) -> Self {
        Value::Expr(sql.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for text made only of ASCII digits, which is rendered unquoted.
    pub(crate) fn is_digit_text(s: &str) -> bool {
        !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Text(v.format("%Y-%m-%d").to_string())
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Value::Text(v.format("%H:%M:%S%.f").to_string())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Text(v.format("%Y-%m-%d %H:%M:%S%.f").to_string())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value
where
    Tz::Offset: std::fmt::Display,
{
    fn from(v: DateTime<Tz>) -> Self {
        Value::Text(v.to_rfc3339())
    }
}

impl From<uuid::Uuid> for Value {
    fn from(v: uuid::Uuid) -> Self {
        Value::Text(v.hyphenated().to_string())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Text(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_none_is_null() {
        assert_eq!(Value::from(Option::<i32>::None), Value::Null);
        assert_eq!(Value::from(Some(3)), Value::Int(3));
    }

    #[test]
    fn vec_becomes_list() {
        assert_eq!(
            Value::from(vec![1, 2]),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn digit_text_detection() {
        assert!(Value::is_digit_text("0042"));
        assert!(!Value::is_digit_text(""));
        assert!(!Value::is_digit_text("-1"));
        assert!(!Value::is_digit_text("1e5"));
    }

    #[test]
    fn chrono_values_render_as_iso_text() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(Value::from(date), Value::Text("2024-02-29".into()));

        let ts = date.and_hms_opt(13, 5, 0).unwrap();
        assert_eq!(Value::from(ts), Value::Text("2024-02-29 13:05:00".into()));
    }

    #[test]
    fn json_values_render_as_text() {
        let v = serde_json::json!({"a": 1});
        assert_eq!(Value::from(v), Value::Text(r#"{"a":1}"#.into()));
    }
}
