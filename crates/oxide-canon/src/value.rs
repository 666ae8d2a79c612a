//! SQL values bound as parameters.
//!
//! Every literal that reaches a compiled statement travels as a `SqlValue`
//! in the parameter map instead of being spliced into the SQL text.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A value bound to a canonical parameter token.
///
/// Serializes untagged, so a parameter map turns into plain JSON scalars.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
    DateTime(DateTime<Utc>),
    Uuid(Uuid),
}

/// Writes the value as an escaped SQL literal.
///
/// Meant for logs and diagnostics; compiled statements always bind.
impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(true) => f.write_str("TRUE"),
            Self::Bool(false) => f.write_str("FALSE"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Self::Blob(bytes) => {
                f.write_str("X'")?;
                for byte in bytes {
                    write!(f, "{byte:02X}")?;
                }
                f.write_str("'")
            }
            Self::DateTime(at) => write!(f, "'{}'", at.format("%Y-%m-%d %H:%M:%S")),
            Self::Uuid(id) => write!(f, "'{id}'"),
        }
    }
}

/// Conversion into a bindable [`SqlValue`].
pub trait ToSqlValue {
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

macro_rules! to_sql_value {
    ($variant:ident: $($ty:ty),+) => {
        $(
            impl ToSqlValue for $ty {
                fn to_sql_value(self) -> SqlValue {
                    SqlValue::$variant(self.into())
                }
            }
        )+
    };
}

to_sql_value!(Bool: bool);
to_sql_value!(Int: i64, i32, i16, i8, u32, u16, u8);
to_sql_value!(Float: f64, f32);
to_sql_value!(Text: String, &str);
to_sql_value!(Blob: Vec<u8>, &[u8]);
to_sql_value!(DateTime: DateTime<Utc>);
to_sql_value!(Uuid: Uuid);

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        self.map_or(SqlValue::Null, ToSqlValue::to_sql_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_escapes_text() {
        assert_eq!(SqlValue::Text("O'Brien".into()).to_string(), "'O''Brien'");
        assert_eq!(SqlValue::Bool(false).to_string(), "FALSE");
    }

    #[test]
    fn test_display_blob_as_hex() {
        assert_eq!(SqlValue::Blob(vec![0x0A, 0xFF]).to_string(), "X'0AFF'");
    }

    #[test]
    fn test_conversions_widen() {
        assert_eq!(7_u8.to_sql_value(), SqlValue::Int(7));
        assert_eq!(1.5_f32.to_sql_value(), SqlValue::Float(1.5));
        assert_eq!("hi".to_sql_value(), SqlValue::Text("hi".into()));
        assert_eq!(Some(3_i32).to_sql_value(), SqlValue::Int(3));
        assert_eq!(None::<String>.to_sql_value(), SqlValue::Null);
    }

    #[test]
    fn test_serialize_untagged() {
        let json = serde_json::to_string(&vec![
            SqlValue::Int(1),
            SqlValue::Text("a".into()),
            SqlValue::Null,
        ])
        .unwrap();
        assert_eq!(json, r#"[1,"a",null]"#);
    }
}
