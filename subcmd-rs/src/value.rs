//! Option types and typed option values.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::DeclarationError;

/// Bound options of an invocation, keyed by canonical option name.
pub type Opts = BTreeMap<String, Value>;

/// The closed set of option types understood by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    /// Boolean switch that never consumes a value token.
    Flag,
    Int,
    Float,
    String,
    Date,
}

impl OptionType {
    /// Map a host-facing type alias onto the closed type set.
    ///
    /// Matching ignores ASCII case. Anything outside the alias table is an
    /// unsupported argument type.
    pub fn from_alias(alias: &str) -> Result<Self, DeclarationError> {
        match alias.to_ascii_lowercase().as_str() {
            "flag" | "bool" | "boolean" => Ok(OptionType::Flag),
            "int" | "integer" => Ok(OptionType::Int),
            "float" | "double" => Ok(OptionType::Float),
            "string" | "str" => Ok(OptionType::String),
            "date" => Ok(OptionType::Date),
            _ => Err(DeclarationError::UnsupportedType(alias.to_string())),
        }
    }

    /// The option type of a native Rust type.
    pub fn of<T: IntoValue>() -> Self {
        T::OPTION_TYPE
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionType::Flag => "flag",
            OptionType::Int => "int",
            OptionType::Float => "float",
            OptionType::String => "string",
            OptionType::Date => "date",
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed option value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Flag(bool),
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    Str(String),
}

impl Value {
    /// The type inferred from this value.
    pub fn option_type(&self) -> OptionType {
        match self {
            Value::Flag(_) => OptionType::Flag,
            Value::Int(_) => OptionType::Int,
            Value::Float(_) => OptionType::Float,
            Value::Str(_) => OptionType::String,
            Value::Date(_) => OptionType::Date,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Value::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Flag(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// Native Rust types usable as option defaults or type references.
pub trait IntoValue {
    /// The option type this Rust type maps to.
    const OPTION_TYPE: OptionType;

    fn into_value(self) -> Value;
}

impl IntoValue for bool {
    const OPTION_TYPE: OptionType = OptionType::Flag;

    fn into_value(self) -> Value {
        Value::Flag(self)
    }
}

macro_rules! int_into_value {
    ($($t:ty),*) => {
        $(
            impl IntoValue for $t {
                const OPTION_TYPE: OptionType = OptionType::Int;

                fn into_value(self) -> Value {
                    Value::Int(i64::from(self))
                }
            }
        )*
    };
}

int_into_value!(i8, i16, i32, i64, u8, u16, u32);

impl IntoValue for f32 {
    const OPTION_TYPE: OptionType = OptionType::Float;

    fn into_value(self) -> Value {
        Value::Float(f64::from(self))
    }
}

impl IntoValue for f64 {
    const OPTION_TYPE: OptionType = OptionType::Float;

    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl IntoValue for String {
    const OPTION_TYPE: OptionType = OptionType::String;

    fn into_value(self) -> Value {
        Value::Str(self)
    }
}

impl IntoValue for &str {
    const OPTION_TYPE: OptionType = OptionType::String;

    fn into_value(self) -> Value {
        Value::Str(self.to_string())
    }
}

impl IntoValue for NaiveDate {
    const OPTION_TYPE: OptionType = OptionType::Date;

    fn into_value(self) -> Value {
        Value::Date(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_table() {
        assert_eq!(OptionType::from_alias("boolean").unwrap(), OptionType::Flag);
        assert_eq!(OptionType::from_alias("bool").unwrap(), OptionType::Flag);
        assert_eq!(OptionType::from_alias("integer").unwrap(), OptionType::Int);
        assert_eq!(OptionType::from_alias("double").unwrap(), OptionType::Float);
        assert_eq!(OptionType::from_alias("String").unwrap(), OptionType::String);
        assert_eq!(OptionType::from_alias("date").unwrap(), OptionType::Date);
    }

    #[test]
    fn test_unsupported_alias() {
        let err = OptionType::from_alias("io").unwrap_err();
        assert_eq!(err, DeclarationError::UnsupportedType("io".to_string()));
        assert!(OptionType::from_alias("ints").is_err());
    }

    #[test]
    fn test_native_type_references() {
        assert_eq!(OptionType::of::<bool>(), OptionType::Flag);
        assert_eq!(OptionType::of::<u32>(), OptionType::Int);
        assert_eq!(OptionType::of::<f32>(), OptionType::Float);
        assert_eq!(OptionType::of::<String>(), OptionType::String);
        assert_eq!(OptionType::of::<NaiveDate>(), OptionType::Date);
    }

    #[test]
    fn test_inferred_type_from_value() {
        assert_eq!(true.into_value().option_type(), OptionType::Flag);
        assert_eq!(0i64.into_value().option_type(), OptionType::Int);
        assert_eq!(0.5f64.into_value().option_type(), OptionType::Float);
        assert_eq!("none".into_value().option_type(), OptionType::String);
        let date = NaiveDate::from_ymd_opt(1979, 7, 27).unwrap();
        assert_eq!(date.into_value().option_type(), OptionType::Date);
    }

    #[test]
    fn test_value_serializes_as_plain_json() {
        let mut opts = Opts::new();
        opts.insert("pager".into(), Value::Flag(true));
        opts.insert("num_lines".into(), Value::Int(3));
        opts.insert(
            "since".into(),
            Value::Date(NaiveDate::from_ymd_opt(1979, 7, 27).unwrap()),
        );

        let json = serde_json::to_string(&opts).unwrap();
        assert_eq!(json, r#"{"num_lines":3,"pager":true,"since":"1979-07-27"}"#);
    }

    #[test]
    fn test_date_display_is_iso() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(Value::Date(date).to_string(), "2024-01-05");
    }
}
