//! Option declarations and value coercion.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::{DeclarationError, ParseError};
use crate::value::{IntoValue, OptionType, Value};

/// Date layouts accepted for `date` options, tried in order.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y%m%d",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

fn int_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]+$").expect("integer pattern"))
}

fn float_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^-?(([0-9]+(\.[0-9]+)?)|(\.[0-9]+))([eE][-+]?[0-9]+)?$")
            .expect("float pattern")
    })
}

/// Canonical spelling of an option identifier: dashes become underscores.
pub(crate) fn identifier(name: &str) -> String {
    name.replace('-', "_")
}

enum TypeRef {
    Known(OptionType),
    Alias(String),
}

impl TypeRef {
    fn resolve(self) -> Result<OptionType, DeclarationError> {
        match self {
            TypeRef::Known(kind) => Ok(kind),
            TypeRef::Alias(alias) => OptionType::from_alias(&alias),
        }
    }
}

enum DefaultValue {
    Value(Value),
    Producer(Box<dyn FnOnce() -> Value>),
}

impl DefaultValue {
    fn evaluate(self) -> Value {
        match self {
            DefaultValue::Value(value) => value,
            DefaultValue::Producer(produce) => produce(),
        }
    }
}

/// Declaration settings of an option: `type`, `default`, `long` and `short`.
///
/// # Example
///
/// ```
/// use subcmd::{OptionSpec, OptionType};
///
/// let spec = OptionSpec::new().short('n').default(10);
/// let explicit = OptionSpec::new().kind(OptionType::Date);
/// let aliased = OptionSpec::new().kind_named("integer").long("lines");
/// # let _ = (spec, explicit, aliased);
/// ```
#[derive(Default)]
pub struct OptionSpec {
    kind: Option<TypeRef>,
    default: Option<DefaultValue>,
    long: Option<String>,
    short: Option<String>,
}

impl OptionSpec {
    pub fn new() -> Self {
        <Self as Default>::default()
    }

    /// Explicit option type.
    pub fn kind(mut self, kind: OptionType) -> Self {
        self.kind = Some(TypeRef::Known(kind));
        self
    }

    /// Explicit option type given by alias, e.g. `"boolean"` or `"double"`.
    pub fn kind_named(mut self, alias: impl Into<String>) -> Self {
        self.kind = Some(TypeRef::Alias(alias.into()));
        self
    }

    /// Explicit option type given by a native Rust type.
    pub fn kind_of<T: IntoValue>(self) -> Self {
        self.kind(OptionType::of::<T>())
    }

    pub fn default(mut self, value: impl IntoValue) -> Self {
        self.default = Some(DefaultValue::Value(value.into_value()));
        self
    }

    /// Default computed by `produce`, called once when the option is declared.
    pub fn default_with<T, F>(mut self, produce: F) -> Self
    where
        T: IntoValue,
        F: FnOnce() -> T + 'static,
    {
        self.default = Some(DefaultValue::Producer(Box::new(move || {
            produce().into_value()
        })));
        self
    }

    /// Long alias; defaults to the option name.
    pub fn long(mut self, long: impl Into<String>) -> Self {
        self.long = Some(long.into());
        self
    }

    /// Single-character alias.
    pub fn short(mut self, short: impl Into<String>) -> Self {
        self.short = Some(short.into());
        self
    }
}

/// A declared command-line option.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionDef {
    name: String,
    description: String,
    long: String,
    short: Option<char>,
    kind: OptionType,
    default: Option<Value>,
}

impl OptionDef {
    /// Build an option, inferring its type from the default when no explicit
    /// type is given. Options with neither are flags.
    pub fn new(name: &str, description: &str, spec: OptionSpec) -> Result<Self, DeclarationError> {
        let default = spec.default.map(DefaultValue::evaluate);
        let explicit = spec.kind.map(TypeRef::resolve).transpose()?;
        let inferred = default.as_ref().map(Value::option_type);

        if let (Some(explicit), Some(inferred)) = (explicit, inferred) {
            if explicit != inferred {
                return Err(DeclarationError::TypeConflict(name.to_string()));
            }
        }

        let kind = explicit.or(inferred).unwrap_or(OptionType::Flag);
        let default = match (default, kind) {
            (None, OptionType::Flag) => Some(Value::Flag(false)),
            (default, _) => default,
        };

        let name = identifier(name);
        let long = spec
            .long
            .as_deref()
            .map(identifier)
            .unwrap_or_else(|| name.clone());

        let short = match spec.short {
            None => None,
            Some(short) => {
                let mut chars = short.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(c),
                    _ => return Err(DeclarationError::InvalidShort(short)),
                }
            }
        };

        if long.chars().count() < 2 {
            return Err(DeclarationError::InvalidLong(long));
        }

        Ok(Self {
            name,
            description: description.to_string(),
            long,
            short,
            kind,
            default,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn long(&self) -> &str {
        &self.long
    }

    pub fn short(&self) -> Option<char> {
        self.short
    }

    pub fn kind(&self) -> OptionType {
        self.kind
    }

    pub fn is_flag(&self) -> bool {
        self.kind == OptionType::Flag
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Every spelling this option answers to: name, long and short.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = vec![self.name.clone()];
        if self.long != self.name {
            keys.push(self.long.clone());
        }
        if let Some(short) = self.short {
            keys.push(short.to_string());
        }
        keys
    }

    /// Convert the token following the option into a typed value.
    ///
    /// `raw` is `None` when the argument list ended before a value was found.
    pub fn coerce(&self, raw: Option<&str>) -> Result<Value, ParseError> {
        let raw = raw.ok_or_else(|| ParseError::MissingValue(self.name.clone()))?;

        match self.kind {
            OptionType::Flag => match raw {
                "true" => Ok(Value::Flag(true)),
                "false" => Ok(Value::Flag(false)),
                _ => Err(ParseError::ExpectedFlag(self.name.clone())),
            },
            OptionType::Int => int_pattern()
                .is_match(raw)
                .then(|| raw.parse::<i64>().ok())
                .flatten()
                .map(Value::Int)
                .ok_or_else(|| ParseError::ExpectedInt(self.name.clone())),
            OptionType::Float => float_pattern()
                .is_match(raw)
                .then(|| raw.parse::<f64>().ok())
                .flatten()
                .filter(|x| x.is_finite())
                .map(Value::Float)
                .ok_or_else(|| ParseError::ExpectedFloat(self.name.clone())),
            OptionType::Date => parse_date(raw)
                .map(Value::Date)
                .ok_or_else(|| ParseError::ExpectedDate(self.name.clone())),
            OptionType::String => Ok(Value::Str(raw.to_string())),
        }
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_option(name: &str, spec: OptionSpec) -> Result<OptionDef, DeclarationError> {
        OptionDef::new(name, "desc", spec)
    }

    fn typed(kind: OptionType) -> OptionDef {
        new_option("value", OptionSpec::new().kind(kind)).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_defaults_to_flag() {
        let opt = new_option("flag_opt", OptionSpec::new()).unwrap();
        assert_eq!(opt.kind(), OptionType::Flag);
        assert_eq!(opt.default_value(), Some(&Value::Flag(false)));
        assert_eq!(opt.long(), "flag_opt");
    }

    #[test]
    fn test_infers_type_from_default() {
        let cases = [
            (OptionSpec::new().default(true), OptionType::Flag),
            (OptionSpec::new().default(0), OptionType::Int),
            (OptionSpec::new().default(0.0), OptionType::Float),
            (OptionSpec::new().default("none"), OptionType::String),
            (OptionSpec::new().default(date(1979, 7, 27)), OptionType::Date),
        ];
        for (spec, expected) in cases {
            assert_eq!(new_option("opt", spec).unwrap().kind(), expected);
        }
    }

    #[test]
    fn test_default_producer_runs_once_at_declaration() {
        use std::cell::Cell;
        use std::rc::Rc;

        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let opt = new_option(
            "dest",
            OptionSpec::new().default_with(move || {
                counter.set(counter.get() + 1);
                "/home".to_string()
            }),
        )
        .unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(opt.kind(), OptionType::String);
        assert_eq!(opt.default_value(), Some(&Value::Str("/home".into())));
    }

    #[test]
    fn test_default_conflicting_with_type_fails() {
        assert!(new_option("first", OptionSpec::new().default(0).kind_of::<i64>()).is_ok());
        assert!(new_option("second", OptionSpec::new().default(0.0).kind_of::<f64>()).is_ok());
        assert_eq!(
            new_option("third", OptionSpec::new().default(0).kind_of::<NaiveDate>()).unwrap_err(),
            DeclarationError::TypeConflict("third".into())
        );
        assert!(new_option("fourth", OptionSpec::new().default("none").kind(OptionType::Flag)).is_err());
    }

    #[test]
    fn test_unsupported_type_alias_fails() {
        let err = new_option("input", OptionSpec::new().kind_named("io")).unwrap_err();
        assert_eq!(err, DeclarationError::UnsupportedType("io".into()));
    }

    #[test]
    fn test_short_name_must_be_single_char() {
        assert!(new_option("first", OptionSpec::new().short('c')).is_ok());
        assert!(new_option("second", OptionSpec::new().short("cc")).is_err());
        assert!(new_option("third", OptionSpec::new().short("")).is_err());
    }

    #[test]
    fn test_long_name_needs_two_chars() {
        assert!(new_option("first", OptionSpec::new().long("cc")).is_ok());
        assert!(new_option("second", OptionSpec::new().long("c")).is_err());
        assert!(new_option("n", OptionSpec::new()).is_err());
    }

    #[test]
    fn test_dashes_become_underscores() {
        let opt = new_option("dry-run", OptionSpec::new().long("no-op")).unwrap();
        assert_eq!(opt.name(), "dry_run");
        assert_eq!(opt.long(), "no_op");
        assert_eq!(opt.keys(), vec!["dry_run".to_string(), "no_op".to_string()]);
    }

    #[test]
    fn test_coerce_values() {
        assert_eq!(typed(OptionType::String).coerce(Some("1234")), Ok(Value::Str("1234".into())));
        assert_eq!(typed(OptionType::Int).coerce(Some("34")), Ok(Value::Int(34)));
        assert_eq!(typed(OptionType::Float).coerce(Some("1.73")), Ok(Value::Float(1.73)));
        assert_eq!(typed(OptionType::Float).coerce(Some("-.5e2")), Ok(Value::Float(-50.0)));
        assert_eq!(
            typed(OptionType::Date).coerce(Some("1979-07-27")),
            Ok(Value::Date(date(1979, 7, 27)))
        );
        assert_eq!(
            typed(OptionType::Date).coerce(Some("27 Jul 1979")),
            Ok(Value::Date(date(1979, 7, 27)))
        );
    }

    #[test]
    fn test_coerce_rejects_malformed_tokens() {
        assert_eq!(
            typed(OptionType::Int).coerce(Some("-3")),
            Err(ParseError::ExpectedInt("value".into()))
        );
        assert_eq!(
            typed(OptionType::Int).coerce(Some("99999999999999999999")),
            Err(ParseError::ExpectedInt("value".into()))
        );
        assert_eq!(
            typed(OptionType::Float).coerce(Some("1.")),
            Err(ParseError::ExpectedFloat("value".into()))
        );
        assert_eq!(
            typed(OptionType::Float).coerce(Some("1e400")),
            Err(ParseError::ExpectedFloat("value".into()))
        );
        assert_eq!(
            typed(OptionType::Flag).coerce(Some("yes")),
            Err(ParseError::ExpectedFlag("value".into()))
        );
        assert_eq!(
            typed(OptionType::Date).coerce(Some("yesterday")),
            Err(ParseError::ExpectedDate("value".into()))
        );
        assert_eq!(
            typed(OptionType::String).coerce(None),
            Err(ParseError::MissingValue("value".into()))
        );
    }

    #[test]
    fn test_coerce_then_display_round_trips() {
        let cases = [
            (OptionType::Flag, "true"),
            (OptionType::Int, "42"),
            (OptionType::Float, "2.5"),
            (OptionType::String, "hello"),
            (OptionType::Date, "1979-07-27"),
        ];
        for (kind, token) in cases {
            let option = typed(kind);
            let value = option.coerce(Some(token)).unwrap();
            assert_eq!(option.coerce(Some(&value.to_string())).unwrap(), value);
        }
    }
}
