//! Scalar value kinds and string coercion.
//!
//! Every flag is backed by one scalar type implementing [`FlagType`]. The
//! trait turns a command-line token into a [`Coercion`], which distinguishes
//! an accepted value from a recoverable push-back and a hard rejection, and
//! moves values in and out of the type-erased [`Value`] stored in a flag
//! arena.

use std::any::Any;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, SecondsFormat};

/// Closed set of value kinds a flag can hold.
///
/// Builtin kinds have a stable textual tag used by field descriptors.
///
/// # Examples
///
/// ```
/// use flagtree_core::Kind;
///
/// assert_eq!(Kind::from_tag("u16"), Some(Kind::U16));
/// assert_eq!(Kind::Duration.tag(), "duration");
/// assert_eq!(Kind::from_tag("complex128"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    String,
    Bool,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
    Duration,
    Timestamp,
    /// Caller-defined type, carrying its Rust type name.
    Custom(&'static str),
}

impl Kind {
    /// All kinds that can be named by a tag.
    pub const BUILTIN: [Kind; 16] = [
        Kind::String,
        Kind::Bool,
        Kind::I8,
        Kind::I16,
        Kind::I32,
        Kind::I64,
        Kind::Isize,
        Kind::U8,
        Kind::U16,
        Kind::U32,
        Kind::U64,
        Kind::Usize,
        Kind::F32,
        Kind::F64,
        Kind::Duration,
        Kind::Timestamp,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Bool => "bool",
            Kind::I8 => "i8",
            Kind::I16 => "i16",
            Kind::I32 => "i32",
            Kind::I64 => "i64",
            Kind::Isize => "isize",
            Kind::U8 => "u8",
            Kind::U16 => "u16",
            Kind::U32 => "u32",
            Kind::U64 => "u64",
            Kind::Usize => "usize",
            Kind::F32 => "f32",
            Kind::F64 => "f64",
            Kind::Duration => "duration",
            Kind::Timestamp => "timestamp",
            Kind::Custom(name) => name,
        }
    }

    /// Looks up a builtin kind by tag. Custom kinds are never returned.
    pub fn from_tag(tag: &str) -> Option<Kind> {
        Self::BUILTIN.into_iter().find(|kind| kind.tag() == tag)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Object-safe view of a caller-defined value.
pub trait CustomType: Any + fmt::Debug + fmt::Display + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + fmt::Debug + fmt::Display + Send + Sync> CustomType for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Shared handle to a caller-defined value stored in a flag arena.
#[derive(Clone)]
pub struct CustomValue(Arc<dyn CustomType>);

impl CustomValue {
    pub fn new<V: CustomType>(value: V) -> Self {
        Self(Arc::new(value))
    }

    pub fn downcast_ref<V: Any>(&self) -> Option<&V> {
        (*self.0).as_any().downcast_ref::<V>()
    }
}

impl fmt::Debug for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl PartialEq for CustomValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.to_string() == other.0.to_string()
    }
}

/// Type-erased scalar held by a flag slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(usize),
    F32(f32),
    F64(f64),
    Duration(Duration),
    Timestamp(DateTime<FixedOffset>),
    Custom(CustomValue),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(v) => f.write_str(v),
            Value::Bool(v) => write!(f, "{v}"),
            Value::I8(v) => write!(f, "{v}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::Isize(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::Usize(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::Duration(v) => write!(f, "{}", humantime::format_duration(*v)),
            Value::Timestamp(v) => f.write_str(&v.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::Custom(v) => write!(f, "{v}"),
        }
    }
}

/// Outcome of coercing one token.
///
/// `PushBack` means "this token is not for me": the resolver leaves it in the
/// stream when it was only a lookahead candidate. `Rejected` is always fatal.
#[derive(Debug, Clone, PartialEq)]
pub enum Coercion<T> {
    Accepted(T),
    PushBack(String),
    Rejected(String),
}

impl<T> Coercion<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Coercion<U> {
        match self {
            Coercion::Accepted(value) => Coercion::Accepted(f(value)),
            Coercion::PushBack(reason) => Coercion::PushBack(reason),
            Coercion::Rejected(reason) => Coercion::Rejected(reason),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Coercion::Accepted(_))
    }
}

/// A scalar type that can back a flag.
pub trait FlagType: Clone + Send + Sync + 'static {
    fn kind() -> Kind;

    /// Parses one token.
    fn coerce(token: &str) -> Coercion<Self>;

    /// Value committed when the flag is present without a value.
    fn bare() -> Option<Self> {
        None
    }

    fn into_value(self) -> Value;

    fn from_value(value: &Value) -> Option<Self>;

    /// Text shown as the metavar when this value is the declared default.
    fn metavar(&self) -> String;
}

fn parse_number<N>(token: &str) -> Coercion<N>
where
    N: FlagType + FromStr,
{
    match token.parse::<N>() {
        Ok(number) => Coercion::Accepted(number),
        Err(_) => Coercion::Rejected(format!("{token} is not {}", N::kind())),
    }
}

macro_rules! numeric_flag_type {
    ($($ty:ty => $variant:ident),* $(,)?) => {$(
        impl FlagType for $ty {
            fn kind() -> Kind {
                Kind::$variant
            }

            fn coerce(token: &str) -> Coercion<Self> {
                parse_number(token)
            }

            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(*v),
                    _ => None,
                }
            }

            fn metavar(&self) -> String {
                self.to_string()
            }
        }
    )*};
}

numeric_flag_type! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
}

impl FlagType for String {
    fn kind() -> Kind {
        Kind::String
    }

    fn coerce(token: &str) -> Coercion<Self> {
        Coercion::Accepted(token.to_owned())
    }

    fn into_value(self) -> Value {
        Value::String(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    fn metavar(&self) -> String {
        self.clone()
    }
}

impl FlagType for bool {
    fn kind() -> Kind {
        Kind::Bool
    }

    fn coerce(token: &str) -> Coercion<Self> {
        match token.to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => Coercion::Accepted(true),
            "false" | "off" | "no" | "0" => Coercion::Accepted(false),
            _ => Coercion::PushBack(format!("{token} is not bool")),
        }
    }

    fn bare() -> Option<Self> {
        Some(true)
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn metavar(&self) -> String {
        self.to_string()
    }
}

impl FlagType for Duration {
    fn kind() -> Kind {
        Kind::Duration
    }

    fn coerce(token: &str) -> Coercion<Self> {
        match humantime::parse_duration(token) {
            Ok(duration) => Coercion::Accepted(duration),
            Err(err) => Coercion::Rejected(format!("{token} is not duration: {err}")),
        }
    }

    fn into_value(self) -> Value {
        Value::Duration(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Duration(d) => Some(*d),
            _ => None,
        }
    }

    fn metavar(&self) -> String {
        humantime::format_duration(*self).to_string()
    }
}

impl FlagType for DateTime<FixedOffset> {
    fn kind() -> Kind {
        Kind::Timestamp
    }

    fn coerce(token: &str) -> Coercion<Self> {
        match DateTime::parse_from_rfc3339(token) {
            Ok(timestamp) => Coercion::Accepted(timestamp),
            Err(err) => Coercion::Rejected(format!("{token} is not timestamp: {err}")),
        }
    }

    fn into_value(self) -> Value {
        Value::Timestamp(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    fn metavar(&self) -> String {
        self.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

/// Wrapper that turns any `FromStr` type into a flag value.
///
/// # Examples
///
/// ```
/// use flagtree_core::{Coercion, Custom, FlagType};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Level(u8);
///
/// impl std::str::FromStr for Level {
///     type Err = String;
///     fn from_str(s: &str) -> Result<Self, String> {
///         match s {
///             "low" => Ok(Level(1)),
///             "high" => Ok(Level(9)),
///             other => Err(format!("unknown level {other}")),
///         }
///     }
/// }
///
/// impl std::fmt::Display for Level {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         write!(f, "{}", if self.0 > 5 { "high" } else { "low" })
///     }
/// }
///
/// assert_eq!(Custom::<Level>::coerce("high"), Coercion::Accepted(Custom(Level(9))));
/// assert!(matches!(Custom::<Level>::coerce("mid"), Coercion::Rejected(_)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Custom<V>(pub V);

impl<V> FlagType for Custom<V>
where
    V: FromStr + fmt::Display + fmt::Debug + Clone + Send + Sync + 'static,
    V::Err: fmt::Display,
{
    fn kind() -> Kind {
        Kind::Custom(std::any::type_name::<V>())
    }

    fn coerce(token: &str) -> Coercion<Self> {
        match token.parse::<V>() {
            Ok(value) => Coercion::Accepted(Custom(value)),
            Err(err) => Coercion::Rejected(err.to_string()),
        }
    }

    fn into_value(self) -> Value {
        Value::Custom(CustomValue::new(self.0))
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Custom(custom) => custom.downcast_ref::<V>().cloned().map(Custom),
            _ => None,
        }
    }

    fn metavar(&self) -> String {
        self.0.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_vocabulary_is_case_insensitive() {
        for token in ["true", "ON", "Yes", "1"] {
            assert_eq!(bool::coerce(token), Coercion::Accepted(true), "{token}");
        }
        for token in ["false", "Off", "NO", "0"] {
            assert_eq!(bool::coerce(token), Coercion::Accepted(false), "{token}");
        }
    }

    #[test]
    fn test_bool_pushes_back_unknown_token() {
        assert!(matches!(bool::coerce("unknown"), Coercion::PushBack(_)));
        assert_eq!(bool::bare(), Some(true));
    }

    #[test]
    fn test_numeric_widths_reject_out_of_range() {
        assert_eq!(i8::coerce("-128"), Coercion::Accepted(-128));
        assert!(matches!(i8::coerce("128"), Coercion::Rejected(_)));
        assert!(matches!(u16::coerce("-1"), Coercion::Rejected(_)));
        assert_eq!(u64::coerce("200"), Coercion::Accepted(200));
        assert_eq!(f32::coerce("11.5"), Coercion::Accepted(11.5));
        assert_eq!(i32::bare(), None);
    }

    #[test]
    fn test_numeric_rejection_names_kind() {
        assert_eq!(
            i32::coerce("abc"),
            Coercion::Rejected("abc is not i32".to_string())
        );
    }

    #[test]
    fn test_duration_round_trips_through_metavar() {
        let parsed = Duration::coerce("1h 30m");
        assert_eq!(parsed, Coercion::Accepted(Duration::from_secs(5400)));
        assert_eq!(Duration::from_secs(13).metavar(), "13s");
        assert!(matches!(Duration::coerce("soon"), Coercion::Rejected(_)));
    }

    #[test]
    fn test_timestamp_accepts_rfc3339() {
        let Coercion::Accepted(ts) = DateTime::<FixedOffset>::coerce("2024-01-02T03:04:05+00:00")
        else {
            panic!("timestamp should parse");
        };
        assert_eq!(ts.metavar(), "2024-01-02T03:04:05Z");
        assert!(matches!(
            DateTime::<FixedOffset>::coerce("2024-01-02"),
            Coercion::Rejected(_)
        ));
    }

    #[test]
    fn test_custom_value_downcast() {
        let value = Custom(String::from("x")).into_value();
        assert_eq!(
            Custom::<String>::from_value(&value),
            Some(Custom("x".to_string()))
        );
        assert_eq!(Custom::<u8>::from_value(&value), None);
        assert_eq!(String::from_value(&value), None);
    }

    #[test]
    fn test_value_display_matches_metavar() {
        assert_eq!(Value::Duration(Duration::from_millis(1500)).to_string(), "1s 500ms");
        assert_eq!(Value::U8(7).to_string(), "7");
        assert_eq!(Value::String("a b".into()).to_string(), "a b");
        assert_eq!(Custom(3u16).into_value().to_string(), "3");
    }

    #[test]
    fn test_kind_tags_are_unique() {
        for kind in Kind::BUILTIN {
            assert_eq!(Kind::from_tag(kind.tag()), Some(kind));
        }
    }
}
