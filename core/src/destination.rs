//! Destination shapes for flag values.
//!
//! A flag may commit into a plain value, an optional value, a repeatable
//! list, or one of the two combinations of those. [`Slot`] is the arena cell
//! that holds a value in one of these shapes; [`Destination`] maps the Rust
//! type a caller declares onto a slot and back.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::value::{Custom, FlagType, Value};

/// How a flag's committed values are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// `T`: each commit replaces the value.
    #[default]
    Plain,
    /// `Option<T>`: each commit stores `Some`.
    Optional,
    /// `Vec<T>`: commits accumulate in order.
    Repeated,
    /// `Option<Vec<T>>`.
    OptionalRepeated,
    /// `Vec<Option<T>>`.
    RepeatedOptional,
}

impl Shape {
    pub fn is_repeatable(self) -> bool {
        matches!(
            self,
            Shape::Repeated | Shape::OptionalRepeated | Shape::RepeatedOptional
        )
    }
}

/// One arena cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Plain(Value),
    Optional(Option<Value>),
    Repeated(Vec<Value>),
    OptionalRepeated(Option<Vec<Value>>),
    RepeatedOptional(Vec<Option<Value>>),
}

impl Slot {
    pub fn shape(&self) -> Shape {
        match self {
            Slot::Plain(_) => Shape::Plain,
            Slot::Optional(_) => Shape::Optional,
            Slot::Repeated(_) => Shape::Repeated,
            Slot::OptionalRepeated(_) => Shape::OptionalRepeated,
            Slot::RepeatedOptional(_) => Shape::RepeatedOptional,
        }
    }

    /// Stores a coerced value.
    ///
    /// `first` is true for the first commit of a resolution; repeatable
    /// shapes drop their declared default at that point.
    pub(crate) fn commit(&mut self, value: Value, first: bool) {
        match self {
            Slot::Plain(current) => *current = value,
            Slot::Optional(current) => *current = Some(value),
            Slot::Repeated(list) => {
                if first {
                    list.clear();
                }
                list.push(value);
            }
            Slot::OptionalRepeated(list) => {
                if first || list.is_none() {
                    *list = Some(Vec::new());
                }
                if let Some(list) = list {
                    list.push(value);
                }
            }
            Slot::RepeatedOptional(list) => {
                if first {
                    list.clear();
                }
                list.push(Some(value));
            }
        }
    }
}

fn write_list<'a>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = Option<&'a Value>>,
) -> fmt::Result {
    f.write_str("[")?;
    for (position, item) in items.enumerate() {
        if position > 0 {
            f.write_str(", ")?;
        }
        match item {
            Some(value) => write!(f, "{value}")?,
            None => f.write_str("none")?,
        }
    }
    f.write_str("]")
}

/// `value`, `none`, or `[a, b]` for the repeatable shapes.
impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Plain(value) | Slot::Optional(Some(value)) => write!(f, "{value}"),
            Slot::Optional(None) | Slot::OptionalRepeated(None) => f.write_str("none"),
            Slot::Repeated(list) | Slot::OptionalRepeated(Some(list)) => {
                write_list(f, list.iter().map(Some))
            }
            Slot::RepeatedOptional(list) => write_list(f, list.iter().map(Option::as_ref)),
        }
    }
}

/// A Rust type a flag can be declared with.
///
/// Implemented for every scalar [`FlagType`] `T` and for `Option<T>`,
/// `Vec<T>`, `Option<Vec<T>>` and `Vec<Option<T>>`.
pub trait Destination: Sized {
    type Item: FlagType;

    fn into_slot(self) -> Slot;

    fn from_slot(slot: &Slot) -> Option<Self>;

    /// Metavar derived from this value when it is the declared default.
    fn default_metavar(&self) -> String {
        String::new()
    }
}

fn values_of<T: FlagType>(list: &[Value]) -> Option<Vec<T>> {
    list.iter().map(T::from_value).collect()
}

macro_rules! destinations {
    (impl<$($g:ident),*> for $ty:ty) => {
        impl<$($g),*> Destination for $ty
        where
            $ty: FlagType,
        {
            type Item = $ty;

            fn into_slot(self) -> Slot {
                Slot::Plain(FlagType::into_value(self))
            }

            fn from_slot(slot: &Slot) -> Option<Self> {
                match slot {
                    Slot::Plain(value) => <$ty as FlagType>::from_value(value),
                    _ => None,
                }
            }

            fn default_metavar(&self) -> String {
                FlagType::metavar(self)
            }
        }

        impl<$($g),*> Destination for Option<$ty>
        where
            $ty: FlagType,
        {
            type Item = $ty;

            fn into_slot(self) -> Slot {
                Slot::Optional(self.map(FlagType::into_value))
            }

            fn from_slot(slot: &Slot) -> Option<Self> {
                match slot {
                    Slot::Optional(None) => Some(None),
                    Slot::Optional(Some(value)) => <$ty as FlagType>::from_value(value).map(Some),
                    _ => None,
                }
            }

            fn default_metavar(&self) -> String {
                self.as_ref().map(FlagType::metavar).unwrap_or_default()
            }
        }

        impl<$($g),*> Destination for Vec<$ty>
        where
            $ty: FlagType,
        {
            type Item = $ty;

            fn into_slot(self) -> Slot {
                Slot::Repeated(self.into_iter().map(FlagType::into_value).collect())
            }

            fn from_slot(slot: &Slot) -> Option<Self> {
                match slot {
                    Slot::Repeated(list) => values_of::<$ty>(list),
                    _ => None,
                }
            }
        }

        impl<$($g),*> Destination for Option<Vec<$ty>>
        where
            $ty: FlagType,
        {
            type Item = $ty;

            fn into_slot(self) -> Slot {
                Slot::OptionalRepeated(
                    self.map(|list| list.into_iter().map(FlagType::into_value).collect()),
                )
            }

            fn from_slot(slot: &Slot) -> Option<Self> {
                match slot {
                    Slot::OptionalRepeated(None) => Some(None),
                    Slot::OptionalRepeated(Some(list)) => values_of::<$ty>(list).map(Some),
                    _ => None,
                }
            }
        }

        impl<$($g),*> Destination for Vec<Option<$ty>>
        where
            $ty: FlagType,
        {
            type Item = $ty;

            fn into_slot(self) -> Slot {
                Slot::RepeatedOptional(
                    self.into_iter()
                        .map(|item| item.map(FlagType::into_value))
                        .collect(),
                )
            }

            fn from_slot(slot: &Slot) -> Option<Self> {
                match slot {
                    Slot::RepeatedOptional(list) => list
                        .iter()
                        .map(|item| match item {
                            None => Some(None),
                            Some(value) => <$ty as FlagType>::from_value(value).map(Some),
                        })
                        .collect(),
                    _ => None,
                }
            }
        }
    };
    ($($ty:ty),* $(,)?) => {
        $(destinations!(impl<> for $ty);)*
    };
}

destinations!(
    String,
    bool,
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    Duration,
    DateTime<FixedOffset>,
);

destinations!(impl<V> for Custom<V>);
