//! Flag bindings and the arena of resolved flag values.
//!
//! A [`FlagBinding`] is declared once per configuration field and answers
//! three questions for the resolver: does a token name it, can a string be
//! coerced and committed, and what happens when it is matched without a
//! value. Bindings are collected into a [`FlagSet`], which assigns every
//! binding an arena index. Each resolution produces a fresh [`FlagValues`]
//! arena seeded with the declared defaults.

use std::collections::HashMap;
use std::sync::Arc;

use crate::destination::{Destination, Shape, Slot};
use crate::error::{BuildError, LookupError, UsageError};
use crate::naming::kebab_case;
use crate::validate::validate_flags;
use crate::value::{Coercion, FlagType, Kind, Value};

type Coercer = fn(&str) -> Coercion<Value>;

fn coerce_value<T: FlagType>(token: &str) -> Coercion<Value> {
    T::coerce(token).map(T::into_value)
}

/// Renders a flag name the way it is typed: `-x` or `--name`.
pub fn hyphenate(name: &str) -> String {
    if name.chars().count() == 1 {
        format!("-{name}")
    } else {
        format!("--{name}")
    }
}

/// Matching, coercion and commit contract for one configuration field.
///
/// # Examples
///
/// ```
/// use flagtree_core::FlagBinding;
///
/// let flag = FlagBinding::new("IntFlag", 1i64)
///     .alias("i")
///     .with_help("an integer");
///
/// assert_eq!(flag.name(), "int-flag");
/// assert!(flag.matches("int-flag"));
/// assert!(flag.matches("i"));
/// assert!(!flag.matches("I"));
/// assert_eq!(flag.usage(), "--int-flag=1");
/// ```
#[derive(Debug, Clone)]
pub struct FlagBinding {
    name: String,
    aliases: Vec<String>,
    help: String,
    metavar: String,
    kind: Kind,
    default: Slot,
    coerce: Coercer,
    bare: Option<Value>,
    index: usize,
}

impl FlagBinding {
    /// Declares a flag for `field` with the given default.
    ///
    /// The canonical name is the kebab-case form of `field`; the default's
    /// Rust type decides both the value kind and the destination shape.
    pub fn new<D: Destination>(field: &str, default: D) -> Self {
        let metavar = default.default_metavar();
        Self {
            name: kebab_case(field),
            aliases: Vec::new(),
            help: String::new(),
            metavar,
            kind: <D::Item as FlagType>::kind(),
            default: default.into_slot(),
            coerce: coerce_value::<D::Item>,
            bare: <D::Item as FlagType>::bare().map(FlagType::into_value),
            index: 0,
        }
    }

    /// Overrides the canonical name.
    pub fn rename(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Overrides the metavar derived from the default.
    pub fn with_metavar(mut self, metavar: impl Into<String>) -> Self {
        self.metavar = metavar.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn metavar(&self) -> &str {
        &self.metavar
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn shape(&self) -> Shape {
        self.default.shape()
    }

    pub fn default_slot(&self) -> &Slot {
        &self.default
    }

    /// `--name` or `-n`.
    pub fn display_name(&self) -> String {
        hyphenate(&self.name)
    }

    pub fn display_aliases(&self) -> Vec<String> {
        self.aliases.iter().map(|alias| hyphenate(alias)).collect()
    }

    /// Usage fragment, e.g. `--name=METAVAR`.
    pub fn usage(&self) -> String {
        if self.metavar.is_empty() {
            self.display_name()
        } else {
            format!("{}={}", self.display_name(), self.metavar)
        }
    }

    /// True when `given` (without dashes) is this flag's name or an alias.
    pub fn matches(&self, given: &str) -> bool {
        self.name == given || self.aliases.iter().any(|alias| alias == given)
    }

    /// Coerces `token` and commits it into `values` when accepted.
    pub fn set(&self, token: &str, values: &mut FlagValues) -> Coercion<()> {
        (self.coerce)(token).map(|value| values.commit(self.index, value))
    }

    /// Resolves a match that came without a value.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::ValueRequired`] when the kind has no bare action.
    pub fn found(&self, values: &mut FlagValues) -> Result<(), UsageError> {
        match &self.bare {
            Some(value) => {
                values.commit(self.index, value.clone());
                Ok(())
            }
            None => Err(UsageError::ValueRequired {
                flag: self.display_name(),
            }),
        }
    }
}

/// An ordered, validated set of flag bindings.
///
/// # Examples
///
/// ```
/// use flagtree_core::{BuildError, FlagBinding, FlagSet};
///
/// let set = FlagSet::new([
///     FlagBinding::new("verbose", false).alias("v"),
///     FlagBinding::new("level", 3u8),
/// ])
/// .unwrap();
/// assert_eq!(set.len(), 2);
/// assert_eq!(set.find("v").map(|f| f.name()), Some("verbose"));
///
/// let dup = FlagSet::new([
///     FlagBinding::new("verbose", false),
///     FlagBinding::new("Verbose", 0i32),
/// ]);
/// assert_eq!(dup.unwrap_err(), BuildError::DuplicateFlag("verbose".into()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct FlagSet {
    bindings: Vec<FlagBinding>,
    index: Arc<HashMap<String, usize>>,
}

impl FlagSet {
    /// Validates and indexes `bindings`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidFlagName`] or [`BuildError::DuplicateFlag`].
    pub fn new(bindings: impl IntoIterator<Item = FlagBinding>) -> Result<Self, BuildError> {
        let mut bindings: Vec<FlagBinding> = bindings.into_iter().collect();
        validate_flags(&bindings)?;

        let mut index = HashMap::with_capacity(bindings.len());
        for (position, binding) in bindings.iter_mut().enumerate() {
            binding.index = position;
            index.insert(binding.name.clone(), position);
        }

        Ok(Self {
            bindings,
            index: Arc::new(index),
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn bindings(&self) -> &[FlagBinding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// First binding whose name or alias equals `given`.
    pub fn find(&self, given: &str) -> Option<&FlagBinding> {
        self.bindings.iter().find(|binding| binding.matches(given))
    }

    /// A fresh arena holding every binding's default.
    pub fn defaults(&self) -> FlagValues {
        FlagValues {
            index: Arc::clone(&self.index),
            slots: self.bindings.iter().map(|b| b.default.clone()).collect(),
            touched: vec![false; self.bindings.len()],
        }
    }
}

/// Arena of resolved flag values, one slot per binding.
#[derive(Debug, Clone)]
pub struct FlagValues {
    index: Arc<HashMap<String, usize>>,
    slots: Vec<Slot>,
    touched: Vec<bool>,
}

impl FlagValues {
    /// Reads the value of the flag with canonical name `name`.
    ///
    /// # Errors
    ///
    /// [`LookupError::UnknownFlag`] if no such flag exists, or
    /// [`LookupError::TypeMismatch`] if it was declared with another type.
    pub fn get<D: Destination>(&self, name: &str) -> Result<D, LookupError> {
        let slot = self
            .slot(name)
            .ok_or_else(|| LookupError::UnknownFlag(name.to_string()))?;
        D::from_slot(slot).ok_or_else(|| LookupError::TypeMismatch {
            flag: name.to_string(),
            expected: std::any::type_name::<D>(),
        })
    }

    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.index.get(name).map(|&position| &self.slots[position])
    }

    /// True if the flag was given on the command line.
    pub fn is_set(&self, name: &str) -> bool {
        self.index
            .get(name)
            .is_some_and(|&position| self.touched[position])
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn commit(&mut self, position: usize, value: Value) {
        let first = !self.touched[position];
        self.slots[position].commit(value, first);
        self.touched[position] = true;
    }
}

/// Conversion from a resolved arena into a caller's configuration type.
///
/// # Examples
///
/// ```
/// use flagtree_core::{FlagBinding, FlagSet, FlagValues, FromFlags, LookupError};
///
/// struct Config {
///     name: String,
///     count: u32,
/// }
///
/// impl FromFlags for Config {
///     fn from_flags(values: &FlagValues) -> Result<Self, LookupError> {
///         Ok(Self {
///             name: values.get("name")?,
///             count: values.get("count")?,
///         })
///     }
/// }
///
/// let set = FlagSet::new([
///     FlagBinding::new("name", String::from("anon")),
///     FlagBinding::new("count", 1u32),
/// ])
/// .unwrap();
/// let config = Config::from_flags(&set.defaults()).unwrap();
/// assert_eq!(config.name, "anon");
/// assert_eq!(config.count, 1);
/// ```
pub trait FromFlags: Sized {
    fn from_flags(values: &FlagValues) -> Result<Self, LookupError>;
}

impl FromFlags for FlagValues {
    fn from_flags(values: &FlagValues) -> Result<Self, LookupError> {
        Ok(values.clone())
    }
}

impl FromFlags for () {
    fn from_flags(_: &FlagValues) -> Result<Self, LookupError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::value::Custom;

    fn sample_set() -> FlagSet {
        FlagSet::new([
            FlagBinding::new("BoolFlag", false).alias("b"),
            FlagBinding::new("IntFlag", 1i32),
            FlagBinding::new("Names", Vec::<String>::new()).alias("n"),
            FlagBinding::new("Wait", Duration::from_secs(13)),
        ])
        .unwrap()
    }

    #[test]
    fn test_set_commits_accepted_value() {
        let set = sample_set();
        let mut values = set.defaults();
        let flag = set.find("int-flag").unwrap();

        assert_eq!(flag.set("100", &mut values), Coercion::Accepted(()));
        assert_eq!(values.get::<i32>("int-flag"), Ok(100));
        assert!(values.is_set("int-flag"));
        assert!(!values.is_set("bool-flag"));
    }

    #[test]
    fn test_set_leaves_value_on_rejection() {
        let set = sample_set();
        let mut values = set.defaults();
        let flag = set.find("int-flag").unwrap();

        assert!(matches!(flag.set("x", &mut values), Coercion::Rejected(_)));
        assert_eq!(values.get::<i32>("int-flag"), Ok(1));
    }

    #[test]
    fn test_found_on_bool_sets_true() {
        let set = sample_set();
        let mut values = set.defaults();
        set.find("b").unwrap().found(&mut values).unwrap();
        assert_eq!(values.get::<bool>("bool-flag"), Ok(true));
    }

    #[test]
    fn test_found_on_value_kind_requires_value() {
        let set = sample_set();
        let mut values = set.defaults();
        assert_eq!(
            set.find("wait").unwrap().found(&mut values),
            Err(UsageError::ValueRequired {
                flag: "--wait".to_string()
            })
        );
    }

    #[test]
    fn test_repeated_flag_accumulates() {
        let set = sample_set();
        let mut values = set.defaults();
        let flag = set.find("n").unwrap();
        flag.set("a", &mut values);
        flag.set("b", &mut values);
        assert_eq!(
            values.get::<Vec<String>>("names"),
            Ok(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_defaults_are_independent_per_resolution() {
        let set = sample_set();
        let mut first = set.defaults();
        set.find("int-flag").unwrap().set("5", &mut first);
        let second = set.defaults();
        assert_eq!(second.get::<i32>("int-flag"), Ok(1));
    }

    #[test]
    fn test_lookup_errors() {
        let values = sample_set().defaults();
        assert_eq!(
            values.get::<i32>("missing"),
            Err(LookupError::UnknownFlag("missing".to_string()))
        );
        assert!(matches!(
            values.get::<u64>("int-flag"),
            Err(LookupError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_usage_and_metavar() {
        let set = sample_set();
        assert_eq!(set.find("b").unwrap().usage(), "--bool-flag=false");
        assert_eq!(set.find("wait").unwrap().usage(), "--wait=13s");
        assert_eq!(set.find("names").unwrap().usage(), "--names");
        assert_eq!(set.find("n").unwrap().display_aliases(), vec!["-n"]);

        let custom = FlagBinding::new("mode", Custom(String::from("fast"))).with_metavar("MODE");
        assert_eq!(custom.usage(), "--mode=MODE");
        assert_eq!(FlagBinding::new("x", 1u8).usage(), "-x=1");
    }
}
