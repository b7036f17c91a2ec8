//! Declarative flag schemas.
//!
//! Flags can be declared in code with [`FlagBinding::new`] or described as
//! data with [`FieldDescriptor`], which names its value kind by tag. The data
//! form is what JSON and YAML command descriptors deserialize into.

use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::destination::{Destination, Shape};
use crate::error::BuildError;
use crate::flag::{FlagBinding, FlagSet};
use crate::help::{DescriptionTemplate, HelpDescriptor};
use crate::positional::ArgSlot;
use crate::resolver::Resolver;
use crate::value::{Coercion, FlagType, Kind};

/// One configuration field, described as data.
///
/// # Examples
///
/// ```
/// use flagtree_core::{FieldDescriptor, FlagBinding, Shape};
///
/// let descriptor: FieldDescriptor = serde_json::from_str(
///     r#"{"field": "Timeout", "kind": "duration", "default": ["30s"], "aliases": ["t"]}"#,
/// )
/// .unwrap();
/// assert_eq!(descriptor.shape, Shape::Plain);
///
/// let flag = FlagBinding::from_descriptor(&descriptor).unwrap();
/// assert_eq!(flag.usage(), "--timeout=30s");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name; the flag name is its kebab-case form unless `name` is set.
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Kind tag, e.g. `string`, `u16`, `duration`.
    pub kind: String,
    #[serde(default)]
    pub shape: Shape,
    /// Default value tokens. At most one for plain and optional shapes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub help: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metavar: Option<String>,
}

impl FieldDescriptor {
    pub fn new(field: &str, kind: &str) -> Self {
        Self {
            field: field.to_string(),
            name: None,
            kind: kind.to_string(),
            shape: Shape::Plain,
            default: Vec::new(),
            aliases: Vec::new(),
            help: String::new(),
            metavar: None,
        }
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_default(mut self, token: &str) -> Self {
        self.default.push(token.to_string());
        self
    }
}

fn coerce_default<T: FlagType>(field: &str, token: &str) -> Result<T, BuildError> {
    match T::coerce(token) {
        Coercion::Accepted(value) => Ok(value),
        Coercion::PushBack(reason) | Coercion::Rejected(reason) => {
            Err(BuildError::InvalidDefault {
                field: field.to_string(),
                value: token.to_string(),
                reason,
            })
        }
    }
}

fn typed<T>(descriptor: &FieldDescriptor) -> Result<FlagBinding, BuildError>
where
    T: FlagType + Default + Destination,
    Option<T>: Destination,
    Vec<T>: Destination,
    Option<Vec<T>>: Destination,
    Vec<Option<T>>: Destination,
{
    let field = descriptor.field.as_str();
    let mut values = descriptor
        .default
        .iter()
        .map(|token| coerce_default::<T>(field, token))
        .collect::<Result<Vec<T>, _>>()?;

    let single = !descriptor.shape.is_repeatable();
    if single && values.len() > 1 {
        return Err(BuildError::InvalidDefault {
            field: field.to_string(),
            value: descriptor.default.join(","),
            reason: format!("{:?} flag takes at most one default", descriptor.shape),
        });
    }

    let binding = match descriptor.shape {
        Shape::Plain => FlagBinding::new(field, values.pop().unwrap_or_default()),
        Shape::Optional => FlagBinding::new(field, values.pop()),
        Shape::Repeated => FlagBinding::new(field, values),
        Shape::OptionalRepeated => {
            FlagBinding::new(field, (!values.is_empty()).then_some(values))
        }
        Shape::RepeatedOptional => {
            FlagBinding::new(field, values.into_iter().map(Some).collect::<Vec<_>>())
        }
    };
    Ok(binding)
}

impl FlagBinding {
    /// Builds a binding from its data description.
    ///
    /// # Errors
    ///
    /// [`BuildError::UnsupportedType`] for an unknown kind tag, and
    /// [`BuildError::InvalidDefault`] when a default token does not coerce.
    pub fn from_descriptor(descriptor: &FieldDescriptor) -> Result<Self, BuildError> {
        let unsupported = || BuildError::UnsupportedType {
            field: descriptor.field.clone(),
            kind: descriptor.kind.clone(),
        };
        let kind = Kind::from_tag(&descriptor.kind).ok_or_else(unsupported)?;

        let mut binding = match kind {
            Kind::String => typed::<String>(descriptor)?,
            Kind::Bool => typed::<bool>(descriptor)?,
            Kind::I8 => typed::<i8>(descriptor)?,
            Kind::I16 => typed::<i16>(descriptor)?,
            Kind::I32 => typed::<i32>(descriptor)?,
            Kind::I64 => typed::<i64>(descriptor)?,
            Kind::Isize => typed::<isize>(descriptor)?,
            Kind::U8 => typed::<u8>(descriptor)?,
            Kind::U16 => typed::<u16>(descriptor)?,
            Kind::U32 => typed::<u32>(descriptor)?,
            Kind::U64 => typed::<u64>(descriptor)?,
            Kind::Usize => typed::<usize>(descriptor)?,
            Kind::F32 => typed::<f32>(descriptor)?,
            Kind::F64 => typed::<f64>(descriptor)?,
            Kind::Duration => typed::<Duration>(descriptor)?,
            Kind::Timestamp => typed::<DateTime<FixedOffset>>(descriptor)?,
            Kind::Custom(_) => return Err(unsupported()),
        };

        if let Some(name) = &descriptor.name {
            binding = binding.rename(name.clone());
        }
        binding = binding
            .with_aliases(descriptor.aliases.iter().cloned())
            .with_help(descriptor.help.clone());
        if let Some(metavar) = &descriptor.metavar {
            binding = binding.with_metavar(metavar.clone());
        }
        Ok(binding)
    }
}

impl FlagSet {
    /// Builds and validates a set from data descriptions.
    pub fn from_descriptors(descriptors: &[FieldDescriptor]) -> Result<Self, BuildError> {
        let bindings = descriptors
            .iter()
            .map(FlagBinding::from_descriptor)
            .collect::<Result<Vec<_>, _>>()?;
        FlagSet::new(bindings)
    }
}

/// A whole command described as data: flags, positional slots and help text.
///
/// # Examples
///
/// ```
/// use flagtree_core::CommandDescriptor;
///
/// let yaml = r#"
/// name: fetch
/// short_description: download a file
/// flags:
///   - field: Retries
///     kind: u8
///     default: ["3"]
/// args:
///   - name: URL
///     required: true
///     repeatable: false
/// "#;
/// let command = CommandDescriptor::from_yaml(yaml).unwrap();
/// let resolution = command.resolver().unwrap().resolve(["--retries=5", "http://x"]).unwrap();
/// assert_eq!(resolution.flags.get::<u8>("retries"), Ok(5));
/// assert_eq!(resolution.positionals.first("URL"), Some("http://x"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    pub name: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<DescriptionTemplate>,
    #[serde(default)]
    pub flags: Vec<FieldDescriptor>,
    #[serde(default)]
    pub args: Vec<ArgSlot>,
}

impl CommandDescriptor {
    pub fn from_json(text: &str) -> Result<Self, BuildError> {
        let descriptor: Self =
            serde_json::from_str(text).map_err(|e| BuildError::Descriptors(e.to_string()))?;
        debug!(name = %descriptor.name, flags = descriptor.flags.len(), "loaded JSON command descriptor");
        Ok(descriptor)
    }

    pub fn from_yaml(text: &str) -> Result<Self, BuildError> {
        let descriptor: Self =
            serde_yaml::from_str(text).map_err(|e| BuildError::Descriptors(e.to_string()))?;
        debug!(name = %descriptor.name, flags = descriptor.flags.len(), "loaded YAML command descriptor");
        Ok(descriptor)
    }

    pub fn flag_set(&self) -> Result<FlagSet, BuildError> {
        FlagSet::from_descriptors(&self.flags)
    }

    pub fn resolver(&self) -> Result<Resolver, BuildError> {
        Resolver::new(self.flag_set()?, self.args.clone())
    }

    /// Help for this command, invoked as `invocation`.
    pub fn help(&self, invocation: &str) -> Result<HelpDescriptor, BuildError> {
        let resolver = self.resolver()?;
        Ok(HelpDescriptor::new(invocation, self.short_description.clone())
            .with_description(self.description.clone())
            .with_flags(resolver.flags())
            .with_args(resolver.args()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_kind_is_unsupported() {
        let descriptor = FieldDescriptor::new("Ratio", "complex128");
        assert_eq!(
            FlagBinding::from_descriptor(&descriptor).unwrap_err(),
            BuildError::UnsupportedType {
                field: "Ratio".to_string(),
                kind: "complex128".to_string(),
            }
        );
    }

    #[test]
    fn test_bad_default_is_reported() {
        let descriptor = FieldDescriptor::new("Port", "u16").with_default("70000");
        assert!(matches!(
            FlagBinding::from_descriptor(&descriptor),
            Err(BuildError::InvalidDefault { ref value, .. }) if value == "70000"
        ));

        let descriptor = FieldDescriptor::new("Debug", "bool").with_default("maybe");
        assert!(matches!(
            FlagBinding::from_descriptor(&descriptor),
            Err(BuildError::InvalidDefault { .. })
        ));
    }

    #[test]
    fn test_plain_shape_rejects_multiple_defaults() {
        let descriptor = FieldDescriptor::new("Level", "i32")
            .with_default("1")
            .with_default("2");
        assert!(matches!(
            FlagBinding::from_descriptor(&descriptor),
            Err(BuildError::InvalidDefault { .. })
        ));
    }

    #[test]
    fn test_missing_default_is_zero_value() {
        let set = FlagSet::from_descriptors(&[
            FieldDescriptor::new("Count", "u32"),
            FieldDescriptor::new("Label", "string"),
            FieldDescriptor::new("Wait", "duration"),
        ])
        .unwrap();
        let values = set.defaults();
        assert_eq!(values.get::<u32>("count"), Ok(0));
        assert_eq!(values.get::<String>("label"), Ok(String::new()));
        assert_eq!(values.get::<Duration>("wait"), Ok(Duration::ZERO));
    }

    #[test]
    fn test_shapes_map_to_destinations() {
        let set = FlagSet::from_descriptors(&[
            FieldDescriptor::new("Tags", "string")
                .with_shape(Shape::Repeated)
                .with_default("a")
                .with_default("b"),
            FieldDescriptor::new("Limit", "u8").with_shape(Shape::Optional),
            FieldDescriptor::new("Hosts", "string").with_shape(Shape::OptionalRepeated),
        ])
        .unwrap();
        let values = set.defaults();
        assert_eq!(
            values.get::<Vec<String>>("tags"),
            Ok(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(values.get::<Option<u8>>("limit"), Ok(None));
        assert_eq!(values.get::<Option<Vec<String>>>("hosts"), Ok(None));
    }

    #[test]
    fn test_overrides_apply() {
        let descriptor = FieldDescriptor {
            name: Some("out".to_string()),
            aliases: vec!["o".to_string()],
            help: "output path".to_string(),
            metavar: Some("PATH".to_string()),
            ..FieldDescriptor::new("OutputFile", "string")
        };
        let flag = FlagBinding::from_descriptor(&descriptor).unwrap();
        assert_eq!(flag.name(), "out");
        assert!(flag.matches("o"));
        assert_eq!(flag.help(), "output path");
        assert_eq!(flag.usage(), "--out=PATH");
    }

    #[test]
    fn test_command_descriptor_from_json() {
        let json = r#"{
            "name": "greet",
            "description": "Say hello with {{ .Command }}.",
            "flags": [{"field": "Loud", "kind": "bool", "aliases": ["l"]}],
            "args": [{"name": "WHO", "required": false, "repeatable": true}]
        }"#;
        let command = CommandDescriptor::from_json(json).unwrap();
        let help = command.help("demo greet").unwrap();
        assert_eq!(help.usage_line(), "demo greet --loud=false [WHO[, ...]]");
        assert_eq!(
            help.rendered_description().as_deref(),
            Some("Say hello with demo greet.")
        );
    }

    #[test]
    fn test_command_descriptor_rejects_bad_documents() {
        assert!(matches!(
            CommandDescriptor::from_json("{"),
            Err(BuildError::Descriptors(_))
        ));
        assert!(matches!(
            CommandDescriptor::from_yaml("name: x\ndescription: \"{{ .Flags }}\""),
            Err(BuildError::Descriptors(_))
        ));
    }
}
