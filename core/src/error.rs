//! Error types for flag tree construction and token resolution.
//!
//! Errors come in two tiers. [`BuildError`] is raised while a command tree is
//! being declared and is always fatal to the builder. [`UsageError`] is raised
//! while resolving tokens and is meant to be shown to the user together with
//! help. [`LookupError`] covers typed reads out of a resolved flag arena.

use thiserror::Error;

/// Construction-time errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// A field descriptor names a value kind with no coercion.
    #[error("unsupported type for field {field}: {kind}")]
    UnsupportedType { field: String, kind: String },
    /// A declared default could not be coerced into the field's kind.
    #[error("invalid default for field {field}: {value:?}: {reason}")]
    InvalidDefault {
        field: String,
        value: String,
        reason: String,
    },
    /// Flag name or alias that could never be matched on a command line.
    #[error("invalid flag name: {0:?}")]
    InvalidFlagName(String),
    /// Two bindings in the same set share a name or alias.
    #[error("duplicate flag name: {0}")]
    DuplicateFlag(String),
    /// A positional slot has an empty name.
    #[error("positional argument name cannot be empty")]
    EmptyArgName,
    /// Two positional slots share a name.
    #[error("duplicate positional argument: {0}")]
    DuplicateArg(String),
    /// A subcommand name is empty or whitespace-only.
    #[error("invalid subcommand name: {0:?}")]
    InvalidSubcommandName(String),
    /// Two subcommands in the same group share a name.
    #[error("subcommand name conflicts: {0}")]
    DuplicateSubcommand(String),
    /// Description template contains an unknown or unclosed placeholder.
    #[error("invalid description template: {0}")]
    InvalidTemplate(String),
    /// Field descriptor document could not be deserialized.
    #[error("invalid field descriptors: {0}")]
    Descriptors(String),
}

/// Resolution-time errors that are reported together with help.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    /// A flag was matched but no value followed and it has no bare action.
    #[error("value required: {flag}")]
    ValueRequired { flag: String },
    /// An explicitly supplied value could not be coerced.
    #[error("parse error: {flag}: {reason}")]
    Parse {
        flag: String,
        token: String,
        reason: String,
    },
    /// Fewer tokens than required positional slots.
    #[error("not enough args")]
    NotEnoughArguments,
    /// A leaf command received tokens it could not place.
    #[error("too many args: {}", .0.join(" "))]
    TooManyArguments(Vec<String>),
    /// A command group was invoked without naming a child.
    #[error("no subcommand")]
    NoSubcommand,
    /// The first leftover token of a group names no child.
    #[error("unknown subcommand: {0}")]
    UnknownSubcommand(String),
}

/// Errors reading typed values out of a [`FlagValues`](crate::FlagValues).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("unknown flag: {0}")]
    UnknownFlag(String),
    #[error("flag {flag} does not hold a {expected}")]
    TypeMismatch {
        flag: String,
        expected: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_error_messages() {
        assert_eq!(
            UsageError::ValueRequired {
                flag: "--name".into()
            }
            .to_string(),
            "value required: --name"
        );
        assert_eq!(
            UsageError::TooManyArguments(vec!["a".into(), "b".into()]).to_string(),
            "too many args: a b"
        );
        assert_eq!(
            UsageError::UnknownSubcommand("bogus".into()).to_string(),
            "unknown subcommand: bogus"
        );
    }
}
