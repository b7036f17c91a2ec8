//! Construction-time validation.
//!
//! Catches declarations that would make resolution ambiguous or impossible
//! before any token is seen: flag names that can never match, names or
//! aliases shared between bindings, and duplicate positional or subcommand
//! names.
//!
//! # Examples
//!
//! ```
//! use flagtree_core::*;
//!
//! let flags = vec![
//!     FlagBinding::new("verbose", false).alias("v"),
//!     FlagBinding::new("version", false).alias("v"),
//! ];
//! assert_eq!(
//!     validate_flags(&flags),
//!     Err(BuildError::DuplicateFlag("v".to_string()))
//! );
//! ```

use std::collections::HashSet;

use crate::error::BuildError;
use crate::flag::FlagBinding;
use crate::positional::ArgSlot;

/// Validates the names and aliases of one binding set.
///
/// Names are compared case-sensitively; the first problem found is returned.
pub fn validate_flags(flags: &[FlagBinding]) -> Result<(), BuildError> {
    let mut seen: HashSet<&str> = HashSet::new();

    for flag in flags {
        for name in std::iter::once(flag.name()).chain(flag.aliases().iter().map(String::as_str)) {
            if name.is_empty() || name.starts_with('-') || name.contains('=') {
                return Err(BuildError::InvalidFlagName(name.to_string()));
            }
            if !seen.insert(name) {
                return Err(BuildError::DuplicateFlag(name.to_string()));
            }
        }
    }

    Ok(())
}

/// Validates the names of an ordered positional slot list.
pub fn validate_args(args: &[ArgSlot]) -> Result<(), BuildError> {
    let mut seen: HashSet<&str> = HashSet::new();

    for arg in args {
        if arg.name.trim().is_empty() {
            return Err(BuildError::EmptyArgName);
        }
        if !seen.insert(arg.name.as_str()) {
            return Err(BuildError::DuplicateArg(arg.name.clone()));
        }
    }

    Ok(())
}

/// Validates a subcommand name against the names already registered.
pub fn validate_subcommand<'a>(
    name: &str,
    mut existing: impl Iterator<Item = &'a str>,
) -> Result<(), BuildError> {
    if name.trim().is_empty() {
        return Err(BuildError::InvalidSubcommandName(name.to_string()));
    }
    if existing.any(|registered| registered == name) {
        return Err(BuildError::DuplicateSubcommand(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_flags_rejects_alias_colliding_with_name() {
        let flags = vec![
            FlagBinding::new("foo", String::new()),
            FlagBinding::new("bar", 0i32).alias("foo"),
        ];
        assert_eq!(
            validate_flags(&flags),
            Err(BuildError::DuplicateFlag("foo".to_string()))
        );
    }

    #[test]
    fn test_validate_flags_is_case_sensitive() {
        let flags = vec![
            FlagBinding::new("fizz", false).alias("F"),
            FlagBinding::new("foo", String::new()).alias("f"),
        ];
        assert_eq!(validate_flags(&flags), Ok(()));
    }

    #[test]
    fn test_validate_flags_rejects_unmatchable_names() {
        let flags = vec![FlagBinding::new("x", 1u8).rename("-x")];
        assert_eq!(
            validate_flags(&flags),
            Err(BuildError::InvalidFlagName("-x".to_string()))
        );

        let flags = vec![FlagBinding::new("x", 1u8).alias("a=b")];
        assert_eq!(
            validate_flags(&flags),
            Err(BuildError::InvalidFlagName("a=b".to_string()))
        );
    }

    #[test]
    fn test_validate_args_rejects_duplicates() {
        let args = vec![ArgSlot::required("SRC"), ArgSlot::optional("SRC")];
        assert_eq!(
            validate_args(&args),
            Err(BuildError::DuplicateArg("SRC".to_string()))
        );
        assert_eq!(
            validate_args(&[ArgSlot::required(" ")]),
            Err(BuildError::EmptyArgName)
        );
    }

    #[test]
    fn test_validate_subcommand() {
        let existing = ["get", "set"];
        assert_eq!(validate_subcommand("list", existing.iter().copied()), Ok(()));
        assert_eq!(
            validate_subcommand("get", existing.iter().copied()),
            Err(BuildError::DuplicateSubcommand("get".to_string()))
        );
        assert_eq!(
            validate_subcommand("", existing.iter().copied()),
            Err(BuildError::InvalidSubcommandName(String::new()))
        );
    }
}
