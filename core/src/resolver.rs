//! Token resolution for one level of a command tree.
//!
//! [`Resolver::resolve`] scans the token stream once. It matches flag-shaped
//! tokens against the binding set and commits the coerced values into a
//! fresh arena. Everything else is collected as leftover and handed to the
//! positional allocator. The resolver holds no per-call state, so a single
//! instance can be reused.

use tracing::debug;

use crate::error::{BuildError, UsageError};
use crate::flag::{FlagSet, FlagValues};
use crate::positional::{allocate, ArgSlot, Positionals};
use crate::validate::validate_args;
use crate::value::Coercion;

/// Returns the flag name carried by a flag-shaped token.
///
/// Long form is `--` followed by at least two characters, not starting
/// with a third dash. Short form is `-` followed by exactly one character.
/// The token must already have any inline `=value` removed.
///
/// # Examples
///
/// ```
/// use flagtree_core::flag_name;
///
/// assert_eq!(flag_name("--name"), Some("name"));
/// assert_eq!(flag_name("-n"), Some("n"));
/// assert_eq!(flag_name("--n"), None);
/// assert_eq!(flag_name("---name"), None);
/// assert_eq!(flag_name("-name"), None);
/// assert_eq!(flag_name("name"), None);
/// ```
pub fn flag_name(token: &str) -> Option<&str> {
    if let Some(long) = token.strip_prefix("--") {
        if !long.starts_with('-') && long.chars().count() >= 2 {
            return Some(long);
        }
        return None;
    }
    let short = token.strip_prefix('-')?;
    (short.chars().count() == 1).then_some(short)
}

/// The outcome of one resolution.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub flags: FlagValues,
    pub positionals: Positionals,
    /// Tokens neither matched as flags nor allocated to a slot.
    pub leftover: Vec<String>,
}

/// Resolves tokens against a flag set and an ordered positional slot list.
///
/// # Examples
///
/// ```
/// use flagtree_core::{ArgSlot, FlagBinding, FlagSet, Resolver};
///
/// let flags = FlagSet::new([
///     FlagBinding::new("verbose", false).alias("v"),
///     FlagBinding::new("level", 1u8),
/// ])
/// .unwrap();
/// let resolver = Resolver::new(flags, vec![ArgSlot::required("FILE")]).unwrap();
///
/// let resolution = resolver.resolve(["-v", "notes.txt", "--level", "3"]).unwrap();
/// assert_eq!(resolution.flags.get::<bool>("verbose"), Ok(true));
/// assert_eq!(resolution.flags.get::<u8>("level"), Ok(3));
/// assert_eq!(resolution.positionals.get("FILE"), ["notes.txt"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    flags: FlagSet,
    args: Vec<ArgSlot>,
}

impl Resolver {
    /// # Errors
    ///
    /// Returns [`BuildError::EmptyArgName`] or [`BuildError::DuplicateArg`].
    pub fn new(flags: FlagSet, args: Vec<ArgSlot>) -> Result<Self, BuildError> {
        validate_args(&args)?;
        Ok(Self { flags, args })
    }

    /// A resolver with no positional slots; leftovers are returned as-is.
    pub fn flags_only(flags: FlagSet) -> Self {
        Self {
            flags,
            args: Vec::new(),
        }
    }

    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    pub fn args(&self) -> &[ArgSlot] {
        &self.args
    }

    /// Flag usages followed by positional usages, space separated.
    pub fn usage(&self) -> String {
        self.flags
            .bindings()
            .iter()
            .map(|flag| flag.usage())
            .chain(self.args.iter().map(ArgSlot::usage))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Resolves `tokens` into flag values, positional assignments and leftover.
    ///
    /// # Errors
    ///
    /// - [`UsageError::Parse`] when an inline value, or a lookahead value that
    ///   does not push back, fails to coerce.
    /// - [`UsageError::ValueRequired`] when a flag without a bare action is
    ///   matched with no usable value.
    /// - [`UsageError::NotEnoughArguments`] from positional allocation.
    pub fn resolve<I, S>(&self, tokens: I) -> Result<Resolution, UsageError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        let mut values = self.flags.defaults();
        let mut rest: Vec<String> = Vec::new();

        let mut cursor = 0;
        while cursor < tokens.len() {
            let token = &tokens[cursor];
            if token == "--" {
                rest.extend(tokens[cursor + 1..].iter().cloned());
                break;
            }

            let (head, inline) = match token.split_once('=') {
                Some((head, value)) => (head, Some(value)),
                None => (token.as_str(), None),
            };
            let binding = flag_name(head).and_then(|name| self.flags.find(name));
            let Some(binding) = binding else {
                rest.push(token.clone());
                cursor += 1;
                continue;
            };

            match inline {
                Some(value) => match binding.set(value, &mut values) {
                    Coercion::Accepted(()) => {
                        debug!(flag = binding.name(), value, "flag matched inline");
                    }
                    Coercion::PushBack(reason) | Coercion::Rejected(reason) => {
                        return Err(UsageError::Parse {
                            flag: head.to_string(),
                            token: value.to_string(),
                            reason,
                        });
                    }
                },
                None => match tokens.get(cursor + 1) {
                    None => {
                        debug!(flag = binding.name(), "flag matched without value");
                        binding.found(&mut values)?;
                    }
                    Some(next) => match binding.set(next, &mut values) {
                        Coercion::Accepted(()) => {
                            debug!(flag = binding.name(), value = %next, "flag matched with lookahead");
                            cursor += 1;
                        }
                        Coercion::PushBack(reason) => {
                            debug!(flag = binding.name(), token = %next, %reason, "lookahead pushed back");
                            binding.found(&mut values)?;
                        }
                        Coercion::Rejected(reason) => {
                            return Err(UsageError::Parse {
                                flag: head.to_string(),
                                token: next.clone(),
                                reason,
                            });
                        }
                    },
                },
            }
            cursor += 1;
        }

        if self.args.is_empty() {
            return Ok(Resolution {
                flags: values,
                positionals: Positionals::default(),
                leftover: rest,
            });
        }

        let allocation = allocate(&self.args, rest)?;
        Ok(Resolution {
            flags: values,
            positionals: allocation.positionals,
            leftover: allocation.leftover,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flag::FlagBinding;

    fn sample_flags() -> FlagSet {
        FlagSet::new([
            FlagBinding::new("b", false),
            FlagBinding::new("IntFlag", 0i64),
            FlagBinding::new("UintFlag", 0u64),
            FlagBinding::new("Name", String::new()),
        ])
        .unwrap()
    }

    #[test]
    fn test_bare_boolean() {
        let resolver = Resolver::flags_only(sample_flags());

        let resolution = resolver.resolve(["-b"]).unwrap();
        assert_eq!(resolution.flags.get::<bool>("b"), Ok(true));
        assert!(resolution.leftover.is_empty());

        let resolution = resolver.resolve(["-b", "unknown"]).unwrap();
        assert_eq!(resolution.flags.get::<bool>("b"), Ok(true));
        assert_eq!(resolution.leftover, vec!["unknown"]);
    }

    #[test]
    fn test_boolean_lookahead_consumes_literal() {
        let resolver = Resolver::flags_only(sample_flags());
        let resolution = resolver.resolve(["-b", "off", "x"]).unwrap();
        assert_eq!(resolution.flags.get::<bool>("b"), Ok(false));
        assert_eq!(resolution.leftover, vec!["x"]);
    }

    #[test]
    fn test_inline_boolean_failure_is_fatal() {
        let resolver = Resolver::flags_only(sample_flags());
        let err = resolver.resolve(["-b=maybe"]).unwrap_err();
        assert_eq!(
            err,
            UsageError::Parse {
                flag: "-b".to_string(),
                token: "maybe".to_string(),
                reason: "maybe is not bool".to_string(),
            }
        );
    }

    #[test]
    fn test_mixed_flags_and_positionals() {
        let resolver = Resolver::new(
            sample_flags(),
            vec![ArgSlot::required("P1"), ArgSlot::optional("P2")],
        )
        .unwrap();

        let resolution = resolver
            .resolve([
                "--int-flag=100",
                "a",
                "b",
                "--unknown-flag",
                "--uint-flag",
                "200",
                "c",
                "-d",
            ])
            .unwrap();

        assert_eq!(resolution.flags.get::<i64>("int-flag"), Ok(100));
        assert_eq!(resolution.flags.get::<u64>("uint-flag"), Ok(200));
        assert_eq!(resolution.positionals.get("P1"), ["a"]);
        assert_eq!(resolution.positionals.get("P2"), ["b"]);
        assert_eq!(resolution.leftover, vec!["--unknown-flag", "c", "-d"]);
    }

    #[test]
    fn test_lookahead_rejection_is_fatal() {
        let resolver = Resolver::flags_only(sample_flags());
        let err = resolver.resolve(["--int-flag", "ten"]).unwrap_err();
        assert!(matches!(
            err,
            UsageError::Parse { ref flag, ref token, .. } if flag == "--int-flag" && token == "ten"
        ));
    }

    #[test]
    fn test_value_required_at_end_of_stream() {
        let resolver = Resolver::flags_only(sample_flags());
        assert_eq!(
            resolver.resolve(["--name"]).unwrap_err(),
            UsageError::ValueRequired {
                flag: "--name".to_string()
            }
        );
    }

    #[test]
    fn test_lookahead_takes_next_token_whatever_its_shape() {
        let resolver = Resolver::flags_only(sample_flags());
        let resolution = resolver.resolve(["--name", "-b"]).unwrap();
        assert_eq!(resolution.flags.get::<String>("name"), Ok("-b".to_string()));
        assert_eq!(resolution.flags.get::<bool>("b"), Ok(false));
    }

    #[test]
    fn test_double_dash_ends_flag_scanning() {
        let resolver = Resolver::flags_only(sample_flags());
        let resolution = resolver.resolve(["-b", "--", "--int-flag=3", "--"]).unwrap();
        assert_eq!(resolution.flags.get::<bool>("b"), Ok(true));
        assert_eq!(resolution.flags.get::<i64>("int-flag"), Ok(0));
        assert_eq!(resolution.leftover, vec!["--int-flag=3", "--"]);
    }

    #[test]
    fn test_malformed_dashes_are_not_flags() {
        let flags = FlagSet::new([FlagBinding::new("x", false), FlagBinding::new("xx", false)])
            .unwrap();
        let resolver = Resolver::flags_only(flags);
        let resolution = resolver.resolve(["--x", "---xx", "-xx"]).unwrap();
        assert_eq!(resolution.flags.get::<bool>("x"), Ok(false));
        assert_eq!(resolution.flags.get::<bool>("xx"), Ok(false));
        assert_eq!(resolution.leftover, vec!["--x", "---xx", "-xx"]);
    }

    #[test]
    fn test_resolver_is_reusable() {
        let resolver = Resolver::flags_only(sample_flags());
        let first = resolver.resolve(["--int-flag=5"]).unwrap();
        let second = resolver.resolve(Vec::<String>::new()).unwrap();
        assert_eq!(first.flags.get::<i64>("int-flag"), Ok(5));
        assert_eq!(second.flags.get::<i64>("int-flag"), Ok(0));
    }

    #[test]
    fn test_usage_lists_flags_then_args() {
        let resolver = Resolver::new(
            FlagSet::new([FlagBinding::new("v", false)]).unwrap(),
            vec![ArgSlot::required("SRC").repeatable(), ArgSlot::optional("DEST")],
        )
        .unwrap();
        assert_eq!(resolver.usage(), "-v=false SRC[, ...] [DEST]");
    }

    #[test]
    fn test_duplicate_positional_names_rejected() {
        let result = Resolver::new(
            FlagSet::empty(),
            vec![ArgSlot::required("A"), ArgSlot::required("A")],
        );
        assert_eq!(result.unwrap_err(), BuildError::DuplicateArg("A".to_string()));
    }
}
