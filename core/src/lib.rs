//! Token resolution for typed command-line flags and positional arguments.
//!
//! This crate turns a raw token stream into typed values for one level of a
//! command tree:
//!
//! - [`FlagBinding`]: one configuration field. Matches `--name` / `-n` and
//!   aliases, coerces tokens into its [`Kind`], and commits them into a
//!   [`Destination`] shape (plain, optional, repeatable, or a combination).
//! - [`FlagSet`]: a validated, ordered set of bindings. Each resolution gets a
//!   fresh [`FlagValues`] arena seeded with the defaults.
//! - [`ArgSlot`] and [`allocate`]: ordered positional slots and the greedy
//!   allocator that gives required slots priority and lets repeatable slots
//!   absorb the surplus.
//! - [`Resolver`]: the tokenizer that ties both together and returns a
//!   [`Resolution`].
//! - [`HelpDescriptor`]: structured help, independent of resolution.
//! - [`FieldDescriptor`] / [`CommandDescriptor`]: the same declarations as
//!   JSON or YAML data.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use flagtree_core::*;
//!
//! let flags = FlagSet::new([
//!     FlagBinding::new("DryRun", false).alias("n"),
//!     FlagBinding::new("Timeout", Duration::from_secs(30)),
//!     FlagBinding::new("Exclude", Vec::<String>::new()).alias("x"),
//! ])
//! .unwrap();
//! let resolver = Resolver::new(
//!     flags,
//!     vec![ArgSlot::required("SOURCE").repeatable(), ArgSlot::required("DEST")],
//! )
//! .unwrap();
//!
//! let resolution = resolver
//!     .resolve(["-n", "a.txt", "-x", "*.tmp", "b.txt", "--timeout=5s", "out/"])
//!     .unwrap();
//!
//! assert_eq!(resolution.flags.get::<bool>("dry-run"), Ok(true));
//! assert_eq!(resolution.flags.get::<Duration>("timeout"), Ok(Duration::from_secs(5)));
//! assert_eq!(resolution.flags.get::<Vec<String>>("exclude"), Ok(vec!["*.tmp".to_string()]));
//! assert_eq!(resolution.positionals.get("SOURCE"), ["a.txt", "b.txt"]);
//! assert_eq!(resolution.positionals.get("DEST"), ["out/"]);
//! ```

mod descriptor;
mod destination;
mod error;
mod flag;
mod help;
mod naming;
mod positional;
mod resolver;
mod validate;
mod value;

pub use descriptor::{CommandDescriptor, FieldDescriptor};
pub use destination::{Destination, Shape, Slot};
pub use error::{BuildError, LookupError, UsageError};
pub use flag::{FlagBinding, FlagSet, FlagValues, FromFlags, hyphenate};
pub use help::{ArgHelp, DescriptionTemplate, FlagHelp, HelpDescriptor, SubcommandHelp};
pub use naming::kebab_case;
pub use positional::{Allocation, ArgSlot, Positionals, allocate};
pub use resolver::{Resolution, Resolver, flag_name};
pub use validate::{validate_args, validate_flags, validate_subcommand};
pub use value::{Coercion, Custom, CustomType, CustomValue, FlagType, Kind, Value};
