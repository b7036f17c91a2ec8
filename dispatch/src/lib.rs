//! Command trees on top of [`flagtree_core`] resolution.
//!
//! A tree is built from [`Command`] leaves and [`CommandGroup`] internal
//! nodes. [`run`] resolves the process arguments one level at a time: each
//! group resolves its own flags, routes the first leftover token to a child,
//! and passes its resolved configuration down as an ancestor parameter. The
//! leaf resolves the rest and runs its task.
//!
//! # Example
//!
//! ```
//! use std::io::Write;
//! use flagtree::*;
//!
//! struct Global {
//!     verbose: bool,
//! }
//!
//! impl FromFlags for Global {
//!     fn from_flags(values: &FlagValues) -> Result<Self, LookupError> {
//!         Ok(Self { verbose: values.get("verbose")? })
//!     }
//! }
//!
//! let echo = Command::new(
//!     "print words",
//!     FlagSet::empty(),
//!     vec![ArgSlot::optional("WORD").repeatable()],
//!     |_ctx, cl: &mut Commandline<'_, ()>, params| {
//!         let verbose = params.find::<Global>().is_some_and(|g| g.verbose);
//!         let words = cl.args().get("WORD").join(" ");
//!         if verbose {
//!             writeln!(cl.stderr(), "echoing {} bytes", words.len())?;
//!         }
//!         writeln!(cl.stdout(), "{words}")?;
//!         Ok(())
//!     },
//! )
//! .unwrap();
//!
//! let root: Node = CommandGroup::new::<Global>(
//!     "demo tool",
//!     FlagSet::new([FlagBinding::new("verbose", false).alias("v")]).unwrap(),
//! )
//! .subcommand("echo", echo)
//! .unwrap()
//! .into();
//!
//! let options = RunOptions::new("tool")
//!     .with_args(["-v", "echo", "hello", "world"])
//!     .with_output(std::io::sink(), std::io::sink());
//! assert_eq!(run(&root, options), ExitStatus::Success);
//! ```

mod command;
mod context;
mod group;
mod node;
mod render;
mod run;

pub use command::{Command, Commandline};
pub use context::{Context, Io, Params};
pub use group::CommandGroup;
pub use node::Node;
pub use render::{HelpFormat, render_help};
pub use run::{ExitStatus, RunOptions, run};

pub use flagtree_core::{
    ArgSlot, BuildError, CommandDescriptor, Coercion, Custom, DescriptionTemplate, Destination,
    FieldDescriptor, FlagBinding, FlagSet, FlagType, FlagValues, FromFlags, HelpDescriptor,
    Kind, LookupError, Positionals, Resolution, Resolver, Shape, UsageError,
};
