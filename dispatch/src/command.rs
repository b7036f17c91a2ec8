//! Leaf commands.

use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

use flagtree_core::{
    ArgSlot, BuildError, DescriptionTemplate, FlagSet, FromFlags, HelpDescriptor, Positionals,
    Resolution, Resolver, UsageError,
};
use tracing::{debug, info};

use crate::context::{Context, Io, Params};
use crate::node::{Action, Prepared};

type ErasedTask =
    dyn Fn(&Context, Resolution, &str, &mut Io, &Params) -> anyhow::Result<()> + Send + Sync;

/// What a task sees of its own invocation.
pub struct Commandline<'a, T> {
    fullname: &'a str,
    flags: T,
    positionals: Positionals,
    io: &'a mut Io,
}

impl<'a, T> Commandline<'a, T> {
    /// Full invocation name, e.g. `tool remote add`.
    pub fn fullname(&self) -> &str {
        self.fullname
    }

    pub fn flags(&self) -> &T {
        &self.flags
    }

    pub fn args(&self) -> &Positionals {
        &self.positionals
    }

    pub fn stdin(&mut self) -> &mut dyn Read {
        &mut self.io.stdin
    }

    pub fn stdout(&mut self) -> &mut dyn Write {
        &mut self.io.stdout
    }

    pub fn stderr(&mut self) -> &mut dyn Write {
        &mut self.io.stderr
    }
}

/// A leaf of the command tree: resolves its own flags and positional slots,
/// then runs its task.
///
/// Tokens left over after positional allocation are a usage error.
#[derive(Clone)]
pub struct Command {
    short_description: String,
    description: Option<DescriptionTemplate>,
    resolver: Resolver,
    task: Arc<ErasedTask>,
}

impl Command {
    /// Declares a command whose task receives the flags converted into `T`.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] when the positional slot list is invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Write;
    /// use flagtree::{ArgSlot, Command, Commandline, FlagBinding, FlagSet, FlagValues};
    ///
    /// let greet = Command::new(
    ///     "print a greeting",
    ///     FlagSet::new([FlagBinding::new("loud", false)]).unwrap(),
    ///     vec![ArgSlot::required("NAME")],
    ///     |_ctx, cl: &mut Commandline<'_, FlagValues>, _params| {
    ///         let name = cl.args().first("NAME").unwrap_or_default().to_string();
    ///         let loud: bool = cl.flags().get("loud")?;
    ///         let line = if loud { name.to_uppercase() } else { name };
    ///         writeln!(cl.stdout(), "hello {line}")?;
    ///         Ok(())
    ///     },
    /// )
    /// .unwrap();
    /// assert_eq!(greet.short_description(), "print a greeting");
    /// ```
    pub fn new<T, F>(
        short_description: impl Into<String>,
        flags: FlagSet,
        args: Vec<ArgSlot>,
        task: F,
    ) -> Result<Self, BuildError>
    where
        T: FromFlags + 'static,
        F: Fn(&Context, &mut Commandline<'_, T>, &Params) -> anyhow::Result<()>
            + Send
            + Sync
            + 'static,
    {
        let resolver = Resolver::new(flags, args)?;
        let task = move |ctx: &Context,
                         resolution: Resolution,
                         fullname: &str,
                         io: &mut Io,
                         params: &Params|
              -> anyhow::Result<()> {
            let flags = T::from_flags(&resolution.flags)?;
            let mut commandline = Commandline {
                fullname,
                flags,
                positionals: resolution.positionals,
                io,
            };
            task(ctx, &mut commandline, params)
        };

        Ok(Self {
            short_description: short_description.into(),
            description: None,
            resolver,
            task: Arc::new(task),
        })
    }

    pub fn with_description(mut self, description: DescriptionTemplate) -> Self {
        self.description = Some(description);
        self
    }

    pub fn short_description(&self) -> &str {
        &self.short_description
    }

    pub fn flags(&self) -> &FlagSet {
        self.resolver.flags()
    }

    pub fn args(&self) -> &[ArgSlot] {
        self.resolver.args()
    }

    pub fn help(&self, invocation: &str) -> HelpDescriptor {
        HelpDescriptor::new(invocation, self.short_description.clone())
            .with_description(self.description.clone())
            .with_flags(self.resolver.flags())
            .with_args(self.resolver.args())
    }

    fn resolve(&self, tokens: Vec<String>) -> Result<Resolution, UsageError> {
        let resolution = self.resolver.resolve(tokens)?;
        if !resolution.leftover.is_empty() {
            return Err(UsageError::TooManyArguments(resolution.leftover));
        }
        Ok(resolution)
    }

    pub(crate) fn prepare(&self, fullname: &str, tokens: Vec<String>, params: Params) -> Prepared {
        let help = self.help(fullname);
        let action = self.resolve(tokens).map(|resolution| {
            debug!(command = fullname, "resolved command line");
            let task = Arc::clone(&self.task);
            let fullname = fullname.to_string();
            Box::new(move |ctx: &Context, io: &mut Io| {
                info!(command = %fullname, params = params.len(), "invoking task");
                task(ctx, resolution, &fullname, io, &params)
            }) as Action
        });
        Prepared { help, action }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("short_description", &self.short_description)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use flagtree_core::{FlagBinding, FlagValues};

    use super::*;

    fn noop() -> Command {
        Command::new(
            "does nothing",
            FlagSet::new([FlagBinding::new("f", false)]).unwrap(),
            vec![ArgSlot::optional("X")],
            |_ctx, _cl: &mut Commandline<'_, FlagValues>, _params| Ok(()),
        )
        .unwrap()
    }

    #[test]
    fn test_leftover_tokens_are_too_many_arguments() {
        let prepared = noop().prepare("tool", vec!["a".into(), "b".into()], Params::new());
        assert!(matches!(
            prepared.action,
            Err(UsageError::TooManyArguments(ref extra)) if extra == &vec!["b".to_string()]
        ));
    }

    #[test]
    fn test_help_is_available_without_resolution() {
        let help = noop().help("tool");
        assert_eq!(help.usage_line(), "tool -f=false [X]");
        assert_eq!(help.short_description, "does nothing");
    }

    #[test]
    fn test_duplicate_args_fail_construction() {
        let result = Command::new(
            "",
            FlagSet::empty(),
            vec![ArgSlot::required("A"), ArgSlot::optional("A")],
            |_ctx, _cl: &mut Commandline<'_, ()>, _params| Ok(()),
        );
        assert!(matches!(result, Err(BuildError::DuplicateArg(_))));
    }
}
