//! Command groups: internal nodes that route to a named child.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use flagtree_core::{
    BuildError, DescriptionTemplate, FlagSet, FlagValues, FromFlags, HelpDescriptor, LookupError,
    Resolver, UsageError, validate_subcommand,
};
use tracing::debug;

use crate::context::{Context, Io, Params};
use crate::node::{Action, Node, Prepared};

type IntoParam =
    dyn Fn(&FlagValues) -> Result<Arc<dyn Any + Send + Sync>, LookupError> + Send + Sync;

/// An internal node of the command tree.
///
/// A group resolves its own flags, takes the first leftover token as the
/// name of a child, and passes the rest of the tokens to that child. Its
/// resolved flags, converted to `T`, are appended to the ancestor
/// parameters the child's task receives.
///
/// # Examples
///
/// ```
/// use flagtree::{Command, CommandGroup, Commandline, FlagBinding, FlagSet, FlagValues};
///
/// let list = Command::new(
///     "list entries",
///     FlagSet::empty(),
///     Vec::new(),
///     |_ctx, _cl: &mut Commandline<'_, ()>, _params| Ok(()),
/// )
/// .unwrap();
///
/// let group = CommandGroup::new::<FlagValues>(
///     "manage entries",
///     FlagSet::new([FlagBinding::new("verbose", false).alias("v")]).unwrap(),
/// )
/// .subcommand("list", list.clone())
/// .unwrap();
///
/// assert!(group.subcommand("list", list).is_err());
/// ```
#[derive(Clone)]
pub struct CommandGroup {
    short_description: String,
    description: Option<DescriptionTemplate>,
    resolver: Resolver,
    subcommands: BTreeMap<String, Node>,
    into_param: Arc<IntoParam>,
}

impl CommandGroup {
    /// Declares a group whose resolved flags are passed down as a `T`.
    pub fn new<T>(short_description: impl Into<String>, flags: FlagSet) -> Self
    where
        T: FromFlags + Send + Sync + 'static,
    {
        let into_param = |values: &FlagValues| -> Result<Arc<dyn Any + Send + Sync>, LookupError> {
            let param = T::from_flags(values)?;
            Ok(Arc::new(param))
        };
        Self {
            short_description: short_description.into(),
            description: None,
            resolver: Resolver::flags_only(flags),
            subcommands: BTreeMap::new(),
            into_param: Arc::new(into_param),
        }
    }

    pub fn with_description(mut self, description: DescriptionTemplate) -> Self {
        self.description = Some(description);
        self
    }

    /// Registers a child under `name`.
    ///
    /// # Errors
    ///
    /// [`BuildError::DuplicateSubcommand`] if `name` is already taken, or
    /// [`BuildError::InvalidSubcommandName`] if it is blank.
    pub fn subcommand(mut self, name: &str, node: impl Into<Node>) -> Result<Self, BuildError> {
        validate_subcommand(name, self.subcommands.keys().map(String::as_str))?;
        self.subcommands.insert(name.to_string(), node.into());
        Ok(self)
    }

    pub fn short_description(&self) -> &str {
        &self.short_description
    }

    pub fn flags(&self) -> &FlagSet {
        self.resolver.flags()
    }

    pub fn subcommands(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.subcommands
            .iter()
            .map(|(name, node)| (name.as_str(), node))
    }

    pub fn help(&self, invocation: &str) -> HelpDescriptor {
        self.subcommands.iter().fold(
            HelpDescriptor::new(invocation, self.short_description.clone())
                .with_description(self.description.clone())
                .with_flags(self.resolver.flags()),
            |help, (name, node)| help.with_subcommand(name.clone(), node.short_description()),
        )
    }

    pub(crate) fn prepare(
        &self,
        fullname: &str,
        tokens: Vec<String>,
        mut params: Params,
    ) -> Prepared {
        let failed = |err: UsageError| Prepared {
            help: self.help(fullname),
            action: Err(err),
        };

        let resolution = match self.resolver.resolve(tokens) {
            Ok(resolution) => resolution,
            Err(err) => return failed(err),
        };

        let mut rest = resolution.leftover.into_iter();
        let Some(name) = rest.next() else {
            debug!(group = fullname, "no subcommand given");
            return failed(UsageError::NoSubcommand);
        };
        let Some(child) = self.subcommands.get(&name) else {
            debug!(group = fullname, subcommand = %name, "unknown subcommand");
            return failed(UsageError::UnknownSubcommand(name));
        };

        let child_name = format!("{fullname} {name}");
        debug!(group = fullname, subcommand = %child_name, "routing to subcommand");

        let mut prepared = match (self.into_param)(&resolution.flags) {
            Ok(param) => {
                params.push_shared(param);
                child.prepare(&child_name, rest.collect(), params)
            }
            Err(err) => Prepared {
                help: child.help(&child_name),
                action: Ok(Box::new(move |_: &Context, _: &mut Io| {
                    Err(anyhow::Error::from(err))
                }) as Action),
            },
        };
        prepared.help.append_flags(self.resolver.flags());
        prepared
    }
}

impl fmt::Debug for CommandGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandGroup")
            .field("short_description", &self.short_description)
            .field("resolver", &self.resolver)
            .field("subcommands", &self.subcommands)
            .finish_non_exhaustive()
    }
}
