//! The command tree node type.

use flagtree_core::{HelpDescriptor, UsageError};

use crate::command::Command;
use crate::context::{Context, Io, Params};
use crate::group::CommandGroup;

/// A resolved, ready-to-run task.
pub(crate) type Action = Box<dyn FnOnce(&Context, &mut Io) -> anyhow::Result<()>>;

/// Outcome of routing tokens through the tree.
///
/// `help` describes the deepest node reached, whether or not routing
/// succeeded.
pub(crate) struct Prepared {
    pub help: HelpDescriptor,
    pub action: Result<Action, UsageError>,
}

/// One node of a command tree.
#[derive(Debug, Clone)]
pub enum Node {
    Command(Command),
    Group(CommandGroup),
}

impl Node {
    pub fn short_description(&self) -> &str {
        match self {
            Node::Command(command) => command.short_description(),
            Node::Group(group) => group.short_description(),
        }
    }

    /// Help for this node alone, invoked as `invocation`.
    pub fn help(&self, invocation: &str) -> HelpDescriptor {
        match self {
            Node::Command(command) => command.help(invocation),
            Node::Group(group) => group.help(invocation),
        }
    }

    pub(crate) fn prepare(&self, fullname: &str, tokens: Vec<String>, params: Params) -> Prepared {
        match self {
            Node::Command(command) => command.prepare(fullname, tokens, params),
            Node::Group(group) => group.prepare(fullname, tokens, params),
        }
    }
}

impl From<Command> for Node {
    fn from(command: Command) -> Self {
        Node::Command(command)
    }
}

impl From<CommandGroup> for Node {
    fn from(group: CommandGroup) -> Self {
        Node::Group(group)
    }
}
