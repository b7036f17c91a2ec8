//! Top-level dispatch: help short-circuit and exit status mapping.

use std::io::{Read, Write};
use std::path::Path;
use std::process::ExitCode;

use flagtree_core::{FlagBinding, FlagSet, HelpDescriptor, Resolver, UsageError};
use tracing::{debug, warn};

use crate::context::{Context, Io, Params};
use crate::node::Node;
use crate::render::{HelpFormat, render_help};

/// Process exit status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// The task succeeded, or help was shown.
    Success = 0,
    /// The task returned an error.
    Failure = 1,
    /// The command line could not be resolved.
    Usage = 2,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status.code())
    }
}

/// Settings for one [`run`].
///
/// # Examples
///
/// ```
/// use flagtree::{HelpFormat, RunOptions};
///
/// let options = RunOptions::new("tool")
///     .with_args(["--verbose", "list"])
///     .with_output(Vec::new(), Vec::new())
///     .with_format(HelpFormat::Json)
///     .with_param(42u32);
/// assert_eq!(options.name(), "tool");
/// assert_eq!(options.args(), ["--verbose", "list"]);
/// ```
#[derive(Debug)]
pub struct RunOptions {
    name: String,
    args: Vec<String>,
    io: Io,
    help: bool,
    params: Params,
    format: HelpFormat,
    context: Context,
}

impl RunOptions {
    /// Options for invocation name `name` with no arguments and the process's
    /// standard streams.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            io: Io::stdio(),
            help: true,
            params: Params::new(),
            format: HelpFormat::Text,
            context: Context::new(),
        }
    }

    /// Options taken from the process: the basename of `argv[0]` and the
    /// remaining arguments.
    pub fn from_env() -> Self {
        let mut argv = std::env::args_os().map(|arg| arg.to_string_lossy().into_owned());
        let name = argv
            .next()
            .map(|program| {
                Path::new(&program)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or(program)
            })
            .unwrap_or_default();
        Self::new(name).with_args(argv)
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_input(mut self, stdin: impl Read + Send + 'static) -> Self {
        self.io.stdin = Box::new(stdin);
        self
    }

    pub fn with_output(
        mut self,
        stdout: impl Write + Send + 'static,
        stderr: impl Write + Send + 'static,
    ) -> Self {
        self.io.stdout = Box::new(stdout);
        self.io.stderr = Box::new(stderr);
        self
    }

    /// Enables or disables the reserved `--help` / `-h` flag. On by default.
    pub fn with_help(mut self, enabled: bool) -> Self {
        self.help = enabled;
        self
    }

    /// Appends a caller-supplied ancestor parameter.
    pub fn with_param<T: std::any::Any + Send + Sync>(mut self, param: T) -> Self {
        self.params.push(param);
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn with_format(mut self, format: HelpFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

fn help_flags() -> FlagSet {
    FlagSet::new([FlagBinding::new("help", false)
        .alias("h")
        .with_help("show help message")
        .with_metavar("")])
    .unwrap_or_default()
}

fn write_help(stderr: &mut dyn Write, help: &HelpDescriptor, format: HelpFormat) {
    let text = render_help(help, format).unwrap_or_else(|err| format!("{err}\n"));
    let _ = stderr.write_all(text.as_bytes());
}

fn report_usage(io: &mut Io, err: &UsageError, help: &HelpDescriptor, format: HelpFormat) {
    warn!(error = %err, invocation = %help.invocation, "usage error");
    let _ = writeln!(io.stderr, "{err}\n");
    write_help(&mut io.stderr, help, format);
}

/// Scans `tokens` for the help flag, leaving everything from a `--` onward
/// untouched.
fn strip_help(flags: &FlagSet, mut tokens: Vec<String>) -> Result<(bool, Vec<String>), UsageError> {
    let end = tokens.iter().position(|token| token == "--").unwrap_or(tokens.len());
    let tail = tokens.split_off(end);
    let resolution = Resolver::flags_only(flags.clone()).resolve(tokens)?;
    let wanted = resolution.flags.get::<bool>("help").unwrap_or(false);
    let mut rest = resolution.leftover;
    rest.extend(tail);
    Ok((wanted, rest))
}

/// Resolves the options' arguments against `root` and runs the selected task.
///
/// - If the help flag is present, the deepest reachable node's help is
///   written to stderr and no task runs ([`ExitStatus::Success`]).
/// - Usage errors are written to stderr followed by help
///   ([`ExitStatus::Usage`]). A task error that is a [`UsageError`] is
///   reported the same way.
/// - Any other task error is written to stderr without help
///   ([`ExitStatus::Failure`]).
///
/// # Examples
///
/// ```
/// use std::io::Write;
/// use flagtree::{run, Command, Commandline, ExitStatus, FlagSet, Node, RunOptions};
///
/// let hello: Node = Command::new(
///     "say hello",
///     FlagSet::empty(),
///     Vec::new(),
///     |_ctx, cl: &mut Commandline<'_, ()>, _params| {
///         writeln!(cl.stdout(), "hello")?;
///         Ok(())
///     },
/// )
/// .unwrap()
/// .into();
///
/// let options = RunOptions::new("hello").with_output(std::io::sink(), std::io::sink());
/// assert_eq!(run(&hello, options), ExitStatus::Success);
///
/// let options = RunOptions::new("hello")
///     .with_args(["extra"])
///     .with_output(std::io::sink(), std::io::sink());
/// assert_eq!(run(&hello, options), ExitStatus::Usage);
/// ```
pub fn run(root: &Node, options: RunOptions) -> ExitStatus {
    let RunOptions {
        name,
        args,
        mut io,
        help,
        params,
        format,
        context,
    } = options;

    let help_flags = help.then(help_flags);
    let (show_help, tokens) = match &help_flags {
        Some(flags) => match strip_help(flags, args) {
            Ok(stripped) => stripped,
            Err(err) => {
                let mut descriptor = root.help(&name);
                descriptor.append_flags(flags);
                report_usage(&mut io, &err, &descriptor, format);
                return ExitStatus::Usage;
            }
        },
        None => (false, args),
    };

    let mut prepared = root.prepare(&name, tokens, params);
    if let Some(flags) = &help_flags {
        prepared.help.append_flags(flags);
    }

    if show_help {
        debug!(invocation = %prepared.help.invocation, "help requested");
        write_help(&mut io.stderr, &prepared.help, format);
        return ExitStatus::Success;
    }

    let action = match prepared.action {
        Ok(action) => action,
        Err(err) => {
            report_usage(&mut io, &err, &prepared.help, format);
            return ExitStatus::Usage;
        }
    };

    match action(&context, &mut io) {
        Ok(()) => ExitStatus::Success,
        Err(err) => match err.downcast_ref::<UsageError>() {
            Some(usage) => {
                report_usage(&mut io, usage, &prepared.help, format);
                ExitStatus::Usage
            }
            None => {
                warn!(error = %err, "task failed");
                let _ = writeln!(io.stderr, "{err:#}");
                ExitStatus::Failure
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitStatus::Success.code(), 0);
        assert_eq!(ExitStatus::Failure.code(), 1);
        assert_eq!(ExitStatus::Usage.code(), 2);
    }

    #[test]
    fn test_strip_help_leaves_tokens_after_double_dash() {
        let flags = help_flags();
        let tokens = vec!["a".to_string(), "--".to_string(), "-h".to_string()];
        let (wanted, rest) = strip_help(&flags, tokens).unwrap();
        assert!(!wanted);
        assert_eq!(rest, vec!["a", "--", "-h"]);

        let tokens = vec!["-h".to_string(), "sub".to_string()];
        let (wanted, rest) = strip_help(&flags, tokens).unwrap();
        assert!(wanted);
        assert_eq!(rest, vec!["sub"]);
    }

    #[test]
    fn test_help_flag_usage_has_no_metavar() {
        let flags = help_flags();
        assert_eq!(flags.bindings()[0].usage(), "--help");
        assert_eq!(flags.bindings()[0].display_aliases(), vec!["-h"]);
    }
}
