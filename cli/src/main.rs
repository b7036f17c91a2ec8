use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context as _, bail};
use flagtree::{
    ArgSlot, BuildError, Command, CommandDescriptor, CommandGroup, Commandline, Custom,
    DescriptionTemplate, FlagBinding, FlagSet, FlagValues, FromFlags, HelpFormat, LookupError,
    Node, Params, RunOptions, render_help, run,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Flags shared by every subcommand.
#[derive(Debug, Clone)]
struct Global {
    verbose: bool,
}

impl FromFlags for Global {
    fn from_flags(values: &FlagValues) -> Result<Self, LookupError> {
        Ok(Self {
            verbose: values.get("verbose")?,
        })
    }
}

fn verbose(params: &Params) -> bool {
    params.find::<Global>().is_some_and(|global| global.verbose)
}

struct CopyFlags {
    dry_run: bool,
    force: bool,
}

impl FromFlags for CopyFlags {
    fn from_flags(values: &FlagValues) -> Result<Self, LookupError> {
        Ok(Self {
            dry_run: values.get("dry-run")?,
            force: values.get("force")?,
        })
    }
}

struct EchoFlags {
    no_newline: bool,
    separator: String,
    repeat: u32,
}

impl FromFlags for EchoFlags {
    fn from_flags(values: &FlagValues) -> Result<Self, LookupError> {
        Ok(Self {
            no_newline: values.get("no-newline")?,
            separator: values.get("separator")?,
            repeat: values.get("repeat")?,
        })
    }
}

struct WaitFlags {
    duration: Duration,
    tick: Duration,
}

impl FromFlags for WaitFlags {
    fn from_flags(values: &FlagValues) -> Result<Self, LookupError> {
        Ok(Self {
            duration: values.get("duration")?,
            tick: values.get("tick")?,
        })
    }
}

struct DescribeFlags {
    format: HelpFormat,
}

impl FromFlags for DescribeFlags {
    fn from_flags(values: &FlagValues) -> Result<Self, LookupError> {
        let Custom(format) = values.get::<Custom<HelpFormat>>("format")?;
        Ok(Self { format })
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
}

fn load_descriptor(path: &Path) -> anyhow::Result<CommandDescriptor> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let descriptor = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => CommandDescriptor::from_json(&text)?,
        _ => CommandDescriptor::from_yaml(&text)?,
    };
    debug!(path = %path.display(), name = %descriptor.name, "loaded descriptor");
    Ok(descriptor)
}

fn copy_target(source: &Path, dest: &Path, many: bool) -> anyhow::Result<PathBuf> {
    if many || dest.is_dir() {
        let name = source
            .file_name()
            .with_context(|| format!("{} has no file name", source.display()))?;
        Ok(dest.join(name))
    } else {
        Ok(dest.to_path_buf())
    }
}

fn copy_command() -> Result<Command, BuildError> {
    Command::new(
        "copy files",
        FlagSet::new([
            FlagBinding::new("dry_run", false)
                .alias("n")
                .with_help("print what would be copied"),
            FlagBinding::new("force", false)
                .alias("f")
                .with_help("overwrite existing files"),
        ])?,
        vec![
            ArgSlot::required("SOURCE")
                .repeatable()
                .with_help("files to copy"),
            ArgSlot::required("DEST").with_help("destination file or directory"),
        ],
        |_ctx, cl: &mut Commandline<'_, CopyFlags>, params| {
            let sources: Vec<PathBuf> = cl.args().get("SOURCE").iter().map(PathBuf::from).collect();
            let dest = PathBuf::from(cl.args().first("DEST").unwrap_or_default());
            let many = sources.len() > 1;
            if many && !cl.flags().dry_run && !dest.is_dir() {
                bail!("{} is not a directory", dest.display());
            }

            for source in &sources {
                let target = copy_target(source, &dest, many)?;
                if target.exists() && !cl.flags().force {
                    bail!("{} exists; use --force to overwrite", target.display());
                }
                if cl.flags().dry_run {
                    writeln!(cl.stdout(), "would copy {} -> {}", source.display(), target.display())?;
                    continue;
                }
                let bytes = fs::copy(source, &target).with_context(|| {
                    format!("failed to copy {} to {}", source.display(), target.display())
                })?;
                writeln!(cl.stdout(), "copied {} -> {}", source.display(), target.display())?;
                if verbose(params) {
                    writeln!(cl.stderr(), "{bytes} bytes")?;
                }
            }
            Ok(())
        },
    )
}

fn echo_command() -> Result<Command, BuildError> {
    Command::new(
        "print words",
        FlagSet::new([
            FlagBinding::new("no_newline", false)
                .alias("n")
                .with_help("omit the trailing newline"),
            FlagBinding::new("separator", String::from(" ")).with_help("text between words"),
            FlagBinding::new("repeat", 1u32).with_help("print the line this many times"),
        ])?,
        vec![ArgSlot::optional("WORD").repeatable()],
        |_ctx, cl: &mut Commandline<'_, EchoFlags>, params| {
            let words = cl.args().get("WORD").len();
            let line = cl.args().get("WORD").join(cl.flags().separator.as_str());
            let ending = if cl.flags().no_newline { "" } else { "\n" };
            for _ in 0..cl.flags().repeat {
                write!(cl.stdout(), "{line}{ending}")?;
            }
            if verbose(params) {
                writeln!(cl.stderr(), "echoed {words} words")?;
            }
            Ok(())
        },
    )
}

fn wait_command() -> Result<Command, BuildError> {
    Command::new(
        "sleep until the duration elapses or the run is cancelled",
        FlagSet::new([
            FlagBinding::new("duration", Duration::from_secs(1))
                .alias("d")
                .with_help("how long to wait, e.g. 250ms or 1m 30s"),
            FlagBinding::new("tick", Duration::from_millis(50))
                .with_help("how often to check for cancellation"),
        ])?,
        Vec::new(),
        |ctx, cl: &mut Commandline<'_, WaitFlags>, _params| {
            let started = Instant::now();
            let duration = cl.flags().duration;
            let tick = cl.flags().tick.max(Duration::from_millis(1));
            while started.elapsed() < duration {
                if ctx.is_cancelled() {
                    bail!("cancelled after {}", humantime::format_duration(started.elapsed()));
                }
                thread::sleep(tick.min(duration.saturating_sub(started.elapsed())));
            }
            writeln!(cl.stdout(), "waited {}", humantime::format_duration(duration))?;
            Ok(())
        },
    )
}

fn describe_command() -> Result<Command, BuildError> {
    let command = Command::new(
        "print help for a command described in a JSON or YAML file",
        FlagSet::new([FlagBinding::new("format", Custom(HelpFormat::Text))
            .with_help("text, json or yaml")])?,
        vec![ArgSlot::required("FILE")],
        |_ctx, cl: &mut Commandline<'_, DescribeFlags>, _params| {
            let path = PathBuf::from(cl.args().first("FILE").unwrap_or_default());
            let descriptor = load_descriptor(&path)?;
            let help = descriptor.help(&descriptor.name)?;
            let text = render_help(&help, cl.flags().format).map_err(anyhow::Error::msg)?;
            cl.stdout().write_all(text.as_bytes())?;
            Ok(())
        },
    )?;
    Ok(command.with_description(DescriptionTemplate::parse(
        "Loads FILE and prints the help it declares.\n\
         Try `{{ .Command }} --format=json cmd.yaml`.",
    )?))
}

fn resolve_command() -> Result<Command, BuildError> {
    Command::new(
        "resolve tokens against a command described in a JSON or YAML file",
        FlagSet::empty(),
        vec![
            ArgSlot::required("FILE"),
            ArgSlot::optional("TOKEN")
                .repeatable()
                .with_help("tokens to resolve; put them after -- to pass flags through"),
        ],
        |_ctx, cl: &mut Commandline<'_, ()>, _params| {
            let path = PathBuf::from(cl.args().first("FILE").unwrap_or_default());
            let descriptor = load_descriptor(&path)?;
            let resolver = descriptor.resolver()?;
            let tokens = cl.args().get("TOKEN").to_vec();
            let resolution = resolver.resolve(tokens)?;

            let out = cl.stdout();
            for binding in resolver.flags().bindings() {
                if let Some(slot) = resolution.flags.slot(binding.name()) {
                    let marker = if resolution.flags.is_set(binding.name()) { "" } else { " (default)" };
                    writeln!(out, "{} = {slot}{marker}", binding.display_name())?;
                }
            }
            for (name, tokens) in resolution.positionals.iter() {
                writeln!(out, "{name} = {tokens:?}")?;
            }
            if !resolution.leftover.is_empty() {
                writeln!(out, "leftover = {:?}", resolution.leftover)?;
            }
            Ok(())
        },
    )
}

fn build_tree() -> Result<Node, BuildError> {
    let root = CommandGroup::new::<Global>(
        "a small command tree built on flagtree",
        FlagSet::new([FlagBinding::new("verbose", false)
            .alias("v")
            .with_help("print extra detail to stderr")])?,
    )
    .with_description(DescriptionTemplate::parse(
        "Run `{{ .Command }} SUBCOMMAND --help` for details on a subcommand.\n\
         Set RUST_LOG=debug to trace flag resolution.",
    )?)
    .subcommand("copy", copy_command()?)?
    .subcommand("echo", echo_command()?)?
    .subcommand("wait", wait_command()?)?
    .subcommand("describe", describe_command()?)?
    .subcommand("resolve", resolve_command()?)?;
    Ok(root.into())
}

fn main() -> ExitCode {
    init_tracing();

    let root = match build_tree() {
        Ok(root) => root,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let options = RunOptions::from_env();
    info!(args = options.args().len(), "starting");
    run(&root, options).into()
}
