//! Help rendering.

use std::fmt;
use std::str::FromStr;

use flagtree_core::HelpDescriptor;

/// Width of the name column in the flag, argument and subcommand lists.
const GUTTER: usize = 12;
const INDENT: &str = "    ";

/// Supported help output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HelpFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

impl FromStr for HelpFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(HelpFormat::Text),
            "json" => Ok(HelpFormat::Json),
            "yaml" | "yml" => Ok(HelpFormat::Yaml),
            other => Err(format!("unknown help format: {other}")),
        }
    }
}

impl fmt::Display for HelpFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HelpFormat::Text => "text",
            HelpFormat::Json => "json",
            HelpFormat::Yaml => "yaml",
        })
    }
}

/// Formats a help descriptor in the requested output format.
pub fn render_help(help: &HelpDescriptor, format: HelpFormat) -> Result<String, String> {
    match format {
        HelpFormat::Text => Ok(help_to_text(help)),
        HelpFormat::Json => serde_json::to_string_pretty(help)
            .map(|mut out| {
                out.push('\n');
                out
            })
            .map_err(|e| format!("JSON serialization failed: {e}")),
        HelpFormat::Yaml => {
            serde_yaml::to_string(help).map_err(|e| format!("YAML serialization failed: {e}"))
        }
    }
}

fn push_entry(out: &mut String, name: &str, help: &str) {
    out.push_str(INDENT);
    if help.is_empty() {
        out.push_str(name);
        out.push('\n');
        return;
    }

    if name.len() < GUTTER {
        out.push_str(&format!("{name:<width$}", width = GUTTER));
    } else {
        out.push_str(name);
        out.push('\n');
        out.push_str(&" ".repeat(INDENT.len() + GUTTER));
    }

    let mut lines = help.lines();
    if let Some(first) = lines.next() {
        out.push_str(first);
    }
    out.push('\n');
    for line in lines {
        out.push_str(&" ".repeat(INDENT.len() + GUTTER));
        out.push_str(line);
        out.push('\n');
    }
}

fn help_to_text(help: &HelpDescriptor) -> String {
    let mut out = String::new();

    out.push_str(&help.invocation);
    if !help.short_description.is_empty() {
        out.push_str(&format!(" -- {}", help.short_description));
    }
    out.push_str("\n\nUsage:\n\n");
    out.push_str(&format!("{INDENT}{}\n", help.usage_line()));

    if let Some(description) = help.rendered_description() {
        out.push_str("\nDescription:\n\n");
        for line in description.lines() {
            out.push_str(&format!("{INDENT}{line}\n"));
        }
    }

    if !help.flags.is_empty() {
        out.push_str("\nFlags:\n\n");
        for flag in &help.flags {
            let names = std::iter::once(flag.name.as_str())
                .chain(flag.aliases.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join(", ");
            push_entry(&mut out, &names, &flag.help);
        }
    }

    if !help.args.is_empty() {
        out.push_str("\nArgs:\n\n");
        for arg in &help.args {
            push_entry(&mut out, &arg.name, &arg.help);
        }
    }

    if !help.subcommands.is_empty() {
        out.push_str("\nSubcommands:\n\n");
        for subcommand in &help.subcommands {
            push_entry(&mut out, &subcommand.name, &subcommand.short_description);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use flagtree_core::{ArgSlot, DescriptionTemplate, FlagBinding, FlagSet};

    use super::*;

    fn sample() -> HelpDescriptor {
        let flags = FlagSet::new([
            FlagBinding::new("verbose", false)
                .alias("v")
                .with_help("print more"),
            FlagBinding::new("x", 0u8),
        ])
        .unwrap();
        HelpDescriptor::new("tool copy", "copy files")
            .with_description(Some(
                DescriptionTemplate::parse("Use {{ .Command }} to copy.\nSecond line.").unwrap(),
            ))
            .with_flags(&flags)
            .with_args(&[
                ArgSlot::required("SOURCE")
                    .repeatable()
                    .with_help("files to copy\nat least one"),
                ArgSlot::required("DEST"),
            ])
    }

    #[test]
    fn test_text_layout() {
        let text = render_help(&sample(), HelpFormat::Text).unwrap();
        let expected = "\
tool copy -- copy files

Usage:

    tool copy --verbose=false -x=0 SOURCE[, ...] DEST

Description:

    Use tool copy to copy.
    Second line.

Flags:

    --verbose, -v
                print more
    -x

Args:

    SOURCE      files to copy
                at least one
    DEST
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_subcommand_section() {
        let help = HelpDescriptor::new("tool", "")
            .with_subcommand("copy", "copy files")
            .with_subcommand("a-very-long-name", "long");
        let text = render_help(&help, HelpFormat::Text).unwrap();
        assert!(text.starts_with("tool\n\nUsage:\n\n    tool\n"));
        assert!(text.contains("\nSubcommands:\n\n    a-very-long-name\n                long\n    copy        copy files\n"));
    }

    #[test]
    fn test_structured_formats() {
        let json = render_help(&sample(), HelpFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["invocation"], "tool copy");
        assert_eq!(value["args"][0]["usage"], "SOURCE[, ...]");

        let yaml = render_help(&sample(), HelpFormat::Yaml).unwrap();
        assert!(yaml.contains("invocation: tool copy"));
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("JSON".parse::<HelpFormat>(), Ok(HelpFormat::Json));
        assert_eq!("yml".parse::<HelpFormat>(), Ok(HelpFormat::Yaml));
        assert!("xml".parse::<HelpFormat>().is_err());
    }
}
