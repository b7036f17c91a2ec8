//! Structured help descriptors.
//!
//! A [`HelpDescriptor`] is everything a renderer needs to print help for one
//! node of a command tree. It is built from the node's declarations alone, so
//! it is available whether or not resolution succeeded.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};

use crate::destination::Shape;
use crate::error::BuildError;
use crate::flag::{FlagBinding, FlagSet};
use crate::positional::ArgSlot;

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(.*?)\}\}").expect("static regex must compile"));

const COMMAND_PLACEHOLDER: &str = ".Command";

/// Free-form description text in which `{{ .Command }}` expands to the
/// invocation name.
///
/// # Examples
///
/// ```
/// use flagtree_core::DescriptionTemplate;
///
/// let template = DescriptionTemplate::parse("Run `{{ .Command }} --help` for details.").unwrap();
/// assert_eq!(template.render("tool sub"), "Run `tool sub --help` for details.");
///
/// assert!(DescriptionTemplate::parse("{{ .Flags }}").is_err());
/// assert!(DescriptionTemplate::parse("{{ .Command").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DescriptionTemplate {
    source: String,
}

impl DescriptionTemplate {
    /// # Errors
    ///
    /// [`BuildError::InvalidTemplate`] for any placeholder other than
    /// `.Command`, or an unclosed `{{`.
    pub fn parse(source: impl Into<String>) -> Result<Self, BuildError> {
        let source = source.into();
        for caps in PLACEHOLDER_RE.captures_iter(&source) {
            if caps[1].trim() != COMMAND_PLACEHOLDER {
                return Err(BuildError::InvalidTemplate(format!(
                    "unknown placeholder {}",
                    &caps[0]
                )));
            }
        }
        if PLACEHOLDER_RE.replace_all(&source, "").contains("{{") {
            return Err(BuildError::InvalidTemplate(
                "unclosed placeholder".to_string(),
            ));
        }
        Ok(Self { source })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn render(&self, command: &str) -> String {
        PLACEHOLDER_RE
            .replace_all(&self.source, NoExpand(command))
            .into_owned()
    }
}

impl FromStr for DescriptionTemplate {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DescriptionTemplate {
    type Error = BuildError;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Self::parse(source)
    }
}

impl From<DescriptionTemplate> for String {
    fn from(template: DescriptionTemplate) -> Self {
        template.source
    }
}

impl fmt::Display for DescriptionTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Help entry for one flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagHelp {
    /// Display name, e.g. `--name`.
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    pub usage: String,
    #[serde(default)]
    pub help: String,
    pub kind: String,
    pub shape: Shape,
}

impl From<&FlagBinding> for FlagHelp {
    fn from(binding: &FlagBinding) -> Self {
        Self {
            name: binding.display_name(),
            aliases: binding.display_aliases(),
            usage: binding.usage(),
            help: binding.help().to_string(),
            kind: binding.kind().to_string(),
            shape: binding.shape(),
        }
    }
}

/// Help entry for one positional slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgHelp {
    pub name: String,
    pub usage: String,
    #[serde(default)]
    pub help: String,
    pub required: bool,
    pub repeatable: bool,
}

impl From<&ArgSlot> for ArgHelp {
    fn from(slot: &ArgSlot) -> Self {
        Self {
            name: slot.name.clone(),
            usage: slot.usage(),
            help: slot.help.clone(),
            required: slot.required,
            repeatable: slot.repeatable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubcommandHelp {
    pub name: String,
    #[serde(default)]
    pub short_description: String,
}

/// Help for one node of a command tree.
///
/// # Examples
///
/// ```
/// use flagtree_core::{ArgSlot, FlagBinding, FlagSet, HelpDescriptor};
///
/// let flags = FlagSet::new([FlagBinding::new("force", false).alias("f")]).unwrap();
/// let help = HelpDescriptor::new("tool rm", "remove files")
///     .with_flags(&flags)
///     .with_args(&[ArgSlot::required("PATH").repeatable()]);
///
/// assert_eq!(help.usage_line(), "tool rm --force=false PATH[, ...]");
/// assert_eq!(help.flags[0].aliases, vec!["-f"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpDescriptor {
    /// Full invocation, e.g. `tool remote add`.
    pub invocation: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub short_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<DescriptionTemplate>,
    #[serde(default)]
    pub flags: Vec<FlagHelp>,
    #[serde(default)]
    pub args: Vec<ArgHelp>,
    /// Sorted by name.
    #[serde(default)]
    pub subcommands: Vec<SubcommandHelp>,
}

impl HelpDescriptor {
    pub fn new(invocation: impl Into<String>, short_description: impl Into<String>) -> Self {
        Self {
            invocation: invocation.into(),
            short_description: short_description.into(),
            description: None,
            flags: Vec::new(),
            args: Vec::new(),
            subcommands: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: Option<DescriptionTemplate>) -> Self {
        self.description = description;
        self
    }

    pub fn with_flags(mut self, flags: &FlagSet) -> Self {
        self.append_flags(flags);
        self
    }

    pub fn with_args(mut self, args: &[ArgSlot]) -> Self {
        self.args.extend(args.iter().map(ArgHelp::from));
        self
    }

    /// Adds a subcommand entry, keeping the list sorted by name.
    pub fn with_subcommand(
        mut self,
        name: impl Into<String>,
        short_description: impl Into<String>,
    ) -> Self {
        let entry = SubcommandHelp {
            name: name.into(),
            short_description: short_description.into(),
        };
        let position = self
            .subcommands
            .partition_point(|existing| existing.name < entry.name);
        self.subcommands.insert(position, entry);
        self
    }

    /// Appends flags after the ones already listed.
    pub fn append_flags(&mut self, flags: &FlagSet) {
        self.flags
            .extend(flags.bindings().iter().map(FlagHelp::from));
    }

    /// The description with `{{ .Command }}` expanded to the invocation.
    pub fn rendered_description(&self) -> Option<String> {
        self.description
            .as_ref()
            .map(|template| template.render(&self.invocation))
    }

    /// Invocation followed by every flag and positional usage fragment.
    pub fn usage_line(&self) -> String {
        let mut line = self.invocation.clone();
        for usage in self
            .flags
            .iter()
            .map(|flag| flag.usage.as_str())
            .chain(self.args.iter().map(|arg| arg.usage.as_str()))
        {
            line.push(' ');
            line.push_str(usage);
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_tolerates_whitespace() {
        let template = DescriptionTemplate::parse("{{.Command}} and {{   .Command }}").unwrap();
        assert_eq!(template.render("x"), "x and x");
    }

    #[test]
    fn test_template_renders_dollar_literally() {
        let template = DescriptionTemplate::parse("see {{ .Command }}").unwrap();
        assert_eq!(template.render("$1 cmd"), "see $1 cmd");
    }

    #[test]
    fn test_template_rejects_unknown_placeholder() {
        assert_eq!(
            DescriptionTemplate::parse("{{ .Args }}"),
            Err(BuildError::InvalidTemplate(
                "unknown placeholder {{ .Args }}".to_string()
            ))
        );
    }

    #[test]
    fn test_template_serde_uses_source_text() {
        let template = DescriptionTemplate::parse("{{ .Command }} does things").unwrap();
        let json = serde_json::to_string(&template).unwrap();
        assert_eq!(json, r#""{{ .Command }} does things""#);

        let back: DescriptionTemplate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, template);

        let bad: Result<DescriptionTemplate, _> = serde_json::from_str(r#""{{ .Nope }}""#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_subcommands_are_sorted() {
        let help = HelpDescriptor::new("tool", "")
            .with_subcommand("zeta", "last")
            .with_subcommand("alpha", "first")
            .with_subcommand("mid", "");
        let names: Vec<&str> = help.subcommands.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_append_flags_keeps_order() {
        let own = FlagSet::new([FlagBinding::new("f", false)]).unwrap();
        let parent = FlagSet::new([FlagBinding::new("i", 0i32)]).unwrap();

        let mut help = HelpDescriptor::new("tool sub", "")
            .with_flags(&own)
            .with_args(&[ArgSlot::required("arg1")]);
        help.append_flags(&parent);

        let names: Vec<&str> = help.flags.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["-f", "-i"]);
        assert_eq!(help.usage_line(), "tool sub -f=false -i=0 arg1");
    }

    #[test]
    fn test_descriptor_serializes_to_json() {
        let flags = FlagSet::new([FlagBinding::new("Names", Vec::<String>::new())]).unwrap();
        let help = HelpDescriptor::new("tool", "does things")
            .with_description(Some(DescriptionTemplate::parse("{{ .Command }}!").unwrap()))
            .with_flags(&flags);
        let json: serde_json::Value = serde_json::to_value(&help).unwrap();
        assert_eq!(json["invocation"], "tool");
        assert_eq!(json["description"], "{{ .Command }}!");
        assert_eq!(json["flags"][0]["kind"], "string");
        assert_eq!(json["flags"][0]["shape"], "repeated");
        assert_eq!(help.rendered_description().as_deref(), Some("tool!"));
    }
}
