//! Flag name derivation.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static UPPER_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Z]+)([a-z]?)").expect("static regex must compile"));
static DASH_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-{2,}").expect("static regex must compile"));

/// Converts a field name into the kebab-case flag name.
///
/// Works for both `snake_case` and `CamelCase` fields. In a run of capitals
/// followed by a lowercase letter, the last capital starts the next word.
///
/// # Examples
///
/// ```
/// use flagtree_core::kebab_case;
///
/// assert_eq!(kebab_case("IntFlag"), "int-flag");
/// assert_eq!(kebab_case("int8_flag"), "int8-flag");
/// assert_eq!(kebab_case("HTTPServer"), "http-server");
/// ```
pub fn kebab_case(field: &str) -> String {
    let split = UPPER_RUN_RE.replace_all(field, |caps: &Captures<'_>| {
        let run = caps[1].to_ascii_lowercase();
        let next = &caps[2];
        if next.is_empty() || run.len() < 2 {
            format!("-{run}{next}")
        } else {
            let (head, last) = run.split_at(run.len() - 1);
            format!("-{head}-{last}{next}")
        }
    });
    let dashed = split.replace('_', "-");
    DASH_RUN_RE
        .replace_all(&dashed, "-")
        .trim_matches('-')
        .to_string()
}
