//! Positional argument slots and the greedy slot allocator.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::UsageError;

/// A named, ordered destination for non-flag tokens.
///
/// # Examples
///
/// ```
/// use flagtree_core::ArgSlot;
///
/// let src = ArgSlot::required("SOURCE").repeatable().with_help("files to copy");
/// assert_eq!(src.usage(), "SOURCE[, ...]");
///
/// let dest = ArgSlot::optional("DEST");
/// assert_eq!(dest.usage(), "[DEST]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgSlot {
    /// Name of this slot, unique within its list.
    pub name: String,
    /// Must receive at least one token.
    pub required: bool,
    /// May receive more than one token.
    pub repeatable: bool,
    /// Help text for this slot.
    #[serde(default)]
    pub help: String,
}

impl ArgSlot {
    pub fn required(name: &str) -> Self {
        Self {
            name: name.to_string(),
            required: true,
            repeatable: false,
            help: String::new(),
        }
    }

    pub fn optional(name: &str) -> Self {
        Self {
            name: name.to_string(),
            required: false,
            repeatable: false,
            help: String::new(),
        }
    }

    /// Marks as accepting multiple tokens.
    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    pub fn with_help(mut self, help: &str) -> Self {
        self.help = help.to_string();
        self
    }

    /// Usage fragment: `NAME`, `NAME[, ...]`, wrapped in brackets if optional.
    pub fn usage(&self) -> String {
        let mut usage = self.name.clone();
        if self.repeatable {
            usage.push_str("[, ...]");
        }
        if !self.required {
            usage = format!("[{usage}]");
        }
        usage
    }
}

/// Tokens assigned to each positional slot, in slot order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Positionals {
    assigned: Vec<(String, Vec<String>)>,
}

impl Positionals {
    /// Tokens assigned to `name`, in consumption order. Empty for unknown names.
    pub fn get(&self, name: &str) -> &[String] {
        self.assigned
            .iter()
            .find(|(slot, _)| slot == name)
            .map(|(_, tokens)| tokens.as_slice())
            .unwrap_or(&[])
    }

    /// First token assigned to `name`.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).first().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.assigned
            .iter()
            .map(|(name, tokens)| (name.as_str(), tokens.as_slice()))
    }

    /// Total number of assigned tokens across all slots.
    pub fn token_count(&self) -> usize {
        self.assigned.iter().map(|(_, tokens)| tokens.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.token_count() == 0
    }
}

/// Result of allocating tokens to slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub positionals: Positionals,
    /// Tokens that no slot could take, in original order.
    pub leftover: Vec<String>,
}

/// Assigns `tokens` to `slots`, giving required slots priority.
///
/// While there are more tokens than outstanding required slots, the current
/// slot takes the next token; a repeatable slot stays current and keeps
/// absorbing until only enough tokens remain to cover the required slots
/// after it. Once tokens become scarce, the allocator walks forward handing
/// exactly one token to each unsatisfied required slot and skipping the rest.
///
/// # Errors
///
/// [`UsageError::NotEnoughArguments`] if any required slot ends up empty; no
/// partial assignment is returned in that case.
///
/// # Examples
///
/// ```
/// use flagtree_core::{allocate, ArgSlot};
///
/// let slots = [
///     ArgSlot::required("P1"),
///     ArgSlot::optional("P2"),
///     ArgSlot::required("P3"),
/// ];
/// let result = allocate(&slots, vec!["a".into(), "b".into()]).unwrap();
/// assert_eq!(result.positionals.get("P1"), ["a"]);
/// assert!(result.positionals.get("P2").is_empty());
/// assert_eq!(result.positionals.get("P3"), ["b"]);
/// ```
pub fn allocate(slots: &[ArgSlot], tokens: Vec<String>) -> Result<Allocation, UsageError> {
    let mut tokens: VecDeque<String> = tokens.into();
    let mut assigned: Vec<Vec<String>> = vec![Vec::new(); slots.len()];
    let mut outstanding = slots.iter().filter(|slot| slot.required).count();
    let mut cursor = 0;
    let mut current_taken = false;

    while cursor < slots.len() && !tokens.is_empty() {
        if tokens.len() <= outstanding {
            if current_taken {
                cursor += 1;
                current_taken = false;
                continue;
            }
            if slots[cursor].required {
                if let Some(token) = tokens.pop_front() {
                    assigned[cursor].push(token);
                    outstanding -= 1;
                }
            }
            cursor += 1;
            continue;
        }

        let Some(token) = tokens.pop_front() else {
            break;
        };
        assigned[cursor].push(token);
        if !current_taken && slots[cursor].required {
            outstanding -= 1;
        }
        current_taken = true;
        if !slots[cursor].repeatable {
            cursor += 1;
            current_taken = false;
        }
    }

    if outstanding > 0 {
        debug!(outstanding, "required positional slots left empty");
        return Err(UsageError::NotEnoughArguments);
    }

    let positionals = Positionals {
        assigned: slots
            .iter()
            .map(|slot| slot.name.clone())
            .zip(assigned)
            .collect(),
    };
    debug!(
        assigned = positionals.token_count(),
        leftover = tokens.len(),
        "allocated positional arguments"
    );

    Ok(Allocation {
        positionals,
        leftover: tokens.into(),
    })
}
