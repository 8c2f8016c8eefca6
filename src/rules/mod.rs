//! # Keyboard automation rules.
//!
//! - [`HotkeyRule`] / [`HotkeyBuilder`]: key chord → action block
//! - [`HotstringRule`] / [`HotstringBuilder`]: typed abbreviation → replacement
//! - [`codes`]: closed sets of modifier and option codes with wire rendering
//!
//! Rules are immutable values; the registry owns them by `keys`.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod codes;
mod hotkey;
mod hotstring;

pub use hotkey::{ChordKey, HotkeyBuilder, HotkeyRule, ModifierGroups};
pub use hotstring::{HotstringBuilder, HotstringRule};

/// Which keyspace of the registry a rule lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Hotkey,
    Hotstring,
}

impl RuleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleKind::Hotkey => "hotkey",
            RuleKind::Hotstring => "hotstring",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
