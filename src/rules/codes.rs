//! # Option and modifier codes.
//!
//! Closed sets of the codes the interpreter understands, each with an explicit
//! rendering to its wire text ([`HotkeyModifier::code`], [`HotstringOption::code`])
//! and a human-readable catalogue entry for front ends ([`Describe`]).
//!
//! ## Hotkey modifier slots
//! ```text
//!  slot (a) prefix     slot (b) chord            slot (c) release
//!  * ~ $               # ! ^ +  (optionally      UP
//!                      prefixed by < or >)
//! ```

use serde::{Deserialize, Serialize};

/// Catalogue entry for a code: display name and description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Describe {
    pub code: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// Slot a hotkey modifier occupies inside [`ModifierGroups`](crate::rules::ModifierGroups).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Prefix modifiers that change how the trigger is hooked.
    Prefix,
    /// Chorded modifier keys.
    Chord,
    /// Key-release marker.
    Release,
}

/// Hotkey modifier codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotkeyModifier {
    Win,
    Alt,
    Ctrl,
    Shift,
    /// Fire even if extra modifiers are held.
    Wildcard,
    /// Don't block the native function of the key.
    NoBlock,
    /// Force the keyboard hook (action may trigger other hotkeys).
    UseHook,
    /// Fire on key release.
    Up,
}

impl HotkeyModifier {
    pub const ALL: [HotkeyModifier; 8] = [
        HotkeyModifier::Win,
        HotkeyModifier::Alt,
        HotkeyModifier::Ctrl,
        HotkeyModifier::Shift,
        HotkeyModifier::Wildcard,
        HotkeyModifier::NoBlock,
        HotkeyModifier::UseHook,
        HotkeyModifier::Up,
    ];

    /// Wire text of this modifier.
    pub fn code(self) -> &'static str {
        match self {
            HotkeyModifier::Win => "#",
            HotkeyModifier::Alt => "!",
            HotkeyModifier::Ctrl => "^",
            HotkeyModifier::Shift => "+",
            HotkeyModifier::Wildcard => "*",
            HotkeyModifier::NoBlock => "~",
            HotkeyModifier::UseHook => "$",
            HotkeyModifier::Up => "UP",
        }
    }

    /// Which of the three modifier slots this code belongs to.
    pub fn slot(self) -> Slot {
        match self {
            HotkeyModifier::Win
            | HotkeyModifier::Alt
            | HotkeyModifier::Ctrl
            | HotkeyModifier::Shift => Slot::Chord,
            HotkeyModifier::Wildcard | HotkeyModifier::NoBlock | HotkeyModifier::UseHook => {
                Slot::Prefix
            }
            HotkeyModifier::Up => Slot::Release,
        }
    }

    /// True if the modifier has distinct left/right keys.
    #[inline]
    pub fn is_sided(self) -> bool {
        self.slot() == Slot::Chord
    }

    /// Parses a single-character prefix or chord code.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '#' => Some(HotkeyModifier::Win),
            '!' => Some(HotkeyModifier::Alt),
            '^' => Some(HotkeyModifier::Ctrl),
            '+' => Some(HotkeyModifier::Shift),
            '*' => Some(HotkeyModifier::Wildcard),
            '~' => Some(HotkeyModifier::NoBlock),
            '$' => Some(HotkeyModifier::UseHook),
            _ => None,
        }
    }

    pub fn describe(self) -> Describe {
        let (name, description) = match self {
            HotkeyModifier::Win => ("Win", "Windows key"),
            HotkeyModifier::Alt => ("Alt", "Alt key"),
            HotkeyModifier::Ctrl => ("Ctrl", "Ctrl key"),
            HotkeyModifier::Shift => ("Shift", "Shift key"),
            HotkeyModifier::Wildcard => (
                "Wildcard",
                "Fire the hotkey even if other keys are pressed",
            ),
            HotkeyModifier::NoBlock => (
                "No Block",
                "Don't block the pressed keys from their original function",
            ),
            HotkeyModifier::UseHook => (
                "Use Hook",
                "Enable this if the resulting action may activate a hotkey or hotstring",
            ),
            HotkeyModifier::Up => ("On Release", "Activate when the key is released"),
        };
        Describe {
            code: self.code(),
            name,
            description,
        }
    }
}

/// Left/right qualifier for a chorded modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn code(self) -> &'static str {
        match self {
            Side::Left => "<",
            Side::Right => ">",
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '<' => Some(Side::Left),
            '>' => Some(Side::Right),
            _ => None,
        }
    }
}

/// Hotstring option codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HotstringOption {
    /// Fire immediately after the last character, without an end char.
    #[serde(rename = "*")]
    Immediate,
    /// Fire even inside a word.
    #[serde(rename = "?")]
    InWord,
    /// Keep the typed abbreviation.
    #[serde(rename = "B0")]
    NoBackspace,
    #[serde(rename = "C")]
    CaseSensitive,
    /// Drop the end character.
    #[serde(rename = "O")]
    NoEndChar,
    /// Send the replacement literally.
    #[serde(rename = "R")]
    Raw,
    /// Stay active while the script is suspended.
    #[serde(rename = "S")]
    NoSuspend,
}

impl HotstringOption {
    pub const ALL: [HotstringOption; 7] = [
        HotstringOption::Immediate,
        HotstringOption::InWord,
        HotstringOption::NoBackspace,
        HotstringOption::CaseSensitive,
        HotstringOption::NoEndChar,
        HotstringOption::Raw,
        HotstringOption::NoSuspend,
    ];

    /// Wire text of this option.
    pub fn code(self) -> &'static str {
        match self {
            HotstringOption::Immediate => "*",
            HotstringOption::InWord => "?",
            HotstringOption::NoBackspace => "B0",
            HotstringOption::CaseSensitive => "C",
            HotstringOption::NoEndChar => "O",
            HotstringOption::Raw => "R",
            HotstringOption::NoSuspend => "S",
        }
    }

    pub fn describe(self) -> Describe {
        let (name, description) = match self {
            HotstringOption::Immediate => (
                "Immediate",
                "Fire the hotstring immediately after typing the last character",
            ),
            HotstringOption::InWord => (
                "In Word",
                "Fire the hotstring even if it is in the middle of a word",
            ),
            HotstringOption::NoBackspace => (
                "No Backspace",
                "Don't erase the characters when the hotstring is fired",
            ),
            HotstringOption::CaseSensitive => {
                ("Case Sensitive", "Only run when the case matches exactly")
            }
            HotstringOption::NoEndChar => (
                "No End Char",
                "Don't keep the end character when the hotstring is fired",
            ),
            HotstringOption::Raw => ("Raw", "Don't interpret the hotstring"),
            HotstringOption::NoSuspend => (
                "No Suspend",
                "Allow this hotstring to run even if the script is suspended",
            ),
        };
        Describe {
            code: self.code(),
            name,
            description,
        }
    }
}
