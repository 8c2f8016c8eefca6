//! # Hotkey rules.
//!
//! A [`HotkeyRule`] binds a key chord to an action body. Its modifiers are kept
//! in three ordered groups ([`ModifierGroups`]): prefix modifiers, chorded keys,
//! and the release marker. Prefix and chord groups accumulate; the release
//! group holds at most one value.
//!
//! On the wire the groups travel as an array of exactly three strings:
//! ```text
//! {"keys": "a", "action": "Send(\"hi\")", "modifiers": ["~", "<^+", "UP"]}
//! ```

use serde::{Deserialize, Serialize};

use crate::error::RuleError;
use crate::rules::RuleKind;
use crate::rules::codes::{HotkeyModifier, Side, Slot};

/// One chorded modifier, optionally restricted to the left or right key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChordKey {
    pub side: Option<Side>,
    pub modifier: HotkeyModifier,
}

/// The three modifier slots of a hotkey.
///
/// ### Invariants
/// - `prefix` only holds [`Slot::Prefix`] modifiers
/// - `chord` only holds [`Slot::Chord`] modifiers
/// - release is a single flag (slot (c) holds at most one value)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[String; 3]", into = "[String; 3]")]
pub struct ModifierGroups {
    prefix: Vec<HotkeyModifier>,
    chord: Vec<ChordKey>,
    release: bool,
}

impl ModifierGroups {
    pub fn prefix(&self) -> &[HotkeyModifier] {
        &self.prefix
    }

    pub fn chord(&self) -> &[ChordKey] {
        &self.chord
    }

    pub fn on_release(&self) -> bool {
        self.release
    }

    /// Renders slot (a).
    pub fn prefix_text(&self) -> String {
        self.prefix.iter().map(|m| m.code()).collect()
    }

    /// Renders slot (b).
    pub fn chord_text(&self) -> String {
        let mut out = String::new();
        for key in &self.chord {
            if let Some(side) = key.side {
                out.push_str(side.code());
            }
            out.push_str(key.modifier.code());
        }
        out
    }

    /// Renders slot (c).
    pub fn release_text(&self) -> &'static str {
        if self.release {
            HotkeyModifier::Up.code()
        } else {
            ""
        }
    }

    fn parse_prefix(text: &str) -> Result<Vec<HotkeyModifier>, String> {
        text.chars()
            .map(|c| match HotkeyModifier::from_char(c) {
                Some(m) if m.slot() == Slot::Prefix => Ok(m),
                _ => Err(format!("invalid prefix modifier {c:?}")),
            })
            .collect()
    }

    fn parse_chord(text: &str) -> Result<Vec<ChordKey>, String> {
        let mut keys = Vec::new();
        let mut side = None;
        for c in text.chars() {
            if let Some(s) = Side::from_char(c) {
                if side.is_some() {
                    return Err(format!("repeated side marker in {text:?}"));
                }
                side = Some(s);
                continue;
            }
            match HotkeyModifier::from_char(c) {
                Some(modifier) if modifier.slot() == Slot::Chord => {
                    keys.push(ChordKey {
                        side: side.take(),
                        modifier,
                    });
                }
                _ => return Err(format!("invalid chord modifier {c:?}")),
            }
        }
        if side.is_some() {
            return Err(format!("dangling side marker in {text:?}"));
        }
        Ok(keys)
    }
}

impl TryFrom<[String; 3]> for ModifierGroups {
    type Error = String;

    fn try_from([prefix, chord, release]: [String; 3]) -> Result<Self, Self::Error> {
        let release = match release.as_str() {
            "" => false,
            r if r == HotkeyModifier::Up.code() => true,
            other => return Err(format!("invalid release marker {other:?}")),
        };
        Ok(Self {
            prefix: Self::parse_prefix(&prefix)?,
            chord: Self::parse_chord(&chord)?,
            release,
        })
    }
}

impl From<ModifierGroups> for [String; 3] {
    fn from(groups: ModifierGroups) -> Self {
        [
            groups.prefix_text(),
            groups.chord_text(),
            groups.release_text().to_string(),
        ]
    }
}

/// A key chord bound to an action body.
///
/// Immutable once constructed: build one with [`HotkeyBuilder`] or parse it
/// with [`HotkeyRule::from_json`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HotkeyRule {
    keys: String,
    action: String,
    modifiers: ModifierGroups,
}

impl HotkeyRule {
    pub fn keys(&self) -> &str {
        &self.keys
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn modifiers(&self) -> &ModifierGroups {
        &self.modifiers
    }

    /// Parses and validates a serialized hotkey.
    ///
    /// Any schema mismatch (missing field, unknown field, bad modifier code,
    /// wrong slot count, empty keys) becomes [`RuleError::Serialization`].
    pub fn from_json(json: &str) -> Result<Self, RuleError> {
        let rule: HotkeyRule = serde_json::from_str(json)
            .map_err(|e| RuleError::serialization(RuleKind::Hotkey, e))?;
        rule.validated()
    }

    fn validated(self) -> Result<Self, RuleError> {
        if self.keys.is_empty() {
            return Err(RuleError::serialization(
                RuleKind::Hotkey,
                "keys must not be empty",
            ));
        }
        Ok(self)
    }
}

/// Builder for [`HotkeyRule`] from front-end form input.
///
/// ## Example
/// ```rust
/// use keyvisor::{HotkeyBuilder, HotkeyModifier, Side};
///
/// let rule = HotkeyBuilder::new("a", "Send(\"hi\")")
///     .modifier(HotkeyModifier::NoBlock)
///     .sided(Side::Left, HotkeyModifier::Ctrl)
///     .modifier(HotkeyModifier::Up)
///     .build()
///     .unwrap();
///
/// assert_eq!(rule.modifiers().prefix_text(), "~");
/// assert_eq!(rule.modifiers().chord_text(), "<^");
/// assert_eq!(rule.modifiers().release_text(), "UP");
/// ```
#[derive(Debug, Clone)]
pub struct HotkeyBuilder {
    keys: String,
    action: String,
    groups: ModifierGroups,
    invalid: Option<String>,
}

impl HotkeyBuilder {
    pub fn new(keys: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            keys: keys.into(),
            action: action.into(),
            groups: ModifierGroups::default(),
            invalid: None,
        }
    }

    /// Adds a modifier to the slot it belongs to.
    ///
    /// Prefix and chord modifiers accumulate; [`HotkeyModifier::Up`] sets the
    /// release slot (adding it twice leaves a single marker).
    pub fn modifier(mut self, modifier: HotkeyModifier) -> Self {
        match modifier.slot() {
            Slot::Prefix => self.groups.prefix.push(modifier),
            Slot::Chord => self.groups.chord.push(ChordKey {
                side: None,
                modifier,
            }),
            Slot::Release => self.groups.release = true,
        }
        self
    }

    /// Adds a chorded modifier restricted to one side of the keyboard.
    ///
    /// Fails at [`build`](Self::build) if `modifier` has no left/right variant.
    pub fn sided(mut self, side: Side, modifier: HotkeyModifier) -> Self {
        if modifier.is_sided() {
            self.groups.chord.push(ChordKey {
                side: Some(side),
                modifier,
            });
        } else if self.invalid.is_none() {
            self.invalid = Some(format!("{modifier:?} has no left/right variant"));
        }
        self
    }

    pub fn build(self) -> Result<HotkeyRule, RuleError> {
        if let Some(reason) = self.invalid {
            return Err(RuleError::serialization(RuleKind::Hotkey, reason));
        }
        HotkeyRule {
            keys: self.keys,
            action: self.action,
            modifiers: self.groups,
        }
        .validated()
    }
}
