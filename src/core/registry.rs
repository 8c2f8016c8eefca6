//! # Rule registry - keyed collections of hotkeys and hotstrings.
//!
//! Two independent keyspaces, each an insertion-ordered map from `keys` to
//! rule. Order is what makes script compilation deterministic.
//!
//! ## Rules
//! - No two rules share `keys` within one keyspace
//! - Replacing requires `overwrite = true`; the entry keeps its position
//! - Removing an absent key is a no-op (reported as success)
//! - `list_*` returns an owned snapshot, never a live view

use indexmap::IndexMap;

use crate::error::RuleError;
use crate::rules::{HotkeyRule, HotstringRule, RuleKind};

/// In-memory store of all rules.
#[derive(Debug, Default, Clone)]
pub struct RuleRegistry {
    hotkeys: IndexMap<String, HotkeyRule>,
    hotstrings: IndexMap<String, HotstringRule>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a hotkey.
    ///
    /// Fails with [`RuleError::Conflict`] if `rule.keys()` is taken and
    /// `overwrite` is false; the existing rule is left unchanged.
    pub fn upsert_hotkey(&mut self, rule: HotkeyRule, overwrite: bool) -> Result<(), RuleError> {
        upsert(&mut self.hotkeys, RuleKind::Hotkey, rule.keys().to_string(), rule, overwrite)
    }

    /// Inserts or replaces a hotstring. Same contract as [`upsert_hotkey`](Self::upsert_hotkey).
    pub fn upsert_hotstring(
        &mut self,
        rule: HotstringRule,
        overwrite: bool,
    ) -> Result<(), RuleError> {
        upsert(
            &mut self.hotstrings,
            RuleKind::Hotstring,
            rule.keys().to_string(),
            rule,
            overwrite,
        )
    }

    /// Replaces an existing hotkey; fails with [`RuleError::Missing`] if none is bound.
    pub fn replace_hotkey(&mut self, rule: HotkeyRule) -> Result<(), RuleError> {
        replace(&mut self.hotkeys, RuleKind::Hotkey, rule.keys().to_string(), rule)
    }

    /// Replaces an existing hotstring; fails with [`RuleError::Missing`] if none is bound.
    pub fn replace_hotstring(&mut self, rule: HotstringRule) -> Result<(), RuleError> {
        replace(&mut self.hotstrings, RuleKind::Hotstring, rule.keys().to_string(), rule)
    }

    /// Removes the rule at `keys`. Returns whether something was removed.
    pub fn remove(&mut self, kind: RuleKind, keys: &str) -> bool {
        match kind {
            RuleKind::Hotkey => self.hotkeys.shift_remove(keys).is_some(),
            RuleKind::Hotstring => self.hotstrings.shift_remove(keys).is_some(),
        }
    }

    /// Snapshot of all hotkeys in insertion order.
    pub fn list_hotkeys(&self) -> Vec<HotkeyRule> {
        self.hotkeys.values().cloned().collect()
    }

    /// Snapshot of all hotstrings in insertion order.
    pub fn list_hotstrings(&self) -> Vec<HotstringRule> {
        self.hotstrings.values().cloned().collect()
    }

    pub fn hotkey(&self, keys: &str) -> Option<&HotkeyRule> {
        self.hotkeys.get(keys)
    }

    pub fn hotstring(&self, keys: &str) -> Option<&HotstringRule> {
        self.hotstrings.get(keys)
    }

    pub(crate) fn hotkeys(&self) -> impl Iterator<Item = &HotkeyRule> {
        self.hotkeys.values()
    }

    pub(crate) fn hotstrings(&self) -> impl Iterator<Item = &HotstringRule> {
        self.hotstrings.values()
    }

    pub fn len(&self, kind: RuleKind) -> usize {
        match kind {
            RuleKind::Hotkey => self.hotkeys.len(),
            RuleKind::Hotstring => self.hotstrings.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hotkeys.is_empty() && self.hotstrings.is_empty()
    }
}

fn upsert<R>(
    map: &mut IndexMap<String, R>,
    kind: RuleKind,
    keys: String,
    rule: R,
    overwrite: bool,
) -> Result<(), RuleError> {
    if !overwrite && map.contains_key(&keys) {
        return Err(RuleError::Conflict { kind, keys });
    }
    map.insert(keys, rule);
    Ok(())
}

fn replace<R>(
    map: &mut IndexMap<String, R>,
    kind: RuleKind,
    keys: String,
    rule: R,
) -> Result<(), RuleError> {
    match map.get_mut(&keys) {
        Some(slot) => {
            *slot = rule;
            Ok(())
        }
        None => Err(RuleError::Missing { kind, keys }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::codes::{HotkeyModifier, HotstringOption};
    use crate::rules::{HotkeyBuilder, HotstringBuilder};

    fn hotkey(keys: &str, action: &str) -> HotkeyRule {
        HotkeyBuilder::new(keys, action)
            .modifier(HotkeyModifier::Ctrl)
            .build()
            .unwrap()
    }

    fn hotstring(keys: &str, action: &str) -> HotstringRule {
        HotstringBuilder::new(keys, action)
            .option(HotstringOption::Immediate)
            .build()
            .unwrap()
    }

    #[test]
    fn test_overwrite_twice_keeps_single_latest_entry() {
        let mut reg = RuleRegistry::new();
        reg.upsert_hotkey(hotkey("a", "one"), true).unwrap();
        reg.upsert_hotkey(hotkey("a", "two"), true).unwrap();

        let all = reg.list_hotkeys();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].action(), "two");
    }

    #[test]
    fn test_conflict_leaves_prior_value() {
        let mut reg = RuleRegistry::new();
        reg.upsert_hotkey(hotkey("a", "one"), false).unwrap();

        let err = reg.upsert_hotkey(hotkey("a", "two"), false).unwrap_err();
        assert_eq!(
            err,
            RuleError::Conflict {
                kind: RuleKind::Hotkey,
                keys: "a".into()
            }
        );
        assert_eq!(reg.hotkey("a").unwrap().action(), "one");
    }

    #[test]
    fn test_keyspaces_are_independent() {
        let mut reg = RuleRegistry::new();
        reg.upsert_hotkey(hotkey("x", "k"), false).unwrap();
        reg.upsert_hotstring(hotstring("x", "s"), false).unwrap();
        assert_eq!(reg.len(RuleKind::Hotkey), 1);
        assert_eq!(reg.len(RuleKind::Hotstring), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut reg = RuleRegistry::new();
        reg.upsert_hotstring(hotstring("btw", "by the way"), false).unwrap();
        assert!(reg.remove(RuleKind::Hotstring, "btw"));
        assert!(!reg.remove(RuleKind::Hotstring, "btw"));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_list_is_ordered_snapshot() {
        let mut reg = RuleRegistry::new();
        for k in ["c", "a", "b"] {
            reg.upsert_hotstring(hotstring(k, k), false).unwrap();
        }
        let snapshot = reg.list_hotstrings();
        reg.remove(RuleKind::Hotstring, "a");

        let keys: Vec<_> = snapshot.iter().map(|r| r.keys()).collect();
        assert_eq!(keys, ["c", "a", "b"]);
        assert_eq!(reg.len(RuleKind::Hotstring), 2);
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let mut reg = RuleRegistry::new();
        reg.upsert_hotkey(hotkey("a", "1"), false).unwrap();
        reg.upsert_hotkey(hotkey("b", "1"), false).unwrap();
        reg.upsert_hotkey(hotkey("a", "2"), true).unwrap();

        let keys: Vec<_> = reg.hotkeys().map(|r| r.keys().to_string()).collect();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn test_replace_requires_existing() {
        let mut reg = RuleRegistry::new();
        let err = reg.replace_hotstring(hotstring("k", "v")).unwrap_err();
        assert_eq!(err.as_label(), "rule_missing");

        reg.upsert_hotstring(hotstring("k", "v"), false).unwrap();
        reg.replace_hotstring(hotstring("k", "w")).unwrap();
        assert_eq!(reg.hotstring("k").unwrap().action(), "w");
    }
}
