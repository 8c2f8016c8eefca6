//! # Hotstring rules.
//!
//! A [`HotstringRule`] binds a typed abbreviation to a replacement or action
//! body. Options are an ordered set: duplicates are dropped, first occurrence
//! wins.

use serde::{Deserialize, Serialize};

use crate::error::RuleError;
use crate::rules::RuleKind;
use crate::rules::codes::HotstringOption;

/// A typed abbreviation bound to a replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HotstringRule {
    keys: String,
    action: String,
    #[serde(default)]
    options: Vec<HotstringOption>,
}

impl HotstringRule {
    pub fn keys(&self) -> &str {
        &self.keys
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn options(&self) -> &[HotstringOption] {
        &self.options
    }

    /// Renders the option list (e.g. `*?B0`).
    pub fn options_text(&self) -> String {
        self.options.iter().map(|o| o.code()).collect()
    }

    /// Parses and validates a serialized hotstring.
    pub fn from_json(json: &str) -> Result<Self, RuleError> {
        let rule: HotstringRule = serde_json::from_str(json)
            .map_err(|e| RuleError::serialization(RuleKind::Hotstring, e))?;
        rule.validated()
    }

    fn validated(mut self) -> Result<Self, RuleError> {
        if self.keys.is_empty() {
            return Err(RuleError::serialization(
                RuleKind::Hotstring,
                "keys must not be empty",
            ));
        }
        dedup_in_order(&mut self.options);
        Ok(self)
    }
}

fn dedup_in_order(options: &mut Vec<HotstringOption>) {
    let mut seen = Vec::with_capacity(options.len());
    options.retain(|o| {
        if seen.contains(o) {
            false
        } else {
            seen.push(*o);
            true
        }
    });
}

/// Builder for [`HotstringRule`].
///
/// ## Example
/// ```rust
/// use keyvisor::{HotstringBuilder, HotstringOption};
///
/// let rule = HotstringBuilder::new("btw", "by the way")
///     .option(HotstringOption::Immediate)
///     .option(HotstringOption::CaseSensitive)
///     .build()
///     .unwrap();
/// assert_eq!(rule.options_text(), "*C");
/// ```
#[derive(Debug, Clone)]
pub struct HotstringBuilder {
    keys: String,
    action: String,
    options: Vec<HotstringOption>,
}

impl HotstringBuilder {
    pub fn new(keys: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            keys: keys.into(),
            action: action.into(),
            options: Vec::new(),
        }
    }

    pub fn option(mut self, option: HotstringOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn options(mut self, options: impl IntoIterator<Item = HotstringOption>) -> Self {
        self.options.extend(options);
        self
    }

    pub fn build(self) -> Result<HotstringRule, RuleError> {
        HotstringRule {
            keys: self.keys,
            action: self.action,
            options: self.options,
        }
        .validated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_round_trip_keeps_option_order() {
        let rule = HotstringBuilder::new("btw", "by the way")
            .options([
                HotstringOption::Raw,
                HotstringOption::Immediate,
                HotstringOption::NoBackspace,
            ])
            .build()
            .unwrap();

        let json = serde_json::to_string(&rule).unwrap();
        assert_eq!(
            json,
            r#"{"keys":"btw","action":"by the way","options":["R","*","B0"]}"#
        );

        let back = HotstringRule::from_json(&json).unwrap();
        assert_eq!(back, rule);
        assert_eq!(back.options_text(), "R*B0");
    }

    #[test]
    fn test_duplicate_options_dropped() {
        let rule = HotstringRule::from_json(
            r#"{"keys":"k","action":"v","options":["C","*","C","*"]}"#,
        )
        .unwrap();
        assert_eq!(
            rule.options(),
            &[HotstringOption::CaseSensitive, HotstringOption::Immediate]
        );
    }

    #[test]
    fn test_missing_options_default_to_empty() {
        let rule = HotstringRule::from_json(r#"{"keys":"k","action":"v"}"#).unwrap();
        assert!(rule.options().is_empty());
    }

    #[test]
    fn test_invalid_input_rejected() {
        for case in [
            r#"{"keys":"k","action":"v","options":["nope"]}"#,
            r#"{"keys":"k"}"#,
            r#"{"keys":"","action":"v"}"#,
            r#"{"keys":"k","action":"v","modifiers":[]}"#,
            r#"[1,2,3]"#,
        ] {
            assert!(HotstringRule::from_json(case).is_err(), "accepted {case}");
        }
    }
}
