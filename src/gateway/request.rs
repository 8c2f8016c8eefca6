//! Wire form of gateway commands.
//!
//! One JSON object per request, tagged by `command`:
//!
//! ```text
//! {"command":"add_hotstring","rule":{"keys":"btw","action":"by the way"},"overwrite":false}
//! {"command":"delete_hotstring","keys":"btw"}
//! {"command":"get_status"}
//! ```
//!
//! `rule` may be the rule object itself or a string holding its JSON; both
//! go through the same schema validation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Request {
    GetHotkeys,
    GetHotstrings,
    AddHotkey {
        rule: Value,
        #[serde(default)]
        overwrite: bool,
    },
    AddHotstring {
        rule: Value,
        #[serde(default)]
        overwrite: bool,
    },
    EditHotkey {
        rule: Value,
    },
    EditHotstring {
        rule: Value,
    },
    DeleteHotkey {
        keys: String,
    },
    DeleteHotstring {
        keys: String,
    },
    RunDefault,
    KillAll,
    Restart,
    GetStatus,
}

impl Request {
    /// Wire name of the command, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Request::GetHotkeys => "get_hotkeys",
            Request::GetHotstrings => "get_hotstrings",
            Request::AddHotkey { .. } => "add_hotkey",
            Request::AddHotstring { .. } => "add_hotstring",
            Request::EditHotkey { .. } => "edit_hotkey",
            Request::EditHotstring { .. } => "edit_hotstring",
            Request::DeleteHotkey { .. } => "delete_hotkey",
            Request::DeleteHotstring { .. } => "delete_hotstring",
            Request::RunDefault => "run_default",
            Request::KillAll => "kill_all",
            Request::Restart => "restart",
            Request::GetStatus => "get_status",
        }
    }
}

/// The serialized rule text carried by `rule`.
pub(crate) fn rule_text(rule: Value) -> String {
    match rule {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_tagged_commands() {
        let req: Request = serde_json::from_str(r#"{"command":"get_status"}"#).unwrap();
        assert_eq!(req, Request::GetStatus);

        let req: Request =
            serde_json::from_str(r#"{"command":"delete_hotkey","keys":"h"}"#).unwrap();
        assert_eq!(req.name(), "delete_hotkey");
    }

    #[test]
    fn test_overwrite_defaults_to_false() {
        let req: Request =
            serde_json::from_str(r#"{"command":"add_hotstring","rule":"{}"}"#).unwrap();
        assert_eq!(
            req,
            Request::AddHotstring {
                rule: json!("{}"),
                overwrite: false
            }
        );
    }

    #[test]
    fn test_rule_text_accepts_string_or_object() {
        assert_eq!(rule_text(json!(r#"{"keys":"a"}"#)), r#"{"keys":"a"}"#);
        assert_eq!(rule_text(json!({"keys": "a"})), r#"{"keys":"a"}"#);
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        assert!(serde_json::from_str::<Request>(r#"{"command":"format_disk"}"#).is_err());
    }
}
