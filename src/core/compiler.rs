//! # Script compiler: registry → interpreter script text.
//!
//! Output layout:
//! ```text
//! <prologue>
//!
//! <prefix><chord><release>::      (one block per hotkey, insertion order)
//! {<action>
//! }
//!
//! :<options>:<keys>::<action>     (one line per hotstring, insertion order)
//!
//! ```
//!
//! ## Rules
//! - Same registry in, same bytes out
//! - Actions are opaque and copied verbatim (no escaping, no validation)
//! - The supervisor runs [`with_watchdog`] on the prologue first, so the
//!   script's watchdog always outlasts the keep-alive interval

use std::fmt::Write as _;
use std::time::Duration;

use crate::core::registry::RuleRegistry;
use crate::rules::{HotkeyRule, HotstringRule};

/// Static preamble placed at the top of every compiled script.
pub const PROLOGUE: &str = include_str!("../../resources/prologue.ahk");

/// Returns `prologue` followed by a `WATCHDOG_MS` assignment.
///
/// The assignment runs after the prologue's own default, before any
/// keep-alive can arrive.
pub fn with_watchdog(prologue: &str, watchdog: Duration) -> String {
    let mut out = String::with_capacity(prologue.len() + 32);
    out.push_str(prologue);
    if !prologue.is_empty() && !prologue.ends_with('\n') {
        out.push('\n');
    }
    let _ = writeln!(out, "WATCHDOG_MS := {}", watchdog.as_millis());
    out
}

/// Compiles the registry behind the packaged [`PROLOGUE`].
pub fn compile(registry: &RuleRegistry) -> String {
    compile_with(PROLOGUE, registry)
}

/// Compiles the registry behind a caller-supplied prologue.
pub fn compile_with(prologue: &str, registry: &RuleRegistry) -> String {
    let mut out = String::with_capacity(prologue.len() + 64);
    out.push_str(prologue);
    if !prologue.is_empty() {
        if !prologue.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
    }

    for rule in registry.hotkeys() {
        render_hotkey(&mut out, rule);
        out.push_str("\n\n");
    }
    for rule in registry.hotstrings() {
        render_hotstring(&mut out, rule);
        out.push_str("\n\n");
    }
    out
}

fn render_hotkey(out: &mut String, rule: &HotkeyRule) {
    let m = rule.modifiers();
    // Writing into a String cannot fail.
    let _ = write!(
        out,
        "{}{}{}::\n{{{}\n}}",
        m.prefix_text(),
        m.chord_text(),
        m.release_text(),
        rule.action()
    );
}

fn render_hotstring(out: &mut String, rule: &HotstringRule) {
    let _ = write!(
        out,
        ":{}:{}::{}",
        rule.options_text(),
        rule.keys(),
        rule.action()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::codes::{HotkeyModifier, HotstringOption, Side};
    use crate::rules::{HotkeyBuilder, HotstringBuilder};

    fn sample() -> RuleRegistry {
        let mut reg = RuleRegistry::new();
        reg.upsert_hotkey(
            HotkeyBuilder::new("h", r#"Send("hi")"#)
                .modifier(HotkeyModifier::Ctrl)
                .build()
                .unwrap(),
            false,
        )
        .unwrap();
        reg.upsert_hotstring(
            HotstringBuilder::new("btw", "by the way")
                .option(HotstringOption::Immediate)
                .option(HotstringOption::InWord)
                .build()
                .unwrap(),
            false,
        )
        .unwrap();
        reg
    }

    #[test]
    fn test_compile_is_deterministic() {
        let reg = sample();
        assert_eq!(compile(&reg), compile(&reg));
    }

    #[test]
    fn test_hotkey_block_shape() {
        let out = compile(&sample());
        assert!(out.contains("^::\n{Send(\"hi\")\n}"), "got:\n{out}");
    }

    #[test]
    fn test_hotstring_line_shape() {
        let out = compile(&sample());
        assert!(out.contains(":*?:btw::by the way\n\n"), "got:\n{out}");
    }

    #[test]
    fn test_starts_with_prologue_and_orders_hotkeys_first() {
        let out = compile(&sample());
        assert!(out.starts_with(PROLOGUE));

        let hk = out.find("^::").unwrap();
        let hs = out.find(":*?:btw").unwrap();
        assert!(hk < hs);
    }

    #[test]
    fn test_all_slots_rendered_in_order() {
        let mut reg = RuleRegistry::new();
        reg.upsert_hotkey(
            HotkeyBuilder::new("a", "x")
                .modifier(HotkeyModifier::Up)
                .sided(Side::Left, HotkeyModifier::Shift)
                .modifier(HotkeyModifier::NoBlock)
                .build()
                .unwrap(),
            false,
        )
        .unwrap();

        assert_eq!(compile_with("", &reg), "~<+UP::\n{x\n}\n\n");
    }

    #[test]
    fn test_action_passed_through_verbatim() {
        let mut reg = RuleRegistry::new();
        let action = "MsgBox(\"a::b\") ; }{\n  Run \"notepad\"";
        reg.upsert_hotstring(HotstringBuilder::new("k", action).build().unwrap(), false)
            .unwrap();
        assert_eq!(compile_with("", &reg), format!("::k::{action}\n\n"));
    }

    #[test]
    fn test_watchdog_armed_only_by_keep_alive() {
        assert_eq!(PROLOGUE.matches("SetTimer(OnWatchdog").count(), 1);
        let handler = PROLOGUE.find("OnKeepAlive(wParam").unwrap();
        let arm = PROLOGUE.find("SetTimer(OnWatchdog").unwrap();
        assert!(arm > handler);
    }

    #[test]
    fn test_watchdog_override_follows_prologue() {
        let head = with_watchdog("; head", Duration::from_secs(60));
        assert_eq!(head, "; head\nWATCHDOG_MS := 60000\n");

        let out = compile_with(&with_watchdog(PROLOGUE, Duration::from_millis(750)), &sample());
        let default = out.find("WATCHDOG_MS := 10000").unwrap();
        let override_ = out.find("WATCHDOG_MS := 750\n").unwrap();
        let first_rule = out.find("^::").unwrap();
        assert!(default < override_ && override_ < first_rule);
    }

    #[test]
    fn test_empty_registry_is_prologue_only() {
        let out = compile_with("; head", &RuleRegistry::new());
        assert_eq!(out, "; head\n\n");
    }
}
