// halt.rs — A user-issued halt pauses every mutating tool.

use crate::engine::{Check, CheckContext};
use crate::event::ToolInvocation;
use crate::verdict::Finding;

pub const RULE: &str = "enforcement-halt";

pub struct EnforcementHaltCheck;

impl Check for EnforcementHaltCheck {
    fn name(&self) -> &'static str {
        RULE
    }

    fn applies_to(&self, invocation: &ToolInvocation) -> bool {
        invocation.is_mutating()
    }

    fn evaluate(&self, ctx: &mut CheckContext<'_>) -> Option<Finding> {
        let halt = &ctx.state.halt;
        if !halt.halted {
            return None;
        }
        Some(Finding::block(
            RULE,
            format!(
                "work is halted: {}",
                halt.reason.as_deref().unwrap_or("no reason given")
            ),
            "Wait for the user. Reading is still allowed; `warden resume` lifts the halt.",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::test_support::run;
    use crate::engine::SessionState;
    use chrono::Utc;
    use serde_json::json;
    use std::path::Path;

    #[test]
    fn halt_blocks_mutations_but_not_reads() {
        let mut state = SessionState::default();
        state.halt.halt("reviewing the diff", Utc::now());
        let root = Path::new(".");

        let edit = run(&EnforcementHaltCheck, "Edit", json!({"file_path": "a.rs"}), &mut state, root);
        assert!(edit.is_some_and(|f| f.message.contains("reviewing the diff")));
        assert!(run(&EnforcementHaltCheck, "Bash", json!({"command": "ls"}), &mut state, root).is_some());
        assert!(run(&EnforcementHaltCheck, "Read", json!({"file_path": "a.rs"}), &mut state, root).is_none());

        state.halt.resume();
        assert!(run(&EnforcementHaltCheck, "Edit", json!({"file_path": "a.rs"}), &mut state, root).is_none());
    }
}
