// plan.rs — A requested plan must exist before edits.

use crate::engine::{Check, CheckContext};
use crate::event::{ToolClass, ToolInvocation};
use crate::verdict::Finding;

pub const RULE: &str = "plan-required";

const REQUIREMENT: &str = "plan";

pub struct PlanRequiredCheck;

impl Check for PlanRequiredCheck {
    fn name(&self) -> &'static str {
        RULE
    }

    fn applies_to(&self, invocation: &ToolInvocation) -> bool {
        matches!(invocation.class(), ToolClass::Plan | ToolClass::Edit)
    }

    fn evaluate(&self, ctx: &mut CheckContext<'_>) -> Option<Finding> {
        let requirements = &mut ctx.state.requirements;
        if !requirements.is_requested(REQUIREMENT) || requirements.is_satisfied(REQUIREMENT) {
            return None;
        }
        if ctx.invocation.class() == ToolClass::Plan {
            requirements.add_evidence(REQUIREMENT);
            requirements.mark_satisfied(REQUIREMENT, ctx.now);
            tracing::info!(tool = ctx.invocation.name(), "plan requirement satisfied");
            return None;
        }
        Some(Finding::block(
            RULE,
            "a plan was requested and none has been written yet",
            "Lay out the steps with TodoWrite (or present a plan with ExitPlanMode), then edit.",
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
    use warden_state::RequirementSet;

    #[test]
    fn edits_wait_for_a_plan() {
        let mut state = SessionState {
            requirements: RequirementSet::new(vec!["plan".to_string()], Vec::new(), Utc::now()),
            ..SessionState::default()
        };
        let root = Path::new(".");
        let edit = json!({"file_path": "a.rs", "content": "x"});

        assert!(run(&PlanRequiredCheck, "Write", edit.clone(), &mut state, root).is_some_and(|f| f.is_block()));
        assert!(run(&PlanRequiredCheck, "TodoWrite", json!({"todos": []}), &mut state, root).is_none());
        assert!(state.requirements.is_satisfied("plan"));
        assert!(run(&PlanRequiredCheck, "Write", edit, &mut state, root).is_none());
    }
}
