// research.rs — Requested research must happen before edits.
//
// Research tools add evidence; enough evidence, or every research category
// marked complete, satisfies the requirement. Each premature edit is
// counted, and hitting the ceiling throws away research progress so the
// agent cannot simply wait the rule out.

use warden_state::ResearchStatus;

use crate::engine::{Check, CheckContext};
use crate::event::{ToolClass, ToolInvocation};
use crate::verdict::Finding;

pub const RULE: &str = "research-required";

const REQUIREMENT: &str = "research";

/// Research-tool uses that satisfy the requirement on their own.
pub const RESEARCH_EVIDENCE_TO_SATISFY: u32 = 3;

pub struct ResearchRequiredCheck;

impl Check for ResearchRequiredCheck {
    fn name(&self) -> &'static str {
        RULE
    }

    fn applies_to(&self, invocation: &ToolInvocation) -> bool {
        matches!(invocation.class(), ToolClass::Research | ToolClass::Edit)
    }

    fn evaluate(&self, ctx: &mut CheckContext<'_>) -> Option<Finding> {
        let state = &mut *ctx.state;
        if !state.requirements.is_requested(REQUIREMENT)
            || state.requirements.is_satisfied(REQUIREMENT)
        {
            return None;
        }

        if state.research.all_complete() {
            state.requirements.mark_satisfied(REQUIREMENT, ctx.now);
            tracing::info!("research requirement satisfied by completed categories");
            return None;
        }

        if ctx.invocation.class() == ToolClass::Research {
            let evidence = state.requirements.add_evidence(REQUIREMENT);
            if evidence >= RESEARCH_EVIDENCE_TO_SATISFY {
                state.requirements.mark_satisfied(REQUIREMENT, ctx.now);
                tracing::info!(evidence, "research requirement satisfied by tool use");
            }
            return None;
        }

        let evidence = state.requirements.evidence(REQUIREMENT);
        let missing: Vec<&str> = state.research.missing().iter().map(|c| c.as_str()).collect();
        let ceiling_hit = state.edit_attempts.record(ctx.now);
        let consequence = if ceiling_hit {
            state.research = ResearchStatus::default();
            state.requirements.clear_evidence(REQUIREMENT);
            tracing::info!("edit attempt ceiling reached, research progress reset");
            "Too many premature edits: research progress has been reset.".to_string()
        } else {
            format!("Premature edit attempt {} recorded.", state.edit_attempts.count)
        };

        Some(Finding::block(
            RULE,
            format!(
                "research was requested and is not done ({}/{} research tool uses; \
                 categories not marked: {}). {}",
                evidence,
                RESEARCH_EVIDENCE_TO_SATISFY,
                missing.join(", "),
                consequence
            ),
            "Read the relevant code and docs first (Read, Grep, Glob, WebSearch), \
             or mark categories with `warden research mark <category>` as you finish them.",
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
    use warden_state::{RequirementSet, ResearchCategory};

    fn requesting_research() -> SessionState {
        SessionState {
            requirements: RequirementSet::new(vec!["research".to_string()], Vec::new(), Utc::now()),
            ..SessionState::default()
        }
    }

    fn edit() -> serde_json::Value {
        json!({"file_path": "a.rs", "old_string": "a", "new_string": "b"})
    }

    #[test]
    fn unrequested_research_never_blocks() {
        let mut state = SessionState::default();
        assert!(run(&ResearchRequiredCheck, "Edit", edit(), &mut state, Path::new(".")).is_none());
        assert_eq!(state.edit_attempts.count, 0);
    }

    #[test]
    fn three_research_tools_satisfy_requirement() {
        let mut state = requesting_research();
        let root = Path::new(".");
        assert!(run(&ResearchRequiredCheck, "Edit", edit(), &mut state, root).is_some());

        for tool in ["Read", "Grep", "mcp__docs__lookup"] {
            assert!(run(&ResearchRequiredCheck, tool, json!({}), &mut state, root).is_none());
        }
        assert!(state.requirements.is_satisfied("research"));
        assert!(run(&ResearchRequiredCheck, "Edit", edit(), &mut state, root).is_none());
    }

    #[test]
    fn completed_categories_satisfy_requirement() {
        let mut state = requesting_research();
        for category in ResearchCategory::ALL {
            state.research.mark_complete(category, Utc::now());
        }
        assert!(run(&ResearchRequiredCheck, "Write", json!({"file_path": "a.rs"}), &mut state, Path::new(".")).is_none());
        assert!(state.requirements.is_satisfied("research"));
    }

    #[test]
    fn ceiling_resets_research_progress() {
        let mut state = requesting_research();
        let root = Path::new(".");
        state.research.mark_complete(ResearchCategory::Docs, Utc::now());
        run(&ResearchRequiredCheck, "Read", json!({}), &mut state, root);

        for attempt in 1..=2 {
            let finding = run(&ResearchRequiredCheck, "Edit", edit(), &mut state, root).unwrap();
            assert!(finding.is_block());
            assert_eq!(state.edit_attempts.count, attempt);
        }
        assert!(state.research.is_complete(ResearchCategory::Docs));

        let third = run(&ResearchRequiredCheck, "Edit", edit(), &mut state, root).unwrap();
        assert!(third.message.contains("reset"));
        assert_eq!(state.edit_attempts.count, 0);
        assert_eq!(state.research.completed_count(), 0);
        assert_eq!(state.requirements.evidence("research"), 0);
    }
}
