// gaming.rs — Pipeline adapter for the gaming heuristics.

use crate::engine::{Check, CheckContext};
use crate::event::ToolInvocation;
use crate::gaming::{GamingPolicy, RULE};
use crate::verdict::Finding;

pub struct GamingCheck {
    policy: GamingPolicy,
}

impl GamingCheck {
    pub fn new(policy: GamingPolicy) -> Self {
        Self { policy }
    }
}

impl Check for GamingCheck {
    fn name(&self) -> &'static str {
        RULE
    }

    fn applies_to(&self, invocation: &ToolInvocation) -> bool {
        invocation.is_mutating()
    }

    fn evaluate(&self, ctx: &mut CheckContext<'_>) -> Option<Finding> {
        let findings = self.policy.detect(&ctx.state.research, ctx.recent_actions);
        self.policy
            .escalate(&findings, &mut ctx.state.patterns, ctx.now)
    }
}
