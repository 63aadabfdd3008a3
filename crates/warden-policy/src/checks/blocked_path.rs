// blocked_path.rs — Pipeline adapter for `PathGuard`.

use crate::engine::{Check, CheckContext};
use crate::event::ToolInvocation;
use crate::paths::{check_blocked_path, PathGuard, RULE};
use crate::verdict::Finding;

pub struct BlockedPathCheck {
    guard: PathGuard,
}

impl BlockedPathCheck {
    pub fn new(guard: PathGuard) -> Self {
        Self { guard }
    }
}

impl Check for BlockedPathCheck {
    fn name(&self) -> &'static str {
        RULE
    }

    fn applies_to(&self, invocation: &ToolInvocation) -> bool {
        !invocation.paths().is_empty()
    }

    fn evaluate(&self, ctx: &mut CheckContext<'_>) -> Option<Finding> {
        check_blocked_path(ctx.invocation, &self.guard)
    }
}
