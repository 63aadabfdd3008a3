// breaker.rs — A tripped circuit breaker blocks everything.

use crate::engine::{Check, CheckContext};
use crate::verdict::Finding;

pub const RULE: &str = "circuit-breaker";

pub struct CircuitBreakerCheck;

impl Check for CircuitBreakerCheck {
    fn name(&self) -> &'static str {
        RULE
    }

    fn evaluate(&self, ctx: &mut CheckContext<'_>) -> Option<Finding> {
        let breaker = &ctx.state.breaker;
        if !breaker.is_tripped() {
            return None;
        }
        let last_error = breaker.last_error.as_deref().unwrap_or("none recorded");
        Some(Finding::block(
            RULE,
            format!(
                "circuit breaker tripped after {} failures (threshold {}); last error: {}",
                breaker.failures, breaker.threshold, last_error
            ),
            "A human must review what went wrong, then run `warden breaker reset`.",
        ))
    }
}
