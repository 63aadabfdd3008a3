// checks/mod.rs — The stock rule checks, one module per rule family.

mod blocked_path;
mod breaker;
mod command;
mod commit;
mod file_size;
mod gaming;
mod halt;
mod plan;
mod research;
mod secrets;

pub use blocked_path::BlockedPathCheck;
pub use breaker::CircuitBreakerCheck;
pub use command::DangerousCommandCheck;
pub use commit::CommitDisciplineCheck;
pub use file_size::{projected_line_count, FileSizeCheck};
pub use gaming::GamingCheck;
pub use halt::EnforcementHaltCheck;
pub use plan::PlanRequiredCheck;
pub use research::{ResearchRequiredCheck, RESEARCH_EVIDENCE_TO_SATISFY};
pub use secrets::SecretContentCheck;

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    use chrono::Utc;
    use serde_json::Value;
    use warden_audit::AuditRecord;

    use crate::engine::{Check, CheckContext, SessionState};
    use crate::event::ToolInvocation;
    use crate::verdict::Finding;

    /// Run one check against a parsed invocation.
    pub fn run(
        check: &dyn Check,
        tool: &str,
        input: Value,
        state: &mut SessionState,
        root: &Path,
    ) -> Option<Finding> {
        run_with_history(check, tool, input, state, root, &[])
    }

    pub fn run_with_history(
        check: &dyn Check,
        tool: &str,
        input: Value,
        state: &mut SessionState,
        root: &Path,
        recent: &[AuditRecord],
    ) -> Option<Finding> {
        let invocation = ToolInvocation::parse(tool, input).unwrap();
        if !check.applies_to(&invocation) {
            return None;
        }
        let mut ctx = CheckContext {
            invocation: &invocation,
            state,
            recent_actions: recent,
            project_root: root,
            now: Utc::now(),
        };
        check.evaluate(&mut ctx)
    }
}
