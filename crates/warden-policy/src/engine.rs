// engine.rs — The rule check pipeline.
//
// Every tool invocation passes through `RuleEngine::evaluate()`, which runs
// the checks in a fixed order:
//
//  1. circuit-breaker     tripped breaker blocks everything
//  2. enforcement-halt    user pause of mutating tools
//  3. blocked-path        protected paths, in every canonical form
//  4. file-size           projected line count against soft/hard limits
//  5. dangerous-command   destructive shell commands
//  6. secret-content      private keys and access-key ids in written text
//  7. gaming              shortcut heuristics, escalating to a block
//  8. research-required   no edits before requested research is done
//  9. plan-required       no edits before a requested plan exists
// 10. commit-discipline   commit hygiene and test evidence
//
// Cheap, stateless checks run first. Checks near the end read and mutate
// requirement state. The first blocking finding stops the pipeline; warnings
// accumulate.

use std::path::Path;

use chrono::{DateTime, Utc};
use warden_audit::AuditRecord;
use warden_state::{
    CircuitBreaker, EditAttemptCounter, HaltState, PatternLog, RequirementSet, ResearchStatus,
    StateStore, StoreError,
};

use crate::checks::{
    BlockedPathCheck, CircuitBreakerCheck, CommitDisciplineCheck, DangerousCommandCheck,
    EnforcementHaltCheck, FileSizeCheck, GamingCheck, PlanRequiredCheck, ResearchRequiredCheck,
    SecretContentCheck,
};
use crate::config::PolicyConfig;
use crate::event::ToolInvocation;
use crate::gaming::GamingPolicy;
use crate::paths::PathGuard;
use crate::verdict::{Finding, Verdict};

/// Every state domain the checks read, loaded once per evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub research: ResearchStatus,
    pub requirements: RequirementSet,
    pub edit_attempts: EditAttemptCounter,
    pub breaker: CircuitBreaker,
    pub halt: HaltState,
    pub patterns: PatternLog,
}

impl SessionState {
    /// Load every domain. Fails if a critical domain cannot be read.
    pub fn load(store: &StateStore) -> Result<Self, StoreError> {
        Ok(Self {
            research: store.try_get()?,
            requirements: store.try_get()?,
            edit_attempts: store.try_get()?,
            breaker: store.try_get()?,
            halt: store.try_get()?,
            patterns: store.try_get()?,
        })
    }

    /// Persist only the domains that differ from `original`.
    pub fn save_changes(&self, original: &Self, store: &StateStore) -> Result<(), StoreError> {
        if self.research != original.research {
            store.put(&self.research)?;
        }
        if self.requirements != original.requirements {
            store.put(&self.requirements)?;
        }
        if self.edit_attempts != original.edit_attempts {
            store.put(&self.edit_attempts)?;
        }
        if self.breaker != original.breaker {
            store.put(&self.breaker)?;
        }
        if self.halt != original.halt {
            store.put(&self.halt)?;
        }
        if self.patterns != original.patterns {
            store.put(&self.patterns)?;
        }
        Ok(())
    }
}

/// What a check gets to look at.
pub struct CheckContext<'a> {
    pub invocation: &'a ToolInvocation,
    pub state: &'a mut SessionState,
    /// The most recent outcome records (post-tool results and blocked
    /// attempts) from the action log, oldest first.
    pub recent_actions: &'a [AuditRecord],
    pub project_root: &'a Path,
    pub now: DateTime<Utc>,
}

/// One rule in the pipeline.
///
/// `evaluate` returns `None` to pass. Checks may mutate `ctx.state`; the
/// enforcer persists whatever changed once the pipeline finishes.
pub trait Check {
    /// Stable rule-check name, recorded in the action log.
    fn name(&self) -> &'static str;

    fn applies_to(&self, _invocation: &ToolInvocation) -> bool {
        true
    }

    fn evaluate(&self, ctx: &mut CheckContext<'_>) -> Option<Finding>;
}

/// An ordered list of checks.
pub struct RuleEngine {
    checks: Vec<Box<dyn Check>>,
}

impl RuleEngine {
    /// An empty pipeline (allows everything).
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// Append a check to the end of the pipeline.
    pub fn with_check(mut self, check: impl Check + 'static) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    /// The stock pipeline, configured for one project.
    pub fn standard(config: &PolicyConfig, project_root: &Path) -> Self {
        Self::new()
            .with_check(CircuitBreakerCheck)
            .with_check(EnforcementHaltCheck)
            .with_check(BlockedPathCheck::new(PathGuard::new(
                project_root,
                &config.paths.extra_denylist,
            )))
            .with_check(FileSizeCheck::new(config.limits))
            .with_check(DangerousCommandCheck)
            .with_check(SecretContentCheck)
            .with_check(GamingCheck::new(GamingPolicy::new(&config.gaming)))
            .with_check(ResearchRequiredCheck)
            .with_check(PlanRequiredCheck)
            .with_check(CommitDisciplineCheck)
    }

    pub fn check_names(&self) -> Vec<&'static str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    /// Run the pipeline. The first blocking finding ends it.
    pub fn evaluate(&self, ctx: &mut CheckContext<'_>) -> Verdict {
        let mut findings = Vec::new();
        let mut checks_run = Vec::new();

        for check in &self.checks {
            if !check.applies_to(ctx.invocation) {
                continue;
            }
            checks_run.push(check.name());
            let Some(finding) = check.evaluate(ctx) else {
                continue;
            };
            tracing::debug!(
                check = check.name(),
                rule = %finding.rule,
                severity = ?finding.severity,
                tool = ctx.invocation.name(),
                "check produced a finding"
            );
            let blocking = finding.is_block();
            findings.push(finding);
            if blocking {
                break;
            }
        }

        Verdict::from_findings(findings, checks_run)
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::Decision;
    use serde_json::json;
    use tempfile::tempdir;

    struct Fixed {
        name: &'static str,
        finding: Option<Finding>,
    }

    impl Check for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }
        fn evaluate(&self, _ctx: &mut CheckContext<'_>) -> Option<Finding> {
            self.finding.clone()
        }
    }

    fn evaluate(engine: &RuleEngine, inv: &ToolInvocation, state: &mut SessionState) -> Verdict {
        let mut ctx = CheckContext {
            invocation: inv,
            state,
            recent_actions: &[],
            project_root: Path::new("."),
            now: Utc::now(),
        };
        engine.evaluate(&mut ctx)
    }

    #[test]
    fn first_block_stops_pipeline_and_warnings_accumulate() {
        let engine = RuleEngine::new()
            .with_check(Fixed {
                name: "a",
                finding: Some(Finding::warn("a", "w", "")),
            })
            .with_check(Fixed {
                name: "b",
                finding: Some(Finding::block("b", "x", "")),
            })
            .with_check(Fixed {
                name: "c",
                finding: Some(Finding::block("c", "never", "")),
            });
        let inv = ToolInvocation::parse("Read", json!({"file_path": "a"})).unwrap();
        let verdict = evaluate(&engine, &inv, &mut SessionState::default());
        assert_eq!(verdict.decision, Decision::Block);
        assert_eq!(verdict.checks_run, vec!["a", "b"]);
        assert_eq!(verdict.findings.len(), 2);
    }

    #[test]
    fn tripped_breaker_short_circuits_every_other_check() {
        let dir = tempdir().unwrap();
        let engine = RuleEngine::standard(&PolicyConfig::default(), dir.path());
        let mut state = SessionState::default();
        for _ in 0..5 {
            state.breaker.record_failure("verify failed", Utc::now());
        }
        let inv = ToolInvocation::parse("Write", json!({"file_path": "/etc/passwd", "content": "x"}))
            .unwrap();
        let verdict = evaluate(&engine, &inv, &mut state);
        assert!(verdict.is_blocked());
        assert_eq!(verdict.checks_run, vec!["circuit-breaker"]);
        assert_eq!(verdict.findings.len(), 1);
        assert_eq!(verdict.findings[0].rule, "circuit-breaker");
    }

    #[test]
    fn standard_pipeline_order_is_fixed() {
        let dir = tempdir().unwrap();
        let engine = RuleEngine::standard(&PolicyConfig::default(), dir.path());
        assert_eq!(
            engine.check_names(),
            vec![
                "circuit-breaker",
                "enforcement-halt",
                "blocked-path",
                "file-size",
                "dangerous-command",
                "secret-content",
                "gaming",
                "research-required",
                "plan-required",
                "commit-discipline",
            ]
        );
    }

    #[test]
    fn save_changes_writes_only_modified_domains() {
        let store = StateStore::in_memory();
        let original = SessionState::load(&store).unwrap();
        let mut state = original.clone();
        state.halt.halt("lunch", Utc::now());
        state.save_changes(&original, &store).unwrap();

        assert!(store.get::<HaltState>().halted);
        assert_eq!(SessionState::load(&store).unwrap().halt, state.halt);
        assert_eq!(store.get::<CircuitBreaker>(), CircuitBreaker::default());
    }
}
