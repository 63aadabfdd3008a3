// enforcer.rs — One hook event in, one verdict out.
//
// The enforcer owns everything an evaluation needs: the state store, the
// project layout, the rule engine, and the intent detector. Per event it
//
// 1. loads every state domain the checks read,
// 2. runs the pipeline,
// 3. persists whichever domains changed,
// 4. appends to the action log (and the rule log for blocks).
//
// Steps 1–3 are enforcement: a failure to load or persist a critical domain
// is an error. Step 4 is telemetry: failures are logged and the verdict stands.

use chrono::Utc;
use warden_audit::{ActionLog, AuditRecord, EventPhase, RuleLog, RuleViolation, ViolationSource};
use warden_state::{CircuitBreaker, ProjectLayout, RequirementSet, StateStore};

use crate::config::PolicyConfig;
use crate::engine::{CheckContext, RuleEngine, SessionState};
use crate::error::PolicyError;
use crate::event::{HookEvent, ToolInvocation, ToolOutcome};
use crate::intent::{IntentDetector, PatternIntentDetector};
use crate::verdict::Verdict;

/// Outcome records from the action log the checks can see.
pub const RECENT_OUTCOMES: usize = 10;

pub struct Enforcer {
    layout: ProjectLayout,
    store: StateStore,
    engine: RuleEngine,
    intent: Box<dyn IntentDetector>,
    config: PolicyConfig,
}

impl Enforcer {
    /// Enforcer for a project on disk, configured from `.warden/config.toml`.
    pub fn open(layout: ProjectLayout) -> Result<Self, PolicyError> {
        let config = PolicyConfig::load_or_default(&layout.config_file);
        let store = StateStore::open(&layout.state_dir)?;
        Ok(Self::new(layout, store, config))
    }

    pub fn new(layout: ProjectLayout, store: StateStore, config: PolicyConfig) -> Self {
        let engine = RuleEngine::standard(&config, &layout.project_root);
        Self {
            layout,
            store,
            engine,
            intent: Box::new(PatternIntentDetector::standard()),
            config,
        }
    }

    /// Replace the intent detector.
    pub fn with_intent_detector(mut self, detector: impl IntentDetector + 'static) -> Self {
        self.intent = Box::new(detector);
        self
    }

    /// Replace the rule pipeline.
    pub fn with_engine(mut self, engine: RuleEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Parse and handle a raw payload. Unparsable payloads are allowed.
    pub fn handle_json(&self, payload: &str) -> Result<Verdict, PolicyError> {
        match HookEvent::parse(payload) {
            Ok(event) => self.handle(&event),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed hook payload");
                Ok(Verdict::allow())
            }
        }
    }

    pub fn handle(&self, event: &HookEvent) -> Result<Verdict, PolicyError> {
        match event {
            HookEvent::SessionStart => self.on_session_start(),
            HookEvent::UserPrompt { prompt } => self.on_user_prompt(prompt),
            HookEvent::PreToolUse(invocation) => self.on_pre_tool(invocation),
            HookEvent::PostToolUse {
                invocation,
                outcome,
            } => {
                self.on_post_tool(invocation, outcome);
                Ok(Verdict::allow())
            }
            HookEvent::Other { name } => {
                tracing::debug!(event = %name, "event not handled");
                Ok(Verdict::allow())
            }
        }
    }

    /// A new session clears a tripped breaker. Everything else carries over.
    fn on_session_start(&self) -> Result<Verdict, PolicyError> {
        let mut breaker: CircuitBreaker = self.store.try_get()?;
        if breaker.is_tripped() {
            breaker.reset(Utc::now());
            self.store.put(&breaker)?;
            tracing::info!("session start reset the tripped circuit breaker");
        }
        Ok(Verdict::allow())
    }

    fn on_user_prompt(&self, prompt: &str) -> Result<Verdict, PolicyError> {
        let intent = self.intent.detect(prompt);
        if !intent.is_empty() {
            tracing::info!(
                requirements = ?intent.requirements,
                modifiers = ?intent.modifiers,
                "new intent detected"
            );
            let requirements =
                RequirementSet::new(intent.requirements, intent.modifiers, Utc::now());
            self.store.put(&requirements)?;
        }
        Ok(Verdict::allow())
    }

    fn on_pre_tool(&self, invocation: &ToolInvocation) -> Result<Verdict, PolicyError> {
        let original = SessionState::load(&self.store)?;
        let mut state = original.clone();
        let recent = ActionLog::recent_outcomes(&self.layout.actions_log, RECENT_OUTCOMES).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "action log unreadable, evaluating without history");
            Vec::new()
        });

        let verdict = {
            let mut ctx = CheckContext {
                invocation,
                state: &mut state,
                recent_actions: &recent,
                project_root: &self.layout.project_root,
                now: Utc::now(),
            };
            self.engine.evaluate(&mut ctx)
        };

        state.save_changes(&original, &self.store)?;
        self.record_pre_tool(invocation, &verdict);
        Ok(verdict)
    }

    fn record_pre_tool(&self, invocation: &ToolInvocation, verdict: &Verdict) {
        let mut record = AuditRecord::new(
            invocation.name(),
            EventPhase::PreTool,
            verdict.decision.into(),
        )
        .with_rules(verdict.checks_run.iter().copied());
        if let Some(target) = invocation.target() {
            record = record.with_target(target);
        }
        self.append_action(record);

        let rule_log = RuleLog::new(&self.layout.rules_log);
        for finding in verdict.findings.iter().filter(|f| f.is_block()) {
            let violation = RuleViolation::new(&finding.rule, &finding.message, ViolationSource::Engine)
                .with_tool(invocation.name());
            if let Err(e) = rule_log.append(&violation) {
                tracing::warn!(error = %e, rule = %finding.rule, "failed to record rule violation");
            }
        }
    }

    fn on_post_tool(&self, invocation: &ToolInvocation, outcome: &ToolOutcome) {
        let mut record = AuditRecord::new(
            invocation.name(),
            EventPhase::PostTool,
            warden_audit::CheckResult::Pass,
        )
        .with_success(outcome.success);
        if let Some(signature) = &outcome.error_signature {
            record = record.with_error_signature(signature.clone());
        }
        if let Some(target) = invocation.target() {
            record = record.with_target(target);
        }
        self.append_action(record);
    }

    fn append_action(&self, mut record: AuditRecord) {
        let result = ActionLog::open(&self.layout.actions_log).and_then(|mut log| log.append(&mut record));
        if let Err(e) = result {
            tracing::warn!(error = %e, tool = %record.tool, "failed to append to action log");
        }
    }
}
