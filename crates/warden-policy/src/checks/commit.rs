// commit.rs — Commit discipline and test evidence.
//
// Test runs are evidence: any recognised test command satisfies a "tests"
// requirement. A `git commit` is then held to four process rules, checked in
// order:
//
// - no-commit         the user said not to commit
// - tests-required    tests were requested and have not been run
// - lazy-commit       the message says nothing ("wip", "fix", < 10 chars)
// - unverified-claim  the message claims completion with no test run

use std::sync::LazyLock;

use regex::Regex;

use crate::engine::{Check, CheckContext};
use crate::event::ToolInvocation;
use crate::verdict::Finding;

pub const RULE: &str = "commit-discipline";

const TESTS: &str = "tests";

/// Shortest first line that can describe a change.
const MIN_SUBJECT_LEN: usize = 10;

static TEST_COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:cargo\s+(?:test|nextest)|(?:npm|pnpm|yarn|bun)\s+(?:run\s+)?test|pytest|python3?\s+-m\s+(?:pytest|unittest)|go\s+test|make\s+(?:test|check)|mvn\s+(?:test|verify)|gradle\w*\s+test|rspec|jest|vitest)\b",
    )
    .expect("test command regex is valid")
});

static GIT_COMMIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bgit\s+(?:-C\s+\S+\s+)?commit\b").expect("git commit regex is valid")
});

static COMMIT_MESSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|\s)(?:-[a-zA-Z]*m|--message)(?:\s+|=)(?:"((?:[^"\\]|\\.)*)"|'([^']*)'|(\S+))"#)
        .expect("commit message regex is valid")
});

static GENERIC_SUBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:wip|fix(?:es|ed)?|update[sd]?|changes?|stuff|misc|tmp|temp|tests?|commit|done|minor|cleanup|refactor)\.?$",
    )
    .expect("generic subject regex is valid")
});

static COMPLETION_CLAIM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:done|complete[ds]?|finished|works|working|all\s+green)\b")
        .expect("completion claim regex is valid")
});

/// The `-m` message of a commit command, if one is given inline.
fn commit_message(command: &str) -> Option<String> {
    let caps = COMMIT_MESSAGE.captures(command)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .map(|m| m.as_str().replace("\\n", "\n").replace("\\\"", "\""))
}

pub struct CommitDisciplineCheck;

impl Check for CommitDisciplineCheck {
    fn name(&self) -> &'static str {
        RULE
    }

    fn applies_to(&self, invocation: &ToolInvocation) -> bool {
        invocation.command().is_some()
    }

    fn evaluate(&self, ctx: &mut CheckContext<'_>) -> Option<Finding> {
        let command = ctx.invocation.command()?;
        let requirements = &mut ctx.state.requirements;

        if TEST_COMMAND.is_match(command) {
            let runs = requirements.add_evidence(TESTS);
            if requirements.mark_satisfied(TESTS, ctx.now) {
                tracing::info!(runs, "tests requirement satisfied");
            }
        }

        if !GIT_COMMIT.is_match(command) {
            return None;
        }

        if requirements.has_modifier("no-commit") {
            return Some(Finding::block(
                "no-commit",
                "the user asked for no commits during this task",
                "Leave the changes uncommitted and tell the user they are ready for review.",
            ));
        }

        if requirements.is_requested(TESTS) && !requirements.is_satisfied(TESTS) {
            return Some(Finding::block(
                "tests-required",
                "tests were requested but have not been run since",
                "Run the test suite (e.g. `cargo test`) and fix failures before committing.",
            ));
        }

        // Heredoc and editor messages cannot be judged from the command line.
        let message = commit_message(command).filter(|m| !m.trim_start().starts_with("$("))?;
        let subject = message.lines().next().unwrap_or("").trim();

        if subject.chars().count() < MIN_SUBJECT_LEN || GENERIC_SUBJECT.is_match(subject) {
            return Some(Finding::block(
                "lazy-commit",
                format!("commit message '{}' does not describe the change", subject),
                "Write a subject line that says what changed and why.",
            ));
        }

        if COMPLETION_CLAIM.is_match(&message) && requirements.evidence(TESTS) == 0 {
            return Some(Finding::block(
                "unverified-claim",
                "the commit message claims the work is done, but no tests were run",
                "Run the tests first, or reword the message to describe the change without claiming completion.",
            ));
        }

        None
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

    fn bash(state: &mut SessionState, command: &str) -> Option<Finding> {
        run(
            &CommitDisciplineCheck,
            "Bash",
            json!({ "command": command }),
            state,
            Path::new("."),
        )
    }

    fn rule(finding: Option<Finding>) -> Option<String> {
        finding.map(|f| f.rule)
    }

    #[test]
    fn message_extraction_handles_quoting() {
        assert_eq!(
            commit_message(r#"git commit -m "Add retry to upload client""#).as_deref(),
            Some("Add retry to upload client")
        );
        assert_eq!(
            commit_message("git commit -am 'Tighten lock scope'").as_deref(),
            Some("Tighten lock scope")
        );
        assert_eq!(commit_message("git commit --message=wip").as_deref(), Some("wip"));
        assert_eq!(commit_message("git commit --amend --no-edit"), None);
    }

    #[test]
    fn lazy_messages_are_blocked() {
        let mut state = SessionState::default();
        assert_eq!(rule(bash(&mut state, "git commit -m 'wip'")), Some("lazy-commit".into()));
        assert_eq!(rule(bash(&mut state, "git commit -m \"fix\"")), Some("lazy-commit".into()));
        assert_eq!(rule(bash(&mut state, "git commit -m 'refactor.'")), Some("lazy-commit".into()));
        assert!(bash(&mut state, "git commit -m 'Split parser into lexer and grammar modules'").is_none());
    }

    #[test]
    fn heredoc_messages_are_not_judged() {
        let mut state = SessionState::default();
        assert!(bash(&mut state, "git commit -m \"$(cat <<'EOF'\nx\nEOF\n)\"").is_none());
    }

    #[test]
    fn completion_claims_need_test_evidence() {
        let mut state = SessionState::default();
        let claim = "git commit -m 'Retry logic complete and working'";
        assert_eq!(rule(bash(&mut state, claim)), Some("unverified-claim".into()));

        assert!(bash(&mut state, "cargo test -p warden-policy").is_none());
        assert_eq!(state.requirements.evidence("tests"), 1);
        assert!(bash(&mut state, claim).is_none());
    }

    #[test]
    fn requested_tests_must_run_before_commit() {
        let mut state = SessionState {
            requirements: RequirementSet::new(vec!["tests".to_string()], Vec::new(), Utc::now()),
            ..SessionState::default()
        };
        let commit = "git commit -m 'Handle empty config sections'";
        assert_eq!(rule(bash(&mut state, commit)), Some("tests-required".into()));

        bash(&mut state, "npm run test");
        assert!(state.requirements.is_satisfied("tests"));
        assert!(bash(&mut state, commit).is_none());
    }

    #[test]
    fn tests_and_commit_in_one_command_count_the_run() {
        let mut state = SessionState {
            requirements: RequirementSet::new(vec!["tests".to_string()], Vec::new(), Utc::now()),
            ..SessionState::default()
        };
        assert!(bash(&mut state, "pytest -q && git commit -m 'Cache parsed templates per request'").is_none());
    }

    #[test]
    fn no_commit_modifier_blocks_any_commit() {
        let mut state = SessionState {
            requirements: RequirementSet::new(Vec::new(), vec!["no-commit".to_string()], Utc::now()),
            ..SessionState::default()
        };
        assert_eq!(
            rule(bash(&mut state, "git commit -m 'Describe the change well'")),
            Some("no-commit".into())
        );
        assert!(bash(&mut state, "git status").is_none());
    }
}
