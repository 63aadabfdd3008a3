// hook.rs — `warden hook`: evaluate one event from stdin.
//
// The exit code is the verdict: 0 lets the action proceed, the configured
// block code stops it. Findings go to stderr, which the host shows to the
// agent. If state that enforcement depends on cannot be loaded or saved, the
// action is blocked.

use std::io::Read;

use warden_policy::{Enforcer, PolicyConfig};
use warden_state::ProjectLayout;

/// What the hook reports back to the host.
pub struct HookOutcome {
    pub diagnostics: Vec<String>,
    pub exit_code: i32,
}

/// Evaluate one raw payload for a project.
pub fn evaluate(layout: &ProjectLayout, payload: &str) -> HookOutcome {
    let block_code = PolicyConfig::load_or_default(&layout.config_file)
        .hook
        .block_exit_code;

    let result = Enforcer::open(layout.clone()).and_then(|enforcer| enforcer.handle_json(payload));
    match result {
        Ok(verdict) => HookOutcome {
            diagnostics: verdict.render(),
            exit_code: verdict.exit_code(block_code),
        },
        Err(e) => {
            tracing::error!(error = %e, "enforcement state unavailable, blocking");
            HookOutcome {
                diagnostics: vec![format!(
                    "[BLOCKED] warden: enforcement state is unavailable ({})\n  fix: check permissions on {}",
                    e,
                    layout.warden_dir.display()
                )],
                exit_code: block_code,
            }
        }
    }
}

pub fn execute(layout: &ProjectLayout) -> anyhow::Result<()> {
    let mut payload = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut payload) {
        tracing::warn!(error = %e, "could not read hook payload, allowing");
        return Ok(());
    }

    let outcome = evaluate(layout, &payload);
    for line in &outcome.diagnostics {
        eprintln!("{}", line);
    }
    if outcome.exit_code != 0 {
        std::process::exit(outcome.exit_code);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn blocked_action_uses_configured_exit_code() {
        let dir = tempdir().unwrap();
        let layout = ProjectLayout::for_project(dir.path());
        std::fs::create_dir_all(&layout.warden_dir).unwrap();
        std::fs::write(&layout.config_file, "[hook]\nblock_exit_code = 2\n").unwrap();

        let outcome = evaluate(
            &layout,
            r#"{"tool_name":"Bash","tool_input":{"command":"cat /etc/shadow"}}"#,
        );
        assert_eq!(outcome.exit_code, 2);
        assert!(outcome.diagnostics[0].starts_with("[BLOCKED] blocked-path"));
    }

    #[test]
    fn allowed_action_exits_zero_silently() {
        let dir = tempdir().unwrap();
        let layout = ProjectLayout::for_project(dir.path());
        let outcome = evaluate(
            &layout,
            r#"{"tool_name":"Read","tool_input":{"file_path":"src/lib.rs"}}"#,
        );
        assert_eq!(outcome.exit_code, 0);
        assert!(outcome.diagnostics.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn unusable_state_dir_fails_closed() {
        let dir = tempdir().unwrap();
        let layout = ProjectLayout::for_project(dir.path());
        std::fs::create_dir_all(&layout.warden_dir).unwrap();
        // A file where the state directory should be.
        std::fs::write(&layout.state_dir, "not a directory").unwrap();

        let outcome = evaluate(
            &layout,
            r#"{"tool_name":"Read","tool_input":{"file_path":"src/lib.rs"}}"#,
        );
        assert_eq!(outcome.exit_code, 1);
        assert!(outcome.diagnostics[0].contains("enforcement state is unavailable"));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_critical_record_fails_closed() {
        let dir = tempdir().unwrap();
        let layout = ProjectLayout::for_project(dir.path());
        std::fs::create_dir_all(layout.state_dir.join("halt.json")).unwrap();

        let outcome = evaluate(
            &layout,
            r#"{"tool_name":"Write","tool_input":{"file_path":"src/lib.rs","content":"x"}}"#,
        );
        assert_eq!(outcome.exit_code, 1);
        assert!(outcome.diagnostics[0].contains("enforcement state is unavailable"));
    }
}
