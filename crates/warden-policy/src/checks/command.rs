// command.rs — Destructive shell commands.

use std::sync::LazyLock;

use regex::Regex;

use crate::engine::{Check, CheckContext};
use crate::event::ToolInvocation;
use crate::verdict::Finding;

pub const RULE: &str = "dangerous-command";

struct DangerousPattern {
    name: &'static str,
    regex: Regex,
    remediation: &'static str,
}

fn pattern(name: &'static str, regex: &str, remediation: &'static str) -> DangerousPattern {
    DangerousPattern {
        name,
        regex: Regex::new(regex).expect("dangerous command regex is valid"),
        remediation,
    }
}

static DANGEROUS_COMMANDS: LazyLock<Vec<DangerousPattern>> = LazyLock::new(|| {
    vec![
        pattern(
            "recursive delete of root or home",
            r"\brm\s+(?:-\S+\s+)*-[a-zA-Z]*[rR][a-zA-Z]*\s+(?:-\S+\s+)*(?:/\*?|~/?|\$HOME/?)(?:\s|;|$)",
            "Delete specific paths inside the project instead.",
        ),
        pattern(
            "force push",
            r"\bgit\s+push\b[^;&|]*\s(?:--force|-f)(?:\s|$)",
            "Push normally, or use --force-with-lease after confirming with the user.",
        ),
        pattern(
            "hard reset",
            r"\bgit\s+reset\b[^;&|]*\s--hard\b",
            "Use `git stash` or a soft reset so work is not discarded.",
        ),
        pattern(
            "skipped hooks",
            r"\s--no-verify\b",
            "Let the hooks run and fix what they report.",
        ),
        pattern(
            "download piped to a shell",
            r"\b(?:curl|wget)\b[^|;&]*\|\s*(?:sudo\s+)?(?:ba|z|da|k)?sh\b",
            "Download the script, read it, then run it explicitly.",
        ),
        pattern(
            "filesystem format",
            r"\bmkfs(?:\.\w+)?\b",
            "Formatting devices is never part of a coding task.",
        ),
        pattern(
            "raw write to a device",
            r"\bdd\b[^;&|]*\bof=/dev/",
            "Write to a regular file instead.",
        ),
        pattern(
            "world-writable recursive chmod",
            r"\bchmod\s+(?:-\S+\s+)*-R\s+(?:-\S+\s+)*0?777\b|\bchmod\s+0?777\s+-R\b",
            "Grant the narrowest permissions the task needs.",
        ),
    ]
});

pub struct DangerousCommandCheck;

impl Check for DangerousCommandCheck {
    fn name(&self) -> &'static str {
        RULE
    }

    fn applies_to(&self, invocation: &ToolInvocation) -> bool {
        invocation.command().is_some()
    }

    fn evaluate(&self, ctx: &mut CheckContext<'_>) -> Option<Finding> {
        let command = ctx.invocation.command()?;
        DANGEROUS_COMMANDS
            .iter()
            .find(|p| p.regex.is_match(command))
            .map(|p| {
                Finding::block(
                    RULE,
                    format!("command looks like a {}: {}", p.name, command),
                    p.remediation,
                )
            })
    }
}
