// secrets.rs — Credentials must not be written into the project.

use std::sync::LazyLock;

use regex::Regex;

use crate::engine::{Check, CheckContext};
use crate::event::{ToolClass, ToolInvocation};
use crate::verdict::Finding;

pub const RULE: &str = "secret-content";

static SECRET_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    vec![
        (
            "private key",
            Regex::new(r"-----BEGIN (?:RSA |EC |DSA |OPENSSH |ENCRYPTED |PGP )?PRIVATE KEY(?: BLOCK)?-----")
                .expect("private key regex is valid"),
        ),
        (
            "AWS access key id",
            Regex::new(r"\b(?:AKIA|ASIA)[0-9A-Z]{16}\b").expect("access key regex is valid"),
        ),
    ]
});

pub struct SecretContentCheck;

impl Check for SecretContentCheck {
    fn name(&self) -> &'static str {
        RULE
    }

    fn applies_to(&self, invocation: &ToolInvocation) -> bool {
        invocation.class() == ToolClass::Edit
    }

    fn evaluate(&self, ctx: &mut CheckContext<'_>) -> Option<Finding> {
        let content = ctx.invocation.written_content();
        let (kind, _) = SECRET_PATTERNS
            .iter()
            .find(|(_, re)| content.iter().any(|text| re.is_match(text)))?;
        Some(Finding::block(
            RULE,
            format!("the new content contains a {}", kind),
            "Reference the secret through an environment variable or secret store; never commit it.",
        ))
    }
}
