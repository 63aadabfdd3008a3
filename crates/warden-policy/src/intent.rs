// intent.rs — Detect requirements and modifiers in a user prompt.
//
// Detection is a capability behind `IntentDetector`, so the enforcer does not
// care whether intent comes from keyword tables or something smarter. The
// stock detector uses compiled regex tables.

use std::sync::LazyLock;

use regex::Regex;

/// What a prompt asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectedIntent {
    /// Requirement names in table order ("research", "plan", "tests").
    pub requirements: Vec<String>,
    /// Modifiers. "no-commit" is the only one; commit discipline reads it.
    pub modifiers: Vec<String>,
}

impl DetectedIntent {
    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty() && self.modifiers.is_empty()
    }
}

pub trait IntentDetector {
    fn detect(&self, prompt: &str) -> DetectedIntent;
}

static REQUIREMENT_TABLE: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    vec![
        (
            "research",
            Regex::new(r"(?i)\b(research|investigate|look\s+up|find\s+out|explore)\b")
                .expect("research intent regex is valid"),
        ),
        (
            "plan",
            Regex::new(r"(?i)\b(plan|design|architect|step[\s-]by[\s-]step)\b")
                .expect("plan intent regex is valid"),
        ),
        (
            "tests",
            Regex::new(r"(?i)\b(tests?|tdd|verify|coverage)\b")
                .expect("tests intent regex is valid"),
        ),
    ]
});

static MODIFIER_TABLE: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    vec![
        (
            "no-commit",
            Regex::new(r"(?i)\b(don'?t|do\s+not|no|never)\s+commit")
                .expect("no-commit modifier regex is valid"),
        ),
    ]
});

/// Keyword-table detector.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternIntentDetector;

impl PatternIntentDetector {
    pub fn standard() -> Self {
        Self
    }
}

impl IntentDetector for PatternIntentDetector {
    fn detect(&self, prompt: &str) -> DetectedIntent {
        let matching = |table: &[(&'static str, Regex)]| -> Vec<String> {
            table
                .iter()
                .filter(|(_, re)| re.is_match(prompt))
                .map(|(name, _)| name.to_string())
                .collect()
        };
        DetectedIntent {
            requirements: matching(REQUIREMENT_TABLE.as_slice()),
            modifiers: matching(MODIFIER_TABLE.as_slice()),
        }
    }
}
