// summary.rs — End-of-task summary schema.
//
// A summary must contain three lines:
//
//   Rating: <anything> (SOP: N)   N must equal the computed SOP score
//   Done: <what was achieved>
//   Next: <what comes next>
//
// A rating without the SOP figure is a casual self-rating and is rejected.
// When rules were violated during the loop, the Next line has to engage with
// them: name one of the violated rules, or talk about a rule, a fix, or
// stopping.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

static RATING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^[ \t]*rating:[ \t]*(.*)$").expect("rating regex is valid"));

static SOP_FIGURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\(\s*SOP:\s*(\d+)\s*\)").expect("SOP regex is valid"));

static DONE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^[ \t]*done:[ \t]*(.*)$").expect("done regex is valid"));

static NEXT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^[ \t]*next:[ \t]*(.*)$").expect("next regex is valid"));

/// Words that show a Next line is addressing violations.
const REMEDIATION_WORDS: &[&str] = &["rule", "fix", "stop"];

fn line_content<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

/// Check a summary against the schema. Returns every problem found.
pub fn validate_summary(
    text: &str,
    expected_sop: u8,
    violated_rules: &BTreeSet<String>,
) -> Result<(), Vec<String>> {
    let mut reasons = Vec::new();

    match line_content(&RATING_LINE, text) {
        None => reasons.push("missing a 'Rating:' line".to_string()),
        Some(rating) => match SOP_FIGURE.captures(rating).and_then(|c| c[1].parse::<u32>().ok()) {
            None => reasons.push(format!(
                "casual self-rating: the Rating line must include the computed score as '(SOP: {})'",
                expected_sop
            )),
            Some(claimed) if claimed != u32::from(expected_sop) => reasons.push(format!(
                "Rating reports SOP {} but the computed SOP score is {}",
                claimed, expected_sop
            )),
            Some(_) => {}
        },
    }

    match line_content(&DONE_LINE, text) {
        Some(done) if !done.is_empty() => {}
        _ => reasons.push("missing a 'Done:' line describing what was achieved".to_string()),
    }

    match line_content(&NEXT_LINE, text) {
        Some(next) if !next.is_empty() => {
            if !violated_rules.is_empty() {
                let lower = next.to_lowercase();
                let addressed = violated_rules
                    .iter()
                    .any(|rule| lower.contains(&rule.to_lowercase()))
                    || REMEDIATION_WORDS.iter().any(|w| lower.contains(w));
                if !addressed {
                    reasons.push(format!(
                        "rules were violated during this loop ({}); the Next line must say how they will be addressed",
                        violated_rules.iter().cloned().collect::<Vec<_>>().join(", ")
                    ));
                }
            }
        }
        _ => reasons.push("missing a 'Next:' line".to_string()),
    }

    if reasons.is_empty() {
        Ok(())
    } else {
        Err(reasons)
    }
}
