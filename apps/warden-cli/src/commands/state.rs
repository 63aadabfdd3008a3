// state.rs — Read-only views of session state: requirements, patterns.

use warden_state::{PatternLog, ProjectLayout, RequirementSet, StateStore};

const EVIDENCE_KINDS: [&str; 3] = ["research", "tests", "plan"];

pub fn requirements(layout: &ProjectLayout, json: bool) -> anyhow::Result<()> {
    let store = StateStore::open(&layout.state_dir)?;
    let requirements: RequirementSet = store.get();

    if json {
        println!("{}", serde_json::to_string_pretty(&requirements)?);
        return Ok(());
    }

    if requirements.requested().is_empty() && requirements.modifiers().is_empty() {
        println!("No requirements detected for the current task.");
        return Ok(());
    }

    for name in requirements.requested() {
        let mark = if requirements.is_satisfied(name) { "x" } else { " " };
        println!("  [{}] {}", mark, name);
    }
    if !requirements.modifiers().is_empty() {
        let modifiers: Vec<&str> = requirements.modifiers().iter().map(String::as_str).collect();
        println!("Modifiers: {}", modifiers.join(", "));
    }
    let evidence: Vec<String> = EVIDENCE_KINDS
        .iter()
        .filter(|kind| requirements.evidence(kind) > 0)
        .map(|kind| format!("{}={}", kind, requirements.evidence(kind)))
        .collect();
    if !evidence.is_empty() {
        println!("Evidence:  {}", evidence.join(", "));
    }
    if let Some(at) = requirements.timestamp() {
        println!("Detected:  {}", at.format("%Y-%m-%d %H:%M:%S"));
    }
    Ok(())
}

pub fn patterns(layout: &ProjectLayout, json: bool) -> anyhow::Result<()> {
    let store = StateStore::open(&layout.state_dir)?;
    let log: PatternLog = store.get();

    if json {
        println!("{}", serde_json::to_string_pretty(&log)?);
        return Ok(());
    }

    if log.counters().is_empty() {
        println!("No patterns detected.");
        return Ok(());
    }

    for (pattern, count) in log.counters() {
        println!("{:<16} {}", pattern, count);
    }
    println!();
    println!("{:<20} {:<12} REASON", "TIMESTAMP", "PATTERN");
    println!("{}", "-".repeat(72));
    for event in log.events() {
        println!(
            "{:<20} {:<12} {}",
            event.timestamp.format("%Y-%m-%d %H:%M:%S"),
            event.pattern,
            event.reason
        );
    }
    Ok(())
}
