// report.rs — `warden report`: compliance summary over both logs.

use chrono::{DateTime, Utc};
use warden_audit::{ActionLog, ComplianceReport, RuleLog};
use warden_loop::sop_score;
use warden_state::ProjectLayout;

pub fn execute(layout: &ProjectLayout, since: Option<DateTime<Utc>>, json: bool) -> anyhow::Result<()> {
    let actions = ActionLog::read_all(&layout.actions_log)?;
    let violations = RuleLog::new(&layout.rules_log).read_all()?;
    let report = ComplianceReport::build(&actions, &violations, since);
    let sop = sop_score(report.distinct_rules());

    if json {
        let mut value = serde_json::to_value(&report)?;
        value["sop_score"] = serde_json::json!(sop);
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match report.since {
        Some(since) => println!("Compliance since {}", since.format("%Y-%m-%d %H:%M:%S")),
        None => println!("Compliance (all records)"),
    }
    println!(
        "Evaluated: {}  pass: {}  warn: {}  block: {}  ({:.1}% blocked)",
        report.evaluated,
        report.passed,
        report.warned,
        report.blocked,
        report.block_rate * 100.0
    );
    println!("Failed tool results: {}", report.failed_results);
    println!("SOP score: {} ({} distinct rule(s) violated)", sop, report.distinct_rules());

    if !report.per_tool.is_empty() {
        println!();
        println!("{:<16} {:>6} {:>6} {:>6}", "TOOL", "PASS", "WARN", "BLOCK");
        for (tool, tally) in &report.per_tool {
            println!("{:<16} {:>6} {:>6} {:>6}", tool, tally.pass, tally.warn, tally.block);
        }
    }

    if !report.top_rules.is_empty() {
        println!();
        println!("Top violated rules:");
        for tally in &report.top_rules {
            println!("  {:<20} {}", tally.rule, tally.count);
        }
    }
    Ok(())
}
