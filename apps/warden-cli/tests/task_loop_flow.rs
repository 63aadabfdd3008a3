// task_loop_flow.rs — End-to-end test of the task loop on a real project dir.
//
// Flow:
//   1. loop start "Fix bug" with a budget of 2 and one criterion
//   2. two logged steps push the loop past its budget (advisory only)
//   3. the criterion is checked
//   4. a summary quoting the wrong SOP score is rejected; the right one passes
//   5. complete archives the loop and clears task-scoped state
//
// A second test shows rules blocked by the hook feeding the SOP score.

use std::fs;

use warden_loop::{ArchivedLoop, LoopError, LoopOutcome, StartRequest, TaskLoop};
use warden_policy::Enforcer;
use warden_state::{ProjectLayout, RequirementSet, ResearchCategory, ResearchStatus, StateStore};
use tempfile::TempDir;

#[test]
fn task_loop_start_to_archive() {
    let project = TempDir::new().unwrap();
    let layout = ProjectLayout::for_project(project.path());
    let tl = TaskLoop::open(&layout).unwrap();

    // 1. Start.
    let state = tl
        .start(StartRequest {
            task: "Fix bug".into(),
            max_iterations: Some(2),
            criteria: vec!["Tests pass".into()],
            promise: "Auth works".into(),
            ..StartRequest::default()
        })
        .unwrap();
    assert_eq!(state.iteration, 1);

    // Task-scoped state that completion must clear.
    let store = StateStore::open(&layout.state_dir).unwrap();
    store
        .update::<ResearchStatus>(|r| r.mark_complete(ResearchCategory::Docs, chrono::Utc::now()))
        .unwrap();

    // 2. Two steps; the second goes over budget but is still accepted.
    let first = tl.log("reproduced the bug", "login fails on expired token", None).unwrap();
    assert!(!first.over_budget);
    let second = tl.log("refreshed token before retry", "login works", None).unwrap();
    assert_eq!(second.iteration, 3);
    assert!(second.over_budget);

    // Not done yet: the criterion is unchecked.
    match tl.complete() {
        Err(LoopError::CriteriaUnchecked(ids)) => assert_eq!(ids, vec![1]),
        other => panic!("expected CriteriaUnchecked, got {:?}", other),
    }

    // 3. Check it.
    tl.check(1).unwrap();
    assert!(matches!(tl.complete(), Err(LoopError::SummaryMissing)));

    // 4. Summaries.
    let wrong = "Rating: 9/10 (SOP: 9)\nDone: fixed token refresh\nNext: none";
    match tl.summary(wrong) {
        Err(LoopError::SummaryRejected { reasons }) => {
            assert!(reasons.iter().any(|r| r.contains("computed SOP score is 10")));
        }
        other => panic!("expected SummaryRejected, got {:?}", other),
    }
    assert!(!tl.status().unwrap().unwrap().summary_provided);

    let right = "Rating: 9/10 (SOP: 10)\nDone: fixed token refresh\nNext: none";
    assert_eq!(tl.summary(right).unwrap().sop_score, Some(10));

    // 5. Complete.
    let archived = tl.complete().unwrap();
    assert_eq!(archived.outcome, LoopOutcome::Completed);
    assert!(tl.status().unwrap().is_none());

    let name = archived.path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("task-loop-") && name.ends_with(".json"));
    let record: ArchivedLoop = serde_json::from_str(&fs::read_to_string(&archived.path).unwrap()).unwrap();
    assert_eq!(record.state.task, "Fix bug");
    assert_eq!(record.state.iteration_log.len(), 2);
    assert_eq!(record.state.sop_score, Some(10));

    assert_eq!(store.get::<ResearchStatus>(), ResearchStatus::default());
    assert_eq!(store.get::<RequirementSet>(), RequirementSet::default());

    // A new loop can start.
    assert!(tl
        .start(StartRequest {
            task: "Next task".into(),
            promise: "done".into(),
            ..StartRequest::default()
        })
        .is_ok());
}

#[test]
fn hook_blocks_during_a_loop_lower_the_sop_score() {
    let project = TempDir::new().unwrap();
    let layout = ProjectLayout::for_project(project.path());
    let tl = TaskLoop::open(&layout).unwrap();
    tl.start(StartRequest {
        task: "Tidy config loading".into(),
        promise: "config loads".into(),
        ..StartRequest::default()
    })
    .unwrap();

    let enforcer = Enforcer::open(layout.clone()).unwrap();
    let verdict = enforcer
        .handle_json(r#"{"tool_name":"Read","tool_input":{"file_path":"/etc/passwd"}}"#)
        .unwrap();
    assert!(verdict.is_blocked());

    let (score, violated) = tl.current_sop().unwrap();
    assert_eq!(score, 9);
    assert_eq!(violated, vec!["blocked-path".to_string()]);

    let ignores = "Rating: fine (SOP: 9)\nDone: tidied\nNext: more tidying";
    assert!(tl.summary(ignores).is_err());
    let addresses = "Rating: fine (SOP: 9)\nDone: tidied\nNext: keep out of blocked-path areas";
    assert!(tl.summary(addresses).is_ok());

    let archived = tl.cancel().unwrap();
    assert_eq!(archived.outcome, LoopOutcome::Cancelled);
}
