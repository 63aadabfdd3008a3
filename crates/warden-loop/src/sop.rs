// sop.rs — Standard-operating-procedure score.

/// Score a task loop by the number of distinct rules violated since it
/// started: a clean run scores 10, and the score never drops below 5.
pub fn sop_score(unique_violations: usize) -> u8 {
    match unique_violations {
        0 => 10,
        1 => 9,
        2 => 8,
        3 | 4 => 7,
        5 | 6 => 6,
        _ => 5,
    }
}
