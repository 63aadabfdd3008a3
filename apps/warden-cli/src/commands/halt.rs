// halt.rs — `warden halt` and `warden resume`.

use chrono::Utc;
use warden_state::{HaltState, ProjectLayout, StateStore};

pub fn halt(layout: &ProjectLayout, reason: &str) -> anyhow::Result<()> {
    let store = StateStore::open(&layout.state_dir)?;
    store.update::<HaltState>(|h| h.halt(reason, Utc::now()))?;
    tracing::info!(reason, "enforcement halt engaged");
    println!("Halted: mutating tools are blocked until `warden resume`.");
    Ok(())
}

pub fn resume(layout: &ProjectLayout) -> anyhow::Result<()> {
    let store = StateStore::open(&layout.state_dir)?;
    let previous: HaltState = store.get();
    if !previous.halted {
        println!("Not halted.");
        return Ok(());
    }
    store.update::<HaltState>(HaltState::resume)?;
    println!("Resumed.");
    Ok(())
}
