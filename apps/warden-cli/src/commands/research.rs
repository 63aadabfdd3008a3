// research.rs — Research subcommands: mark, status, reset.

use chrono::Utc;
use clap::Subcommand;
use warden_state::{ProjectLayout, ResearchCategory, ResearchStatus, StateStore};

#[derive(Subcommand)]
pub enum ResearchCommands {
    /// Mark a research category complete.
    Mark {
        /// memory, docs, web, external-examples, or local-code.
        category: ResearchCategory,
    },
    /// Show which categories are complete.
    Status,
    /// Clear all research progress.
    Reset,
}

pub fn execute(cmd: &ResearchCommands, layout: &ProjectLayout) -> anyhow::Result<()> {
    let store = StateStore::open(&layout.state_dir)?;

    match cmd {
        ResearchCommands::Mark { category } => {
            let status = store.update::<ResearchStatus>(|r| r.mark_complete(*category, Utc::now()))?;
            println!(
                "Research '{}' marked complete ({}/{}).",
                category,
                status.completed_count(),
                ResearchCategory::ALL.len()
            );
        }

        ResearchCommands::Status => {
            let status: ResearchStatus = store.get();
            for category in ResearchCategory::ALL {
                match status.completed_at(category) {
                    Some(at) => println!("  [x] {:<18} {}", category.as_str(), at.format("%Y-%m-%d %H:%M:%S")),
                    None => println!("  [ ] {}", category),
                }
            }
        }

        ResearchCommands::Reset => {
            store.reset::<ResearchStatus>()?;
            println!("Research progress cleared.");
        }
    }

    Ok(())
}
