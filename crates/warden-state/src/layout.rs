// layout.rs — Where Warden keeps its records inside a project.
//
// Everything lives under `<project>/.warden/`:
//
//   .warden/
//     config.toml        optional overrides
//     state/<domain>.json one record per state domain
//     actions.jsonl      append-only audit/action log
//     rules.jsonl        append-only rule-tracking log
//     archive/           finished task loops

use std::path::{Path, PathBuf};

/// Name of the per-project Warden directory.
pub const WARDEN_DIR: &str = ".warden";

/// Resolved paths for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    /// Root directory of the project (the agent's working directory).
    pub project_root: PathBuf,
    /// `.warden/` directory.
    pub warden_dir: PathBuf,
    /// Directory holding one JSON record per state domain.
    pub state_dir: PathBuf,
    /// Append-only audit/action log.
    pub actions_log: PathBuf,
    /// Append-only rule-tracking log.
    pub rules_log: PathBuf,
    /// Archived task loops.
    pub archive_dir: PathBuf,
    /// Optional configuration overrides.
    pub config_file: PathBuf,
}

impl ProjectLayout {
    /// Create the standard `.warden/` layout for a project.
    pub fn for_project(project_root: impl AsRef<Path>) -> Self {
        let root = project_root.as_ref().to_path_buf();
        let warden_dir = root.join(WARDEN_DIR);
        Self {
            project_root: root,
            state_dir: warden_dir.join("state"),
            actions_log: warden_dir.join("actions.jsonl"),
            rules_log: warden_dir.join("rules.jsonl"),
            archive_dir: warden_dir.join("archive"),
            config_file: warden_dir.join("config.toml"),
            warden_dir,
        }
    }
}
