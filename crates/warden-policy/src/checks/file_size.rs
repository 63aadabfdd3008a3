// file_size.rs — Keep files below a reviewable size.
//
// The check looks at the file as it *would be* after the edit, so a small
// edit to an already oversized file is still flagged. Whole-file writes are
// judged by their content; edits by the current line count plus the line
// delta of each replacement.

use std::path::Path;

use crate::config::SizeLimits;
use crate::engine::{Check, CheckContext};
use crate::event::{EditPair, ToolInvocation};
use crate::verdict::Finding;

pub const RULE: &str = "file-size";

/// Long-form documents get the larger hard limit.
const DOCUMENT_EXTENSIONS: &[&str] = &["md", "markdown", "txt", "rst", "adoc"];

pub struct FileSizeCheck {
    limits: SizeLimits,
}

impl FileSizeCheck {
    pub fn new(limits: SizeLimits) -> Self {
        Self { limits }
    }

    fn hard_limit_for(&self, path: &str) -> usize {
        let is_document = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                DOCUMENT_EXTENSIONS
                    .iter()
                    .any(|d| d.eq_ignore_ascii_case(ext))
            });
        if is_document {
            self.limits.doc_hard_lines
        } else {
            self.limits.hard_lines
        }
    }
}

fn count_lines(text: &str) -> usize {
    text.lines().count()
}

/// Lines the file would have after applying `edit` to `current`.
fn apply_delta(lines: i64, current: &str, edit: &EditPair) -> i64 {
    let delta = count_lines(&edit.new_string) as i64 - count_lines(&edit.old_string) as i64;
    let occurrences = if edit.replace_all && !edit.old_string.is_empty() {
        current.matches(edit.old_string.as_str()).count() as i64
    } else {
        1
    };
    lines + delta * occurrences
}

/// Projected post-edit line count, or `None` for tools that do not write files.
///
/// Relative paths are resolved against `project_root`. A file that does not
/// exist yet counts as empty.
pub fn projected_line_count(invocation: &ToolInvocation, project_root: &Path) -> Option<usize> {
    let read_current = |file_path: &str| -> String {
        let path = project_root.join(file_path);
        std::fs::read_to_string(path).unwrap_or_default()
    };

    let projected = match invocation {
        ToolInvocation::Write(input) => count_lines(&input.content) as i64,
        ToolInvocation::Edit(input) => {
            let current = read_current(&input.file_path);
            let pair = EditPair {
                old_string: input.old_string.clone(),
                new_string: input.new_string.clone(),
                replace_all: input.replace_all,
            };
            apply_delta(count_lines(&current) as i64, &current, &pair)
        }
        ToolInvocation::MultiEdit(input) => {
            let current = read_current(&input.file_path);
            input
                .edits
                .iter()
                .fold(count_lines(&current) as i64, |lines, edit| {
                    apply_delta(lines, &current, edit)
                })
        }
        _ => return None,
    };
    Some(projected.max(0) as usize)
}

impl Check for FileSizeCheck {
    fn name(&self) -> &'static str {
        RULE
    }

    fn applies_to(&self, invocation: &ToolInvocation) -> bool {
        matches!(
            invocation,
            ToolInvocation::Write(_) | ToolInvocation::Edit(_) | ToolInvocation::MultiEdit(_)
        )
    }

    fn evaluate(&self, ctx: &mut CheckContext<'_>) -> Option<Finding> {
        let projected = projected_line_count(ctx.invocation, ctx.project_root)?;
        let path = ctx.invocation.paths().into_iter().next().unwrap_or_default();
        let hard = self.hard_limit_for(&path);

        if projected > hard {
            Some(Finding::block(
                RULE,
                format!(
                    "{} would grow to {} lines, over the hard limit of {}",
                    path, projected, hard
                ),
                "Split the file into smaller modules before adding to it.",
            ))
        } else if projected > self.limits.soft_lines {
            Some(Finding::warn(
                RULE,
                format!(
                    "{} would have {} lines, over the soft limit of {}",
                    path, projected, self.limits.soft_lines
                ),
                "Plan a split before the file reaches the hard limit.",
            ))
        } else {
            None
        }
    }
}
