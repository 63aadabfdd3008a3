// paths.rs — Blocked-path detection over every canonical form of a path.
//
// A path is checked in several spellings: as given, percent-decoded, with `~`
// expanded, lexically normalized against the project root, and with symlinks
// resolved. Each spelling is tested against
//
// - denylisted prefixes (system directories, cloud credential stores),
// - sensitive directory names appearing as *any* component, so
//   `a/../.ssh/x` and `docs/.SSH/key` are caught as well as `~/.ssh/x`,
// - glob patterns for credential files, plus configured extras.

use std::path::{Component, Path, PathBuf};

use glob::{MatchOptions, Pattern};

use crate::event::ToolInvocation;
use crate::verdict::Finding;

pub const RULE: &str = "blocked-path";

/// Absolute prefixes no tool may touch.
const DENIED_PREFIXES: &[&str] = &[
    "/etc", "/usr", "/bin", "/sbin", "/boot", "/sys", "/proc", "/dev",
];

/// Home-relative prefixes no tool may touch.
const DENIED_HOME_PREFIXES: &[&str] = &[".config/gcloud", ".azure", ".netrc"];

/// Directory names that are sensitive wherever they appear.
const SENSITIVE_COMPONENTS: &[&str] = &[
    ".ssh",
    ".aws",
    ".gnupg",
    ".kube",
    ".docker",
    ".password-store",
    ".warden",
];

const DENIED_GLOBS: &[&str] = &["**/.env", "**/*.pem", "**/id_rsa*"];

/// Device files shell commands legitimately redirect to.
const HARMLESS_DEVICES: &[&str] = &[
    "/dev/null",
    "/dev/stdin",
    "/dev/stdout",
    "/dev/stderr",
    "/dev/tty",
    "/dev/zero",
    "/dev/random",
    "/dev/urandom",
];

/// Percent-decoding is repeated at most this many times.
const MAX_DECODE_PASSES: usize = 3;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// A compiled deny pattern. `**/name` patterns also match on the file name
/// alone, so they apply to absolute paths regardless of depth.
struct DenyPattern {
    source: String,
    full: Pattern,
    file_name: Option<Pattern>,
}

impl DenyPattern {
    fn compile(source: &str) -> Option<Self> {
        let full = match Pattern::new(source) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(pattern = source, error = %e, "ignoring invalid deny pattern");
                return None;
            }
        };
        let file_name = source
            .strip_prefix("**/")
            .filter(|rest| !rest.contains('/'))
            .and_then(|rest| Pattern::new(rest).ok());
        Some(Self {
            source: source.to_string(),
            full,
            file_name,
        })
    }

    fn matches(&self, path: &Path) -> bool {
        if self.full.matches_path_with(path, MATCH_OPTIONS) {
            return true;
        }
        match (&self.file_name, path.file_name().and_then(|n| n.to_str())) {
            (Some(pattern), Some(name)) => pattern.matches_with(name, MATCH_OPTIONS),
            _ => false,
        }
    }
}

/// Decides whether a path may be touched at all.
pub struct PathGuard {
    project_root: PathBuf,
    home: Option<PathBuf>,
    patterns: Vec<DenyPattern>,
}

impl PathGuard {
    /// Guard for a project, with extra glob patterns from config.
    pub fn new(project_root: impl Into<PathBuf>, extra_patterns: &[String]) -> Self {
        let patterns = DENIED_GLOBS
            .iter()
            .copied()
            .chain(extra_patterns.iter().map(String::as_str))
            .filter_map(DenyPattern::compile)
            .collect();
        Self {
            project_root: project_root.into(),
            home: dirs::home_dir(),
            patterns,
        }
    }

    /// Override the home directory used for `~` expansion.
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    /// Every spelling of `raw` worth checking, deduplicated, raw first.
    pub fn canonical_forms(&self, raw: &str) -> Vec<PathBuf> {
        let mut texts = vec![raw.to_string()];
        let mut current = raw.to_string();
        for _ in 0..MAX_DECODE_PASSES {
            let decoded = match urlencoding::decode(&current) {
                Ok(d) if d != current => d.into_owned(),
                _ => break,
            };
            texts.push(decoded.clone());
            current = decoded;
        }

        let mut forms: Vec<PathBuf> = Vec::new();
        let mut add = |p: PathBuf| {
            if !forms.contains(&p) {
                forms.push(p);
            }
        };
        for text in &texts {
            let expanded = self.expand_home(text);
            let normalized = normalize_lexically(&expanded, &self.project_root);
            let resolved = resolve_symlinks(&normalized);
            add(PathBuf::from(text));
            add(expanded);
            add(normalized);
            if let Some(resolved) = resolved {
                add(resolved);
            }
        }
        forms
    }

    /// A block finding if any form of `raw` is protected.
    pub fn check(&self, raw: &str) -> Option<Finding> {
        let forms = self.canonical_forms(raw);
        let normalized = normalize_lexically(&self.expand_home(raw), &self.project_root);
        if HARMLESS_DEVICES.iter().any(|d| normalized == Path::new(d)) {
            return None;
        }

        for form in &forms {
            if let Some(reason) = self.denial_reason(form) {
                tracing::debug!(path = raw, form = %form.display(), %reason, "path denied");
                return Some(Finding::block(
                    RULE,
                    format!("'{}' {}", raw, reason),
                    "Work inside the project directory and leave credentials, \
                     system files and Warden state alone.",
                ));
            }
        }
        None
    }

    fn denial_reason(&self, form: &Path) -> Option<String> {
        if form.is_absolute() {
            if let Some(prefix) = DENIED_PREFIXES.iter().find(|p| form.starts_with(p)) {
                return Some(format!("is under the protected system directory {}", prefix));
            }
            if let Some(home) = &self.home {
                if let Some(prefix) = DENIED_HOME_PREFIXES
                    .iter()
                    .find(|p| form.starts_with(home.join(p)))
                {
                    return Some(format!("is under the protected location ~/{}", prefix));
                }
            }
        }

        for component in form.components() {
            if let Component::Normal(part) = component {
                let lower = part.to_string_lossy().to_lowercase();
                if SENSITIVE_COMPONENTS.contains(&lower.as_str()) {
                    return Some(format!(
                        "passes through the sensitive directory {}",
                        lower
                    ));
                }
            }
        }

        self.patterns
            .iter()
            .find(|p| p.matches(form))
            .map(|p| format!("matches the protected file pattern {}", p.source))
    }

    fn expand_home(&self, text: &str) -> PathBuf {
        match (&self.home, text) {
            (Some(home), "~") => home.clone(),
            (Some(home), t) if t.starts_with("~/") => home.join(&t[2..]),
            _ => PathBuf::from(text),
        }
    }
}

/// Check every path an invocation names. The first protected one wins.
pub fn check_blocked_path(invocation: &ToolInvocation, guard: &PathGuard) -> Option<Finding> {
    invocation
        .paths()
        .iter()
        .find_map(|path| guard.check(path))
}

/// Resolve `.` and `..` without touching the filesystem.
fn normalize_lexically(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonicalize the deepest existing ancestor and re-append the rest, so
/// paths that do not exist yet still have their symlinked parents resolved.
fn resolve_symlinks(path: &Path) -> Option<PathBuf> {
    let mut existing = path;
    let mut remainder = Vec::new();
    loop {
        if let Ok(resolved) = std::fs::canonicalize(existing) {
            let mut out = resolved;
            for part in remainder.iter().rev() {
                out.push(part);
            }
            return Some(out);
        }
        remainder.push(existing.file_name()?.to_os_string());
        existing = existing.parent()?;
    }
}
