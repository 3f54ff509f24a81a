//! Ignore pattern matching
//!
//! Decides whether a root-relative path is hidden from clients. Hidden paths
//! are reported as missing, never as forbidden.

use glob::{MatchOptions, Pattern};

/// Patterns that are always active
const IMPLICIT_PATTERNS: [&str; 2] = ["*.env", ".git"];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Compiled ignore rules
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    dot_files: bool,
    globs: Vec<Pattern>,
    prefixes: Vec<String>,
}

impl IgnoreMatcher {
    /// Compile user patterns together with the implicit ones
    ///
    /// Patterns containing `*`, `?` or `[` are globs; anything else (or a glob
    /// that fails to compile) is a literal path prefix.
    pub fn new<S: AsRef<str>>(patterns: &[S], dot_files: bool) -> Self {
        let mut globs = Vec::new();
        let mut prefixes = Vec::new();

        let all = IMPLICIT_PATTERNS
            .iter()
            .copied()
            .chain(patterns.iter().map(AsRef::as_ref));

        for raw in all {
            let pattern = normalize(raw);
            if pattern.is_empty() {
                continue;
            }
            if is_glob(pattern) {
                match Pattern::new(pattern) {
                    Ok(compiled) => {
                        globs.push(compiled);
                        continue;
                    }
                    Err(e) => crate::logger::log_warning(&format!(
                        "Ignore pattern '{raw}' is not a valid glob ({e}), matching it literally"
                    )),
                }
            }
            prefixes.push(pattern.to_string());
        }

        Self {
            dot_files,
            globs,
            prefixes,
        }
    }

    /// Whether `relative` (slash separated, leading/trailing slashes allowed)
    /// must be treated as missing
    pub fn is_ignored(&self, relative: &str) -> bool {
        let relative = normalize(relative);
        if relative.is_empty() {
            return false;
        }

        if !self.dot_files && relative.split('/').any(|segment| segment.starts_with('.')) {
            return true;
        }

        if self
            .prefixes
            .iter()
            .any(|prefix| is_inside(relative, prefix))
        {
            return true;
        }

        ancestors(relative).any(|candidate| {
            self.globs
                .iter()
                .any(|glob| glob.matches_with(candidate, MATCH_OPTIONS))
        })
    }
}

fn normalize(path: &str) -> &str {
    let path = path.strip_prefix("./").unwrap_or(path);
    path.trim_matches('/')
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// `path` equals `prefix` or lies below it
fn is_inside(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// `a`, `a/b`, `a/b/c` for `a/b/c`
fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    path.match_indices('/')
        .map(move |(idx, _)| &path[..idx])
        .chain(std::iter::once(path))
}
