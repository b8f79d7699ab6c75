//! Ignore rules discovered from per-directory ignore files
//!
//! Every directory below the root may hold an ignore file. Its patterns form a
//! scope that applies to everything physically inside that directory. A path is
//! ignored when any pattern of any covering scope matches either its basename
//! or its location relative to the scope directory.

use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::debug;
use walkdir::WalkDir;

/// Patterns contributed by one ignore file
#[derive(Debug, Clone)]
pub struct IgnoreScope {
    /// Directory containing the ignore file
    pub dir: PathBuf,
    /// Patterns in declaration order
    pub patterns: Vec<String>,
    matcher: GlobSet,
}

impl IgnoreScope {
    /// Compile a scope; patterns that are not valid globs are dropped
    pub fn new(dir: impl Into<PathBuf>, patterns: Vec<String>) -> Self {
        let dir = dir.into();
        let mut builder = GlobSetBuilder::new();
        let mut kept = Vec::with_capacity(patterns.len());

        for pattern in patterns {
            match GlobBuilder::new(&pattern).literal_separator(true).build() {
                Ok(glob) => {
                    builder.add(glob);
                    kept.push(pattern);
                }
                Err(e) => debug!(scope = %dir.display(), %pattern, "dropping invalid pattern: {}", e),
            }
        }

        let matcher = builder.build().unwrap_or_else(|e| {
            debug!(scope = %dir.display(), "ignore scope disabled: {}", e);
            GlobSet::empty()
        });

        Self {
            dir,
            patterns: kept,
            matcher,
        }
    }

    /// Whether this scope covers `path` (the path lies inside the scope directory)
    pub fn covers(&self, path: &Path) -> bool {
        path.starts_with(&self.dir) && path != self.dir
    }

    /// Whether any pattern matches the basename or the scope-relative path
    pub fn matches(&self, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(&self.dir) else {
            return false;
        };
        if path.file_name().is_some_and(|name| self.matcher.is_match(name)) {
            return true;
        }
        self.matcher.is_match(relative)
    }
}

/// Parse ignore file content into patterns (skips blanks and `#` comments)
pub fn parse_patterns(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// All ignore scopes below a root, ordered shallowest first
#[derive(Debug, Clone, Default)]
pub struct IgnoreRuleSet {
    scopes: Vec<IgnoreScope>,
}

impl IgnoreRuleSet {
    /// Walk `root` once and load `ignore_file_name` from every directory.
    ///
    /// Unreadable ignore files and unreadable directories contribute nothing.
    pub fn build(root: &Path, ignore_file_name: &str) -> Self {
        let mut scopes = Vec::new();

        let dirs = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir());

        for entry in dirs {
            let ignore_file = entry.path().join(ignore_file_name);
            if !ignore_file.is_file() {
                continue;
            }
            match std::fs::read_to_string(&ignore_file) {
                Ok(content) => {
                    let patterns = parse_patterns(&content);
                    debug!(file = %ignore_file.display(), count = patterns.len(), "loaded ignore patterns");
                    if !patterns.is_empty() {
                        scopes.push(IgnoreScope::new(entry.path(), patterns));
                    }
                }
                Err(e) => debug!(file = %ignore_file.display(), "unreadable ignore file: {}", e),
            }
        }

        Self::from_scopes(scopes)
    }

    /// Build from explicit scopes
    pub fn from_scopes(mut scopes: Vec<IgnoreScope>) -> Self {
        scopes.sort_by(|a, b| {
            a.dir
                .components()
                .count()
                .cmp(&b.dir.components().count())
                .then_with(|| a.dir.cmp(&b.dir))
        });
        Self { scopes }
    }

    pub fn scopes(&self) -> &[IgnoreScope] {
        &self.scopes
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Whether `path` is ignored by any scope covering it.
    ///
    /// `path` must be expressed the same way as the root passed to
    /// [`IgnoreRuleSet::build`] (both absolute, or both relative to the same
    /// directory).
    pub fn is_ignored(&self, path: &Path) -> bool {
        self.scopes
            .iter()
            .filter(|scope| scope.covers(path))
            .any(|scope| scope.matches(path))
    }
}
