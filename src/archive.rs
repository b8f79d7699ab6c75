//! Archive data structures

use std::path::{Component, Path, PathBuf};

use crate::error::SkipReason;

// Flat archive format constants
pub const HEADER_PREFIX: &str = "// ";
pub const HEADER_PREFIX_LEN: usize = 3; // len("// ")
pub const BINARY_SENTINEL: &str = "// (binary file)";
pub const DEFAULT_IGNORE_FILE: &str = ".flatignore";
/// Minimum number of bytes the classifier inspects
pub const MIN_SNIFF_LEN: usize = 1024;

/// Body of a single record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordBody {
    /// Text content, exactly as it will be written to disk
    Text(Vec<u8>),
    /// Placeholder for a binary file whose bytes were not archived
    Binary,
}

/// One file's header plus its body within the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// POSIX-style path relative to the archive root
    pub path: String,
    pub body: RecordBody,
}

impl Record {
    /// Create a text record
    pub fn text(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            body: RecordBody::Text(content.into()),
        }
    }

    /// Create a binary placeholder record
    pub fn binary(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            body: RecordBody::Binary,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self.body, RecordBody::Binary)
    }

    /// Size of the text body in bytes (0 for binary placeholders)
    pub fn len(&self) -> usize {
        match &self.body {
            RecordBody::Text(data) => data.len(),
            RecordBody::Binary => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Format the header line (without line terminator)
    pub fn header(&self) -> String {
        format!("{}{}", HEADER_PREFIX, self.path)
    }

    /// Parse a header line, returning the path it announces.
    ///
    /// The line terminator (`\n` or `\r\n`) is not part of the path.
    pub fn parse_header(line: &str) -> Option<&str> {
        let line = strip_line_ending(line);
        line.strip_prefix(HEADER_PREFIX)
    }

    /// Whether a line is the binary sentinel
    pub fn is_sentinel(line: &str) -> bool {
        strip_line_ending(line) == BINARY_SENTINEL
    }
}

fn strip_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Count lines of text that would be read back as record headers
pub fn count_header_like_lines(text: &str) -> usize {
    text.lines()
        .filter(|line| line.starts_with(HEADER_PREFIX))
        .count()
}

/// Convert a path relative to the archive root into its archive name.
///
/// Returns `None` if the path is not a plain relative path
/// (absolute, contains `..`, or is empty).
pub fn archive_name(relative: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Resolve an archive name below `base`, rejecting names that would escape it
pub fn resolve_under(base: &Path, name: &str) -> Result<PathBuf, SkipReason> {
    let relative = Path::new(name);
    if name.is_empty() || relative.is_absolute() {
        return Err(SkipReason::UnsafePath);
    }
    let mut resolved = base.to_path_buf();
    let mut depth = 0usize;
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                resolved.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(SkipReason::UnsafePath);
            }
        }
    }
    if depth == 0 {
        return Err(SkipReason::UnsafePath);
    }
    Ok(resolved)
}

/// Make a path absolute and lexically normalized, without touching symlinks
pub fn normalize_path(path: &Path) -> std::io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}

/// Options for building an archive
#[derive(Debug, Clone)]
pub struct ArchiveOptions {
    /// Emit binary files as sentinel records instead of skipping them
    pub include_binary: bool,
    /// Report skipped items through the log
    pub verbose: bool,
    /// Name of the per-directory ignore file
    pub ignore_file_name: String,
    /// Number of leading bytes inspected by the classifier
    pub sniff_len: usize,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            include_binary: false,
            verbose: false,
            ignore_file_name: DEFAULT_IGNORE_FILE.to_string(),
            sniff_len: MIN_SNIFF_LEN,
        }
    }
}

impl ArchiveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_include_binary(mut self, include_binary: bool) -> Self {
        self.include_binary = include_binary;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_ignore_file_name(mut self, name: impl Into<String>) -> Self {
        self.ignore_file_name = name.into();
        self
    }

    /// Set the classifier window; values below [`MIN_SNIFF_LEN`] are raised to it
    pub fn with_sniff_len(mut self, len: usize) -> Self {
        self.sniff_len = len.max(MIN_SNIFF_LEN);
        self
    }
}

/// Options for extracting an archive
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Report skipped records through the log
    pub verbose: bool,
}

impl ExtractOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// How a candidate ended up in the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// Full text content was written
    Text {
        bytes: usize,
        /// Lines in the content that look like record headers
        header_like_lines: usize,
    },
    /// Only the header and the binary sentinel were written
    BinarySentinel,
}

/// Outcome of one candidate while archiving
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveOutcome {
    Archived { name: String, kind: EntryKind },
    Skipped { path: PathBuf, reason: SkipReason },
}

/// Per-item results of an archiving run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveReport {
    pub entries: Vec<ArchiveOutcome>,
}

impl ArchiveReport {
    /// Archive names in the order they were written
    pub fn archived(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                ArchiveOutcome::Archived { name, .. } => Some(name.as_str()),
                ArchiveOutcome::Skipped { .. } => None,
            })
            .collect()
    }

    pub fn skipped(&self) -> Vec<(&Path, &SkipReason)> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                ArchiveOutcome::Skipped { path, reason } => Some((path.as_path(), reason)),
                ArchiveOutcome::Archived { .. } => None,
            })
            .collect()
    }
}

/// Outcome of one record while extracting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractOutcome {
    Written { name: String, path: PathBuf, bytes: usize },
    Skipped { name: String, reason: SkipReason },
}

/// Per-record results of an extraction run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractReport {
    pub entries: Vec<ExtractOutcome>,
}

impl ExtractReport {
    /// Record names that produced a file, in archive order
    pub fn written(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                ExtractOutcome::Written { name, .. } => Some(name.as_str()),
                ExtractOutcome::Skipped { .. } => None,
            })
            .collect()
    }

    pub fn skipped(&self) -> Vec<(&str, &SkipReason)> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                ExtractOutcome::Skipped { name, reason } => Some((name.as_str(), reason)),
                ExtractOutcome::Written { .. } => None,
            })
            .collect()
    }
}
