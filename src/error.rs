//! Error types

use std::path::PathBuf;

/// Failure that aborts a whole archiving or extraction run
#[derive(Debug)]
pub enum Error {
    /// The output archive could not be created
    CreateOutput { path: PathBuf, source: std::io::Error },

    /// Writing to the output archive failed
    WriteOutput { path: PathBuf, source: std::io::Error },

    /// The archive to extract could not be opened
    OpenArchive { path: PathBuf, source: std::io::Error },

    /// Reading the archive stream failed part way through
    ReadArchive { path: PathBuf, source: std::io::Error },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::CreateOutput { path, .. } => {
                write!(f, "Failed to create archive '{}'", path.display())
            }
            Error::WriteOutput { path, .. } => {
                write!(f, "Failed to write archive '{}'", path.display())
            }
            Error::OpenArchive { path, .. } => {
                write!(f, "Failed to open archive '{}'", path.display())
            }
            Error::ReadArchive { path, .. } => {
                write!(f, "Failed to read archive '{}'", path.display())
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::CreateOutput { source, .. }
            | Error::WriteOutput { source, .. }
            | Error::OpenArchive { source, .. }
            | Error::ReadArchive { source, .. } => Some(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Why a single input or record was left out; the run continues
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Input path is neither a regular file nor a directory
    NotFileOrDirectory,

    /// Input lies outside the archive root
    OutsideRoot,

    /// The path is the archive being written
    OutputFile,

    /// Binary file and binary records were not requested
    Binary,

    /// Record is a binary placeholder with no content to restore
    BinaryPlaceholder,

    /// Record path is absolute, empty, or escapes the output directory
    UnsafePath,

    /// File could not be read
    Unreadable(String),

    /// Target file or its parent directories could not be written
    Unwritable(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NotFileOrDirectory => write!(f, "not a file or directory"),
            SkipReason::OutsideRoot => write!(f, "outside the archive root"),
            SkipReason::OutputFile => write!(f, "is the output archive"),
            SkipReason::Binary => write!(f, "binary file"),
            SkipReason::BinaryPlaceholder => write!(f, "binary placeholder, no content"),
            SkipReason::UnsafePath => write!(f, "path escapes the output directory"),
            SkipReason::Unreadable(msg) => write!(f, "read error: {}", msg),
            SkipReason::Unwritable(msg) => write!(f, "write error: {}", msg),
        }
    }
}
