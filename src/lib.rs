//! # emx-flattree
//!
//! Flatten a directory tree into a single plain-text archive and restore it.
//!
//! ## Archive Format
//!
//! Every file becomes a record: a header line `// <path>`, the file content,
//! and one separator newline.
//!
//! ```text
//! // src/main.rs
//! fn main() {}
//!
//! // assets/logo.png
//! // (binary file)
//!
//! ```
//!
//! Paths are relative to the archive root and always use `/`. There is no
//! end-of-archive marker, so archives can be concatenated.
//!
//! ## Binary Files
//!
//! A file is binary when the first [`archive::MIN_SNIFF_LEN`] bytes (or more,
//! see [`ArchiveOptions::with_sniff_len`]) are not valid UTF-8. Binary files are
//! skipped, or written as a header plus the `// (binary file)` sentinel when
//! [`ArchiveOptions::include_binary`] is set. Their bytes are never inlined.
//!
//! ## Ignore Files
//!
//! Each directory below the root may contain a `.flatignore` file with one glob
//! pattern per line (`#` starts a comment). A pattern applies to everything in
//! its directory, recursively, and matches either a basename or a path relative
//! to that directory.
//!
//! ## Known Limitation
//!
//! Content lines are not escaped. A text file with a line starting with `// `
//! is split at that line on extraction. The archiver counts such lines in
//! [`EntryKind::Text`] so callers can warn about them.

pub mod archive;
pub mod classify;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod ignore;

pub use archive::{
    ArchiveOptions, ArchiveOutcome, ArchiveReport, EntryKind, ExtractOptions, ExtractOutcome,
    ExtractReport, Record, RecordBody,
};
pub use classify::{BinaryReason, Classifier, EncodingDetection, TextEncoding};
pub use decoder::{Decoder, RecordParser};
pub use encoder::Encoder;
pub use error::{Error, Result, SkipReason};
pub use ignore::{IgnoreRuleSet, IgnoreScope};

use std::path::{Path, PathBuf};

/// Serialize `inputs` into the archive at `output`, with record paths relative to `root`
pub fn serialize(inputs: &[PathBuf], output: &Path, root: &Path, options: ArchiveOptions) -> Result<ArchiveReport> {
    Encoder::with_options(options).encode_to_file(inputs, output, root)
}

/// Restore every record of the archive at `archive_path` below `output_dir`
pub fn deserialize(archive_path: &Path, output_dir: &Path, options: ExtractOptions) -> Result<ExtractReport> {
    Decoder::with_options(options).extract_to_dir(archive_path, output_dir)
}
