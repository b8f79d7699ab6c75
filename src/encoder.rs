//! Flat archive encoder

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::archive::{
    self, ArchiveOptions, ArchiveOutcome, ArchiveReport, EntryKind, Record, RecordBody,
    BINARY_SENTINEL,
};
use crate::classify::Classifier;
use crate::error::{Error, Result, SkipReason};
use crate::ignore::IgnoreRuleSet;

/// Walks inputs and writes them as a flat archive
pub struct Encoder {
    options: ArchiveOptions,
    classifier: Classifier,
}

impl Encoder {
    /// Create a new encoder with default options
    pub fn new() -> Self {
        Self::with_options(ArchiveOptions::default())
    }

    pub fn with_options(options: ArchiveOptions) -> Self {
        let classifier = Classifier::new(options.sniff_len);
        Self {
            options,
            classifier,
        }
    }

    /// Archive `inputs` into a new file at `output`.
    ///
    /// Record paths are computed relative to `root`. The output file itself
    /// is never archived.
    pub fn encode_to_file(&self, inputs: &[PathBuf], output: &Path, root: &Path) -> Result<ArchiveReport> {
        let file = File::create(output).map_err(|source| Error::CreateOutput {
            path: output.to_path_buf(),
            source,
        })?;
        let exclude = archive::normalize_path(output).ok();

        let mut writer = BufWriter::new(file);
        let report = self.write_inputs(inputs, root, exclude.as_deref(), &mut writer, output)?;
        writer.flush().map_err(|source| Error::WriteOutput {
            path: output.to_path_buf(),
            source,
        })?;

        info!(
            output = %output.display(),
            archived = report.archived().len(),
            skipped = report.skipped().len(),
            "archive written"
        );
        Ok(report)
    }

    /// Archive `inputs` into an arbitrary writer
    pub fn encode_to_writer<W: Write>(&self, inputs: &[PathBuf], root: &Path, mut writer: W) -> Result<ArchiveReport> {
        let label = Path::new("<writer>");
        let report = self.write_inputs(inputs, root, None, &mut writer, label)?;
        writer.flush().map_err(|source| Error::WriteOutput {
            path: label.to_path_buf(),
            source,
        })?;
        Ok(report)
    }

    fn write_inputs<W: Write>(
        &self,
        inputs: &[PathBuf],
        root: &Path,
        exclude: Option<&Path>,
        writer: &mut W,
        label: &Path,
    ) -> Result<ArchiveReport> {
        let root = archive::normalize_path(root).unwrap_or_else(|_| root.to_path_buf());
        let rules = IgnoreRuleSet::build(&root, &self.options.ignore_file_name);
        let mut report = ArchiveReport::default();

        for input in inputs {
            let input = archive::normalize_path(input).unwrap_or_else(|_| input.clone());

            if input.is_file() {
                self.archive_candidate(&input, &root, &rules, exclude, writer, label, &mut report)?;
            } else if input.is_dir() {
                let candidates = WalkDir::new(&input)
                    .sort_by_file_name()
                    .into_iter();

                for entry in candidates {
                    match entry {
                        Ok(entry) if entry.file_type().is_file() => {
                            self.archive_candidate(entry.path(), &root, &rules, exclude, writer, label, &mut report)?;
                        }
                        Ok(_) => {}
                        Err(e) => {
                            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| input.clone());
                            self.skip(&mut report, path, SkipReason::Unreadable(e.to_string()));
                        }
                    }
                }
            } else {
                self.skip(&mut report, input, SkipReason::NotFileOrDirectory);
            }
        }

        Ok(report)
    }

    #[allow(clippy::too_many_arguments)]
    fn archive_candidate<W: Write>(
        &self,
        path: &Path,
        root: &Path,
        rules: &IgnoreRuleSet,
        exclude: Option<&Path>,
        writer: &mut W,
        label: &Path,
        report: &mut ArchiveReport,
    ) -> Result<()> {
        if rules.is_ignored(path) {
            debug!(path = %path.display(), "ignored");
            return Ok(());
        }
        if exclude == Some(path) {
            self.skip(report, path.to_path_buf(), SkipReason::OutputFile);
            return Ok(());
        }

        let Some(name) = path.strip_prefix(root).ok().and_then(archive::archive_name) else {
            self.skip(report, path.to_path_buf(), SkipReason::OutsideRoot);
            return Ok(());
        };

        let detection = match self.classifier.detect(path) {
            Ok(detection) => detection,
            Err(e) => {
                self.skip(report, path.to_path_buf(), SkipReason::Unreadable(e.to_string()));
                return Ok(());
            }
        };

        let record = if detection.is_binary() {
            if !self.options.include_binary {
                self.skip(report, path.to_path_buf(), SkipReason::Binary);
                return Ok(());
            }
            Record::binary(name)
        } else {
            match std::fs::read(path) {
                Ok(data) => {
                    let text = match String::from_utf8(data) {
                        Ok(text) => text,
                        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
                    };
                    Record::text(name, text)
                }
                Err(e) => {
                    self.skip(report, path.to_path_buf(), SkipReason::Unreadable(e.to_string()));
                    return Ok(());
                }
            }
        };

        self.encode_record(writer, &record).map_err(|source| Error::WriteOutput {
            path: label.to_path_buf(),
            source,
        })?;

        let kind = match &record.body {
            RecordBody::Binary => EntryKind::BinarySentinel,
            RecordBody::Text(data) => {
                let header_like_lines = archive::count_header_like_lines(&String::from_utf8_lossy(data));
                if header_like_lines > 0 && self.options.verbose {
                    warn!(
                        name = %record.path,
                        lines = header_like_lines,
                        "content has lines starting with the header prefix; extraction will split this file"
                    );
                }
                EntryKind::Text {
                    bytes: data.len(),
                    header_like_lines,
                }
            }
        };

        debug!(name = %record.path, ?kind, "archived");
        report.entries.push(ArchiveOutcome::Archived {
            name: record.path,
            kind,
        });
        Ok(())
    }

    /// Write a single record: header, body, and the trailing separator
    pub fn encode_record<W: Write>(&self, writer: &mut W, record: &Record) -> std::io::Result<()> {
        writer.write_all(record.header().as_bytes())?;
        writer.write_all(b"\n")?;

        match &record.body {
            RecordBody::Text(data) => {
                writer.write_all(data)?;
                writer.write_all(b"\n")?;
            }
            RecordBody::Binary => {
                writer.write_all(BINARY_SENTINEL.as_bytes())?;
                writer.write_all(b"\n\n")?;
            }
        }

        Ok(())
    }

    fn skip(&self, report: &mut ArchiveReport, path: PathBuf, reason: SkipReason) {
        if self.options.verbose {
            warn!(path = %path.display(), "skipping: {}", reason);
        } else {
            debug!(path = %path.display(), "skipping: {}", reason);
        }
        report.entries.push(ArchiveOutcome::Skipped { path, reason });
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}
