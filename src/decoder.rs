//! Flat archive decoder

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::archive::{self, ExtractOptions, ExtractOutcome, ExtractReport, Record, RecordBody, HEADER_PREFIX};
use crate::error::{Error, Result, SkipReason};

/// Parser state between lines
#[derive(Debug)]
enum ParseState {
    /// No header seen yet; lines belong to no file
    NoCurrentFile,
    /// Collecting the body of the record announced by the last header
    Accumulating {
        name: String,
        data: Vec<u8>,
        binary: bool,
        /// No body line has been consumed since the header
        fresh: bool,
    },
    /// End of input reached
    Done,
}

/// Line-oriented record parser.
///
/// Feed raw lines (terminator included) with [`RecordParser::push_line`];
/// a completed record is returned as soon as the next header arrives, and
/// the last one from [`RecordParser::finish`].
#[derive(Debug)]
pub struct RecordParser {
    state: ParseState,
    dropped_lines: usize,
}

impl RecordParser {
    pub fn new() -> Self {
        Self {
            state: ParseState::NoCurrentFile,
            dropped_lines: 0,
        }
    }

    /// Lines seen before the first header
    pub fn dropped_lines(&self) -> usize {
        self.dropped_lines
    }

    pub fn push_line(&mut self, line: &[u8]) -> Option<Record> {
        let header = if line.starts_with(HEADER_PREFIX.as_bytes()) {
            let text = String::from_utf8_lossy(line);
            Some((Record::is_sentinel(&text), Record::parse_header(&text).map(str::to_string)))
        } else {
            None
        };

        match &mut self.state {
            ParseState::Accumulating { binary, fresh, .. } if *fresh && matches!(header, Some((true, _))) => {
                *binary = true;
                *fresh = false;
                None
            }
            ParseState::Accumulating { data, binary, fresh, .. } if header.is_none() => {
                *fresh = false;
                if !*binary {
                    data.extend_from_slice(line);
                }
                None
            }
            ParseState::NoCurrentFile if header.is_none() => {
                self.dropped_lines += 1;
                None
            }
            ParseState::Done => None,
            _ => {
                let name = header.and_then(|(_, name)| name).unwrap_or_default();
                let previous = std::mem::replace(
                    &mut self.state,
                    ParseState::Accumulating {
                        name,
                        data: Vec::new(),
                        binary: false,
                        fresh: true,
                    },
                );
                Self::complete(previous)
            }
        }
    }

    /// Flush the record in progress and stop accepting lines
    pub fn finish(&mut self) -> Option<Record> {
        let previous = std::mem::replace(&mut self.state, ParseState::Done);
        Self::complete(previous)
    }

    fn complete(state: ParseState) -> Option<Record> {
        match state {
            ParseState::Accumulating { name, binary: true, .. } => Some(Record::binary(name)),
            ParseState::Accumulating { name, mut data, .. } => {
                // Drop the separator written after every text body
                if data.ends_with(b"\n") {
                    data.pop();
                }
                Some(Record::text(name, data))
            }
            ParseState::NoCurrentFile | ParseState::Done => None,
        }
    }
}

impl Default for RecordParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads flat archives and restores the files they contain
pub struct Decoder {
    options: ExtractOptions,
}

impl Decoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self::with_options(ExtractOptions::default())
    }

    pub fn with_options(options: ExtractOptions) -> Self {
        Self { options }
    }

    /// Parse every record from a reader without touching the filesystem
    pub fn decode<R: BufRead>(&self, reader: R) -> std::io::Result<Vec<Record>> {
        let mut records = Vec::new();
        self.for_each_record(reader, |record| records.push(record))?;
        Ok(records)
    }

    /// Parse every record from an in-memory archive
    pub fn decode_str(&self, input: &str) -> Vec<Record> {
        let mut records = Vec::new();
        let mut parser = RecordParser::new();
        for line in input.split_inclusive('\n') {
            records.extend(parser.push_line(line.as_bytes()));
        }
        records.extend(parser.finish());
        records
    }

    /// Extract the archive at `archive_path` below `output_dir`
    pub fn extract_to_dir(&self, archive_path: &Path, output_dir: &Path) -> Result<ExtractReport> {
        let file = File::open(archive_path).map_err(|source| Error::OpenArchive {
            path: archive_path.to_path_buf(),
            source,
        })?;

        let report = self
            .extract_from_reader(BufReader::new(file), output_dir)
            .map_err(|source| Error::ReadArchive {
                path: archive_path.to_path_buf(),
                source,
            })?;

        info!(
            archive = %archive_path.display(),
            written = report.written().len(),
            skipped = report.skipped().len(),
            "archive extracted"
        );
        Ok(report)
    }

    /// Extract records from a reader; each record is written as soon as it is complete
    pub fn extract_from_reader<R: BufRead>(&self, reader: R, output_dir: &Path) -> std::io::Result<ExtractReport> {
        let mut report = ExtractReport::default();
        self.for_each_record(reader, |record| {
            let outcome = self.write_record(output_dir, record);
            report.entries.push(outcome);
        })?;
        Ok(report)
    }

    fn for_each_record<R: BufRead, F: FnMut(Record)>(&self, mut reader: R, mut sink: F) -> std::io::Result<()> {
        let mut parser = RecordParser::new();
        let mut line = Vec::new();

        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            if let Some(record) = parser.push_line(&line) {
                sink(record);
            }
        }
        if let Some(record) = parser.finish() {
            sink(record);
        }

        if parser.dropped_lines() > 0 {
            debug!(lines = parser.dropped_lines(), "dropped lines before the first header");
        }
        Ok(())
    }

    fn write_record(&self, output_dir: &Path, record: Record) -> ExtractOutcome {
        let data = match record.body {
            RecordBody::Text(data) => data,
            RecordBody::Binary => return self.skip(record.path, SkipReason::BinaryPlaceholder),
        };

        let target = match archive::resolve_under(output_dir, &record.path) {
            Ok(target) => target,
            Err(reason) => return self.skip(record.path, reason),
        };

        let written = target
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| fs::write(&target, &data));

        match written {
            Ok(()) => {
                debug!(name = %record.path, bytes = data.len(), "extracted");
                ExtractOutcome::Written {
                    name: record.path,
                    path: target,
                    bytes: data.len(),
                }
            }
            Err(e) => self.skip(record.path, SkipReason::Unwritable(e.to_string())),
        }
    }

    fn skip(&self, name: String, reason: SkipReason) -> ExtractOutcome {
        if self.options.verbose {
            warn!(%name, "skipping record: {}", reason);
        } else {
            debug!(%name, "skipping record: {}", reason);
        }
        ExtractOutcome::Skipped { name, reason }
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}
