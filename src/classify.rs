//! Text/binary classification

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::archive::MIN_SNIFF_LEN;

const UTF8_MAX_CHAR_LEN: usize = 4;

/// Result of encoding detection
#[derive(Debug, Clone, PartialEq)]
pub enum EncodingDetection {
    /// Valid text with specific encoding
    Text { encoding: TextEncoding },
    /// Binary data, never inlined into the archive
    Binary { reason: BinaryReason },
}

impl EncodingDetection {
    pub fn is_binary(&self) -> bool {
        matches!(self, EncodingDetection::Binary { .. })
    }
}

/// Text encoding type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextEncoding {
    /// UTF-8 text, the archive's declared encoding
    Utf8,
}

/// Reason why data is considered binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryReason {
    /// The inspected prefix is not valid UTF-8
    InvalidUtf8,
}

/// Decides whether a file is text by decoding a fixed-size prefix.
///
/// This is a heuristic: text in encodings other than UTF-8 is reported
/// as binary, and a file whose invalid bytes all lie past the prefix
/// is reported as text.
#[derive(Debug, Clone)]
pub struct Classifier {
    sniff_len: usize,
}

impl Classifier {
    /// Create a classifier inspecting `sniff_len` bytes (at least [`MIN_SNIFF_LEN`])
    pub fn new(sniff_len: usize) -> Self {
        Self {
            sniff_len: sniff_len.max(MIN_SNIFF_LEN),
        }
    }

    pub fn sniff_len(&self) -> usize {
        self.sniff_len
    }

    /// Classify the file at `path`
    pub fn detect(&self, path: &Path) -> std::io::Result<EncodingDetection> {
        // A few bytes past the window tell a cut character from a truncated file
        let limit = self.sniff_len + UTF8_MAX_CHAR_LEN - 1;
        let mut prefix = Vec::with_capacity(limit);
        File::open(path)?
            .take(limit as u64)
            .read_to_end(&mut prefix)?;
        Ok(self.detect_bytes(&prefix))
    }

    pub fn is_binary(&self, path: &Path) -> std::io::Result<bool> {
        Ok(self.detect(path)?.is_binary())
    }

    /// Classify in-memory data, looking only at the first `sniff_len` bytes
    pub fn detect_bytes(&self, data: &[u8]) -> EncodingDetection {
        let window = &data[..data.len().min(self.sniff_len)];
        let truncated = window.len() < data.len();

        match std::str::from_utf8(window) {
            Ok(_) => EncodingDetection::Text {
                encoding: TextEncoding::Utf8,
            },
            // A multi-byte sequence cut by the window edge is not an error
            Err(e) if e.error_len().is_none() && truncated => {
                EncodingDetection::Text {
                    encoding: TextEncoding::Utf8,
                }
            }
            Err(_) => EncodingDetection::Binary {
                reason: BinaryReason::InvalidUtf8,
            },
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(MIN_SNIFF_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_detect_text() {
        let classifier = Classifier::default();
        assert_eq!(
            classifier.detect_bytes("hello 世界\n".as_bytes()),
            EncodingDetection::Text { encoding: TextEncoding::Utf8 }
        );
        assert!(!classifier.detect_bytes(b"").is_binary());
    }

    #[test]
    fn test_detect_binary() {
        let classifier = Classifier::default();
        assert_eq!(
            classifier.detect_bytes(&[0xFF; 64]),
            EncodingDetection::Binary { reason: BinaryReason::InvalidUtf8 }
        );
    }

    #[test]
    fn test_incomplete_sequence_at_end_of_file_is_binary() {
        // A short file ending mid-character is genuinely malformed
        let classifier = Classifier::default();
        assert!(classifier.detect_bytes(&[b'a', 0xE4, 0xB8]).is_binary());
    }

    #[test]
    fn test_sequence_cut_by_window_is_text() {
        let classifier = Classifier::new(MIN_SNIFF_LEN);
        let mut data = vec![b'a'; MIN_SNIFF_LEN - 1];
        data.extend_from_slice("世".as_bytes());
        assert!(!classifier.detect_bytes(&data).is_binary());
    }

    #[test]
    fn test_invalid_bytes_past_window_are_not_seen() {
        let classifier = Classifier::new(MIN_SNIFF_LEN);
        let mut data = vec![b'a'; MIN_SNIFF_LEN];
        data.push(0xFF);
        assert!(!classifier.detect_bytes(&data).is_binary());
    }

    #[test]
    fn test_file_ending_mid_character_at_window_edge() {
        let dir = tempfile::tempdir().unwrap();
        let classifier = Classifier::new(MIN_SNIFF_LEN);

        let mut data = vec![b'a'; MIN_SNIFF_LEN - 1];
        data.push(0xE4);
        let cut_short = dir.path().join("cut_short.txt");
        std::fs::write(&cut_short, &data).unwrap();
        assert!(classifier.is_binary(&cut_short).unwrap());

        data.extend_from_slice(&[0xB8, 0x96]);
        let continues = dir.path().join("continues.txt");
        std::fs::write(&continues, &data).unwrap();
        assert!(!classifier.is_binary(&continues).unwrap());
    }

    #[test]
    fn test_window_has_floor() {
        assert_eq!(Classifier::new(10).sniff_len(), MIN_SNIFF_LEN);
    }

    #[test]
    fn test_is_binary_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("a.txt");
        let blob = dir.path().join("b.bin");
        std::fs::write(&text, "plain text\n").unwrap();
        std::fs::File::create(&blob)
            .unwrap()
            .write_all(&[0xFF; 2048])
            .unwrap();

        let classifier = Classifier::default();
        assert!(!classifier.is_binary(&text).unwrap());
        assert!(classifier.is_binary(&blob).unwrap());
        assert!(classifier.is_binary(&dir.path().join("missing")).is_err());
    }
}
