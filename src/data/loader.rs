use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;

use super::model::{EmbeddingSet, Record};

/// File name of the per-category vectors file.
pub const VECTORS_FILE: &str = "vectors_object_instances.txt";

// ---------------------------------------------------------------------------
// Per-line outcome
// ---------------------------------------------------------------------------

/// Why a line of a vectors file was not turned into a [`Record`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LineError {
    #[error("expected 4 ':'-separated fields, found {0}")]
    FieldCount(usize),
    #[error("label is empty")]
    EmptyLabel,
    #[error("score '{0}' is not a number")]
    InvalidScore(String),
    #[error("instance count '{0}' is not a non-negative integer")]
    InvalidInstanceCount(String),
    #[error("malformed vector literal: {0}")]
    InvalidVector(String),
    #[error("vector has {got} components, expected {expected}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("line is not valid UTF-8")]
    InvalidUtf8,
}

/// A line that was skipped, kept so the caller decides how to report it.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedLine {
    /// 1-based line number.
    pub line_no: usize,
    pub content: String,
    pub reason: LineError,
}

/// Result of loading one vectors file.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub set: EmbeddingSet,
    pub skipped: Vec<SkippedLine>,
}

// ---------------------------------------------------------------------------
// Line parser
// ---------------------------------------------------------------------------

/// Turns lines of `name:score:instance_count:vector` into records.
///
/// The first accepted vector fixes the dimensionality for the rest of the
/// file; later rows of a different length are rejected so the reducer always
/// receives a rectangular matrix.
#[derive(Debug, Default)]
pub struct RecordParser {
    expected_dim: Option<usize>,
}

impl RecordParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one line.
    ///
    /// Returns `None` for lines that carry no record at all (blank, or without
    /// any `:`), which are skipped silently.
    pub fn parse(&mut self, line: &str) -> Option<Result<Record, LineError>> {
        let line = line.trim();
        if line.is_empty() || !line.contains(':') {
            return None;
        }
        let result = parse_fields(line).and_then(|rec| {
            match self.expected_dim {
                Some(expected) if expected != rec.vector.len() => Err(LineError::DimensionMismatch {
                    expected,
                    got: rec.vector.len(),
                }),
                _ => {
                    self.expected_dim = Some(rec.vector.len());
                    Ok(rec)
                }
            }
        });
        Some(result)
    }
}

fn parse_fields(line: &str) -> Result<Record, LineError> {
    let fields: Vec<&str> = line.splitn(4, ':').collect();
    let &[label, score, inst, vec_str] = fields.as_slice() else {
        return Err(LineError::FieldCount(fields.len()));
    };

    if label.trim().is_empty() {
        return Err(LineError::EmptyLabel);
    }
    let score = score
        .trim()
        .parse::<f64>()
        .map_err(|_| LineError::InvalidScore(score.to_string()))?;
    let instance_count = inst
        .trim()
        .parse::<u32>()
        .map_err(|_| LineError::InvalidInstanceCount(inst.to_string()))?;
    let vector = parse_vector_literal(vec_str)?;

    Ok(Record {
        label: label.to_string(),
        score,
        instance_count,
        vector,
    })
}

/// Parse a flat numeric list literal such as `[0.12, -0.34, 1e-3]`.
///
/// Parentheses are accepted as well as brackets, and a single trailing comma
/// is tolerated. Nested lists and non-finite values are rejected.
pub fn parse_vector_literal(s: &str) -> Result<Vec<f64>, LineError> {
    let s = s.trim();
    let inner = s
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .or_else(|| s.strip_prefix('(').and_then(|rest| rest.strip_suffix(')')))
        .ok_or_else(|| LineError::InvalidVector("expected a bracketed list".into()))?;

    let inner = inner.trim();
    if inner.is_empty() {
        return Ok(Vec::new());
    }
    let inner = inner.strip_suffix(',').unwrap_or(inner);

    inner
        .split(',')
        .enumerate()
        .map(|(j, tok)| {
            let tok = tok.trim();
            match tok.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(v),
                _ => Err(LineError::InvalidVector(format!("element {j} '{tok}' is not a number"))),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// File entry-point
// ---------------------------------------------------------------------------

/// Parse a whole vectors file already read into memory.
pub fn parse_text(text: &str) -> LoadReport {
    parse_bytes(text.as_bytes())
}

/// Parse raw file contents line by line.
///
/// Lines are decoded individually, so a stray non-UTF-8 byte only costs the
/// line it sits on.
pub fn parse_bytes(bytes: &[u8]) -> LoadReport {
    let mut parser = RecordParser::new();
    let mut report = LoadReport::default();

    for (i, raw) in bytes.split(|&b| b == b'\n').enumerate() {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let parsed = match std::str::from_utf8(raw) {
            Ok(line) => parser.parse(line),
            Err(_) => Some(Err(LineError::InvalidUtf8)),
        };
        match parsed {
            None => {}
            Some(Ok(rec)) => report.set.push(rec),
            Some(Err(reason)) => report.skipped.push(SkippedLine {
                line_no: i + 1,
                content: String::from_utf8_lossy(raw).trim().to_string(),
                reason,
            }),
        }
    }
    report
}

/// Load a vectors file.
///
/// A missing file is not an error: it yields `Ok(None)` and the category has
/// nothing to do. Any other I/O failure is propagated.
pub fn load_file(path: &Path) -> Result<Option<LoadReport>> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = std::fs::read(path).with_context(|| format!("reading vectors file {}", path.display()))?;
    Ok(Some(parse_bytes(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_lines() {
        let report = parse_text("A:0.9:2:[1.0,0.0]\nB:0.8:5:[0.0,1.0]\n");
        assert!(report.skipped.is_empty());
        assert_eq!(report.set.labels(), ["A", "B"]);
        assert_eq!(report.set.scores(), [0.9, 0.8]);
        assert_eq!(report.set.instances(), [2, 5]);
        assert_eq!(report.set.vectors(), [vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn blank_and_separator_free_lines_are_silent() {
        let report = parse_text("\n   \n# header without separator\nA:1:1:[1, 2]\n");
        assert_eq!(report.set.len(), 1);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn malformed_lines_are_skipped_with_reason() {
        let text = "\
A:0.9:2:[1.0,0.0]
B:0.8
C:high:1:[1.0,0.0]
D:0.7:-3:[1.0,0.0]
E:0.7:3:1.0,0.0
F:0.7:3:[1.0,zero]
:0.7:3:[1.0,0.0]
G:0.6:1:[0.5,0.5]
";
        let report = parse_text(text);
        assert_eq!(report.set.labels(), ["A", "G"]);

        let reasons: Vec<_> = report.skipped.iter().map(|s| (s.line_no, s.reason.clone())).collect();
        assert_eq!(reasons[0], (2, LineError::FieldCount(2)));
        assert_eq!(reasons[1], (3, LineError::InvalidScore("high".into())));
        assert_eq!(reasons[2], (4, LineError::InvalidInstanceCount("-3".into())));
        assert!(matches!(reasons[3], (5, LineError::InvalidVector(_))));
        assert!(matches!(reasons[4], (6, LineError::InvalidVector(_))));
        assert_eq!(reasons[5], (7, LineError::EmptyLabel));
    }

    #[test]
    fn mixed_dimensionality_rejects_offending_rows() {
        let text = "A:1:1:[1.0,0.0]\nB:1:1:[1.0,0.0,3.0]\nC:1:1:[0.0,1.0]\n";
        let report = parse_text(text);
        assert_eq!(report.set.labels(), ["A", "C"]);
        assert_eq!(
            report.skipped[0].reason,
            LineError::DimensionMismatch { expected: 2, got: 3 }
        );
        assert!(report.set.vectors().iter().all(|v| v.len() == 2));
    }

    #[test]
    fn vector_literal_variants() {
        assert_eq!(parse_vector_literal(" [1, -2.5, 3e-1] ").unwrap(), vec![1.0, -2.5, 0.3]);
        assert_eq!(parse_vector_literal("(1.0, 2.0,)").unwrap(), vec![1.0, 2.0]);
        assert_eq!(parse_vector_literal("[]").unwrap(), Vec::<f64>::new());
        assert!(parse_vector_literal("[[1.0], [2.0]]").is_err());
        assert!(parse_vector_literal("[1.0, nan]").is_err());
        assert!(parse_vector_literal("[1.0,,2.0]").is_err());
    }

    #[test]
    fn all_sequences_have_equal_length() {
        let report = parse_text("A:1:1:[1]\nbad:line\nB:2:2:[2]\nC:x:3:[3]\n");
        let set = &report.set;
        assert_eq!(set.labels().len(), 2);
        assert_eq!(set.scores().len(), 2);
        assert_eq!(set.instances().len(), 2);
        assert_eq!(set.vectors().len(), 2);
    }

    #[test]
    fn undecodable_line_is_skipped_alone() {
        let report = parse_bytes(b"A:0.9:2:[1.0,0.0]\r\nCaf\xe9:0.5:1:[0.0,1.0]\nB:0.8:5:[0.0,1.0]\n");
        assert_eq!(report.set.labels(), ["A", "B"]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].line_no, 2);
        assert_eq!(report.skipped[0].reason, LineError::InvalidUtf8);
        assert!(report.skipped[0].content.starts_with("Caf"));
    }

    #[test]
    fn directory_in_place_of_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(VECTORS_FILE);
        std::fs::create_dir(&path).unwrap();
        assert!(load_file(&path).is_err());
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_file(&dir.path().join(VECTORS_FILE)).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(VECTORS_FILE);
        std::fs::write(&path, "A:0.9:2:[1.0,0.0]\n").unwrap();
        let report = load_file(&path).unwrap().unwrap();
        assert_eq!(report.set.len(), 1);
    }
}
