//! Report and artifact output.
//!
//! Reports are written as a JSON array or as JSON Lines. Sanitized PNGs are
//! written content-addressed into an output directory through a temp file so a
//! reader never observes a partial artifact.

use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::Hasher;
use crate::types::EncodedPng;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Single JSON array
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// A writer that serializes reports to JSON or JSONL format.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    items_written: usize,
}

impl<W: Write> OutputWriter<W> {
    /// Create a new output writer.
    ///
    /// `pretty` only affects the JSON format; JSONL is always one object per line.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            items_written: 0,
        }
    }

    /// Write a single item as one JSON value or one JSONL line.
    pub fn write<T: Serialize>(&mut self, item: &T) -> io::Result<()> {
        if self.pretty && self.format == OutputFormat::Json {
            serde_json::to_writer_pretty(&mut self.writer, item).map_err(io::Error::other)?;
        } else {
            serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?;
        }
        writeln!(self.writer)?;
        self.items_written += 1;
        Ok(())
    }

    /// Write a batch: a JSON array, or one line per item for JSONL.
    pub fn write_all<T: Serialize>(&mut self, items: &[T]) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                if self.pretty {
                    serde_json::to_writer_pretty(&mut self.writer, items)
                        .map_err(io::Error::other)?;
                } else {
                    serde_json::to_writer(&mut self.writer, items).map_err(io::Error::other)?;
                }
                writeln!(self.writer)?;
                self.items_written += items.len();
            }
            OutputFormat::JsonLines => {
                for item in items {
                    self.write(item)?;
                }
            }
        }
        Ok(())
    }

    /// Get the number of items written.
    pub fn items_written(&self) -> usize {
        self.items_written
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Write a sanitized PNG to `<dir>/<blake3>.png`.
///
/// The bytes go to a temp file in `dir` first and are persisted with a rename.
/// Identical artifacts land on the same path, so rewriting one is harmless.
pub fn write_artifact(dir: &Path, png: &EncodedPng) -> PipelineResult<PathBuf> {
    let write_err = |path: &Path, e: &dyn std::fmt::Display| PipelineError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    std::fs::create_dir_all(dir).map_err(|e| write_err(dir, &e))?;

    let target = dir.join(format!("{}.png", Hasher::content_hash(&png.bytes)));

    // Dropping the temp file on any early return removes it.
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| write_err(dir, &e))?;
    tmp.write_all(&png.bytes)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| write_err(tmp.path(), &e))?;
    tmp.persist(&target)
        .map_err(|e| write_err(&target, &e.error))?;

    tracing::debug!(path = %target.display(), bytes = png.bytes.len(), "Wrote artifact");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestItem {
        name: String,
        value: i32,
    }

    fn items() -> Vec<TestItem> {
        vec![
            TestItem {
                name: "a".to_string(),
                value: 1,
            },
            TestItem {
                name: "b".to_string(),
                value: 2,
            },
        ]
    }

    #[test]
    fn test_write_json() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::Json, false);
        writer.write(&items()[0]).unwrap();
        assert_eq!(writer.items_written(), 1);

        let output = String::from_utf8(buffer).unwrap();
        assert!(output.contains("\"name\":\"a\""));
        assert!(output.contains("\"value\":1"));
    }

    #[test]
    fn test_write_jsonl() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::JsonLines, true);
        writer.write_all(&items()).unwrap();
        assert_eq!(writer.items_written(), 2);

        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.trim().split('\n').collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with('{'));
    }

    #[test]
    fn test_write_all_json_array() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, OutputFormat::Json, false);
        writer.write_all(&items()).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert!(output.starts_with('['));
        assert!(output.trim().ends_with(']'));
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("jsonl"), Some(OutputFormat::JsonLines));
        assert_eq!(OutputFormat::parse("JSONL"), Some(OutputFormat::JsonLines));
        assert_eq!(OutputFormat::parse("invalid"), None);
    }

    #[test]
    fn test_write_artifact_is_content_addressed() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("safe");
        let png = EncodedPng {
            bytes: b"not really a png".to_vec(),
            width: 1,
            height: 1,
        };

        let path = write_artifact(&out, &png).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            format!("{}.png", Hasher::content_hash(&png.bytes))
        );
        assert_eq!(std::fs::read(&path).unwrap(), png.bytes);

        // Same bytes, same path; no temp files left behind.
        assert_eq!(write_artifact(&out, &png).unwrap(), path);
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 1);
    }

    #[test]
    fn test_write_artifact_into_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        let png = EncodedPng {
            bytes: vec![1],
            width: 1,
            height: 1,
        };
        let err = write_artifact(&blocker, &png).unwrap_err();
        assert!(matches!(err, PipelineError::Write { .. }));
    }
}
