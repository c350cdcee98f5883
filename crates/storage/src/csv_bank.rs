use async_trait::async_trait;
use csv::StringRecord;
use quiz_core::model::{Partition, Question, QuestionId, QuizMode};
use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::repository::{QuestionBank, StorageError};

const SOURCE_EXTENSION: &str = "csv";
const UTF8_BOM: char = '\u{feff}';

/// Why a single source file was skipped.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SourceReadError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("source path has no usable file name")]
    MissingStem,
}

/// Question bank backed by a directory tree of CSV files.
///
/// Layout: `<root>/<mode dir>/<partition dir>/**/*.csv`. Loading is best
/// effort: unreadable files and malformed rows are logged and skipped.
#[derive(Debug, Clone)]
pub struct CsvQuestionBank {
    root: PathBuf,
}

impl CsvQuestionBank {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn scan_root(&self, mode: QuizMode, partition: Option<Partition>) -> PathBuf {
        let mut dir = self.root.join(mode.source_dir());
        if let Some(partition) = partition {
            dir.push(partition.dir_name());
        }
        dir
    }

    /// Source files for a scan, in sorted path order.
    #[must_use]
    pub fn discover(&self, mode: QuizMode, partition: Option<Partition>) -> Vec<PathBuf> {
        let dir = self.scan_root(mode, partition);
        if !dir.is_dir() {
            debug!(dir = %dir.display(), "question source directory missing");
            return Vec::new();
        }

        WalkDir::new(&dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!(dir = %dir.display(), error = %err, "skipping unreadable directory entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && is_source_file(entry.path()))
            .map(walkdir::DirEntry::into_path)
            .collect()
    }

    /// Synchronous load; IDs are unique within the returned set.
    #[must_use]
    pub fn load_blocking(&self, mode: QuizMode, partition: Option<Partition>) -> Vec<Question> {
        let mut seen: HashSet<QuestionId> = HashSet::new();
        let mut questions = Vec::new();

        for path in self.discover(mode, partition) {
            let parsed = match read_source(&path, mode) {
                Ok(parsed) => parsed,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable question source");
                    continue;
                }
            };
            for question in parsed {
                if seen.insert(question.id().clone()) {
                    questions.push(question);
                } else {
                    warn!(
                        path = %path.display(),
                        id = %question.id(),
                        "duplicate question id; keeping the first"
                    );
                }
            }
        }
        questions
    }
}

#[async_trait]
impl QuestionBank for CsvQuestionBank {
    async fn load(
        &self,
        mode: QuizMode,
        partition: Option<Partition>,
    ) -> Result<Vec<Question>, StorageError> {
        let bank = self.clone();
        tokio::task::spawn_blocking(move || bank.load_blocking(mode, partition))
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))
    }
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SOURCE_EXTENSION))
}

fn read_source(path: &Path, mode: QuizMode) -> Result<Vec<Question>, SourceReadError> {
    let stem = path
        .file_stem()
        .and_then(OsStr::to_str)
        .ok_or(SourceReadError::MissingStem)?;
    let text = fs::read_to_string(path)?;
    Ok(parse_source(&text, stem, mode))
}

/// Parses one source's text.
///
/// The row index counts every record, including rejected ones and blank
/// lines, so IDs stay aligned with the row numbering of the source.
#[must_use]
pub fn parse_source(text: &str, source_stem: &str, mode: QuizMode) -> Vec<Question> {
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut questions = Vec::new();
    let mut record = StringRecord::new();
    let mut row = 0;
    loop {
        let from = byte_offset(reader.position());
        // The reader drops blank lines; they still take a row index.
        row += blank_lines_before(text.as_bytes(), from);
        match reader.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => {
                warn!(source = source_stem, row, error = %err, "skipping unreadable row");
                if byte_offset(reader.position()) == from {
                    break;
                }
                row += 1;
                continue;
            }
        }
        let cells: Vec<&str> = record.iter().collect();
        match Question::from_row(mode, source_stem, row, cells.as_slice()) {
            Ok(question) => questions.push(question),
            Err(err) => debug!(source = source_stem, row, error = %err, "skipping malformed row"),
        }
        row += 1;
    }
    questions
}

fn byte_offset(position: &csv::Position) -> usize {
    usize::try_from(position.byte()).unwrap_or(usize::MAX)
}

/// Empty lines between the record ending at `from` and the next record.
fn blank_lines_before(bytes: &[u8], from: usize) -> usize {
    let mut at = from;
    match from.checked_sub(1).and_then(|p| bytes.get(p)) {
        // Second half of a CRLF the reader stopped in the middle of.
        Some(b'\r') if bytes.get(at) == Some(&b'\n') => at += 1,
        None | Some(b'\r' | b'\n') => {}
        // The previous record's terminator has not been consumed yet.
        Some(_) => at = skip_terminator(bytes, at).unwrap_or(at),
    }
    let mut blank = 0;
    while let Some(next) = skip_terminator(bytes, at) {
        blank += 1;
        at = next;
    }
    blank
}

fn skip_terminator(bytes: &[u8], at: usize) -> Option<usize> {
    match bytes.get(at)? {
        b'\r' if bytes.get(at + 1) == Some(&b'\n') => Some(at + 2),
        b'\r' | b'\n' => Some(at + 1),
        _ => None,
    }
}
