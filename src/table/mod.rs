// src/table/mod.rs
use serde::Serialize;
use std::{
    borrow::Cow,
    fmt,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};
use tracing::{debug, info, warn};

pub mod tokenize;
pub mod utils;
pub mod write;

pub use tokenize::tokenize;

use crate::error::{TableError, TableResult};

/// One comma-delimited value, kept exactly as tokenized.
pub type Field = String;

/// One data line's fields; always `column_count` long once inside a [`Table`].
pub type Row = Vec<Field>;

/// Header row plus data rows of a single delimited text file.
///
/// A `Table` starts empty and is filled wholesale by [`Table::load`] /
/// [`Table::load_from`]; every load replaces the previous content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Column names from the first non-blank line. Names may repeat.
    headers: Vec<Field>,
    /// Data rows in file order, each exactly `headers.len()` fields.
    rows: Vec<Row>,
}

/// What happened to the lines of a source during one load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub rows_loaded: usize,
    /// Data lines dropped because their field count differed from the header's.
    pub rows_skipped: usize,
    pub blank_lines: usize,
    /// Non-blank lines that were not valid UTF-8 and were decoded lossily.
    pub lossy_lines: usize,
}

/// Serializable overview of one loaded file.
#[derive(Debug, Serialize)]
pub struct TableSummary<'a> {
    pub path: String,
    pub headers: &'a [Field],
    pub row_count: usize,
    pub column_count: usize,
    #[serde(flatten)]
    pub report: LoadReport,
}

/// Drop the `\n` terminator and one optional `\r` before it.
fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `path` and load it into a fresh table.
    pub fn from_path<P: AsRef<Path>>(path: P) -> TableResult<(Self, LoadReport)> {
        let mut table = Self::new();
        let report = table.load(path)?;
        Ok((table, report))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> TableResult<(Self, LoadReport)> {
        let mut table = Self::new();
        let report = table.load_from(reader)?;
        Ok((table, report))
    }

    /// Load the file at `path`, replacing the current content.
    ///
    /// The file handle lives only for the duration of the call. On error the
    /// table keeps whatever it held before.
    #[tracing::instrument(level = "info", skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> TableResult<LoadReport> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| TableError::io(format!("open {}", path.display()), e))?;
        let report = self.load_from(BufReader::new(file))?;

        info!(
            rows = report.rows_loaded,
            columns = self.column_count(),
            skipped = report.rows_skipped,
            "loaded table"
        );
        Ok(report)
    }

    /// Load from any buffered reader, replacing the current content.
    ///
    /// - Blank lines are skipped and never counted as rows.
    /// - The first non-blank line becomes the header and fixes the column count.
    /// - Later lines with a different field count are dropped and counted in
    ///   [`LoadReport::rows_skipped`].
    ///
    /// Lines are read as bytes. Valid UTF-8 is kept exactly; any other line
    /// (e.g. CP949 / EUC-KR) is decoded lossily, with undecodable bytes
    /// becoming U+FFFD, and counted in [`LoadReport::lossy_lines`]. The ASCII
    /// delimiters `,` `"` `\r` `\n` survive either way.
    ///
    /// Everything is parsed into locals first, so a read error part-way
    /// through leaves `self` untouched.
    pub fn load_from<R: BufRead>(&mut self, mut reader: R) -> TableResult<LoadReport> {
        let mut headers: Option<Row> = None;
        let mut rows: Vec<Row> = Vec::with_capacity(16);
        let mut report = LoadReport::default();

        let mut line = Vec::with_capacity(256);
        let mut line_no = 0usize;
        loop {
            line.clear();
            let n = reader
                .read_until(b'\n', &mut line)
                .map_err(|e| TableError::io(format!("read line {}", line_no + 1), e))?;
            if n == 0 {
                break;
            }
            line_no += 1;

            let content = strip_line_ending(&line);
            if content.is_empty() {
                report.blank_lines += 1;
                continue;
            }

            let text = match std::str::from_utf8(content) {
                Ok(s) => Cow::Borrowed(s),
                Err(e) => {
                    warn!(line = line_no, error = %e, "line is not valid UTF-8, decoding lossily");
                    report.lossy_lines += 1;
                    String::from_utf8_lossy(content)
                }
            };

            let fields = tokenize(&text);
            match headers.as_ref().map(Vec::len) {
                None => headers = Some(fields),
                Some(expected) if fields.len() == expected => rows.push(fields),
                Some(expected) => {
                    debug!(
                        line = line_no,
                        expected,
                        found = fields.len(),
                        "skipping row with mismatched field count"
                    );
                    report.rows_skipped += 1;
                }
            }
        }

        report.rows_loaded = rows.len();
        self.headers = headers.unwrap_or_default();
        self.rows = rows;
        Ok(report)
    }

    /// Field at (`row`, `col`).
    pub fn get(&self, row: usize, col: usize) -> TableResult<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .ok_or_else(|| self.out_of_range(row, col))
    }

    /// Overwrite the field at (`row`, `col`), returning the previous value.
    pub fn set(&mut self, row: usize, col: usize, value: impl Into<Field>) -> TableResult<Field> {
        let err = self.out_of_range(row, col);
        let slot = self
            .rows
            .get_mut(row)
            .and_then(|r| r.get_mut(col))
            .ok_or(err)?;
        Ok(std::mem::replace(slot, value.into()))
    }

    /// Index of the first header equal to `name`.
    pub fn find_column(&self, name: &str) -> TableResult<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| TableError::NotFound(name.to_string()))
    }

    /// Owned copy of row `row`; later edits or loads do not affect it.
    pub fn get_row(&self, row: usize) -> TableResult<Row> {
        self.rows
            .get(row)
            .cloned()
            .ok_or(TableError::RowOutOfRange {
                row,
                row_count: self.row_count(),
            })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn headers(&self) -> &[Field] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// True when nothing (not even a header) has been loaded.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn summary(&self, path: impl Into<String>, report: LoadReport) -> TableSummary<'_> {
        TableSummary {
            path: path.into(),
            headers: &self.headers,
            row_count: self.row_count(),
            column_count: self.column_count(),
            report,
        }
    }

    fn out_of_range(&self, row: usize, col: usize) -> TableError {
        TableError::OutOfRange {
            row,
            col,
            row_count: self.row_count(),
            column_count: self.column_count(),
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Headers: {}", self.headers.join(", "))?;
        writeln!(f)?;
        writeln!(f, "Data ({} rows):", self.rows.len())?;
        for (i, row) in self.rows.iter().enumerate() {
            writeln!(f, "Row {}: {}", i, row.join(", "))?;
        }
        Ok(())
    }
}
