use std::io;
use thiserror::Error;

/// Errors surfaced by [`crate::Table`] operations.
#[derive(Error, Debug)]
pub enum TableError {
    /// Source or destination could not be opened, read or written.
    #[error("failed to {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// Cell index outside the loaded rows/columns.
    #[error("cell ({row}, {col}) out of range for {row_count} rows x {column_count} columns")]
    OutOfRange {
        row: usize,
        col: usize,
        row_count: usize,
        column_count: usize,
    },

    /// Row index outside the loaded rows.
    #[error("row {row} out of range for {row_count} rows")]
    RowOutOfRange { row: usize, row_count: usize },

    /// No header carries the requested name.
    #[error("header not found: {0}")]
    NotFound(String),
}

impl TableError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        TableError::Io {
            context: context.into(),
            source,
        }
    }

    /// True for both the cell and the row flavour of an out-of-range index.
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            TableError::OutOfRange { .. } | TableError::RowOutOfRange { .. }
        )
    }
}

pub type TableResult<T> = Result<T, TableError>;
