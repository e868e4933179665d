pub mod config;
pub mod error;
pub mod table;

pub use config::Config;
pub use error::{TableError, TableResult};
pub use table::{tokenize, utils::trim_field, Field, LoadReport, Row, Table, TableSummary};
