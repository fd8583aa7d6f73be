//! Workbook file storage.
//!
//! One SQLite file holds one workbook: its sheets in tab order, cell
//! contents and notes, named ranges and chart definitions.
//!
//! # Invariants
//! - A connection is handed out only after foreign keys are confirmed on and
//!   the schema is at `migrations::latest_version()`.
//! - Files from a newer schema are refused rather than downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Location label used for in-memory workbooks.
pub const MEMORY_LOCATION: &str = ":memory:";

/// Failures while opening a workbook store.
#[derive(Debug)]
pub enum DbError {
    /// The workbook file could not be opened or created.
    Open {
        location: String,
        source: rusqlite::Error,
    },
    /// SQLite refused `foreign_keys=ON`; sheet deletion could not cascade to
    /// cells, named ranges and charts.
    ForeignKeysUnavailable { location: String },
    /// The file was written by a newer build of this tool.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// A pragma or migration statement failed.
    Sqlite(rusqlite::Error),
}

impl DbError {
    /// Whether retrying after another writer finishes could succeed.
    pub fn is_busy(&self) -> bool {
        let err = match self {
            Self::Open { source, .. } => source,
            Self::Sqlite(err) => err,
            _ => return false,
        };
        matches!(
            err.sqlite_error_code(),
            Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
        )
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { location, source } => {
                write!(f, "cannot open workbook `{location}`: {source}")
            }
            Self::ForeignKeysUnavailable { location } => write!(
                f,
                "workbook `{location}` cannot enforce sheet ownership (foreign_keys stayed off)"
            ),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "workbook schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::Sqlite(err) => write!(f, "workbook storage error: {err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } => Some(source),
            Self::Sqlite(err) => Some(err),
            Self::ForeignKeysUnavailable { .. } | Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
