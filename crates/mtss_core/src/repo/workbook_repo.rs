//! Workbook repository contract.
//!
//! # Responsibility
//! - Expose sheets, cells, notes, named ranges and charts as one injected
//!   handle that services receive explicitly.
//!
//! # Invariants
//! - Writes to a missing sheet fail with `SheetNotFound`.
//! - `set_notes` rejects arrays whose shape differs from the target range.

use crate::db::DbError;
use crate::model::workbook::{
    CellAddress, CellContent, CellRange, Chart, ChartId, ChartSpec, NamedRange,
};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for workbook reads and writes.
#[derive(Debug)]
pub enum RepoError {
    SheetNotFound(String),
    SheetAlreadyExists(String),
    NamedRangeNotFound(String),
    ChartNotFound(ChartId),
    ShapeMismatch {
        range: String,
        expected: (usize, usize),
        actual: (usize, usize),
    },
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SheetNotFound(name) => write!(f, "sheet not found: {name}"),
            Self::SheetAlreadyExists(name) => write!(f, "sheet already exists: {name}"),
            Self::NamedRangeNotFound(name) => write!(f, "named range not found: {name}"),
            Self::ChartNotFound(id) => write!(f, "chart not found: {id}"),
            Self::ShapeMismatch {
                range,
                expected,
                actual,
            } => write!(
                f,
                "range {range} is {}x{} but {}x{} values were supplied",
                expected.0, expected.1, actual.0, actual.1
            ),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid stored workbook data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Capability interface over one workbook document.
///
/// Methods take `&self`; implementations own whatever interior mutability
/// or connection handle they need.
pub trait WorkbookRepository {
    /// Sheet names in tab order.
    fn sheet_names(&self) -> RepoResult<Vec<String>>;
    /// Returns whether a sheet with exactly this name exists.
    fn has_sheet(&self, name: &str) -> RepoResult<bool> {
        Ok(self.sheet_names()?.iter().any(|existing| existing == name))
    }
    /// Appends an empty sheet.
    fn create_sheet(&self, name: &str) -> RepoResult<()>;
    /// Appends a copy of `source` (contents and notes, not charts) named `new_name`.
    fn duplicate_sheet(&self, source: &str, new_name: &str) -> RepoResult<()>;
    /// Removes a sheet with its cells, charts and named ranges.
    fn delete_sheet(&self, name: &str) -> RepoResult<()>;

    fn get_cell(&self, sheet: &str, address: CellAddress) -> RepoResult<Option<CellContent>>;
    fn set_value(&self, sheet: &str, address: CellAddress, value: &str) -> RepoResult<()>;
    fn set_formula(&self, sheet: &str, address: CellAddress, formula: &str) -> RepoResult<()>;
    /// Clears values and formulas in `range`; notes are kept.
    fn clear_contents(&self, sheet: &str, range: &CellRange) -> RepoResult<()>;
    /// Non-empty contents of one row as `(column, content)`, ordered by column.
    fn row_contents(&self, sheet: &str, row: u32) -> RepoResult<Vec<(u32, CellContent)>>;
    /// Right-most column holding content, or `0` for an empty sheet.
    fn last_column(&self, sheet: &str) -> RepoResult<u32>;

    /// Notes over `range`, row-major; cells without a note yield `""`.
    fn get_notes(&self, sheet: &str, range: &CellRange) -> RepoResult<Vec<Vec<String>>>;
    /// Writes notes over `range`; `""` removes a note.
    fn set_notes(&self, sheet: &str, range: &CellRange, notes: &[Vec<String>]) -> RepoResult<()>;

    /// Creates or replaces a named range.
    fn define_named_range(&self, named: &NamedRange) -> RepoResult<()>;
    fn named_range(&self, name: &str) -> RepoResult<NamedRange>;

    fn charts(&self, sheet: &str) -> RepoResult<Vec<Chart>>;
    fn insert_chart(&self, sheet: &str, spec: &ChartSpec) -> RepoResult<ChartId>;
    fn remove_chart(&self, sheet: &str, id: ChartId) -> RepoResult<()>;
}

/// Checks a 2-D value array against a range before any write happens.
pub fn ensure_shape(range: &CellRange, values: &[Vec<String>]) -> RepoResult<()> {
    let expected = range.shape();
    let rows = values.len();
    let cols = values.first().map_or(0, Vec::len);
    let ragged = values.iter().any(|row| row.len() != cols);
    if ragged || (rows, cols) != expected {
        let widest = values.iter().map(Vec::len).max().unwrap_or(0);
        return Err(RepoError::ShapeMismatch {
            range: range.to_a1(),
            expected,
            actual: (rows, widest),
        });
    }
    Ok(())
}
