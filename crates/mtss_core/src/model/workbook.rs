//! Workbook primitives shared by repositories and services.
//!
//! # Responsibility
//! - Model cell addresses, rectangular ranges and cell contents.
//! - Render and parse A1 notation (`C2`, `A1:BD9`).
//! - Describe charts as serializable specs so any store can persist them.
//!
//! # Invariants
//! - Row and column indexes are 1-based; `0` is never a valid index.
//! - A `CellRange` is always normalized so `start` is top-left.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier for a chart placed on a sheet.
pub type ChartId = Uuid;

/// Largest column index accepted by the A1 parser (`ZZZ`).
pub const MAX_COLUMN: u32 = 18_278;

/// One cell position, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellAddress {
    pub row: u32,
    pub col: u32,
}

impl CellAddress {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parses `C2`-style references. `$` anchors are accepted and ignored.
    pub fn parse(reference: &str) -> Result<Self, WorkbookParseError> {
        let trimmed = reference.trim();
        if trimmed.is_empty() {
            return Err(WorkbookParseError::EmptyReference);
        }
        let invalid = || WorkbookParseError::InvalidCellReference(trimmed.to_string());

        let cleaned: String = trimmed.chars().filter(|ch| *ch != '$').collect();
        let split_at = cleaned
            .find(|ch: char| ch.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (letters, digits) = cleaned.split_at(split_at);

        let col = column_index(letters).ok_or_else(invalid)?;
        if digits.is_empty() || !digits.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(invalid());
        }
        let row = digits.parse::<u32>().map_err(|_| invalid())?;
        if row == 0 {
            return Err(invalid());
        }

        Ok(Self { row, col })
    }

    /// Renders the address in A1 notation.
    pub fn to_a1(&self) -> String {
        format!("{}{}", column_letters(self.col), self.row)
    }
}

impl Display for CellAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_a1())
    }
}

impl FromStr for CellAddress {
    type Err = WorkbookParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Converts a 1-based column index into letters (`1 -> A`, `27 -> AA`).
///
/// Returns an empty string for `0`.
pub fn column_letters(col: u32) -> String {
    let mut letters = Vec::new();
    let mut n = col;
    while n > 0 {
        let remainder = (n - 1) % 26;
        letters.push(char::from(b'A' + remainder as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Converts column letters into a 1-based index (`A -> 1`, `BD -> 56`).
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    let mut index: u32 = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let value = u32::from(ch.to_ascii_uppercase() as u8 - b'A' + 1);
        index = index.checked_mul(26)?.checked_add(value)?;
        if index > MAX_COLUMN {
            return None;
        }
    }
    Some(index)
}

/// Rectangular block of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRange {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl CellRange {
    /// Builds a range from two corners in any order.
    pub fn new(a: CellAddress, b: CellAddress) -> Self {
        Self {
            start: CellAddress::new(a.row.min(b.row), a.col.min(b.col)),
            end: CellAddress::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    /// Builds a range from a top-left corner plus a height and width.
    ///
    /// `rows` and `cols` are clamped to at least one.
    pub fn from_origin(row: u32, col: u32, rows: u32, cols: u32) -> Self {
        let start = CellAddress::new(row, col);
        let end = CellAddress::new(row + rows.max(1) - 1, col + cols.max(1) - 1);
        Self { start, end }
    }

    pub fn single(address: CellAddress) -> Self {
        Self {
            start: address,
            end: address,
        }
    }

    /// Parses `A1:BD9` or a single `A1`.
    pub fn parse(reference: &str) -> Result<Self, WorkbookParseError> {
        let trimmed = reference.trim();
        if trimmed.is_empty() {
            return Err(WorkbookParseError::EmptyReference);
        }
        match trimmed.split_once(':') {
            Some((left, right)) => {
                let a = CellAddress::parse(left)
                    .map_err(|_| WorkbookParseError::InvalidRange(trimmed.to_string()))?;
                let b = CellAddress::parse(right)
                    .map_err(|_| WorkbookParseError::InvalidRange(trimmed.to_string()))?;
                Ok(Self::new(a, b))
            }
            None => Ok(Self::single(CellAddress::parse(trimmed)?)),
        }
    }

    pub fn rows(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    pub fn cols(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    /// `(rows, cols)` shape used for note-array validation.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows() as usize, self.cols() as usize)
    }

    pub fn contains(&self, address: CellAddress) -> bool {
        (self.start.row..=self.end.row).contains(&address.row)
            && (self.start.col..=self.end.col).contains(&address.col)
    }

    /// Iterates every address row-major, top-left first.
    pub fn addresses(&self) -> impl Iterator<Item = CellAddress> + '_ {
        (self.start.row..=self.end.row).flat_map(move |row| {
            (self.start.col..=self.end.col).map(move |col| CellAddress::new(row, col))
        })
    }

    pub fn to_a1(&self) -> String {
        if self.start == self.end {
            self.start.to_a1()
        } else {
            format!("{}:{}", self.start.to_a1(), self.end.to_a1())
        }
    }
}

impl Display for CellRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_a1())
    }
}

/// Stored content of a cell. Notes live beside the content, not inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "text")]
pub enum CellContent {
    /// Literal value as entered (dates are stored pre-formatted).
    Value(String),
    /// Formula source including the leading `=`.
    Formula(String),
}

impl CellContent {
    pub fn text(&self) -> &str {
        match self {
            Self::Value(text) | Self::Formula(text) => text.as_str(),
        }
    }

    /// Empty literal values count as blank; formulas never do.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Value(text) => text.is_empty(),
            Self::Formula(_) => false,
        }
    }

    pub fn is_formula(&self) -> bool {
        matches!(self, Self::Formula(_))
    }
}

/// Workbook-level name bound to a range on one sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRange {
    pub name: String,
    pub sheet: String,
    pub range: CellRange,
}

impl NamedRange {
    pub fn new(name: impl Into<String>, sheet: impl Into<String>, range: CellRange) -> Self {
        Self {
            name: name.into(),
            sheet: sheet.into(),
            range,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendPosition {
    Top,
    Right,
    Bottom,
    Left,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextPosition {
    Out,
    In,
    None,
}

/// Axis styling for one chart axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisOptions {
    pub title: String,
    pub min_value: Option<f64>,
    /// CSS hex color of the axis baseline.
    pub baseline_color: String,
    pub text_position: TextPosition,
    /// `None` hides gridlines.
    pub gridline_color: Option<String>,
    /// Explicit tick values; empty means auto-generated ticks.
    pub ticks: Vec<f64>,
}

/// Placement of a chart's top-left corner over the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartAnchor {
    pub row: u32,
    pub col: u32,
    pub offset_x: i32,
    pub offset_y: i32,
}

/// Full, store-agnostic chart definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub chart_type: ChartType,
    pub data_range: CellRange,
    /// When set, each source row becomes one series plotted across columns.
    pub transpose_rows_and_columns: bool,
    pub title: String,
    pub legend: LegendPosition,
    pub h_axis: AxisOptions,
    pub v_axis: AxisOptions,
    pub anchor: ChartAnchor,
}

/// Chart stored on a sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub id: ChartId,
    pub spec: ChartSpec,
}

/// A1 notation parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkbookParseError {
    EmptyReference,
    InvalidCellReference(String),
    InvalidRange(String),
}

impl Display for WorkbookParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyReference => write!(f, "cell reference must not be empty"),
            Self::InvalidCellReference(value) => write!(f, "invalid cell reference `{value}`"),
            Self::InvalidRange(value) => write!(f, "invalid range reference `{value}`"),
        }
    }
}

impl Error for WorkbookParseError {}
