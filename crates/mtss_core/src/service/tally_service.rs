//! Local evaluation of the summary emoji tallies.
//!
//! Reads the stored weekday cells of every week sheet and applies the same
//! counting identity the summary formulas use, so counts can be checked
//! without a formula engine.

use crate::config::WorkbookLayout;
use crate::model::tally::{tally_across_weeks, EmojiColor};
use crate::model::workbook::{CellAddress, CellContent};
use crate::repo::workbook_repo::{RepoError, WorkbookRepository};
use crate::service::week_service::{behavior_rows, ordered_week_sheets, SetupError};

/// Counts for one behavior row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyRow {
    /// Week sheet row (9..=15).
    pub week_row: u32,
    pub blue: usize,
    pub orange: usize,
    pub red: usize,
}

impl TallyRow {
    pub fn count(&self, color: EmojiColor) -> usize {
        match color {
            EmojiColor::Blue => self.blue,
            EmojiColor::Orange => self.orange,
            EmojiColor::Red => self.red,
        }
    }
}

/// Evaluates tallies over every week sheet currently in the workbook.
///
/// Formula cells are skipped; only typed values contribute.
pub fn preview_tallies<R: WorkbookRepository>(
    repo: &R,
    layout: &WorkbookLayout,
) -> Result<Vec<TallyRow>, SetupError> {
    let columns = layout.tally_column_indexes().map_err(SetupError::from)?;
    let sheets = ordered_week_sheets(repo)?;

    let mut rows = Vec::new();
    for week_row in behavior_rows() {
        let cells = sheets
            .iter()
            .map(|sheet| row_values(repo, sheet, week_row, &columns))
            .collect::<Result<Vec<_>, RepoError>>()?;
        rows.push(TallyRow {
            week_row,
            blue: tally_across_weeks(cells.clone(), EmojiColor::Blue),
            orange: tally_across_weeks(cells.clone(), EmojiColor::Orange),
            red: tally_across_weeks(cells, EmojiColor::Red),
        });
    }
    Ok(rows)
}

fn row_values<R: WorkbookRepository>(
    repo: &R,
    sheet: &str,
    row: u32,
    columns: &[u32],
) -> Result<Vec<String>, RepoError> {
    columns
        .iter()
        .map(|col| {
            Ok(match repo.get_cell(sheet, CellAddress::new(row, *col))? {
                Some(CellContent::Value(text)) => text,
                Some(CellContent::Formula(_)) | None => String::new(),
            })
        })
        .collect()
}
