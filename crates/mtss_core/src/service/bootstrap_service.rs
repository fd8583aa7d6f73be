//! Workbook bootstrap for a blank store.
//!
//! # Responsibility
//! - Create the template and summary sheets with their fixed labels.
//! - Bind note named ranges to the template and to existing week sheets.
//!
//! # Invariants
//! - The layout is validated before the first write.
//! - Re-running never duplicates sheets or overwrites existing cells.

use crate::config::WorkbookLayout;
use crate::model::week::{week_sheet_name, WEEKDAY_NAMES};
use crate::model::workbook::{CellAddress, CellRange, NamedRange};
use crate::repo::workbook_repo::{RepoResult, WorkbookRepository};
use crate::service::week_service::{
    behavior_rows, SetupError, SUMMARY_DATE_LABEL, SUMMARY_DATE_ROW, SUMMARY_LABEL_COLUMN,
    TEMPLATE_LABEL_COLUMN,
};
use log::info;

/// Per-week notes block: behavior rows 9..15, columns O..X.
pub const NOTE_BLOCK: &str = "O9:X15";

/// What a bootstrap run created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub created_sheets: Vec<String>,
    pub bound_note_ranges: usize,
}

/// Creates missing layout sheets and binds note ranges.
///
/// An invalid layout fails with `SetupError::Config` before anything is written.
pub fn bootstrap_workbook<R: WorkbookRepository>(
    repo: &R,
    layout: &WorkbookLayout,
) -> Result<BootstrapReport, SetupError> {
    layout.validate()?;
    let mut report = BootstrapReport::default();

    if !repo.has_sheet(&layout.template_sheet)? {
        repo.create_sheet(&layout.template_sheet)?;
        seed_template(repo, layout)?;
        report.created_sheets.push(layout.template_sheet.clone());
    }
    if !repo.has_sheet(&layout.summary_sheet)? {
        repo.create_sheet(&layout.summary_sheet)?;
        repo.set_value(
            &layout.summary_sheet,
            CellAddress::new(SUMMARY_DATE_ROW, SUMMARY_LABEL_COLUMN),
            SUMMARY_DATE_LABEL,
        )?;
        report.created_sheets.push(layout.summary_sheet.clone());
    }

    report.bound_note_ranges = bind_note_ranges(repo, layout)?;
    info!(
        "event=workbook_bootstrap module=service status=ok created={} note_ranges={}",
        report.created_sheets.len(),
        report.bound_note_ranges
    );
    Ok(report)
}

/// Binds the note source to the template and target `i` (1-based) to
/// `Week {i}` when that sheet exists.
///
/// Returns how many named ranges were (re)defined.
pub fn bind_note_ranges<R: WorkbookRepository>(
    repo: &R,
    layout: &WorkbookLayout,
) -> RepoResult<usize> {
    let block = note_block();
    let mut bound = 0;

    if repo.has_sheet(&layout.template_sheet)? {
        repo.define_named_range(&NamedRange::new(
            layout.note_source.as_str(),
            layout.template_sheet.as_str(),
            block,
        ))?;
        bound += 1;
    }

    for (index, target) in layout.note_targets.iter().enumerate() {
        let sheet = week_sheet_name(index as u32 + 1);
        if repo.has_sheet(&sheet)? {
            repo.define_named_range(&NamedRange::new(target.as_str(), sheet, block))?;
            bound += 1;
        }
    }
    Ok(bound)
}

fn note_block() -> CellRange {
    CellRange::new(CellAddress::new(9, 15), CellAddress::new(15, 24))
}

fn seed_template<R: WorkbookRepository>(
    repo: &R,
    layout: &WorkbookLayout,
) -> Result<(), SetupError> {
    let sheet = layout.template_sheet.as_str();
    let header_row = SUMMARY_DATE_ROW - 1;
    for (cell, day) in layout.date_addresses()?.iter().zip(WEEKDAY_NAMES) {
        repo.set_value(sheet, CellAddress::new(header_row, cell.col), day)?;
    }
    for (index, row) in behavior_rows().enumerate() {
        repo.set_value(
            sheet,
            CellAddress::new(row, TEMPLATE_LABEL_COLUMN),
            &format!("Behavior {}", index + 1),
        )?;
    }
    Ok(())
}
