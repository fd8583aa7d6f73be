//! In-memory workbook used by tests and dry runs.
//!
//! # Invariants
//! - Behaves like the SQLite repository for every trait operation.
//! - Cells with neither content nor note are dropped from the map.

use crate::model::workbook::{
    CellAddress, CellContent, CellRange, Chart, ChartId, ChartSpec, NamedRange,
};
use crate::repo::workbook_repo::{ensure_shape, RepoError, RepoResult, WorkbookRepository};
use std::cell::RefCell;
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq)]
struct MemoryCell {
    content: Option<CellContent>,
    note: Option<String>,
}

impl MemoryCell {
    fn is_vacant(&self) -> bool {
        self.content.is_none() && self.note.is_none()
    }
}

#[derive(Debug, Clone, Default)]
struct MemorySheet {
    name: String,
    cells: BTreeMap<CellAddress, MemoryCell>,
    charts: Vec<Chart>,
}

#[derive(Debug, Default)]
struct MemoryState {
    sheets: Vec<MemorySheet>,
    named_ranges: BTreeMap<String, NamedRange>,
}

impl MemoryState {
    fn sheet(&self, name: &str) -> RepoResult<&MemorySheet> {
        self.sheets
            .iter()
            .find(|sheet| sheet.name == name)
            .ok_or_else(|| RepoError::SheetNotFound(name.to_string()))
    }

    fn sheet_mut(&mut self, name: &str) -> RepoResult<&mut MemorySheet> {
        self.sheets
            .iter_mut()
            .find(|sheet| sheet.name == name)
            .ok_or_else(|| RepoError::SheetNotFound(name.to_string()))
    }

    fn ensure_absent(&self, name: &str) -> RepoResult<()> {
        if self.sheets.iter().any(|sheet| sheet.name == name) {
            return Err(RepoError::SheetAlreadyExists(name.to_string()));
        }
        Ok(())
    }
}

/// Workbook held entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryWorkbook {
    state: RefCell<MemoryState>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored cells on a sheet (content or note), for assertions.
    pub fn populated_cell_count(&self, sheet: &str) -> RepoResult<usize> {
        Ok(self.state.borrow().sheet(sheet)?.cells.len())
    }

    fn update_cell<F>(&self, sheet: &str, address: CellAddress, apply: F) -> RepoResult<()>
    where
        F: FnOnce(&mut MemoryCell),
    {
        let mut state = self.state.borrow_mut();
        let sheet = state.sheet_mut(sheet)?;
        let cell = sheet.cells.entry(address).or_default();
        apply(cell);
        if cell.is_vacant() {
            sheet.cells.remove(&address);
        }
        Ok(())
    }
}

impl WorkbookRepository for MemoryWorkbook {
    fn sheet_names(&self) -> RepoResult<Vec<String>> {
        Ok(self
            .state
            .borrow()
            .sheets
            .iter()
            .map(|sheet| sheet.name.clone())
            .collect())
    }

    fn create_sheet(&self, name: &str) -> RepoResult<()> {
        let mut state = self.state.borrow_mut();
        state.ensure_absent(name)?;
        state.sheets.push(MemorySheet {
            name: name.to_string(),
            ..MemorySheet::default()
        });
        Ok(())
    }

    fn duplicate_sheet(&self, source: &str, new_name: &str) -> RepoResult<()> {
        let mut state = self.state.borrow_mut();
        let cells = state.sheet(source)?.cells.clone();
        state.ensure_absent(new_name)?;
        state.sheets.push(MemorySheet {
            name: new_name.to_string(),
            cells,
            charts: Vec::new(),
        });
        Ok(())
    }

    fn delete_sheet(&self, name: &str) -> RepoResult<()> {
        let mut state = self.state.borrow_mut();
        state.sheet(name)?;
        state.sheets.retain(|sheet| sheet.name != name);
        state.named_ranges.retain(|_, named| named.sheet != name);
        Ok(())
    }

    fn get_cell(&self, sheet: &str, address: CellAddress) -> RepoResult<Option<CellContent>> {
        let state = self.state.borrow();
        Ok(state
            .sheet(sheet)?
            .cells
            .get(&address)
            .and_then(|cell| cell.content.clone()))
    }

    fn set_value(&self, sheet: &str, address: CellAddress, value: &str) -> RepoResult<()> {
        self.update_cell(sheet, address, |cell| {
            cell.content = if value.is_empty() {
                None
            } else {
                Some(CellContent::Value(value.to_string()))
            };
        })
    }

    fn set_formula(&self, sheet: &str, address: CellAddress, formula: &str) -> RepoResult<()> {
        self.update_cell(sheet, address, |cell| {
            cell.content = Some(CellContent::Formula(formula.to_string()));
        })
    }

    fn clear_contents(&self, sheet: &str, range: &CellRange) -> RepoResult<()> {
        let mut state = self.state.borrow_mut();
        let sheet = state.sheet_mut(sheet)?;
        sheet.cells.retain(|address, cell| {
            if range.contains(*address) {
                cell.content = None;
            }
            !cell.is_vacant()
        });
        Ok(())
    }

    fn row_contents(&self, sheet: &str, row: u32) -> RepoResult<Vec<(u32, CellContent)>> {
        let state = self.state.borrow();
        Ok(state
            .sheet(sheet)?
            .cells
            .iter()
            .filter(|(address, _)| address.row == row)
            .filter_map(|(address, cell)| {
                cell.content
                    .clone()
                    .map(|content| (address.col, content))
            })
            .collect())
    }

    fn last_column(&self, sheet: &str) -> RepoResult<u32> {
        let state = self.state.borrow();
        Ok(state
            .sheet(sheet)?
            .cells
            .iter()
            .filter(|(_, cell)| cell.content.is_some())
            .map(|(address, _)| address.col)
            .max()
            .unwrap_or(0))
    }

    fn get_notes(&self, sheet: &str, range: &CellRange) -> RepoResult<Vec<Vec<String>>> {
        let state = self.state.borrow();
        let sheet = state.sheet(sheet)?;
        let notes = (range.start.row..=range.end.row)
            .map(|row| {
                (range.start.col..=range.end.col)
                    .map(|col| {
                        sheet
                            .cells
                            .get(&CellAddress::new(row, col))
                            .and_then(|cell| cell.note.clone())
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();
        Ok(notes)
    }

    fn set_notes(&self, sheet: &str, range: &CellRange, notes: &[Vec<String>]) -> RepoResult<()> {
        ensure_shape(range, notes)?;
        let mut state = self.state.borrow_mut();
        let sheet = state.sheet_mut(sheet)?;
        for (address, note) in range.addresses().zip(notes.iter().flatten()) {
            let cell = sheet.cells.entry(address).or_default();
            cell.note = if note.is_empty() {
                None
            } else {
                Some(note.clone())
            };
            if cell.is_vacant() {
                sheet.cells.remove(&address);
            }
        }
        Ok(())
    }

    fn define_named_range(&self, named: &NamedRange) -> RepoResult<()> {
        let mut state = self.state.borrow_mut();
        state.sheet(&named.sheet)?;
        state
            .named_ranges
            .insert(named.name.clone(), named.clone());
        Ok(())
    }

    fn named_range(&self, name: &str) -> RepoResult<NamedRange> {
        self.state
            .borrow()
            .named_ranges
            .get(name)
            .cloned()
            .ok_or_else(|| RepoError::NamedRangeNotFound(name.to_string()))
    }

    fn charts(&self, sheet: &str) -> RepoResult<Vec<Chart>> {
        Ok(self.state.borrow().sheet(sheet)?.charts.clone())
    }

    fn insert_chart(&self, sheet: &str, spec: &ChartSpec) -> RepoResult<ChartId> {
        let mut state = self.state.borrow_mut();
        let sheet = state.sheet_mut(sheet)?;
        let id = Uuid::new_v4();
        sheet.charts.push(Chart {
            id,
            spec: spec.clone(),
        });
        Ok(id)
    }

    fn remove_chart(&self, sheet: &str, id: ChartId) -> RepoResult<()> {
        let mut state = self.state.borrow_mut();
        let sheet = state.sheet_mut(sheet)?;
        let before = sheet.charts.len();
        sheet.charts.retain(|chart| chart.id != id);
        if sheet.charts.len() == before {
            return Err(RepoError::ChartNotFound(id));
        }
        Ok(())
    }
}
