//! SQLite-backed workbook repository.
//!
//! # Responsibility
//! - Persist sheets, cells, notes, named ranges and charts in one file.
//! - Keep SQL details inside the repository boundary.
//!
//! # Invariants
//! - Rows with neither content nor note are deleted, never kept empty.
//! - Multi-row writes (`duplicate_sheet`, `set_notes`) run in one transaction.

use crate::model::workbook::{
    CellAddress, CellContent, CellRange, Chart, ChartId, ChartSpec, NamedRange,
};
use crate::repo::workbook_repo::{ensure_shape, RepoError, RepoResult, WorkbookRepository};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

const KIND_VALUE: &str = "value";
const KIND_FORMULA: &str = "formula";

/// Workbook stored in a SQLite connection opened by [`crate::db::open_db`].
pub struct SqliteWorkbookRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteWorkbookRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn sheet_id(&self, name: &str) -> RepoResult<i64> {
        self.conn
            .query_row("SELECT id FROM sheets WHERE name = ?1;", [name], |row| {
                row.get::<_, i64>(0)
            })
            .optional()?
            .ok_or_else(|| RepoError::SheetNotFound(name.to_string()))
    }

    fn ensure_absent(&self, name: &str) -> RepoResult<()> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sheets WHERE name = ?1);",
            [name],
            |row| row.get(0),
        )?;
        if exists == 1 {
            return Err(RepoError::SheetAlreadyExists(name.to_string()));
        }
        Ok(())
    }

    fn insert_sheet(&self, name: &str) -> RepoResult<i64> {
        self.ensure_absent(name)?;
        self.conn.execute(
            "INSERT INTO sheets (name, position)
             VALUES (?1, (SELECT COALESCE(MAX(position), 0) + 1 FROM sheets));",
            [name],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn write_content(
        &self,
        sheet: &str,
        address: CellAddress,
        content: Option<&CellContent>,
    ) -> RepoResult<()> {
        let sheet_id = self.sheet_id(sheet)?;
        let (kind, text) = match content {
            Some(CellContent::Value(text)) => (Some(KIND_VALUE), Some(text.as_str())),
            Some(CellContent::Formula(text)) => (Some(KIND_FORMULA), Some(text.as_str())),
            None => (None, None),
        };
        self.conn.execute(
            "INSERT INTO cells (sheet_id, row_index, col_index, kind, content, note)
             VALUES (?1, ?2, ?3, ?4, ?5, NULL)
             ON CONFLICT (sheet_id, row_index, col_index)
             DO UPDATE SET kind = excluded.kind, content = excluded.content;",
            params![sheet_id, address.row, address.col, kind, text],
        )?;
        if content.is_none() {
            prune_vacant(self.conn, sheet_id, &CellRange::single(address))?;
        }
        Ok(())
    }
}

impl WorkbookRepository for SqliteWorkbookRepository<'_> {
    fn sheet_names(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sheets ORDER BY position ASC, id ASC;")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    fn has_sheet(&self, name: &str) -> RepoResult<bool> {
        match self.sheet_id(name) {
            Ok(_) => Ok(true),
            Err(RepoError::SheetNotFound(_)) => Ok(false),
            Err(other) => Err(other),
        }
    }

    fn create_sheet(&self, name: &str) -> RepoResult<()> {
        self.insert_sheet(name)?;
        Ok(())
    }

    fn duplicate_sheet(&self, source: &str, new_name: &str) -> RepoResult<()> {
        let source_id = self.sheet_id(source)?;
        let tx = self.conn.unchecked_transaction()?;
        let new_id = self.insert_sheet(new_name)?;
        tx.execute(
            "INSERT INTO cells (sheet_id, row_index, col_index, kind, content, note)
             SELECT ?1, row_index, col_index, kind, content, note
             FROM cells
             WHERE sheet_id = ?2;",
            params![new_id, source_id],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn delete_sheet(&self, name: &str) -> RepoResult<()> {
        let sheet_id = self.sheet_id(name)?;
        self.conn
            .execute("DELETE FROM sheets WHERE id = ?1;", [sheet_id])?;
        Ok(())
    }

    fn get_cell(&self, sheet: &str, address: CellAddress) -> RepoResult<Option<CellContent>> {
        let sheet_id = self.sheet_id(sheet)?;
        let row = self
            .conn
            .query_row(
                "SELECT kind, content FROM cells
                 WHERE sheet_id = ?1 AND row_index = ?2 AND col_index = ?3;",
                params![sheet_id, address.row, address.col],
                |row| Ok((row.get::<_, Option<String>>(0)?, row.get::<_, Option<String>>(1)?)),
            )
            .optional()?;
        match row {
            Some((kind, content)) => parse_content(kind, content),
            None => Ok(None),
        }
    }

    fn set_value(&self, sheet: &str, address: CellAddress, value: &str) -> RepoResult<()> {
        if value.is_empty() {
            return self.write_content(sheet, address, None);
        }
        self.write_content(sheet, address, Some(&CellContent::Value(value.to_string())))
    }

    fn set_formula(&self, sheet: &str, address: CellAddress, formula: &str) -> RepoResult<()> {
        self.write_content(
            sheet,
            address,
            Some(&CellContent::Formula(formula.to_string())),
        )
    }

    fn clear_contents(&self, sheet: &str, range: &CellRange) -> RepoResult<()> {
        let sheet_id = self.sheet_id(sheet)?;
        self.conn.execute(
            "UPDATE cells SET kind = NULL, content = NULL
             WHERE sheet_id = ?1
               AND row_index BETWEEN ?2 AND ?3
               AND col_index BETWEEN ?4 AND ?5;",
            params![
                sheet_id,
                range.start.row,
                range.end.row,
                range.start.col,
                range.end.col
            ],
        )?;
        prune_vacant(self.conn, sheet_id, range)?;
        Ok(())
    }

    fn row_contents(&self, sheet: &str, row: u32) -> RepoResult<Vec<(u32, CellContent)>> {
        let sheet_id = self.sheet_id(sheet)?;
        let mut stmt = self.conn.prepare(
            "SELECT col_index, kind, content FROM cells
             WHERE sheet_id = ?1 AND row_index = ?2 AND content IS NOT NULL
             ORDER BY col_index ASC;",
        )?;
        let rows = stmt
            .query_map(params![sheet_id, row], |row| {
                Ok((
                    row.get::<_, u32>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut contents = Vec::with_capacity(rows.len());
        for (col, kind, content) in rows {
            if let Some(content) = parse_content(kind, content)? {
                contents.push((col, content));
            }
        }
        Ok(contents)
    }

    fn last_column(&self, sheet: &str) -> RepoResult<u32> {
        let sheet_id = self.sheet_id(sheet)?;
        let last = self.conn.query_row(
            "SELECT COALESCE(MAX(col_index), 0) FROM cells
             WHERE sheet_id = ?1 AND content IS NOT NULL;",
            [sheet_id],
            |row| row.get::<_, u32>(0),
        )?;
        Ok(last)
    }

    fn get_notes(&self, sheet: &str, range: &CellRange) -> RepoResult<Vec<Vec<String>>> {
        let sheet_id = self.sheet_id(sheet)?;
        let (rows, cols) = range.shape();
        let mut notes = vec![vec![String::new(); cols]; rows];

        let mut stmt = self.conn.prepare(
            "SELECT row_index, col_index, note FROM cells
             WHERE sheet_id = ?1
               AND note IS NOT NULL
               AND row_index BETWEEN ?2 AND ?3
               AND col_index BETWEEN ?4 AND ?5;",
        )?;
        let found = stmt.query_map(
            params![
                sheet_id,
                range.start.row,
                range.end.row,
                range.start.col,
                range.end.col
            ],
            |row| {
                Ok((
                    row.get::<_, u32>(0)?,
                    row.get::<_, u32>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )?;
        for entry in found {
            let (row, col, note) = entry?;
            let r = (row - range.start.row) as usize;
            let c = (col - range.start.col) as usize;
            notes[r][c] = note;
        }
        Ok(notes)
    }

    fn set_notes(&self, sheet: &str, range: &CellRange, notes: &[Vec<String>]) -> RepoResult<()> {
        ensure_shape(range, notes)?;
        let sheet_id = self.sheet_id(sheet)?;

        let tx = self.conn.unchecked_transaction()?;
        {
            let mut upsert = tx.prepare(
                "INSERT INTO cells (sheet_id, row_index, col_index, kind, content, note)
                 VALUES (?1, ?2, ?3, NULL, NULL, ?4)
                 ON CONFLICT (sheet_id, row_index, col_index)
                 DO UPDATE SET note = excluded.note;",
            )?;
            for (address, note) in range.addresses().zip(notes.iter().flatten()) {
                let note = if note.is_empty() {
                    None
                } else {
                    Some(note.as_str())
                };
                upsert.execute(params![sheet_id, address.row, address.col, note])?;
            }
        }
        prune_vacant(&tx, sheet_id, range)?;
        tx.commit()?;
        Ok(())
    }

    fn define_named_range(&self, named: &NamedRange) -> RepoResult<()> {
        let sheet_id = self.sheet_id(&named.sheet)?;
        self.conn.execute(
            "INSERT INTO named_ranges (name, sheet_id, start_row, start_col, end_row, end_col)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (name) DO UPDATE SET
                sheet_id = excluded.sheet_id,
                start_row = excluded.start_row,
                start_col = excluded.start_col,
                end_row = excluded.end_row,
                end_col = excluded.end_col;",
            params![
                named.name,
                sheet_id,
                named.range.start.row,
                named.range.start.col,
                named.range.end.row,
                named.range.end.col
            ],
        )?;
        Ok(())
    }

    fn named_range(&self, name: &str) -> RepoResult<NamedRange> {
        self.conn
            .query_row(
                "SELECT s.name, n.start_row, n.start_col, n.end_row, n.end_col
                 FROM named_ranges n
                 JOIN sheets s ON s.id = n.sheet_id
                 WHERE n.name = ?1;",
                [name],
                |row| {
                    let start = CellAddress::new(row.get(1)?, row.get(2)?);
                    let end = CellAddress::new(row.get(3)?, row.get(4)?);
                    Ok(NamedRange::new(
                        name,
                        row.get::<_, String>(0)?,
                        CellRange::new(start, end),
                    ))
                },
            )
            .optional()?
            .ok_or_else(|| RepoError::NamedRangeNotFound(name.to_string()))
    }

    fn charts(&self, sheet: &str) -> RepoResult<Vec<Chart>> {
        let sheet_id = self.sheet_id(sheet)?;
        let mut stmt = self.conn.prepare(
            "SELECT uuid, spec_json FROM charts
             WHERE sheet_id = ?1
             ORDER BY created_at ASC, rowid ASC;",
        )?;
        let rows = stmt
            .query_map([sheet_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(uuid_text, spec_json)| {
                let id = Uuid::parse_str(&uuid_text).map_err(|_| {
                    RepoError::InvalidData(format!("invalid uuid `{uuid_text}` in charts.uuid"))
                })?;
                let spec = serde_json::from_str::<ChartSpec>(&spec_json).map_err(|err| {
                    RepoError::InvalidData(format!("invalid chart spec for {id}: {err}"))
                })?;
                Ok(Chart { id, spec })
            })
            .collect()
    }

    fn insert_chart(&self, sheet: &str, spec: &ChartSpec) -> RepoResult<ChartId> {
        let sheet_id = self.sheet_id(sheet)?;
        let id = Uuid::new_v4();
        let spec_json = serde_json::to_string(spec)
            .map_err(|err| RepoError::InvalidData(format!("unserializable chart spec: {err}")))?;
        self.conn.execute(
            "INSERT INTO charts (uuid, sheet_id, spec_json) VALUES (?1, ?2, ?3);",
            params![id.to_string(), sheet_id, spec_json],
        )?;
        Ok(id)
    }

    fn remove_chart(&self, sheet: &str, id: ChartId) -> RepoResult<()> {
        let sheet_id = self.sheet_id(sheet)?;
        let changed = self.conn.execute(
            "DELETE FROM charts WHERE uuid = ?1 AND sheet_id = ?2;",
            params![id.to_string(), sheet_id],
        )?;
        if changed == 0 {
            return Err(RepoError::ChartNotFound(id));
        }
        Ok(())
    }
}

/// Drops rows inside `range` left with neither content nor note.
fn prune_vacant(conn: &Connection, sheet_id: i64, range: &CellRange) -> RepoResult<()> {
    conn.execute(
        "DELETE FROM cells
         WHERE sheet_id = ?1
           AND row_index BETWEEN ?2 AND ?3
           AND col_index BETWEEN ?4 AND ?5
           AND content IS NULL
           AND note IS NULL;",
        params![
            sheet_id,
            range.start.row,
            range.end.row,
            range.start.col,
            range.end.col
        ],
    )?;
    Ok(())
}

fn parse_content(kind: Option<String>, content: Option<String>) -> RepoResult<Option<CellContent>> {
    match (kind.as_deref(), content) {
        (None, None) => Ok(None),
        (Some(KIND_VALUE), Some(text)) => Ok(Some(CellContent::Value(text))),
        (Some(KIND_FORMULA), Some(text)) => Ok(Some(CellContent::Formula(text))),
        (kind, _) => Err(RepoError::InvalidData(format!(
            "invalid cell kind `{}` in cells.kind",
            kind.unwrap_or("NULL")
        ))),
    }
}
