//! Formula text builders for cross-sheet references.
//!
//! Formulas are produced as plain strings; evaluation belongs to whatever
//! spreadsheet engine opens the workbook.

use crate::model::tally::EmojiColor;
use crate::model::workbook::{column_letters, CellAddress};

/// Renders a sheet name for use before `!`.
///
/// Names made only of ASCII letters, digits and `_` (not starting with a
/// digit) stay bare; everything else is single-quoted with `'` doubled.
pub fn sheet_reference(sheet: &str) -> String {
    let bare = !sheet.is_empty()
        && !sheet.starts_with(|ch: char| ch.is_ascii_digit())
        && sheet.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    if bare {
        sheet.to_string()
    } else {
        format!("'{}'", sheet.replace('\'', "''"))
    }
}

/// `'Week 1'!C2` without the leading `=`.
pub fn cell_reference(sheet: &str, address: CellAddress) -> String {
    format!("{}!{}", sheet_reference(sheet), address.to_a1())
}

/// `='Week 1'!C2`
pub fn reference_formula(sheet: &str, address: CellAddress) -> String {
    format!("={}", cell_reference(sheet, address))
}

/// Concatenation of one row across `columns`, e.g. `'Week 1'!P9 & 'Week 1'!R9`.
pub fn concat_row_reference(sheet: &str, row: u32, columns: &[u32]) -> String {
    columns
        .iter()
        .map(|col| cell_reference(sheet, CellAddress::new(row, *col)))
        .collect::<Vec<_>>()
        .join(" & ")
}

/// One sheet's share of an emoji tally.
pub fn emoji_tally_term(sheet: &str, row: u32, columns: &[u32], color: EmojiColor) -> String {
    let refs = concat_row_reference(sheet, row, columns);
    format!(
        "(LEN({refs}) - LEN(SUBSTITUTE({refs}, \"{}\", \"\"))) / 2",
        color.symbol()
    )
}

/// Full tally formula summing one term per sheet.
///
/// An empty sheet list yields `=0` so the cell stays numeric.
pub fn emoji_tally_formula<S: AsRef<str>>(
    sheets: &[S],
    row: u32,
    columns: &[u32],
    color: EmojiColor,
) -> String {
    if sheets.is_empty() {
        return "=0".to_string();
    }
    let terms: Vec<String> = sheets
        .iter()
        .map(|sheet| emoji_tally_term(sheet.as_ref(), row, columns, color))
        .collect();
    format!("={}", terms.join(" + "))
}

/// Debug-friendly column list such as `P,R,T,V,X`.
pub fn describe_columns(columns: &[u32]) -> String {
    columns
        .iter()
        .map(|col| column_letters(*col))
        .collect::<Vec<_>>()
        .join(",")
}
