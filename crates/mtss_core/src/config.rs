//! Workbook layout configuration.
//!
//! # Responsibility
//! - Hold the fixed identifiers (sheet names, stamp cells, reference columns,
//!   note range names) the services operate on.
//! - Load overrides from a JSON file and validate them before use.
//!
//! # Invariants
//! - A validated layout always has five date cells, five behavior columns
//!   and five tally source columns, all valid A1 references.

use crate::model::week::WEEKDAYS_PER_WEEK;
use crate::model::workbook::{column_index, CellAddress};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub const DEFAULT_TEMPLATE_SHEET: &str = "Week_Template";
pub const DEFAULT_SUMMARY_SHEET: &str = "Summary";
pub const DEFAULT_NOTE_SOURCE: &str = "Notes_Template";
pub const DEFAULT_NOTE_TARGET_COUNT: u32 = 52;

/// Which week sheets the emoji tally formulas sum over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TallyScope {
    /// Every week sheet in the workbook after the run.
    #[default]
    Cumulative,
    /// Only the sheets created by the current run.
    NewWeeksOnly,
}

/// Identifiers and cell positions used by every service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkbookLayout {
    pub template_sheet: String,
    pub summary_sheet: String,
    /// Monday..Friday date stamp cells on each week sheet.
    pub date_cells: Vec<String>,
    /// Monday..Friday columns mirrored into summary rows 3-9.
    pub behavior_columns: Vec<String>,
    /// Monday..Friday columns holding emoji markers.
    pub tally_source_columns: Vec<String>,
    pub tally_scope: TallyScope,
    /// Named range copied by the note replicator.
    pub note_source: String,
    /// Named ranges receiving the copied notes.
    pub note_targets: Vec<String>,
}

impl Default for WorkbookLayout {
    fn default() -> Self {
        Self {
            template_sheet: DEFAULT_TEMPLATE_SHEET.to_string(),
            summary_sheet: DEFAULT_SUMMARY_SHEET.to_string(),
            date_cells: to_strings(&["C2", "E2", "G2", "I2", "K2"]),
            behavior_columns: to_strings(&["O", "Q", "S", "U", "W"]),
            tally_source_columns: to_strings(&["P", "R", "T", "V", "X"]),
            tally_scope: TallyScope::default(),
            note_source: DEFAULT_NOTE_SOURCE.to_string(),
            note_targets: default_note_targets(),
        }
    }
}

impl WorkbookLayout {
    /// Loads a layout from JSON; missing fields fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.display().to_string(),
            source: err,
        })?;
        let layout: Self = serde_json::from_str(&raw).map_err(ConfigError::Parse)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Checks names and A1 references.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.template_sheet.trim().is_empty() {
            return Err(ConfigError::Invalid("template_sheet must not be empty".into()));
        }
        if self.summary_sheet.trim().is_empty() {
            return Err(ConfigError::Invalid("summary_sheet must not be empty".into()));
        }
        if self.template_sheet == self.summary_sheet {
            return Err(ConfigError::Invalid(
                "template_sheet and summary_sheet must differ".into(),
            ));
        }
        self.date_addresses()?;
        self.behavior_column_indexes()?;
        self.tally_column_indexes()?;
        if self.note_source.trim().is_empty() {
            return Err(ConfigError::Invalid("note_source must not be empty".into()));
        }
        if let Some(blank) = self.note_targets.iter().find(|name| name.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "note_targets contains a blank name `{blank}`"
            )));
        }
        Ok(())
    }

    /// Parsed date stamp cells.
    pub fn date_addresses(&self) -> Result<Vec<CellAddress>, ConfigError> {
        expect_weekdays("date_cells", &self.date_cells)?;
        self.date_cells
            .iter()
            .map(|cell| {
                CellAddress::parse(cell)
                    .map_err(|err| ConfigError::Invalid(format!("date_cells: {err}")))
            })
            .collect()
    }

    pub fn behavior_column_indexes(&self) -> Result<Vec<u32>, ConfigError> {
        parse_columns("behavior_columns", &self.behavior_columns)
    }

    pub fn tally_column_indexes(&self) -> Result<Vec<u32>, ConfigError> {
        parse_columns("tally_source_columns", &self.tally_source_columns)
    }
}

/// `Notes_Week_1` through `Notes_Week_52`.
pub fn default_note_targets() -> Vec<String> {
    (1..=DEFAULT_NOTE_TARGET_COUNT)
        .map(|week| format!("Notes_Week_{week}"))
        .collect()
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}

fn expect_weekdays(field: &str, values: &[String]) -> Result<(), ConfigError> {
    if values.len() != WEEKDAYS_PER_WEEK {
        return Err(ConfigError::Invalid(format!(
            "{field} must list {WEEKDAYS_PER_WEEK} entries, got {}",
            values.len()
        )));
    }
    Ok(())
}

fn parse_columns(field: &str, values: &[String]) -> Result<Vec<u32>, ConfigError> {
    expect_weekdays(field, values)?;
    values
        .iter()
        .map(|letters| {
            column_index(letters.trim()).ok_or_else(|| {
                ConfigError::Invalid(format!("{field}: invalid column `{letters}`"))
            })
        })
        .collect()
}

/// Layout loading and validation errors.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: String,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "failed to read layout `{path}`: {source}"),
            Self::Parse(err) => write!(f, "invalid layout json: {err}"),
            Self::Invalid(message) => write!(f, "invalid layout: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}
