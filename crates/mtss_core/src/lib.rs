//! Core logic for the MTSS behavior-tracking workbook.
//! Generates weekly data-entry sheets, maintains the summary sheet, renders
//! the trend chart and broadcasts cell notes, all through an injected
//! workbook repository.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, TallyScope, WorkbookLayout};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::tally::EmojiColor;
pub use model::workbook::{
    CellAddress, CellContent, CellRange, Chart, ChartId, ChartSpec, NamedRange,
};
pub use repo::memory_repo::MemoryWorkbook;
pub use repo::sqlite_repo::SqliteWorkbookRepository;
pub use repo::workbook_repo::{RepoError, RepoResult, WorkbookRepository};
pub use service::bootstrap_service::{bind_note_ranges, bootstrap_workbook, BootstrapReport};
pub use service::chart_service::ChartRenderer;
pub use service::note_service::{NoteReplicationError, NoteReplicator, ReplicationReport};
pub use service::prompt::{
    Notifier, PromptResponse, Prompter, RecordingNotifier, ScriptedPrompter, Toast,
};
pub use service::tally_service::{preview_tallies, TallyRow};
pub use service::week_service::{
    AbortReason, ExistingWeeksChoice, SetupError, SetupOutcome, SetupReport,
    WeeklySheetGenerator,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
