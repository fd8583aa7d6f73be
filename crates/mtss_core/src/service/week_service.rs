//! Weekly sheet generation use-case.
//!
//! # Responsibility
//! - Decide the first week number and summary column from existing sheets.
//! - Collect and validate the action choice, start date and week count.
//! - Clone the template once per week, stamp dates, and extend the summary
//!   sheet with date, behavior and emoji tally formulas.
//!
//! # Invariants
//! - Every input is validated before the first workbook mutation; an abort
//!   leaves the workbook untouched.
//! - Generated weeks start on a Monday and are 7 days apart.
//! - The summary date row and every behavior row advance by exactly five
//!   columns per generated week, from the same base column.
//! - No run ever creates a sheet name that already exists.

use crate::config::{ConfigError, TallyScope, WorkbookLayout};
use crate::model::formula::{describe_columns, emoji_tally_formula, reference_formula};
use crate::model::tally::EmojiColor;
use crate::model::week::{
    align_to_monday, is_week_sheet_name, nth_monday, parse_start_date, parse_week_count,
    parse_week_sheet_number, week_date_labels, week_sheet_name, WEEKDAYS_PER_WEEK,
};
use crate::model::workbook::{CellAddress, CellRange, MAX_COLUMN};
use crate::repo::workbook_repo::{RepoError, WorkbookRepository};
use crate::service::prompt::{Notifier, PromptResponse, Prompter};
use chrono::NaiveDate;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Summary row holding the flattened date header.
pub const SUMMARY_DATE_ROW: u32 = 2;
/// First summary column written on a fresh summary (`B`).
pub const SUMMARY_FIRST_COLUMN: u32 = 2;
/// First behavior row on week sheets.
pub const FIRST_BEHAVIOR_ROW: u32 = 9;
pub const BEHAVIOR_ROW_COUNT: u32 = 7;
/// Week row `r` is mirrored into summary row `r - 6` (rows 9..15 -> 3..9).
pub const SUMMARY_BEHAVIOR_ROW_SHIFT: u32 = 6;
/// Template column holding the behavior labels (`N`).
pub const TEMPLATE_LABEL_COLUMN: u32 = 14;
/// Summary column receiving the behavior labels (`A`).
pub const SUMMARY_LABEL_COLUMN: u32 = 1;
/// First summary row of the emoji tally block.
pub const TALLY_FIRST_ROW: u32 = 13;
/// Summary tally columns: blue `E`, orange `F`, red `G`.
pub const TALLY_COLUMNS: [(EmojiColor, u32); 3] = [
    (EmojiColor::Blue, 5),
    (EmojiColor::Orange, 6),
    (EmojiColor::Red, 7),
];

/// Header written into summary `A2`.
pub const SUMMARY_DATE_LABEL: &str = "Date";

/// Last summary row cleared on reset.
const SUMMARY_RESET_LAST_ROW: u32 = 9;
/// Reset always clears at least `A..BD`, and further out when the summary
/// has grown wider.
const SUMMARY_RESET_MIN_COLUMNS: u32 = 56;

const CHOICE_TITLE: &str = "Weekly Sheets Detected";
const CHOICE_MESSAGE: &str = "\u{26A0}\u{FE0F} This spreadsheet already has weekly sheets built in it.\n\n\
What do you want to do?\n\n\
Type DELETE to remove all existing weekly sheets.\n\
Type CONTINUE to keep them and start with the next available week number.\n\
Type CANCEL to abort the setup.";
const START_DATE_TITLE: &str = "Start Date";
const START_DATE_MESSAGE: &str = "What day will you start collecting data? (MM/DD/YYYY)";
const WEEK_COUNT_TITLE: &str = "Number of Weeks";
const WEEK_COUNT_MESSAGE: &str = "How many weeks would you like to create?";

const ALERT_SETUP_CANCELLED: &str = "Setup cancelled.";
const ALERT_INVALID_DATE: &str = "Invalid date. Please enter in MM/DD/YYYY format.";
const ALERT_INVALID_WEEKS: &str = "Please enter a valid number of weeks.";

const TOAST_TITLE: &str = "Setup Completed";
const TOAST_SECONDS: u32 = 8;

/// What to do with week sheets that already exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistingWeeksChoice {
    /// Remove them and start again from week 1.
    Delete,
    /// Keep them and append after the highest week number.
    Continue,
}

impl ExistingWeeksChoice {
    /// Parses typed input, ignoring case and surrounding whitespace.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_uppercase().as_str() {
            "DELETE" => Some(Self::Delete),
            "CONTINUE" => Some(Self::Continue),
            _ => None,
        }
    }
}

/// Why a setup run stopped before touching the workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    /// A prompt was dismissed, or the user typed CANCEL.
    Cancelled,
    /// The existing-sheets prompt got something other than DELETE/CONTINUE.
    UnrecognizedChoice(String),
    InvalidDate(String),
    InvalidWeekCount(String),
}

impl Display for AbortReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cancelled => write!(f, "cancelled"),
            Self::UnrecognizedChoice(value) => write!(f, "unrecognized choice `{value}`"),
            Self::InvalidDate(value) => write!(f, "invalid start date `{value}`"),
            Self::InvalidWeekCount(value) => write!(f, "invalid week count `{value}`"),
        }
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupReport {
    /// Sheets created by this run, in week order.
    pub created_sheets: Vec<String>,
    /// Sheets removed because the user chose DELETE.
    pub deleted_sheets: Vec<String>,
    pub first_week: u32,
    /// Monday of the first created week.
    pub first_monday: NaiveDate,
    /// First summary column written by this run.
    pub first_summary_column: u32,
    /// One past the last summary column written by this run.
    pub next_summary_column: u32,
    /// Whether summary content was cleared before writing.
    pub summary_reset: bool,
    /// Sheets summed by the emoji tally formulas.
    pub tally_sheets: Vec<String>,
}

impl SetupReport {
    /// Message shown to the user once the run completes.
    pub fn confirmation_message(&self) -> String {
        format!(
            "{} weekly sheets created starting with Week {} and the summary sheet was also populated.",
            self.created_sheets.len(),
            self.first_week
        )
    }
}

/// Result of one interactive run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupOutcome {
    Completed(SetupReport),
    Aborted(AbortReason),
}

/// Failures after input validation, or of the workbook itself.
#[derive(Debug)]
pub enum SetupError {
    Repo(RepoError),
    Config(ConfigError),
    /// Week dates ran past the supported calendar.
    CalendarOverflow,
}

impl Display for SetupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
            Self::CalendarOverflow => write!(f, "week dates exceed the supported calendar"),
        }
    }
}

impl Error for SetupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::CalendarOverflow => None,
        }
    }
}

impl From<RepoError> for SetupError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<ConfigError> for SetupError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

/// Resolved cell positions from the layout.
#[derive(Debug, Clone)]
struct Positions {
    date_cells: Vec<CellAddress>,
    behavior_columns: Vec<u32>,
    tally_columns: Vec<u32>,
}

/// Week sheet found in the workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ExistingWeek {
    name: String,
    number: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SummaryMode {
    Reset { delete: Vec<String> },
    Append { next_column: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SetupPlan {
    mode: SummaryMode,
    first_week: u32,
    first_monday: NaiveDate,
    week_count: u32,
}

/// Generator over one workbook layout.
pub struct WeeklySheetGenerator<'a> {
    layout: &'a WorkbookLayout,
}

impl<'a> WeeklySheetGenerator<'a> {
    pub fn new(layout: &'a WorkbookLayout) -> Self {
        Self { layout }
    }

    /// Runs the interactive setup against `repo`.
    ///
    /// Returns `Ok(SetupOutcome::Aborted(_))` for declined or invalid input,
    /// with the workbook unchanged. Repository failures after mutation began
    /// are returned as errors; earlier writes are not rolled back.
    pub fn run<R, P, N>(
        &self,
        repo: &R,
        prompter: &mut P,
        notifier: &mut N,
    ) -> Result<SetupOutcome, SetupError>
    where
        R: WorkbookRepository,
        P: Prompter,
        N: Notifier,
    {
        info!("event=weekly_setup module=service status=start");
        let positions = self.positions()?;
        self.require_sheet(repo, &self.layout.template_sheet)?;
        self.require_sheet(repo, &self.layout.summary_sheet)?;

        let existing = scan_existing_weeks(repo)?;
        let append_column = if existing.is_empty() {
            SUMMARY_FIRST_COLUMN
        } else {
            next_summary_column(repo, &self.layout.summary_sheet)?
        };

        let plan = match collect_plan(&existing, append_column, prompter, notifier) {
            Ok(plan) => plan,
            Err(reason) => {
                info!("event=weekly_setup module=service status=aborted reason={reason}");
                return Ok(SetupOutcome::Aborted(reason));
            }
        };

        let report = self.apply(repo, &plan, &positions)?;
        notifier.toast(&report.confirmation_message(), TOAST_TITLE, TOAST_SECONDS);
        info!(
            "event=weekly_setup module=service status=ok weeks={} first_week={} first_column={} reset={}",
            report.created_sheets.len(),
            report.first_week,
            report.first_summary_column,
            report.summary_reset
        );
        Ok(SetupOutcome::Completed(report))
    }

    fn positions(&self) -> Result<Positions, ConfigError> {
        Ok(Positions {
            date_cells: self.layout.date_addresses()?,
            behavior_columns: self.layout.behavior_column_indexes()?,
            tally_columns: self.layout.tally_column_indexes()?,
        })
    }

    fn require_sheet<R: WorkbookRepository>(&self, repo: &R, name: &str) -> Result<(), RepoError> {
        if repo.has_sheet(name)? {
            Ok(())
        } else {
            Err(RepoError::SheetNotFound(name.to_string()))
        }
    }

    fn apply<R: WorkbookRepository>(
        &self,
        repo: &R,
        plan: &SetupPlan,
        positions: &Positions,
    ) -> Result<SetupReport, SetupError> {
        let summary = self.layout.summary_sheet.as_str();

        let (first_column, summary_reset, deleted_sheets) = match &plan.mode {
            SummaryMode::Reset { delete } => {
                for name in delete {
                    repo.delete_sheet(name)?;
                    debug!("event=week_sheet_delete module=service status=ok sheet={name}");
                }
                self.reset_summary(repo)?;
                (SUMMARY_FIRST_COLUMN, true, delete.clone())
            }
            SummaryMode::Append { next_column } => (*next_column, false, Vec::new()),
        };

        let created_sheets = self.create_week_sheets(repo, plan, positions)?;

        let mut column = first_column;
        for name in &created_sheets {
            for cell in &positions.date_cells {
                repo.set_formula(
                    summary,
                    CellAddress::new(SUMMARY_DATE_ROW, column),
                    &reference_formula(name, *cell),
                )?;
                column += 1;
            }
        }
        let next_summary_column = column;

        for week_row in behavior_rows() {
            let summary_row = week_row - SUMMARY_BEHAVIOR_ROW_SHIFT;
            let mut column = first_column;
            for name in &created_sheets {
                for source_col in &positions.behavior_columns {
                    repo.set_formula(
                        summary,
                        CellAddress::new(summary_row, column),
                        &reference_formula(name, CellAddress::new(week_row, *source_col)),
                    )?;
                    column += 1;
                }
            }
        }

        let tally_sheets = match self.layout.tally_scope {
            TallyScope::NewWeeksOnly => created_sheets.clone(),
            TallyScope::Cumulative => ordered_week_sheets(repo)?,
        };
        self.write_tallies(repo, &tally_sheets, positions)?;

        Ok(SetupReport {
            created_sheets,
            deleted_sheets,
            first_week: plan.first_week,
            first_monday: plan.first_monday,
            first_summary_column: first_column,
            next_summary_column,
            summary_reset,
            tally_sheets,
        })
    }

    fn reset_summary<R: WorkbookRepository>(&self, repo: &R) -> Result<(), RepoError> {
        let summary = self.layout.summary_sheet.as_str();
        let width = repo.last_column(summary)?.max(SUMMARY_RESET_MIN_COLUMNS);
        let header_block = CellRange::from_origin(1, 1, SUMMARY_RESET_LAST_ROW, width);
        let tally_block = CellRange::from_origin(
            TALLY_FIRST_ROW,
            TALLY_COLUMNS[0].1,
            BEHAVIOR_ROW_COUNT,
            TALLY_COLUMNS.len() as u32,
        );
        repo.clear_contents(summary, &header_block)?;
        repo.clear_contents(summary, &tally_block)?;

        repo.set_value(
            summary,
            CellAddress::new(SUMMARY_DATE_ROW, SUMMARY_LABEL_COLUMN),
            SUMMARY_DATE_LABEL,
        )?;
        for week_row in behavior_rows() {
            let label = reference_formula(
                &self.layout.template_sheet,
                CellAddress::new(week_row, TEMPLATE_LABEL_COLUMN),
            );
            repo.set_formula(
                summary,
                CellAddress::new(week_row - SUMMARY_BEHAVIOR_ROW_SHIFT, SUMMARY_LABEL_COLUMN),
                &label,
            )?;
        }
        debug!(
            "event=summary_reset module=service status=ok sheet={summary} cleared={}",
            header_block
        );
        Ok(())
    }

    fn create_week_sheets<R: WorkbookRepository>(
        &self,
        repo: &R,
        plan: &SetupPlan,
        positions: &Positions,
    ) -> Result<Vec<String>, SetupError> {
        let mut created = Vec::with_capacity(plan.week_count as usize);
        for index in 0..plan.week_count {
            let number = plan
                .first_week
                .checked_add(index)
                .ok_or(SetupError::CalendarOverflow)?;
            let monday =
                nth_monday(plan.first_monday, index).ok_or(SetupError::CalendarOverflow)?;
            let labels = week_date_labels(monday).ok_or(SetupError::CalendarOverflow)?;

            let name = week_sheet_name(number);
            repo.duplicate_sheet(&self.layout.template_sheet, &name)?;
            for (cell, label) in positions.date_cells.iter().zip(labels.iter()) {
                repo.set_value(&name, *cell, label)?;
            }
            debug!(
                "event=week_sheet_create module=service status=ok sheet={name} monday={}",
                labels[0]
            );
            created.push(name);
        }
        Ok(created)
    }

    fn write_tallies<R: WorkbookRepository>(
        &self,
        repo: &R,
        sheets: &[String],
        positions: &Positions,
    ) -> Result<(), SetupError> {
        let summary = self.layout.summary_sheet.as_str();
        for (offset, week_row) in behavior_rows().enumerate() {
            let summary_row = TALLY_FIRST_ROW + offset as u32;
            for (color, column) in TALLY_COLUMNS {
                let formula =
                    emoji_tally_formula(sheets, week_row, &positions.tally_columns, color);
                repo.set_formula(summary, CellAddress::new(summary_row, column), &formula)?;
            }
        }
        debug!(
            "event=emoji_tally_write module=service status=ok sheets={} columns={}",
            sheets.len(),
            describe_columns(&positions.tally_columns)
        );
        Ok(())
    }
}

/// Week sheet rows 9..=15.
pub fn behavior_rows() -> impl Iterator<Item = u32> {
    FIRST_BEHAVIOR_ROW..FIRST_BEHAVIOR_ROW + BEHAVIOR_ROW_COUNT
}

fn scan_existing_weeks<R: WorkbookRepository>(repo: &R) -> Result<Vec<ExistingWeek>, RepoError> {
    Ok(repo
        .sheet_names()?
        .into_iter()
        .filter(|name| is_week_sheet_name(name))
        .map(|name| ExistingWeek {
            number: parse_week_sheet_number(&name),
            name,
        })
        .collect())
}

/// Week sheets currently in the workbook, ordered by week number.
pub fn ordered_week_sheets<R: WorkbookRepository>(repo: &R) -> Result<Vec<String>, RepoError> {
    let mut weeks = scan_existing_weeks(repo)?;
    weeks.sort_by(|a, b| a.number.cmp(&b.number).then_with(|| a.name.cmp(&b.name)));
    Ok(weeks.into_iter().map(|week| week.name).collect())
}

/// One past the last non-blank summary date-row cell at or right of `B`.
pub fn next_summary_column<R: WorkbookRepository>(
    repo: &R,
    summary: &str,
) -> Result<u32, RepoError> {
    let last_used = repo
        .row_contents(summary, SUMMARY_DATE_ROW)?
        .into_iter()
        .filter(|(col, content)| *col >= SUMMARY_FIRST_COLUMN && !content.is_blank())
        .map(|(col, _)| col)
        .max();
    Ok(last_used.map_or(SUMMARY_FIRST_COLUMN, |col| col + 1))
}

fn collect_plan<P: Prompter, N: Notifier>(
    existing: &[ExistingWeek],
    append_column: u32,
    prompter: &mut P,
    notifier: &mut N,
) -> Result<SetupPlan, AbortReason> {
    let (mode, first_week) = if existing.is_empty() {
        (SummaryMode::Reset { delete: Vec::new() }, 1)
    } else {
        match ask_existing_choice(prompter, notifier)? {
            ExistingWeeksChoice::Delete => (
                SummaryMode::Reset {
                    delete: existing.iter().map(|week| week.name.clone()).collect(),
                },
                1,
            ),
            ExistingWeeksChoice::Continue => {
                let highest = existing.iter().filter_map(|week| week.number).max();
                let first_week = highest.unwrap_or(0).checked_add(1).ok_or_else(|| {
                    warn!("event=weekly_setup module=service status=week_number_overflow");
                    notifier.alert(ALERT_INVALID_WEEKS);
                    AbortReason::InvalidWeekCount(format!("{}", u32::MAX))
                })?;
                (
                    SummaryMode::Append {
                        next_column: append_column,
                    },
                    first_week,
                )
            }
        }
    };

    let first_column = match &mode {
        SummaryMode::Reset { .. } => SUMMARY_FIRST_COLUMN,
        SummaryMode::Append { next_column } => *next_column,
    };
    let first_monday = ask_start_date(prompter, notifier)?;
    let week_count = ask_week_count(prompter, notifier, first_week, first_monday, first_column)?;

    Ok(SetupPlan {
        mode,
        first_week,
        first_monday,
        week_count,
    })
}

fn ask_existing_choice<P: Prompter, N: Notifier>(
    prompter: &mut P,
    notifier: &mut N,
) -> Result<ExistingWeeksChoice, AbortReason> {
    let PromptResponse::Ok(text) = prompter.prompt(CHOICE_TITLE, CHOICE_MESSAGE) else {
        return Err(AbortReason::Cancelled);
    };
    if let Some(choice) = ExistingWeeksChoice::parse(&text) {
        return Ok(choice);
    }
    notifier.alert(ALERT_SETUP_CANCELLED);
    if text.trim().eq_ignore_ascii_case("CANCEL") {
        Err(AbortReason::Cancelled)
    } else {
        Err(AbortReason::UnrecognizedChoice(text.trim().to_string()))
    }
}

fn ask_start_date<P: Prompter, N: Notifier>(
    prompter: &mut P,
    notifier: &mut N,
) -> Result<NaiveDate, AbortReason> {
    let PromptResponse::Ok(text) = prompter.prompt(START_DATE_TITLE, START_DATE_MESSAGE) else {
        return Err(AbortReason::Cancelled);
    };
    match parse_start_date(&text) {
        Some(date) => Ok(align_to_monday(date)),
        None => {
            notifier.alert(ALERT_INVALID_DATE);
            Err(AbortReason::InvalidDate(text.trim().to_string()))
        }
    }
}

fn ask_week_count<P: Prompter, N: Notifier>(
    prompter: &mut P,
    notifier: &mut N,
    first_week: u32,
    first_monday: NaiveDate,
    first_column: u32,
) -> Result<u32, AbortReason> {
    let PromptResponse::Ok(text) = prompter.prompt(WEEK_COUNT_TITLE, WEEK_COUNT_MESSAGE) else {
        return Err(AbortReason::Cancelled);
    };
    let count = parse_week_count(&text).filter(|count| {
        let last = count - 1;
        let last_column = count
            .checked_mul(WEEKDAYS_PER_WEEK as u32)
            .and_then(|width| (first_column - 1).checked_add(width));
        first_week.checked_add(last).is_some()
            && last_column.is_some_and(|col| col <= MAX_COLUMN)
            && nth_monday(first_monday, last)
                .and_then(week_date_labels)
                .is_some()
    });
    count.ok_or_else(|| {
        notifier.alert(ALERT_INVALID_WEEKS);
        AbortReason::InvalidWeekCount(text.trim().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::{next_summary_column, ExistingWeeksChoice};
    use crate::model::workbook::CellAddress;
    use crate::repo::memory_repo::MemoryWorkbook;
    use crate::repo::workbook_repo::WorkbookRepository;

    #[test]
    fn choice_parsing_ignores_case_and_whitespace() {
        assert_eq!(
            ExistingWeeksChoice::parse("  delete "),
            Some(ExistingWeeksChoice::Delete)
        );
        assert_eq!(
            ExistingWeeksChoice::parse("Continue"),
            Some(ExistingWeeksChoice::Continue)
        );
        assert_eq!(ExistingWeeksChoice::parse("CANCEL"), None);
        assert_eq!(ExistingWeeksChoice::parse("keep"), None);
    }

    #[test]
    fn next_column_skips_column_a_and_blank_values() {
        let book = MemoryWorkbook::new();
        book.create_sheet("Summary").unwrap();
        assert_eq!(next_summary_column(&book, "Summary").unwrap(), 2);

        book.set_value("Summary", CellAddress::new(2, 1), "Date").unwrap();
        assert_eq!(next_summary_column(&book, "Summary").unwrap(), 2);

        book.set_formula("Summary", CellAddress::new(2, 6), "='Week 1'!K2")
            .unwrap();
        assert_eq!(next_summary_column(&book, "Summary").unwrap(), 7);
    }
}
