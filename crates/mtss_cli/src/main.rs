//! `mtss` command line entry point.
//!
//! # Responsibility
//! - Open the workbook file and run one workflow per invocation.
//! - Stand in for modal dialogs with terminal prompts and messages.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::warn;
use mtss_core::db::open_db;
use mtss_core::{
    bind_note_ranges, bootstrap_workbook, default_log_level, init_logging, preview_tallies,
    ChartRenderer, NoteReplicator, Notifier, PromptResponse, Prompter, SetupOutcome,
    SqliteWorkbookRepository, WeeklySheetGenerator, WorkbookLayout, WorkbookRepository,
};
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

const DEFAULT_DB_FILE: &str = "mtss_workbook.sqlite3";
/// Typing this at a prompt acts like pressing Cancel.
const CANCEL_INPUT: &str = ":q";

#[derive(Parser)]
#[command(name = "mtss", version, about = "Maintain the MTSS behavior-tracking workbook.")]
struct Cli {
    /// Workbook file.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_DB_FILE)]
    db: PathBuf,

    /// JSON layout overriding sheet names, cells and note ranges.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Absolute directory for rolling log files. Logging is off when omitted.
    #[arg(long, value_name = "DIR")]
    log_dir: Option<String>,

    /// trace|debug|info|warn|error
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the template and summary sheets if missing.
    Init,
    /// Generate weekly sheets and extend the summary.
    SetupWeeks {
        /// Answer to the existing-sheets prompt (DELETE or CONTINUE).
        #[arg(long)]
        choice: Option<String>,
        /// Answer to the start date prompt.
        #[arg(long)]
        start_date: Option<String>,
        /// Answer to the week count prompt.
        #[arg(long)]
        weeks: Option<String>,
    },
    /// Replace the summary chart.
    InsertChart,
    /// Copy notes from the source named range to every target range.
    ReplicateNotes,
    /// List sheet names in tab order.
    Sheets,
    /// Print emoji tallies evaluated from stored week values.
    Tally,
}

fn main() {
    if let Err(err) = run(Cli::parse()) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Some(dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, dir).context("failed to initialize logging")?;
    }

    let layout = match cli.config.as_ref() {
        Some(path) => WorkbookLayout::load(path)
            .with_context(|| format!("failed to load layout {}", path.display()))?,
        None => WorkbookLayout::default(),
    };

    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open workbook {}", cli.db.display()))?;
    let repo = SqliteWorkbookRepository::new(&conn);

    match cli.command {
        Command::Init => {
            let report = bootstrap_workbook(&repo, &layout)?;
            if report.created_sheets.is_empty() {
                println!("Workbook already initialized.");
            } else {
                println!("Created sheets: {}", report.created_sheets.join(", "));
            }
            println!("Bound {} note ranges.", report.bound_note_ranges);
        }
        Command::SetupWeeks {
            choice,
            start_date,
            weeks,
        } => {
            let has_weeks = repo
                .sheet_names()?
                .iter()
                .any(|name| mtss_core::model::week::is_week_sheet_name(name));
            let mut scripted = VecDeque::new();
            if has_weeks {
                scripted.push_back(choice);
            }
            scripted.push_back(start_date);
            scripted.push_back(weeks);

            let mut prompter = TerminalPrompter::new(scripted);
            let mut notifier = TerminalNotifier;
            let generator = WeeklySheetGenerator::new(&layout);
            match generator.run(&repo, &mut prompter, &mut notifier)? {
                SetupOutcome::Completed(_) => {
                    bind_note_ranges(&repo, &layout)?;
                }
                SetupOutcome::Aborted(reason) => {
                    warn!("event=cli_setup module=cli status=aborted reason={reason}");
                }
            }
        }
        Command::InsertChart => {
            let id = ChartRenderer::new(&layout.summary_sheet).render(&repo)?;
            println!("Inserted chart {id} on {}.", layout.summary_sheet);
        }
        Command::ReplicateNotes => {
            let report =
                NoteReplicator::new(&layout.note_source, &layout.note_targets).replicate(&repo)?;
            println!(
                "Copied {} notes from {} into {} ranges.",
                report.notes_per_target, report.source, report.targets_written
            );
        }
        Command::Sheets => {
            for name in repo.sheet_names()? {
                println!("{name}");
            }
        }
        Command::Tally => {
            println!("row\tblue\torange\tred");
            for row in preview_tallies(&repo, &layout)? {
                println!("{}\t{}\t{}\t{}", row.week_row, row.blue, row.orange, row.red);
            }
        }
    }
    Ok(())
}

/// Prompts on stdin, consuming pre-supplied answers first.
struct TerminalPrompter {
    scripted: VecDeque<Option<String>>,
}

impl TerminalPrompter {
    fn new(scripted: VecDeque<Option<String>>) -> Self {
        Self { scripted }
    }
}

impl Prompter for TerminalPrompter {
    fn prompt(&mut self, title: &str, message: &str) -> PromptResponse {
        if let Some(Some(answer)) = self.scripted.pop_front() {
            return PromptResponse::Ok(answer);
        }

        println!("== {title} ==");
        println!("{message}");
        print!("> ");
        if let Err(err) = io::stdout().flush() {
            warn!("event=cli_prompt module=cli status=error error={err}");
        }

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) => PromptResponse::Cancel,
            Ok(_) if line.trim() == CANCEL_INPUT => PromptResponse::Cancel,
            Ok(_) => PromptResponse::Ok(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(err) => {
                warn!("event=cli_prompt module=cli status=error error={err}");
                PromptResponse::Cancel
            }
        }
    }
}

struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn alert(&mut self, message: &str) {
        eprintln!("{message}");
    }

    fn toast(&mut self, message: &str, title: &str, _timeout_secs: u32) {
        println!("{title}: {message}");
    }
}
