use mtss_core::db::{open_db, open_db_in_memory};
use mtss_core::{
    bootstrap_workbook, CellAddress, CellContent, CellRange, NamedRange, RecordingNotifier,
    RepoError, ScriptedPrompter, SetupOutcome, SqliteWorkbookRepository, WeeklySheetGenerator,
    WorkbookLayout, WorkbookRepository,
};

fn a1(cell: &str) -> CellAddress {
    CellAddress::parse(cell).unwrap()
}

fn range(a1: &str) -> CellRange {
    CellRange::parse(a1).unwrap()
}

#[test]
fn sheets_keep_tab_order_and_reject_duplicates() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteWorkbookRepository::new(&conn);

    repo.create_sheet("Week_Template").unwrap();
    repo.create_sheet("Summary").unwrap();
    repo.create_sheet("Week 1").unwrap();

    assert_eq!(
        repo.sheet_names().unwrap(),
        vec!["Week_Template", "Summary", "Week 1"]
    );
    assert!(repo.has_sheet("Summary").unwrap());
    assert!(!repo.has_sheet("summary").unwrap());
    assert!(matches!(
        repo.create_sheet("Summary").unwrap_err(),
        RepoError::SheetAlreadyExists(_)
    ));
}

#[test]
fn values_and_formulas_round_trip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteWorkbookRepository::new(&conn);
    repo.create_sheet("Summary").unwrap();

    repo.set_value("Summary", a1("A2"), "Date").unwrap();
    repo.set_formula("Summary", a1("C2"), "='Week 1'!E2").unwrap();
    repo.set_formula("Summary", a1("B2"), "='Week 1'!C2").unwrap();

    assert_eq!(
        repo.get_cell("Summary", a1("A2")).unwrap(),
        Some(CellContent::Value("Date".to_string()))
    );
    let row = repo.row_contents("Summary", 2).unwrap();
    let cols: Vec<u32> = row.iter().map(|(col, _)| *col).collect();
    assert_eq!(cols, vec![1, 2, 3]);
    assert_eq!(row[1].1, CellContent::Formula("='Week 1'!C2".to_string()));
    assert_eq!(repo.last_column("Summary").unwrap(), 3);

    repo.set_value("Summary", a1("C2"), "").unwrap();
    assert_eq!(repo.get_cell("Summary", a1("C2")).unwrap(), None);
    assert_eq!(repo.last_column("Summary").unwrap(), 2);
}

#[test]
fn clear_contents_keeps_notes_and_prunes_empty_cells() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteWorkbookRepository::new(&conn);
    repo.create_sheet("Summary").unwrap();

    repo.set_value("Summary", a1("B3"), "x").unwrap();
    repo.set_value("Summary", a1("C3"), "y").unwrap();
    repo.set_notes("Summary", &range("B3:B3"), &[vec!["keep me".to_string()]])
        .unwrap();

    repo.clear_contents("Summary", &range("A1:BD9")).unwrap();

    assert_eq!(repo.get_cell("Summary", a1("B3")).unwrap(), None);
    assert_eq!(repo.get_cell("Summary", a1("C3")).unwrap(), None);
    assert_eq!(
        repo.get_notes("Summary", &range("B3:C3")).unwrap(),
        vec![vec!["keep me".to_string(), String::new()]]
    );
    assert_eq!(repo.last_column("Summary").unwrap(), 0);

    let stored: i64 = conn
        .query_row("SELECT COUNT(*) FROM cells;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(stored, 1);
}

#[test]
fn clearing_a_cell_only_prunes_that_cell() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteWorkbookRepository::new(&conn);
    repo.create_sheet("Summary").unwrap();
    repo.set_value("Summary", a1("B2"), "x").unwrap();
    repo.set_value("Summary", a1("C2"), "y").unwrap();
    repo.set_notes("Summary", &range("C2:C2"), &[vec!["why".to_string()]])
        .unwrap();
    // A vacant row elsewhere on the sheet is outside the write and stays put.
    conn.execute(
        "INSERT INTO cells (sheet_id, row_index, col_index, kind, content, note)
         VALUES ((SELECT id FROM sheets WHERE name = 'Summary'), 99, 26, NULL, NULL, NULL);",
        [],
    )
    .unwrap();
    let stored = || -> i64 {
        conn.query_row("SELECT COUNT(*) FROM cells;", [], |row| row.get(0))
            .unwrap()
    };
    assert_eq!(stored(), 3);

    repo.set_value("Summary", a1("C2"), "").unwrap();
    assert_eq!(stored(), 3);
    assert_eq!(
        repo.get_notes("Summary", &range("C2:C2")).unwrap(),
        vec![vec!["why".to_string()]]
    );

    repo.set_value("Summary", a1("B2"), "").unwrap();
    assert_eq!(stored(), 2);

    repo.set_value("Summary", a1("D5"), "").unwrap();
    assert_eq!(stored(), 2);
}

#[test]
fn set_notes_rejects_wrong_shape_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteWorkbookRepository::new(&conn);
    repo.create_sheet("Week 1").unwrap();

    let err = repo
        .set_notes("Week 1", &range("O9:P10"), &[vec!["a".to_string(), "b".to_string()]])
        .unwrap_err();

    assert!(matches!(
        err,
        RepoError::ShapeMismatch {
            expected: (2, 2),
            actual: (1, 2),
            ..
        }
    ));
    assert_eq!(
        repo.get_notes("Week 1", &range("O9:P10")).unwrap(),
        vec![vec![String::new(); 2]; 2]
    );
}

#[test]
fn duplicate_copies_cells_and_notes_but_not_charts() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteWorkbookRepository::new(&conn);
    let layout = WorkbookLayout::default();
    bootstrap_workbook(&repo, &layout).unwrap();
    repo.set_notes("Week_Template", &range("O9:O9"), &[vec!["arrive".to_string()]])
        .unwrap();
    repo.insert_chart("Week_Template", &mtss_core::service::chart_service::trend_chart_spec(3))
        .unwrap();

    repo.duplicate_sheet("Week_Template", "Week 1").unwrap();

    assert_eq!(
        repo.get_cell("Week 1", a1("N9")).unwrap(),
        Some(CellContent::Value("Behavior 1".to_string()))
    );
    assert_eq!(
        repo.get_notes("Week 1", &range("O9:O9")).unwrap(),
        vec![vec!["arrive".to_string()]]
    );
    assert!(repo.charts("Week 1").unwrap().is_empty());
    assert!(matches!(
        repo.duplicate_sheet("Week_Template", "Week 1").unwrap_err(),
        RepoError::SheetAlreadyExists(_)
    ));
    assert!(matches!(
        repo.duplicate_sheet("Missing", "Week 2").unwrap_err(),
        RepoError::SheetNotFound(_)
    ));
}

#[test]
fn deleting_a_sheet_drops_its_named_ranges_and_charts() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteWorkbookRepository::new(&conn);
    repo.create_sheet("Week 1").unwrap();
    repo.define_named_range(&NamedRange::new("Notes_Week_1", "Week 1", range("O9:X15")))
        .unwrap();
    repo.insert_chart("Week 1", &mtss_core::service::chart_service::trend_chart_spec(5))
        .unwrap();

    repo.delete_sheet("Week 1").unwrap();

    assert!(matches!(
        repo.named_range("Notes_Week_1").unwrap_err(),
        RepoError::NamedRangeNotFound(_)
    ));
    let charts: i64 = conn
        .query_row("SELECT COUNT(*) FROM charts;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(charts, 0);
}

#[test]
fn named_ranges_can_be_redefined() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteWorkbookRepository::new(&conn);
    repo.create_sheet("Week 1").unwrap();
    repo.create_sheet("Week 2").unwrap();

    repo.define_named_range(&NamedRange::new("Notes_Week_1", "Week 1", range("O9:X15")))
        .unwrap();
    repo.define_named_range(&NamedRange::new("Notes_Week_1", "Week 2", range("A1:B2")))
        .unwrap();

    let named = repo.named_range("Notes_Week_1").unwrap();
    assert_eq!(named.sheet, "Week 2");
    assert_eq!(named.range, range("A1:B2"));
}

#[test]
fn chart_specs_survive_storage() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteWorkbookRepository::new(&conn);
    repo.create_sheet("Summary").unwrap();
    let spec = mtss_core::service::chart_service::trend_chart_spec(26);

    let id = repo.insert_chart("Summary", &spec).unwrap();

    let charts = repo.charts("Summary").unwrap();
    assert_eq!(charts.len(), 1);
    assert_eq!(charts[0].id, id);
    assert_eq!(charts[0].spec, spec);

    repo.remove_chart("Summary", id).unwrap();
    assert!(matches!(
        repo.remove_chart("Summary", id).unwrap_err(),
        RepoError::ChartNotFound(missing) if missing == id
    ));
}

#[test]
fn weekly_setup_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("classroom.sqlite3");
    let layout = WorkbookLayout::default();

    {
        let conn = open_db(&path).unwrap();
        let repo = SqliteWorkbookRepository::new(&conn);
        bootstrap_workbook(&repo, &layout).unwrap();
        let mut prompter = ScriptedPrompter::from_texts(["07/10/2024", "2"]);
        let mut notifier = RecordingNotifier::new();
        let outcome = WeeklySheetGenerator::new(&layout)
            .run(&repo, &mut prompter, &mut notifier)
            .unwrap();
        assert!(matches!(outcome, SetupOutcome::Completed(_)));
    }

    let conn = open_db(&path).unwrap();
    let repo = SqliteWorkbookRepository::new(&conn);
    assert_eq!(
        repo.sheet_names().unwrap(),
        vec!["Week_Template", "Summary", "Week 1", "Week 2"]
    );
    assert_eq!(
        repo.get_cell("Week 2", a1("K2")).unwrap(),
        Some(CellContent::Value("07/19/2024".to_string()))
    );
    assert_eq!(
        repo.get_cell("Summary", a1("K2")).unwrap(),
        Some(CellContent::Formula("='Week 2'!K2".to_string()))
    );

    let mut prompter = ScriptedPrompter::from_texts(["CONTINUE", "07/22/2024", "1"]);
    let mut notifier = RecordingNotifier::new();
    let outcome = WeeklySheetGenerator::new(&layout)
        .run(&repo, &mut prompter, &mut notifier)
        .unwrap();
    match outcome {
        SetupOutcome::Completed(report) => {
            assert_eq!(report.created_sheets, vec!["Week 3"]);
            assert_eq!(report.first_summary_column, 12);
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(
        repo.get_cell("Summary", a1("L2")).unwrap(),
        Some(CellContent::Formula("='Week 3'!C2".to_string()))
    );
}
