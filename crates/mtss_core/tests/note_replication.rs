use mtss_core::{
    bind_note_ranges, bootstrap_workbook, CellRange, MemoryWorkbook, NamedRange,
    NoteReplicationError, NoteReplicator, RecordingNotifier, RepoError, ScriptedPrompter,
    SetupOutcome, WeeklySheetGenerator, WorkbookLayout, WorkbookRepository,
};

fn range(a1: &str) -> CellRange {
    CellRange::parse(a1).unwrap()
}

fn notes_grid(rows: usize, cols: usize) -> Vec<Vec<String>> {
    (0..rows)
        .map(|r| {
            (0..cols)
                .map(|c| if (r + c) % 3 == 0 { format!("note {r}-{c}") } else { String::new() })
                .collect()
        })
        .collect()
}

fn book_with_ranges(target_ranges: &[(&str, &str)]) -> MemoryWorkbook {
    let book = MemoryWorkbook::new();
    book.create_sheet("Source").unwrap();
    book.define_named_range(&NamedRange::new("Src", "Source", range("O9:Q11")))
        .unwrap();
    book.set_notes("Source", &range("O9:Q11"), &notes_grid(3, 3))
        .unwrap();
    for (index, (name, a1)) in target_ranges.iter().enumerate() {
        let sheet = format!("Target {index}");
        book.create_sheet(&sheet).unwrap();
        book.define_named_range(&NamedRange::new(*name, sheet, range(a1)))
            .unwrap();
    }
    book
}

#[test]
fn notes_are_copied_verbatim_to_every_target() {
    let book = book_with_ranges(&[("T1", "O9:Q11"), ("T2", "A1:C3")]);
    let targets = vec!["T1".to_string(), "T2".to_string()];

    let report = NoteReplicator::new("Src", &targets).replicate(&book).unwrap();

    assert_eq!(report.targets_written, 2);
    assert_eq!(report.notes_per_target, 3);
    let source = book.get_notes("Source", &range("O9:Q11")).unwrap();
    assert_eq!(book.get_notes("Target 0", &range("O9:Q11")).unwrap(), source);
    assert_eq!(book.get_notes("Target 1", &range("A1:C3")).unwrap(), source);
}

#[test]
fn empty_source_notes_clear_target_notes() {
    let book = book_with_ranges(&[("T1", "O9:Q11")]);
    book.set_notes("Target 0", &range("O9:Q11"), &vec![vec!["stale".to_string(); 3]; 3])
        .unwrap();
    book.set_notes("Source", &range("O9:Q11"), &vec![vec![String::new(); 3]; 3])
        .unwrap();
    let targets = vec!["T1".to_string()];

    let report = NoteReplicator::new("Src", &targets).replicate(&book).unwrap();

    assert_eq!(report.notes_per_target, 0);
    assert_eq!(
        book.get_notes("Target 0", &range("O9:Q11")).unwrap(),
        vec![vec![String::new(); 3]; 3]
    );
}

#[test]
fn shape_mismatch_fails_before_any_write() {
    let book = book_with_ranges(&[("T1", "O9:Q11"), ("T2", "O9:P11")]);
    let targets = vec!["T1".to_string(), "T2".to_string()];

    let err = NoteReplicator::new("Src", &targets)
        .replicate(&book)
        .unwrap_err();

    match err {
        NoteReplicationError::ShapeMismatch {
            target,
            expected,
            actual,
        } => {
            assert_eq!(target, "T2");
            assert_eq!(expected, (3, 3));
            assert_eq!(actual, (3, 2));
        }
        other => panic!("unexpected error: {other}"),
    }
    // T1 precedes the bad target but must stay untouched.
    assert_eq!(
        book.get_notes("Target 0", &range("O9:Q11")).unwrap(),
        vec![vec![String::new(); 3]; 3]
    );
}

#[test]
fn missing_named_range_is_reported() {
    let book = book_with_ranges(&[("T1", "O9:Q11")]);
    let targets = vec!["T1".to_string(), "Notes_Week_9".to_string()];

    let err = NoteReplicator::new("Src", &targets)
        .replicate(&book)
        .unwrap_err();

    assert!(matches!(
        err,
        NoteReplicationError::Repo(RepoError::NamedRangeNotFound(ref name)) if name == "Notes_Week_9"
    ));
    assert_eq!(
        book.get_notes("Target 0", &range("O9:Q11")).unwrap(),
        vec![vec![String::new(); 3]; 3]
    );
}

#[test]
fn missing_source_is_reported() {
    let book = book_with_ranges(&[("T1", "O9:Q11")]);
    let targets = vec!["T1".to_string()];

    let err = NoteReplicator::new("Nope", &targets)
        .replicate(&book)
        .unwrap_err();

    assert!(matches!(
        err,
        NoteReplicationError::Repo(RepoError::NamedRangeNotFound(_))
    ));
}

#[test]
fn default_layout_broadcasts_template_notes_to_fifty_two_weeks() {
    let layout = WorkbookLayout::default();
    let book = MemoryWorkbook::new();
    bootstrap_workbook(&book, &layout).unwrap();

    let mut prompter = ScriptedPrompter::from_texts(["08/19/2024", "52"]);
    let mut notifier = RecordingNotifier::new();
    let outcome = WeeklySheetGenerator::new(&layout)
        .run(&book, &mut prompter, &mut notifier)
        .unwrap();
    assert!(matches!(outcome, SetupOutcome::Completed(_)));
    assert_eq!(bind_note_ranges(&book, &layout).unwrap(), 53);

    let block = range("O9:X15");
    let mut template_notes = vec![vec![String::new(); 10]; 7];
    template_notes[0][0] = "Greeted peers at the door".to_string();
    template_notes[6][9] = "Stayed on task during centers".to_string();
    book.set_notes("Week_Template", &block, &template_notes)
        .unwrap();

    let report = NoteReplicator::new(&layout.note_source, &layout.note_targets)
        .replicate(&book)
        .unwrap();

    assert_eq!(report.targets_written, 52);
    assert_eq!(report.notes_per_target, 2);
    assert_eq!(book.get_notes("Week 1", &block).unwrap(), template_notes);
    assert_eq!(book.get_notes("Week 52", &block).unwrap(), template_notes);
}
