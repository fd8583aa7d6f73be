//! Note broadcast from one named range to many.
//!
//! # Responsibility
//! - Copy the source range's notes verbatim into every target range.
//!
//! # Invariants
//! - Every target's shape is checked before the first write; a mismatch
//!   leaves all targets untouched.
//! - Notes are never truncated or padded.

use crate::model::workbook::NamedRange;
use crate::repo::workbook_repo::{RepoError, WorkbookRepository};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Note replication failures.
#[derive(Debug)]
pub enum NoteReplicationError {
    /// A target range's dimensions differ from the source.
    ShapeMismatch {
        target: String,
        expected: (usize, usize),
        actual: (usize, usize),
    },
    Repo(RepoError),
}

impl Display for NoteReplicationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ShapeMismatch {
                target,
                expected,
                actual,
            } => write!(
                f,
                "named range `{target}` is {}x{}, expected {}x{}",
                actual.0, actual.1, expected.0, expected.1
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NoteReplicationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::ShapeMismatch { .. } => None,
        }
    }
}

impl From<RepoError> for NoteReplicationError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Outcome of one replication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationReport {
    pub source: String,
    pub targets_written: usize,
    /// Number of non-empty notes in the source range.
    pub notes_per_target: usize,
}

/// Copies notes from `source` to each of `targets`.
pub struct NoteReplicator<'a> {
    source: &'a str,
    targets: &'a [String],
}

impl<'a> NoteReplicator<'a> {
    pub fn new(source: &'a str, targets: &'a [String]) -> Self {
        Self { source, targets }
    }

    /// Reads the source notes once and writes them to every target.
    pub fn replicate<R: WorkbookRepository>(
        &self,
        repo: &R,
    ) -> Result<ReplicationReport, NoteReplicationError> {
        let source = repo.named_range(self.source)?;
        let notes = repo.get_notes(&source.sheet, &source.range)?;
        let expected = source.range.shape();

        let targets = self
            .targets
            .iter()
            .map(|name| repo.named_range(name))
            .collect::<Result<Vec<NamedRange>, RepoError>>()?;
        if let Some(bad) = targets.iter().find(|target| target.range.shape() != expected) {
            warn!(
                "event=note_replicate module=service status=error error_code=shape_mismatch target={}",
                bad.name
            );
            return Err(NoteReplicationError::ShapeMismatch {
                target: bad.name.clone(),
                expected,
                actual: bad.range.shape(),
            });
        }

        for target in &targets {
            repo.set_notes(&target.sheet, &target.range, &notes)?;
        }

        let notes_per_target = notes.iter().flatten().filter(|note| !note.is_empty()).count();
        info!(
            "event=note_replicate module=service status=ok source={} targets={} notes={}",
            self.source,
            targets.len(),
            notes_per_target
        );
        Ok(ReplicationReport {
            source: self.source.to_string(),
            targets_written: targets.len(),
            notes_per_target,
        })
    }
}
