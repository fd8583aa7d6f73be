//! Domain model for the behavior-tracking workbook.
//!
//! # Responsibility
//! - Define workbook primitives (addresses, ranges, contents, charts).
//! - Hold the calendar rules for week sheets and the emoji tally identity.
//! - Build formula text referencing week sheets.
//!
//! # Invariants
//! - Model code is pure: no I/O and no workbook mutation.

pub mod formula;
pub mod tally;
pub mod week;
pub mod workbook;
