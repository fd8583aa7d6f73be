//! Workbook repository contracts and implementations.
//!
//! # Responsibility
//! - Define the narrow capability interface services mutate workbooks through.
//! - Provide an in-memory implementation for tests and dry runs.
//! - Provide a SQLite implementation for persistent workbook files.
//!
//! # Invariants
//! - Sheet names are unique within a workbook.
//! - Missing sheets and named ranges surface as semantic `NotFound` errors.

pub mod memory_repo;
pub mod sqlite_repo;
pub mod workbook_repo;
