//! Workbook use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into user-level workflows.
//! - Keep prompting and notification behind traits so workflows stay
//!   testable without a terminal.

pub mod bootstrap_service;
pub mod chart_service;
pub mod note_service;
pub mod prompt;
pub mod tally_service;
pub mod week_service;
