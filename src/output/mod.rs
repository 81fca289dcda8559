//! Output module for tables, files and run summaries
//!
//! This module handles:
//! - Writing and reading the 11-column listing table
//! - Atomic file writes shared by both stages
//! - Printing end-of-run summaries

mod files;
pub mod stats;
mod table;

pub use files::write_atomic;
pub use stats::{
    format_failure_classes, print_download_summary, print_export_summary, success_rate,
};
pub use table::{read_table, write_table, TableRow, COLUMNS};
