//! memcheck - static memory-access profile of user-defined functions
//!
//! Walks an IR module, keeps the functions whose debug metadata places them
//! under the user's source root, and counts the loads, stores and bytes each
//! one moves. Results are printed to stderr and written as CSV and JSON
//! reports.

pub mod accountant;
pub mod artifact;
pub mod cache;
pub mod call_counts;
pub mod cli;
pub mod config;
pub mod csv_output;
pub mod data_layout;
pub mod demangle;
pub mod diagnostics;
pub mod error;
pub mod ir;
pub mod json_output;
pub mod membership;
pub mod pass;
pub mod walker;

pub use error::{MemcheckError, Result};
