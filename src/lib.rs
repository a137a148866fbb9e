//! Operator desk for payroll runs: review computed results, approve or reject
//! each line, archive the run into history, and browse past runs.
//!
//! Calculation happens behind [`backend::PayrollBackend`]; this crate owns the
//! review workflow and its client-side state.

pub mod backend;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod server;
pub mod workflow;

pub use backend::{HttpBackend, Ledger, PayrollBackend, ResultQuery};
pub use config::DeskConfig;
pub use error::{DeskError, DeskResult};
pub use workflow::Workbench;
