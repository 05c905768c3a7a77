//! Roster: an employee records service over a document store.
//!
//! - [`model`] - Persisted and API representations of an employee
//! - [`service`] - Validated create/read/update/delete, listing, search and salary report
//! - [`http`] - The axum router and server
//! - [`config`] - CLI/environment configuration and backend selection
//! - [`seed`] - Sample data

pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod seed;
pub mod service;
pub mod telemetry;

pub use error::{EmployeeError, EmployeeResult};
pub use service::EmployeeService;
