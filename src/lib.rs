//! Skycast Library
//!
//! Exposes the application state machine, the effect runner and the data
//! clients for use by the binary and by integration tests.

pub mod app;
pub mod cache;
pub mod cli;
pub mod data;
pub mod debounce;
pub mod logging;
pub mod runtime;
pub mod ui;
