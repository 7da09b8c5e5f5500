// rusqlite-backed native backend.
//
// - params: conversion from middleware values to rusqlite values
// - query: result extraction
// - worker: dedicated thread owning each rusqlite::Connection
// - backend: NativeBackend / NativeConnection implementations

pub mod backend;
pub mod params;
pub mod query;
mod worker;

pub use backend::{RusqliteBackend, RusqliteConnection, SQLITE_PACKAGE};
pub use params::convert_params;
pub use query::build_result_set;

use thiserror::Error;

/// Reported when a command reaches a worker whose connection is already closed.
#[derive(Debug, Error)]
#[error("SQLite worker closed: {0}")]
pub struct WorkerClosed(pub &'static str);
