// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`backend`] provides the `ExecutorBackend` trait and the
//!   `PipelineExecutor` the runtime uses in production. Tests replace it
//!   with a fake that completes tasks without touching the filesystem.
//! - [`command`] runs external tools (bundler, minifier, font converter)
//!   through the platform shell.

pub mod backend;
pub mod command;

pub use backend::{ExecutorBackend, PipelineExecutor};
pub use command::{quote_arg, render_command, run_shell};
