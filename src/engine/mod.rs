// src/engine/mod.rs

//! Execution engine for plans.
//!
//! - [`cells`] is the symbolic store actions read and write.
//! - [`actions`] defines the closed [`Op`] set and how each one runs.
//! - [`context`] bundles the resource layer, the active worker and the
//!   cell store for one run.

pub mod actions;
pub mod cells;
pub mod context;

pub use actions::{Action, Op};
pub use cells::{CellStore, CellValue};
pub use context::{AwaitConfig, ExecContext, Mode, Worker};
