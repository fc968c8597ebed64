// src/resources/mod.rs

//! Resource layer: the things grains and ants act upon.
//!
//! - [`key`] defines what a row means (`MemKey`) and which sites it needs.
//! - [`table`] is the fixed-capacity row table and its state machine.
//! - [`grains`] is the conserved pool of grains.
//! - [`board`] maps rows to site coordinates for positional work.

pub mod board;
pub mod grains;
pub mod key;
pub mod table;

pub use board::{BoardLayout, MemoryBoard, RowSites, RowTemplate};
pub use grains::{Grain, GrainId, GrainPool, GrainState, GrainStats, Placement, Slot};
pub use key::{MemKey, Site, Span, VarKind};
pub use table::{MemRow, ResourceTable, RowId, RowState, TableStats};
