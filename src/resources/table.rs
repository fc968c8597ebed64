// src/resources/table.rs

//! Fixed-capacity table of scratch rows.
//!
//! Rows live in an arena indexed by [`RowId`]; a stack of free indices tracks
//! which rows can be handed out. A row moves through
//! `Free -> Reserved -> (Busy) -> Ready -> Clearing -> Free`, and the last step
//! is gated by the row's occupancy counter: a row cannot be reused while any
//! grain still sits on it.

use std::fmt;

use tracing::debug;

use crate::adder::bits::Bit;
use crate::errors::{check, GrainflowError, Result};
use crate::resources::key::MemKey;

/// Stable index of a row inside the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(pub u32);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row-{:03}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    Free,
    Reserved,
    Busy,
    Ready,
    Clearing,
}

/// One scratch row. Only [`ResourceTable`] mutates these.
#[derive(Debug, Clone, PartialEq)]
pub struct MemRow {
    pub id: RowId,
    /// Set on allocate; cleared when the row returns to Free.
    pub key: Option<MemKey>,
    /// Must be set before the row can become Ready.
    pub value: Option<Bit>,
    pub state: RowState,
    /// Grains currently sitting on this row.
    pub occupancy: u32,
}

/// Per-state row counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableStats {
    pub capacity: usize,
    pub free: usize,
    pub reserved: usize,
    pub busy: usize,
    pub ready: usize,
    pub clearing: usize,
}

#[derive(Debug)]
pub struct ResourceTable {
    rows: Vec<MemRow>,
    /// Free row indices; the next allocation pops from the end.
    free: Vec<RowId>,
}

impl ResourceTable {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(GrainflowError::OutOfCapacity(
                "resource table capacity must be > 0".to_string(),
            ));
        }
        let capacity = u32::try_from(capacity).map_err(|_| {
            GrainflowError::OutOfCapacity(format!("resource table capacity {capacity} too large"))
        })?;

        let rows = (0..capacity)
            .map(|i| MemRow {
                id: RowId(i),
                key: None,
                value: None,
                state: RowState::Free,
                occupancy: 0,
            })
            .collect();
        // Reversed so that row-000 is handed out first.
        let free = (0..capacity).rev().map(RowId).collect();

        Ok(Self { rows, free })
    }

    pub fn capacity(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, id: RowId) -> Result<&MemRow> {
        self.rows
            .get(id.0 as usize)
            .ok_or_else(|| GrainflowError::UnknownEntity(format!("memory row '{id}'")))
    }

    pub fn rows(&self) -> impl Iterator<Item = &MemRow> {
        self.rows.iter()
    }

    /// Take a Free row, bind it to `key` and move it to Reserved.
    pub fn allocate(&mut self, key: MemKey) -> Result<RowId> {
        let id = self.free.pop().ok_or_else(|| {
            GrainflowError::OutOfCapacity(format!(
                "all {} memory rows in use (allocating {key})",
                self.rows.len()
            ))
        })?;
        let row = self.row_mut(id)?;
        check(row.state == RowState::Free, || {
            GrainflowError::InvalidTransition(format!("row {id} on free-list but is {:?}", row.state))
        })?;
        row.key = Some(key);
        row.value = None;
        row.state = RowState::Reserved;
        row.occupancy = 0;
        debug!(row = %id, %key, "row allocated");
        Ok(id)
    }

    /// Set or overwrite the row's bit while it is being built.
    pub fn set_value(&mut self, id: RowId, value: Bit) -> Result<()> {
        let row = self.row_mut(id)?;
        check(matches!(row.state, RowState::Reserved | RowState::Busy), || {
            GrainflowError::InvalidTransition(format!(
                "set_value only in Reserved/Busy; row {id} is {:?}",
                row.state
            ))
        })?;
        row.value = Some(value);
        debug!(row = %id, %value, "row value set");
        Ok(())
    }

    pub fn mark_busy(&mut self, id: RowId) -> Result<()> {
        let row = self.row_mut(id)?;
        check(row.state == RowState::Reserved, || {
            GrainflowError::InvalidTransition(format!(
                "mark_busy requires Reserved; row {id} is {:?}",
                row.state
            ))
        })?;
        row.state = RowState::Busy;
        debug!(row = %id, "row busy");
        Ok(())
    }

    pub fn mark_ready(&mut self, id: RowId) -> Result<()> {
        let row = self.row_mut(id)?;
        check(matches!(row.state, RowState::Reserved | RowState::Busy), || {
            GrainflowError::InvalidTransition(format!(
                "mark_ready requires Reserved/Busy; row {id} is {:?}",
                row.state
            ))
        })?;
        check(row.value.is_some(), || {
            GrainflowError::InvalidTransition(format!("mark_ready requires a value on row {id}"))
        })?;
        row.state = RowState::Ready;
        debug!(row = %id, occupancy = row.occupancy, "row ready");
        Ok(())
    }

    /// Enter Clearing. Key and value are kept until the row is reclaimed.
    pub fn begin_clear(&mut self, id: RowId) -> Result<()> {
        let row = self.row_mut(id)?;
        check(
            matches!(row.state, RowState::Ready | RowState::Reserved | RowState::Busy),
            || {
                GrainflowError::InvalidTransition(format!(
                    "begin_clear requires Ready/Reserved/Busy; row {id} is {:?}",
                    row.state
                ))
            },
        )?;
        row.state = RowState::Clearing;
        debug!(row = %id, occupancy = row.occupancy, "row clearing");
        Ok(())
    }

    /// A grain landed on the row.
    pub fn inc_occupancy(&mut self, id: RowId) -> Result<()> {
        let row = self.row_mut(id)?;
        check(row.state != RowState::Free, || {
            GrainflowError::InvalidTransition(format!("inc_occupancy on Free row {id}"))
        })?;
        row.occupancy += 1;
        Ok(())
    }

    /// A grain left the row; frees it when this empties a Clearing row.
    pub fn dec_occupancy(&mut self, id: RowId) -> Result<()> {
        let row = self.row_mut(id)?;
        check(row.occupancy > 0, || {
            GrainflowError::InvalidTransition(format!("dec_occupancy underflow on row {id}"))
        })?;
        row.occupancy -= 1;
        if row.occupancy == 0 && row.state == RowState::Clearing {
            self.final_free(id)?;
        }
        Ok(())
    }

    /// Free a Clearing row that is already empty.
    pub fn free_if_empty(&mut self, id: RowId) -> Result<()> {
        let row = self.row(id)?;
        check(row.state == RowState::Clearing, || {
            GrainflowError::InvalidTransition(format!(
                "free_if_empty requires Clearing; row {id} is {:?}",
                row.state
            ))
        })?;
        check(row.occupancy == 0, || {
            GrainflowError::InvalidTransition(format!(
                "free_if_empty requires occupancy 0; row {id} has {}",
                row.occupancy
            ))
        })?;
        self.final_free(id)
    }

    pub fn stats(&self) -> TableStats {
        let mut stats = TableStats {
            capacity: self.rows.len(),
            ..TableStats::default()
        };
        for row in &self.rows {
            match row.state {
                RowState::Free => stats.free += 1,
                RowState::Reserved => stats.reserved += 1,
                RowState::Busy => stats.busy += 1,
                RowState::Ready => stats.ready += 1,
                RowState::Clearing => stats.clearing += 1,
            }
        }
        stats
    }

    fn row_mut(&mut self, id: RowId) -> Result<&mut MemRow> {
        self.rows
            .get_mut(id.0 as usize)
            .ok_or_else(|| GrainflowError::UnknownEntity(format!("memory row '{id}'")))
    }

    fn final_free(&mut self, id: RowId) -> Result<()> {
        let row = self.row_mut(id)?;
        row.key = None;
        row.value = None;
        row.state = RowState::Free;
        row.occupancy = 0;
        self.free.push(id);
        debug!(row = %id, "row freed");
        Ok(())
    }
}
