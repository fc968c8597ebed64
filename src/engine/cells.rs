// src/engine/cells.rs

//! Symbolic cell store the actions read and write by name.

use std::collections::HashMap;
use std::fmt;

use tracing::trace;

use crate::adder::bits::{Bit, Gp};
use crate::errors::{GrainflowError, Result};
use crate::resources::RowId;

/// The value a cell holds once written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellValue {
    Bit(Bit),
    Pair(Gp),
    Row(RowId),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Bit(b) => write!(f, "{b}"),
            CellValue::Pair(gp) => write!(f, "(G={}, P={})", gp.g, gp.p),
            CellValue::Row(r) => write!(f, "{r}"),
        }
    }
}

#[derive(Debug, Default)]
pub struct CellStore {
    cells: HashMap<String, Option<CellValue>>,
}

impl CellStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cell. Re-declaring an existing cell leaves it untouched.
    pub fn declare(&mut self, id: impl Into<String>) {
        self.cells.entry(id.into()).or_insert(None);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.cells.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, id: &str) -> Result<CellValue> {
        let slot = self
            .cells
            .get(id)
            .ok_or_else(|| GrainflowError::UnknownEntity(format!("cell '{id}'")))?;
        slot.ok_or_else(|| GrainflowError::InvalidTransition(format!("cell '{id}' read before write")))
    }

    /// Overwrite a declared cell.
    pub fn write(&mut self, id: &str, value: CellValue) -> Result<()> {
        let slot = self
            .cells
            .get_mut(id)
            .ok_or_else(|| GrainflowError::UnknownEntity(format!("cell '{id}'")))?;
        *slot = Some(value);
        trace!(cell = id, %value, "cell written");
        Ok(())
    }

    pub fn read_bit(&self, id: &str) -> Result<Bit> {
        match self.get(id)? {
            CellValue::Bit(b) => Ok(b),
            other => Err(type_mismatch(id, "bit", other)),
        }
    }

    pub fn read_pair(&self, id: &str) -> Result<Gp> {
        match self.get(id)? {
            CellValue::Pair(gp) => Ok(gp),
            other => Err(type_mismatch(id, "(G,P) pair", other)),
        }
    }

    pub fn read_row(&self, id: &str) -> Result<RowId> {
        match self.get(id)? {
            CellValue::Row(r) => Ok(r),
            other => Err(type_mismatch(id, "row id", other)),
        }
    }
}

fn type_mismatch(id: &str, expected: &str, found: CellValue) -> GrainflowError {
    GrainflowError::InvalidTransition(format!("cell '{id}' holds {found}, expected a {expected}"))
}
