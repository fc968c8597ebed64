// src/sim/tracker.rs

//! Which concrete grains currently belong to each row.

use std::collections::HashMap;

use tracing::debug;

use crate::errors::{GrainflowError, Result};
use crate::geometry::Vec2;
use crate::resources::{GrainId, GrainPool, ResourceTable, RowId, Slot};

/// Runtime bookkeeping shared by both workers.
///
/// Occupancy on the [`ResourceTable`] is only ever changed through this type
/// by the workers, so the tracked grain count and the row's occupancy move
/// together.
#[derive(Debug, Default)]
pub struct RowTracker {
    by_row: HashMap<RowId, Vec<GrainId>>,
}

impl RowTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow one grain and put it straight onto the row (no geometry).
    pub fn place_one(
        &mut self,
        table: &mut ResourceTable,
        grains: &mut GrainPool,
        row: RowId,
    ) -> Result<GrainId> {
        table.row(row)?;
        let grain = grains.borrow_to_loose(Vec2::ORIGIN)?;
        grains.place_into_slot(grain.id, Slot::row(row))?;
        self.record_place(table, row, grain.id)?;
        Ok(grain.id)
    }

    /// Take one grain off the row and retire it to the repository.
    ///
    /// Returns `None` when nothing is tracked on the row.
    pub fn evict_one(
        &mut self,
        table: &mut ResourceTable,
        grains: &mut GrainPool,
        row: RowId,
    ) -> Result<Option<GrainId>> {
        let Some(grain) = self.by_row.get(&row).and_then(|g| g.last().copied()) else {
            return Ok(None);
        };
        grains.remove_from_slot_to_loose(grain, Vec2::ORIGIN)?;
        grains.return_loose_to_repo(grain)?;
        self.record_evict(table, row, grain)?;
        Ok(Some(grain))
    }

    /// A grain already placed into the row's slot: count it.
    pub fn record_place(&mut self, table: &mut ResourceTable, row: RowId, grain: GrainId) -> Result<()> {
        table.inc_occupancy(row)?;
        self.by_row.entry(row).or_default().push(grain);
        debug!(%row, %grain, count = self.count(row), "grain recorded on row");
        Ok(())
    }

    /// A grain lifted off the row: stop tracking it and release occupancy.
    pub fn record_evict(&mut self, table: &mut ResourceTable, row: RowId, grain: GrainId) -> Result<()> {
        let tracked = self.by_row.get_mut(&row).ok_or_else(|| {
            GrainflowError::UnknownEntity(format!("no grains tracked on row {row}"))
        })?;
        let pos = tracked.iter().position(|g| *g == grain).ok_or_else(|| {
            GrainflowError::UnknownEntity(format!("grain {grain} not tracked on row {row}"))
        })?;
        tracked.swap_remove(pos);
        if tracked.is_empty() {
            self.by_row.remove(&row);
        }
        table.dec_occupancy(row)?;
        debug!(%row, %grain, count = self.count(row), "grain evicted from row");
        Ok(())
    }

    pub fn grains_on(&self, row: RowId) -> &[GrainId] {
        self.by_row.get(&row).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, row: RowId) -> usize {
        self.grains_on(row).len()
    }
}
