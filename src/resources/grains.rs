// src/resources/grains.rs

//! Authoritative store for grains.
//!
//! A grain is minted out of the repository (`Repo -> Loose`), moves between
//! `Loose` and `InSlot`, and is retired when it goes back to the repository.
//! Handles are generational: a recycled index always carries a new
//! generation, so a retired [`GrainId`] never resolves again.

use std::fmt;

use tracing::debug;

use crate::errors::{check, GrainflowError, Result};
use crate::geometry::Vec2;
use crate::resources::key::Site;
use crate::resources::table::RowId;

/// Generational grain handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GrainId {
    index: u32,
    generation: u32,
}

impl GrainId {
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for GrainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g-{}v{}", self.index, self.generation)
    }
}

/// Where an InSlot grain sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub row: RowId,
    pub site: Option<Site>,
}

impl Slot {
    pub fn row(row: RowId) -> Self {
        Self { row, site: None }
    }

    pub fn at(row: RowId, site: Site) -> Self {
        Self {
            row,
            site: Some(site),
        }
    }
}

/// Lifecycle placement of a live grain; `Repo` grains are not materialised.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    Loose(Vec2),
    InSlot(Slot),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrainState {
    Repo,
    Loose,
    InSlot,
}

/// Snapshot of a live grain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grain {
    pub id: GrainId,
    pub placement: Placement,
}

impl Grain {
    pub fn state(&self) -> GrainState {
        match self.placement {
            Placement::Loose(_) => GrainState::Loose,
            Placement::InSlot(_) => GrainState::InSlot,
        }
    }

    pub fn pos(&self) -> Option<Vec2> {
        match self.placement {
            Placement::Loose(p) => Some(p),
            Placement::InSlot(_) => None,
        }
    }

    pub fn slot(&self) -> Option<Slot> {
        match self.placement {
            Placement::InSlot(s) => Some(s),
            Placement::Loose(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GrainStats {
    pub repo: usize,
    pub loose: usize,
    pub in_slot: usize,
    pub total: usize,
}

#[derive(Debug)]
struct Entry {
    generation: u32,
    placement: Option<Placement>,
}

#[derive(Debug)]
pub struct GrainPool {
    capacity: usize,
    repo: usize,
    entries: Vec<Entry>,
    /// Indices of retired entries, reused with a bumped generation.
    vacant: Vec<u32>,
}

impl GrainPool {
    pub fn new(initial_repo: usize) -> Self {
        Self {
            capacity: initial_repo,
            repo: initial_repo,
            entries: Vec::new(),
            vacant: Vec::new(),
        }
    }

    /// Total number of grains this pool conserves.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn repo_count(&self) -> usize {
        self.repo
    }

    /// Mint a grain out of the repository as Loose at `pos`.
    pub fn borrow_to_loose(&mut self, pos: Vec2) -> Result<Grain> {
        if self.repo == 0 {
            return Err(GrainflowError::OutOfGrains(format!(
                "repository empty ({} grains all in use)",
                self.capacity
            )));
        }
        let placement = Placement::Loose(pos);

        let id = match self.vacant.pop() {
            Some(index) => {
                let entry = &mut self.entries[index as usize];
                entry.generation = entry.generation.checked_add(1).ok_or_else(|| {
                    GrainflowError::OutOfGrains(format!("grain index {index} generations exhausted"))
                })?;
                entry.placement = Some(placement);
                GrainId {
                    index,
                    generation: entry.generation,
                }
            }
            None => {
                let index = u32::try_from(self.entries.len()).map_err(|_| {
                    GrainflowError::OutOfGrains("grain index space exhausted".to_string())
                })?;
                self.entries.push(Entry {
                    generation: 0,
                    placement: Some(placement),
                });
                GrainId {
                    index,
                    generation: 0,
                }
            }
        };

        self.repo -= 1;
        debug!(grain = %id, %pos, repo = self.repo, "grain borrowed from repo");
        Ok(Grain { id, placement })
    }

    pub fn place_into_slot(&mut self, id: GrainId, slot: Slot) -> Result<()> {
        let placement = self.placement_mut(id)?;
        check(matches!(placement, Placement::Loose(_)), || {
            GrainflowError::InvalidGrainState(format!(
                "place_into_slot requires Loose; grain {id} is InSlot"
            ))
        })?;
        *placement = Placement::InSlot(slot);
        debug!(grain = %id, row = %slot.row, site = ?slot.site, "grain placed into slot");
        Ok(())
    }

    pub fn remove_from_slot_to_loose(&mut self, id: GrainId, pos: Vec2) -> Result<()> {
        let placement = self.placement_mut(id)?;
        check(matches!(placement, Placement::InSlot(_)), || {
            GrainflowError::InvalidGrainState(format!(
                "remove_from_slot_to_loose requires InSlot; grain {id} is Loose"
            ))
        })?;
        *placement = Placement::Loose(pos);
        debug!(grain = %id, %pos, "grain removed from slot");
        Ok(())
    }

    /// Move a Loose grain, e.g. while an ant carries it.
    pub fn move_loose(&mut self, id: GrainId, pos: Vec2) -> Result<()> {
        let placement = self.placement_mut(id)?;
        check(matches!(placement, Placement::Loose(_)), || {
            GrainflowError::InvalidGrainState(format!("move_loose requires Loose; grain {id} is InSlot"))
        })?;
        *placement = Placement::Loose(pos);
        Ok(())
    }

    /// Retire a Loose grain back into the repository.
    pub fn return_loose_to_repo(&mut self, id: GrainId) -> Result<()> {
        let placement = self.placement_mut(id)?;
        check(matches!(placement, Placement::Loose(_)), || {
            GrainflowError::InvalidGrainState(format!(
                "return_loose_to_repo requires Loose; grain {id} is InSlot"
            ))
        })?;
        let entry = &mut self.entries[id.index as usize];
        entry.placement = None;
        // An index whose generation cannot be bumped again is retired for good.
        if entry.generation < u32::MAX {
            self.vacant.push(id.index);
        }
        self.repo += 1;
        debug!(grain = %id, repo = self.repo, "grain returned to repo");
        Ok(())
    }

    pub fn grain(&self, id: GrainId) -> Result<Grain> {
        self.entries
            .get(id.index as usize)
            .filter(|e| e.generation == id.generation)
            .and_then(|e| e.placement)
            .map(|placement| Grain { id, placement })
            .ok_or_else(|| GrainflowError::UnknownEntity(format!("grain '{id}'")))
    }

    /// Live grains in scan order.
    pub fn grains(&self) -> impl Iterator<Item = Grain> + '_ {
        self.entries.iter().enumerate().filter_map(|(index, e)| {
            e.placement.map(|placement| Grain {
                id: GrainId {
                    index: index as u32,
                    generation: e.generation,
                },
                placement,
            })
        })
    }

    /// Nearest Loose grain within `radius` of `pos` (linear scan; first wins on ties).
    pub fn find_loose_near(&self, pos: Vec2, radius: f64) -> Option<Grain> {
        let r2 = radius * radius;
        let mut best: Option<(f64, Grain)> = None;
        for grain in self.grains() {
            let Some(p) = grain.pos() else { continue };
            let d2 = p.dist2(pos);
            if d2 <= r2 && best.is_none_or(|(best_d2, _)| d2 < best_d2) {
                best = Some((d2, grain));
            }
        }
        best.map(|(_, g)| g)
    }

    pub fn stats(&self) -> GrainStats {
        let (mut loose, mut in_slot) = (0, 0);
        for grain in self.grains() {
            match grain.state() {
                GrainState::Loose => loose += 1,
                GrainState::InSlot => in_slot += 1,
                GrainState::Repo => {}
            }
        }
        GrainStats {
            repo: self.repo,
            loose,
            in_slot,
            total: self.repo + loose + in_slot,
        }
    }

    fn placement_mut(&mut self, id: GrainId) -> Result<&mut Placement> {
        self.entries
            .get_mut(id.index as usize)
            .filter(|e| e.generation == id.generation)
            .and_then(|e| e.placement.as_mut())
            .ok_or_else(|| GrainflowError::UnknownEntity(format!("grain '{id}'")))
    }
}
