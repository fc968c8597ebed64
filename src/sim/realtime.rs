// src/sim/realtime.rs

//! Time-stepped worker: a roster of ants walking grains between the
//! repository and row sites.
//!
//! Each [`RealtimeWorkerPool::tick`] first hands queued trips to idle ants,
//! then advances every busy ant by one step of its current job. Placement
//! and eviction go through the [`RowTracker`](crate::sim::RowTracker), so a
//! row's occupancy always matches the grains sitting on it.

use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, trace};

use crate::errors::{check, GrainflowError, Result};
use crate::geometry::Vec2;
use crate::jobs::{JobChain, JobId, JobQueue, PosJob};
use crate::resources::{GrainId, GrainState, RowId, RowState, Slot};
use crate::sim::movement::step_toward;
use crate::sim::SimState;

/// Starting definition of an ant, as found in the config file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AntSpec {
    pub id: String,
    #[serde(default)]
    pub pos: Vec2,
    pub speed: f64,
}

impl AntSpec {
    pub fn new(id: impl Into<String>, pos: Vec2, speed: f64) -> Self {
        Self {
            id: id.into(),
            pos,
            speed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ant {
    id: String,
    pos: Vec2,
    /// World units per second.
    speed: f64,
    carrying: Option<GrainId>,
    current: Option<PosJob>,
    trip: JobChain,
}

impl Ant {
    fn from_spec(spec: AntSpec) -> Self {
        Self {
            id: spec.id,
            pos: spec.pos,
            speed: spec.speed,
            carrying: None,
            current: None,
            trip: JobChain::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn carrying(&self) -> Option<GrainId> {
        self.carrying
    }

    pub fn current(&self) -> Option<&PosJob> {
        self.current.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.current.is_some()
    }

    fn require_empty_handed(&self, job: &str) -> Result<()> {
        match self.carrying {
            None => Ok(()),
            Some(g) => Err(GrainflowError::InvalidTransition(format!(
                "{job}: ant '{}' already carries {g}",
                self.id
            ))),
        }
    }

    fn take_carried(&mut self, job: &str) -> Result<GrainId> {
        self.carrying.take().ok_or_else(|| {
            GrainflowError::InvalidTransition(format!("{job}: ant '{}' carries nothing", self.id))
        })
    }
}

#[derive(Debug)]
pub struct RealtimeWorkerPool {
    ants: Vec<Ant>,
    queue: JobQueue<JobChain>,
    ticks: u64,
}

impl RealtimeWorkerPool {
    pub fn new(roster: impl IntoIterator<Item = AntSpec>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut ants = Vec::new();
        for spec in roster {
            check(spec.speed.is_finite() && spec.speed > 0.0, || {
                GrainflowError::ConfigError(format!(
                    "ant '{}' speed must be finite and > 0 (got {})",
                    spec.id, spec.speed
                ))
            })?;
            check(seen.insert(spec.id.clone()), || {
                GrainflowError::ConfigError(format!("duplicate ant id '{}'", spec.id))
            })?;
            ants.push(Ant::from_spec(spec));
        }
        check(!ants.is_empty(), || {
            GrainflowError::ConfigError("realtime worker needs at least one ant".to_string())
        })?;

        Ok(Self {
            ants,
            queue: JobQueue::new(),
            ticks: 0,
        })
    }

    /// Queue a trip; a lone [`PosJob`] becomes a one-step trip.
    pub fn enqueue(&mut self, chain: impl Into<JobChain>) -> JobId {
        self.queue.push(chain.into())
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn ants(&self) -> &[Ant] {
        &self.ants
    }

    /// Ticks executed since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && !self.ants.iter().any(Ant::is_busy)
    }

    pub fn tick(&mut self, st: &mut SimState, dt: Duration) -> Result<()> {
        self.ticks += 1;

        for ant in self.ants.iter_mut().filter(|a| !a.is_busy()) {
            let Some(chain) = self.queue.pull() else { break };
            ant.trip = chain;
            ant.current = ant.trip.next_step();
            trace!(ant = %ant.id, job = ?ant.current, "trip assigned");
        }

        let secs = dt.as_secs_f64();
        for i in 0..self.ants.len() {
            let Some(job) = self.ants[i].current else { continue };
            if let PosJob::PickLoose { grain } = job {
                claim_free(&self.ants, grain)?;
            }
            let ant = &mut self.ants[i];
            if advance(ant, job, st, secs)? {
                ant.current = ant.trip.next_step();
            }
        }
        Ok(())
    }

    /// Tick until nothing is queued or in flight.
    ///
    /// Returns the number of ticks spent; fails with `Timeout` once
    /// `max_ticks` ticks did not settle the pool.
    pub fn run_until_idle(&mut self, st: &mut SimState, dt: Duration, max_ticks: u64) -> Result<u64> {
        let mut spent = 0;
        while !self.is_idle() {
            if spent >= max_ticks {
                return Err(GrainflowError::Timeout {
                    what: "realtime pool to go idle".to_string(),
                    ticks: spent,
                });
            }
            self.tick(st, dt)?;
            spent += 1;
        }
        Ok(spent)
    }
}

/// One step of `job` for `ant`. Returns `true` once the job is complete.
fn advance(ant: &mut Ant, job: PosJob, st: &mut SimState, secs: f64) -> Result<bool> {
    match job {
        PosJob::FetchFromRepo { near } => {
            ant.require_empty_handed("FetchFromRepo")?;
            let grain = st.grains.borrow_to_loose(near)?;
            ant.carrying = Some(grain.id);
            debug!(ant = %ant.id, grain = %grain.id, "fetched from repo");
            Ok(true)
        }
        PosJob::PickLoose { grain } => {
            ant.require_empty_handed("PickLoose")?;
            let state = st.grains.grain(grain)?.state();
            check(state == GrainState::Loose, || {
                GrainflowError::InvalidGrainState(format!(
                    "PickLoose requires Loose; grain {grain} is {state:?}"
                ))
            })?;
            ant.carrying = Some(grain);
            debug!(ant = %ant.id, %grain, "picked loose grain");
            Ok(true)
        }
        PosJob::CarryTo { dest } => {
            ant.pos = step_toward(ant.pos, dest, ant.speed * secs);
            if let Some(grain) = ant.carrying {
                st.grains.move_loose(grain, ant.pos)?;
            }
            trace!(ant = %ant.id, pos = %ant.pos, %dest, "carry step");
            Ok(ant.pos == dest)
        }
        PosJob::PlaceInRow { row, site } => {
            let grain = ant.take_carried("PlaceInRow")?;
            st.grains.place_into_slot(grain, Slot::at(row, site))?;
            st.tracker.record_place(&mut st.table, row, grain)?;
            debug!(ant = %ant.id, %grain, %row, ?site, "placed in row");
            promote_if_complete(st, row)?;
            Ok(true)
        }
        PosJob::EvictFromRow { row, grain } => {
            ant.require_empty_handed("EvictFromRow")?;
            st.grains.remove_from_slot_to_loose(grain, ant.pos)?;
            st.tracker.record_evict(&mut st.table, row, grain)?;
            ant.carrying = Some(grain);
            debug!(ant = %ant.id, %grain, %row, "evicted from row");
            Ok(true)
        }
        PosJob::ReturnToRepo { grain } => {
            check(ant.carrying == Some(grain), || {
                GrainflowError::InvalidTransition(format!(
                    "ReturnToRepo: ant '{}' does not carry {grain} (carrying {:?})",
                    ant.id, ant.carrying
                ))
            })?;
            st.grains.return_loose_to_repo(grain)?;
            ant.carrying = None;
            debug!(ant = %ant.id, %grain, "returned to repo");
            Ok(true)
        }
    }
}

/// A Loose grain in some ant's hands cannot be picked up by another.
fn claim_free(ants: &[Ant], grain: GrainId) -> Result<()> {
    match ants.iter().find(|a| a.carrying == Some(grain)) {
        None => Ok(()),
        Some(holder) => Err(GrainflowError::InvalidTransition(format!(
            "PickLoose: grain {grain} is already carried by ant '{}'",
            holder.id
        ))),
    }
}

/// Mark a row Ready once its value is set and every required site is filled.
fn promote_if_complete(st: &mut SimState, row: RowId) -> Result<()> {
    let r = st.table.row(row)?;
    let Some(key) = r.key else { return Ok(()) };
    let filled = r.occupancy as usize >= key.required_grains();
    if r.value.is_some() && filled && matches!(r.state, RowState::Reserved | RowState::Busy) {
        st.table.mark_ready(row)?;
    }
    Ok(())
}
