// src/sim/virtual_worker.rs

//! Instantaneous worker: every queued job completes inside [`VirtualWorker::drain`].

use tracing::{debug, warn};

use crate::errors::Result;
use crate::jobs::{Job, JobId, JobQueue};
use crate::resources::RowState;
use crate::sim::SimState;

#[derive(Debug, Default)]
pub struct VirtualWorker {
    queue: JobQueue<Job>,
}

impl VirtualWorker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, job: Job) -> JobId {
        self.queue.push(job)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Run queued jobs until the queue is empty. Returns how many ran.
    pub fn drain(&mut self, st: &mut SimState) -> Result<usize> {
        let mut ran = 0;
        while let Some(job) = self.queue.pull() {
            debug!(?job, "virtual job");
            match job {
                Job::PlaceOnRow { row, count } => {
                    for _ in 0..count {
                        st.tracker.place_one(&mut st.table, &mut st.grains, row)?;
                    }
                    st.table.mark_ready(row)?;
                }
                Job::ClearRow { row } => {
                    while st
                        .tracker
                        .evict_one(&mut st.table, &mut st.grains, row)?
                        .is_some()
                    {}
                    // The last eviction already frees a Clearing row.
                    if st.table.row(row)?.state != RowState::Free {
                        if let Err(err) = st.table.free_if_empty(row) {
                            warn!(%row, error = %err, "row not freed after clear");
                        }
                    }
                }
            }
            ran += 1;
        }
        Ok(ran)
    }
}
