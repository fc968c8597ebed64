// src/jobs/queue.rs

use std::collections::VecDeque;
use std::fmt;

use tracing::trace;

/// Identifier handed out by [`JobQueue::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Plain FIFO of jobs.
#[derive(Debug)]
pub struct JobQueue<J> {
    entries: VecDeque<(JobId, J)>,
    next_id: u64,
}

impl<J> Default for JobQueue<J> {
    fn default() -> Self {
        Self {
            entries: VecDeque::new(),
            next_id: 0,
        }
    }
}

impl<J: fmt::Debug> JobQueue<J> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, job: J) -> JobId {
        let id = JobId(self.next_id);
        self.next_id += 1;
        trace!(%id, ?job, "job queued");
        self.entries.push_back((id, job));
        id
    }

    /// Oldest queued job, if any.
    pub fn pull(&mut self) -> Option<J> {
        self.entries.pop_front().map(|(_, job)| job)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
