#![allow(dead_code)]

pub use grainflow_test_utils::builders;
pub use grainflow_test_utils::init_tracing;

use grainflow::adder::Bit;
use grainflow::config::ConfigFile;
use grainflow::engine::{ExecContext, Mode};
use grainflow::resources::{GrainPool, GrainStats};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn virtual_ctx(cfg: &ConfigFile) -> ExecContext {
    ExecContext::from_config(cfg, Mode::Virtual, Bit::Zero).expect("virtual context")
}

pub fn realtime_ctx(cfg: &ConfigFile) -> ExecContext {
    ExecContext::from_config(cfg, Mode::Realtime, Bit::Zero).expect("realtime context")
}

pub fn stats(repo: usize, loose: usize, in_slot: usize, total: usize) -> GrainStats {
    GrainStats {
        repo,
        loose,
        in_slot,
        total,
    }
}

/// `repo + loose + in_slot` must always equal the pool's capacity.
pub fn assert_conserved(pool: &GrainPool) {
    let s = pool.stats();
    assert_eq!(s.repo + s.loose + s.in_slot, s.total);
    assert_eq!(s.total, pool.capacity(), "grains leaked or minted: {s:?}");
}
