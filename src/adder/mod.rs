// src/adder/mod.rs

//! The carry-lookahead adder the simulation computes.

pub mod bits;
pub mod cla4;

pub use bits::{Bit, Gp, GpPart};
pub use cla4::{AddOutcome, Readout};
