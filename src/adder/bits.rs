// src/adder/bits.rs

//! Combinational bit primitives used by the adder plan.
//!
//! Bits are stored LSB-first: index 0 is the least significant bit. For a
//! range `[hi:lo]`, "right" is the higher-index group and "left" the lower.

use std::fmt;

use crate::errors::{GrainflowError, Result};

/// A single binary digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bit {
    Zero,
    One,
}

impl Bit {
    pub fn xor(self, other: Bit) -> Bit {
        Bit::from(self != other)
    }

    pub fn and(self, other: Bit) -> Bit {
        Bit::from(self.is_set() && other.is_set())
    }

    pub fn or(self, other: Bit) -> Bit {
        Bit::from(self.is_set() || other.is_set())
    }

    pub fn is_set(self) -> bool {
        self == Bit::One
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Bit::Zero => 0,
            Bit::One => 1,
        }
    }
}

impl From<bool> for Bit {
    fn from(b: bool) -> Self {
        if b { Bit::One } else { Bit::Zero }
    }
}

impl TryFrom<u8> for Bit {
    type Error = GrainflowError;

    fn try_from(v: u8) -> Result<Self> {
        match v {
            0 => Ok(Bit::Zero),
            1 => Ok(Bit::One),
            other => Err(GrainflowError::ConfigError(format!(
                "expected bit 0 or 1, got {other}"
            ))),
        }
    }
}

impl fmt::Display for Bit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Generate/propagate pair for a bit or a contiguous bit range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gp {
    pub g: Bit,
    pub p: Bit,
}

/// Which half of a [`Gp`] pair to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpPart {
    G,
    P,
}

impl Gp {
    pub fn new(g: Bit, p: Bit) -> Self {
        Self { g, p }
    }

    pub fn part(self, which: GpPart) -> Bit {
        match which {
            GpPart::G => self.g,
            GpPart::P => self.p,
        }
    }
}

/// `right ∘ left = (G_R ∨ (P_R · G_L), P_R · P_L)`.
pub fn combine(right: Gp, left: Gp) -> Gp {
    Gp {
        g: right.g.or(right.p.and(left.g)),
        p: right.p.and(left.p),
    }
}

/// `C_i = G ∨ (P · C0)` for a prefix `[i-1:0]`.
pub fn carry_from_prefix(prefix: Gp, c0: Bit) -> Bit {
    prefix.g.or(prefix.p.and(c0))
}

/// Split the low four bits of `n` into an LSB-first nibble.
pub fn to_nibble(n: u8) -> [Bit; 4] {
    std::array::from_fn(|i| Bit::from((n >> i) & 1 == 1))
}

/// Reassemble an LSB-first bit slice into an integer.
pub fn from_bits(bits: &[Bit]) -> u32 {
    bits.iter()
        .enumerate()
        .fold(0, |acc, (i, b)| acc | (u32::from(b.as_u8()) << i))
}
