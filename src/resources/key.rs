// src/resources/key.rs

//! Semantic identity of a scratch row.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::{GrainflowError, Result};

/// Variable family a row stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKind {
    G,
    P,
    C,
    S,
}

impl VarKind {
    fn as_char(self) -> char {
        match self {
            VarKind::G => 'G',
            VarKind::P => 'P',
            VarKind::C => 'C',
            VarKind::S => 'S',
        }
    }
}

impl FromStr for VarKind {
    type Err = GrainflowError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "G" => Ok(VarKind::G),
            "P" => Ok(VarKind::P),
            "C" => Ok(VarKind::C),
            "S" => Ok(VarKind::S),
            other => Err(GrainflowError::UnknownEntity(format!(
                "variable kind '{other}' (expected G, P, C or S)"
            ))),
        }
    }
}

/// Inclusive bit-index range `[hi:lo]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    hi: u8,
    lo: u8,
}

impl Span {
    pub fn new(hi: u8, lo: u8) -> Result<Self> {
        if hi < lo {
            return Err(GrainflowError::InvalidTransition(format!(
                "span [{hi}:{lo}] has hi < lo"
            )));
        }
        Ok(Self { hi, lo })
    }

    pub fn single(i: u8) -> Self {
        Self { hi: i, lo: i }
    }

    pub fn hi(self) -> u8 {
        self.hi
    }

    pub fn lo(self) -> u8 {
        self.lo
    }

    pub fn is_single(self) -> bool {
        self.hi == self.lo
    }
}

/// Discrete site on a row that one grain occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Site {
    Var,
    IdxLo,
    IdxHi,
    Value,
}

/// `{kind, span}`: what a row means, independent of which physical row holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemKey {
    pub kind: VarKind,
    pub span: Span,
}

impl MemKey {
    pub fn new(kind: VarKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Convenience for range keys such as `G[2:0]`.
    pub fn range(kind: VarKind, hi: u8, lo: u8) -> Result<Self> {
        Ok(Self::new(kind, Span::new(hi, lo)?))
    }

    /// Sites a row must carry to materialise this key: variable marker, value
    /// bit, then one index marker for a single bit or two for a range.
    pub fn required_sites(&self) -> Vec<Site> {
        let mut sites = vec![Site::Var, Site::Value, Site::IdxLo];
        if !self.span.is_single() {
            sites.push(Site::IdxHi);
        }
        sites
    }

    pub fn required_grains(&self) -> usize {
        if self.span.is_single() { 3 } else { 4 }
    }
}

impl fmt::Display for MemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let k = self.kind.as_char();
        if self.span.is_single() {
            write!(f, "{k}{}", self.span.hi)
        } else {
            write!(f, "{k}[{}:{}]", self.span.hi, self.span.lo)
        }
    }
}

static SPAN_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([GPCS])\[(\d+):(\d+)\]$").expect("static regex"));
static INDEX_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([GPCS])(\d+)$").expect("static regex"));

impl FromStr for MemKey {
    type Err = GrainflowError;

    /// Parses `G[2:0]` or `C3`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let bad = || GrainflowError::UnknownEntity(format!("invalid key '{s}'"));
        let index = |m: &str| m.parse::<u8>().map_err(|_| bad());

        if let Some(caps) = SPAN_KEY.captures(s) {
            let kind = caps[1].parse()?;
            return MemKey::range(kind, index(&caps[2])?, index(&caps[3])?);
        }
        if let Some(caps) = INDEX_KEY.captures(s) {
            let kind = caps[1].parse()?;
            return Ok(MemKey::new(kind, Span::single(index(&caps[2])?)));
        }
        Err(bad())
    }
}
