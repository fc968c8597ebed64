// src/resources/board.rs

//! Site coordinates for rows on the board.
//!
//! Ants need somewhere to carry grains to. Each key signature may have a
//! template giving the position of its variable, index and value sites; keys
//! without one get a grid line of their own below the templated rows.
//! Realizing a row binds it to those positions until the row is removed.

use std::collections::HashMap;

use tracing::debug;

use crate::errors::{GrainflowError, Result};
use crate::geometry::Vec2;
use crate::resources::key::{MemKey, Site, VarKind};
use crate::resources::table::RowId;

/// Coordinates of a row's sites. `idx_hi` is only present for range keys.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowTemplate {
    pub var: Vec2,
    pub idx_lo: Vec2,
    pub idx_hi: Option<Vec2>,
    pub value: Vec2,
}

/// A template bound to a concrete row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowSites {
    pub row: RowId,
    pub key: MemKey,
    pub cells: RowTemplate,
}

impl RowSites {
    pub fn position(&self, site: Site) -> Result<Vec2> {
        match site {
            Site::Var => Ok(self.cells.var),
            Site::IdxLo => Ok(self.cells.idx_lo),
            Site::Value => Ok(self.cells.value),
            Site::IdxHi => self.cells.idx_hi.ok_or_else(|| {
                GrainflowError::UnknownEntity(format!(
                    "site IdxHi on row {} ({} has a single index)",
                    self.row, self.key
                ))
            }),
        }
    }
}

/// Column/row layout for [`MemoryBoard::cla4_default`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardLayout {
    pub origin: Vec2,
    pub dx: f64,
    pub dy: f64,
}

impl Default for BoardLayout {
    fn default() -> Self {
        Self {
            origin: Vec2::new(2.0, 1.0),
            dx: 1.0,
            dy: 2.0,
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryBoard {
    layout: BoardLayout,
    /// Grid lines taken by templates; untemplated rows are placed after them.
    grid_lines: u32,
    templates: HashMap<MemKey, RowTemplate>,
    realized: HashMap<RowId, RowSites>,
}

impl MemoryBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout(layout: BoardLayout) -> Self {
        Self {
            layout,
            ..Self::default()
        }
    }

    pub fn layout(&self) -> BoardLayout {
        self.layout
    }

    /// Sites on grid line `line`: columns Var, IdxLo, IdxHi, Value.
    fn grid_template(&self, line: u32, key: &MemKey) -> RowTemplate {
        let BoardLayout { origin, dx, dy } = self.layout;
        let y = origin.y + f64::from(line) * dy;
        let col = |k: f64| Vec2::new(origin.x + k * dx, y);
        RowTemplate {
            var: col(0.0),
            idx_lo: col(1.0),
            idx_hi: (!key.span.is_single()).then(|| col(2.0)),
            value: col(3.0),
        }
    }

    /// Templates for the four prefix rows of the CLA-4 plan, laid out as
    /// columns Var, IdxLo, IdxHi, Value and rows `[1:0]`, `[3:2]`, `[2:0]`,
    /// `[3:0]`.
    pub fn cla4_default(layout: BoardLayout) -> Result<Self> {
        let mut board = Self::with_layout(layout);
        for (line, (hi, lo)) in [(1, 0), (3, 2), (2, 0), (3, 0)].into_iter().enumerate() {
            let key = MemKey::range(VarKind::G, hi, lo)?;
            let cells = board.grid_template(line as u32, &key);
            board.set_template(key, cells);
        }
        board.grid_lines = 4;
        Ok(board)
    }

    /// Register a template; single-bit keys drop any `idx_hi`.
    pub fn set_template(&mut self, key: MemKey, mut cells: RowTemplate) {
        if key.span.is_single() {
            cells.idx_hi = None;
        }
        self.templates.insert(key, cells);
    }

    /// Whether `key` has a registered template; other keys still realize
    /// onto their row's own grid line.
    pub fn has_template_for(&self, key: &MemKey) -> bool {
        self.templates.contains_key(key)
    }

    pub fn realize(&mut self, key: MemKey, row: RowId) -> Result<RowSites> {
        let cells = match self.templates.get(&key) {
            Some(cells) => *cells,
            None => self.grid_template(self.grid_lines + row.0, &key),
        };
        let sites = RowSites { row, key, cells };
        self.realized.insert(row, sites);
        debug!(%row, %key, "board row realized");
        Ok(sites)
    }

    pub fn sites(&self, row: RowId) -> Result<&RowSites> {
        self.realized
            .get(&row)
            .ok_or_else(|| GrainflowError::UnknownEntity(format!("board row {row}")))
    }

    pub fn remove(&mut self, row: RowId) -> Option<RowSites> {
        self.realized.remove(&row)
    }

    pub fn realized_rows(&self) -> usize {
        self.realized.len()
    }
}
