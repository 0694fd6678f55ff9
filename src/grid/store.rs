use std::collections::BTreeMap;

use crate::config::{MAX_ERASE_SIZE, MIN_ERASE_SIZE};
use crate::error::CanvasError;
use crate::grid::{Cell, CellKey};
use crate::session::clock::Timestamp;

/// Sparse square grid of painted cells
#[derive(Debug, Clone)]
pub struct GridStore {
    size: i64,
    cells: BTreeMap<CellKey, Cell>,
}

impl GridStore {
    pub fn new(size: i64) -> Self {
        Self {
            size,
            cells: BTreeMap::new(),
        }
    }

    pub fn size(&self) -> i64 {
        self.size
    }

    /// Change the bounds. Cells already outside the new bounds are kept.
    pub fn resize(&mut self, size: i64) {
        self.size = size;
    }

    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        (0..self.size).contains(&x) && (0..self.size).contains(&y)
    }

    /// Paint a cell, replacing whatever was there
    pub fn place(
        &mut self,
        x: i64,
        y: i64,
        color: &str,
        team: &str,
        now: Timestamp,
    ) -> Result<Cell, CanvasError> {
        if !self.in_bounds(x, y) {
            return Err(CanvasError::OutOfBounds { x, y });
        }

        let cell = Cell {
            color: color.to_string(),
            team: team.to_string(),
            updated_at: now,
        };
        self.cells.insert(CellKey::new(x, y), cell.clone());
        Ok(cell)
    }

    /// Erase a `size`x`size` square centered on `(cx, cy)`.
    ///
    /// Returns the keys of the cells that were actually removed, in row-major
    /// order. Empty or out-of-bounds coordinates are skipped.
    pub fn erase(&mut self, cx: i64, cy: i64, size: i64) -> Vec<CellKey> {
        let size = size.clamp(MIN_ERASE_SIZE, MAX_ERASE_SIZE);
        let xs = self.clip_span(cx, size);
        let ys = self.clip_span(cy, size);

        let mut erased = Vec::new();
        for x in xs {
            for y in ys.clone() {
                let key = CellKey::new(x, y);
                if self.cells.remove(&key).is_some() {
                    erased.push(key);
                }
            }
        }
        erased
    }

    /// The part of `[center - size/2, center - size/2 + size)` inside the grid
    fn clip_span(&self, center: i64, size: i64) -> std::ops::Range<i64> {
        let start = center.saturating_sub(size / 2);
        let end = start.saturating_add(size);
        start.max(0)..end.min(self.size)
    }

    pub fn reset(&mut self) {
        self.cells.clear();
    }

    pub fn get(&self, x: i64, y: i64) -> Option<&Cell> {
        self.cells.get(&CellKey::new(x, y))
    }

    pub fn cells(&self) -> &BTreeMap<CellKey, Cell> {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
