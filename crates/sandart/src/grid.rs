//! Grid - a fixed W x H field of cell kinds.
//!
//! Cells live in one flat row-major buffer. `y` grows downward, so with
//! normal gravity a falling cell moves toward larger `y`.

use crate::cell::CellKind;
use std::fmt;

/// Per-kind cell tally, indexed by [`CellKind::index`].
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct CellCounts {
    counts: [usize; CellKind::ALL.len()],
}

impl CellCounts {
    #[inline]
    pub fn get(&self, kind: CellKind) -> usize {
        self.counts[kind.index()]
    }

    #[inline]
    pub fn add(&mut self, kind: CellKind) {
        self.counts[kind.index()] += 1;
    }

    #[inline]
    pub fn remove(&mut self, kind: CellKind) {
        self.counts[kind.index()] = self.counts[kind.index()].saturating_sub(1);
    }

    /// Total number of non-empty cells.
    pub fn occupied(&self) -> usize {
        CellKind::ALL
            .iter()
            .filter(|k| k.is_active())
            .map(|k| self.get(*k))
            .sum()
    }

    /// Signed per-kind difference `self - baseline`, in [`CellKind::ALL`] order.
    pub fn drift_from(&self, baseline: &CellCounts) -> [i64; CellKind::ALL.len()] {
        let mut out = [0i64; CellKind::ALL.len()];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.counts[i] as i64 - baseline.counts[i] as i64;
        }
        out
    }
}

impl fmt::Display for CellCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, kind) in CellKind::ALL.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:?}={}", kind, self.get(*kind))?;
        }
        Ok(())
    }
}

/// A bounded rectangular field of cells.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<CellKind>,
}

impl Grid {
    /// Create a grid filled with `Empty`.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, CellKind::Empty)
    }

    /// Create a grid filled with one kind.
    pub fn filled(width: usize, height: usize, kind: CellKind) -> Self {
        Self {
            width,
            height,
            cells: vec![kind; width * height],
        }
    }

    /// Build a grid from text rows using [`CellKind::glyph`] characters.
    ///
    /// All rows must have the same length. Unknown glyphs become `Empty`.
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        let mut grid = Self::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().take(width).enumerate() {
                let kind = CellKind::from_glyph(c).unwrap_or(CellKind::Empty);
                grid.set(x, y, kind);
            }
        }
        grid
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major offset for in-range coordinates.
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    /// True if signed coordinates fall inside the grid.
    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Kind at signed coordinates, or `None` outside the grid.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<CellKind> {
        if self.in_bounds(x, y) {
            Some(self.cells[self.index(x as usize, y as usize)])
        } else {
            None
        }
    }

    /// Kind at in-range coordinates.
    #[inline]
    pub fn at(&self, x: usize, y: usize) -> CellKind {
        self.cells[self.index(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, kind: CellKind) {
        let idx = self.index(x, y);
        self.cells[idx] = kind;
    }

    /// Swap two in-range cells.
    #[inline]
    pub fn swap(&mut self, x1: usize, y1: usize, x2: usize, y2: usize) {
        let a = self.index(x1, y1);
        let b = self.index(x2, y2);
        self.cells.swap(a, b);
    }

    /// Overwrite every cell from a grid of the same size without reallocating.
    pub fn copy_from(&mut self, other: &Grid) {
        debug_assert_eq!(self.width, other.width);
        debug_assert_eq!(self.height, other.height);
        self.cells.copy_from_slice(&other.cells);
    }

    /// Set every cell to one kind.
    pub fn fill(&mut self, kind: CellKind) {
        self.cells.fill(kind);
    }

    /// Raw row-major cells.
    #[inline]
    pub fn cells(&self) -> &[CellKind] {
        &self.cells
    }

    /// Count the cells of each kind.
    pub fn counts(&self) -> CellCounts {
        let mut counts = CellCounts::default();
        for kind in &self.cells {
            counts.add(*kind);
        }
        counts
    }

    /// Render as text rows, one glyph per cell.
    pub fn to_rows(&self) -> Vec<String> {
        self.cells
            .chunks(self.width.max(1))
            .map(|row| row.iter().map(|k| k.glyph()).collect())
            .collect()
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.to_rows() {
            writeln!(f, "|{}|", row)?;
        }
        Ok(())
    }
}
