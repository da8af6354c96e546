//! Per-cell update rules.
//!
//! Each rule looks at one cell and returns the destination it wants to
//! swap with, or `None` to stay put. Rules never mutate; the tick driver
//! applies the swap so grid, sand table and update flags move together.

pub mod bubble;
pub mod sand;
pub mod water;

use crate::cell::CellKind;
use crate::cluster::ClusterMap;
use crate::config::SimConfig;
use crate::grid::Grid;
use crate::gravity::Gravity;
use crate::sand_table::SandTable;
use rand::Rng;

/// Destination of a swap with the cell being updated.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Move {
    pub x: usize,
    pub y: usize,
}

impl Move {
    /// Build a move from signed coordinates already known to be in range.
    #[inline]
    pub(crate) fn to(x: i32, y: i32) -> Self {
        debug_assert!(x >= 0 && y >= 0);
        Self {
            x: x as usize,
            y: y as usize,
        }
    }
}

/// Everything a rule may read while deciding a move.
pub struct TickContext<'a> {
    /// Grid as committed at the start of the tick.
    pub prev: &'a Grid,
    /// Working buffer with this tick's moves applied so far.
    pub grid: &'a Grid,
    pub sand: &'a SandTable,
    /// Air clusters of `prev`.
    pub clusters: &'a ClusterMap,
    pub config: &'a SimConfig,
    pub gravity: Gravity,
}

impl TickContext<'_> {
    /// Kind in the working buffer at signed coordinates.
    #[inline]
    pub fn kind(&self, x: i32, y: i32) -> Option<CellKind> {
        self.grid.get(x, y)
    }

    #[inline]
    pub fn is_empty(&self, x: i32, y: i32) -> bool {
        self.grid.get(x, y) == Some(CellKind::Empty)
    }
}

#[inline]
pub(crate) fn chance<R: Rng + ?Sized>(rng: &mut R, probability: f32) -> bool {
    rng.gen_bool(f64::from(probability).clamp(0.0, 1.0))
}

/// -1 or +1 with equal odds.
#[inline]
pub(crate) fn random_side<R: Rng + ?Sized>(rng: &mut R) -> i32 {
    if rng.gen_bool(0.5) {
        -1
    } else {
        1
    }
}
