//! Cell kinds and their ordering densities.
//!
//! Densities are only compared against each other. Heavier kinds settle
//! below lighter ones; Air is the lightest occupied kind and rises.

use serde::{Deserialize, Serialize};

/// Every kind of cell the grid can hold.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug, Serialize, Deserialize)]
#[repr(u8)]
pub enum CellKind {
    #[default]
    Empty,
    Water,
    SandHeavy,
    SandMedium,
    SandLight,
    Air,
}

impl CellKind {
    /// All kinds, in tally order.
    pub const ALL: [CellKind; 6] = [
        CellKind::Empty,
        CellKind::Water,
        CellKind::SandHeavy,
        CellKind::SandMedium,
        CellKind::SandLight,
        CellKind::Air,
    ];

    /// Ordering density. Not a physical unit.
    #[inline]
    pub const fn density(self) -> u16 {
        match self {
            CellKind::Empty => 0,
            CellKind::Air => 1,
            CellKind::Water => 1000,
            CellKind::SandLight => 1900,
            CellKind::SandMedium => 2200,
            CellKind::SandHeavy => 2500,
        }
    }

    /// Index into per-kind tallies.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns true for any of the three sand variants.
    #[inline]
    pub const fn is_sand(self) -> bool {
        matches!(
            self,
            CellKind::SandHeavy | CellKind::SandMedium | CellKind::SandLight
        )
    }

    /// Returns true for cells that are occupied by something heavier than air.
    #[inline]
    pub const fn is_denser_than_air(self) -> bool {
        !matches!(self, CellKind::Empty | CellKind::Air)
    }

    /// Returns true if this cell is processed by a rule each tick.
    #[inline]
    pub const fn is_active(self) -> bool {
        !matches!(self, CellKind::Empty)
    }

    /// Single character used by text renderers.
    #[inline]
    pub const fn glyph(self) -> char {
        match self {
            CellKind::Empty => ' ',
            CellKind::Water => '~',
            CellKind::SandHeavy => '#',
            CellKind::SandMedium => '%',
            CellKind::SandLight => ':',
            CellKind::Air => 'o',
        }
    }

    /// Parse a glyph back into a kind. Unknown glyphs map to `None`.
    pub fn from_glyph(c: char) -> Option<Self> {
        match c {
            ' ' | '.' => Some(CellKind::Empty),
            '~' => Some(CellKind::Water),
            '#' => Some(CellKind::SandHeavy),
            '%' => Some(CellKind::SandMedium),
            ':' => Some(CellKind::SandLight),
            'o' => Some(CellKind::Air),
            _ => None,
        }
    }
}
