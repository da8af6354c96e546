//! Gravity direction.

use serde::{Deserialize, Serialize};

/// Which way cells settle. `Down` moves toward larger `y`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum Gravity {
    #[default]
    Down,
    Up,
}

impl Gravity {
    /// Row offset of the settling direction: +1 for `Down`, -1 for `Up`.
    #[inline]
    pub const fn sign(self) -> i32 {
        match self {
            Gravity::Down => 1,
            Gravity::Up => -1,
        }
    }

    #[inline]
    pub const fn flipped(self) -> Self {
        match self {
            Gravity::Down => Gravity::Up,
            Gravity::Up => Gravity::Down,
        }
    }

    pub fn from_sign(sign: i32) -> Self {
        if sign < 0 {
            Gravity::Up
        } else {
            Gravity::Down
        }
    }
}
