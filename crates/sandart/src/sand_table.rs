//! Per-cell friction and mass for sand, stored parallel to the grid.
//!
//! The table has the grid's dimensions and is indexed the same way.
//! Non-sand cells hold `SandProps::default()` (all zeros). Records travel
//! with their cell on every swap.

use crate::config::SandParams;
use rand::Rng;

/// Jittered per-grain scalars. Not SI units.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct SandProps {
    pub friction: f32,
    pub mass: f32,
}

impl SandProps {
    /// Draw a fresh grain uniformly from the configured ranges.
    pub fn random<R: Rng + ?Sized>(params: &SandParams, rng: &mut R) -> Self {
        Self {
            friction: sample(rng, params.friction_min, params.friction_max),
            mass: sample(rng, params.mass_min, params.mass_max),
        }
    }

    /// Probability threshold a random draw must exceed for the grain to slide.
    ///
    /// Friction alone; mass is per-grain jitter that does not gate sliding.
    #[inline]
    pub fn slide_resistance(&self) -> f32 {
        self.friction.clamp(0.0, 1.0)
    }
}

fn sample<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max > min {
        rng.gen_range(min..=max)
    } else {
        min
    }
}

/// Struct-of-arrays side table for sand records.
#[derive(Clone, PartialEq, Debug)]
pub struct SandTable {
    width: usize,
    friction: Vec<f32>,
    mass: Vec<f32>,
}

impl SandTable {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            friction: vec![0.0; width * height],
            mass: vec![0.0; width * height],
        }
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> SandProps {
        let idx = self.index(x, y);
        SandProps {
            friction: self.friction[idx],
            mass: self.mass[idx],
        }
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, props: SandProps) {
        let idx = self.index(x, y);
        self.friction[idx] = props.friction;
        self.mass[idx] = props.mass;
    }

    /// Drop the record at a cell that is no longer sand.
    #[inline]
    pub fn clear(&mut self, x: usize, y: usize) {
        self.set(x, y, SandProps::default());
    }

    /// Move both records with their cells.
    #[inline]
    pub fn swap(&mut self, x1: usize, y1: usize, x2: usize, y2: usize) {
        let a = self.index(x1, y1);
        let b = self.index(x2, y2);
        self.friction.swap(a, b);
        self.mass.swap(a, b);
    }

    /// Overwrite every record from a table of the same size without reallocating.
    pub fn copy_from(&mut self, other: &SandTable) {
        self.friction.copy_from_slice(&other.friction);
        self.mass.copy_from_slice(&other.mass);
    }

    pub fn reset(&mut self) {
        self.friction.fill(0.0);
        self.mass.fill(0.0);
    }
}
