//! Scene presets
//!
//! Seed a simulation with something worth watching:
//! - Banded sand layers over water with trapped bubbles
//! - Tall air columns that flatten into slicks
//! - Random noise of every kind

use crate::cell::CellKind;
use crate::simulation::Simulation;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fmt;
use std::str::FromStr;

/// Named preset, for picking a scene from the command line.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Scene {
    #[default]
    Layers,
    Bubbles,
    Mixed,
}

impl Scene {
    /// Clear `sim` and build this preset into it.
    pub fn build(self, sim: &mut Simulation, seed: u64) {
        match self {
            Scene::Layers => create_layers(sim),
            Scene::Bubbles => create_bubbles(sim),
            Scene::Mixed => create_mixed(sim, seed, 0.6),
        }
        log::info!("scene {}: {}", self, sim.counts());
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scene::Layers => "layers",
            Scene::Bubbles => "bubbles",
            Scene::Mixed => "mixed",
        };
        f.write_str(name)
    }
}

impl FromStr for Scene {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "layers" => Ok(Scene::Layers),
            "bubbles" => Ok(Scene::Bubbles),
            "mixed" => Ok(Scene::Mixed),
            other => Err(format!("unknown scene '{}' (expected layers, bubbles or mixed)", other)),
        }
    }
}

/// Classic sand-art frame, gravity down.
/// - Top half: alternating bands of light, medium and heavy sand
/// - Bottom half: water
/// - A row of small bubbles trapped at the sand/water boundary
pub fn create_layers(sim: &mut Simulation) {
    sim.clear();
    let width = sim.width();
    let height = sim.height();

    let sand_rows = height / 2;
    let band = (sand_rows / 6).max(1);
    let kinds = [CellKind::SandLight, CellKind::SandMedium, CellKind::SandHeavy];
    for (i, y) in (0..sand_rows).step_by(band).enumerate() {
        let rows = band.min(sand_rows - y);
        sim.fill_rect(0, y as i32, width, rows, kinds[i % kinds.len()]);
    }

    sim.fill_rect(0, sand_rows as i32, width, height - sand_rows, CellKind::Water);

    // Bubbles every few columns, two rows under the sand
    let bubble_y = (sand_rows + 2).min(height - 1) as i32;
    for x in (2..width).step_by(8) {
        sim.paint_circle(x as i32, bubble_y, 1, CellKind::Air);
    }
}

/// Water tank with tall air columns that exceed the surface-tension ratio.
pub fn create_bubbles(sim: &mut Simulation) {
    sim.clear();
    let width = sim.width();
    let height = sim.height();

    sim.fill_rect(0, 0, width, height, CellKind::Water);

    let column_height = (height / 3).max(1);
    let top = (height - column_height) as i32;
    for x in (width / 6..width).step_by((width / 3).max(1)) {
        sim.fill_rect(x as i32, top, 2, column_height, CellKind::Air);
    }

    // A sand lid along the top so grains meet the bubbles on their way down
    sim.fill_rect(0, 0, width, (height / 10).max(1), CellKind::SandMedium);
}

/// Random grid: each cell is occupied with probability `fill`, kind uniform.
pub fn create_mixed(sim: &mut Simulation, seed: u64, fill: f64) {
    sim.clear();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut cells = Vec::new();
    for y in 0..sim.height() as i32 {
        for x in 0..sim.width() as i32 {
            if rng.gen_bool(fill.clamp(0.0, 1.0)) {
                // Skip Empty at index 0
                let kind = CellKind::ALL[rng.gen_range(1..CellKind::ALL.len())];
                cells.push((x, y, kind));
            }
        }
    }
    sim.paint_cells(cells);
}
