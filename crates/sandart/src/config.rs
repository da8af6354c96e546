//! Simulation configuration.
//!
//! All tunables are supplied once at construction. `SimConfig::validate`
//! rejects anything the tick loop could trip over, so rules never check
//! parameter ranges themselves.

use crate::gravity::Gravity;
use serde::{Deserialize, Serialize};

/// Sand grain tunables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandParams {
    pub friction_min: f32,
    pub friction_max: f32,
    pub mass_min: f32,
    pub mass_max: f32,
    /// Columns scanned on each side when looking for a gap in a barrier.
    pub gap_radius: usize,
    /// Empty cells below the source row a gap needs to be fully open.
    pub gap_depth: usize,
    /// Cells scanned when estimating a column's stacked height.
    pub height_scan: usize,
    /// Slides are refused when the normalized left/right height difference reaches this.
    pub max_slope: f32,
    /// Resistance multiplier for the sand-on-sand dune slide.
    pub dune_friction_scale: f32,
}

impl Default for SandParams {
    fn default() -> Self {
        Self {
            friction_min: 0.3,
            friction_max: 0.5,
            mass_min: 1.0,
            mass_max: 1.5,
            gap_radius: 3,
            gap_depth: 3,
            height_scan: 10,
            max_slope: 0.7,
            dune_friction_scale: 0.5,
        }
    }
}

/// Air bubble tunables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BubbleParams {
    pub buoyancy_probability: f32,
    pub spread_probability: f32,
    pub cohesion_probability: f32,
    /// Height/width ratio above which a cluster counts as too tall.
    pub surface_tension: f32,
    pub cohesion_radius: usize,
    /// Chance a cohesion step is horizontal rather than vertical.
    pub horizontal_bias: f32,
    /// Distance used by the minimum-gap query.
    pub min_gap: f32,
    /// Skip cohesion for cells that already have a neighbor within `min_gap`.
    pub enforce_gap: bool,
}

impl Default for BubbleParams {
    fn default() -> Self {
        Self {
            buoyancy_probability: 0.2,
            spread_probability: 0.15,
            cohesion_probability: 0.08,
            surface_tension: 1.8,
            cohesion_radius: 3,
            horizontal_bias: 0.7,
            min_gap: 1.0,
            enforce_gap: false,
        }
    }
}

/// Water tunables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterParams {
    pub diagonal_probability: f32,
    pub spread_probability: f32,
}

impl Default for WaterParams {
    fn default() -> Self {
        Self {
            diagonal_probability: 0.3,
            spread_probability: 0.5,
        }
    }
}

/// Top-level simulation configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub width: usize,
    pub height: usize,
    /// Seed for the engine RNG. Equal seeds replay identically.
    pub seed: u64,
    pub gravity: Gravity,
    /// Compare per-kind counts after every tick and log drift.
    pub check_conservation: bool,
    pub sand: SandParams,
    pub bubble: BubbleParams,
    pub water: WaterParams,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 150,
            height: 100,
            seed: 0x5A4D_A27,
            gravity: Gravity::Down,
            check_conservation: true,
            sand: SandParams::default(),
            bubble: BubbleParams::default(),
            water: WaterParams::default(),
        }
    }
}

/// Reasons a configuration is rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    EmptyGrid { width: usize, height: usize },
    ZeroCellSize,
    ProbabilityOutOfRange { name: &'static str, value: f32 },
    InvertedRange { name: &'static str, min: f32, max: f32 },
    NotPositive { name: &'static str, value: f32 },
    ZeroDepth { name: &'static str },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::EmptyGrid { width, height } => {
                write!(f, "grid must be at least 1x1, got {}x{}", width, height)
            }
            ConfigError::ZeroCellSize => write!(f, "cell pixel size must be non-zero"),
            ConfigError::ProbabilityOutOfRange { name, value } => {
                write!(f, "{} must be within [0, 1], got {}", name, value)
            }
            ConfigError::InvertedRange { name, min, max } => {
                write!(f, "{} range is inverted: min {} > max {}", name, min, max)
            }
            ConfigError::NotPositive { name, value } => {
                write!(f, "{} must be positive, got {}", name, value)
            }
            ConfigError::ZeroDepth { name } => write!(f, "{} must be at least 1", name),
        }
    }
}

impl std::error::Error for ConfigError {}

impl SimConfig {
    /// Config for a grid of the given size with default tunables.
    pub fn with_size(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Derive grid dimensions from a canvas size and a cell pixel size.
    pub fn from_canvas(canvas_width: u32, canvas_height: u32, cell_px: u32) -> Result<Self, ConfigError> {
        if cell_px == 0 {
            return Err(ConfigError::ZeroCellSize);
        }
        let config = Self::with_size((canvas_width / cell_px) as usize, (canvas_height / cell_px) as usize);
        config.validate()?;
        Ok(config)
    }

    /// Check every tunable the tick loop relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }

        let s = &self.sand;
        check_range("sand.friction", s.friction_min, s.friction_max)?;
        check_range("sand.mass", s.mass_min, s.mass_max)?;
        check_probability("sand.friction_min", s.friction_min)?;
        check_probability("sand.friction_max", s.friction_max)?;
        check_positive("sand.mass_min", s.mass_min)?;
        check_positive("sand.max_slope", s.max_slope)?;
        check_probability("sand.dune_friction_scale", s.dune_friction_scale)?;
        check_depth("sand.height_scan", s.height_scan)?;
        check_depth("sand.gap_depth", s.gap_depth)?;

        let b = &self.bubble;
        check_probability("bubble.buoyancy_probability", b.buoyancy_probability)?;
        check_probability("bubble.spread_probability", b.spread_probability)?;
        check_probability("bubble.cohesion_probability", b.cohesion_probability)?;
        check_probability("bubble.horizontal_bias", b.horizontal_bias)?;
        check_positive("bubble.surface_tension", b.surface_tension)?;
        check_positive("bubble.min_gap", b.min_gap)?;

        let w = &self.water;
        check_probability("water.diagonal_probability", w.diagonal_probability)?;
        check_probability("water.spread_probability", w.spread_probability)?;

        Ok(())
    }

    /// Save configuration to JSON file
    pub fn save_json(&self, path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load and validate configuration from JSON file
    pub fn load_json(path: &std::path::Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = std::fs::read_to_string(path)?;
        let config: SimConfig = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}

fn check_probability(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ProbabilityOutOfRange { name, value })
    }
}

fn check_range(name: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    if min <= max {
        Ok(())
    } else {
        Err(ConfigError::InvertedRange { name, min, max })
    }
}

fn check_positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { name, value })
    }
}

fn check_depth(name: &'static str, value: usize) -> Result<(), ConfigError> {
    if value > 0 {
        Ok(())
    } else {
        Err(ConfigError::ZeroDepth { name })
    }
}
