//! Sandart - Falling-Sand Engine
//!
//! Cellular automaton for a sand-art frame:
//! - Three sand densities with friction/mass jitter
//! - Water that sinks and levels out
//! - Air bubbles with per-tick cluster shape heuristics
//! - Gravity inversion between ticks
//!
//! This crate is renderer-agnostic - it handles simulation only.
//! Renderers read `Simulation::snapshot()` between ticks; the `sandart`
//! binary in `crates/runner` prints ASCII frames.

pub mod cell;
pub mod cluster;
pub mod config;
pub mod gravity;
pub mod grid;
pub mod rules;
pub mod sand_table;
pub mod scene;
pub mod simulation;

pub use cell::CellKind;
pub use cluster::{find_clusters, Cluster, ClusterMap};
pub use config::{BubbleParams, ConfigError, SandParams, SimConfig, WaterParams};
pub use gravity::Gravity;
pub use grid::{CellCounts, Grid};
pub use sand_table::{SandProps, SandTable};
pub use scene::{create_bubbles, create_layers, create_mixed, Scene};
pub use simulation::{Simulation, Snapshot, TickStats};
