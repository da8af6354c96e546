//! Air bubbles: rise through water, flatten tall clusters, drift together.
//!
//! Air never trades places with sand vertically, so sand resting on a
//! bubble is never pulled through it. Sideways moves may shoulder sand
//! aside.

use super::{chance, random_side, Move, TickContext};
use crate::cell::CellKind;
use crate::cluster::Cluster;
use crate::grid::Grid;
use rand::Rng;

/// Decide where the Air cell at `(x, y)` goes this tick.
pub fn step<R: Rng + ?Sized>(
    ctx: &TickContext,
    x: usize,
    y: usize,
    cluster: Option<&Cluster>,
    rng: &mut R,
) -> Option<Move> {
    let params = &ctx.config.bubble;
    let (xi, yi) = (x as i32, y as i32);
    let up = yi - ctx.gravity.sign();
    let can_rise = rises_through(ctx.kind(xi, up));

    // 1. Buoyancy
    if can_rise && chance(rng, params.buoyancy_probability) {
        return Some(Move::to(xi, up));
    }

    // 2. Tall clusters spread sideways, away from their middle.
    if let Some(cluster) = cluster {
        if cluster.should_split(params.surface_tension) && chance(rng, params.spread_probability) {
            let center = cluster.center().x;
            let dir = if (x as f32) < center {
                -1
            } else if (x as f32) > center {
                1
            } else {
                random_side(rng)
            };
            if enters_sideways(ctx.kind(xi + dir, yi)) {
                return Some(Move::to(xi + dir, yi));
            }
        }
    }

    // 3. Cohesion
    let crowded = params.enforce_gap && maintain_gap(ctx.grid, x, y, params.min_gap);
    if !crowded {
        if let Some(m) = attract(ctx, x, y, rng) {
            return Some(m);
        }
    }

    // 4. Natural rise
    if can_rise {
        return Some(Move::to(xi, up));
    }

    None
}

/// Vertical bubble moves only pass through water or into empty space.
#[inline]
fn rises_through(kind: Option<CellKind>) -> bool {
    kind == Some(CellKind::Water)
}

#[inline]
fn enters_vertically(kind: Option<CellKind>) -> bool {
    matches!(kind, Some(CellKind::Empty) | Some(CellKind::Water))
}

/// Sideways moves shoulder aside anything heavier than air.
#[inline]
fn enters_sideways(kind: Option<CellKind>) -> bool {
    matches!(kind, Some(k) if k == CellKind::Empty || k.is_denser_than_air())
}

/// Step one cell toward the nearest Air cell that is not already touching us.
///
/// Horizontal steps are favored by `horizontal_bias` so bubbles gather
/// into flat slicks rather than vertical chains.
fn attract<R: Rng + ?Sized>(ctx: &TickContext, x: usize, y: usize, rng: &mut R) -> Option<Move> {
    let params = &ctx.config.bubble;
    let (tx, ty) = nearest_air(ctx.grid, x, y, params.cohesion_radius)?;
    if !chance(rng, params.cohesion_probability) {
        return None;
    }

    let dx = (tx as i32 - x as i32).signum();
    let dy = (ty as i32 - y as i32).signum();
    let horizontal = chance(rng, params.horizontal_bias);
    let (sx, sy) = if dy == 0 || (horizontal && dx != 0) {
        (dx, 0)
    } else {
        (0, dy)
    };

    let (nx, ny) = (x as i32 + sx, y as i32 + sy);
    let target = ctx.kind(nx, ny);
    let allowed = if sy == 0 {
        enters_sideways(target)
    } else {
        enters_vertically(target)
    };
    allowed.then(|| Move::to(nx, ny))
}

/// Closest Air cell within `radius` that lies beyond the 3x3 neighborhood.
///
/// Ties go to the first cell in row-major order.
pub fn nearest_air(grid: &Grid, x: usize, y: usize, radius: usize) -> Option<(usize, usize)> {
    let r = radius as i32;
    let (xi, yi) = (x as i32, y as i32);
    let mut best: Option<(i32, (usize, usize))> = None;

    for dy in -r..=r {
        for dx in -r..=r {
            if dx.abs() <= 1 && dy.abs() <= 1 {
                continue;
            }
            if grid.get(xi + dx, yi + dy) != Some(CellKind::Air) {
                continue;
            }
            let dist2 = dx * dx + dy * dy;
            if best.map_or(true, |(d, _)| dist2 < d) {
                best = Some((dist2, ((xi + dx) as usize, (yi + dy) as usize)));
            }
        }
    }

    best.map(|(_, pos)| pos)
}

/// Whether another Air cell sits within `min_gap` of `(x, y)` in its 3x3 neighborhood.
///
/// Advisory only; the tick loop consults it when `enforce_gap` is set.
pub fn maintain_gap(grid: &Grid, x: usize, y: usize, min_gap: f32) -> bool {
    let (xi, yi) = (x as i32, y as i32);
    for dy in -1..=1i32 {
        for dx in -1..=1i32 {
            if dx == 0 && dy == 0 {
                continue;
            }
            if grid.get(xi + dx, yi + dy) != Some(CellKind::Air) {
                continue;
            }
            let dist = ((dx * dx + dy * dy) as f32).sqrt();
            if dist <= min_gap {
                return true;
            }
        }
    }
    false
}
