//! Water: sink into anything lighter, sometimes diagonally, and level out.

use super::{chance, random_side, Move, TickContext};
use crate::cell::CellKind;
use rand::Rng;

/// Water displaces empty space and anything strictly lighter than itself.
#[inline]
fn can_displace(kind: Option<CellKind>) -> bool {
    matches!(kind, Some(k) if k == CellKind::Empty || k.density() < CellKind::Water.density())
}

/// Vertical settling for the water cell at `(x, y)`.
pub fn step<R: Rng + ?Sized>(ctx: &TickContext, x: usize, y: usize, rng: &mut R) -> Option<Move> {
    let (xi, yi) = (x as i32, y as i32);
    let ty = yi + ctx.gravity.sign();

    // 1. Straight with gravity
    if can_displace(ctx.kind(xi, ty)) {
        return Some(Move::to(xi, ty));
    }

    // 2. One diagonal attempt, random side
    if chance(rng, ctx.config.water.diagonal_probability) {
        let tx = xi + random_side(rng);
        if can_displace(ctx.kind(tx, ty)) {
            return Some(Move::to(tx, ty));
        }
    }

    None
}

/// Free-surface leveling: drift sideways into an empty neighbor.
///
/// Runs independently of [`step`], from wherever the water ended up.
pub fn spread<R: Rng + ?Sized>(ctx: &TickContext, x: usize, y: usize, rng: &mut R) -> Option<Move> {
    if !chance(rng, ctx.config.water.spread_probability) {
        return None;
    }
    let (xi, yi) = (x as i32, y as i32);
    let first = random_side(rng);
    [first, -first]
        .into_iter()
        .find(|&dx| ctx.is_empty(xi + dx, yi))
        .map(|dx| Move::to(xi + dx, yi))
}
