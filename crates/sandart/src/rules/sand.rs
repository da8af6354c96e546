//! Sand grains: fall, roll diagonally, hunt for gaps, slide.
//!
//! Air is rigid for sand. A grain resting on Air never moves vertically;
//! it can only slide sideways off the bubble.

use super::{random_side, Move, TickContext};
use crate::cell::CellKind;
use rand::Rng;

/// Decide where the grain at `(x, y)` goes this tick.
pub fn step<R: Rng + ?Sized>(ctx: &TickContext, x: usize, y: usize, rng: &mut R) -> Option<Move> {
    let g = ctx.gravity.sign();
    let (xi, yi) = (x as i32, y as i32);
    let below = ctx.kind(xi, yi + g);
    let resistance = ctx.sand.get(x, y).slide_resistance();

    // Resting on a bubble: sideways or nothing.
    let on_air = ctx.prev.get(xi, yi + g) == Some(CellKind::Air) || below == Some(CellKind::Air);
    if on_air {
        return slide(ctx, x, y, resistance, false, rng);
    }

    // Dune spreading: on top of other sand, try an easier slide first.
    if below.is_some_and(CellKind::is_sand) {
        let eased = resistance * ctx.config.sand.dune_friction_scale;
        if let Some(m) = slide(ctx, x, y, eased, true, rng) {
            return Some(m);
        }
    }

    fall(ctx, xi, yi)
        .or_else(|| fall_diagonal(ctx, xi, yi, rng))
        .or_else(|| find_gap(ctx, xi, yi, rng))
        .or_else(|| slide(ctx, x, y, resistance, false, rng))
}

/// Sand settles into empty space and sinks through water.
#[inline]
fn can_enter(kind: Option<CellKind>) -> bool {
    matches!(kind, Some(CellKind::Empty) | Some(CellKind::Water))
}

/// 1. Straight down.
fn fall(ctx: &TickContext, x: i32, y: i32) -> Option<Move> {
    let ty = y + ctx.gravity.sign();
    can_enter(ctx.kind(x, ty)).then(|| Move::to(x, ty))
}

/// 2. Diagonally down, random side first.
fn fall_diagonal<R: Rng + ?Sized>(ctx: &TickContext, x: i32, y: i32, rng: &mut R) -> Option<Move> {
    let ty = y + ctx.gravity.sign();
    let first = random_side(rng);
    [first, -first]
        .into_iter()
        .find(|&dx| can_enter(ctx.kind(x + dx, ty)))
        .map(|dx| Move::to(x + dx, ty))
}

/// 3. Look sideways along the current row for an opening in the barrier below.
///
/// A candidate column is reachable only if every cell between here and it
/// on this row is empty. Its score is the number of contiguous empty cells
/// below the row, up to `gap_depth`; Air or sand ends the run. The deepest
/// gap wins, then the nearest. The grain takes one step toward it.
fn find_gap<R: Rng + ?Sized>(ctx: &TickContext, x: i32, y: i32, rng: &mut R) -> Option<Move> {
    let params = &ctx.config.sand;
    let g = ctx.gravity.sign();
    let first = random_side(rng);
    let sides = [first, -first];
    let mut open = [true, true];
    let mut best: Option<(usize, i32)> = None;

    for dist in 1..=params.gap_radius as i32 {
        for (side, &dir) in sides.iter().enumerate() {
            if !open[side] {
                continue;
            }
            let cx = x + dir * dist;
            if !ctx.is_empty(cx, y) {
                open[side] = false;
                continue;
            }

            let depth = (1..=params.gap_depth as i32)
                .take_while(|&k| ctx.is_empty(cx, y + g * k))
                .count();
            if depth > 0 && best.map_or(true, |(d, _)| depth > d) {
                best = Some((depth, dir));
            }
        }
    }

    best.map(|(_, dir)| Move::to(x + dir, y))
}

/// Stacked support beneath row `y` in column `cx`, scanning with gravity.
///
/// Each sand cell counts one and the grid edge counts one more and ends the
/// scan. Empty or water ends the stack. Air anywhere in the stack makes the
/// column a full-height barrier.
fn column_height(ctx: &TickContext, cx: i32, y: i32) -> usize {
    let scan = ctx.config.sand.height_scan;
    let g = ctx.gravity.sign();
    let mut height = 0;
    for k in 1..=scan as i32 {
        match ctx.kind(cx, y + g * k) {
            None => return (height + 1).min(scan),
            Some(CellKind::Air) => return scan,
            Some(kind) if kind.is_sand() => height += 1,
            Some(_) => break,
        }
    }
    height
}

/// 4. Slide sideways toward the shorter neighbor column.
///
/// Refused when the left/right height difference is too steep, when the
/// random draw does not beat `resistance`, or when the target column is not
/// shorter than our own. With `needs_support` the target must have
/// something beneath it.
fn slide<R: Rng + ?Sized>(
    ctx: &TickContext,
    x: usize,
    y: usize,
    resistance: f32,
    needs_support: bool,
    rng: &mut R,
) -> Option<Move> {
    let params = &ctx.config.sand;
    let (xi, yi) = (x as i32, y as i32);
    let scan = params.height_scan as f32;

    let own = column_height(ctx, xi, yi);
    let left = (x > 0).then(|| column_height(ctx, xi - 1, yi));
    let right = (x + 1 < ctx.grid.width()).then(|| column_height(ctx, xi + 1, yi));

    // A wall mirrors the other side so edges do not read as cliffs.
    let hl = left.or(right).unwrap_or(own);
    let hr = right.or(left).unwrap_or(own);
    let slope = hl.abs_diff(hr) as f32 / scan;
    if slope >= params.max_slope {
        return None;
    }
    if rng.gen::<f32>() <= resistance {
        return None;
    }

    let order = if hl < hr {
        [(-1, hl), (1, hr)]
    } else if hr < hl {
        [(1, hr), (-1, hl)]
    } else if random_side(rng) < 0 {
        [(-1, hl), (1, hr)]
    } else {
        [(1, hr), (-1, hl)]
    };

    order
        .into_iter()
        .find(|&(dx, h)| ctx.is_empty(xi + dx, yi) && h < own && (!needs_support || h > 0))
        .map(|(dx, _)| Move::to(xi + dx, yi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gravity::Gravity;
    use crate::rules::testing::Fixture;
    use crate::sand_table::SandProps;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }

    #[test]
    fn falls_straight_into_empty() {
        let fx = Fixture::new(&[" # ", "   ", "   "]);
        let m = step(&fx.ctx(Gravity::Down), 1, 0, &mut rng(0));
        assert_eq!(m, Some(Move { x: 1, y: 1 }));
    }

    #[test]
    fn falls_upward_when_gravity_is_flipped() {
        let fx = Fixture::new(&["   ", "   ", " # "]);
        let m = step(&fx.ctx(Gravity::Up), 1, 2, &mut rng(0));
        assert_eq!(m, Some(Move { x: 1, y: 1 }));
    }

    #[test]
    fn sinks_through_water() {
        let fx = Fixture::new(&["%", "~"]);
        let m = step(&fx.ctx(Gravity::Down), 0, 0, &mut rng(0));
        assert_eq!(m, Some(Move { x: 0, y: 1 }));
    }

    #[test]
    fn rolls_diagonally_off_another_grain() {
        let fx = Fixture::new(&["   ", " # ", " # "]);
        for seed in 0..16 {
            let m = step(&fx.ctx(Gravity::Down), 1, 1, &mut rng(seed)).unwrap();
            assert_eq!(m.y, 2);
            assert!(m.x == 0 || m.x == 2);
        }
    }

    #[test]
    fn grain_on_flat_floor_stays_put() {
        let fx = Fixture::new(&["   ", "   ", " # "]);
        for seed in 0..16 {
            assert_eq!(step(&fx.ctx(Gravity::Down), 1, 2, &mut rng(seed)), None);
        }
    }

    #[test]
    fn never_moves_vertically_through_air() {
        let fx = Fixture::new(&[" : ", " o ", "   "]);
        for seed in 0..32 {
            if let Some(m) = step(&fx.ctx(Gravity::Down), 1, 0, &mut rng(seed)) {
                assert_eq!(m.y, 0, "grain on air may only slide sideways");
            }
        }
    }

    #[test]
    fn slides_off_air_when_friction_is_zero() {
        let fx = Fixture::new(&["# ", "o "]);
        let m = step(&fx.ctx(Gravity::Down), 0, 0, &mut rng(3));
        assert_eq!(m, Some(Move { x: 1, y: 0 }));
    }

    #[test]
    fn friction_one_blocks_sliding() {
        let mut fx = Fixture::new(&["# ", "o "]);
        fx.sand.set(0, 0, SandProps { friction: 1.0, mass: 1.0 });
        for seed in 0..16 {
            assert_eq!(step(&fx.ctx(Gravity::Down), 0, 0, &mut rng(seed)), None);
        }
    }

    #[test]
    fn slide_rate_follows_friction_not_mass() {
        let mut fx = Fixture::new(&["# ", "o "]);
        fx.sand.set(0, 0, SandProps { friction: 0.4, mass: 1.5 });

        let trials = 4000;
        let slid = (0..trials)
            .filter(|&seed| step(&fx.ctx(Gravity::Down), 0, 0, &mut rng(seed)) == Some(Move { x: 1, y: 0 }))
            .count();
        let rate = slid as f64 / trials as f64;
        assert!((0.55..0.65).contains(&rate), "slide rate {}", rate);
    }

    #[test]
    fn dune_slide_runs_at_reduced_resistance() {
        // The grain at (1, 1) sits on a stack three high; the column to its
        // right is one grain over water. Diagonals and gaps are all blocked.
        let mut fx = Fixture::new(&[
            "   ", //
            "## ",
            "###",
            "##~",
        ]);
        let friction = 0.8;
        fx.sand.set(1, 1, SandProps { friction, mass: 1.0 });
        let eased = friction * fx.config.sand.dune_friction_scale;

        let mut checked = 0;
        for seed in 0..200 {
            let draw: f32 = rng(seed).gen();
            if draw <= eased || draw > friction {
                continue;
            }
            let ctx = fx.ctx(Gravity::Down);
            assert_eq!(step(&ctx, 1, 1, &mut rng(seed)), Some(Move { x: 2, y: 1 }));
            assert_eq!(slide(&ctx, 1, 1, friction, false, &mut rng(seed)), None);
            checked += 1;
        }
        assert!(checked > 0);
    }

    #[test]
    fn dune_slide_needs_support_under_target() {
        // Right column is empty beneath row 1, so only the plain slide may use it.
        let fx = Fixture::new(&[
            "   ", //
            "## ",
            "## ",
            "## ",
        ]);
        for seed in 0..16 {
            assert_eq!(slide(&fx.ctx(Gravity::Down), 1, 1, 0.0, true, &mut rng(seed)), None);
            assert_eq!(
                slide(&fx.ctx(Gravity::Down), 1, 1, 0.0, false, &mut rng(seed)),
                Some(Move { x: 2, y: 1 })
            );
        }
    }

    #[test]
    fn steep_neighbors_block_sliding() {
        // Left column seven high, right column empty: slope 0.7 hits the limit.
        let steep = [
            " # ", //
            "#o ",
            "#  ",
            "#  ",
            "#  ",
            "#  ",
            "#  ",
            "#  ",
            "   ",
        ];
        let fx = Fixture::new(&steep);
        for seed in 0..16 {
            assert_eq!(step(&fx.ctx(Gravity::Down), 1, 0, &mut rng(seed)), None);
        }

        // One grain lower and the slope is under the limit.
        let mut gentle = steep;
        gentle[7] = "   ";
        let fx = Fixture::new(&gentle);
        for seed in 0..16 {
            assert_eq!(step(&fx.ctx(Gravity::Down), 1, 0, &mut rng(seed)), Some(Move { x: 2, y: 0 }));
        }
    }

    #[test]
    fn max_slope_is_configurable() {
        let mut fx = Fixture::new(&[" # ", "oo "]);
        for seed in 0..16 {
            assert_eq!(step(&fx.ctx(Gravity::Down), 1, 0, &mut rng(seed)), None);
        }
        fx.config.sand.max_slope = 1.5;
        assert_eq!(step(&fx.ctx(Gravity::Down), 1, 0, &mut rng(0)), Some(Move { x: 2, y: 0 }));
    }

    #[test]
    fn slides_toward_shorter_column() {
        let fx = Fixture::new(&[" # ", "#o#", "#  "]);
        for seed in 0..32 {
            assert_eq!(step(&fx.ctx(Gravity::Down), 1, 0, &mut rng(seed)), Some(Move { x: 2, y: 0 }));
        }

        let fx = Fixture::new(&[" # ", "#o#", "  #"]);
        for seed in 0..32 {
            assert_eq!(step(&fx.ctx(Gravity::Down), 1, 0, &mut rng(seed)), Some(Move { x: 0, y: 0 }));
        }
    }

    #[test]
    fn column_height_counts_stack_edge_and_air() {
        let fx = Fixture::new(&[
            "    ", //
            "#~o ",
            "# # ",
        ]);
        let ctx = fx.ctx(Gravity::Down);
        assert_eq!(column_height(&ctx, 0, 0), 3);
        assert_eq!(column_height(&ctx, 1, 0), 0);
        assert_eq!(column_height(&ctx, 2, 0), ctx.config.sand.height_scan);
        assert_eq!(column_height(&ctx, 3, 0), 0);
        assert_eq!(column_height(&ctx, 3, 2), 1);
    }

    #[test]
    fn walks_toward_gap_in_barrier() {
        let fx = Fixture::new(&[
            "   #   ", //
            "##### #",
            "       ",
            "       ",
        ]);
        for seed in 0..16 {
            let m = step(&fx.ctx(Gravity::Down), 3, 0, &mut rng(seed));
            assert_eq!(m, Some(Move { x: 4, y: 0 }));
        }
    }

    #[test]
    fn gap_search_prefers_deeper_openings() {
        let fx = Fixture::new(&[
            "   #   ", //
            "## ####",
            "#######",
        ]);
        let m = find_gap(&fx.ctx(Gravity::Down), 3, 0, &mut rng(1));
        assert_eq!(m, Some(Move { x: 2, y: 0 }));

        // A one-deep hole next door loses to a three-deep shaft further out.
        let fx = Fixture::new(&[
            "   #   ", //
            "## ### ",
            "###### ",
            "###### ",
        ]);
        for seed in 0..8 {
            let m = find_gap(&fx.ctx(Gravity::Down), 3, 0, &mut rng(seed));
            assert_eq!(m, Some(Move { x: 4, y: 0 }));
        }
    }

    #[test]
    fn gap_search_does_not_tunnel_through_walls() {
        let fx = Fixture::new(&[
            "  ~#   ", //
            "## ####",
            "#######",
        ]);
        // The only gap sits behind a water cell on the source row.
        assert_eq!(find_gap(&fx.ctx(Gravity::Down), 3, 0, &mut rng(0)), None);
    }
}
