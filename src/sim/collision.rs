//! Axis-separated collision resolution against solid blocks
//!
//! A move is split into an X pass using only the horizontal displacement and
//! a Y pass using only the vertical displacement. Each pass sweeps the
//! leading edge and stops at the nearest solid face it would cross, so a fast
//! actor cannot skip through a thin block or slip between two blocks at a
//! corner. The level floor (`y = height`) and ceiling (`y = 0`) are solid.
//!
//! Sweeps only see faces ahead of the box, so a box that starts inside a
//! solid is pushed out first. Moved groups and teleports can leave it there.

use glam::Vec2;

use super::level::{LevelStore, ObjectId};
use super::quadtree::QuadTree;
use super::rect::Rect;

/// Contact tolerance for faces that are already touching
pub const SKIN: f32 = 1e-3;

/// Depth of the virtual floor and ceiling slabs
const WALL_DEPTH: f32 = 1.0e5;

/// Push-out rounds before giving up on a box wedged between solids
const PUSH_OUT_PASSES: usize = 4;

/// Outcome of one axis pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisResult {
    pub rect: Rect,
    /// Motion was cut short by a face
    pub blocked: bool,
}

/// Outcome of a full X-then-Y resolution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub rect: Rect,
    /// Y pass stopped motion along the gravity direction
    pub landed: bool,
    /// Y pass stopped motion against the gravity direction
    pub bonked: bool,
}

/// Sweep `start` horizontally by `dx`
pub fn resolve_x(start: Rect, dx: f32, solids: &[Rect]) -> AxisResult {
    if dx == 0.0 {
        return AxisResult {
            rect: start,
            blocked: false,
        };
    }

    let mut moved = dx;
    let mut blocked = false;
    for solid in solids.iter().filter(|s| start.overlaps_y(s)) {
        if dx > 0.0 {
            let gap = solid.left() - start.right();
            if gap >= -SKIN && gap < moved {
                moved = gap.max(0.0);
                blocked = true;
            }
        } else {
            let gap = solid.right() - start.left();
            if gap <= SKIN && gap > moved {
                moved = gap.min(0.0);
                blocked = true;
            }
        }
    }

    AxisResult {
        rect: start.translated(moved, 0.0),
        blocked,
    }
}

/// Sweep `start` vertically by `dy`
pub fn resolve_y(start: Rect, dy: f32, solids: &[Rect]) -> AxisResult {
    if dy == 0.0 {
        return AxisResult {
            rect: start,
            blocked: false,
        };
    }

    let mut moved = dy;
    let mut blocked = false;
    for solid in solids.iter().filter(|s| start.overlaps_x(s)) {
        if dy > 0.0 {
            let gap = solid.top() - start.bottom();
            if gap >= -SKIN && gap < moved {
                moved = gap.max(0.0);
                blocked = true;
            }
        } else {
            let gap = solid.bottom() - start.top();
            if gap <= SKIN && gap > moved {
                moved = gap.min(0.0);
                blocked = true;
            }
        }
    }

    AxisResult {
        rect: start.translated(0.0, moved),
        blocked,
    }
}

/// Shortest offset that takes `rect` out of `solid`. Vertical exits win ties,
/// and the exit against gravity is tried first.
fn exit_offset(rect: &Rect, solid: &Rect, gravity_flip: f32) -> Vec2 {
    let up = Vec2::new(0.0, solid.top() - rect.bottom());
    let down = Vec2::new(0.0, solid.bottom() - rect.top());
    let (first, second) = if gravity_flip > 0.0 { (up, down) } else { (down, up) };
    let candidates = [
        first,
        second,
        Vec2::new(solid.left() - rect.right(), 0.0),
        Vec2::new(solid.right() - rect.left(), 0.0),
    ];
    let mut best = first;
    for offset in candidates {
        if offset.length_squared() < best.length_squared() {
            best = offset;
        }
    }
    best
}

/// Move `rect` out of any solid it overlaps by more than [`SKIN`]
pub fn push_out(rect: Rect, solids: &[Rect], gravity_flip: f32) -> Rect {
    let mut rect = rect;
    for _ in 0..PUSH_OUT_PASSES {
        let mut moved = false;
        for solid in solids {
            if !rect.inflated(-SKIN).intersects(solid) {
                continue;
            }
            let offset = exit_offset(&rect, solid, gravity_flip);
            rect = rect.translated(offset.x, offset.y);
            moved = true;
        }
        if !moved {
            break;
        }
    }
    rect
}

/// Floor and ceiling slabs spanning the level width (and well beyond it)
pub fn level_walls(bounds: Rect) -> [Rect; 2] {
    let x = bounds.x - WALL_DEPTH;
    let w = bounds.w + WALL_DEPTH * 2.0;
    [
        Rect::new(x, bounds.top() - WALL_DEPTH, w, WALL_DEPTH),
        Rect::new(x, bounds.bottom(), w, WALL_DEPTH),
    ]
}

/// Solid rectangles the swept area could touch
pub fn gather_solids(
    index: &QuadTree<ObjectId>,
    store: &LevelStore,
    sweep: &Rect,
    scratch: &mut Vec<ObjectId>,
    out: &mut Vec<Rect>,
) {
    scratch.clear();
    index.query_into(&sweep.inflated(SKIN * 2.0), scratch);
    out.extend(
        scratch
            .iter()
            .filter_map(|&id| store.get(id))
            .filter(|obj| obj.kind.is_solid())
            .map(|obj| obj.rect),
    );
    out.extend(level_walls(store.bounds()));
}

/// Resolve a move of `delta` from `start`: X pass first, then Y pass
pub fn resolve_move(
    index: &QuadTree<ObjectId>,
    store: &LevelStore,
    start: Rect,
    delta: Vec2,
    gravity_flip: f32,
) -> Resolution {
    let mut scratch = Vec::new();
    let mut solids = Vec::new();
    gather_solids(index, store, &start.inflated(start.w.max(start.h)), &mut scratch, &mut solids);
    let start = push_out(start, &solids, gravity_flip);

    let sweep = start.union(&start.translated(delta.x, delta.y));
    solids.clear();
    gather_solids(index, store, &sweep, &mut scratch, &mut solids);

    let x = resolve_x(start, delta.x, &solids);
    let y = resolve_y(x.rect, delta.y, &solids);

    let along_gravity = delta.y * gravity_flip > 0.0;
    Resolution {
        rect: y.rect,
        landed: y.blocked && along_gravity,
        bonked: y.blocked && !along_gravity,
    }
}
