//! Outer-boundary tracing over pixel walls.
//!
//! The step rule is written once in orientation-relative terms. From a wall
//! `(p, o)` with outward normal `n`, each candidate direction `d` is one of the
//! two sides perpendicular to `o`, tried clockwise first:
//!
//! 1. rotate in place to `(p, d)` when `p + d` is outside the facet;
//! 2. step straight to `(p + d, o)` when that pixel is a border pixel of the
//!    facet whose `o` side still faces outwards;
//! 3. cut diagonally to `(p + d + n, opposite(d))` when the diagonal pixel
//!    belongs to the facet and the `d` wall of `p` is not already taken.
//!
//! Every rule requires its target wall to be unclaimed in this trace.
use super::wall::{Orientation, WallGrids, WallPoint};
use crate::error::PipelineError;
use crate::facets::{FacetGraph, FacetId};
use crate::pipeline::context::{RunContext, Stage};
use log::{debug, trace};

pub struct BorderTracer;

impl BorderTracer {
    /// Trace every live facet, largest first, storing the loop on the facet.
    /// Returns the total number of walls traced.
    pub fn trace_all(
        graph: &mut FacetGraph,
        walls: &mut WallGrids,
        ctx: &mut RunContext<'_>,
    ) -> Result<usize, PipelineError> {
        let order = graph.ids_by_size_desc();
        let total = order.len();
        let mut wall_count = 0usize;
        for (i, id) in order.into_iter().enumerate() {
            ctx.tick(Stage::Trace, i, total)?;
            let path = Self::trace_facet(graph, id, walls);
            wall_count += path.len();
            if let Some(f) = graph.facet_mut(id) {
                f.border_path = path;
            }
        }
        debug!("BorderTracer::trace_all facets={total} walls={wall_count}");
        Ok(wall_count)
    }

    /// Closed wall loop around the outer boundary of facet `id`. The closing
    /// wall is not repeated. Occupancy claimed here is released on return.
    pub fn trace_facet(graph: &FacetGraph, id: FacetId, walls: &mut WallGrids) -> Vec<WallPoint> {
        let Some(start) = Self::start_wall(graph, id) else {
            return Vec::new();
        };
        let tracer = Tracer { graph, id };
        let mut path = vec![start];
        walls.claim(&start);
        let mut current = start;
        while let Some(next) = tracer.step(&current, walls) {
            walls.claim(&next);
            path.push(next);
            current = next;
        }
        walls.clear_touched();
        trace!("BorderTracer::trace_facet id={id} walls={}", path.len());
        path
    }

    /// First border pixel on the bbox's left column, with the first outward
    /// side in Left, Top, Right, Bottom order.
    fn start_wall(graph: &FacetGraph, id: FacetId) -> Option<WallPoint> {
        let facet = graph.facet(id)?;
        let p = facet
            .border_points
            .iter()
            .find(|p| p.x == facet.bbox.min_x)?;
        Orientation::ALL.into_iter().find_map(|o| {
            let wall = WallPoint::new(p.x, p.y, o);
            let (ax, ay) = wall.across();
            (graph.facet_at(ax, ay) != Some(id)).then_some(wall)
        })
    }
}

struct Tracer<'g> {
    graph: &'g FacetGraph,
    id: FacetId,
}

impl Tracer<'_> {
    #[inline]
    fn inside(&self, x: isize, y: isize) -> bool {
        self.graph.facet_at(x, y) == Some(self.id)
    }

    #[inline]
    fn border_inside(&self, x: isize, y: isize) -> bool {
        self.inside(x, y) && self.graph.is_border_pixel(x as usize, y as usize)
    }

    fn step(&self, at: &WallPoint, walls: &WallGrids) -> Option<WallPoint> {
        let o = at.orientation;
        let (nx, ny) = o.normal();
        let (px, py) = (at.x as isize, at.y as isize);
        let sides = [o.cw(), o.ccw()];

        for d in sides {
            let (dx, dy) = d.normal();
            let wall = WallPoint::new(at.x, at.y, d);
            if !self.inside(px + dx, py + dy) && !walls.occupied(&wall) {
                return Some(wall);
            }
        }

        for d in sides {
            let (dx, dy) = d.normal();
            let (qx, qy) = (px + dx, py + dy);
            if !self.border_inside(qx, qy) || self.inside(qx + nx, qy + ny) {
                continue;
            }
            let wall = WallPoint::new(qx as usize, qy as usize, o);
            if !walls.occupied(&wall) {
                return Some(wall);
            }
        }

        for d in sides {
            let (dx, dy) = d.normal();
            let (rx, ry) = (px + dx + nx, py + dy + ny);
            if !self.border_inside(rx, ry) {
                continue;
            }
            // A taken `d` wall here would make a three-way junction.
            if walls.occupied(&WallPoint::new(at.x, at.y, d)) {
                continue;
            }
            let wall = WallPoint::new(rx as usize, ry as usize, d.opposite());
            if !walls.occupied(&wall) {
                return Some(wall);
            }
        }
        None
    }
}
