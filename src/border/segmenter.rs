//! Split traced loops into per-neighbour segments, smooth them and share
//! each edge between the two facets that border it.
use super::segment::{BorderSegment, SharedSegmentRef};
use super::wall::WallPoint;
use crate::error::PipelineError;
use crate::facets::{FacetGraph, FacetId};
use crate::pipeline::context::{RunContext, Stage};
use log::debug;
use nalgebra::{distance, Point2};
use serde::Serialize;
use std::rc::Rc;

/// Segments with at most this many points are never smoothed.
pub const MIN_SMOOTHING_POINTS: usize = 5;

#[derive(Clone, Debug)]
pub struct SegmentOptions {
    /// Haar halving rounds applied to every segment.
    pub smoothing_rounds: usize,
    /// Max endpoint distance, in pixels, for two segments to be matched.
    pub match_tolerance: f64,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            smoothing_rounds: 2,
            match_tolerance: 4.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SegmentStats {
    /// Segment references held by all facets.
    pub segments: usize,
    /// Segments referenced by two facets.
    pub shared: usize,
}

#[derive(Clone, Debug, Default)]
pub struct BorderSegmenter {
    opts: SegmentOptions,
}

impl BorderSegmenter {
    pub fn new(opts: SegmentOptions) -> Self {
        Self { opts }
    }

    pub fn options(&self) -> &SegmentOptions {
        &self.opts
    }

    /// Cut, smooth and match the border paths of all live facets, storing the
    /// resulting references in `border_segments`.
    pub fn segment_all(
        &self,
        graph: &mut FacetGraph,
        ctx: &mut RunContext<'_>,
    ) -> Result<SegmentStats, PipelineError> {
        let (w, h) = (graph.width(), graph.height());
        let slots = graph.slots();

        let mut pending: Vec<Vec<BorderSegment>> = vec![Vec::new(); slots];
        for id in graph.live_ids() {
            ctx.tick(Stage::Segment, id, slots * 2)?;
            let Some(facet) = graph.facet(id) else {
                continue;
            };
            let mut segments = cut_path(graph, &facet.border_path);
            for seg in &mut segments {
                for _ in 0..self.opts.smoothing_rounds {
                    seg.points = haar_halve(&seg.points, w, h);
                }
            }
            pending[id] = segments;
        }

        let mut assigned: Vec<Vec<Option<SharedSegmentRef>>> =
            pending.iter().map(|segs| vec![None; segs.len()]).collect();
        let mut stats = SegmentStats::default();
        for fid in 0..slots {
            ctx.tick(Stage::Segment, slots + fid, slots * 2)?;
            for si in 0..pending[fid].len() {
                if assigned[fid][si].is_some() {
                    continue;
                }
                let shared = SharedSegmentRef::owned(pending[fid][si].clone());
                if let Some(nid) = shared.neighbour {
                    if let Some((sj, reverse)) =
                        self.find_match(&shared.segment, fid, &pending[nid], &assigned[nid])
                    {
                        assigned[nid][sj] = Some(SharedSegmentRef {
                            segment: Rc::clone(&shared.segment),
                            reverse,
                            neighbour: Some(fid),
                        });
                        stats.shared += 1;
                    }
                }
                assigned[fid][si] = Some(shared);
            }
        }

        for (id, refs) in assigned.into_iter().enumerate() {
            if let Some(facet) = graph.facet_mut(id) {
                facet.border_segments = refs.into_iter().flatten().collect();
                stats.segments += facet.border_segments.len();
            }
        }
        debug!(
            "BorderSegmenter::segment_all segments={} shared={} rounds={}",
            stats.segments, stats.shared, self.opts.smoothing_rounds
        );
        Ok(stats)
    }

    /// Best unclaimed segment of the neighbour that points back at `owner`.
    /// Returns its index and whether it runs against `seg`. A straight and a
    /// reversed fit with equal endpoint distance resolve to straight.
    fn find_match(
        &self,
        seg: &BorderSegment,
        owner: FacetId,
        candidates: &[BorderSegment],
        claimed: &[Option<SharedSegmentRef>],
    ) -> Option<(usize, bool)> {
        let (Some(a0), Some(a1)) = (seg.first(), seg.last()) else {
            return None;
        };
        let tol = self.opts.match_tolerance;
        let mut best: Option<(usize, bool, f64)> = None;
        for (j, other) in candidates.iter().enumerate() {
            if claimed[j].is_some() || other.neighbour != Some(owner) {
                continue;
            }
            let (Some(b0), Some(b1)) = (other.first(), other.last()) else {
                continue;
            };
            let (s0, s1) = (distance(&a0, &b0), distance(&a1, &b1));
            let (r0, r1) = (distance(&a0, &b1), distance(&a1, &b0));
            let straight = (s0 <= tol && s1 <= tol).then_some(s0 + s1);
            let reversed = (r0 <= tol && r1 <= tol).then_some(r0 + r1);
            let fit = match (straight, reversed) {
                (Some(s), Some(r)) if r < s => Some((true, r)),
                (Some(s), _) => Some((false, s)),
                (None, Some(r)) => Some((true, r)),
                (None, None) => None,
            };
            if let Some((reverse, score)) = fit {
                if best.map_or(true, |(_, _, b)| score < b) {
                    best = Some((j, reverse, score));
                }
            }
        }
        best.map(|(j, reverse, _)| (j, reverse))
    }
}

fn neighbour_of(graph: &FacetGraph, wall: &WallPoint) -> Option<FacetId> {
    let (x, y) = wall.across();
    graph.facet_at(x, y)
}

/// Split a closed wall loop wherever the facet across the wall changes. The
/// wall where the change happens ends one segment and starts the next.
pub fn cut_path(graph: &FacetGraph, path: &[WallPoint]) -> Vec<BorderSegment> {
    let Some(first) = path.first() else {
        return Vec::new();
    };
    let mut segments: Vec<BorderSegment> = Vec::new();
    let mut current = BorderSegment::new(Vec::new(), neighbour_of(graph, first));

    for (i, wall) in path.iter().enumerate() {
        let point = wall.wall_coords();
        let neighbour = neighbour_of(graph, wall);
        let cut = i > 0
            && (neighbour != current.neighbour
                || (neighbour.is_some() && corner_changes_neighbour(graph, &path[i - 1], wall)));
        if cut {
            current.points.push(point);
            let next = BorderSegment::new(vec![point], neighbour);
            segments.push(std::mem::replace(&mut current, next));
        } else {
            current.points.push(point);
        }
    }

    // The loop closes on path[0]; a corner there splits head and tail too.
    let closing_cut = current.neighbour.is_some()
        && path
            .last()
            .is_some_and(|last| corner_changes_neighbour(graph, last, first));
    match segments.first_mut() {
        None => segments.push(current),
        Some(head) if head.neighbour == current.neighbour && !closing_cut => {
            current.points.append(&mut head.points);
            head.points = current.points;
        }
        Some(head) => {
            if let Some(p) = head.first() {
                current.points.push(p);
            }
            segments.push(current);
        }
    }
    segments
}

/// True when the path rotates in place around a corner whose diagonal pixel
/// belongs to a different facet than the one across the wall.
fn corner_changes_neighbour(graph: &FacetGraph, prev: &WallPoint, wall: &WallPoint) -> bool {
    if prev.x != wall.x || prev.y != wall.y || prev.orientation == wall.orientation {
        return false;
    }
    let (ax, ay) = prev.orientation.normal();
    let (bx, by) = wall.orientation.normal();
    let (dx, dy) = (ax + bx, ay + by);
    if dx == 0 && dy == 0 {
        return false;
    }
    let diagonal = graph.facet_at(wall.x as isize + dx, wall.y as isize + dy);
    diagonal != neighbour_of(graph, wall)
}

/// True for wall points on the outer image border of a `w × h` image.
#[inline]
fn on_image_edge(p: &Point2<f64>, w: usize, h: usize) -> bool {
    p.x <= -0.5 || p.y <= -0.5 || p.x >= w as f64 - 0.5 || p.y >= h as f64 - 0.5
}

/// One Haar halving round: interior point pairs collapse to their midpoint.
/// End points and pairs touching the image edge are kept as they are.
pub fn haar_halve(points: &[Point2<f64>], w: usize, h: usize) -> Vec<Point2<f64>> {
    if points.len() <= MIN_SMOOTHING_POINTS {
        return points.to_vec();
    }
    let last = points.len() - 1;
    let mut out = Vec::with_capacity(points.len() / 2 + 2);
    out.push(points[0]);
    let mut i = 1;
    while i < last {
        if i + 1 < last {
            let (a, b) = (points[i], points[i + 1]);
            if on_image_edge(&a, w, h) || on_image_edge(&b, w, h) {
                out.push(a);
                out.push(b);
            } else {
                out.push(nalgebra::center(&a, &b));
            }
            i += 2;
        } else {
            out.push(points[i]);
            i += 1;
        }
    }
    out.push(points[last]);
    out
}
