//! Label anchors via a pole-of-inaccessibility search.
//!
//! The polygon's bounding box is covered with square cells kept in a max-heap
//! ordered by the best distance any point of the cell could reach. Cells are
//! split until no remaining cell can beat the current best by more than the
//! precision.
use crate::error::PipelineError;
use crate::facets::FacetGraph;
use crate::pipeline::context::{RunContext, Stage};
use crate::types::LabelAnchor;
use log::{debug, trace};
use nalgebra::Point2;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::f64::consts::SQRT_2;

/// Distance below which a point counts as lying on a ring.
const ON_RING_EPS: f64 = 1e-9;

#[derive(Clone, Copy, Debug)]
struct Cell {
    center: Point2<f64>,
    half: f64,
    /// Signed distance from the centre to the nearest ring edge.
    dist: f64,
    /// Upper bound of `dist` over the whole cell.
    max: f64,
}

impl Cell {
    fn new(center: Point2<f64>, half: f64, outer: &[Point2<f64>], holes: &[Vec<Point2<f64>>]) -> Self {
        let dist = signed_distance(&center, outer, holes);
        Self {
            center,
            half,
            dist,
            max: dist + half * SQRT_2,
        }
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.max.total_cmp(&other.max) == Ordering::Equal
    }
}

impl Eq for Cell {}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cell {
    fn cmp(&self, other: &Self) -> Ordering {
        self.max.total_cmp(&other.max)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct LabelPlacer {
    precision: f64,
}

impl Default for LabelPlacer {
    fn default() -> Self {
        Self { precision: 1.0 }
    }
}

impl LabelPlacer {
    pub fn new(precision: f64) -> Self {
        Self { precision }
    }

    /// Point inside `outer` (and outside every hole) farthest from all ring
    /// edges. Returns `None` for an empty ring.
    pub fn place(&self, outer: &[Point2<f64>], holes: &[Vec<Point2<f64>>]) -> Option<LabelAnchor> {
        let first = outer.first()?;
        let (mut min, mut max) = (*first, *first);
        for p in outer {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        let (w, h) = (max.x - min.x, max.y - min.y);
        let center = Point2::new(min.x + w / 2.0, min.y + h / 2.0);
        let cell_size = w.min(h);
        if cell_size <= 0.0 {
            let at = centroid(outer).unwrap_or(center);
            return Some(anchor(&Cell::new(at, 0.0, outer, holes)));
        }

        let half = cell_size / 2.0;
        let mut heap = BinaryHeap::new();
        let mut x = min.x;
        while x < max.x {
            let mut y = min.y;
            while y < max.y {
                heap.push(Cell::new(Point2::new(x + half, y + half), half, outer, holes));
                y += cell_size;
            }
            x += cell_size;
        }

        let mut best = Cell::new(centroid(outer).unwrap_or(center), 0.0, outer, holes);
        let bbox_cell = Cell::new(center, 0.0, outer, holes);
        if bbox_cell.dist > best.dist {
            best = bbox_cell;
        }

        let mut probes = 0usize;
        while let Some(cell) = heap.pop() {
            probes += 1;
            if cell.dist > best.dist {
                best = cell;
            }
            if cell.max - best.dist <= self.precision {
                break;
            }
            let half = cell.half / 2.0;
            for (dx, dy) in [(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)] {
                let c = Point2::new(cell.center.x + dx * half, cell.center.y + dy * half);
                heap.push(Cell::new(c, half, outer, holes));
            }
        }
        trace!(
            "LabelPlacer::place probes={probes} at=({:.2}, {:.2}) dist={:.3}",
            best.center.x,
            best.center.y,
            best.dist
        );
        Some(anchor(&best))
    }

    /// Place a label on every live facet. Neighbours enclosed by the facet's
    /// outer ring are excluded as holes.
    pub fn place_all(
        &self,
        graph: &mut FacetGraph,
        ctx: &mut RunContext<'_>,
    ) -> Result<usize, PipelineError> {
        let ids = graph.live_ids();
        let total = ids.len();
        let mut placed = 0usize;
        for (i, id) in ids.into_iter().enumerate() {
            ctx.tick(Stage::Label, i, total)?;
            let neighbours = graph.neighbours(id).to_vec();
            let Some(facet) = graph.facet(id) else {
                continue;
            };
            let outer = facet.polygon();
            let holes: Vec<Vec<Point2<f64>>> = neighbours
                .iter()
                .filter_map(|&n| graph.facet(n))
                .filter(|nf| facet.bbox.contains_box(&nf.bbox))
                .map(|nf| nf.polygon())
                .filter(|ring| !ring.is_empty() && ring.iter().all(|p| strictly_inside(p, &outer)))
                .collect();
            let label = self.place(&outer, &holes);
            if label.is_some() {
                placed += 1;
            }
            if let Some(f) = graph.facet_mut(id) {
                f.label = label;
            }
        }
        debug!("LabelPlacer::place_all placed={placed} of {total}");
        Ok(placed)
    }
}

fn anchor(cell: &Cell) -> LabelAnchor {
    LabelAnchor {
        x: cell.center.x,
        y: cell.center.y,
        distance: cell.dist,
        half_size: cell.dist * SQRT_2,
    }
}

/// Area-weighted centroid, `None` when the ring has no area.
pub fn centroid(ring: &[Point2<f64>]) -> Option<Point2<f64>> {
    let n = ring.len();
    let (mut area, mut cx, mut cy) = (0.0, 0.0, 0.0);
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        let f = a.x * b.y - b.x * a.y;
        cx += (a.x + b.x) * f;
        cy += (a.y + b.y) * f;
        area += f * 3.0;
    }
    if area.abs() < 1e-12 {
        None
    } else {
        Some(Point2::new(cx / area, cy / area))
    }
}

/// Even-odd containment test.
pub fn point_in_ring(p: &Point2<f64>, ring: &[Point2<f64>]) -> bool {
    let n = ring.len();
    let mut inside = false;
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn segment_distance_sq(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    let t = if len_sq > 0.0 {
        ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (p - (a + ab * t)).norm_squared()
}

fn ring_distance_sq(p: &Point2<f64>, ring: &[Point2<f64>]) -> f64 {
    let n = ring.len();
    (0..n)
        .map(|i| segment_distance_sq(p, &ring[i], &ring[(i + 1) % n]))
        .fold(f64::INFINITY, f64::min)
}

/// Distance to the nearest edge of any ring, negative outside the shape.
pub fn signed_distance(p: &Point2<f64>, outer: &[Point2<f64>], holes: &[Vec<Point2<f64>>]) -> f64 {
    let mut inside = point_in_ring(p, outer);
    let mut d = ring_distance_sq(p, outer);
    for hole in holes {
        if point_in_ring(p, hole) {
            inside = !inside;
        }
        d = d.min(ring_distance_sq(p, hole));
    }
    let d = d.sqrt();
    if inside {
        d
    } else {
        -d
    }
}

fn strictly_inside(p: &Point2<f64>, ring: &[Point2<f64>]) -> bool {
    point_in_ring(p, ring) && ring_distance_sq(p, ring).sqrt() > ON_RING_EPS
}
