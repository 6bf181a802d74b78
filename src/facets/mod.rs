//! Facet graph: 4-connected same-colour regions and their adjacency.
//!
//! The [`FacetGraph`] owns the facet map (facet id per pixel) and a slot per
//! facet id. Deleted facets leave a tombstone (`None`) so ids stay stable for
//! the lifetime of a run.
//!
//! Neighbour sets are cached on each facet behind a [`NeighbourState`] flag.
//! Most deletions invalidate the neighbour sets around them, so they are only
//! recomputed when read through [`FacetGraph::neighbours`].
pub mod builder;
pub mod cleanup;
pub(crate) mod fill;
pub mod reducer;

use crate::border::{SharedSegmentRef, WallPoint};
use crate::image::Grid;
use crate::types::{BoundingBox, LabelAnchor, Point};
use nalgebra::Point2;
use std::collections::BTreeSet;

pub use builder::FacetGraphBuilder;
pub use cleanup::cleanup_narrow_strips;
pub use fill::FillScratch;
pub use reducer::{FacetReducer, ReduceOptions, ReduceStats, RemovalOrder};

pub type FacetId = usize;

/// Validity of a facet's cached neighbour list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NeighbourState {
    Valid,
    Stale,
}

#[derive(Clone, Debug)]
pub struct Facet {
    pub id: FacetId,
    /// Index into the palette.
    pub color: u8,
    pub pixel_count: usize,
    pub bbox: BoundingBox,
    /// Pixels with at least one orthogonal neighbour outside the facet or the
    /// image, in flood-fill discovery order.
    pub border_points: Vec<Point>,
    neighbours: Vec<FacetId>,
    neighbour_state: NeighbourState,
    /// Closed loop of boundary walls, filled in by the border tracer.
    pub border_path: Vec<WallPoint>,
    /// Simplified outline as an ordered loop of shared segments.
    pub border_segments: Vec<SharedSegmentRef>,
    pub label: Option<LabelAnchor>,
}

impl Facet {
    pub(crate) fn new(id: FacetId, color: u8) -> Self {
        Self {
            id,
            color,
            pixel_count: 0,
            bbox: BoundingBox::empty(),
            border_points: Vec::new(),
            neighbours: Vec::new(),
            neighbour_state: NeighbourState::Stale,
            border_path: Vec::new(),
            border_segments: Vec::new(),
            label: None,
        }
    }

    pub fn neighbour_state(&self) -> NeighbourState {
        self.neighbour_state
    }

    pub fn mark_stale(&mut self) {
        self.neighbour_state = NeighbourState::Stale;
        self.neighbours.clear();
    }

    /// Outline assembled from the shared segments, in wall coordinates.
    /// Repeated junction points between consecutive segments are dropped.
    pub fn polygon(&self) -> Vec<Point2<f64>> {
        let mut out: Vec<Point2<f64>> = Vec::new();
        for seg in &self.border_segments {
            for p in seg.points() {
                if out.last() != Some(&p) {
                    out.push(p);
                }
            }
        }
        if out.len() > 1 && out.first() == out.last() {
            out.pop();
        }
        out
    }
}

#[derive(Clone, Debug)]
pub struct FacetGraph {
    facet_map: Grid<FacetId>,
    facets: Vec<Option<Facet>>,
    live: usize,
}

impl FacetGraph {
    pub(crate) fn new(facet_map: Grid<FacetId>, facets: Vec<Option<Facet>>) -> Self {
        let live = facets.iter().filter(|f| f.is_some()).count();
        Self {
            facet_map,
            facets,
            live,
        }
    }

    pub fn width(&self) -> usize {
        self.facet_map.width()
    }

    pub fn height(&self) -> usize {
        self.facet_map.height()
    }

    pub fn facet_map(&self) -> &Grid<FacetId> {
        &self.facet_map
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut Grid<FacetId>, &mut Vec<Option<Facet>>) {
        (&mut self.facet_map, &mut self.facets)
    }

    /// Number of id slots, including tombstones.
    pub fn slots(&self) -> usize {
        self.facets.len()
    }

    pub fn live_count(&self) -> usize {
        self.live
    }

    pub fn facet(&self, id: FacetId) -> Option<&Facet> {
        self.facets.get(id).and_then(|f| f.as_ref())
    }

    pub fn facet_mut(&mut self, id: FacetId) -> Option<&mut Facet> {
        self.facets.get_mut(id).and_then(|f| f.as_mut())
    }

    pub fn is_live(&self, id: FacetId) -> bool {
        self.facet(id).is_some()
    }

    pub fn live_facets(&self) -> impl Iterator<Item = &Facet> {
        self.facets.iter().filter_map(|f| f.as_ref())
    }

    pub fn live_ids(&self) -> Vec<FacetId> {
        self.live_facets().map(|f| f.id).collect()
    }

    /// Live ids sorted by pixel count, largest first; ties keep id order.
    pub fn ids_by_size_desc(&self) -> Vec<FacetId> {
        let mut ids = self.live_ids();
        ids.sort_by_key(|&id| {
            std::cmp::Reverse(self.facet(id).map(|f| f.pixel_count).unwrap_or(0))
        });
        ids
    }

    pub(crate) fn replace(&mut self, id: FacetId, facet: Option<Facet>) {
        let was_live = self.is_live(id);
        let now_live = facet.is_some();
        self.facets[id] = facet;
        match (was_live, now_live) {
            (true, false) => self.live -= 1,
            (false, true) => self.live += 1,
            _ => {}
        }
    }

    /// Drop facet `id`, leaving a tombstone in its slot.
    pub(crate) fn tombstone(&mut self, id: FacetId) {
        self.replace(id, None);
    }

    /// Facet id at a signed pixel coordinate, `None` outside the image.
    #[inline]
    pub fn facet_at(&self, x: isize, y: isize) -> Option<FacetId> {
        self.facet_map.at_signed(x, y)
    }

    /// True when the pixel has an orthogonal neighbour outside the image or
    /// owned by another facet.
    pub fn is_border_pixel(&self, x: usize, y: usize) -> bool {
        let id = self.facet_map.at(x, y);
        let (x, y) = (x as isize, y as isize);
        [(-1, 0), (0, -1), (1, 0), (0, 1)]
            .iter()
            .any(|&(dx, dy)| self.facet_at(x + dx, y + dy) != Some(id))
    }

    /// Assembled outline of facet `id`, empty for a tombstone.
    pub fn facet_polygon(&self, id: FacetId) -> Vec<Point2<f64>> {
        self.facet(id).map(Facet::polygon).unwrap_or_default()
    }

    /// Neighbour ids of `id`, recomputed from the border pixels when stale.
    pub fn neighbours(&mut self, id: FacetId) -> &[FacetId] {
        self.ensure_neighbours(id);
        match self.facet(id) {
            Some(f) => &f.neighbours,
            None => &[],
        }
    }

    pub fn ensure_neighbours(&mut self, id: FacetId) {
        let Some(facet) = self.facet(id) else {
            return;
        };
        if facet.neighbour_state == NeighbourState::Valid {
            return;
        }
        let mut found = BTreeSet::new();
        for p in &facet.border_points {
            let (x, y) = (p.x as isize, p.y as isize);
            for (dx, dy) in [(-1, 0), (0, -1), (1, 0), (0, 1)] {
                if let Some(other) = self.facet_at(x + dx, y + dy) {
                    if other != id {
                        found.insert(other);
                    }
                }
            }
        }
        if let Some(facet) = self.facet_mut(id) {
            facet.neighbours = found.into_iter().collect();
            facet.neighbour_state = NeighbourState::Valid;
        }
    }

    /// Sum of live pixel counts; equals the image area while the map is a
    /// partition.
    pub fn total_pixel_count(&self) -> usize {
        self.live_facets().map(|f| f.pixel_count).sum()
    }

    /// Check that every pixel maps to a live facet whose pixel count matches
    /// the number of pixels carrying its id.
    pub fn is_partition(&self) -> bool {
        let mut counts = vec![0usize; self.facets.len()];
        for &id in self.facet_map.data() {
            if !self.is_live(id) {
                return false;
            }
            counts[id] += 1;
        }
        self.live_facets().all(|f| counts[f.id] == f.pixel_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facets::fill::FillScratch;
    use crate::pipeline::RunContext;

    fn graph_from(width: usize, height: usize, colors: &[u8]) -> FacetGraph {
        let grid = Grid::from_vec(width, height, colors.to_vec()).expect("valid grid");
        let mut scratch = FillScratch::new(width, height);
        FacetGraphBuilder::build(&grid, &mut scratch, &mut RunContext::default())
            .expect("facets built")
    }

    #[test]
    fn neighbours_are_lazy_and_sorted() {
        #[rustfmt::skip]
        let colors = [
            0, 1, 1,
            0, 2, 2,
            3, 3, 3,
        ];
        let mut graph = graph_from(3, 3, &colors);
        assert_eq!(graph.live_count(), 4);
        let center = graph.facet_map().at(1, 1);
        assert_eq!(
            graph.facet(center).map(|f| f.neighbour_state()),
            Some(NeighbourState::Stale)
        );
        let ns = graph.neighbours(center).to_vec();
        let mut expected = vec![
            graph.facet_map().at(0, 0),
            graph.facet_map().at(1, 0),
            graph.facet_map().at(0, 2),
        ];
        expected.sort_unstable();
        assert_eq!(ns, expected);
        assert_eq!(
            graph.facet(center).map(|f| f.neighbour_state()),
            Some(NeighbourState::Valid)
        );
    }

    #[test]
    fn partition_check_detects_dead_ids() {
        let mut graph = graph_from(2, 1, &[0, 1]);
        assert!(graph.is_partition());
        let id = graph.facet_map().at(1, 0);
        graph.tombstone(id);
        assert!(!graph.is_partition());
        assert_eq!(graph.live_count(), 1);
    }
}
