//! Small-facet removal.
//!
//! A deleted facet hands each of its pixels to the neighbour whose border is
//! closest in Manhattan distance, preferring the perceptually closer colour on
//! ties. The neighbours are then re-filled in place, which fuses same-coloured
//! neighbours that became connected through the deleted region.
use super::fill::{fill_facet, FillScratch};
use super::{FacetGraph, FacetId};
use crate::error::PipelineError;
use crate::image::Grid;
use crate::pipeline::context::{RunContext, Stage};
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Order in which the threshold phase visits facets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalOrder {
    /// Large facets first, so they stay stable while small ones are absorbed.
    #[default]
    LargeToSmall,
    SmallToLarge,
}

#[derive(Clone, Debug)]
pub struct ReduceOptions {
    pub min_facet_size: usize,
    pub max_facets: usize,
    pub order: RemovalOrder,
}

impl Default for ReduceOptions {
    fn default() -> Self {
        Self {
            min_facet_size: 20,
            max_facets: 100_000,
            order: RemovalOrder::LargeToSmall,
        }
    }
}

/// Counters of one [`FacetReducer::reduce`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReduceStats {
    pub deleted: usize,
    /// Deletions refused because the facet had no neighbour.
    pub skipped: usize,
    pub remaining: usize,
}

#[derive(Clone, Debug)]
pub struct FacetReducer {
    opts: ReduceOptions,
    /// Squared RGB distance between palette entries.
    color_distances: Vec<Vec<f64>>,
}

impl FacetReducer {
    pub fn new(opts: ReduceOptions, color_distances: Vec<Vec<f64>>) -> Self {
        Self {
            opts,
            color_distances,
        }
    }

    pub fn options(&self) -> &ReduceOptions {
        &self.opts
    }

    /// Delete facets below the size threshold, then keep deleting the
    /// smallest facet until the facet cap holds.
    pub fn reduce(
        &self,
        graph: &mut FacetGraph,
        colors: &mut Grid<u8>,
        scratch: &mut FillScratch,
        ctx: &mut RunContext<'_>,
    ) -> Result<ReduceStats, PipelineError> {
        let mut stats = ReduceStats::default();
        let initial = graph.live_count();

        let mut order = graph.ids_by_size_desc();
        if self.opts.order == RemovalOrder::SmallToLarge {
            order.reverse();
        }
        let total = order.len();
        for (i, id) in order.into_iter().enumerate() {
            ctx.tick(Stage::Reduce, i, total)?;
            let below = graph
                .facet(id)
                .is_some_and(|f| f.pixel_count < self.opts.min_facet_size);
            if !below {
                continue;
            }
            self.delete_or_skip(graph, colors, scratch, id, &mut stats)?;
        }

        let mut undeletable: HashSet<FacetId> = HashSet::new();
        while graph.live_count() > self.opts.max_facets && graph.live_count() > 1 {
            let Some(id) = smallest_live(graph, &undeletable) else {
                break;
            };
            ctx.tick(Stage::Reduce, initial - graph.live_count(), initial)?;
            if !self.delete_or_skip(graph, colors, scratch, id, &mut stats)? {
                undeletable.insert(id);
            }
        }

        stats.remaining = graph.live_count();
        debug!(
            "FacetReducer::reduce before={} after={} deleted={} skipped={}",
            initial, stats.remaining, stats.deleted, stats.skipped
        );
        Ok(stats)
    }

    /// Returns false when the deletion was refused as degenerate.
    fn delete_or_skip(
        &self,
        graph: &mut FacetGraph,
        colors: &mut Grid<u8>,
        scratch: &mut FillScratch,
        id: FacetId,
        stats: &mut ReduceStats,
    ) -> Result<bool, PipelineError> {
        match self.delete_facet(graph, colors, scratch, id) {
            Ok(()) => {
                stats.deleted += 1;
                Ok(true)
            }
            Err(PipelineError::DegenerateInput(msg)) => {
                warn!("FacetReducer::reduce skipping facet {id}: {msg}");
                stats.skipped += 1;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Remove facet `id`, handing its pixels to the neighbouring facets.
    pub fn delete_facet(
        &self,
        graph: &mut FacetGraph,
        colors: &mut Grid<u8>,
        scratch: &mut FillScratch,
        id: FacetId,
    ) -> Result<(), PipelineError> {
        let neighbours = graph.neighbours(id).to_vec();
        let Some(facet) = graph.facet(id) else {
            return Err(PipelineError::DegenerateInput(format!(
                "facet {id} is not live"
            )));
        };
        if neighbours.is_empty() {
            return Err(PipelineError::DegenerateInput(format!(
                "facet {id} has no neighbours"
            )));
        }
        let own_color = facet.color as usize;
        let bbox = facet.bbox;

        for (x, y) in bbox.pixels() {
            if graph.facet_map().at(x, y) != id {
                continue;
            }
            if let Some(color) = self.closest_neighbour_color(graph, &neighbours, own_color, x, y) {
                colors.set(x, y, color);
            }
        }
        rebuild_neighbours(graph, colors, scratch, &neighbours);

        // Pixels that stayed on the dead id copy a live orthogonal neighbour.
        loop {
            let mut patched = 0usize;
            let mut orphan = None;
            for (x, y) in bbox.pixels() {
                if graph.facet_map().at(x, y) != id {
                    continue;
                }
                match live_orthogonal_color(graph, colors, id, x, y) {
                    Some(color) => {
                        colors.set(x, y, color);
                        patched += 1;
                    }
                    None => orphan = orphan.or(Some((x, y))),
                }
            }
            if patched == 0 {
                if let Some((x, y)) = orphan {
                    return Err(PipelineError::InconsistentState { facet: id, x, y });
                }
                break;
            }
            warn!("FacetReducer::delete_facet id={id} patched {patched} unreachable pixels");
            let mut affected = BTreeSet::new();
            for (x, y) in bbox.pixels() {
                let (x, y) = (x as isize, y as isize);
                for (dx, dy) in [(-1, 0), (0, -1), (1, 0), (0, 1)] {
                    if let Some(other) = graph.facet_at(x + dx, y + dy) {
                        if other != id && graph.is_live(other) {
                            affected.insert(other);
                        }
                    }
                }
            }
            let affected: Vec<FacetId> = affected.into_iter().collect();
            rebuild_neighbours(graph, colors, scratch, &affected);
        }

        graph.tombstone(id);
        trace!(
            "FacetReducer::delete_facet id={id} neighbours={} live={}",
            neighbours.len(),
            graph.live_count()
        );
        Ok(())
    }

    /// Colour of the neighbour whose border lies closest to (x, y).
    fn closest_neighbour_color(
        &self,
        graph: &FacetGraph,
        neighbours: &[FacetId],
        own_color: usize,
        x: usize,
        y: usize,
    ) -> Option<u8> {
        let mut best: Option<(usize, f64, u8)> = None;
        for &n in neighbours {
            let Some(nf) = graph.facet(n) else {
                continue;
            };
            let Some(dist) = nf.border_points.iter().map(|p| p.manhattan(x, y)).min() else {
                continue;
            };
            let color_dist = self.color_distance(own_color, nf.color as usize);
            let better = match best {
                None => true,
                Some((bd, bc, _)) => dist < bd || (dist == bd && color_dist < bc),
            };
            if better {
                best = Some((dist, color_dist, nf.color));
            }
        }
        best.map(|(_, _, color)| color)
    }

    fn color_distance(&self, a: usize, b: usize) -> f64 {
        self.color_distances
            .get(a)
            .and_then(|row| row.get(b))
            .copied()
            .unwrap_or(f64::INFINITY)
    }
}

/// Smallest live facet not in `skip`; ties go to the lower id.
fn smallest_live(graph: &FacetGraph, skip: &HashSet<FacetId>) -> Option<FacetId> {
    graph
        .live_facets()
        .filter(|f| !skip.contains(&f.id))
        .min_by_key(|f| (f.pixel_count, f.id))
        .map(|f| f.id)
}

fn live_orthogonal_color(
    graph: &FacetGraph,
    colors: &Grid<u8>,
    dead: FacetId,
    x: usize,
    y: usize,
) -> Option<u8> {
    let (sx, sy) = (x as isize, y as isize);
    [(-1, 0), (0, -1), (1, 0), (0, 1)]
        .into_iter()
        .find_map(|(dx, dy)| {
            let other = graph.facet_at(sx + dx, sy + dy)?;
            if other == dead || !graph.is_live(other) {
                return None;
            }
            Some(colors.at((sx + dx) as usize, (sy + dy) as usize))
        })
}

/// Re-fill `ids` from their current colours and invalidate the neighbour
/// sets around them. A facet whose seed was swallowed by an earlier fill in
/// the same rebuild is tombstoned.
fn rebuild_neighbours(
    graph: &mut FacetGraph,
    colors: &Grid<u8>,
    scratch: &mut FillScratch,
    ids: &[FacetId],
) {
    let mut changed: BTreeSet<FacetId> = BTreeSet::new();
    for &n in ids {
        changed.insert(n);
        changed.extend(graph.neighbours(n).iter().copied());
    }

    for &n in ids {
        let Some(seed) = graph
            .facet(n)
            .and_then(|f| f.border_points.first().copied())
        else {
            continue;
        };
        if scratch.is_visited(seed.x, seed.y) {
            trace!("FacetReducer: facet {n} fused into a neighbour");
            graph.tombstone(n);
            continue;
        }
        let color = colors.at(seed.x, seed.y);
        let (facet_map, _) = graph.parts_mut();
        let rebuilt = fill_facet(n, color, seed, colors, facet_map, scratch);
        graph.replace(n, Some(rebuilt));
    }
    scratch.clear_touched();

    for id in changed {
        if let Some(f) = graph.facet_mut(id) {
            f.mark_stale();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facets::FacetGraphBuilder;

    fn setup(w: usize, h: usize, data: Vec<u8>) -> (FacetGraph, Grid<u8>, FillScratch) {
        let colors = Grid::from_vec(w, h, data).expect("valid grid");
        let mut scratch = FillScratch::new(w, h);
        let graph = FacetGraphBuilder::build(&colors, &mut scratch, &mut RunContext::default())
            .expect("built");
        (graph, colors, scratch)
    }

    fn distances(n: usize) -> Vec<Vec<f64>> {
        (0..n)
            .map(|i| (0..n).map(|j| (i as f64 - j as f64).powi(2)).collect())
            .collect()
    }

    #[test]
    fn island_is_absorbed() {
        #[rustfmt::skip]
        let (mut graph, mut colors, mut scratch) = setup(3, 3, vec![
            0, 0, 0,
            0, 1, 0,
            0, 0, 0,
        ]);
        let reducer = FacetReducer::new(
            ReduceOptions {
                min_facet_size: 2,
                ..Default::default()
            },
            distances(2),
        );
        let stats = reducer
            .reduce(&mut graph, &mut colors, &mut scratch, &mut RunContext::default())
            .expect("reduced");
        assert_eq!(stats.deleted, 1);
        assert_eq!(graph.live_count(), 1);
        assert_eq!(colors.at(1, 1), 0);
        assert!(graph.is_partition());
        assert_eq!(graph.total_pixel_count(), 9);
    }

    #[test]
    fn deletion_fuses_same_colored_neighbours() {
        // Column of 1s splits two 0 facets; deleting it joins them.
        #[rustfmt::skip]
        let (mut graph, mut colors, mut scratch) = setup(3, 2, vec![
            0, 1, 0,
            0, 1, 0,
        ]);
        assert_eq!(graph.live_count(), 3);
        let reducer = FacetReducer::new(ReduceOptions::default(), distances(2));
        reducer
            .delete_facet(&mut graph, &mut colors, &mut scratch, 1)
            .expect("deleted");
        assert_eq!(graph.live_count(), 1);
        assert!(graph.is_partition());
        assert_eq!(graph.facet(0).map(|f| f.pixel_count), Some(6));
        assert!(!graph.is_live(2), "right half fused into facet 0");
    }

    #[test]
    fn manhattan_tie_prefers_closer_color() {
        // The middle pixel is equally far from both sides; color 2 is closer
        // to color 1 than color 5 is.
        #[rustfmt::skip]
        let (mut graph, mut colors, mut scratch) = setup(3, 1, vec![5, 1, 2]);
        let mut dist = distances(6);
        dist[1][5] = 100.0;
        dist[5][1] = 100.0;
        dist[1][2] = 1.0;
        dist[2][1] = 1.0;
        let reducer = FacetReducer::new(ReduceOptions::default(), dist);
        reducer
            .delete_facet(&mut graph, &mut colors, &mut scratch, 1)
            .expect("deleted");
        assert_eq!(colors.at(1, 0), 2);
        assert_eq!(graph.live_count(), 2);
        assert_eq!(graph.facet(2).map(|f| f.pixel_count), Some(2));
    }

    #[test]
    fn lone_facet_is_skipped() {
        let (mut graph, mut colors, mut scratch) = setup(2, 2, vec![3; 4]);
        let reducer = FacetReducer::new(
            ReduceOptions {
                min_facet_size: 10,
                ..Default::default()
            },
            distances(4),
        );
        let stats = reducer
            .reduce(&mut graph, &mut colors, &mut scratch, &mut RunContext::default())
            .expect("not fatal");
        assert_eq!(stats.skipped, 1);
        assert_eq!(graph.live_count(), 1);
    }

    #[test]
    fn cap_deletes_smallest_first() {
        #[rustfmt::skip]
        let (mut graph, mut colors, mut scratch) = setup(4, 2, vec![
            0, 0, 1, 2,
            0, 0, 1, 1,
        ]);
        let reducer = FacetReducer::new(
            ReduceOptions {
                min_facet_size: 1,
                max_facets: 2,
                ..Default::default()
            },
            distances(3),
        );
        reducer
            .reduce(&mut graph, &mut colors, &mut scratch, &mut RunContext::default())
            .expect("reduced");
        assert_eq!(graph.live_count(), 2);
        assert_eq!(colors.at(3, 0), 1, "single pixel of color 2 went first");
        assert!(graph.is_partition());
    }
}
