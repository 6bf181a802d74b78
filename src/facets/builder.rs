//! Flood-fill the colour-index map into a facet graph.
use super::fill::{fill_facet, FillScratch};
use super::{FacetGraph, FacetId};
use crate::error::PipelineError;
use crate::image::Grid;
use crate::pipeline::context::{RunContext, Stage};
use crate::types::Point;
use log::debug;

pub struct FacetGraphBuilder;

impl FacetGraphBuilder {
    /// Scan pixels in row-major order and fill every unvisited pixel into a
    /// new facet. Facet ids are assigned in discovery order. Neighbour sets
    /// are left stale.
    pub fn build(
        colors: &Grid<u8>,
        scratch: &mut FillScratch,
        ctx: &mut RunContext<'_>,
    ) -> Result<FacetGraph, PipelineError> {
        let (w, h) = (colors.width(), colors.height());
        scratch.reset(w, h);
        let mut facet_map: Grid<FacetId> = Grid::new(w, h, 0);
        let mut facets = Vec::new();

        for y in 0..h {
            for x in 0..w {
                if scratch.is_visited(x, y) {
                    continue;
                }
                let id = facets.len();
                let facet = fill_facet(
                    id,
                    colors.at(x, y),
                    Point::new(x, y),
                    colors,
                    &mut facet_map,
                    scratch,
                );
                facets.push(Some(facet));
            }
            ctx.tick(Stage::BuildFacets, (y + 1) * w, w * h)?;
        }
        scratch.clear_touched();

        debug!("FacetGraphBuilder::build w={w} h={h} facets={}", facets.len());
        Ok(FacetGraph::new(facet_map, facets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checker_pixels_become_separate_facets() {
        #[rustfmt::skip]
        let colors = Grid::from_vec(3, 2, vec![
            0, 1, 0,
            1, 0, 1,
        ]).expect("valid grid");
        let mut scratch = FillScratch::new(3, 2);
        let graph = FacetGraphBuilder::build(&colors, &mut scratch, &mut RunContext::default())
            .expect("built");
        assert_eq!(graph.live_count(), 6);
        assert!(graph.is_partition());
        assert_eq!(graph.total_pixel_count(), 6);
        assert_eq!(graph.facet_map().row(0), &[0, 1, 2]);
    }

    #[test]
    fn ring_with_hole() {
        #[rustfmt::skip]
        let colors = Grid::from_vec(3, 3, vec![
            2, 2, 2,
            2, 5, 2,
            2, 2, 2,
        ]).expect("valid grid");
        let mut scratch = FillScratch::new(3, 3);
        let graph = FacetGraphBuilder::build(&colors, &mut scratch, &mut RunContext::default())
            .expect("built");
        assert_eq!(graph.live_count(), 2);
        let ring = graph.facet(0).expect("ring facet");
        assert_eq!(ring.pixel_count, 8);
        assert_eq!(ring.border_points.len(), 8);
        let hole = graph.facet(1).expect("hole facet");
        assert_eq!(hole.pixel_count, 1);
        assert_eq!(hole.border_points, vec![Point::new(1, 1)]);
    }
}
