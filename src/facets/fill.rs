//! Scanline flood fill over the colour-index map.
//!
//! Each popped seed is extended to a maximal horizontal run, the run is
//! claimed in one pass, and the rows above and below are scanned for the
//! start of new fillable runs. The seed stack therefore holds one entry per
//! run rather than one per pixel.
use super::{Facet, FacetId};
use crate::image::Grid;
use crate::types::Point;

/// Reusable fill buffers: visited bitmap, seed stack and the list of visited
/// cells so the bitmap can be cleared without a full sweep.
#[derive(Clone, Debug)]
pub struct FillScratch {
    visited: Grid<bool>,
    stack: Vec<(usize, usize)>,
    touched: Vec<usize>,
}

impl FillScratch {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            visited: Grid::new(width, height, false),
            stack: Vec::new(),
            touched: Vec::new(),
        }
    }

    /// Prepare for an image of the given size, keeping allocations.
    pub fn reset(&mut self, width: usize, height: usize) {
        if self.visited.width() == width && self.visited.height() == height {
            self.clear_touched();
        } else {
            self.visited.reset(width, height, false);
            self.touched.clear();
        }
        self.stack.clear();
    }

    #[inline]
    pub fn is_visited(&self, x: usize, y: usize) -> bool {
        self.visited.at(x, y)
    }

    /// Unmark every cell visited since the last clear.
    pub fn clear_touched(&mut self) {
        let data = self.visited.data_mut();
        for &i in &self.touched {
            data[i] = false;
        }
        self.touched.clear();
    }
}

/// Fill the facet of colour `color` containing `start`, writing `id` into the
/// facet map. Returns the rebuilt facet; its pixel count is zero when `start`
/// was already visited or has another colour.
pub(crate) fn fill_facet(
    id: FacetId,
    color: u8,
    start: Point,
    colors: &Grid<u8>,
    facet_map: &mut Grid<FacetId>,
    scratch: &mut FillScratch,
) -> Facet {
    let mut facet = Facet::new(id, color);
    let (w, h) = (colors.width(), colors.height());
    let fillable =
        |visited: &Grid<bool>, x: usize, y: usize| !visited.at(x, y) && colors.at(x, y) == color;

    scratch.stack.clear();
    scratch.stack.push((start.x, start.y));
    while let Some((sx, sy)) = scratch.stack.pop() {
        if !fillable(&scratch.visited, sx, sy) {
            continue;
        }
        let mut lx = sx;
        while lx > 0 && fillable(&scratch.visited, lx - 1, sy) {
            lx -= 1;
        }
        let mut rx = sx;
        while rx + 1 < w && fillable(&scratch.visited, rx + 1, sy) {
            rx += 1;
        }

        for x in lx..=rx {
            let i = scratch.visited.idx(x, sy);
            scratch.visited.data_mut()[i] = true;
            scratch.touched.push(i);
            facet_map.set(x, sy, id);
            facet.pixel_count += 1;
            facet.bbox.include(x, sy);
            if !all_around(colors, x, sy, color) {
                facet.border_points.push(Point::new(x, sy));
            }
        }

        // Queue one seed per fillable run in the adjacent rows. Seeds are
        // pushed right-to-left so runs pop in left-to-right order.
        for ny in [sy.checked_sub(1), (sy + 1 < h).then_some(sy + 1)]
            .into_iter()
            .flatten()
        {
            let mut seeds = Vec::new();
            let mut in_run = false;
            for x in lx..=rx {
                if fillable(&scratch.visited, x, ny) {
                    if !in_run {
                        seeds.push((x, ny));
                        in_run = true;
                    }
                } else {
                    in_run = false;
                }
            }
            scratch.stack.extend(seeds.into_iter().rev());
        }
    }
    facet
}

/// True when all four orthogonal neighbours exist and share `color`.
#[inline]
fn all_around(colors: &Grid<u8>, x: usize, y: usize, color: u8) -> bool {
    x > 0
        && y > 0
        && x + 1 < colors.width()
        && y + 1 < colors.height()
        && colors.at(x - 1, y) == color
        && colors.at(x + 1, y) == color
        && colors.at(x, y - 1) == color
        && colors.at(x, y + 1) == color
}
