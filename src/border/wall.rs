//! Pixel sides and the occupancy grids used while tracing.
//!
//! A wall is one side of a pixel. Its point in wall coordinates sits half a
//! pixel from the pixel centre towards that side, so `Left` of (x, y) is at
//! (x - 0.5, y). Vertical walls (Left/Right) live on a `(w + 1) × h` grid,
//! horizontal walls (Top/Bottom) on a `w × (h + 1)` grid; the Right wall of
//! one pixel and the Left wall of its right neighbour share a cell.
use crate::image::Grid;
use nalgebra::Point2;
use serde::Serialize;

/// Side of a pixel. Declaration order is clockwise in image coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Orientation {
    Left,
    Top,
    Right,
    Bottom,
}

impl Orientation {
    /// Probe order for the start wall of a trace.
    pub const ALL: [Orientation; 4] = [
        Orientation::Left,
        Orientation::Top,
        Orientation::Right,
        Orientation::Bottom,
    ];

    /// Unit step from the pixel towards this side.
    #[inline]
    pub fn normal(self) -> (isize, isize) {
        match self {
            Orientation::Left => (-1, 0),
            Orientation::Top => (0, -1),
            Orientation::Right => (1, 0),
            Orientation::Bottom => (0, 1),
        }
    }

    #[inline]
    pub fn cw(self) -> Self {
        match self {
            Orientation::Left => Orientation::Top,
            Orientation::Top => Orientation::Right,
            Orientation::Right => Orientation::Bottom,
            Orientation::Bottom => Orientation::Left,
        }
    }

    #[inline]
    pub fn ccw(self) -> Self {
        match self {
            Orientation::Left => Orientation::Bottom,
            Orientation::Top => Orientation::Left,
            Orientation::Right => Orientation::Top,
            Orientation::Bottom => Orientation::Right,
        }
    }

    #[inline]
    pub fn opposite(self) -> Self {
        self.cw().cw()
    }

    pub fn from_normal(dx: isize, dy: isize) -> Option<Self> {
        match (dx, dy) {
            (-1, 0) => Some(Orientation::Left),
            (0, -1) => Some(Orientation::Top),
            (1, 0) => Some(Orientation::Right),
            (0, 1) => Some(Orientation::Bottom),
            _ => None,
        }
    }
}

/// One boundary wall: a pixel plus the side facing out of its facet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct WallPoint {
    pub x: usize,
    pub y: usize,
    pub orientation: Orientation,
}

impl WallPoint {
    pub fn new(x: usize, y: usize, orientation: Orientation) -> Self {
        Self { x, y, orientation }
    }

    /// Midpoint of the wall in wall coordinates.
    pub fn wall_coords(&self) -> Point2<f64> {
        let (dx, dy) = self.orientation.normal();
        Point2::new(
            self.x as f64 + 0.5 * dx as f64,
            self.y as f64 + 0.5 * dy as f64,
        )
    }

    /// Pixel on the far side of the wall; may lie outside the image.
    #[inline]
    pub fn across(&self) -> (isize, isize) {
        let (dx, dy) = self.orientation.normal();
        (self.x as isize + dx, self.y as isize + dy)
    }
}

/// Wall occupancy for one trace. Only cells claimed since the last clear are
/// reset, so the grids are allocated once per run.
#[derive(Clone, Debug)]
pub struct WallGrids {
    vertical: Grid<bool>,
    horizontal: Grid<bool>,
    touched: Vec<(bool, usize)>,
}

impl WallGrids {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            vertical: Grid::new(width + 1, height, false),
            horizontal: Grid::new(width, height + 1, false),
            touched: Vec::new(),
        }
    }

    pub fn reset(&mut self, width: usize, height: usize) {
        self.vertical.reset(width + 1, height, false);
        self.horizontal.reset(width, height + 1, false);
        self.touched.clear();
    }

    /// (is_vertical, linear index) of the cell backing `wall`.
    #[inline]
    fn slot(&self, wall: &WallPoint) -> (bool, usize) {
        match wall.orientation {
            Orientation::Left => (true, self.vertical.idx(wall.x, wall.y)),
            Orientation::Right => (true, self.vertical.idx(wall.x + 1, wall.y)),
            Orientation::Top => (false, self.horizontal.idx(wall.x, wall.y)),
            Orientation::Bottom => (false, self.horizontal.idx(wall.x, wall.y + 1)),
        }
    }

    #[inline]
    pub fn occupied(&self, wall: &WallPoint) -> bool {
        let (vertical, i) = self.slot(wall);
        if vertical {
            self.vertical.data()[i]
        } else {
            self.horizontal.data()[i]
        }
    }

    pub fn claim(&mut self, wall: &WallPoint) {
        let (vertical, i) = self.slot(wall);
        if vertical {
            self.vertical.data_mut()[i] = true;
        } else {
            self.horizontal.data_mut()[i] = true;
        }
        self.touched.push((vertical, i));
    }

    pub fn clear_touched(&mut self) {
        for &(vertical, i) in &self.touched {
            if vertical {
                self.vertical.data_mut()[i] = false;
            } else {
                self.horizontal.data_mut()[i] = false;
            }
        }
        self.touched.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotations_cycle() {
        for o in Orientation::ALL {
            assert_eq!(o.cw().ccw(), o);
            assert_eq!(o.opposite().opposite(), o);
            let (dx, dy) = o.normal();
            assert_eq!(Orientation::from_normal(dx, dy), Some(o));
        }
        assert_eq!(Orientation::Left.cw(), Orientation::Top);
    }

    #[test]
    fn adjacent_walls_share_a_cell() {
        let mut grids = WallGrids::new(3, 2);
        grids.claim(&WallPoint::new(0, 1, Orientation::Right));
        assert!(grids.occupied(&WallPoint::new(1, 1, Orientation::Left)));
        assert!(!grids.occupied(&WallPoint::new(1, 1, Orientation::Right)));
        grids.claim(&WallPoint::new(2, 1, Orientation::Bottom));
        grids.clear_touched();
        assert!(!grids.occupied(&WallPoint::new(0, 1, Orientation::Right)));
        assert!(!grids.occupied(&WallPoint::new(2, 1, Orientation::Bottom)));
    }

    #[test]
    fn wall_coords_sit_on_pixel_sides() {
        let p = WallPoint::new(2, 3, Orientation::Top).wall_coords();
        assert_eq!(p, Point2::new(2.0, 2.5));
        let q = WallPoint::new(0, 0, Orientation::Left).wall_coords();
        assert_eq!(q, Point2::new(-0.5, 0.0));
    }
}
