use nalgebra::Point2;
use serde::Serialize;

/// 8-bit RGB triple.
pub type Rgb = [u8; 3];

/// Integer pixel coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to (x, y).
    #[inline]
    pub fn manhattan(&self, x: usize, y: usize) -> usize {
        self.x.abs_diff(x) + self.y.abs_diff(y)
    }
}

/// Inclusive pixel bounding box. An empty box has `min > max`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundingBox {
    pub fn empty() -> Self {
        Self {
            min_x: usize::MAX,
            min_y: usize::MAX,
            max_x: 0,
            max_y: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn include(&mut self, x: usize, y: usize) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn width(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.max_x - self.min_x + 1
        }
    }

    pub fn height(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.max_y - self.min_y + 1
        }
    }

    pub fn contains_box(&self, other: &BoundingBox) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }

    /// Iterate all coordinates inside the box in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = (usize, usize)> {
        let (x0, x1) = (self.min_x, self.max_x);
        let rows = if self.is_empty() {
            1..0
        } else {
            self.min_y..self.max_y + 1
        };
        rows.flat_map(move |y| (x0..=x1).map(move |x| (x, y)))
    }
}

/// Label anchor found by the pole-of-inaccessibility search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct LabelAnchor {
    pub x: f64,
    pub y: f64,
    /// Distance from the anchor to the nearest ring edge.
    pub distance: f64,
    /// Half the side of the label square centred on the anchor.
    pub half_size: f64,
}

/// One output region: palette colour, outline in wall coordinates and label.
#[derive(Clone, Debug, Serialize)]
pub struct FacetShape {
    pub id: usize,
    pub color_index: usize,
    pub pixel_count: usize,
    pub polygon: Vec<Point2<f64>>,
    pub label: LabelAnchor,
}

/// Complete pipeline output, ordered by facet id.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PaintByNumbers {
    pub width: usize,
    pub height: usize,
    pub palette: Vec<Rgb>,
    pub facets: Vec<FacetShape>,
}

#[cfg(test)]
mod tests {
    use super::BoundingBox;

    #[test]
    fn bbox_pixels_cover_inclusive_range() {
        let mut bb = BoundingBox::empty();
        assert!(bb.is_empty());
        assert_eq!(bb.pixels().count(), 0);
        bb.include(2, 1);
        bb.include(3, 2);
        let pts: Vec<_> = bb.pixels().collect();
        assert_eq!(pts, vec![(2, 1), (3, 1), (2, 2), (3, 2)]);
        assert_eq!(bb.width(), 2);
    }
}
