//! Border segments and the shared references facets hold to them.
use crate::facets::FacetId;
use nalgebra::Point2;
use std::rc::Rc;

/// Run of a facet boundary that faces a single neighbour.
#[derive(Clone, Debug, PartialEq)]
pub struct BorderSegment {
    /// Points in wall coordinates, in the owning facet's trace direction.
    pub points: Vec<Point2<f64>>,
    /// Facet on the other side, `None` along the image edge.
    pub neighbour: Option<FacetId>,
}

impl BorderSegment {
    pub fn new(points: Vec<Point2<f64>>, neighbour: Option<FacetId>) -> Self {
        Self { points, neighbour }
    }

    pub fn first(&self) -> Option<Point2<f64>> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<Point2<f64>> {
        self.points.last().copied()
    }
}

/// A facet's handle on a segment. Two adjacent facets hold the same `Rc`,
/// one of them with `reverse` set.
#[derive(Clone, Debug)]
pub struct SharedSegmentRef {
    pub segment: Rc<BorderSegment>,
    pub reverse: bool,
    /// Neighbour as seen from the facet holding this reference.
    pub neighbour: Option<FacetId>,
}

impl SharedSegmentRef {
    pub fn owned(segment: BorderSegment) -> Self {
        let neighbour = segment.neighbour;
        Self {
            segment: Rc::new(segment),
            reverse: false,
            neighbour,
        }
    }

    /// Points in the holder's direction.
    pub fn points(&self) -> Vec<Point2<f64>> {
        if self.reverse {
            self.segment.points.iter().rev().copied().collect()
        } else {
            self.segment.points.clone()
        }
    }

    pub fn is_shared_with(&self, other: &SharedSegmentRef) -> bool {
        Rc::ptr_eq(&self.segment, &other.segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversed_reference_reads_backwards() {
        let seg = BorderSegment::new(
            vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(2.0, 0.5)],
            Some(4),
        );
        let a = SharedSegmentRef::owned(seg);
        let b = SharedSegmentRef {
            segment: Rc::clone(&a.segment),
            reverse: true,
            neighbour: Some(1),
        };
        assert!(a.is_shared_with(&b));
        assert_eq!(Some(b.points()[0]), a.segment.last());
        assert_eq!(b.points().len(), 3);
    }
}
