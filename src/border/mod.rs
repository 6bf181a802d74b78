//! Facet outlines: wall tracing, segmentation and shared-edge matching.
pub mod segment;
pub mod segmenter;
pub mod tracer;
pub mod wall;

pub use segment::{BorderSegment, SharedSegmentRef};
pub use segmenter::{BorderSegmenter, SegmentOptions, SegmentStats};
pub use tracer::BorderTracer;
pub use wall::{Orientation, WallGrids, WallPoint};
