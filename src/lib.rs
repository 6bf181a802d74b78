#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod image;
pub mod pipeline;
pub mod types;

// Stage modules – public for tools and tests, but considered internals.
pub mod border;
pub mod color;
pub mod facets;
pub mod label;
pub mod quantize;

// --- High-level re-exports -------------------------------------------------

// Main entry points: pipeline + results.
pub use crate::error::PipelineError;
pub use crate::pipeline::{FacetPipeline, PipelineParams, PipelineRun, RunContext, Stage};
pub use crate::types::{FacetShape, LabelAnchor, PaintByNumbers};

// High-level diagnostics returned by the pipeline.
pub use crate::diagnostics::{PipelineReport, TimingBreakdown};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use pbn_facets::prelude::*;
///
/// # fn main() -> Result<(), PipelineError> {
/// let (w, h) = (32usize, 32usize);
/// let rgba = vec![0u8; w * h * 4];
/// let img = RgbaImage::new(w, h, &rgba)?;
///
/// let mut pipeline = FacetPipeline::new(PipelineParams::default())?;
/// let out = pipeline.run(&img, &mut RunContext::default())?;
/// println!("facets={} colours={}", out.facets.len(), out.palette.len());
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::image::RgbaImage;
    pub use crate::{FacetPipeline, PaintByNumbers, PipelineError, PipelineParams, RunContext};
}

// --- Stage-level API (for tools & advanced users) --------------------------

pub mod stages {
    pub use crate::border::{
        BorderSegment, BorderSegmenter, BorderTracer, Orientation, SegmentOptions,
        SharedSegmentRef, WallGrids, WallPoint,
    };
    pub use crate::facets::{
        cleanup_narrow_strips, Facet, FacetGraph, FacetGraphBuilder, FacetId, FacetReducer,
        FillScratch, NeighbourState, ReduceOptions, RemovalOrder,
    };
    pub use crate::label::LabelPlacer;
    pub use crate::quantize::{ColorQuantizer, Palette, QuantizeOptions};
}
