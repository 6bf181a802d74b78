//! Diagnostics returned by [`FacetPipeline::run_with_diagnostics`](crate::FacetPipeline).
//!
//! The report records per-stage wall-clock time and the facet and segment
//! counts observed at each stage boundary. Everything is serializable so the
//! demo binary can dump it next to the result.
pub mod report;
pub mod timing;

pub use report::{InputDescriptor, PipelineReport, ReductionRound};
pub use timing::{StageTiming, TimingBreakdown};
