//! Facet pipeline orchestrating all stages of one run.
//!
//! Overview
//! - Quantizes the image into a palette and a colour-index map.
//! - Builds the facet graph and reduces it, then repeats strip cleanup,
//!   rebuild and reduction for the configured number of rounds.
//! - Traces each facet's outer wall loop, cuts it into per-neighbour
//!   segments shared between adjacent facets, and places a label.
//!
//! Modules
//! - [`context`] – cooperative cancellation and progress reporting.
//! - [`params`] – configuration and validation.
//! - `runner` – the [`FacetPipeline`] implementation.
//! - `workspace` – buffers reused across stages.
//!
//! Stages run strictly in sequence. Each receives the [`RunContext`] and
//! checkpoints between chunks of work, so a raised cancel flag stops the run
//! with [`PipelineError::Cancelled`](crate::PipelineError::Cancelled).

pub mod context;
pub mod params;
mod runner;
mod workspace;

pub use context::{RunContext, Stage, DEFAULT_CHUNK_SIZE};
pub use params::PipelineParams;
pub use runner::{FacetPipeline, PipelineRun};
pub use workspace::PipelineWorkspace;
