//! End-to-end driver for the facet pipeline.
//!
//! ```no_run
//! use pbn_facets::image::RgbaImage;
//! use pbn_facets::{FacetPipeline, PipelineParams, RunContext};
//!
//! # fn example(image: RgbaImage<'_>) -> Result<(), pbn_facets::PipelineError> {
//! let mut pipeline = FacetPipeline::new(PipelineParams::default())?;
//! let run = pipeline.run_with_diagnostics(&image, &mut RunContext::default())?;
//! println!("facets={} total_ms={:.1}", run.report.final_facets, run.report.timings.total_ms);
//! # Ok(())
//! # }
//! ```
use super::context::{RunContext, Stage};
use super::params::PipelineParams;
use super::workspace::PipelineWorkspace;
use crate::border::{BorderSegmenter, BorderTracer};
use crate::diagnostics::{InputDescriptor, PipelineReport, ReductionRound, TimingBreakdown};
use crate::error::PipelineError;
use crate::facets::{cleanup_narrow_strips, FacetGraph, FacetGraphBuilder, FacetReducer};
use crate::image::{Grid, RgbaImage};
use crate::label::LabelPlacer;
use crate::quantize::{ColorQuantizer, Palette, Quantized};
use crate::types::{FacetShape, PaintByNumbers};
use log::{debug, warn};
use std::time::Instant;

/// Everything a run produced, including the intermediate graph.
#[derive(Clone, Debug)]
pub struct PipelineRun {
    pub result: PaintByNumbers,
    pub report: PipelineReport,
    pub palette: Palette,
    /// Colour-index map after the last reduction round.
    pub color_indices: Grid<u8>,
    pub graph: FacetGraph,
}

/// Image-to-facets pipeline. Buffers are kept between runs.
pub struct FacetPipeline {
    params: PipelineParams,
    workspace: PipelineWorkspace,
}

impl FacetPipeline {
    /// Create a pipeline, rejecting invalid parameters before any work runs.
    pub fn new(params: PipelineParams) -> Result<Self, PipelineError> {
        params.validate()?;
        Ok(Self {
            params,
            workspace: PipelineWorkspace::new(),
        })
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    /// Run all stages and return the facet list.
    pub fn run(
        &mut self,
        img: &RgbaImage<'_>,
        ctx: &mut RunContext<'_>,
    ) -> Result<PaintByNumbers, PipelineError> {
        self.run_with_diagnostics(img, ctx).map(|run| run.result)
    }

    /// Run all stages and return the result with a report and the final graph.
    pub fn run_with_diagnostics(
        &mut self,
        img: &RgbaImage<'_>,
        ctx: &mut RunContext<'_>,
    ) -> Result<PipelineRun, PipelineError> {
        let (width, height) = (img.w, img.h);
        debug!(
            "FacetPipeline::run start w={} h={} k={} space={:?}",
            width, height, self.params.k, self.params.color_space
        );
        let total_start = Instant::now();
        let mut report = PipelineReport {
            input: InputDescriptor { width, height },
            ..Default::default()
        };

        if img.is_empty() {
            warn!("FacetPipeline::run zero-area image {width}x{height}, nothing to do");
            return Ok(PipelineRun {
                result: PaintByNumbers {
                    width,
                    height,
                    ..Default::default()
                },
                report,
                palette: Palette::default(),
                color_indices: Grid::new(width, height, 0),
                graph: FacetGraph::new(Grid::new(width, height, 0), Vec::new()),
            });
        }
        self.workspace.reset(width, height);
        let mut timings = TimingBreakdown::default();

        let start = Instant::now();
        let Quantized {
            palette,
            mut color_indices,
            iterations,
        } = ColorQuantizer::new(self.params.to_quantize_options()).quantize(img, ctx)?;
        timings.push(Stage::Quantize, 0, elapsed_ms(start));
        report.palette_size = palette.len();
        report.kmeans_iterations = iterations;

        let reducer = FacetReducer::new(self.params.to_reduce_options(), palette.distance_matrix());
        let mut graph =
            self.build_and_reduce(0, 0, &mut color_indices, &reducer, ctx, &mut report, &mut timings)?;
        for round in 1..=self.params.narrow_strip_cleanup_runs {
            let start = Instant::now();
            let cleaned = cleanup_narrow_strips(&mut color_indices, ctx)?;
            timings.push(Stage::StripCleanup, round, elapsed_ms(start));
            graph = self.build_and_reduce(
                round,
                cleaned,
                &mut color_indices,
                &reducer,
                ctx,
                &mut report,
                &mut timings,
            )?;
        }
        report.final_facets = graph.live_count();

        let start = Instant::now();
        report.traced_walls = BorderTracer::trace_all(&mut graph, &mut self.workspace.walls, ctx)?;
        timings.push(Stage::Trace, 0, elapsed_ms(start));

        let start = Instant::now();
        report.segments =
            BorderSegmenter::new(self.params.to_segment_options()).segment_all(&mut graph, ctx)?;
        timings.push(Stage::Segment, 0, elapsed_ms(start));

        let start = Instant::now();
        report.labels_placed =
            LabelPlacer::new(self.params.label_precision).place_all(&mut graph, ctx)?;
        timings.push(Stage::Label, 0, elapsed_ms(start));
        ctx.checkpoint(Stage::Label, 1.0)?;

        let result = assemble(&graph, &palette);
        timings.total_ms = elapsed_ms(total_start);
        report.timings = timings;
        debug!(
            "FacetPipeline::run done colors={} facets={} segments={} shared={} total_ms={:.3}",
            report.palette_size,
            report.final_facets,
            report.segments.segments,
            report.segments.shared,
            report.timings.total_ms
        );
        Ok(PipelineRun {
            result,
            report,
            palette,
            color_indices,
            graph,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn build_and_reduce(
        &mut self,
        round: usize,
        cleaned_pixels: usize,
        colors: &mut Grid<u8>,
        reducer: &FacetReducer,
        ctx: &mut RunContext<'_>,
        report: &mut PipelineReport,
        timings: &mut TimingBreakdown,
    ) -> Result<FacetGraph, PipelineError> {
        let start = Instant::now();
        let mut graph = FacetGraphBuilder::build(colors, &mut self.workspace.fill, ctx)?;
        timings.push(Stage::BuildFacets, round, elapsed_ms(start));
        let facets_built = graph.live_count();

        let start = Instant::now();
        let stats = reducer.reduce(&mut graph, colors, &mut self.workspace.fill, ctx)?;
        timings.push(Stage::Reduce, round, elapsed_ms(start));
        debug_assert!(graph.is_partition(), "facet map must stay a partition");
        debug!(
            "FacetPipeline::build_and_reduce round={round} cleaned={cleaned_pixels} built={facets_built} remaining={}",
            stats.remaining
        );

        report.rounds.push(ReductionRound {
            round,
            cleaned_pixels,
            facets_built,
            stats,
        });
        Ok(graph)
    }
}

fn assemble(graph: &FacetGraph, palette: &Palette) -> PaintByNumbers {
    let facets = graph
        .live_facets()
        .map(|f| FacetShape {
            id: f.id,
            color_index: f.color as usize,
            pixel_count: f.pixel_count,
            polygon: graph.facet_polygon(f.id),
            label: f.label.unwrap_or_default(),
        })
        .collect();
    PaintByNumbers {
        width: graph.width(),
        height: graph.height(),
        palette: palette.colors.clone(),
        facets,
    }
}

#[inline]
fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
