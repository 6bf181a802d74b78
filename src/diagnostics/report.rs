use super::TimingBreakdown;
use crate::border::SegmentStats;
use crate::facets::ReduceStats;
use serde::Serialize;

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    pub width: usize,
    pub height: usize,
}

/// Facet counts around one build/reduce round.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReductionRound {
    pub round: usize,
    /// Pixels recoloured by strip cleanup before the build; 0 in round 0.
    pub cleaned_pixels: usize,
    pub facets_built: usize,
    pub stats: ReduceStats,
}

/// Summary of a pipeline run, returned next to the result.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub input: InputDescriptor,
    pub palette_size: usize,
    pub kmeans_iterations: usize,
    pub rounds: Vec<ReductionRound>,
    pub final_facets: usize,
    pub traced_walls: usize,
    pub segments: SegmentStats,
    pub labels_placed: usize,
    pub timings: TimingBreakdown,
}

impl PipelineReport {
    /// Facet count right after the first build.
    pub fn initial_facets(&self) -> usize {
        self.rounds.first().map(|r| r.facets_built).unwrap_or(0)
    }
}
