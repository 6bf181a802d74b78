use crate::pipeline::Stage;
use serde::Serialize;

/// Wall-clock time spent in one stage of the pipeline.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTiming {
    pub stage: Stage,
    /// Round of the reduce/cleanup loop, 0 for stages that run once.
    pub round: usize,
    pub elapsed_ms: f64,
}

impl StageTiming {
    pub fn new(stage: Stage, round: usize, elapsed_ms: f64) -> Self {
        Self {
            stage,
            round,
            elapsed_ms,
        }
    }
}

/// Aggregated timing trace for one pipeline run.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingBreakdown {
    pub total_ms: f64,
    pub stages: Vec<StageTiming>,
}

impl TimingBreakdown {
    pub fn push(&mut self, stage: Stage, round: usize, elapsed_ms: f64) {
        self.stages.push(StageTiming::new(stage, round, elapsed_ms));
    }

    /// Sum of all entries recorded for `stage`.
    pub fn stage_ms(&self, stage: Stage) -> f64 {
        self.stages
            .iter()
            .filter(|t| t.stage == stage)
            .map(|t| t.elapsed_ms)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_totals_sum_every_round() {
        let mut t = TimingBreakdown::default();
        t.push(Stage::Reduce, 0, 1.5);
        t.push(Stage::BuildFacets, 0, 4.0);
        t.push(Stage::Reduce, 1, 2.0);
        assert!((t.stage_ms(Stage::Reduce) - 3.5).abs() < 1e-12);
        assert_eq!(t.stage_ms(Stage::Trace), 0.0);
    }
}
