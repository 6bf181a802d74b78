//! Parameters configuring the facet pipeline.
//!
//! Every field has a default, so a JSON config only needs to name the knobs it
//! changes. [`PipelineParams::validate`] runs before any stage and rejects
//! out-of-range values up front.
use crate::border::SegmentOptions;
use crate::color::ColorSpace;
use crate::error::PipelineError;
use crate::facets::{ReduceOptions, RemovalOrder};
use crate::quantize::QuantizeOptions;
use crate::types::Rgb;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineParams {
    /// Palette size, 2..=256.
    pub k: usize,
    pub color_space: ColorSpace,
    /// K-means stops once the summed centroid displacement is at most this.
    pub kmeans_min_delta: f64,
    pub random_seed: u64,
    /// Low bits dropped from each channel before bucketing, 0..=7.
    pub bits_to_chop: u8,
    /// Facets smaller than this many pixels are removed.
    pub min_facet_size: usize,
    pub max_facets: usize,
    pub removal_order: RemovalOrder,
    /// Strip cleanup + rebuild + reduce rounds after the first reduction.
    pub narrow_strip_cleanup_runs: usize,
    pub smoothing_rounds: usize,
    pub segment_match_tolerance: f64,
    pub label_precision: f64,
    /// Optional fixed colours the palette is snapped to.
    pub restricted_colors: Option<Vec<Rgb>>,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            k: 16,
            color_space: ColorSpace::Rgb,
            kmeans_min_delta: 1.0,
            random_seed: 0,
            bits_to_chop: 2,
            min_facet_size: 20,
            max_facets: 100_000,
            removal_order: RemovalOrder::LargeToSmall,
            narrow_strip_cleanup_runs: 3,
            smoothing_rounds: 2,
            segment_match_tolerance: 4.0,
            label_precision: 1.0,
            restricted_colors: None,
        }
    }
}

impl PipelineParams {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(2..=256).contains(&self.k) {
            return Err(PipelineError::invalid(format!(
                "k must be in [2, 256], got {}",
                self.k
            )));
        }
        if !(self.kmeans_min_delta > 0.0) {
            return Err(PipelineError::invalid(format!(
                "kmeans_min_delta must be > 0, got {}",
                self.kmeans_min_delta
            )));
        }
        if self.bits_to_chop > 7 {
            return Err(PipelineError::invalid(format!(
                "bits_to_chop must be in [0, 7], got {}",
                self.bits_to_chop
            )));
        }
        if self.min_facet_size < 1 {
            return Err(PipelineError::invalid("min_facet_size must be >= 1"));
        }
        if self.max_facets < 1 {
            return Err(PipelineError::invalid("max_facets must be >= 1"));
        }
        if !(self.segment_match_tolerance >= 0.0) {
            return Err(PipelineError::invalid(format!(
                "segment_match_tolerance must be >= 0, got {}",
                self.segment_match_tolerance
            )));
        }
        if !(self.label_precision > 0.0) {
            return Err(PipelineError::invalid(format!(
                "label_precision must be > 0, got {}",
                self.label_precision
            )));
        }
        if self.restricted_colors.as_ref().is_some_and(|c| c.is_empty()) {
            return Err(PipelineError::invalid(
                "restricted_colors must not be empty when present",
            ));
        }
        Ok(())
    }

    pub fn to_quantize_options(&self) -> QuantizeOptions {
        QuantizeOptions {
            k: self.k,
            color_space: self.color_space,
            min_delta: self.kmeans_min_delta,
            seed: self.random_seed,
            bits_to_chop: self.bits_to_chop,
            restricted_colors: self.restricted_colors.clone(),
        }
    }

    pub fn to_reduce_options(&self) -> ReduceOptions {
        ReduceOptions {
            min_facet_size: self.min_facet_size,
            max_facets: self.max_facets,
            order: self.removal_order,
        }
    }

    pub fn to_segment_options(&self) -> SegmentOptions {
        SegmentOptions {
            smoothing_rounds: self.smoothing_rounds,
            match_tolerance: self.segment_match_tolerance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(PipelineParams::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let cases = [
            PipelineParams { k: 1, ..Default::default() },
            PipelineParams { k: 257, ..Default::default() },
            PipelineParams { kmeans_min_delta: 0.0, ..Default::default() },
            PipelineParams { kmeans_min_delta: f64::NAN, ..Default::default() },
            PipelineParams { min_facet_size: 0, ..Default::default() },
            PipelineParams { max_facets: 0, ..Default::default() },
            PipelineParams { bits_to_chop: 8, ..Default::default() },
            PipelineParams { label_precision: 0.0, ..Default::default() },
            PipelineParams { restricted_colors: Some(Vec::new()), ..Default::default() },
        ];
        for params in cases {
            let err = params.validate().expect_err("should be rejected");
            assert!(
                matches!(err, PipelineError::InvalidConfiguration(_)),
                "unexpected error {err:?}"
            );
        }
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let params: PipelineParams =
            serde_json::from_str(r#"{ "k": 8, "color_space": "lab", "removal_order": "small_to_large" }"#)
                .expect("parses");
        assert_eq!(params.k, 8);
        assert_eq!(params.color_space, ColorSpace::Lab);
        assert_eq!(params.removal_order, RemovalOrder::SmallToLarge);
        assert_eq!(params.min_facet_size, 20);
    }
}
