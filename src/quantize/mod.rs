//! Colour quantization: reduce raw pixels to a small palette.
//!
//! Pixels are bucketed by coarsened colour (low bits dropped) so that k-means
//! runs over distinct colours weighted by frequency instead of over every
//! pixel. Bucket order is first-encounter order in row-major scan, which keeps
//! the whole stage deterministic for a fixed seed.
//!
//! When a restriction list is supplied, each converged centroid is snapped to
//! the perceptually nearest allowed colour (euclidean distance in LAB).
//! Clusters that end up with the same RGB, or with no members, collapse into a
//! single palette entry.
pub mod kmeans;

use crate::color::{distance_sq, rgb_distance_sq, rgb_to_lab, ColorSpace};
use crate::error::PipelineError;
use crate::image::{Grid, RgbaImage};
use crate::pipeline::context::{RunContext, Stage};
use crate::types::Rgb;
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;

pub use kmeans::{ClusterPoint, KMeans};

/// Hard stop for k-means when the displacement threshold is never reached.
const MAX_KMEANS_ITERATIONS: usize = 1000;

/// Knobs of the quantization stage.
#[derive(Clone, Debug)]
pub struct QuantizeOptions {
    pub k: usize,
    pub color_space: ColorSpace,
    /// Stop once the summed centroid displacement is at most this value.
    pub min_delta: f64,
    pub seed: u64,
    pub bits_to_chop: u8,
    pub restricted_colors: Option<Vec<Rgb>>,
}

impl Default for QuantizeOptions {
    fn default() -> Self {
        Self {
            k: 16,
            color_space: ColorSpace::Rgb,
            min_delta: 1.0,
            seed: 0,
            bits_to_chop: 2,
            restricted_colors: None,
        }
    }
}

/// Ordered list of representative colours.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Palette {
    pub colors: Vec<Rgb>,
}

impl Palette {
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Symmetric matrix of squared RGB distances between palette entries.
    pub fn distance_matrix(&self) -> Vec<Vec<f64>> {
        let n = self.colors.len();
        let mut m = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = rgb_distance_sq(self.colors[i], self.colors[j]);
                m[i][j] = d;
                m[j][i] = d;
            }
        }
        m
    }
}

/// Palette plus the per-pixel index into it.
#[derive(Clone, Debug)]
pub struct Quantized {
    pub palette: Palette,
    pub color_indices: Grid<u8>,
    pub iterations: usize,
}

#[derive(Clone, Debug)]
pub struct ColorQuantizer {
    opts: QuantizeOptions,
}

impl ColorQuantizer {
    pub fn new(opts: QuantizeOptions) -> Self {
        Self { opts }
    }

    pub fn options(&self) -> &QuantizeOptions {
        &self.opts
    }

    pub fn quantize(
        &self,
        img: &RgbaImage<'_>,
        ctx: &mut RunContext<'_>,
    ) -> Result<Quantized, PipelineError> {
        if img.is_empty() {
            return Err(PipelineError::DegenerateInput(format!(
                "cannot quantize a {}x{} image",
                img.w, img.h
            )));
        }
        let (points, pixel_bucket) = self.bucket_pixels(img, ctx)?;
        debug!(
            "ColorQuantizer::quantize buckets={} k={} space={:?}",
            points.len(),
            self.opts.k,
            self.opts.color_space
        );

        let mut rng = StdRng::seed_from_u64(self.opts.seed);
        let mut km = KMeans::new(&points, self.opts.k, &mut rng);
        loop {
            let delta = km.step(&points);
            ctx.checkpoint(
                Stage::Quantize,
                0.5 + 0.4 * (km.iterations() as f64 / MAX_KMEANS_ITERATIONS as f64),
            )?;
            if delta <= self.opts.min_delta {
                break;
            }
            if km.iterations() >= MAX_KMEANS_ITERATIONS {
                debug!(
                    "ColorQuantizer::quantize stopped after {} iterations, delta={delta:.4}",
                    km.iterations()
                );
                break;
            }
        }
        km.assign(&points);

        let cluster_colors: Vec<Rgb> = km
            .centroids()
            .iter()
            .map(|c| self.final_color(*c))
            .collect();

        let mut used = vec![false; cluster_colors.len()];
        for &c in km.assignment() {
            used[c] = true;
        }
        let mut palette = Palette::default();
        let mut cluster_to_palette = vec![0u8; cluster_colors.len()];
        for (cluster, rgb) in cluster_colors.iter().enumerate() {
            if !used[cluster] {
                continue;
            }
            let idx = match palette.colors.iter().position(|c| c == rgb) {
                Some(existing) => existing,
                None => {
                    palette.colors.push(*rgb);
                    palette.colors.len() - 1
                }
            };
            cluster_to_palette[cluster] = idx as u8;
        }

        let bucket_to_palette: Vec<u8> = km
            .assignment()
            .iter()
            .map(|&c| cluster_to_palette[c])
            .collect();
        let data = pixel_bucket
            .into_iter()
            .map(|b| bucket_to_palette[b as usize])
            .collect();
        let color_indices = Grid::from_vec(img.w, img.h, data)?;
        ctx.checkpoint(Stage::Quantize, 1.0)?;

        debug!(
            "ColorQuantizer::quantize done colors={} iterations={}",
            palette.len(),
            km.iterations()
        );
        Ok(Quantized {
            palette,
            color_indices,
            iterations: km.iterations(),
        })
    }

    /// Weighted points per coarsened colour and the bucket index of each pixel.
    fn bucket_pixels(
        &self,
        img: &RgbaImage<'_>,
        ctx: &mut RunContext<'_>,
    ) -> Result<(Vec<ClusterPoint>, Vec<u32>), PipelineError> {
        let bits = self.opts.bits_to_chop;
        let total = img.w * img.h;
        let mut index_of: HashMap<Rgb, u32> = HashMap::new();
        let mut tags: Vec<Rgb> = Vec::new();
        let mut counts: Vec<usize> = Vec::new();
        let mut pixel_bucket = Vec::with_capacity(total);

        for y in 0..img.h {
            for x in 0..img.w {
                let [r, g, b] = img.rgb(x, y);
                let key = [(r >> bits) << bits, (g >> bits) << bits, (b >> bits) << bits];
                let idx = *index_of.entry(key).or_insert_with(|| {
                    tags.push(key);
                    counts.push(0);
                    (tags.len() - 1) as u32
                });
                counts[idx as usize] += 1;
                pixel_bucket.push(idx);
            }
            ctx.tick(Stage::Quantize, y * img.w, total * 2)?;
        }

        let space = self.opts.color_space;
        let points = tags
            .iter()
            .zip(&counts)
            .map(|(&tag, &count)| ClusterPoint {
                values: space.from_rgb(tag),
                weight: count as f64 / total as f64,
                tag,
            })
            .collect();
        Ok((points, pixel_bucket))
    }

    fn final_color(&self, centroid: [f64; 3]) -> Rgb {
        let rgb = self.opts.color_space.to_rgb(centroid);
        match &self.opts.restricted_colors {
            Some(allowed) if !allowed.is_empty() => nearest_restricted(rgb, allowed),
            _ => rgb,
        }
    }
}

/// Closest allowed colour in LAB space; the first entry wins ties.
pub fn nearest_restricted(rgb: Rgb, allowed: &[Rgb]) -> Rgb {
    let lab = rgb_to_lab(rgb);
    let mut best = (rgb, f64::INFINITY);
    for &candidate in allowed {
        let d = distance_sq(&lab, &rgb_to_lab(candidate));
        if d < best.1 {
            best = (candidate, d);
        }
    }
    best.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tone(w: usize, h: usize, split: usize) -> Vec<u8> {
        let mut data = Vec::with_capacity(w * h * 4);
        for _y in 0..h {
            for x in 0..w {
                let c = if x < split { [200, 40, 40, 255] } else { [20, 60, 220, 255] };
                data.extend_from_slice(&c);
            }
        }
        data
    }

    #[test]
    fn two_colors_recovered_exactly() {
        let data = two_tone(6, 4, 2);
        let img = RgbaImage::new(6, 4, &data).expect("valid image");
        let q = ColorQuantizer::new(QuantizeOptions {
            k: 2,
            bits_to_chop: 0,
            ..Default::default()
        });
        let out = q.quantize(&img, &mut RunContext::default()).expect("quantized");
        let mut colors = out.palette.colors.clone();
        colors.sort();
        assert_eq!(colors, vec![[20, 60, 220], [200, 40, 40]]);
        let left = out.color_indices.at(0, 0);
        let right = out.color_indices.at(5, 3);
        assert_ne!(left, right);
        assert_eq!(out.palette.colors[left as usize], [200, 40, 40]);
    }

    #[test]
    fn restriction_snaps_and_dedupes() {
        let data = two_tone(4, 4, 2);
        let img = RgbaImage::new(4, 4, &data).expect("valid image");
        let q = ColorQuantizer::new(QuantizeOptions {
            k: 2,
            bits_to_chop: 0,
            restricted_colors: Some(vec![[0, 0, 0], [128, 128, 128]]),
            ..Default::default()
        });
        let out = q.quantize(&img, &mut RunContext::default()).expect("quantized");
        assert!(out.palette.len() <= 2);
        for c in &out.palette.colors {
            assert!(c == &[0, 0, 0] || c == &[128, 128, 128], "unexpected {c:?}");
        }
    }

    #[test]
    fn empty_image_is_degenerate() {
        let img = RgbaImage::new(0, 3, &[]).expect("valid empty view");
        let q = ColorQuantizer::new(QuantizeOptions::default());
        let err = q
            .quantize(&img, &mut RunContext::default())
            .expect_err("degenerate");
        assert!(matches!(err, PipelineError::DegenerateInput(_)));
    }

    #[test]
    fn distance_matrix_is_symmetric() {
        let palette = Palette {
            colors: vec![[0, 0, 0], [3, 4, 0], [255, 255, 255]],
        };
        let m = palette.distance_matrix();
        assert_eq!(m[0][1], 25.0);
        assert_eq!(m[1][0], 25.0);
        assert_eq!(m[2][2], 0.0);
    }
}
