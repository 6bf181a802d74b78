//! Weighted Lloyd k-means over small fixed-dimension points.
use crate::color::distance_sq;
use crate::types::Rgb;
use rand::Rng;

/// Colour bucket fed to the clustering: position in the working colour space,
/// relative frequency and the coarsened RGB it was built from.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterPoint {
    pub values: [f64; 3],
    pub weight: f64,
    pub tag: Rgb,
}

#[derive(Clone, Debug)]
pub struct KMeans {
    centroids: Vec<[f64; 3]>,
    assignment: Vec<usize>,
    iterations: usize,
}

impl KMeans {
    /// Seed `k` centroids with distinct points drawn by `rng`. Fewer than `k`
    /// centroids are created when there are fewer distinct points.
    pub fn new<R: Rng + ?Sized>(points: &[ClusterPoint], k: usize, rng: &mut R) -> Self {
        let k = k.min(points.len());
        let centroids = rand::seq::index::sample(rng, points.len(), k)
            .iter()
            .map(|i| points[i].values)
            .collect();
        Self {
            centroids,
            assignment: vec![0; points.len()],
            iterations: 0,
        }
    }

    pub fn from_centroids(centroids: Vec<[f64; 3]>, num_points: usize) -> Self {
        Self {
            centroids,
            assignment: vec![0; num_points],
            iterations: 0,
        }
    }

    pub fn centroids(&self) -> &[[f64; 3]] {
        &self.centroids
    }

    /// Cluster index per input point, as of the latest [`KMeans::assign`].
    pub fn assignment(&self) -> &[usize] {
        &self.assignment
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Nearest centroid by squared distance; the lowest index wins ties.
    pub fn nearest(&self, values: &[f64; 3]) -> usize {
        let mut best = 0usize;
        let mut best_d = f64::INFINITY;
        for (i, c) in self.centroids.iter().enumerate() {
            let d = distance_sq(values, c);
            if d < best_d {
                best_d = d;
                best = i;
            }
        }
        best
    }

    pub fn assign(&mut self, points: &[ClusterPoint]) {
        let assignment = points.iter().map(|p| self.nearest(&p.values)).collect();
        self.assignment = assignment;
    }

    /// One assignment + weighted-update iteration. Returns the summed
    /// euclidean displacement of all centroids. Empty clusters keep their
    /// centroid.
    pub fn step(&mut self, points: &[ClusterPoint]) -> f64 {
        self.assign(points);

        let k = self.centroids.len();
        let mut sums = vec![[0.0f64; 3]; k];
        let mut weights = vec![0.0f64; k];
        for (p, &c) in points.iter().zip(&self.assignment) {
            for d in 0..3 {
                sums[c][d] += p.values[d] * p.weight;
            }
            weights[c] += p.weight;
        }

        let mut delta = 0.0;
        for (i, centroid) in self.centroids.iter_mut().enumerate() {
            if weights[i] <= 0.0 {
                continue;
            }
            let avg = [
                sums[i][0] / weights[i],
                sums[i][1] / weights[i],
                sums[i][2] / weights[i],
            ];
            delta += distance_sq(centroid, &avg).sqrt();
            *centroid = avg;
        }

        self.iterations += 1;
        delta
    }
}
