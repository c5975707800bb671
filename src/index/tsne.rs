//! Exact t-SNE down to three dimensions
//!
//! Used by the index builder when the latent space is wider than the index.
//! O(N²) per iteration, which is fine for the dataset sizes indexed in one
//! pass.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Output dimensionality
pub const TSNE_DIM: usize = 3;

/// Iterations during which affinities are exaggerated
const EXAGGERATION_ITERS: usize = 250;

/// Iterations run with the lower momentum
const MOMENTUM_SWITCH_ITER: usize = 250;

/// t-distributed stochastic neighbour embedding
#[derive(Debug, Clone)]
pub struct TSne {
    perplexity: f64,
    learning_rate: f64,
    iterations: usize,
    early_exaggeration: f64,
    seed: u64,
}

impl Default for TSne {
    fn default() -> Self {
        Self {
            perplexity: 30.0,
            learning_rate: 200.0,
            iterations: 1000,
            early_exaggeration: 12.0,
            seed: 0,
        }
    }
}

impl TSne {
    /// Create with the usual defaults (perplexity 30, 1000 iterations)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set perplexity
    #[must_use]
    pub fn with_perplexity(mut self, perplexity: f64) -> Self {
        self.perplexity = perplexity;
        self
    }

    /// Set learning rate
    #[must_use]
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Set iterations
    #[must_use]
    pub fn with_iterations(mut self, iters: usize) -> Self {
        self.iterations = iters;
        self
    }

    /// Set the seed for the initial layout
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Perplexity actually used for `n` points
    ///
    /// Clamped to `(n - 1) / 3` so every point has enough neighbours, and to at
    /// least 1.
    pub fn effective_perplexity(&self, n: usize) -> f64 {
        let max = n.saturating_sub(1) as f64 / 3.0;
        self.perplexity.min(max).max(1.0)
    }

    /// Embed `data` (all rows of equal width) into 3-D
    #[allow(clippy::needless_range_loop)]
    pub fn fit_transform(&self, data: &[Vec<f32>]) -> Vec<[f32; TSNE_DIM]> {
        let n = data.len();
        if n == 0 {
            return Vec::new();
        }
        if n == 1 {
            return vec![[0.0; TSNE_DIM]];
        }

        let p = joint_probabilities(data, self.effective_perplexity(n));

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut y: Vec<[f64; TSNE_DIM]> = (0..n)
            .map(|_| {
                let mut row = [0.0; TSNE_DIM];
                for v in &mut row {
                    *v = gaussian(&mut rng) * 1e-4;
                }
                row
            })
            .collect();
        let mut update = vec![[0.0f64; TSNE_DIM]; n];
        let mut gains = vec![[1.0f64; TSNE_DIM]; n];
        let mut num = vec![0.0f64; n * n];

        for iter in 0..self.iterations {
            let exaggeration = if iter < EXAGGERATION_ITERS {
                self.early_exaggeration
            } else {
                1.0
            };
            let momentum = if iter < MOMENTUM_SWITCH_ITER { 0.5 } else { 0.8 };

            // Student-t kernel in the embedding
            let mut sum_num = 0.0;
            for i in 0..n {
                for j in (i + 1)..n {
                    let v = 1.0 / (1.0 + sq_dist(&y[i], &y[j]));
                    num[i * n + j] = v;
                    num[j * n + i] = v;
                    sum_num += 2.0 * v;
                }
            }
            let sum_num = sum_num.max(f64::MIN_POSITIVE);

            for i in 0..n {
                let mut grad = [0.0f64; TSNE_DIM];
                for j in 0..n {
                    if i == j {
                        continue;
                    }
                    let q = num[i * n + j] / sum_num;
                    let mult = (exaggeration * p[i * n + j] - q) * num[i * n + j];
                    for d in 0..TSNE_DIM {
                        grad[d] += 4.0 * mult * (y[i][d] - y[j][d]);
                    }
                }

                for d in 0..TSNE_DIM {
                    gains[i][d] = if (grad[d] > 0.0) != (update[i][d] > 0.0) {
                        gains[i][d] + 0.2
                    } else {
                        (gains[i][d] * 0.8).max(0.01)
                    };
                    update[i][d] =
                        momentum * update[i][d] - self.learning_rate * gains[i][d] * grad[d];
                }
            }

            for i in 0..n {
                for d in 0..TSNE_DIM {
                    y[i][d] += update[i][d];
                }
            }
            recenter(&mut y);
        }

        y.iter()
            .map(|row| [row[0] as f32, row[1] as f32, row[2] as f32])
            .collect()
    }
}

/// Symmetrised input affinities `P`, flattened row-major `n × n`
#[allow(clippy::needless_range_loop)]
fn joint_probabilities(data: &[Vec<f32>], perplexity: f64) -> Vec<f64> {
    let n = data.len();
    let target_entropy = perplexity.ln();

    let mut dist = vec![0.0f64; n * n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d: f64 = data[i]
                .iter()
                .zip(&data[j])
                .map(|(a, b)| f64::from(a - b).powi(2))
                .sum();
            dist[i * n + j] = d;
            dist[j * n + i] = d;
        }
    }

    let mut p = vec![0.0f64; n * n];
    let mut row = vec![0.0f64; n];
    for i in 0..n {
        // Binary search on the precision beta = 1 / (2σ²)
        let mut beta = 1.0f64;
        let (mut lo, mut hi) = (0.0f64, f64::INFINITY);

        for _ in 0..64 {
            let min_d = (0..n)
                .filter(|&j| j != i)
                .map(|j| dist[i * n + j])
                .fold(f64::INFINITY, f64::min);
            let mut sum = 0.0;
            for j in 0..n {
                row[j] = if j == i {
                    0.0
                } else {
                    (-(dist[i * n + j] - min_d) * beta).exp()
                };
                sum += row[j];
            }
            let sum = sum.max(f64::MIN_POSITIVE);

            let mut entropy = 0.0;
            for j in 0..n {
                row[j] /= sum;
                if row[j] > 1e-12 {
                    entropy -= row[j] * row[j].ln();
                }
            }

            let diff = entropy - target_entropy;
            if diff.abs() < 1e-5 {
                break;
            }
            if diff > 0.0 {
                lo = beta;
                beta = if hi.is_finite() { (beta + hi) / 2.0 } else { beta * 2.0 };
            } else {
                hi = beta;
                beta = (beta + lo) / 2.0;
            }
        }

        p[i * n..(i + 1) * n].copy_from_slice(&row);
    }

    let denom = 2.0 * n as f64;
    for i in 0..n {
        for j in (i + 1)..n {
            let sym = ((p[i * n + j] + p[j * n + i]) / denom).max(1e-12);
            p[i * n + j] = sym;
            p[j * n + i] = sym;
        }
    }
    p
}

fn sq_dist(a: &[f64; TSNE_DIM], b: &[f64; TSNE_DIM]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

fn recenter(y: &mut [[f64; TSNE_DIM]]) {
    let n = y.len() as f64;
    for d in 0..TSNE_DIM {
        let mean = y.iter().map(|row| row[d]).sum::<f64>() / n;
        for row in y.iter_mut() {
            row[d] -= mean;
        }
    }
}

fn gaussian<R: Rng>(rng: &mut R) -> f64 {
    let u1: f64 = rng.random::<f64>().max(1e-10);
    let u2: f64 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dist(a: &[f32; 3], b: &[f32; 3]) -> f32 {
        a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f32>().sqrt()
    }

    #[test]
    fn test_empty_and_single() {
        let tsne = TSne::new();
        assert!(tsne.fit_transform(&[]).is_empty());
        assert_eq!(tsne.fit_transform(&[vec![1.0, 2.0]]), vec![[0.0; 3]]);
    }

    #[test]
    fn test_perplexity_clamped() {
        let tsne = TSne::new().with_perplexity(30.0);
        assert!((tsne.effective_perplexity(10) - 3.0).abs() < 1e-12);
        assert!((tsne.effective_perplexity(1000) - 30.0).abs() < 1e-12);
        assert!((tsne.effective_perplexity(2) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_output_shape_and_finite() {
        let data: Vec<Vec<f32>> = (0..12)
            .map(|i| (0..8).map(|d| ((i * 8 + d) as f32 * 0.37).sin()).collect())
            .collect();
        let y = TSne::new().with_iterations(200).fit_transform(&data);
        assert_eq!(y.len(), 12);
        assert!(y.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn test_separates_two_clusters() {
        let mut data = Vec::new();
        for i in 0..8 {
            let jitter = i as f32 * 0.01;
            data.push(vec![jitter, 0.0, 0.0, 0.0, jitter]);
        }
        for i in 0..8 {
            let jitter = i as f32 * 0.01;
            data.push(vec![10.0 + jitter, 10.0, 10.0, 10.0, 10.0]);
        }
        let y = TSne::new().with_iterations(500).with_seed(3).fit_transform(&data);

        let mean_within: f32 = (1..8).map(|j| dist(&y[0], &y[j])).sum::<f32>() / 7.0;
        let mean_across: f32 = (8..16).map(|j| dist(&y[0], &y[j])).sum::<f32>() / 8.0;
        assert!(
            mean_across > mean_within,
            "across {mean_across} should exceed within {mean_within}"
        );
    }

    #[test]
    fn test_seeded_is_deterministic() {
        let data: Vec<Vec<f32>> = (0..6).map(|i| vec![i as f32, (i * i) as f32, 1.0, 0.5]).collect();
        let tsne = TSne::new().with_iterations(50).with_seed(9);
        assert_eq!(tsne.fit_transform(&data), tsne.fit_transform(&data));
    }
}
