// policyguard-core/src/domain/anomaly/forest.rs
//
// Unsupervised isolation forest. Each tree isolates points with random
// axis-aligned splits on a random subsample; points that isolate in few
// splits are statistical outliers. Scores follow the standard
// 2^(-E[h(x)] / c(n)) normalization, so higher means more anomalous.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const EULER_MASCHERONI: f64 = 0.577_215_664_901_532_9;

/// Average unsuccessful-search path length in a BST of `n` points.
/// Used both to terminate paths at leaves and to normalize scores.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_MASCHERONI) - 2.0 * (n - 1.0) / n
        }
    }
}

#[derive(Debug, Clone)]
pub struct IsolationForestParams {
    pub trees: usize,
    pub max_samples: usize,
    pub seed: u64,
}

impl Default for IsolationForestParams {
    fn default() -> Self {
        Self {
            trees: 100,
            max_samples: 256,
            seed: 42,
        }
    }
}

#[derive(Debug)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

fn build_node(
    data: &[Vec<f64>],
    indices: &[usize],
    depth: usize,
    height_limit: usize,
    rng: &mut StdRng,
) -> Node {
    if depth >= height_limit || indices.len() <= 1 {
        return Node::Leaf {
            size: indices.len(),
        };
    }

    // Only features that still have spread can split this node.
    let dims = data[indices[0]].len();
    let mut candidates: Vec<(usize, f64, f64)> = Vec::with_capacity(dims);
    for feature in 0..dims {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &i in indices {
            let v = data[i][feature];
            lo = lo.min(v);
            hi = hi.max(v);
        }
        if hi > lo {
            candidates.push((feature, lo, hi));
        }
    }
    if candidates.is_empty() {
        return Node::Leaf {
            size: indices.len(),
        };
    }

    let (feature, lo, hi) = candidates[rng.gen_range(0..candidates.len())];
    let threshold = rng.gen_range(lo..hi);

    let (left, right): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&i| data[i][feature] < threshold);

    Node::Split {
        feature,
        threshold,
        left: Box::new(build_node(data, &left, depth + 1, height_limit, rng)),
        right: Box::new(build_node(data, &right, depth + 1, height_limit, rng)),
    }
}

fn path_length(node: &Node, point: &[f64], depth: f64) -> f64 {
    match node {
        Node::Leaf { size } => depth + average_path_length(*size),
        Node::Split {
            feature,
            threshold,
            left,
            right,
        } => {
            if point[*feature] < *threshold {
                path_length(left, point, depth + 1.0)
            } else {
                path_length(right, point, depth + 1.0)
            }
        }
    }
}

pub struct IsolationForest {
    trees: Vec<Node>,
    sample_size: usize,
}

impl IsolationForest {
    /// Fit on an `n x d` matrix. With a fixed seed the forest, and therefore
    /// the outlier set, is fully deterministic for a given batch.
    pub fn fit(data: &[Vec<f64>], params: &IsolationForestParams) -> Self {
        let n = data.len();
        let sample_size = params.max_samples.min(n).max(1);
        let height_limit = (sample_size as f64).log2().ceil().max(1.0) as usize;
        let mut rng = StdRng::seed_from_u64(params.seed);

        let mut trees = Vec::with_capacity(params.trees);
        for _ in 0..params.trees {
            let indices: Vec<usize> = if sample_size < n {
                rand::seq::index::sample(&mut rng, n, sample_size).into_vec()
            } else {
                (0..n).collect()
            };
            trees.push(build_node(data, &indices, 0, height_limit, &mut rng));
        }

        Self { trees, sample_size }
    }

    /// Anomaly score per row, in (0, 1); higher is more anomalous.
    pub fn score_samples(&self, data: &[Vec<f64>]) -> Vec<f64> {
        let normalizer = average_path_length(self.sample_size).max(f64::MIN_POSITIVE);
        data.iter()
            .map(|point| {
                let total: f64 = self
                    .trees
                    .iter()
                    .map(|tree| path_length(tree, point, 0.0))
                    .sum();
                let mean = total / self.trees.len() as f64;
                2f64.powf(-mean / normalizer)
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn clustered_with_outlier() -> Vec<Vec<f64>> {
        let mut data: Vec<Vec<f64>> = (0..60)
            .map(|i| {
                let jitter = (i % 7) as f64 * 3.0;
                vec![10_000.0 + jitter, 9_900.0 + jitter]
            })
            .collect();
        data.push(vec![950_000.0, 980_000.0]);
        data
    }

    #[test]
    fn test_outlier_scores_highest() {
        let data = clustered_with_outlier();
        let forest = IsolationForest::fit(&data, &IsolationForestParams::default());
        let scores = forest.score_samples(&data);
        let outlier = scores[data.len() - 1];
        let max_inlier = scores[..data.len() - 1]
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        assert!(
            outlier > max_inlier,
            "outlier {} not above inliers {}",
            outlier,
            max_inlier
        );
    }

    #[test]
    fn test_fixed_seed_is_deterministic() {
        let data = clustered_with_outlier();
        let params = IsolationForestParams::default();
        let a = IsolationForest::fit(&data, &params).score_samples(&data);
        let b = IsolationForest::fit(&data, &params).score_samples(&data);
        assert_eq!(a, b);
    }

    #[test]
    fn test_constant_data_does_not_loop() {
        let data = vec![vec![5.0, 5.0]; 32];
        let forest = IsolationForest::fit(&data, &IsolationForestParams::default());
        let scores = forest.score_samples(&data);
        assert_eq!(scores.len(), 32);
        // Every point isolates identically.
        assert!(scores.windows(2).all(|w| (w[0] - w[1]).abs() < 1e-12));
    }

    #[test]
    fn test_average_path_length_values() {
        assert_eq!(average_path_length(0), 0.0);
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        // c(256) is roughly 2*(ln(255) + gamma) - 2*255/256
        let c = average_path_length(256);
        assert!((c - 10.244).abs() < 0.01, "c(256) = {}", c);
    }
}
