//! Hyperbolic softmax loss and its ambient gradient.
//!
//! For one sample with target `u`, positive context `c_0` and negatives
//! `c_1..c_k`, the loss is softmax cross entropy over negated scaled
//! distances with the positive in slot 0:
//!
//! ```text
//! loss = -log( exp(-sigma * d(u, c_0)) / sum_j exp(-sigma * d(u, c_j)) )
//! ```
//!
//! The crate consumes no autodiff runtime, so the gradient is closed
//! form: softmax cross entropy composed with the derivative of
//! `d = acosh(-<u,c>_M)`, namely `d' = 1/sqrt(alpha^2 - 1)` at
//! `alpha = -<u,c>_M`. The clamp on `alpha` matches the distance kernel's,
//! which also bounds the derivative's denominator.
//!
//! Gradients returned here are plain Euclidean derivatives with respect
//! to ambient coordinates; converting them to Minkowski ambient vectors
//! (the timelike sign flip) is the optimizer's side of the contract.

use crate::embedding::Embedding;
use crate::manifold::{minkowski_dot, DISTANCE_EPS, MIN_NORM};
use crate::samples::TrainingBatch;
use ndarray::{Array1, Array2, ArrayView1};
use std::collections::HashMap;

/// Ambient gradient for the sparse set of embedding rows a batch touched.
///
/// `indices` are unique and sorted; `grads` row `r` is the accumulated
/// gradient for embedding row `indices[r]`.
#[derive(Debug, Clone)]
pub struct SparseGradient {
    pub indices: Vec<usize>,
    pub grads: Array2<f64>,
}

impl SparseGradient {
    /// An empty gradient (empty batch).
    pub fn empty(ambient_dim: usize) -> Self {
        Self {
            indices: Vec::new(),
            grads: Array2::zeros((0, ambient_dim)),
        }
    }
}

/// Euclidean gradient of `<x, y>_M` with respect to `y`:
/// `(x_0, .., x_{d-1}, -x_d)`.
fn minkowski_grad(x: ArrayView1<f64>) -> Array1<f64> {
    let mut g = x.to_owned();
    let d = g.len() - 1;
    g[d] = -g[d];
    g
}

/// Mean loss over the batch and the gradient of that mean, accumulated
/// per unique touched embedding row.
pub fn loss_and_gradient(
    embedding: &Embedding,
    batch: &TrainingBatch,
    sigma: f64,
) -> (f64, SparseGradient) {
    let ambient = embedding.ambient_dim();
    if batch.is_empty() {
        return (0.0, SparseGradient::empty(ambient));
    }

    let scale = 1.0 / batch.len() as f64;
    let mut total_loss = 0.0;
    let mut acc: HashMap<usize, Array1<f64>> = HashMap::new();

    let mut candidates: Vec<usize> = Vec::new();
    for (sample, (&u, &c)) in batch.targets.iter().zip(&batch.contexts).enumerate() {
        candidates.clear();
        candidates.push(c);
        candidates.extend_from_slice(&batch.negatives[sample]);

        let x_u = embedding.point(u);

        // alpha_j = -<u, c_j>_M clamped to the acosh domain, d_j = acosh(alpha_j)
        let alphas: Vec<f64> = candidates
            .iter()
            .map(|&cand| (-minkowski_dot(x_u, embedding.point(cand))).max(1.0 + DISTANCE_EPS))
            .collect();
        let logits: Vec<f64> = alphas.iter().map(|a| -sigma * a.acosh()).collect();

        // Stable softmax with the positive at slot 0
        let max_logit = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exp_sum: f64 = logits.iter().map(|l| (l - max_logit).exp()).sum();
        total_loss += (max_logit + exp_sum.ln()) - logits[0];

        for (j, &cand) in candidates.iter().enumerate() {
            let p_j = (logits[j] - max_logit).exp() / exp_sum;
            let indicator = if j == 0 { 1.0 } else { 0.0 };
            // d(loss)/d(distance_j), scaled for the batch mean
            let coef = sigma * (indicator - p_j) * scale;
            // d(acosh(alpha))/d(alpha), denominator bounded by the clamp
            let dd = 1.0 / (alphas[j] * alphas[j] - 1.0).sqrt().max(MIN_NORM);

            let x_c = embedding.point(cand);
            acc.entry(u)
                .or_insert_with(|| Array1::zeros(ambient))
                .scaled_add(-(coef * dd), &minkowski_grad(x_c));
            acc.entry(cand)
                .or_insert_with(|| Array1::zeros(ambient))
                .scaled_add(-(coef * dd), &minkowski_grad(x_u));
        }
    }

    let mut indices: Vec<usize> = acc.keys().copied().collect();
    indices.sort_unstable();
    let mut grads = Array2::zeros((indices.len(), ambient));
    for (row, &idx) in indices.iter().enumerate() {
        grads.row_mut(row).assign(&acc[&idx]);
    }

    (total_loss * scale, SparseGradient { indices, grads })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::TrainingBatch;

    fn small_embedding() -> Embedding {
        // Moderate radius keeps pairwise distances away from the clamp,
        // where the finite-difference comparison is well conditioned.
        Embedding::init(6, 3, 0.3, 21).unwrap()
    }

    fn small_batch() -> TrainingBatch {
        TrainingBatch {
            targets: vec![0, 1],
            contexts: vec![1, 2],
            negatives: vec![vec![3, 4], vec![4, 5]],
        }
    }

    #[test]
    fn test_empty_batch() {
        let emb = small_embedding();
        let batch = TrainingBatch {
            targets: vec![],
            contexts: vec![],
            negatives: vec![],
        };
        let (loss, grad) = loss_and_gradient(&emb, &batch, 1.0);
        assert_eq!(loss, 0.0);
        assert!(grad.indices.is_empty());
    }

    #[test]
    fn test_loss_finite_and_positive() {
        let emb = small_embedding();
        let (loss, grad) = loss_and_gradient(&emb, &small_batch(), 1.0);
        assert!(loss.is_finite());
        assert!(loss > 0.0, "softmax NLL over >1 candidates is positive");
        assert!(grad.grads.iter().all(|g| g.is_finite()));
    }

    #[test]
    fn test_gradient_rows_are_touched_union() {
        let emb = small_embedding();
        let (_, grad) = loss_and_gradient(&emb, &small_batch(), 1.0);
        assert_eq!(grad.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(grad.grads.nrows(), 6);
    }

    #[test]
    fn test_gradient_matches_finite_differences() {
        let emb = small_embedding();
        let batch = small_batch();
        let sigma = 1.3;
        let (_, grad) = loss_and_gradient(&emb, &batch, sigma);

        let h = 1e-5;
        for (row, &idx) in grad.indices.iter().enumerate() {
            for col in 0..emb.ambient_dim() {
                let mut plus = emb.points().clone();
                plus[[idx, col]] += h;
                let mut minus = emb.points().clone();
                minus[[idx, col]] -= h;

                let loss_plus =
                    loss_and_gradient(&Embedding::from_points(plus), &batch, sigma).0;
                let loss_minus =
                    loss_and_gradient(&Embedding::from_points(minus), &batch, sigma).0;
                let numeric = (loss_plus - loss_minus) / (2.0 * h);

                let analytic = grad.grads[[row, col]];
                assert!(
                    (numeric - analytic).abs() < 1e-5 * (1.0 + analytic.abs()),
                    "row {idx} col {col}: numeric {numeric:.8} vs analytic {analytic:.8}"
                );
            }
        }
    }

    #[test]
    fn test_closer_positive_means_lower_loss() {
        // Two configurations differing only in how close the positive is.
        let mut near = Embedding::init(3, 2, 0.001, 3).unwrap().points().clone();
        // Push the negative far out
        near[[2, 0]] = 3.0;
        near[[2, 1]] = 0.0;
        let mut far = near.clone();
        // Push the positive far out as well
        far[[1, 0]] = -3.0;
        far[[1, 1]] = 0.0;
        for points in [&mut near, &mut far] {
            for mut row in points.rows_mut() {
                let mut owned = row.to_owned();
                crate::manifold::lift_timelike(&mut owned);
                row.assign(&owned);
            }
        }

        let batch = TrainingBatch {
            targets: vec![0],
            contexts: vec![1],
            negatives: vec![vec![2]],
        };
        let loss_near = loss_and_gradient(&Embedding::from_points(near), &batch, 1.0).0;
        let loss_far = loss_and_gradient(&Embedding::from_points(far), &batch, 1.0).0;
        assert!(loss_near < loss_far);
    }
}
