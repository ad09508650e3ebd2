//! Riemannian SGD via tangent projection and exponential map.
//!
//! A Euclidean gradient step leaves the hyperboloid; the correct update
//! converts the ambient gradient into a tangent vector at the current
//! point and walks the geodesic it spans:
//!
//! 1. negate the gradient's timelike component (Euclidean cotangent ->
//!    Minkowski ambient vector)
//! 2. project onto the tangent space at the current point
//! 3. scale by `-learning_rate`
//! 4. exponential map, with the step norm clipped to `max_step_norm`
//!
//! Updates are sparse: a batch only touches the rows named in its
//! gradient; every other embedding row is left byte-identical. There is
//! no dense code path - nothing on the training path produces dense
//! gradients.

use crate::embedding::Embedding;
use crate::loss::SparseGradient;
use crate::manifold;

/// Stochastic Riemannian gradient-descent update rule.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialSgd {
    /// Step size applied to the projected tangent gradient.
    pub learning_rate: f64,
    /// Clip on the Minkowski norm of each step (stability safeguard).
    pub max_step_norm: f64,
}

impl ExponentialSgd {
    /// Create an update rule with the given step size and step-norm clip.
    pub fn new(learning_rate: f64, max_step_norm: f64) -> Self {
        Self {
            learning_rate,
            max_step_norm,
        }
    }

    /// Apply one sparse update, writing back only the touched rows.
    ///
    /// Must be called from a single writer; batch production may be
    /// concurrent, but the embedding write path is serialized by the
    /// trainer.
    pub fn apply_sparse(&self, embedding: &mut Embedding, gradient: &SparseGradient) {
        debug_assert_eq!(gradient.indices.len(), gradient.grads.nrows());

        for (row, &idx) in gradient.indices.iter().enumerate() {
            let mut ambient = gradient.grads.row(row).to_owned();
            let d = ambient.len() - 1;
            ambient[d] = -ambient[d];

            let point = embedding.point(idx).to_owned();
            let tangent = manifold::project_to_tangent(point.view(), ambient.view());
            let step = tangent.mapv(|t| -self.learning_rate * t);
            let updated = manifold::exp_map(point.view(), step.view(), self.max_step_norm);

            embedding.point_mut(idx).assign(&updated);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loss::loss_and_gradient;
    use crate::manifold::minkowski_dot;
    use crate::samples::TrainingBatch;

    fn embedding() -> Embedding {
        Embedding::init(8, 3, 0.3, 13).unwrap()
    }

    fn batch() -> TrainingBatch {
        TrainingBatch {
            targets: vec![0, 2],
            contexts: vec![1, 3],
            negatives: vec![vec![4, 5], vec![5, 6]],
        }
    }

    #[test]
    fn test_untouched_rows_bit_identical() {
        let mut emb = embedding();
        let before = emb.points().clone();

        let (_, grad) = loss_and_gradient(&emb, &batch(), 1.0);
        // Batch touches 0..=6; row 7 must be untouched
        assert!(!grad.indices.contains(&7));

        ExponentialSgd::new(0.1, 1.0).apply_sparse(&mut emb, &grad);

        assert_eq!(emb.points().row(7), before.row(7));
        for &idx in &grad.indices {
            assert_ne!(emb.points().row(idx), before.row(idx));
        }
    }

    #[test]
    fn test_update_stays_on_manifold() {
        let mut emb = embedding();
        let (_, grad) = loss_and_gradient(&emb, &batch(), 1.0);
        ExponentialSgd::new(0.3, 1.0).apply_sparse(&mut emb, &grad);

        for node in 0..emb.num_nodes() {
            let x = emb.point(node);
            assert!((minkowski_dot(x, x) + 1.0).abs() < 1e-12);
            assert!(x[3] > 0.0);
        }
    }

    #[test]
    fn test_steps_reduce_loss() {
        let mut emb = embedding();
        let b = batch();
        let optimizer = ExponentialSgd::new(0.05, 1.0);

        let initial = loss_and_gradient(&emb, &b, 1.0).0;
        for _ in 0..20 {
            let (_, grad) = loss_and_gradient(&emb, &b, 1.0);
            optimizer.apply_sparse(&mut emb, &grad);
        }
        let trained = loss_and_gradient(&emb, &b, 1.0).0;

        assert!(
            trained < initial,
            "loss should fall: {initial:.4} -> {trained:.4}"
        );
    }

    #[test]
    fn test_zero_gradient_is_identity() {
        let mut emb = embedding();
        let before = emb.points().clone();

        let grad = SparseGradient {
            indices: vec![0, 3],
            grads: ndarray::Array2::zeros((2, 4)),
        };
        ExponentialSgd::new(0.5, 1.0).apply_sparse(&mut emb, &grad);

        assert_eq!(emb.points(), &before);
    }
}
