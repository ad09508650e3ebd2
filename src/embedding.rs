//! Embedding storage: one hyperboloid point per node.
//!
//! The embedding matrix is the only mutable, shared, trainable state in
//! the crate. It is initialized once, mutated in place by the optimizer
//! (touched rows only), never resized, and exported at the end of
//! training. Every other entity is read-only once built.

use crate::error::{Error, Result};
use crate::manifold;
use ndarray::{Array2, ArrayView1, ArrayViewMut1};
use rand::prelude::*;
use rand_distr::{Distribution, Uniform};
use std::io::Write;

/// Node embeddings as points on the upper hyperboloid sheet.
///
/// Shape `(num_nodes, dim + 1)`: `dim` spacelike coordinates followed by
/// the timelike one. Row `i` is the embedding of node `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    points: Array2<f64>,
}

impl Embedding {
    /// Initialize embeddings near the manifold origin.
    ///
    /// Samples each node uniformly from `[-r_max, r_max]^dim` in the ball
    /// model and lifts onto the hyperboloid, so the constraint
    /// `<x,x>_M = -1` holds exactly from step zero. `r_max` keeps the
    /// initial points well inside the numerically stable region.
    pub fn init(num_nodes: usize, dim: usize, r_max: f64, seed: u64) -> Result<Self> {
        if num_nodes == 0 {
            return Err(Error::EmptyGraph);
        }
        if dim == 0 {
            return Err(Error::Config("embedding dimension must be >= 1".into()));
        }
        if !(r_max > 0.0 && r_max < 1.0) {
            return Err(Error::Config(format!(
                "init radius must lie in (0, 1), got {r_max}"
            )));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let dist = Uniform::new(-r_max, r_max)
            .map_err(|e| Error::Config(format!("invalid init radius: {e}")))?;

        let mut points = Array2::zeros((num_nodes, dim + 1));
        let mut ball = ndarray::Array1::zeros(dim);
        for mut row in points.rows_mut() {
            for b in ball.iter_mut() {
                *b = dist.sample(&mut rng);
            }
            row.assign(&manifold::ball_to_hyperboloid(ball.view()));
        }

        Ok(Self { points })
    }

    /// Wrap an existing point matrix. Rows are assumed to be on the
    /// hyperboloid already.
    pub fn from_points(points: Array2<f64>) -> Self {
        Self { points }
    }

    /// Number of embedded nodes.
    pub fn num_nodes(&self) -> usize {
        self.points.nrows()
    }

    /// Spacelike dimension (ambient dimension minus one).
    pub fn dim(&self) -> usize {
        self.points.ncols() - 1
    }

    /// Ambient dimension (`dim + 1`).
    pub fn ambient_dim(&self) -> usize {
        self.points.ncols()
    }

    /// The embedding of a node.
    pub fn point(&self, node: usize) -> ArrayView1<f64> {
        self.points.row(node)
    }

    /// Mutable access to one row. Only the optimizer writes through this.
    pub(crate) fn point_mut(&mut self, node: usize) -> ArrayViewMut1<f64> {
        self.points.row_mut(node)
    }

    /// The full point matrix.
    pub fn points(&self) -> &Array2<f64> {
        &self.points
    }

    /// Geodesic distance between two embedded nodes.
    pub fn node_distance(&self, u: usize, v: usize) -> f64 {
        manifold::distance(self.points.row(u), self.points.row(v))
    }

    /// Write one CSV row per node: `node_id,x_0,...,x_dim`.
    ///
    /// Row order matches node ids, so the artifact can be re-indexed by
    /// downstream consumers without a separate mapping.
    pub fn write_csv<W: Write>(&self, mut writer: W) -> Result<()> {
        for (node, row) in self.points.rows().into_iter().enumerate() {
            write!(writer, "{node}")?;
            for value in row.iter() {
                write!(writer, ",{value}")?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }
}
