//! Training loop for hyperbolic node embeddings.
//!
//! Drives the full pipeline: random walks -> positive pairs + negative
//! distribution -> per-epoch shuffled batches -> loss/gradient ->
//! Riemannian update. Two execution modes:
//!
//! - **synchronous**: batches are built inline, single threaded
//! - **streaming**: `workers` producer threads build batches from shards
//!   of the shuffled positives and feed a bounded queue; the single
//!   consumer applies updates in arrival order. The queue capacity is the
//!   backpressure bound; a failed producer aborts the epoch with an error
//!   instead of silently dropping its batches.
//!
//! The embedding is owned by [`train`] and mutated only on the consumer
//! side - single-writer discipline even when production is parallel.

use crate::embedding::Embedding;
use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::loss::loss_and_gradient;
use crate::optimizer::ExponentialSgd;
use crate::samples::{build_batch, extract_positives, NegativeSampler, TrainingBatch};
use crate::walks::{generate_walks, WalkConfig};
use ndarray::Array2;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;

/// Training configuration.
///
/// Defaults: learning rate 0.3, 5 epochs, batch size 32, 10 negatives,
/// context 3, sigma 1, 2-dimensional embeddings, 10 walks of length 80
/// per node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Spacelike embedding dimension (ambient points have `dim + 1` coords).
    pub dim: usize,
    /// Riemannian SGD step size.
    pub learning_rate: f64,
    /// Number of passes over the positive samples.
    pub epochs: usize,
    /// Positive pairs per batch.
    pub batch_size: usize,
    /// Negatives drawn per positive pair.
    pub num_negatives: usize,
    /// Context window radius for positive extraction.
    pub context_size: usize,
    /// Distance bandwidth of the softmax loss.
    pub sigma: f64,
    /// Clip on the Minkowski norm of each optimizer step.
    pub max_grad_norm: f64,
    /// Exponent applied to visitation counts for the negative distribution.
    pub smoothing: f64,
    /// Ball-model radius for embedding initialization.
    pub init_radius: f64,
    /// Master random seed.
    pub seed: u64,
    /// Print per-epoch loss to stderr.
    pub verbose: bool,
    /// Build batches on worker threads feeding a bounded queue.
    pub streaming: bool,
    /// Number of producer threads in streaming mode.
    pub workers: usize,
    /// Bounded-queue capacity in streaming mode.
    pub queue_capacity: usize,
    /// Random-walk parameters.
    pub walk: WalkConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            dim: 2,
            learning_rate: 0.3,
            epochs: 5,
            batch_size: 32,
            num_negatives: 10,
            context_size: 3,
            sigma: 1.0,
            max_grad_norm: f64::INFINITY,
            smoothing: 0.75,
            init_radius: 1e-3,
            seed: 0,
            verbose: false,
            streaming: false,
            workers: 2,
            queue_capacity: 10,
            walk: WalkConfig::default(),
        }
    }
}

impl TrainConfig {
    pub fn with_dim(mut self, dim: usize) -> Self {
        self.dim = dim;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_negative_samples(mut self, k: usize) -> Self {
        self.num_negatives = k;
        self
    }

    pub fn with_context_size(mut self, context_size: usize) -> Self {
        self.context_size = context_size;
        self
    }

    pub fn with_sigma(mut self, sigma: f64) -> Self {
        self.sigma = sigma;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.walk.seed = seed;
        self
    }

    pub fn with_walk(mut self, walk: WalkConfig) -> Self {
        self.walk = walk;
        self
    }

    pub fn with_streaming(mut self, workers: usize) -> Self {
        self.streaming = true;
        self.workers = workers;
        self
    }

    /// Fail fast on configurations that would silently degrade training.
    pub fn validate(&self, graph: &Graph) -> Result<()> {
        if graph.node_count() == 0 {
            return Err(Error::EmptyGraph);
        }
        if self.dim == 0 {
            return Err(Error::Config("embedding dimension must be >= 1".into()));
        }
        if self.epochs == 0 {
            return Err(Error::Config("epochs must be >= 1".into()));
        }
        if self.batch_size == 0 {
            return Err(Error::Config("batch size must be >= 1".into()));
        }
        if self.num_negatives == 0 {
            return Err(Error::Config("need at least one negative sample".into()));
        }
        if self.context_size == 0 {
            return Err(Error::Config("context size must be >= 1".into()));
        }
        if self.context_size >= self.walk.walk_length {
            return Err(Error::Config(format!(
                "context size {} must be smaller than walk length {}",
                self.context_size, self.walk.walk_length
            )));
        }
        if self.walk.num_walks == 0 || self.walk.walk_length < 2 {
            return Err(Error::Config("walks must have num_walks >= 1, length >= 2".into()));
        }
        if !(self.learning_rate > 0.0) {
            return Err(Error::Config("learning rate must be positive".into()));
        }
        if !(self.sigma > 0.0) {
            return Err(Error::Config("sigma must be positive".into()));
        }
        if !(self.max_grad_norm > 0.0) {
            return Err(Error::Config("max gradient norm must be positive".into()));
        }
        if !(self.walk.p > 0.0 && self.walk.q > 0.0) {
            return Err(Error::Config("walk parameters p and q must be positive".into()));
        }
        if self.smoothing < 0.0 {
            return Err(Error::Config("smoothing exponent must be non-negative".into()));
        }
        if !(self.init_radius > 0.0 && self.init_radius < 1.0) {
            return Err(Error::Config("init radius must lie in (0, 1)".into()));
        }
        if self.streaming && self.workers == 0 {
            return Err(Error::Config("streaming mode needs at least one worker".into()));
        }
        if self.streaming && self.queue_capacity == 0 {
            return Err(Error::Config("streaming queue capacity must be >= 1".into()));
        }
        Ok(())
    }
}

/// Result of a training run.
#[derive(Debug, Clone)]
pub struct TrainingResult {
    /// Final node embeddings on the hyperboloid.
    pub embedding: Embedding,
    /// Mean batch loss per epoch.
    pub loss_history: Vec<f64>,
    /// Per-node feature vectors, passed through untouched for downstream
    /// consumers. The geometry/sampling core never reads them.
    pub features: Option<Array2<f64>>,
}

/// Train hyperbolic node embeddings for `graph`.
pub fn train(
    graph: &Graph,
    features: Option<Array2<f64>>,
    config: &TrainConfig,
) -> Result<TrainingResult> {
    config.validate(graph)?;

    let walks = generate_walks(graph, &config.walk);
    let mut positives = extract_positives(&walks, config.context_size, graph.directed_edges());
    if positives.is_empty() {
        return Err(Error::NoPositiveSamples);
    }

    let sampler = NegativeSampler::from_walks(graph.node_count(), &walks, config.smoothing)?;
    let mut embedding = Embedding::init(graph.node_count(), config.dim, config.init_radius, config.seed)?;
    let optimizer = ExponentialSgd::new(config.learning_rate, config.max_grad_norm);

    let mut shuffle_rng = StdRng::seed_from_u64(config.seed.wrapping_add(1));
    let mut loss_history = Vec::with_capacity(config.epochs);

    for epoch in 0..config.epochs {
        positives.shuffle(&mut shuffle_rng);

        let epoch_loss = if config.streaming {
            run_epoch_streaming(&mut embedding, &positives, &sampler, &optimizer, config, epoch)?
        } else {
            run_epoch_sync(&mut embedding, &positives, &sampler, &optimizer, config, epoch)
        };
        loss_history.push(epoch_loss);

        if config.verbose {
            eprintln!(
                "Epoch {}/{}: loss = {:.4}",
                epoch + 1,
                config.epochs,
                epoch_loss
            );
        }
    }

    Ok(TrainingResult {
        embedding,
        loss_history,
        features,
    })
}

fn run_epoch_sync(
    embedding: &mut Embedding,
    positives: &[(usize, usize)],
    sampler: &NegativeSampler,
    optimizer: &ExponentialSgd,
    config: &TrainConfig,
    epoch: usize,
) -> f64 {
    let mut rng = StdRng::seed_from_u64(batch_seed(config.seed, epoch, 0));
    let mut total = 0.0;
    let mut batches = 0usize;

    for chunk in positives.chunks(config.batch_size) {
        let batch = build_batch(chunk, sampler, config.num_negatives, &mut rng);
        let (loss, grad) = loss_and_gradient(embedding, &batch, config.sigma);
        optimizer.apply_sparse(embedding, &grad);
        total += loss;
        batches += 1;
    }

    total / batches.max(1) as f64
}

/// Producer/consumer epoch: `workers` threads build batches from shards of
/// the shuffled positives into a bounded channel; this thread is the sole
/// embedding writer.
///
/// Shutdown paths: producers exit when their shard is exhausted or when
/// the receiver is dropped (send fails); a panicking producer is caught
/// and surfaced as [`Error::Worker`], which aborts the epoch - its
/// remaining batches are discarded, never partially applied.
fn run_epoch_streaming(
    embedding: &mut Embedding,
    positives: &[(usize, usize)],
    sampler: &NegativeSampler,
    optimizer: &ExponentialSgd,
    config: &TrainConfig,
    epoch: usize,
) -> Result<f64> {
    let (tx, rx) = mpsc::sync_channel::<Result<TrainingBatch>>(config.queue_capacity);
    let shard_size = positives.len().div_ceil(config.workers);

    let mut total = 0.0;
    let mut batches = 0usize;
    let mut worker_error: Option<Error> = None;

    thread::scope(|scope| {
        for (worker, shard) in positives.chunks(shard_size).enumerate() {
            let tx = tx.clone();
            scope.spawn(move || {
                let produced = catch_unwind(AssertUnwindSafe(|| {
                    let mut rng = StdRng::seed_from_u64(batch_seed(config.seed, epoch, worker));
                    for chunk in shard.chunks(config.batch_size) {
                        let batch = build_batch(chunk, sampler, config.num_negatives, &mut rng);
                        if tx.send(Ok(batch)).is_err() {
                            // Consumer gone: abandon the rest of the shard
                            return;
                        }
                    }
                }));
                if produced.is_err() {
                    let _ = tx.send(Err(Error::Worker(format!(
                        "batch producer {worker} panicked"
                    ))));
                }
            });
        }
        drop(tx);

        while let Ok(item) = rx.recv() {
            match item {
                Ok(batch) => {
                    let (loss, grad) = loss_and_gradient(embedding, &batch, config.sigma);
                    optimizer.apply_sparse(embedding, &grad);
                    total += loss;
                    batches += 1;
                }
                Err(e) => {
                    worker_error = Some(e);
                    break;
                }
            }
        }
        // Unblocks any producer still waiting on a full queue
        drop(rx);
    });

    match worker_error {
        Some(e) => Err(e),
        None => Ok(total / batches.max(1) as f64),
    }
}

/// Per-(epoch, worker) RNG seed for batch assembly.
fn batch_seed(seed: u64, epoch: usize, worker: usize) -> u64 {
    seed.wrapping_add(0x9e37_79b9)
        .wrapping_mul(epoch as u64 + 1)
        .wrapping_add(worker as u64)
}
