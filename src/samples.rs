//! Training-sample construction from random walks.
//!
//! Two separate responsibilities:
//!
//! - **Positive extraction**: every pair of nodes co-occurring within a
//!   context window of one walk becomes a positive sample. Duplicates are
//!   preserved - pair frequency is the training signal.
//! - **Negative distribution**: node visitation frequency across all
//!   walks, raised to a smoothing exponent (`freq^0.75` by default, the
//!   word2vec convention), realized as an alias table for O(1) draws.
//!
//! Batch assembly is a stateless transformation over a slice of positive
//! samples; shuffling across epochs happens in the trainer.

use crate::error::{Error, Result};
use rand::Rng;
use std::collections::HashSet;

/// Retry bound when sampling negatives with exclusion.
///
/// The exclusion set holds at most the pair's own target and context, so
/// this many consecutive collisions only happens for near-degenerate
/// distributions; the draw then accepts a collision instead of blocking.
pub const MAX_EXCLUSION_RETRIES: usize = 16;

/// Extract windowed positive pairs from walks.
///
/// For each walk position `i`, emits `(walk[i], walk[j])` for every `j`
/// within `context_size` of `i` (clipped to walk bounds, `j != i`).
///
/// With `directed_edges` present, a pair whose *reverse* is a directed
/// edge while the pair itself is not is dropped as
/// orientation-inconsistent; all other pairs are kept symmetrically.
pub fn extract_positives(
    walks: &[Vec<usize>],
    context_size: usize,
    directed_edges: Option<&HashSet<(usize, usize)>>,
) -> Vec<(usize, usize)> {
    let mut positives = Vec::new();
    for walk in walks {
        for i in 0..walk.len() {
            let start = i.saturating_sub(context_size);
            let end = (i + context_size + 1).min(walk.len());
            for j in start..end {
                if j == i {
                    continue;
                }
                let (u, v) = (walk[i], walk[j]);
                if let Some(directed) = directed_edges {
                    if directed.contains(&(v, u)) && !directed.contains(&(u, v)) {
                        continue;
                    }
                }
                positives.push((u, v));
            }
        }
    }
    positives
}

/// Alias table for O(1) sampling from a fixed discrete distribution.
///
/// Built with Vose's method: O(n) preprocessing, then each draw is one
/// uniform index plus one biased coin flip.
#[derive(Debug, Clone)]
pub struct AliasTable {
    prob: Vec<f64>,
    alias: Vec<usize>,
}

impl AliasTable {
    /// Build from unnormalized non-negative weights.
    pub fn new(weights: &[f64]) -> Result<Self> {
        if weights.is_empty() {
            return Err(Error::DegenerateDistribution("no weights".into()));
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(Error::DegenerateDistribution(
                "weights must be finite and non-negative".into(),
            ));
        }
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return Err(Error::DegenerateDistribution("total weight is zero".into()));
        }

        let n = weights.len();
        let mut scaled: Vec<f64> = weights.iter().map(|w| w * n as f64 / total).collect();
        let mut prob = vec![0.0; n];
        let mut alias = vec![0usize; n];

        let mut small: Vec<usize> = Vec::new();
        let mut large: Vec<usize> = Vec::new();
        for (i, &s) in scaled.iter().enumerate() {
            if s < 1.0 {
                small.push(i);
            } else {
                large.push(i);
            }
        }

        loop {
            match (small.pop(), large.pop()) {
                (Some(s), Some(l)) => {
                    prob[s] = scaled[s];
                    alias[s] = l;
                    scaled[l] = (scaled[l] + scaled[s]) - 1.0;
                    if scaled[l] < 1.0 {
                        small.push(l);
                    } else {
                        large.push(l);
                    }
                }
                // A lone leftover is an exactly-1 cell up to round-off
                (Some(i), None) | (None, Some(i)) => prob[i] = 1.0,
                (None, None) => break,
            }
        }

        Ok(Self { prob, alias })
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.prob.len()
    }

    /// True if the table has no categories.
    pub fn is_empty(&self) -> bool {
        self.prob.is_empty()
    }

    /// Draw one category in O(1).
    pub fn sample<R: Rng>(&self, rng: &mut R) -> usize {
        let i = rng.random_range(0..self.prob.len());
        if rng.random::<f64>() < self.prob[i] {
            i
        } else {
            self.alias[i]
        }
    }
}

/// Negative-sample distribution over nodes.
#[derive(Debug, Clone)]
pub struct NegativeSampler {
    table: AliasTable,
}

impl NegativeSampler {
    /// Build from node visitation frequency across walks, smoothed by
    /// `freq^smoothing`.
    pub fn from_walks(node_count: usize, walks: &[Vec<usize>], smoothing: f64) -> Result<Self> {
        let mut counts = vec![0u64; node_count];
        for walk in walks {
            for &node in walk {
                counts[node] += 1;
            }
        }
        let weights: Vec<f64> = counts.iter().map(|&c| (c as f64).powf(smoothing)).collect();
        Ok(Self {
            table: AliasTable::new(&weights)?,
        })
    }

    /// Build directly from unnormalized per-node weights (e.g. degrees).
    pub fn from_weights(weights: &[f64]) -> Result<Self> {
        Ok(Self {
            table: AliasTable::new(weights)?,
        })
    }

    /// Draw one negative node.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> usize {
        self.table.sample(rng)
    }

    /// Draw one negative node, avoiding ids in `exclude`.
    ///
    /// Rejection-resamples up to [`MAX_EXCLUSION_RETRIES`] times, then
    /// accepts a collision - bounded termination over strict exclusion.
    pub fn sample_excluding<R: Rng>(&self, rng: &mut R, exclude: &[usize]) -> usize {
        for _ in 0..MAX_EXCLUSION_RETRIES {
            let candidate = self.table.sample(rng);
            if !exclude.contains(&candidate) {
                return candidate;
            }
        }
        self.table.sample(rng)
    }
}

/// One mini-batch of index tensors. Embedding lookups happen downstream.
#[derive(Debug, Clone)]
pub struct TrainingBatch {
    /// Walk-center node per sample.
    pub targets: Vec<usize>,
    /// Co-occurring context node per sample.
    pub contexts: Vec<usize>,
    /// `k` negatives per sample.
    pub negatives: Vec<Vec<usize>>,
}

impl TrainingBatch {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// True if the batch holds no samples.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Assemble a batch from a slice of positive pairs, drawing `k` negatives
/// per pair (excluding the pair's own endpoints, subject to the bounded
/// retry policy).
pub fn build_batch<R: Rng>(
    positives: &[(usize, usize)],
    sampler: &NegativeSampler,
    num_negatives: usize,
    rng: &mut R,
) -> TrainingBatch {
    let mut targets = Vec::with_capacity(positives.len());
    let mut contexts = Vec::with_capacity(positives.len());
    let mut negatives = Vec::with_capacity(positives.len());

    for &(u, v) in positives {
        targets.push(u);
        contexts.push(v);
        negatives.push(
            (0..num_negatives)
                .map(|_| sampler.sample_excluding(rng, &[u, v]))
                .collect(),
        );
    }

    TrainingBatch {
        targets,
        contexts,
        negatives,
    }
}
