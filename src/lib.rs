//! Hyperbolic node embeddings from biased random walks.
//!
//! Learns low-dimensional node representations on the hyperboloid model
//! of hyperbolic space, such that co-occurrence in random walks maps to
//! small geodesic distance. Hyperbolic space grows exponentially with
//! radius, which matches the neighborhood growth of hierarchical and
//! scale-free graphs that Euclidean space can only embed with distortion.
//!
//! # Pipeline
//!
//! ```text
//! Graph -> walks -> (positive pairs, negative distribution)
//!       -> batches of (target, context, k negatives)
//!       -> hyperbolic softmax loss -> ambient gradient
//!       -> Riemannian SGD (tangent projection + exponential map)
//!       -> Embedding
//! ```
//!
//! # Modules
//!
//! - [`graph`](Graph) - dense-id graph entity over petgraph
//! - [`walks`] - second-order biased random walks (return p, in-out q)
//! - [`samples`] - positive pairs, alias-method negative sampling, batches
//! - [`manifold`] - hyperboloid geometry kernel (pure functions)
//! - [`embedding`] - the trainable point matrix
//! - [`loss`] - hyperbolic softmax loss with closed-form gradients
//! - [`optimizer`] - sparse Riemannian SGD
//! - [`trainer`] - epoch orchestration, synchronous or streaming
//!
//! # Example
//!
//! ```rust
//! use hyperwalk::{train, Graph, TrainConfig, WalkConfig};
//!
//! // A 6-cycle
//! let graph = Graph::from_edges(6, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0)]);
//!
//! let config = TrainConfig::default()
//!     .with_dim(2)
//!     .with_epochs(2)
//!     .with_walk(WalkConfig {
//!         walk_length: 10,
//!         num_walks: 2,
//!         ..Default::default()
//!     });
//!
//! let result = train(&graph, None, &config)?;
//! assert_eq!(result.embedding.num_nodes(), 6);
//! # Ok::<(), hyperwalk::Error>(())
//! ```
//!
//! # References
//!
//! - Nickel & Kiela (2018). "Learning Continuous Hierarchies in the
//!   Lorentz Model of Hyperbolic Geometry"
//! - Grover & Leskovec (2016). "node2vec: Scalable Feature Learning for
//!   Networks"

pub mod embedding;
mod error;
mod graph;
pub mod loss;
pub mod manifold;
pub mod optimizer;
pub mod samples;
pub mod trainer;
pub mod walks;

pub use embedding::Embedding;
pub use error::{Error, Result};
pub use graph::Graph;
pub use loss::{loss_and_gradient, SparseGradient};
pub use optimizer::ExponentialSgd;
pub use samples::{build_batch, extract_positives, AliasTable, NegativeSampler, TrainingBatch};
pub use trainer::{train, TrainConfig, TrainingResult};
pub use walks::{generate_walks, WalkConfig};
