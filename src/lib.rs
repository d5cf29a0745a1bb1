#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::module_name_repetitions)]

//! Graph-based repository recommendation for social-coding graphs.
//!
//! A [`SocialGraph`] holds typed entities (users, organizations, repositories,
//! languages) joined by observed relations such as stars, contributions and
//! follows. Recommenders are trained on such a graph and rank, for a user,
//! the repositories the user has not interacted with yet.
//!
//! - [`Bigraph`] - user × repository projection with a sparse incidence matrix
//! - [`similarity`] - Jaccard, cosine and linear similarity engines
//! - [`features`] - node and edge features for content and supervised models
//! - [`algo`] - random walks, the supervised random walk objective, L-BFGS, NMF
//! - [`recommend`] - the [`Recommender`](recommend::Recommender) strategies
//! - [`eval`] - train/test split, experiment reports and ranking metrics
//! - [`io`] - JSON-lines loaders for crawled entity data
//!
//! # Example
//!
//! ```rust
//! use stargraph::recommend::{recommend, ItemCf, Recommender};
//! use stargraph::{Entity, SocialGraph};
//! use rand::SeedableRng;
//! use rand_xorshift::XorShiftRng;
//!
//! let mut g = SocialGraph::new_directed();
//! g.add_node(Entity::user(3));
//! g.add_edge(Entity::user(1), Entity::repository(1), Default::default());
//! g.add_edge(Entity::user(1), Entity::repository(2), Default::default());
//! g.add_edge(Entity::user(2), Entity::repository(2), Default::default());
//! g.add_edge(Entity::user(2), Entity::repository(3), Default::default());
//!
//! let model = ItemCf::default().train(&g).unwrap();
//! let mut rng = XorShiftRng::seed_from_u64(0);
//! let top = recommend(model.as_ref(), &Entity::user(1), Some(1), &mut rng).unwrap();
//! assert_eq!(top, vec![Entity::repository(3)]);
//! ```
//!
//! Iterative solvers log through `tracing`; install a subscriber to see
//! convergence warnings and experiment progress.

mod adjacency;
pub mod algo;
mod bigraph;
mod entity;
mod error;
pub mod eval;
pub mod features;
pub mod graph;
pub mod io;
pub mod recommend;
pub mod similarity;
pub mod sparse;

pub use adjacency::AdjacencyMatrix;
pub use bigraph::Bigraph;
pub use entity::{Entity, EntityId, EntityKind};
pub use error::{Error, Result};
pub use graph::{filter_edges, nodes_of_type, Attributes, SocialGraph};
pub use sparse::{CsrMatrix, TripletBuilder};
