//! Offline evaluation of recommenders.
//!
//! An [`Experiment`] splits an observed graph into training and test edges,
//! trains a [`Recommender`](crate::recommend::Recommender) on the training part
//! and asks it for every test user's recommendations. The outcome is a
//! [`Report`], whose JSON form is the exchange format for [`metrics`].
//!
//! ```rust
//! use stargraph::eval::{metrics, Experiment, ExperimentConfig};
//! use stargraph::recommend::ItemCf;
//! use stargraph::{Entity, SocialGraph};
//!
//! let mut g = SocialGraph::new_undirected();
//! for u in 1u64..=4 {
//!     for r in 1u64..=4 {
//!         g.add_edge(Entity::user(u), Entity::repository(r), Default::default());
//!     }
//! }
//! let config = ExperimentConfig::default().with_seed(7);
//! let experiment = Experiment::new(&g, config).unwrap();
//! let report = experiment.run(&ItemCf::default()).unwrap();
//! assert_eq!(report.user_count, 4);
//! let (precision, _recall) = metrics::precision_recall_curve(&report, &[1]);
//! assert_eq!(precision.len(), 1);
//! ```

mod experiment;
pub mod metrics;
mod report;
mod split;

pub use experiment::{Experiment, ExperimentConfig};
pub use report::{RecommendationRecord, Report};
pub use split::split_graph;
