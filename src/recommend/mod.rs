//! Repository recommenders.
//!
//! A [`Recommender`] is a strategy plus its configuration; [`Recommender::train`]
//! builds a fresh [`RankModel`] from a training graph, so training twice never
//! shares state. The model scores repository candidates for a user and the
//! free function [`recommend`] turns those scores into a ranked list.
//!
//! | Strategy | Type |
//! |----------|------|
//! | shuffled candidates | [`RandomRecommender`] |
//! | user/item collaborative filtering | [`UserCf`], [`ItemCf`] |
//! | nonnegative factorization | [`NmfRecommender`] |
//! | bigraph content similarity | [`ContentBased`] |
//! | personalized PageRank | [`PersonalRank`] |
//! | supervised random walk | [`SupervisedRandomWalk`] |

mod collaborative;
mod content;
mod factorization;
mod naive;
mod personal_rank;
mod supervised;

pub use collaborative::{CfConfig, ItemCf, UserCf};
pub use content::{ContentBased, ContentSource};
pub use factorization::NmfRecommender;
pub use naive::RandomRecommender;
pub use personal_rank::{PersonalRank, PersonalRankConfig};
pub use supervised::{SrwConfig, SupervisedRandomWalk};

use crate::{Entity, Result, SocialGraph};
use rand::RngCore;
use std::collections::HashSet;

/// A recommendation strategy.
pub trait Recommender {
    /// Short identifier used in reports and logs.
    fn name(&self) -> String;

    /// Build all derived state from `graph`.
    fn train(&self, graph: &SocialGraph) -> Result<Box<dyn RankModel>>;
}

/// Trained, read-only state of a recommender.
pub trait RankModel: Send + Sync {
    /// The graph the model was trained on.
    fn graph(&self) -> &SocialGraph;

    /// `(repository, score)` for the candidates of `user`, in the natural
    /// order of the model's ranking structure. Higher scores rank first.
    fn rank(&self, user: &Entity, rng: &mut dyn RngCore) -> Result<Vec<(Entity, f64)>>;
}

/// The best `n` (or all, with `None`) repositories for `user` that the user is
/// not already connected to in the training graph.
///
/// Scores sort descending; ties keep the order given by
/// [`RankModel::rank`]. Users absent from the training graph get an empty list.
pub fn recommend(
    model: &dyn RankModel,
    user: &Entity,
    n: Option<usize>,
    rng: &mut dyn RngCore,
) -> Result<Vec<Entity>> {
    let graph = model.graph();
    if !graph.contains(user) {
        return Ok(Vec::new());
    }
    let seen: HashSet<Entity> = graph.neighbors(user).into_iter().collect();

    let mut ranked: Vec<(Entity, f64)> = model
        .rank(user, rng)?
        .into_iter()
        .filter(|(entity, _)| entity != user && !seen.contains(entity))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    if let Some(n) = n {
        ranked.truncate(n);
    }
    Ok(ranked.into_iter().map(|(entity, _)| entity).collect())
}

/// Pair every entity with its score, in order.
pub(crate) fn zip_scores(
    entities: &[Entity],
    scores: impl IntoIterator<Item = f64>,
) -> Vec<(Entity, f64)> {
    entities.iter().cloned().zip(scores).collect()
}
