use super::{zip_scores, RankModel, Recommender};
use crate::similarity::{Similarity, SimilarityKind};
use crate::{Bigraph, Entity, EntityKind, Result, SocialGraph};
use serde::{Deserialize, Serialize};

/// Collaborative-filtering settings shared by [`UserCf`] and [`ItemCf`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CfConfig {
    /// Neighbors consulted per vote; `None` uses every other row.
    pub neighbors: Option<usize>,
    /// Kernel comparing incidence rows.
    pub similarity: SimilarityKind,
}

impl CfConfig {
    pub fn with_neighbors(mut self, k: usize) -> Self {
        self.neighbors = Some(k);
        self
    }

    pub fn with_similarity(mut self, similarity: SimilarityKind) -> Self {
        self.similarity = similarity;
        self
    }
}

/// User-based collaborative filtering over the account × repository
/// incidence matrix.
///
/// A repository scores the summed similarity of the nearest accounts that
/// are connected to it.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserCf {
    pub config: CfConfig,
}

/// Item-based collaborative filtering: every repository of the user votes for
/// its nearest repositories with their similarity.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemCf {
    pub config: CfConfig,
}

impl UserCf {
    pub fn new(config: CfConfig) -> Self {
        Self { config }
    }
}

impl ItemCf {
    pub fn new(config: CfConfig) -> Self {
        Self { config }
    }
}

struct CfModel {
    graph: SocialGraph,
    bigraph: Bigraph,
    similarity: Box<dyn Similarity>,
    neighbors: usize,
    item_based: bool,
}

fn train_cf(graph: &SocialGraph, config: &CfConfig, item_based: bool) -> Result<CfModel> {
    let bigraph = Bigraph::new(graph, EntityKind::Account, EntityKind::Repository, None)?;
    let rows = if item_based {
        bigraph.transposed()
    } else {
        bigraph.matrix()
    };
    let similarity = config.similarity.build(rows);
    let neighbors = config.neighbors.unwrap_or(similarity.size());
    Ok(CfModel {
        graph: graph.clone(),
        bigraph,
        similarity,
        neighbors,
        item_based,
    })
}

impl Recommender for UserCf {
    fn name(&self) -> String {
        "user_cf".to_string()
    }

    fn train(&self, graph: &SocialGraph) -> Result<Box<dyn RankModel>> {
        Ok(Box::new(train_cf(graph, &self.config, false)?))
    }
}

impl Recommender for ItemCf {
    fn name(&self) -> String {
        "item_cf".to_string()
    }

    fn train(&self, graph: &SocialGraph) -> Result<Box<dyn RankModel>> {
        Ok(Box::new(train_cf(graph, &self.config, true)?))
    }
}

impl RankModel for CfModel {
    fn graph(&self) -> &SocialGraph {
        &self.graph
    }

    fn rank(&self, user: &Entity, _rng: &mut dyn rand::RngCore) -> Result<Vec<(Entity, f64)>> {
        let Some(u) = self.bigraph.source_index(user) else {
            return Ok(Vec::new());
        };
        let mut scores = vec![0.0; self.bigraph.targets().len()];
        if self.item_based {
            for &r in self.bigraph.source_neighbors(u) {
                for (s, weight) in self.similarity.nearest(r, self.neighbors) {
                    scores[s] += weight;
                }
            }
        } else {
            for (v, weight) in self.similarity.nearest(u, self.neighbors) {
                for &r in self.bigraph.source_neighbors(v) {
                    scores[r] += weight;
                }
            }
        }
        Ok(zip_scores(self.bigraph.targets(), scores))
    }
}
