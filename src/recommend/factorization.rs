use super::{zip_scores, RankModel, Recommender};
use crate::algo::nmf::{factorize, NmfConfig};
use crate::{Bigraph, Entity, EntityKind, Result, SocialGraph};
use ndarray::Array2;
use tracing::debug;

/// Ranks repositories by the dot product of nonnegative account and
/// repository factors of the incidence matrix.
#[derive(Debug, Clone, Copy, Default)]
pub struct NmfRecommender {
    pub config: NmfConfig,
}

impl NmfRecommender {
    pub fn new(config: NmfConfig) -> Self {
        Self { config }
    }
}

struct NmfModel {
    graph: SocialGraph,
    bigraph: Bigraph,
    /// accounts × k
    user_factors: Array2<f64>,
    /// k × repositories
    repository_factors: Array2<f64>,
}

impl Recommender for NmfRecommender {
    fn name(&self) -> String {
        format!("nmf(k={})", self.config.n_components)
    }

    fn train(&self, graph: &SocialGraph) -> Result<Box<dyn RankModel>> {
        let bigraph = Bigraph::new(graph, EntityKind::Account, EntityKind::Repository, None)?;
        let factors = factorize(&bigraph.matrix().to_dense(), &self.config)?;
        debug!(
            iterations = factors.iterations,
            converged = factors.converged,
            error = factors.reconstruction_error,
            "factorized incidence matrix"
        );
        Ok(Box::new(NmfModel {
            graph: graph.clone(),
            bigraph,
            user_factors: factors.w,
            repository_factors: factors.h,
        }))
    }
}

impl RankModel for NmfModel {
    fn graph(&self) -> &SocialGraph {
        &self.graph
    }

    fn rank(&self, user: &Entity, _rng: &mut dyn rand::RngCore) -> Result<Vec<(Entity, f64)>> {
        let Some(u) = self.bigraph.source_index(user) else {
            return Ok(Vec::new());
        };
        let scores = self.user_factors.row(u).dot(&self.repository_factors);
        Ok(zip_scores(self.bigraph.targets(), scores))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommend::recommend;
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    #[test]
    fn test_block_structure_is_recovered() {
        // two communities: users 1-3 on repos 1-3, users 4-6 on repos 4-6
        let mut g = SocialGraph::new_undirected();
        for (users, repos) in [(1u64..=3, 1u64..=3), (4u64..=6, 4u64..=6)] {
            for u in users {
                for r in repos.clone() {
                    if u % 3 != r % 3 {
                        g.add_edge(Entity::user(u), Entity::repository(r), Default::default());
                    }
                }
            }
        }
        let config = NmfConfig::default().with_n_components(2).with_max_iterations(500);
        let model = NmfRecommender::new(config).train(&g).unwrap();
        let mut rng = XorShiftRng::seed_from_u64(0);

        let out = recommend(model.as_ref(), &Entity::user(1), Some(1), &mut rng).unwrap();
        assert_eq!(out, vec![Entity::repository(1)]);
        let out = recommend(model.as_ref(), &Entity::user(5), Some(1), &mut rng).unwrap();
        assert_eq!(out, vec![Entity::repository(5)]);
    }

    #[test]
    fn test_scores_cover_all_repositories() {
        let mut g = SocialGraph::new_undirected();
        g.add_edge(Entity::user(1), Entity::repository(1), Default::default());
        g.add_edge(Entity::user(2), Entity::repository(2), Default::default());
        let model = NmfRecommender::new(NmfConfig::default().with_n_components(1))
            .train(&g)
            .unwrap();
        let mut rng = XorShiftRng::seed_from_u64(0);
        let scores = model.rank(&Entity::user(1), &mut rng).unwrap();
        assert_eq!(scores.len(), 2);
        assert!(scores.iter().all(|(_, s)| *s >= 0.0));
    }
}
