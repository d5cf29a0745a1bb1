use super::{RankModel, Recommender};
use crate::{Entity, EntityKind, Result, SocialGraph};
use rand::prelude::*;

/// Recommends the repositories of the training graph in random order.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomRecommender;

struct RandomModel {
    graph: SocialGraph,
    repositories: Vec<Entity>,
}

impl Recommender for RandomRecommender {
    fn name(&self) -> String {
        "random".to_string()
    }

    fn train(&self, graph: &SocialGraph) -> Result<Box<dyn RankModel>> {
        Ok(Box::new(RandomModel {
            graph: graph.clone(),
            repositories: graph.nodes_of_kind(EntityKind::Repository),
        }))
    }
}

impl RankModel for RandomModel {
    fn graph(&self) -> &SocialGraph {
        &self.graph
    }

    fn rank(&self, _user: &Entity, rng: &mut dyn RngCore) -> Result<Vec<(Entity, f64)>> {
        let mut order = self.repositories.clone();
        order.shuffle(rng);
        let n = order.len();
        // strictly decreasing scores keep the shuffled order through the sort
        Ok(order
            .into_iter()
            .enumerate()
            .map(|(i, repo)| (repo, (n - i) as f64))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommend::recommend;
    use rand_xorshift::XorShiftRng;
    use std::collections::HashSet;

    fn graph() -> SocialGraph {
        let mut g = SocialGraph::new_undirected();
        g.add_edge(Entity::user(1), Entity::repository(1), Default::default());
        for r in 2u64..=6 {
            g.add_edge(Entity::user(2), Entity::repository(r), Default::default());
        }
        g
    }

    #[test]
    fn test_all_unseen_candidates() {
        let model = RandomRecommender.train(&graph()).unwrap();
        let mut rng = XorShiftRng::seed_from_u64(11);
        let out = recommend(model.as_ref(), &Entity::user(1), None, &mut rng).unwrap();
        let got: HashSet<Entity> = out.into_iter().collect();
        let expected: HashSet<Entity> = (2u64..=6).map(Entity::repository).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_same_seed_same_order() {
        let model = RandomRecommender.train(&graph()).unwrap();
        let a = recommend(
            model.as_ref(),
            &Entity::user(1),
            Some(3),
            &mut XorShiftRng::seed_from_u64(5),
        )
        .unwrap();
        let b = recommend(
            model.as_ref(),
            &Entity::user(1),
            Some(3),
            &mut XorShiftRng::seed_from_u64(5),
        )
        .unwrap();
        assert_eq!(a.len(), 3);
        assert_eq!(a, b);
    }
}
