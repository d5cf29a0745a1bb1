use super::{RankModel, Recommender};
use crate::algo::srw::{check_convergence, ConvergencePolicy};
use crate::algo::walk::{stationary_distribution, Transition};
use crate::{AdjacencyMatrix, Entity, EntityKind, Error, Result, SocialGraph};
use serde::{Deserialize, Serialize};

/// `PersonalRank` configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersonalRankConfig {
    /// Probability of following an edge; the walk restarts at the user with
    /// probability `1 - alpha`.
    pub alpha: f64,
    /// Power-iteration cap per ranking.
    pub max_steps: usize,
    /// Max-absolute change between iterations below which the walk stops.
    pub epsilon: f64,
    /// Whether hitting `max_steps` warns or fails the ranking.
    pub policy: ConvergencePolicy,
}

impl Default for PersonalRankConfig {
    fn default() -> Self {
        Self {
            alpha: 0.85,
            max_steps: 10,
            epsilon: 0.01,
            policy: ConvergencePolicy::Warn,
        }
    }
}

impl PersonalRankConfig {
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_policy(mut self, policy: ConvergencePolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Personalized PageRank from the query user over the whole training graph.
///
/// Repositories rank by their visiting probability. Extra relation graphs
/// (a follow graph, say) can be merged into the walk structure with
/// [`with_graph`](Self::with_graph).
#[derive(Debug, Clone, Default)]
pub struct PersonalRank {
    pub config: PersonalRankConfig,
    extra_graphs: Vec<SocialGraph>,
}

impl PersonalRank {
    pub fn new(config: PersonalRankConfig) -> Self {
        Self {
            config,
            extra_graphs: Vec::new(),
        }
    }

    /// Also walk along the edges of `graph`.
    pub fn with_graph(mut self, graph: SocialGraph) -> Self {
        self.extra_graphs.push(graph);
        self
    }
}

struct PersonalRankModel {
    graph: SocialGraph,
    adjacency: AdjacencyMatrix,
    transition: Transition,
    config: PersonalRankConfig,
}

impl Recommender for PersonalRank {
    fn name(&self) -> String {
        format!("personal_rank(alpha={})", self.config.alpha)
    }

    fn train(&self, graph: &SocialGraph) -> Result<Box<dyn RankModel>> {
        if !(0.0..=1.0).contains(&self.config.alpha) {
            return Err(Error::InvalidConfig(format!(
                "alpha must lie in [0, 1], got {}",
                self.config.alpha
            )));
        }
        let mut walk_graph = graph.clone();
        for extra in &self.extra_graphs {
            walk_graph.extend_edges(extra);
        }
        let adjacency = AdjacencyMatrix::new(&walk_graph, None);
        let transition = Transition::new(adjacency.matrix());
        Ok(Box::new(PersonalRankModel {
            graph: graph.clone(),
            adjacency,
            transition,
            config: self.config,
        }))
    }
}

impl RankModel for PersonalRankModel {
    fn graph(&self) -> &SocialGraph {
        &self.graph
    }

    fn rank(&self, user: &Entity, _rng: &mut dyn rand::RngCore) -> Result<Vec<(Entity, f64)>> {
        let Some(root) = self.adjacency.node_index(user) else {
            return Ok(Vec::new());
        };
        let (p, convergence) = stationary_distribution(
            &self.transition,
            root,
            1.0 - self.config.alpha,
            self.config.max_steps,
            self.config.epsilon,
        );
        check_convergence(&convergence, "personal rank", self.config.policy)?;

        Ok(self
            .adjacency
            .nodes()
            .iter()
            .zip(p)
            .filter(|(node, _)| node.is_a(EntityKind::Repository))
            .map(|(node, score)| (node.clone(), score))
            .collect())
    }
}
