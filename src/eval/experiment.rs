use super::report::{RecommendationRecord, Report};
use super::split::split_graph;
use crate::recommend::{recommend, RankModel, Recommender};
use crate::{Entity, EntityKind, Error, Result, SocialGraph};
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Experiment configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Report name; defaults to the recommender's name.
    pub name: Option<String>,
    /// Share of edges kept for training.
    pub train_ratio: f64,
    /// Recommendations per user; `None` asks for every candidate.
    pub recommendation_count: Option<usize>,
    /// Seed of the split and of the per-user RNGs; random when unset.
    pub seed: Option<u64>,
    /// Evaluate users on the rayon thread pool.
    pub parallel: bool,
    /// Log progress every this many users.
    pub progress_every: Option<usize>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            name: None,
            train_ratio: 0.8,
            recommendation_count: Some(1),
            seed: None,
            parallel: false,
            progress_every: None,
        }
    }
}

impl ExperimentConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_train_ratio(mut self, train_ratio: f64) -> Self {
        self.train_ratio = train_ratio;
        self
    }

    pub fn with_recommendation_count(mut self, count: Option<usize>) -> Self {
        self.recommendation_count = count;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_progress_every(mut self, every: usize) -> Self {
        self.progress_every = Some(every);
        self
    }
}

/// A fixed train/test split that recommenders are evaluated on.
///
/// The split happens once in [`new`](Self::new), so several recommenders run
/// against the same edges.
#[derive(Debug, Clone)]
pub struct Experiment {
    config: ExperimentConfig,
    seed: u64,
    train: SocialGraph,
    test: SocialGraph,
}

impl Experiment {
    pub fn new(graph: &SocialGraph, config: ExperimentConfig) -> Result<Self> {
        if config.progress_every == Some(0) {
            return Err(Error::InvalidConfig("progress_every must be positive".into()));
        }
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = XorShiftRng::seed_from_u64(seed);
        let (train, test) = split_graph(graph, config.train_ratio, &mut rng)?;
        Ok(Self {
            config,
            seed,
            train,
            test,
        })
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// The seed actually used, drawn at random when none was configured.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn train_graph(&self) -> &SocialGraph {
        &self.train
    }

    pub fn test_graph(&self) -> &SocialGraph {
        &self.test
    }

    /// Train `recommender` on the training edges and recommend for every test
    /// user that has both training and test neighbors.
    pub fn run(&self, recommender: &dyn Recommender) -> Result<Report> {
        let name = self
            .config
            .name
            .clone()
            .unwrap_or_else(|| recommender.name());
        info!(recommender = %name, "training recommender");
        let model = recommender.train(&self.train)?;
        info!(recommender = %name, "training done");

        let users = self.test.nodes_of_kind(EntityKind::User);
        let repos = self.test.nodes_of_kind(EntityKind::Repository);
        info!(users = users.len(), repos = repos.len(), "evaluating");

        let evaluate = |(i, user): (usize, &Entity)| self.evaluate(model.as_ref(), i, user);
        let records: Vec<Option<RecommendationRecord>> = if self.config.parallel {
            users
                .par_iter()
                .enumerate()
                .map(evaluate)
                .collect::<Result<_>>()?
        } else {
            users
                .iter()
                .enumerate()
                .map(evaluate)
                .collect::<Result<_>>()?
        };
        let recommendation: Vec<RecommendationRecord> = records.into_iter().flatten().collect();
        info!(
            recommended = recommendation.len(),
            users = users.len(),
            "finished generating recommendations"
        );

        Ok(Report {
            name: Some(name),
            user_count: users.len(),
            repo_count: repos.len(),
            users,
            repos,
            recommendation,
            recommendation_length: self.config.recommendation_count,
        })
    }

    fn evaluate(
        &self,
        model: &dyn RankModel,
        index: usize,
        user: &Entity,
    ) -> Result<Option<RecommendationRecord>> {
        if let Some(every) = self.config.progress_every {
            if index % every == 0 {
                info!(index, user = %user, "generating recommendations");
            }
        }
        let training = self.train.neighbors(user);
        let groundtruth = self.test.neighbors(user);
        if training.is_empty() || groundtruth.is_empty() {
            return Ok(None);
        }
        let mut rng = self.user_rng(index);
        let recommended = recommend(model, user, self.config.recommendation_count, &mut rng)?;
        Ok(Some(RecommendationRecord {
            user: user.clone(),
            training,
            recommended,
            groundtruth,
        }))
    }

    /// Per-user RNG, independent of evaluation order.
    fn user_rng(&self, index: usize) -> XorShiftRng {
        let mix = (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        XorShiftRng::seed_from_u64(self.seed ^ mix)
    }
}
