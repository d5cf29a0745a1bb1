use super::{RankModel, Recommender};
use crate::algo::lbfgs::{minimize, LbfgsConfig};
use crate::algo::srw::{ConvergencePolicy, SrwObjective, SrwParams};
use crate::features::{
    follow_features, CombinedFeature, ConstantFeature, DescriptionVector, EdgeAttributeFeature,
    EdgeFeature, FeatureSources, FeatureType, LanguageVector, NodeAttributeFeature, NodeFeature,
    SimilarityFeature,
};
use crate::similarity::{BigraphSimilarity, Side};
use crate::{AdjacencyMatrix, Bigraph, Entity, EntityKind, Error, Result, SocialGraph};
use ndarray::Array2;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Supervised random walk configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SrwConfig {
    /// Restart probability at the query user.
    pub alpha: f64,
    /// Iteration cap of every stationary and derivative solve.
    pub max_steps: usize,
    /// Regularization weight of the ranking loss.
    pub lambda: f64,
    /// Max-absolute change below which a solve counts as converged.
    pub epsilon: f64,
    /// Temperature of the pairwise sigmoid loss.
    pub loss_width: f64,
    /// Edge attributes used directly as features (1 when absent).
    pub weight_keys: Vec<String>,
    /// Feature groups added after the constant and weight columns.
    pub feature_types: Vec<FeatureType>,
    /// Clip edge scores to `±strength_clip` before the sigmoid.
    pub strength_clip: Option<f64>,
    /// Whether a solve hitting `max_steps` warns or fails the ranking.
    pub non_convergence: ConvergencePolicy,
    /// Z-score the combined edge features.
    pub standardize: bool,
    /// Settings of the per-user weight fit.
    pub optimizer: LbfgsConfig,
    /// Spread the per-dimension derivative solves over the rayon pool.
    pub parallel: bool,
}

impl Default for SrwConfig {
    fn default() -> Self {
        Self {
            alpha: 0.85,
            max_steps: 100,
            lambda: 0.01,
            epsilon: 0.01,
            loss_width: 1.0,
            weight_keys: Vec::new(),
            feature_types: Vec::new(),
            strength_clip: Some(30.0),
            non_convergence: ConvergencePolicy::Warn,
            standardize: true,
            optimizer: LbfgsConfig::default(),
            parallel: false,
        }
    }
}

impl SrwConfig {
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_loss_width(mut self, loss_width: f64) -> Self {
        self.loss_width = loss_width;
        self
    }

    pub fn with_weight_key(mut self, key: impl Into<String>) -> Self {
        self.weight_keys.push(key.into());
        self
    }

    pub fn with_feature_types(mut self, types: impl IntoIterator<Item = FeatureType>) -> Self {
        self.feature_types = types.into_iter().collect();
        self
    }

    pub fn with_strength_clip(mut self, clip: Option<f64>) -> Self {
        self.strength_clip = clip;
        self
    }

    pub fn with_non_convergence(mut self, policy: ConvergencePolicy) -> Self {
        self.non_convergence = policy;
        self
    }

    pub fn with_standardize(mut self, standardize: bool) -> Self {
        self.standardize = standardize;
        self
    }

    pub fn with_optimizer(mut self, optimizer: LbfgsConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn params(&self) -> SrwParams {
        SrwParams {
            alpha: self.alpha,
            max_steps: self.max_steps,
            epsilon: self.epsilon,
            lambda: self.lambda,
            loss_width: self.loss_width,
            strength_clip: self.strength_clip,
            policy: self.non_convergence,
            parallel: self.parallel,
        }
    }
}

/// Supervised random walk recommender (Backstrom & Leskovec).
///
/// Training builds the directed walk structure and the edge-feature
/// extractors. Every ranking call fits edge weights for the query user: the
/// user's repositories are positives, an equally sized random sample of the
/// remaining repositories are negatives, and L-BFGS minimizes the pairwise
/// ranking loss of the personalized walk. Repositories then rank by their
/// visiting probability under the learned weights.
#[derive(Debug, Clone, Default)]
pub struct SupervisedRandomWalk {
    pub config: SrwConfig,
    pub sources: FeatureSources,
}

impl SupervisedRandomWalk {
    pub fn new(config: SrwConfig, sources: FeatureSources) -> Self {
        Self { config, sources }
    }

    fn extractors(
        &self,
        graph: &SocialGraph,
        adjacency: &AdjacencyMatrix,
    ) -> Result<Vec<Box<dyn EdgeFeature>>> {
        let mut extractors: Vec<Box<dyn EdgeFeature>> = vec![
            Box::new(ConstantFeature::new(adjacency)),
            Box::new(EdgeAttributeFeature::new(
                graph,
                adjacency,
                &self.config.weight_keys,
            )),
        ];

        let mut types = self.config.feature_types.clone();
        types.sort();
        types.dedup();
        if types.is_empty() {
            return Ok(extractors);
        }

        let bigraph = Bigraph::new(graph, EntityKind::User, EntityKind::Repository, None)?;
        let similarity = |features: Array2<f64>,
                          side: Side,
                          name: &str|
         -> Result<Box<dyn EdgeFeature>> {
            let sim = BigraphSimilarity::new(&bigraph, &features, side)?;
            Ok(Box::new(SimilarityFeature::new(adjacency, &bigraph, sim, name)))
        };

        for feature_type in types {
            match feature_type {
                FeatureType::Behavior => {
                    extractors.push(similarity(
                        bigraph.matrix().to_dense(),
                        Side::Source,
                        "behavior.user",
                    )?);
                    extractors.push(similarity(
                        bigraph.transposed().to_dense(),
                        Side::Target,
                        "behavior.repository",
                    )?);
                }
                FeatureType::Content => {
                    let sources = &self.sources;
                    if sources.languages.is_none() && sources.descriptions.is_none() {
                        return Err(Error::MissingFeatureData(
                            "content features need languages or descriptions".into(),
                        ));
                    }
                    if let Some(languages) = &sources.languages {
                        let vectors = LanguageVector::new(languages, true);
                        extractors.push(similarity(
                            vectors.features_for(bigraph.targets()),
                            Side::Target,
                            "content.languages",
                        )?);
                    }
                    if let Some(descriptions) = &sources.descriptions {
                        let vectors =
                            DescriptionVector::new(descriptions, &sources.description_options);
                        extractors.push(similarity(
                            vectors.features_for(bigraph.targets()),
                            Side::Target,
                            "content.descriptions",
                        )?);
                    }
                }
                FeatureType::Relation => {
                    let follow_graph = self.sources.follow_graph.as_ref().ok_or_else(|| {
                        Error::MissingFeatureData("relation features need a follow graph".into())
                    })?;
                    let (followers, followees) = follow_features(follow_graph, bigraph.sources());
                    extractors.push(similarity(followers, Side::Source, "relation.followers")?);
                    extractors.push(similarity(followees, Side::Source, "relation.followees")?);
                }
                FeatureType::Attribute => {
                    let accounts = self.sources.accounts.clone().unwrap_or_default();
                    let repositories = self.sources.repositories.clone().unwrap_or_default();
                    extractors.push(Box::new(NodeAttributeFeature::new(
                        graph,
                        adjacency,
                        &NodeFeature::user(accounts),
                        &NodeFeature::repository(repositories),
                    )));
                }
            }
        }
        Ok(extractors)
    }
}

struct SrwModel {
    graph: SocialGraph,
    walk_graph: SocialGraph,
    adjacency: AdjacencyMatrix,
    features: CombinedFeature,
    candidates: Vec<usize>,
    config: SrwConfig,
}

impl Recommender for SupervisedRandomWalk {
    fn name(&self) -> String {
        let types: Vec<&str> = self
            .config
            .feature_types
            .iter()
            .map(|t| t.as_str())
            .collect();
        format!("srw[{}]", types.join(","))
    }

    fn train(&self, graph: &SocialGraph) -> Result<Box<dyn RankModel>> {
        let walk_graph = graph.to_directed();
        let adjacency = AdjacencyMatrix::new(&walk_graph, None);
        let extractors = self.extractors(&walk_graph, &adjacency)?;
        let features =
            CombinedFeature::new(&adjacency, extractors).with_standardize(self.config.standardize);
        let candidates = adjacency
            .nodes()
            .iter()
            .enumerate()
            .filter(|(_, node)| node.is_a(EntityKind::Repository))
            .map(|(i, _)| i)
            .collect();
        debug!(
            nodes = adjacency.node_count(),
            edges = adjacency.edge_count(),
            features = ?features.names(),
            "prepared supervised random walk"
        );
        Ok(Box::new(SrwModel {
            graph: graph.clone(),
            walk_graph,
            adjacency,
            features,
            candidates,
            config: self.config.clone(),
        }))
    }
}

impl RankModel for SrwModel {
    fn graph(&self) -> &SocialGraph {
        &self.graph
    }

    fn rank(&self, user: &Entity, rng: &mut dyn RngCore) -> Result<Vec<(Entity, f64)>> {
        let Some(root) = self.adjacency.node_index(user) else {
            return Ok(Vec::new());
        };

        let positives: Vec<usize> = self
            .walk_graph
            .neighbors(user)
            .iter()
            .filter(|n| n.is_a(EntityKind::Repository))
            .filter_map(|n| self.adjacency.node_index(n))
            .collect();
        let seen: HashSet<usize> = positives.iter().copied().collect();
        let others: Vec<usize> = self
            .candidates
            .iter()
            .copied()
            .filter(|c| !seen.contains(c))
            .collect();
        let negatives: Vec<usize> = others
            .choose_multiple(rng, positives.len())
            .copied()
            .collect();
        if positives.is_empty() || negatives.is_empty() {
            return Ok(Vec::new());
        }

        let psi = self.features.feature_matrix(root)?;
        let objective = SrwObjective::new(
            self.adjacency.matrix(),
            &psi,
            root,
            &negatives,
            &positives,
            self.config.params(),
        )?;
        let w0: Vec<f64> = (0..objective.feature_count())
            .map(|_| rng.random::<f64>())
            .collect();
        let fit = minimize(|w| objective.evaluate(w), w0, &self.config.optimizer)?;
        debug!(
            user = %user,
            iterations = fit.iterations,
            evaluations = fit.evaluations,
            termination = ?fit.termination,
            objective = fit.value,
            "fitted edge weights"
        );

        let p = objective.stationary(&fit.x)?;
        Ok(self
            .candidates
            .iter()
            .map(|&c| (self.adjacency.node(c).clone(), p[c]))
            .collect())
    }
}
