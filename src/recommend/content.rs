use super::{zip_scores, RankModel, Recommender};
use crate::algo::nmf::NmfConfig;
use crate::features::{
    follow_features, DescriptionOptions, DescriptionTable, DescriptionTopics, DescriptionVector,
    LanguageTable, LanguageVector,
};
use crate::similarity::{BigraphSimilarity, Side};
use crate::{Bigraph, Entity, EntityKind, Result, SocialGraph};
use ndarray::Array2;

/// Feature source of a [`ContentBased`] recommender.
#[derive(Debug, Clone)]
pub enum ContentSource {
    /// Bag of languages per repository.
    Languages(LanguageTable),
    /// Description vectors per repository.
    Descriptions {
        table: DescriptionTable,
        options: DescriptionOptions,
    },
    /// NMF topics of the description vectors.
    Topics {
        table: DescriptionTable,
        options: DescriptionOptions,
        nmf: NmfConfig,
    },
    /// Who follows each user.
    Followers(SocialGraph),
    /// Whom each user follows.
    Followees(SocialGraph),
    /// The user rows of the incidence matrix itself (quasi user-based CF).
    UserIncidence,
    /// The repository rows of the incidence matrix itself (quasi item-based CF).
    ItemIncidence,
}

impl ContentSource {
    fn name(&self) -> &'static str {
        match self {
            ContentSource::Languages(_) => "languages",
            ContentSource::Descriptions { .. } => "descriptions",
            ContentSource::Topics { .. } => "topics",
            ContentSource::Followers(_) => "followers",
            ContentSource::Followees(_) => "followees",
            ContentSource::UserIncidence => "user_incidence",
            ContentSource::ItemIncidence => "item_incidence",
        }
    }

    /// Feature matrix for one side of the user × repository bigraph.
    fn features(&self, bigraph: &Bigraph) -> Result<(Array2<f64>, Side)> {
        let features = match self {
            ContentSource::Languages(table) => (
                LanguageVector::new(table, true).features_for(bigraph.targets()),
                Side::Target,
            ),
            ContentSource::Descriptions { table, options } => (
                DescriptionVector::new(table, options).features_for(bigraph.targets()),
                Side::Target,
            ),
            ContentSource::Topics {
                table,
                options,
                nmf,
            } => {
                let vectors = DescriptionVector::new(table, options);
                let topics = DescriptionTopics::new(&vectors, nmf)?;
                (topics.features_for(bigraph.targets()), Side::Target)
            }
            ContentSource::Followers(graph) => {
                (follow_features(graph, bigraph.sources()).0, Side::Source)
            }
            ContentSource::Followees(graph) => {
                (follow_features(graph, bigraph.sources()).1, Side::Source)
            }
            ContentSource::UserIncidence => (bigraph.matrix().to_dense(), Side::Source),
            ContentSource::ItemIncidence => (bigraph.transposed().to_dense(), Side::Target),
        };
        Ok(features)
    }
}

/// Ranks repositories by their cosine similarity to the user, with features
/// known on one side of the user × repository bigraph carried to the other
/// side through the incidence matrix.
#[derive(Debug, Clone)]
pub struct ContentBased {
    pub source: ContentSource,
}

impl ContentBased {
    pub fn new(source: ContentSource) -> Self {
        Self { source }
    }
}

struct ContentModel {
    graph: SocialGraph,
    bigraph: Bigraph,
    /// users × repositories
    scores: Array2<f64>,
}

impl Recommender for ContentBased {
    fn name(&self) -> String {
        format!("content({})", self.source.name())
    }

    fn train(&self, graph: &SocialGraph) -> Result<Box<dyn RankModel>> {
        let bigraph = Bigraph::new(graph, EntityKind::User, EntityKind::Repository, None)?;
        let (features, side) = self.source.features(&bigraph)?;
        let similarity = BigraphSimilarity::new(&bigraph, &features, side)?;
        Ok(Box::new(ContentModel {
            graph: graph.clone(),
            scores: similarity.block(Side::Source, Side::Target).clone(),
            bigraph,
        }))
    }
}

impl RankModel for ContentModel {
    fn graph(&self) -> &SocialGraph {
        &self.graph
    }

    fn rank(&self, user: &Entity, _rng: &mut dyn rand::RngCore) -> Result<Vec<(Entity, f64)>> {
        let Some(u) = self.bigraph.source_index(user) else {
            return Ok(Vec::new());
        };
        Ok(zip_scores(
            self.bigraph.targets(),
            self.scores.row(u).iter().copied(),
        ))
    }
}
