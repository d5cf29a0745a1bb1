//! Numeric features for nodes and edges.
//!
//! Node-level sources:
//! - [`NodeFeature`] - fixed attribute keys of users or repositories
//! - [`LanguageVector`] - bag of languages per repository
//! - [`DescriptionVector`] / [`DescriptionTopics`] - tf-idf and NMF topics of descriptions
//! - [`follow_features`] - follower/followee incidence per user
//!
//! Edge-level extractors implement [`EdgeFeature`] and are concatenated by
//! [`CombinedFeature`] into the `E × M` matrix used by the supervised random walk.
//!
//! Missing entities always map to all-zero rows of the expected width.

mod edge;
mod language;
mod node;
mod relation;
mod text;

pub use edge::{
    standardize_columns, CombinedFeature, ConstantFeature, EdgeAttributeFeature, EdgeFeature,
    NodeAttributeFeature, SimilarityFeature,
};
pub use language::LanguageVector;
pub use node::{NodeFeature, REPOSITORY_FEATURE_KEYS, USER_FEATURE_KEYS};
pub use relation::follow_features;
pub use text::{tokenize, DescriptionOptions, DescriptionTopics, DescriptionVector};

use crate::graph::Attributes;
use crate::{EntityId, Error, Result, SocialGraph};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Loaded entity records keyed by id (accounts or repositories).
pub type EntityTable = HashMap<EntityId, Attributes>;

/// Language name -> byte count, per repository.
pub type LanguageTable = HashMap<EntityId, BTreeMap<String, f64>>;

/// Free-text description per repository.
pub type DescriptionTable = HashMap<EntityId, String>;

/// Feature groups available to the supervised random walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    /// Co-interaction structure: the incidence matrix seen from both sides.
    Behavior,
    /// Repository languages and descriptions.
    Content,
    /// Follower and followee sets of users.
    Relation,
    /// Raw account and repository attributes on user–repository edges.
    Attribute,
}

impl FeatureType {
    pub fn as_str(self) -> &'static str {
        match self {
            FeatureType::Behavior => "behavior",
            FeatureType::Content => "content",
            FeatureType::Relation => "relation",
            FeatureType::Attribute => "attribute",
        }
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "behavior" => Ok(FeatureType::Behavior),
            "content" => Ok(FeatureType::Content),
            "relation" => Ok(FeatureType::Relation),
            "attribute" => Ok(FeatureType::Attribute),
            other => Err(Error::UnknownFeatureType(other.to_string())),
        }
    }
}

/// External data the feature groups draw from.
#[derive(Debug, Clone, Default)]
pub struct FeatureSources {
    pub accounts: Option<EntityTable>,
    pub repositories: Option<EntityTable>,
    pub languages: Option<LanguageTable>,
    pub descriptions: Option<DescriptionTable>,
    pub description_options: DescriptionOptions,
    pub follow_graph: Option<SocialGraph>,
}

impl FeatureSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(mut self, accounts: EntityTable) -> Self {
        self.accounts = Some(accounts);
        self
    }

    pub fn with_repositories(mut self, repositories: EntityTable) -> Self {
        self.repositories = Some(repositories);
        self
    }

    pub fn with_languages(mut self, languages: LanguageTable) -> Self {
        self.languages = Some(languages);
        self
    }

    pub fn with_descriptions(mut self, descriptions: DescriptionTable) -> Self {
        self.descriptions = Some(descriptions);
        self
    }

    pub fn with_description_options(mut self, options: DescriptionOptions) -> Self {
        self.description_options = options;
        self
    }

    pub fn with_follow_graph(mut self, graph: SocialGraph) -> Self {
        self.follow_graph = Some(graph);
        self
    }
}
