use super::EntityTable;
use crate::graph::scalar;
use crate::{Entity, EntityKind, SocialGraph};
use ndarray::Array2;

/// Account attributes used as user features.
pub const USER_FEATURE_KEYS: &[&str] = &[
    "public_repos",
    "public_gists",
    "followers",
    "following",
    "hireable",
];

/// Repository attributes used as repository features.
pub const REPOSITORY_FEATURE_KEYS: &[&str] = &[
    "fork",
    "open_issues_count",
    "has_wiki",
    "has_downloads",
    "forks_count",
    "has_issues",
    "stargazers_count",
    "size",
];

/// A fixed, ordered list of numeric keys read from a loaded entity record and
/// the graph's node attributes (which take precedence).
///
/// Absent, null or falsy values become 0.0.
#[derive(Debug, Clone)]
pub struct NodeFeature {
    kind: EntityKind,
    keys: Vec<String>,
    records: EntityTable,
}

impl NodeFeature {
    pub fn new<K: Into<String>>(
        kind: EntityKind,
        keys: impl IntoIterator<Item = K>,
        records: EntityTable,
    ) -> Self {
        Self {
            kind,
            keys: keys.into_iter().map(Into::into).collect(),
            records,
        }
    }

    /// User features over [`USER_FEATURE_KEYS`].
    pub fn user(records: EntityTable) -> Self {
        Self::new(EntityKind::User, USER_FEATURE_KEYS.iter().copied(), records)
    }

    /// Repository features over [`REPOSITORY_FEATURE_KEYS`].
    pub fn repository(records: EntityTable) -> Self {
        Self::new(
            EntityKind::Repository,
            REPOSITORY_FEATURE_KEYS.iter().copied(),
            records,
        )
    }

    /// Entity class these features describe.
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn feature_count(&self) -> usize {
        self.keys.len()
    }

    pub fn extract(&self, graph: &SocialGraph, entity: &Entity) -> Vec<f64> {
        let record = self.records.get(&entity.id);
        let node = graph.node_attributes(entity);
        self.keys
            .iter()
            .map(|key| {
                node.and_then(|attrs| attrs.get(key))
                    .or_else(|| record.and_then(|attrs| attrs.get(key)))
                    .map(scalar)
                    .unwrap_or(0.0)
            })
            .collect()
    }

    /// One row per entity, in the given order.
    pub fn matrix(&self, graph: &SocialGraph, entities: &[Entity]) -> Array2<f64> {
        let mut out = Array2::zeros((entities.len(), self.feature_count()));
        for (i, entity) in entities.iter().enumerate() {
            for (j, value) in self.extract(graph, entity).into_iter().enumerate() {
                out[[i, j]] = value;
            }
        }
        out
    }
}
