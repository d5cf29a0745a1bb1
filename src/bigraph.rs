//! Bipartite projections of a heterogeneous graph.

use crate::graph::scalar;
use crate::sparse::{CsrMatrix, TripletBuilder};
use crate::{Entity, EntityKind, Error, Result, SocialGraph};
use std::collections::{HashMap, HashSet};

/// Two disjoint node classes of a graph plus the sparse incidence matrix
/// between them.
///
/// `matrix()[i, j]` is the weight of the relation between `sources()[i]` and
/// `targets()[j]` (1 when unweighted), regardless of the edge's direction.
/// Relations whose weight is zero leave no entry, so a stored entry is
/// nonzero exactly when the two nodes are related with nonzero weight.
/// The projection is built eagerly and never changes.
///
/// # Example
///
/// ```rust
/// use stargraph::{Bigraph, Entity, EntityKind, SocialGraph};
///
/// let mut g = SocialGraph::new_undirected();
/// g.add_edge(Entity::user(1), Entity::repository(10), Default::default());
/// g.add_edge(Entity::user(2), Entity::repository(10), Default::default());
///
/// let bg = Bigraph::new(&g, EntityKind::User, EntityKind::Repository, None).unwrap();
/// assert_eq!(bg.shape(), (2, 1));
/// assert_eq!(bg.matrix().get(1, 0), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct Bigraph {
    source_kind: EntityKind,
    target_kind: EntityKind,
    sources: Vec<Entity>,
    targets: Vec<Entity>,
    source_indices: HashMap<Entity, usize>,
    target_indices: HashMap<Entity, usize>,
    matrix: CsrMatrix,
    transposed: CsrMatrix,
}

impl Bigraph {
    /// Project `graph` onto `source_kind` × `target_kind`.
    ///
    /// Fails when the two classes overlap (e.g. `Account` and `User`). Empty
    /// partitions are fine and yield zero rows or columns.
    pub fn new(
        graph: &SocialGraph,
        source_kind: EntityKind,
        target_kind: EntityKind,
        weight_key: Option<&str>,
    ) -> Result<Self> {
        if source_kind.is_a(target_kind) || target_kind.is_a(source_kind) {
            return Err(Error::InvalidConfig(format!(
                "bigraph partitions overlap: {} and {}",
                source_kind, target_kind
            )));
        }

        let sources = graph.nodes_of_kind(source_kind);
        let targets = graph.nodes_of_kind(target_kind);
        let source_indices: HashMap<Entity, usize> = sources
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        let target_indices: HashMap<Entity, usize> = targets
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();

        let mut seen = HashSet::new();
        let mut builder = TripletBuilder::new(sources.len(), targets.len());
        for (u, v, attrs) in graph.edges() {
            let pair = match (
                source_indices.get(u),
                target_indices.get(v),
                source_indices.get(v),
                target_indices.get(u),
            ) {
                (Some(&i), Some(&j), _, _) => (i, j),
                (_, _, Some(&i), Some(&j)) => (i, j),
                _ => continue,
            };
            // both directions of a directed copy map to the same cell
            if !seen.insert(pair) {
                continue;
            }
            let weight = weight_key
                .and_then(|key| attrs.get(key))
                .map(scalar)
                .unwrap_or(1.0);
            if weight != 0.0 {
                builder.push(pair.0, pair.1, weight);
            }
        }

        let matrix = builder.build();
        let transposed = matrix.transpose();
        Ok(Self {
            source_kind,
            target_kind,
            sources,
            targets,
            source_indices,
            target_indices,
            matrix,
            transposed,
        })
    }

    pub fn source_kind(&self) -> EntityKind {
        self.source_kind
    }

    pub fn target_kind(&self) -> EntityKind {
        self.target_kind
    }

    pub fn sources(&self) -> &[Entity] {
        &self.sources
    }

    pub fn targets(&self) -> &[Entity] {
        &self.targets
    }

    pub fn source_index(&self, entity: &Entity) -> Option<usize> {
        self.source_indices.get(entity).copied()
    }

    pub fn target_index(&self, entity: &Entity) -> Option<usize> {
        self.target_indices.get(entity).copied()
    }

    /// `(|sources|, |targets|)`.
    pub fn shape(&self) -> (usize, usize) {
        self.matrix.shape()
    }

    /// Source × target incidence matrix.
    pub fn matrix(&self) -> &CsrMatrix {
        &self.matrix
    }

    /// Target × source incidence matrix.
    pub fn transposed(&self) -> &CsrMatrix {
        &self.transposed
    }

    /// Target indices adjacent to source `i`.
    pub fn source_neighbors(&self, i: usize) -> &[usize] {
        self.matrix.row_indices(i)
    }

    /// Source indices adjacent to target `j`.
    pub fn target_neighbors(&self, j: usize) -> &[usize] {
        self.transposed.row_indices(j)
    }
}
