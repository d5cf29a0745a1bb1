use crate::{Entity, EntityId, EntityKind};
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Attribute mapping carried by nodes and edges (e.g. `contributions`, `stargazers_count`).
pub type Attributes = BTreeMap<String, Value>;

/// Numeric view of an attribute value.
///
/// Numbers map to themselves, booleans to 0/1; anything else (null, strings,
/// containers) is falsy and maps to 0.
pub fn scalar(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    entity: Entity,
    attributes: Attributes,
}

/// A social-coding graph: typed entities joined by observed relations.
///
/// Backed by a petgraph `StableDiGraph` so that removing edges never shifts node
/// indices; node iteration order is insertion order. An undirected graph stores
/// each relation once and answers lookups in both directions.
///
/// Derived graphs ([`filter_edges`](Self::filter_edges),
/// [`to_directed`](Self::to_directed), train/test splits) are independent values.
///
/// # Example
///
/// ```rust
/// use stargraph::{Entity, SocialGraph};
///
/// let mut g = SocialGraph::new_undirected();
/// g.add_edge(Entity::user(1), Entity::repository(10), Default::default());
/// g.add_edge(Entity::user(1), Entity::repository(11), Default::default());
///
/// assert_eq!(g.node_count(), 3);
/// assert_eq!(g.neighbors(&Entity::repository(10)), vec![Entity::user(1)]);
/// ```
#[derive(Debug, Clone)]
pub struct SocialGraph {
    graph: StableDiGraph<NodeData, Attributes>,
    index: HashMap<Entity, NodeIndex>,
    directed: bool,
}

impl SocialGraph {
    /// Create an empty graph whose relations have a direction (e.g. follow).
    pub fn new_directed() -> Self {
        Self {
            graph: StableDiGraph::default(),
            index: HashMap::new(),
            directed: true,
        }
    }

    /// Create an empty graph with symmetric relations (star, contribute, ...).
    pub fn new_undirected() -> Self {
        Self {
            directed: false,
            ..Self::new_directed()
        }
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    fn ensure_node(&mut self, entity: &Entity) -> NodeIndex {
        if let Some(&idx) = self.index.get(entity) {
            return idx;
        }
        let idx = self.graph.add_node(NodeData {
            entity: entity.clone(),
            attributes: Attributes::new(),
        });
        self.index.insert(entity.clone(), idx);
        idx
    }

    /// Add a node if absent.
    pub fn add_node(&mut self, entity: Entity) {
        self.ensure_node(&entity);
    }

    /// Add a node if absent and merge `attributes` into its attribute map.
    pub fn add_node_with(&mut self, entity: Entity, attributes: Attributes) {
        let idx = self.ensure_node(&entity);
        self.graph[idx].attributes.extend(attributes);
    }

    fn find_edge(&self, a: NodeIndex, b: NodeIndex) -> Option<petgraph::stable_graph::EdgeIndex> {
        if self.directed {
            self.graph.find_edge(a, b)
        } else {
            self.graph.find_edge_undirected(a, b).map(|(e, _)| e)
        }
    }

    /// Add a relation; attributes of an existing edge are merged, not duplicated.
    pub fn add_edge(&mut self, u: Entity, v: Entity, attributes: Attributes) {
        let a = self.ensure_node(&u);
        let b = self.ensure_node(&v);
        match self.find_edge(a, b) {
            Some(e) => {
                if let Some(existing) = self.graph.edge_weight_mut(e) {
                    existing.extend(attributes);
                }
            }
            None => {
                self.graph.add_edge(a, b, attributes);
            }
        }
    }

    /// Remove a relation, returning its attributes if it existed.
    pub fn remove_edge(&mut self, u: &Entity, v: &Entity) -> Option<Attributes> {
        let a = *self.index.get(u)?;
        let b = *self.index.get(v)?;
        let e = self.find_edge(a, b)?;
        self.graph.remove_edge(e)
    }

    /// Remove every listed relation; missing ones are ignored.
    pub fn remove_edges<'a>(&mut self, edges: impl IntoIterator<Item = &'a (Entity, Entity)>) {
        for (u, v) in edges {
            self.remove_edge(u, v);
        }
    }

    pub fn contains(&self, entity: &Entity) -> bool {
        self.index.contains_key(entity)
    }

    pub fn has_edge(&self, u: &Entity, v: &Entity) -> bool {
        match (self.index.get(u), self.index.get(v)) {
            (Some(&a), Some(&b)) => self.find_edge(a, b).is_some(),
            _ => false,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.graph
            .node_indices()
            .map(move |idx| &self.graph[idx].entity)
    }

    /// All nodes whose kind belongs to `class`, in insertion order.
    pub fn nodes_of_kind(&self, class: EntityKind) -> Vec<Entity> {
        self.nodes().filter(|n| n.is_a(class)).cloned().collect()
    }

    /// Edges as `(u, v, attributes)`; for undirected graphs `u` is the endpoint
    /// the relation was first added from.
    pub fn edges(&self) -> impl Iterator<Item = (&Entity, &Entity, &Attributes)> + '_ {
        self.graph.edge_indices().filter_map(move |e| {
            let (a, b) = self.graph.edge_endpoints(e)?;
            let attrs = self.graph.edge_weight(e)?;
            Some((&self.graph[a].entity, &self.graph[b].entity, attrs))
        })
    }

    /// Owned `(u, v)` pairs in edge order.
    pub fn edge_list(&self) -> Vec<(Entity, Entity)> {
        self.edges()
            .map(|(u, v, _)| (u.clone(), v.clone()))
            .collect()
    }

    pub fn node_attributes(&self, entity: &Entity) -> Option<&Attributes> {
        self.index.get(entity).map(|&idx| &self.graph[idx].attributes)
    }

    pub fn node_attributes_mut(&mut self, entity: &Entity) -> Option<&mut Attributes> {
        let idx = *self.index.get(entity)?;
        Some(&mut self.graph[idx].attributes)
    }

    /// Attributes of the `u`–`v` relation (either direction when undirected).
    pub fn edge_attributes(&self, u: &Entity, v: &Entity) -> Option<&Attributes> {
        let a = *self.index.get(u)?;
        let b = *self.index.get(v)?;
        let e = self.find_edge(a, b)?;
        self.graph.edge_weight(e)
    }

    /// Successors (directed) or adjacent nodes (undirected), ordered by node
    /// insertion order. Unknown entities have no neighbors.
    pub fn neighbors(&self, entity: &Entity) -> Vec<Entity> {
        let Some(&idx) = self.index.get(entity) else {
            return Vec::new();
        };
        let mut adjacent: Vec<NodeIndex> = if self.directed {
            self.graph.neighbors(idx).collect()
        } else {
            self.graph.neighbors_undirected(idx).collect()
        };
        adjacent.sort_unstable();
        adjacent.dedup();
        adjacent
            .into_iter()
            .map(|n| self.graph[n].entity.clone())
            .collect()
    }

    /// In + out degree for directed graphs; incident edge count otherwise.
    pub fn degree(&self, entity: &Entity) -> usize {
        match self.index.get(entity) {
            Some(&idx) => self.graph.neighbors_undirected(idx).count(),
            None => 0,
        }
    }

    /// Directed copy: each undirected relation becomes two opposite edges that
    /// share its attributes. Node order is preserved.
    pub fn to_directed(&self) -> SocialGraph {
        if self.directed {
            return self.clone();
        }
        let mut out = SocialGraph::new_directed();
        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            out.add_node_with(node.entity.clone(), node.attributes.clone());
        }
        for (u, v, attrs) in self.edges() {
            out.add_edge(u.clone(), v.clone(), attrs.clone());
            if u != v {
                out.add_edge(v.clone(), u.clone(), attrs.clone());
            }
        }
        out
    }

    /// New graph with only the edges for which `predicate(u, v, attrs)` holds.
    /// Nodes are kept even when they lose every edge.
    pub fn filter_edges<F>(&self, mut predicate: F) -> SocialGraph
    where
        F: FnMut(&Entity, &Entity, &Attributes) -> bool,
    {
        let rejected: Vec<(Entity, Entity)> = self
            .edges()
            .filter(|(u, v, attrs)| !predicate(u, v, attrs))
            .map(|(u, v, _)| (u.clone(), v.clone()))
            .collect();
        let mut result = self.clone();
        result.remove_edges(&rejected);
        result
    }

    /// Merge the record of every `class` node found in `table` into its
    /// attributes, leaving out the record's own `id`. Returns how many nodes
    /// had a record.
    pub fn merge_node_attributes(
        &mut self,
        table: &HashMap<EntityId, Attributes>,
        class: EntityKind,
    ) -> usize {
        let indices: Vec<NodeIndex> = self.graph.node_indices().collect();
        let mut merged = 0;
        for idx in indices {
            let node = &mut self.graph[idx];
            if !node.entity.is_a(class) {
                continue;
            }
            let Some(record) = table.get(&node.entity.id) else {
                continue;
            };
            node.attributes.extend(
                record
                    .iter()
                    .filter(|(key, _)| key.as_str() != "id")
                    .map(|(key, value)| (key.clone(), value.clone())),
            );
            merged += 1;
        }
        merged
    }

    /// Add every edge of `other` (with attributes) to this graph.
    pub fn extend_edges(&mut self, other: &SocialGraph) {
        for (u, v, attrs) in other.edges() {
            self.add_edge(u.clone(), v.clone(), attrs.clone());
        }
    }
}

/// Free-function form of [`SocialGraph::filter_edges`].
pub fn filter_edges<F>(graph: &SocialGraph, predicate: F) -> SocialGraph
where
    F: FnMut(&Entity, &Entity, &Attributes) -> bool,
{
    graph.filter_edges(predicate)
}

/// Free-function form of [`SocialGraph::nodes_of_kind`].
pub fn nodes_of_type(graph: &SocialGraph, class: EntityKind) -> Vec<Entity> {
    graph.nodes_of_kind(class)
}
