use crate::graph::scalar;
use crate::sparse::{CsrMatrix, TripletBuilder};
use crate::{Entity, SocialGraph};
use std::collections::HashMap;

/// Node-ordered sparse adjacency over every node of a (possibly heterogeneous)
/// graph.
///
/// Row and column `i` correspond to `nodes()[i]`, which follows the graph's node
/// order. Undirected relations are stored in both directions. Each stored entry
/// is one directed edge, so edge-level feature matrices are indexed by storage
/// position ([`edges`](Self::edges)).
#[derive(Debug, Clone)]
pub struct AdjacencyMatrix {
    nodes: Vec<Entity>,
    node_indices: HashMap<Entity, usize>,
    matrix: CsrMatrix,
}

impl AdjacencyMatrix {
    /// Build the adjacency; entries hold `weight_key` or 1 when the key is
    /// absent (or no key is given).
    pub fn new(graph: &SocialGraph, weight_key: Option<&str>) -> Self {
        let nodes: Vec<Entity> = graph.nodes().cloned().collect();
        let node_indices: HashMap<Entity, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();

        let n = nodes.len();
        let mut builder = TripletBuilder::with_capacity(n, n, graph.edge_count() * 2);
        for (u, v, attrs) in graph.edges() {
            let weight = weight_key
                .and_then(|key| attrs.get(key))
                .map(scalar)
                .unwrap_or(1.0);
            let (a, b) = (node_indices[u], node_indices[v]);
            builder.push(a, b, weight);
            if !graph.is_directed() && a != b {
                builder.push(b, a, weight);
            }
        }

        Self {
            nodes,
            node_indices,
            matrix: builder.build(),
        }
    }

    pub fn nodes(&self) -> &[Entity] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> &Entity {
        &self.nodes[index]
    }

    pub fn node_index(&self, entity: &Entity) -> Option<usize> {
        self.node_indices.get(entity).copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of stored directed edges.
    pub fn edge_count(&self) -> usize {
        self.matrix.nnz()
    }

    pub fn matrix(&self) -> &CsrMatrix {
        &self.matrix
    }

    /// `(position, row, col)` for every stored edge in CSR order.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        self.matrix
            .entries()
            .enumerate()
            .map(|(pos, (r, c))| (pos, r, c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Attributes;
    use serde_json::json;

    #[test]
    fn test_undirected_is_symmetric() {
        let mut g = SocialGraph::new_undirected();
        let mut a = Attributes::new();
        a.insert("contributions".into(), json!(4));
        g.add_edge(Entity::user(1), Entity::repository(2), a);
        g.add_edge(Entity::user(1), Entity::repository(3), Attributes::new());

        let adj = AdjacencyMatrix::new(&g, Some("contributions"));
        assert_eq!(adj.node_count(), 3);
        assert_eq!(adj.edge_count(), 4);

        let u = adj.node_index(&Entity::user(1)).unwrap();
        let r2 = adj.node_index(&Entity::repository(2)).unwrap();
        let r3 = adj.node_index(&Entity::repository(3)).unwrap();
        assert_eq!(adj.matrix().get(u, r2), 4.0);
        assert_eq!(adj.matrix().get(r2, u), 4.0);
        assert_eq!(adj.matrix().get(r3, u), 1.0);
    }

    #[test]
    fn test_edge_positions_follow_csr_order() {
        let mut g = SocialGraph::new_directed();
        g.add_edge(Entity::user(2), Entity::user(1), Attributes::new());
        g.add_edge(Entity::user(1), Entity::user(2), Attributes::new());

        let adj = AdjacencyMatrix::new(&g, None);
        let edges: Vec<_> = adj.edges().collect();
        assert_eq!(edges, vec![(0, 0, 1), (1, 1, 0)]);
    }
}
