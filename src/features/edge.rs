use super::NodeFeature;
use crate::graph::scalar;
use crate::similarity::{BigraphSimilarity, Side};
use crate::{AdjacencyMatrix, Bigraph, Error, Result, SocialGraph};
use ndarray::{s, Array2, Axis};

/// Per-edge numeric features over the stored edges of an [`AdjacencyMatrix`].
///
/// Row `e` of [`extract`](Self::extract) describes the edge at storage position
/// `e`; features may depend on the node the walk is rooted at.
pub trait EdgeFeature: Send + Sync {
    /// Column names, one per feature.
    fn names(&self) -> Vec<String>;

    fn feature_count(&self) -> usize {
        self.names().len()
    }

    /// `E × feature_count()` matrix for a walk rooted at node index `root`.
    fn extract(&self, root: usize) -> Array2<f64>;
}

/// A column of ones, the bias term of the edge-strength model.
#[derive(Debug, Clone)]
pub struct ConstantFeature {
    edge_count: usize,
}

impl ConstantFeature {
    pub fn new(adjacency: &AdjacencyMatrix) -> Self {
        Self {
            edge_count: adjacency.edge_count(),
        }
    }
}

impl EdgeFeature for ConstantFeature {
    fn names(&self) -> Vec<String> {
        vec!["constant".to_string()]
    }

    fn extract(&self, _root: usize) -> Array2<f64> {
        Array2::ones((self.edge_count, 1))
    }
}

/// Named scalar attributes read off each edge; absent keys count as 1.
#[derive(Debug, Clone)]
pub struct EdgeAttributeFeature {
    keys: Vec<String>,
    values: Array2<f64>,
}

impl EdgeAttributeFeature {
    pub fn new(graph: &SocialGraph, adjacency: &AdjacencyMatrix, keys: &[String]) -> Self {
        let mut values = Array2::ones((adjacency.edge_count(), keys.len()));
        for (pos, row, col) in adjacency.edges() {
            let Some(attrs) = graph.edge_attributes(adjacency.node(row), adjacency.node(col))
            else {
                continue;
            };
            for (k, key) in keys.iter().enumerate() {
                if let Some(value) = attrs.get(key) {
                    values[[pos, k]] = scalar(value);
                }
            }
        }
        Self {
            keys: keys.to_vec(),
            values,
        }
    }
}

impl EdgeFeature for EdgeAttributeFeature {
    fn names(&self) -> Vec<String> {
        self.keys.clone()
    }

    fn extract(&self, _root: usize) -> Array2<f64> {
        self.values.clone()
    }
}

/// Similarity between the root and the head of each edge.
///
/// For an edge `u -> v` the feature is `similarity(root, v)` when both nodes
/// belong to the bigraph, and 0 otherwise.
#[derive(Debug, Clone)]
pub struct SimilarityFeature {
    name: String,
    node_sides: Vec<Option<(Side, usize)>>,
    heads: Vec<usize>,
    similarity: BigraphSimilarity,
}

impl SimilarityFeature {
    pub fn new(
        adjacency: &AdjacencyMatrix,
        bigraph: &Bigraph,
        similarity: BigraphSimilarity,
        name: impl Into<String>,
    ) -> Self {
        let node_sides = adjacency
            .nodes()
            .iter()
            .map(|node| {
                bigraph
                    .source_index(node)
                    .map(|i| (Side::Source, i))
                    .or_else(|| bigraph.target_index(node).map(|j| (Side::Target, j)))
            })
            .collect();
        Self {
            name: name.into(),
            node_sides,
            heads: adjacency.edges().map(|(_, _, col)| col).collect(),
            similarity,
        }
    }
}

impl EdgeFeature for SimilarityFeature {
    fn names(&self) -> Vec<String> {
        vec![self.name.clone()]
    }

    fn extract(&self, root: usize) -> Array2<f64> {
        let mut out = Array2::zeros((self.heads.len(), 1));
        let Some(from) = self.node_sides.get(root).copied().flatten() else {
            return out;
        };
        for (e, &head) in self.heads.iter().enumerate() {
            if let Some(to) = self.node_sides[head] {
                out[[e, 0]] = self.similarity.score(from, to);
            }
        }
        out
    }
}

/// User and repository attributes concatenated on user–repository edges, in
/// either direction; every other edge is all zero.
#[derive(Debug, Clone)]
pub struct NodeAttributeFeature {
    names: Vec<String>,
    values: Array2<f64>,
}

impl NodeAttributeFeature {
    pub fn new(
        graph: &SocialGraph,
        adjacency: &AdjacencyMatrix,
        source: &NodeFeature,
        target: &NodeFeature,
    ) -> Self {
        let names: Vec<String> = source
            .keys()
            .iter()
            .map(|k| format!("{}.{}", source.kind(), k))
            .chain(target.keys().iter().map(|k| format!("{}.{}", target.kind(), k)))
            .collect();

        let width = source.feature_count();
        let mut values = Array2::zeros((adjacency.edge_count(), names.len()));
        for (pos, row, col) in adjacency.edges() {
            let (mut u, mut v) = (adjacency.node(row), adjacency.node(col));
            if !u.is_a(source.kind()) {
                std::mem::swap(&mut u, &mut v);
            }
            if !u.is_a(source.kind()) || !v.is_a(target.kind()) {
                continue;
            }
            for (k, x) in source.extract(graph, u).into_iter().enumerate() {
                values[[pos, k]] = x;
            }
            for (k, x) in target.extract(graph, v).into_iter().enumerate() {
                values[[pos, width + k]] = x;
            }
        }
        Self { names, values }
    }
}

impl EdgeFeature for NodeAttributeFeature {
    fn names(&self) -> Vec<String> {
        self.names.clone()
    }

    fn extract(&self, _root: usize) -> Array2<f64> {
        self.values.clone()
    }
}

/// Z-score every column with population statistics. Constant columns are
/// left untouched.
pub fn standardize_columns(matrix: &mut Array2<f64>) {
    let n = matrix.nrows() as f64;
    if n == 0.0 {
        return;
    }
    for mut col in matrix.axis_iter_mut(Axis(1)) {
        let mean = col.sum() / n;
        let var = col.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let std = var.sqrt();
        if std > 1e-12 {
            col.mapv_inplace(|x| (x - mean) / std);
        }
    }
}

/// Ordered concatenation of edge extractors along the feature axis.
///
/// With no (or only zero-width) extractors the result is a single all-zero
/// column named `zero`, so downstream algebra always sees `M >= 1`.
pub struct CombinedFeature {
    edge_count: usize,
    extractors: Vec<Box<dyn EdgeFeature>>,
    standardize: bool,
}

impl CombinedFeature {
    pub fn new(adjacency: &AdjacencyMatrix, extractors: Vec<Box<dyn EdgeFeature>>) -> Self {
        Self {
            edge_count: adjacency.edge_count(),
            extractors,
            standardize: true,
        }
    }

    /// Toggle z-score standardization of the combined matrix (on by default).
    pub fn with_standardize(mut self, standardize: bool) -> Self {
        self.standardize = standardize;
        self
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn names(&self) -> Vec<String> {
        let names: Vec<String> = self.extractors.iter().flat_map(|x| x.names()).collect();
        if names.is_empty() {
            vec!["zero".to_string()]
        } else {
            names
        }
    }

    pub fn feature_count(&self) -> usize {
        self.extractors
            .iter()
            .map(|x| x.feature_count())
            .sum::<usize>()
            .max(1)
    }

    /// The `E × M` edge-feature matrix for a walk rooted at `root`.
    pub fn feature_matrix(&self, root: usize) -> Result<Array2<f64>> {
        let mut out = Array2::zeros((self.edge_count, self.feature_count()));
        let mut offset = 0;
        for extractor in &self.extractors {
            let width = extractor.feature_count();
            if width == 0 {
                continue;
            }
            let block = extractor.extract(root);
            if block.dim() != (self.edge_count, width) {
                return Err(Error::DimensionMismatch {
                    expected: self.edge_count * width,
                    got: block.len(),
                });
            }
            out.slice_mut(s![.., offset..offset + width]).assign(&block);
            offset += width;
        }
        if self.standardize {
            standardize_columns(&mut out);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::EntityTable;
    use crate::graph::Attributes;
    use crate::{Entity, EntityKind};
    use serde_json::json;

    fn graph() -> SocialGraph {
        let mut g = SocialGraph::new_directed();
        let mut a = Attributes::new();
        a.insert("contributions".into(), json!(4));
        g.add_edge(Entity::user(1), Entity::repository(10), a);
        g.add_edge(Entity::repository(10), Entity::user(1), Attributes::new());
        g.add_edge(Entity::user(2), Entity::repository(10), Attributes::new());
        g.add_edge(Entity::user(1), Entity::user(2), Attributes::new());
        g
    }

    #[test]
    fn test_edge_attribute_default_is_one() {
        let g = graph();
        let adj = AdjacencyMatrix::new(&g, None);
        let f = EdgeAttributeFeature::new(&g, &adj, &["contributions".to_string()]);
        let m = f.extract(0);
        let u1 = adj.node_index(&Entity::user(1)).unwrap();
        let r10 = adj.node_index(&Entity::repository(10)).unwrap();
        for (pos, row, col) in adj.edges() {
            let expected = if (row, col) == (u1, r10) { 4.0 } else { 1.0 };
            assert_eq!(m[[pos, 0]], expected);
        }
    }

    #[test]
    fn test_empty_combination_is_one_zero_column() {
        let g = graph();
        let adj = AdjacencyMatrix::new(&g, None);
        let combined = CombinedFeature::new(&adj, Vec::new());
        assert_eq!(combined.feature_count(), 1);
        assert_eq!(combined.names(), vec!["zero"]);
        let m = combined.feature_matrix(0).unwrap();
        assert_eq!(m.dim(), (adj.edge_count(), 1));
        assert!(m.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_standardized_columns_have_zero_mean_unit_variance() {
        let g = graph();
        let adj = AdjacencyMatrix::new(&g, None);
        let combined = CombinedFeature::new(
            &adj,
            vec![
                Box::new(ConstantFeature::new(&adj)),
                Box::new(EdgeAttributeFeature::new(&g, &adj, &["contributions".to_string()])),
            ],
        );
        let m = combined.feature_matrix(0).unwrap();
        assert_eq!(m.dim(), (4, 2));
        assert!(m.column(0).iter().all(|&x| x == 1.0));
        let col = m.column(1);
        let mean = col.sum() / 4.0;
        let var = col.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / 4.0;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_similarity_feature_reads_root_row() {
        let g = graph();
        let adj = AdjacencyMatrix::new(&g, None);
        let bg = Bigraph::new(&g, EntityKind::User, EntityKind::Repository, None).unwrap();
        let sim = BigraphSimilarity::new(&bg, &bg.matrix().to_dense(), Side::Source).unwrap();
        let f = SimilarityFeature::new(&adj, &bg, sim.clone(), "behavior.source");

        let root = adj.node_index(&Entity::user(1)).unwrap();
        let m = f.extract(root);
        let from = (Side::Source, bg.source_index(&Entity::user(1)).unwrap());
        for (pos, _, col) in adj.edges() {
            let head = adj.node(col);
            let to = bg
                .source_index(head)
                .map(|i| (Side::Source, i))
                .or_else(|| bg.target_index(head).map(|j| (Side::Target, j)))
                .unwrap();
            assert!((m[[pos, 0]] - sim.score(from, to)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_node_attributes_on_user_repository_edges() {
        let mut g = graph();
        let mut attrs = Attributes::new();
        attrs.insert("stargazers_count".into(), json!(7));
        g.add_node_with(Entity::repository(10), attrs);
        let adj = AdjacencyMatrix::new(&g, None);
        let f = NodeAttributeFeature::new(
            &g,
            &adj,
            &NodeFeature::user(EntityTable::new()),
            &NodeFeature::repository(EntityTable::new()),
        );
        assert_eq!(f.feature_count(), 13);
        let m = f.extract(0);
        let stars = f.names().iter().position(|n| n == "Repository.stargazers_count").unwrap();
        let u1 = adj.node_index(&Entity::user(1)).unwrap();
        let u2 = adj.node_index(&Entity::user(2)).unwrap();
        for (pos, row, col) in adj.edges() {
            let expected = if (row, col) == (u1, u2) { 0.0 } else { 7.0 };
            assert_eq!(m[[pos, stars]], expected);
        }
    }
}
