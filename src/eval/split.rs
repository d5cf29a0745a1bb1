use crate::{Error, Result, SocialGraph};
use rand::prelude::*;

/// Randomly split the edges of `graph` into a training and a test graph.
///
/// Edges are shuffled; the first `floor(edge_count * train_ratio)` stay in the
/// training copy and the rest in the test copy. Both copies keep every node.
pub fn split_graph<R: Rng + ?Sized>(
    graph: &SocialGraph,
    train_ratio: f64,
    rng: &mut R,
) -> Result<(SocialGraph, SocialGraph)> {
    if !(0.0..=1.0).contains(&train_ratio) {
        return Err(Error::InvalidConfig(format!(
            "train_ratio must lie in [0, 1], got {}",
            train_ratio
        )));
    }
    let mut edges = graph.edge_list();
    edges.shuffle(rng);
    let p = (edges.len() as f64 * train_ratio).floor() as usize;

    let mut train = graph.clone();
    train.remove_edges(&edges[p..]);
    let mut test = graph.clone();
    test.remove_edges(&edges[..p]);
    Ok((train, test))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Entity;
    use rand_xorshift::XorShiftRng;

    fn graph() -> SocialGraph {
        let mut g = SocialGraph::new_undirected();
        for u in 1u64..=3 {
            for r in 1u64..=3 {
                g.add_edge(Entity::user(u), Entity::repository(r), Default::default());
            }
        }
        g.add_node(Entity::user(9));
        g
    }

    #[test]
    fn test_partition_of_edges() {
        let g = graph();
        let mut rng = XorShiftRng::seed_from_u64(42);
        let (train, test) = split_graph(&g, 0.8, &mut rng).unwrap();
        assert_eq!(train.edge_count(), 7);
        assert_eq!(test.edge_count(), 2);
        assert_eq!(train.node_count(), g.node_count());
        assert_eq!(test.node_count(), g.node_count());
        for (u, v) in g.edge_list() {
            assert!(train.has_edge(&u, &v) ^ test.has_edge(&u, &v));
        }
    }

    #[test]
    fn test_seeded_split_is_reproducible() {
        let g = graph();
        let a = split_graph(&g, 0.5, &mut XorShiftRng::seed_from_u64(1)).unwrap();
        let b = split_graph(&g, 0.5, &mut XorShiftRng::seed_from_u64(1)).unwrap();
        assert_eq!(a.0.edge_list(), b.0.edge_list());
        assert_eq!(a.1.edge_list(), b.1.edge_list());
    }

    #[test]
    fn test_extreme_ratios() {
        let g = graph();
        let mut rng = XorShiftRng::seed_from_u64(0);
        let (train, test) = split_graph(&g, 1.0, &mut rng).unwrap();
        assert_eq!((train.edge_count(), test.edge_count()), (9, 0));
        let (train, test) = split_graph(&g, 0.0, &mut rng).unwrap();
        assert_eq!((train.edge_count(), test.edge_count()), (0, 9));
        assert!(split_graph(&g, 1.5, &mut rng).is_err());
    }
}
