use crate::{Entity, SocialGraph};
use ndarray::Array2;
use std::collections::HashMap;

/// Follower and followee incidence rows for `users` over the nodes of a
/// follow graph.
///
/// Returns `(followers, followees)`, both `users.len() × follow_graph.node_count()`,
/// columns in the follow graph's node order. `followers[i, j] = 1` when node `j`
/// follows `users[i]`; `followees[i, j] = 1` when `users[i]` follows node `j`.
/// An undirected follow graph makes the two identical.
pub fn follow_features(follow_graph: &SocialGraph, users: &[Entity]) -> (Array2<f64>, Array2<f64>) {
    let columns: HashMap<&Entity, usize> = follow_graph
        .nodes()
        .enumerate()
        .map(|(i, e)| (e, i))
        .collect();
    let rows: HashMap<&Entity, usize> = users.iter().enumerate().map(|(i, e)| (e, i)).collect();

    let shape = (users.len(), columns.len());
    let mut followers = Array2::zeros(shape);
    let mut followees = Array2::zeros(shape);

    let mut mark = |from: &Entity, to: &Entity| {
        if let (Some(&row), Some(&col)) = (rows.get(to), columns.get(from)) {
            followers[[row, col]] = 1.0;
        }
        if let (Some(&row), Some(&col)) = (rows.get(from), columns.get(to)) {
            followees[[row, col]] = 1.0;
        }
    };
    for (u, v, _) in follow_graph.edges() {
        mark(u, v);
        if !follow_graph.is_directed() {
            mark(v, u);
        }
    }

    (followers, followees)
}
