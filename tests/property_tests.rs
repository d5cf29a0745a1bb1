//! Property-based tests for graph projections, similarities, walks and
//! recommendation lists.
//!
//! - Incidence entries exist exactly for observed edges
//! - Jaccard similarity is symmetric and bounded
//! - Random-walk visiting probabilities form a distribution
//! - Recommendation lists never repeat seen or duplicate repositories

use proptest::prelude::*;
use stargraph::{Entity, SocialGraph};

fn arb_stars() -> impl Strategy<Value = Vec<(u64, u64)>> {
    prop::collection::vec((0u64..6, 0u64..8), 1..24)
}

fn star_graph(stars: &[(u64, u64)]) -> SocialGraph {
    let mut g = SocialGraph::new_undirected();
    for &(u, r) in stars {
        g.add_edge(Entity::user(u), Entity::repository(r), Default::default());
    }
    g
}

mod bigraph_props {
    use super::*;
    use stargraph::{Bigraph, EntityKind};

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn incidence_iff_edge(stars in arb_stars()) {
            let g = star_graph(&stars);
            let bg = Bigraph::new(&g, EntityKind::User, EntityKind::Repository, None).unwrap();

            let mut stored = 0;
            for (i, u) in bg.sources().iter().enumerate() {
                for (j, r) in bg.targets().iter().enumerate() {
                    let present = bg.matrix().get(i, j) != 0.0;
                    prop_assert_eq!(present, g.has_edge(u, r));
                    prop_assert_eq!(present, bg.transposed().get(j, i) != 0.0);
                    stored += usize::from(present);
                }
            }
            prop_assert_eq!(stored, g.edge_count());
        }
    }
}

mod similarity_props {
    use super::*;
    use stargraph::similarity::{JaccardSimilarity, Similarity};
    use stargraph::CsrMatrix;
    use std::collections::BTreeSet;

    fn arb_rows() -> impl Strategy<Value = BTreeSet<(usize, usize)>> {
        prop::collection::btree_set((0usize..7, 0usize..10), 0..40)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn jaccard_symmetric_and_bounded(cells in arb_rows()) {
            let features =
                CsrMatrix::from_triplets(7, 10, cells.iter().map(|&(r, c)| (r, c, 1.0)));
            let sim = JaccardSimilarity::new(&features);
            prop_assert_eq!(sim.size(), 7);

            for a in 0..7 {
                for b in 0..7 {
                    let s = sim.score(a, b);
                    prop_assert_eq!(s, sim.score(b, a));
                    prop_assert!((0.0..=1.0).contains(&s), "score({}, {}) = {}", a, b, s);
                }
                let nonempty = cells.iter().any(|&(r, _)| r == a);
                if nonempty {
                    prop_assert!((sim.score(a, a) - 1.0).abs() < 1e-12);
                }
            }
        }
    }
}

mod walk_props {
    use super::*;
    use stargraph::algo::{stationary_distribution, Transition};
    use stargraph::CsrMatrix;

    fn arb_edges() -> impl Strategy<Value = Vec<(usize, usize, f64)>> {
        prop::collection::vec((0usize..8, 0usize..8, 0.1f64..5.0), 0..30)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn stationary_is_distribution(
            edges in arb_edges(),
            root in 0usize..8,
            restart in 0.05f64..0.95,
        ) {
            let weights = CsrMatrix::from_triplets(8, 8, edges);
            let transition = Transition::new(&weights);
            let (p, _) = stationary_distribution(&transition, root, restart, 200, 1e-12);

            prop_assert_eq!(p.len(), 8);
            prop_assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
            prop_assert!(p.iter().all(|&x| x >= -1e-15));
            prop_assert!(p[root] >= restart - 1e-12);
        }
    }
}

mod recommend_props {
    use super::*;
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;
    use stargraph::recommend::{recommend, ItemCf, PersonalRank, Recommender, UserCf};
    use stargraph::EntityKind;
    use std::collections::HashSet;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn excludes_seen_and_respects_n(
            stars in arb_stars(),
            n in 0usize..6,
            seed in any::<u64>(),
        ) {
            let g = star_graph(&stars);
            let recommenders: Vec<Box<dyn Recommender>> = vec![
                Box::new(UserCf::default()),
                Box::new(ItemCf::default()),
                Box::new(PersonalRank::default()),
            ];
            for recommender in recommenders {
                let model = recommender.train(&g).unwrap();
                for user in g.nodes_of_kind(EntityKind::User) {
                    let seen: HashSet<Entity> = g.neighbors(&user).into_iter().collect();
                    let mut rng = XorShiftRng::seed_from_u64(seed);
                    let top = recommend(model.as_ref(), &user, Some(n), &mut rng).unwrap();

                    prop_assert!(top.len() <= n);
                    let unique: HashSet<&Entity> = top.iter().collect();
                    prop_assert_eq!(unique.len(), top.len());
                    for r in &top {
                        prop_assert!(r.is_a(EntityKind::Repository));
                        prop_assert!(!seen.contains(r), "{} recommended seen {}", recommender.name(), r);
                    }
                }
            }
        }
    }
}
