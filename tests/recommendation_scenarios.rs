use vitrine::config::{EngineConfig, InteractionWeights};
use vitrine::data::{InteractionKind, InteractionRecord, InteractionTable};
use vitrine::engine::RecommendationEngine;
use vitrine::error::Result;
use vitrine::neighbors::{DistanceMetric, IndexStructure};

fn record(user: &str, product: &str, counters: &[(InteractionKind, f64)]) -> InteractionRecord {
    counters
        .iter()
        .fold(InteractionRecord::new(user, product), |r, &(kind, n)| {
            r.with(kind, n)
        })
}

/// U1..U3 over P1..P3.
fn scenario_table() -> InteractionTable {
    use InteractionKind::*;
    InteractionTable::from_records(vec![
        record("U1", "P1", &[(Click, 1.0), (View, 1.0)]),
        record("U1", "P2", &[(Purchase, 1.0)]),
        record("U2", "P1", &[(Purchase, 1.0)]),
        record("U2", "P3", &[(View, 1.0)]),
        record("U3", "P2", &[(Click, 1.0)]),
    ])
}

fn trained_scenario() -> Result<RecommendationEngine> {
    let mut engine = RecommendationEngine::default();
    engine.set_interactions(scenario_table());
    engine.fit()?;
    Ok(engine)
}

/// A larger synthetic store with distinct engagement patterns per user.
fn synthetic_table(users: usize, products: usize) -> InteractionTable {
    let mut records = Vec::new();
    for u in 0..users {
        for p in 0..products {
            if (u * 7 + p * 3) % 5 >= 2 {
                continue;
            }
            records.push(
                InteractionRecord::new(format!("U{u:03}"), format!("P{p:03}"))
                    .with(InteractionKind::Click, ((u * p) % 4) as f64)
                    .with(InteractionKind::View, ((u + p) % 3) as f64)
                    .with(
                        InteractionKind::Purchase,
                        if (u * 13 + p * 5) % 7 == 0 { 1.0 } else { 0.0 },
                    ),
            );
        }
    }
    InteractionTable::from_records(records)
}

#[test]
fn scenario_matrix_matches_weighted_scores() -> Result<()> {
    let engine = trained_scenario()?;
    let matrix = engine.matrix().expect("matrix built");

    assert_eq!(matrix.users(), ["U1", "U2", "U3"]);
    assert_eq!(matrix.items(), ["P1", "P2", "P3"]);
    assert_eq!(matrix.row(matrix.user_row("U1").unwrap()), Some(&[3.0, 5.0, 0.0][..]));
    assert_eq!(matrix.row(matrix.user_row("U2").unwrap()), Some(&[5.0, 0.0, 2.0][..]));
    assert_eq!(matrix.row(matrix.user_row("U3").unwrap()), Some(&[0.0, 1.0, 0.0][..]));
    Ok(())
}

#[test]
fn scenario_adjusts_neighbor_count() -> Result<()> {
    let engine = trained_scenario()?;
    assert_eq!(engine.index().map(|i| i.n_neighbors()), Some(2));
    assert_eq!(engine.stats().n_neighbors, Some(2));
    Ok(())
}

#[test]
fn scenario_unknown_user_gets_popular_products() -> Result<()> {
    let engine = trained_scenario()?;
    assert_eq!(engine.popular(3), vec!["P1", "P2", "P3"]);
    assert_eq!(engine.recommend("U4", 2), vec!["P1", "P2"]);
    assert_eq!(engine.recommend("U4", 10), engine.popular(10));
    Ok(())
}

#[test]
fn scenario_personalized_recommendations() -> Result<()> {
    let engine = trained_scenario()?;

    // U3 is closest to U1, whose best product P2 is already U3's.
    assert_eq!(engine.recommend("U3", 5), vec!["P1", "P3"]);
    // U1 has seen P1 and P2; only P3 remains anywhere.
    assert_eq!(engine.recommend("U1", 2), vec!["P3"]);
    // U2's nearest neighbor is U1.
    assert_eq!(engine.recommend("U2", 1), vec!["P2"]);
    assert!(engine.recommend("U2", 0).is_empty());
    Ok(())
}

#[test]
fn oversized_limit_is_capped_by_candidates() -> Result<()> {
    let engine = trained_scenario()?;
    assert_eq!(engine.recommend("U3", usize::MAX), vec!["P1", "P3"]);
    assert_eq!(engine.recommend("U4", usize::MAX), vec!["P1", "P2", "P3"]);
    Ok(())
}

#[test]
fn duplicate_pairs_are_averaged() -> Result<()> {
    let mut engine = RecommendationEngine::default();
    engine.set_interactions(InteractionTable::from_records(vec![
        record("U1", "P1", &[(InteractionKind::Click, 1.0)]),
        record("U1", "P1", &[(InteractionKind::Click, 3.0)]),
        record("U2", "P1", &[(InteractionKind::Purchase, 2.0)]),
    ]));
    engine.build_matrix()?;

    let matrix = engine.matrix().expect("matrix built");
    assert_eq!(matrix.get("U1", "P1"), Some(2.0));
    assert_eq!(matrix.get("U2", "P1"), Some(10.0));
    Ok(())
}

#[test]
fn popularity_ignores_matrix_weights() -> Result<()> {
    let mut engine = RecommendationEngine::default();
    engine.set_interactions(scenario_table());
    let before = engine.popular(3);

    let flat = InteractionWeights {
        click: 0.0,
        view: 10.0,
        favorite: 0.0,
        purchase: 0.0,
    };
    engine.build_matrix_with(&flat)?;
    engine.train()?;

    assert_eq!(engine.popular(3), before);
    assert_eq!(engine.matrix().and_then(|m| m.get("U2", "P3")), Some(10.0));
    Ok(())
}

#[test]
fn recommendations_never_repeat_or_include_own_products() -> Result<()> {
    let mut engine = RecommendationEngine::default();
    engine.set_interactions(synthetic_table(40, 15));
    engine.fit()?;

    let table = engine.interactions().expect("interactions loaded").clone();
    let users: Vec<String> = engine.matrix().expect("matrix").users().to_vec();

    for user in &users {
        for n in [1, 3, 8] {
            let recs = engine.recommend(user, n);
            assert!(recs.len() <= n);

            let mut unique = recs.clone();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), recs.len(), "duplicates for {user}");

            for product in &recs {
                assert!(
                    !table
                        .records_for_user(user)
                        .any(|r| &r.product_id == product),
                    "{user} already interacted with {product}"
                );
            }
        }
    }
    Ok(())
}

#[test]
fn extra_exclusions_apply_on_every_path() -> Result<()> {
    let engine = trained_scenario()?;
    let extra = vec!["P1".to_string()];

    let personalized = engine.recommend_with_exclusions("U3", 5, &extra);
    assert_eq!(personalized, vec!["P3"]);

    let cold = engine.recommend_with_exclusions("U4", 2, &extra);
    assert_eq!(cold, vec!["P2", "P3"]);

    assert_eq!(engine.recommend_with_exclusions("U3", 5, &[]), engine.recommend("U3", 5));
    Ok(())
}

#[test]
fn untrained_engine_falls_back_to_popularity() -> Result<()> {
    let mut engine = RecommendationEngine::default();
    assert!(engine.recommend("U1", 3).is_empty());

    engine.set_interactions(scenario_table());
    assert!(!engine.is_trained());
    assert_eq!(engine.recommend("U1", 2), vec!["P1", "P2"]);
    Ok(())
}

#[test]
fn tracking_invalidates_and_increments() -> Result<()> {
    let mut engine = trained_scenario()?;

    let tracked = engine.track_interaction("U3", "P3", InteractionKind::Favorite);
    assert_eq!(tracked.favorite, 1.0);
    assert!(!tracked.timestamp.is_empty());
    assert!(!engine.is_trained());

    let again = engine.track_interaction("U3", "P3", InteractionKind::Favorite);
    assert_eq!(again.favorite, 2.0);
    assert_eq!(engine.interactions().map(|t| t.len()), Some(6));

    engine.fit()?;
    assert!(!engine.recommend("U3", 5).contains(&"P3".to_string()));
    Ok(())
}

#[test]
fn recommend_many_preserves_input_order() -> Result<()> {
    let mut engine = RecommendationEngine::default();
    engine.set_interactions(synthetic_table(30, 10));
    engine.fit()?;

    let users = ["U005", "nobody", "U017", "U000"];
    let batch = engine.recommend_many(&users, 4);
    assert_eq!(batch.len(), users.len());
    for (user, recs) in users.iter().zip(&batch) {
        assert_eq!(recs, &engine.recommend(user, 4));
    }
    Ok(())
}

#[test]
fn vp_tree_matches_brute_force() -> Result<()> {
    for metric in [DistanceMetric::Euclidean, DistanceMetric::Manhattan] {
        let mut brute = RecommendationEngine::default();
        brute.set_interactions(synthetic_table(60, 12));
        brute.build_matrix()?;
        brute.train_with(5, metric, IndexStructure::BruteForce)?;

        let mut tree = RecommendationEngine::default();
        tree.set_interactions(synthetic_table(60, 12));
        tree.build_matrix()?;
        tree.train_with(5, metric, IndexStructure::VpTree)?;
        assert_eq!(tree.stats().structure, Some("vp_tree"));

        let matrix = brute.matrix().expect("matrix");
        for row in 0..matrix.n_users() {
            let expected = brute.index().expect("index").kneighbors_of_row(row, 6)?;
            let actual = tree.index().expect("index").kneighbors_of_row(row, 6)?;
            let expected: Vec<usize> = expected.iter().map(|n| n.row).collect();
            let actual: Vec<usize> = actual.iter().map(|n| n.row).collect();
            assert_eq!(actual, expected, "{} row {row}", metric.name());
        }

        for user in matrix.users() {
            assert_eq!(tree.recommend(user, 5), brute.recommend(user, 5));
        }
    }
    Ok(())
}

#[test]
fn vp_tree_requires_true_metric() -> Result<()> {
    let mut engine = RecommendationEngine::default();
    engine.set_interactions(scenario_table());
    engine.build_matrix()?;
    assert!(
        engine
            .train_with(2, DistanceMetric::Cosine, IndexStructure::VpTree)
            .is_err()
    );
    Ok(())
}

#[test]
fn config_drives_training() -> Result<()> {
    let mut config = EngineConfig::default();
    config.neighbors.metric = DistanceMetric::Manhattan;
    config.neighbors.n_neighbors = 1;

    let mut engine = RecommendationEngine::new(config);
    engine.set_interactions(synthetic_table(40, 8));
    engine.fit()?;

    let stats = engine.stats();
    assert!(stats.trained);
    assert_eq!(stats.metric, Some("manhattan"));
    assert_eq!(stats.structure, Some("vp_tree"));
    assert_eq!(stats.n_neighbors, Some(1));
    Ok(())
}
