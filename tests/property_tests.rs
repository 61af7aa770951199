use pairclust::cluster::{Clustering, Dbscan, Kmeans};
use pairclust::{
    compute_with, feature_pair_matrix, global_matrix, jaccard, rank, reorder, Aggregation,
    ClusterCollection, ClusterPartition, FeatureTable, ReorderMethod, SimilarityMatrix,
    SimilarityStats,
};
use proptest::prelude::*;

fn collection_from(labels: &[Vec<i32>]) -> ClusterCollection {
    let names = ["a", "b", "c", "d"];
    let mut c = ClusterCollection::new();
    let mut k = 0;
    for i in 0..names.len() {
        for j in (i + 1)..names.len() {
            if let Some(l) = labels.get(k) {
                c.insert(names[i], names[j], ClusterPartition::from_labels(l));
            }
            k += 1;
        }
    }
    c
}

proptest! {
    #[test]
    fn prop_engine_partitions_cover_rows(
        rows in prop::collection::vec((-10.0f64..10.0, -10.0f64..10.0, -10.0f64..10.0), 3..25),
        k in 1usize..4
    ) {
        let table = FeatureTable::from_columns([
            ("a", rows.iter().map(|r| r.0).collect::<Vec<_>>()),
            ("b", rows.iter().map(|r| r.1).collect()),
            ("c", rows.iter().map(|r| r.2).collect()),
        ]).unwrap();

        let kmeans = compute_with(&table, &["a", "b", "c"], &Kmeans::new(k).with_seed(3)).unwrap();
        let dbscan = compute_with(&table, &["a", "b", "c"], &Dbscan::new(2.0, 2)).unwrap();

        prop_assert_eq!(dbscan.len(), 3);
        for (_, _, p) in kmeans.iter().chain(dbscan.iter()) {
            prop_assert!(p.covers(rows.len()));
        }
    }

    #[test]
    fn prop_labels_match_points(
        data in prop::collection::vec(prop::collection::vec(-10.0f32..10.0, 2), 1..20),
        eps in 0.1f32..5.0
    ) {
        let labels = Dbscan::new(eps, 2).fit_predict(&data).unwrap();
        prop_assert_eq!(labels.len(), data.len());
        prop_assert!(labels.iter().all(|&l| l >= -1));
    }

    #[test]
    fn prop_jaccard_symmetric_and_bounded(
        a in prop::collection::vec(0usize..30, 0..20),
        b in prop::collection::vec(0usize..30, 0..20)
    ) {
        let ab = jaccard(&a, &b);
        prop_assert_eq!(ab, jaccard(&b, &a));
        prop_assert!((0.0..=1.0).contains(&ab));
        if !a.is_empty() {
            prop_assert_eq!(jaccard(&a, &a), 1.0);
        }
    }

    #[test]
    fn prop_global_matrix_symmetric_unit_diagonal(
        labels in prop::collection::vec(prop::collection::vec(-1i32..3, 8), 1..6)
    ) {
        let m = global_matrix(&collection_from(&labels));
        for i in 0..m.len() {
            prop_assert_eq!(m.get(i, i), Some(1.0));
            for j in 0..m.len() {
                prop_assert_eq!(m.get(i, j), m.get(j, i));
            }
        }
    }

    #[test]
    fn prop_aggregates_bounded_by_min_and_max(
        sims in prop::collection::vec(0.0f64..=1.0, 1..12)
    ) {
        let lo = Aggregation::Min.apply(&sims);
        let hi = Aggregation::Max.apply(&sims);
        for agg in [Aggregation::Avg, Aggregation::Median] {
            let v = agg.apply(&sims);
            prop_assert!(lo - 1e-12 <= v && v <= hi + 1e-12);
        }
        prop_assert!(sims.iter().all(|&s| lo <= s && s <= hi));
    }

    #[test]
    fn prop_reorder_is_permutation(
        upper in prop::collection::vec(0.0f64..=1.0, 0..28),
        method in prop::sample::select(vec![ReorderMethod::Optimal, ReorderMethod::Average, ReorderMethod::None])
    ) {
        // Largest n with n(n-1)/2 <= upper.len().
        let mut n = 1;
        while (n + 1) * n / 2 <= upper.len() {
            n += 1;
        }
        let mut values = vec![vec![1.0; n]; n];
        let mut it = upper.iter();
        for i in 0..n {
            for j in (i + 1)..n {
                let v = *it.next().unwrap();
                values[i][j] = v;
                values[j][i] = v;
            }
        }
        let labels: Vec<String> = (0..n).map(|i| format!("f{i}")).collect();
        let stats = SimilarityStats { min_similarity: 0.0, max_similarity: 1.0, size: n };
        let m = SimilarityMatrix::new(labels, values, stats).unwrap();

        let r = reorder(&m, method);
        let mut sorted = r.order.clone();
        sorted.sort_unstable();
        prop_assert_eq!(sorted, (0..n).collect::<Vec<_>>());
        for a in 0..n {
            for b in 0..n {
                prop_assert_eq!(r.matrix.get(a, b), m.get(r.order[a], r.order[b]));
            }
        }
    }

    #[test]
    fn prop_lookup_ignores_pair_ordering(
        labels in prop::collection::vec(prop::collection::vec(-1i32..3, 8), 1..6),
        cluster_id in -1i32..3
    ) {
        let c = collection_from(&labels);
        prop_assert_eq!(rank(&c, "a", "b", cluster_id), rank(&c, "b", "a", cluster_id));

        let features = ["a", "b", "c", "d"];
        let ab = feature_pair_matrix(&c, "a", "b", cluster_id, &features, Aggregation::Median);
        let ba = feature_pair_matrix(&c, "b", "a", cluster_id, &features, Aggregation::Median);
        prop_assert_eq!(ab.is_ok(), ba.is_ok());
        prop_assert_eq!(ab.ok(), ba.ok());
    }
}
