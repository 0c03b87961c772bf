//! Property-based tests using proptest

use proptest::prelude::*;
use rapid_featurize::clusters::{
    FeatureClusterJointCounter, HighestProbabilityOnly, MembershipAboveThreshold,
};
use rapid_featurize::*;

const CLUSTERS: usize = 3;

/// Documents of small feature ids, each hard-assigned to one cluster.
fn documents() -> impl Strategy<Value = Vec<ClusteredProcessedInstance>> {
    prop::collection::vec(
        (prop::collection::vec(0u32..20, 1..12), 0usize..CLUSTERS),
        1..40,
    )
    .prop_map(|docs| {
        docs.into_iter()
            .map(|(features, cluster)| {
                let mut vector = vec![0.0; CLUSTERS];
                vector[cluster] = 1.0;
                ClusteredProcessedInstance::from_features(features, vector)
            })
            .collect()
    })
}

fn counted(docs: &[ClusteredProcessedInstance]) -> FeatureClusterJointCounter {
    let mut counter = FeatureClusterJointCounter::default();
    counter.count(docs, &HighestProbabilityOnly).unwrap();
    counter
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn test_top_k_length_and_order(
        docs in documents(),
        k in 0usize..25,
        cluster in 0usize..CLUSTERS,
    ) {
        let config = AnalysisConfig::new().without_pruning();
        let analysis = ClusterFeatureAnalysis::with_config(&docs, None, &config).unwrap();
        let domain = analysis.counts().features_in_cluster(cluster).len();

        for method in [
            OrderingMethod::LikelihoodInClusterOverPrior,
            OrderingMethod::LikelihoodInClusterOverLikelihoodOut,
            OrderingMethod::LikelihoodInCluster,
        ] {
            let ranked = analysis.ranked_features(cluster, k, method).unwrap();
            prop_assert_eq!(ranked.len(), k.min(domain));

            for pair in ranked.windows(2) {
                let (fa, sa) = pair[0];
                let (fb, sb) = pair[1];
                prop_assert!(sa.is_finite() && sb.is_finite());
                prop_assert!(sa > sb || (sa == sb && fa < fb),
                    "{:?} ranked before {:?}", pair[0], pair[1]);
            }
        }
    }

    #[test]
    fn test_top_k_is_prefix_of_larger_k(
        docs in documents(),
        k in 1usize..10,
    ) {
        let config = AnalysisConfig::new().without_pruning();
        let analysis = ClusterFeatureAnalysis::with_config(&docs, None, &config).unwrap();
        let small = analysis.top_features(0, k).unwrap();
        let large = analysis.top_features(0, k + 5).unwrap();
        prop_assert_eq!(&large[..small.len()], &small[..]);
    }

    #[test]
    fn test_counting_is_order_independent(docs in documents()) {
        let forward = counted(&docs);

        let mut reversed = docs.clone();
        reversed.reverse();
        let backward = counted(&reversed);

        prop_assert_eq!(forward.tables(), backward.tables());
    }

    #[test]
    fn test_analysis_deterministic(docs in documents()) {
        let config = AnalysisConfig::new().without_pruning();
        let a = ClusterFeatureAnalysis::with_config(&docs, None, &config).unwrap();
        let b = ClusterFeatureAnalysis::with_config(&docs, None, &config).unwrap();
        for cluster in 0..CLUSTERS {
            prop_assert_eq!(
                a.ranked_features(cluster, 10, OrderingMethod::default()).unwrap(),
                b.ranked_features(cluster, 10, OrderingMethod::default()).unwrap()
            );
        }
    }

    #[test]
    fn test_prune_keeps_exactly_frequent_features(
        docs in documents(),
        threshold in 0u64..6,
    ) {
        let before = counted(&docs);
        let mut after = counted(&docs);
        after.prune_features_with_count_less_than(threshold);

        for feature in 0u32..20 {
            let prior = before.prior_count(feature);
            let kept = threshold <= 1 || prior >= threshold;
            let expected = if kept { prior } else { 0 };
            prop_assert_eq!(after.prior_count(feature), expected);
            for cluster in 0..CLUSTERS {
                let expected = if kept { before.cluster_count(feature, cluster) } else { 0 };
                prop_assert_eq!(after.cluster_count(feature, cluster), expected);
            }
        }
        prop_assert_eq!(after.prior_total(), before.prior_total());
    }

    #[test]
    fn test_cluster_only_prior_matches_cluster_sums(docs in documents()) {
        // With hard assignment every document lands in exactly one cluster,
        // so the prior is the sum over clusters.
        let counter = counted(&docs);
        for feature in 0u32..20 {
            let sum: u64 = (0..CLUSTERS).map(|c| counter.cluster_count(feature, c)).sum();
            prop_assert_eq!(counter.prior_count(feature), sum);
        }
        let totals: u64 = (0..CLUSTERS).map(|c| counter.cluster_total(c)).sum();
        prop_assert_eq!(counter.prior_total(), totals);
    }

    #[test]
    fn test_zero_threshold_membership_counts_everywhere(docs in documents()) {
        let mut counter = FeatureClusterJointCounter::default();
        counter.count(&docs, &MembershipAboveThreshold::new(0.0)).unwrap();
        for feature in 0u32..20 {
            for cluster in 0..CLUSTERS {
                prop_assert_eq!(counter.cluster_count(feature, cluster), counter.prior_count(feature));
            }
        }
    }

    #[test]
    fn test_tokens_point_back_into_text(text in "[a-zA-Z!?.,' ]{0,80}") {
        let tokens = Tokenizer::new().tokenize_text(&text);
        for token in &tokens {
            prop_assert_eq!(&text[token.start..token.end], token.form.as_str());
            prop_assert!(!token.form.trim().is_empty());
        }
    }
}
