//! Per-cluster feature ranking.
//!
//! [`ClusterFeatureAnalysis`] counts features over clustered documents,
//! prunes rare ones, and answers top-K queries: which features are most
//! characteristic of a given cluster under an [`OrderingMethod`].
//!
//! The candidate domain for a cluster is every feature with a positive
//! count in that cluster and a positive prior, so every score below is
//! finite.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{AnalysisError, Result};
use crate::types::{ClusteredProcessedInstance, FeatureId, FeatureLookup, ProcessedInstance};

use super::counter::{CountingMethod, FeatureClusterJointCounter};
use super::membership::{ClusterMembershipTest, MembershipMethod};

// ============================================================================
// Configuration
// ============================================================================

/// Counting, membership and pruning settings for an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// How repeated features within a document are counted
    pub counting: CountingMethod,
    /// Which clusters a document is counted towards
    pub membership: MembershipMethod,
    /// Prune threshold when the prior comes from the clustered documents
    pub min_feature_count: u64,
    /// Prune threshold on the background prior
    pub min_background_feature_count: u64,
    /// Prune threshold on per-cluster counts when a background is used
    pub min_cluster_feature_count: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            counting: CountingMethod::FeatureBased,
            membership: MembershipMethod::HighestProbabilityOnly,
            min_feature_count: 5,
            min_background_feature_count: 10,
            min_cluster_feature_count: 10,
        }
    }
}

impl AnalysisConfig {
    /// Create a config with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_counting(mut self, counting: CountingMethod) -> Self {
        self.counting = counting;
        self
    }

    pub fn with_membership(mut self, membership: MembershipMethod) -> Self {
        self.membership = membership;
        self
    }

    pub fn with_min_feature_count(mut self, count: u64) -> Self {
        self.min_feature_count = count;
        self
    }

    pub fn with_min_background_feature_count(mut self, count: u64) -> Self {
        self.min_background_feature_count = count;
        self
    }

    pub fn with_min_cluster_feature_count(mut self, count: u64) -> Self {
        self.min_cluster_feature_count = count;
        self
    }

    /// Disable every pruning axis.
    pub fn without_pruning(self) -> Self {
        self.with_min_feature_count(0)
            .with_min_background_feature_count(0)
            .with_min_cluster_feature_count(0)
    }

    /// Check the configuration for values no analysis can use.
    pub fn validate(&self) -> Result<()> {
        if let MembershipMethod::AboveThreshold { threshold } = self.membership {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(AnalysisError::invalid_config(format!(
                    "membership threshold must be between 0 and 1, got {}",
                    threshold
                )));
            }
        }
        Ok(())
    }

    /// The thresholds this config applies after counting.
    pub fn prune_thresholds(&self) -> PruneThresholds {
        PruneThresholds {
            feature: self.min_feature_count,
            background: self.min_background_feature_count,
            cluster: self.min_cluster_feature_count,
        }
    }
}

/// Pruning applied once counting finishes. Values of 1 or less disable
/// the corresponding axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PruneThresholds {
    /// Used when there is no background collection
    pub feature: u64,
    /// Used on the background prior
    pub background: u64,
    /// Used on per-cluster counts when there is a background collection
    pub cluster: u64,
}

impl PruneThresholds {
    /// No pruning at all.
    pub fn none() -> Self {
        Self::default()
    }
}

// ============================================================================
// Ordering methods
// ============================================================================

/// How a feature's score for a cluster is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingMethod {
    /// `ln P(f|c) - ln P(f)`: pointwise mutual information between the
    /// feature and membership of the cluster.
    #[default]
    LikelihoodInClusterOverPrior,
    /// `ln P(f|c) - ln P(f|not c)`, with add-one smoothing on the
    /// out-of-cluster side.
    LikelihoodInClusterOverLikelihoodOut,
    /// `P(f|c)`: plain in-cluster frequency.
    LikelihoodInCluster,
}

impl OrderingMethod {
    /// Canonical name, as accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LikelihoodInClusterOverPrior => "likelihood_in_cluster_over_prior",
            Self::LikelihoodInClusterOverLikelihoodOut => "likelihood_in_cluster_over_likelihood_out",
            Self::LikelihoodInCluster => "likelihood_in_cluster",
        }
    }

    /// Score `feature` for `cluster`. Only meaningful inside the cluster's
    /// candidate domain.
    pub fn score(&self, counter: &FeatureClusterJointCounter, feature: FeatureId, cluster: usize) -> f64 {
        let likelihood = counter.likelihood_feature_given_cluster(feature, cluster);
        match self {
            Self::LikelihoodInClusterOverPrior => likelihood.ln() - counter.feature_prior(feature).ln(),
            Self::LikelihoodInClusterOverLikelihoodOut => {
                let (out, out_total) = counter.counts_outside(feature, cluster);
                let vocabulary = counter.num_features().max(1) as u64;
                let smoothed = (out + 1) as f64 / (out_total + vocabulary) as f64;
                likelihood.ln() - smoothed.ln()
            }
            Self::LikelihoodInCluster => likelihood,
        }
    }
}

impl fmt::Display for OrderingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderingMethod {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "likelihood_in_cluster_over_prior" | "pmi" => Ok(Self::LikelihoodInClusterOverPrior),
            "likelihood_in_cluster_over_likelihood_out" | "in_out_ratio" => {
                Ok(Self::LikelihoodInClusterOverLikelihoodOut)
            }
            "likelihood_in_cluster" | "frequency" => Ok(Self::LikelihoodInCluster),
            _ => Err(AnalysisError::unknown_ordering(s)),
        }
    }
}

// ============================================================================
// Top-K selection
// ============================================================================

/// Heap entry. Greater means ranked later, so a max-heap keeps the weakest
/// retained candidate on top.
#[derive(Debug, Clone, Copy)]
struct Ranked {
    feature: FeatureId,
    score: f64,
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.feature.cmp(&other.feature))
    }
}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

/// Best `k` of `candidates`, score descending then feature id ascending.
fn select_top_k(candidates: impl Iterator<Item = (FeatureId, f64)>, k: usize) -> Vec<(FeatureId, f64)> {
    if k == 0 {
        return Vec::new();
    }
    let mut heap = BinaryHeap::with_capacity(k + 1);
    for (feature, score) in candidates {
        heap.push(Ranked { feature, score });
        if heap.len() > k {
            heap.pop();
        }
    }
    heap.into_sorted_vec()
        .into_iter()
        .map(|r| (r.feature, r.score))
        .collect()
}

// ============================================================================
// Analysis
// ============================================================================

/// Counted and pruned statistics for a clustered collection, ready for
/// ranking queries.
///
/// Queries take `&self`; a finished analysis can be shared across threads.
#[derive(Debug)]
pub struct ClusterFeatureAnalysis {
    counter: FeatureClusterJointCounter,
}

impl ClusterFeatureAnalysis {
    /// Analyse `documents` with default settings, using the documents
    /// themselves as the prior.
    pub fn new(documents: &[ClusteredProcessedInstance]) -> Result<Self> {
        Self::with_config(documents, None, &AnalysisConfig::default())
    }

    /// Analyse `documents` with default settings against a separate
    /// `background` collection.
    pub fn with_background(
        documents: &[ClusteredProcessedInstance],
        background: &[ProcessedInstance],
    ) -> Result<Self> {
        Self::with_config(documents, Some(background), &AnalysisConfig::default())
    }

    /// Analyse with explicit settings.
    pub fn with_config(
        documents: &[ClusteredProcessedInstance],
        background: Option<&[ProcessedInstance]>,
        config: &AnalysisConfig,
    ) -> Result<Self> {
        config.validate()?;
        let counter = FeatureClusterJointCounter::new(config.counting.build());
        let membership = config.membership.build();
        Self::from_counter(
            documents,
            background,
            counter,
            membership.as_ref(),
            config.prune_thresholds(),
        )
    }

    /// Count with `counter` and `test`, then prune with `thresholds`.
    ///
    /// Without a background collection only `thresholds.feature` applies;
    /// with one, `thresholds.background` and `thresholds.cluster` apply.
    pub fn from_counter(
        documents: &[ClusteredProcessedInstance],
        background: Option<&[ProcessedInstance]>,
        mut counter: FeatureClusterJointCounter,
        test: &dyn ClusterMembershipTest,
        thresholds: PruneThresholds,
    ) -> Result<Self> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("cluster_analysis", documents = documents.len()).entered();

        match background {
            Some(background) => {
                counter.count_with_background(documents, background, test)?;
                counter.prune_only_background_features_with_count_less_than(thresholds.background);
                counter.prune_only_cluster_features_with_count_less_than(thresholds.cluster);
            }
            None => {
                counter.count(documents, test)?;
                counter.prune_features_with_count_less_than(thresholds.feature);
            }
        }

        Ok(Self { counter })
    }

    /// Top `k` features for `cluster` under the default ordering.
    pub fn top_features(&self, cluster: usize, k: usize) -> Result<Vec<FeatureId>> {
        self.top_features_by(cluster, k, OrderingMethod::default())
    }

    /// Top `k` features for `cluster` under `method`.
    pub fn top_features_by(&self, cluster: usize, k: usize, method: OrderingMethod) -> Result<Vec<FeatureId>> {
        Ok(self
            .ranked_features(cluster, k, method)?
            .into_iter()
            .map(|(f, _)| f)
            .collect())
    }

    /// Top `k` features for `cluster` under the ordering called `method`.
    pub fn top_features_named(&self, cluster: usize, k: usize, method: &str) -> Result<Vec<FeatureId>> {
        self.top_features_by(cluster, k, method.parse()?)
    }

    /// Top `k` features for `cluster`, mapped to strings through `lookup`.
    ///
    /// Fails with `UnknownFeature` at the first ranked id the lookup cannot
    /// name; the result is never shorter than [`Self::top_features_by`].
    pub fn top_feature_strings<'l>(
        &self,
        cluster: usize,
        k: usize,
        method: OrderingMethod,
        lookup: &'l dyn FeatureLookup,
    ) -> Result<Vec<&'l str>> {
        self.top_features_by(cluster, k, method)?
            .into_iter()
            .map(|f| {
                lookup
                    .feature_string(f)
                    .ok_or_else(|| AnalysisError::unknown_feature(f))
            })
            .collect()
    }

    /// Top `k` `(feature, score)` pairs for `cluster`, best first.
    pub fn ranked_features(
        &self,
        cluster: usize,
        k: usize,
        method: OrderingMethod,
    ) -> Result<Vec<(FeatureId, f64)>> {
        self.check_cluster(cluster)?;
        let counter = &self.counter;
        let candidates = counter
            .features_in_cluster(cluster)
            .into_iter()
            .map(|f| (f, method.score(counter, f, cluster)));
        Ok(select_top_k(candidates, k))
    }

    fn check_cluster(&self, cluster: usize) -> Result<()> {
        let clusters = self.num_clusters();
        if cluster >= clusters {
            return Err(AnalysisError::cluster_out_of_range(cluster, clusters));
        }
        Ok(())
    }

    /// The underlying counts.
    pub fn counts(&self) -> &FeatureClusterJointCounter {
        &self.counter
    }

    pub fn num_clusters(&self) -> usize {
        self.counter.num_clusters()
    }

    /// Further pruning after construction. See
    /// [`FeatureClusterJointCounter::prune_features_with_count_less_than`].
    pub fn prune_features_with_count_less_than(&mut self, threshold: u64) -> usize {
        self.counter.prune_features_with_count_less_than(threshold)
    }

    pub fn prune_only_background_features_with_count_less_than(&mut self, threshold: u64) -> usize {
        self.counter
            .prune_only_background_features_with_count_less_than(threshold)
    }

    pub fn prune_only_cluster_features_with_count_less_than(&mut self, threshold: u64) -> usize {
        self.counter
            .prune_only_cluster_features_with_count_less_than(threshold)
    }
}
