//! Feature/cluster joint counting.
//!
//! A [`FeatureClusterJointCounter`] turns clustered documents (and optionally
//! a separate background collection) into per-cluster feature counts and
//! per-feature prior counts. Two pluggable policies shape the counts:
//!
//! - a [`CountingPolicy`] decides what repeated occurrences of a feature
//!   inside one document are worth;
//! - a [`ClusterMembershipTest`] decides which clusters a document counts
//!   towards.
//!
//! Counting is a parallel reduction: each rayon worker folds its share of
//! documents into a partial [`CountTables`] and the partials are merged by
//! exact integer addition, so the result does not depend on document order.
//!
//! Without a background collection the prior comes from the clustered
//! documents themselves, and every document contributes to it whether or
//! not the membership test attributes it to any cluster.

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::errors::{AnalysisError, Result};
use crate::types::{ClusteredProcessedInstance, FeatureId, ProcessedInstance};

use super::membership::ClusterMembershipTest;

// ============================================================================
// Counting policies
// ============================================================================

/// Decides how a document's features translate into counts.
pub trait CountingPolicy: Send + Sync {
    /// Add this document's `(feature, count)` contributions to `out`.
    ///
    /// `out` is empty on entry.
    fn document_counts(&self, features: &[FeatureId], out: &mut FxHashMap<FeatureId, u64>);
}

/// A feature counts once per document, however often it occurs.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureBasedCounts;

impl CountingPolicy for FeatureBasedCounts {
    fn document_counts(&self, features: &[FeatureId], out: &mut FxHashMap<FeatureId, u64>) {
        for &f in features {
            out.insert(f, 1);
        }
    }
}

/// A feature counts once per occurrence.
#[derive(Debug, Clone, Copy, Default)]
pub struct OccurrenceBasedCounts;

impl CountingPolicy for OccurrenceBasedCounts {
    fn document_counts(&self, features: &[FeatureId], out: &mut FxHashMap<FeatureId, u64>) {
        for &f in features {
            *out.entry(f).or_insert(0) += 1;
        }
    }
}

/// Serializable selector for the built-in counting policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountingMethod {
    #[default]
    FeatureBased,
    OccurrenceBased,
}

impl CountingMethod {
    /// Instantiate the policy this method names.
    pub fn build(&self) -> Box<dyn CountingPolicy> {
        match self {
            Self::FeatureBased => Box::new(FeatureBasedCounts),
            Self::OccurrenceBased => Box::new(OccurrenceBasedCounts),
        }
    }
}

// ============================================================================
// Count tables
// ============================================================================

/// Raw counts. Dimensions are fixed by `cluster_counts.len()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountTables {
    /// Per cluster: feature → count
    cluster_counts: Vec<FxHashMap<FeatureId, u64>>,
    /// Per cluster: sum of all counts attributed to it
    cluster_totals: Vec<u64>,
    /// Feature → prior (population) count
    prior_counts: FxHashMap<FeatureId, u64>,
    /// Sum of all prior counts
    prior_total: u64,
}

impl CountTables {
    /// Empty tables for `num_clusters` clusters.
    pub fn new(num_clusters: usize) -> Self {
        Self {
            cluster_counts: vec![FxHashMap::default(); num_clusters],
            cluster_totals: vec![0; num_clusters],
            prior_counts: FxHashMap::default(),
            prior_total: 0,
        }
    }

    /// Add `other` into `self`. Both must have the same cluster count.
    pub fn merge(mut self, other: CountTables) -> Self {
        for (mine, theirs) in self.cluster_counts.iter_mut().zip(other.cluster_counts) {
            for (f, c) in theirs {
                *mine.entry(f).or_insert(0) += c;
            }
        }
        for (mine, theirs) in self.cluster_totals.iter_mut().zip(other.cluster_totals) {
            *mine += theirs;
        }
        for (f, c) in other.prior_counts {
            *self.prior_counts.entry(f).or_insert(0) += c;
        }
        self.prior_total += other.prior_total;
        self
    }

    fn add_to_clusters(&mut self, clusters: &[usize], counts: &FxHashMap<FeatureId, u64>) {
        let doc_total: u64 = counts.values().sum();
        for &c in clusters {
            let table = &mut self.cluster_counts[c];
            for (&f, &n) in counts {
                *table.entry(f).or_insert(0) += n;
            }
            self.cluster_totals[c] += doc_total;
        }
    }

    fn add_to_prior(&mut self, counts: &FxHashMap<FeatureId, u64>) {
        for (&f, &n) in counts {
            *self.prior_counts.entry(f).or_insert(0) += n;
            self.prior_total += n;
        }
    }
}

// ============================================================================
// Joint counter
// ============================================================================

/// Per-feature, per-cluster counts plus per-feature prior counts.
pub struct FeatureClusterJointCounter {
    policy: Box<dyn CountingPolicy>,
    tables: CountTables,
    background: bool,
}

impl std::fmt::Debug for FeatureClusterJointCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureClusterJointCounter")
            .field("num_clusters", &self.num_clusters())
            .field("num_features", &self.num_features())
            .field("background", &self.background)
            .finish()
    }
}

impl Default for FeatureClusterJointCounter {
    fn default() -> Self {
        Self::new(Box::new(FeatureBasedCounts))
    }
}

impl FeatureClusterJointCounter {
    /// Create an empty counter using `policy`.
    pub fn new(policy: Box<dyn CountingPolicy>) -> Self {
        Self {
            policy,
            tables: CountTables::default(),
            background: false,
        }
    }

    /// Count features over the clustered documents only.
    ///
    /// The prior is taken from the same documents. Replaces any earlier
    /// counts.
    pub fn count(
        &mut self,
        documents: &[ClusteredProcessedInstance],
        test: &dyn ClusterMembershipTest,
    ) -> Result<()> {
        let num_clusters = check_dimensions(documents)?;
        self.tables = self.count_clustered(documents, test, num_clusters, true);
        self.background = false;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            documents = documents.len(),
            clusters = num_clusters,
            features = self.tables.prior_counts.len(),
            prior_total = self.tables.prior_total,
            "counted clustered documents"
        );
        Ok(())
    }

    /// Count per-cluster features over `documents` and the prior over an
    /// independent `background` collection.
    ///
    /// Replaces any earlier counts.
    pub fn count_with_background(
        &mut self,
        documents: &[ClusteredProcessedInstance],
        background: &[ProcessedInstance],
        test: &dyn ClusterMembershipTest,
    ) -> Result<()> {
        let num_clusters = check_dimensions(documents)?;
        let mut tables = self.count_clustered(documents, test, num_clusters, false);

        let policy = self.policy.as_ref();
        let prior = background
            .par_iter()
            .fold(
                || CountTables::new(0),
                |mut partial, doc| {
                    let mut counts = FxHashMap::default();
                    policy.document_counts(&doc.features, &mut counts);
                    partial.add_to_prior(&counts);
                    partial
                },
            )
            .reduce(|| CountTables::new(0), CountTables::merge);

        tables.prior_counts = prior.prior_counts;
        tables.prior_total = prior.prior_total;
        self.tables = tables;
        self.background = true;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            documents = documents.len(),
            background = background.len(),
            clusters = num_clusters,
            prior_total = self.tables.prior_total,
            "counted clustered documents against background"
        );
        Ok(())
    }

    fn count_clustered(
        &self,
        documents: &[ClusteredProcessedInstance],
        test: &dyn ClusterMembershipTest,
        num_clusters: usize,
        include_prior: bool,
    ) -> CountTables {
        let policy = self.policy.as_ref();
        documents
            .par_iter()
            .fold(
                || CountTables::new(num_clusters),
                |mut partial, doc| {
                    let mut counts = FxHashMap::default();
                    policy.document_counts(doc.features(), &mut counts);

                    let mut clusters = Vec::new();
                    test.clusters(&doc.cluster_vector, &mut clusters);
                    clusters.retain(|&c| c < num_clusters);
                    clusters.sort_unstable();
                    clusters.dedup();

                    partial.add_to_clusters(&clusters, &counts);
                    if include_prior {
                        partial.add_to_prior(&counts);
                    }
                    partial
                },
            )
            .reduce(|| CountTables::new(num_clusters), CountTables::merge)
    }

    // ─── Pruning ────────────────────────────────────────────────────────

    /// Remove every feature whose prior count is below `threshold` from all
    /// tables. Returns the number of distinct features removed.
    ///
    /// A threshold of 1 or less does nothing.
    pub fn prune_features_with_count_less_than(&mut self, threshold: u64) -> usize {
        if threshold <= 1 {
            return 0;
        }
        let prior = &self.tables.prior_counts;
        let below = |f: &FeatureId| prior.get(f).copied().unwrap_or(0) < threshold;

        let mut removed: FxHashSet<FeatureId> = prior
            .iter()
            .filter(|(_, &c)| c < threshold)
            .map(|(&f, _)| f)
            .collect();
        for table in &self.tables.cluster_counts {
            removed.extend(table.keys().copied().filter(|f| below(f)));
        }

        for table in self.tables.cluster_counts.iter_mut() {
            table.retain(|f, _| !removed.contains(f));
        }
        self.tables.prior_counts.retain(|_, c| *c >= threshold);

        #[cfg(feature = "tracing")]
        tracing::debug!(threshold, removed = removed.len(), "pruned features");
        removed.len()
    }

    /// Remove prior entries whose count is below `threshold`, leaving the
    /// per-cluster counts alone. Returns the number of entries removed.
    ///
    /// Features without a prior drop out of every cluster's candidate domain.
    pub fn prune_only_background_features_with_count_less_than(&mut self, threshold: u64) -> usize {
        if threshold <= 1 {
            return 0;
        }
        let before = self.tables.prior_counts.len();
        self.tables.prior_counts.retain(|_, c| *c >= threshold);
        let removed = before - self.tables.prior_counts.len();

        #[cfg(feature = "tracing")]
        tracing::debug!(threshold, removed, "pruned background features");
        removed
    }

    /// Remove `(feature, cluster)` entries whose count is below `threshold`,
    /// leaving the prior alone. Returns the number of entries removed.
    pub fn prune_only_cluster_features_with_count_less_than(&mut self, threshold: u64) -> usize {
        if threshold <= 1 {
            return 0;
        }
        let mut removed = 0;
        for table in self.tables.cluster_counts.iter_mut() {
            let before = table.len();
            table.retain(|_, c| *c >= threshold);
            removed += before - table.len();
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(threshold, removed, "pruned cluster features");
        removed
    }

    // ─── Statistics ─────────────────────────────────────────────────────

    /// P(feature | cluster): count in cluster / total counts in cluster.
    ///
    /// Zero for unknown clusters or empty clusters.
    pub fn likelihood_feature_given_cluster(&self, feature: FeatureId, cluster: usize) -> f64 {
        let total = self.cluster_total(cluster);
        if total == 0 {
            return 0.0;
        }
        self.cluster_count(feature, cluster) as f64 / total as f64
    }

    /// P(feature | not cluster): counts in every other cluster over their
    /// combined totals.
    pub fn likelihood_feature_given_not_cluster(&self, feature: FeatureId, cluster: usize) -> f64 {
        let (count, total) = self.counts_outside(feature, cluster);
        if total == 0 {
            return 0.0;
        }
        count as f64 / total as f64
    }

    /// Counts of `feature` outside `cluster`, and the total outside it.
    pub fn counts_outside(&self, feature: FeatureId, cluster: usize) -> (u64, u64) {
        (0..self.num_clusters())
            .filter(|&c| c != cluster)
            .fold((0, 0), |(count, total), c| {
                (
                    count + self.cluster_count(feature, c),
                    total + self.cluster_total(c),
                )
            })
    }

    /// P(feature): prior count / prior total. Zero if the feature has no
    /// prior count.
    pub fn feature_prior(&self, feature: FeatureId) -> f64 {
        if self.tables.prior_total == 0 {
            return 0.0;
        }
        self.prior_count(feature) as f64 / self.tables.prior_total as f64
    }

    /// Features that can be ranked for `cluster`: positive count in the
    /// cluster and a positive prior. Sorted by id.
    pub fn features_in_cluster(&self, cluster: usize) -> Vec<FeatureId> {
        let Some(table) = self.tables.cluster_counts.get(cluster) else {
            return Vec::new();
        };
        let mut features: Vec<FeatureId> = table
            .iter()
            .filter(|(f, &c)| c > 0 && self.prior_count(**f) > 0)
            .map(|(&f, _)| f)
            .collect();
        features.sort_unstable();
        features
    }

    /// Count of `feature` in `cluster`.
    pub fn cluster_count(&self, feature: FeatureId, cluster: usize) -> u64 {
        self.tables
            .cluster_counts
            .get(cluster)
            .and_then(|t| t.get(&feature))
            .copied()
            .unwrap_or(0)
    }

    /// Prior count of `feature`.
    pub fn prior_count(&self, feature: FeatureId) -> u64 {
        self.tables.prior_counts.get(&feature).copied().unwrap_or(0)
    }

    /// Total counts attributed to `cluster`.
    pub fn cluster_total(&self, cluster: usize) -> u64 {
        self.tables.cluster_totals.get(cluster).copied().unwrap_or(0)
    }

    /// Total prior counts.
    pub fn prior_total(&self) -> u64 {
        self.tables.prior_total
    }

    /// Number of clusters fixed at counting time.
    pub fn num_clusters(&self) -> usize {
        self.tables.cluster_counts.len()
    }

    /// Number of features with a prior count.
    pub fn num_features(&self) -> usize {
        self.tables.prior_counts.len()
    }

    /// Whether the prior came from a separate background collection.
    pub fn is_background_counted(&self) -> bool {
        self.background
    }

    /// The raw count tables.
    pub fn tables(&self) -> &CountTables {
        &self.tables
    }
}

/// Cluster count of the first document; every other document must agree.
fn check_dimensions(documents: &[ClusteredProcessedInstance]) -> Result<usize> {
    let first = documents.first().ok_or_else(|| {
        AnalysisError::empty_documents("cannot infer the number of clusters from zero documents")
    })?;
    let expected = first.num_clusters();
    for (i, doc) in documents.iter().enumerate() {
        if doc.num_clusters() != expected {
            return Err(AnalysisError::dimension_mismatch(expected, doc.num_clusters(), i));
        }
    }
    Ok(expected)
}
