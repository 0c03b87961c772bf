//! Cluster membership tests.
//!
//! When counting features per cluster, every document has to be attributed
//! to zero or more clusters. All soft/fuzzy interpretation of the cluster
//! vector happens here; the counter only ever sees cluster indices.

use serde::{Deserialize, Serialize};

/// Decides which clusters a document's features are counted towards.
pub trait ClusterMembershipTest: Send + Sync {
    /// Push the indices of the clusters the document belongs to into `out`.
    ///
    /// `out` is cleared by the caller. Indices must be `< cluster_vector.len()`
    /// and must not repeat.
    fn clusters(&self, cluster_vector: &[f64], out: &mut Vec<usize>);
}

/// Attribute the document only to its highest-probability cluster.
///
/// Ties go to the lowest index. NaN entries are ignored; a vector with no
/// comparable entries attributes the document nowhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighestProbabilityOnly;

impl ClusterMembershipTest for HighestProbabilityOnly {
    fn clusters(&self, cluster_vector: &[f64], out: &mut Vec<usize>) {
        let mut best: Option<(usize, f64)> = None;
        for (i, &p) in cluster_vector.iter().enumerate() {
            if p.is_nan() {
                continue;
            }
            match best {
                Some((_, b)) if p <= b => {}
                _ => best = Some((i, p)),
            }
        }
        if let Some((i, _)) = best {
            out.push(i);
        }
    }
}

/// Attribute the document to every cluster whose membership value is at
/// least `threshold`.
#[derive(Debug, Clone, Copy)]
pub struct MembershipAboveThreshold {
    pub threshold: f64,
}

impl MembershipAboveThreshold {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl ClusterMembershipTest for MembershipAboveThreshold {
    fn clusters(&self, cluster_vector: &[f64], out: &mut Vec<usize>) {
        out.extend(
            cluster_vector
                .iter()
                .enumerate()
                .filter(|(_, &p)| p >= self.threshold)
                .map(|(i, _)| i),
        );
    }
}

/// Serializable selector for the built-in membership tests.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum MembershipMethod {
    #[default]
    HighestProbabilityOnly,
    AboveThreshold { threshold: f64 },
}

impl MembershipMethod {
    /// Instantiate the membership test this method names.
    pub fn build(&self) -> Box<dyn ClusterMembershipTest> {
        match *self {
            Self::HighestProbabilityOnly => Box::new(HighestProbabilityOnly),
            Self::AboveThreshold { threshold } => Box::new(MembershipAboveThreshold::new(threshold)),
        }
    }
}
