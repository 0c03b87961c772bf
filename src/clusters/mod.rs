//! Counting and ranking features over clustered documents.
//!
//! ## Submodules
//!
//! - [`membership`]: which clusters a document counts towards
//! - [`counter`]: per-cluster and prior feature counts, pruning
//! - [`analysis`]: orchestration and top-K ranking queries

pub mod analysis;
pub mod counter;
pub mod membership;

pub use analysis::{AnalysisConfig, ClusterFeatureAnalysis, OrderingMethod, PruneThresholds};
pub use counter::{
    CountTables, CountingMethod, CountingPolicy, FeatureBasedCounts, FeatureClusterJointCounter,
    OccurrenceBasedCounts,
};
pub use membership::{
    ClusterMembershipTest, HighestProbabilityOnly, MembershipAboveThreshold, MembershipMethod,
};
