//! Partition lifecycle states.

/// Lifecycle of one partition index.
///
/// `Starting -> Running -> {Retiring | RollingBack} -> Draining -> Retired`.
/// A partition with an unknown index type goes from `Starting` straight
/// to `Retiring`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionState {
    /// Created, runner not started yet
    Starting,
    /// Runner is applying requests
    Running,
    /// Stream ended, closing the engine and removing the path
    Retiring,
    /// Rollback to zero in progress
    RollingBack,
    /// Rejecting late requests until every producer is gone
    Draining,
    /// Terminal
    Retired,
}

impl PartitionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionState::Starting => "starting",
            PartitionState::Running => "running",
            PartitionState::Retiring => "retiring",
            PartitionState::RollingBack => "rolling_back",
            PartitionState::Draining => "draining",
            PartitionState::Retired => "retired",
        }
    }

    /// Whether a transition to `next` is allowed.
    pub fn can_transition_to(&self, next: PartitionState) -> bool {
        use PartitionState::*;
        matches!(
            (self, next),
            (Starting, Running)
                | (Starting, Retiring)
                | (Running, Retiring)
                | (Running, RollingBack)
                | (Retiring, Draining)
                | (RollingBack, Draining)
                | (Draining, Retired)
        )
    }
}

impl std::fmt::Display for PartitionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
