//! Manager capability consumed by the stream runner.

use std::sync::Arc;

use async_trait::async_trait;

use crate::pindex::PartitionIndex;

/// Kick reason sent after a rollback to zero.
pub const KICK_STREAM_ROLLBACK: &str = "stream-rollback";

/// Owner of partition topology.
///
/// The runner only calls into the manager during a rollback, after it has
/// already answered the requester, because `close_pindex` may need to
/// stop the very feed that sent the rollback.
#[async_trait]
pub trait PIndexManager: Send + Sync {
    /// Detach and stop a partition. May coordinate with the upstream feed.
    async fn close_pindex(&self, pindex: &Arc<PartitionIndex>);

    /// Request a rebuild/rescan pass. Must not block.
    fn kick(&self, reason: &str);
}
