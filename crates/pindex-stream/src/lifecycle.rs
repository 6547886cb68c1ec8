//! Partition lifecycle driver.
//!
//! Runs the stream runner for a partition, tears the partition down when
//! the runner did not already do so, then rejects late requests until
//! every producer has let go of the mailbox.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use pindex_types::{StreamError, StreamRequest};

use crate::manager::PIndexManager;
use crate::pindex::{IndexKind, PartitionIndex};
use crate::runner::{run_stream, StreamOutcome};
use crate::state::PartitionState;

/// What happened to a partition between start and retirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetiredSummary {
    /// How the runner ended. None when no runner was started.
    pub outcome: Option<StreamOutcome>,
    /// Requests rejected by the post-teardown drain
    pub rejected: usize,
}

/// Answer a request that reached an already retired partition.
pub(crate) fn reject_retired(partition: &str, mut req: StreamRequest) {
    let op = req.op;
    req.complete(Err(StreamError::AlreadyDone {
        partition: partition.to_string(),
        op,
    }));
}

async fn drain(partition: &str, stream: &mut mpsc::Receiver<StreamRequest>) -> usize {
    let mut rejected = 0;
    while let Some(req) = stream.recv().await {
        warn!(partition, op = %req.op, key = %req.key_str(), "Rejecting request, partition already done");
        reject_retired(partition, req);
        rejected += 1;
    }
    rejected
}

impl PartitionIndex {
    /// Spawn [`PartitionIndex::run`] on the current tokio runtime.
    pub fn start(self: &Arc<Self>, mgr: Arc<dyn PIndexManager>) -> JoinHandle<RetiredSummary> {
        tokio::spawn(Arc::clone(self).run(mgr))
    }

    /// Drive the partition from start to retirement.
    ///
    /// Returns once the mailbox is closed by every producer. Only the
    /// first call runs the stream; later calls return immediately.
    pub async fn run(self: Arc<Self>, mgr: Arc<dyn PIndexManager>) -> RetiredSummary {
        let Some(mut stream) = self.take_stream() else {
            warn!(partition = %self.name(), "Partition already has a runner");
            return RetiredSummary {
                outcome: None,
                rejected: 0,
            };
        };

        let outcome = match IndexKind::parse(self.index_type()) {
            Some(kind) => {
                info!(partition = %self.name(), index_type = %kind, "Partition stream starting");
                self.set_state(PartitionState::Running);
                let outcome = run_stream(mgr.as_ref(), &self, &mut stream).await;
                info!(partition = %self.name(), outcome = ?outcome, "Partition stream done");
                Some(outcome)
            }
            None => {
                error!(
                    partition = %self.name(),
                    index_type = %self.index_type(),
                    "Unknown index type, partition not serviced"
                );
                None
            }
        };

        match outcome {
            None | Some(StreamOutcome::RetiredGracefully) => {
                self.set_state(PartitionState::Retiring);
                if let Err(e) = self.teardown() {
                    error!(partition = %self.name(), error = %e, "Partition teardown failed");
                }
            }
            // The rollback already closed the engine and removed the path.
            Some(StreamOutcome::RetiredViaRollback) => {}
        }

        self.set_state(PartitionState::Draining);
        let rejected = drain(self.name(), &mut stream).await;

        self.set_state(PartitionState::Retired);
        info!(partition = %self.name(), rejected, "Partition retired");

        RetiredSummary { outcome, rejected }
    }
}
