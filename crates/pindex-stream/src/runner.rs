//! Partition stream runner.
//!
//! Applies requests to the engine in mailbox order, one at a time, and
//! answers each request's conduits. A ROLLBACK tears the partition down
//! and ends the loop.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use pindex_types::{EngineError, StreamError, StreamOp, StreamRequest};

use crate::lifecycle::reject_retired;
use crate::manager::{PIndexManager, KICK_STREAM_ROLLBACK};
use crate::pindex::PartitionIndex;
use crate::state::PartitionState;

/// How the runner loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// Every producer dropped its sender. The driver must tear down.
    RetiredGracefully,
    /// A rollback already closed the engine and removed the path.
    RetiredViaRollback,
}

/// Run the stream loop until the mailbox closes or a rollback arrives.
pub async fn run_stream(
    mgr: &dyn PIndexManager,
    pindex: &Arc<PartitionIndex>,
    stream: &mut mpsc::Receiver<StreamRequest>,
) -> StreamOutcome {
    // TODO: group consecutive UPDATE/DELETE requests into one engine batch.
    while let Some(mut req) = stream.recv().await {
        if req.op == StreamOp::Rollback {
            rollback_to_zero(mgr, pindex, stream, req).await;
            return StreamOutcome::RetiredViaRollback;
        }

        let result = apply(pindex, &mut req);

        if let Err(e) = &result {
            error!(
                op = %req.op,
                partition = %req.partition,
                key = %req.key_str(),
                error = %e,
                "Stream operation failed"
            );
        }

        // Retire the reply conduit before the completion.
        req.misc = None;
        req.complete(result.map_err(StreamError::from));
    }

    StreamOutcome::RetiredGracefully
}

fn apply(pindex: &PartitionIndex, req: &mut StreamRequest) -> Result<(), EngineError> {
    let engine = pindex.engine();

    debug!(
        op = %req.op,
        partition = %req.partition,
        key = %req.key_str(),
        "Stream request"
    );

    if req.op.requires_key() && req.key.is_empty() {
        return Err(EngineError::InvalidDocument(format!("{} requires a key", req.op)));
    }

    match req.op {
        // Stream sources use NOOP like a ping. Rollback never gets here.
        StreamOp::Noop | StreamOp::Rollback => Ok(()),
        StreamOp::Update => engine.index(&req.key, &req.value),
        StreamOp::Delete => engine.delete(&req.key),
        StreamOp::Flush => engine.delete_all(),
        StreamOp::GetMeta => {
            let value = engine.get_internal(&req.key)?;
            if let (Some(misc), Some(value)) = (req.misc.take(), value) {
                let _ = misc.send(value);
            }
            Ok(())
        }
        StreamOp::SetMeta => engine.set_internal(&req.key, &req.value),
    }
}

/// Discard all partition state and hand the partition back to the manager.
///
/// Ordering matters: the requester is answered before the manager is
/// called, since `close_pindex` may wait on the feed that is itself
/// waiting on this completion. Requests arriving while the manager call
/// is in flight are rejected so a feed blocked on a full mailbox can move.
async fn rollback_to_zero(
    mgr: &dyn PIndexManager,
    pindex: &Arc<PartitionIndex>,
    stream: &mut mpsc::Receiver<StreamRequest>,
    mut req: StreamRequest,
) {
    info!(partition = %req.partition, "Stream rollback to zero");
    pindex.set_state(PartitionState::RollingBack);

    if let Err(e) = pindex.teardown() {
        error!(partition = %pindex.name(), error = %e, "Rollback teardown failed");
    }

    req.complete(Ok(()));

    let mut close = mgr.close_pindex(pindex);
    let mut rejected = 0usize;
    loop {
        tokio::select! {
            _ = &mut close => break,
            Some(late) = stream.recv() => {
                reject_retired(pindex.name(), late);
                rejected += 1;
            }
        }
    }

    mgr.kick(KICK_STREAM_ROLLBACK);
    info!(partition = %pindex.name(), rejected, "Rollback handed to manager");
}
