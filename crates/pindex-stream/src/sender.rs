//! Producer handle for a partition mailbox.
//!
//! Each helper attaches a completion conduit, enqueues the request and
//! waits for the single terminal value the runner (or the retirement
//! drain) sends back.

use tokio::sync::mpsc;

use pindex_types::{StreamError, StreamOp, StreamRequest};

/// Cloneable sending side of a partition mailbox.
#[derive(Debug, Clone)]
pub struct StreamSender {
    partition: String,
    tx: mpsc::Sender<StreamRequest>,
}

impl StreamSender {
    pub(crate) fn new(partition: String, tx: mpsc::Sender<StreamRequest>) -> Self {
        Self { partition, tx }
    }

    pub fn partition(&self) -> &str {
        &self.partition
    }

    /// Whether the partition stopped receiving requests entirely.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Enqueue a request as is. Waits for mailbox capacity.
    pub async fn send(&self, req: StreamRequest) -> Result<(), StreamError> {
        self.tx.send(req).await.map_err(|e| {
            StreamError::Closed(format!(
                "partition {} mailbox closed, op: {}",
                self.partition, e.0.op
            ))
        })
    }

    /// Enqueue a request and wait for its completion.
    pub async fn request(&self, req: StreamRequest) -> Result<(), StreamError> {
        let op = req.op;
        let (req, done) = req.with_done();
        self.send(req).await?;
        done.await.map_err(|_| {
            StreamError::Closed(format!(
                "partition {} dropped completion, op: {}",
                self.partition, op
            ))
        })?
    }

    fn build(&self, op: StreamOp) -> StreamRequest {
        StreamRequest::new(op, self.partition.clone())
    }

    /// Liveness probe.
    pub async fn noop(&self) -> Result<(), StreamError> {
        self.request(self.build(StreamOp::Noop)).await
    }

    pub async fn update(
        &self,
        key: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
    ) -> Result<(), StreamError> {
        let req = self.build(StreamOp::Update).with_key(key).with_value(value);
        self.request(req).await
    }

    pub async fn delete(&self, key: impl Into<Vec<u8>>) -> Result<(), StreamError> {
        self.request(self.build(StreamOp::Delete).with_key(key)).await
    }

    pub async fn flush(&self) -> Result<(), StreamError> {
        self.request(self.build(StreamOp::Flush)).await
    }

    /// Ask the partition to roll back to zero.
    ///
    /// Returns once the runner has torn the partition down, before the
    /// manager has been told.
    pub async fn rollback(&self) -> Result<(), StreamError> {
        self.request(self.build(StreamOp::Rollback)).await
    }

    /// Read a metadata value. `Ok(None)` when the key is unset.
    pub async fn get_meta(&self, key: impl Into<Vec<u8>>) -> Result<Option<Vec<u8>>, StreamError> {
        let (req, meta) = self.build(StreamOp::GetMeta).with_key(key).with_meta_reply();
        self.request(req).await?;
        // The reply conduit is retired before the completion is sent.
        Ok(meta.await.ok())
    }

    pub async fn set_meta(
        &self,
        key: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
    ) -> Result<(), StreamError> {
        let req = self.build(StreamOp::SetMeta).with_key(key).with_value(value);
        self.request(req).await
    }
}
