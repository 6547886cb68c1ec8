//! Stream requests and their reply conduits.
//!
//! A request may carry a completion conduit (`done`). The runner sends
//! exactly one terminal value on it: `Ok(())` when the operation
//! succeeded, or the error that stopped it. A GET_META request may also
//! carry a `misc` conduit that receives the metadata bytes; it is
//! dropped empty when there is nothing to deliver.

use std::borrow::Cow;

use tokio::sync::oneshot;

use crate::error::StreamError;
use crate::op::StreamOp;

/// Sending half of a completion conduit.
pub type DoneSender = oneshot::Sender<Result<(), StreamError>>;
/// Receiving half of a completion conduit.
pub type DoneReceiver = oneshot::Receiver<Result<(), StreamError>>;
/// Sending half of a GET_META reply conduit.
pub type MetaSender = oneshot::Sender<Vec<u8>>;
/// Receiving half of a GET_META reply conduit.
pub type MetaReceiver = oneshot::Receiver<Vec<u8>>;

/// One unit of work for a partition mailbox.
#[derive(Debug)]
pub struct StreamRequest {
    pub op: StreamOp,
    /// Logical partition identifier, for diagnostics only
    pub partition: String,
    /// Document id or metadata key
    pub key: Vec<u8>,
    /// Document body (UPDATE) or metadata bytes (SET_META)
    pub value: Vec<u8>,
    /// GET_META reply conduit
    pub misc: Option<MetaSender>,
    /// Completion conduit
    pub done: Option<DoneSender>,
}

impl StreamRequest {
    /// Create a request with no key, value or conduits.
    pub fn new(op: StreamOp, partition: impl Into<String>) -> Self {
        Self {
            op,
            partition: partition.into(),
            key: Vec::new(),
            value: Vec::new(),
            misc: None,
            done: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_value(mut self, value: impl Into<Vec<u8>>) -> Self {
        self.value = value.into();
        self
    }

    /// Attach a completion conduit, returning the receiving half.
    pub fn with_done(mut self) -> (Self, DoneReceiver) {
        let (tx, rx) = oneshot::channel();
        self.done = Some(tx);
        (self, rx)
    }

    /// Attach a GET_META reply conduit, returning the receiving half.
    pub fn with_meta_reply(mut self) -> (Self, MetaReceiver) {
        let (tx, rx) = oneshot::channel();
        self.misc = Some(tx);
        (self, rx)
    }

    /// Key rendered for log lines.
    pub fn key_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.key)
    }

    /// Send the terminal value on the completion conduit, if any.
    ///
    /// Consumes the conduit so it can never be signaled twice. A producer
    /// that stopped listening is not an error.
    pub fn complete(&mut self, result: Result<(), StreamError>) {
        if let Some(done) = self.done.take() {
            let _ = done.send(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let req = StreamRequest::new(StreamOp::Update, "p1")
            .with_key("doc1")
            .with_value(b"{\"a\":1}".to_vec());
        assert_eq!(req.op, StreamOp::Update);
        assert_eq!(req.partition, "p1");
        assert_eq!(req.key_str(), "doc1");
        assert_eq!(req.value, b"{\"a\":1}");
        assert!(req.done.is_none());
        assert!(req.misc.is_none());
    }

    #[tokio::test]
    async fn test_complete_signals_once() {
        let (mut req, rx) = StreamRequest::new(StreamOp::Delete, "p1")
            .with_key("doc1")
            .with_done();

        req.complete(Ok(()));
        assert!(req.done.is_none());
        // Second call is a no-op: the conduit is already retired.
        req.complete(Err(StreamError::Closed("late".to_string())));

        assert!(rx.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_complete_without_listener() {
        let (mut req, rx) = StreamRequest::new(StreamOp::Noop, "p1").with_done();
        drop(rx);
        req.complete(Ok(()));
    }

    #[tokio::test]
    async fn test_meta_reply_dropped_empty() {
        let (req, rx) = StreamRequest::new(StreamOp::GetMeta, "p1")
            .with_key("k")
            .with_meta_reply();
        drop(req);
        assert!(rx.await.is_err());
    }
}
