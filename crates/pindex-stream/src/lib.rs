//! # pindex-stream
//!
//! Keeps one partition of a full-text index consistent with an upstream
//! change stream.
//!
//! Each [`PartitionIndex`] is driven by exactly one task that consumes its
//! mailbox in order and applies requests to the partition's
//! [`pindex_types::IndexEngine`]. Producers talk to it through
//! [`StreamSender`].
//!
//! ## Lifecycle
//!
//! - Graceful: when every producer drops its sender the runner exits, the
//!   driver closes the engine and removes the partition directory.
//! - Rollback: a ROLLBACK request tears the partition down inline, answers
//!   the requester, then calls [`PIndexManager::close_pindex`] and
//!   [`PIndexManager::kick`] so the partition is rebuilt from scratch.
//!
//! Either way, requests that arrive afterwards are answered with
//! [`pindex_types::StreamError::AlreadyDone`] until the mailbox closes.
//!
//! ## Example
//!
//! ```ignore
//! let (pindex, sender) = PartitionIndex::open("beer-sample_0", Some("tantivy"), &settings)?;
//! let handle = pindex.start(manager);
//!
//! sender.update("doc1", r#"{"name":"21A IPA"}"#).await?;
//! sender.set_meta("seq", "42").await?;
//!
//! drop(sender);
//! let summary = handle.await?;
//! ```

pub mod lifecycle;
pub mod logging;
pub mod manager;
pub mod pindex;
pub mod runner;
pub mod sender;
pub mod state;

pub use lifecycle::RetiredSummary;
pub use logging::init_tracing;
pub use manager::{PIndexManager, KICK_STREAM_ROLLBACK};
pub use pindex::{IndexKind, PartitionIndex};
pub use runner::{run_stream, StreamOutcome};
pub use sender::StreamSender;
pub use state::PartitionState;
