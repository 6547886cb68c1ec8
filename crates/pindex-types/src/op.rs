//! Stream operation codes.
//!
//! Every request delivered to a partition mailbox carries exactly one of
//! these operations. The runner dispatches on it.

use serde::{Deserialize, Serialize};

/// Operation carried by a stream request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamOp {
    /// Liveness probe, no effect on the index
    Noop,
    /// Index (insert or replace) a document
    Update,
    /// Remove a document
    Delete,
    /// Remove every document from the partition
    Flush,
    /// Discard all partition state and rebuild from scratch
    Rollback,
    /// Read an internal metadata value
    GetMeta,
    /// Write an internal metadata value
    SetMeta,
}

impl StreamOp {
    /// All operations, in wire order.
    pub const ALL: [StreamOp; 7] = [
        StreamOp::Noop,
        StreamOp::Update,
        StreamOp::Delete,
        StreamOp::Flush,
        StreamOp::Rollback,
        StreamOp::GetMeta,
        StreamOp::SetMeta,
    ];

    /// Stable name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            StreamOp::Noop => "noop",
            StreamOp::Update => "update",
            StreamOp::Delete => "delete",
            StreamOp::Flush => "flush",
            StreamOp::Rollback => "rollback",
            StreamOp::GetMeta => "get-meta",
            StreamOp::SetMeta => "set-meta",
        }
    }

    /// Parse from a log name, returning None for unknown names.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == s)
    }

    /// Whether the operation addresses a document or metadata slot by key.
    pub fn requires_key(&self) -> bool {
        matches!(
            self,
            StreamOp::Update | StreamOp::Delete | StreamOp::GetMeta | StreamOp::SetMeta
        )
    }
}

impl std::fmt::Display for StreamOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for StreamOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown stream op: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_names() {
        assert_eq!(StreamOp::Update.name(), "update");
        assert_eq!(StreamOp::GetMeta.to_string(), "get-meta");
        assert_eq!(StreamOp::parse("set-meta"), Some(StreamOp::SetMeta));
        assert_eq!(StreamOp::parse("bogus"), None);
        assert!("rollback".parse::<StreamOp>().is_ok());
        assert!("ROLLBACK".parse::<StreamOp>().is_err());
    }

    #[test]
    fn test_requires_key() {
        assert!(StreamOp::Update.requires_key());
        assert!(StreamOp::GetMeta.requires_key());
        assert!(!StreamOp::Noop.requires_key());
        assert!(!StreamOp::Rollback.requires_key());
        assert!(!StreamOp::Flush.requires_key());
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&StreamOp::GetMeta).unwrap();
        assert_eq!(json, "\"get_meta\"");
    }
}
