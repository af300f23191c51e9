//! Durable storage and command-transport contracts.
//!
//! Two host-provided collaborators live here: the cold tier backing
//! `core-cache`'s two-tier design, and the reply sender a command transport
//! uses to acknowledge queued commands.

use crate::{error::Result, platform::PlatformSendSync};
use async_trait::async_trait;

/// Durable async key-value store. Only reads and writes are required —
/// implementations are free to back this with any embedded database, a
/// flat-file store, or a remote cache, as long as `get`/`put`/`delete` are
/// durable across process restarts.
#[async_trait]
pub trait DurableStore: PlatformSendSync {
    /// Reads the raw bytes stored under `key`, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Writes `value` under `key`, overwriting any prior value.
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Removes `key`. A missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Lists keys under `prefix`, for eviction sweeps that need to enumerate
    /// a kind's entries without a secondary index.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Outcome reported back to the command sender once a queued command has
/// run to completion.
#[derive(Debug, Clone)]
pub enum CommandOutcome {
    Success,
    Error(String),
}

/// Sends the reply for a previously dequeued command. Commands whose key
/// starts with `local/` are fire-and-forget — the engine does not call
/// `send_reply` for them, and implementations should not expect one.
#[async_trait]
pub trait CommandReplySender: PlatformSendSync {
    /// Delivers `outcome` for the command identified by `reply_key`.
    async fn send_reply(&self, reply_key: &str, outcome: CommandOutcome) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_outcome_variants_are_constructible() {
        let ok = CommandOutcome::Success;
        let err = CommandOutcome::Error("boom".to_string());
        assert!(matches!(ok, CommandOutcome::Success));
        assert!(matches!(err, CommandOutcome::Error(_)));
    }
}
