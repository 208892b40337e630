//! Session manager traits

use async_trait::async_trait;
use netpush_api::{ConfigDocument, DeviceDescriptor};

use crate::error::SessionError;

/// Lifecycle of one management session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unopened,
    Open,
    LockHeld,
    Closed,
}

/// Opens management sessions to devices
///
/// Implementations carry the process-wide connection profile; `open` is a
/// single attempt and never retries.
#[async_trait]
pub trait SessionManager: Send + Sync {
    async fn open(&self, device: &DeviceDescriptor) -> Result<Box<dyn ConfigSession>, SessionError>;
}

/// One live management session, exclusively owned by a single transaction
#[async_trait]
pub trait ConfigSession: Send {
    /// Take the exclusive lock on the running datastore
    async fn lock(&mut self) -> Result<(), SessionError>;

    /// Submit the document as a single edit against the running datastore
    async fn apply(&mut self, document: &ConfigDocument) -> Result<(), SessionError>;

    /// Release the lock
    async fn unlock(&mut self) -> Result<(), SessionError>;

    /// Tear the session down; calling it on a closed session is a no-op
    async fn close(&mut self) -> Result<(), SessionError>;

    fn state(&self) -> SessionState;
}
