//! netpush-exec: Device management sessions
//!
//! Provides the session traits used by the transaction orchestrator and a
//! NETCONF-over-SSH implementation built on russh.

pub mod credentials;
pub mod error;
pub mod framing;
pub mod profile;
pub mod rpc;
pub mod ssh;
pub mod traits;

pub use credentials::{CredentialError, CredentialSource, ResolvedCredential};
pub use error::{Operation, SessionError};
pub use framing::{FrameDecoder, Framing, FramingError};
pub use profile::ConnectionProfile;
pub use ssh::{NetconfSession, NetconfSshManager};
pub use traits::{ConfigSession, SessionManager, SessionState};
