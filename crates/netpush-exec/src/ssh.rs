//! NETCONF over SSH using the russh crate

use std::sync::Arc;

use async_trait::async_trait;
use russh::keys::ssh_key;
use russh::keys::{PrivateKeyWithHashAlg, load_secret_key};
use russh::{Channel, ChannelMsg, Disconnect, client};
use tracing::{debug, info, instrument, warn};

use netpush_api::{ConfigDocument, DeviceDescriptor};

use crate::credentials::ResolvedCredential;
use crate::error::{Operation, SessionError};
use crate::framing::{self, FrameDecoder, Framing};
use crate::profile::ConnectionProfile;
use crate::rpc::{self, RpcReply};
use crate::traits::{ConfigSession, SessionManager, SessionState};

const NETCONF_SUBSYSTEM: &str = "netconf";

/// SSH client handler for russh
#[derive(Debug)]
struct NetconfClientHandler {
    host: String,
}

impl client::Handler for NetconfClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> Result<bool, Self::Error> {
        // Host keys are not pinned (equivalent to hostkey_verify=False)
        warn!(
            host = %self.host,
            fingerprint = %server_public_key.fingerprint(ssh_key::HashAlg::Sha256),
            "accepting unverified device host key"
        );
        Ok(true)
    }
}

/// Opens NETCONF sessions with a shared connection profile
pub struct NetconfSshManager {
    profile: ConnectionProfile,
    credential: Arc<ResolvedCredential>,
}

impl std::fmt::Debug for NetconfSshManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetconfSshManager")
            .field("profile", &self.profile)
            .field("credential", &self.credential)
            .finish()
    }
}

impl NetconfSshManager {
    /// Create a manager, resolving the credential once for the whole run
    ///
    /// # Errors
    /// Returns `SessionError::Credential` if the credential cannot be resolved
    pub fn new(profile: ConnectionProfile) -> Result<Self, SessionError> {
        let credential = profile
            .credential
            .resolve()
            .map_err(|e| SessionError::Credential(e.to_string()))?;

        Ok(Self {
            profile,
            credential: Arc::new(credential),
        })
    }

    /// Get connection profile
    pub fn profile(&self) -> &ConnectionProfile {
        &self.profile
    }

    async fn authenticate(
        &self,
        handle: &mut client::Handle<NetconfClientHandler>,
    ) -> Result<(), SessionError> {
        let user = &self.profile.username;

        let auth_res = if let Some(password) = self.credential.password() {
            handle
                .authenticate_password(user, password)
                .await
                .map_err(|e| SessionError::Auth(e.to_string()))?
        } else if let Some(key_path) = self.credential.key_path() {
            let key_pair = load_secret_key(key_path, None)
                .map_err(|e| SessionError::Credential(e.to_string()))?;

            let hash_alg = handle
                .best_supported_rsa_hash()
                .await
                .ok()
                .flatten()
                .flatten();
            handle
                .authenticate_publickey(
                    user,
                    PrivateKeyWithHashAlg::new(Arc::new(key_pair), hash_alg),
                )
                .await
                .map_err(|e| SessionError::Auth(e.to_string()))?
        } else {
            return Err(SessionError::Auth(
                "no authentication method available".to_string(),
            ));
        };

        if !auth_res.success() {
            return Err(SessionError::Auth(format!(
                "device rejected credentials for {user}"
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl SessionManager for NetconfSshManager {
    #[instrument(skip(self, device), fields(host = %device.hostname, addr = %device.management_address))]
    async fn open(&self, device: &DeviceDescriptor) -> Result<Box<dyn ConfigSession>, SessionError> {
        info!(
            port = self.profile.port,
            user = %self.profile.username,
            "connecting to NETCONF"
        );

        let config = Arc::new(client::Config::default());
        let handler = NetconfClientHandler {
            host: device.hostname.clone(),
        };

        let mut handle = client::connect(
            config,
            (device.management_address.as_str(), self.profile.port),
            handler,
        )
        .await
        .map_err(|e| SessionError::Connect(e.to_string()))?;

        self.authenticate(&mut handle).await?;

        let channel = handle
            .channel_open_session()
            .await
            .map_err(|e| SessionError::Connect(e.to_string()))?;
        channel
            .request_subsystem(true, NETCONF_SUBSYSTEM)
            .await
            .map_err(|e| SessionError::Connect(e.to_string()))?;

        let mut session = NetconfSession::new(device.hostname.clone(), handle, channel);
        if let Err(e) = session.exchange_hello().await {
            session.shutdown_transport().await.ok();
            return Err(e);
        }

        info!(
            session_id = session.session_id().unwrap_or("-"),
            framing = ?session.framing,
            "NETCONF session established"
        );

        Ok(Box::new(session))
    }
}

/// One NETCONF session on an SSH `netconf` subsystem channel
pub struct NetconfSession {
    host: String,
    handle: client::Handle<NetconfClientHandler>,
    channel: Channel<client::Msg>,
    decoder: FrameDecoder,
    framing: Framing,
    next_message_id: u64,
    session_id: Option<String>,
    state: SessionState,
}

impl NetconfSession {
    fn new(
        host: String,
        handle: client::Handle<NetconfClientHandler>,
        channel: Channel<client::Msg>,
    ) -> Self {
        Self {
            host,
            handle,
            channel,
            decoder: FrameDecoder::new(),
            framing: Framing::EndOfMessage,
            next_message_id: 1,
            session_id: None,
            state: SessionState::Unopened,
        }
    }

    /// Server-assigned session id
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    async fn send(&mut self, message: &str) -> Result<(), SessionError> {
        let bytes = framing::encode(message, self.framing);
        self.channel
            .data(&bytes[..])
            .await
            .map_err(|e| SessionError::Io(e.to_string()))
    }

    async fn read_message(&mut self) -> Result<String, SessionError> {
        loop {
            if let Some(message) = self.decoder.next_message(self.framing)? {
                return Ok(message);
            }

            match self.channel.wait().await {
                Some(ChannelMsg::Data { data }) => self.decoder.extend(&data),
                Some(ChannelMsg::Failure) => {
                    return Err(SessionError::Protocol(
                        "netconf subsystem request refused".to_string(),
                    ));
                }
                Some(ChannelMsg::Eof | ChannelMsg::Close) | None => {
                    self.state = SessionState::Closed;
                    return Err(SessionError::Closed);
                }
                Some(_) => {}
            }
        }
    }

    async fn exchange_hello(&mut self) -> Result<(), SessionError> {
        self.send(&rpc::client_hello()).await?;

        let raw = self.read_message().await?;
        let hello = rpc::parse_hello(&raw)?;

        if hello.supports_base_11() {
            self.framing = Framing::Chunked;
        }
        self.session_id = hello.session_id;
        self.state = SessionState::Open;

        Ok(())
    }

    /// Send one RPC and wait for its reply
    ///
    /// Replies carrying another `message-id` (left over from an abandoned
    /// request) are skipped.
    async fn rpc(&mut self, operation: Operation, body: &str) -> Result<RpcReply, SessionError> {
        if self.state == SessionState::Closed {
            return Err(SessionError::Closed);
        }

        let message_id = self.next_message_id;
        self.next_message_id += 1;

        debug!(host = %self.host, %operation, message_id, "sending rpc");
        self.send(&rpc::render_rpc(message_id, body)).await?;

        loop {
            let raw = self.read_message().await?;
            let reply = rpc::parse_reply(&raw)?;

            if !reply.answers(message_id) {
                warn!(
                    host = %self.host,
                    expected = message_id,
                    received = reply.message_id.as_deref().unwrap_or("-"),
                    "discarding stale rpc-reply"
                );
                continue;
            }

            if let Some(error) = reply.failure() {
                return Err(SessionError::Rpc {
                    operation,
                    message: error.summary(),
                });
            }

            return Ok(reply);
        }
    }

    async fn shutdown_transport(&mut self) -> Result<(), SessionError> {
        self.state = SessionState::Closed;
        self.channel.close().await.ok();
        self.handle
            .disconnect(Disconnect::ByApplication, "", "English")
            .await
            .map_err(|e| SessionError::Io(e.to_string()))?;
        info!(host = %self.host, "NETCONF transport disconnected");
        Ok(())
    }
}

#[async_trait]
impl ConfigSession for NetconfSession {
    #[instrument(skip(self), fields(host = %self.host))]
    async fn lock(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Closed | SessionState::Unopened => Err(SessionError::Closed),
            SessionState::LockHeld => Ok(()),
            SessionState::Open => {
                self.rpc(Operation::Lock, &rpc::lock_running()).await?;
                self.state = SessionState::LockHeld;
                info!("running datastore locked");
                Ok(())
            }
        }
    }

    #[instrument(skip(self, document), fields(host = %self.host, bytes = document.len()))]
    async fn apply(&mut self, document: &ConfigDocument) -> Result<(), SessionError> {
        if self.state != SessionState::LockHeld {
            return Err(SessionError::Protocol(
                "edit-config requires the running datastore lock".to_string(),
            ));
        }

        self.rpc(Operation::Apply, &rpc::edit_config_running(document.as_str()))
            .await?;
        info!("configuration applied");
        Ok(())
    }

    #[instrument(skip(self), fields(host = %self.host))]
    async fn unlock(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::LockHeld {
            return Err(SessionError::Protocol(
                "unlock requested without a held lock".to_string(),
            ));
        }

        let result = self.rpc(Operation::Unlock, &rpc::unlock_running()).await;
        if self.state == SessionState::LockHeld {
            self.state = SessionState::Open;
        }
        result.map(|_| info!("running datastore unlocked"))
    }

    #[instrument(skip(self), fields(host = %self.host))]
    async fn close(&mut self) -> Result<(), SessionError> {
        if self.state == SessionState::Closed {
            return Ok(());
        }

        // The device may drop the channel before answering close-session
        if let Err(e) = self.rpc(Operation::Close, &rpc::close_session()).await {
            debug!(error = %e, "close-session not acknowledged");
        }

        self.shutdown_transport().await
    }

    fn state(&self) -> SessionState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CredentialSource;

    #[test]
    fn test_manager_requires_resolvable_credential() {
        let profile = ConnectionProfile::new(
            "netops",
            CredentialSource::PasswordEnv {
                var: "NETPUSH_UNSET_PASSWORD_VAR".to_string(),
            },
        );
        let err = NetconfSshManager::new(profile).unwrap_err();
        assert!(matches!(err, SessionError::Credential(_)));
    }

    #[test]
    fn test_manager_keeps_profile() {
        let profile = ConnectionProfile::new(
            "netops",
            CredentialSource::Password {
                password: "pw".to_string(),
            },
        )
        .with_port(2830);
        let manager = NetconfSshManager::new(profile).unwrap();
        assert_eq!(manager.profile().port, 2830);
        assert!(!format!("{manager:?}").contains("\"pw\""));
    }

    // Requires a NETCONF-capable device
    #[tokio::test]
    #[ignore = "requires NETCONF server"]
    async fn test_netconf_round_trip() {
        let profile = ConnectionProfile::new(
            "admin",
            CredentialSource::PasswordEnv {
                var: "NETPUSH_TEST_PASSWORD".to_string(),
            },
        );
        let manager = NetconfSshManager::new(profile).unwrap();
        let device = DeviceDescriptor::new("lab", "lab-switch", "127.0.0.1", "lab");
        let mut session = manager.open(&device).await.unwrap();
        session.lock().await.unwrap();
        session.unlock().await.unwrap();
        session.close().await.unwrap();
        assert_eq!(session.state(), SessionState::Closed);
    }
}
