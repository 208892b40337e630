//! `DeviceActor`: One configuration transaction
//!
//! Drives connect, lock, apply, unlock and close against a single device
//! and always ends in exactly one terminal state.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;
use kameo::actor::{ActorRef, WeakActorRef};
use kameo::error::ActorStopReason;
use kameo::message::{Context, Message};
use kameo::prelude::*;
use tokio::sync::broadcast;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use netpush_api::{DeviceDescriptor, FleetEvent, InterfaceSelection, Outcome};
use netpush_exec::{ConfigSession, Operation, SessionError, SessionManager};
use netpush_templates::PayloadBuilder;

use crate::config::TransactionPolicy;
use crate::error::CoreError;
use crate::message::{RunTransaction, TransactionResult};
use crate::state::{FailureKind, TransactionState};

/// Arguments for spawning a `DeviceActor`
pub struct DeviceActorArgs {
    /// Target device
    pub device: DeviceDescriptor,
    /// Interfaces resolved before the transaction starts
    pub interfaces: InterfaceSelection,
    /// Opens management sessions
    pub sessions: Arc<dyn SessionManager>,
    /// Renders the document to apply
    pub payload: Arc<dyn PayloadBuilder>,
    /// Retry and timing rules
    pub policy: TransactionPolicy,
    /// Event broadcast sender
    pub event_tx: broadcast::Sender<FleetEvent>,
}

/// Per-device actor running one transaction
pub struct DeviceActor {
    device: DeviceDescriptor,
    interfaces: InterfaceSelection,
    sessions: Arc<dyn SessionManager>,
    payload: Arc<dyn PayloadBuilder>,
    policy: TransactionPolicy,
    event_tx: broadcast::Sender<FleetEvent>,
    state: TransactionState,
    lock_attempts: u32,
    unlock_warning: Option<String>,
}

impl DeviceActor {
    /// Get the hostname
    #[must_use]
    pub fn name(&self) -> &str {
        &self.device.hostname
    }

    /// Get current state
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Transition to a new state with validation and event emission
    fn transition_to(&mut self, new_state: TransactionState) -> Result<(), CoreError> {
        if !self.state.can_transition_to(new_state) {
            return Err(CoreError::InvalidTransition {
                from: self.state,
                to: new_state,
            });
        }

        let old_state = self.state;
        self.state = new_state;

        info!(
            host = %self.device.hostname,
            from = %old_state,
            to = %new_state,
            "state transition"
        );

        let event = FleetEvent::DeviceStateChanged {
            host: self.device.hostname.clone(),
            from: old_state.to_string(),
            to: new_state.to_string(),
        };
        // No subscribers is fine
        let _ = self.event_tx.send(event);

        Ok(())
    }

    fn emit(&self, event: FleetEvent) {
        let _ = self.event_tx.send(event);
    }

    async fn run(&mut self) -> Result<Outcome, CoreError> {
        if self.state != TransactionState::Start {
            return Err(CoreError::InvalidTransition {
                from: self.state,
                to: TransactionState::Connected,
            });
        }

        let hostname = self.device.hostname.clone();

        let mut session = match self.connect().await {
            Ok(session) => session,
            Err(detail) => {
                error!(host = %hostname, error = %detail, "connect failed");
                self.transition_to(TransactionState::Failed(FailureKind::ConnectFailed))?;
                return Ok(Outcome::connect_failed(hostname, detail));
            }
        };

        // From here on the session is closed on every path
        let outcome = match self.transition_to(TransactionState::Connected) {
            Ok(()) => self.drive(session.as_mut()).await,
            Err(e) => Err(e),
        };
        self.close(session.as_mut()).await;

        outcome
    }

    async fn connect(&self) -> Result<Box<dyn ConfigSession>, String> {
        if self.policy.expired() {
            return Err("run deadline exceeded before connect".to_string());
        }

        info!(host = %self.device.hostname, addr = %self.device.management_address, "opening session");
        let limit = self.policy.budget(Operation::Open);
        within(Operation::Open, limit, self.sessions.open(&self.device))
            .await
            .map_err(|e| e.detail())
    }

    /// Lock, apply and unlock on an open session
    async fn drive(&mut self, session: &mut dyn ConfigSession) -> Result<Outcome, CoreError> {
        let hostname = self.device.hostname.clone();

        if let Err(detail) = self.acquire_lock(session).await {
            error!(host = %hostname, error = %detail, "lock unavailable");
            self.transition_to(TransactionState::Failed(FailureKind::LockUnavailable))?;
            return Ok(Outcome::lock_unavailable(hostname, detail));
        }

        // The lock is held: unlock runs before anything else can fail out
        let applied = match self.transition_to(TransactionState::Locked) {
            Ok(()) => Ok(self.apply(session).await),
            Err(e) => Err(e),
        };
        self.release_lock(session).await;
        let applied = applied?;

        if applied.is_ok() {
            self.transition_to(TransactionState::Applied)?;
        }
        self.transition_to(TransactionState::Unlocked)?;

        match applied {
            Ok(()) => {
                self.transition_to(TransactionState::Done)?;
                Ok(Outcome::success(hostname))
            }
            Err(detail) => {
                self.transition_to(TransactionState::Failed(FailureKind::ApplyFailed))?;
                Ok(Outcome::apply_failed(hostname, detail))
            }
        }
    }

    /// Try the lock up to `max_attempts` times, waiting between attempts
    async fn acquire_lock(&mut self, session: &mut dyn ConfigSession) -> Result<(), String> {
        let retry = self.policy.lock_retry;
        let max_attempts = retry.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                let wait = self
                    .policy
                    .remaining()
                    .map_or(retry.delay, |r| r.min(retry.delay));
                debug!(host = %self.device.hostname, wait = ?wait, "waiting before next lock attempt");
                sleep(wait).await;
            }

            if self.policy.expired() {
                return Err(if last_error.is_empty() {
                    "run deadline exceeded before lock".to_string()
                } else {
                    format!(
                        "run deadline exceeded after {} lock attempts: {last_error}",
                        self.lock_attempts
                    )
                });
            }

            self.lock_attempts = attempt;
            let limit = self.policy.budget(Operation::Lock);
            match within(Operation::Lock, limit, session.lock()).await {
                Ok(()) => {
                    info!(host = %self.device.hostname, attempt, "lock acquired");
                    return Ok(());
                }
                Err(e) => {
                    last_error = e.detail();
                    warn!(
                        host = %self.device.hostname,
                        attempt,
                        max_attempts,
                        error = %last_error,
                        "lock attempt failed"
                    );
                    self.emit(FleetEvent::LockAttemptFailed {
                        host: self.device.hostname.clone(),
                        attempt,
                        max_attempts,
                        error: last_error.clone(),
                    });
                }
            }
        }

        Err(format!(
            "lock not acquired after {max_attempts} attempts: {last_error}"
        ))
    }

    async fn apply(&self, session: &mut dyn ConfigSession) -> Result<(), String> {
        let document = self.payload.build(&self.device, &self.interfaces);
        info!(
            host = %self.device.hostname,
            template = %self.payload.kind(),
            interfaces = self.interfaces.len(),
            bytes = document.len(),
            "applying configuration"
        );

        let limit = self.policy.budget(Operation::Apply);
        match within(Operation::Apply, limit, session.apply(&document)).await {
            Ok(()) => {
                info!(host = %self.device.hostname, "configuration applied");
                Ok(())
            }
            Err(e) => {
                let detail = e.detail();
                error!(host = %self.device.hostname, error = %detail, "apply failed");
                Err(detail)
            }
        }
    }

    async fn release_lock(&mut self, session: &mut dyn ConfigSession) {
        let limit = self.policy.budget(Operation::Unlock);
        if let Err(e) = within(Operation::Unlock, limit, session.unlock()).await {
            let detail = e.detail();
            warn!(host = %self.device.hostname, error = %detail, "unlock failed");
            self.emit(FleetEvent::UnlockFailed {
                host: self.device.hostname.clone(),
                error: detail.clone(),
            });
            self.unlock_warning = Some(detail);
        }
    }

    async fn close(&self, session: &mut dyn ConfigSession) {
        let limit = self.policy.budget(Operation::Close);
        match within(Operation::Close, limit, session.close()).await {
            Ok(()) => debug!(host = %self.device.hostname, "session closed"),
            Err(e) => warn!(host = %self.device.hostname, error = %e, "close failed"),
        }
    }

    fn result(&self, outcome: Outcome) -> TransactionResult {
        TransactionResult {
            outcome,
            final_state: self.state,
            lock_attempts: self.lock_attempts,
            unlock_warning: self.unlock_warning.clone(),
        }
    }
}

/// Run a session call under an optional time limit
///
/// A panic inside the call becomes a protocol error so the caller still
/// reaches unlock and close.
async fn within<T, F>(operation: Operation, limit: Option<Duration>, call: F) -> Result<T, SessionError>
where
    F: Future<Output = Result<T, SessionError>>,
{
    let call = AssertUnwindSafe(call).catch_unwind();
    let caught = match limit {
        None => call.await,
        Some(limit) if limit.is_zero() => {
            return Err(SessionError::Timeout {
                operation,
                timeout: limit,
            });
        }
        Some(limit) => match timeout(limit, call).await {
            Ok(caught) => caught,
            Err(_) => {
                return Err(SessionError::Timeout {
                    operation,
                    timeout: limit,
                });
            }
        },
    };

    caught.unwrap_or_else(|payload| {
        let message = panic_message(payload.as_ref());
        error!(%operation, panic = %message, "session call panicked");
        Err(SessionError::Protocol(format!("{operation} panicked: {message}")))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl Actor for DeviceActor {
    type Args = DeviceActorArgs;
    type Error = CoreError;

    async fn on_start(args: Self::Args, actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        debug!(host = %args.device.hostname, id = %actor_ref.id(), "DeviceActor starting");

        Ok(Self {
            device: args.device,
            interfaces: args.interfaces,
            sessions: args.sessions,
            payload: args.payload,
            policy: args.policy,
            event_tx: args.event_tx,
            state: TransactionState::Start,
            lock_attempts: 0,
            unlock_warning: None,
        })
    }

    async fn on_stop(
        &mut self,
        _actor_ref: WeakActorRef<Self>,
        reason: ActorStopReason,
    ) -> Result<(), Self::Error> {
        debug!(
            host = %self.device.hostname,
            state = %self.state,
            reason = ?reason,
            "DeviceActor stopping"
        );
        Ok(())
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Message<RunTransaction> for DeviceActor {
    type Reply = Result<TransactionResult, CoreError>;

    async fn handle(
        &mut self,
        _msg: RunTransaction,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        let outcome = self.run().await?;

        self.emit(FleetEvent::DeviceCompleted {
            host: self.device.hostname.clone(),
            status: outcome.status,
            finished_at: Utc::now(),
        });

        Ok(self.result(outcome))
    }
}
