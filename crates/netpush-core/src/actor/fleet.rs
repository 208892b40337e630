//! `FleetActor`: Fleet-wide runs
//!
//! Runs one `DeviceActor` per device through a bounded worker pool and
//! collects exactly one outcome per device, in input order.

use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use kameo::actor::{ActorRef, WeakActorRef};
use kameo::error::ActorStopReason;
use kameo::message::{Context, Message};
use kameo::prelude::*;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

use netpush_api::{DeviceDescriptor, FleetEvent, InterfaceSelection, Outcome};
use netpush_exec::SessionManager;
use netpush_templates::PayloadBuilder;

use crate::actor::device::{DeviceActor, DeviceActorArgs};
use crate::config::{FleetRunConfig, TransactionPolicy};
use crate::error::CoreError;
use crate::message::{FleetReport, RunFleet, RunTransaction, TransactionResult};

/// Resolves the interfaces a template is rendered for
///
/// Implementations swallow their own failures and return an empty
/// selection instead.
#[async_trait::async_trait]
pub trait InterfaceResolver: Send + Sync {
    async fn select(&self, device: &DeviceDescriptor) -> InterfaceSelection;
}

/// Arguments for spawning a `FleetActor`
pub struct FleetActorArgs {
    /// Opens management sessions
    pub sessions: Arc<dyn SessionManager>,
    /// Renders the document for each device
    pub payload: Arc<dyn PayloadBuilder>,
    /// Interface lookup for templates that need it
    pub interfaces: Option<Arc<dyn InterfaceResolver>>,
    /// Run configuration
    pub config: FleetRunConfig,
    /// Event broadcast sender
    pub event_tx: broadcast::Sender<FleetEvent>,
}

/// Fleet runner
pub struct FleetActor {
    sessions: Arc<dyn SessionManager>,
    payload: Arc<dyn PayloadBuilder>,
    interfaces: Option<Arc<dyn InterfaceResolver>>,
    config: FleetRunConfig,
    event_tx: broadcast::Sender<FleetEvent>,
}

impl FleetActor {
    fn job(&self, policy: TransactionPolicy) -> DeviceJob {
        DeviceJob {
            sessions: Arc::clone(&self.sessions),
            payload: Arc::clone(&self.payload),
            interfaces: self.interfaces.clone(),
            policy,
            event_tx: self.event_tx.clone(),
        }
    }
}

/// Everything one device task needs
#[derive(Clone)]
struct DeviceJob {
    sessions: Arc<dyn SessionManager>,
    payload: Arc<dyn PayloadBuilder>,
    interfaces: Option<Arc<dyn InterfaceResolver>>,
    policy: TransactionPolicy,
    event_tx: broadcast::Sender<FleetEvent>,
}

impl DeviceJob {
    /// Run one device in its own task, converting any failure to an outcome
    async fn run(self, device: DeviceDescriptor) -> Outcome {
        let hostname = device.hostname.clone();
        let handle = tokio::spawn(self.transaction(device));

        match handle.await {
            Ok(Ok(result)) => {
                if let Some(warning) = &result.unlock_warning {
                    debug!(host = %hostname, warning = %warning, "transaction finished with unlock warning");
                }
                result.outcome
            }
            Ok(Err(e)) => {
                error!(host = %hostname, error = %e, "transaction failed");
                Outcome::connect_failed(hostname, e.to_string())
            }
            Err(e) => {
                error!(host = %hostname, error = %e, "task panicked");
                Outcome::connect_failed(hostname, format!("task panicked: {e}"))
            }
        }
    }

    async fn transaction(self, device: DeviceDescriptor) -> Result<TransactionResult, CoreError> {
        let interfaces = self.resolve_interfaces(&device).await;

        let args = DeviceActorArgs {
            device,
            interfaces,
            sessions: self.sessions,
            payload: self.payload,
            policy: self.policy,
            event_tx: self.event_tx,
        };

        let actor_ref = DeviceActor::spawn(args);
        let result = actor_ref
            .ask(RunTransaction)
            .await
            .map_err(|e| CoreError::ActorError(e.to_string()));
        actor_ref.stop_gracefully().await.ok();

        result
    }

    async fn resolve_interfaces(&self, device: &DeviceDescriptor) -> InterfaceSelection {
        if !self.payload.requires_interfaces() || self.policy.expired() {
            return InterfaceSelection::empty(device.id.clone());
        }

        match &self.interfaces {
            Some(resolver) => resolver.select(device).await,
            None => {
                debug!(host = %device.hostname, "no interface resolver configured");
                InterfaceSelection::empty(device.id.clone())
            }
        }
    }
}

impl Actor for FleetActor {
    type Args = FleetActorArgs;
    type Error = CoreError;

    async fn on_start(args: Self::Args, actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        args.config.validate()?;

        info!(
            id = %actor_ref.id(),
            template = %args.payload.kind(),
            concurrency = args.config.concurrency,
            "FleetActor starting"
        );

        Ok(Self {
            sessions: args.sessions,
            payload: args.payload,
            interfaces: args.interfaces,
            config: args.config,
            event_tx: args.event_tx,
        })
    }

    async fn on_stop(
        &mut self,
        _actor_ref: WeakActorRef<Self>,
        reason: ActorStopReason,
    ) -> Result<(), Self::Error> {
        info!(reason = ?reason, "FleetActor stopping");
        Ok(())
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Message<RunFleet> for FleetActor {
    type Reply = Result<FleetReport, CoreError>;

    async fn handle(&mut self, msg: RunFleet, _ctx: &mut Context<Self, Self::Reply>) -> Self::Reply {
        let total = msg.devices.len();
        let started_at = Utc::now();
        let job = self.job(self.config.policy_from_now());

        info!(
            total_devices = total,
            concurrency = self.config.concurrency,
            "starting fleet run"
        );

        // `buffered` keeps input order regardless of completion order
        let outcomes: Vec<Outcome> = stream::iter(msg.devices)
            .map(|device| job.clone().run(device))
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        let report = FleetReport {
            outcomes,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            total = report.total(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            "fleet run finished"
        );

        let _ = self.event_tx.send(FleetEvent::FleetCompleted {
            total: report.total(),
            succeeded: report.succeeded(),
            failed: report.failed(),
        });

        Ok(report)
    }
}
