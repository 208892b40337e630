//! Collaborator factory: sessions, templates and controller access

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use netpush_api::{DeviceDescriptor, InterfaceSelection};
use netpush_core::InterfaceResolver;
use netpush_exec::{NetconfSshManager, SessionManager};
use netpush_inventory::{ClientContext, ControllerClient, InterfaceRules};
use netpush_templates::{BaselineTemplate, PayloadBuilder, PortSecurityTemplate, TemplateKind};

use crate::config::Config;
use crate::error::SetupError;

/// Build the NETCONF session manager from the `[netconf]` section
///
/// Resolves the credential up front so a bad secret fails setup.
pub fn session_manager(config: &Config) -> Result<Arc<dyn SessionManager>, SetupError> {
    let profile = config.connection_profile()?.clone();
    info!(username = %profile.username, port = profile.port, "preparing NETCONF sessions");
    Ok(Arc::new(NetconfSshManager::new(profile)?))
}

/// Payload builder for a workflow
pub fn payload_builder(kind: TemplateKind, config: &Config) -> Arc<dyn PayloadBuilder> {
    match kind {
        TemplateKind::Baseline => Arc::new(BaselineTemplate::new(config.baseline.clone())),
        TemplateKind::PortSecurity => {
            Arc::new(PortSecurityTemplate::new(config.port_security.clone()))
        }
    }
}

/// Authenticated controller client
pub async fn controller(config: &Config) -> Result<(ControllerClient, ClientContext), SetupError> {
    let settings = &config.controller;
    let base_url = settings.base_url()?;
    let password = settings.password()?;

    let client = ControllerClient::new(
        settings.endpoints.clone(),
        settings.insecure_tls,
        settings.timeout(),
    )?;
    let ctx = client
        .authenticate(&base_url, &settings.username, &password)
        .await?;
    Ok((client, ctx))
}

/// Interface lookup through the controller
pub struct ControllerInterfaces {
    client: ControllerClient,
    ctx: ClientContext,
    rules: InterfaceRules,
}

impl ControllerInterfaces {
    pub fn new(client: ControllerClient, ctx: ClientContext, rules: InterfaceRules) -> Self {
        Self { client, ctx, rules }
    }
}

#[async_trait]
impl InterfaceResolver for ControllerInterfaces {
    async fn select(&self, device: &DeviceDescriptor) -> InterfaceSelection {
        self.client
            .select_device_interfaces(&self.ctx, device, &self.rules)
            .await
    }
}
