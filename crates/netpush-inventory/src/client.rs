//! HTTP client for the network controller

use std::fmt;
use std::time::Duration;

use netpush_api::{DeviceDescriptor, InterfaceSelection};
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::error::InventoryError;
use crate::selector::{InterfaceRules, select_interfaces};
use crate::types::{ApiEnvelope, InterfaceRecord, NetworkDeviceRecord, TokenResponse};

type Result<T> = std::result::Result<T, InventoryError>;

/// Controller endpoint paths, relative to the base URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub auth: String,
    pub devices: String,
    /// Prefix; the device id is appended
    pub interfaces: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            auth: "/dna/system/api/v1/auth/token".to_string(),
            devices: "/dna/intent/api/v1/network-device".to_string(),
            interfaces: "/dna/intent/api/v1/interface/network-device/".to_string(),
        }
    }
}

/// Authenticated session with the controller
///
/// Produced once by [`ControllerClient::authenticate`] and passed by
/// reference to every lookup.
#[derive(Clone)]
pub struct ClientContext {
    base_url: Url,
    token: String,
}

impl ClientContext {
    pub fn new(base_url: Url, token: impl Into<String>) -> Self {
        Self {
            base_url,
            token: token.into(),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).map_err(InventoryError::Url)
    }
}

impl fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientContext")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Controller API client
#[derive(Debug, Clone)]
pub struct ControllerClient {
    client: Client,
    endpoints: Endpoints,
}

impl ControllerClient {
    /// Build a client
    ///
    /// `insecure_tls` disables certificate verification; controllers are
    /// commonly deployed with self-signed certificates.
    ///
    /// # Errors
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(endpoints: Endpoints, insecure_tls: bool, timeout: Duration) -> Result<Self> {
        if insecure_tls {
            warn!("controller TLS certificate verification is disabled");
        }
        let client = Client::builder()
            .danger_accept_invalid_certs(insecure_tls)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, endpoints })
    }

    /// Create a client around an existing `reqwest::Client`
    pub fn with_client(client: Client, endpoints: Endpoints) -> Self {
        Self { client, endpoints }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Exchange basic credentials for an API token
    ///
    /// # Errors
    /// Returns `InventoryError::Auth` on a rejected login and
    /// `InventoryError::Schema` if no token is present in the reply.
    pub async fn authenticate(
        &self,
        base_url: &Url,
        username: &str,
        password: &str,
    ) -> Result<ClientContext> {
        let url = base_url.join(&self.endpoints.auth)?;
        info!(url = %url, username, "requesting controller token");

        let response = self
            .client
            .post(url)
            .basic_auth(username, Some(password))
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(InventoryError::Auth(format!("{status}: {body}")));
        }

        let token: TokenResponse = decode(&body, "token")?;
        Ok(ClientContext::new(base_url.clone(), token.token))
    }

    /// Resolve seed hostnames to device descriptors
    ///
    /// Hostnames unknown to the controller, and hostnames whose lookup
    /// fails at the HTTP level, are logged and skipped. A malformed
    /// response aborts resolution.
    ///
    /// # Errors
    /// Returns `InventoryError::Schema` if the controller reply does not
    /// match the device schema.
    pub async fn resolve_devices(
        &self,
        ctx: &ClientContext,
        hostnames: &[String],
    ) -> Result<Vec<DeviceDescriptor>> {
        let mut devices = Vec::with_capacity(hostnames.len());

        for hostname in hostnames {
            match self.lookup_device(ctx, hostname).await {
                Ok(Some(device)) => {
                    debug!(host = %hostname, id = %device.id, "resolved device");
                    devices.push(device);
                }
                Ok(None) => warn!(host = %hostname, "device not found in controller inventory"),
                Err(e) if e.is_schema() => return Err(e),
                Err(e) => warn!(host = %hostname, error = %e, "device lookup failed, skipping"),
            }
        }

        info!(
            requested = hostnames.len(),
            resolved = devices.len(),
            "device resolution complete"
        );
        Ok(devices)
    }

    /// Look up a single hostname
    ///
    /// # Errors
    /// Returns an error if the request fails or the reply is malformed.
    #[instrument(skip(self, ctx), level = "debug")]
    pub async fn lookup_device(
        &self,
        ctx: &ClientContext,
        hostname: &str,
    ) -> Result<Option<DeviceDescriptor>> {
        let url = self.device_lookup_url(ctx, hostname)?;
        let envelope: ApiEnvelope<NetworkDeviceRecord> = self.get(ctx, url, "device").await?;
        Ok(envelope.response.into_iter().next().map(DeviceDescriptor::from))
    }

    /// Fetch the interface records of a device
    ///
    /// # Errors
    /// Returns an error if the request fails or the reply is malformed.
    #[instrument(skip(self, ctx), level = "debug")]
    pub async fn device_interfaces(
        &self,
        ctx: &ClientContext,
        device_id: &str,
    ) -> Result<Vec<InterfaceRecord>> {
        let url = self.interfaces_url(ctx, device_id)?;
        let envelope: ApiEnvelope<InterfaceRecord> = self.get(ctx, url, "interface").await?;
        Ok(envelope.response)
    }

    /// Select the interfaces of a device matching `rules`
    ///
    /// Never fails: any lookup error is logged and yields an empty
    /// selection.
    pub async fn select_device_interfaces(
        &self,
        ctx: &ClientContext,
        device: &DeviceDescriptor,
        rules: &InterfaceRules,
    ) -> InterfaceSelection {
        match self.device_interfaces(ctx, &device.id).await {
            Ok(records) => {
                let names = select_interfaces(&records, rules);
                debug!(
                    host = %device.hostname,
                    listed = records.len(),
                    selected = names.len(),
                    "selected interfaces"
                );
                InterfaceSelection::new(device.id.clone(), names)
            }
            Err(e) => {
                warn!(host = %device.hostname, error = %e, "interface lookup failed, using empty selection");
                InterfaceSelection::empty(device.id.clone())
            }
        }
    }

    fn device_lookup_url(&self, ctx: &ClientContext, hostname: &str) -> Result<Url> {
        let mut url = ctx.url(&self.endpoints.devices)?;
        url.query_pairs_mut().append_pair("hostname", hostname);
        Ok(url)
    }

    fn interfaces_url(&self, ctx: &ClientContext, device_id: &str) -> Result<Url> {
        ctx.url(&format!("{}{}", self.endpoints.interfaces, device_id))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        ctx: &ClientContext,
        url: Url,
        context: &str,
    ) -> Result<T> {
        let response = self
            .client
            .get(url)
            .header("x-auth-token", &ctx.token)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(InventoryError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        decode(&body, context)
    }
}

fn decode<T: DeserializeOwned>(body: &str, context: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| InventoryError::Schema {
        context: context.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ControllerClient {
        ControllerClient::with_client(Client::new(), Endpoints::default())
    }

    fn ctx() -> ClientContext {
        ClientContext::new(Url::parse("https://dnac.example.net").unwrap(), "secret")
    }

    #[test]
    fn test_device_lookup_url_encodes_hostname() {
        let url = client().device_lookup_url(&ctx(), "SW 1&2").unwrap();
        assert_eq!(
            url.as_str(),
            "https://dnac.example.net/dna/intent/api/v1/network-device?hostname=SW+1%262"
        );
    }

    #[test]
    fn test_interfaces_url_appends_device_id() {
        let url = client().interfaces_url(&ctx(), "a1b2").unwrap();
        assert_eq!(
            url.as_str(),
            "https://dnac.example.net/dna/intent/api/v1/interface/network-device/a1b2"
        );
    }

    #[test]
    fn test_decode_token() {
        let token: TokenResponse = decode(r#"{"Token": "abc"}"#, "token").unwrap();
        assert_eq!(token.token, "abc");
    }

    #[test]
    fn test_decode_reports_context() {
        let err = decode::<TokenResponse>(r#"{"token": "abc"}"#, "token").unwrap_err();
        assert!(err.is_schema());
        assert!(err.to_string().starts_with("unexpected token response"));
    }

    #[test]
    fn test_context_debug_redacts_token() {
        let rendered = format!("{:?}", ctx());
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("dnac.example.net"));
    }

    #[test]
    fn test_endpoints_fill_missing_fields() {
        let endpoints: Endpoints =
            serde_json::from_str(r#"{"devices": "/api/devices"}"#).unwrap();
        assert_eq!(endpoints.devices, "/api/devices");
        assert_eq!(endpoints.auth, Endpoints::default().auth);
    }
}
