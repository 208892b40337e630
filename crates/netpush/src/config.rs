//! Configuration loading and types

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use netpush_core::{FleetRunConfig, LockRetryPolicy};
use netpush_exec::ConnectionProfile;
use netpush_inventory::{Endpoints, InterfaceRules};
use netpush_templates::{BaselineProfile, PortSecurityProfile, TemplateKind};

use crate::error::SetupError;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "NETPUSH_CONFIG";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub controller: ControllerConfig,
    /// Device session settings; required for `run`
    pub netconf: Option<ConnectionProfile>,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub baseline: BaselineProfile,
    #[serde(default)]
    pub port_security: PortSecurityProfile,
    #[serde(default)]
    pub interfaces: InterfaceRules,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Controller API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// e.g. `https://dnac.example.net:443`
    pub base_url: Option<String>,
    pub username: String,
    pub password: Option<String>,
    /// Environment variable holding the password
    pub password_env: Option<String>,
    /// Skip TLS certificate verification
    pub insecure_tls: bool,
    pub timeout_secs: u64,
    pub endpoints: Endpoints,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            username: String::new(),
            password: None,
            password_env: None,
            insecure_tls: true,
            timeout_secs: 30,
            endpoints: Endpoints::default(),
        }
    }
}

impl ControllerConfig {
    /// Parsed base URL
    ///
    /// # Errors
    /// Returns an error if the URL is missing or invalid.
    pub fn base_url(&self) -> Result<Url, SetupError> {
        let raw = self
            .base_url
            .as_deref()
            .ok_or_else(|| SetupError::Config("controller.base_url is not set".to_string()))?;
        Url::parse(raw).map_err(|e| SetupError::Config(format!("controller.base_url: {e}")))
    }

    /// Resolve the controller password, inline value first
    ///
    /// # Errors
    /// Returns an error if neither source yields a password.
    pub fn password(&self) -> Result<String, SetupError> {
        if let Some(password) = &self.password {
            return Ok(password.clone());
        }
        match &self.password_env {
            Some(var) => std::env::var(var).map_err(|_| {
                SetupError::Config(format!("controller password variable {var} is not set"))
            }),
            None => Err(SetupError::Config(
                "controller.password or controller.password_env is required".to_string(),
            )),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub workflow: TemplateKind,
    /// CSV file with a `Hostname` column
    pub seed: PathBuf,
    /// Directory the result CSV is written to
    pub report_dir: PathBuf,
    pub concurrency: usize,
    pub lock_attempts: u32,
    pub lock_delay_secs: u64,
    pub call_timeout_secs: Option<u64>,
    pub run_deadline_secs: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        let lock = LockRetryPolicy::default();
        Self {
            workflow: TemplateKind::Baseline,
            seed: PathBuf::from("switches.csv"),
            report_dir: PathBuf::from("."),
            concurrency: 1,
            lock_attempts: lock.max_attempts,
            lock_delay_secs: lock.delay.as_secs(),
            call_timeout_secs: None,
            run_deadline_secs: None,
        }
    }
}

impl RunConfig {
    pub fn fleet(&self) -> FleetRunConfig {
        FleetRunConfig {
            concurrency: self.concurrency,
            lock_retry: LockRetryPolicy {
                max_attempts: self.lock_attempts,
                delay: Duration::from_secs(self.lock_delay_secs),
            },
            call_timeout: self.call_timeout_secs.map(Duration::from_secs),
            run_deadline: self.run_deadline_secs.map(Duration::from_secs),
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, overridden by `RUST_LOG`
    pub level: String,
    pub json: bool,
    /// Also append logs to this file
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, SetupError> {
        let content = std::fs::read_to_string(path).map_err(|source| SetupError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| SetupError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Find the config file from the environment or common paths
    pub fn locate() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }

        let paths = [
            Some(PathBuf::from("netpush.toml")),
            Some(PathBuf::from("/etc/netpush/netpush.toml")),
            dirs::config_dir().map(|p| p.join("netpush/netpush.toml")),
        ];

        paths.into_iter().flatten().find(|p| p.exists())
    }

    /// Load an explicit path, or the located file, or defaults
    ///
    /// Returns the path that was loaded, if any.
    ///
    /// # Errors
    /// Returns error if a found file cannot be read or parsed
    pub fn load_default(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), SetupError> {
        let path = explicit.map(Path::to_path_buf).or_else(Self::locate);
        match path {
            Some(path) => Ok((Self::load(&path)?, Some(path))),
            None => Ok((Self::default(), None)),
        }
    }

    /// Session profile, required for pushing configuration
    ///
    /// # Errors
    /// Returns an error if the `[netconf]` section is missing.
    pub fn connection_profile(&self) -> Result<&ConnectionProfile, SetupError> {
        self.netconf
            .as_ref()
            .ok_or_else(|| SetupError::Config("[netconf] section is required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[controller]
base_url = "https://dnac.example.net:443"
username = "admin"
password_env = "NETPUSH_TEST_UNSET_PASSWORD"
insecure_tls = false

[controller.endpoints]
devices = "/dna/intent/api/v1/network-device"

[netconf]
username = "netops"
port = 2830

[netconf.credential]
kind = "password"
password = "hunter2"

[run]
workflow = "port-security"
seed = "sites/hq.csv"
concurrency = 4
call_timeout_secs = 60

[baseline]
ntp_servers = ["10.0.0.1"]

[port_security]
max_mac_addresses = 5

[interfaces]
last_port = 24

[logging]
level = "debug"
json = true
"#;

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(SAMPLE).unwrap();

        assert!(!config.controller.insecure_tls);
        assert_eq!(config.controller.timeout_secs, 30);
        assert_eq!(
            config.controller.base_url().unwrap().as_str(),
            "https://dnac.example.net/"
        );
        assert_eq!(config.connection_profile().unwrap().port, 2830);
        assert_eq!(config.run.workflow, TemplateKind::PortSecurity);
        assert_eq!(config.run.concurrency, 4);
        assert_eq!(config.baseline.ntp_servers, vec!["10.0.0.1"]);
        assert_eq!(config.port_security.max_mac_addresses, 5);
        assert_eq!(config.interfaces.last_port, 24);
        assert_eq!(config.interfaces.first_port, 1);
        assert!(config.logging.json);
    }

    #[test]
    fn test_run_config_to_fleet() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        let fleet = config.run.fleet();

        assert_eq!(fleet.concurrency, 4);
        assert_eq!(fleet.lock_retry.max_attempts, 6);
        assert_eq!(fleet.lock_retry.delay, Duration::from_secs(30));
        assert_eq!(fleet.call_timeout, Some(Duration::from_secs(60)));
        assert!(fleet.run_deadline.is_none());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.run.seed, PathBuf::from("switches.csv"));
        assert_eq!(config.run.workflow, TemplateKind::Baseline);
        assert!(config.controller.insecure_tls);
        assert!(config.netconf.is_none());
        assert!(config.connection_profile().is_err());
        assert!(config.controller.base_url().is_err());
    }

    #[test]
    fn test_password_sources() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert!(config.controller.password().is_err());

        let inline = ControllerConfig {
            password: Some("secret".to_string()),
            ..config.controller.clone()
        };
        assert_eq!(inline.password().unwrap(), "secret");

        assert!(ControllerConfig::default().password().is_err());
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("netpush.toml");
        std::fs::write(&path, "[run]\nconcurrency = \"many\"\n").unwrap();

        assert!(matches!(
            Config::load(&path),
            Err(SetupError::ParseConfig { .. })
        ));
    }

    #[test]
    fn test_load_default_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[run]\nconcurrency = 3\n").unwrap();

        let (config, loaded) = Config::load_default(Some(&path)).unwrap();
        assert_eq!(config.run.concurrency, 3);
        assert_eq!(loaded, Some(path));
    }
}
