//! Device credential resolution

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Where the device login secret comes from
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CredentialSource {
    /// Inline password
    Password { password: String },
    /// Password read from an environment variable
    PasswordEnv { var: String },
    /// Explicit path to a private key file
    KeyPath { path: PathBuf },
    /// Base64-encoded private key from an environment variable
    KeyEnv { var: String },
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Password { .. } => f.write_str("Password(<redacted>)"),
            CredentialSource::PasswordEnv { var } => write!(f, "PasswordEnv({var})"),
            CredentialSource::KeyPath { path } => write!(f, "KeyPath({})", path.display()),
            CredentialSource::KeyEnv { var } => write!(f, "KeyEnv({var})"),
        }
    }
}

impl CredentialSource {
    /// Resolve the source into a usable secret
    ///
    /// For `KeyEnv`, decodes base64 and writes the key to a temp file that is
    /// removed when the resolved credential is dropped.
    ///
    /// # Errors
    /// Returns `CredentialError` if the variable is unset, the encoding is
    /// invalid or the key file is missing or too permissive.
    pub fn resolve(&self) -> Result<ResolvedCredential, CredentialError> {
        match self {
            CredentialSource::Password { password } => {
                Ok(ResolvedCredential::Password(password.clone()))
            }
            CredentialSource::PasswordEnv { var } => {
                let password = env::var(var).map_err(|_| CredentialError::EnvNotSet(var.clone()))?;
                Ok(ResolvedCredential::Password(password))
            }
            CredentialSource::KeyPath { path } => {
                validate_key_permissions(path)?;
                Ok(ResolvedCredential::Key(path.clone()))
            }
            CredentialSource::KeyEnv { var } => {
                let encoded = env::var(var).map_err(|_| CredentialError::EnvNotSet(var.clone()))?;
                let key_data = base64_decode(&encoded).map_err(|_| CredentialError::InvalidBase64)?;
                let temp_path = write_temp_key(&key_data)?;
                Ok(ResolvedCredential::TempKey(temp_path))
            }
        }
    }
}

/// Resolved login secret
pub enum ResolvedCredential {
    /// Password authentication
    Password(String),
    /// Private key file
    Key(PathBuf),
    /// Temporary key file (deleted on drop)
    TempKey(PathBuf),
}

impl ResolvedCredential {
    /// Key file path, if this is key authentication
    #[must_use]
    pub fn key_path(&self) -> Option<&Path> {
        match self {
            ResolvedCredential::Key(p) | ResolvedCredential::TempKey(p) => Some(p),
            ResolvedCredential::Password(_) => None,
        }
    }

    /// Password, if this is password authentication
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        match self {
            ResolvedCredential::Password(p) => Some(p),
            _ => None,
        }
    }
}

impl fmt::Debug for ResolvedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedCredential::Password(_) => f.write_str("Password(<redacted>)"),
            ResolvedCredential::Key(p) => write!(f, "Key({})", p.display()),
            ResolvedCredential::TempKey(p) => write!(f, "TempKey({})", p.display()),
        }
    }
}

/// Credential resolution errors
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("environment variable {0} not set")]
    EnvNotSet(String),

    #[error("invalid base64 encoding")]
    InvalidBase64,

    #[error("key file permissions too open: {0} (should be 600)")]
    BadPermissions(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn base64_decode(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.decode(input.trim())
}

fn validate_key_permissions(path: &Path) -> Result<(), CredentialError> {
    use std::os::unix::fs::PermissionsExt;

    let mode = std::fs::metadata(path)?.permissions().mode();

    // group and other bits must be clear
    if mode & 0o77 != 0 {
        return Err(CredentialError::BadPermissions(path.display().to_string()));
    }

    Ok(())
}

fn write_temp_key(key_data: &[u8]) -> Result<PathBuf, CredentialError> {
    use std::fs::OpenOptions;
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let temp_path = env::temp_dir().join(format!("netpush_ssh_key_{}", std::process::id()));

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(&temp_path)?;
    file.write_all(key_data)?;

    debug!(path = %temp_path.display(), "wrote temporary SSH key");

    Ok(temp_path)
}

impl Drop for ResolvedCredential {
    fn drop(&mut self) {
        if let ResolvedCredential::TempKey(path) = self
            && let Err(e) = std::fs::remove_file(&*path)
        {
            warn!(path = %path.display(), error = %e, "failed to remove temp key");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_password_resolves() {
        let source = CredentialSource::Password {
            password: "s3cret".to_string(),
        };
        let resolved = source.resolve().unwrap();
        assert_eq!(resolved.password(), Some("s3cret"));
        assert!(resolved.key_path().is_none());
    }

    #[test]
    fn test_missing_env_var() {
        let source = CredentialSource::PasswordEnv {
            var: "NETPUSH_TEST_VAR_THAT_IS_NOT_SET".to_string(),
        };
        assert!(matches!(source.resolve(), Err(CredentialError::EnvNotSet(_))));
    }

    #[test]
    fn test_debug_redacts_password() {
        let source = CredentialSource::Password {
            password: "s3cret".to_string(),
        };
        assert!(!format!("{source:?}").contains("s3cret"));
    }

    #[test]
    fn test_source_from_toml() {
        let source: CredentialSource =
            toml::from_str("kind = \"password_env\"\nvar = \"NETCONF_PASS\"").unwrap();
        assert!(matches!(source, CredentialSource::PasswordEnv { var } if var == "NETCONF_PASS"));
    }
}
