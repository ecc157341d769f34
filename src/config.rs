//! Configuration types for the WS-Management client.

use crate::envelope::{DEFAULT_MAX_CHARACTERS, DEFAULT_MAX_ELEMENTS, DEFAULT_OPERATION_TIMEOUT};
use crate::error::WsmanError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default AMT WS-Management port (HTTP).
pub const DEFAULT_AMT_PORT: u16 = 16992;
/// Default AMT WS-Management port (TLS).
pub const DEFAULT_AMT_TLS_PORT: u16 = 16993;

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WsmanConfig {
    /// Config version
    pub version: String,

    /// Device endpoint and credentials
    pub endpoint: EndpointConfig,

    /// Request envelope settings
    pub envelope: EnvelopeConfig,

    /// Enumerate/Pull limits
    pub enumeration: EnumerationConfig,
}

impl Default for WsmanConfig {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            endpoint: EndpointConfig::default(),
            envelope: EnvelopeConfig::default(),
            enumeration: EnumerationConfig::default(),
        }
    }
}

impl WsmanConfig {
    /// Load and validate a YAML config file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, WsmanError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| WsmanError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would produce unusable requests.
    pub fn validate(&self) -> Result<(), WsmanError> {
        if self.endpoint.host.is_empty() {
            return Err(WsmanError::Config("endpoint.host must not be empty".to_string()));
        }
        if self.envelope.operation_timeout.is_empty() {
            return Err(WsmanError::Config(
                "envelope.operation_timeout must not be empty".to_string(),
            ));
        }
        if self.enumeration.max_elements == 0 {
            return Err(WsmanError::Config(
                "enumeration.max_elements must be at least 1".to_string(),
            ));
        }
        if self.enumeration.max_characters == 0 {
            return Err(WsmanError::Config(
                "enumeration.max_characters must be at least 1".to_string(),
            ));
        }
        if self.enumeration.max_pulls == 0 {
            return Err(WsmanError::Config(
                "enumeration.max_pulls must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Device endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Host name or address
    pub host: String,

    /// Port (16992 plain, 16993 TLS on AMT)
    pub port: u16,

    /// Use https
    pub use_tls: bool,

    /// Request path
    pub path: String,

    /// User name for Basic credentials
    pub username: String,

    /// Password; when unset no Authorization header is sent
    pub password: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_AMT_PORT,
            use_tls: false,
            path: "/wsman".to_string(),
            username: "admin".to_string(),
            password: None,
            timeout_secs: 30,
        }
    }
}

impl EndpointConfig {
    /// Full endpoint URL.
    pub fn url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        format!("{}://{}:{}{}", scheme, self.host, self.port, self.path)
    }
}

/// Request envelope settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// WS-Management OperationTimeout (xs:duration)
    pub operation_timeout: String,

    /// First MessageID of a session
    pub message_id_base: u64,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            operation_timeout: DEFAULT_OPERATION_TIMEOUT.to_string(),
            message_id_base: 0,
        }
    }
}

/// Enumerate/Pull limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnumerationConfig {
    /// MaxElements sent with every Pull
    pub max_elements: u32,

    /// MaxCharacters sent with every Pull
    pub max_characters: u32,

    /// Upper bound on Pull round trips per enumeration
    pub max_pulls: u32,
}

impl Default for EnumerationConfig {
    fn default() -> Self {
        Self {
            max_elements: DEFAULT_MAX_ELEMENTS,
            max_characters: DEFAULT_MAX_CHARACTERS,
            max_pulls: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WsmanConfig::default();
        assert_eq!(config.endpoint.port, 16992);
        assert!(!config.endpoint.use_tls);
        assert_eq!(config.envelope.operation_timeout, "PT60S");
        assert_eq!(config.enumeration.max_elements, 999);
        assert_eq!(config.enumeration.max_characters, 99_999);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_endpoint_url() {
        let mut endpoint = EndpointConfig::default();
        assert_eq!(endpoint.url(), "http://localhost:16992/wsman");

        endpoint.use_tls = true;
        endpoint.port = DEFAULT_AMT_TLS_PORT;
        endpoint.host = "10.0.0.5".to_string();
        assert_eq!(endpoint.url(), "https://10.0.0.5:16993/wsman");
    }

    #[test]
    fn test_config_serialization() {
        let config = WsmanConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: WsmanConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.endpoint.port, config.endpoint.port);
        assert_eq!(parsed.enumeration.max_pulls, config.enumeration.max_pulls);
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
version: "1"
endpoint:
  host: amt.example.com
  use_tls: true
  port: 16993
  password: "P@ssw0rd"
envelope:
  operation_timeout: PT30S
  message_id_base: 100
enumeration:
  max_elements: 50
"#;
        let config: WsmanConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.endpoint.host, "amt.example.com");
        assert_eq!(config.endpoint.username, "admin");
        assert_eq!(config.endpoint.password.as_deref(), Some("P@ssw0rd"));
        assert_eq!(config.envelope.operation_timeout, "PT30S");
        assert_eq!(config.envelope.message_id_base, 100);
        assert_eq!(config.enumeration.max_elements, 50);
        assert_eq!(config.enumeration.max_characters, 99_999);
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = std::env::temp_dir().join(format!("wsman-amt-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let good = dir.join("good.yaml");
        std::fs::write(&good, "endpoint:\n  host: 10.0.0.7\n").unwrap();
        let config = WsmanConfig::from_yaml_file(&good).unwrap();
        assert_eq!(config.endpoint.host, "10.0.0.7");

        let bad = dir.join("bad.yaml");
        std::fs::write(&bad, "enumeration:\n  max_pulls: many\n").unwrap();
        assert!(matches!(
            WsmanConfig::from_yaml_file(&bad),
            Err(WsmanError::Config(_))
        ));

        let zero = dir.join("zero.yaml");
        std::fs::write(&zero, "enumeration:\n  max_pulls: 0\n").unwrap();
        assert!(matches!(
            WsmanConfig::from_yaml_file(&zero),
            Err(WsmanError::Config(_))
        ));

        assert!(matches!(
            WsmanConfig::from_yaml_file(&dir.join("missing.yaml")),
            Err(WsmanError::Io(_))
        ));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let mut config = WsmanConfig::default();
        config.enumeration.max_elements = 0;
        assert!(matches!(config.validate(), Err(WsmanError::Config(_))));

        let mut config = WsmanConfig::default();
        config.enumeration.max_pulls = 0;
        assert!(config.validate().is_err());

        let mut config = WsmanConfig::default();
        config.envelope.operation_timeout.clear();
        assert!(config.validate().is_err());
    }
}
