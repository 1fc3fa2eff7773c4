//! Configuration loading and management
//!
//! The service reads one YAML file. Every section is optional and falls back
//! to the built-in defaults, so an empty file is a valid configuration:
//!
//! ```yaml
//! server:
//!   host: 0.0.0.0
//!   port: 8080
//! gst:
//!   allowed_rates: [0, 5, 12, 18, 28]
//! access:
//!   orders:
//!     delete: admin_only
//! ```

use crate::core::auth::AuthPolicy;
use crate::core::error::ConfigError;
use crate::finance::gst::is_percentage;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;

/// Policy used when the access table has no entry for an operation
pub const FALLBACK_POLICY: &str = "admin_only";

/// Complete service configuration
///
/// `Default` carries the built-in access matrix, so a config built in code or
/// deserialized without an `access` section authorizes like the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub log: LogConfig,
    pub storage: StorageConfig,
    pub gst: GstConfig,
    pub payroll: PayrollConfig,

    /// resource -> action -> policy string (see [`AuthPolicy::parse_policy`])
    pub access: AccessTable,
}

pub type AccessTable = BTreeMap<String, BTreeMap<String, String>>;

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            log: LogConfig::default(),
            storage: StorageConfig::default(),
            gst: GstConfig::default(),
            payroll: PayrollConfig::default(),
            access: default_access(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; empty allows any origin
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "payroll=info,tower_http=info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Mongodb,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub uri: String,
    pub database: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            uri: "mongodb://localhost:27017".to_string(),
            database: "payroll".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GstConfig {
    /// GST rates accepted on orders and purchases; empty accepts any rate
    pub allowed_rates: Vec<Decimal>,
}

impl Default for GstConfig {
    fn default() -> Self {
        Self {
            allowed_rates: [0, 5, 12, 18, 28].into_iter().map(Decimal::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PayrollConfig {
    pub default_working_days: Decimal,

    /// Health and education cess on income tax, in percent
    pub cess_percent: Decimal,

    /// Deduct monthly TDS from salary slips using the tax slabs
    pub tds_enabled: bool,

    /// Tax slab regime used for TDS
    pub tax_regime: String,
}

impl Default for PayrollConfig {
    fn default() -> Self {
        Self {
            default_working_days: Decimal::from(26),
            cess_percent: Decimal::from(4),
            tds_enabled: true,
            tax_regime: "new".to_string(),
        }
    }
}

fn access_row(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(action, policy)| (action.to_string(), policy.to_string()))
        .collect()
}

fn crud_row(read: &str, write: &str, delete: &str) -> BTreeMap<String, String> {
    access_row(&[
        ("list", read),
        ("get", read),
        ("create", write),
        ("update", write),
        ("delete", delete),
    ])
}

/// Built-in role matrix
pub fn default_access() -> AccessTable {
    const ANYONE: &str = "authenticated";
    const STAFF: &str = "roles:admin,hr,ca";
    const PEOPLE: &str = "roles:admin,hr";
    const FINANCE: &str = "roles:admin,ca";
    const ADMIN: &str = "admin_only";

    let mut table = AccessTable::new();
    table.insert("companies".into(), crud_row(ANYONE, ADMIN, ADMIN));
    table.insert("branches".into(), crud_row(ANYONE, PEOPLE, ADMIN));
    table.insert("departments".into(), crud_row(ANYONE, PEOPLE, ADMIN));
    table.insert("designations".into(), crud_row(ANYONE, PEOPLE, ADMIN));
    table.insert("employees".into(), crud_row(STAFF, PEOPLE, ADMIN));
    table.insert("orders".into(), crud_row(FINANCE, FINANCE, ADMIN));
    table.insert("revenues".into(), crud_row(FINANCE, FINANCE, FINANCE));
    table.insert("expenses".into(), crud_row(FINANCE, FINANCE, FINANCE));
    table.insert("purchases".into(), crud_row(FINANCE, FINANCE, FINANCE));
    table.insert("salary-heads".into(), crud_row(STAFF, PEOPLE, PEOPLE));
    table.insert("salary-settings".into(), crud_row(STAFF, PEOPLE, PEOPLE));
    table.insert("tax-slabs".into(), crud_row(STAFF, FINANCE, FINANCE));
    table.insert(
        "payroll".into(),
        access_row(&[
            ("preview", PEOPLE),
            ("generate", PEOPLE),
            ("run", PEOPLE),
            ("list", ANYONE),
            ("get", ANYONE),
            ("pay", PEOPLE),
            ("delete", PEOPLE),
        ]),
    );
    table.insert(
        "reports".into(),
        access_row(&[("read", FINANCE), ("branch_payroll", STAFF)]),
    );
    table.insert("gst".into(), access_row(&[("calculate", ANYONE)]));
    table
}

impl AppConfig {
    /// Built-in defaults, access matrix included
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            message: format!("{}: {}", path, e),
        })?;
        Self::parse(&content, Some(path))
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Self::parse(yaml, None)
    }

    fn parse(yaml: &str, file: Option<&str>) -> Result<Self, ConfigError> {
        let parse_error = |message: String| ConfigError::ParseError {
            file: file.map(str::to_string),
            message,
        };

        // An empty document deserializes to null, which is not a mapping
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let loaded: Self = serde_yaml::from_str(yaml).map_err(|e| parse_error(e.to_string()))?;

        let config = Self::default().merge(loaded);
        config.validate()?;
        Ok(config)
    }

    /// Overlay `other` on top of `self`
    ///
    /// Scalar sections are taken from `other`; access entries are merged
    /// action by action so a file only lists the policies it changes.
    pub fn merge(mut self, other: AppConfig) -> Self {
        self.server = other.server;
        self.log = other.log;
        self.storage = other.storage;
        self.gst = other.gst;
        self.payroll = other.payroll;

        for (resource, actions) in other.access {
            self.access.entry(resource).or_default().extend(actions);
        }
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.payroll.default_working_days <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "payroll.default_working_days".to_string(),
                value: self.payroll.default_working_days.to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if let Some(rate) = self
            .gst
            .allowed_rates
            .iter()
            .find(|r| !is_percentage(**r))
        {
            return Err(ConfigError::InvalidValue {
                field: "gst.allowed_rates".to_string(),
                value: rate.to_string(),
                message: "rates are percentages between 0 and 100".to_string(),
            });
        }
        Ok(())
    }

    /// Override host and port from a `host:port` string
    pub fn with_bind(mut self, bind: &str) -> Result<Self, ConfigError> {
        let addr: SocketAddr = bind.parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::InvalidValue {
                field: "server".to_string(),
                value: bind.to_string(),
                message: e.to_string(),
            }
        })?;
        self.server.host = addr.ip().to_string();
        self.server.port = addr.port();
        Ok(self)
    }

    /// Socket address the server listens on
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let bind = format!("{}:{}", self.server.host, self.server.port);
        bind.parse().map_err(|e: std::net::AddrParseError| ConfigError::InvalidValue {
            field: "server.host".to_string(),
            value: bind.clone(),
            message: e.to_string(),
        })
    }

    /// Policy for `action` on `resource`
    pub fn policy(&self, resource: &str, action: &str) -> AuthPolicy {
        let policy = self
            .access
            .get(resource)
            .and_then(|actions| actions.get(action))
            .map(String::as_str)
            .unwrap_or(FALLBACK_POLICY);
        AuthPolicy::parse_policy(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::Role;

    #[test]
    fn test_empty_yaml_gives_defaults() {
        let config = AppConfig::from_yaml_str("").unwrap();
        assert_eq!(config.server.port, 3000);
        let rates: Vec<Decimal> = [0, 5, 12, 18, 28].into_iter().map(Decimal::from).collect();
        assert_eq!(config.gst.allowed_rates, rates);
        assert_eq!(config.payroll.default_working_days, Decimal::from(26));
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(
            config.policy("employees", "create"),
            AuthPolicy::HasRole(vec![Role::Admin, Role::Hr])
        );
    }

    #[test]
    fn test_partial_yaml_overrides() {
        let yaml = r#"
server:
  port: 9090
payroll:
  tds_enabled: false
access:
  orders:
    delete: roles:admin,ca
"#;
        let config = AppConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(!config.payroll.tds_enabled);
        assert_eq!(config.payroll.cess_percent, Decimal::from(4));
        assert_eq!(
            config.policy("orders", "delete"),
            AuthPolicy::HasRole(vec![Role::Admin, Role::Ca])
        );
        // untouched actions keep their defaults
        assert_eq!(
            config.policy("orders", "create"),
            AuthPolicy::HasRole(vec![Role::Admin, Role::Ca])
        );
    }

    #[test]
    fn test_default_config_carries_access_matrix() {
        let config = AppConfig::default();
        assert_eq!(config.access, default_access());
        assert_eq!(
            config.policy("salary-heads", "create"),
            AuthPolicy::HasRole(vec![Role::Admin, Role::Hr])
        );
        assert_eq!(config.policy("gst", "calculate"), AuthPolicy::Authenticated);
    }

    #[test]
    fn test_fractional_rates_parse_exactly() {
        let config = AppConfig::from_yaml_str("gst:\n  allowed_rates: [0.25, 3]\n").unwrap();
        assert_eq!(config.gst.allowed_rates, vec![Decimal::new(25, 2), Decimal::from(3)]);
    }

    #[test]
    fn test_unknown_resource_falls_back_to_admin() {
        let config = AppConfig::with_defaults();
        assert_eq!(config.policy("nothing", "list"), AuthPolicy::AdminOnly);
    }

    #[test]
    fn test_invalid_yaml_reports_parse_error() {
        let err = AppConfig::from_yaml_str("server: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { file: None, .. }));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = AppConfig::from_yaml_str("payroll:\n  default_working_days: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = AppConfig::from_yaml_str("gst:\n  allowed_rates: [5, 140]\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_yaml_file_and_bind_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payroll.yaml");
        std::fs::write(&path, "storage:\n  backend: mongodb\n  database: acme\n").unwrap();

        let config = AppConfig::from_yaml_file(path.to_str().unwrap())
            .unwrap()
            .with_bind("0.0.0.0:8081")
            .unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Mongodb);
        assert_eq!(config.storage.database, "acme");
        assert_eq!(config.bind_addr().unwrap().port(), 8081);

        assert!(AppConfig::with_defaults().with_bind("nonsense").is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = AppConfig::from_yaml_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::IoError { .. }));
    }
}
