use serde::{Deserialize, Serialize};
use setu_icd::IcdConfig;
use std::net::SocketAddr;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub namaste: NamasteConfig,
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub jwt: JwtSettings,
    /// WHO ICD-11 API client configuration
    #[serde(default, skip_serializing)]
    pub icd: IcdConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        // Search validations
        if self.search.default_count == 0 {
            return Err("search.default_count must be > 0".into());
        }
        if self.search.max_count == 0 {
            return Err("search.max_count must be > 0".into());
        }
        if self.search.default_count > self.search.max_count {
            return Err("search.default_count must be <= search.max_count".into());
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        // JWT validation
        if self.jwt.secret.is_empty() {
            return Err("jwt.secret must not be empty".into());
        }
        if self.jwt.expiration_secs <= 0 {
            return Err("jwt.expiration_secs must be > 0".into());
        }
        // ICD validation
        self.icd.validate()?;
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_body_limit() -> usize {
    // CSV uploads can run large
    8 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Settings for the locally hosted NAMASTE code system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamasteConfig {
    #[serde(default = "default_namaste_system")]
    pub system_uri: String,
    #[serde(default = "default_namaste_version")]
    pub version: String,
}

fn default_namaste_system() -> String {
    setu_core::NAMASTE_SYSTEM_URI.into()
}
fn default_namaste_version() -> String {
    "2024.1".into()
}

impl Default for NamasteConfig {
    fn default() -> Self {
        Self {
            system_uri: default_namaste_system(),
            version: default_namaste_version(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Page size used when the client does not pass `count`.
    #[serde(default = "default_count")]
    pub default_count: usize,
    /// Hard cap on `count`.
    #[serde(default = "default_max_count")]
    pub max_count: usize,
}

fn default_count() -> usize {
    10
}
fn default_max_count() -> usize {
    100
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_count: default_count(),
            max_count: default_max_count(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtSettings {
    /// HS256 signing secret. Override via SETU__JWT__SECRET in production.
    #[serde(default = "default_jwt_secret", skip_serializing)]
    pub secret: String,
    #[serde(default = "default_jwt_issuer")]
    pub issuer: String,
    #[serde(default = "default_jwt_expiration")]
    pub expiration_secs: i64,
}

fn default_jwt_secret() -> String {
    "change-me-in-production".into()
}
fn default_jwt_issuer() -> String {
    "setu-terminology-service".into()
}
fn default_jwt_expiration() -> i64 {
    86_400
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            secret: default_jwt_secret(),
            issuer: default_jwt_issuer(),
            expiration_secs: default_jwt_expiration(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if pathbuf.exists() {
                    builder = builder.add_source(File::from(pathbuf));
                }
            }
            None => {
                let default_path = PathBuf::from("setu.toml");
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // Environment variable overrides, e.g., SETU__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("SETU")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.search.default_count, 10);
        assert_eq!(cfg.jwt.issuer, "setu-terminology-service");
    }

    #[test]
    fn test_addr_falls_back_on_bad_host() {
        let mut cfg = AppConfig::default();
        cfg.server.host = "not-an-ip".into();
        assert_eq!(cfg.addr().to_string(), "0.0.0.0:8080");

        cfg.server.host = "127.0.0.1".into();
        cfg.server.port = 9999;
        assert_eq!(cfg.addr().to_string(), "127.0.0.1:9999");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut cfg = AppConfig::default();
        cfg.server.port = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.search.default_count = 50;
        cfg.search.max_count = 10;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.logging.level = "verbose".into();
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.jwt.secret = String::new();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_toml_parsing() {
        let cfg: AppConfig = toml_from_str(
            r#"
            [server]
            port = 9090

            [namaste]
            version = "2025.1"

            [icd]
            enabled = false
            "#,
        );
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.namaste.version, "2025.1");
        assert!(!cfg.icd.enabled);
    }

    fn toml_from_str(s: &str) -> AppConfig {
        let cfg = config::Config::builder()
            .add_source(config::File::from_str(s, config::FileFormat::Toml))
            .build()
            .unwrap();
        cfg.try_deserialize().unwrap()
    }
}
