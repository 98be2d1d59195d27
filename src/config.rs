use crate::session::{default_tracks, Prompts, SessionConfig, Track, TrackCatalog};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the bot credential
pub const TOKEN_ENV: &str = "BOT_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub gateway: GatewayConfig,
    pub storage: StorageConfig,
    pub sessions: SessionsConfig,
    pub prompts: Prompts,
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub enabled: bool,
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub nats_url: String,
    pub subject_prefix: String,
    pub fetch_timeout_secs: u64,
    /// Filled from `BOT_TOKEN` when not configured
    #[serde(skip_serializing)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub applications_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    pub ttl_secs: u64,
    pub sweep_interval_secs: u64,
    pub worker_idle_secs: u64,
    pub queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            gateway: GatewayConfig::default(),
            storage: StorageConfig::default(),
            sessions: SessionsConfig::default(),
            prompts: Prompts::default(),
            tracks: default_tracks(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "vacancy-intake".to_string(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: "127.0.0.1".to_string(),
            port: 8088,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            nats_url: "nats://localhost:4222".to_string(),
            subject_prefix: "intake".to_string(),
            fetch_timeout_secs: 30,
            token: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            applications_path: "applications".to_string(),
        }
    }
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 24 * 60 * 60, // 1 day
            sweep_interval_secs: 10 * 60,
            worker_idle_secs: 5 * 60,
            queue_capacity: 32,
        }
    }
}

impl Config {
    /// Load `path` (any extension the config crate knows, optional) plus
    /// `INTAKE__SECTION__KEY` environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("INTAKE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut cfg: Config = settings.try_deserialize()?;

        if cfg.gateway.token.is_none() {
            cfg.gateway.token = std::env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty());
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sessions.ttl_secs == 0 {
            bail!("sessions.ttl_secs must be greater than zero");
        }
        if self.sessions.sweep_interval_secs == 0 {
            bail!("sessions.sweep_interval_secs must be greater than zero");
        }
        if self.sessions.worker_idle_secs == 0 {
            bail!("sessions.worker_idle_secs must be greater than zero");
        }
        if self.gateway.fetch_timeout_secs == 0 {
            bail!("gateway.fetch_timeout_secs must be greater than zero");
        }
        self.catalog().map(|_| ())
    }

    pub fn catalog(&self) -> Result<TrackCatalog> {
        TrackCatalog::new(self.tracks.clone())
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            ttl: Duration::from_secs(self.sessions.ttl_secs),
            prompts: self.prompts.clone(),
        }
    }

    /// Applications directory with `~` and environment variables expanded
    pub fn applications_dir(&self) -> PathBuf {
        let raw = &self.storage.applications_path;
        match shellexpand::full(raw) {
            Ok(expanded) => PathBuf::from(expanded.as_ref()),
            Err(_) => PathBuf::from(shellexpand::tilde(raw).as_ref()),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway.fetch_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sessions.sweep_interval_secs)
    }

    pub fn worker_idle(&self) -> Duration {
        Duration::from_secs(self.sessions.worker_idle_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.tracks.len(), 3);
        assert_eq!(cfg.sessions.ttl_secs, 86_400);
        assert_eq!(cfg.storage.applications_path, "applications");
    }

    #[test]
    fn test_load_toml_file() {
        let mut file = tempfile::Builder::new()
            .prefix("vacancy-intake")
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            r#"
[service]
name = "intake-test"

[sessions]
ttl_secs = 600

[[tracks]]
name = "QA Engineer"
questions = ["How do you test?"]

[[tracks]]
name = "Designer"
"#
        )
        .unwrap();

        let cfg = Config::load(file.path().to_str().unwrap()).unwrap();

        assert_eq!(cfg.service.name, "intake-test");
        assert_eq!(cfg.sessions.ttl_secs, 600);
        assert_eq!(cfg.sessions.sweep_interval_secs, 600);
        assert_eq!(cfg.tracks.len(), 2);
        assert!(cfg.tracks[1].questions.is_empty());
        assert_eq!(cfg.gateway.subject_prefix, "intake");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let cfg = Config::load("/nonexistent/vacancy-intake").unwrap();
        assert_eq!(cfg.service.name, "vacancy-intake");
        assert_eq!(cfg.catalog().unwrap().len(), 3);
    }

    #[test]
    fn test_validation_rejects_duplicate_tracks() {
        let cfg = Config {
            tracks: vec![Track::new("QA", vec![]), Track::new("QA", vec![])],
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }
}
