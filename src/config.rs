use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub meeting: MeetingConfig,
    pub invites: InviteConfig,
    pub smtp: SmtpConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    /// Only events at exactly this severity trigger orchestration.
    pub trigger_severity: u8,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MeetingConfig {
    pub base_url: String,
    pub bot_display_name: String,
    pub launch_timeout_secs: u64,
    pub keepalive_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InviteConfig {
    /// Static responder addresses invited to every qualifying incident.
    pub responders: Vec<String>,
    pub organizer_name: String,
    pub window_minutes: i64,
}

/// Transport credentials are individually optional; without both username and
/// password, invite dispatch degrades to a logged no-op.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "incident-meetings".to_string(),
            trigger_severity: 1,
            http: HttpConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for MeetingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://meet.jit.si".to_string(),
            bot_display_name: "IncidentBot".to_string(),
            launch_timeout_secs: 60,
            keepalive_interval_secs: 60,
        }
    }
}

impl Default for InviteConfig {
    fn default() -> Self {
        Self {
            responders: Vec::new(),
            organizer_name: "Incident Bot".to_string(),
            window_minutes: 30,
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            username: None,
            password: None,
        }
    }
}

impl Config {
    /// Load from an optional config file layered under `INCIDENT__`-prefixed
    /// environment variables. Every setting has a default; a missing file is
    /// not an error.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("INCIDENT").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
