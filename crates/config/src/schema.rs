//! Config schema types (transport, credentials, destinations).

use std::{collections::HashSet, path::PathBuf, time::Duration};

use {secrecy::Secret, serde::Deserialize};

/// Service root used when `base_url` is not configured.
pub const DEFAULT_BASE_URL: &str = "https://hongkong.zoibana.ru";

/// Root configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PosterConfig {
    /// HTTP transport tuning. Keys live at the top level of the file.
    #[serde(flatten)]
    pub transport: TransportConfig,

    /// Root of the posting service (scheme and host only; a path is rejected
    /// when the session is built).
    pub base_url: String,

    /// Account e-mail used for the form login.
    pub hg_login: Option<String>,

    pub hg_password: Option<Secret<String>>,

    /// Directory for image download scratch files. Defaults to the OS temp dir.
    pub scratch_dir: Option<PathBuf>,

    /// Named destinations ("issues").
    pub issues: Vec<ChannelConfig>,
}

impl Default for PosterConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            base_url: DEFAULT_BASE_URL.into(),
            hg_login: None,
            hg_password: None,
            scratch_dir: None,
            issues: Vec::new(),
        }
    }
}

impl PosterConfig {
    /// Look up a destination by name.
    pub fn channel(&self, name: &str) -> Option<&ChannelConfig> {
        self.issues.iter().find(|c| c.name == name)
    }

    /// Scratch directory for temporary upload files.
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Reject configurations that would only fail later at send time.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.base_url.trim().is_empty() {
            anyhow::bail!("base_url must not be empty");
        }
        self.transport.validate()?;

        let mut seen = HashSet::new();
        for issue in &self.issues {
            if issue.name.trim().is_empty() {
                anyhow::bail!("destination with channel_id {} has an empty name", issue.channel_id);
            }
            if !seen.insert(issue.name.as_str()) {
                anyhow::bail!("destination {:?} is configured more than once", issue.name);
            }
        }
        Ok(())
    }
}

/// Timeouts, pool size and connection retries for the HTTP client.
///
/// Durations are given in (fractional) seconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub connect_timeout: f64,
    pub read_timeout: f64,
    pub write_timeout: f64,
    pub pool_timeout: f64,
    /// Max idle keep-alive connections per host.
    pub connection_pool_size: usize,
    /// Extra attempts when a connection cannot be established.
    pub retries: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: 10.0,
            read_timeout: 10.0,
            write_timeout: 10.0,
            pool_timeout: 1.0,
            connection_pool_size: 1,
            retries: 5,
        }
    }
}

impl TransportConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.connect_timeout)
    }

    /// Whole-request timeout: the larger of the read and write bounds.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.read_timeout.max(self.write_timeout))
    }

    pub fn pool_idle_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.pool_timeout)
    }

    fn validate(&self) -> anyhow::Result<()> {
        for (key, value) in [
            ("connect_timeout", self.connect_timeout),
            ("read_timeout", self.read_timeout),
            ("write_timeout", self.write_timeout),
            ("pool_timeout", self.pool_timeout),
        ] {
            if !value.is_finite() || value <= 0.0 {
                anyhow::bail!("{key} must be a positive number of seconds, got {value}");
            }
        }
        if self.connection_pool_size == 0 {
            anyhow::bail!("connection_pool_size must be at least 1");
        }
        Ok(())
    }
}

/// A named destination mapped onto a remote channel.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    pub name: String,
    pub channel_id: i64,
    pub discussion_id: i64,
    pub bot_token: Secret<String>,
    /// Remote channel id on the posting service. `0` marks the destination
    /// inactive: sends to it are skipped.
    #[serde(default)]
    pub hg_channel_id: i64,
    #[serde(default)]
    pub last_update_id: i64,
}

impl ChannelConfig {
    pub fn is_active(&self) -> bool {
        self.hg_channel_id != 0
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, secrecy::ExposeSecret};

    fn parse(json: &str) -> PosterConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn defaults_apply_to_empty_document() {
        let cfg = parse("{}");
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.transport.connect_timeout, 10.0);
        assert_eq!(cfg.transport.pool_timeout, 1.0);
        assert_eq!(cfg.transport.connection_pool_size, 1);
        assert_eq!(cfg.transport.retries, 5);
        assert!(cfg.issues.is_empty());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn transport_keys_are_read_from_top_level() {
        let cfg = parse(r#"{"read_timeout": 2.5, "write_timeout": 4.0, "retries": 1}"#);
        assert_eq!(cfg.transport.retries, 1);
        assert_eq!(cfg.transport.request_timeout(), Duration::from_secs(4));
    }

    #[test]
    fn issue_optional_fields_default_to_zero() {
        let cfg = parse(
            r#"{"issues": [{"name": "main", "channel_id": -100, "discussion_id": -200, "bot_token": "t"}]}"#,
        );
        let main = cfg.channel("main").unwrap();
        assert_eq!(main.hg_channel_id, 0);
        assert_eq!(main.last_update_id, 0);
        assert!(!main.is_active());
        assert_eq!(main.bot_token.expose_secret(), "t");
    }

    #[test]
    fn debug_output_hides_secrets() {
        let cfg = parse(
            r#"{"hg_password": "hunter2", "issues": [{"name": "a", "channel_id": 1, "discussion_id": 2, "bot_token": "bot-secret", "hg_channel_id": 3}]}"#,
        );
        let debug = format!("{cfg:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("bot-secret"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let cfg = parse(
            r#"{"issues": [
                {"name": "main", "channel_id": 1, "discussion_id": 2, "bot_token": "t"},
                {"name": "main", "channel_id": 3, "discussion_id": 4, "bot_token": "t"}
            ]}"#,
        );
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn non_positive_timeout_is_rejected() {
        let cfg = parse(r#"{"connect_timeout": 0}"#);
        assert!(cfg.validate().unwrap_err().to_string().contains("connect_timeout"));
    }

    #[test]
    fn empty_pool_is_rejected() {
        let cfg = parse(r#"{"connection_pool_size": 0}"#);
        assert!(cfg.validate().is_err());
    }
}
