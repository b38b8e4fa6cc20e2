//! Process configuration.
//!
//! Read from the environment, then overridden by global command-line
//! flags. Nothing is read from files.

use std::path::PathBuf;
use std::time::Duration;

use gemara_schema::SchemaOrigin;
use url::Url;

pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";
pub const DEFAULT_SCHEMA_URL: &str = "https://raw.githubusercontent.com/ossf/gemara/main/schemas/";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct GemaraConfig {
    /// Store root.
    pub artifacts_dir: PathBuf,
    /// Remote schema base, used unless `schema_dir` is set.
    pub schema_url: Url,
    /// Local schema directory. Takes precedence over `schema_url`.
    pub schema_dir: Option<PathBuf>,
    pub fetch_timeout: Duration,
    /// When false the artifacts directory is only read, never written, and
    /// the cache is the only state.
    pub use_store: bool,
}

/// Values supplied on the command line. `None` keeps the environment value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub artifacts_dir: Option<PathBuf>,
    pub schema_dir: Option<PathBuf>,
    pub schema_url: Option<String>,
    pub no_store: bool,
}

impl GemaraConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `GEMARA_ARTIFACTS_DIR` (default: `artifacts`)
    /// - `GEMARA_SCHEMA_URL` (default: the upstream Gemara `schemas/` directory)
    /// - `GEMARA_SCHEMA_DIR` (optional)
    /// - `GEMARA_FETCH_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url = lookup("GEMARA_SCHEMA_URL").unwrap_or_else(|| DEFAULT_SCHEMA_URL.to_string());
        Ok(Self {
            artifacts_dir: lookup("GEMARA_ARTIFACTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACTS_DIR)),
            schema_url: parse_url("GEMARA_SCHEMA_URL", &raw_url)?,
            schema_dir: lookup("GEMARA_SCHEMA_DIR")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            fetch_timeout: Duration::from_secs(
                lookup("GEMARA_FETCH_TIMEOUT_SECS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
            ),
            use_store: true,
        })
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        if let Some(dir) = overrides.artifacts_dir {
            self.artifacts_dir = dir;
        }
        if let Some(dir) = overrides.schema_dir {
            self.schema_dir = Some(dir);
        }
        if let Some(raw) = overrides.schema_url {
            self.schema_url = parse_url("--schema-url", &raw)?;
        }
        if overrides.no_store {
            self.use_store = false;
        }
        Ok(self)
    }

    pub fn schema_origin(&self) -> SchemaOrigin {
        match &self.schema_dir {
            Some(dir) => SchemaOrigin::Directory(dir.clone()),
            None => SchemaOrigin::remote(self.schema_url.clone()),
        }
    }
}

fn parse_url(var: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<GemaraConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GemaraConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.artifacts_dir, PathBuf::from("artifacts"));
        assert_eq!(cfg.schema_url.as_str(), DEFAULT_SCHEMA_URL);
        assert!(cfg.schema_dir.is_none());
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(30));
        assert!(cfg.use_store);
        assert!(matches!(cfg.schema_origin(), SchemaOrigin::Remote(_)));
    }

    #[test]
    fn environment_values_are_used() {
        let cfg = config(&[
            ("GEMARA_ARTIFACTS_DIR", "/data/gemara"),
            ("GEMARA_SCHEMA_URL", "http://localhost:8080/schemas"),
            ("GEMARA_FETCH_TIMEOUT_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(cfg.artifacts_dir, PathBuf::from("/data/gemara"));
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(5));
        match cfg.schema_origin() {
            SchemaOrigin::Remote(url) => assert_eq!(url.as_str(), "http://localhost:8080/schemas/"),
            other => panic!("unexpected origin: {other:?}"),
        }
    }

    #[test]
    fn unparsable_timeout_falls_back_to_default() {
        let cfg = config(&[("GEMARA_FETCH_TIMEOUT_SECS", "soon")]).unwrap();
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(30));
    }

    #[test]
    fn invalid_url_is_rejected() {
        let err = config(&[("GEMARA_SCHEMA_URL", "not a url")]).unwrap_err();
        assert!(err.to_string().contains("GEMARA_SCHEMA_URL"), "got: {err}");
    }

    #[test]
    fn schema_dir_wins_over_url() {
        let cfg = config(&[("GEMARA_SCHEMA_DIR", "./schemas")]).unwrap();
        assert_eq!(cfg.schema_origin(), SchemaOrigin::Directory(PathBuf::from("./schemas")));
    }

    #[test]
    fn overrides_replace_environment() {
        let cfg = config(&[("GEMARA_ARTIFACTS_DIR", "/env")])
            .unwrap()
            .with_overrides(ConfigOverrides {
                artifacts_dir: Some(PathBuf::from("/flag")),
                schema_url: Some("https://mirror.example/gemara/".into()),
                no_store: true,
                ..ConfigOverrides::default()
            })
            .unwrap();
        assert_eq!(cfg.artifacts_dir, PathBuf::from("/flag"));
        assert_eq!(cfg.schema_url.host_str(), Some("mirror.example"));
        assert!(!cfg.use_store);

        let bad = GemaraConfig::from_lookup(|_| None)
            .unwrap()
            .with_overrides(ConfigOverrides {
                schema_url: Some("::".into()),
                ..ConfigOverrides::default()
            });
        assert!(bad.is_err());
    }
}
