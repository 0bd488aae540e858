//! Loader for the crawler and vulnerability-lookup settings.
//!
//! Sources are merged in order: YAML/TOML/JSON files or inline snippets, then
//! `NEWSPIPE_`-prefixed environment variables (so the environment wins).
//! String values may reference other variables as `${VAR}`; expansion is
//! repeated up to a fixed depth so chained references resolve.
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "NEWSPIPE";

pub const DEFAULT_CRAWLER_TIMEOUT_SECS: f64 = 30.0;
pub const DEFAULT_CRAWLER_USER_AGENT: &str = "Newspipe (https://git.sr.ht/~cedric/newspipe)";
pub const DEFAULT_VULNERABILITY_LOOKUP_BASE_URL: &str = "https://vulnerability.circl.lu/";

/// Settings read by the HTTP helpers.
///
/// ```
/// use newspipe_config::NewspipeConfig;
///
/// let cfg = NewspipeConfig::default();
/// assert_eq!(cfg.crawler_timeout().unwrap().as_secs(), 30);
/// assert!(cfg.vulnerability_auth_token.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewspipeConfig {
    /// Per-request timeout for crawler GETs, in seconds.
    #[serde(
        default = "default_crawler_timeout",
        deserialize_with = "deserialize_seconds"
    )]
    pub crawler_timeout: f64,
    #[serde(default = "default_crawler_user_agent")]
    pub crawler_user_agent: String,
    /// Sent as `X-API-KEY` when pushing sightings.
    #[serde(default)]
    pub vulnerability_auth_token: String,
    #[serde(default = "default_vulnerability_lookup_base_url")]
    pub vulnerability_lookup_base_url: String,
}

impl Default for NewspipeConfig {
    fn default() -> Self {
        Self {
            crawler_timeout: DEFAULT_CRAWLER_TIMEOUT_SECS,
            crawler_user_agent: default_crawler_user_agent(),
            vulnerability_auth_token: String::new(),
            vulnerability_lookup_base_url: default_vulnerability_lookup_base_url(),
        }
    }
}

impl NewspipeConfig {
    /// The crawler timeout as a [`Duration`].
    ///
    /// Fails for zero, negative, non-finite, or out-of-range values, which a
    /// hand-built config can carry without going through the loader.
    pub fn crawler_timeout(&self) -> Result<Duration, ConfigError> {
        Duration::try_from_secs_f64(self.crawler_timeout)
            .ok()
            .filter(|d| !d.is_zero())
            .ok_or_else(|| {
                ConfigError::Message(format!(
                    "crawler_timeout must be a positive number of seconds, got {}",
                    self.crawler_timeout
                ))
            })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.crawler_timeout()?;
        url::Url::parse(&self.vulnerability_lookup_base_url).map_err(|e| {
            ConfigError::Message(format!(
                "vulnerability_lookup_base_url {:?} is not a valid URL: {e}",
                self.vulnerability_lookup_base_url
            ))
        })?;
        Ok(())
    }
}

fn default_crawler_timeout() -> f64 {
    DEFAULT_CRAWLER_TIMEOUT_SECS
}
fn default_crawler_user_agent() -> String {
    DEFAULT_CRAWLER_USER_AGENT.into()
}
fn default_vulnerability_lookup_base_url() -> String {
    DEFAULT_VULNERABILITY_LOOKUP_BASE_URL.into()
}

/// Environment overrides arrive as strings, files usually as numbers.
fn deserialize_seconds<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Number(f64),
        Text(String),
    }

    match Seconds::deserialize(deserializer)? {
        Seconds::Number(n) => Ok(n),
        Seconds::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid seconds {s:?}: {e}"))),
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) if s.contains('$') => {
            let mut cur = std::mem::take(s);
            for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                let expanded = match shellexpand::env(&cur) {
                    Ok(cow) => cow.into_owned(),
                    Err(_) => break,
                };
                if expanded == cur {
                    break;
                }
                cur = expanded;
            }
            *s = cur;
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder over the `config` crate sources.
pub struct NewspipeConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for NewspipeConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl NewspipeConfigLoader {
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the format is inferred from the suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Same as [`with_file`](Self::with_file) but a missing file is skipped.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use newspipe_config::NewspipeConfigLoader;
    ///
    /// let cfg = NewspipeConfigLoader::new()
    ///     .with_yaml_str("crawler_timeout: 5\ncrawler_user_agent: test-agent")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(cfg.crawler_timeout().unwrap().as_secs(), 5);
    /// assert_eq!(cfg.crawler_user_agent, "test-agent");
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, FileFormat::Yaml));
        self
    }

    /// Build the merged configuration, expand `${VAR}` references, and validate.
    pub fn load(self) -> Result<NewspipeConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: NewspipeConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed.validate()?;
        Ok(typed)
    }
}
