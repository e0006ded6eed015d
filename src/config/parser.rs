//! Loading provider settings.
//!
//! Settings are layered, later sources winning:
//! 1. stored Pulumi CLI credentials (token only)
//! 2. a YAML config file
//! 3. `.env` and process environment variables
//! 4. variables passed by the host on configure

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ProviderError, Result};

use super::provider_config::ProviderConfig;
use super::validator::ConfigValidator;

/// Access token variable shared with the Pulumi CLI.
pub const ENV_ACCESS_TOKEN: &str = "PULUMI_ACCESS_TOKEN";
/// Service URL variable shared with the Pulumi CLI.
pub const ENV_BACKEND_URL: &str = "PULUMI_BACKEND_URL";
/// Per-request timeout in seconds.
pub const ENV_REQUEST_TIMEOUT: &str = "PULUMISERVICE_REQUEST_TIMEOUT_SECS";
/// Deployment poll interval in seconds.
pub const ENV_POLL_INTERVAL: &str = "PULUMISERVICE_POLL_INTERVAL_SECS";
/// Location of the Pulumi CLI home directory.
pub const ENV_PULUMI_HOME: &str = "PULUMI_HOME";

/// Prefix of provider variables sent by the host.
pub const HOST_VARIABLE_PREFIX: &str = "pulumiservice:config:";

/// Default configuration file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["pulumiservice.yaml", "pulumiservice.yml"];

/// Credentials file written by `pulumi login`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredCredentials {
    #[serde(default)]
    current: String,
    #[serde(default)]
    access_tokens: BTreeMap<String, String>,
}

/// Loads [`ProviderConfig`] from files, the environment and the host.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Directory holding the `.env` file.
    base_path: Option<PathBuf>,
    /// Replaces the process environment when set.
    env: Option<BTreeMap<String, String>>,
    /// Values read from `.env`; consulted after the environment.
    dotenv: BTreeMap<String, String>,
}

impl ConfigLoader {
    /// Creates a loader reading the process environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the directory searched for `.env`.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Reads variables from `vars` instead of the process environment.
    #[must_use]
    pub fn with_env_vars<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<ProviderConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(ProviderError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse_yaml(&content, Some(path))
    }

    /// Parses configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<ProviderConfig> {
        debug!("Parsing YAML configuration");

        // An empty file means all defaults.
        if content.trim().is_empty() {
            return Ok(ProviderConfig::default());
        }

        serde_yaml::from_str(content).map_err(|e| {
            ProviderError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location: source.map(|p| p.display().to_string()),
            })
        })
    }

    /// Reads the `.env` file if present.
    ///
    /// Values are kept by the loader; the process environment is not modified.
    ///
    /// # Errors
    ///
    /// Returns an error if the `.env` file exists but cannot be parsed.
    pub fn load_dotenv(&mut self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if !env_path.exists() {
            debug!(".env file not found at: {}", env_path.display());
            return Ok(());
        }

        info!("Loading environment from: {}", env_path.display());
        let parse_error = |e: dotenvy::Error| {
            ProviderError::Config(ConfigError::ParseError {
                message: format!("Failed to load .env file: {e}"),
                location: Some(env_path.display().to_string()),
            })
        };
        for item in dotenvy::from_path_iter(&env_path).map_err(parse_error)? {
            let (key, value) = item.map_err(parse_error)?;
            self.dotenv.insert(key, value);
        }
        Ok(())
    }

    /// Looks up a variable; empty values count as unset.
    fn var(&self, name: &str) -> Option<String> {
        let from_env = match &self.env {
            Some(vars) => vars.get(name).cloned(),
            None => std::env::var(name).ok(),
        };
        from_env
            .or_else(|| self.dotenv.get(name).cloned())
            .filter(|v| !v.is_empty())
    }

    /// Applies environment variable overrides to the configuration.
    pub fn apply_env_overrides(&self, config: &mut ProviderConfig) {
        if let Some(token) = self.var(ENV_ACCESS_TOKEN) {
            debug!("Using access token from {ENV_ACCESS_TOKEN}");
            config.access_token = Some(token);
        }

        if let Some(url) = self.var(ENV_BACKEND_URL) {
            debug!("Overriding service_url from environment");
            config.service_url = url;
        }

        if let Some(secs) = self.var_secs(ENV_REQUEST_TIMEOUT) {
            debug!("Overriding request_timeout_secs from environment");
            config.request_timeout_secs = secs;
        }

        if let Some(secs) = self.var_secs(ENV_POLL_INTERVAL) {
            debug!("Overriding poll_interval_secs from environment");
            config.poll_interval_secs = secs;
        }
    }

    fn var_secs(&self, name: &str) -> Option<u64> {
        let raw = self.var(name)?;
        match raw.trim().parse() {
            Ok(secs) => Some(secs),
            Err(_) => {
                warn!("Ignoring {name}={raw:?}: not a whole number of seconds");
                None
            }
        }
    }

    /// Applies provider variables sent by the host, e.g.
    /// `pulumiservice:config:accessToken`.
    pub fn apply_host_variables(config: &mut ProviderConfig, variables: &BTreeMap<String, String>) {
        for (key, value) in variables {
            if value.is_empty() {
                continue;
            }
            match key.strip_prefix(HOST_VARIABLE_PREFIX).unwrap_or(key) {
                "accessToken" => config.access_token = Some(value.clone()),
                "apiUrl" | "serviceURL" => config.service_url = value.clone(),
                other => debug!("Ignoring unknown provider variable '{other}'"),
            }
        }
    }

    /// Directory of the Pulumi CLI's state.
    fn pulumi_home(&self) -> Option<PathBuf> {
        self.var(ENV_PULUMI_HOME)
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|home| home.join(".pulumi")))
    }

    /// Token of the current `pulumi login`, if any.
    #[must_use]
    pub fn stored_access_token(&self) -> Option<String> {
        let path = self.pulumi_home()?.join("credentials.json");
        let content = std::fs::read_to_string(&path).ok()?;
        let credentials: StoredCredentials = match serde_json::from_str(&content) {
            Ok(credentials) => credentials,
            Err(e) => {
                warn!("Ignoring unreadable credentials at {}: {e}", path.display());
                return None;
            }
        };
        debug!("Using stored credentials for {}", credentials.current);
        credentials
            .access_tokens
            .get(&credentials.current)
            .filter(|token| !token.is_empty())
            .cloned()
    }

    /// Loads the full configuration.
    ///
    /// `path` names a config file; without one the current directory, its
    /// parents and the user config directory are searched, and a missing file
    /// means defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be parsed, a value is invalid, or no
    /// access token is found.
    pub fn load(&mut self, path: Option<&Path>, host_variables: &BTreeMap<String, String>) -> Result<ProviderConfig> {
        self.load_dotenv()?;

        let mut config = match path {
            Some(path) => self.load_file(path)?,
            None => match discover_config_file() {
                Some(found) => self.load_file(found)?,
                None => ProviderConfig::default(),
            },
        };

        self.apply_env_overrides(&mut config);
        Self::apply_host_variables(&mut config, host_variables);

        if config.access_token.is_none() {
            config.access_token = self.stored_access_token();
        }

        ConfigValidator::new().require_token().validate(&config)?;
        Ok(config)
    }
}

/// Finds the configuration file in `start_dir` or its parents.
///
/// # Errors
///
/// Returns an error if no configuration file is found.
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.exists() {
                info!("Found configuration file: {}", config_path.display());
                return Ok(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(ProviderError::Config(ConfigError::FileNotFound {
        path: start.join(DEFAULT_CONFIG_FILES[0]),
    }))
}

/// Config file in the user's config directory.
#[must_use]
pub fn user_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pulumiservice").join(DEFAULT_CONFIG_FILES[0]))
}

fn discover_config_file() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| find_config_file(cwd).ok())
        .or_else(|| user_config_file().filter(|p| p.exists()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn loader(vars: &[(&str, &str)]) -> ConfigLoader {
        ConfigLoader::new().with_env_vars(vars.iter().copied())
    }

    #[test]
    fn test_parse_partial_config() {
        let yaml = r"
service_url: https://api.example.com
poll_interval_secs: 5
";
        let config = ConfigLoader::new().parse_yaml(yaml, None).expect("parse");
        assert_eq!(config.service_url, "https://api.example.com");
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.request_timeout_secs, 60);
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = ConfigLoader::new()
            .parse_yaml("poll_interval_secs: [", Some(Path::new("pulumiservice.yaml")))
            .expect_err("parse");
        match err {
            ProviderError::Config(ConfigError::ParseError { location, .. }) => {
                assert_eq!(location.as_deref(), Some("pulumiservice.yaml"));
            }
            other => panic!("expected ParseError, got {other}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().expect("tempdir");
        let err = ConfigLoader::new().load_file(dir.path().join("nope.yaml")).expect_err("load");
        assert!(matches!(err, ProviderError::Config(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ProviderConfig::default();
        loader(&[
            (ENV_ACCESS_TOKEN, "pul-env"),
            (ENV_BACKEND_URL, "https://api.internal"),
            (ENV_REQUEST_TIMEOUT, "15"),
            (ENV_POLL_INTERVAL, "soon"),
        ])
        .apply_env_overrides(&mut config);

        assert_eq!(config.access_token.as_deref(), Some("pul-env"));
        assert_eq!(config.service_url, "https://api.internal");
        assert_eq!(config.request_timeout_secs, 15);
        assert_eq!(config.poll_interval_secs, 2);
    }

    #[test]
    fn test_host_variables_win() {
        let dir = TempDir::new().expect("tempdir");
        let mut host = BTreeMap::new();
        host.insert(String::from("pulumiservice:config:accessToken"), String::from("pul-host"));
        host.insert(String::from("pulumiservice:config:apiUrl"), String::from("https://api.host"));

        let config = loader(&[(ENV_ACCESS_TOKEN, "pul-env"), (ENV_PULUMI_HOME, "/nonexistent")])
            .with_base_path(dir.path())
            .load(Some(&write_empty_config(&dir)), &host)
            .expect("load");

        assert_eq!(config.access_token.as_deref(), Some("pul-host"));
        assert_eq!(config.service_url, "https://api.host");
    }

    #[test]
    fn test_dotenv_is_a_fallback() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join(".env"), "PULUMI_ACCESS_TOKEN=pul-dotenv\nPULUMI_BACKEND_URL=https://api.dotenv\n")
            .expect("write");

        let config = loader(&[(ENV_BACKEND_URL, "https://api.env"), (ENV_PULUMI_HOME, "/nonexistent")])
            .with_base_path(dir.path())
            .load(Some(&write_empty_config(&dir)), &BTreeMap::new())
            .expect("load");

        assert_eq!(config.access_token.as_deref(), Some("pul-dotenv"));
        assert_eq!(config.service_url, "https://api.env");
    }

    #[test]
    fn test_stored_credentials() {
        let home = TempDir::new().expect("tempdir");
        fs::write(
            home.path().join("credentials.json"),
            r#"{"current": "https://api.pulumi.com", "accessTokens": {"https://api.pulumi.com": "pul-stored"}}"#,
        )
        .expect("write");

        let home_path = home.path().display().to_string();
        let config = loader(&[(ENV_PULUMI_HOME, home_path.as_str())])
            .with_base_path(home.path())
            .load(Some(&write_empty_config(&home)), &BTreeMap::new())
            .expect("load");
        assert_eq!(config.access_token.as_deref(), Some("pul-stored"));
    }

    #[test]
    fn test_no_token_anywhere() {
        let dir = TempDir::new().expect("tempdir");
        let home_path = dir.path().display().to_string();
        let err = loader(&[(ENV_PULUMI_HOME, home_path.as_str())])
            .with_base_path(dir.path())
            .load(Some(&write_empty_config(&dir)), &BTreeMap::new())
            .expect_err("load");
        assert!(matches!(err, ProviderError::Config(ConfigError::MissingAccessToken)));
    }

    #[test]
    fn test_find_config_file_walks_up() {
        let dir = TempDir::new().expect("tempdir");
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).expect("mkdir");
        fs::write(dir.path().join("pulumiservice.yml"), "").expect("write");

        let found = find_config_file(&nested).expect("find");
        assert_eq!(found, dir.path().join("pulumiservice.yml"));
    }

    fn write_empty_config(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("pulumiservice.yaml");
        fs::write(&path, "").expect("write");
        path
    }
}
