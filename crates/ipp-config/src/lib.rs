//! Configuration management for the IPP OAuth client.
//!
//! Parses `ipp.toml` with serde and discovers it in the current directory or
//! its parents when no explicit path is given.
//!
//! ## Environment Variable Expansion
//!
//! Every string value supports:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Secrets are expected to come in this way rather than being committed to
//! the file.

mod expand;

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "ipp.toml";

/// Default endpoint for obtaining a request token.
pub const DEFAULT_REQUEST_TOKEN_URL: &str = "https://oauth.intuit.com/oauth/v1/get_request_token";

/// Default endpoint the user is sent to for authorizing a request token.
pub const DEFAULT_AUTHORIZE_URL: &str = "https://appcenter.intuit.com/Connect/Begin";

/// Default endpoint for exchanging an authorized request token.
pub const DEFAULT_ACCESS_TOKEN_URL: &str = "https://oauth.intuit.com/oauth/v1/get_access_token";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OAuth provider endpoints.
    pub oauth: OAuthEndpoints,
    /// Credential material (optional section).
    pub credentials: Option<CredentialsConfig>,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// OAuth provider endpoint URLs.
///
/// Missing entries fall back to the `DEFAULT_*` constants.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OAuthEndpoints {
    /// Request token endpoint.
    pub request_token_url: String,
    /// User authorization endpoint.
    pub authorize_url: String,
    /// Access token endpoint.
    pub access_token_url: String,
}

impl Default for OAuthEndpoints {
    fn default() -> Self {
        Self {
            request_token_url: DEFAULT_REQUEST_TOKEN_URL.to_owned(),
            authorize_url: DEFAULT_AUTHORIZE_URL.to_owned(),
            access_token_url: DEFAULT_ACCESS_TOKEN_URL.to_owned(),
        }
    }
}

impl OAuthEndpoints {
    /// Validate that every endpoint is a non-empty http(s) URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (value, field) in [
            (&self.request_token_url, "oauth.request_token_url"),
            (&self.authorize_url, "oauth.authorize_url"),
            (&self.access_token_url, "oauth.access_token_url"),
        ] {
            require_non_empty(value, field)?;
            require_http_url(value, field)?;
        }
        Ok(())
    }
}

/// Credential configuration.
///
/// Either the four HMAC-SHA1 values are set, or `key_file` is set for
/// RSA-SHA1 (with `consumer_key` acting as the application token).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// OAuth consumer key (application token in RSA mode).
    pub consumer_key: String,
    /// OAuth consumer secret.
    pub consumer_secret: Option<String>,
    /// OAuth access token.
    pub access_token: Option<String>,
    /// OAuth access token secret.
    pub access_token_secret: Option<String>,
    /// PEM private key path as written in the file.
    key_file: Option<String>,

    /// Resolved private key path (set after loading).
    #[serde(skip)]
    pub key_path: Option<PathBuf>,
}

/// Signing mode selected by a validated [`CredentialsConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialsMode<'a> {
    /// Shared-secret signing.
    HmacSha1 {
        /// OAuth consumer key.
        consumer_key: &'a str,
        /// OAuth consumer secret.
        consumer_secret: &'a str,
        /// OAuth access token.
        access_token: &'a str,
        /// OAuth access token secret.
        access_token_secret: &'a str,
    },
    /// Private-key signing.
    RsaSha1 {
        /// Application token.
        consumer_key: &'a str,
        /// PEM private key file.
        key_path: &'a Path,
    },
}

impl CredentialsConfig {
    /// Create an HMAC-SHA1 credential section.
    #[must_use]
    pub fn hmac(
        consumer_key: &str,
        consumer_secret: &str,
        access_token: &str,
        access_token_secret: &str,
    ) -> Self {
        Self {
            consumer_key: consumer_key.to_owned(),
            consumer_secret: Some(consumer_secret.to_owned()),
            access_token: Some(access_token.to_owned()),
            access_token_secret: Some(access_token_secret.to_owned()),
            ..Self::default()
        }
    }

    /// Create an RSA-SHA1 credential section.
    #[must_use]
    pub fn rsa(application_token: &str, key_path: impl Into<PathBuf>) -> Self {
        let key_path = key_path.into();
        Self {
            consumer_key: application_token.to_owned(),
            key_file: Some(key_path.to_string_lossy().into_owned()),
            key_path: Some(key_path),
            ..Self::default()
        }
    }

    /// Validate the section and report which signing mode it selects.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if a required field is empty, or if
    /// HMAC secrets and a key file are mixed.
    pub fn mode(&self) -> Result<CredentialsMode<'_>, ConfigError> {
        require_non_empty(&self.consumer_key, "credentials.consumer_key")?;

        let key_path = self
            .key_path
            .as_deref()
            .or_else(|| self.key_file.as_deref().map(Path::new));

        if let Some(key_path) = key_path {
            if self.consumer_secret.is_some()
                || self.access_token.is_some()
                || self.access_token_secret.is_some()
            {
                return Err(ConfigError::Validation(
                    "credentials.key_file cannot be combined with HMAC secrets".to_owned(),
                ));
            }
            return Ok(CredentialsMode::RsaSha1 {
                consumer_key: &self.consumer_key,
                key_path,
            });
        }

        Ok(CredentialsMode::HmacSha1 {
            consumer_key: &self.consumer_key,
            consumer_secret: require_present(
                self.consumer_secret.as_deref(),
                "credentials.consumer_secret",
            )?,
            access_token: require_present(self.access_token.as_deref(), "credentials.access_token")?,
            access_token_secret: require_present(
                self.access_token_secret.as_deref(),
                "credentials.access_token_secret",
            )?,
        })
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.consumer_key = expand::expand_env(&self.consumer_key, "credentials.consumer_key")?;
        expand::expand_opt(&mut self.consumer_secret, "credentials.consumer_secret")?;
        expand::expand_opt(&mut self.access_token, "credentials.access_token")?;
        expand::expand_opt(
            &mut self.access_token_secret,
            "credentials.access_token_secret",
        )?;
        expand::expand_opt(&mut self.key_file, "credentials.key_file")?;
        Ok(())
    }

    fn resolve_paths(&mut self, config_dir: &Path) {
        self.key_path = self.key_file.as_deref().map(|file| config_dir.join(file));
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`credentials.access_token`").
        field: String,
        /// Error message (e.g., "${`IPP_ACCESS_TOKEN`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require an optional string field to be set and non-empty.
fn require_present<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, ConfigError> {
    let value = value.ok_or_else(|| ConfigError::Validation(format!("{field} is required")))?;
    require_non_empty(value, field)?;
    Ok(value)
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `ipp.toml` in the current directory and its parents, falling back
    /// to defaults when none is found.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Self::load_from_file(path);
        }

        match Self::discover_config() {
            Some(discovered) => Self::load_from_file(&discovered),
            None => Ok(Self::default()),
        }
    }

    /// Get validated credentials.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the section is missing or invalid.
    pub fn require_credentials(&self) -> Result<&CredentialsConfig, ConfigError> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            ConfigError::Validation("[credentials] section required in config".into())
        })?;
        credentials.mode()?;
        Ok(credentials)
    }

    /// Validate configuration values.
    ///
    /// The `[credentials]` section is checked lazily by
    /// [`Config::require_credentials`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.oauth.validate()
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        if let Some(ref mut credentials) = config.credentials {
            credentials.resolve_paths(config_dir);
        }
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.oauth.request_token_url =
            expand::expand_env(&self.oauth.request_token_url, "oauth.request_token_url")?;
        self.oauth.authorize_url =
            expand::expand_env(&self.oauth.authorize_url, "oauth.authorize_url")?;
        self.oauth.access_token_url =
            expand::expand_env(&self.oauth.access_token_url, "oauth.access_token_url")?;

        if let Some(ref mut credentials) = self.credentials {
            credentials.expand_env_vars()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join(CONFIG_FILENAME);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_default_endpoints() {
        let config = Config::default();
        assert_eq!(config.oauth.request_token_url, DEFAULT_REQUEST_TOKEN_URL);
        assert_eq!(config.oauth.authorize_url, DEFAULT_AUTHORIZE_URL);
        assert_eq!(config.oauth.access_token_url, DEFAULT_ACCESS_TOKEN_URL);
        assert!(config.credentials.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.oauth, OAuthEndpoints::default());
    }

    #[test]
    fn test_partial_endpoints_keep_defaults() {
        let toml = r#"
[oauth]
authorize_url = "https://sandbox.example.com/Connect/Begin"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.oauth.authorize_url,
            "https://sandbox.example.com/Connect/Begin"
        );
        assert_eq!(config.oauth.request_token_url, DEFAULT_REQUEST_TOKEN_URL);
        assert_eq!(config.oauth.access_token_url, DEFAULT_ACCESS_TOKEN_URL);
    }

    #[test]
    fn test_endpoint_must_be_http() {
        let endpoints = OAuthEndpoints {
            access_token_url: "ftp://example.com/token".to_owned(),
            ..OAuthEndpoints::default()
        };
        let err = endpoints.validate().unwrap_err();
        assert!(err.to_string().contains("oauth.access_token_url"));
    }

    #[test]
    fn test_hmac_credentials_mode() {
        let toml = r#"
[credentials]
consumer_key = "ck"
consumer_secret = "cs"
access_token = "at"
access_token_secret = "ats"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let credentials = config.require_credentials().unwrap();
        assert_eq!(
            credentials.mode().unwrap(),
            CredentialsMode::HmacSha1 {
                consumer_key: "ck",
                consumer_secret: "cs",
                access_token: "at",
                access_token_secret: "ats",
            }
        );
    }

    #[test]
    fn test_hmac_credentials_missing_secret() {
        let toml = r#"
[credentials]
consumer_key = "ck"
consumer_secret = "cs"
access_token = "at"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let err = config.require_credentials().unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        assert!(err.to_string().contains("credentials.access_token_secret"));
    }

    #[test]
    fn test_blank_consumer_key_rejected() {
        let credentials = CredentialsConfig::hmac("  ", "cs", "at", "ats");
        let err = credentials.mode().unwrap_err();
        assert!(err.to_string().contains("credentials.consumer_key"));
    }

    #[test]
    fn test_missing_credentials_section() {
        let config = Config::default();
        let err = config.require_credentials().unwrap_err();
        assert!(err.to_string().contains("[credentials]"));
    }

    #[test]
    fn test_load_resolves_key_file_relative_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
[credentials]
consumer_key = "app-token"
key_file = "keys/app.pem"
"#,
        );

        let config = Config::load(Some(&path)).unwrap();
        let credentials = config.require_credentials().unwrap();
        assert_eq!(
            credentials.mode().unwrap(),
            CredentialsMode::RsaSha1 {
                consumer_key: "app-token",
                key_path: &dir.path().join("keys/app.pem"),
            }
        );
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_key_file_with_secrets_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
[credentials]
consumer_key = "app-token"
consumer_secret = "cs"
key_file = "app.pem"
"#,
        );

        let config = Config::load(Some(&path)).unwrap();
        let err = config.require_credentials().unwrap_err();
        assert!(err.to_string().contains("key_file"));
    }

    #[test]
    fn test_load_expands_env_vars() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("IPP_TEST_LOAD_SECRET", "from-env");
        }
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
[credentials]
consumer_key = "ck"
consumer_secret = "${IPP_TEST_LOAD_SECRET}"
access_token = "at"
access_token_secret = "${IPP_TEST_LOAD_UNSET:-fallback}"
"#,
        );

        let config = Config::load(Some(&path)).unwrap();
        let credentials = config.credentials.as_ref().unwrap();
        assert_eq!(credentials.consumer_secret.as_deref(), Some("from-env"));
        assert_eq!(credentials.access_token_secret.as_deref(), Some("fallback"));
        unsafe {
            std::env::remove_var("IPP_TEST_LOAD_SECRET");
        }
    }

    #[test]
    fn test_load_rejects_invalid_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
[oauth]
request_token_url = "oauth.example.com/request"
"#,
        );

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let err = Config::load(Some(Path::new("/nonexistent/ipp.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[oauth\nauthorize_url = 1");
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_rsa_constructor_sets_key_path() {
        let credentials = CredentialsConfig::rsa("app-token", "/etc/ipp/app.pem");
        assert_eq!(
            credentials.mode().unwrap(),
            CredentialsMode::RsaSha1 {
                consumer_key: "app-token",
                key_path: Path::new("/etc/ipp/app.pem"),
            }
        );
    }
}
