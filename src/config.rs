use crate::error::{RelayError, Result};
use crate::translate::prompt::PromptSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted `/translate` body.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u64,
    /// Outbound request timeout. Unset leaves the HTTP client default in place.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_username_env")]
    pub username_env: String,
    #[serde(default = "default_password_env")]
    pub password_env: String,
    /// Refuse to start when the credentials are not set.
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptConfig {
    #[serde(default)]
    pub schema: PromptSchema,
}

/// Secrets resolved from the environment once at start-up.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub basic_auth: Option<BasicCredentials>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

// Keep secrets out of Debug output.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("basic_auth", &self.basic_auth.is_some())
            .finish()
    }
}

fn default_port() -> u16 {
    3000
}

fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_temperature() -> f64 {
    0.5
}

fn default_max_tokens() -> u64 {
    1500
}

fn default_username_env() -> String {
    "AUTH_USERNAME".to_string()
}

fn default_password_env() -> String {
    "AUTH_PASSWORD".to_string()
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
            upstream: UpstreamConfig::default(),
            auth: AuthConfig::default(),
            prompt: PromptConfig::default(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: None,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username_env: default_username_env(),
            password_env: default_password_env(),
            required: false,
        }
    }
}

impl UpstreamConfig {
    /// Full URL of the chat-completions endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl RelayConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RelayError::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Search standard locations for a config file, falling back to defaults.
    /// Priority: CLI arg > CWD > XDG config > home dir
    pub fn find_and_load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::load(path);
        }

        for candidate in &config_search_paths() {
            if candidate.exists() {
                tracing::info!(path = %candidate.display(), "Loading config");
                return Self::load(candidate);
            }
        }

        tracing::info!("No config file found, using built-in defaults");
        Ok(Self::default())
    }

    /// Resolve the API key and basic-auth pair from the configured environment variables.
    pub fn resolve_credentials(&self) -> Result<Credentials> {
        self.resolve_credentials_with(|name| std::env::var(name).ok())
    }

    /// Same as [`resolve_credentials`](Self::resolve_credentials) with an explicit lookup.
    pub fn resolve_credentials_with<F>(&self, lookup: F) -> Result<Credentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(&self.upstream.api_key_env)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                RelayError::config(format!(
                    "Environment variable '{}' not set. Set it with your upstream API key.",
                    self.upstream.api_key_env
                ))
            })?;

        let username = lookup(&self.auth.username_env).filter(|v| !v.is_empty());
        let password = lookup(&self.auth.password_env).filter(|v| !v.is_empty());

        let basic_auth = match (username, password) {
            (Some(username), Some(password)) => Some(BasicCredentials { username, password }),
            (None, None) if !self.auth.required => None,
            _ => {
                return Err(RelayError::config(format!(
                    "Basic auth needs both '{}' and '{}' set",
                    self.auth.username_env, self.auth.password_env
                )))
            }
        };

        Ok(Credentials {
            api_key,
            basic_auth,
        })
    }
}

pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // CWD
    paths.push(PathBuf::from("arabic-relay.toml"));

    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        paths.push(PathBuf::from(xdg).join("arabic-relay").join("config.toml"));
    }
    if let Some(home) = home_dir() {
        paths.push(home.join(".config").join("arabic-relay").join("config.toml"));
        paths.push(home.join(".arabic-relay.toml"));
    }

    paths
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_load_config() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(
            f,
            r#"
port = 8080

[upstream]
base_url = "https://my-server.com/v1/"
model = "gpt-4o"
temperature = 0.3

[auth]
required = true

[prompt]
schema = "workflow"
"#
        )
        .unwrap();

        let config = RelayConfig::load(f.path()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.upstream.model, "gpt-4o");
        assert_eq!(config.upstream.max_tokens, 1500);
        assert_eq!(config.upstream.api_key_env, "OPENAI_API_KEY");
        assert_eq!(
            config.upstream.completions_url(),
            "https://my-server.com/v1/chat/completions"
        );
        assert!(config.auth.required);
        assert_eq!(config.prompt.schema, PromptSchema::Workflow);
    }

    #[test]
    fn test_defaults() {
        let config: RelayConfig = toml::from_str("").unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.max_body_bytes, 2 * 1024 * 1024);
        assert_eq!(config.upstream.model, "gpt-3.5-turbo");
        assert!((config.upstream.temperature - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.upstream.timeout_secs, None);
        assert_eq!(
            config.upstream.completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(config.prompt.schema, PromptSchema::Flat);
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let config = RelayConfig::default();
        let err = config.resolve_credentials_with(env_of(&[])).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_basic_auth_enabled_when_both_set() {
        let config = RelayConfig::default();
        let creds = config
            .resolve_credentials_with(env_of(&[
                ("OPENAI_API_KEY", "sk-test"),
                ("AUTH_USERNAME", "admin"),
                ("AUTH_PASSWORD", "secret"),
            ]))
            .unwrap();
        assert_eq!(creds.api_key, "sk-test");
        let basic = creds.basic_auth.unwrap();
        assert_eq!(basic.username, "admin");
        assert_eq!(basic.password, "secret");
    }

    #[test]
    fn test_basic_auth_disabled_when_unset() {
        let config = RelayConfig::default();
        let creds = config
            .resolve_credentials_with(env_of(&[("OPENAI_API_KEY", "sk-test")]))
            .unwrap();
        assert!(creds.basic_auth.is_none());
    }

    #[test]
    fn test_half_configured_basic_auth_is_rejected() {
        let config = RelayConfig::default();
        let result = config.resolve_credentials_with(env_of(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("AUTH_USERNAME", "admin"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_required_auth_without_credentials_is_rejected() {
        let mut config = RelayConfig::default();
        config.auth.required = true;
        let result = config.resolve_credentials_with(env_of(&[("OPENAI_API_KEY", "sk-test")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let creds = Credentials {
            api_key: "sk-very-secret".to_string(),
            basic_auth: None,
        };
        assert!(!format!("{creds:?}").contains("sk-very-secret"));
    }
}
