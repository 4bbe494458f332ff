//! Application settings loaded via OrthoConfig.
//!
//! Every field can be set from `CODETOK_*` environment variables or the
//! matching command-line flag. Unset values fall back to the defaults exposed
//! through the accessor methods.

use std::net::SocketAddr;
use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Deserializer};

use crate::domain::{DEFAULT_PROGRESS_INTERVAL, DEFAULT_PROVIDER, DEFAULT_UPLOAD_LIMIT, ModelSpec};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_POOL_SIZE: u32 = 10;
const DEFAULT_BLOB_ROOT: &str = "data/blobs";
const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODELS: &str = "openai:gpt-4o-mini";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address '{value}': {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

/// Server and adapter configuration.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CODETOK")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; in-memory repositories are used when absent.
    pub database_url: Option<String>,
    /// Maximum pooled database connections.
    #[ortho_config(default = 10)]
    pub db_pool_size: u32,
    /// Root directory of the file store.
    pub blob_root: Option<PathBuf>,
    /// Provider name served by the configured endpoint.
    pub llm_provider: Option<String>,
    /// OpenAI-compatible API base URL.
    pub llm_base_url: Option<String>,
    /// API key; generation is disabled without one.
    pub llm_api_key: Option<String>,
    /// `provider:model` preference list, most preferred first.
    #[serde(default, deserialize_with = "model_entries")]
    pub models: Vec<String>,
    /// Emit a progress frame every this many chunks.
    pub progress_interval: Option<usize>,
    /// Maximum upload size in bytes.
    pub upload_limit: Option<usize>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            bind_addr: None,
            database_url: None,
            db_pool_size: DEFAULT_POOL_SIZE,
            blob_root: None,
            llm_provider: None,
            llm_base_url: None,
            llm_api_key: None,
            models: Vec::new(),
            progress_interval: None,
            upload_limit: None,
        }
    }
}

/// Accept the preference list as one comma-separated string or as a list.
///
/// Comma-separated environment values reach serde as sequences while a
/// single entry stays a plain string.
fn model_entries<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Entries {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Entries::deserialize(deserializer)? {
        Entries::One(raw) => raw.split(',').map(str::to_owned).collect(),
        Entries::Many(entries) => entries,
    })
}

impl AppSettings {
    /// Parse the configured bind address.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::BindAddr`] when the value is not a socket
    /// address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.trim().parse().map_err(|source| SettingsError::BindAddr {
            value: raw.to_owned(),
            source,
        })
    }

    /// Database URL, ignoring blank values.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn db_pool_size(&self) -> u32 {
        self.db_pool_size.max(1)
    }

    pub fn blob_root(&self) -> PathBuf {
        self.blob_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BLOB_ROOT))
    }

    pub fn llm_provider(&self) -> &str {
        self.llm_provider.as_deref().unwrap_or(DEFAULT_PROVIDER)
    }

    pub fn llm_base_url(&self) -> &str {
        self.llm_base_url.as_deref().unwrap_or(DEFAULT_LLM_BASE_URL)
    }

    /// API key, ignoring blank values.
    pub fn llm_api_key(&self) -> Option<&str> {
        self.llm_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Parsed model preference list; blank entries are skipped.
    pub fn models(&self) -> Vec<ModelSpec> {
        let models: Vec<ModelSpec> = self
            .models
            .iter()
            .filter_map(|entry| ModelSpec::parse(entry))
            .collect();
        if models.is_empty() {
            ModelSpec::parse_list(DEFAULT_MODELS)
        } else {
            models
        }
    }

    pub fn progress_interval(&self) -> usize {
        self.progress_interval.unwrap_or(DEFAULT_PROGRESS_INTERVAL)
    }

    pub fn upload_limit(&self) -> usize {
        self.upload_limit.unwrap_or(DEFAULT_UPLOAD_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;
    use serde_json::json;

    const VARS: [&str; 10] = [
        "CODETOK_BIND_ADDR",
        "CODETOK_DATABASE_URL",
        "CODETOK_DB_POOL_SIZE",
        "CODETOK_BLOB_ROOT",
        "CODETOK_LLM_PROVIDER",
        "CODETOK_LLM_BASE_URL",
        "CODETOK_LLM_API_KEY",
        "CODETOK_MODELS",
        "CODETOK_PROGRESS_INTERVAL",
        "CODETOK_UPLOAD_LIMIT",
    ];

    fn load_from_empty_args() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("codetok")]).expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr().expect("default address"),
            "0.0.0.0:8080".parse::<SocketAddr>().expect("socket address")
        );
        assert!(settings.database_url().is_none());
        assert!(settings.llm_api_key().is_none());
        assert_eq!(settings.db_pool_size(), DEFAULT_POOL_SIZE);
        assert_eq!(settings.blob_root(), PathBuf::from(DEFAULT_BLOB_ROOT));
        assert_eq!(settings.llm_provider(), "openai");
        assert_eq!(settings.progress_interval(), DEFAULT_PROGRESS_INTERVAL);
        assert_eq!(settings.upload_limit(), DEFAULT_UPLOAD_LIMIT);
        assert_eq!(
            settings.models(),
            vec![ModelSpec {
                provider: "openai".to_owned(),
                model: "gpt-4o-mini".to_owned(),
            }]
        );
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("CODETOK_BIND_ADDR", Some("127.0.0.1:9000".to_owned())),
            (
                "CODETOK_DATABASE_URL",
                Some("postgres://codetok@localhost/codetok".to_owned()),
            ),
            ("CODETOK_DB_POOL_SIZE", Some("4".to_owned())),
            ("CODETOK_BLOB_ROOT", Some("/tmp/codetok".to_owned())),
            ("CODETOK_LLM_PROVIDER", None),
            ("CODETOK_LLM_BASE_URL", None),
            ("CODETOK_LLM_API_KEY", Some("sk-test".to_owned())),
            (
                "CODETOK_MODELS",
                Some("deepseek:deepseek-chat, gpt-4o".to_owned()),
            ),
            ("CODETOK_PROGRESS_INTERVAL", Some("3".to_owned())),
            ("CODETOK_UPLOAD_LIMIT", Some("1024".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr().expect("address").port(),
            9000
        );
        assert_eq!(
            settings.database_url(),
            Some("postgres://codetok@localhost/codetok")
        );
        assert_eq!(settings.db_pool_size(), 4);
        assert_eq!(settings.blob_root(), PathBuf::from("/tmp/codetok"));
        assert_eq!(settings.llm_api_key(), Some("sk-test"));
        let providers: Vec<_> = settings
            .models()
            .into_iter()
            .map(|spec| spec.to_string())
            .collect();
        assert_eq!(providers, ["deepseek:deepseek-chat", "openai:gpt-4o"]);
        assert_eq!(settings.progress_interval(), 3);
        assert_eq!(settings.upload_limit(), 1024);
    }

    #[rstest]
    #[case(json!("openai:gpt-4o"), &["openai:gpt-4o"])]
    #[case(json!("deepseek:deepseek-chat, gpt-4o"), &["deepseek:deepseek-chat", "openai:gpt-4o"])]
    #[case(json!(["anthropic:claude", " ", "gpt-4o-mini"]), &["anthropic:claude", "openai:gpt-4o-mini"])]
    #[case(json!([]), &["openai:gpt-4o-mini"])]
    fn model_lists_accept_strings_and_sequences(
        #[case] raw: serde_json::Value,
        #[case] expected: &[&str],
    ) {
        let settings: AppSettings =
            serde_json::from_value(json!({"db_pool_size": 1, "models": raw})).expect("settings");
        let models: Vec<String> = settings.models().iter().map(ToString::to_string).collect();
        assert_eq!(models, expected);
    }

    #[rstest]
    #[case(Some(""))]
    #[case(Some("   "))]
    #[case(None)]
    fn blank_database_urls_select_memory_mode(#[case] raw: Option<&str>) {
        let settings = AppSettings {
            database_url: raw.map(str::to_owned),
            ..AppSettings::default()
        };
        assert!(settings.database_url().is_none());
    }

    #[rstest]
    fn malformed_bind_addresses_are_reported() {
        let settings = AppSettings {
            bind_addr: Some("localhost".to_owned()),
            ..AppSettings::default()
        };
        let err = settings.bind_addr().expect_err("not a socket address");
        assert!(err.to_string().contains("localhost"));
    }
}
