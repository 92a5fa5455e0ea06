//! Layered configuration system
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `PRIMER_{PROVIDER}_API_KEYS` (comma-separated)
//!    and `PRIMER_{PROVIDER}_API_URL`
//! 2. Project-local: `.primer/config.toml`
//! 3. Global: `~/.primer/config.toml`
//!
//! Tables are deep-merged, so a project file only needs the keys it changes.
//! [`PrimerConfig::validate`] checks the selected providers up front so a
//! missing key fails at startup instead of deep inside a generation call.

use crate::capability::Capability;
use crate::prompt::PromptStyle;
use crate::providers;
use primer_catalog::{AssetLayout, ValidationSettings};
use primer_core::{PrimerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Provider-specific configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Credential pool, rotated round-robin
    #[serde(default)]
    pub api_keys: Vec<String>,
    /// Single-key shorthand, appended to `api_keys`
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
    /// Chat model for text providers
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub image_model: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// Generation defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_text_provider")]
    pub text_provider: String,
    #[serde(default = "default_image_provider")]
    pub image_provider: String,
    #[serde(default = "default_speech_provider")]
    pub speech_provider: String,
    /// Pause after every external call
    #[serde(default = "default_call_delay_ms")]
    pub call_delay_ms: u64,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Categories that get the generic "one item" image prompt
    #[serde(default = "default_non_vehicle_categories")]
    pub non_vehicle_categories: Vec<String>,
    #[serde(default)]
    pub style: Option<PromptStyle>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            text_provider: default_text_provider(),
            image_provider: default_image_provider(),
            speech_provider: default_speech_provider(),
            call_delay_ms: default_call_delay_ms(),
            poll_interval_secs: default_poll_interval_secs(),
            max_poll_attempts: default_max_poll_attempts(),
            request_timeout_secs: default_request_timeout_secs(),
            non_vehicle_categories: default_non_vehicle_categories(),
            style: None,
        }
    }
}

fn default_text_provider() -> String {
    "modelscope".to_string()
}
fn default_image_provider() -> String {
    "modelscope".to_string()
}
fn default_speech_provider() -> String {
    "edge-tts".to_string()
}
fn default_call_delay_ms() -> u64 {
    1000
}
fn default_poll_interval_secs() -> u64 {
    5
}
fn default_max_poll_attempts() -> u32 {
    60
}
fn default_request_timeout_secs() -> u64 {
    60
}
fn default_non_vehicle_categories() -> Vec<String> {
    ["家具", "动物", "天气", "食物", "职业"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Catalog location and asset layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Catalog document, relative to the asset root
    #[serde(default = "default_catalog_file")]
    pub catalog_file: String,
    #[serde(flatten)]
    pub layout: AssetLayout,
}

fn default_catalog_file() -> String {
    "assets/catalog.json".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            catalog_file: default_catalog_file(),
            layout: AssetLayout::default(),
        }
    }
}

/// Voices used by speech providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_primary_voice")]
    pub primary_voice: String,
    #[serde(default = "default_secondary_voice")]
    pub secondary_voice: String,
}

fn default_primary_voice() -> String {
    "Microsoft Server Speech Text to Speech Voice (zh-CN, XiaoxiaoNeural)".to_string()
}
fn default_secondary_voice() -> String {
    "Microsoft Server Speech Text to Speech Voice (en-US, JennyNeural)".to_string()
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            primary_voice: default_primary_voice(),
            secondary_voice: default_secondary_voice(),
        }
    }
}

/// Outbound HTTP proxy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub url: Option<String>,
}

/// Top-level config file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrimerConfigFile {
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub validation: ValidationSettings,
}

/// Resolved configuration with environment variable overrides applied
#[derive(Debug, Clone, Default)]
pub struct PrimerConfig {
    pub providers: HashMap<String, ProviderConfig>,
    pub generation: GenerationConfig,
    pub catalog: CatalogConfig,
    pub speech: SpeechConfig,
    pub proxy: ProxyConfig,
    pub validation: ValidationSettings,
}

impl PrimerConfig {
    /// Load config with layered precedence: global < project < env vars
    pub fn load() -> Result<Self> {
        let mut merged = toml::Table::new();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                deep_merge(&mut merged, Self::read_table(&global_path)?);
            }
        }

        let local_path = PathBuf::from(".primer/config.toml");
        if local_path.exists() {
            deep_merge(&mut merged, Self::read_table(&local_path)?);
        }

        Self::from_table(merged)
    }

    /// Load config from a specific file path only (env overrides still apply)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PrimerError::ConfigurationError(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        Self::from_table(Self::read_table(path)?)
    }

    /// Parse config from TOML text (env overrides still apply)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(content).map_err(|e| {
            PrimerError::ConfigurationError(format!("failed to parse config: {}", e))
        })?;
        Self::from_table(table)
    }

    fn from_table(table: toml::Table) -> Result<Self> {
        let mut file: PrimerConfigFile = toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| {
                PrimerError::ConfigurationError(format!("invalid config: {}", e))
            })?;
        Self::apply_env_overrides(&mut file);

        Ok(PrimerConfig {
            providers: file.providers,
            generation: file.generation,
            catalog: file.catalog,
            speech: file.speech,
            proxy: file.proxy,
            validation: file.validation,
        })
    }

    /// Credential pool for a provider. The mock provider needs none and gets a placeholder.
    pub fn credential_pool(&self, provider_name: &str) -> Vec<String> {
        let mut pool: Vec<String> = self
            .providers
            .get(provider_name)
            .map(|p| {
                let mut keys = p.api_keys.clone();
                keys.extend(p.api_key.clone());
                keys
            })
            .unwrap_or_default();
        pool.retain(|k| !k.trim().is_empty());

        if pool.is_empty() && provider_name == providers::MOCK {
            pool.push("mock".to_string());
        }
        pool
    }

    pub fn api_url(&self, provider_name: &str) -> Option<&str> {
        self.providers
            .get(provider_name)
            .and_then(|p| p.api_url.as_deref())
    }

    pub fn model(&self, provider_name: &str) -> Option<&str> {
        self.providers
            .get(provider_name)
            .and_then(|p| p.model.as_deref())
    }

    pub fn image_model(&self, provider_name: &str) -> Option<&str> {
        self.providers
            .get(provider_name)
            .and_then(|p| p.image_model.as_deref())
    }

    /// Check if a provider is enabled
    pub fn is_enabled(&self, provider_name: &str) -> bool {
        self.providers
            .get(provider_name)
            .map(|p| p.enabled)
            .unwrap_or(true)
    }

    /// The provider selected for a capability
    pub fn provider_for(&self, capability: Capability) -> &str {
        match capability {
            Capability::Text => &self.generation.text_provider,
            Capability::Image => &self.generation.image_provider,
            Capability::Speech => &self.generation.speech_provider,
        }
    }

    /// Catalog document path
    pub fn catalog_path(&self) -> PathBuf {
        self.catalog
            .layout
            .resolve(&self.catalog.catalog_file)
    }

    pub fn layout(&self) -> &AssetLayout {
        &self.catalog.layout
    }

    pub fn call_delay(&self) -> Duration {
        Duration::from_millis(self.generation.call_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.generation.request_timeout_secs)
    }

    pub fn proxy_url(&self) -> Option<&str> {
        self.proxy.url.as_deref().filter(|u| !u.trim().is_empty())
    }

    /// Validate the settings a run depends on.
    ///
    /// Only the capabilities in `needed` are checked, so `reconcile` works
    /// without any API keys.
    pub fn validate(&self, needed: &[Capability]) -> Result<()> {
        for &capability in needed {
            let name = self.provider_for(capability);
            if !providers::available_providers().contains(&name) {
                return Err(PrimerError::ConfigurationError(format!(
                    "unknown {} provider '{}'. Available: {}",
                    capability,
                    name,
                    providers::available_providers().join(", ")
                )));
            }
            if !providers::supports(name, capability) {
                return Err(PrimerError::ConfigurationError(format!(
                    "provider '{}' cannot generate {}",
                    name, capability
                )));
            }
            if !self.is_enabled(name) {
                return Err(PrimerError::ConfigurationError(format!(
                    "provider '{}' is disabled in config",
                    name
                )));
            }
            if self.credential_pool(name).is_empty() {
                return Err(PrimerError::ConfigurationError(format!(
                    "no credentials configured for '{}'. Set {} or add api_keys to .primer/config.toml",
                    name,
                    env_var_name(name, "API_KEYS")
                )));
            }
        }

        if needed.contains(&Capability::Image) && self.generation.max_poll_attempts == 0 {
            return Err(PrimerError::ConfigurationError(
                "generation.max_poll_attempts must be at least 1".to_string(),
            ));
        }
        if self.generation.request_timeout_secs == 0 {
            return Err(PrimerError::ConfigurationError(
                "generation.request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.catalog.catalog_file.trim().is_empty() {
            return Err(PrimerError::ConfigurationError(
                "catalog.catalog_file must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".primer").join("config.toml"))
    }

    fn read_table(path: &Path) -> Result<toml::Table> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            PrimerError::ConfigurationError(format!(
                "failed to parse config {}: {}",
                path.display(),
                e
            ))
        })
    }

    fn apply_env_overrides(config: &mut PrimerConfigFile) {
        for name in providers::available_providers() {
            if let Ok(keys) = std::env::var(env_var_name(name, "API_KEYS")) {
                let entry = config.providers.entry(name.to_string()).or_default();
                entry.api_keys = split_keys(&keys);
                entry.api_key = None;
            }
            if let Ok(url) = std::env::var(env_var_name(name, "API_URL")) {
                let entry = config.providers.entry(name.to_string()).or_default();
                entry.api_url = Some(url);
            }
        }
    }
}

/// `PRIMER_EDGE_TTS_API_KEYS` for ("edge-tts", "API_KEYS")
pub fn env_var_name(provider_name: &str, suffix: &str) -> String {
    format!(
        "PRIMER_{}_{}",
        provider_name.to_uppercase().replace('-', "_"),
        suffix
    )
}

fn split_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect()
}

/// Merge `overlay` into `base`, recursing into nested tables
fn deep_merge(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                deep_merge(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
