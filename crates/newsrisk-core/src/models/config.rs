//! Configuration structures for the analysis pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use newsrisk_transport::{DEFAULT_BASE_URL, SamplingParams};

/// Main configuration for a newsrisk session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsRiskConfig {
    /// Analysis endpoint configuration.
    pub api: ApiConfig,

    /// Highlight colors used by the renderers.
    pub colors: HighlightColors,
}

/// Chat-completion endpoint configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// OpenAI API key.
    pub api_key: String,

    /// Model used for analysis.
    pub model: ModelId,

    /// API root; the transport appends `/chat/completions`.
    pub base_url: String,

    /// Sampling temperature (kept low for extraction).
    pub temperature: f32,

    /// Upper bound on reply length.
    pub max_tokens: u32,

    /// Whole-call timeout in seconds (0 = no timeout).
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let sampling = SamplingParams::default();
        Self {
            api_key: String::new(),
            model: ModelId::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
            timeout_secs: 120,
        }
    }
}

impl ApiConfig {
    /// Sampling parameters passed through to the transport.
    pub fn sampling(&self) -> SamplingParams {
        SamplingParams {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Call timeout, if one is configured.
    pub fn timeout(&self) -> Option<std::time::Duration> {
        (self.timeout_secs > 0).then(|| std::time::Duration::from_secs(self.timeout_secs))
    }

    /// Whether an API key has been set.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// CSS colors for the three highlight kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightColors {
    /// Company name highlight.
    pub company: String,

    /// Citation (criticism) highlight.
    pub criticism: String,

    /// Criticism source highlight.
    pub source: String,
}

impl Default for HighlightColors {
    fn default() -> Self {
        Self {
            company: "#cce5ff".to_string(),
            criticism: "#fff3cd".to_string(),
            source: "#d4edda".to_string(),
        }
    }
}

/// Supported analysis models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModelId {
    #[default]
    #[serde(rename = "gpt-4-turbo")]
    Gpt4Turbo,
    #[serde(rename = "gpt-4o")]
    Gpt4o,
    #[serde(rename = "gpt-4o-mini")]
    Gpt4oMini,
    #[serde(rename = "gpt-3.5-turbo")]
    Gpt35Turbo,
}

impl ModelId {
    /// All supported models, recommended first.
    pub const ALL: [ModelId; 4] = [
        ModelId::Gpt4Turbo,
        ModelId::Gpt4o,
        ModelId::Gpt4oMini,
        ModelId::Gpt35Turbo,
    ];

    /// Identifier sent to the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::Gpt4Turbo => "gpt-4-turbo",
            ModelId::Gpt4o => "gpt-4o",
            ModelId::Gpt4oMini => "gpt-4o-mini",
            ModelId::Gpt35Turbo => "gpt-3.5-turbo",
        }
    }

    /// Human-readable name for model pickers.
    pub fn display_name(&self) -> &'static str {
        match self {
            ModelId::Gpt4Turbo => "GPT-4 Turbo (Recommended)",
            ModelId::Gpt4o => "GPT-4o",
            ModelId::Gpt4oMini => "GPT-4o mini (Faster and more economical)",
            ModelId::Gpt35Turbo => "GPT-3.5 Turbo (Faster but less accurate)",
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelId::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unsupported model: {}", s))
    }
}

/// The browser extension's flat settings object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtensionSettings {
    pub api_key: String,
    pub selected_model: ModelId,
    pub company_color: String,
    pub criticism_color: String,
    pub source_color: String,
}

impl Default for ExtensionSettings {
    fn default() -> Self {
        NewsRiskConfig::default().into()
    }
}

impl From<ExtensionSettings> for NewsRiskConfig {
    fn from(settings: ExtensionSettings) -> Self {
        Self {
            api: ApiConfig {
                api_key: settings.api_key.trim().to_string(),
                model: settings.selected_model,
                ..ApiConfig::default()
            },
            colors: HighlightColors {
                company: settings.company_color,
                criticism: settings.criticism_color,
                source: settings.source_color,
            },
        }
    }
}

impl From<NewsRiskConfig> for ExtensionSettings {
    fn from(config: NewsRiskConfig) -> Self {
        Self {
            api_key: config.api.api_key,
            selected_model: config.api.model,
            company_color: config.colors.company,
            criticism_color: config.colors.criticism,
            source_color: config.colors.source,
        }
    }
}

impl NewsRiskConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }

    /// Restore default model and colors, keeping the API key.
    pub fn reset_keeping_key(&mut self) {
        let api_key = std::mem::take(&mut self.api.api_key);
        *self = Self::default();
        self.api.api_key = api_key;
    }
}
