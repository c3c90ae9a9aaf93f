use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// AiConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_base: default_api_base(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// ContextCardConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextCardConfig {
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    #[serde(default = "default_enrich")]
    pub enrich_with_ai: bool,
    /// Directory names skipped during discovery, in addition to the output
    /// directory and the built-in `target`/`node_modules`/`.git`.
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_extensions() -> Vec<String> {
    ["rs", "ts", "tsx", "js", "jsx", "py", "go", "java"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_files() -> usize {
    200
}

fn default_max_file_bytes() -> u64 {
    200 * 1024
}

fn default_enrich() -> bool {
    true
}

impl Default for ContextCardConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            max_files: default_max_files(),
            max_file_bytes: default_max_file_bytes(),
            enrich_with_ai: default_enrich(),
            exclude: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Project configuration stored at `.mise/config.yaml`. Every field has a
/// default, so a missing file is equivalent to an empty one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub context_cards: ContextCardConfig,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(paths::DEFAULT_OUTPUT_DIR)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            ai: AiConfig::default(),
            context_cards: ContextCardConfig::default(),
        }
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Absolute output root for the given workspace.
    pub fn output_root(&self, root: &Path) -> PathBuf {
        paths::output_root(root, &self.output_dir)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.output_dir.as_os_str().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "output_dir is empty".to_string(),
            });
        }

        if !self.ai.api_base.starts_with("http://") && !self.ai.api_base.starts_with("https://")
        {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("ai.api_base '{}' is not an http(s) URL", self.ai.api_base),
            });
        }

        if !(0.0..=2.0).contains(&self.ai.temperature) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "ai.temperature {} is outside the usual 0.0-2.0 range",
                    self.ai.temperature
                ),
            });
        }

        if self.context_cards.extensions.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "context_cards.extensions is empty: no files will be discovered"
                    .to_string(),
            });
        }

        if self.context_cards.max_files == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "context_cards.max_files is 0: no cards will be generated".to_string(),
            });
        }

        warnings
    }
}
