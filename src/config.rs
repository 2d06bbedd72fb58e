//! Configuration for curidx
//!
//! Loaded from `config.toml`; a missing file means defaults. The file is looked
//! up in `.curidx/` under the working directory first, then under the home
//! directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Connector words of the curriculum's target language, by vocabulary id
pub const DEFAULT_CONNECTOR_VOCABULARY: &[&str] =
    &["ve", "ama", "fakat", "veya", "ya da", "çünkü", "ile", "sonra", "ancak", "de", "da"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct IndexConfig {
    pub content: ContentConfig,
    pub lexicon: LexiconConfig,
    pub grammar: GrammarConfig,
    pub cache: CacheConfig,
    pub watch: WatchConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ContentConfig {
    /// Curriculum file (`.json` or `.toml`)
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconConfig {
    /// Vocabulary ids that count as connector words
    pub connector_vocabulary: Vec<String>,
    /// Option id prefix marking a grammar suffix (`suffix-am`)
    pub suffix_prefix: String,
    /// Option id prefix marking a connector (`conn-ve`)
    pub connector_prefix: String,
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self {
            connector_vocabulary: DEFAULT_CONNECTOR_VOCABULARY
                .iter()
                .map(|s| s.to_string())
                .collect(),
            suffix_prefix: "suffix-".to_string(),
            connector_prefix: "conn-".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GrammarConfig {
    /// Let `grammar-intro` steps register the forms they present
    pub intro_registers_forms: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Keep per-lesson snapshots between queries
    pub memoize_lessons: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            memoize_lessons: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Poll interval for content hot-reload
    pub interval_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { interval_ms: 1000 }
    }
}

impl IndexConfig {
    /// Load configuration from file, defaults when the file does not exist
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        let config: IndexConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", config_path.display()))?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }
}

/// Directory holding curidx configuration
pub fn get_config_dir() -> Result<PathBuf> {
    // Check for .curidx directory in current project first
    let cwd = std::env::current_dir()?;
    let project_dir = cwd.join(".curidx");
    if project_dir.exists() {
        return Ok(project_dir);
    }

    // Fall back to home directory
    let home = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
    Ok(home.join(".curidx"))
}

/// Resolve the config path from an explicit flag or the default location
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(get_config_dir()?.join("config.toml")),
    }
}

/// Write a default configuration unless one already exists
pub fn init(config_path: &Path, content_path: Option<&Path>) -> Result<bool> {
    if config_path.exists() {
        info!("Configuration already present at {:?}", config_path);
        return Ok(false);
    }

    let mut config = IndexConfig::default();
    config.content.path = content_path.map(Path::to_path_buf);
    config.save(config_path)?;
    info!("Created default configuration at {:?}", config_path);
    Ok(true)
}
