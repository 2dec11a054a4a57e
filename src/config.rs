use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

static DEFAULT_CONFIG: &str = include_str!("default_config.toml");

/// Language used for code blocks without a fence tag.
pub const PLAIN_TEXT: &str = "plain text";

pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub code: CodeConfig,
    pub inline: InlineConfig,
    pub note: NoteConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CodeConfig {
    pub default_language: String,
    pub aliases: BTreeMap<String, String>,
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self {
            default_language: PLAIN_TEXT.to_string(),
            aliases: BTreeMap::new(),
        }
    }
}

impl CodeConfig {
    /// Resolve a fence info string to a language name.
    ///
    /// Only the first whitespace-delimited token counts, except for the
    /// literal `plain text` which is kept whole.
    pub fn language_for(&self, info: Option<&str>) -> String {
        let info = info.map(str::trim).unwrap_or_default();
        if info == PLAIN_TEXT {
            return PLAIN_TEXT.to_string();
        }
        let Some(tag) = info.split_whitespace().next() else {
            return self.default_language.clone();
        };
        let tag = tag.to_lowercase();
        match self.aliases.get(&tag) {
            Some(language) => language.clone(),
            None => tag,
        }
    }
}

/// How a soft line break inside a paragraph is rendered.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SoftBreak {
    #[default]
    Newline,
    Space,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct InlineConfig {
    pub soft_break: SoftBreak,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NoteConfig {
    pub heading_prefix: String,
    pub timestamp_format: String,
}

impl Default for NoteConfig {
    fn default() -> Self {
        Self {
            heading_prefix: "📝".to_string(),
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
        }
    }
}

impl Config {
    /// The defaults embedded at build time.
    pub fn compiled_default() -> Self {
        // build.rs rejects an unparseable default_config.toml
        toml::from_str(DEFAULT_CONFIG).unwrap_or_default()
    }

    /// Load config from a TOML file, or return the compiled defaults if the
    /// file is missing or invalid.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid config {}: {}", path.display(), e);
                Self::compiled_default()
            }),
            Err(e) => {
                tracing::debug!("No config at {}: {}", path.display(), e);
                Self::compiled_default()
            }
        }
    }

    /// Parse a TOML document layered over the compiled defaults.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        let mut base: toml::Table = toml::from_str(DEFAULT_CONFIG).unwrap_or_default();
        let overrides: toml::Table = toml::from_str(content)?;
        merge_tables(&mut base, overrides);
        toml::Value::Table(base).try_into()
    }
}

fn merge_tables(base: &mut toml::Table, overrides: toml::Table) {
    for (key, value) in overrides {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
