//! The flat JSON configuration document: style values plus the two
//! watched file paths. Persisted with the original camelCase key names so
//! documents written by older builds keep loading.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{locate, Result};

pub const CONFIG_DIR_NAME: &str = "HolocureBuddy";
pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_text_color")]
    pub text_color: String,
    #[serde(default = "default_background_color")]
    pub background_color: String,
    #[serde(default = "default_border_color")]
    pub border_color: String,
    #[serde(default = "default_cleared_color")]
    pub cleared_color: String,
    #[serde(default = "default_selected_color")]
    pub selected_color: String,
    #[serde(default = "default_font")]
    pub font: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<PathBuf>,
}

fn default_text_color() -> String {
    "#F0F0F0".to_string()
}

fn default_background_color() -> String {
    "#2B2B33".to_string()
}

fn default_border_color() -> String {
    "#666".to_string()
}

fn default_cleared_color() -> String {
    "#008000".to_string()
}

fn default_selected_color() -> String {
    "#E6641E".to_string()
}

fn default_font() -> String {
    "system-ui".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            text_color: default_text_color(),
            background_color: default_background_color(),
            border_color: default_border_color(),
            cleared_color: default_cleared_color(),
            selected_color: default_selected_color(),
            font: default_font(),
            save: None,
            data: None,
        }
    }
}

/// Parse a config document. The legacy `fontfamily`/`fontFamily` key is
/// migrated into `font` when `font` itself is absent; unknown keys are
/// ignored, missing style keys fall back to defaults.
pub fn parse(text: &str) -> Result<Config> {
    let mut value: serde_json::Value = serde_json::from_str(text)?;
    if let Some(object) = value.as_object_mut() {
        let legacy = object
            .remove("fontfamily")
            .or_else(|| object.remove("fontFamily"));
        if let Some(legacy) = legacy {
            if !object.contains_key("font") {
                object.insert("font".to_string(), legacy);
            }
        }
    }
    Ok(serde_json::from_value(value)?)
}

pub fn load(path: &Path) -> Result<Config> {
    parse(&fs::read_to_string(path)?)
}

pub fn save_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(config)?)?;
    Ok(())
}

/// Per-user config location: `<local data dir>/HolocureBuddy/config.json`.
pub fn default_path() -> Option<PathBuf> {
    let mut base = dirs::data_local_dir().or_else(dirs::config_dir)?;
    base.push(CONFIG_DIR_NAME);
    base.push(CONFIG_FILE_NAME);
    Some(base)
}

/// Load the document, writing a fresh default one (with whatever game
/// files could be discovered) on first run.
pub fn load_or_create(path: &Path) -> Result<Config> {
    if path.exists() {
        return load(path);
    }
    let config = locate::default_config();
    save_to(&config, path)?;
    log::info!("wrote default config to {}", path.display());
    Ok(config)
}
