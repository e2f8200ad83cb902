use anyhow::Context;
use directories::ProjectDirs;
use eframe::egui::{Key, Modifiers};
use label_connector::Settings;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Key bindings of the connector commands, written like `"F8"` or `"Ctrl+F8"`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ShortcutConfig {
    pub make_connector: String,
    pub connect: String,
    pub force_connect: String,
    pub jump_to_source: String,
}

impl Default for ShortcutConfig {
    fn default() -> Self {
        Self {
            make_connector: "F7".to_string(),
            connect: "F8".to_string(),
            force_connect: "Ctrl+F8".to_string(),
            jump_to_source: "Shift+F8".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub settings: Settings,
    pub shortcuts: ShortcutConfig,
}

impl AppConfig {
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Parses `"Ctrl+Shift+F8"`-style text. `Ctrl` maps to the platform command key.
pub fn parse_shortcut(text: &str) -> Option<(Modifiers, Key)> {
    let mut parts: Vec<&str> = text.split('+').map(str::trim).collect();
    let key = Key::from_name(parts.pop()?)?;
    let mut modifiers = Modifiers::NONE;
    for part in parts {
        match part.to_ascii_lowercase().as_str() {
            "ctrl" | "control" | "cmd" | "command" => modifiers = modifiers | Modifiers::COMMAND,
            "shift" => modifiers = modifiers | Modifiers::SHIFT,
            "alt" | "option" => modifiers = modifiers | Modifiers::ALT,
            _ => return None,
        }
    }
    Some((modifiers, key))
}

pub fn format_shortcut(modifiers: Modifiers, key: Key) -> String {
    let mut text = String::new();
    if modifiers.command || modifiers.ctrl {
        text.push_str("Ctrl+");
    }
    if modifiers.alt {
        text.push_str("Alt+");
    }
    if modifiers.shift {
        text.push_str("Shift+");
    }
    text.push_str(key.name());
    text
}

fn get_config_path() -> Option<PathBuf> {
    let proj_dirs = ProjectDirs::from("me", "liesegang", "label_connector")?;
    let config_dir = proj_dirs.config_dir();
    if !config_dir.exists() {
        if let Err(e) = fs::create_dir_all(config_dir) {
            error!("Failed to create config directory: {}", e);
            return None;
        }
    }
    Some(config_dir.join("config.toml"))
}

pub fn save_config(config: &AppConfig) -> anyhow::Result<PathBuf> {
    let path = get_config_path().context("No config directory available")?;
    let toml_str = config.to_toml().context("Failed to serialize config")?;
    fs::write(&path, toml_str)
        .with_context(|| format!("Failed to write config file {}", path.display()))?;
    info!("Settings saved to {}", path.display());
    Ok(path)
}

pub fn load_config() -> AppConfig {
    if let Some(path) = get_config_path() {
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(toml_str) => match AppConfig::from_toml(&toml_str) {
                    Ok(config) => return config,
                    Err(e) => {
                        warn!("Failed to parse config file, using defaults: {}", e);
                    }
                },
                Err(e) => {
                    warn!("Failed to read config file, using defaults: {}", e);
                }
            }
        }
    }
    AppConfig::default()
}
