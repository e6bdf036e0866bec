// DBI - Debuggee Inspection Client
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Configuration system for the DBI TUI
//!
//! Manages user preferences including color schemes, call trace
//! defaults, and panel settings.

use eyre::{Context, Result};
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Current theme configuration
    pub theme: ThemeConfig,
    /// Call trace preferences
    pub calltrace: CallTraceConfig,
    /// Panel-specific settings
    pub panels: PanelConfig,
}

/// Theme configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Current active theme name
    pub active: String,
    /// Available themes
    pub themes: std::collections::HashMap<String, ThemeDefinition>,
}

/// Individual theme definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeDefinition {
    /// Theme display name
    pub name: String,
    /// Theme description
    pub description: String,
    /// Color scheme for different UI elements
    pub colors: ColorScheme,
}

/// Color scheme definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorScheme {
    /// Focused panel border color
    pub focused_border: String,
    /// Unfocused panel border color
    pub unfocused_border: String,
    /// Selected item background
    pub selected_bg: String,
    /// Selected item foreground
    pub selected_fg: String,
    /// Highlight for nodes first revealed this generation
    pub highlight_new: String,
    /// Highlight for nodes changed this generation
    pub highlight_changed: String,
    /// Help text color
    pub help_text: String,
    /// Success/positive color
    pub success: String,
    /// Error/negative color
    pub error: String,
    /// Warning color
    pub warning: String,
    /// Information color
    pub info: String,
}

/// Call trace preferences. These are the only persisted debugger
/// preferences; open/closed tree paths are in-memory only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CallTraceConfig {
    /// Enable call tracing as soon as a backend is selected
    pub enabled_by_default: bool,
    /// Stop tracing automatically when the traced backend exits
    pub stop_on_exit: bool,
}

/// Panel-specific configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Variables panel settings
    pub variables: VariablesPanelConfig,
    /// Call trace panel settings
    pub calltrace: CallTracePanelConfig,
}

/// Variables panel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VariablesPanelConfig {
    /// Show variable types next to values
    pub show_types: bool,
    /// Start with the globals scope instead of locals
    pub start_with_globals: bool,
}

/// Call trace panel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CallTracePanelConfig {
    /// Show nesting depth indicators
    pub show_depth_indicators: bool,
    /// Maximum trace entries to display
    pub max_entries: usize,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        let mut themes = std::collections::HashMap::new();

        themes.insert(
            "default".to_string(),
            ThemeDefinition {
                name: "Default".to_string(),
                description: "Default DBI theme with cyan accents".to_string(),
                colors: ColorScheme {
                    focused_border: "cyan".to_string(),
                    unfocused_border: "gray".to_string(),
                    selected_bg: "blue".to_string(),
                    selected_fg: "white".to_string(),
                    highlight_new: "green".to_string(),
                    highlight_changed: "yellow".to_string(),
                    help_text: "yellow".to_string(),
                    success: "green".to_string(),
                    error: "red".to_string(),
                    warning: "yellow".to_string(),
                    info: "cyan".to_string(),
                },
            },
        );

        themes.insert(
            "dark".to_string(),
            ThemeDefinition {
                name: "Dark".to_string(),
                description: "Dark theme with minimal colors".to_string(),
                colors: ColorScheme {
                    focused_border: "white".to_string(),
                    unfocused_border: "dark_gray".to_string(),
                    selected_bg: "dark_gray".to_string(),
                    selected_fg: "white".to_string(),
                    highlight_new: "light_green".to_string(),
                    highlight_changed: "light_yellow".to_string(),
                    help_text: "gray".to_string(),
                    success: "green".to_string(),
                    error: "red".to_string(),
                    warning: "yellow".to_string(),
                    info: "white".to_string(),
                },
            },
        );

        themes.insert(
            "light".to_string(),
            ThemeDefinition {
                name: "Light".to_string(),
                description: "Light theme with dark text on light backgrounds".to_string(),
                colors: ColorScheme {
                    focused_border: "blue".to_string(),
                    unfocused_border: "gray".to_string(),
                    selected_bg: "light_blue".to_string(),
                    selected_fg: "black".to_string(),
                    highlight_new: "green".to_string(),
                    highlight_changed: "magenta".to_string(),
                    help_text: "dark_gray".to_string(),
                    success: "green".to_string(),
                    error: "red".to_string(),
                    warning: "yellow".to_string(),
                    info: "blue".to_string(),
                },
            },
        );

        Self { active: "default".to_string(), themes }
    }
}

impl Default for CallTraceConfig {
    fn default() -> Self {
        Self { enabled_by_default: false, stop_on_exit: true }
    }
}

impl Default for VariablesPanelConfig {
    fn default() -> Self {
        Self { show_types: true, start_with_globals: false }
    }
}

impl Default for CallTracePanelConfig {
    fn default() -> Self {
        Self { show_depth_indicators: true, max_entries: 1000 }
    }
}

impl Config {
    /// Get the config file path (~/.dbi.toml)
    pub fn config_path() -> Result<PathBuf> {
        let home =
            dirs::home_dir().ok_or_else(|| eyre::eyre!("Unable to determine home directory"))?;
        Ok(home.join(".dbi.toml"))
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            info!("Config file not found, creating default at {:?}", config_path);
            let default_config = Self::default();
            default_config.save()?;
            return Ok(default_config);
        }

        Self::load_from_path(config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path:?}"))?;

        let config: Self =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        let content =
            toml::to_string_pretty(self).with_context(|| "Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {config_path:?}"))?;

        debug!("Saved configuration to {:?}", config_path);
        Ok(())
    }

    /// Get the currently active theme
    pub fn get_active_theme(&self) -> Option<&ThemeDefinition> {
        self.theme.themes.get(&self.theme.active)
    }

    /// Switch to a different theme
    pub fn set_theme(&mut self, theme_name: &str) -> Result<()> {
        if !self.theme.themes.contains_key(theme_name) {
            return Err(eyre::eyre!("Theme '{}' not found", theme_name));
        }

        self.theme.active = theme_name.to_string();
        info!("Switched to theme: {}", theme_name);
        Ok(())
    }

    /// Convert color string to ratatui Color
    pub fn parse_color(color_str: &str) -> Color {
        match color_str.to_lowercase().as_str() {
            "black" => Color::Black,
            "red" => Color::Red,
            "green" => Color::Green,
            "yellow" => Color::Yellow,
            "blue" => Color::Blue,
            "magenta" => Color::Magenta,
            "cyan" => Color::Cyan,
            "gray" => Color::Gray,
            "dark_gray" => Color::DarkGray,
            "light_red" => Color::LightRed,
            "light_green" => Color::LightGreen,
            "light_yellow" => Color::LightYellow,
            "light_blue" => Color::LightBlue,
            "light_magenta" => Color::LightMagenta,
            "light_cyan" => Color::LightCyan,
            "white" => Color::White,
            "light_gray" => Color::Gray,
            _ => {
                warn!("Unknown color '{}', using default gray", color_str);
                Color::Gray
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[calltrace]\nenabled_by_default = true").unwrap();

        let config = Config::load_from_path(file.path()).unwrap();
        assert!(config.calltrace.enabled_by_default);
        assert!(config.calltrace.stop_on_exit, "unset keys keep their defaults");
        assert_eq!(config.panels.calltrace.max_entries, 1000);
    }

    #[test]
    fn partial_nested_sections_keep_sibling_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[theme]\nactive = \"dark\"\n\n[panels.variables]\nstart_with_globals = true"
        )
        .unwrap();

        let config = Config::load_from_path(file.path()).unwrap();
        assert_eq!(config.theme.active, "dark");
        assert!(config.get_active_theme().is_some(), "built-in themes survive [theme]");
        assert!(config.panels.variables.start_with_globals);
        assert!(config.panels.variables.show_types);
        assert!(config.panels.calltrace.show_depth_indicators);
    }

    #[test]
    fn roundtrip_through_toml() {
        let mut config = Config::default();
        config.panels.variables.show_types = false;

        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert!(!back.panels.variables.show_types);
        assert_eq!(back.theme.active, "default");
    }

    #[test]
    fn unknown_theme_is_rejected() {
        let mut config = Config::default();
        assert!(config.set_theme("nope").is_err());
        assert!(config.set_theme("dark").is_ok());
        assert_eq!(config.theme.active, "dark");
    }

    #[test]
    fn color_names_parse_case_insensitively() {
        assert_eq!(Config::parse_color("Light_Blue"), Color::LightBlue);
        assert_eq!(Config::parse_color("no-such-color"), Color::Gray);
    }
}
