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

//! Shared UI chrome: borders, status indicators, theme colors.

pub mod borders;
pub mod status;

pub use borders::BorderPresets;
pub use status::{BackendStatus, StatusBar};

use ratatui::style::Color;

use crate::config::Config;

/// Resolved theme colors, parsed once from the active config.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    /// Focused panel border color.
    pub focused_border: Color,
    /// Unfocused panel border color.
    pub unfocused_border: Color,
    /// Selected row background.
    pub selected_bg: Color,
    /// Selected row foreground.
    pub selected_fg: Color,
    /// Color of nodes first revealed this generation.
    pub highlight_new: Color,
    /// Color of nodes changed since the previous generation.
    pub highlight_changed: Color,
    /// Help/hint text color.
    pub help_text: Color,
    /// Success/ok indicator color.
    pub success: Color,
    /// Error indicator color.
    pub error: Color,
    /// Warning indicator color.
    pub warning: Color,
    /// Informational accent color.
    pub info: Color,
}

impl Theme {
    /// Resolve colors from the active theme of a config, falling back
    /// to the default palette when the active theme is missing.
    pub fn from_config(config: &Config) -> Self {
        let Some(theme) = config.get_active_theme() else {
            return Self::fallback();
        };
        let c = &theme.colors;
        Self {
            focused_border: Config::parse_color(&c.focused_border),
            unfocused_border: Config::parse_color(&c.unfocused_border),
            selected_bg: Config::parse_color(&c.selected_bg),
            selected_fg: Config::parse_color(&c.selected_fg),
            highlight_new: Config::parse_color(&c.highlight_new),
            highlight_changed: Config::parse_color(&c.highlight_changed),
            help_text: Config::parse_color(&c.help_text),
            success: Config::parse_color(&c.success),
            error: Config::parse_color(&c.error),
            warning: Config::parse_color(&c.warning),
            info: Config::parse_color(&c.info),
        }
    }

    fn fallback() -> Self {
        Self {
            focused_border: Color::Cyan,
            unfocused_border: Color::Gray,
            selected_bg: Color::Blue,
            selected_fg: Color::White,
            highlight_new: Color::Green,
            highlight_changed: Color::Yellow,
            help_text: Color::Yellow,
            success: Color::Green,
            error: Color::Red,
            warning: Color::Yellow,
            info: Color::Cyan,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_resolves_from_default_config() {
        let config = Config::default();
        let theme = Theme::from_config(&config);
        assert_eq!(theme.highlight_new, Color::Green);
        assert_eq!(theme.highlight_changed, Color::Yellow);
    }
}
