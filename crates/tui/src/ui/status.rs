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

//! Status indicators for the bottom status line.

use ratatui::style::Color;

/// Backend session status shown in the status bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
    /// A backend is connected and selected
    Connected,
    /// No backend has connected yet
    Waiting,
    /// The selected backend disconnected
    Disconnected,
    /// The debuggee process exited
    Exited,
}

impl BackendStatus {
    /// Get the appropriate icon for this status
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Connected => "●",
            Self::Waiting => "◌",
            Self::Disconnected => "○",
            Self::Exited => "◼",
        }
    }

    /// Get the appropriate color for this status
    pub fn color(&self) -> Color {
        match self {
            Self::Connected => Color::Green,
            Self::Waiting => Color::Yellow,
            Self::Disconnected => Color::Red,
            Self::Exited => Color::Gray,
        }
    }

    /// Get a descriptive text for this status
    pub fn text(&self) -> &'static str {
        match self {
            Self::Connected => "Connected",
            Self::Waiting => "Waiting",
            Self::Disconnected => "Disconnected",
            Self::Exited => "Exited",
        }
    }

    /// Get formatted status display with icon and text
    pub fn display(&self) -> String {
        format!("{} {}", self.icon(), self.text())
    }
}

/// Status line builder for a panel's inner status row
pub struct StatusBar {
    scope: Option<&'static str>,
    filter: Option<String>,
    messages: Vec<String>,
}

impl StatusBar {
    /// Create a new status bar builder
    pub fn new() -> Self {
        Self { scope: None, filter: None, messages: Vec::new() }
    }

    /// Set the variables scope currently shown
    pub fn scope(mut self, scope: &'static str) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Set the active filter pattern, if any
    pub fn filter(mut self, pattern: Option<String>) -> Self {
        self.filter = pattern.filter(|p| !p.is_empty());
        self
    }

    /// Add a status message
    pub fn message<S: Into<String>>(mut self, msg: S) -> Self {
        self.messages.push(msg.into());
        self
    }

    /// Build the complete status line
    pub fn build(&self) -> String {
        let mut parts = Vec::new();

        if let Some(scope) = self.scope {
            parts.push(format!("Scope: {scope}"));
        }

        if let Some(filter) = &self.filter {
            parts.push(format!("Filter: {filter}"));
        }

        parts.extend(self.messages.clone());

        parts.join(" | ")
    }
}

impl Default for StatusBar {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_bar_joins_segments() {
        let line = StatusBar::new()
            .scope("locals")
            .filter(Some("user_*".to_string()))
            .message("3/17")
            .build();
        assert_eq!(line, "Scope: locals | Filter: user_* | 3/17");
    }

    #[test]
    fn backend_status_display_pairs_icon_and_text() {
        assert_eq!(BackendStatus::Connected.display(), "● Connected");
        assert_eq!(BackendStatus::Disconnected.display(), "○ Disconnected");
    }

    #[test]
    fn empty_filter_is_omitted() {
        let line = StatusBar::new().filter(Some(String::new())).scope("globals").build();
        assert_eq!(line, "Scope: globals");
    }
}
