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

//! Terminal-width driven layout selection.
//!
//! The viewer set is fixed; what varies with the terminal is how many
//! panels fit side by side. Width alone decides: four variable rows
//! plus a stack frame do not fit under 120 columns, and under 80 even
//! two panels are unreadable.

/// Narrowest terminal that fits the four-panel quad.
const QUAD_MIN_COLS: u16 = 120;
/// Narrowest terminal that fits two stacked panels.
const STACKED_MIN_COLS: u16 = 80;

/// Panel arrangement in effect for the current terminal size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutType {
    /// All four viewers at once, in a quad.
    Full,
    /// Variables pinned on top, one other viewer below.
    Compact,
    /// A single viewer, switched with the F-keys.
    Mobile,
}

/// Maps the reported terminal size to a panel arrangement.
#[derive(Debug)]
pub struct LayoutManager {
    current_layout: LayoutType,
}

impl LayoutManager {
    /// Start in the quad layout; the first render corrects it.
    pub fn new() -> Self {
        Self { current_layout: LayoutType::Full }
    }

    /// Record a resize and recompute the layout. Height plays no role
    /// yet; panels clamp their own insets when rows run out.
    pub fn update_size(&mut self, cols: u16, _rows: u16) {
        self.current_layout = if cols >= QUAD_MIN_COLS {
            LayoutType::Full
        } else if cols >= STACKED_MIN_COLS {
            LayoutType::Compact
        } else {
            LayoutType::Mobile
        };
    }

    /// Layout in effect for the last recorded size.
    pub fn layout_type(&self) -> LayoutType {
        self.current_layout
    }
}

impl Default for LayoutManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_follows_width_thresholds() {
        let mut manager = LayoutManager::new();

        manager.update_size(200, 50);
        assert_eq!(manager.layout_type(), LayoutType::Full);

        manager.update_size(100, 30);
        assert_eq!(manager.layout_type(), LayoutType::Compact);

        manager.update_size(40, 20);
        assert_eq!(manager.layout_type(), LayoutType::Mobile);
    }

    #[test]
    fn threshold_edges_are_inclusive() {
        let mut manager = LayoutManager::new();

        manager.update_size(120, 30);
        assert_eq!(manager.layout_type(), LayoutType::Full);
        manager.update_size(119, 30);
        assert_eq!(manager.layout_type(), LayoutType::Compact);

        manager.update_size(80, 30);
        assert_eq!(manager.layout_type(), LayoutType::Compact);
        manager.update_size(79, 30);
        assert_eq!(manager.layout_type(), LayoutType::Mobile);
    }

    #[test]
    fn height_does_not_affect_the_choice() {
        let mut manager = LayoutManager::new();
        manager.update_size(120, 5);
        assert_eq!(manager.layout_type(), LayoutType::Full);
    }
}
