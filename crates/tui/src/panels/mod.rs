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

//! Panel framework and implementations
//!
//! This module contains the panel trait and all panel implementations.

use crossterm::event::KeyEvent;
use eyre::Result;
use ratatui::{layout::Rect, Frame};
use std::fmt::Debug;

use crate::data::DataManager;

/// Panel types for identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelType {
    /// Variables panel showing the lazily synced scope trees
    Variables,
    /// Call stack panel with frame selection
    Stack,
    /// Call trace panel showing the live call/return log
    CallTrace,
    /// Thread list panel with active-thread switching
    Threads,
}

/// Response from panel event handling
#[derive(Debug)]
pub enum EventResponse {
    /// Event was handled, no further action needed
    Handled,
    /// Event was not handled, pass to next handler
    NotHandled,
    /// Request focus change to another panel
    ChangeFocus(PanelType),
    /// Request application exit
    Exit,
}

/// Trait for UI panels
pub trait PanelTr: Debug {
    /// Get the panel type
    fn panel_type(&self) -> PanelType;

    /// Get panel title for display
    fn title(&self, dm: &mut DataManager) -> String;

    /// Render the panel content
    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, dm: &mut DataManager);

    /// Handle keyboard events
    fn handle_key_event(&mut self, event: KeyEvent, dm: &mut DataManager)
        -> Result<EventResponse>;

    /// Periodic tick; panels use it to pace their data fetching
    fn on_tick(&mut self, dm: &mut DataManager) {
        let _ = dm;
    }

    /// Called when this panel gains focus
    fn on_focus(&mut self) {}

    /// Called when this panel loses focus
    fn on_blur(&mut self) {}
}

pub mod calltrace;
pub mod stack;
pub mod threads;
pub mod variables;

pub use calltrace::CallTracePanel;
pub use stack::StackPanel;
pub use threads::ThreadsPanel;
pub use variables::VariablesPanel;

/// Static dispatch over the panel implementations
#[derive(Debug)]
pub enum Panel {
    /// Variables panel
    Variables(VariablesPanel),
    /// Call stack panel
    Stack(StackPanel),
    /// Call trace panel
    CallTrace(CallTracePanel),
    /// Thread list panel
    Threads(ThreadsPanel),
}

impl Panel {
    /// Get the panel type
    pub fn panel_type(&self) -> PanelType {
        match self {
            Self::Variables(p) => p.panel_type(),
            Self::Stack(p) => p.panel_type(),
            Self::CallTrace(p) => p.panel_type(),
            Self::Threads(p) => p.panel_type(),
        }
    }

    /// Render the panel content
    pub fn render(&mut self, frame: &mut Frame<'_>, area: Rect, dm: &mut DataManager) {
        match self {
            Self::Variables(p) => p.render(frame, area, dm),
            Self::Stack(p) => p.render(frame, area, dm),
            Self::CallTrace(p) => p.render(frame, area, dm),
            Self::Threads(p) => p.render(frame, area, dm),
        }
    }

    /// Handle keyboard events
    pub fn handle_key_event(
        &mut self,
        event: KeyEvent,
        dm: &mut DataManager,
    ) -> Result<EventResponse> {
        match self {
            Self::Variables(p) => p.handle_key_event(event, dm),
            Self::Stack(p) => p.handle_key_event(event, dm),
            Self::CallTrace(p) => p.handle_key_event(event, dm),
            Self::Threads(p) => p.handle_key_event(event, dm),
        }
    }

    /// Periodic tick forwarded to the implementation
    pub fn on_tick(&mut self, dm: &mut DataManager) {
        match self {
            Self::Variables(p) => p.on_tick(dm),
            Self::Stack(p) => p.on_tick(dm),
            Self::CallTrace(p) => p.on_tick(dm),
            Self::Threads(p) => p.on_tick(dm),
        }
    }

    /// Called when this panel gains focus
    pub fn on_focus(&mut self) {
        match self {
            Self::Variables(p) => p.on_focus(),
            Self::Stack(p) => p.on_focus(),
            Self::CallTrace(p) => p.on_focus(),
            Self::Threads(p) => p.on_focus(),
        }
    }

    /// Called when this panel loses focus
    pub fn on_blur(&mut self) {
        match self {
            Self::Variables(p) => p.on_blur(),
            Self::Stack(p) => p.on_blur(),
            Self::CallTrace(p) => p.on_blur(),
            Self::Threads(p) => p.on_blur(),
        }
    }
}
