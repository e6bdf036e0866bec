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

//! Main application state and logic
//!
//! This module contains the core application state management and event handling.

use crate::config::Config;
use crate::data::DataManager;
use crate::layout::{LayoutManager, LayoutType};
use crate::panels::{
    CallTracePanel, EventResponse, Panel, PanelType, StackPanel, ThreadsPanel, VariablesPanel,
};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use eyre::Result;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use std::collections::HashMap;
use tracing::debug;

/// Direction for panel boundary resize
#[derive(Debug, Clone, Copy)]
pub enum ResizeDirection {
    Left,
    Right,
    Up,
    Down,
}

/// Main application state
pub struct App {
    /// Layout manager for responsive design
    layout_manager: LayoutManager,
    /// Current focused panel
    current_panel: PanelType,
    /// All panels
    panels: HashMap<PanelType, Panel>,
    /// Whether the application should exit
    should_exit: bool,
    /// Main panel type for compact layout (cycles through the viewers)
    compact_main_panel: PanelType,
    /// Panel resize ratios
    vertical_split: u16, // Left panel width % (default: 50)
    horizontal_split: u16, // Top panels height % (default: 60)
}

impl App {
    /// Create a new application instance
    pub fn new(config: &Config) -> Self {
        let mut panels: HashMap<PanelType, Panel> = HashMap::new();
        panels.insert(PanelType::Variables, Panel::Variables(VariablesPanel::new(config)));
        panels.insert(PanelType::Stack, Panel::Stack(StackPanel::new()));
        panels.insert(PanelType::CallTrace, Panel::CallTrace(CallTracePanel::new(config)));
        panels.insert(PanelType::Threads, Panel::Threads(ThreadsPanel::new()));

        Self {
            layout_manager: LayoutManager::new(),
            current_panel: PanelType::Variables,
            panels,
            should_exit: false,
            compact_main_panel: PanelType::Stack,
            vertical_split: 50,
            horizontal_split: 60,
        }
    }

    /// Render the application
    pub fn render(&mut self, frame: &mut Frame<'_>, dm: &mut DataManager) -> Result<()> {
        let area = frame.area();
        self.layout_manager.update_size(area.width, area.height);

        match self.layout_manager.layout_type() {
            LayoutType::Full => self.render_full_layout(frame, area, dm)?,
            LayoutType::Compact => self.render_compact_layout(frame, area, dm)?,
            LayoutType::Mobile => self.render_mobile_layout(frame, area, dm)?,
        }

        Ok(())
    }

    /// Periodic update: let every panel pace its data fetching.
    pub fn update(&mut self, dm: &mut DataManager) {
        for panel in self.panels.values_mut() {
            panel.on_tick(dm);
        }
    }

    /// Render the full 4-panel layout
    fn render_full_layout(
        &mut self,
        frame: &mut Frame<'_>,
        area: Rect,
        dm: &mut DataManager,
    ) -> Result<()> {
        let layout_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Fill(1)])
            .split(area);

        self.render_status_bar(frame, layout_chunks[0], dm);

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(self.horizontal_split),
                Constraint::Percentage(100 - self.horizontal_split),
            ])
            .split(layout_chunks[1]);

        let top_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(self.vertical_split),
                Constraint::Percentage(100 - self.vertical_split),
            ])
            .split(main_chunks[0]);

        let bottom_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(self.vertical_split),
                Constraint::Percentage(100 - self.vertical_split),
            ])
            .split(main_chunks[1]);

        self.update_panel_focus();

        if let Some(panel) = self.panels.get_mut(&PanelType::Variables) {
            panel.render(frame, top_chunks[0], dm);
        }
        if let Some(panel) = self.panels.get_mut(&PanelType::Stack) {
            panel.render(frame, top_chunks[1], dm);
        }
        if let Some(panel) = self.panels.get_mut(&PanelType::CallTrace) {
            panel.render(frame, bottom_chunks[0], dm);
        }
        if let Some(panel) = self.panels.get_mut(&PanelType::Threads) {
            panel.render(frame, bottom_chunks[1], dm);
        }

        Ok(())
    }

    /// Render the compact 2-panel stacked layout: variables pinned on
    /// top, the other viewers cycling below.
    fn render_compact_layout(
        &mut self,
        frame: &mut Frame<'_>,
        area: Rect,
        dm: &mut DataManager,
    ) -> Result<()> {
        let layout_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Fill(1)])
            .split(area);

        self.render_status_bar(frame, layout_chunks[0], dm);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(self.horizontal_split),
                Constraint::Percentage(100 - self.horizontal_split),
            ])
            .split(layout_chunks[1]);

        self.update_panel_focus();

        if let Some(panel) = self.panels.get_mut(&PanelType::Variables) {
            panel.render(frame, chunks[0], dm);
        }
        if let Some(panel) = self.panels.get_mut(&self.compact_main_panel) {
            panel.render(frame, chunks[1], dm);
        }

        Ok(())
    }

    /// Render the mobile single-panel layout
    fn render_mobile_layout(
        &mut self,
        frame: &mut Frame<'_>,
        area: Rect,
        dm: &mut DataManager,
    ) -> Result<()> {
        let layout_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Fill(1)])
            .split(area);

        self.render_status_bar(frame, layout_chunks[0], dm);
        self.update_panel_focus();

        if let Some(panel) = self.panels.get_mut(&self.current_panel) {
            panel.render(frame, layout_chunks[1], dm);
        }

        Ok(())
    }

    /// Render the status bar at the top of the screen
    fn render_status_bar(&mut self, frame: &mut Frame<'_>, area: Rect, dm: &mut DataManager) {
        let backend_status = dm.backend_status();
        let backend_label = dm.selected_backend().cloned().unwrap_or_default();
        let connected = dm.connected_backends().count();

        let panel_name = format!("{:?}", self.current_panel);
        let layout_type = match self.layout_manager.layout_type() {
            LayoutType::Full => "Full",
            LayoutType::Compact => "Compact",
            LayoutType::Mobile => "Mobile",
        };

        let mut status_spans = vec![Span::styled(
            if backend_label.is_empty() {
                backend_status.display()
            } else {
                format!("{} {}", backend_status.display(), backend_label)
            },
            Style::default().fg(backend_status.color()),
        )];

        if connected > 1 {
            status_spans.push(Span::raw(" | "));
            status_spans.push(Span::styled(
                format!("{connected} backends (b: cycle)"),
                Style::default().fg(Color::Cyan),
            ));
        }

        status_spans.extend_from_slice(&[
            Span::raw(" | "),
            Span::styled(
                format!("Trace: {}", if dm.calltrace.is_enabled() { "on" } else { "off" }),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw(" | "),
            Span::styled(format!("Panel: {panel_name}"), Style::default().fg(Color::White)),
            Span::raw(" | "),
            Span::styled(format!("Layout: {layout_type}"), Style::default().fg(Color::Gray)),
        ]);

        if let Some(exit) = dm.last_exit() {
            status_spans.push(Span::raw(" | "));
            status_spans.push(Span::styled(exit.to_string(), Style::default().fg(Color::Red)));
        }

        let status_paragraph =
            Paragraph::new(Line::from(status_spans)).style(Style::default().bg(Color::DarkGray));
        frame.render_widget(status_paragraph, area);
    }

    /// Update panel focus states
    fn update_panel_focus(&mut self) {
        for (panel_type, panel) in &mut self.panels {
            if *panel_type == self.current_panel {
                panel.on_focus();
            } else {
                panel.on_blur();
            }
        }
    }

    /// Handle keyboard events
    pub fn handle_key_event(&mut self, key: KeyEvent, dm: &mut DataManager) -> Result<EventResponse> {
        if key.kind != KeyEventKind::Press {
            return Ok(EventResponse::NotHandled);
        }

        debug!("Key pressed: {:?}", key);

        // Global keys first
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q')
                if key.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                self.should_exit = true;
                return Ok(EventResponse::Exit);
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_exit = true;
                return Ok(EventResponse::Exit);
            }
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Ok(EventResponse::Exit);
            }
            KeyCode::Tab => {
                self.cycle_panels(false);
                return Ok(EventResponse::Handled);
            }
            KeyCode::BackTab | KeyCode::Char('`') | KeyCode::Char('~') => {
                self.cycle_panels(true);
                return Ok(EventResponse::Handled);
            }

            // Function keys jump straight to a panel
            KeyCode::F(1) => {
                self.focus_panel(PanelType::Variables);
                return Ok(EventResponse::Handled);
            }
            KeyCode::F(2) => {
                self.focus_panel(PanelType::Stack);
                return Ok(EventResponse::Handled);
            }
            KeyCode::F(3) => {
                self.focus_panel(PanelType::CallTrace);
                return Ok(EventResponse::Handled);
            }
            KeyCode::F(4) => {
                self.focus_panel(PanelType::Threads);
                return Ok(EventResponse::Handled);
            }

            // Panel boundary resize with Ctrl+Shift+arrow keys
            KeyCode::Left
                if key.modifiers.contains(KeyModifiers::CONTROL | KeyModifiers::SHIFT) =>
            {
                if self.layout_manager.layout_type() == LayoutType::Full {
                    self.handle_boundary_resize(ResizeDirection::Left);
                }
                return Ok(EventResponse::Handled);
            }
            KeyCode::Right
                if key.modifiers.contains(KeyModifiers::CONTROL | KeyModifiers::SHIFT) =>
            {
                if self.layout_manager.layout_type() == LayoutType::Full {
                    self.handle_boundary_resize(ResizeDirection::Right);
                }
                return Ok(EventResponse::Handled);
            }
            KeyCode::Up if key.modifiers.contains(KeyModifiers::CONTROL | KeyModifiers::SHIFT) => {
                if self.layout_manager.layout_type() != LayoutType::Mobile {
                    self.handle_boundary_resize(ResizeDirection::Up);
                }
                return Ok(EventResponse::Handled);
            }
            KeyCode::Down
                if key.modifiers.contains(KeyModifiers::CONTROL | KeyModifiers::SHIFT) =>
            {
                if self.layout_manager.layout_type() != LayoutType::Mobile {
                    self.handle_boundary_resize(ResizeDirection::Down);
                }
                return Ok(EventResponse::Handled);
            }

            _ => {}
        }

        // Forward to the focused panel
        let response = match self.panels.get_mut(&self.current_panel) {
            Some(panel) => panel.handle_key_event(key, dm)?,
            None => EventResponse::NotHandled,
        };

        match response {
            EventResponse::ChangeFocus(target) => {
                self.focus_panel(target);
                Ok(EventResponse::Handled)
            }
            EventResponse::Exit => {
                self.should_exit = true;
                Ok(EventResponse::Exit)
            }
            EventResponse::NotHandled => {
                // Residual global keys the panels leave alone
                match key.code {
                    KeyCode::Char('b') | KeyCode::Char('B') => {
                        dm.select_next_backend();
                        Ok(EventResponse::Handled)
                    }
                    _ => Ok(EventResponse::NotHandled),
                }
            }
            handled => Ok(handled),
        }
    }

    /// Focus a panel, also making it the compact-layout main panel
    /// when it can appear there.
    fn focus_panel(&mut self, panel: PanelType) {
        if panel != PanelType::Variables {
            self.compact_main_panel = panel;
        }
        self.current_panel = panel;
        debug!("Switched to panel: {:?}", self.current_panel);
    }

    /// Cycle through panels (Tab key)
    fn cycle_panels(&mut self, reversed: bool) {
        let next = if !reversed {
            match self.current_panel {
                PanelType::Variables => PanelType::Stack,
                PanelType::Stack => PanelType::CallTrace,
                PanelType::CallTrace => PanelType::Threads,
                PanelType::Threads => PanelType::Variables,
            }
        } else {
            match self.current_panel {
                PanelType::Variables => PanelType::Threads,
                PanelType::Stack => PanelType::Variables,
                PanelType::CallTrace => PanelType::Stack,
                PanelType::Threads => PanelType::CallTrace,
            }
        };
        self.focus_panel(next);
    }

    /// Handle panel boundary resize with Ctrl+Shift+arrow keys
    pub fn handle_boundary_resize(&mut self, direction: ResizeDirection) {
        const STEP: u16 = 5; // 5% increments

        match direction {
            ResizeDirection::Left => {
                self.vertical_split = self.vertical_split.saturating_sub(STEP).max(20);
            }
            ResizeDirection::Right => {
                self.vertical_split = (self.vertical_split + STEP).min(80);
            }
            ResizeDirection::Up => {
                self.horizontal_split = self.horizontal_split.saturating_sub(STEP).max(30);
            }
            ResizeDirection::Down => {
                self.horizontal_split = (self.horizontal_split + STEP).min(80);
            }
        }
        debug!(
            vertical = self.vertical_split,
            horizontal = self.horizontal_split,
            "panel boundaries resized"
        );
    }

    /// Handle terminal resize
    pub fn handle_resize(&mut self, width: u16, height: u16) {
        self.layout_manager.update_size(width, height);
        debug!("Terminal resized to {}x{}", width, height);
    }

    /// Get current panel for external access
    pub fn current_panel(&self) -> PanelType {
        self.current_panel
    }

    /// Check if the app should exit
    pub fn should_exit(&self) -> bool {
        self.should_exit
    }
}
