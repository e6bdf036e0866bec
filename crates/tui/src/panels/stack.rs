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

//! Call stack panel with frame selection
//!
//! Shows the frames of the selected backend, innermost first. Picking
//! a frame reloads the locals tree at that frame.

use super::{EventResponse, PanelTr, PanelType};
use crate::data::DataManager;
use crate::ui::borders::BorderPresets;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use eyre::Result;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
    Frame,
};
use tracing::{debug, warn};

/// Call stack panel state
#[derive(Debug)]
pub struct StackPanel {
    /// Whether this panel is focused
    focused: bool,
    /// Highlighted frame (not necessarily the selected one)
    cursor: usize,
    /// Scroll offset
    scroll_offset: usize,
    /// Content height of the last render
    viewport_height: usize,
    /// Transient export result shown in the title
    export_notice: Option<String>,
}

impl StackPanel {
    /// Create a new stack panel
    pub fn new() -> Self {
        Self {
            focused: false,
            cursor: 0,
            scroll_offset: 0,
            viewport_height: 0,
            export_notice: None,
        }
    }

    fn clamp_cursor(&mut self, frame_count: usize) {
        if frame_count == 0 {
            self.cursor = 0;
            self.scroll_offset = 0;
            return;
        }
        self.cursor = self.cursor.min(frame_count - 1);
        if self.cursor < self.scroll_offset {
            self.scroll_offset = self.cursor;
        }
        let viewport = self.viewport_height.max(1);
        if self.cursor >= self.scroll_offset + viewport {
            self.scroll_offset = (self.cursor + 1).saturating_sub(viewport);
        }
    }

    /// Write the stack as plain text next to the working directory.
    /// Failures are reported in the panel title, not just the log.
    fn export(&mut self, dm: &DataManager) {
        let name = format!("dbi-stack-{}.txt", chrono::Local::now().format("%Y%m%d-%H%M%S"));
        match std::fs::write(&name, dm.stack.to_text()) {
            Ok(()) => {
                debug!(file = %name, "stack exported");
                self.export_notice = Some(format!("saved {name}"));
            }
            Err(err) => {
                warn!(%err, file = %name, "stack export failed");
                self.export_notice = Some(format!("export failed: {err}"));
            }
        }
    }
}

impl Default for StackPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelTr for StackPanel {
    fn panel_type(&self) -> PanelType {
        PanelType::Stack
    }

    fn title(&self, dm: &mut DataManager) -> String {
        let frames = dm.stack.snapshot().len();
        match &self.export_notice {
            Some(notice) => format!("Stack ({frames} frames, {notice})"),
            None => format!("Stack ({frames} frames)"),
        }
    }

    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, dm: &mut DataManager) {
        let theme = dm.theme;
        self.viewport_height = area.height.saturating_sub(2) as usize;
        let title = self.title(dm);

        let snapshot = dm.stack.snapshot();
        if snapshot.is_empty() {
            let paragraph = Paragraph::new("No stack (debuggee running?)").block(
                BorderPresets::stack(
                    self.focused,
                    title,
                    theme.focused_border,
                    theme.unfocused_border,
                ),
            );
            frame.render_widget(paragraph, area);
            return;
        }

        self.clamp_cursor(snapshot.len());
        let selected = dm.stack.selected_frame();

        let items: Vec<ListItem<'_>> = snapshot
            .iter()
            .enumerate()
            .skip(self.scroll_offset)
            .take(self.viewport_height)
            .map(|(idx, stack_frame)| {
                let marker = if idx == selected { "► " } else { "  " };
                let line = Line::from(vec![
                    Span::styled(marker, Style::default().fg(theme.success)),
                    Span::styled(format!("#{idx} "), Style::default().fg(theme.help_text)),
                    Span::raw(stack_frame.display()),
                ]);
                let style = if idx == self.cursor && self.focused {
                    Style::default().bg(theme.selected_bg).fg(theme.selected_fg)
                } else if idx == selected {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(line).style(style)
            })
            .collect();

        let list = List::new(items).block(BorderPresets::stack(
            self.focused,
            title,
            theme.focused_border,
            theme.unfocused_border,
        ));
        frame.render_widget(list, area);
    }

    fn handle_key_event(
        &mut self,
        event: KeyEvent,
        dm: &mut DataManager,
    ) -> Result<EventResponse> {
        if !self.focused || event.kind != KeyEventKind::Press {
            return Ok(EventResponse::NotHandled);
        }

        let frame_count = dm.stack.snapshot().len();
        match event.code {
            KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
                self.clamp_cursor(frame_count);
                Ok(EventResponse::Handled)
            }
            KeyCode::Down => {
                self.cursor = (self.cursor + 1).min(frame_count.saturating_sub(1));
                self.clamp_cursor(frame_count);
                Ok(EventResponse::Handled)
            }
            KeyCode::Enter => {
                debug!(frame = self.cursor, "frame selected");
                dm.change_frame(self.cursor);
                Ok(EventResponse::ChangeFocus(PanelType::Variables))
            }
            KeyCode::Char('e') | KeyCode::Char('E') => {
                self.export(dm);
                Ok(EventResponse::Handled)
            }
            _ => Ok(EventResponse::NotHandled),
        }
    }

    fn on_focus(&mut self) {
        self.focused = true;
        debug!("Stack panel gained focus");
    }

    fn on_blur(&mut self) {
        self.focused = false;
        self.export_notice = None;
        debug!("Stack panel lost focus");
    }
}
