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

//! Thread list panel with active-thread switching
//!
//! Shows every thread of the selected backend; picking one asks the
//! session layer to make it active, after which fresh stack and
//! variable data arrive as ordinary events.

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
use tracing::debug;

/// Thread list panel state
#[derive(Debug, Default)]
pub struct ThreadsPanel {
    /// Whether this panel is focused
    focused: bool,
    /// Highlighted thread row
    cursor: usize,
    /// Scroll offset
    scroll_offset: usize,
    /// Content height of the last render
    viewport_height: usize,
}

impl ThreadsPanel {
    /// Create a new threads panel
    pub fn new() -> Self {
        Self::default()
    }

    fn clamp_cursor(&mut self, thread_count: usize) {
        if thread_count == 0 {
            self.cursor = 0;
            self.scroll_offset = 0;
            return;
        }
        self.cursor = self.cursor.min(thread_count - 1);
        if self.cursor < self.scroll_offset {
            self.scroll_offset = self.cursor;
        }
        let viewport = self.viewport_height.max(1);
        if self.cursor >= self.scroll_offset + viewport {
            self.scroll_offset = (self.cursor + 1).saturating_sub(viewport);
        }
    }
}

impl PanelTr for ThreadsPanel {
    fn panel_type(&self) -> PanelType {
        PanelType::Threads
    }

    fn title(&self, dm: &mut DataManager) -> String {
        format!("Threads ({})", dm.stack.threads().len())
    }

    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, dm: &mut DataManager) {
        let theme = dm.theme;
        self.viewport_height = area.height.saturating_sub(2) as usize;
        let title = self.title(dm);

        let threads = dm.stack.threads();
        if threads.is_empty() {
            let paragraph = Paragraph::new("No threads reported").block(BorderPresets::threads(
                self.focused,
                title,
                theme.focused_border,
                theme.unfocused_border,
            ));
            frame.render_widget(paragraph, area);
            return;
        }

        self.clamp_cursor(threads.len());
        let current = dm.stack.current_thread();

        let items: Vec<ListItem<'_>> = threads
            .iter()
            .enumerate()
            .skip(self.scroll_offset)
            .take(self.viewport_height)
            .map(|(idx, thread)| {
                let active = current == Some(thread.id);
                let marker = if active { "► " } else { "  " };
                let status_color = if thread.exception {
                    theme.error
                } else if thread.broken {
                    theme.warning
                } else {
                    theme.success
                };
                let mut spans = vec![
                    Span::styled(marker, Style::default().fg(theme.success)),
                    Span::styled(
                        format!("{} ", thread.status_marker()),
                        Style::default().fg(status_color),
                    ),
                    Span::raw(format!("{} (#{})", thread.name, thread.id)),
                ];
                if thread.exception {
                    spans.push(Span::styled(
                        "  [exception]".to_string(),
                        Style::default().fg(theme.error),
                    ));
                }
                let style = if idx == self.cursor && self.focused {
                    Style::default().bg(theme.selected_bg).fg(theme.selected_fg)
                } else if active {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(spans)).style(style)
            })
            .collect();

        let list = List::new(items).block(BorderPresets::threads(
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

        let thread_count = dm.stack.threads().len();
        match event.code {
            KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
                self.clamp_cursor(thread_count);
                Ok(EventResponse::Handled)
            }
            KeyCode::Down => {
                self.cursor = (self.cursor + 1).min(thread_count.saturating_sub(1));
                self.clamp_cursor(thread_count);
                Ok(EventResponse::Handled)
            }
            KeyCode::Enter => {
                if let Some(thread) = dm.stack.threads().get(self.cursor) {
                    let thread_id = thread.id;
                    debug!(thread_id, "switching active thread");
                    dm.set_active_thread(thread_id);
                }
                Ok(EventResponse::ChangeFocus(PanelType::Stack))
            }
            _ => Ok(EventResponse::NotHandled),
        }
    }

    fn on_focus(&mut self) {
        self.focused = true;
        debug!("Threads panel gained focus");
    }

    fn on_blur(&mut self) {
        self.focused = false;
        debug!("Threads panel lost focus");
    }
}
