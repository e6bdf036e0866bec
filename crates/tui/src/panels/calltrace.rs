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

//! Call trace panel showing the live call/return log
//!
//! A viewer over [`CallTraceModel`]: nested rendering with depth
//! guides, a toggle that starts or stops tracing on the debuggee, and
//! plain-text export.

use super::{EventResponse, PanelTr, PanelType};
use crate::config::Config;
use crate::data::calltrace::CallTraceEntry;
use crate::data::DataManager;
use crate::ui::borders::BorderPresets;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use eyre::Result;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
    Frame,
};
use tracing::{debug, warn};

/// Call trace panel state
#[derive(Debug)]
pub struct CallTracePanel {
    /// Whether this panel is focused
    focused: bool,
    /// Selected log entry
    selected_index: usize,
    /// Scroll offset
    scroll_offset: usize,
    /// Content height of the last render
    viewport_height: usize,
    /// Pin the view to the newest entry as the log grows
    follow: bool,
    /// Show nesting depth guides
    show_depth_indicators: bool,
    /// Cap on displayed entries; older ones scroll out of the view
    max_entries: usize,
    /// Transient export result shown in the title
    export_notice: Option<String>,
}

impl CallTracePanel {
    /// Create a new call trace panel
    pub fn new(config: &Config) -> Self {
        Self {
            focused: false,
            selected_index: 0,
            scroll_offset: 0,
            viewport_height: 0,
            follow: true,
            show_depth_indicators: config.panels.calltrace.show_depth_indicators,
            max_entries: config.panels.calltrace.max_entries,
            export_notice: None,
        }
    }

    fn clamp(&mut self, entry_count: usize) {
        if entry_count == 0 {
            self.selected_index = 0;
            self.scroll_offset = 0;
            return;
        }
        if self.follow {
            self.selected_index = entry_count - 1;
        }
        self.selected_index = self.selected_index.min(entry_count - 1);
        if self.selected_index < self.scroll_offset {
            self.scroll_offset = self.selected_index;
        }
        let viewport = self.viewport_height.max(1);
        if self.selected_index >= self.scroll_offset + viewport {
            self.scroll_offset = (self.selected_index + 1).saturating_sub(viewport);
        }
    }

    fn format_entry(&self, entry: &CallTraceEntry, theme: &crate::ui::Theme) -> Line<'static> {
        let mut spans = Vec::new();
        if self.show_depth_indicators {
            spans.push(Span::styled(
                "│ ".repeat(entry.depth),
                Style::default().fg(theme.unfocused_border),
            ));
        }
        let (arrow, color) =
            if entry.returned { ("⇄", theme.success) } else { ("→", theme.info) };
        spans.push(Span::styled(format!("{arrow} "), Style::default().fg(color)));
        spans.push(Span::raw(format!(
            "{} ({}:{})",
            entry.to.function, entry.to.file, entry.to.line
        )));
        spans.push(Span::styled(
            format!("  from {}:{}", entry.from.file, entry.from.line),
            Style::default().fg(theme.help_text),
        ));
        Line::from(spans)
    }

    /// Export the log as plain text, reporting failure in the title.
    fn export(&mut self, dm: &DataManager) {
        let name = format!("dbi-trace-{}.txt", chrono::Local::now().format("%Y%m%d-%H%M%S"));
        match std::fs::write(&name, dm.calltrace.to_text()) {
            Ok(()) => {
                debug!(file = %name, "call trace exported");
                self.export_notice = Some(format!("saved {name}"));
            }
            Err(err) => {
                warn!(%err, file = %name, "call trace export failed");
                self.export_notice = Some(format!("export failed: {err}"));
            }
        }
    }
}

impl PanelTr for CallTracePanel {
    fn panel_type(&self) -> PanelType {
        PanelType::CallTrace
    }

    fn title(&self, dm: &mut DataManager) -> String {
        let state = if dm.calltrace.is_enabled() { "on" } else { "off" };
        let entries = dm.calltrace.entries().len();
        match &self.export_notice {
            Some(notice) => format!("Call Trace [{state}] ({entries} calls, {notice})"),
            None => format!("Call Trace [{state}] ({entries} calls)"),
        }
    }

    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, dm: &mut DataManager) {
        let theme = dm.theme;
        self.viewport_height = if self.focused && area.height > 10 {
            area.height.saturating_sub(3)
        } else {
            area.height.saturating_sub(2)
        } as usize;
        let title = self.title(dm);

        let entries = dm.calltrace.entries();
        // Window to the newest entries when the log outgrows the cap.
        let skip_old = entries.len().saturating_sub(self.max_entries);
        let entries = &entries[skip_old..];

        if entries.is_empty() {
            let text = if dm.calltrace.is_enabled() {
                "Tracing, no calls yet"
            } else {
                "Tracing disabled (press t to enable)"
            };
            let paragraph = Paragraph::new(text).block(BorderPresets::calltrace(
                self.focused,
                title,
                theme.focused_border,
                theme.unfocused_border,
            ));
            frame.render_widget(paragraph, area);
            return;
        }

        self.clamp(entries.len());

        let items: Vec<ListItem<'_>> = entries
            .iter()
            .enumerate()
            .skip(self.scroll_offset)
            .take(self.viewport_height)
            .map(|(idx, entry)| {
                let line = self.format_entry(entry, &theme);
                let style = if idx == self.selected_index && self.focused {
                    Style::default().bg(theme.selected_bg).fg(theme.selected_fg)
                } else {
                    Style::default()
                };
                ListItem::new(line).style(style)
            })
            .collect();

        let list = List::new(items).block(BorderPresets::calltrace(
            self.focused,
            title,
            theme.focused_border,
            theme.unfocused_border,
        ));
        frame.render_widget(list, area);

        if self.focused && area.height > 10 {
            let help_area = Rect {
                x: area.x + 1,
                y: area.y + area.height - 2,
                width: area.width.saturating_sub(2),
                height: 1,
            };
            let help = "↑/↓: Navigate | t: Toggle tracing | c: Clear | e: Export | f: Follow";
            frame.render_widget(
                Paragraph::new(help).style(Style::default().fg(theme.help_text)),
                help_area,
            );
        }
    }

    fn handle_key_event(
        &mut self,
        event: KeyEvent,
        dm: &mut DataManager,
    ) -> Result<EventResponse> {
        if !self.focused || event.kind != KeyEventKind::Press {
            return Ok(EventResponse::NotHandled);
        }

        let entry_count = dm.calltrace.entries().len();
        match event.code {
            KeyCode::Up => {
                self.follow = false;
                self.selected_index = self.selected_index.saturating_sub(1);
                self.clamp(entry_count);
                Ok(EventResponse::Handled)
            }
            KeyCode::Down => {
                self.selected_index = (self.selected_index + 1).min(entry_count.saturating_sub(1));
                self.clamp(entry_count);
                Ok(EventResponse::Handled)
            }
            KeyCode::Char('t') | KeyCode::Char('T') => {
                let enable = !dm.calltrace.is_enabled();
                debug!(enable, "call trace toggled");
                dm.calltrace.set_enabled(enable);
                Ok(EventResponse::Handled)
            }
            KeyCode::Char('c') | KeyCode::Char('C') => {
                dm.calltrace.clear();
                self.selected_index = 0;
                self.scroll_offset = 0;
                Ok(EventResponse::Handled)
            }
            KeyCode::Char('e') | KeyCode::Char('E') => {
                self.export(dm);
                Ok(EventResponse::Handled)
            }
            KeyCode::Char('f') | KeyCode::Char('F') => {
                self.follow = !self.follow;
                Ok(EventResponse::Handled)
            }
            _ => Ok(EventResponse::NotHandled),
        }
    }

    fn on_focus(&mut self) {
        self.focused = true;
        debug!("Call trace panel gained focus");
    }

    fn on_blur(&mut self) {
        self.focused = false;
        self.export_notice = None;
        debug!("Call trace panel lost focus");
    }
}
