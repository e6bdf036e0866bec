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

//! Variables panel showing the lazily synced scope trees
//!
//! The panel is a viewer over [`VariablesModel`]: it flattens the
//! current tree into rows, drives expansion and collapse from key
//! input, and paces fetching by reporting its viewport on every tick.

use super::{EventResponse, PanelTr, PanelType};
use crate::data::variables::{SortOrder, VariablesModel, VisibleRow};
use crate::data::DataManager;
use crate::ui::borders::BorderPresets;
use crate::ui::status::StatusBar;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use eyre::Result;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};
use tracing::debug;

use crate::config::Config;

/// Variables panel state
#[derive(Debug)]
pub struct VariablesPanel {
    /// Whether this panel is focused
    focused: bool,
    /// Currently selected display row
    selected_index: usize,
    /// Scroll offset into the flattened rows
    scroll_offset: usize,
    /// Content height of the last render, used by fetch pacing
    viewport_height: usize,
    /// Which scope tree is shown
    show_globals: bool,
    /// Show type tags next to values
    show_types: bool,
    /// Presentation order for the flattened rows
    sort_order: SortOrder,
    /// Whether the full-value overlay is open
    show_details: bool,
    /// Filter entry buffer; `Some` while the user is typing a pattern
    filter_input: Option<String>,
    /// Committed filter pattern, shown in the status line
    filter: String,
}

impl VariablesPanel {
    /// Create a new variables panel
    pub fn new(config: &Config) -> Self {
        Self {
            focused: false,
            selected_index: 0,
            scroll_offset: 0,
            viewport_height: 0,
            show_globals: config.panels.variables.start_with_globals,
            show_types: config.panels.variables.show_types,
            sort_order: SortOrder::default(),
            show_details: false,
            filter_input: None,
            filter: String::new(),
        }
    }

    /// The scope tree currently on display
    fn model<'a>(&self, dm: &'a mut DataManager) -> &'a mut VariablesModel {
        if self.show_globals {
            &mut dm.globals
        } else {
            &mut dm.locals
        }
    }

    fn scope_name(&self) -> &'static str {
        if self.show_globals {
            "globals"
        } else {
            "locals"
        }
    }

    /// Clamp selection and keep it inside the viewport.
    fn clamp_selection(&mut self, row_count: usize) {
        if row_count == 0 {
            self.selected_index = 0;
            self.scroll_offset = 0;
            return;
        }
        self.selected_index = self.selected_index.min(row_count - 1);
        if self.selected_index < self.scroll_offset {
            self.scroll_offset = self.selected_index;
        }
        let viewport = self.viewport_height.max(1);
        if self.selected_index >= self.scroll_offset + viewport {
            self.scroll_offset = (self.selected_index + 1).saturating_sub(viewport);
        }
    }

    fn move_selection(&mut self, delta: isize, row_count: usize) {
        let new = self.selected_index as isize + delta;
        self.selected_index = new.clamp(0, row_count.saturating_sub(1) as isize) as usize;
        self.clamp_selection(row_count);
    }

    /// Format one display row.
    fn format_row(
        &self,
        row: &VisibleRow,
        model: &VariablesModel,
        theme: &crate::ui::Theme,
    ) -> Line<'static> {
        let Some(node) = model.row_node(row) else {
            return Line::from("?");
        };

        let mut spans = Vec::new();

        // Depth guides then the expander
        let mut prefix = "│ ".repeat(row.depth);
        if node.has_children {
            prefix.push_str(if row.expanded { "▼ " } else { "▶ " });
        } else {
            prefix.push_str("  ");
        }
        spans.push(Span::styled(prefix, Style::default().fg(theme.unfocused_border)));

        let name_style = if model.is_new(&row.path) {
            Style::default().fg(theme.highlight_new).add_modifier(Modifier::BOLD)
        } else if model.is_changed(&row.path) {
            Style::default().fg(theme.highlight_changed)
        } else {
            Style::default()
        };
        spans.push(Span::styled(node.label(), name_style));

        if self.show_types && !node.type_tag.is_empty() {
            spans.push(Span::styled(
                format!(" ({})", node.type_tag),
                Style::default().fg(theme.help_text),
            ));
        }

        if !node.value.short.is_empty() {
            spans.push(Span::raw(" = "));
            let value_style = if model.is_changed(&row.path) {
                Style::default().fg(theme.highlight_changed)
            } else {
                Style::default().fg(theme.info)
            };
            spans.push(Span::styled(node.value.short.clone(), value_style));
        }

        Line::from(spans)
    }

    /// Render the full-value overlay for the selected row.
    fn render_details(
        &self,
        frame: &mut Frame<'_>,
        area: Rect,
        model: &VariablesModel,
        rows: &[VisibleRow],
        theme: &crate::ui::Theme,
    ) {
        let Some(row) = rows.get(self.selected_index) else { return };
        let Some(node) = model.row_node(row) else { return };

        let popup = centered_rect(area, 80, 60);
        frame.render_widget(Clear, popup);

        let mut lines = vec![
            Line::from(vec![
                Span::styled("Name: ", Style::default().fg(theme.help_text)),
                Span::raw(node.name.clone()),
            ]),
            Line::from(vec![
                Span::styled("Type: ", Style::default().fg(theme.help_text)),
                Span::raw(node.type_tag.clone()),
            ]),
        ];
        if let Some(count) = node.child_count {
            lines.push(Line::from(vec![
                Span::styled("Items: ", Style::default().fg(theme.help_text)),
                Span::raw(count.to_string()),
            ]));
        }
        lines.push(Line::from(""));
        for text_line in node.value.full.lines() {
            lines.push(Line::from(text_line.to_string()));
        }
        if node.value.elided {
            lines.push(Line::from(Span::styled(
                "(value truncated)",
                Style::default().fg(theme.warning),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
            BorderPresets::variables(
                true,
                format!("Details: {}", node.name),
                theme.focused_border,
                theme.unfocused_border,
            ),
        );
        frame.render_widget(paragraph, popup);
    }

    /// Handle a key while the filter entry is open.
    fn handle_filter_key(&mut self, event: KeyEvent, dm: &mut DataManager) -> EventResponse {
        let Some(buffer) = self.filter_input.as_mut() else {
            return EventResponse::NotHandled;
        };
        match event.code {
            KeyCode::Enter => {
                let pattern = buffer.clone();
                self.filter_input = None;
                debug!(pattern, scope = self.scope_name(), "filter committed");
                self.filter = pattern.clone();
                self.model(dm).change_filter(&pattern);
                self.selected_index = 0;
                self.scroll_offset = 0;
                EventResponse::Handled
            }
            KeyCode::Esc => {
                self.filter_input = None;
                EventResponse::Handled
            }
            KeyCode::Backspace => {
                buffer.pop();
                EventResponse::Handled
            }
            KeyCode::Char(c) => {
                buffer.push(c);
                EventResponse::Handled
            }
            _ => EventResponse::Handled,
        }
    }
}

impl PanelTr for VariablesPanel {
    fn panel_type(&self) -> PanelType {
        PanelType::Variables
    }

    fn title(&self, dm: &mut DataManager) -> String {
        let rows = self.model(dm).visible_rows(self.sort_order).len();
        format!("Variables [{}] ({} rows)", self.scope_name(), rows)
    }

    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, dm: &mut DataManager) {
        let theme = dm.theme;
        self.viewport_height = if self.focused && area.height > 10 {
            area.height.saturating_sub(4)
        } else {
            area.height.saturating_sub(2)
        } as usize;

        let title = self.title(dm);
        let model = if self.show_globals { &dm.globals } else { &dm.locals };
        let rows = model.visible_rows(self.sort_order);
        self.clamp_selection(rows.len());

        if rows.is_empty() {
            let paragraph = Paragraph::new("No variables").block(BorderPresets::variables(
                self.focused,
                title,
                theme.focused_border,
                theme.unfocused_border,
            ));
            frame.render_widget(paragraph, area);
            return;
        }

        let items: Vec<ListItem<'_>> = rows
            .iter()
            .enumerate()
            .skip(self.scroll_offset)
            .take(self.viewport_height)
            .map(|(idx, row)| {
                let line = self.format_row(row, model, &theme);
                let style = if idx == self.selected_index && self.focused {
                    Style::default().bg(theme.selected_bg).fg(theme.selected_fg)
                } else if idx == self.selected_index {
                    Style::default().bg(theme.unfocused_border)
                } else {
                    Style::default()
                };
                ListItem::new(line).style(style)
            })
            .collect();

        let list = List::new(items).block(BorderPresets::variables(
            self.focused,
            title,
            theme.focused_border,
            theme.unfocused_border,
        ));
        frame.render_widget(list, area);

        if self.focused && area.height > 10 {
            let status_area = Rect {
                x: area.x + 1,
                y: area.y + area.height - 3,
                width: area.width.saturating_sub(2),
                height: 1,
            };
            let status = StatusBar::new()
                .scope(self.scope_name())
                .filter(Some(self.filter.clone()))
                .message(format!("{}/{}", self.selected_index + 1, rows.len()))
                .build();
            frame.render_widget(
                Paragraph::new(status).style(Style::default().fg(theme.info)),
                status_area,
            );

            let help_area = Rect {
                x: area.x + 1,
                y: area.y + area.height - 2,
                width: area.width.saturating_sub(2),
                height: 1,
            };
            let help = if self.filter_input.is_some() {
                format!("Filter: {}_ (Enter: apply, Esc: cancel)", self.filter_input.as_deref().unwrap_or(""))
            } else {
                "↑/↓: Navigate | →/Enter: Expand | ←: Collapse | g: Scope | s: Sort | /: Filter | r: Refresh | v: Details".to_string()
            };
            frame.render_widget(
                Paragraph::new(help).style(Style::default().fg(theme.help_text)),
                help_area,
            );
        }

        if self.show_details {
            self.render_details(frame, area, model, &rows, &theme);
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

        if self.filter_input.is_some() {
            return Ok(self.handle_filter_key(event, dm));
        }

        if self.show_details {
            match event.code {
                KeyCode::Esc | KeyCode::Char('v') | KeyCode::Enter => {
                    self.show_details = false;
                    return Ok(EventResponse::Handled);
                }
                _ => return Ok(EventResponse::Handled),
            }
        }

        let order = self.sort_order;
        let rows = self.model(dm).visible_rows(order);
        match event.code {
            KeyCode::Up => {
                self.model(dm).clear_highlights();
                self.move_selection(-1, rows.len());
                Ok(EventResponse::Handled)
            }
            KeyCode::Down => {
                self.model(dm).clear_highlights();
                self.move_selection(1, rows.len());
                Ok(EventResponse::Handled)
            }
            KeyCode::PageUp => {
                self.move_selection(-(self.viewport_height.max(1) as isize), rows.len());
                Ok(EventResponse::Handled)
            }
            KeyCode::PageDown => {
                self.move_selection(self.viewport_height.max(1) as isize, rows.len());
                Ok(EventResponse::Handled)
            }
            KeyCode::Right | KeyCode::Enter => {
                if let Some(row) = rows.get(self.selected_index) {
                    let model = self.model(dm);
                    let node = model.row_node(row);
                    if node.is_some_and(|n| n.has_children) {
                        if !row.expanded {
                            model.clear_highlights();
                            model.expand(row.path.clone());
                        }
                    } else if event.code == KeyCode::Enter {
                        self.show_details = true;
                    }
                }
                Ok(EventResponse::Handled)
            }
            KeyCode::Left => {
                if let Some(row) = rows.get(self.selected_index) {
                    if row.expanded {
                        let model = self.model(dm);
                        model.clear_highlights();
                        model.collapse(row.path.clone());
                    } else if row.depth > 0 {
                        // Jump to the parent row
                        let parent = &row.path[..row.path.len() - 1];
                        if let Some(idx) = rows.iter().position(|r| r.path == parent) {
                            self.selected_index = idx;
                            self.clamp_selection(rows.len());
                        }
                    }
                }
                Ok(EventResponse::Handled)
            }
            KeyCode::Char('g') | KeyCode::Char('G') => {
                self.show_globals = !self.show_globals;
                self.selected_index = 0;
                self.scroll_offset = 0;
                debug!(scope = self.scope_name(), "scope switched");
                Ok(EventResponse::Handled)
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                self.sort_order = match self.sort_order {
                    SortOrder::Ascending => SortOrder::Descending,
                    SortOrder::Descending => SortOrder::Ascending,
                };
                Ok(EventResponse::Handled)
            }
            KeyCode::Char('t') | KeyCode::Char('T') => {
                self.show_types = !self.show_types;
                Ok(EventResponse::Handled)
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.model(dm).refresh();
                Ok(EventResponse::Handled)
            }
            KeyCode::Char('v') | KeyCode::Char('V') => {
                self.show_details = true;
                Ok(EventResponse::Handled)
            }
            KeyCode::Char('/') => {
                self.filter_input = Some(self.filter.clone());
                Ok(EventResponse::Handled)
            }
            _ => Ok(EventResponse::NotHandled),
        }
    }

    fn on_tick(&mut self, dm: &mut DataManager) {
        // One request per tick at most; the model suppresses repeats
        // while a fetch is in flight.
        let offset = self.scroll_offset;
        let height = self.viewport_height;
        self.model(dm).request_more(offset, height);
    }

    fn on_focus(&mut self) {
        self.focused = true;
        debug!("Variables panel gained focus");
    }

    fn on_blur(&mut self) {
        self.focused = false;
        debug!("Variables panel lost focus");
    }
}

/// Centered sub-rectangle used for the details overlay.
fn centered_rect(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let width = area.width * percent_x / 100;
    let height = area.height * percent_y / 100;
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
