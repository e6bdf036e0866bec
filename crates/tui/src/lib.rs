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

// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
// SPDX-License-Identifier: AGPL-3.0
//! Terminal front end for live debuggee inspection
//!
//! This crate renders the variable trees, call stack, thread list and
//! call trace of a debugged process. It talks to an external session
//! layer through the [`session::SessionClient`] trait and an inbound
//! channel of [`session::DebugEvent`]s; the wire transport behind
//! those lives with the binary, not here.

mod app;
mod config;
mod data;
mod layout;
mod panels;
pub mod session;
mod ui;

pub use app::App;
pub use config::Config;
pub use data::variables::{SortOrder, VisibleRow};
pub use data::DataManager;
pub use layout::{LayoutManager, LayoutType};
pub use panels::EventResponse;
pub use session::{DebugEvent, SessionClient};
pub use ui::{BackendStatus, BorderPresets, StatusBar, Theme};

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use crossterm::event::KeyEvent;
use eyre::Result;
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, sync::Arc, time::Duration};
use tokio::{select, sync::mpsc, time::interval};
use tracing::{debug, info, warn};

/// Configuration for the TUI runner
#[derive(Debug, Clone)]
pub struct TuiConfig {
    /// Terminal refresh interval
    pub refresh_interval: Duration,
    /// Enable mouse capture
    pub enable_mouse: bool,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self { refresh_interval: Duration::from_millis(50), enable_mouse: false }
    }
}

/// Main TUI runner that manages the terminal interface and event loop
pub struct Tui {
    /// The main application state and panel management
    app: App,
    /// All displayed state, fed from the inbound event channel
    data_manager: DataManager,
    /// Inbound debugger events from the session layer
    events: mpsc::UnboundedReceiver<DebugEvent>,
    /// Terminal backend for rendering and input handling
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    /// Configuration settings for the TUI behavior
    config: TuiConfig,
}

impl Tui {
    /// Create a new TUI instance. Puts the terminal into raw mode and
    /// the alternate screen; `Drop` restores both.
    pub fn new(
        config: TuiConfig,
        app_config: &Config,
        session: Arc<dyn SessionClient>,
        events: mpsc::UnboundedReceiver<DebugEvent>,
    ) -> Result<Self> {
        info!("Initializing TUI with config: {:?}", config);

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if config.enable_mouse {
            execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        } else {
            execute!(stdout, EnterAlternateScreen)?;
        }

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        let app = App::new(app_config);
        let data_manager = DataManager::new(session, app_config);

        Ok(Self { app, data_manager, events, terminal, config })
    }

    /// Run the main TUI event loop
    pub async fn run(mut self) -> Result<()> {
        info!("Starting TUI event loop");

        let mut event_stream = EventStream::new();
        let mut ticker = interval(self.config.refresh_interval);
        let mut session_alive = true;

        let result = loop {
            let render_result = self
                .terminal
                .draw(|frame| {
                    if let Err(e) = self.app.render(frame, &mut self.data_manager) {
                        warn!("Render error: {}", e);
                    }
                });

            if let Err(e) = render_result {
                break Err(e.into());
            }

            select! {
                // Terminal events (keyboard, resize)
                event_result = event_stream.next() => {
                    if let Some(Ok(current_event)) = event_result {
                        match current_event {
                            Event::Key(key_event) => {
                                if self.handle_key_event(key_event)? {
                                    break Ok(());
                                }
                            }
                            Event::Resize(width, height) => {
                                self.app.handle_resize(width, height);
                            }
                            _ => {}
                        }
                    }
                }

                // Inbound debugger events; drained in arrival order so
                // tree merges never interleave.
                event = self.events.recv(), if session_alive => {
                    match event {
                        Some(event) => {
                            self.data_manager.dispatch(event);
                            while let Ok(event) = self.events.try_recv() {
                                self.data_manager.dispatch(event);
                            }
                        }
                        None => {
                            warn!("Session event channel closed");
                            session_alive = false;
                        }
                    }
                }

                // Periodic refresh tick; panels pace their fetching here
                _ = ticker.tick() => {
                    self.app.update(&mut self.data_manager);
                }
            }

            if self.app.should_exit() {
                info!("App requested exit");
                break Ok(());
            }
        };

        info!("TUI event loop ended");
        result
    }

    // Handle a single key event, returning true if the app should exit
    fn handle_key_event(&mut self, key_event: KeyEvent) -> Result<bool> {
        match self.app.handle_key_event(key_event, &mut self.data_manager)? {
            EventResponse::Exit => {
                info!("Exit requested");
                Ok(true)
            }
            EventResponse::Handled | EventResponse::ChangeFocus(_) => Ok(false),
            EventResponse::NotHandled => {
                debug!("Unhandled key event: {:?}", key_event);
                Ok(false)
            }
        }
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        // Restore terminal state
        let _ = disable_raw_mode();
        if self.config.enable_mouse {
            let _ =
                execute!(self.terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture);
        } else {
            let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        }
        let _ = self.terminal.show_cursor();
    }
}

/// Public API for the TUI module
pub mod api {
    use super::*;

    /// Start the TUI against an already-wired session boundary
    pub async fn start_tui(
        config: TuiConfig,
        app_config: &Config,
        session: Arc<dyn SessionClient>,
        events: mpsc::UnboundedReceiver<DebugEvent>,
    ) -> Result<()> {
        let tui = Tui::new(config, app_config, session, events)?;
        tui.run().await
    }
}
