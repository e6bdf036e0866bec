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

//! Centralized state management for the TUI.
//!
//! `DataManager` is the single container holding every model the
//! panels read from; it is passed as a mutable reference to all app
//! functions. All mutation happens on the UI task: inbound session
//! events are drained one at a time and dispatched here, so merge
//! operations never interleave.

use std::collections::BTreeSet;
use std::sync::Arc;

use dbi_common::types::BackendId;
use tracing::{debug, info};

pub mod calltrace;
pub mod node;
pub mod sort;
pub mod stack;
pub mod variables;

use crate::config::Config;
use crate::data::calltrace::CallTraceModel;
use crate::data::stack::StackModel;
use crate::data::variables::VariablesModel;
use crate::session::{DebugEvent, SessionClient};
use crate::ui::status::BackendStatus;
use crate::ui::Theme;

/// Central data manager containing all per-scope models.
pub struct DataManager {
    /// Globals scope tree.
    pub globals: VariablesModel,
    /// Locals scope tree.
    pub locals: VariablesModel,
    /// Call stack + threads of the selected backend.
    pub stack: StackModel,
    /// Call/return trace log.
    pub calltrace: CallTraceModel,
    /// Theme colors resolved from the active config.
    pub theme: Theme,

    /// Backends known to be connected, in stable order.
    connected: BTreeSet<BackendId>,
    /// Backend the user is looking at.
    selected: Option<BackendId>,
    /// Last debuggee exit notice, shown in the status bar.
    last_exit: Option<String>,
    /// Injected session boundary, shared with all models.
    session: Arc<dyn SessionClient>,
}

impl DataManager {
    /// Create a new manager with all models wired to the session.
    pub fn new(session: Arc<dyn SessionClient>, config: &Config) -> Self {
        let calltrace = CallTraceModel::new(
            session.clone(),
            config.calltrace.stop_on_exit,
            config.calltrace.enabled_by_default,
        );
        Self {
            globals: VariablesModel::new(true, session.clone()),
            locals: VariablesModel::new(false, session.clone()),
            stack: StackModel::new(),
            calltrace,
            theme: Theme::from_config(config),
            connected: BTreeSet::new(),
            selected: None,
            last_exit: None,
            session,
        }
    }

    /// Backend currently selected for display.
    pub fn selected_backend(&self) -> Option<&BackendId> {
        self.selected.as_ref()
    }

    /// All connected backends.
    pub fn connected_backends(&self) -> impl Iterator<Item = &BackendId> {
        self.connected.iter()
    }

    /// Last debuggee exit notice, if any.
    pub fn last_exit(&self) -> Option<&str> {
        self.last_exit.as_deref()
    }

    /// Session status of the selected backend, for the status bar.
    /// Disconnection wins over an earlier exit notice.
    pub fn backend_status(&self) -> BackendStatus {
        match &self.selected {
            Some(id) if !self.connected.contains(id) => BackendStatus::Disconnected,
            Some(_) if self.last_exit.is_some() => BackendStatus::Exited,
            Some(_) => BackendStatus::Connected,
            None => BackendStatus::Waiting,
        }
    }

    /// Switch every model to another backend. Data tagged for any
    /// other backend is discarded from here on.
    pub fn select_backend(&mut self, backend: BackendId) {
        info!(%backend, "selecting backend");
        self.globals.set_backend(backend.clone());
        self.locals.set_backend(backend.clone());
        self.stack.set_backend(backend.clone());
        self.calltrace.set_backend(backend.clone());
        self.selected = Some(backend);
    }

    /// Cycle the selection to the next connected backend.
    pub fn select_next_backend(&mut self) {
        let next = match &self.selected {
            Some(current) => self
                .connected
                .range::<BackendId, _>((
                    std::ops::Bound::Excluded(current.clone()),
                    std::ops::Bound::Unbounded,
                ))
                .next()
                .or_else(|| self.connected.iter().next())
                .cloned(),
            None => self.connected.iter().next().cloned(),
        };
        if let Some(backend) = next {
            if Some(&backend) != self.selected.as_ref() {
                self.select_backend(backend);
            }
        }
    }

    /// Route one inbound session event to the owning model.
    pub fn dispatch(&mut self, event: DebugEvent) {
        match event {
            DebugEvent::Stack { backend, frames } => {
                self.stack.apply_stack(&backend, frames);
                // A new stack means the debuggee stopped; locals for
                // the innermost frame arrive as their own batches.
            }
            DebugEvent::ThreadList { backend, current, threads } => {
                self.stack.apply_threads(&backend, current, threads);
            }
            DebugEvent::Variables(batch) => {
                if batch.globals {
                    self.globals.apply_batch(&batch);
                } else {
                    self.locals.apply_batch(&batch);
                }
            }
            DebugEvent::CallTrace(event) => {
                self.calltrace.apply_event(&event);
            }
            DebugEvent::ClientExit { backend, program, status, message, quiet } => {
                debug!(%backend, %program, status, quiet, "debuggee exited");
                self.calltrace.on_client_exit(&backend);
                if !quiet {
                    let notice = if message.is_empty() {
                        format!("{program} exited with status {status}")
                    } else {
                        format!("{program} exited with status {status}: {message}")
                    };
                    self.last_exit = Some(notice);
                }
            }
            DebugEvent::BackendConnected(backend) => {
                info!(%backend, "backend connected");
                self.connected.insert(backend.clone());
                if self.selected.is_none() {
                    self.select_backend(backend);
                }
            }
            DebugEvent::BackendDisconnected(backend) => {
                info!(%backend, "backend disconnected");
                self.connected.remove(&backend);
            }
        }
    }

    /// Ask the session layer to switch the active thread. The
    /// resulting stack and variable updates arrive as ordinary events.
    pub fn set_active_thread(&mut self, thread_id: u64) {
        if let Some(backend) = &self.selected {
            self.session.request_set_active_thread(backend, thread_id);
        }
    }

    /// Frame selection from the stack viewer: reload locals at the
    /// chosen frame. Globals are frame-independent and stay put.
    pub fn change_frame(&mut self, frame: usize) {
        let frame = self.stack.select_frame(frame);
        self.locals.set_frame(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::RecordingSession;
    use dbi_common::types::StackFrame;

    fn manager() -> DataManager {
        let session = Arc::new(RecordingSession::default());
        DataManager::new(session, &Config::default())
    }

    fn frame(function: &str) -> StackFrame {
        StackFrame {
            file: "m.py".to_string(),
            line: 1,
            function: function.to_string(),
            args: String::new(),
        }
    }

    #[test]
    fn first_connected_backend_is_selected() {
        let mut dm = manager();
        dm.dispatch(DebugEvent::BackendConnected("b2".to_string()));
        dm.dispatch(DebugEvent::BackendConnected("b1".to_string()));
        assert_eq!(dm.selected_backend().map(String::as_str), Some("b2"));
    }

    #[test]
    fn backend_cycling_wraps() {
        let mut dm = manager();
        dm.dispatch(DebugEvent::BackendConnected("a".to_string()));
        dm.dispatch(DebugEvent::BackendConnected("b".to_string()));
        dm.select_next_backend();
        assert_eq!(dm.selected_backend().map(String::as_str), Some("b"));
        dm.select_next_backend();
        assert_eq!(dm.selected_backend().map(String::as_str), Some("a"));
    }

    #[test]
    fn frame_change_reloads_locals() {
        let mut dm = manager();
        dm.dispatch(DebugEvent::BackendConnected("b1".to_string()));
        dm.dispatch(DebugEvent::Stack {
            backend: "b1".to_string(),
            frames: vec![frame("inner"), frame("outer")],
        });
        dm.change_frame(1);
        assert_eq!(dm.locals.frame(), 1);
        assert_eq!(dm.globals.frame(), 0, "globals are frame-independent");
    }

    #[test]
    fn exit_notice_is_recorded() {
        let mut dm = manager();
        dm.dispatch(DebugEvent::ClientExit {
            backend: "b1".to_string(),
            program: "app.py".to_string(),
            status: 1,
            message: "boom".to_string(),
            quiet: false,
        });
        assert_eq!(dm.last_exit(), Some("app.py exited with status 1: boom"));
    }

    #[test]
    fn quiet_exit_is_not_surfaced() {
        let mut dm = manager();
        dm.dispatch(DebugEvent::BackendConnected("b1".to_string()));
        dm.calltrace.set_enabled(true);
        dm.dispatch(DebugEvent::ClientExit {
            backend: "b1".to_string(),
            program: "app.py".to_string(),
            status: 0,
            message: String::new(),
            quiet: true,
        });
        assert_eq!(dm.last_exit(), None);
        // Everything else about the exit still happens.
        assert!(!dm.calltrace.is_enabled());
    }

    #[test]
    fn disconnected_backend_shows_as_such() {
        let mut dm = manager();
        assert_eq!(dm.backend_status(), BackendStatus::Waiting);
        dm.dispatch(DebugEvent::BackendConnected("b1".to_string()));
        assert_eq!(dm.backend_status(), BackendStatus::Connected);
        dm.dispatch(DebugEvent::BackendDisconnected("b1".to_string()));
        assert_eq!(dm.backend_status(), BackendStatus::Disconnected);
    }
}
