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

//! Append-only call/return trace log.
//!
//! The debuggee reports one call or one return at a time; proper
//! nesting is reconstructed with an explicit stack of currently open
//! calls, because the flat log alone cannot tell which call a return
//! closes. Entries link to their parent by id, so the log stays a flat
//! vector addressed positionally.

use std::sync::Arc;

use dbi_common::types::{BackendId, CallTraceEvent, TraceLocation};
use tracing::trace;

use crate::session::SessionClient;

/// One call (and eventually its return) in the trace log.
#[derive(Debug, Clone)]
pub struct CallTraceEntry {
    /// Index of this entry in the log vector.
    pub id: usize,
    /// Parent call this one is nested under (None for top level).
    pub parent_id: Option<usize>,
    /// Nesting depth (0 = top level).
    pub depth: usize,
    /// Call origin.
    pub from: TraceLocation,
    /// Call target.
    pub to: TraceLocation,
    /// Whether the matching return has been observed.
    pub returned: bool,
}

/// Nested call/return log for one traced backend.
pub struct CallTraceModel {
    /// Backend currently being traced; events for any other backend
    /// are discarded.
    traced_backend: Option<BackendId>,
    /// Whether tracing is currently enabled.
    enabled: bool,
    /// Stop tracing automatically when the traced backend exits.
    stop_on_exit: bool,
    /// Start tracing as soon as a backend is selected (config knob).
    enable_on_select: bool,
    /// The log, in arrival order.
    entries: Vec<CallTraceEntry>,
    /// Ids of calls without a matching return yet, innermost last.
    /// This is the explicit state the flat log cannot reconstruct.
    open_calls: Vec<usize>,
    /// Injected session boundary; enable/disable is a remote request.
    session: Arc<dyn SessionClient>,
}

impl CallTraceModel {
    /// Create a disabled, empty trace.
    pub fn new(
        session: Arc<dyn SessionClient>,
        stop_on_exit: bool,
        enable_on_select: bool,
    ) -> Self {
        Self {
            traced_backend: None,
            enabled: false,
            stop_on_exit,
            enable_on_select,
            entries: Vec::new(),
            open_calls: Vec::new(),
            session,
        }
    }

    /// Select which backend to trace. Clears the log; call nesting
    /// cannot span backends.
    pub fn set_backend(&mut self, backend: BackendId) {
        if self.traced_backend.as_ref() == Some(&backend) {
            return;
        }
        self.traced_backend = Some(backend);
        self.enabled = false;
        self.clear();
        if self.enable_on_select {
            self.set_enabled(true);
        }
    }

    /// Whether tracing is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The auto-stop preference.
    pub fn stops_on_exit(&self) -> bool {
        self.stop_on_exit
    }

    /// Set the auto-stop preference.
    pub fn set_stop_on_exit(&mut self, stop: bool) {
        self.stop_on_exit = stop;
    }

    /// Enable or disable tracing. The switch itself is a request to
    /// the session layer; the local flag mirrors what was asked for.
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled == self.enabled {
            return;
        }
        self.enabled = enabled;
        if let Some(backend) = &self.traced_backend {
            self.session.request_set_call_trace(backend, enabled);
        }
    }

    /// Drop the whole log (user action, or the debuggee announcing a
    /// fresh run).
    pub fn clear(&mut self) {
        self.entries.clear();
        self.open_calls.clear();
    }

    /// The log in arrival order.
    pub fn entries(&self) -> &[CallTraceEntry] {
        &self.entries
    }

    /// Apply one call or return event.
    pub fn apply_event(&mut self, event: &CallTraceEvent) {
        if self.traced_backend.as_ref() != Some(&event.backend) {
            trace!(backend = %event.backend, "dropping trace event for non-traced backend");
            return;
        }

        if event.is_call {
            let parent_id = self.open_calls.last().copied();
            let depth = parent_id.map_or(0, |id| self.entries[id].depth + 1);
            let id = self.entries.len();
            self.entries.push(CallTraceEntry {
                id,
                parent_id,
                depth,
                from: event.from.clone(),
                to: event.to.clone(),
                returned: false,
            });
            self.open_calls.push(id);
        } else if let Some(id) = self.open_calls.pop() {
            // The returned call stays in the log as a closed entry.
            self.entries[id].returned = true;
        }
        // A return with no open call is dropped: the debuggee was
        // already inside a call when tracing was switched on.
    }

    /// The traced backend exited; force-disable tracing if the
    /// auto-stop preference is set.
    pub fn on_client_exit(&mut self, backend: &BackendId) {
        if self.traced_backend.as_ref() != Some(backend) {
            return;
        }
        if self.stop_on_exit && self.enabled {
            self.set_enabled(false);
        }
    }

    /// Direct children of an entry (or top-level entries for `None`).
    pub fn children_of(&self, parent_id: Option<usize>) -> Vec<&CallTraceEntry> {
        self.entries.iter().filter(|e| e.parent_id == parent_id).collect()
    }

    /// Export the trace as indented plain text.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            let indent = "  ".repeat(entry.depth);
            out.push_str(&format!(
                "{indent}{} -> {}\n",
                entry.from.display(),
                entry.to.display()
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::{Recorded, RecordingSession};

    fn loc(function: &str) -> TraceLocation {
        TraceLocation { file: "app.py".to_string(), line: 1, function: function.to_string() }
    }

    fn event(backend: &str, is_call: bool, to: &str) -> CallTraceEvent {
        CallTraceEvent {
            backend: backend.to_string(),
            is_call,
            from: loc("caller"),
            to: loc(to),
        }
    }

    fn model() -> (CallTraceModel, Arc<RecordingSession>) {
        let session = Arc::new(RecordingSession::default());
        let mut model = CallTraceModel::new(session.clone(), true, false);
        model.set_backend("b1".to_string());
        (model, session)
    }

    #[test]
    fn backend_selection_can_auto_enable() {
        let session = Arc::new(RecordingSession::default());
        let mut model = CallTraceModel::new(session.clone(), true, true);
        model.set_backend("b1".to_string());
        assert!(model.is_enabled());
        assert_eq!(session.take(), vec![Recorded::CallTrace("b1".to_string(), true)]);
    }

    #[test]
    fn nesting_follows_the_open_call_stack() {
        let (mut model, _session) = model();
        // call A, call B, return, return, call C, return
        model.apply_event(&event("b1", true, "A"));
        model.apply_event(&event("b1", true, "B"));
        model.apply_event(&event("b1", false, "B"));
        model.apply_event(&event("b1", false, "A"));
        model.apply_event(&event("b1", true, "C"));
        model.apply_event(&event("b1", false, "C"));

        let entries = model.entries();
        assert_eq!(entries.len(), 3);
        let a = &entries[0];
        let b = &entries[1];
        let c = &entries[2];
        assert_eq!(a.to.function, "A");
        assert_eq!(a.parent_id, None);
        assert_eq!(b.to.function, "B");
        assert_eq!(b.parent_id, Some(a.id));
        assert_eq!(b.depth, 1);
        assert_eq!(c.to.function, "C");
        assert_eq!(c.parent_id, None, "C must sit at the root, after A");
        assert!(entries.iter().all(|e| e.returned));
    }

    #[test]
    fn foreign_backend_events_are_discarded() {
        let (mut model, _session) = model();
        model.apply_event(&event("b2", true, "X"));
        assert!(model.entries().is_empty());
    }

    #[test]
    fn unmatched_return_is_ignored() {
        let (mut model, _session) = model();
        model.apply_event(&event("b1", false, "X"));
        assert!(model.entries().is_empty());
    }

    #[test]
    fn enable_is_a_session_request() {
        let (mut model, session) = model();
        model.set_enabled(true);
        assert_eq!(session.take(), vec![Recorded::CallTrace("b1".to_string(), true)]);
    }

    #[test]
    fn exit_stops_tracing_when_configured() {
        let (mut model, session) = model();
        model.set_enabled(true);
        session.take();

        model.on_client_exit(&"b1".to_string());
        assert!(!model.is_enabled());
        assert_eq!(session.take(), vec![Recorded::CallTrace("b1".to_string(), false)]);
    }

    #[test]
    fn exit_keeps_tracing_when_not_configured() {
        let session = Arc::new(RecordingSession::default());
        let mut model = CallTraceModel::new(session.clone(), false, false);
        model.set_backend("b1".to_string());
        model.set_enabled(true);
        session.take();

        model.on_client_exit(&"b1".to_string());
        assert!(model.is_enabled());
        assert_eq!(session.len(), 0);
    }
}
