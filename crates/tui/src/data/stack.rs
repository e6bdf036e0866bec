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

//! Call stack and thread state for the selected backend.
//!
//! Stack snapshots are replaced wholesale on every stop event or
//! backend switch; frames are cheap and the depth small, so there is
//! nothing to gain from incremental diffing.

use dbi_common::types::{BackendId, StackFrame, StackSnapshot, ThreadInfo};
use tracing::trace;

/// Stack and thread snapshot holder.
#[derive(Debug, Default)]
pub struct StackModel {
    /// Backend whose stack is displayed.
    backend: Option<BackendId>,
    /// Current snapshot, innermost frame first.
    snapshot: StackSnapshot,
    /// Frame the user selected (0 = innermost).
    selected_frame: usize,
    /// Threads of the selected backend.
    threads: Vec<ThreadInfo>,
    /// Id of the currently active thread.
    current_thread: Option<u64>,
}

impl StackModel {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend currently displayed.
    pub fn backend(&self) -> Option<&BackendId> {
        self.backend.as_ref()
    }

    /// Select the backend. Clears the displayed stack and threads.
    pub fn set_backend(&mut self, backend: BackendId) {
        if self.backend.as_ref() == Some(&backend) {
            return;
        }
        self.backend = Some(backend);
        self.snapshot = StackSnapshot::default();
        self.threads.clear();
        self.current_thread = None;
        self.selected_frame = 0;
    }

    /// Replace the snapshot with a new one (debuggee stop event).
    /// Events for a non-selected backend are discarded.
    pub fn apply_stack(&mut self, backend: &BackendId, frames: Vec<StackFrame>) {
        if self.backend.as_ref() != Some(backend) {
            trace!(%backend, "dropping stack for non-selected backend");
            return;
        }
        self.snapshot = StackSnapshot::new(frames);
        self.selected_frame = 0;
    }

    /// Replace the thread list.
    pub fn apply_threads(&mut self, backend: &BackendId, current: u64, threads: Vec<ThreadInfo>) {
        if self.backend.as_ref() != Some(backend) {
            return;
        }
        self.threads = threads;
        self.current_thread = Some(current);
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> &StackSnapshot {
        &self.snapshot
    }

    /// Threads of the selected backend.
    pub fn threads(&self) -> &[ThreadInfo] {
        &self.threads
    }

    /// Id of the active thread, if known.
    pub fn current_thread(&self) -> Option<u64> {
        self.current_thread
    }

    /// Currently selected frame ordinal.
    pub fn selected_frame(&self) -> usize {
        self.selected_frame
    }

    /// Select a frame by ordinal. Returns the clamped ordinal, which
    /// the caller propagates to the locals tree as a frame change.
    pub fn select_frame(&mut self, frame: usize) -> usize {
        self.selected_frame = frame.min(self.snapshot.len().saturating_sub(1));
        self.selected_frame
    }

    /// Export the current stack as plain text, innermost frame first.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (idx, frame) in self.snapshot.iter().enumerate() {
            out.push_str(&format!("#{idx} {}\n", frame.display()));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(function: &str, line: usize) -> StackFrame {
        StackFrame {
            file: "main.py".to_string(),
            line,
            function: function.to_string(),
            args: String::new(),
        }
    }

    #[test]
    fn snapshot_replaced_wholesale() {
        let mut model = StackModel::new();
        model.set_backend("b1".to_string());
        model.apply_stack(&"b1".to_string(), vec![frame("inner", 10), frame("outer", 3)]);
        model.select_frame(1);

        model.apply_stack(&"b1".to_string(), vec![frame("other", 7)]);
        assert_eq!(model.snapshot().len(), 1);
        // Selection resets to the innermost frame with the new stack.
        assert_eq!(model.selected_frame(), 0);
    }

    #[test]
    fn foreign_backend_stack_is_discarded() {
        let mut model = StackModel::new();
        model.set_backend("b1".to_string());
        model.apply_stack(&"b2".to_string(), vec![frame("f", 1)]);
        assert!(model.snapshot().is_empty());
    }

    #[test]
    fn frame_selection_clamps() {
        let mut model = StackModel::new();
        model.set_backend("b1".to_string());
        model.apply_stack(&"b1".to_string(), vec![frame("a", 1), frame("b", 2)]);
        assert_eq!(model.select_frame(10), 1);
    }
}
