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

//! Call stack snapshots reported on every debuggee stop.

use serde::{Deserialize, Serialize};

/// One stack frame. Frame 0 is the innermost/current frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    /// Source file of the frame.
    pub file: String,
    /// 1-based line number within `file`.
    pub line: usize,
    /// Function name.
    pub function: String,
    /// Pre-rendered argument text.
    pub args: String,
}

impl StackFrame {
    /// One-line display form, `function (file:line)`.
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            format!("{} ({}:{})", self.function, self.file, self.line)
        } else {
            format!("{}({}) ({}:{})", self.function, self.args, self.file, self.line)
        }
    }
}

/// Whole-stack snapshot for one backend, replaced wholesale on every
/// stop event or backend switch. Stacks are cheap and shallow enough
/// that incremental diffing would buy nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackSnapshot {
    inner: Vec<StackFrame>,
}

impl StackSnapshot {
    /// Create a snapshot from frames in debuggee order (innermost first).
    pub fn new(frames: Vec<StackFrame>) -> Self {
        Self { inner: frames }
    }

    /// Get a frame by ordinal index.
    pub fn get(&self, index: usize) -> Option<&StackFrame> {
        self.inner.get(index)
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the snapshot holds no frames.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate frames innermost-first.
    pub fn iter(&self) -> std::slice::Iter<'_, StackFrame> {
        self.inner.iter()
    }
}

impl IntoIterator for StackSnapshot {
    type Item = StackFrame;
    type IntoIter = std::vec::IntoIter<StackFrame>;
    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<'a> IntoIterator for &'a StackSnapshot {
    type Item = &'a StackFrame;
    type IntoIter = std::slice::Iter<'a, StackFrame>;
    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}
