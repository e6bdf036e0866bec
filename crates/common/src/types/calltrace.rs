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

//! Call/return trace events.
//!
//! The debuggee reports one call or one return at a time; nesting is
//! reconstructed client-side with an explicit open-call stack.

use serde::{Deserialize, Serialize};

use crate::types::BackendId;

/// A source location involved in a call or return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceLocation {
    /// Source file.
    pub file: String,
    /// 1-based line number.
    pub line: usize,
    /// Enclosing function name.
    pub function: String,
}

impl TraceLocation {
    /// One-line display form, `function (file:line)`.
    pub fn display(&self) -> String {
        format!("{} ({}:{})", self.function, self.file, self.line)
    }
}

/// One call or return reported by the debuggee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallTraceEvent {
    /// Backend the event belongs to.
    pub backend: BackendId,
    /// True for a call, false for a return.
    pub is_call: bool,
    /// Where the call/return originates.
    pub from: TraceLocation,
    /// Where it lands.
    pub to: TraceLocation,
}
