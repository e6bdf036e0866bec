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

//! Debuggee thread descriptors.

use serde::{Deserialize, Serialize};

/// One thread of a debugged process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadInfo {
    /// Debuggee-assigned thread id.
    pub id: u64,
    /// Human-readable thread name.
    pub name: String,
    /// Whether the thread is currently stopped at a breakpoint/step.
    pub broken: bool,
    /// Whether the thread is stopped due to an exception.
    pub exception: bool,
}

impl ThreadInfo {
    /// Status glyph used in list displays.
    pub fn status_marker(&self) -> &'static str {
        match (self.broken, self.exception) {
            (_, true) => "!",
            (true, false) => "*",
            (false, false) => " ",
        }
    }
}
