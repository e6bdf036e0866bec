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

//! Typed data exchanged between the debugger transport and the front end.

mod calltrace;
mod stack;
mod thread;
mod variable;

pub use calltrace::*;
pub use stack::*;
pub use thread::*;
pub use variable::*;

/// Opaque identifier of one remotely-debugged process/session.
///
/// The front end never interprets this string; it only compares it
/// against the currently selected backend and discards events tagged
/// for any other one.
pub type BackendId = String;
