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

//! Boundary to the debugger session layer.
//!
//! The session layer owns backend enumeration, the wire transport, and
//! all debuggee I/O. The front end consumes its notifications as
//! [`DebugEvent`]s delivered over a channel and drained one at a time
//! by the UI task, and issues requests through the injected
//! [`SessionClient`]. Requests are fire-and-forget: the reply arrives
//! later as another event, never synchronously.

use dbi_common::types::{
    BackendId, CallTraceEvent, StackFrame, ThreadInfo, VariableBatch,
};
use serde::{Deserialize, Serialize};

/// Inbound notification from the session layer.
///
/// Events for a given (backend, path) must be delivered in the order
/// the debuggee produced them; the models apply them as they arrive
/// and never buffer or reorder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DebugEvent {
    /// New call stack snapshot for a backend (sent on every stop).
    Stack {
        /// Backend the stack belongs to.
        backend: BackendId,
        /// Frames, innermost first.
        frames: Vec<StackFrame>,
    },
    /// Thread list update for a backend.
    ThreadList {
        /// Backend the threads belong to.
        backend: BackendId,
        /// Id of the currently active thread.
        current: u64,
        /// All threads of the process.
        threads: Vec<ThreadInfo>,
    },
    /// A variable snapshot batch (see [`VariableBatch`]).
    Variables(VariableBatch),
    /// One call or return for the call trace.
    CallTrace(CallTraceEvent),
    /// The debuggee behind a backend exited.
    ClientExit {
        /// Backend that exited.
        backend: BackendId,
        /// Program that was being debugged.
        program: String,
        /// Exit status code.
        status: i32,
        /// Optional exit message.
        message: String,
        /// Suppress the user-facing exit notice. Set for exits the
        /// user initiated themselves, e.g. detaching.
        #[serde(default)]
        quiet: bool,
    },
    /// A backend connected to the session layer.
    BackendConnected(BackendId),
    /// A backend disconnected.
    BackendDisconnected(BackendId),
}

/// Requests the front end issues to the session layer.
///
/// Implementations must not block: a request is queued for the
/// transport and the call returns immediately. All methods take
/// `&self`; implementations handle their own interior queueing.
pub trait SessionClient: Send {
    /// Ask the debuggee for variables of one scope, addressed by path
    /// and starting offset within the parent, at the given frame.
    fn request_variables(
        &self,
        backend: &BackendId,
        globals: bool,
        path: &[String],
        offset: usize,
        frame: usize,
    );

    /// Switch the active thread of a backend.
    fn request_set_active_thread(&self, backend: &BackendId, thread_id: u64);

    /// Change the variable filter pattern for one scope.
    fn request_filter_change(&self, backend: &BackendId, globals: bool, pattern: &str);

    /// Enable or disable call tracing for a backend.
    fn request_set_call_trace(&self, backend: &BackendId, enabled: bool);
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording session double used by the model tests.

    use std::sync::Mutex;

    use super::*;

    /// Everything a [`RecordingSession`] has been asked to do.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Recorded {
        /// A `request_variables` call.
        Variables {
            /// Target backend.
            backend: BackendId,
            /// Globals scope flag.
            globals: bool,
            /// Addressed path.
            path: Vec<String>,
            /// Starting offset.
            offset: usize,
            /// Frame number.
            frame: usize,
        },
        /// A `request_set_active_thread` call.
        SetThread(BackendId, u64),
        /// A `request_filter_change` call.
        Filter(BackendId, bool, String),
        /// A `request_set_call_trace` call.
        CallTrace(BackendId, bool),
    }

    /// Session double that records requests instead of sending them.
    #[derive(Debug, Default)]
    pub struct RecordingSession {
        requests: Mutex<Vec<Recorded>>,
    }

    impl RecordingSession {
        /// Drain and return everything recorded so far.
        pub fn take(&self) -> Vec<Recorded> {
            std::mem::take(&mut self.requests.lock().unwrap())
        }

        /// Number of recorded requests without draining.
        pub fn len(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl SessionClient for RecordingSession {
        fn request_variables(
            &self,
            backend: &BackendId,
            globals: bool,
            path: &[String],
            offset: usize,
            frame: usize,
        ) {
            self.requests.lock().unwrap().push(Recorded::Variables {
                backend: backend.clone(),
                globals,
                path: path.to_vec(),
                offset,
                frame,
            });
        }

        fn request_set_active_thread(&self, backend: &BackendId, thread_id: u64) {
            self.requests.lock().unwrap().push(Recorded::SetThread(backend.clone(), thread_id));
        }

        fn request_filter_change(&self, backend: &BackendId, globals: bool, pattern: &str) {
            self.requests.lock().unwrap().push(Recorded::Filter(
                backend.clone(),
                globals,
                pattern.to_string(),
            ));
        }

        fn request_set_call_trace(&self, backend: &BackendId, enabled: bool) {
            self.requests.lock().unwrap().push(Recorded::CallTrace(backend.clone(), enabled));
        }
    }
}
