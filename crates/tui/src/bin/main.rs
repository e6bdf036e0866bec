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

//! DBI TUI - terminal client for live debuggee inspection
//!
//! This binary connects to a running session layer over a line-
//! delimited JSON socket and drives the TUI on top of it. The library
//! itself never sees the socket; it gets a [`SessionClient`]
//! implementation and a channel of inbound events.

use clap::Parser;
use dbi_common::logging;
use dbi_common::types::BackendId;
use dbi_tui::{Config, DebugEvent, SessionClient, TuiConfig};
use eyre::{Result, WrapErr};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// DBI Terminal User Interface
#[derive(Debug, Parser)]
#[command(name = "dbi-tui")]
#[command(about = "Terminal client for live debuggee inspection", version)]
struct Args {
    /// Session layer address
    #[arg(long, default_value = "127.0.0.1:6041")]
    connect: String,

    /// Config file path (uses ~/.dbi.toml if not specified)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable mouse support
    #[arg(long)]
    mouse: bool,

    /// Terminal refresh interval in milliseconds
    #[arg(long, default_value = "50")]
    refresh_interval: u64,
}

/// One outbound request line on the session socket.
#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum SessionRequest {
    Variables { backend: String, globals: bool, path: Vec<String>, offset: usize, frame: usize },
    SetActiveThread { backend: String, thread_id: u64 },
    FilterChange { backend: String, globals: bool, pattern: String },
    SetCallTrace { backend: String, enabled: bool },
}

/// [`SessionClient`] over the socket writer task. Requests are queued
/// and the calls return immediately, as the trait requires.
struct SocketSession {
    tx: mpsc::UnboundedSender<SessionRequest>,
}

impl SocketSession {
    fn send(&self, request: SessionRequest) {
        if self.tx.send(request).is_err() {
            warn!("session writer gone, request dropped");
        }
    }
}

impl SessionClient for SocketSession {
    fn request_variables(
        &self,
        backend: &BackendId,
        globals: bool,
        path: &[String],
        offset: usize,
        frame: usize,
    ) {
        self.send(SessionRequest::Variables {
            backend: backend.clone(),
            globals,
            path: path.to_vec(),
            offset,
            frame,
        });
    }

    fn request_set_active_thread(&self, backend: &BackendId, thread_id: u64) {
        self.send(SessionRequest::SetActiveThread { backend: backend.clone(), thread_id });
    }

    fn request_filter_change(&self, backend: &BackendId, globals: bool, pattern: &str) {
        self.send(SessionRequest::FilterChange {
            backend: backend.clone(),
            globals,
            pattern: pattern.to_string(),
        });
    }

    fn request_set_call_trace(&self, backend: &BackendId, enabled: bool) {
        self.send(SessionRequest::SetCallTrace { backend: backend.clone(), enabled });
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // File-only logging; the terminal belongs to the TUI
    let (log_file_path, _log_guard) = logging::init_file_only_logging("dbi-tui")?;
    eprintln!("DBI TUI logs: {}", log_file_path.display());

    let config = if let Some(config_path) = args.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load().unwrap_or_default()
    };

    tracing::info!("Starting DBI TUI");
    tracing::info!("Connecting to session layer at: {}", args.connect);

    let stream = TcpStream::connect(&args.connect)
        .await
        .wrap_err_with(|| format!("cannot reach session layer at {}", args.connect))?;
    let (read_half, mut write_half) = stream.into_split();

    // Inbound: one JSON event per line
    let (event_tx, event_rx) = mpsc::unbounded_channel::<DebugEvent>();
    tokio::spawn(async move {
        let mut lines = BufReader::new(read_half).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match serde_json::from_str::<DebugEvent>(&line) {
                    Ok(event) => {
                        debug!(?event, "session event");
                        if event_tx.send(event).is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!(%err, line, "undecodable session event"),
                },
                Ok(None) => {
                    warn!("session layer closed the connection");
                    break;
                }
                Err(err) => {
                    error!(%err, "session socket read failed");
                    break;
                }
            }
        }
    });

    // Outbound: one JSON request per line
    let (request_tx, mut request_rx) = mpsc::unbounded_channel::<SessionRequest>();
    tokio::spawn(async move {
        while let Some(request) = request_rx.recv().await {
            let mut line = match serde_json::to_string(&request) {
                Ok(line) => line,
                Err(err) => {
                    error!(%err, "unencodable session request");
                    continue;
                }
            };
            line.push('\n');
            if let Err(err) = write_half.write_all(line.as_bytes()).await {
                error!(%err, "session socket write failed");
                break;
            }
        }
    });

    let tui_config = TuiConfig {
        refresh_interval: std::time::Duration::from_millis(args.refresh_interval),
        enable_mouse: args.mouse,
    };
    let session = Arc::new(SocketSession { tx: request_tx });

    match dbi_tui::api::start_tui(tui_config, &config, session, event_rx).await {
        Ok(()) => {
            tracing::info!("TUI exited normally");
            Ok(())
        }
        Err(e) => {
            tracing::error!("TUI error: {}", e);
            Err(e)
        }
    }
}
