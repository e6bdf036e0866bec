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

//! Logging setup shared by DBI binaries.
//!
//! A TUI owns the terminal, so logs must go to a file; writing to
//! stdout/stderr while the alternate screen is active corrupts the
//! display. Binaries call [`init_file_only_logging`] before entering
//! raw mode.

use std::path::PathBuf;

use eyre::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Directory under the user cache dir where log files are written.
const LOG_DIR_NAME: &str = "dbi/logs";

/// Initialize file-only logging for a TUI binary.
///
/// Returns the log file path plus a guard that must be kept alive for
/// the lifetime of the process; dropping it flushes and stops the
/// background writer.
///
/// The filter honors `RUST_LOG`, defaulting to `info` for DBI crates.
pub fn init_file_only_logging(component: &str) -> Result<(PathBuf, WorkerGuard)> {
    let log_dir = dirs::cache_dir()
        .ok_or_else(|| eyre::eyre!("Unable to determine cache directory"))?
        .join(LOG_DIR_NAME);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let file_name = format!("{component}-{timestamp}.log");
    let log_path = log_dir.join(&file_name);

    let file = std::fs::File::create(&log_path)
        .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("info,{}=debug", component.replace('-', "_"))));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to initialize logging: {e}"))?;

    Ok((log_path, guard))
}
