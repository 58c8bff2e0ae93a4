//! `nextosd` - serves the NextOS kernel to the browser UI over WebSocket.
//!
//! Environment:
//! - `NEXTOS_WS_PORT` - listen port (default 3030)
//! - `NEXTOS_DATA_DIR` - directory for file system records (default `./nextos-data`)
//! - `RUST_LOG` - log filter (default `info`)

use std::path::PathBuf;
use std::process::ExitCode;

use log::LevelFilter;
use nextos_kernel::{Kernel, StorageConfig};
use nextos_ws::{start_server, WebSocketState, DEFAULT_WS_PORT};

const DEFAULT_DATA_DIR: &str = "./nextos-data";

fn port_from_env() -> u16 {
  match std::env::var("NEXTOS_WS_PORT") {
    Ok(raw) => raw.parse().unwrap_or_else(|e| {
      log::warn!("ignoring NEXTOS_WS_PORT={raw:?}: {e}");
      DEFAULT_WS_PORT
    }),
    Err(_) => DEFAULT_WS_PORT,
  }
}

fn data_dir_from_env() -> PathBuf {
  std::env::var_os("NEXTOS_DATA_DIR")
    .map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from)
}

#[tokio::main]
async fn main() -> ExitCode {
  env_logger::Builder::new()
    .filter_level(LevelFilter::Info)
    .parse_default_env()
    .init();

  let data_dir = data_dir_from_env();
  log::info!("file system records in {}", data_dir.display());

  let kernel = Kernel::builder()
    .storage(StorageConfig::JsonDir(data_dir))
    .build();

  // A broken store degrades the file system but the desktop still runs.
  if let Err(e) = kernel.boot().await {
    log::error!("file system unavailable: {e}");
  }

  let state = WebSocketState::with_port(kernel, port_from_env());
  let shutdown = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      log::error!("failed to listen for shutdown signal: {e}");
      std::future::pending::<()>().await;
    }
    log::info!("shutting down");
  };

  match start_server(state, shutdown).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(_) => ExitCode::FAILURE,
  }
}
