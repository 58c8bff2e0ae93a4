/*! Event types for state changes and synchronization. */

use super::{Process, ProcessId, WindowId, WindowState};
use serde::Serialize;
use ts_rs::TS;

/// Initial state sent to a new observer.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct Snapshot {
  /// Windows in paint order (back to front).
  pub windows: Vec<WindowState>,
  pub processes: Vec<Process>,
  pub focused_window: Option<WindowId>,
}

/// Events emitted after a kernel state change has been applied.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(tag = "event", content = "data")]
#[ts(export)]
pub enum Event {
  // Initial sync (on connection)
  #[serde(rename = "sync:init")]
  SyncInit(Snapshot),

  // Window lifecycle
  #[serde(rename = "window:added")]
  WindowAdded { window: WindowState },
  #[serde(rename = "window:changed")]
  WindowChanged { window: WindowState },
  #[serde(rename = "window:removed")]
  WindowRemoved { window_id: WindowId },

  // Window focus
  #[serde(rename = "focus:window")]
  FocusWindow { window_id: Option<WindowId> },

  // Process lifecycle
  #[serde(rename = "process:added")]
  ProcessAdded { process: Process },
  #[serde(rename = "process:changed")]
  ProcessChanged { process: Process },
  #[serde(rename = "process:removed")]
  ProcessRemoved { process_id: ProcessId },
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn events_are_tagged() {
    let json = serde_json::to_value(Event::WindowRemoved {
      window_id: WindowId(7),
    })
    .unwrap();
    assert_eq!(json["event"], "window:removed");
    assert_eq!(json["data"]["window_id"], 7);
  }

  #[test]
  fn focus_cleared_serializes_null() {
    let json = serde_json::to_value(Event::FocusWindow { window_id: None }).unwrap();
    assert_eq!(json["event"], "focus:window");
    assert!(json["data"]["window_id"].is_null());
  }
}
