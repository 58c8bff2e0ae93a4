/*! Logical application instances. */

use super::{ProcessId, WindowId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Lifecycle state of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ProcessStatus {
  Running,
  Suspended,
  /// Transient: a terminated process is removed from the registry in the same call.
  Terminated,
}

/// A running application instance, usually bound to one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Process {
  pub id: ProcessId,
  /// Display label copied from the application at launch. Not re-synced.
  pub name: String,
  pub app_id: String,
  /// `None` for headless processes.
  pub window_id: Option<WindowId>,
  pub status: ProcessStatus,
  pub created_at: DateTime<Utc>,
}

/// Partial update for [`Process`]. Status is not updatable here; use
/// suspend/resume/terminate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProcessUpdate {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  /// Rebind the process to another window.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub window_id: Option<WindowId>,
}
