/*! Window frame state. */

use super::{Bounds, Viewport, WindowId};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// An on-screen application window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct WindowState {
  pub id: WindowId,
  pub title: String,
  pub app_id: String,
  /// Stored geometry. Not read by the renderer while maximized.
  pub bounds: Bounds,
  pub is_minimized: bool,
  pub is_maximized: bool,
  pub is_focused: bool,
  /// Stacking order: higher paints on top.
  pub z_index: u32,
}

impl WindowState {
  /// Rectangle the renderer should use: the work area while maximized, stored bounds otherwise.
  pub fn display_bounds(&self, viewport: Viewport, taskbar_height: f64) -> Bounds {
    if self.is_maximized {
      viewport.work_area(taskbar_height)
    } else {
      self.bounds
    }
  }
}
