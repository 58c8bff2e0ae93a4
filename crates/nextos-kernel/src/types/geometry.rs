/*! Geometry types for window placement, in logical pixels. */

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Window rectangle in logical pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, TS)]
#[ts(export)]
pub struct Bounds {
  pub x: f64,
  pub y: f64,
  pub width: f64,
  pub height: f64,
}

impl Bounds {
  pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
    Self {
      x,
      y,
      width,
      height,
    }
  }

  /// Merge a partial update. Fields absent from `patch` keep their value.
  #[must_use]
  pub fn merged(self, patch: &BoundsPatch) -> Self {
    Self {
      x: patch.x.unwrap_or(self.x),
      y: patch.y.unwrap_or(self.y),
      width: patch.width.unwrap_or(self.width),
      height: patch.height.unwrap_or(self.height),
    }
  }

  /// Raise width and height to at least `min`. Position is untouched.
  #[must_use]
  pub fn clamped_to(self, min: Size) -> Self {
    Self {
      width: self.width.max(min.width),
      height: self.height.max(min.height),
      ..self
    }
  }

  pub const fn origin(&self) -> Point {
    Point::new(self.x, self.y)
  }

  pub const fn size(&self) -> Size {
    Size::new(self.width, self.height)
  }
}

/// Partial bounds. `None` fields are left as they are when merged.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, TS)]
#[ts(export)]
pub struct BoundsPatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub x: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub y: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub width: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub height: Option<f64>,
}

impl BoundsPatch {
  /// Patch that only moves.
  pub const fn position(x: f64, y: f64) -> Self {
    Self {
      x: Some(x),
      y: Some(y),
      width: None,
      height: None,
    }
  }

  /// Patch that only resizes.
  pub const fn size(width: f64, height: f64) -> Self {
    Self {
      x: None,
      y: None,
      width: Some(width),
      height: Some(height),
    }
  }
}

impl From<Bounds> for BoundsPatch {
  fn from(b: Bounds) -> Self {
    Self {
      x: Some(b.x),
      y: Some(b.y),
      width: Some(b.width),
      height: Some(b.height),
    }
  }
}

/// A 2D point in logical pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, TS)]
#[ts(export)]
pub struct Point {
  pub x: f64,
  pub y: f64,
}

impl Point {
  pub const fn new(x: f64, y: f64) -> Self {
    Self { x, y }
  }

  /// Vector from `origin` to `self`.
  pub fn delta_from(&self, origin: Point) -> (f64, f64) {
    (self.x - origin.x, self.y - origin.y)
  }
}

/// Width and height in logical pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, TS)]
#[ts(export)]
pub struct Size {
  pub width: f64,
  pub height: f64,
}

impl Size {
  pub const fn new(width: f64, height: f64) -> Self {
    Self { width, height }
  }
}

/// Browser viewport dimensions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, TS)]
#[ts(export)]
pub struct Viewport {
  pub width: f64,
  pub height: f64,
}

impl Viewport {
  pub const fn new(width: f64, height: f64) -> Self {
    Self { width, height }
  }

  /// Area available to a maximized window: full width, height minus the taskbar.
  pub fn work_area(&self, taskbar_height: f64) -> Bounds {
    Bounds::new(0.0, 0.0, self.width, (self.height - taskbar_height).max(0.0))
  }
}
