/*!
Pointer gestures that move and resize windows.

A session starts on pointer-down over the title bar (drag) or the resize
handle (resize), feeds every pointer-move to the manager, and ends on
pointer-up. Minimum size is enforced here, before the manager sees the bounds.
*/

use super::WindowManager;
use crate::types::{Bounds, BoundsPatch, Point, Size, WindowId};

/// Title-bar drag. Each move shifts the window by the pointer delta since the
/// previous move.
#[derive(Debug)]
pub struct DragSession {
  manager: WindowManager,
  window_id: WindowId,
  last_pointer: Point,
}

impl DragSession {
  /// Start dragging. Returns `None` for unknown or maximized windows.
  pub fn begin(manager: &WindowManager, window_id: WindowId, pointer: Point) -> Option<Self> {
    let window = manager.get_window(window_id)?;
    if window.is_maximized {
      return None;
    }
    Some(Self {
      manager: manager.clone(),
      window_id,
      last_pointer: pointer,
    })
  }

  /// Pointer moved. Returns the stored bounds after the update, if the window still exists.
  pub fn update(&mut self, pointer: Point) -> Option<Bounds> {
    let current = self.manager.get_window(self.window_id)?;
    let (dx, dy) = pointer.delta_from(self.last_pointer);
    self.last_pointer = pointer;
    self.manager.update_window_bounds(
      self.window_id,
      BoundsPatch::position(current.bounds.x + dx, current.bounds.y + dy),
    );
    self.manager.get_window(self.window_id).map(|w| w.bounds)
  }

  /// Pointer released.
  pub fn end(self) {}
}

/// Corner resize. Size follows the pointer delta from where the gesture
/// started, floored at the configured minimum.
#[derive(Debug)]
pub struct ResizeSession {
  manager: WindowManager,
  window_id: WindowId,
  origin: Point,
  start_bounds: Bounds,
  min_size: Size,
}

impl ResizeSession {
  /// Start resizing. Returns `None` for unknown or maximized windows.
  pub fn begin(manager: &WindowManager, window_id: WindowId, pointer: Point) -> Option<Self> {
    let window = manager.get_window(window_id)?;
    if window.is_maximized {
      return None;
    }
    Some(Self {
      manager: manager.clone(),
      window_id,
      origin: pointer,
      start_bounds: window.bounds,
      min_size: manager.defaults().min_size,
    })
  }

  /// Bounds for a pointer position. The top-left corner stays put.
  pub fn bounds_for(&self, pointer: Point) -> Bounds {
    let (dx, dy) = pointer.delta_from(self.origin);
    Bounds {
      width: self.start_bounds.width + dx,
      height: self.start_bounds.height + dy,
      ..self.start_bounds
    }
    .clamped_to(self.min_size)
  }

  /// Pointer moved. Returns the stored bounds after the update, if the window still exists.
  pub fn update(&mut self, pointer: Point) -> Option<Bounds> {
    let bounds = self.bounds_for(pointer);
    self
      .manager
      .update_window_bounds(self.window_id, BoundsPatch::size(bounds.width, bounds.height));
    self.manager.get_window(self.window_id).map(|w| w.bounds)
  }

  /// Pointer released.
  pub fn end(self) {}
}


#[cfg(test)]
mod proptests {
  use super::*;
  use proptest::prelude::*;

  proptest! {
    /// No resize delta yields a size under the configured minimum
    #[test]
    fn resize_never_below_minimum(
      start_w in 400.0..2000.0f64, start_h in 300.0..2000.0f64,
      dx in -5000.0..5000.0f64, dy in -5000.0..5000.0f64
    ) {
      let wm = WindowManager::default();
      let id = wm.create_window("a", "A", Some(BoundsPatch::size(start_w, start_h)));
      let mut resize = ResizeSession::begin(&wm, id, Point::new(0.0, 0.0)).unwrap();
      let bounds = resize.update(Point::new(dx, dy)).unwrap();
      prop_assert!(bounds.width >= 400.0, "width {} below minimum", bounds.width);
      prop_assert!(bounds.height >= 300.0, "height {} below minimum", bounds.height);
    }
  }
}
