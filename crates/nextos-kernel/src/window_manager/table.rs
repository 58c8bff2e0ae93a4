/*!
Window table - the single source of truth for window frames.

Every mutation returns the events it produced; the owning `WindowManager`
delivers them once the lock is released. Invariants kept here:
- at most one window has `is_focused == true`
- a focus grant always raises the window to the top of the stack
- stored bounds never change while a window is maximized
*/

use std::collections::HashMap;

use crate::config::WindowDefaults;
use crate::types::{Bounds, BoundsPatch, Event, IdCounter, WindowId, WindowState};

pub(crate) struct WindowTable {
  defaults: WindowDefaults,
  windows: HashMap<WindowId, WindowState>,
  ids: IdCounter,
  next_z_index: u32,
}

impl WindowTable {
  pub(crate) fn new(defaults: WindowDefaults) -> Self {
    Self {
      defaults,
      windows: HashMap::new(),
      ids: IdCounter::new(),
      next_z_index: defaults.initial_z_index,
    }
  }

  pub(crate) const fn defaults(&self) -> &WindowDefaults {
    &self.defaults
  }

  /// Default bounds for the next window: base position shifted diagonally by
  /// one cascade step per existing window.
  #[allow(clippy::cast_precision_loss)]
  fn cascade_bounds(&self) -> Bounds {
    let step = self.windows.len() as f64 * self.defaults.cascade_offset;
    Bounds::new(
      self.defaults.base_position.x + step,
      self.defaults.base_position.y + step,
      self.defaults.default_size.width,
      self.defaults.default_size.height,
    )
  }

  /// Hand out the next top-of-stack z-index.
  fn bump_z_index(&mut self) -> u32 {
    if self.next_z_index == u32::MAX {
      self.compact_z_indexes();
    }
    let z = self.next_z_index;
    self.next_z_index += 1;
    z
  }

  /// Renumber z-indexes from the initial value, preserving relative order.
  fn compact_z_indexes(&mut self) {
    let mut order: Vec<WindowId> = self.windows.keys().copied().collect();
    order.sort_by_key(|id| self.windows.get(id).map_or(0, |w| w.z_index));
    let mut z = self.defaults.initial_z_index;
    for id in order {
      if let Some(window) = self.windows.get_mut(&id) {
        window.z_index = z;
        z += 1;
      }
    }
    log::debug!("compacted window z-indexes, next is {z}");
    self.next_z_index = z;
  }

  /// Clear focus on every window except `keep`. Returns change events.
  fn unfocus_all_except(&mut self, keep: Option<WindowId>) -> Vec<Event> {
    self
      .windows
      .values_mut()
      .filter(|w| w.is_focused && Some(w.id) != keep)
      .map(|w| {
        w.is_focused = false;
        Event::WindowChanged { window: w.clone() }
      })
      .collect()
  }

  pub(crate) fn create(
    &mut self,
    app_id: &str,
    title: &str,
    bounds: Option<&BoundsPatch>,
  ) -> (WindowId, Vec<Event>) {
    let id: WindowId = self.ids.next();
    let bounds = match bounds {
      Some(patch) => self.cascade_bounds().merged(patch),
      None => self.cascade_bounds(),
    };

    let mut events = self.unfocus_all_except(None);
    let window = WindowState {
      id,
      title: title.to_string(),
      app_id: app_id.to_string(),
      bounds,
      is_minimized: false,
      is_maximized: false,
      is_focused: true,
      z_index: self.bump_z_index(),
    };
    log::debug!("window {id} created for {app_id} at z {}", window.z_index);
    self.windows.insert(id, window.clone());

    events.push(Event::WindowAdded { window });
    events.push(Event::FocusWindow {
      window_id: Some(id),
    });
    (id, events)
  }

  pub(crate) fn focus(&mut self, id: WindowId) -> Vec<Event> {
    if !self.windows.contains_key(&id) {
      return Vec::new();
    }

    let mut events = self.unfocus_all_except(Some(id));
    let z = self.bump_z_index();
    if let Some(window) = self.windows.get_mut(&id) {
      window.is_focused = true;
      window.z_index = z;
      events.push(Event::WindowChanged {
        window: window.clone(),
      });
    }
    events.push(Event::FocusWindow {
      window_id: Some(id),
    });
    events
  }

  pub(crate) fn minimize(&mut self, id: WindowId) -> Vec<Event> {
    let Some(window) = self.windows.get_mut(&id) else {
      return Vec::new();
    };

    let was_focused = window.is_focused;
    window.is_minimized = true;
    window.is_focused = false;

    let mut events = vec![Event::WindowChanged {
      window: window.clone(),
    }];
    if was_focused {
      events.push(Event::FocusWindow { window_id: None });
    }
    events
  }

  pub(crate) fn restore(&mut self, id: WindowId) -> Vec<Event> {
    let Some(window) = self.windows.get_mut(&id) else {
      return Vec::new();
    };
    window.is_minimized = false;
    self.focus(id)
  }

  pub(crate) fn toggle_maximize(&mut self, id: WindowId) -> Vec<Event> {
    let Some(window) = self.windows.get_mut(&id) else {
      return Vec::new();
    };
    window.is_maximized = !window.is_maximized;
    vec![Event::WindowChanged {
      window: window.clone(),
    }]
  }

  pub(crate) fn update_bounds(&mut self, id: WindowId, patch: &BoundsPatch) -> Vec<Event> {
    let Some(window) = self.windows.get_mut(&id) else {
      return Vec::new();
    };
    if window.is_maximized {
      log::debug!("ignoring bounds update for maximized window {id}");
      return Vec::new();
    }

    let merged = window.bounds.merged(patch);
    if merged == window.bounds {
      return Vec::new();
    }
    window.bounds = merged;
    vec![Event::WindowChanged {
      window: window.clone(),
    }]
  }

  pub(crate) fn update_title(&mut self, id: WindowId, title: &str) -> Vec<Event> {
    let Some(window) = self.windows.get_mut(&id) else {
      return Vec::new();
    };
    title.clone_into(&mut window.title);
    vec![Event::WindowChanged {
      window: window.clone(),
    }]
  }

  /// Remove a window. The highest remaining window gets focus without being
  /// re-raised.
  pub(crate) fn close(&mut self, id: WindowId) -> Vec<Event> {
    if self.windows.remove(&id).is_none() {
      return Vec::new();
    }
    log::debug!("window {id} closed");

    let mut events = vec![Event::WindowRemoved { window_id: id }];
    let top = self.windows.values().max_by_key(|w| w.z_index).map(|w| w.id);
    match top {
      Some(top_id) => {
        events.extend(self.unfocus_all_except(Some(top_id)));
        if let Some(window) = self.windows.get_mut(&top_id) {
          if !window.is_focused {
            window.is_focused = true;
            events.push(Event::WindowChanged {
              window: window.clone(),
            });
          }
        }
        events.push(Event::FocusWindow {
          window_id: Some(top_id),
        });
      }
      None => events.push(Event::FocusWindow { window_id: None }),
    }
    events
  }

  pub(crate) fn get(&self, id: WindowId) -> Option<&WindowState> {
    self.windows.get(&id)
  }

  /// All windows in paint order (ascending z-index).
  pub(crate) fn sorted(&self) -> Vec<WindowState> {
    let mut windows: Vec<WindowState> = self.windows.values().cloned().collect();
    windows.sort_by_key(|w| w.z_index);
    windows
  }

  pub(crate) fn focused(&self) -> Option<WindowId> {
    self.windows.values().find(|w| w.is_focused).map(|w| w.id)
  }

  pub(crate) fn len(&self) -> usize {
    self.windows.len()
  }
}
