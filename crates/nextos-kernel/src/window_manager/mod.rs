/*!
Window Manager - sole authority over window existence, geometry, stacking
and focus.

Commands never fail: unknown ids are ignored. Every command that changes
state notifies subscribers after the change is applied.

# Example

```
use nextos_kernel::{WindowManager, WindowDefaults};

let wm = WindowManager::new(WindowDefaults::default());
let a = wm.create_window("terminal", "Terminal", None);
let b = wm.create_window("editor", "Text Editor", None);

wm.focus_window(a);
let windows = wm.get_all_windows();
assert_eq!(windows.last().map(|w| w.id), Some(a));
assert_eq!(wm.focused_window(), Some(a));
# let _ = b;
```
*/

pub mod interaction;
mod table;

use parking_lot::Mutex;
use std::sync::Arc;

use crate::config::WindowDefaults;
use crate::core::{Listeners, Subscription};
use crate::types::{BoundsPatch, Event, WindowId, WindowState};
use table::WindowTable;

/// Registry of on-screen windows. Clone is cheap (Arc bumps).
#[derive(Clone)]
pub struct WindowManager {
  table: Arc<Mutex<WindowTable>>,
  listeners: Listeners,
}

impl std::fmt::Debug for WindowManager {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("WindowManager")
      .field("windows", &self.window_count())
      .finish_non_exhaustive()
  }
}

impl Default for WindowManager {
  fn default() -> Self {
    Self::new(WindowDefaults::default())
  }
}

impl WindowManager {
  pub fn new(defaults: WindowDefaults) -> Self {
    Self {
      table: Arc::new(Mutex::new(WindowTable::new(defaults))),
      listeners: Listeners::new(),
    }
  }

  /// Register an observer, called once per event after each state change.
  pub fn subscribe(&self, callback: impl Fn(&Event) + Send + Sync + 'static) -> Subscription {
    self.listeners.subscribe(callback)
  }

  /// Read state under the lock.
  #[inline]
  fn read<R>(&self, f: impl FnOnce(&WindowTable) -> R) -> R {
    f(&self.table.lock())
  }

  /// Mutate state and queue its events under the lock, then deliver with the
  /// lock released.
  fn write<R>(&self, f: impl FnOnce(&mut WindowTable) -> (R, Vec<Event>)) -> R {
    let result = {
      let mut table = self.table.lock();
      let (result, events) = f(&mut table);
      self.listeners.enqueue(events);
      result
    };
    self.listeners.flush();
    result
  }

  /// Open a window with cascading default bounds, focused and on top.
  ///
  /// Any field set in `bounds` replaces the corresponding default.
  pub fn create_window(&self, app_id: &str, title: &str, bounds: Option<BoundsPatch>) -> WindowId {
    self.write(|t| t.create(app_id, title, bounds.as_ref()))
  }

  /// Focus a window and raise it to the top of the stack.
  pub fn focus_window(&self, id: WindowId) {
    self.write(|t| ((), t.focus(id)));
  }

  /// Hide a window and drop its focus. Stacking order is preserved.
  pub fn minimize_window(&self, id: WindowId) {
    self.write(|t| ((), t.minimize(id)));
  }

  /// Un-minimize a window, then focus and raise it.
  pub fn restore_window(&self, id: WindowId) {
    self.write(|t| ((), t.restore(id)));
  }

  /// Toggle the maximized flag. Stored bounds are kept for when it is toggled back.
  pub fn maximize_window(&self, id: WindowId) {
    self.write(|t| ((), t.toggle_maximize(id)));
  }

  /// Merge partial bounds into a window's stored bounds.
  ///
  /// Ignored while the window is maximized. No clamping happens here; see
  /// [`interaction`] for gesture handling with minimum sizes.
  pub fn update_window_bounds(&self, id: WindowId, bounds: BoundsPatch) {
    self.write(|t| ((), t.update_bounds(id, &bounds)));
  }

  /// Set a window's title. Unknown ids are ignored.
  pub fn update_window_title(&self, id: WindowId, title: &str) {
    self.write(|t| ((), t.update_title(id, title)));
  }

  /// Remove a window. The highest remaining window receives focus.
  pub fn close_window(&self, id: WindowId) {
    self.write(|t| ((), t.close(id)));
  }

  /// Current state of a window.
  pub fn get_window(&self, id: WindowId) -> Option<WindowState> {
    self.read(|t| t.get(id).cloned())
  }

  /// All windows sorted ascending by z-index (back-to-front paint order).
  pub fn get_all_windows(&self) -> Vec<WindowState> {
    self.read(WindowTable::sorted)
  }

  pub fn focused_window(&self) -> Option<WindowId> {
    self.read(WindowTable::focused)
  }

  pub fn window_count(&self) -> usize {
    self.read(WindowTable::len)
  }

  pub fn defaults(&self) -> WindowDefaults {
    self.read(|t| *t.defaults())
  }
}
