/*!
Kernel facade - owns the three services and the shared event stream.

# Module Structure

- `mod.rs` - Kernel struct, construction, app lifecycle, event stream
- `subscriptions.rs` - synchronous listener sets used by each manager

Both managers notify their own listeners in mutation order. The kernel registers
one listener on each and forwards every event into a bounded broadcast
channel, which is what remote observers consume.

# Example

```
use nextos_kernel::{Kernel, LaunchOptions};

# #[tokio::main(flavor = "current_thread")]
# async fn main() -> Result<(), nextos_kernel::KernelError> {
let kernel = Kernel::builder().build();
kernel.boot().await?;

let mut events = kernel.subscribe();
let (window, process) = kernel.launch_app("terminal", "Terminal", LaunchOptions::default());
assert_eq!(kernel.processes().get_process_by_window_id(window).map(|p| p.id), Some(process));

kernel.close_app(window);
assert!(kernel.windows().get_window(window).is_none());
assert!(events.try_recv().is_ok());
# Ok(())
# }
```
*/

mod subscriptions;

pub(crate) use subscriptions::Listeners;
pub use subscriptions::Subscription;

use async_broadcast::{InactiveReceiver, Sender};
use std::sync::Arc;

use crate::config::{KernelConfig, StorageConfig, WindowDefaults};
use crate::process_manager::ProcessManager;
use crate::types::{BoundsPatch, Event, KernelResult, ProcessId, Snapshot, WindowId};
use crate::vfs::Vfs;
use crate::window_manager::WindowManager;

/// How an application window is opened.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LaunchOptions {
  /// Overrides for the cascaded default bounds.
  pub bounds: Option<BoundsPatch>,
  /// Open maximized (used on narrow screens).
  pub maximized: bool,
}

/// The kernel: window manager, process manager and file system behind one handle.
///
/// Clone is cheap (Arc bumps) - share freely across tasks.
#[derive(Clone)]
pub struct Kernel {
  windows: WindowManager,
  processes: ProcessManager,
  vfs: Vfs,
  events_tx: Sender<Event>,
  events_keepalive: InactiveReceiver<Event>,
  _forwarders: Arc<[Subscription; 2]>,
}

impl std::fmt::Debug for Kernel {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Kernel")
      .field("windows", &self.windows)
      .field("processes", &self.processes)
      .field("vfs", &self.vfs)
      .finish_non_exhaustive()
  }
}

impl Default for Kernel {
  fn default() -> Self {
    Self::new(KernelConfig::default())
  }
}

/// Builder for configuring a Kernel.
///
/// # Example
///
/// ```
/// use nextos_kernel::{Kernel, StorageConfig};
///
/// let kernel = Kernel::builder()
///     .event_channel_capacity(64)
///     .storage(StorageConfig::Memory)
///     .build();
/// # let _ = kernel;
/// ```
#[derive(Debug, Default, Clone)]
#[must_use = "Builder does nothing until .build() is called"]
pub struct KernelBuilder {
  config: KernelConfig,
}

impl KernelBuilder {
  /// Capacity of the event channel. Oldest events are dropped when full. Default: 1000.
  pub const fn event_channel_capacity(mut self, capacity: usize) -> Self {
    self.config.event_channel_capacity = capacity;
    self
  }

  /// Window placement and sizing policy.
  pub const fn window_defaults(mut self, defaults: WindowDefaults) -> Self {
    self.config.window = defaults;
    self
  }

  /// Backing store for the file system. Default: in memory.
  pub fn storage(mut self, storage: StorageConfig) -> Self {
    self.config.storage = storage;
    self
  }

  /// Assemble the kernel. The VFS opens lazily or on `boot`.
  pub fn build(self) -> Kernel {
    Kernel::new(self.config)
  }
}

impl Kernel {
  /// Create a kernel from a config. The file system is opened lazily; see [`Kernel::boot`].
  pub fn new(config: KernelConfig) -> Self {
    let (mut tx, rx) = async_broadcast::broadcast(config.event_channel_capacity.max(1));
    tx.set_overflow(true); // Drop oldest messages when full

    let windows = WindowManager::new(config.window);
    let processes = ProcessManager::new();
    let vfs = Vfs::from_config(&config.storage);

    let forwarders = [
      windows.subscribe(forward_to(tx.clone())),
      processes.subscribe(forward_to(tx.clone())),
    ];

    Self {
      windows,
      processes,
      vfs,
      events_tx: tx,
      events_keepalive: rx.deactivate(),
      _forwarders: Arc::new(forwarders),
    }
  }

  pub fn builder() -> KernelBuilder {
    KernelBuilder::default()
  }

  /// Open the file system and create any missing default directories.
  pub async fn boot(&self) -> KernelResult<()> {
    self.vfs.init().await?;
    self.vfs.initialize_default_structure().await?;
    log::info!("kernel booted");
    Ok(())
  }

  pub const fn windows(&self) -> &WindowManager {
    &self.windows
  }

  pub const fn processes(&self) -> &ProcessManager {
    &self.processes
  }

  pub const fn vfs(&self) -> &Vfs {
    &self.vfs
  }

  /// Subscribe to window and process events.
  ///
  /// Events emitted before this call are not replayed; start from [`Kernel::snapshot`].
  pub fn subscribe(&self) -> async_broadcast::Receiver<Event> {
    self.events_keepalive.activate_cloned()
  }

  /// Number of active event receivers.
  pub fn receiver_count(&self) -> usize {
    self.events_tx.receiver_count()
  }

  /// Current window and process state.
  pub fn snapshot(&self) -> Snapshot {
    Snapshot {
      windows: self.windows.get_all_windows(),
      processes: self.processes.get_all_processes(),
      focused_window: self.windows.focused_window(),
    }
  }

  /// Open a window for `app_id` and start a process bound to it.
  pub fn launch_app(&self, app_id: &str, name: &str, options: LaunchOptions) -> (WindowId, ProcessId) {
    let window_id = self.windows.create_window(app_id, name, options.bounds);
    let process_id = self.processes.create_process(name, app_id, Some(window_id));
    if options.maximized {
      self.windows.maximize_window(window_id);
    }
    log::debug!("launched {app_id} as process {process_id} in window {window_id}");
    (window_id, process_id)
  }

  /// Terminate the process bound to a window (if any), then close the window.
  pub fn close_app(&self, window_id: WindowId) {
    if let Some(process) = self.processes.get_process_by_window_id(window_id) {
      self.processes.terminate_process(process.id);
    }
    self.windows.close_window(window_id);
  }
}

fn forward_to(tx: Sender<Event>) -> impl Fn(&Event) + Send + Sync + 'static {
  move |event| {
    if let Err(e) = tx.try_broadcast(event.clone()) {
      if e.is_full() {
        log::error!(
          "Event channel overflow - events are being dropped. \
           Consider increasing event_channel_capacity or processing events faster."
        );
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::ProcessStatus;

  fn drain(rx: &mut async_broadcast::Receiver<Event>) -> Vec<Event> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
  }

  #[test]
  fn launch_binds_process_to_window() {
    let kernel = Kernel::default();
    let (window, process) = kernel.launch_app("editor", "Text Editor", LaunchOptions::default());

    let p = kernel.processes().get_process(process).unwrap();
    assert_eq!(p.window_id, Some(window));
    assert_eq!(p.status, ProcessStatus::Running);
    assert_eq!(kernel.windows().focused_window(), Some(window));
  }

  #[test]
  fn launch_maximized() {
    let kernel = Kernel::default();
    let options = LaunchOptions {
      maximized: true,
      ..LaunchOptions::default()
    };
    let (window, _) = kernel.launch_app("files", "Files", options);
    assert!(kernel.windows().get_window(window).unwrap().is_maximized);
  }

  #[test]
  fn close_app_removes_both() {
    let kernel = Kernel::default();
    let (window, process) = kernel.launch_app("terminal", "Terminal", LaunchOptions::default());
    kernel.close_app(window);

    assert!(kernel.processes().get_process(process).is_none());
    assert!(kernel.windows().get_window(window).is_none());
    assert_eq!(kernel.snapshot().processes, vec![]);
  }

  #[test]
  fn events_are_forwarded_in_order() {
    let kernel = Kernel::default();
    let mut rx = kernel.subscribe();
    let (window, process) = kernel.launch_app("terminal", "Terminal", LaunchOptions::default());

    let events = drain(&mut rx);
    assert!(matches!(events.first(), Some(Event::WindowAdded { window: w }) if w.id == window));
    assert!(events
      .iter()
      .any(|e| matches!(e, Event::ProcessAdded { process: p } if p.id == process)));

    kernel.close_app(window);
    let events = drain(&mut rx);
    assert!(matches!(events.first(), Some(Event::ProcessRemoved { process_id }) if *process_id == process));
    assert!(events
      .iter()
      .any(|e| matches!(e, Event::WindowRemoved { window_id } if *window_id == window)));
  }

  #[test]
  fn overflow_drops_oldest() {
    let kernel = Kernel::builder().event_channel_capacity(2).build();
    let mut rx = kernel.subscribe();
    for i in 0..5 {
      kernel.windows().create_window("app", &format!("w{i}"), None);
    }
    assert_eq!(drain(&mut rx).len(), 2);
  }

  #[test]
  fn clones_share_state() {
    let kernel = Kernel::default();
    let other = kernel.clone();
    other.launch_app("a", "A", LaunchOptions::default());
    assert_eq!(kernel.snapshot().windows.len(), 1);
    assert_eq!(kernel.snapshot(), other.snapshot());
  }

  #[tokio::test]
  async fn boot_is_idempotent() {
    let kernel = Kernel::default();
    kernel.boot().await.unwrap();
    kernel.boot().await.unwrap();
    let root = kernel.vfs().read_node_by_path("/").await.unwrap().unwrap();
    assert!(root.is_root());
  }
}
