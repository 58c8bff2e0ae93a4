/*!
Configuration for the NextOS kernel.

All values have sensible defaults. Create a custom config to override:

```
use nextos_kernel::{KernelConfig, StorageConfig};

let config = KernelConfig {
    event_channel_capacity: 2000,
    storage: StorageConfig::JsonDir("/tmp/nextos".into()),
    ..Default::default()
};
assert_eq!(config.window.default_size.width, 800.0);
```
*/

use crate::types::{Point, Size};
use std::path::PathBuf;

/// Kernel configuration.
#[derive(Debug, Clone)]
pub struct KernelConfig {
  /// Capacity of the event broadcast channel.
  /// Default: 1000 events.
  pub event_channel_capacity: usize,

  /// Window placement and sizing policy.
  pub window: WindowDefaults,

  /// Where the virtual file system keeps its records.
  /// Default: in memory (nothing survives a restart).
  pub storage: StorageConfig,
}

impl Default for KernelConfig {
  fn default() -> Self {
    Self {
      event_channel_capacity: 1000,
      window: WindowDefaults::default(),
      storage: StorageConfig::Memory,
    }
  }
}

impl KernelConfig {
  /// Create a new config with default values.
  pub fn new() -> Self {
    Self::default()
  }
}

/// Window placement and sizing policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowDefaults {
  /// Position of the first window. Default: (100, 100).
  pub base_position: Point,
  /// Diagonal offset applied per existing window. Default: 30.
  pub cascade_offset: f64,
  /// Size of a new window. Default: 800x600.
  pub default_size: Size,
  /// Smallest size a resize gesture may produce. Default: 400x300.
  pub min_size: Size,
  /// Height reserved for the taskbar below maximized windows. Default: 48.
  pub taskbar_height: f64,
  /// First z-index handed out. Default: 1000.
  pub initial_z_index: u32,
}

impl Default for WindowDefaults {
  fn default() -> Self {
    Self {
      base_position: Point::new(100.0, 100.0),
      cascade_offset: 30.0,
      default_size: Size::new(800.0, 600.0),
      min_size: Size::new(400.0, 300.0),
      taskbar_height: 48.0,
      initial_z_index: 1000,
    }
  }
}

/// Backing store for the virtual file system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
  /// Ephemeral, process-lifetime store.
  Memory,
  /// One JSON record per node in this directory.
  JsonDir(PathBuf),
}
