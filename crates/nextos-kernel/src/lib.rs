/*!
NextOS kernel - window management, process tracking and a persistent
virtual file system for a desktop that runs in a browser tab.

```
use nextos_kernel::{Kernel, LaunchOptions, StorageConfig};

# #[tokio::main(flavor = "current_thread")]
# async fn main() -> Result<(), nextos_kernel::KernelError> {
// Create the kernel and lay out the default directories
let kernel = Kernel::builder().storage(StorageConfig::Memory).build();
kernel.boot().await?;

// Launch an app: one window, one process bound to it
let (window, _process) = kernel.launch_app("terminal", "Terminal", LaunchOptions::default());
assert_eq!(kernel.windows().focused_window(), Some(window));

// Read the file system
let welcome = kernel.vfs().read_node_by_path("/home/welcome.txt").await?;
assert!(welcome.is_some());

// Subscribe to window and process events
let mut events = kernel.subscribe();
kernel.close_app(window);
assert!(events.try_recv().is_ok());
# Ok(())
# }
```
*/

mod config;
mod core;
mod process_manager;
mod types;

pub mod vfs;
pub mod window_manager;

pub use types::*;

pub use crate::config::{KernelConfig, StorageConfig, WindowDefaults};
pub use crate::core::{Kernel, KernelBuilder, LaunchOptions, Subscription};
pub use crate::process_manager::ProcessManager;
pub use crate::vfs::{JsonDirStore, MemoryStore, NodeStore, Vfs};
pub use crate::window_manager::WindowManager;
