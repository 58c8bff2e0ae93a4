/*! Core types for the NextOS kernel.

Regenerate TypeScript types for the UI: `cargo test -p nextos-kernel export_bindings`
*/

#![allow(missing_docs)]

mod error;
mod event;
mod geometry;
mod ids;
mod node;
mod process;
mod window;

pub use error::{KernelError, KernelResult};
pub use event::{Event, Snapshot};
pub use geometry::{Bounds, BoundsPatch, Point, Size, Viewport};
pub(crate) use ids::IdCounter;
pub use ids::{NodeId, ProcessId, WindowId};
pub use node::{FileSystemNode, NodeKind};
pub use process::{Process, ProcessStatus, ProcessUpdate};
pub use window::WindowState;
