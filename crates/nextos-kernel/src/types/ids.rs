/*! Branded ID types for type-safe entity references. */

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Window identifier.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS, Display,
  From, Into,
)]
#[ts(export)]
pub struct WindowId(pub u32);

/// Process identifier.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS, Display,
  From, Into,
)]
#[ts(export)]
pub struct ProcessId(pub u32);

/// File system node identifier. Persisted, so it is a random UUID rather than a counter.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS, Display,
  From, Into,
)]
#[ts(export)]
pub struct NodeId(pub Uuid);

impl NodeId {
  /// Generate a new random `NodeId`.
  pub fn new() -> Self {
    Self(Uuid::new_v4())
  }
}

impl Default for NodeId {
  fn default() -> Self {
    Self::new()
  }
}

/// Monotonic id allocator. Starts at 1 (0 could be confused with "null").
#[derive(Debug)]
pub(crate) struct IdCounter(u32);

impl IdCounter {
  pub(crate) const fn new() -> Self {
    Self(1)
  }

  pub(crate) fn next<T: From<u32>>(&mut self) -> T {
    let id = self.0;
    self.0 = self.0.wrapping_add(1).max(1);
    T::from(id)
  }
}
