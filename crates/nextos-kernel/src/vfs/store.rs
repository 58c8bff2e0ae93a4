/*!
Persistence seam for the VFS.

A store is a flat keyed collection of node records. It knows nothing about
paths or parents; the VFS keeps those invariants in memory and only asks the
store to persist records it has already validated.
*/

use std::fmt::Debug;

use async_trait::async_trait;

use crate::types::{FileSystemNode, KernelResult, NodeId};

/// Durable record store keyed by [`NodeId`].
#[async_trait]
pub trait NodeStore: Send + Sync + Debug {
  /// Open the store and return every persisted record.
  ///
  /// Called once per VFS session, before any write.
  async fn open(&self) -> KernelResult<Vec<FileSystemNode>>;

  /// Add a new record. Fails with `DuplicateKey` when the id is taken.
  async fn insert(&self, node: &FileSystemNode) -> KernelResult<()>;

  /// Insert or overwrite the record with `node.id`.
  async fn put(&self, node: &FileSystemNode) -> KernelResult<()>;

  /// Delete a record. Missing ids are not an error.
  async fn remove(&self, id: NodeId) -> KernelResult<()>;
}
