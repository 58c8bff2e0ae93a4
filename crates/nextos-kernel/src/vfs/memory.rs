/*!
In-memory node store.

Nothing survives the process. Used for tests and for `StorageConfig::Memory`.
*/

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::store::NodeStore;
use crate::types::{FileSystemNode, KernelError, KernelResult, NodeId};

/// Node store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
  records: Mutex<HashMap<NodeId, FileSystemNode>>,
  unavailable: AtomicBool,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Seed the store with records, as if persisted by an earlier session.
  pub fn with_records(records: impl IntoIterator<Item = FileSystemNode>) -> Self {
    let store = Self::new();
    store
      .records
      .lock()
      .extend(records.into_iter().map(|n| (n.id, n)));
    store
  }

  /// Make every subsequent call fail with a storage error (or stop doing so).
  pub fn set_unavailable(&self, unavailable: bool) {
    self.unavailable.store(unavailable, Ordering::SeqCst);
  }

  /// Number of persisted records.
  pub fn len(&self) -> usize {
    self.records.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.lock().is_empty()
  }

  fn check_available(&self) -> KernelResult<()> {
    if self.unavailable.load(Ordering::SeqCst) {
      Err(KernelError::Storage("store unavailable".into()))
    } else {
      Ok(())
    }
  }
}

#[async_trait]
impl NodeStore for MemoryStore {
  async fn open(&self) -> KernelResult<Vec<FileSystemNode>> {
    self.check_available()?;
    Ok(self.records.lock().values().cloned().collect())
  }

  async fn insert(&self, node: &FileSystemNode) -> KernelResult<()> {
    self.check_available()?;
    let mut records = self.records.lock();
    if records.contains_key(&node.id) {
      return Err(KernelError::duplicate(node.id));
    }
    records.insert(node.id, node.clone());
    Ok(())
  }

  async fn put(&self, node: &FileSystemNode) -> KernelResult<()> {
    self.check_available()?;
    self.records.lock().insert(node.id, node.clone());
    Ok(())
  }

  async fn remove(&self, id: NodeId) -> KernelResult<()> {
    self.check_available()?;
    self.records.lock().remove(&id);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn insert_rejects_existing_id() {
    let store = MemoryStore::new();
    let node = FileSystemNode::directory("/", None);
    store.insert(&node).await.unwrap();
    assert!(matches!(
      store.insert(&node).await,
      Err(KernelError::DuplicateKey { .. })
    ));
    store.put(&node).await.unwrap();
    assert_eq!(store.len(), 1);
  }

  #[tokio::test]
  async fn unavailable_store_fails_every_call() {
    let store = MemoryStore::new();
    store.set_unavailable(true);
    assert!(store.open().await.unwrap_err().is_transient());
    store.set_unavailable(false);
    assert!(store.open().await.unwrap().is_empty());
  }
}
