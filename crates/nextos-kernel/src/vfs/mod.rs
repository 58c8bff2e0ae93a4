/*!
Virtual File System - durable hierarchical storage of files and directories.

Records live in a [`NodeStore`]; an in-memory [`NodeTable`](table) mirrors
them with a unique path index and a parent index. The store is opened lazily
by the first call (or explicitly by [`Vfs::init`]), exactly once even under
concurrent callers.

Every write validates against the mirror, persists to the store, and only
then updates the mirror, all under one lock. A failed store write leaves the
mirror untouched.

# Example

```
use nextos_kernel::Vfs;

# #[tokio::main(flavor = "current_thread")]
# async fn main() -> Result<(), nextos_kernel::KernelError> {
let vfs = Vfs::in_memory();
vfs.initialize_default_structure().await?;

let home = vfs.read_node_by_path("/home").await?.expect("bootstrapped");
let note = vfs.create_file("/home/a.txt", "hi", Some(home.id)).await?;
assert_eq!(note.size, 2);
# Ok(())
# }
```
*/

mod bootstrap;
mod json;
mod memory;
pub mod path;
mod store;
mod table;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard, OnceCell};

use crate::config::StorageConfig;
use crate::types::{FileSystemNode, KernelError, KernelResult, NodeId};
pub use bootstrap::{DEFAULT_DIRECTORIES, WELCOME_PATH, WELCOME_TEXT};
pub use json::JsonDirStore;
pub use memory::MemoryStore;
pub use path::resolve;
pub use store::NodeStore;
use table::NodeTable;

struct Inner {
  store: Arc<dyn NodeStore>,
  table: OnceCell<Mutex<NodeTable>>,
}

/// Handle to the file system. Clone is cheap (Arc bump).
#[derive(Clone)]
pub struct Vfs {
  inner: Arc<Inner>,
}

impl std::fmt::Debug for Vfs {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Vfs")
      .field("store", &self.inner.store)
      .field("initialized", &self.is_initialized())
      .finish()
  }
}

impl Vfs {
  /// VFS over `store`. Nothing is loaded until the first call.
  pub fn new(store: Arc<dyn NodeStore>) -> Self {
    Self {
      inner: Arc::new(Inner {
        store,
        table: OnceCell::new(),
      }),
    }
  }

  /// File system that forgets everything when dropped.
  pub fn in_memory() -> Self {
    Self::new(Arc::new(MemoryStore::new()))
  }

  /// File system persisted as JSON records under `dir`.
  pub fn json_dir(dir: impl Into<PathBuf>) -> Self {
    Self::new(Arc::new(JsonDirStore::new(dir)))
  }

  pub fn from_config(storage: &StorageConfig) -> Self {
    match storage {
      StorageConfig::Memory => Self::in_memory(),
      StorageConfig::JsonDir(dir) => Self::json_dir(dir.clone()),
    }
  }

  /// Open the backing store and load its records.
  ///
  /// Idempotent. Concurrent callers wait for a single open. A failed open is
  /// not cached; the next call tries again.
  pub async fn init(&self) -> KernelResult<()> {
    self.table().await.map(|_| ())
  }

  pub fn is_initialized(&self) -> bool {
    self.inner.table.initialized()
  }

  async fn table(&self) -> KernelResult<&Mutex<NodeTable>> {
    self
      .inner
      .table
      .get_or_try_init(|| async {
        let records = self.inner.store.open().await.inspect_err(|e| {
          log::error!("failed to open file system store: {e}");
        })?;
        let table = NodeTable::from_records(records);
        log::debug!("file system opened with {} nodes", table.len());
        Ok(Mutex::new(table))
      })
      .await
  }

  async fn lock(&self) -> KernelResult<MutexGuard<'_, NodeTable>> {
    Ok(self.table().await?.lock().await)
  }

  /// Validate, persist, then mirror a new record.
  async fn insert_locked(
    &self,
    table: &mut NodeTable,
    mut node: FileSystemNode,
  ) -> KernelResult<FileSystemNode> {
    node.normalize();
    table.check_insert(&node)?;
    self.inner.store.insert(&node).await.inspect_err(|e| {
      log::error!("failed to persist {}: {e}", node.path);
    })?;
    table.insert(node.clone());
    Ok(node)
  }

  /// Resolve the parent id for a new node at `path`.
  fn parent_for(
    table: &NodeTable,
    path: &str,
    parent_id: Option<NodeId>,
  ) -> KernelResult<Option<NodeId>> {
    if parent_id.is_some() {
      return Ok(parent_id);
    }
    match path::parent_of(path) {
      None => Ok(None),
      Some(dir) => table
        .get_by_path(dir)
        .map(|p| Some(p.id))
        .ok_or_else(|| KernelError::ParentNotFound {
          path: path.to_string(),
        }),
    }
  }

  // ---------------------------------------------------------------------------
  // Records
  // ---------------------------------------------------------------------------

  /// Insert a new record.
  ///
  /// Fails with `DuplicateKey` when the id or path is taken, and with
  /// `ParentNotFound`/`NotADirectory`/`InvalidPath` when the record does not
  /// fit the tree. Returns the record as stored.
  pub async fn create_node(&self, node: FileSystemNode) -> KernelResult<FileSystemNode> {
    let mut table = self.lock().await?;
    self.insert_locked(&mut table, node).await
  }

  /// Node with `id`, if any.
  pub async fn read_node(&self, id: NodeId) -> KernelResult<Option<FileSystemNode>> {
    Ok(self.lock().await?.get(id).cloned())
  }

  /// Node at the canonical `path`, if any.
  pub async fn read_node_by_path(&self, path: &str) -> KernelResult<Option<FileSystemNode>> {
    Ok(self.lock().await?.get_by_path(path).cloned())
  }

  /// Overwrite the record with `node.id`, or insert it when absent.
  ///
  /// Path and parent of an existing record cannot change.
  pub async fn update_node(&self, mut node: FileSystemNode) -> KernelResult<FileSystemNode> {
    node.normalize();
    let mut table = self.lock().await?;
    table.check_replace(&node)?;
    self.inner.store.put(&node).await.inspect_err(|e| {
      log::error!("failed to persist {}: {e}", node.path);
    })?;
    table.insert(node.clone());
    Ok(node)
  }

  /// Remove one record. Directories must be empty; see [`Vfs::delete_tree`].
  ///
  /// Returns the removed record, or `None` if the id was unknown.
  pub async fn delete_node(&self, id: NodeId) -> KernelResult<Option<FileSystemNode>> {
    let mut table = self.lock().await?;
    let Some(node) = table.get(id) else {
      return Ok(None);
    };
    if table.has_children(id) {
      return Err(KernelError::DirectoryNotEmpty {
        path: node.path.clone(),
      });
    }
    self.inner.store.remove(id).await?;
    Ok(table.remove(id))
  }

  /// Remove a node and everything below it, deepest first.
  ///
  /// Returns the number of records removed. On a storage failure the records
  /// already removed stay removed; no child is ever left without its parent.
  pub async fn delete_tree(&self, id: NodeId) -> KernelResult<usize> {
    let mut table = self.lock().await?;
    let order = table.subtree_post_order(id);
    for node_id in &order {
      self.inner.store.remove(*node_id).await?;
      table.remove(*node_id);
    }
    if let Some(top) = order.last() {
      log::debug!("deleted {} nodes under {top}", order.len());
    }
    Ok(order.len())
  }

  /// Every node whose `parent_id` is `parent_id`, in no particular order.
  pub async fn list_children(&self, parent_id: NodeId) -> KernelResult<Vec<FileSystemNode>> {
    Ok(self.lock().await?.children(parent_id))
  }

  /// Children ordered for display: directories first, then by name.
  pub async fn list_children_sorted(&self, parent_id: NodeId) -> KernelResult<Vec<FileSystemNode>> {
    let mut children = self.list_children(parent_id).await?;
    children.sort_by(|a, b| b.is_dir().cmp(&a.is_dir()).then_with(|| a.name.cmp(&b.name)));
    Ok(children)
  }

  // ---------------------------------------------------------------------------
  // Helpers
  // ---------------------------------------------------------------------------

  /// Create a directory. Without `parent_id` the parent is looked up from the path.
  pub async fn create_directory(
    &self,
    path: &str,
    parent_id: Option<NodeId>,
  ) -> KernelResult<FileSystemNode> {
    let mut table = self.lock().await?;
    let parent_id = Self::parent_for(&table, path, parent_id)?;
    self
      .insert_locked(&mut table, FileSystemNode::directory(path, parent_id))
      .await
  }

  /// Create a file. Without `parent_id` the parent is looked up from the path.
  pub async fn create_file(
    &self,
    path: &str,
    content: &str,
    parent_id: Option<NodeId>,
  ) -> KernelResult<FileSystemNode> {
    let mut table = self.lock().await?;
    let parent_id = Self::parent_for(&table, path, parent_id)?;
    self
      .insert_locked(&mut table, FileSystemNode::file(path, content, parent_id))
      .await
  }

  /// Replace a file's content. `None` if the id is unknown.
  pub async fn write_file(&self, id: NodeId, content: &str) -> KernelResult<Option<FileSystemNode>> {
    let mut table = self.lock().await?;
    let Some(mut node) = table.get(id).cloned() else {
      return Ok(None);
    };
    if !node.is_file() {
      return Err(KernelError::NotSupported(format!(
        "writing content to directory {}",
        node.path
      )));
    }
    node.set_content(content);
    self.inner.store.put(&node).await?;
    table.insert(node.clone());
    Ok(Some(node))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::NodeKind;

  async fn with_root() -> (Vfs, FileSystemNode) {
    let vfs = Vfs::in_memory();
    let root = vfs.create_directory("/", None).await.unwrap();
    (vfs, root)
  }

  #[tokio::test]
  async fn home_scenario() {
    let (vfs, root) = with_root().await;
    let home = vfs.create_directory("/home", Some(root.id)).await.unwrap();
    vfs.create_file("/home/a.txt", "hi", Some(home.id)).await.unwrap();

    let children = vfs.list_children(home.id).await.unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].name, "a.txt");
    assert_eq!(children[0].size, 2);
  }

  #[tokio::test]
  async fn colliding_path_is_rejected() {
    let (vfs, root) = with_root().await;
    vfs.create_directory("/home", Some(root.id)).await.unwrap();
    let err = vfs.create_file("/home", "", Some(root.id)).await.unwrap_err();
    assert!(matches!(err, KernelError::DuplicateKey { .. }));
  }

  #[tokio::test]
  async fn create_node_rejects_taken_id() {
    let (vfs, root) = with_root().await;
    let mut node = FileSystemNode::directory("/other", Some(root.id));
    node.id = root.id;
    assert!(matches!(
      vfs.create_node(node).await,
      Err(KernelError::DuplicateKey { .. })
    ));
  }

  #[tokio::test]
  async fn missing_lookups_are_none() {
    let (vfs, _) = with_root().await;
    assert_eq!(vfs.read_node(NodeId::new()).await.unwrap(), None);
    assert_eq!(vfs.read_node_by_path("/nope").await.unwrap(), None);
  }

  #[tokio::test]
  async fn parent_resolved_from_path() {
    let (vfs, root) = with_root().await;
    let home = vfs.create_directory("/home", None).await.unwrap();
    assert_eq!(home.parent_id, Some(root.id));
    let err = vfs.create_file("/missing/a.txt", "", None).await.unwrap_err();
    assert!(matches!(err, KernelError::ParentNotFound { .. }));
  }

  #[tokio::test]
  async fn update_node_overwrites() {
    let (vfs, root) = with_root().await;
    let mut file = vfs.create_file("/a.txt", "one", Some(root.id)).await.unwrap();
    file.content = Some("three".into());
    let stored = vfs.update_node(file.clone()).await.unwrap();
    assert_eq!(stored.size, 5);
    assert_eq!(vfs.read_node(file.id).await.unwrap(), Some(stored));
  }

  #[tokio::test]
  async fn stored_name_follows_path() {
    let (vfs, root) = with_root().await;

    let mut node = FileSystemNode::file("/b.txt", "", Some(root.id));
    node.name = "zzz".into();
    let created = vfs.create_node(node).await.unwrap();
    assert_eq!(created.name, "b.txt");

    let mut file = vfs.create_file("/a.txt", "", Some(root.id)).await.unwrap();
    file.name = "totally-different.md".into();
    let updated = vfs.update_node(file.clone()).await.unwrap();
    assert_eq!(updated.name, "a.txt");
    let stored = vfs.read_node(file.id).await.unwrap().unwrap();
    assert_eq!(stored.name, "a.txt");
  }

  #[tokio::test]
  async fn write_file_bumps_modified() {
    let (vfs, root) = with_root().await;
    let file = vfs.create_file("/a.txt", "", Some(root.id)).await.unwrap();
    let written = vfs.write_file(file.id, "data").await.unwrap().unwrap();
    assert_eq!(written.size, 4);
    assert!(written.modified_at >= written.created_at);
    assert!(vfs.write_file(root.id, "x").await.is_err());
    assert_eq!(vfs.write_file(NodeId::new(), "x").await.unwrap(), None);
  }

  #[tokio::test]
  async fn delete_refuses_non_empty_directory() {
    let (vfs, root) = with_root().await;
    let home = vfs.create_directory("/home", Some(root.id)).await.unwrap();
    let file = vfs.create_file("/home/a.txt", "", Some(home.id)).await.unwrap();

    let err = vfs.delete_node(home.id).await.unwrap_err();
    assert!(matches!(err, KernelError::DirectoryNotEmpty { .. }));

    assert_eq!(vfs.delete_node(file.id).await.unwrap().map(|n| n.id), Some(file.id));
    assert!(vfs.delete_node(home.id).await.unwrap().is_some());
    assert!(vfs.list_children(root.id).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn delete_tree_removes_descendants() {
    let (vfs, root) = with_root().await;
    let home = vfs.create_directory("/home", Some(root.id)).await.unwrap();
    let docs = vfs.create_directory("/home/docs", Some(home.id)).await.unwrap();
    vfs.create_file("/home/docs/n.txt", "", Some(docs.id)).await.unwrap();

    assert_eq!(vfs.delete_tree(home.id).await.unwrap(), 3);
    assert_eq!(vfs.read_node_by_path("/home/docs/n.txt").await.unwrap(), None);
    assert!(vfs.read_node(root.id).await.unwrap().is_some());
    assert_eq!(vfs.delete_tree(home.id).await.unwrap(), 0);
  }

  #[tokio::test]
  async fn sorted_listing_puts_directories_first() {
    let (vfs, root) = with_root().await;
    vfs.create_file("/a.txt", "", Some(root.id)).await.unwrap();
    vfs.create_directory("/zeta", Some(root.id)).await.unwrap();
    vfs.create_directory("/beta", Some(root.id)).await.unwrap();

    let names: Vec<_> = vfs
      .list_children_sorted(root.id)
      .await
      .unwrap()
      .into_iter()
      .map(|n| (n.kind, n.name))
      .collect();
    assert_eq!(
      names,
      vec![
        (NodeKind::Directory, "beta".to_string()),
        (NodeKind::Directory, "zeta".to_string()),
        (NodeKind::File, "a.txt".to_string()),
      ]
    );
  }

  #[tokio::test]
  async fn failed_open_is_retried() {
    let store = Arc::new(MemoryStore::new());
    let vfs = Vfs::new(store.clone());
    store.set_unavailable(true);
    assert!(matches!(vfs.init().await, Err(KernelError::Storage(_))));
    assert!(!vfs.is_initialized());

    store.set_unavailable(false);
    vfs.init().await.unwrap();
    assert!(vfs.is_initialized());
  }

  #[tokio::test]
  async fn failed_write_leaves_tree_unchanged() {
    let store = Arc::new(MemoryStore::new());
    let vfs = Vfs::new(store.clone());
    let root = vfs.create_directory("/", None).await.unwrap();

    store.set_unavailable(true);
    let err = vfs.create_directory("/home", Some(root.id)).await.unwrap_err();
    assert!(err.is_transient());

    store.set_unavailable(false);
    assert_eq!(vfs.read_node_by_path("/home").await.unwrap(), None);
    vfs.create_directory("/home", Some(root.id)).await.unwrap();
  }

  #[tokio::test]
  async fn concurrent_first_calls_open_once() {
    let vfs = Vfs::in_memory();
    let (a, b) = tokio::join!(
      vfs.create_directory("/", None),
      vfs.read_node_by_path("/")
    );
    a.unwrap();
    b.unwrap();
    assert!(vfs.is_initialized());
  }

  #[tokio::test]
  async fn reload_restores_indexes() {
    let root = FileSystemNode::directory("/", None);
    let home = FileSystemNode::directory("/home", Some(root.id));
    let store = Arc::new(MemoryStore::with_records([root.clone(), home.clone()]));
    let vfs = Vfs::new(store);

    assert_eq!(vfs.read_node_by_path("/home").await.unwrap(), Some(home.clone()));
    assert_eq!(vfs.list_children(root.id).await.unwrap(), vec![home]);
  }
}
