/*!
Directory-backed node store.

Each record lives in `<dir>/<uuid>.json`. Writes go to a `.tmp` sibling,
are flushed to disk, and are then renamed into place, so a record file is
either the old version or the new one. Temp files left by an interrupted
write are removed on `open`.
*/

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::store::NodeStore;
use crate::types::{FileSystemNode, KernelError, KernelResult, NodeId};

const EXTENSION: &str = "json";
const TMP_EXTENSION: &str = "tmp";

/// Node store persisting one JSON file per record.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
  dir: PathBuf,
}

impl JsonDirStore {
  /// Store rooted at `dir`. The directory is created on `open`.
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  fn record_path(&self, id: NodeId) -> PathBuf {
    self.dir.join(format!("{id}.{EXTENSION}"))
  }

  async fn write_record(&self, node: &FileSystemNode) -> KernelResult<()> {
    let target = self.record_path(node.id);
    let tmp = target.with_extension(TMP_EXTENSION);
    let bytes = serde_json::to_vec_pretty(node)?;

    let mut file = fs::File::create(&tmp).await?;
    file.write_all(&bytes).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(&tmp, &target).await?;
    Ok(())
  }
}

#[async_trait]
impl NodeStore for JsonDirStore {
  async fn open(&self) -> KernelResult<Vec<FileSystemNode>> {
    fs::create_dir_all(&self.dir).await?;

    let mut records = Vec::new();
    let mut entries = fs::read_dir(&self.dir).await?;
    while let Some(entry) = entries.next_entry().await? {
      let path = entry.path();
      match path.extension().and_then(|e| e.to_str()) {
        Some(EXTENSION) => {}
        Some(TMP_EXTENSION) => {
          log::warn!("removing leftover {}", path.display());
          fs::remove_file(&path).await?;
          continue;
        }
        _ => continue,
      }
      let bytes = fs::read(&path).await?;
      match serde_json::from_slice::<FileSystemNode>(&bytes) {
        Ok(node) => records.push(node),
        Err(e) => log::error!("skipping unreadable record {}: {e}", path.display()),
      }
    }
    log::debug!("loaded {} records from {}", records.len(), self.dir.display());
    Ok(records)
  }

  async fn insert(&self, node: &FileSystemNode) -> KernelResult<()> {
    if fs::try_exists(self.record_path(node.id)).await? {
      return Err(KernelError::duplicate(node.id));
    }
    self.write_record(node).await
  }

  async fn put(&self, node: &FileSystemNode) -> KernelResult<()> {
    self.write_record(node).await
  }

  async fn remove(&self, id: NodeId) -> KernelResult<()> {
    match fs::remove_file(self.record_path(id)).await {
      Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
      _ => Ok(()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonDirStore::new(dir.path().join("nodes"));
    assert!(store.open().await.unwrap().is_empty());

    let root = FileSystemNode::directory("/", None);
    store.insert(&root).await.unwrap();
    let again = JsonDirStore::new(dir.path().join("nodes"));
    assert_eq!(again.open().await.unwrap(), vec![root]);
  }

  #[tokio::test]
  async fn insert_rejects_existing_id() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonDirStore::new(dir.path());
    store.open().await.unwrap();
    let node = FileSystemNode::file("/a.txt", "x", None);
    store.insert(&node).await.unwrap();
    assert!(matches!(
      store.insert(&node).await,
      Err(KernelError::DuplicateKey { .. })
    ));
  }

  #[tokio::test]
  async fn remove_missing_is_ok_and_stray_files_ignored() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not a record").unwrap();
    let store = JsonDirStore::new(dir.path());
    assert!(store.open().await.unwrap().is_empty());
    store.remove(NodeId::new()).await.unwrap();
  }

  #[tokio::test]
  async fn leftover_temp_files_are_removed() {
    let dir = tempfile::tempdir().unwrap();
    let leftover = dir.path().join(format!("{}.tmp", NodeId::new()));
    std::fs::write(&leftover, "{\"partial").unwrap();

    let store = JsonDirStore::new(dir.path());
    assert!(store.open().await.unwrap().is_empty());
    assert!(!leftover.exists());
  }

  #[tokio::test]
  async fn put_overwrites_without_leaving_temp_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonDirStore::new(dir.path());
    store.open().await.unwrap();

    let mut node = FileSystemNode::file("/a.txt", "one", None);
    store.insert(&node).await.unwrap();
    node.set_content("two");
    store.put(&node).await.unwrap();

    let names: Vec<_> = std::fs::read_dir(dir.path())
      .unwrap()
      .map(|e| e.unwrap().file_name().into_string().unwrap())
      .collect();
    assert_eq!(names, vec![format!("{}.json", node.id)]);
    assert_eq!(store.open().await.unwrap(), vec![node]);
  }

  #[tokio::test]
  async fn corrupt_record_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.json"), "{").unwrap();
    let store = JsonDirStore::new(dir.path());
    assert!(store.open().await.unwrap().is_empty());
  }
}
