/*! Virtual file system records. */

use super::NodeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Kind of file system node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum NodeKind {
  File,
  Directory,
}

/// A persisted file or directory.
///
/// Serialized layout: `{id, name, type, path, parentId, content?, size, createdAt, modifiedAt}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FileSystemNode {
  pub id: NodeId,
  /// Last segment of `path`.
  pub name: String,
  #[serde(rename = "type")]
  pub kind: NodeKind,
  /// Absolute, slash-separated. Unique across the store.
  pub path: String,
  /// `None` only for the root (`/`).
  pub parent_id: Option<NodeId>,
  /// Present only for files.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub content: Option<String>,
  /// Byte length of `content`; 0 for directories.
  pub size: u64,
  pub created_at: DateTime<Utc>,
  pub modified_at: DateTime<Utc>,
}

impl FileSystemNode {
  /// Build a directory record with a fresh id.
  pub fn directory(path: impl Into<String>, parent_id: Option<NodeId>) -> Self {
    let path = path.into();
    let now = Utc::now();
    Self {
      id: NodeId::new(),
      name: crate::vfs::path::name_of(&path).to_string(),
      kind: NodeKind::Directory,
      path,
      parent_id,
      content: None,
      size: 0,
      created_at: now,
      modified_at: now,
    }
  }

  /// Build a file record with a fresh id. `size` is the UTF-8 byte length of `content`.
  pub fn file(path: impl Into<String>, content: impl Into<String>, parent_id: Option<NodeId>) -> Self {
    let path = path.into();
    let content = content.into();
    let now = Utc::now();
    Self {
      id: NodeId::new(),
      name: crate::vfs::path::name_of(&path).to_string(),
      kind: NodeKind::File,
      path,
      parent_id,
      size: content.len() as u64,
      content: Some(content),
      created_at: now,
      modified_at: now,
    }
  }

  pub const fn is_dir(&self) -> bool {
    matches!(self.kind, NodeKind::Directory)
  }

  pub const fn is_file(&self) -> bool {
    matches!(self.kind, NodeKind::File)
  }

  pub const fn is_root(&self) -> bool {
    self.parent_id.is_none()
  }

  /// Replace file content, recompute size and bump `modified_at`.
  pub fn set_content(&mut self, content: impl Into<String>) {
    let content = content.into();
    self.size = content.len() as u64;
    self.content = Some(content);
    self.modified_at = Utc::now().max(self.created_at);
  }

  /// Make the record consistent with its path and kind: `name` is the last
  /// path segment, directories carry no content and a zero size, files
  /// report the byte length of their content.
  pub(crate) fn normalize(&mut self) {
    crate::vfs::path::name_of(&self.path).clone_into(&mut self.name);
    match self.kind {
      NodeKind::Directory => {
        self.content = None;
        self.size = 0;
      }
      NodeKind::File => {
        self.size = self.content.as_ref().map_or(0, |c| c.len() as u64);
      }
    }
    if self.modified_at < self.created_at {
      self.modified_at = self.created_at;
    }
  }
}
