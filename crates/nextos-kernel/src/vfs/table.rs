/*!
Node arena with its secondary indexes.

`nodes` is the primary store keyed by id. `by_path` (unique) and `by_parent`
(non-unique) are kept in sync on every insert, replace and remove; nothing
else touches them. Validation (`check_*`) is separate from mutation so the
VFS can validate, persist, and only then apply.
*/

use std::collections::{HashMap, HashSet};

use super::path;
use crate::types::{FileSystemNode, KernelError, KernelResult, NodeId};

#[derive(Debug, Default)]
pub(crate) struct NodeTable {
  nodes: HashMap<NodeId, FileSystemNode>,
  by_path: HashMap<String, NodeId>,
  by_parent: HashMap<NodeId, HashSet<NodeId>>,
}

impl NodeTable {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  /// Rebuild from persisted records. Records that would break path
  /// uniqueness are skipped and logged.
  pub(crate) fn from_records(records: Vec<FileSystemNode>) -> Self {
    let mut table = Self::new();
    let mut records = records;
    // Deterministic winner when a damaged store holds two records for one path.
    records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    for node in records {
      if let Some(existing) = table.by_path.get(&node.path) {
        log::error!(
          "skipping node {} at {}: path already held by {existing}",
          node.id,
          node.path
        );
        continue;
      }
      if table.nodes.contains_key(&node.id) {
        log::error!("skipping duplicate record for node {}", node.id);
        continue;
      }
      table.insert(node);
    }
    table
  }

  pub(crate) fn get(&self, id: NodeId) -> Option<&FileSystemNode> {
    self.nodes.get(&id)
  }

  pub(crate) fn get_by_path(&self, path: &str) -> Option<&FileSystemNode> {
    self.by_path.get(path).and_then(|id| self.nodes.get(id))
  }

  /// Nodes whose stored `parent_id` equals `parent`, in no particular order.
  pub(crate) fn children(&self, parent: NodeId) -> Vec<FileSystemNode> {
    self
      .by_parent
      .get(&parent)
      .into_iter()
      .flatten()
      .filter_map(|id| self.nodes.get(id))
      .cloned()
      .collect()
  }

  pub(crate) fn has_children(&self, id: NodeId) -> bool {
    self.by_parent.get(&id).is_some_and(|c| !c.is_empty())
  }

  pub(crate) fn len(&self) -> usize {
    self.nodes.len()
  }

  /// Parent rules shared by insert and replace:
  /// - only `/` may (and must) have no parent
  /// - the parent exists, is a directory, and its path is the dirname of `node.path`
  fn check_parent(&self, node: &FileSystemNode) -> KernelResult<()> {
    path::validate(&node.path)?;

    let Some(parent_id) = node.parent_id else {
      return if node.path == path::ROOT {
        Ok(())
      } else {
        Err(KernelError::ParentNotFound {
          path: node.path.clone(),
        })
      };
    };
    if node.path == path::ROOT {
      return Err(KernelError::invalid_path(&node.path));
    }

    let parent = self
      .nodes
      .get(&parent_id)
      .ok_or_else(|| KernelError::ParentNotFound {
        path: node.path.clone(),
      })?;
    if !parent.is_dir() {
      return Err(KernelError::NotADirectory {
        path: parent.path.clone(),
      });
    }
    if path::parent_of(&node.path) != Some(parent.path.as_str()) {
      return Err(KernelError::invalid_path(&node.path));
    }
    Ok(())
  }

  /// Validate a new record: fresh id, free path, valid parent.
  pub(crate) fn check_insert(&self, node: &FileSystemNode) -> KernelResult<()> {
    if self.nodes.contains_key(&node.id) {
      return Err(KernelError::duplicate(node.id));
    }
    if self.by_path.contains_key(&node.path) {
      return Err(KernelError::duplicate(&node.path));
    }
    self.check_parent(node)
  }

  /// Validate an upsert. An existing record keeps its path (moves are not
  /// supported) and a directory with children stays a directory.
  pub(crate) fn check_replace(&self, node: &FileSystemNode) -> KernelResult<()> {
    let Some(existing) = self.nodes.get(&node.id) else {
      return self.check_insert(node);
    };
    if existing.path != node.path {
      return Err(KernelError::NotSupported(format!(
        "moving {} to {}",
        existing.path, node.path
      )));
    }
    if existing.parent_id != node.parent_id {
      return Err(KernelError::NotSupported(format!(
        "reparenting {}",
        existing.path
      )));
    }
    if existing.is_dir() && !node.is_dir() && self.has_children(node.id) {
      return Err(KernelError::DirectoryNotEmpty {
        path: node.path.clone(),
      });
    }
    self.check_parent(node)
  }

  /// Insert or overwrite a record. Callers validate first.
  pub(crate) fn insert(&mut self, node: FileSystemNode) {
    if let Some(old) = self.nodes.remove(&node.id) {
      self.unindex(&old);
    }
    self.by_path.insert(node.path.clone(), node.id);
    if let Some(parent) = node.parent_id {
      self.by_parent.entry(parent).or_default().insert(node.id);
    }
    self.nodes.insert(node.id, node);
  }

  pub(crate) fn remove(&mut self, id: NodeId) -> Option<FileSystemNode> {
    let node = self.nodes.remove(&id)?;
    self.unindex(&node);
    Some(node)
  }

  fn unindex(&mut self, node: &FileSystemNode) {
    if self.by_path.get(&node.path) == Some(&node.id) {
      self.by_path.remove(&node.path);
    }
    if let Some(parent) = node.parent_id {
      if let Some(siblings) = self.by_parent.get_mut(&parent) {
        siblings.remove(&node.id);
        if siblings.is_empty() {
          self.by_parent.remove(&parent);
        }
      }
    }
  }

  /// A node and all its descendants, children before parents.
  /// Iterative to avoid stack overflow on deep trees.
  pub(crate) fn subtree_post_order(&self, root: NodeId) -> Vec<NodeId> {
    if !self.nodes.contains_key(&root) {
      return Vec::new();
    }
    let mut pre_order = Vec::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
      pre_order.push(id);
      if let Some(children) = self.by_parent.get(&id) {
        stack.extend(children.iter().copied());
      }
    }
    pre_order.reverse();
    pre_order
  }
}
