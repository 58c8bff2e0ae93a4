/*! Default directory layout created on first boot. */

use super::{path, Vfs};
use crate::types::{FileSystemNode, KernelError, KernelResult};

/// Directories every installation has, parents before children.
pub const DEFAULT_DIRECTORIES: &[&str] = &[
  "/",
  "/home",
  "/home/documents",
  "/home/downloads",
  "/home/pictures",
  "/system",
  "/system/bin",
  "/system/config",
];

pub const WELCOME_PATH: &str = "/home/welcome.txt";

pub const WELCOME_TEXT: &str = "Welcome to NextOS!\n\n\
A desktop that runs in your browser tab.\n\n\
Explore the filesystem, open applications, and enjoy the desktop experience.";

impl Vfs {
  /// Create whichever default nodes are missing.
  ///
  /// Each path is checked before it is created, so running this again after
  /// an interrupted run completes the tree instead of colliding with it.
  /// Returns the number of nodes created (0 when everything exists).
  pub async fn initialize_default_structure(&self) -> KernelResult<usize> {
    let mut table = self.lock().await?;
    let mut created = 0;

    let layout = DEFAULT_DIRECTORIES
      .iter()
      .map(|p| (*p, None))
      .chain(std::iter::once((WELCOME_PATH, Some(WELCOME_TEXT))));

    for (node_path, content) in layout {
      if table.get_by_path(node_path).is_some() {
        continue;
      }
      let parent_id = match path::parent_of(node_path) {
        None => None,
        Some(dir) => Some(
          table
            .get_by_path(dir)
            .ok_or_else(|| KernelError::ParentNotFound {
              path: node_path.to_string(),
            })?
            .id,
        ),
      };
      let node = match content {
        Some(text) => FileSystemNode::file(node_path, text, parent_id),
        None => FileSystemNode::directory(node_path, parent_id),
      };
      self.insert_locked(&mut table, node).await?;
      created += 1;
    }

    if created > 0 {
      log::info!("created {created} default file system nodes");
    }
    Ok(created)
  }
}
