/*! Error types for kernel operations. */

/// Errors surfaced by the virtual file system.
///
/// Window and process commands never fail; unknown ids are ignored there.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KernelError {
  #[error("Duplicate key: {key}")]
  DuplicateKey { key: String },

  #[error("Storage error: {0}")]
  Storage(String),

  #[error("Parent not found for {path}")]
  ParentNotFound { path: String },

  #[error("Not a directory: {path}")]
  NotADirectory { path: String },

  #[error("Directory not empty: {path}")]
  DirectoryNotEmpty { path: String },

  #[error("Invalid path: {path:?}")]
  InvalidPath { path: String },

  #[error("Operation not supported: {0}")]
  NotSupported(String),
}

impl KernelError {
  pub(crate) fn invalid_path(path: &str) -> Self {
    Self::InvalidPath {
      path: path.to_string(),
    }
  }

  pub(crate) fn duplicate(key: impl std::fmt::Display) -> Self {
    Self::DuplicateKey {
      key: key.to_string(),
    }
  }

  /// Whether retrying the same call could succeed.
  pub const fn is_transient(&self) -> bool {
    matches!(self, Self::Storage(_))
  }
}

impl From<std::io::Error> for KernelError {
  fn from(e: std::io::Error) -> Self {
    Self::Storage(e.to_string())
  }
}

impl From<serde_json::Error> for KernelError {
  fn from(e: serde_json::Error) -> Self {
    Self::Storage(format!("corrupt record: {e}"))
  }
}

/// Result type for kernel operations.
pub type KernelResult<T> = Result<T, KernelError>;
