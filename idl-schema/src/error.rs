use thiserror::Error;

/// Errors produced while declaring or resolving a [`Schema`](crate::Schema).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
  #[error("IDL parse error at line {line}: {message}")]
  Parse { line: usize, message: String },

  #[error("invalid schema manifest: {0}")]
  Manifest(String),

  #[error("interface `{0}` is declared more than once")]
  Duplicate(String),

  #[error("partial interface `{0}` has no matching interface declaration")]
  OrphanPartial(String),

  #[error("`{target}` includes unknown mixin `{mixin}`")]
  UnknownMixin { target: String, mixin: String },

  #[error("unknown interface `{0}`")]
  UnknownInterface(String),

  #[error("interface `{interface}` inherits from unknown interface `{parent}`")]
  UnknownParent { interface: String, parent: String },

  /// The chain is listed in the order it was walked, starting at the requested interface.
  #[error("inheritance cycle: {}", .chain.join(" -> "))]
  Cycle { chain: Vec<String> },
}
