use idl_schema::Mismatch;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io;
use thiserror::Error;

/// The name of an exception a platform operation can signal.
///
/// DOMException names and ECMAScript error constructors share one namespace, which is how test
/// files refer to them. Kinds compare by name, so `Other("TypeError")` equals `TypeError`.
#[derive(Debug, Clone)]
pub enum ErrorKind {
  DataCloneError,
  InvalidStateError,
  NotAllowedError,
  NotReadableError,
  NotSupportedError,
  SecurityError,
  RangeError,
  SyntaxError,
  TypeError,
  /// A Rust panic escaped a test body.
  Panic,
  Other(String),
}

impl ErrorKind {
  pub fn as_str(&self) -> &str {
    match self {
      ErrorKind::DataCloneError => "DataCloneError",
      ErrorKind::InvalidStateError => "InvalidStateError",
      ErrorKind::NotAllowedError => "NotAllowedError",
      ErrorKind::NotReadableError => "NotReadableError",
      ErrorKind::NotSupportedError => "NotSupportedError",
      ErrorKind::SecurityError => "SecurityError",
      ErrorKind::RangeError => "RangeError",
      ErrorKind::SyntaxError => "SyntaxError",
      ErrorKind::TypeError => "TypeError",
      ErrorKind::Panic => "panic",
      ErrorKind::Other(name) => name,
    }
  }

  pub fn from_name(name: &str) -> Self {
    match name {
      "DataCloneError" => ErrorKind::DataCloneError,
      "InvalidStateError" => ErrorKind::InvalidStateError,
      "NotAllowedError" => ErrorKind::NotAllowedError,
      "NotReadableError" => ErrorKind::NotReadableError,
      "NotSupportedError" => ErrorKind::NotSupportedError,
      "SecurityError" => ErrorKind::SecurityError,
      "RangeError" => ErrorKind::RangeError,
      "SyntaxError" => ErrorKind::SyntaxError,
      "TypeError" => ErrorKind::TypeError,
      "panic" => ErrorKind::Panic,
      other => ErrorKind::Other(other.to_string()),
    }
  }
}

impl PartialEq for ErrorKind {
  fn eq(&self, other: &Self) -> bool {
    self.as_str() == other.as_str()
  }
}

impl Eq for ErrorKind {}

impl Hash for ErrorKind {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.as_str().hash(state);
  }
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl Serialize for ErrorKind {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.as_str())
  }
}

impl<'de> Deserialize<'de> for ErrorKind {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let name = String::deserialize(deserializer)?;
    Ok(ErrorKind::from_name(&name))
  }
}

/// A failure signalled by an operation under test (a thrown exception).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct Signal {
  pub kind: ErrorKind,
  pub message: String,
}

impl Signal {
  pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
    Self {
      kind: ErrorKind::from_name(kind.as_str()),
      message: message.into(),
    }
  }

  pub fn data_clone(message: impl Into<String>) -> Self {
    Self::new(ErrorKind::DataCloneError, message)
  }

  pub fn type_error(message: impl Into<String>) -> Self {
    Self::new(ErrorKind::TypeError, message)
  }
}

/// An expectation declared by a test body that did not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssertionError {
  #[error("{message}")]
  AssertionFailure { message: String },

  /// The operation failed, but not the way the assertion expected.
  #[error("expected failure of kind {expected}, got {actual}: {message}")]
  UnexpectedSignal {
    expected: ErrorKind,
    actual: ErrorKind,
    message: String,
  },

  #[error("{interface} does not match its IDL: {}", describe_mismatches(.mismatches))]
  SchemaMismatch {
    interface: String,
    mismatches: Vec<Mismatch>,
  },
}

impl AssertionError {
  pub fn failure(message: impl Into<String>) -> Self {
    AssertionError::AssertionFailure {
      message: message.into(),
    }
  }
}

fn describe_mismatches(mismatches: &[Mismatch]) -> String {
  let listed = mismatches
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join("; ");
  match mismatches.len() {
    1 => format!("1 mismatch ({listed})"),
    n => format!("{n} mismatches ({listed})"),
  }
}

/// Why a test body stopped early.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Failure {
  /// An assertion did not hold; the test failed.
  #[error(transparent)]
  Assertion(#[from] AssertionError),

  /// An operation signalled a failure that no assertion was waiting for; the test errored.
  #[error("uncaught {0}")]
  Thrown(#[from] Signal),
}

/// What a test body returns.
pub type CaseResult = Result<(), Failure>;

/// Problems with the harness inputs rather than with the tests themselves.
#[derive(Debug, Error)]
pub enum HarnessError {
  #[error(transparent)]
  Io(#[from] io::Error),
  #[error("invalid expectations manifest: {0}")]
  Manifest(String),
  #[error("invalid shard '{0}'")]
  InvalidShard(String),
  #[error("invalid filter '{0}'")]
  InvalidFilter(String),
  #[error("invalid report: {0}")]
  Report(String),
  #[error("format JSON report: {0}")]
  Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
  use super::*;
  use idl_schema::MemberKind;

  #[test]
  fn error_kind_names_round_trip_through_json() {
    let kinds = vec![
      ErrorKind::DataCloneError,
      ErrorKind::Panic,
      ErrorKind::Other("AbortError".to_string()),
    ];
    let json = serde_json::to_string(&kinds).unwrap();
    assert_eq!(json, r#"["DataCloneError","panic","AbortError"]"#);
    let parsed: Vec<ErrorKind> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, kinds);
  }

  #[test]
  fn other_kinds_with_known_names_normalize() {
    assert_eq!(ErrorKind::Other("TypeError".to_string()), ErrorKind::TypeError);
    assert_ne!(ErrorKind::Other("AbortError".to_string()), ErrorKind::TypeError);
    let signal = Signal::new(ErrorKind::Other("DataCloneError".to_string()), "detached");
    assert!(matches!(signal.kind, ErrorKind::DataCloneError));
  }

  #[test]
  fn schema_mismatch_message_lists_every_member() {
    let err = AssertionError::SchemaMismatch {
      interface: "Gyroscope".to_string(),
      mismatches: vec![
        Mismatch::Missing {
          member: "w".to_string(),
          expected: MemberKind::Readonly,
        },
        Mismatch::Incompatible {
          member: "onreading".to_string(),
          expected: MemberKind::Event,
          found: MemberKind::Writable,
        },
      ],
    };
    assert_eq!(
      err.to_string(),
      "Gyroscope does not match its IDL: 2 mismatches (missing readonly attribute `w`; \
       `onreading`: expected event handler, found attribute)"
    );
  }
}
