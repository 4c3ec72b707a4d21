use crate::error::{ErrorKind, Failure};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The result of running one test case. Every case produces exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
  Pass,
  Fail {
    message: String,
  },
  Error {
    kind: ErrorKind,
    message: String,
  },
  /// The body never ran because the expectations manifest skips the case.
  Skip {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
  },
}

impl Outcome {
  pub fn status(&self) -> Status {
    match self {
      Outcome::Pass => Status::Pass,
      Outcome::Fail { .. } => Status::Fail,
      Outcome::Error { .. } => Status::Error,
      Outcome::Skip { .. } => Status::Skip,
    }
  }

  pub fn message(&self) -> Option<&str> {
    match self {
      Outcome::Pass => None,
      Outcome::Fail { message } | Outcome::Error { message, .. } => Some(message),
      Outcome::Skip { reason } => reason.as_deref(),
    }
  }

  pub(crate) fn from_failure(failure: Failure) -> Self {
    match failure {
      Failure::Assertion(err) => Outcome::Fail {
        message: err.to_string(),
      },
      Failure::Thrown(signal) => Outcome::Error {
        kind: signal.kind,
        message: signal.message,
      },
    }
  }
}

/// The status part of an [`Outcome`], without its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
  Pass,
  Fail,
  Error,
  Skip,
}

impl Status {
  pub fn is_fail_like(self) -> bool {
    matches!(self, Status::Fail | Status::Error)
  }
}

impl fmt::Display for Status {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Status::Pass => "PASS",
      Status::Fail => "FAIL",
      Status::Error => "ERROR",
      Status::Skip => "SKIP",
    })
  }
}

/// Lifecycle of a test case: `Registered -> Running -> {Passed | Failed | Errored}`, or
/// `Registered -> Skipped`. Terminal states never change again.
///
/// This describes the runner's behavior; cases and results do not store it. A finished case's
/// terminal state is [`TestState::for_outcome`] of its [`Outcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestState {
  Registered,
  Running,
  Passed,
  Failed,
  Errored,
  Skipped,
}

impl TestState {
  pub fn is_terminal(self) -> bool {
    matches!(
      self,
      TestState::Passed | TestState::Failed | TestState::Errored | TestState::Skipped
    )
  }

  /// Returns the next state, or `None` if the transition is not allowed.
  pub fn advance(self, next: TestState) -> Option<TestState> {
    use TestState::*;
    match (self, next) {
      (Registered, Running) | (Registered, Skipped) => Some(next),
      (Running, Passed) | (Running, Failed) | (Running, Errored) => Some(next),
      _ => None,
    }
  }

  pub fn for_outcome(outcome: &Outcome) -> TestState {
    match outcome.status() {
      Status::Pass => TestState::Passed,
      Status::Fail => TestState::Failed,
      Status::Error => TestState::Errored,
      Status::Skip => TestState::Skipped,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::{AssertionError, Signal};

  #[test]
  fn terminal_states_are_final() {
    for terminal in [
      TestState::Passed,
      TestState::Failed,
      TestState::Errored,
      TestState::Skipped,
    ] {
      assert!(terminal.is_terminal());
      for next in [TestState::Running, TestState::Passed, TestState::Registered] {
        assert_eq!(terminal.advance(next), None);
      }
    }
    assert_eq!(TestState::Registered.advance(TestState::Passed), None);
    assert_eq!(
      TestState::Registered
        .advance(TestState::Running)
        .and_then(|s| s.advance(TestState::Errored)),
      Some(TestState::Errored)
    );
  }

  #[test]
  fn every_outcome_ends_in_a_reachable_terminal_state() {
    let outcomes = [
      Outcome::Pass,
      Outcome::Fail {
        message: "nope".to_string(),
      },
      Outcome::Error {
        kind: ErrorKind::Panic,
        message: "boom".to_string(),
      },
      Outcome::Skip { reason: None },
    ];
    for outcome in &outcomes {
      let terminal = TestState::for_outcome(outcome);
      let reached = match terminal {
        TestState::Skipped => TestState::Registered.advance(terminal),
        _ => TestState::Registered
          .advance(TestState::Running)
          .and_then(|s| s.advance(terminal)),
      };
      assert_eq!(reached, Some(terminal), "{outcome:?}");
      assert!(terminal.is_terminal());
    }
  }

  #[test]
  fn failures_map_to_fail_and_error() {
    let fail = Outcome::from_failure(Failure::Assertion(AssertionError::failure("nope")));
    assert_eq!(
      fail,
      Outcome::Fail {
        message: "nope".to_string()
      }
    );

    let error = Outcome::from_failure(Failure::Thrown(Signal::type_error("Illegal constructor")));
    assert_eq!(error.status(), Status::Error);
    assert_eq!(error.message(), Some("Illegal constructor"));
  }

  #[test]
  fn outcome_serializes_with_status_tag() {
    let json = serde_json::to_string(&Outcome::Error {
      kind: ErrorKind::DataCloneError,
      message: "boom".to_string(),
    })
    .unwrap();
    assert_eq!(
      json,
      r#"{"status":"error","kind":"DataCloneError","message":"boom"}"#
    );
    assert_eq!(
      serde_json::to_string(&Outcome::Skip { reason: None }).unwrap(),
      r#"{"status":"skip"}"#
    );
  }
}
