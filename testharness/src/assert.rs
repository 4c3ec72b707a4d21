//! Assertion primitives for test bodies.
//!
//! Each primitive returns `Result<(), AssertionError>` so bodies can chain them with `?`.
//! Messages follow the `assert_name: description detail` layout testharness reports use; the
//! description may be empty.

use crate::error::{AssertionError, ErrorKind, Signal};
use idl_schema::{check_shape, PlatformObject, Schema};
use std::fmt::Debug;

fn fail(assertion: &str, description: &str, detail: impl AsRef<str>) -> AssertionError {
  let detail = detail.as_ref();
  let message = if description.is_empty() {
    format!("{assertion}: {detail}")
  } else {
    format!("{assertion}: {description} {detail}")
  };
  AssertionError::failure(message)
}

/// Runs `operation` once and passes only if it fails with exactly `expected`.
///
/// Normal completion and a failure of some other kind are reported differently: the former as an
/// [`AssertionError::AssertionFailure`], the latter as an [`AssertionError::UnexpectedSignal`].
pub fn assert_throws<T>(
  expected: ErrorKind,
  operation: impl FnOnce() -> Result<T, Signal>,
) -> Result<(), AssertionError> {
  match operation() {
    Ok(_) => Err(AssertionError::failure(format!(
      "expected failure of kind {expected}, got normal completion"
    ))),
    Err(signal) if signal.kind == expected => Ok(()),
    Err(signal) => Err(AssertionError::UnexpectedSignal {
      expected,
      actual: signal.kind,
      message: signal.message,
    }),
  }
}

/// Checks that `object` exposes every member `interface` declares, including inherited ones.
///
/// All missing or differently-shaped members are reported together.
pub fn assert_structural_match(
  schema: &Schema,
  interface: &str,
  object: &dyn PlatformObject,
) -> Result<(), AssertionError> {
  let resolved = schema.resolve(interface).map_err(|err| {
    AssertionError::failure(format!("assert_structural_match: {err}"))
  })?;
  let mismatches = check_shape(&resolved, object);
  if mismatches.is_empty() {
    return Ok(());
  }
  Err(AssertionError::SchemaMismatch {
    interface: interface.to_string(),
    mismatches,
  })
}

pub fn assert_true(actual: bool, description: &str) -> Result<(), AssertionError> {
  if actual {
    Ok(())
  } else {
    Err(fail("assert_true", description, "expected true got false"))
  }
}

pub fn assert_false(actual: bool, description: &str) -> Result<(), AssertionError> {
  if actual {
    Err(fail("assert_false", description, "expected false got true"))
  } else {
    Ok(())
  }
}

pub fn assert_equals<T: PartialEq + Debug + ?Sized>(
  actual: &T,
  expected: &T,
  description: &str,
) -> Result<(), AssertionError> {
  if actual == expected {
    Ok(())
  } else {
    Err(fail(
      "assert_equals",
      description,
      format!("expected {expected:?} but got {actual:?}"),
    ))
  }
}

pub fn assert_not_equals<T: PartialEq + Debug + ?Sized>(
  actual: &T,
  unexpected: &T,
  description: &str,
) -> Result<(), AssertionError> {
  if actual != unexpected {
    Ok(())
  } else {
    Err(fail(
      "assert_not_equals",
      description,
      format!("got disallowed value {actual:?}"),
    ))
  }
}

/// Compares lengths first, then reports the first differing index.
pub fn assert_array_equals<T: PartialEq + Debug>(
  actual: &[T],
  expected: &[T],
  description: &str,
) -> Result<(), AssertionError> {
  if actual.len() != expected.len() {
    return Err(fail(
      "assert_array_equals",
      description,
      format!(
        "lengths differ, expected array {expected:?} length {} but got {actual:?} length {}",
        expected.len(),
        actual.len()
      ),
    ));
  }

  match actual.iter().zip(expected).position(|(a, e)| a != e) {
    None => Ok(()),
    Some(index) => Err(fail(
      "assert_array_equals",
      description,
      format!(
        "expected property {index} to be {:?} but got {:?} (expected array {expected:?} got {actual:?})",
        expected[index], actual[index]
      ),
    )),
  }
}

/// Passes when `actual` is within `epsilon` of `expected` (absolute tolerance). When neither value
/// is finite they must be identical. NaN never matches.
pub fn assert_approx_equals(
  actual: f64,
  expected: f64,
  epsilon: f64,
  description: &str,
) -> Result<(), AssertionError> {
  let close = if actual.is_finite() || expected.is_finite() {
    (actual - expected).abs() <= epsilon
  } else {
    actual == expected
  };
  if close {
    Ok(())
  } else {
    Err(fail(
      "assert_approx_equals",
      description,
      format!("expected {expected} +/- {epsilon} but got {actual}"),
    ))
  }
}

/// Fails unconditionally; for code paths a test must never reach.
pub fn assert_unreached(description: &str) -> Result<(), AssertionError> {
  Err(fail("assert_unreached", description, "reached unreachable code"))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn data_clone() -> Result<(), Signal> {
    Err(Signal::data_clone("SharedArrayBuffer cannot be transferred"))
  }

  #[test]
  fn assert_throws_distinguishes_all_three_cases() {
    assert_eq!(assert_throws(ErrorKind::DataCloneError, data_clone), Ok(()));

    let err = assert_throws(ErrorKind::DataCloneError, || Ok::<_, Signal>(42)).unwrap_err();
    assert_eq!(
      err,
      AssertionError::failure("expected failure of kind DataCloneError, got normal completion")
    );

    let err = assert_throws(ErrorKind::TypeError, data_clone).unwrap_err();
    assert_eq!(
      err,
      AssertionError::UnexpectedSignal {
        expected: ErrorKind::TypeError,
        actual: ErrorKind::DataCloneError,
        message: "SharedArrayBuffer cannot be transferred".to_string(),
      }
    );
  }

  #[test]
  fn assert_throws_invokes_operation_once() {
    let mut calls = 0;
    let _ = assert_throws(ErrorKind::TypeError, || {
      calls += 1;
      Err::<(), _>(Signal::type_error("x"))
    });
    assert_eq!(calls, 1);
  }

  #[test]
  fn equality_messages_include_description() {
    assert!(assert_equals(&1, &1, "").is_ok());
    let err = assert_equals("a", "b", "letters").unwrap_err();
    assert_eq!(
      err.to_string(),
      r#"assert_equals: letters expected "b" but got "a""#
    );
    let err = assert_not_equals(&3, &3, "").unwrap_err();
    assert_eq!(err.to_string(), "assert_not_equals: got disallowed value 3");
  }

  #[test]
  fn array_equals_reports_length_then_first_difference() {
    assert!(assert_array_equals(&[1, 2, 3], &[1, 2, 3], "").is_ok());

    let err = assert_array_equals(&[1, 2], &[1, 2, 3], "").unwrap_err();
    assert!(err.to_string().contains("lengths differ"), "{err}");

    let err = assert_array_equals(&["a", "x", "y"], &["a", "b", "c"], "events").unwrap_err();
    assert!(
      err
        .to_string()
        .starts_with(r#"assert_array_equals: events expected property 1 to be "b" but got "x""#),
      "{err}"
    );
  }

  #[test]
  fn approx_equals_uses_absolute_tolerance() {
    assert!(assert_approx_equals(5.75, 6.0, 1.0, "pageX").is_ok());
    assert!(assert_approx_equals(10.25, 12.0, 1.0, "pageY").is_err());
    assert!(assert_approx_equals(f64::NAN, 0.0, f64::INFINITY, "").is_err());
  }

  #[test]
  fn approx_equals_matches_identical_infinities() {
    assert!(assert_approx_equals(f64::INFINITY, f64::INFINITY, 0.0, "").is_ok());
    assert!(assert_approx_equals(f64::NEG_INFINITY, f64::NEG_INFINITY, 0.0, "").is_ok());
    assert!(assert_approx_equals(f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, "").is_err());
    assert!(assert_approx_equals(f64::NAN, f64::NAN, f64::INFINITY, "").is_err());
  }

  #[test]
  fn assert_throws_compares_kinds_by_name() {
    let thrown = || Err::<(), _>(Signal::type_error("Illegal constructor"));
    assert_eq!(
      assert_throws(ErrorKind::Other("TypeError".to_string()), thrown),
      Ok(())
    );
  }

  #[test]
  fn boolean_and_unreached_assertions() {
    assert!(assert_true(true, "").is_ok());
    assert!(assert_false(false, "").is_ok());
    assert_eq!(
      assert_true(false, "activated").unwrap_err().to_string(),
      "assert_true: activated expected true got false"
    );
    assert!(assert_unreached("should have thrown").is_err());
  }
}
