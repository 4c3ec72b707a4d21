use crate::engine::{Engine, SensorOptions};
use crate::idl::sensor_schema;
use idl_schema::{check_shape, SchemaError};
use std::rc::Rc;
use std::sync::Arc;
use testharness::assert::{
  assert_array_equals, assert_equals, assert_structural_match, assert_throws, assert_true,
};
use testharness::{AssertionError, ErrorKind, TestFile};

pub const IDLHARNESS: &str = "gyroscope/idlharness";

/// Declares a member no implementation has, to check that shape checks notice.
const UNDECLARED_AXIS: &str = r#"
partial interface Gyroscope {
  readonly attribute double? w;
};
"#;

fn resolve_failure(err: SchemaError) -> AssertionError {
  AssertionError::failure(format!("IDL resolution failed: {err}"))
}

pub fn idlharness(engine: Arc<dyn Engine>) -> TestFile {
  let mut file = TestFile::new(IDLHARNESS);
  let (schema, extended) = match (sensor_schema(&[]), sensor_schema(&[UNDECLARED_AXIS])) {
    (Ok(schema), Ok(extended)) => (Rc::new(schema), Rc::new(extended)),
    (Err(err), _) | (_, Err(err)) => {
      file.harness_error(format!("idl_test setup failed: {err}"));
      return file;
    }
  };

  {
    let schema = Rc::clone(&schema);
    file.test("Gyroscope interface: inherits Sensor members", move || {
      let gyroscope = schema.resolve("Gyroscope").map_err(resolve_failure)?;
      assert_array_equals(
        &gyroscope.chain,
        &["EventTarget", "Sensor", "Gyroscope"].map(String::from),
        "inheritance chain",
      )?;
      for member in ["start", "stop", "timestamp", "x", "y", "z"] {
        assert_true(gyroscope.member(member).is_some(), member)?;
      }
      Ok(())
    });
  }

  {
    let engine = Arc::clone(&engine);
    let schema = Rc::clone(&schema);
    file.test("Gyroscope interface: new Gyroscope() matches its IDL", move || {
      let gyroscope = engine.construct_sensor("Gyroscope", &SensorOptions::default())?;
      assert_structural_match(&schema, "Gyroscope", &gyroscope)?;
      Ok(())
    });
  }

  {
    let engine = Arc::clone(&engine);
    file.test("Sensor interface: new Sensor() throws TypeError", move || {
      assert_throws(ErrorKind::TypeError, || {
        engine.construct_sensor("Sensor", &SensorOptions::default())
      })?;
      Ok(())
    });
  }

  file.test(
    "Gyroscope interface: an undeclared member is reported alone",
    move || {
      let gyroscope = engine.construct_sensor("Gyroscope", &SensorOptions::default())?;
      let resolved = extended.resolve("Gyroscope").map_err(resolve_failure)?;
      let mismatches = check_shape(&resolved, &gyroscope);
      assert_equals(&mismatches.len(), &1, "mismatch count")?;
      assert_equals(mismatches[0].member(), "w", "mismatched member")?;
      Ok(())
    },
  );

  file
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::engine::StubEngine;
  use testharness::{run_file, Status};

  #[test]
  fn stub_engine_passes() {
    let file = idlharness(Arc::new(StubEngine::new()));
    assert!(file.harness_errors().is_empty());
    for (name, outcome) in run_file(&file) {
      assert_eq!(outcome.status(), Status::Pass, "{name}: {outcome:?}");
    }
  }

  #[test]
  fn gyroscope_members_include_sensor_members() {
    let schema = sensor_schema(&[]).unwrap();
    let gyroscope = schema.resolve("Gyroscope").unwrap();
    assert_eq!(
      gyroscope.member_names(),
      vec![
        "addEventListener",
        "removeEventListener",
        "dispatchEvent",
        "activated",
        "hasReading",
        "timestamp",
        "start",
        "stop",
        "onreading",
        "onactivate",
        "onerror",
        "x",
        "y",
        "z",
      ]
    );
  }
}
