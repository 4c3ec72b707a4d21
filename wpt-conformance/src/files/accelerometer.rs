use crate::engine::{Engine, SensorOptions};
use crate::idl::sensor_schema;
use std::rc::Rc;
use std::sync::Arc;
use testharness::assert::{assert_structural_match, assert_true};
use testharness::{AssertionError, TestFile};

pub const IDLHARNESS: &str = "accelerometer/idlharness";

const INTERFACES: [&str; 3] = ["Accelerometer", "LinearAccelerationSensor", "GravitySensor"];

pub fn idlharness(engine: Arc<dyn Engine>) -> TestFile {
  let mut file = TestFile::new(IDLHARNESS);
  let schema = match sensor_schema(&[]) {
    Ok(schema) => Rc::new(schema),
    Err(err) => {
      file.harness_error(format!("idl_test setup failed: {err}"));
      return file;
    }
  };

  {
    let schema = Rc::clone(&schema);
    file.test_each(
      "interface inherits from Accelerometer",
      ["LinearAccelerationSensor", "GravitySensor"].map(|name| (name, name)),
      move |name| {
        let resolved = schema
          .resolve(name)
          .map_err(|err| AssertionError::failure(err.to_string()))?;
        assert_true(resolved.inherits_from("Accelerometer"), "Accelerometer in chain")?;
        assert_true(resolved.inherits_from("Sensor"), "Sensor in chain")?;
        Ok(())
      },
    );
  }

  file.test_each(
    "new object matches its IDL",
    INTERFACES.map(|name| (name, name)),
    move |name| {
      let sensor = engine.construct_sensor(name, &SensorOptions::default())?;
      assert_structural_match(&schema, name, &sensor)?;
      Ok(())
    },
  );

  file
}
