use crate::engine::{Engine, ReferenceFrame, SensorOptions, SENSOR_INTERFACES};
use std::sync::Arc;
use testharness::assert::{assert_equals, assert_false, assert_throws, assert_true};
use testharness::{ErrorKind, TestFile};

pub const SENSOR_LIFECYCLE: &str = "generic-sensor/sensor-lifecycle";

fn interfaces() -> [(&'static str, &'static str); 4] {
  SENSOR_INTERFACES.map(|name| (name, name))
}

/// Activation, readings and constructor validation shared by every sensor type.
pub fn sensor_lifecycle(engine: Arc<dyn Engine>) -> TestFile {
  let mut file = TestFile::new(SENSOR_LIFECYCLE);

  {
    let engine = Arc::clone(&engine);
    file.test_each("Readings are null before start()", interfaces(), move |name| {
      let sensor = engine.construct_sensor(name, &SensorOptions::default())?;
      assert_false(sensor.activated(), "activated")?;
      assert_false(sensor.has_reading(), "hasReading")?;
      assert_equals(&sensor.timestamp(), &None, "timestamp")?;
      for axis in ["x", "y", "z"] {
        assert_equals(&sensor.axis(axis), &None, axis)?;
      }
      Ok(())
    });
  }

  {
    let engine = Arc::clone(&engine);
    file.test_each(
      "start() activates the sensor and produces a reading",
      interfaces(),
      move |name| {
        let mut sensor = engine.construct_sensor(name, &SensorOptions::default())?;
        sensor.start()?;
        assert_true(sensor.activated(), "activated")?;
        assert_true(sensor.has_reading(), "hasReading")?;
        let first = sensor.timestamp();
        assert_true(first.is_some(), "timestamp after start()")?;
        for axis in ["x", "y", "z"] {
          assert_true(sensor.axis(axis).is_some_and(f64::is_finite), axis)?;
        }

        sensor.start()?;
        assert_equals(&sensor.timestamp(), &first, "start() on an active sensor")?;
        Ok(())
      },
    );
  }

  {
    let engine = Arc::clone(&engine);
    file.test_each("stop() clears the reading", interfaces(), move |name| {
      let mut sensor = engine.construct_sensor(name, &SensorOptions::default())?;
      sensor.start()?;
      sensor.stop()?;
      assert_false(sensor.activated(), "activated")?;
      assert_false(sensor.has_reading(), "hasReading")?;
      assert_equals(&sensor.axis("x"), &None, "x")?;
      Ok(())
    });
  }

  {
    let engine = Arc::clone(&engine);
    let frames = [
      ("device", ("device", ReferenceFrame::Device)),
      ("screen", ("screen", ReferenceFrame::Screen)),
    ];
    file.test_each("referenceFrame is honored", frames, move |(raw, frame)| {
      let options = SensorOptions::with_reference_frame(*raw);
      let sensor = engine.construct_sensor("Gyroscope", &options)?;
      assert_equals(&sensor.reference_frame(), frame, "referenceFrame")?;
      Ok(())
    });
  }

  file.test_each(
    "An invalid referenceFrame throws TypeError",
    interfaces(),
    move |name| {
      assert_throws(ErrorKind::TypeError, || {
        engine.construct_sensor(name, &SensorOptions::with_reference_frame("invalid"))
      })?;
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
    let file = sensor_lifecycle(Arc::new(StubEngine::new()));
    let outcomes = run_file(&file);
    assert_eq!(outcomes.len(), 4 * 4 + 2);
    for (name, outcome) in outcomes {
      assert_eq!(outcome.status(), Status::Pass, "{name}: {outcome:?}");
    }
  }
}
