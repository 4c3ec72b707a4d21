use idl_schema::{Schema, SchemaError};

pub const DOM: &str = include_str!("../idl/dom.idl");
pub const GENERIC_SENSOR: &str = include_str!("../idl/generic-sensor.idl");
pub const GYROSCOPE: &str = include_str!("../idl/gyroscope.idl");
pub const ACCELEROMETER: &str = include_str!("../idl/accelerometer.idl");

/// The bundled sensor IDL plus any `extra` fragments, e.g. partial interfaces a test adds.
pub fn sensor_schema(extra: &[&str]) -> Result<Schema, SchemaError> {
  Schema::parse_all(
    [DOM, GENERIC_SENSOR, GYROSCOPE, ACCELEROMETER]
      .into_iter()
      .chain(extra.iter().copied()),
  )
}
