use idl_schema::{MemberKind, PlatformObject};
use testharness::{ErrorKind, Signal};

/// Sensor interfaces that have a constructor.
pub const SENSOR_INTERFACES: [&str; 4] = [
  "Gyroscope",
  "Accelerometer",
  "LinearAccelerationSensor",
  "GravitySensor",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferenceFrame {
  #[default]
  Device,
  Screen,
}

impl ReferenceFrame {
  pub fn parse(raw: &str) -> Option<Self> {
    match raw {
      "device" => Some(ReferenceFrame::Device),
      "screen" => Some(ReferenceFrame::Screen),
      _ => None,
    }
  }
}

/// The dictionary passed to a sensor constructor.
#[derive(Debug, Clone, Default)]
pub struct SensorOptions {
  pub frequency: Option<f64>,
  /// Raw `referenceFrame` member; validated by the constructor.
  pub reference_frame: Option<String>,
}

impl SensorOptions {
  pub fn with_frequency(frequency: f64) -> Self {
    Self {
      frequency: Some(frequency),
      ..Self::default()
    }
  }

  pub fn with_reference_frame(frame: impl Into<String>) -> Self {
    Self {
      reference_frame: Some(frame.into()),
      ..Self::default()
    }
  }
}

/// A constructed sensor. Readings are `None` until the sensor has activated and produced one.
pub trait SensorObject: PlatformObject {
  fn activated(&self) -> bool;
  fn has_reading(&self) -> bool;
  fn timestamp(&self) -> Option<f64>;
  fn reference_frame(&self) -> ReferenceFrame;
  fn start(&mut self) -> Result<(), Signal>;
  fn stop(&mut self) -> Result<(), Signal>;
  /// `x`, `y` or `z`; `None` for other names.
  fn axis(&self, name: &str) -> Option<f64>;
}

const EVENT_TARGET: &[(&str, MemberKind)] = &[
  ("addEventListener", MemberKind::Operation),
  ("removeEventListener", MemberKind::Operation),
  ("dispatchEvent", MemberKind::Operation),
];

const SENSOR: &[(&str, MemberKind)] = &[
  ("activated", MemberKind::Readonly),
  ("hasReading", MemberKind::Readonly),
  ("timestamp", MemberKind::Readonly),
  ("start", MemberKind::Operation),
  ("stop", MemberKind::Operation),
  ("onreading", MemberKind::Event),
  ("onactivate", MemberKind::Event),
  ("onerror", MemberKind::Event),
];

const AXES: &[(&str, MemberKind)] = &[
  ("x", MemberKind::Readonly),
  ("y", MemberKind::Readonly),
  ("z", MemberKind::Readonly),
];

#[derive(Debug, Clone, Copy)]
struct Reading {
  timestamp: f64,
  xyz: [f64; 3],
}

/// Deterministic readings per interface, in device coordinates.
fn sample(interface: &str) -> [f64; 3] {
  match interface {
    "Gyroscope" => [0.25, -0.5, 1.0],
    "Accelerometer" => [0.1, 0.2, 9.9],
    "LinearAccelerationSensor" => [0.1, 0.2, 0.09],
    _ => [0.0, 0.0, 9.81],
  }
}

#[derive(Debug)]
pub(crate) struct StubSensor {
  interface: &'static str,
  frame: ReferenceFrame,
  activated: bool,
  reading: Option<Reading>,
  /// Milliseconds since the sensor was constructed.
  clock: f64,
  period: f64,
}

impl StubSensor {
  pub(crate) fn construct(interface: &str, options: &SensorOptions) -> Result<Self, Signal> {
    let interface = match SENSOR_INTERFACES.iter().find(|name| **name == interface) {
      Some(name) => *name,
      None if interface == "Sensor" => return Err(Signal::type_error("Illegal constructor")),
      None => {
        return Err(Signal::new(
          ErrorKind::Other("ReferenceError".to_string()),
          format!("{interface} is not defined"),
        ))
      }
    };

    let frame = match options.reference_frame.as_deref() {
      None => ReferenceFrame::default(),
      Some(raw) => ReferenceFrame::parse(raw).ok_or_else(|| {
        Signal::type_error(format!(
          "Failed to construct '{interface}': The provided value '{raw}' is not a valid enum \
           value of type LocalCoordinateSystem."
        ))
      })?,
    };

    let frequency = options.frequency.unwrap_or(60.0);
    if !frequency.is_finite() || frequency <= 0.0 {
      return Err(Signal::type_error(format!(
        "Failed to construct '{interface}': frequency must be positive"
      )));
    }

    Ok(Self {
      interface,
      frame,
      activated: false,
      reading: None,
      clock: 0.0,
      period: 1000.0 / frequency,
    })
  }
}

impl PlatformObject for StubSensor {
  fn interface_name(&self) -> &str {
    self.interface
  }

  fn member_kind(&self, name: &str) -> Option<MemberKind> {
    [EVENT_TARGET, SENSOR, AXES]
      .into_iter()
      .flatten()
      .find(|(member, _)| *member == name)
      .map(|(_, kind)| *kind)
  }
}

impl SensorObject for StubSensor {
  fn activated(&self) -> bool {
    self.activated
  }

  fn has_reading(&self) -> bool {
    self.reading.is_some()
  }

  fn timestamp(&self) -> Option<f64> {
    self.reading.map(|reading| reading.timestamp)
  }

  fn reference_frame(&self) -> ReferenceFrame {
    self.frame
  }

  fn start(&mut self) -> Result<(), Signal> {
    if self.activated {
      return Ok(());
    }
    self.activated = true;
    self.clock += self.period;
    let [x, y, z] = sample(self.interface);
    // Screen coordinates for a device rotated 90 degrees.
    let xyz = match self.frame {
      ReferenceFrame::Device => [x, y, z],
      ReferenceFrame::Screen => [-y, x, z],
    };
    self.reading = Some(Reading {
      timestamp: self.clock,
      xyz,
    });
    Ok(())
  }

  fn stop(&mut self) -> Result<(), Signal> {
    self.activated = false;
    self.reading = None;
    Ok(())
  }

  fn axis(&self, name: &str) -> Option<f64> {
    let idx = match name {
      "x" => 0,
      "y" => 1,
      "z" => 2,
      _ => return None,
    };
    self.reading.map(|reading| reading.xyz[idx])
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn readings_follow_activation() {
    let mut gyro = StubSensor::construct("Gyroscope", &SensorOptions::default()).unwrap();
    assert!(!gyro.activated());
    assert_eq!(gyro.axis("x"), None);

    gyro.start().unwrap();
    assert!(gyro.activated() && gyro.has_reading());
    assert_eq!(gyro.axis("z"), Some(1.0));
    assert!(gyro.timestamp().is_some_and(|t| t > 0.0));

    gyro.stop().unwrap();
    assert!(!gyro.has_reading());
    assert_eq!(gyro.timestamp(), None);
  }

  #[test]
  fn constructor_validates_options() {
    let err = StubSensor::construct("Gyroscope", &SensorOptions::with_reference_frame("dvc"))
      .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
    assert!(err.message.contains("'dvc'"), "{}", err.message);

    let err = StubSensor::construct("Accelerometer", &SensorOptions::with_frequency(-1.0))
      .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);

    let err = StubSensor::construct("Sensor", &SensorOptions::default()).unwrap_err();
    assert_eq!(err, Signal::type_error("Illegal constructor"));
  }

  #[test]
  fn members_include_inherited_slots() {
    let gravity = StubSensor::construct("GravitySensor", &SensorOptions::default()).unwrap();
    assert_eq!(gravity.member_kind("onreading"), Some(MemberKind::Event));
    assert_eq!(gravity.member_kind("dispatchEvent"), Some(MemberKind::Operation));
    assert_eq!(gravity.member_kind("y"), Some(MemberKind::Readonly));
    assert_eq!(gravity.member_kind("w"), None);
  }
}
