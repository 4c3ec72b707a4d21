//! The seam between test files and the platform implementation they probe.
//!
//! Test files only ever talk to an [`Engine`]; the engine decides how values are cloned and how
//! platform objects are built. [`StubEngine`] models just enough of the behaviour the bundled files
//! observe.

mod buffer;
mod sensor;
mod stub;

pub use buffer::{ArrayBuffer, SharedArrayBuffer};
pub use sensor::{ReferenceFrame, SensorObject, SensorOptions, SENSOR_INTERFACES};
pub use stub::StubEngine;

use testharness::Signal;

/// A script value, as far as structured cloning cares.
#[derive(Debug, Clone)]
pub enum Value {
  Undefined,
  Null,
  Bool(bool),
  Number(f64),
  String(String),
  Array(Vec<Value>),
  /// Own enumerable properties in insertion order.
  Object(Vec<(String, Value)>),
  ArrayBuffer(ArrayBuffer),
  SharedArrayBuffer(SharedArrayBuffer),
}

impl Value {
  pub fn object<K: Into<String>>(props: impl IntoIterator<Item = (K, Value)>) -> Self {
    Value::Object(props.into_iter().map(|(k, v)| (k.into(), v)).collect())
  }

  pub fn type_name(&self) -> &'static str {
    match self {
      Value::Undefined => "undefined",
      Value::Null => "null",
      Value::Bool(_) => "boolean",
      Value::Number(_) => "number",
      Value::String(_) => "string",
      Value::Array(_) => "Array",
      Value::Object(_) => "Object",
      Value::ArrayBuffer(_) => "ArrayBuffer",
      Value::SharedArrayBuffer(_) => "SharedArrayBuffer",
    }
  }

  /// Looks up an own property of an object, or an index of an array.
  pub fn get(&self, key: &str) -> Option<&Value> {
    match self {
      Value::Object(props) => props.iter().find(|(k, _)| k == key).map(|(_, v)| v),
      Value::Array(items) => key.parse::<usize>().ok().and_then(|idx| items.get(idx)),
      _ => None,
    }
  }

  pub fn as_shared_array_buffer(&self) -> Option<&SharedArrayBuffer> {
    match self {
      Value::SharedArrayBuffer(sab) => Some(sab),
      _ => None,
    }
  }

  pub fn as_array_buffer(&self) -> Option<&ArrayBuffer> {
    match self {
      Value::ArrayBuffer(buffer) => Some(buffer),
      _ => None,
    }
  }
}

/// Where a `postMessage` call sends its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTarget {
  Window,
  Worker,
  MessagePort,
}

impl MessageTarget {
  pub const ALL: [MessageTarget; 3] = [
    MessageTarget::Window,
    MessageTarget::Worker,
    MessageTarget::MessagePort,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      MessageTarget::Window => "window",
      MessageTarget::Worker => "worker",
      MessageTarget::MessagePort => "MessagePort",
    }
  }
}

/// The platform under test.
pub trait Engine {
  fn name(&self) -> &str;

  /// Whether shared memory may cross agent boundaries.
  fn cross_origin_isolated(&self) -> bool;

  /// `structuredClone(value, { transfer })`.
  fn structured_clone(&self, value: &Value, transfer: &[Value]) -> Result<Value, Signal>;

  /// `target.postMessage(message, transfer)`, returning what the receiving side observes.
  fn post_message(
    &self,
    target: MessageTarget,
    message: &Value,
    transfer: &[Value],
  ) -> Result<Value, Signal>;

  /// `new <interface>(options)` for a sensor interface.
  fn construct_sensor(
    &self,
    interface: &str,
    options: &SensorOptions,
  ) -> Result<Box<dyn SensorObject>, Signal>;
}
