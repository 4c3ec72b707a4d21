use super::buffer::{ArrayBuffer, SharedArrayBuffer};
use super::sensor::{SensorObject, SensorOptions, StubSensor};
use super::{Engine, MessageTarget, Value};
use ahash::AHashMap;
use testharness::Signal;
use tracing::trace;

/// An in-process model of the platform behaviour the bundled test files probe.
///
/// Structured cloning follows the HTML serialization rules for the value kinds [`Value`] can
/// express. It is not a general implementation of the algorithm.
#[derive(Debug, Clone)]
pub struct StubEngine {
  cross_origin_isolated: bool,
}

impl Default for StubEngine {
  fn default() -> Self {
    Self {
      cross_origin_isolated: true,
    }
  }
}

impl StubEngine {
  pub fn new() -> Self {
    Self::default()
  }

  /// An engine whose documents are not cross-origin isolated, so shared memory cannot be sent.
  pub fn without_isolation() -> Self {
    Self {
      cross_origin_isolated: false,
    }
  }

  fn clone_with_transfer(&self, value: &Value, transfer: &[Value]) -> Result<Value, Signal> {
    let transferred = validate_transfer_list(transfer)?;
    let mut cloner = Cloner {
      isolated: self.cross_origin_isolated,
      transferred: &transferred,
      buffers: AHashMap::default(),
    };
    let cloned = cloner.clone_value(value)?;

    // Detach only after the whole value serialized.
    for buffer in &transferred {
      buffer.detach();
    }
    Ok(cloned)
  }
}

/// Checks the transfer list before anything is serialized.
fn validate_transfer_list(transfer: &[Value]) -> Result<Vec<ArrayBuffer>, Signal> {
  let mut buffers: Vec<ArrayBuffer> = Vec::with_capacity(transfer.len());
  for item in transfer {
    match item {
      Value::SharedArrayBuffer(_) => {
        return Err(Signal::data_clone(
          "SharedArrayBuffer is not transferable",
        ))
      }
      Value::ArrayBuffer(buffer) => {
        if buffers.iter().any(|seen| seen.same_buffer(buffer)) {
          return Err(Signal::data_clone(
            "ArrayBuffer appears more than once in the transfer list",
          ));
        }
        if buffer.is_detached() {
          return Err(Signal::data_clone("ArrayBuffer is detached"));
        }
        buffers.push(buffer.clone());
      }
      other => {
        return Err(Signal::data_clone(format!(
          "value of type {} is not transferable",
          other.type_name()
        )))
      }
    }
  }
  Ok(buffers)
}

struct Cloner<'a> {
  isolated: bool,
  transferred: &'a [ArrayBuffer],
  /// Clones of buffers already seen, keyed by identity, so aliasing survives the clone.
  buffers: AHashMap<usize, ArrayBuffer>,
}

impl Cloner<'_> {
  fn clone_value(&mut self, value: &Value) -> Result<Value, Signal> {
    Ok(match value {
      Value::Undefined => Value::Undefined,
      Value::Null => Value::Null,
      Value::Bool(b) => Value::Bool(*b),
      Value::Number(n) => Value::Number(*n),
      Value::String(s) => Value::String(s.clone()),
      Value::Array(items) => Value::Array(
        items
          .iter()
          .map(|item| self.clone_value(item))
          .collect::<Result<_, _>>()?,
      ),
      Value::Object(props) => Value::Object(
        props
          .iter()
          .map(|(key, item)| Ok((key.clone(), self.clone_value(item)?)))
          .collect::<Result<_, Signal>>()?,
      ),
      Value::ArrayBuffer(buffer) => Value::ArrayBuffer(self.clone_buffer(buffer)?),
      Value::SharedArrayBuffer(sab) => Value::SharedArrayBuffer(self.share(sab)?),
    })
  }

  fn clone_buffer(&mut self, buffer: &ArrayBuffer) -> Result<ArrayBuffer, Signal> {
    let key = buffer.identity();
    if let Some(existing) = self.buffers.get(&key) {
      return Ok(existing.clone());
    }
    let Some(bytes) = buffer.bytes() else {
      return Err(Signal::data_clone("ArrayBuffer is detached"));
    };
    if self.transferred.iter().any(|t| t.same_buffer(buffer)) {
      trace!(target: "wpt_conformance::engine", len = bytes.len(), "transferring ArrayBuffer");
    }
    let cloned = ArrayBuffer::from_bytes(bytes);
    self.buffers.insert(key, cloned.clone());
    Ok(cloned)
  }

  fn share(&self, sab: &SharedArrayBuffer) -> Result<SharedArrayBuffer, Signal> {
    if !self.isolated {
      return Err(Signal::data_clone(
        "SharedArrayBuffer cannot be serialized without cross-origin isolation",
      ));
    }
    Ok(sab.clone())
  }
}

impl Engine for StubEngine {
  fn name(&self) -> &str {
    "stub"
  }

  fn cross_origin_isolated(&self) -> bool {
    self.cross_origin_isolated
  }

  fn structured_clone(&self, value: &Value, transfer: &[Value]) -> Result<Value, Signal> {
    self.clone_with_transfer(value, transfer)
  }

  fn post_message(
    &self,
    target: MessageTarget,
    message: &Value,
    transfer: &[Value],
  ) -> Result<Value, Signal> {
    trace!(target: "wpt_conformance::engine", to = target.as_str(), "postMessage");
    self.clone_with_transfer(message, transfer)
  }

  fn construct_sensor(
    &self,
    interface: &str,
    options: &SensorOptions,
  ) -> Result<Box<dyn SensorObject>, Signal> {
    Ok(Box::new(StubSensor::construct(interface, options)?))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use testharness::ErrorKind;

  #[test]
  fn shared_buffers_cannot_be_transferred() {
    let engine = StubEngine::new();
    let sab = Value::SharedArrayBuffer(SharedArrayBuffer::new(0));
    let nested = Value::object([("sab", sab.clone())]);
    for message in [&sab, &nested] {
      let err = engine.structured_clone(message, &[sab.clone()]).unwrap_err();
      assert_eq!(err.kind, ErrorKind::DataCloneError);
    }
  }

  #[test]
  fn failed_clone_leaves_transfer_list_attached() {
    let engine = StubEngine::new();
    let buffer = ArrayBuffer::new(8);
    let message = Value::Array(vec![
      Value::ArrayBuffer(buffer.clone()),
      Value::SharedArrayBuffer(SharedArrayBuffer::new(1)),
    ]);
    let err = engine
      .structured_clone(&message, &[Value::Number(1.0)])
      .unwrap_err();
    assert!(err.message.contains("number"), "{}", err.message);
    assert!(!buffer.is_detached());

    let isolated_off = StubEngine::without_isolation();
    let err = isolated_off
      .structured_clone(&message, &[Value::ArrayBuffer(buffer.clone())])
      .unwrap_err();
    assert_eq!(err.kind, ErrorKind::DataCloneError);
    assert!(!buffer.is_detached());
  }

  #[test]
  fn transfer_detaches_and_aliasing_is_preserved() {
    let engine = StubEngine::new();
    let buffer = ArrayBuffer::from_bytes(vec![1, 2]);
    let message = Value::Array(vec![
      Value::ArrayBuffer(buffer.clone()),
      Value::ArrayBuffer(buffer.clone()),
    ]);
    let cloned = engine
      .structured_clone(&message, &[Value::ArrayBuffer(buffer.clone())])
      .unwrap();
    assert!(buffer.is_detached());

    let first = cloned.get("0").and_then(Value::as_array_buffer).unwrap();
    let second = cloned.get("1").and_then(Value::as_array_buffer).unwrap();
    assert!(first.same_buffer(second));
    assert_eq!(first.bytes(), Some(vec![1, 2]));
  }
}
