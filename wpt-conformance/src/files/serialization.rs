use crate::engine::{ArrayBuffer, Engine, MessageTarget, SharedArrayBuffer, Value};
use std::sync::Arc;
use testharness::assert::{assert_equals, assert_throws, assert_true};
use testharness::{AssertionError, ErrorKind, TestFile};

pub const SERIALIZATION: &str =
  "html/infrastructure/safe-passing-of-structured-data/shared-array-buffers/serialization";

pub fn serialization(engine: Arc<dyn Engine>) -> TestFile {
  let mut file = TestFile::new(SERIALIZATION);

  {
    let engine = Arc::clone(&engine);
    file.test("A cloned SharedArrayBuffer shares memory with the original", move || {
      if !engine.cross_origin_isolated() {
        let sab = Value::SharedArrayBuffer(SharedArrayBuffer::new(4));
        assert_throws(ErrorKind::DataCloneError, || {
          engine.post_message(MessageTarget::Worker, &sab, &[])
        })?;
        return Ok(());
      }

      let original = SharedArrayBuffer::new(4);
      let received = engine.post_message(
        MessageTarget::Worker,
        &Value::object([("sab", Value::SharedArrayBuffer(original.clone()))]),
        &[],
      )?;
      let clone = received
        .get("sab")
        .and_then(Value::as_shared_array_buffer)
        .ok_or_else(|| AssertionError::failure("received message has no SharedArrayBuffer"))?;
      assert_equals(&clone.byte_length(), &4, "byteLength")?;
      clone.set(3, 7);
      assert_equals(&original.get(3), &Some(7), "write through the clone")?;
      Ok(())
    });
  }

  {
    let engine = Arc::clone(&engine);
    file.test("Transferring an ArrayBuffer detaches it", move || {
      let buffer = ArrayBuffer::from_bytes(vec![1, 2, 3]);
      let value = Value::ArrayBuffer(buffer.clone());
      let received = engine.structured_clone(&value, &[value.clone()])?;
      assert_true(buffer.is_detached(), "original is detached")?;
      assert_equals(&buffer.byte_length(), &0, "original byteLength")?;
      let bytes = received.as_array_buffer().and_then(ArrayBuffer::bytes);
      assert_equals(&bytes, &Some(vec![1, 2, 3]), "received contents")?;
      Ok(())
    });
  }

  {
    let engine = Arc::clone(&engine);
    file.test("An ArrayBuffer listed twice in the transfer list throws", move || {
      let buffer = Value::ArrayBuffer(ArrayBuffer::new(8));
      assert_throws(ErrorKind::DataCloneError, || {
        engine.structured_clone(&buffer, &[buffer.clone(), buffer.clone()])
      })?;
      Ok(())
    });
  }

  {
    let engine = Arc::clone(&engine);
    file.test("Transferring a detached ArrayBuffer throws", move || {
      let buffer = Value::ArrayBuffer(ArrayBuffer::new(8));
      engine.structured_clone(&Value::Null, &[buffer.clone()])?;
      assert_throws(ErrorKind::DataCloneError, || {
        engine.structured_clone(&Value::Null, &[buffer.clone()])
      })?;
      Ok(())
    });
  }

  let values = [
    ("number", Value::Number(1.0)),
    ("string", Value::String("sab".to_string())),
    ("object", Value::object([("a", Value::Null)])),
  ];
  file.test_each(
    "A non-transferable value in the transfer list throws",
    values,
    move |value| {
      assert_throws(ErrorKind::DataCloneError, || {
        engine.structured_clone(&Value::Undefined, std::slice::from_ref(value))
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
  fn passes_with_and_without_isolation() {
    for engine in [StubEngine::new(), StubEngine::without_isolation()] {
      let file = serialization(Arc::new(engine));
      for (name, outcome) in run_file(&file) {
        assert_eq!(outcome.status(), Status::Pass, "{name}: {outcome:?}");
      }
    }
  }
}
