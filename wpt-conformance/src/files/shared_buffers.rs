use crate::engine::{Engine, MessageTarget, SharedArrayBuffer, Value};
use std::sync::Arc;
use testharness::assert::assert_throws;
use testharness::{ErrorKind, TestFile};

pub const NO_TRANSFERRING: &str =
  "html/infrastructure/safe-passing-of-structured-data/shared-array-buffers/no-transferring";

#[derive(Debug, Clone, Copy)]
enum Nesting {
  Object,
  Array,
}

fn wrap(nesting: Nesting, sab: Value) -> Value {
  match nesting {
    Nesting::Object => Value::object([("buffer", sab)]),
    Nesting::Array => Value::Array(vec![Value::Number(1.0), sab]),
  }
}

/// A SharedArrayBuffer can be sent, but never listed as transferable.
pub fn no_transferring(engine: Arc<dyn Engine>) -> TestFile {
  let mut file = TestFile::new(NO_TRANSFERRING);

  let targets = MessageTarget::ALL.map(|target| (target.as_str(), target));
  {
    let engine = Arc::clone(&engine);
    file.test_each(
      "Trying to transfer a SharedArrayBuffer throws",
      targets,
      move |target| {
        let sab = Value::SharedArrayBuffer(SharedArrayBuffer::new(0));
        assert_throws(ErrorKind::DataCloneError, || {
          engine.post_message(*target, &sab, &[sab.clone()])
        })?;
        Ok(())
      },
    );
  }

  let nested = MessageTarget::ALL.into_iter().flat_map(|target| {
    [Nesting::Object, Nesting::Array].map(move |nesting| {
      (
        format!("{}, {nesting:?}", target.as_str()).to_lowercase(),
        (target, nesting),
      )
    })
  });
  {
    let engine = Arc::clone(&engine);
    file.test_each(
      "Trying to transfer a SharedArrayBuffer nested in another value throws",
      nested,
      move |(target, nesting)| {
        let sab = Value::SharedArrayBuffer(SharedArrayBuffer::new(0));
        let message = wrap(*nesting, sab.clone());
        assert_throws(ErrorKind::DataCloneError, || {
          engine.post_message(*target, &message, &[sab.clone()])
        })?;
        Ok(())
      },
    );
  }

  {
    let engine = Arc::clone(&engine);
    file.test(
      "Trying to transfer a SharedArrayBuffer through structuredClone throws",
      move || {
        let sab = Value::SharedArrayBuffer(SharedArrayBuffer::new(0));
        assert_throws(ErrorKind::DataCloneError, || {
          engine.structured_clone(&sab, &[sab.clone()])
        })?;
        Ok(())
      },
    );
  }

  file.test(
    "Trying to transfer a non-empty SharedArrayBuffer throws",
    move || {
      let sab = SharedArrayBuffer::new(16);
      sab.set(0, 42);
      let value = Value::SharedArrayBuffer(sab);
      assert_throws(ErrorKind::DataCloneError, || {
        engine.post_message(MessageTarget::Worker, &value, &[value.clone()])
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
  fn stub_engine_passes_every_case() {
    let file = no_transferring(Arc::new(StubEngine::new()));
    assert_eq!(file.len(), 3 + 6 + 1 + 1);
    assert!(file.harness_errors().is_empty());
    for (name, outcome) in run_file(&file) {
      assert_eq!(outcome.status(), Status::Pass, "{name}: {outcome:?}");
    }
    assert!(file
      .cases()
      .iter()
      .any(|case| case.name() == "Trying to transfer a SharedArrayBuffer nested in another value throws [messageport, array]"));
  }
}
