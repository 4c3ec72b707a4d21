use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// A `SharedArrayBuffer`: clones share one block of memory.
#[derive(Clone)]
pub struct SharedArrayBuffer {
  data: Arc<Mutex<Vec<u8>>>,
}

impl SharedArrayBuffer {
  pub fn new(byte_length: usize) -> Self {
    Self {
      data: Arc::new(Mutex::new(vec![0; byte_length])),
    }
  }

  pub fn byte_length(&self) -> usize {
    self.data.lock().len()
  }

  pub fn get(&self, index: usize) -> Option<u8> {
    self.data.lock().get(index).copied()
  }

  /// Returns false when `index` is out of bounds.
  pub fn set(&self, index: usize, byte: u8) -> bool {
    match self.data.lock().get_mut(index) {
      Some(slot) => {
        *slot = byte;
        true
      }
      None => false,
    }
  }

  pub fn same_memory(&self, other: &SharedArrayBuffer) -> bool {
    Arc::ptr_eq(&self.data, &other.data)
  }
}

impl fmt::Debug for SharedArrayBuffer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "SharedArrayBuffer({})", self.byte_length())
  }
}

/// An `ArrayBuffer`, which transferring detaches.
///
/// Handles are cheap clones of one buffer identity; detaching through any handle detaches all.
#[derive(Clone)]
pub struct ArrayBuffer {
  data: Arc<Mutex<Option<Vec<u8>>>>,
}

impl ArrayBuffer {
  pub fn new(byte_length: usize) -> Self {
    Self::from_bytes(vec![0; byte_length])
  }

  pub fn from_bytes(bytes: Vec<u8>) -> Self {
    Self {
      data: Arc::new(Mutex::new(Some(bytes))),
    }
  }

  /// Zero once detached.
  pub fn byte_length(&self) -> usize {
    self.data.lock().as_ref().map_or(0, Vec::len)
  }

  pub fn is_detached(&self) -> bool {
    self.data.lock().is_none()
  }

  pub fn bytes(&self) -> Option<Vec<u8>> {
    self.data.lock().as_ref().cloned()
  }

  pub fn same_buffer(&self, other: &ArrayBuffer) -> bool {
    Arc::ptr_eq(&self.data, &other.data)
  }

  pub(crate) fn identity(&self) -> usize {
    Arc::as_ptr(&self.data) as usize
  }

  /// Takes the contents, leaving this buffer detached. `None` if already detached.
  pub(crate) fn detach(&self) -> Option<Vec<u8>> {
    self.data.lock().take()
  }
}

impl fmt::Debug for ArrayBuffer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &*self.data.lock() {
      Some(bytes) => write!(f, "ArrayBuffer({})", bytes.len()),
      None => f.write_str("ArrayBuffer(detached)"),
    }
  }
}
