//! Bundled test files. Each is a function that builds its own [`TestFile`] against an engine.

pub mod accelerometer;
pub mod gyroscope;
pub mod sensor_lifecycle;
pub mod serialization;
pub mod shared_buffers;

use crate::engine::Engine;
use std::sync::Arc;
use testharness::TestFile;

/// Every bundled file, in no particular order; the runner sorts by id.
pub fn all_files(engine: Arc<dyn Engine>) -> Vec<TestFile> {
  vec![
    shared_buffers::no_transferring(Arc::clone(&engine)),
    serialization::serialization(Arc::clone(&engine)),
    gyroscope::idlharness(Arc::clone(&engine)),
    accelerometer::idlharness(Arc::clone(&engine)),
    sensor_lifecycle::sensor_lifecycle(engine),
  ]
}
