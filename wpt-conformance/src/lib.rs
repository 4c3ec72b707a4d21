//! Web-platform conformance files for structured cloning and the Generic Sensor family.
//!
//! The files in [`files`] only talk to an [`engine::Engine`]. Interface shapes come from the
//! WebIDL fragments bundled in [`idl`]. Running and reporting is left to `testharness`.

pub mod engine;
pub mod files;
pub mod idl;
