//! A small testharness for declarative platform conformance tests.
//!
//! Test files are plain functions that build a [`TestFile`] of named cases. Each case body returns
//! a [`CaseResult`]: assertion failures make the case fail, signals propagated with `?` make it
//! error, and panics are caught at the case boundary. Runs feed [`TestResult`]s into a
//! [`ReportSink`] and are classified against an [`Expectations`] manifest.

pub mod assert;
mod error;
mod expectations;
mod fail_on;
mod outcome;
mod registry;
mod report;
mod runner;
mod shard;
mod sink;

pub use error::{AssertionError, CaseResult, ErrorKind, Failure, HarnessError, Signal};
pub use expectations::{AppliedExpectation, Expectation, ExpectedStatus, Expectations};
pub use fail_on::FailOn;
pub use outcome::{Outcome, Status, TestState};
pub use registry::{TestCase, TestFile};
pub use report::{
  compare_reports, read_report, test_id, write_json_report, Comparison, ExpectationOutcome,
  HarnessErrorEntry, MismatchSummary, Report, StatusChange, Summary, TestResult,
  REPORT_SCHEMA_VERSION,
};
pub use runner::{build_filter, run_case, run_file, run_files, select_files, Filter, RunOptions};
pub use shard::{apply_shard, Shard};
pub use sink::{CollectingSink, ReportSink, TextSink};
