use crate::error::HarnessError;
use crate::outcome::Outcome;
use crate::report::{HarnessErrorEntry, Report, Summary, TestResult};
use std::io::Write;

/// Receives results as a run produces them.
///
/// `result` is called once per test case in run order, `harness_error` once per registration
/// problem, and `finish` exactly once at the end.
pub trait ReportSink {
  fn result(&mut self, result: &TestResult) -> Result<(), HarnessError>;
  fn harness_error(&mut self, file: &str, message: &str) -> Result<(), HarnessError>;
  fn finish(&mut self, summary: &Summary) -> Result<(), HarnessError>;
}

impl<S: ReportSink + ?Sized> ReportSink for &mut S {
  fn result(&mut self, result: &TestResult) -> Result<(), HarnessError> {
    (**self).result(result)
  }

  fn harness_error(&mut self, file: &str, message: &str) -> Result<(), HarnessError> {
    (**self).harness_error(file, message)
  }

  fn finish(&mut self, summary: &Summary) -> Result<(), HarnessError> {
    (**self).finish(summary)
  }
}

/// Feeds both sinks, first `A` then `B`.
impl<A: ReportSink, B: ReportSink> ReportSink for (A, B) {
  fn result(&mut self, result: &TestResult) -> Result<(), HarnessError> {
    self.0.result(result)?;
    self.1.result(result)
  }

  fn harness_error(&mut self, file: &str, message: &str) -> Result<(), HarnessError> {
    self.0.harness_error(file, message)?;
    self.1.harness_error(file, message)
  }

  fn finish(&mut self, summary: &Summary) -> Result<(), HarnessError> {
    self.0.finish(summary)?;
    self.1.finish(summary)
  }
}

/// Keeps everything in memory for a JSON [`Report`].
#[derive(Debug, Default)]
pub struct CollectingSink {
  results: Vec<TestResult>,
  harness_errors: Vec<HarnessErrorEntry>,
  summary: Option<Summary>,
}

impl CollectingSink {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn results(&self) -> &[TestResult] {
    &self.results
  }

  /// Uses the summary passed to `finish`, or computes one if the run never finished.
  pub fn into_report(self) -> Report {
    let summary = self
      .summary
      .unwrap_or_else(|| Summary::from_results(&self.results, self.harness_errors.len()));
    Report::new(summary, self.harness_errors, self.results)
  }
}

impl ReportSink for CollectingSink {
  fn result(&mut self, result: &TestResult) -> Result<(), HarnessError> {
    self.results.push(result.clone());
    Ok(())
  }

  fn harness_error(&mut self, file: &str, message: &str) -> Result<(), HarnessError> {
    self.harness_errors.push(HarnessErrorEntry {
      file: file.to_string(),
      message: message.to_string(),
    });
    Ok(())
  }

  fn finish(&mut self, summary: &Summary) -> Result<(), HarnessError> {
    self.summary = Some(summary.clone());
    Ok(())
  }
}

/// Writes one line per result, `STATUS id[: message]`, then a summary line.
///
/// Results the expectations manifest predicted carry an `(expected)` suffix.
#[derive(Debug)]
pub struct TextSink<W: Write> {
  out: W,
}

impl<W: Write> TextSink<W> {
  pub fn new(out: W) -> Self {
    Self { out }
  }

  pub fn into_inner(self) -> W {
    self.out
  }
}

impl<W: Write> ReportSink for TextSink<W> {
  fn result(&mut self, result: &TestResult) -> Result<(), HarnessError> {
    let status = result.status();
    write!(self.out, "{status} {}", result.id)?;
    match &result.outcome {
      Outcome::Pass => {}
      Outcome::Fail { message } => write!(self.out, ": {message}")?,
      Outcome::Error { kind, message } => write!(self.out, ": {kind}: {message}")?,
      Outcome::Skip { reason } => {
        if let Some(reason) = reason {
          write!(self.out, ": {reason}")?;
        }
      }
    }
    if result.expectation.from_manifest && result.expectation.expected && status.is_fail_like() {
      write!(self.out, " (expected)")?;
    }
    writeln!(self.out)?;
    Ok(())
  }

  fn harness_error(&mut self, file: &str, message: &str) -> Result<(), HarnessError> {
    writeln!(self.out, "HARNESS ERROR {file}: {message}")?;
    Ok(())
  }

  fn finish(&mut self, summary: &Summary) -> Result<(), HarnessError> {
    writeln!(
      self.out,
      "{} tests: {} passed, {} failed, {} errored, {} skipped",
      summary.total, summary.passed, summary.failed, summary.errored, summary.skipped
    )?;
    if summary.harness_errors > 0 {
      writeln!(self.out, "{} harness errors", summary.harness_errors)?;
    }
    if summary.mismatches.unexpected > 0 {
      writeln!(
        self.out,
        "{} unexpected results",
        summary.mismatches.unexpected
      )?;
    }
    self.out.flush()?;
    Ok(())
  }
}
