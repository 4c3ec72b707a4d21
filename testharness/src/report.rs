use crate::error::HarnessError;
use crate::expectations::{AppliedExpectation, ExpectedStatus};
use crate::fail_on::FailOn;
use crate::outcome::{Outcome, Status};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const REPORT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExpectationOutcome {
  pub status: ExpectedStatus,
  /// Whether the actual outcome is the one the expectation predicted.
  #[serde(default)]
  pub expected: bool,
  #[serde(default)]
  pub from_manifest: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub reason: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub bug: Option<String>,
}

impl ExpectationOutcome {
  pub(crate) fn new(applied: AppliedExpectation, status: Status) -> Self {
    Self {
      expected: applied.matches(status),
      status: applied.expectation.status,
      from_manifest: applied.from_manifest,
      reason: applied.expectation.reason,
      bug: applied.expectation.bug,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestResult {
  /// `file::name`.
  pub id: String,
  pub file: String,
  pub name: String,
  pub outcome: Outcome,
  pub expectation: ExpectationOutcome,
  /// The outcome is a failure or an error.
  #[serde(default, skip_serializing_if = "is_false")]
  pub mismatched: bool,
}

impl TestResult {
  pub fn new(file: &str, name: &str, outcome: Outcome, applied: AppliedExpectation) -> Self {
    let status = outcome.status();
    Self {
      id: test_id(file, name),
      file: file.to_string(),
      name: name.to_string(),
      expectation: ExpectationOutcome::new(applied, status),
      mismatched: status.is_fail_like(),
      outcome,
    }
  }

  pub fn status(&self) -> Status {
    self.outcome.status()
  }

  /// The manifest did not predict this outcome; this includes unexpected passes.
  pub fn is_unexpected(&self) -> bool {
    !self.expectation.expected
  }
}

fn is_false(value: &bool) -> bool {
  !*value
}

pub fn test_id(file: &str, name: &str) -> String {
  format!("{file}::{name}")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HarnessErrorEntry {
  pub file: String,
  pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct MismatchSummary {
  /// Failures and errors the manifest predicted.
  pub expected: usize,
  /// Results the manifest did not predict, unexpected passes included.
  pub unexpected: usize,
  /// Failures and errors of tests marked flaky.
  pub flaky: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Summary {
  pub total: usize,
  pub passed: usize,
  pub failed: usize,
  pub errored: usize,
  pub skipped: usize,
  #[serde(default)]
  pub harness_errors: usize,
  #[serde(default)]
  pub mismatches: MismatchSummary,
}

impl Summary {
  pub fn from_results(results: &[TestResult], harness_errors: usize) -> Self {
    let mut summary = Summary {
      harness_errors,
      ..Summary::default()
    };

    for result in results {
      summary.total += 1;
      match result.status() {
        Status::Pass => summary.passed += 1,
        Status::Fail => summary.failed += 1,
        Status::Error => summary.errored += 1,
        Status::Skip => summary.skipped += 1,
      }

      if result.is_unexpected() {
        summary.mismatches.unexpected += 1;
      } else if result.mismatched {
        if result.expectation.status == ExpectedStatus::Flaky {
          summary.mismatches.flaky += 1;
        } else {
          summary.mismatches.expected += 1;
        }
      }
    }

    summary
  }

  pub fn not_passing(&self) -> usize {
    self.failed + self.errored
  }

  pub fn should_fail(&self, fail_on: FailOn) -> bool {
    fail_on.should_fail(self)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Report {
  pub schema_version: u32,
  pub summary: Summary,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub harness_errors: Vec<HarnessErrorEntry>,
  pub results: Vec<TestResult>,
}

impl Report {
  pub fn new(
    summary: Summary,
    harness_errors: Vec<HarnessErrorEntry>,
    results: Vec<TestResult>,
  ) -> Self {
    Self {
      schema_version: REPORT_SCHEMA_VERSION,
      summary,
      harness_errors,
      results,
    }
  }

  pub fn to_json_pretty(&self) -> Result<String, HarnessError> {
    Ok(serde_json::to_string_pretty(self)?)
  }
}

/// Writes `report` as pretty JSON, creating parent directories as needed.
pub fn write_json_report(path: &Path, report: &Report) -> Result<(), HarnessError> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent)?;
  }

  let file = fs::File::create(path)?;
  let mut writer = BufWriter::new(file);
  serde_json::to_writer_pretty(&mut writer, report)?;
  writeln!(writer)?;
  writer.flush()?;
  Ok(())
}

pub fn read_report(path: &Path) -> Result<Report, HarnessError> {
  let raw = fs::read_to_string(path)?;
  let report: Report = serde_json::from_str(&raw)
    .map_err(|err| HarnessError::Report(format!("parse {}: {err}", path.display())))?;
  if report.schema_version != REPORT_SCHEMA_VERSION {
    return Err(HarnessError::Report(format!(
      "unsupported report schema_version {} (expected {REPORT_SCHEMA_VERSION})",
      report.schema_version
    )));
  }
  Ok(report)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
  pub id: String,
  pub baseline: Status,
  pub current: Status,
}

/// Differences between two reports, each list sorted by test id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comparison {
  pub regressions: Vec<StatusChange>,
  pub improvements: Vec<StatusChange>,
  pub new_tests: Vec<String>,
  pub removed_tests: Vec<String>,
}

/// A pass turning into a failure or error is a regression; the reverse is an improvement.
pub fn compare_reports(baseline: &Report, current: &Report) -> Result<Comparison, HarnessError> {
  if baseline.schema_version != current.schema_version {
    return Err(HarnessError::Report(format!(
      "report schema_version mismatch: baseline={} current={}",
      baseline.schema_version, current.schema_version
    )));
  }

  let baseline_results = index_results("baseline", &baseline.results)?;
  let current_results = index_results("current", &current.results)?;

  let mut all_ids: BTreeSet<&str> = baseline_results.keys().copied().collect();
  all_ids.extend(current_results.keys().copied());

  let mut comparison = Comparison::default();
  for id in all_ids {
    match (baseline_results.get(id), current_results.get(id)) {
      (Some(&before), Some(&after)) => {
        let change = || StatusChange {
          id: id.to_string(),
          baseline: before,
          current: after,
        };
        if before == Status::Pass && after.is_fail_like() {
          comparison.regressions.push(change());
        } else if before.is_fail_like() && after == Status::Pass {
          comparison.improvements.push(change());
        }
      }
      (None, Some(_)) => comparison.new_tests.push(id.to_string()),
      (Some(_), None) => comparison.removed_tests.push(id.to_string()),
      (None, None) => {}
    }
  }

  Ok(comparison)
}

fn index_results<'a>(
  label: &str,
  results: &'a [TestResult],
) -> Result<BTreeMap<&'a str, Status>, HarnessError> {
  let mut map = BTreeMap::new();
  for result in results {
    if map.insert(result.id.as_str(), result.status()).is_some() {
      return Err(HarnessError::Report(format!(
        "{label} report contains duplicate result `{}`",
        result.id
      )));
    }
  }
  Ok(map)
}
