use crate::error::{ErrorKind, HarnessError};
use crate::expectations::Expectations;
use crate::outcome::Outcome;
use crate::registry::{TestCase, TestFile};
use crate::report::{test_id, Summary, TestResult};
use crate::shard::{apply_shard, Shard};
use crate::sink::ReportSink;
use globset::{Glob, GlobMatcher};
use regex::Regex;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info, warn};

/// Selects tests by file id or by test id (`file::name`).
#[derive(Debug, Clone, Default)]
pub enum Filter {
  #[default]
  All,
  Glob(GlobMatcher),
  Regex(Regex),
}

/// Interprets `pattern` as a glob when it parses as one, otherwise as a regex.
///
/// Patterns using regex-only syntax (anchors, groups, alternation, `+`) skip the glob attempt,
/// since globset would accept them as literals.
pub fn build_filter(pattern: Option<&str>) -> Result<Filter, HarnessError> {
  let Some(raw) = pattern else {
    return Ok(Filter::All);
  };
  let regex_only = raw.contains(['^', '$', '(', ')', '|', '+']);
  if !regex_only {
    if let Ok(glob) = Glob::new(raw) {
      return Ok(Filter::Glob(glob.compile_matcher()));
    }
  }
  Regex::new(raw)
    .map(Filter::Regex)
    .map_err(|err| HarnessError::InvalidFilter(format!("{raw}: {err}")))
}

impl Filter {
  pub fn matches(&self, id: &str) -> bool {
    match self {
      Filter::All => true,
      Filter::Glob(glob) => glob.is_match(id),
      Filter::Regex(re) => re.is_match(id),
    }
  }

  /// True when the file id or the full test id matches.
  pub fn selects(&self, file: &str, case: &str) -> bool {
    self.matches(file) || self.matches(&test_id(file, case))
  }
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
  pub filter: Filter,
  pub expectations: Expectations,
}

/// Sorts files by id and keeps the ones in `shard`.
pub fn select_files(mut files: Vec<TestFile>, shard: Option<Shard>) -> Vec<TestFile> {
  files.sort_by(|a, b| a.id().cmp(b.id()));
  match shard {
    Some(shard) => apply_shard(files, shard),
    None => files,
  }
}

/// Runs one case body to completion. Panics become `Error` outcomes of kind `panic`.
pub fn run_case(case: &TestCase) -> Outcome {
  match panic::catch_unwind(AssertUnwindSafe(|| case.call())) {
    Ok(Ok(())) => Outcome::Pass,
    Ok(Err(failure)) => Outcome::from_failure(failure),
    Err(payload) => Outcome::Error {
      kind: ErrorKind::Panic,
      message: panic_message(payload.as_ref()),
    },
  }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(message) = payload.downcast_ref::<&str>() {
    (*message).to_string()
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message.clone()
  } else {
    "non-string panic payload".to_string()
  }
}

/// Runs every case of `file` in registration order, ignoring filters and expectations.
pub fn run_file(file: &TestFile) -> Vec<(String, Outcome)> {
  file
    .cases()
    .iter()
    .map(|case| (case.name().to_string(), run_case(case)))
    .collect()
}

/// Runs `files` in order, feeding every result and harness error into `sink`.
///
/// Cases the expectations manifest marks `skip` are reported as skipped without running. Sink
/// errors abort the run; test failures never do.
pub fn run_files(
  files: &[TestFile],
  options: &RunOptions,
  sink: &mut dyn ReportSink,
) -> Result<Summary, HarnessError> {
  let mut results = Vec::new();
  let mut harness_errors = 0;

  for file in files {
    let selected: Vec<&TestCase> = file
      .cases()
      .iter()
      .filter(|case| options.filter.selects(file.id(), case.name()))
      .collect();
    let file_selected = !selected.is_empty() || options.filter.matches(file.id());
    if !file_selected {
      continue;
    }

    for message in file.harness_errors() {
      warn!(target: "testharness::runner", file = file.id(), "{message}");
      sink.harness_error(file.id(), message)?;
      harness_errors += 1;
    }

    for case in selected {
      let id = test_id(file.id(), case.name());
      let applied = options.expectations.lookup(&id);
      let outcome = if applied.is_skip() {
        Outcome::Skip {
          reason: applied.expectation.reason.clone(),
        }
      } else {
        run_case(case)
      };
      debug!(
        target: "testharness::runner",
        test = %id,
        status = %outcome.status(),
        "finished test"
      );

      let result = TestResult::new(file.id(), case.name(), outcome, applied);
      sink.result(&result)?;
      results.push(result);
    }
    info!(target: "testharness::runner", file = file.id(), "finished file");
  }

  let summary = Summary::from_results(&results, harness_errors);
  info!(
    target: "testharness::runner",
    total = summary.total,
    passed = summary.passed,
    failed = summary.failed,
    errored = summary.errored,
    skipped = summary.skipped,
    "run complete"
  );
  sink.finish(&summary)?;
  Ok(summary)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::{AssertionError, Signal};

  fn file() -> TestFile {
    let mut file = TestFile::new("demo/basic");
    file
      .test("passes", || Ok(()))
      .test("fails", || Err(AssertionError::failure("nope").into()))
      .test("throws", || Err(Signal::type_error("Illegal constructor").into()))
      .test("panics", || panic!("boom"));
    file
  }

  #[test]
  fn every_case_gets_exactly_one_outcome() {
    let outcomes = run_file(&file());
    let statuses: Vec<_> = outcomes
      .iter()
      .map(|(name, outcome)| (name.as_str(), outcome.status().to_string()))
      .collect();
    assert_eq!(
      statuses,
      vec![
        ("passes", "PASS".to_string()),
        ("fails", "FAIL".to_string()),
        ("throws", "ERROR".to_string()),
        ("panics", "ERROR".to_string()),
      ]
    );
    assert_eq!(
      outcomes[3].1,
      Outcome::Error {
        kind: ErrorKind::Panic,
        message: "boom".to_string(),
      }
    );
  }

  #[test]
  fn filters_accept_globs_then_regexes() {
    let glob = build_filter(Some("demo/*")).unwrap();
    assert!(matches!(glob, Filter::Glob(_)));
    assert!(glob.matches("demo/basic::passes"));

    let regex = build_filter(Some("pass(es|ed)$")).unwrap();
    assert!(regex.selects("demo/basic", "passes"));
    assert!(!regex.selects("demo/basic", "fails"));

    assert!(matches!(build_filter(None).unwrap(), Filter::All));
  }

  #[test]
  fn select_files_sorts_before_sharding() {
    let files = vec![TestFile::new("c"), TestFile::new("a"), TestFile::new("b")];
    let ids: Vec<_> = select_files(files, Some(Shard { index: 0, total: 2 }))
      .iter()
      .map(|file| file.id().to_string())
      .collect();
    assert_eq!(ids, vec!["a", "c"]);
  }
}
