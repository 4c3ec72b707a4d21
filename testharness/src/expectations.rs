use crate::error::HarnessError;
use crate::outcome::Status;
use globset::Glob;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// What a manifest says a test is expected to do.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedStatus {
  #[default]
  Pass,
  Fail,
  Error,
  /// Do not run the body at all.
  Skip,
  /// Any outcome is accepted.
  Flaky,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Expectation {
  #[serde(default)]
  pub status: ExpectedStatus,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub reason: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub bug: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AppliedExpectation {
  pub expectation: Expectation,
  pub from_manifest: bool,
}

impl AppliedExpectation {
  pub fn is_skip(&self) -> bool {
    self.expectation.status == ExpectedStatus::Skip
  }

  pub fn matches(&self, status: Status) -> bool {
    match self.expectation.status {
      ExpectedStatus::Pass => status == Status::Pass,
      ExpectedStatus::Fail => status == Status::Fail,
      ExpectedStatus::Error => status == Status::Error,
      ExpectedStatus::Skip => status == Status::Skip,
      ExpectedStatus::Flaky => true,
    }
  }
}

/// Expected outcomes keyed by test id (`file::name`).
///
/// Lookup precedence is exact id, then glob, then regex; within a group the first entry wins.
#[derive(Debug, Clone, Default)]
pub struct Expectations {
  exact: Vec<Entry>,
  globs: Vec<Entry>,
  regexes: Vec<Entry>,
}

impl Expectations {
  pub fn empty() -> Self {
    Self::default()
  }

  pub fn from_path(path: &Path) -> Result<Self, HarnessError> {
    let raw = fs::read_to_string(path)?;
    Self::from_str(&raw).map_err(|err| match err {
      HarnessError::Manifest(msg) => HarnessError::Manifest(format!("{}: {msg}", path.display())),
      other => other,
    })
  }

  pub fn from_str(raw: &str) -> Result<Self, HarnessError> {
    let manifest = match toml::from_str::<RawManifest>(raw) {
      Ok(manifest) => manifest,
      Err(toml_err) => serde_json::from_str::<RawManifest>(raw).map_err(|json_err| {
        HarnessError::Manifest(format!(
          "failed to parse manifest as TOML ({toml_err}) or JSON ({json_err})"
        ))
      })?,
    };

    Self::from_manifest(manifest)
  }

  pub fn len(&self) -> usize {
    self.exact.len() + self.globs.len() + self.regexes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn lookup(&self, id: &str) -> AppliedExpectation {
    [&self.exact, &self.globs, &self.regexes]
      .into_iter()
      .find_map(|entries| entries.iter().find(|entry| entry.matcher.matches(id)))
      .map(|entry| AppliedExpectation {
        expectation: entry.expectation.clone(),
        from_manifest: true,
      })
      .unwrap_or_default()
  }

  fn from_manifest(manifest: RawManifest) -> Result<Self, HarnessError> {
    let mut expectations = Expectations::default();
    for raw in manifest.expectations {
      let matcher = raw.matcher()?;
      let expectation = Expectation {
        status: raw
          .status
          .ok_or_else(|| HarnessError::Manifest("manifest entry missing `status`".into()))?,
        reason: raw.reason,
        bug: raw.bug,
      };

      let group = match matcher {
        Matcher::Exact(_) => &mut expectations.exact,
        Matcher::Glob(_) => &mut expectations.globs,
        Matcher::Regex(_) => &mut expectations.regexes,
      };
      group.push(Entry {
        matcher,
        expectation,
      });
    }

    Ok(expectations)
  }
}

#[derive(Debug, Clone)]
struct Entry {
  matcher: Matcher,
  expectation: Expectation,
}

#[derive(Debug, Clone)]
enum Matcher {
  Exact(String),
  Glob(globset::GlobMatcher),
  Regex(Regex),
}

impl Matcher {
  fn matches(&self, id: &str) -> bool {
    match self {
      Matcher::Exact(pattern) => pattern == id,
      Matcher::Glob(glob) => glob.is_match(id),
      Matcher::Regex(re) => re.is_match(id),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
struct RawManifest {
  #[serde(default)]
  expectations: Vec<RawEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawEntry {
  id: Option<String>,
  glob: Option<String>,
  regex: Option<String>,
  #[serde(alias = "expected")]
  status: Option<ExpectedStatus>,
  reason: Option<String>,
  #[serde(alias = "tracking_issue")]
  bug: Option<String>,
}

impl RawEntry {
  fn matcher(&self) -> Result<Matcher, HarnessError> {
    match (&self.id, &self.glob, &self.regex) {
      (Some(id), None, None) => Ok(Matcher::Exact(id.clone())),
      (None, Some(glob), None) => Glob::new(glob)
        .map(|glob| Matcher::Glob(glob.compile_matcher()))
        .map_err(|err| HarnessError::Manifest(format!("invalid glob '{glob}': {err}"))),
      (None, None, Some(regex)) => Regex::new(regex)
        .map(Matcher::Regex)
        .map_err(|err| HarnessError::Manifest(format!("invalid regex '{regex}': {err}"))),
      (None, None, None) => Err(HarnessError::Manifest(
        "manifest entry missing `id`/`glob`/`regex`".into(),
      )),
      _ => Err(HarnessError::Manifest(
        "manifest entry must specify exactly one of `id`/`glob`/`regex`".into(),
      )),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const MANIFEST: &str = r#"
[[expectations]]
regex = "^gyroscope/"
status = "flaky"

[[expectations]]
glob = "gyroscope/idlharness::*"
status = "fail"
reason = "w is not implemented"

[[expectations]]
id = "gyroscope/idlharness::Gyroscope interface object"
status = "skip"
bug = "https://crbug.com/1"
"#;

  #[test]
  fn exact_beats_glob_beats_regex() {
    let expectations = Expectations::from_str(MANIFEST).unwrap();
    assert_eq!(expectations.len(), 3);

    let exact = expectations.lookup("gyroscope/idlharness::Gyroscope interface object");
    assert!(exact.from_manifest);
    assert!(exact.is_skip());
    assert_eq!(exact.expectation.bug.as_deref(), Some("https://crbug.com/1"));

    let glob = expectations.lookup("gyroscope/idlharness::other");
    assert_eq!(glob.expectation.status, ExpectedStatus::Fail);
    assert_eq!(glob.expectation.reason.as_deref(), Some("w is not implemented"));

    let regex = expectations.lookup("gyroscope/start-stop::readings");
    assert_eq!(regex.expectation.status, ExpectedStatus::Flaky);

    let none = expectations.lookup("html/sab::case");
    assert!(!none.from_manifest);
    assert_eq!(none.expectation.status, ExpectedStatus::Pass);
  }

  #[test]
  fn json_manifests_are_accepted() {
    let expectations = Expectations::from_str(
      r#"{"expectations": [{"id": "a::b", "status": "error"}]}"#,
    )
    .unwrap();
    let applied = expectations.lookup("a::b");
    assert!(applied.matches(Status::Error));
    assert!(!applied.matches(Status::Fail));
  }

  #[test]
  fn malformed_entries_are_rejected() {
    let both = "[[expectations]]\nid = \"a\"\nglob = \"b\"\nstatus = \"pass\"\n";
    assert!(matches!(
      Expectations::from_str(both),
      Err(HarnessError::Manifest(msg)) if msg.contains("exactly one")
    ));

    let no_status = "[[expectations]]\nid = \"a\"\n";
    assert!(Expectations::from_str(no_status).is_err());

    let bad_regex = "[[expectations]]\nregex = \"(\"\nstatus = \"pass\"\n";
    assert!(Expectations::from_str(bad_regex).is_err());
  }

  #[test]
  fn flaky_accepts_anything() {
    let applied = AppliedExpectation {
      expectation: Expectation {
        status: ExpectedStatus::Flaky,
        ..Expectation::default()
      },
      from_manifest: true,
    };
    for status in [Status::Pass, Status::Fail, Status::Error, Status::Skip] {
      assert!(applied.matches(status));
    }
  }
}
