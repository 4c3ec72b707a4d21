use crate::error::CaseResult;
use std::fmt;
use std::rc::Rc;

type Body = Box<dyn Fn() -> CaseResult>;

/// A named, independent unit of assertion logic.
pub struct TestCase {
  name: String,
  body: Body,
}

impl TestCase {
  pub fn name(&self) -> &str {
    &self.name
  }

  pub(crate) fn call(&self) -> CaseResult {
    (self.body)()
  }
}

impl fmt::Debug for TestCase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TestCase")
      .field("name", &self.name)
      .finish_non_exhaustive()
  }
}

/// The ordered test cases one test file registers.
///
/// A test file is a setup function that builds and returns its own `TestFile`; there is no shared
/// registry. Cases run in registration order.
#[derive(Debug)]
pub struct TestFile {
  id: String,
  cases: Vec<TestCase>,
  harness_errors: Vec<String>,
}

impl TestFile {
  /// `id` is a path-like name such as `gyroscope/idlharness`.
  pub fn new(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      cases: Vec::new(),
      harness_errors: Vec::new(),
    }
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn cases(&self) -> &[TestCase] {
    &self.cases
  }

  /// Problems found while registering, such as duplicate test names.
  pub fn harness_errors(&self) -> &[String] {
    &self.harness_errors
  }

  pub fn len(&self) -> usize {
    self.cases.len()
  }

  pub fn is_empty(&self) -> bool {
    self.cases.is_empty()
  }

  /// Records a setup problem; the run reports it and the file counts as broken.
  pub fn harness_error(&mut self, message: impl Into<String>) -> &mut Self {
    self.harness_errors.push(message.into());
    self
  }

  /// Registers a test; it runs later, when the file is run.
  ///
  /// A name already used in this file is recorded as a harness error and the new body is dropped.
  pub fn test<F>(&mut self, name: impl Into<String>, body: F) -> &mut Self
  where
    F: Fn() -> CaseResult + 'static,
  {
    let name = name.into();
    if self.cases.iter().any(|case| case.name == name) {
      self
        .harness_errors
        .push(format!("duplicate test name `{name}`"));
      return self;
    }
    self.cases.push(TestCase {
      name,
      body: Box::new(body),
    });
    self
  }

  /// Registers one test per parameter, named `"{name} [{id}]"`.
  pub fn test_each<P, I, S, F>(&mut self, name: &str, params: I, body: F) -> &mut Self
  where
    I: IntoIterator<Item = (S, P)>,
    S: fmt::Display,
    P: 'static,
    F: Fn(&P) -> CaseResult + 'static,
  {
    let body = Rc::new(body);
    for (id, param) in params {
      let body = Rc::clone(&body);
      self.test(format!("{name} [{id}]"), move || body(&param));
    }
    self
  }
}
