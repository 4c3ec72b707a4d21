use crate::report::Summary;
use clap::ValueEnum;

/// Exit-code policy for a finished run.
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum FailOn {
  /// Fail when anything failed or errored, predicted or not.
  All,
  /// Fail only on results the expectations manifest did not predict.
  #[default]
  New,
  /// Report, but always exit zero.
  None,
}

impl FailOn {
  /// Harness errors are never predicted, so they trip both `All` and `New`.
  pub fn should_fail(self, summary: &Summary) -> bool {
    let broken = summary.harness_errors > 0;
    match self {
      FailOn::All => broken || summary.not_passing() > 0,
      FailOn::New => broken || summary.mismatches.unexpected > 0,
      FailOn::None => false,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn policies() {
    let mut summary = Summary {
      failed: 1,
      ..Summary::default()
    };
    assert!(FailOn::All.should_fail(&summary));
    assert!(!FailOn::New.should_fail(&summary));

    summary.mismatches.unexpected = 1;
    assert!(FailOn::New.should_fail(&summary));
    assert!(!FailOn::None.should_fail(&summary));

    let broken = Summary {
      harness_errors: 1,
      ..Summary::default()
    };
    assert!(FailOn::New.should_fail(&broken));
    assert!(!FailOn::None.should_fail(&broken));
  }
}
