use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::process::ExitCode;
use testharness::{compare_reports, read_report, Comparison, Report};

#[derive(Args, Debug)]
pub struct CompareArgs {
  /// Report the comparison starts from.
  #[arg(long, value_name = "PATH")]
  pub baseline: PathBuf,

  /// Report from the run under review.
  #[arg(long, value_name = "PATH")]
  pub current: PathBuf,

  /// Exit non-zero if any test went from passing to failing.
  #[arg(long)]
  pub fail_on_regression: bool,
}

pub fn run_cli(args: CompareArgs) -> Result<ExitCode> {
  let baseline = read_report(&args.baseline)
    .with_context(|| format!("load baseline report {}", args.baseline.display()))?;
  let current = read_report(&args.current)
    .with_context(|| format!("load current report {}", args.current.display()))?;

  let comparison = compare_reports(&baseline, &current)?;

  print_comparison(&baseline, &current, &comparison);

  Ok(if args.fail_on_regression && !comparison.regressions.is_empty() {
    ExitCode::FAILURE
  } else {
    ExitCode::SUCCESS
  })
}

/// Counts and the new, fixed and dropped ids go to stdout; regressed ids go to stderr.
fn print_comparison(baseline: &Report, current: &Report, comparison: &Comparison) {
  println!(
    "compared {} baseline results with {} current results",
    baseline.results.len(),
    current.results.len()
  );
  println!(
    "regressions: {}, improvements: {}, new: {}, removed: {}",
    comparison.regressions.len(),
    comparison.improvements.len(),
    comparison.new_tests.len(),
    comparison.removed_tests.len(),
  );

  for id in &comparison.new_tests {
    println!("added {id}");
  }
  for change in &comparison.improvements {
    println!("improved {}: {} -> {}", change.id, change.baseline, change.current);
  }
  for id in &comparison.removed_tests {
    println!("dropped {id}");
  }
  for change in &comparison.regressions {
    eprintln!("regressed {}: {} -> {}", change.id, change.baseline, change.current);
  }
}
