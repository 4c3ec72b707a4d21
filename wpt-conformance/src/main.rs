use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use testharness::{
  build_filter, run_files, select_files, test_id, write_json_report, CollectingSink, Expectations,
  FailOn, RunOptions, Shard, TextSink,
};
use tracing::info;
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;
use wpt_conformance::engine::{Engine, StubEngine};
use wpt_conformance::files::all_files;

mod report;

#[derive(Parser, Debug)]
#[command(author, version, about = "Web-platform conformance runner", long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Run the bundled test files against the stub engine.
  Run(RunArgs),
  /// Print the ids of the tests a run would execute.
  List(ListArgs),
  /// Work with JSON report artifacts.
  Report(ReportArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
  /// Glob or regex over file ids and test ids (`file::name`)
  #[arg(long)]
  filter: Option<String>,

  /// Expectations manifest (TOML or JSON)
  #[arg(long, value_name = "PATH")]
  manifest: Option<PathBuf>,

  /// Run only a shard (zero-based): `i/n`
  #[arg(long)]
  shard: Option<String>,

  /// Which results make the run exit non-zero
  #[arg(long, value_enum, default_value_t = FailOn::New)]
  fail_on: FailOn,

  /// Write a JSON report to this path
  #[arg(long, value_name = "PATH")]
  json: Option<PathBuf>,

  /// Run as if the page were not cross-origin isolated
  #[arg(long)]
  without_isolation: bool,

  /// Enable tracing output from the harness
  #[arg(long)]
  trace: bool,
}

#[derive(Args, Debug)]
struct ListArgs {
  /// Glob or regex over file ids and test ids (`file::name`)
  #[arg(long)]
  filter: Option<String>,
}

#[derive(Args, Debug)]
struct ReportArgs {
  #[command(subcommand)]
  command: ReportCommand,
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
  /// Compare two JSON reports (baseline vs current).
  Compare(report::CompareArgs),
}

fn main() -> ExitCode {
  match try_main() {
    Ok(code) => code,
    Err(err) => {
      eprintln!("{err:#}");
      ExitCode::FAILURE
    }
  }
}

fn try_main() -> Result<ExitCode> {
  let cli = Cli::parse();
  match cli.command {
    Command::Run(args) => run(args),
    Command::List(args) => list(args),
    Command::Report(args) => match args.command {
      ReportCommand::Compare(args) => report::run_cli(args),
    },
  }
}

fn run(args: RunArgs) -> Result<ExitCode> {
  init_tracing(args.trace);

  let filter = build_filter(args.filter.as_deref())?;
  let shard = args
    .shard
    .as_deref()
    .map(str::parse::<Shard>)
    .transpose()?;
  let expectations = match &args.manifest {
    Some(path) => Expectations::from_path(path)
      .with_context(|| format!("load expectations manifest {}", path.display()))?,
    None => Expectations::empty(),
  };

  let engine: Arc<dyn Engine> = if args.without_isolation {
    Arc::new(StubEngine::without_isolation())
  } else {
    Arc::new(StubEngine::new())
  };
  let engine_name = engine.name().to_string();
  let files = select_files(all_files(engine), shard);
  info!(
    target: "wpt_conformance",
    engine = %engine_name,
    files = files.len(),
    "starting run"
  );
  let options = RunOptions {
    filter,
    expectations,
  };

  let mut collected = CollectingSink::new();
  let summary = {
    let mut sink = (TextSink::new(io::stdout().lock()), &mut collected);
    run_files(&files, &options, &mut sink)?
  };

  if let Some(path) = &args.json {
    write_json_report(path, &collected.into_report())
      .with_context(|| format!("write JSON report {}", path.display()))?;
  }

  Ok(if summary.should_fail(args.fail_on) {
    ExitCode::FAILURE
  } else {
    ExitCode::SUCCESS
  })
}

fn list(args: ListArgs) -> Result<ExitCode> {
  let filter = build_filter(args.filter.as_deref())?;
  let files = select_files(all_files(Arc::new(StubEngine::new())), None);
  for file in &files {
    for case in file.cases() {
      if filter.selects(file.id(), case.name()) {
        println!("{}", test_id(file.id(), case.name()));
      }
    }
  }
  Ok(ExitCode::SUCCESS)
}

/// Installs a stderr subscriber for `--trace`; `RUST_LOG` overrides the `info` default.
fn init_tracing(enable: bool) {
  if enable {
    let directives = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = fmt()
      .with_writer(io::stderr)
      .with_env_filter(directives)
      .with_target(true)
      .try_init();
    if let Err(err) = installed {
      eprintln!("tracing already initialized: {err}");
    }
  }
}
