//! Top-level CLI definition and dispatch.

use std::io;
use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde_json::json;
use thiserror::Error;

use storage_array_harness::core::config::Config;
use storage_array_harness::core::errors::SahError;
use storage_array_harness::driver::CliClient;
use storage_array_harness::expectation::{Expectation, Verdict};
use storage_array_harness::interrupt::InterruptGuard;
use storage_array_harness::logger::jsonl::RunLogger;
use storage_array_harness::process::TargetProcess;
use storage_array_harness::recorder::VerdictRecorder;
use storage_array_harness::runner::run_scenario;
use storage_array_harness::scenario::{builtin_scenarios, find_scenario};

/// Storage Array Harness — drives a storage control plane through its CLI
/// and records pass/fail verdicts.
#[derive(Debug, Parser)]
#[command(
    name = "sah",
    author,
    version,
    about = "Storage Array Harness - control-plane system-test driver",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Increase verbosity.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Quiet mode (errors only).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Run one scenario against the target.
    Run(RunArgs),
    /// List built-in scenarios.
    Scenarios,
    /// View and validate configuration state.
    Config(ConfigArgs),
    /// Print version and build information.
    Version(VersionArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args)]
struct RunArgs {
    /// Scenario name (see `sah scenarios`).
    #[arg(value_name = "SCENARIO")]
    scenario: String,
    /// Override the scenario's declared expectation
    /// (`success`, `failure`, or `code=<int>`).
    #[arg(long, value_name = "EXPECT")]
    expect: Option<String>,
    /// Override the array name from config.
    #[arg(long, value_name = "NAME")]
    array: Option<String>,
    /// Override the results directory from config.
    #[arg(long, value_name = "DIR")]
    results_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print the effective config file path.
    Path,
    /// Show the effective configuration.
    Show,
    /// Validate configuration and exit.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct VersionArgs {
    /// Include package and build details.
    #[arg(long)]
    build_info: bool,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// The assertion did not hold; the FAIL verdict is recorded.
    #[error("{0}")]
    AssertionFailed(String),
    /// Invalid user input at runtime.
    #[error("{0}")]
    User(String),
    /// Command-under-test response had no extractable code.
    #[error("{0}")]
    Parse(String),
    /// A setup precondition failed; the assertion never ran.
    #[error("{0}")]
    Setup(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for CI integration: PASS exits 0, each
    /// failure class gets a distinct nonzero code.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::AssertionFailed(_) => 1,
            Self::User(_) => 2,
            Self::Parse(_) => 3,
            Self::Setup(_) => 4,
            Self::Runtime(_) | Self::Json(_) | Self::Io(_) => 5,
        }
    }
}

impl From<SahError> for CliError {
    fn from(value: SahError) -> Self {
        let message = value.to_string();
        match value {
            SahError::MalformedResponse { .. } => Self::Parse(message),
            SahError::SetupFailure { .. } => Self::Setup(message),
            SahError::UnknownScenario { .. }
            | SahError::InvalidConfig { .. }
            | SahError::MissingConfig { .. }
            | SahError::ConfigParse { .. } => Self::User(message),
            _ => Self::Runtime(message),
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Run(args) => run_run(cli, args),
        Command::Scenarios => run_scenarios(cli),
        Command::Config(args) => run_config(cli, args),
        Command::Version(args) => emit_version(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

const fn output_mode(cli: &Cli) -> OutputMode {
    if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    }
}

fn load_config(cli: &Cli) -> Result<Config, CliError> {
    Ok(Config::load(cli.config.as_deref())?)
}

// ──────────────────────── run ────────────────────────

fn run_run(cli: &Cli, args: &RunArgs) -> Result<(), CliError> {
    let mut config = load_config(cli)?;
    if let Some(array) = &args.array {
        config.array.name.clone_from(array);
    }
    if let Some(dir) = &args.results_dir {
        config.results.dir.clone_from(dir);
    }
    config.validate()?;

    let mut scenario = find_scenario(&args.scenario, &config.array).ok_or_else(|| {
        SahError::UnknownScenario {
            name: args.scenario.clone(),
        }
    })?;
    if let Some(raw) = &args.expect {
        scenario.expectation = raw.parse::<Expectation>().map_err(CliError::User)?;
    }

    let mut logger = RunLogger::open(config.log.clone());
    let interrupt = InterruptGuard::new();
    let recorder = VerdictRecorder::new(config.results.dir.clone());
    let client = CliClient::from_config(&config.target);

    if cli.verbose && !cli.json {
        eprintln!(
            "sah: acquiring target ({} mode)",
            if config.target.spawn { "spawn" } else { "attach" }
        );
    }
    let target = TargetProcess::acquire(&config.target)?;

    let outcome = run_scenario(
        &scenario,
        client,
        target,
        &recorder,
        &mut logger,
        &interrupt,
    )?;

    match output_mode(cli) {
        OutputMode::Json => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        OutputMode::Human => {
            let label = match outcome.verdict {
                Verdict::Pass => outcome.verdict.label().green().bold(),
                Verdict::Fail => outcome.verdict.label().red().bold(),
            };
            println!("{} ({})  {}", label, outcome.code, outcome.scenario);
            if !cli.quiet {
                println!("artifact: {}", outcome.artifact_path.display());
            }
            if let Some(warning) = &outcome.termination_warning {
                eprintln!("{} {warning}", "warning:".yellow());
            }
        }
    }

    match outcome.verdict {
        Verdict::Pass => Ok(()),
        Verdict::Fail => Err(CliError::AssertionFailed(format!(
            "FAIL recorded for {} (code {})",
            outcome.scenario, outcome.code
        ))),
    }
}

// ──────────────────────── scenarios ────────────────────────

fn run_scenarios(cli: &Cli) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let scenarios = builtin_scenarios(&config.array);

    match output_mode(cli) {
        OutputMode::Json => {
            let listing: Vec<_> = scenarios
                .iter()
                .map(|s| {
                    json!({
                        "name": s.name,
                        "summary": s.summary,
                        "expectation": s.expectation,
                        "setup_commands": s.setup.iter().map(|r| r.label()).collect::<Vec<_>>(),
                        "command_under_test": s.command_under_test.label(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        OutputMode::Human => {
            for s in &scenarios {
                println!("{:<32} expect {:<12} {}", s.name.bold(), s.expectation, s.summary);
            }
        }
    }
    Ok(())
}

// ──────────────────────── config ────────────────────────

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match args.command.as_ref().unwrap_or(&ConfigCommand::Show) {
        ConfigCommand::Path => {
            let path = cli
                .config
                .clone()
                .unwrap_or_else(Config::default_path);
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommand::Show => {
            let config = load_config(cli)?;
            match output_mode(cli) {
                OutputMode::Json => println!("{}", serde_json::to_string_pretty(&config)?),
                OutputMode::Human => {
                    let rendered = toml::to_string_pretty(&config).map_err(|e| {
                        CliError::Runtime(format!("failed to render config: {e}"))
                    })?;
                    print!("{rendered}");
                }
            }
            Ok(())
        }
        ConfigCommand::Validate => {
            let config = load_config(cli)?;
            config.validate()?;
            match output_mode(cli) {
                OutputMode::Json => println!("{}", json!({"valid": true})),
                OutputMode::Human => println!("{}", "configuration valid".green()),
            }
            Ok(())
        }
    }
}

// ──────────────────────── version ────────────────────────

fn emit_version(cli: &Cli, args: &VersionArgs) -> Result<(), CliError> {
    let version = env!("CARGO_PKG_VERSION");
    let package = env!("CARGO_PKG_NAME");
    let target = option_env!("TARGET").unwrap_or("unknown");
    let profile = option_env!("PROFILE").unwrap_or("unknown");

    match output_mode(cli) {
        OutputMode::Human => {
            println!("sah {version}");
            if args.build_info {
                println!("package: {package}");
                println!("target: {target}");
                println!("profile: {profile}");
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "binary": "sah",
                "version": version,
                "package": package,
                "build": {
                    "target": target,
                    "profile": profile,
                }
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
    }
    Ok(())
}
