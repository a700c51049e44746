//! certcheck CLI entry point

use certcheck::catalog::Catalog;
use certcheck::checks;
use certcheck::cli::args::{Cli, Command, RunArgs};
use certcheck::cli::output::TerminalReporter;
use certcheck::config::EngineConfig;
use certcheck::engine::check::CheckResult;
use certcheck::engine::interrupt::Interrupts;
use certcheck::engine::registry::Registry;
use certcheck::engine::runner::{RunReport, Runner};
use certcheck::logging::init_tracing;
use certcheck::target::TargetEnvironment;
use certcheck::version::get_build_info;
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

const EXIT_CHECKS_FAILED: u8 = 1;
const EXIT_ABORTED: u8 = 2;
const EXIT_RUNTIME_ERROR: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::Version => {
            println!("{}", get_build_info());
            ExitCode::SUCCESS
        }
        Command::List => {
            for (group, check_id) in checks::list_checks() {
                println!("{:<12} {}", group, check_id);
            }
            ExitCode::SUCCESS
        }
        Command::Run(args) => match run(&args).await {
            Ok(code) => code,
            Err(message) => {
                eprintln!("Error: {}", message);
                ExitCode::from(EXIT_RUNTIME_ERROR)
            }
        },
    }
}

fn load_config(args: &RunArgs) -> Result<EngineConfig, String> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path).map_err(|e| e.to_string())?,
        None => EngineConfig::default(),
    };
    args.apply(&mut config);
    config.apply_env();
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

async fn run(args: &RunArgs) -> Result<ExitCode, String> {
    let config = load_config(args)?;
    init_tracing(config.log_json);

    let env = match &config.target {
        Some(path) => TargetEnvironment::from_json_file(path).map_err(|e| e.to_string())?,
        None => {
            tracing::warn!("no target environment given, checks will see an empty inventory");
            TargetEnvironment::default()
        }
    };

    let mut catalog = Catalog::builtin();
    if let Some(path) = &config.catalog {
        catalog.extend(Catalog::from_json_file(path).map_err(|e| e.to_string())?);
    }

    let mut registry = Registry::new();
    checks::register_all(&mut registry, &Arc::new(env)).map_err(|e| e.to_string())?;

    let interrupts = Interrupts::from_os_signals().map_err(|e| format!("failed to listen for signals: {}", e))?;
    let runner = Runner::new(registry, catalog)
        .with_reporter(TerminalReporter::new(!config.no_color))
        .with_interrupts(interrupts)
        .with_grace_period(config.grace_period());

    let outcome = runner.run_checks(&config.label_filter, config.timeout()).await;

    if let Some(path) = &config.claim_output {
        write_claim(path, &runner)?;
    }

    match outcome {
        Ok(report) => Ok(exit_code(&report, &runner)),
        Err(err) => {
            eprintln!("Error: {}", err);
            for failure in &err.failures {
                eprintln!("  - {}", failure);
            }
            Ok(ExitCode::from(EXIT_RUNTIME_ERROR))
        }
    }
}

fn write_claim(path: &Path, runner: &Runner) -> Result<(), String> {
    let document = serde_json::json!({ "results": runner.reconciled_results() });
    let json = serde_json::to_string_pretty(&document).map_err(|e| e.to_string())?;
    std::fs::write(path, json).map_err(|e| format!("failed to write {}: {}", path.display(), e))?;
    tracing::info!(path = %path.display(), "claim results written");
    Ok(())
}

fn exit_code(report: &RunReport, runner: &Runner) -> ExitCode {
    let [_, failed, _] = report.summary.total();
    let errored = runner.results().values().any(|record| record.state == CheckResult::Error.as_str());
    if failed > 0 || errored {
        ExitCode::from(EXIT_CHECKS_FAILED)
    } else if report.aborted.is_some() {
        ExitCode::from(EXIT_ABORTED)
    } else {
        ExitCode::SUCCESS
    }
}
