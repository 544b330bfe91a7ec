use crate::cli::OptimizeArgs;
use crate::config::{CliOverrides, PartialOptimizationConfig};
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use spi2pp::{
    core::io::input::load_system,
    engine::{progress::ProgressReporter, state::SolverStatus},
    workflows,
};
use tracing::{info, warn};

pub fn run(args: OptimizeArgs) -> Result<()> {
    run_with_progress(args, &CliProgressHandler::new())
}

fn run_with_progress(args: OptimizeArgs, progress_handler: &CliProgressHandler) -> Result<()> {
    let partial_config = PartialOptimizationConfig::load(args.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let final_config = partial_config.merge_with_cli(&CliOverrides::from(&args))?;

    info!("Loading input system from {:?}", &args.input);
    let system = load_system(&args.input).map_err(|e| CliError::FileParsing {
        path: args.input.clone(),
        source: e.into(),
    })?;

    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting layout optimization...");
    info!("Invoking the core optimization workflow...");
    let result = workflows::optimize::run(system, &final_config, &reporter)?;

    result.to_report().write_toml(&args.output)?;
    info!("Report written to {:?}", &args.output);
    if let Some(path) = &args.log_csv {
        result.outcome.log.write_csv(path)?;
        info!("Design-vector log written to {:?}", path);
    }

    match result.status() {
        SolverStatus::Failed { reason } => {
            warn!("Optimization failed: {}", reason);
            println!(
                "⚠ Optimization failed after {} iteration(s): {}",
                result.outcome.iterations, reason
            );
        }
        status => {
            let infeasible: Vec<String> = result
                .constraints
                .iter()
                .filter(|c| !c.feasible)
                .map(|c| c.category.to_string())
                .collect();
            println!(
                "✓ Optimization {} after {} iteration(s), objective {:.6}",
                status,
                result.outcome.iterations,
                result.objective.unwrap_or(f64::NAN)
            );
            if !infeasible.is_empty() {
                println!("  Interference remains in: {}", infeasible.join(", "));
            }
        }
    }
    println!("Report written to: {}", args.output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;

    const SYSTEM: &str = r#"
        [[components]]
        name = "a"
        degrees-of-freedom = ["x", "y", "z"]
        spheres = [[0.0, 0.0, 0.0, 0.5]]

        [[components]]
        name = "b"
        degrees-of-freedom = ["x", "y", "z"]
        spheres = [[3.0, 0.0, 0.0, 0.5]]
    "#;

    fn parse_args(args: Vec<String>) -> OptimizeArgs {
        match Cli::parse_from(args).command {
            Commands::Optimize(args) => args,
            _ => panic!("Expected 'optimize' subcommand"),
        }
    }

    #[test]
    fn writes_report_and_csv_log() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("system.toml");
        let output = dir.path().join("report.toml");
        let log = dir.path().join("log.csv");
        fs::write(&input, SYSTEM).unwrap();

        let args = parse_args(vec![
            "spi2".into(),
            "optimize".into(),
            "-i".into(),
            input.display().to_string(),
            "-o".into(),
            output.display().to_string(),
            "--log-csv".into(),
            log.display().to_string(),
            "--objective".into(),
            "gap".into(),
            "--max-iterations".into(),
            "3".into(),
            "--constraints".into(),
            "cc".into(),
        ]);
        run_with_progress(args, &CliProgressHandler::hidden()).unwrap();

        let report: toml::Table = toml::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert!(report.contains_key("status"));
        assert!(report.contains_key("final-design-vector"));
        let csv = fs::read_to_string(&log).unwrap();
        assert!(csv.starts_with("iteration,x0,x1,x2,x3,x4,x5"));
    }

    #[test]
    fn missing_input_is_a_parsing_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = parse_args(vec![
            "spi2".into(),
            "optimize".into(),
            "-i".into(),
            dir.path().join("absent.toml").display().to_string(),
            "-o".into(),
            dir.path().join("report.toml").display().to_string(),
        ]);
        let result = run_with_progress(args, &CliProgressHandler::hidden());
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }
}
