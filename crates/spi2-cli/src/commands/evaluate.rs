use crate::cli::EvaluateArgs;
use crate::config::{CliOverrides, PartialOptimizationConfig};
use crate::error::{CliError, Result};
use crate::utils::parser::parse_design_vector;
use spi2pp::core::io::input::load_system;
use spi2pp::workflows::{self, evaluate::EvaluationResult};
use std::fmt::Write as _;
use tracing::info;

pub fn run(args: EvaluateArgs) -> Result<()> {
    let result = evaluate(&args)?;
    print!("{}", render(&result));
    Ok(())
}

fn evaluate(args: &EvaluateArgs) -> Result<EvaluationResult> {
    let config = PartialOptimizationConfig::load(args.config.as_deref())?
        .merge_with_cli(&CliOverrides::from(args))?;
    let design_vector = args
        .design_vector
        .as_deref()
        .map(parse_design_vector)
        .transpose()
        .map_err(|e| CliError::Argument(e.to_string()))?;

    info!("Loading input system from {:?}", &args.input);
    let system = load_system(&args.input).map_err(|e| CliError::FileParsing {
        path: args.input.clone(),
        source: e.into(),
    })?;

    Ok(workflows::evaluate::run(system, design_vector, &config)?)
}

fn render(result: &EvaluationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Objective: {:.6}", result.objective);
    if result.constraints.is_empty() {
        let _ = writeln!(out, "No active interference categories.");
    }
    for c in &result.constraints {
        let _ = writeln!(
            out,
            "  {:<26} {:>12.6}  (tolerance {:.3}) {}",
            c.category.to_string(),
            c.value,
            c.tolerance,
            if c.feasible { "✓" } else { "✗" }
        );
    }
    out
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
        spheres = [[0.0, 0.0, 0.0, 1.0]]

        [[components]]
        name = "b"
        degrees-of-freedom = ["x", "y", "z"]
        spheres = [[1.0, 0.0, 0.0, 1.0]]
    "#;

    fn args_for(input: &std::path::Path, design_vector: Option<&str>) -> EvaluateArgs {
        let mut args = vec![
            "spi2".to_string(),
            "evaluate".to_string(),
            "-i".to_string(),
            input.display().to_string(),
        ];
        if let Some(dv) = design_vector {
            args.push(format!("--design-vector={dv}"));
        }
        match Cli::parse_from(args).command {
            Commands::Evaluate(args) => args,
            _ => panic!("Expected 'evaluate' subcommand"),
        }
    }

    #[test]
    fn default_layout_is_infeasible() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("system.toml");
        fs::write(&input, SYSTEM).unwrap();

        let result = evaluate(&args_for(&input, None)).unwrap();
        assert!(!result.is_feasible());
        let text = render(&result);
        assert!(text.contains("component-component"));
        assert!(text.contains('✗'));
    }

    #[test]
    fn explicit_design_vector_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("system.toml");
        fs::write(&input, SYSTEM).unwrap();

        let result = evaluate(&args_for(&input, Some("0,0,0,-5,0,0"))).unwrap();
        assert_eq!(result.design_vector, vec![0.0, 0.0, 0.0, -5.0, 0.0, 0.0]);
        assert!(result.is_feasible());
    }

    #[test]
    fn malformed_design_vector_is_an_argument_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("system.toml");
        fs::write(&input, SYSTEM).unwrap();

        let result = evaluate(&args_for(&input, Some("0,zero")));
        assert!(matches!(result, Err(CliError::Argument(_))));
    }
}
