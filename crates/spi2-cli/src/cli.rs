use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "SPI2py Developers",
    version,
    about = "SPI2++ CLI - Spatial packaging of components, interconnects and structures with sphere-proxy interference constraints.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Optimize the placement of every movable object and write a report.
    Optimize(OptimizeArgs),
    /// Print the objective and interference values of one design vector.
    Evaluate(EvaluateArgs),
}

/// Arguments for the `optimize` subcommand.
#[derive(Args, Debug)]
pub struct OptimizeArgs {
    // --- Core Arguments ---
    /// Path to the input system document (TOML).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to the optimization configuration file (TOML).
    /// Every setting has a default, so the file is optional.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path for the TOML optimization report.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Also write the design-vector log as CSV, one row per iterate.
    #[arg(long, value_name = "PATH")]
    pub log_csv: Option<PathBuf>,

    // --- Overrides ---
    /// Override the objective ('volume' or 'gap').
    #[arg(long, value_name = "NAME")]
    pub objective: Option<String>,

    /// Override the maximum number of outer solver iterations.
    #[arg(long, value_name = "INT")]
    pub max_iterations: Option<usize>,

    /// Enable only the listed interference categories, e.g. 'cc,ci'.
    /// Use 'none' to disable every category.
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub constraints: Option<Vec<String>>,

    /// Start from a random layout drawn with this seed.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S solver.max-outer-iterations=20
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `evaluate` subcommand.
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Path to the input system document (TOML).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to the optimization configuration file (TOML).
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Comma-separated design vector. Defaults to the configured starting layout.
    #[arg(long, value_name = "X1,X2,...", allow_hyphen_values = true)]
    pub design_vector: Option<String>,

    /// Set a specific configuration value, overriding the config file.
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimize_arguments_parse() {
        let cli = Cli::parse_from([
            "spi2",
            "-vv",
            "optimize",
            "-i",
            "system.toml",
            "-o",
            "report.toml",
            "--constraints",
            "cc,ci",
            "--seed",
            "7",
            "-S",
            "solver.lbfgs-memory=5",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Optimize(args) = cli.command else {
            panic!("Expected 'optimize' subcommand");
        };
        assert_eq!(args.input, PathBuf::from("system.toml"));
        assert!(args.config.is_none());
        assert_eq!(
            args.constraints,
            Some(vec!["cc".to_string(), "ci".to_string()])
        );
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.set_values, vec!["solver.lbfgs-memory=5".to_string()]);
    }

    #[test]
    fn evaluate_accepts_negative_design_vector() {
        let cli = Cli::parse_from([
            "spi2",
            "evaluate",
            "-i",
            "system.toml",
            "--design-vector",
            "-1.0,2.5,0",
        ]);
        let Commands::Evaluate(args) = cli.command else {
            panic!("Expected 'evaluate' subcommand");
        };
        assert_eq!(args.design_vector.as_deref(), Some("-1.0,2.5,0"));
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["spi2", "-q", "-v", "evaluate", "-i", "system.toml"]);
        assert!(result.is_err());
    }
}
