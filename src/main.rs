use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use nextsweep::{
    config::Config,
    model::ProjectStatus,
    output::{format_report_to_string, print_report, OutputFormat},
    remediate::{checkout_branch, commit_and_push, upgrade_project, ActionOutcome, BranchTarget},
    scan::{inspect, scan, ScanOptions},
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
    pub const VULNERABLE: u8 = 2;
}

#[derive(Parser)]
#[command(name = "nextsweep")]
#[command(
    author,
    version,
    about = "Scan directory trees for Next.js/React projects exposed to CVE-2025-55182 and CVE-2025-66478"
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a directory tree for projects with vulnerable dependencies
    Scan {
        /// Root directory to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Directory recursion bound (scan root = 0)
        #[arg(short, long)]
        depth: Option<usize>,

        /// Output format (table, json)
        #[arg(short, long)]
        format: Option<String>,

        /// Write output to file
        #[arg(short, long)]
        output: Option<String>,

        /// Skip the git fetch that precedes commits-behind counts
        #[arg(long)]
        no_fetch: bool,

        /// Exit with an error code when any project is vulnerable
        #[arg(long)]
        fail_on_vulnerable: bool,

        /// Probe projects one at a time instead of concurrently
        #[arg(long)]
        no_parallel: bool,
    },

    /// Rewrite a project's manifest to safe versions and reinstall
    Upgrade {
        /// Project directory (or its package.json)
        path: PathBuf,
    },

    /// Check out a project's default or production branch and pull
    Checkout {
        /// Project directory (or its package.json)
        path: PathBuf,

        /// Target the production branch instead of the default branch
        #[arg(long)]
        production: bool,
    },

    /// Stage, commit and push a project's remediation
    Push {
        /// Project directory (or its package.json)
        path: PathBuf,
    },

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "nextsweep=debug" } else { "nextsweep=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<u8> {
    let config = Config::load().unwrap_or_default();

    match cli.command {
        Commands::Scan {
            path,
            depth,
            format,
            output,
            no_fetch,
            fail_on_vulnerable,
            no_parallel,
        } => {
            let format_str = format.unwrap_or(config.default_format.clone());
            let format = OutputFormat::from_str(&format_str).map_err(|e| anyhow::anyhow!(e))?;

            let options = ScanOptions {
                max_depth: depth.unwrap_or(config.max_depth),
                concurrency: if no_parallel { 1 } else { config.concurrency },
                fetch: !no_fetch && config.fetch,
            };

            run_scan(&path, &options, format, output, fail_on_vulnerable).await
        }
        Commands::Upgrade { path } => {
            let status = load_project(&path).await?;
            finish_action(upgrade_project(&status).await)
        }
        Commands::Checkout { path, production } => {
            let status = load_project(&path).await?;
            let target = if production {
                BranchTarget::Production
            } else {
                BranchTarget::Default
            };
            finish_action(checkout_branch(&status, target).await)
        }
        Commands::Push { path } => {
            let status = load_project(&path).await?;
            finish_action(commit_and_push(&status).await)
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
    }
}

async fn run_scan(
    path: &Path,
    options: &ScanOptions,
    format: OutputFormat,
    output_file: Option<String>,
    fail_on_vulnerable: bool,
) -> Result<u8> {
    let is_interactive = format == OutputFormat::Table && output_file.is_none();

    let progress = if is_interactive {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Scanning projects...");
        Some(pb)
    } else {
        None
    };

    let report = scan(path, options).await?;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    if let Some(path) = output_file {
        let rendered = format_report_to_string(&report, format)?;
        std::fs::write(&path, rendered)?;
        println!("Results written to: {}", path);
    } else {
        print_report(&report, format)?;
    }

    if fail_on_vulnerable && report.vulnerable_count() > 0 {
        return Ok(exit_codes::VULNERABLE);
    }

    Ok(exit_codes::SUCCESS)
}

/// Resolves a remediation target: the project directory, or its manifest
/// path as a convenience.
async fn load_project(path: &Path) -> Result<ProjectStatus> {
    let dir = if path.file_name().is_some_and(|name| name == "package.json") {
        // parent() of a bare "package.json" is the empty path.
        path.parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf()
    } else {
        path.to_path_buf()
    };

    inspect(&dir)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no package.json in {}", dir.display()))
}

fn finish_action(outcome: ActionOutcome) -> Result<u8> {
    if outcome.success {
        println!("{}", outcome.message);
        Ok(exit_codes::SUCCESS)
    } else {
        eprintln!("{}", outcome.message);
        Ok(exit_codes::ERROR)
    }
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    // Show current config
    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'nextsweep config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}
