//! venvscope CLI binary.
//!
//! Initializes logging via `tracing`, parses arguments with `clap`, and
//! drives a [`Session`] for the requested command.

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use venvscope::config::Config;
use venvscope::export::ExportFormat;
use venvscope::filter::{FilterFlags, PackageFilter};
use venvscope::scan::Session;
use venvscope::size::format_size;
use venvscope::store::Store;

#[derive(Parser)]
#[command(name = "venvscope")]
#[command(author = "Zachary Woods <143150513+zach-fau@users.noreply.github.com>")]
#[command(version)]
#[command(about = "Dependency and version-conflict scanner for Python virtual environments", long_about = None)]
struct Cli {
    /// Root directory of the virtual environment
    env_root: PathBuf,

    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (defaults to ./venvscope.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seconds each package manager call may run
    #[arg(long, global = true, env = "VENVSCOPE_TIMEOUT")]
    timeout: Option<u64>,

    /// Worker threads for per-package inspection (0 = one per CPU)
    #[arg(long, global = true, env = "VENVSCOPE_WORKERS")]
    workers: Option<usize>,

    /// Skip measuring installed package sizes
    #[arg(long, global = true)]
    no_sizes: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the environment and list its packages
    Scan(ViewArgs),
    /// Scan the environment and report version conflicts
    Conflicts,
    /// Scan the environment and export the dependency graph
    Export {
        /// Output format: json or dot
        #[arg(short, long, default_value = "json")]
        format: ExportFormat,

        /// File to write
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Scan the environment and save the result to a database
    Save {
        /// SQLite database file
        #[arg(long)]
        db: PathBuf,
    },
    /// List the packages saved in a database
    Load {
        /// SQLite database file
        #[arg(long)]
        db: PathBuf,

        #[command(flatten)]
        view: ViewArgs,
    },
}

#[derive(Args)]
struct ViewArgs {
    /// Only packages nothing else depends on
    #[arg(long)]
    direct: bool,

    /// Only packages something else depends on
    #[arg(long)]
    deps: bool,

    /// Only packages with version conflicts
    #[arg(long)]
    conflicts: bool,

    /// Only packages whose name contains this text (case-insensitive)
    #[arg(short, long)]
    search: Option<String>,

    /// Sort by name descending
    #[arg(long)]
    desc: bool,
}

impl ViewArgs {
    fn filter(&self) -> PackageFilter {
        let flags = FilterFlags {
            direct: self.direct,
            deps: self.deps,
            conflicts: self.conflicts,
        };
        PackageFilter::new()
            .flags(flags)
            .ascending(!self.desc)
            .search(self.search.clone().unwrap_or_default())
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = if verbose == 0 {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    } else {
        EnvFilter::new(default)
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::discover(Path::new("."))?,
    };
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if cli.no_sizes {
        config.measure_sizes = false;
    }
    Ok(config)
}

fn print_packages(session: &Session, filter: &PackageFilter) {
    let view = filter.apply(session.packages());
    if view.is_empty() {
        println!("No packages match.");
        return;
    }

    let name_width = view.iter().map(|p| p.name().len()).max().unwrap_or(0).max(4);
    let version_width = view.iter().map(|p| p.version().len()).max().unwrap_or(0).max(7);

    println!(
        "{:<name_width$}  {:<version_width$}  {:>10}  DEPENDENCIES",
        "NAME", "VERSION", "SIZE"
    );
    for package in &view {
        let size = if package.is_size_known() {
            format_size(package.size())
        } else {
            "-".to_string()
        };
        let deps: Vec<String> = package.dependencies().iter().map(|d| d.to_string()).collect();
        let marker = if package.has_conflicts() { " !" } else { "" };
        println!(
            "{:<name_width$}  {:<version_width$}  {:>10}  {}{}",
            package.name(),
            package.version(),
            size,
            deps.join(", "),
            marker
        );
    }

    let packages = session.packages();
    println!(
        "\n{} of {} packages, {} total",
        view.len(),
        packages.len(),
        format_size(packages.total_size())
    );
}

fn scan(session: &mut Session) -> Result<()> {
    let report = session.scan().context("scan failed")?;
    if report.skipped_lines > 0 {
        eprintln!("warning: skipped {} unparseable listing lines", report.skipped_lines);
    }
    if report.describe_failures > 0 {
        eprintln!(
            "warning: {} packages could not be described; their dependencies are unknown",
            report.describe_failures
        );
    }
    session.detect_conflicts();
    Ok(())
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(&cli)?;
    let mut session = Session::with_config(&cli.env_root, config);

    match &cli.command {
        Commands::Scan(view) => {
            scan(&mut session)?;
            print_packages(&session, &view.filter());
        }
        Commands::Conflicts => {
            scan(&mut session)?;
            let conflicted = session.packages().conflicted();
            if conflicted.is_empty() {
                println!("No version conflicts found.");
                return Ok(ExitCode::SUCCESS);
            }
            for package in conflicted {
                for conflict in package.conflicts() {
                    let required = package
                        .dependencies()
                        .iter()
                        .find(|d| d.name == conflict.name)
                        .map(|d| d.constraint.as_str())
                        .unwrap_or("?");
                    println!(
                        "{} requires {}>={} but {} is installed",
                        package, conflict.name, required, conflict
                    );
                }
            }
            return Ok(ExitCode::FAILURE);
        }
        Commands::Export { format, output } => {
            scan(&mut session)?;
            session
                .export(*format, output)
                .context("export failed")?;
            println!(
                "Exported {} packages to {}",
                session.packages().len(),
                output.display()
            );
        }
        Commands::Save { db } => {
            scan(&mut session)?;
            let mut store = Store::init(db)?;
            session.save(&mut store).context("save failed")?;
            println!(
                "Saved {} packages to {}",
                session.packages().len(),
                db.display()
            );
        }
        Commands::Load { db, view } => {
            let store = Store::init(db)?;
            session.load(&store).context("load failed")?;
            session.detect_conflicts();
            println!("Environment: {}", session.env_root().display());
            print_packages(&session, &view.filter());
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}
