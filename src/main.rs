use clap::{Parser, Subcommand, builder::styling};
use eyre::Result;
use owo_colors::OwoColorize;
use parquet_etl::cli::{init_manifest, list_sources, run_batch};
use parquet_etl::config::Settings;
use std::path::PathBuf;
use std::process::ExitCode;

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// pqetl: fetch compressed datasets, clean them and store them as Parquet
#[derive(Parser)]
#[command(name = "pqetl", version, styles = STYLES)]
struct Cli {
    /// The dotenv file to read settings from
    #[arg(short, long, global = true, default_value = ".env")]
    env: String,

    /// More verbose logging
    #[arg(long, global = true)]
    debug: bool,

    /// Command to execute (default: run)
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, extract, clean and load every source in the manifest
    Run {
        /// Sources manifest YAML (default: built-in sources)
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// Root of the data directory
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Download and extract again even if files exist
        #[arg(short, long)]
        refresh: bool,
    },

    /// List the sources in the manifest
    Sources {
        /// Sources manifest YAML (default: built-in sources)
        #[arg(short, long)]
        manifest: Option<PathBuf>,
    },

    /// Write the built-in manifest to a file for editing
    Init {
        /// The manifest file to generate
        #[arg(default_value = "sources.yml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let env_loaded = dotenvy::from_filename(&cli.env);

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    match env_loaded {
        Ok(path) => log::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => log::debug!("No {} file found", cli.env),
        Err(e) => {
            log::error!("Failed to load {}: {}", cli.env, e);
            return ExitCode::FAILURE;
        }
    }

    match execute(cli.command).await {
        Ok(code) => code,
        Err(e) => {
            log::error!("{:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(command: Option<Commands>) -> Result<ExitCode> {
    let command = command.unwrap_or(Commands::Run {
        manifest: None,
        data_dir: None,
        refresh: false,
    });

    match command {
        Commands::Run {
            manifest,
            data_dir,
            refresh,
        } => {
            let settings = Settings::from_env()?
                .with_manifest(manifest)
                .with_data_dir(data_dir)
                .with_refresh(refresh);

            log::info!(
                "Running batch into {}{}",
                settings.data_dir.display().bright_black(),
                match settings.refresh {
                    true => " (refresh)",
                    false => "",
                }
                .cyan()
            );

            let summary = run_batch(&settings).await?;
            for (name, outcome) in &summary.outcomes {
                match outcome.is_success() {
                    true => log::info!("✓ {}: {}", name.green(), outcome),
                    false => log::warn!("✗ {}: {}", name.red(), outcome),
                }
            }

            if summary.all_succeeded() {
                log::info!(
                    "✓ {} source(s) processed in {:.2?}",
                    summary.outcomes.len().cyan(),
                    summary.elapsed
                );
                Ok(ExitCode::SUCCESS)
            } else {
                log::error!(
                    "{} of {} source(s) did not complete",
                    summary.failed().red(),
                    summary.outcomes.len()
                );
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Sources { manifest } => {
            let settings = Settings::from_env()?.with_manifest(manifest);
            for source in list_sources(&settings)? {
                println!(
                    "{}  {}  -> {}  ({} step(s))",
                    source.name.green(),
                    source
                        .kind
                        .unwrap_or_else(|| "unsupported".to_string())
                        .cyan(),
                    source.artifact.bright_white(),
                    source.steps
                );
                println!("    {}", source.url.bright_black());
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Init { path, force } => {
            let count = init_manifest(&path, force)?;
            log::info!(
                "✓ Wrote {} source(s) to {}",
                count.cyan(),
                path.display().bright_black()
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}
