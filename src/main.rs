use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use model_cards_lib::config::Config;
use model_cards_lib::pipeline::{Fields, Inspector, Updater};
use model_cards_lib::registry::OciRegistryClient;

/// Model card maintenance against a model registry.
///
/// Examples:
///   model-cards update --model-dir ai
///   model-cards update --model-dir ai --model-file smollm2.md
///   model-cards inspect-model ai/smollm2 --tag 360M-Q4_K_M --json
#[derive(Parser)]
#[command(
    name = "model-cards",
    version = env!("CARGO_PKG_VERSION"),
    arg_required_else_help = true,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Regenerate the "Available model variants" table of model cards
    Update {
        /// Directory containing model markdown files
        #[arg(long, value_name = "DIR", env = "MODEL_CARDS_MODEL_DIR")]
        model_dir: Option<PathBuf>,

        /// Only update this file (name relative to the model dir)
        #[arg(long, value_name = "FILE")]
        model_file: Option<PathBuf>,

        #[command(flatten)]
        log: LogArgs,
    },

    /// Print registry-derived metadata for a repository's tags
    #[command(name = "inspect-model")]
    InspectModel {
        /// Repository, e.g. ai/smollm2
        repository: String,

        /// Inspect only this tag
        #[arg(long)]
        tag: Option<String>,

        #[command(flatten)]
        fields: FieldArgs,

        /// Output JSON instead of text
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        log: LogArgs,
    },
}

#[derive(Args)]
struct FieldArgs {
    /// Show all metadata (default when nothing is selected)
    #[arg(long)]
    all: bool,
    /// Show parameters
    #[arg(long)]
    parameters: bool,
    /// Show architecture
    #[arg(long)]
    architecture: bool,
    /// Show quantization
    #[arg(long)]
    quantization: bool,
    /// Show size
    #[arg(long)]
    size: bool,
    /// Show context length
    #[arg(long)]
    context: bool,
    /// Show VRAM estimate
    #[arg(long)]
    vram: bool,
}

impl From<FieldArgs> for Fields {
    fn from(args: FieldArgs) -> Self {
        if args.all {
            return Fields::ALL;
        }
        Fields {
            parameters: args.parameters,
            architecture: args.architecture,
            quantization: args.quantization,
            size: args.size,
            context: args.context,
            vram: args.vram,
        }
    }
}

#[derive(Args)]
struct LogArgs {
    /// Log level; RUST_LOG applies when omitted
    #[arg(long, value_enum, value_name = "LEVEL")]
    log_level: Option<LogLevel>,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

fn init_logging(level: Option<LogLevel>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = level {
        builder.filter_level(level.into());
    }
    builder.init();
}

async fn run(command: Command, config: Config) -> model_cards_lib::Result<()> {
    let registry = OciRegistryClient::new(&config)?;

    match command {
        Command::Update {
            model_dir,
            model_file,
            ..
        } => {
            let model_dir = model_dir.unwrap_or(config.model_dir);
            let mut updater = Updater::new(&registry, model_dir);
            if let Some(file) = model_file {
                updater = updater.with_model_file(file);
            }
            updater.run().await?;
        }
        Command::InspectModel {
            repository,
            tag,
            fields,
            json,
            ..
        } => {
            let inspector = Inspector::new(&registry, fields.into(), json);
            let mut stdout = std::io::stdout().lock();
            inspector.run(&repository, tag.as_deref(), &mut stdout).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match &cli.command {
        Command::Update { log, .. } | Command::InspectModel { log, .. } => log.log_level,
    };
    init_logging(log_level);

    let config = Config::from_env();
    log::debug!("[CONFIG] Registry {}", config.registry_url());

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
