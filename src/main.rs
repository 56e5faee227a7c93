// First-boot agent: reads instance metadata and applies the hostname
use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use tracing::{debug, error};
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

use std::io::stderr;

mod cmd;
mod config;

use cmd::apply::ApplyArgs;
use cmd::user_data::UserDataArgs;
use config::{KernelParams, MetadataArgs};

#[derive(Parser, Debug)]
#[command(author, version, about = "Firstboot instance configuration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    metadata: MetadataArgs,

    /// Verbose output - shows more detailed logs
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load metadata and apply the hostname (default action).
    Apply(ApplyArgs),
    /// Print the metadata known for this instance.
    Show,
    /// Write the raw user data.
    UserData(UserDataArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let default_directives = format!(
        "firstboot={level},firstboot_metadata={level},firstboot_hostname={level},hyper=warn,reqwest=warn,rustls=warn",
        level = level
    );
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));
    registry().with(filter).with(fmt::layer().with_writer(stderr)).init();

    let kernel_params = KernelParams::from_cmdline();
    let config = cli.metadata.to_config(&kernel_params);
    debug!(base_url = %config.base_url, retries = config.retry_count, "Metadata configuration");

    let result = match cli.command.unwrap_or_else(|| Commands::Apply(ApplyArgs::default())) {
        Commands::Apply(args) => cmd::apply::run_apply(&args, &config).await,
        Commands::Show => cmd::show::run_show(&config).await,
        Commands::UserData(args) => cmd::user_data::run_user_data(&args, &config).await,
    };

    if let Err(e) = &result {
        error!("firstboot failed: {:#}", e);
    }
    result
}
