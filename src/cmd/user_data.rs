//! User data command
//!
//! Writes the raw user-data payload to stdout or a file, byte for byte.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use color_eyre::eyre::{Result, WrapErr};
use firstboot_metadata::MetadataConfig;
use tracing::info;

#[derive(Args, Debug, Clone, Default)]
pub struct UserDataArgs {
    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub async fn run_user_data(args: &UserDataArgs, config: &MetadataConfig) -> Result<()> {
    let store = super::load_store(config).await?;
    let data = store.get_user_data()?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &data)
                .wrap_err_with(|| format!("Failed to write user data to {}", path.display()))?;
            info!(path = %path.display(), bytes = data.len(), "Wrote user data");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&data)?;
            stdout.flush()?;
        }
    }

    Ok(())
}
