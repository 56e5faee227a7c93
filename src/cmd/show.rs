//! Show command
//!
//! Prints what the metadata service knows about this instance.

use color_eyre::eyre::Result;
use firstboot_metadata::{MetadataConfig, MetadataError, MetadataStore, Transport};
use tracing::warn;

/// Load metadata and print a summary
pub async fn run_show(config: &MetadataConfig) -> Result<()> {
    let store = super::load_store(config).await?;
    print!("{}", render(&store));
    Ok(())
}

fn field(name: &str, value: firstboot_metadata::Result<String>) -> String {
    match value {
        Ok(value) => format!("{}: {}\n", name, value),
        Err(MetadataError::NotFound(_)) => format!("{}: -\n", name),
        Err(e) => {
            warn!(field = name, error = %e, "Unusable metadata value");
            format!("{}: -\n", name)
        }
    }
}

fn render<T: Transport>(store: &MetadataStore<T>) -> String {
    let mut out = String::new();
    out.push_str(&field("Instance ID", store.get_instance_id()));
    out.push_str(&field("Hostname", store.get_host_name()));
    out.push_str(&field(
        "SSH keys",
        store
            .get_public_keys()
            .map(|keys| keys.map_or(0, |k| k.len()).to_string()),
    ));
    out.push_str(&field(
        "User data",
        store
            .get_user_data()
            .map(|data| format!("{} bytes", data.len())),
    ));
    out
}
