pub mod apply;
pub mod show;
pub mod user_data;

use color_eyre::eyre::{eyre, Result};
use firstboot_metadata::{HttpTransport, MetadataConfig, MetadataStore};

/// Build a store from `config` and load it, failing if the service is unavailable
pub async fn load_store(config: &MetadataConfig) -> Result<MetadataStore<HttpTransport>> {
    let mut store = MetadataStore::from_config(config)?;
    if !store.load().await {
        return Err(eyre!("metadata service unavailable at {}", store.base_url()));
    }
    Ok(store)
}
