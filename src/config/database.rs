use std::time::Duration;

use mongodb::options::{ClientOptions, ServerApi, ServerApiVersion};
use mongodb::Client;
use tracing::{info, warn};

use crate::config::settings::SweepConfig;
use crate::errors::StoreError;
use crate::store::{InventoryStore, MongoStore};

const APP_NAME: &str = "sneaker-inventory";

/// Open a client for the configured collection and ping it.
///
/// If the ping fails the client is shut down before the error is returned.
pub async fn connect(config: &SweepConfig) -> Result<MongoStore, StoreError> {
    let mut options = ClientOptions::parse(&config.mongodb_uri)
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))?;
    options.app_name = Some(APP_NAME.to_string());
    options.connect_timeout = Some(Duration::from_secs(config.connect_timeout_secs));
    options.server_selection_timeout = Some(Duration::from_secs(config.server_selection_timeout_secs));
    options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());

    let client = Client::with_options(options).map_err(|e| StoreError::Connection(e.to_string()))?;
    let store = MongoStore::new(client, &config.database_name, &config.collection_name);

    if let Err(e) = store.ping().await {
        warn!(error = %e, "ping failed, closing connection");
        store.close().await?;
        return Err(e);
    }

    info!(
        database = %config.database_name,
        collection = %store.collection_name(),
        "Pinged your deployment. You successfully connected to MongoDB!"
    );
    Ok(store)
}
