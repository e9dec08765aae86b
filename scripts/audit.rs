//! Run with: cargo run --bin audit
//!
//! Lists unavailable listings and the documents whose potential inventory
//! still references them. Never writes to the collection.

use sneaker_inventory::config::{database, settings};
use sneaker_inventory::modules::sweep::{find_referencing_documents, identify_unavailable, ConsistencySweeper};
use sneaker_inventory::InventoryStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = settings::load_config()?;
    let store = database::connect(&config).await?;

    let result = async {
        let sweeper = ConsistencySweeper::new(&store, &config);
        let documents = sweeper.load_documents().await?;
        let unavailable = identify_unavailable(&documents);
        let referencing = find_referencing_documents(&documents, &unavailable);
        Ok::<_, anyhow::Error>((documents.len(), unavailable, referencing))
    }
    .await;

    store.close().await?;
    let (scanned, unavailable, referencing) = result?;

    println!("Scanned {} documents", scanned);
    println!(
        "Unavailable Listing IDs: {}",
        unavailable.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
    );
    println!(
        "Matched Unavailable Listing IDs in Potential Inventory: {}",
        serde_json::to_string_pretty(&referencing)?
    );

    Ok(())
}
