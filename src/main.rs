use anyhow::Context;
use sneaker_inventory::config::{database, settings};
use sneaker_inventory::modules::report::{crud::ReportCrud, schema::ReportParams};
use sneaker_inventory::modules::sweep::ConsistencySweeper;
use sneaker_inventory::{InventoryStore, SweepConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = settings::load_config().context("failed to load configuration")?;
    let store = database::connect(&config)
        .await
        .context("failed to connect to MongoDB")?;

    let result = run(&store, &config).await;

    if let Err(e) = store.close().await {
        error!(error = %e, "failed to close MongoDB connection");
    }

    result
}

async fn run(store: &dyn InventoryStore, config: &SweepConfig) -> anyhow::Result<()> {
    let reports = ReportCrud::new(store);
    let params = ReportParams::from(config);

    let average = reports.average_condition().await?;
    println!("Average Shoe Condition: {}", average.as_deref().unwrap_or("N/A"));

    let rows = reports.listings_by_price_and_condition(&params).await?;
    println!(
        "Listings by price and condition: {}",
        serde_json::to_string_pretty(&rows)?
    );

    let count = reports.count_titles_matching(&params.title_pattern).await?;
    println!(
        "Number of documents with listings that have {} in the title: {}",
        params.title_pattern, count
    );

    let sweeper = ConsistencySweeper::new(store, config);
    let report = sweeper.run().await?;
    println!("Sweep report: {}", serde_json::to_string_pretty(&report)?);

    let documents = reports.dump().await?;
    info!(documents = documents.len(), "dumping collection");
    for document in &documents {
        println!("{}", document);
    }

    Ok(())
}
