use async_trait::async_trait;
use bson::{doc, Document};
use futures::TryStreamExt;
use mongodb::{Client, Collection, Database};
use tracing::{debug, info};

use super::{ArrayPull, InventoryStore, UpdateOutcome};
use crate::errors::StoreError;

pub struct MongoStore {
    client: Client,
    db: Database,
    collection: Collection<Document>,
}

impl MongoStore {
    pub fn new(client: Client, database_name: &str, collection_name: &str) -> Self {
        let db = client.database(database_name);
        let collection = db.collection(collection_name);
        Self {
            client,
            db,
            collection,
        }
    }

    pub fn collection_name(&self) -> &str {
        self.collection.name()
    }
}

#[async_trait]
impl InventoryStore for MongoStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn find(&self, projection: Option<Document>) -> Result<Vec<Document>, StoreError> {
        let mut find = self.collection.find(doc! {});
        if let Some(projection) = projection {
            find = find.projection(projection);
        }

        let cursor = find.await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        Ok(documents)
    }

    async fn aggregate(&self, pipeline: Vec<Document>) -> Result<Vec<Document>, StoreError> {
        debug!(stages = pipeline.len(), "running aggregation");
        let cursor = self.collection.aggregate(pipeline).await?;
        let rows: Vec<Document> = cursor.try_collect().await?;
        Ok(rows)
    }

    async fn count_documents(&self, filter: Document) -> Result<u64, StoreError> {
        Ok(self.collection.count_documents(filter).await?)
    }

    async fn pull_many(&self, pull: &ArrayPull) -> Result<UpdateOutcome, StoreError> {
        let result = self
            .collection
            .update_many(doc! {}, pull.to_update())
            .await?;

        Ok(UpdateOutcome {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
        })
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.client.clone().shutdown().await;
        info!(collection = %self.collection_name(), "closed MongoDB connection");
        Ok(())
    }
}
