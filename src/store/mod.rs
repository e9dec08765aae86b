//! The document-store seam the sweeper and the reports talk to.
//!
//! `MongoStore` is the production implementation; `MemoryStore` keeps the
//! collection in process so the mutating logic can be exercised without a
//! live database.

use async_trait::async_trait;
use bson::{Bson, Document};
use serde::Serialize;

use crate::errors::StoreError;

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Counts reported back by a bulk update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpdateOutcome {
    pub matched_count: u64,
    pub modified_count: u64,
}

/// A bulk removal of array elements, applied to every document in the
/// collection in one request.
///
/// For each field in `fields`, every element that is a sub-document whose
/// `key` equals one of `values` is removed.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayPull {
    pub fields: Vec<String>,
    pub key: String,
    pub values: Vec<Bson>,
}

impl ArrayPull {
    pub fn new<I, S>(fields: I, key: impl Into<String>, values: Vec<Bson>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            key: key.into(),
            values,
        }
    }

    /// The `$pull` update document a MongoDB server understands.
    pub fn to_update(&self) -> Document {
        let mut pull = Document::new();
        for field in &self.fields {
            let mut condition = Document::new();
            condition.insert(
                self.key.clone(),
                bson::doc! { "$in": Bson::Array(self.values.clone()) },
            );
            pull.insert(field.clone(), condition);
        }
        bson::doc! { "$pull": pull }
    }
}

#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    /// Every document in the collection, optionally limited by an inclusion projection.
    async fn find(&self, projection: Option<Document>) -> Result<Vec<Document>, StoreError>;

    async fn aggregate(&self, pipeline: Vec<Document>) -> Result<Vec<Document>, StoreError>;

    async fn count_documents(&self, filter: Document) -> Result<u64, StoreError>;

    async fn pull_many(&self, pull: &ArrayPull) -> Result<UpdateOutcome, StoreError>;

    async fn close(&self) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn pull_update_covers_every_field_in_one_document() {
        let pull = ArrayPull::new(
            ["potentialInventory", "listings"],
            "listingId",
            vec![Bson::Int64(2), Bson::String("abc".into())],
        );

        assert_eq!(
            pull.to_update(),
            doc! {
                "$pull": {
                    "potentialInventory": { "listingId": { "$in": [2_i64, "abc"] } },
                    "listings": { "listingId": { "$in": [2_i64, "abc"] } },
                }
            }
        );
    }
}
