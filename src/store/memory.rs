use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use bson::{Bson, Document};

use super::{ArrayPull, InventoryStore, UpdateOutcome};
use crate::errors::StoreError;

#[derive(Default)]
struct Inner {
    documents: Vec<Document>,
    closed: bool,
    update_requests: usize,
}

/// An in-process stand-in for the collection.
///
/// Supports the subset of store behaviour the sweep relies on: whole-collection
/// reads with an inclusion projection, unfiltered counts, and `$pull`-style
/// removal across several array fields. Aggregations are not evaluated.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                documents,
                ..Inner::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn open(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        let inner = self.lock();
        if inner.closed {
            return Err(StoreError::Connection("store is closed".to_string()));
        }
        Ok(inner)
    }

    /// Snapshot of the stored documents.
    pub fn documents(&self) -> Vec<Document> {
        self.lock().documents.clone()
    }

    /// Number of bulk update requests received so far.
    pub fn update_requests(&self) -> usize {
        self.lock().update_requests
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

fn is_included(value: &Bson) -> bool {
    match value {
        Bson::Boolean(b) => *b,
        Bson::Int32(n) => *n != 0,
        Bson::Int64(n) => *n != 0,
        Bson::Double(n) => *n != 0.0,
        _ => true,
    }
}

/// Inclusion projection. Dotted paths descend into sub-documents and into
/// the document elements of arrays; scalars met along a dotted path are
/// dropped, as the server does.
fn project(document: &Document, projection: &Document) -> Document {
    let mut projected = Document::new();
    if projection.get("_id").map_or(true, is_included) {
        if let Some(id) = document.get("_id") {
            projected.insert("_id", id.clone());
        }
    }

    for (path, flag) in projection {
        if path.as_str() != "_id" && is_included(flag) {
            project_path(document, path, &mut projected);
        }
    }
    projected
}

fn project_path(source: &Document, path: &str, target: &mut Document) {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };
    let Some(value) = source.get(head) else {
        return;
    };

    let Some(rest) = rest else {
        target.insert(head, value.clone());
        return;
    };

    match value {
        Bson::Document(sub) => {
            let mut nested = match target.get(head) {
                Some(Bson::Document(existing)) => existing.clone(),
                _ => Document::new(),
            };
            project_path(sub, rest, &mut nested);
            target.insert(head, nested);
        }
        Bson::Array(items) => {
            let existing = match target.get(head) {
                Some(Bson::Array(existing)) => existing.clone(),
                _ => Vec::new(),
            };
            let merged: Vec<Bson> = items
                .iter()
                .filter_map(Bson::as_document)
                .enumerate()
                .map(|(i, sub)| {
                    let mut nested = match existing.get(i) {
                        Some(Bson::Document(d)) => d.clone(),
                        _ => Document::new(),
                    };
                    project_path(sub, rest, &mut nested);
                    Bson::Document(nested)
                })
                .collect();
            target.insert(head, merged);
        }
        _ => {}
    }
}

fn as_integer(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(n) => Some(i64::from(*n)),
        Bson::Int64(n) => Some(*n),
        _ => None,
    }
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Double(n) => Some(*n),
        other => as_integer(other).map(|n| n as f64),
    }
}

/// Equality as the server applies it for `$in`: numbers compare by value
/// regardless of their BSON width. Two integers compare exactly; floating
/// point is only involved when one side is a double.
fn values_match(a: &Bson, b: &Bson) -> bool {
    if let (Some(x), Some(y)) = (as_integer(a), as_integer(b)) {
        return x == y;
    }
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn element_matches(element: &Bson, pull: &ArrayPull) -> bool {
    match element {
        Bson::Document(sub) => sub
            .get(pull.key.as_str())
            .is_some_and(|v| pull.values.iter().any(|target| values_match(v, target))),
        _ => false,
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.open().map(|_| ())
    }

    async fn find(&self, projection: Option<Document>) -> Result<Vec<Document>, StoreError> {
        let inner = self.open()?;
        Ok(match projection {
            Some(projection) => inner
                .documents
                .iter()
                .map(|doc| project(doc, &projection))
                .collect(),
            None => inner.documents.clone(),
        })
    }

    async fn aggregate(&self, _pipeline: Vec<Document>) -> Result<Vec<Document>, StoreError> {
        let _inner = self.open()?;
        Err(StoreError::Unsupported("aggregate"))
    }

    async fn count_documents(&self, filter: Document) -> Result<u64, StoreError> {
        let inner = self.open()?;
        if !filter.is_empty() {
            return Err(StoreError::Unsupported("count_documents with a filter"));
        }
        Ok(inner.documents.len() as u64)
    }

    async fn pull_many(&self, pull: &ArrayPull) -> Result<UpdateOutcome, StoreError> {
        let mut inner = self.open()?;
        inner.update_requests += 1;

        let mut outcome = UpdateOutcome::default();
        for document in inner.documents.iter_mut() {
            outcome.matched_count += 1;
            let mut removed = false;
            for field in &pull.fields {
                // A missing or non-array field is left untouched.
                if let Some(Bson::Array(items)) = document.get_mut(field.as_str()) {
                    let before = items.len();
                    items.retain(|item| !element_matches(item, pull));
                    removed |= items.len() != before;
                }
            }
            if removed {
                outcome.modified_count += 1;
            }
        }

        Ok(outcome)
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.lock().closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn pull_ids(values: Vec<Bson>) -> ArrayPull {
        ArrayPull::new(["potentialInventory", "listings"], "listingId", values)
    }

    #[tokio::test]
    async fn projection_keeps_id_and_named_fields() {
        let store = MemoryStore::new(vec![doc! {
            "_id": 1,
            "seller": "kicks",
            "listings": [],
            "potentialInventory": [],
        }]);

        let docs = store
            .find(Some(doc! { "listings": 1, "potentialInventory": 1 }))
            .await
            .unwrap();

        assert_eq!(docs, vec![doc! { "_id": 1, "listings": [], "potentialInventory": [] }]);
    }

    #[tokio::test]
    async fn dotted_projection_reaches_into_arrays() {
        let store = MemoryStore::new(vec![doc! {
            "_id": 1,
            "listings": [
                { "listingId": 1, "title": 1234, "listingStatus": "sold" },
                "stray",
                { "title": "no id" },
            ],
            "potentialInventory": [ 7, { "listingId": 2, "note": "x" } ],
            "seller": { "name": "kicks", "rating": 5 },
        }]);

        let docs = store
            .find(Some(doc! {
                "_id": 1,
                "listings.listingId": 1,
                "listings.listingStatus": 1,
                "potentialInventory.listingId": 1,
                "seller.name": 1,
            }))
            .await
            .unwrap();

        assert_eq!(
            docs,
            vec![doc! {
                "_id": 1,
                "listings": [ { "listingId": 1, "listingStatus": "sold" }, {} ],
                "potentialInventory": [ { "listingId": 2 } ],
                "seller": { "name": "kicks" },
            }]
        );
    }

    #[tokio::test]
    async fn dotted_projection_drops_scalar_parents() {
        let store = MemoryStore::new(vec![doc! { "_id": 1, "listings": "not-an-array" }]);

        let docs = store.find(Some(doc! { "listings.listingId": 1 })).await.unwrap();

        assert_eq!(docs, vec![doc! { "_id": 1 }]);
    }

    #[tokio::test]
    async fn pull_compares_large_integers_exactly() {
        let big = 9_007_199_254_740_993_i64;
        let neighbour = big - 1;
        let store = MemoryStore::new(vec![doc! {
            "_id": 1,
            "listings": [ { "listingId": big }, { "listingId": neighbour } ],
        }]);

        let outcome = store.pull_many(&pull_ids(vec![Bson::Int64(big)])).await.unwrap();

        assert_eq!(outcome.modified_count, 1);
        assert_eq!(
            store.documents(),
            vec![doc! { "_id": 1, "listings": [ { "listingId": neighbour } ] }]
        );
    }

    #[tokio::test]
    async fn pull_matches_numbers_across_widths() {
        let store = MemoryStore::new(vec![doc! {
            "_id": 1,
            "listings": [ { "listingId": 2_i32 }, { "listingId": 3.0 } ],
        }]);

        let outcome = store
            .pull_many(&pull_ids(vec![Bson::Int64(2), Bson::Int64(3)]))
            .await
            .unwrap();

        assert_eq!(outcome, UpdateOutcome { matched_count: 1, modified_count: 1 });
        assert_eq!(store.documents(), vec![doc! { "_id": 1, "listings": [] }]);
    }

    #[tokio::test]
    async fn pull_ignores_missing_and_non_array_fields() {
        let store = MemoryStore::new(vec![
            doc! { "_id": 1 },
            doc! { "_id": 2, "listings": "not-an-array", "potentialInventory": null },
        ]);

        let outcome = store.pull_many(&pull_ids(vec![Bson::Int64(2)])).await.unwrap();

        assert_eq!(outcome.modified_count, 0);
        assert_eq!(
            store.documents(),
            vec![
                doc! { "_id": 1 },
                doc! { "_id": 2, "listings": "not-an-array", "potentialInventory": null },
            ]
        );
    }

    #[tokio::test]
    async fn closed_store_rejects_operations() {
        let store = MemoryStore::new(vec![]);
        store.close().await.unwrap();

        assert!(store.is_closed());
        assert!(matches!(store.ping().await, Err(StoreError::Connection(_))));
        assert!(matches!(store.find(None).await, Err(StoreError::Connection(_))));
    }

    #[tokio::test]
    async fn aggregation_is_unsupported() {
        let store = MemoryStore::new(vec![]);
        let err = store.aggregate(vec![doc! { "$match": {} }]).await.unwrap_err();
        assert!(matches!(err, StoreError::Unsupported("aggregate")));
    }
}
