use std::collections::BTreeSet;

use bson::{doc, Bson};
use chrono::Utc;
use tracing::{info, warn};

use crate::config::settings::SweepConfig;
use crate::errors::SweepError;
use crate::modules::inventory::model::{display_id, InventoryDocument, ListingId};
use crate::modules::sweep::schema::{ReferencingDocument, SweepReport};
use crate::store::{ArrayPull, InventoryStore, UpdateOutcome};

pub const LISTINGS_FIELD: &str = "listings";
pub const POTENTIAL_INVENTORY_FIELD: &str = "potentialInventory";
pub const LISTING_ID_KEY: &str = "listingId";

/// Collect the ids of every listing whose status is set to something other
/// than `"available"`.
pub fn identify_unavailable(documents: &[InventoryDocument]) -> BTreeSet<ListingId> {
    let mut ids = BTreeSet::new();
    for document in documents {
        for listing in document.listings.iter().filter(|l| l.is_unavailable()) {
            match listing.listing_id() {
                Some(id) => {
                    ids.insert(id);
                }
                None => warn!(
                    document = %document.display_id(),
                    "skipping unavailable listing without a usable listingId"
                ),
            }
        }
    }
    ids
}

/// Documents whose `potentialInventory` references any of `unavailable`,
/// paired with the matching ids in their stored order.
pub fn find_referencing_documents(
    documents: &[InventoryDocument],
    unavailable: &BTreeSet<ListingId>,
) -> Vec<ReferencingDocument> {
    documents
        .iter()
        .filter_map(|document| {
            let matched_ids: Vec<ListingId> = document
                .potential_inventory
                .iter()
                .filter_map(|r| r.listing_id())
                .filter(|id| unavailable.contains(id))
                .collect();

            if matched_ids.is_empty() {
                None
            } else {
                Some(ReferencingDocument {
                    document_id: document.display_id(),
                    matched_ids,
                })
            }
        })
        .collect()
}

pub struct ConsistencySweeper<'a, S: InventoryStore + ?Sized> {
    store: &'a S,
    dry_run: bool,
}

impl<'a, S: InventoryStore + ?Sized> ConsistencySweeper<'a, S> {
    pub fn new(store: &'a S, config: &SweepConfig) -> Self {
        Self {
            store,
            dry_run: config.dry_run,
        }
    }

    /// Read the whole collection, limited to the listing ids and statuses the
    /// sweep looks at, so unrelated listing fields never reach the decoder.
    pub async fn load_documents(&self) -> Result<Vec<InventoryDocument>, SweepError> {
        let raw = self
            .store
            .find(Some(doc! {
                "_id": 1,
                "listings.listingId": 1,
                "listings.listingStatus": 1,
                "potentialInventory.listingId": 1,
            }))
            .await?;

        raw.into_iter()
            .map(|document| {
                let document_id = display_id(document.get("_id"));
                InventoryDocument::from_document(document)
                    .map_err(|source| SweepError::DataShape { document_id, source })
            })
            .collect()
    }

    /// Remove every listing and inventory reference whose id is in
    /// `unavailable`, across the whole collection, in one bulk request.
    pub async fn sweep(&self, unavailable: &BTreeSet<ListingId>) -> Result<UpdateOutcome, SweepError> {
        if unavailable.is_empty() {
            info!("no unavailable listings, nothing to sweep");
            return Ok(UpdateOutcome::default());
        }

        let values: Vec<Bson> = unavailable.iter().map(ListingId::to_bson).collect();
        let pull = ArrayPull::new(
            [POTENTIAL_INVENTORY_FIELD, LISTINGS_FIELD],
            LISTING_ID_KEY,
            values,
        );

        let outcome = self.store.pull_many(&pull).await?;
        info!(
            ids = unavailable.len(),
            matched = outcome.matched_count,
            modified = outcome.modified_count,
            "removed unavailable listings from potential inventory and listings"
        );
        Ok(outcome)
    }

    /// Load, identify, audit, then sweep. A failed read stops the run before
    /// anything is written.
    pub async fn run(&self) -> Result<SweepReport, SweepError> {
        let started_at = Utc::now();

        let documents = self.load_documents().await?;
        info!(documents = documents.len(), "loaded documents for sweep");

        let unavailable_ids = identify_unavailable(&documents);
        info!(
            ids = %join_ids(unavailable_ids.iter()),
            "identified unavailable listings"
        );

        let referencing_documents = find_referencing_documents(&documents, &unavailable_ids);
        for entry in &referencing_documents {
            info!(
                document = %entry.document_id,
                ids = %join_ids(entry.matched_ids.iter()),
                "potential inventory references unavailable listings"
            );
        }

        let outcome = if self.dry_run {
            info!(ids = unavailable_ids.len(), "dry run, skipping sweep");
            None
        } else {
            Some(self.sweep(&unavailable_ids).await?)
        };

        Ok(SweepReport {
            started_at,
            finished_at: Utc::now(),
            documents_scanned: documents.len(),
            unavailable_ids,
            referencing_documents,
            outcome,
        })
    }
}

fn join_ids<'i>(ids: impl Iterator<Item = &'i ListingId>) -> String {
    ids.map(ToString::to_string).collect::<Vec<_>>().join(",")
}
