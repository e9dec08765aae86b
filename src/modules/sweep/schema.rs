use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::modules::inventory::model::ListingId;
use crate::store::UpdateOutcome;

/// A document whose `potentialInventory` still points at unavailable listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferencingDocument {
    pub document_id: String,
    pub matched_ids: Vec<ListingId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub documents_scanned: usize,
    pub unavailable_ids: BTreeSet<ListingId>,
    pub referencing_documents: Vec<ReferencingDocument>,
    /// `None` when the run was a dry run and nothing was written.
    pub outcome: Option<UpdateOutcome>,
}
