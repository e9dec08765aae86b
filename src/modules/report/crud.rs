use bson::{Bson, Document};
use tracing::info;

use crate::errors::ReportError;
use crate::modules::report::{pipeline, schema::PriceConditionRow, schema::ReportParams};
use crate::store::InventoryStore;

/// Read-only reporting queries over the inventory collection.
pub struct ReportCrud<'a, S: InventoryStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: InventoryStore + ?Sized> ReportCrud<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// `None` when there are no listings or no convertible conditions.
    pub async fn average_condition(&self) -> Result<Option<String>, ReportError> {
        let rows = self.store.aggregate(pipeline::average_condition()).await?;
        let average = rows.first().and_then(average_from_row);
        info!(average = average.as_deref().unwrap_or("N/A"), "computed average condition");
        Ok(average)
    }

    pub async fn listings_by_price_and_condition(
        &self,
        params: &ReportParams,
    ) -> Result<Vec<PriceConditionRow>, ReportError> {
        let rows = self
            .store
            .aggregate(pipeline::price_and_condition(params))
            .await?;
        info!(rows = rows.len(), "searched listings by price and condition");
        decode_rows(rows)
    }

    pub async fn count_titles_matching(&self, pattern: &str) -> Result<u64, ReportError> {
        let count = self
            .store
            .count_documents(pipeline::title_filter(pattern))
            .await?;
        info!(pattern, count, "counted documents by listing title");
        Ok(count)
    }

    pub async fn dump(&self) -> Result<Vec<Document>, ReportError> {
        Ok(self.store.find(None).await?)
    }
}

pub fn average_from_row(row: &Document) -> Option<String> {
    match row.get("averageCondition")? {
        Bson::Decimal128(d) => Some(d.to_string()),
        Bson::Double(n) => Some(n.to_string()),
        Bson::Int32(n) => Some(n.to_string()),
        Bson::Int64(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn decode_rows(rows: Vec<Document>) -> Result<Vec<PriceConditionRow>, ReportError> {
    rows.into_iter()
        .map(|row| bson::from_document(row).map_err(ReportError::from))
        .collect()
}
