use std::fmt;

use bson::{Bson, Document};
use serde::{Deserialize, Deserializer, Serialize};

pub const AVAILABLE: &str = "available";

/// Identifier of a listing. Integral numbers of any BSON width collapse to
/// `Int`, which is how the server compares them inside `$in`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum ListingId {
    Int(i64),
    Text(String),
}

impl ListingId {
    pub fn from_bson(value: &Bson) -> Option<Self> {
        match value {
            Bson::Int32(n) => Some(Self::Int(i64::from(*n))),
            Bson::Int64(n) => Some(Self::Int(*n)),
            // Whole doubles beyond the i64 range would saturate on the cast.
            Bson::Double(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.2e18 => {
                Some(Self::Int(*n as i64))
            }
            Bson::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    pub fn to_bson(&self) -> Bson {
        match self {
            Self::Int(n) => Bson::Int64(*n),
            Self::Text(s) => Bson::String(s.clone()),
        }
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for ListingId {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<&str> for ListingId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Arrays that are absent or explicitly `null` read as empty. Elements that
/// are not sub-documents are skipped; only a non-array value is an error.
fn document_elements<'de, D>(deserializer: D) -> Result<Vec<Document>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = Option::<Vec<Bson>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Bson::Document(document) => Some(document),
            _ => None,
        })
        .collect())
}

fn lenient_listings<'de, D>(deserializer: D) -> Result<Vec<Listing>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(document_elements(deserializer)?.iter().map(Listing::from).collect())
}

fn lenient_refs<'de, D>(deserializer: D) -> Result<Vec<InventoryRef>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(document_elements(deserializer)?.iter().map(InventoryRef::from).collect())
}

/// `key` as stored, with `null` folded into absence.
fn present(document: &Document, key: &str) -> Option<Bson> {
    document
        .get(key)
        .filter(|value| !matches!(value, Bson::Null | Bson::Undefined))
        .cloned()
}

/// A listing as the sweep sees it. Every field is optional and a field of an
/// unexpected type reads as absent (text fields) or is kept raw (the rest).
#[derive(Debug, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub listing_id: Option<Bson>,
    pub title: Option<String>,
    pub url: Option<String>,
    /// Stored as text by the ingestion process; see [`Listing::price`].
    pub price_of_shoe: Option<Bson>,
    pub condition_of_shoe: Option<Bson>,
    pub listing_status: Option<Bson>,
}

impl From<&Document> for Listing {
    fn from(document: &Document) -> Self {
        let text = |key: &str| document.get_str(key).ok().map(str::to_string);
        Self {
            listing_id: present(document, "listingId"),
            title: text("title"),
            url: text("url"),
            price_of_shoe: present(document, "priceOfShoe"),
            condition_of_shoe: present(document, "conditionOfShoe"),
            listing_status: present(document, "listingStatus"),
        }
    }
}

fn bson_to_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::String(s) => s.trim().parse().ok(),
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

impl Listing {
    pub fn listing_id(&self) -> Option<ListingId> {
        self.listing_id.as_ref().and_then(ListingId::from_bson)
    }

    /// A listing with no `listingStatus` counts as available. Once the field
    /// is present, anything but a sub-document whose `status` is exactly
    /// `"available"` makes it unavailable, including a bare string status.
    pub fn is_unavailable(&self) -> bool {
        match &self.listing_status {
            None => false,
            Some(Bson::Document(status)) => {
                !matches!(status.get("status"), Some(Bson::String(s)) if s == AVAILABLE)
            }
            Some(_) => true,
        }
    }

    pub fn price(&self) -> Option<f64> {
        self.price_of_shoe.as_ref().and_then(bson_to_f64)
    }

    pub fn condition(&self) -> Option<i32> {
        self.condition_of_shoe
            .as_ref()
            .and_then(bson_to_f64)
            .filter(|c| c.fract() == 0.0 && (0.0..=100.0).contains(c))
            .map(|c| c as i32)
    }
}

#[derive(Debug, Serialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRef {
    pub listing_id: Option<Bson>,
}

impl From<&Document> for InventoryRef {
    fn from(document: &Document) -> Self {
        Self {
            listing_id: present(document, "listingId"),
        }
    }
}

impl InventoryRef {
    pub fn listing_id(&self) -> Option<ListingId> {
        self.listing_id.as_ref().and_then(ListingId::from_bson)
    }
}

/// A seller or batch record: the tracked `listings` and the derived
/// `potentialInventory` that references listings by id.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Bson>,
    #[serde(default, deserialize_with = "lenient_listings")]
    pub listings: Vec<Listing>,
    #[serde(default, deserialize_with = "lenient_refs")]
    pub potential_inventory: Vec<InventoryRef>,
}

impl InventoryDocument {
    pub fn from_document(document: Document) -> Result<Self, bson::de::Error> {
        bson::from_document(document)
    }

    pub fn display_id(&self) -> String {
        display_id(self.id.as_ref())
    }
}

pub fn display_id(id: Option<&Bson>) -> String {
    match id {
        Some(Bson::ObjectId(oid)) => oid.to_hex(),
        Some(Bson::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "<no _id>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn missing_arrays_decode_as_empty() {
        let parsed = InventoryDocument::from_document(doc! { "_id": "a" }).unwrap();
        assert!(parsed.listings.is_empty());
        assert!(parsed.potential_inventory.is_empty());

        let parsed =
            InventoryDocument::from_document(doc! { "_id": "b", "listings": null, "potentialInventory": null })
                .unwrap();
        assert!(parsed.listings.is_empty());
        assert!(parsed.potential_inventory.is_empty());
    }

    #[test]
    fn wrong_array_type_is_a_decode_error() {
        assert!(InventoryDocument::from_document(doc! { "listings": "oops" }).is_err());
    }

    #[test]
    fn status_rules() {
        let listing = |status: Option<Bson>| {
            let mut d = doc! { "listingId": 1 };
            if let Some(s) = status {
                d.insert("listingStatus", s);
            }
            Listing::from(&d)
        };

        assert!(!listing(None).is_unavailable());
        assert!(!listing(Some(Bson::Null)).is_unavailable());
        assert!(!listing(Some(doc! { "status": "available" }.into())).is_unavailable());
        assert!(listing(Some(doc! { "status": "sold" }.into())).is_unavailable());
        assert!(listing(Some(doc! { "status": "Available" }.into())).is_unavailable());
        assert!(listing(Some(doc! {}.into())).is_unavailable());
        assert!(listing(Some(doc! { "status": 1 }.into())).is_unavailable());
    }

    #[test]
    fn bare_status_values_are_unavailable() {
        let listing = |status: Bson| Listing::from(&doc! { "listingId": 1, "listingStatus": status });

        assert!(listing(Bson::String("sold".into())).is_unavailable());
        assert!(listing(Bson::String("available".into())).is_unavailable());
        assert!(listing(Bson::Boolean(true)).is_unavailable());
    }

    #[test]
    fn unexpected_field_types_do_not_fail_decoding() {
        let parsed = InventoryDocument::from_document(doc! {
            "_id": "z",
            "listings": [ { "listingId": 4, "title": 1234, "url": false, "listingStatus": "sold" } ],
        })
        .unwrap();

        assert_eq!(parsed.listings.len(), 1);
        assert_eq!(parsed.listings[0].title, None);
        assert_eq!(parsed.listings[0].listing_id(), Some(ListingId::Int(4)));
        assert!(parsed.listings[0].is_unavailable());
    }

    #[test]
    fn non_document_elements_are_skipped() {
        let parsed = InventoryDocument::from_document(doc! {
            "_id": "p",
            "listings": [ "stray", { "listingId": 1 } ],
            "potentialInventory": [ 7, null, { "listingId": 2 } ],
        })
        .unwrap();

        assert_eq!(parsed.listings.len(), 1);
        assert_eq!(
            parsed.potential_inventory.iter().map(InventoryRef::listing_id).collect::<Vec<_>>(),
            vec![Some(ListingId::Int(2))]
        );
    }

    #[test]
    fn listing_ids_normalise_numbers() {
        assert_eq!(ListingId::from_bson(&Bson::Int32(7)), Some(ListingId::Int(7)));
        assert_eq!(ListingId::from_bson(&Bson::Double(7.0)), Some(ListingId::Int(7)));
        assert_eq!(ListingId::from_bson(&Bson::Double(7.5)), None);
        assert_eq!(ListingId::from_bson(&Bson::Double(1e20)), None);
        assert_eq!(ListingId::from_bson(&Bson::Double(-1e20)), None);
        assert_eq!(ListingId::from_bson(&Bson::String("x1".into())), Some(ListingId::from("x1")));
        assert_eq!(ListingId::from_bson(&Bson::Null), None);
    }

    #[test]
    fn text_fields_convert_to_numbers() {
        let listing = Listing::from(&doc! {
            "listingId": "abc",
            "priceOfShoe": "249.99",
            "conditionOfShoe": "90",
        });

        assert_eq!(listing.price(), Some(249.99));
        assert_eq!(listing.condition(), Some(90));
    }
}
