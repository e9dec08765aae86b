use bson::{doc, Document};

use crate::modules::report::schema::ReportParams;

pub fn average_condition() -> Vec<Document> {
    vec![
        doc! { "$unwind": "$listings" },
        doc! {
            "$group": {
                "_id": null,
                "averageCondition": { "$avg": { "$toDecimal": "$listings.conditionOfShoe" } },
            }
        },
    ]
}

/// Listings priced within `[price_min, price_max]` with at least
/// `min_condition`, cheapest first. Values that fail numeric conversion become
/// null and so never match.
pub fn price_and_condition(params: &ReportParams) -> Vec<Document> {
    vec![
        doc! { "$unwind": "$listings" },
        doc! {
            "$addFields": {
                "listings.priceOfShoeNumeric": {
                    "$convert": { "input": "$listings.priceOfShoe", "to": "double", "onError": null, "onNull": null }
                },
                "listings.conditionOfShoeNumeric": {
                    "$convert": { "input": "$listings.conditionOfShoe", "to": "int", "onError": null, "onNull": null }
                },
            }
        },
        doc! {
            "$match": {
                "$and": [
                    { "listings.priceOfShoeNumeric": { "$gte": params.price_min, "$lte": params.price_max } },
                    { "listings.conditionOfShoeNumeric": { "$gte": params.min_condition } },
                ]
            }
        },
        doc! { "$sort": { "listings.priceOfShoeNumeric": 1 } },
        doc! {
            "$project": {
                "_id": 0,
                "title": "$listings.title",
                "url": "$listings.url",
                "priceOfShoe": "$listings.priceOfShoe",
                "conditionOfShoe": "$listings.conditionOfShoe",
            }
        },
    ]
}

/// Case-insensitive regex match on any listing title in the document.
pub fn title_filter(pattern: &str) -> Document {
    doc! { "listings.title": { "$regex": pattern, "$options": "i" } }
}
