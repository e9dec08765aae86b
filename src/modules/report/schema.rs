use bson::Bson;
use serde::{Deserialize, Serialize};

use crate::config::settings::SweepConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportParams {
    pub price_min: f64,
    pub price_max: f64,
    pub min_condition: i32,
    pub title_pattern: String,
}

impl From<&SweepConfig> for ReportParams {
    fn from(config: &SweepConfig) -> Self {
        Self {
            price_min: config.report_price_min,
            price_max: config.report_price_max,
            min_condition: config.report_min_condition,
            title_pattern: config.report_title_pattern.clone(),
        }
    }
}

/// One row of the price/condition search, with price and condition as stored.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceConditionRow {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub price_of_shoe: Option<Bson>,
    #[serde(default)]
    pub condition_of_shoe: Option<Bson>,
}
