use bson::doc;
use sneaker_inventory::errors::{ReportError, StoreError};
use sneaker_inventory::modules::report::{crud::ReportCrud, schema::ReportParams};
use sneaker_inventory::{MemoryStore, SweepConfig};

fn store() -> MemoryStore {
    MemoryStore::new(vec![
        doc! { "_id": 1, "listings": [ { "listingId": 1, "title": "Air Jordan 1 Retro High" } ] },
        doc! { "_id": 2, "listings": [] },
    ])
}

#[test]
fn test_dump_returns_whole_documents() {
    let store = store();
    let documents = tokio_test::block_on(ReportCrud::new(&store).dump()).unwrap();

    assert_eq!(documents, store.documents());
}

#[test]
fn test_aggregation_reports_surface_store_errors() {
    let store = store();
    let reports = ReportCrud::new(&store);

    let err = tokio_test::block_on(reports.average_condition()).unwrap_err();
    assert!(matches!(err, ReportError::Store(StoreError::Unsupported(_))));

    let params = ReportParams::from(&SweepConfig::default());
    let err = tokio_test::block_on(reports.listings_by_price_and_condition(&params)).unwrap_err();
    assert!(matches!(err, ReportError::Store(StoreError::Unsupported(_))));
}

#[test]
fn test_report_params_follow_config() {
    let config = SweepConfig {
        report_price_min: 90.0,
        report_price_max: 120.0,
        report_min_condition: 60,
        report_title_pattern: "Dunk".to_string(),
        ..SweepConfig::default()
    };

    assert_eq!(
        ReportParams::from(&config),
        ReportParams {
            price_min: 90.0,
            price_max: 120.0,
            min_condition: 60,
            title_pattern: "Dunk".to_string(),
        }
    );
}
