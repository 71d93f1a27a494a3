//! Integration tests for the batch pipeline
//!
//! Raw files are staged in the data directory before each run, so the fetch
//! step finds them and never goes to the network.

mod common;

use parquet_etl::driver::BatchDriver;
use parquet_etl::etl::{LoadOutcome, Pipeline};
use parquet_etl::extract::{ArchiveExtractor, ContainerKind};
use parquet_etl::fetch::Fetcher;
use parquet_etl::manifest::{SourceEntry, SourcesManifest};
use parquet_etl::report::SourceOutcome;
use parquet_etl::storage::{DataLayout, ParquetLoader, read_parquet};
use parquet_etl::transform::{Recipe, TargetType};
use polars::prelude::*;
use tempfile::TempDir;
use url::Url;

fn strings(table: &DataFrame, column: &str) -> Vec<Option<String>> {
    table
        .column(column)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect()
}

fn floats(table: &DataFrame, column: &str) -> Vec<Option<f64>> {
    table
        .column(column)
        .unwrap()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .collect()
}

fn driver(layout: &DataLayout) -> BatchDriver {
    BatchDriver::new(layout.clone(), Fetcher::try_new().unwrap())
}

#[tokio::test]
async fn test_builtin_manifest_end_to_end() {
    let temp = TempDir::new().unwrap();
    let layout = DataLayout::new(temp.path().join("data"));
    common::stage_builtin_sources(&layout);

    let manifest = SourcesManifest::builtin().unwrap();
    let summary = driver(&layout).run(&manifest).await.unwrap();

    assert!(summary.all_succeeded(), "{:?}", summary.outcomes);
    assert_eq!(summary.succeeded(), 4);
    assert_eq!(
        layout.list_artifacts().unwrap(),
        vec![
            "ab_test",
            "consumers_processed",
            "orders_processed",
            "restaurants_processed"
        ]
    );

    // Raw snapshots keep every decoded row
    let raw_orders = read_parquet(&layout.snapshot_path("orders")).unwrap();
    assert_eq!(raw_orders.height(), 4);

    let orders = read_parquet(&layout.artifact_path("orders_processed")).unwrap();
    assert_eq!(strings(&orders, "order_id"), vec![Some("o3".into()), Some("o1".into())]);
    assert_eq!(floats(&orders, "order_total_amount"), vec![Some(20.25), Some(52.0)]);
    assert_eq!(
        orders.column("order_created_at").unwrap().dtype(),
        &DataType::Datetime(TimeUnit::Microseconds, None)
    );
    assert_eq!(orders.column("customer_id").unwrap().null_count(), 0);

    let consumers = read_parquet(&layout.artifact_path("consumers_processed")).unwrap();
    assert_eq!(
        strings(&consumers, "customer_id"),
        vec![Some("c1".into()), Some("c2".into())]
    );
    assert_eq!(
        strings(&consumers, "customer_name"),
        vec![Some("Ana Maria".into()), Some("n/d".into())]
    );
    assert_eq!(
        consumers.column("customer_phone_number").unwrap().dtype(),
        &DataType::Int64
    );

    let restaurants = read_parquet(&layout.artifact_path("restaurants_processed")).unwrap();
    assert_eq!(
        strings(&restaurants, "id"),
        vec![Some("r1".into()), Some("r2".into())]
    );
    assert_eq!(
        floats(&restaurants, "minimum_order_value"),
        vec![Some(25.0), Some(0.0)]
    );
    assert_eq!(
        restaurants.column("price_range").unwrap().dtype(),
        &DataType::Int64
    );

    let ab_test = read_parquet(&layout.artifact_path("ab_test")).unwrap();
    assert_eq!(ab_test.height(), 3);
    assert_eq!(
        strings(&ab_test, "is_target"),
        vec![
            Some("target".into()),
            Some("control".into()),
            Some("target".into())
        ]
    );
}

#[tokio::test]
async fn test_failing_source_does_not_stop_the_batch() {
    let temp = TempDir::new().unwrap();
    let layout = DataLayout::new(temp.path().join("data"));
    common::stage_builtin_sources(&layout);

    // Second source is not a gzip file at all
    std::fs::write(layout.raw_path("consumers.csv.gz"), "customer_id\nc1\n").unwrap();

    let builtin = SourcesManifest::builtin().unwrap();
    let manifest = SourcesManifest::with_sources(builtin.sources[..3].to_vec());
    let summary = driver(&layout).run(&manifest).await.unwrap();

    assert!(matches!(
        summary.outcome("orders.json.gz"),
        Some(SourceOutcome::Succeeded { rows: 2 })
    ));
    assert!(matches!(
        summary.outcome("consumers.csv.gz"),
        Some(SourceOutcome::Failed { .. })
    ));
    assert!(matches!(
        summary.outcome("restaurants.csv.gz"),
        Some(SourceOutcome::Succeeded { rows: 2 })
    ));
    assert!(!summary.all_succeeded());

    assert!(layout.artifact_path("orders_processed").exists());
    assert!(!layout.artifact_path("consumers_processed").exists());
    assert!(layout.artifact_path("restaurants_processed").exists());
}

#[tokio::test]
async fn test_rerun_reuses_snapshots_and_overwrites_artifacts() {
    let temp = TempDir::new().unwrap();
    let layout = DataLayout::new(temp.path().join("data"));
    layout.ensure().unwrap();
    common::write_gzip(&layout.raw_path("events.csv.gz"), "id,seen\n1,a\n2,b\n");

    let unused = Url::parse("http://127.0.0.1:9/events.csv.gz").unwrap();
    let manifest = SourcesManifest::with_sources(vec![SourceEntry::new("events.csv.gz", unused)]);

    let first = driver(&layout).run(&manifest).await.unwrap();
    assert_eq!(
        first.outcome("events.csv.gz"),
        Some(&SourceOutcome::Succeeded { rows: 2 })
    );

    // A changed raw file is ignored while the snapshot exists
    common::write_gzip(&layout.raw_path("events.csv.gz"), "id,seen\n1,a\n2,b\n3,c\n");
    let second = driver(&layout).run(&manifest).await.unwrap();
    assert_eq!(
        second.outcome("events.csv.gz"),
        Some(&SourceOutcome::Succeeded { rows: 2 })
    );

    let refreshed = driver(&layout)
        .with_refresh(true)
        .run(&manifest)
        .await
        .unwrap();
    assert_eq!(
        refreshed.outcome("events.csv.gz"),
        Some(&SourceOutcome::Succeeded { rows: 3 })
    );
    assert_eq!(read_parquet(&layout.artifact_path("events")).unwrap().height(), 3);
}

#[tokio::test]
async fn test_pipeline_coerces_and_deduplicates_json_lines() {
    let temp = TempDir::new().unwrap();
    let raw = temp.path().join("payments.json.gz");
    common::write_gzip(
        &raw,
        concat!(
            "{\"id\": 1, \"created_at\": \"2024-01-01\", \"amount\": \"10.5\"}\n",
            "{\"id\": 1, \"created_at\": \"2024-01-02\", \"amount\": \"bad\"}\n",
            "{\"id\": 2, \"created_at\": \"2024-01-01\", \"amount\": \"5\"}\n",
        ),
    );

    let pipeline = Pipeline::new(
        ArchiveExtractor::new(
            &raw,
            ContainerKind::GzipJsonLines,
            temp.path().join("extracted").join("payments.parquet"),
        ),
        Recipe::new()
            .coerce_types([("amount", TargetType::Float)])
            .deduplicate("id", "created_at"),
        ParquetLoader::new(temp.path().join("processed"), "payments_processed"),
    );

    let outcome = pipeline.run().await.unwrap();
    let path = temp.path().join("processed").join("payments_processed.parquet");
    assert_eq!(
        outcome,
        LoadOutcome::Written {
            rows: 2,
            path: path.clone()
        }
    );

    let table = read_parquet(&path).unwrap();
    let ids: Vec<Option<i64>> = table
        .column("id")
        .unwrap()
        .i64()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(ids, vec![Some(1), Some(2)]);
    assert_eq!(floats(&table, "amount"), vec![None, Some(5.0)]);
}
