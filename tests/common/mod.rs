//! Shared fixtures for integration tests

#![allow(dead_code)]

use flate2::Compression;
use flate2::write::GzEncoder;
use parquet_etl::storage::DataLayout;
use std::io::Write;
use std::path::Path;

pub const ORDERS_JSON: &str = r#"{"order_id": "o1", "customer_id": "c1", "order_created_at": "2019-01-17T22:50:06.000Z", "order_total_amount": 48.5, "order_scheduled_date": "2019-01-17T23:30:00.000Z"}
{"order_id": "o1", "customer_id": "c1", "order_created_at": "2019-01-18T10:00:00.000Z", "order_total_amount": 52.0, "order_scheduled_date": null}
{"order_id": "o2", "customer_id": null, "order_created_at": "2019-01-18T11:00:00.000Z", "order_total_amount": 10.0, "order_scheduled_date": null}
this line is not json
{"order_id": "o3", "customer_id": "c2", "order_created_at": "2019-01-19T08:15:00.000Z", "order_total_amount": 20.25, "order_scheduled_date": null}
"#;

pub const CONSUMERS_CSV: &str = "customer_id,created_at,customer_name,customer_phone_number
c1,2018-12-01 10:00:00,Ana,5511987654321
c2,2018-12-02 11:00:00,,5511912345678
c1,2018-12-03 12:00:00,Ana Maria,5511987654321
";

pub const RESTAURANTS_CSV: &str = "id,created_at,price_range,takeout_time,average_ticket,delivery_time,minimum_order_value
r1,2017-01-23 12:52:30,3,0,60.0,50.0,30.0
r2,2017-01-20 13:14:48,4,0,100.0,45.0,
r1,2017-01-25 09:00:00,3,10,65.0,40.0,25.0
";

pub const AB_TEST_CSV: &str = "customer_id,is_target
c1,target
c2,control
c3,target
";

pub fn write_gzip(path: &Path, content: &str) {
    let file = std::fs::File::create(path).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(content.as_bytes()).unwrap();
    encoder.finish().unwrap();
}

pub fn write_tar_gz(path: &Path, members: &[(&str, &str)]) {
    let file = std::fs::File::create(path).unwrap();
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    for (name, content) in members {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, content.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
}

/// Place the four built-in datasets in `raw/` so no download happens
pub fn stage_builtin_sources(layout: &DataLayout) {
    layout.ensure().unwrap();
    write_gzip(&layout.raw_path("orders.json.gz"), ORDERS_JSON);
    write_gzip(&layout.raw_path("consumers.csv.gz"), CONSUMERS_CSV);
    write_gzip(&layout.raw_path("restaurants.csv.gz"), RESTAURANTS_CSV);
    write_tar_gz(
        &layout.raw_path("ab_test.tar.gz"),
        &[
            ("._ab_test_ref.csv", "resource fork"),
            ("ab_test_ref.csv", AB_TEST_CSV),
        ],
    );
}
