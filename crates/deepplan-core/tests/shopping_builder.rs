use deepplan_core::config::DatasetSpec;
use deepplan_core::tables::shopping::build_shopping_tables;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

fn level1_spec() -> DatasetSpec {
    DatasetSpec {
        shopping_levels: vec![1],
        ..Default::default()
    }
}

fn write_json(path: &Path, value: &Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn write_case(case_dir: &Path, validation: Value, products_jsonl: &str) {
    write_json(&case_dir.join("validation_cases.json"), &validation);
    write_json(
        &case_dir.join("user_info.json"),
        &json!({"user_id": "u1", "username": "alice", "is_vip": true}),
    );
    write_json(
        &case_dir.join("cart.json"),
        &json!({"user_id": "u1", "items": [{"product_id": "p9"}], "used_coupons": []}),
    );
    fs::write(case_dir.join("products.jsonl"), products_jsonl).unwrap();
}

/// Level 1 with two cases: `case_001` is found in the query map, `case_7`
/// is absent from it and resolves through the validation-file fallback.
fn build_fixture(root: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let queries_root = root.join("shoppingplanning");
    write_json(
        &queries_root.join("data").join("level_1_query_meta.json"),
        &json!([{"id": 1, "query": "buy a red coat"}]),
    );

    let extracted = root.join("consolidated");
    write_case(
        &extracted.join("database_level1").join("case_001"),
        json!({
            "query": "buy a red coat (validation)",
            "meta_info": {"category": "clothing", "tags": ["winter", "sale"]},
            "ground_truth_products": [
                {"product_id": 11, "name": "Coat", "price": 99.5, "brand": "B", "size": "M", "color": "red"},
                {"product_id": 12, "name": "Scarf", "price": 15, "brand": "B", "size": "", "color": "red"},
            ],
            "ground_truth_coupons": {"SAVE10": 2},
        }),
        concat!(
            r#"{"product_id": "p1", "name": "Coat", "brand": "B", "color": "red", "size": "M", "price": 99.5, "stock_quantity": 4, "rating": 4.5, "sales_volume": 120, "shipping_info": {"days": 2}}"#,
            "\n",
            "\n",
            r#"{"product_id": "p2", "name": "Scarf", "brand": "B", "color": "red", "size": "", "price": 15, "stock_quantity": 9, "rating": 4.0, "sales_volume": 60, "shipping_info": {"days": 5}}"#,
            "\n",
        ),
    );
    write_case(
        &extracted.join("database_level1").join("case_7"),
        json!({
            "query": "restock the pantry",
            "meta_info": {},
            "ground_truth_products": [
                {"product_id": 31, "name": "Rice", "price": 8, "brand": "C", "size": "5kg", "color": ""},
            ],
            "ground_truth_coupons": {},
        }),
        "{\"product_id\": \"p3\", \"name\": \"Rice\"}\n",
    );

    (queries_root, extracted)
}

#[test]
fn builds_all_shopping_tables() {
    let tmp = tempfile::tempdir().unwrap();
    let (queries_root, extracted) = build_fixture(tmp.path());

    let build = build_shopping_tables(&level1_spec(), &queries_root, &extracted).unwrap();
    let tables = &build.tables;

    assert_eq!(tables.rows("shopping_queries").unwrap().len(), 1);
    assert_eq!(tables.rows("shopping_cases").unwrap().len(), 2);
    assert_eq!(tables.rows("shopping_gt_products").unwrap().len(), 3);
    assert_eq!(tables.rows("shopping_gt_coupons").unwrap().len(), 1);
    assert_eq!(tables.rows("shopping_user_info").unwrap().len(), 2);
    assert_eq!(tables.rows("shopping_initial_cart").unwrap().len(), 2);
    assert_eq!(tables.rows("shopping_catalog").unwrap().len(), 3);
}

#[test]
fn zero_padded_directory_yields_canonical_case_id() {
    let tmp = tempfile::tempdir().unwrap();
    let (queries_root, extracted) = build_fixture(tmp.path());

    let build = build_shopping_tables(&level1_spec(), &queries_root, &extracted).unwrap();
    let cases = build.tables.rows("shopping_cases").unwrap();

    assert_eq!(cases[0]["case_id"], json!("1"));
    assert_eq!(cases[0]["query"], json!("buy a red coat"));
    assert_eq!(cases[1]["case_id"], json!("7"));
}

#[test]
fn missing_query_map_entry_falls_back_to_validation_query() {
    let tmp = tempfile::tempdir().unwrap();
    let (queries_root, extracted) = build_fixture(tmp.path());

    let build = build_shopping_tables(&level1_spec(), &queries_root, &extracted).unwrap();
    let cases = build.tables.rows("shopping_cases").unwrap();

    assert_eq!(cases[1]["query"], json!("restock the pantry"));
    assert_eq!(cases[1]["validation_query"], json!("restock the pantry"));
    assert_eq!(build.query_fallback_cases, 1);
}

#[test]
fn exploded_rows_carry_parent_partition_key() {
    let tmp = tempfile::tempdir().unwrap();
    let (queries_root, extracted) = build_fixture(tmp.path());

    let build = build_shopping_tables(&level1_spec(), &queries_root, &extracted).unwrap();

    for table in [
        "shopping_gt_products",
        "shopping_gt_coupons",
        "shopping_user_info",
        "shopping_initial_cart",
        "shopping_catalog",
    ] {
        for row in build.tables.rows(table).unwrap() {
            assert_eq!(row["domain"], json!("shopping"), "{table}");
            assert_eq!(row["level"], json!(1), "{table}");
            assert!(
                row["case_id"] == json!("1") || row["case_id"] == json!("7"),
                "{table}: {:?}",
                row["case_id"]
            );
        }
    }

    let gt = build.tables.rows("shopping_gt_products").unwrap();
    let indices: Vec<&Value> = gt.iter().map(|r| &r["gt_index"]).collect();
    assert_eq!(indices, [&json!(0), &json!(1), &json!(0)]);
}

#[test]
fn json_blob_columns_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let (queries_root, extracted) = build_fixture(tmp.path());

    let build = build_shopping_tables(&level1_spec(), &queries_root, &extracted).unwrap();

    let cases = build.tables.rows("shopping_cases").unwrap();
    let meta: Value =
        serde_json::from_str(cases[0]["meta_info_json"].as_str().unwrap()).unwrap();
    assert_eq!(meta, json!({"category": "clothing", "tags": ["winter", "sale"]}));

    let gt = build.tables.rows("shopping_gt_products").unwrap();
    let product: Value = serde_json::from_str(gt[0]["product_json"].as_str().unwrap()).unwrap();
    assert_eq!(product["price"], json!(99.5));
    assert_eq!(product["product_id"], json!(11));
}

#[test]
fn blank_catalog_lines_skip_but_consume_ordinals() {
    let tmp = tempfile::tempdir().unwrap();
    let (queries_root, extracted) = build_fixture(tmp.path());

    let build = build_shopping_tables(&level1_spec(), &queries_root, &extracted).unwrap();
    let catalog = build.tables.rows("shopping_catalog").unwrap();

    let case1_rows: Vec<&deepplan_core::tables::Row> = catalog
        .iter()
        .filter(|r| r["case_id"] == json!("1"))
        .collect();
    assert_eq!(case1_rows[0]["row_id"], json!(0));
    assert_eq!(case1_rows[1]["row_id"], json!(2));
}

#[test]
fn case_dirs_sort_numerically_not_lexically() {
    let tmp = tempfile::tempdir().unwrap();
    let queries_root = tmp.path().join("shoppingplanning");
    write_json(
        &queries_root.join("data").join("level_1_query_meta.json"),
        &json!([{"id": 2, "query": "a"}, {"id": 10, "query": "b"}]),
    );
    let extracted = tmp.path().join("consolidated");
    for name in ["case_10", "case_2"] {
        write_case(
            &extracted.join("database_level1").join(name),
            json!({"query": "q", "meta_info": {}, "ground_truth_products": [], "ground_truth_coupons": {}}),
            "",
        );
    }

    let build =
        build_shopping_tables(&level1_spec(), &queries_root, &extracted).unwrap();
    let ids: Vec<&Value> = build
        .tables
        .rows("shopping_cases")
        .unwrap()
        .iter()
        .map(|r| &r["case_id"])
        .collect();
    assert_eq!(ids, [&json!("2"), &json!("10")]);
}

#[test]
fn missing_required_case_file_fails_the_build() {
    let tmp = tempfile::tempdir().unwrap();
    let (queries_root, extracted) = build_fixture(tmp.path());
    fs::remove_file(
        extracted
            .join("database_level1")
            .join("case_7")
            .join("cart.json"),
    )
    .unwrap();

    let err = build_shopping_tables(&level1_spec(), &queries_root, &extracted).unwrap_err();
    assert!(err.to_string().contains("cart.json"));
}

#[test]
fn malformed_catalog_json_fails_the_build() {
    let tmp = tempfile::tempdir().unwrap();
    let (queries_root, extracted) = build_fixture(tmp.path());
    fs::write(
        extracted
            .join("database_level1")
            .join("case_7")
            .join("products.jsonl"),
        "{not json}\n",
    )
    .unwrap();

    let err = build_shopping_tables(&level1_spec(), &queries_root, &extracted).unwrap_err();
    assert!(err.to_string().contains("malformed JSON"));
}
