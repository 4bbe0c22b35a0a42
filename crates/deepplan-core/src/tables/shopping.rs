use crate::config::DatasetSpec;
use crate::ids::numbered_subdirs;
use crate::tables::{id_string, json_blob, read_json, row, str_field, TableSet};
use anyhow::Context;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

/// Result of the shopping build: the accumulated tables plus the number of
/// cases whose query came from the validation file instead of the level's
/// query map. The fallback keeps misaligned provenance from failing the run,
/// and the count makes it observable in the manifest.
#[derive(Debug)]
pub struct ShoppingBuild {
    pub tables: TableSet,
    pub query_fallback_cases: u64,
}

/// Walk the consolidated shopping extraction root and build the seven
/// shopping tables: queries, case summaries, exploded ground truth
/// (products and coupons), user info, initial cart and the product catalog.
pub fn build_shopping_tables(
    spec: &DatasetSpec,
    shopping_root: &Path,
    extracted_root: &Path,
) -> anyhow::Result<ShoppingBuild> {
    let mut tables = TableSet::new();
    for name in [
        "shopping_queries",
        "shopping_cases",
        "shopping_gt_products",
        "shopping_gt_coupons",
        "shopping_user_info",
        "shopping_initial_cart",
        "shopping_catalog",
    ] {
        tables.ensure(name);
    }

    let mut queries_by_level: HashMap<u32, HashMap<String, String>> = HashMap::new();
    for &level in &spec.shopping_levels {
        let qpath = shopping_root
            .join("data")
            .join(format!("level_{level}_query_meta.json"));
        let data = read_json(&qpath)?;
        let samples = data
            .as_array()
            .with_context(|| format!("{} is not a JSON array", qpath.display()))?;

        let mut qmap = HashMap::new();
        for sample in samples {
            let id = sample
                .get("id")
                .with_context(|| format!("query entry without id in {}", qpath.display()))?;
            let case_id = id_string(id);
            let query = str_field(sample, "query");
            qmap.insert(case_id.clone(), query.clone());
            tables.push(
                "shopping_queries",
                row(json!({
                    "domain": "shopping",
                    "level": level,
                    "case_id": case_id,
                    "query": query,
                    "source_query_file": qpath.display().to_string(),
                })),
            );
        }
        queries_by_level.insert(level, qmap);
    }

    let mut query_fallback_cases = 0u64;
    for &level in &spec.shopping_levels {
        let level_dir = extracted_root.join(format!("database_level{level}"));
        let case_dirs = numbered_subdirs(&level_dir, "case_")?;
        info!(level, cases = case_dirs.len(), "building shopping level");

        let qmap = &queries_by_level[&level];
        for (case_num, case_dir) in case_dirs {
            let case_id = case_num.to_string();
            let validation = read_json(&case_dir.join("validation_cases.json"))?;
            let user_info = read_json(&case_dir.join("user_info.json"))?;
            let cart = read_json(&case_dir.join("cart.json"))?;

            let empty_map = json!({});
            let gt_products: &[Value] = validation
                .get("ground_truth_products")
                .and_then(Value::as_array)
                .map_or(&[], |v| v.as_slice());
            let empty_obj = serde_json::Map::new();
            let gt_coupons = validation
                .get("ground_truth_coupons")
                .and_then(Value::as_object)
                .unwrap_or(&empty_obj);

            // The level query map is the preferred source; a case whose id is
            // absent, or mapped to an empty query, falls back to the
            // validation file's own embedded query instead of failing.
            let query = match qmap.get(&case_id).filter(|q| !q.is_empty()) {
                Some(q) => q.clone(),
                None => {
                    debug!(level, case_id = %case_id, "query map miss, using validation query");
                    query_fallback_cases += 1;
                    str_field(&validation, "query")
                }
            };

            tables.push(
                "shopping_cases",
                row(json!({
                    "domain": "shopping",
                    "level": level,
                    "case_id": case_id,
                    "query": query,
                    "validation_query": str_field(&validation, "query"),
                    "meta_info_json": json_blob(validation.get("meta_info").unwrap_or(&empty_map)),
                    "ground_truth_products_count": gt_products.len(),
                    "ground_truth_coupons_count": gt_coupons.len(),
                })),
            );

            for (idx, product) in gt_products.iter().enumerate() {
                tables.push(
                    "shopping_gt_products",
                    row(json!({
                        "domain": "shopping",
                        "level": level,
                        "case_id": case_id,
                        "gt_index": idx,
                        "product_id": str_field(product, "product_id"),
                        "name": str_field(product, "name"),
                        "price": product.get("price").cloned().unwrap_or(Value::Null),
                        "brand": str_field(product, "brand"),
                        "size": str_field(product, "size"),
                        "color": str_field(product, "color"),
                        "product_json": json_blob(product),
                    })),
                );
            }

            for (coupon_name, qty) in gt_coupons {
                let quantity = coerce_quantity(qty).with_context(|| {
                    format!(
                        "bad quantity for coupon {coupon_name:?} in {}",
                        case_dir.join("validation_cases.json").display()
                    )
                })?;
                tables.push(
                    "shopping_gt_coupons",
                    row(json!({
                        "domain": "shopping",
                        "level": level,
                        "case_id": case_id,
                        "coupon_name": coupon_name,
                        "quantity": quantity,
                    })),
                );
            }

            tables.push(
                "shopping_user_info",
                row(json!({
                    "domain": "shopping",
                    "level": level,
                    "case_id": case_id,
                    "user_id": str_field(&user_info, "user_id"),
                    "username": str_field(&user_info, "username"),
                    "is_vip": user_info.get("is_vip").and_then(Value::as_bool).unwrap_or(false),
                    "user_info_json": json_blob(&user_info),
                })),
            );

            tables.push(
                "shopping_initial_cart",
                row(json!({
                    "domain": "shopping",
                    "level": level,
                    "case_id": case_id,
                    "user_id": str_field(&cart, "user_id"),
                    "items_count": cart.get("items").and_then(Value::as_array).map_or(0, |v| v.len()),
                    "used_coupons_count": cart
                        .get("used_coupons")
                        .and_then(Value::as_array)
                        .map_or(0, |v| v.len()),
                    "cart_json": json_blob(&cart),
                })),
            );

            stream_catalog(&mut tables, level, &case_id, &case_dir.join("products.jsonl"))?;
        }
    }

    Ok(ShoppingBuild {
        tables,
        query_fallback_cases,
    })
}

/// One catalog row per JSON line, promoting the common scalar fields and
/// keeping the full object plus its shipping sub-object as blobs. Blank lines
/// are skipped but still consume a line ordinal.
fn stream_catalog(
    tables: &mut TableSet,
    level: u32,
    case_id: &str,
    path: &Path,
) -> anyhow::Result<()> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let reader = BufReader::new(file);
    let empty_map = json!({});

    for (row_idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read {}", path.display()))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let product: Value = serde_json::from_str(line).with_context(|| {
            format!("malformed JSON on line {} of {}", row_idx + 1, path.display())
        })?;

        tables.push(
            "shopping_catalog",
            row(json!({
                "domain": "shopping",
                "level": level,
                "case_id": case_id,
                "row_id": row_idx,
                "product_id": str_field(&product, "product_id"),
                "name": str_field(&product, "name"),
                "brand": str_field(&product, "brand"),
                "color": str_field(&product, "color"),
                "size": str_field(&product, "size"),
                "price": product.get("price").cloned().unwrap_or(Value::Null),
                "stock_quantity": product.get("stock_quantity").cloned().unwrap_or(Value::Null),
                "rating": product.get("rating").cloned().unwrap_or(Value::Null),
                "sales_volume": product.get("sales_volume").cloned().unwrap_or(Value::Null),
                "shipping_info_json": json_blob(product.get("shipping_info").unwrap_or(&empty_map)),
                "product_json": json_blob(&product),
            })),
        );
    }
    Ok(())
}

/// Integer coercion for coupon quantities, which arrive as numbers or
/// numeric strings.
fn coerce_quantity(value: &Value) -> anyhow::Result<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .context("quantity out of integer range"),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .with_context(|| format!("quantity is not an integer: {s:?}")),
        other => anyhow::bail!("quantity is not a number: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_coercion() {
        assert_eq!(coerce_quantity(&json!(3)).unwrap(), 3);
        assert_eq!(coerce_quantity(&json!("4")).unwrap(), 4);
        assert_eq!(coerce_quantity(&json!(2.0)).unwrap(), 2);
        assert!(coerce_quantity(&json!(null)).is_err());
        assert!(coerce_quantity(&json!("many")).is_err());
    }
}
