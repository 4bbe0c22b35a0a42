use crate::config::DatasetSpec;
use crate::ids::numbered_subdirs;
use crate::tables::{id_string, json_blob, read_json, row, str_field, Row, TableSet};
use anyhow::Context;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const CATEGORY_FILES: [(&str, &str, &str); 6] = [
    ("travel_db_trains", "trains", "trains.csv"),
    ("travel_db_flights", "flights", "flights.csv"),
    ("travel_db_hotels", "hotels", "hotels.csv"),
    ("travel_db_restaurants", "restaurants", "restaurants.csv"),
    ("travel_db_attractions", "attractions", "attractions.csv"),
    ("travel_db_locations", "locations", "locations_coords.csv"),
];

const TRANSPORTATION_TABLE: &str = "travel_db_transportation";

/// Walk the consolidated travel extraction root and build the travel tables:
/// per-language queries and flattened constraints, plus the per-category CSV
/// passthrough tables. The distance matrix dominates output size, so its
/// table only exists when `include_distance_matrix` is set.
pub fn build_travel_tables(
    spec: &DatasetSpec,
    travel_root: &Path,
    extracted_root: &Path,
    include_distance_matrix: bool,
) -> anyhow::Result<TableSet> {
    let mut tables = TableSet::new();
    tables.ensure("travel_queries");
    tables.ensure("travel_constraints");
    for (table, _, _) in CATEGORY_FILES {
        tables.ensure(table);
    }
    if include_distance_matrix {
        tables.ensure(TRANSPORTATION_TABLE);
    }

    for language in &spec.travel_languages {
        let qpath = travel_root
            .join("data")
            .join(format!("travelplanning_query_{language}.json"));
        let data = read_json(&qpath)?;
        let samples = data
            .as_array()
            .with_context(|| format!("{} is not a JSON array", qpath.display()))?;

        for sample in samples {
            let id = sample
                .get("id")
                .with_context(|| format!("query entry without id in {}", qpath.display()))?;
            let sample_id = id_string(id);
            let empty_map = json!({});
            let meta = sample.get("meta_info").unwrap_or(&empty_map);

            tables.push(
                "travel_queries",
                row(json!({
                    "domain": "travel",
                    "language": language,
                    "sample_id": sample_id,
                    "query": str_field(sample, "query"),
                    "query_with_constraints": str_field(sample, "query_with_constraints"),
                    "source_query_file": qpath.display().to_string(),
                })),
            );
            tables.push(
                "travel_constraints",
                row(json!({
                    "domain": "travel",
                    "language": language,
                    "sample_id": sample_id,
                    "org": str_field(meta, "org"),
                    "dest_json": json_blob(meta.get("dest").unwrap_or(&json!([]))),
                    "days": meta.get("days").cloned().unwrap_or(Value::Null),
                    "depart_date": str_field(meta, "depart_date"),
                    "return_date": str_field(meta, "return_date"),
                    "people_number": meta.get("people_number").cloned().unwrap_or(Value::Null),
                    "room_number": meta.get("room_number").cloned().unwrap_or(Value::Null),
                    "depart_weekday": meta.get("depart_weekday").cloned().unwrap_or(Value::Null),
                    "hard_constraints_json": json_blob(meta.get("hard_constraints").unwrap_or(&empty_map)),
                    "meta_info_json": json_blob(meta),
                })),
            );
        }
    }

    for language in &spec.travel_languages {
        let db_root = extracted_root.join(format!("database_{language}"));
        let id_dirs = numbered_subdirs(&db_root, "id_")?;
        info!(language = %language, samples = id_dirs.len(), "building travel language");

        for (sample_num, id_dir) in id_dirs {
            let sample_id = sample_num.to_string();
            let mut file_map: Vec<(&str, PathBuf)> = CATEGORY_FILES
                .iter()
                .map(|(table, subdir, file)| (*table, id_dir.join(subdir).join(file)))
                .collect();
            if include_distance_matrix {
                file_map.push((
                    TRANSPORTATION_TABLE,
                    id_dir.join("transportation").join("distance_matrix.csv"),
                ));
            }

            for (table, csv_path) in file_map {
                for mut record in read_csv_rows(&csv_path)? {
                    record.insert("domain".to_string(), json!("travel"));
                    record.insert("language".to_string(), json!(language));
                    record.insert("sample_id".to_string(), json!(sample_id));
                    tables.push(table, record);
                }
            }
        }
    }

    Ok(tables)
}

/// Read a delimited-text file into string-valued rows keyed by header.
///
/// Some source files start with a UTF-8 byte order mark, depending on the
/// tool that authored them; it is stripped before parsing.
fn read_csv_rows(path: &Path) -> anyhow::Result<Vec<Row>> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let bytes = bytes
        .strip_prefix("\u{feff}".as_bytes())
        .unwrap_or(&bytes[..]);

    let mut reader = csv::ReaderBuilder::new().from_reader(bytes);
    let headers = reader
        .headers()
        .with_context(|| format!("failed to read header of {}", path.display()))?
        .clone();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record =
            result.with_context(|| format!("malformed CSV in {}", path.display()))?;
        let mut out = Row::new();
        for (header, value) in headers.iter().zip(record.iter()) {
            out.insert(header.to_string(), json!(value));
        }
        rows.push(out);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_rows_keep_header_order() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("hotels.csv");
        fs::write(&path, "name,price\nAlpha,120\nBeta,90\n").unwrap();

        let rows = read_csv_rows(&path).unwrap();
        assert_eq!(rows.len(), 2);
        let keys: Vec<&String> = rows[0].keys().collect();
        assert_eq!(keys, ["name", "price"]);
        assert_eq!(rows[1]["name"], json!("Beta"));
    }

    #[test]
    fn byte_order_mark_is_stripped() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("trains.csv");
        fs::write(&path, "\u{feff}train_id,from\nG1,Beijing\n").unwrap();

        let rows = read_csv_rows(&path).unwrap();
        assert_eq!(rows[0]["train_id"], json!("G1"));
    }

    #[test]
    fn missing_csv_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(read_csv_rows(&tmp.path().join("flights.csv")).is_err());
    }
}
