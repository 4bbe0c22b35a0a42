//! Columnar persistence for built tables.
//!
//! Rows are loosely typed JSON records; the schema of each table is inferred
//! from the rows themselves and the table is written as zstd-compressed
//! parquet. Readers cover the two validator needs: footer row counts and
//! single-column string extraction.

use crate::tables::Row;
use anyhow::Context;
use arrow::array::{Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::json::reader::infer_json_schema_from_iterator;
use arrow::json::ReaderBuilder;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::{ArrowWriter, ProjectionMask};
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;
use parquet::file::reader::{FileReader, SerializedFileReader};
use serde_json::Value;
use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

/// Serialize one logical table and report its row count.
pub fn write_table(rows: &[Row], out_path: &Path) -> anyhow::Result<usize> {
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let schema = if rows.is_empty() {
        Arc::new(Schema::empty())
    } else {
        let inferred = infer_json_schema_from_iterator(
            rows.iter().map(|r| Ok(Value::Object(r.clone()))),
        )
        .with_context(|| format!("failed to infer schema for {}", out_path.display()))?;
        Arc::new(widen_null_columns(inferred))
    };

    let props = WriterProperties::builder()
        .set_compression(Compression::ZSTD(ZstdLevel::default()))
        .build();
    let file = File::create(out_path)
        .with_context(|| format!("failed to create {}", out_path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))
        .with_context(|| format!("failed to open parquet writer for {}", out_path.display()))?;

    if !rows.is_empty() {
        let mut decoder = ReaderBuilder::new(schema)
            .with_batch_size(1024)
            .build_decoder()
            .context("failed to build record decoder")?;
        decoder
            .serialize(rows)
            .with_context(|| format!("failed to encode rows for {}", out_path.display()))?;
        while let Some(batch) = decoder
            .flush()
            .with_context(|| format!("failed to build record batch for {}", out_path.display()))?
        {
            writer
                .write(&batch)
                .with_context(|| format!("failed to write {}", out_path.display()))?;
        }
    }

    writer
        .close()
        .with_context(|| format!("failed to finalize {}", out_path.display()))?;
    Ok(rows.len())
}

/// Columns where every sampled value was JSON null infer as the null type,
/// which parquet cannot store; widen them to nullable strings.
fn widen_null_columns(schema: Schema) -> Schema {
    let fields: Vec<Arc<Field>> = schema
        .fields()
        .iter()
        .map(|f| {
            if f.data_type() == &DataType::Null {
                Arc::new(Field::new(f.name().clone(), DataType::Utf8, true))
            } else {
                Arc::clone(f)
            }
        })
        .collect();
    Schema::new(fields)
}

/// Row count straight from the parquet footer, without reading column data.
pub fn row_count(path: &Path) -> anyhow::Result<u64> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let reader = SerializedFileReader::new(file)
        .with_context(|| format!("failed to read parquet metadata of {}", path.display()))?;
    Ok(reader.metadata().file_metadata().num_rows().max(0) as u64)
}

/// Read a single string column in file order.
pub fn read_string_column(path: &Path, column: &str) -> anyhow::Result<Vec<String>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("failed to open parquet reader for {}", path.display()))?;
    let idx = builder
        .schema()
        .index_of(column)
        .with_context(|| format!("no column {column:?} in {}", path.display()))?;
    let mask = ProjectionMask::roots(builder.parquet_schema(), [idx]);
    let reader = builder
        .with_projection(mask)
        .build()
        .with_context(|| format!("failed to read {}", path.display()))?;

    let mut values = Vec::new();
    for batch in reader {
        let batch = batch.with_context(|| format!("failed to read {}", path.display()))?;
        let col = batch.column(0);
        let strings = col
            .as_any()
            .downcast_ref::<StringArray>()
            .with_context(|| format!("column {column:?} in {} is not a string column", path.display()))?;
        for i in 0..strings.len() {
            values.push(if strings.is_null(i) {
                String::new()
            } else {
                strings.value(i).to_string()
            });
        }
    }
    Ok(values)
}
