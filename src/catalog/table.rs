use anyhow::{anyhow, Context};
use arrow::{
    array::{Array, BooleanArray, StringArray},
    compute::{concat_batches, filter_record_batch},
    csv::ReaderBuilder,
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use std::{
    collections::HashSet,
    fs,
    io::Cursor,
    path::Path,
    sync::Arc,
};
use tracing::{debug, warn};

use crate::error::{DashboardError, Result};

const BATCH_SIZE: usize = 8_192;

/// An immutable, named table. Every column is held as Utf8 exactly as it
/// was written, numeric coercion happens at the point of use.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    batch: RecordBatch,
}

impl Table {
    /// Read a CSV file; the table name is the file stem.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow!("no usable file stem in {}", path.display()))?
            .to_string();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading table {}", path.display()))?;
        Self::from_csv_str(&name, &text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Parse CSV text with a header row into a table of Utf8 columns.
    pub fn from_csv_str(name: &str, text: &str) -> anyhow::Result<Self> {
        let text = text.trim_start_matches('\u{feff}');

        let mut header_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(Cursor::new(text.as_bytes()));
        let headers: Vec<String> = header_reader
            .headers()
            .context("reading CSV header")?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if headers.is_empty() || headers.iter().all(String::is_empty) {
            return Err(anyhow!("`{}` has no header row", name));
        }

        let fields: Vec<Field> = headers
            .iter()
            .map(|n| Field::new(n, DataType::Utf8, true))
            .collect();
        let schema = Arc::new(Schema::new(fields));

        let reader = ReaderBuilder::new(schema.clone())
            .with_header(true)
            .with_batch_size(BATCH_SIZE)
            .with_quote(b'"')
            .with_delimiter(b',')
            .build(Cursor::new(text.as_bytes()))
            .context("creating CSV reader")?;

        let batches = reader
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context(|| format!("reading CSV rows of `{}`", name))?;
        let batch = if batches.is_empty() {
            warn!(table = name, "table has a header but no rows");
            RecordBatch::new_empty(schema)
        } else {
            concat_batches(&schema, &batches).context("concatenating CSV batches")?
        };

        debug!(
            table = name,
            rows = batch.num_rows(),
            columns = batch.num_columns(),
            "parsed table"
        );
        Ok(Self {
            name: name.to_string(),
            batch,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    /// Column names in file order.
    pub fn columns(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.batch.schema().index_of(column).is_ok()
    }

    pub fn column(&self, column: &str) -> Result<&StringArray> {
        let idx = self
            .batch
            .schema()
            .index_of(column)
            .map_err(|_| DashboardError::ColumnNotFound {
                table: self.name.clone(),
                column: column.to_string(),
            })?;
        self.batch
            .column(idx)
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| DashboardError::Arrow(format!("column `{}` is not utf8", column)))
    }

    /// Distinct non-null values of `column`, in order of first appearance.
    pub fn unique(&self, column: &str) -> Result<Vec<String>> {
        let arr = self.column(column)?;
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for value in arr.iter().flatten() {
            if seen.insert(value) {
                out.push(value.to_string());
            }
        }
        Ok(out)
    }

    /// Derived view holding the rows where `mask` is true.
    pub fn filter(&self, mask: &BooleanArray) -> Result<Table> {
        let batch = filter_record_batch(&self.batch, mask)?;
        Ok(Table {
            name: self.name.clone(),
            batch,
        })
    }

    /// Derived view holding the rows for which `keep(row)` is true.
    pub fn filter_rows<F>(&self, keep: F) -> Result<Table>
    where
        F: Fn(usize) -> bool,
    {
        let mask: BooleanArray = (0..self.num_rows()).map(|i| Some(keep(i))).collect();
        self.filter(&mask)
    }
}

/// Read one cell, treating nulls as absent.
pub fn cell(arr: &StringArray, row: usize) -> Option<&str> {
    if arr.is_null(row) {
        None
    } else {
        Some(arr.value(row))
    }
}
