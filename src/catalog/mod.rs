pub mod guidance;
pub mod table;
pub mod utils;

pub use guidance::{Guidance, TableGuidance};
pub use table::Table;

use anyhow::Context;
use glob::glob;
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;
use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    time::Instant,
};
use tracing::{info, instrument};

use crate::error::{DashboardError, Result};
use table::cell;
use utils::{is_metric_column, normalize_label};

pub const TIME_PERIOD: &str = "time_period";
pub const GENDER: &str = "gender";
pub const CHARACTERISTIC_GROUP: &str = "characteristic_group";
pub const CHARACTERISTIC: &str = "characteristic";
pub const GEOGRAPHIC_LEVEL: &str = "geographic_level";

/// Columns every characteristic table must carry.
pub const REQUIRED_COLUMNS: [&str; 4] = [TIME_PERIOD, GENDER, CHARACTERISTIC_GROUP, CHARACTERISTIC];

/// Identifier and display label for a loaded table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableInfo {
    pub id: String,
    pub label: String,
}

/// Metadata derived once per table at load time.
#[derive(Debug, Clone, Default)]
pub struct TableMeta {
    pub time_periods: Vec<String>,
    pub metric_columns: Vec<String>,
    pub categories: Vec<String>,
    /// characteristic_group → characteristics, both in first-appearance order.
    pub taxonomy: Vec<(String, Vec<String>)>,
}

impl TableMeta {
    fn derive(table: &Table) -> Result<Self> {
        let groups = table.column(CHARACTERISTIC_GROUP)?;
        let characteristics = table.column(CHARACTERISTIC)?;

        let mut taxonomy: Vec<(String, Vec<String>)> = Vec::new();
        let mut group_index: HashMap<&str, usize> = HashMap::new();
        let mut seen: HashSet<(&str, &str)> = HashSet::new();

        for row in 0..table.num_rows() {
            let (Some(group), Some(sub)) = (cell(groups, row), cell(characteristics, row)) else {
                continue;
            };
            let idx = *group_index.entry(group).or_insert_with(|| {
                taxonomy.push((group.to_string(), Vec::new()));
                taxonomy.len() - 1
            });
            if seen.insert((group, sub)) {
                taxonomy[idx].1.push(sub.to_string());
            }
        }

        Ok(Self {
            time_periods: table.unique(TIME_PERIOD)?,
            metric_columns: table
                .columns()
                .into_iter()
                .filter(|c| is_metric_column(c))
                .collect(),
            categories: taxonomy.iter().map(|(g, _)| g.clone()).collect(),
            taxonomy,
        })
    }

    /// Characteristics belonging to any of `groups`, deduplicated.
    pub fn characteristics_of(&self, groups: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        self.taxonomy
            .iter()
            .filter(|(g, _)| groups.contains(g))
            .flat_map(|(_, subs)| subs.iter())
            .filter(|s| seen.insert(s.as_str()))
            .cloned()
            .collect()
    }
}

#[derive(Debug)]
struct CatalogEntry {
    info: TableInfo,
    table: Table,
    meta: TableMeta,
}

impl CatalogEntry {
    fn new(table: Table) -> Result<Self> {
        for column in REQUIRED_COLUMNS {
            if !table.has_column(column) {
                return Err(DashboardError::ColumnNotFound {
                    table: table.name().to_string(),
                    column: column.to_string(),
                });
            }
        }
        let meta = TableMeta::derive(&table)?;
        Ok(Self {
            info: TableInfo {
                id: table.name().to_string(),
                label: normalize_label(table.name()),
            },
            table,
            meta,
        })
    }
}

/// Every loaded table, built once at startup and read-only afterwards.
#[derive(Debug, Default)]
pub struct DataCatalog {
    entries: Vec<CatalogEntry>,
    index: HashMap<String, usize>,
}

impl DataCatalog {
    /// Scan `data_dir` for `*.csv` files whose name matches `pattern` and
    /// load them in parallel. Any failure aborts the whole load.
    #[instrument(level = "info", skip(data_dir, pattern), fields(dir = %data_dir.display()))]
    pub fn load(data_dir: &Path, pattern: &Regex) -> anyhow::Result<Self> {
        let start = Instant::now();
        let paths = discover_tables(data_dir, pattern)?;
        info!(files = paths.len(), "loading tables");

        let tables = paths
            .par_iter()
            .map(|p| Table::from_path(p))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let catalog = Self::from_tables(tables).context("validating loaded tables")?;
        info!(
            tables = catalog.entries.len(),
            elapsed = ?start.elapsed(),
            "catalog ready"
        );
        Ok(catalog)
    }

    /// Build a catalog from tables already in memory. Tables are ordered by id.
    pub fn from_tables(mut tables: Vec<Table>) -> Result<Self> {
        tables.sort_by(|a, b| a.name().cmp(b.name()));
        let mut catalog = Self::default();
        for table in tables {
            let entry = CatalogEntry::new(table)?;
            catalog
                .index
                .insert(entry.info.id.clone(), catalog.entries.len());
            catalog.entries.push(entry);
        }
        Ok(catalog)
    }

    pub fn list_tables(&self) -> Vec<TableInfo> {
        self.entries.iter().map(|e| e.info.clone()).collect()
    }

    pub fn get_table(&self, id: &str) -> Result<&Table> {
        self.entry(id).map(|e| &e.table)
    }

    pub fn meta(&self, id: &str) -> Result<&TableMeta> {
        self.entry(id).map(|e| &e.meta)
    }

    pub fn time_periods(&self, id: &str) -> Result<&[String]> {
        self.meta(id).map(|m| m.time_periods.as_slice())
    }

    pub fn metric_columns(&self, id: &str) -> Result<&[String]> {
        self.meta(id).map(|m| m.metric_columns.as_slice())
    }

    pub fn categories(&self, id: &str) -> Result<&[String]> {
        self.meta(id).map(|m| m.categories.as_slice())
    }

    pub fn taxonomy(&self, id: &str) -> Result<&[(String, Vec<String>)]> {
        self.meta(id).map(|m| m.taxonomy.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, id: &str) -> Result<&CatalogEntry> {
        // Accept ids with or without the file extension.
        let key = id.trim_end_matches(".csv");
        self.index
            .get(key)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| DashboardError::TableNotFound(id.to_string()))
    }
}

/// `*.csv` files directly under `data_dir` whose file name matches `pattern`, sorted.
pub fn discover_tables(data_dir: &Path, pattern: &Regex) -> anyhow::Result<Vec<PathBuf>> {
    if !data_dir.is_dir() {
        anyhow::bail!("data directory {} does not exist", data_dir.display());
    }
    let glob_pattern = format!("{}/*.csv", data_dir.display());
    let mut paths: Vec<PathBuf> = glob(&glob_pattern)
        .with_context(|| format!("bad glob pattern {}", glob_pattern))?
        .filter_map(std::result::Result::ok)
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| pattern.is_match(n))
        })
        .collect();
    paths.sort();
    Ok(paths)
}
