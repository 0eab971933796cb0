use anyhow::{Context, Result};
use serde::Deserialize;
use std::{collections::HashMap, fs, path::Path};
use tracing::{debug, warn};

use super::utils::normalize_label;

/// One table's entry in `data-guidance.json`: a `summary` plus a human
/// description per metric column.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TableGuidance {
    #[serde(default)]
    pub summary: String,
    #[serde(flatten)]
    pub metrics: HashMap<String, String>,
}

/// Read-only description lookup keyed by table id.
#[derive(Debug, Clone, Default)]
pub struct Guidance {
    tables: HashMap<String, TableGuidance>,
}

impl Guidance {
    /// Load the guidance file. A missing file yields empty guidance; a
    /// malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "no guidance file, descriptions fall back to column labels");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading guidance {}", path.display()))?;
        let guidance = Self::from_json(&text)
            .with_context(|| format!("parsing guidance {}", path.display()))?;
        debug!(tables = guidance.tables.len(), "loaded guidance");
        Ok(guidance)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let raw: HashMap<String, TableGuidance> = serde_json::from_str(text)?;
        // Keys may carry the `.csv` extension; table ids never do.
        let tables = raw
            .into_iter()
            .map(|(k, v)| (k.trim_end_matches(".csv").to_string(), v))
            .collect();
        Ok(Self { tables })
    }

    pub fn table(&self, table_id: &str) -> Option<&TableGuidance> {
        self.tables.get(table_id.trim_end_matches(".csv"))
    }

    /// Summary text for a table, empty when unknown.
    pub fn summary(&self, table_id: &str) -> &str {
        self.table(table_id)
            .map(|g| g.summary.as_str())
            .unwrap_or_default()
    }

    /// Description of a metric, falling back to its normalized column name.
    pub fn describe(&self, table_id: &str, metric: &str) -> String {
        self.table(table_id)
            .and_then(|g| g.metrics.get(metric))
            .filter(|d| !d.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| normalize_label(metric))
    }
}
