use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

use crate::filter::{ChartKind, Gender, Selection, YearChoice};

/// Runtime configuration, read from YAML. Every field has a default so an
/// empty file (or no file) is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Directory holding the CSV tables.
    pub data_dir: PathBuf,
    /// Regex a table's file name must match to be listed.
    pub table_pattern: String,
    pub guidance_file: PathBuf,
    pub regional: RegionalConfig,
    pub default_selection: DefaultSelection,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            table_pattern: "pupil_characteristic".into(),
            guidance_file: PathBuf::from("data/data-guidance.json"),
            regional: RegionalConfig::default(),
            default_selection: DefaultSelection::default(),
        }
    }
}

impl DashboardConfig {
    /// Load from `path`, or fall back to defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn table_regex(&self) -> Result<Regex> {
        Regex::new(&self.table_pattern)
            .with_context(|| format!("invalid table_pattern `{}`", self.table_pattern))
    }
}

/// Inputs for the local-authority figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionalConfig {
    pub table: PathBuf,
    pub boundaries: PathBuf,
    /// GeoJSON feature property holding the region name.
    pub region_key: String,
    pub metric: String,
}

impl Default for RegionalConfig {
    fn default() -> Self {
        Self {
            table: PathBuf::from("data/ks2_regional_and_local_authority_2016_to_2022_provisional.csv"),
            boundaries: PathBuf::from(
                "data/Counties_and_Unitary_Authorities_(December_2021)_UK_BGC.geojson",
            ),
            region_key: "CTYUA21NM".into(),
            metric: "pt_mat_met_expected_standard".into(),
        }
    }
}

/// Selection drawn when the user's own selection is not ready yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultSelection {
    pub table: String,
    pub year: String,
    pub categories: Vec<String>,
    pub sub_categories: Vec<String>,
    pub metric: String,
    pub gender: Gender,
    pub chart_kind: ChartKind,
    pub description: String,
}

impl Default for DefaultSelection {
    fn default() -> Self {
        Self {
            table: "ks2_national_pupil_characteristics_2016_to_2022_provisional".into(),
            year: YearChoice::ALL_VALUE.into(),
            categories: vec![
                "All pupils".into(),
                "Ethnic minor".into(),
                "First language".into(),
            ],
            sub_categories: vec!["Total".into(), "Known or believed to be English".into()],
            metric: "pt_mat_met_higher_standard".into(),
            gender: Gender::Total,
            chart_kind: ChartKind::Bar,
            description: "Percentage met or exceeded Maths Standard".into(),
        }
    }
}

impl DefaultSelection {
    pub fn to_selection(&self) -> Selection {
        let year = self.year.parse().unwrap_or(YearChoice::All);
        Selection::new()
            .with_table(self.table.clone())
            .with_year(year)
            .with_categories(self.categories.iter().cloned())
            .with_sub_categories(self.sub_categories.iter().cloned())
            .with_metric(self.metric.clone())
            .with_gender(self.gender)
            .with_chart_kind(self.chart_kind)
    }
}
