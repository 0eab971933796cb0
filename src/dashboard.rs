use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::catalog::{DataCatalog, Guidance};
use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};
use crate::figure::{FigureBuilder, FigureCache, FigureSpec};
use crate::filter::{FilterResolver, ResolvedControls, Selection};

/// Table entry for the data set selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub id: String,
    pub label: String,
    pub summary: String,
}

/// Process-wide state behind the presentation layer: the immutable catalog,
/// guidance, the configured fallback and the figure memo. Each request passes
/// its own `Selection`.
#[derive(Debug)]
pub struct Dashboard {
    catalog: Arc<DataCatalog>,
    guidance: Arc<Guidance>,
    config: DashboardConfig,
    cache: FigureCache,
}

impl Dashboard {
    /// Load tables and guidance named by `config`. Fails before anything is served.
    pub fn load(config: DashboardConfig) -> anyhow::Result<Self> {
        let pattern = config.table_regex()?;
        let catalog = DataCatalog::load(&config.data_dir, &pattern)
            .with_context(|| format!("loading tables from {}", config.data_dir.display()))?;
        if catalog.is_empty() {
            warn!(dir = %config.data_dir.display(), pattern = %pattern, "no tables matched");
        }
        let guidance = Guidance::load(&config.guidance_file)?;
        info!(tables = catalog.len(), "dashboard ready");
        Ok(Self::new(catalog, guidance, config))
    }

    pub fn new(catalog: DataCatalog, guidance: Guidance, config: DashboardConfig) -> Self {
        Self {
            catalog: Arc::new(catalog),
            guidance: Arc::new(guidance),
            config,
            cache: FigureCache::new(),
        }
    }

    pub fn catalog(&self) -> &DataCatalog {
        &self.catalog
    }

    pub fn guidance(&self) -> &Guidance {
        &self.guidance
    }

    pub fn resolver(&self) -> FilterResolver<'_> {
        FilterResolver::new(&self.catalog).with_guidance(&self.guidance)
    }

    pub fn tables(&self) -> Vec<TableSummary> {
        self.catalog
            .list_tables()
            .into_iter()
            .map(|t| TableSummary {
                summary: self.guidance.summary(&t.id).to_string(),
                id: t.id,
                label: t.label,
            })
            .collect()
    }

    pub fn controls(&self, selection: &Selection) -> Result<ResolvedControls> {
        self.resolver().resolve(selection)
    }

    /// Build (or recall) the figure for `selection`.
    pub fn build(&self, selection: &Selection) -> Result<Arc<FigureSpec>> {
        let table_id = selection
            .table()
            .ok_or_else(|| DashboardError::IncompleteSelection {
                missing: selection.missing_fields(),
            })?;
        let table = self.catalog.get_table(table_id)?;
        self.cache.get_or_build(table.name(), selection, || {
            let metric = selection.metric().unwrap_or_default();
            let description = self.guidance.describe(table.name(), metric);
            FigureBuilder.build(table, selection, &description)
        })
    }

    /// The figure shown for `selection`. An incomplete selection shows the
    /// configured default instead; unknown tables and columns still fail.
    pub fn figure(&self, selection: &Selection) -> Result<Arc<FigureSpec>> {
        match self.build(selection) {
            Err(DashboardError::IncompleteSelection { missing }) => {
                info!(?missing, "selection incomplete, showing default figure");
                Ok(self.default_figure())
            }
            other => other,
        }
    }

    /// The configured default figure, or an empty one if it cannot be built.
    pub fn default_figure(&self) -> Arc<FigureSpec> {
        let defaults = &self.config.default_selection;
        let selection = defaults.to_selection();
        let built = self.catalog.get_table(&defaults.table).and_then(|table| {
            self.cache.get_or_build(table.name(), &selection, || {
                FigureBuilder.build(table, &selection, &defaults.description)
            })
        });
        match built {
            Ok(figure) => figure,
            Err(err) => {
                warn!(error = %err, "default figure unavailable");
                Arc::new(FigureSpec::empty(defaults.description.clone()))
            }
        }
    }

    pub fn cached_figures(&self) -> usize {
        self.cache.len()
    }
}
