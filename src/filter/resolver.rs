use serde::Serialize;
use std::collections::BTreeSet;

use super::selection::{ChartKind, Gender, Selection, Stage, YearChoice};
use crate::catalog::{utils::normalize_label, utils::period_label, DataCatalog, Guidance};
use crate::error::Result;

/// The dashboard's filter controls in cascade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    Table,
    Year,
    Category,
    SubCategory,
    Metric,
    Gender,
    ChartKind,
}

/// A single dropdown / radio entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropdownOption {
    pub label: String,
    pub value: String,
}

impl DropdownOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// Label derived by normalizing the raw value.
    pub fn normalized(value: &str) -> Self {
        Self::new(normalize_label(value), value)
    }
}

pub const ALL_YEARS_LABEL: &str = "All available years";

/// Everything the presentation layer needs after one change to the selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedControls {
    pub stage: Stage,
    pub visible: BTreeSet<Control>,
    pub summary: String,
    pub year_options: Vec<DropdownOption>,
    pub category_options: Vec<DropdownOption>,
    pub sub_category_options: Vec<DropdownOption>,
    pub metric_options: Vec<DropdownOption>,
    /// Description shown under the metric selector; empty until a metric is chosen.
    pub metric_description: String,
    pub gender_options: Vec<DropdownOption>,
    pub chart_kind_options: Vec<DropdownOption>,
    pub ready: bool,
}

/// Stateless: every call recomputes from the catalog and the given selection.
#[derive(Debug, Clone, Copy)]
pub struct FilterResolver<'a> {
    catalog: &'a DataCatalog,
    guidance: Option<&'a Guidance>,
}

impl<'a> FilterResolver<'a> {
    pub fn new(catalog: &'a DataCatalog) -> Self {
        Self {
            catalog,
            guidance: None,
        }
    }

    pub fn with_guidance(mut self, guidance: &'a Guidance) -> Self {
        self.guidance = Some(guidance);
        self
    }

    /// A control is visible once every upstream field is non-empty, not just
    /// its direct parent. Year is informational and does not gate the
    /// category control.
    pub fn visible_controls(&self, selection: &Selection) -> BTreeSet<Control> {
        let mut visible = BTreeSet::from([Control::Table, Control::Gender, Control::ChartKind]);
        let has_table = selection.table().is_some();
        let has_categories = has_table && !selection.categories().is_empty();
        let has_sub_categories = has_categories && !selection.sub_categories().is_empty();
        if has_table {
            visible.insert(Control::Year);
            visible.insert(Control::Category);
        }
        if has_categories {
            visible.insert(Control::SubCategory);
        }
        if has_sub_categories {
            visible.insert(Control::Metric);
        }
        visible
    }

    /// Distinct characteristic groups across the whole table.
    pub fn category_options(&self, table_id: &str) -> Result<Vec<DropdownOption>> {
        Ok(self
            .catalog
            .categories(table_id)?
            .iter()
            .map(|g| DropdownOption::normalized(g))
            .collect())
    }

    /// Characteristics whose group is one of `categories`. Gated by category only.
    pub fn sub_category_options(
        &self,
        table_id: &str,
        categories: &[String],
    ) -> Result<Vec<DropdownOption>> {
        let meta = self.catalog.meta(table_id)?;
        if categories.is_empty() {
            return Ok(Vec::new());
        }
        Ok(meta
            .characteristics_of(categories)
            .iter()
            .map(|c| DropdownOption::normalized(c))
            .collect())
    }

    pub fn metric_options(&self, table_id: &str) -> Result<Vec<DropdownOption>> {
        Ok(self
            .catalog
            .metric_columns(table_id)?
            .iter()
            .map(|m| DropdownOption::normalized(m))
            .collect())
    }

    /// "All available years" first, then each period code as `YYYY-YY`.
    pub fn year_options(&self, table_id: &str) -> Result<Vec<DropdownOption>> {
        let periods = self.catalog.time_periods(table_id)?;
        let mut options = Vec::with_capacity(periods.len() + 1);
        options.push(DropdownOption::new(
            ALL_YEARS_LABEL,
            YearChoice::All.to_string(),
        ));
        options.extend(
            periods
                .iter()
                .map(|p| DropdownOption::new(period_label(p), p.clone())),
        );
        Ok(options)
    }

    pub fn gender_options(&self) -> Vec<DropdownOption> {
        Gender::ALL
            .iter()
            .map(|g| DropdownOption::new(g.label(), g.as_str()))
            .collect()
    }

    pub fn chart_kind_options(&self) -> Vec<DropdownOption> {
        [ChartKind::Line, ChartKind::Bar]
            .iter()
            .map(|k| DropdownOption::new(k.label(), k.as_str()))
            .collect()
    }

    /// Guidance summary for the table selector; empty without guidance.
    pub fn summary(&self, table_id: &str) -> Result<String> {
        self.catalog.get_table(table_id)?;
        Ok(self
            .guidance
            .map(|g| g.summary(table_id).to_string())
            .unwrap_or_default())
    }

    /// Guidance text for a metric, falling back to its normalized column name.
    pub fn metric_description(&self, table_id: &str, metric: &str) -> Result<String> {
        self.catalog.get_table(table_id)?;
        Ok(match self.guidance {
            Some(guidance) => guidance.describe(table_id, metric),
            None => normalize_label(metric),
        })
    }

    pub fn is_ready(&self, selection: &Selection) -> bool {
        selection.is_ready()
    }

    /// Recompute visibility, every option list and readiness in one pass.
    /// Lists whose upstream field is unset come back empty; only an unknown
    /// table id is an error.
    pub fn resolve(&self, selection: &Selection) -> Result<ResolvedControls> {
        let mut resolved = ResolvedControls {
            stage: selection.stage(),
            visible: self.visible_controls(selection),
            summary: String::new(),
            year_options: Vec::new(),
            category_options: Vec::new(),
            sub_category_options: Vec::new(),
            metric_options: Vec::new(),
            metric_description: String::new(),
            gender_options: self.gender_options(),
            chart_kind_options: self.chart_kind_options(),
            ready: self.is_ready(selection),
        };

        let Some(table_id) = selection.table() else {
            return Ok(resolved);
        };

        resolved.year_options = self.year_options(table_id)?;
        resolved.category_options = self.category_options(table_id)?;
        resolved.sub_category_options =
            self.sub_category_options(table_id, selection.categories())?;
        if resolved.visible.contains(&Control::Metric) {
            resolved.metric_options = self.metric_options(table_id)?;
            if let Some(metric) = selection.metric() {
                resolved.metric_description = self.metric_description(table_id, metric)?;
            }
        }
        resolved.summary = self.summary(table_id)?;
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::national_catalog;
    use crate::error::DashboardError;

    const TABLE: &str = "ks2_national_pupil_characteristics";

    fn values(options: &[DropdownOption]) -> Vec<&str> {
        options.iter().map(|o| o.value.as_str()).collect()
    }

    #[test]
    fn empty_selection_shows_only_independent_controls() {
        let catalog = national_catalog();
        let resolver = FilterResolver::new(&catalog);
        let visible = resolver.visible_controls(&Selection::new());
        assert_eq!(
            visible,
            BTreeSet::from([Control::Table, Control::Gender, Control::ChartKind])
        );
    }

    #[test]
    fn category_visible_without_year() {
        let catalog = national_catalog();
        let resolver = FilterResolver::new(&catalog);
        let visible = resolver.visible_controls(&Selection::new().with_table(TABLE));
        assert!(visible.contains(&Control::Year));
        assert!(visible.contains(&Control::Category));
        assert!(!visible.contains(&Control::SubCategory));
        assert!(!visible.contains(&Control::Metric));
    }

    #[test]
    fn sub_category_and_metric_follow_their_parents() {
        let catalog = national_catalog();
        let resolver = FilterResolver::new(&catalog);
        let selection = Selection::new()
            .with_table(TABLE)
            .with_categories(["All pupils"]);
        let visible = resolver.visible_controls(&selection);
        assert!(visible.contains(&Control::SubCategory));
        assert!(!visible.contains(&Control::Metric));

        let selection = selection.with_sub_categories(["Total"]);
        assert!(resolver.visible_controls(&selection).contains(&Control::Metric));
    }

    #[test]
    fn year_options_start_with_all_years() -> crate::error::Result<()> {
        let catalog = national_catalog();
        let resolver = FilterResolver::new(&catalog);
        let options = resolver.year_options(TABLE)?;
        assert_eq!(options[0], DropdownOption::new(ALL_YEARS_LABEL, "all"));
        assert_eq!(options[1], DropdownOption::new("2016-17", "201617"));
        assert_eq!(options[2], DropdownOption::new("2017-18", "201718"));
        assert_eq!(options.len(), 3);
        Ok(())
    }

    #[test]
    fn category_options_are_table_wide() -> crate::error::Result<()> {
        let catalog = national_catalog();
        let resolver = FilterResolver::new(&catalog);
        let options = resolver.category_options(TABLE)?;
        // "First language" only appears on a Boys row; no gender restriction here.
        assert_eq!(
            values(&options),
            vec!["All pupils", "Ethnic minor", "First language"]
        );
        assert_eq!(options[1].label, "Ethnic Minor");
        Ok(())
    }

    #[test]
    fn sub_category_options_empty_without_categories() -> crate::error::Result<()> {
        let catalog = national_catalog();
        let resolver = FilterResolver::new(&catalog);
        assert!(resolver.sub_category_options(TABLE, &[])?.is_empty());
        Ok(())
    }

    #[test]
    fn sub_category_options_gated_by_category() -> crate::error::Result<()> {
        let catalog = national_catalog();
        let resolver = FilterResolver::new(&catalog);
        let options = resolver.sub_category_options(
            TABLE,
            &["Ethnic minor".to_string(), "All pupils".to_string()],
        )?;
        assert_eq!(
            values(&options),
            vec!["Total", "Known or believed to be English", "Unclassified"]
        );
        Ok(())
    }

    #[test]
    fn metric_options_use_prefixes() -> crate::error::Result<()> {
        let catalog = national_catalog();
        let resolver = FilterResolver::new(&catalog);
        let options = resolver.metric_options(TABLE)?;
        assert_eq!(
            options,
            vec![
                DropdownOption::new("Pt Mat Met Expected Standard", "pt_mat_met_expected_standard"),
                DropdownOption::new("T Mat Eligible Pupils", "t_mat_eligible_pupils"),
            ]
        );
        Ok(())
    }

    #[test]
    fn unknown_table_fails_every_lookup() {
        let catalog = national_catalog();
        let resolver = FilterResolver::new(&catalog);
        let not_found = DashboardError::TableNotFound("missing".into());
        assert_eq!(resolver.year_options("missing").unwrap_err(), not_found);
        assert_eq!(resolver.category_options("missing").unwrap_err(), not_found);
        assert_eq!(
            resolver.sub_category_options("missing", &[]).unwrap_err(),
            not_found
        );
        assert_eq!(resolver.metric_options("missing").unwrap_err(), not_found);
        let selection = Selection::new().with_table("missing");
        assert_eq!(resolver.resolve(&selection).unwrap_err(), not_found);
    }

    #[test]
    fn resolve_leaves_downstream_lists_empty() -> crate::error::Result<()> {
        let catalog = national_catalog();
        let resolver = FilterResolver::new(&catalog);

        let resolved = resolver.resolve(&Selection::new())?;
        assert_eq!(resolved.stage, Stage::NoTable);
        assert!(resolved.year_options.is_empty());
        assert!(resolved.category_options.is_empty());
        assert_eq!(resolved.gender_options.len(), 3);
        assert!(!resolved.ready);

        let selection = Selection::new()
            .with_table(TABLE)
            .with_year(YearChoice::All);
        let resolved = resolver.resolve(&selection)?;
        assert_eq!(resolved.year_options.len(), 3);
        assert_eq!(resolved.category_options.len(), 3);
        assert!(resolved.sub_category_options.is_empty());
        assert!(resolved.metric_options.is_empty());
        Ok(())
    }

    #[test]
    fn resolve_reports_ready_selection() -> crate::error::Result<()> {
        let catalog = national_catalog();
        let guidance = Guidance::from_json(
            r#"{"ks2_national_pupil_characteristics.csv": {"summary": "National KS2"}}"#,
        )
        .unwrap();
        let resolver = FilterResolver::new(&catalog).with_guidance(&guidance);
        let selection = Selection::new()
            .with_table(TABLE)
            .with_year(YearChoice::Period("201718".into()))
            .with_categories(["All pupils"])
            .with_sub_categories(["Total"])
            .with_metric("pt_mat_met_expected_standard");
        let resolved = resolver.resolve(&selection)?;
        assert!(resolved.ready);
        assert_eq!(resolved.stage, Stage::MetricChosen);
        assert_eq!(resolved.metric_options.len(), 2);
        assert_eq!(resolved.summary, "National KS2");
        Ok(())
    }

    #[test]
    fn summary_is_empty_without_guidance() -> crate::error::Result<()> {
        let catalog = national_catalog();
        let resolver = FilterResolver::new(&catalog);
        assert_eq!(resolver.summary(TABLE)?, "");
        assert!(resolver.summary("missing").is_err());
        Ok(())
    }

    #[test]
    fn categories_without_table_stay_hidden() {
        let catalog = national_catalog();
        let resolver = FilterResolver::new(&catalog);
        let selection = Selection::new().with_categories(["All pupils"]);
        let visible = resolver.visible_controls(&selection);
        assert!(!visible.contains(&Control::SubCategory));
        assert!(!visible.contains(&Control::Metric));
    }

    #[test]
    fn sub_categories_without_categories_do_not_unlock_metric() -> crate::error::Result<()> {
        let catalog = national_catalog();
        let resolver = FilterResolver::new(&catalog);
        let selection = Selection::new()
            .with_table(TABLE)
            .with_year(YearChoice::All)
            .with_sub_categories(["Total"]);
        let resolved = resolver.resolve(&selection)?;
        assert!(!resolved.visible.contains(&Control::SubCategory));
        assert!(!resolved.visible.contains(&Control::Metric));
        assert!(resolved.sub_category_options.is_empty());
        assert!(resolved.metric_options.is_empty());
        assert!(!resolved.ready);
        Ok(())
    }

    #[test]
    fn metric_description_follows_the_chosen_metric() -> crate::error::Result<()> {
        let catalog = national_catalog();
        let guidance = Guidance::from_json(
            r#"{"ks2_national_pupil_characteristics.csv": {
                "pt_mat_met_expected_standard": "Percentage meeting the expected standard in maths"
            }}"#,
        )
        .unwrap();
        let resolver = FilterResolver::new(&catalog).with_guidance(&guidance);
        let selection = Selection::new()
            .with_table(TABLE)
            .with_year(YearChoice::All)
            .with_categories(["All pupils"])
            .with_sub_categories(["Total"]);
        assert_eq!(resolver.resolve(&selection)?.metric_description, "");

        let described = selection.clone().with_metric("pt_mat_met_expected_standard");
        assert_eq!(
            resolver.resolve(&described)?.metric_description,
            "Percentage meeting the expected standard in maths"
        );

        let undescribed = selection.with_metric("t_mat_eligible_pupils");
        assert_eq!(
            resolver.resolve(&undescribed)?.metric_description,
            "T Mat Eligible Pupils"
        );
        Ok(())
    }
}
