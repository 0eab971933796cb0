use serde::{Deserialize, Serialize, Serializer};
use std::{fmt, str::FromStr};

/// Gender filter, serialized with the spelling used in the data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[default]
    Total,
    Boys,
    Girls,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Total, Gender::Boys, Gender::Girls];

    /// Value as it appears in the `gender` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Total => "Total",
            Gender::Boys => "Boys",
            Gender::Girls => "Girls",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Gender::Total => "All",
            Gender::Boys => "Male",
            Gender::Girls => "Female",
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "total" | "all" => Ok(Gender::Total),
            "boys" | "male" => Ok(Gender::Boys),
            "girls" | "female" => Ok(Gender::Girls),
            other => Err(format!("unknown gender `{}`", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Bar,
    Line,
    Scatter,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Scatter => "scatter",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChartKind::Bar => "Bar Chart",
            ChartKind::Line => "Line Chart",
            ChartKind::Scatter => "Scatter Chart",
        }
    }
}

impl FromStr for ChartKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bar" => Ok(ChartKind::Bar),
            "line" => Ok(ChartKind::Line),
            "scatter" => Ok(ChartKind::Scatter),
            other => Err(format!("unknown chart kind `{}`", other)),
        }
    }
}

/// Either every period in the table or one specific period code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum YearChoice {
    All,
    Period(String),
}

impl YearChoice {
    pub const ALL_VALUE: &'static str = "all";

    pub fn is_all(&self) -> bool {
        matches!(self, YearChoice::All)
    }

    pub fn period(&self) -> Option<&str> {
        match self {
            YearChoice::All => None,
            YearChoice::Period(code) => Some(code),
        }
    }
}

impl fmt::Display for YearChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearChoice::All => f.write_str(Self::ALL_VALUE),
            YearChoice::Period(code) => f.write_str(code),
        }
    }
}

impl FromStr for YearChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            Err("empty year".to_string())
        } else if s.eq_ignore_ascii_case(Self::ALL_VALUE) {
            Ok(YearChoice::All)
        } else {
            Ok(YearChoice::Period(s.to_string()))
        }
    }
}

impl Serialize for YearChoice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// How far along the dropdown cascade a selection has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Stage {
    NoTable,
    TableChosen,
    YearChosen,
    CategoryChosen,
    SubCategoryChosen,
    MetricChosen,
}

/// The user's current choices. Fields are only reachable through setters so
/// that changing an upstream field always clears everything downstream of it:
/// table → year → categories → sub-categories → metric. Gender and chart kind
/// sit outside the cascade and always carry a value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Selection {
    table: Option<String>,
    year: Option<YearChoice>,
    categories: Vec<String>,
    sub_categories: Vec<String>,
    metric: Option<String>,
    gender: Gender,
    chart_kind: ChartKind,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn year(&self) -> Option<&YearChoice> {
        self.year.as_ref()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn sub_categories(&self) -> &[String] {
        &self.sub_categories
    }

    pub fn metric(&self) -> Option<&str> {
        self.metric.as_deref()
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn chart_kind(&self) -> ChartKind {
        self.chart_kind
    }

    pub fn set_table(&mut self, table: Option<String>) {
        self.table = table;
        self.set_year(None);
    }

    pub fn set_year(&mut self, year: Option<YearChoice>) {
        self.year = year;
        self.set_categories(Vec::new());
    }

    pub fn set_categories(&mut self, categories: Vec<String>) {
        self.categories = dedup(categories);
        self.set_sub_categories(Vec::new());
    }

    pub fn set_sub_categories(&mut self, sub_categories: Vec<String>) {
        self.sub_categories = dedup(sub_categories);
        self.set_metric(None);
    }

    pub fn set_metric(&mut self, metric: Option<String>) {
        self.metric = metric;
    }

    pub fn set_gender(&mut self, gender: Gender) {
        self.gender = gender;
    }

    pub fn set_chart_kind(&mut self, chart_kind: ChartKind) {
        self.chart_kind = chart_kind;
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.set_table(Some(table.into()));
        self
    }

    pub fn with_year(mut self, year: YearChoice) -> Self {
        self.set_year(Some(year));
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_categories(categories.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_sub_categories<I, S>(mut self, sub_categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_sub_categories(sub_categories.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_metric(mut self, metric: impl Into<String>) -> Self {
        self.set_metric(Some(metric.into()));
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.set_gender(gender);
        self
    }

    pub fn with_chart_kind(mut self, chart_kind: ChartKind) -> Self {
        self.set_chart_kind(chart_kind);
        self
    }

    /// Furthest stage reached with every earlier field set.
    pub fn stage(&self) -> Stage {
        if self.table.is_none() {
            Stage::NoTable
        } else if self.year.is_none() {
            Stage::TableChosen
        } else if self.categories.is_empty() {
            Stage::YearChosen
        } else if self.sub_categories.is_empty() {
            Stage::CategoryChosen
        } else if self.metric.is_none() {
            Stage::SubCategoryChosen
        } else {
            Stage::MetricChosen
        }
    }

    /// Names of the required fields still unset.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.table.is_none() {
            missing.push("table");
        }
        if self.year.is_none() {
            missing.push("year");
        }
        if self.categories.is_empty() {
            missing.push("categories");
        }
        if self.sub_categories.is_empty() {
            missing.push("sub_categories");
        }
        if self.metric.is_none() {
            missing.push("metric");
        }
        missing
    }

    pub fn is_ready(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

fn dedup(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for v in values {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> Selection {
        Selection::new()
            .with_table("ks2_national")
            .with_year(YearChoice::All)
            .with_categories(["All pupils"])
            .with_sub_categories(["Total"])
            .with_metric("pt_mat_met_expected_standard")
    }

    #[test]
    fn setting_table_clears_everything_downstream() {
        let mut selection = full().with_gender(Gender::Girls);
        selection.set_table(Some("other".into()));
        assert_eq!(selection.table(), Some("other"));
        assert_eq!(selection.year(), None);
        assert!(selection.categories().is_empty());
        assert!(selection.sub_categories().is_empty());
        assert_eq!(selection.metric(), None);
        assert_eq!(selection.gender(), Gender::Girls);
        assert_eq!(selection.stage(), Stage::TableChosen);
    }

    #[test]
    fn setting_same_table_still_clears() {
        let mut selection = full();
        selection.set_table(Some("ks2_national".into()));
        assert_eq!(selection.stage(), Stage::TableChosen);
        assert!(!selection.is_ready());
    }

    #[test]
    fn each_stage_clears_only_later_fields() {
        let mut selection = full();
        selection.set_year(Some(YearChoice::Period("201819".into())));
        assert_eq!(selection.table(), Some("ks2_national"));
        assert!(selection.categories().is_empty());
        assert_eq!(selection.stage(), Stage::YearChosen);

        let mut selection = full();
        selection.set_categories(vec!["Sex".into()]);
        assert_eq!(selection.year(), Some(&YearChoice::All));
        assert!(selection.sub_categories().is_empty());
        assert_eq!(selection.metric(), None);

        let mut selection = full();
        selection.set_sub_categories(vec!["Boys".into()]);
        assert_eq!(selection.categories(), ["All pupils"]);
        assert_eq!(selection.metric(), None);
        assert_eq!(selection.stage(), Stage::SubCategoryChosen);
    }

    #[test]
    fn ready_needs_categories_and_sub_categories() {
        assert!(full().is_ready());
        assert_eq!(full().stage(), Stage::MetricChosen);

        let mut no_subs = full();
        no_subs.set_sub_categories(Vec::new());
        no_subs.set_metric(Some("pt_mat_met_expected_standard".into()));
        assert!(!no_subs.is_ready());
        assert_eq!(no_subs.missing_fields(), vec!["sub_categories"]);

        let mut no_cats = full();
        no_cats.set_categories(Vec::new());
        no_cats.set_sub_categories(vec!["Total".into()]);
        no_cats.set_metric(Some("pt_mat_met_expected_standard".into()));
        assert!(!no_cats.is_ready());
        assert_eq!(no_cats.missing_fields(), vec!["categories"]);
    }

    #[test]
    fn gender_and_chart_kind_never_block() {
        let selection = full()
            .with_gender(Gender::Boys)
            .with_chart_kind(ChartKind::Scatter);
        assert!(selection.is_ready());
    }

    #[test]
    fn duplicate_categories_collapse() {
        let selection = Selection::new()
            .with_table("t")
            .with_categories(["Sex", "Sex", "All pupils"]);
        assert_eq!(selection.categories(), ["Sex", "All pupils"]);
    }

    #[test]
    fn parses_control_values() {
        assert_eq!("all".parse::<YearChoice>(), Ok(YearChoice::All));
        assert_eq!(
            "201617".parse::<YearChoice>(),
            Ok(YearChoice::Period("201617".into()))
        );
        assert_eq!("Male".parse::<Gender>(), Ok(Gender::Boys));
        assert_eq!("line".parse::<ChartKind>(), Ok(ChartKind::Line));
        assert!("pie".parse::<ChartKind>().is_err());
    }
}
