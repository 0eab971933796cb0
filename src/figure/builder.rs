use std::collections::HashMap;
use tracing::{debug, warn};

use super::spec::{Axis, BarMode, FigureSpec, Point, Series, TickLabel, XSemantic};
use crate::catalog::{
    table::cell,
    utils::{is_sentinel, normalize_label, period_label},
    Table, CHARACTERISTIC, CHARACTERISTIC_GROUP, GENDER, TIME_PERIOD,
};
use crate::error::{DashboardError, Result};
use crate::filter::{ChartKind, Selection, YearChoice};

/// One surviving row after filtering and coercion.
struct Observation {
    characteristic: String,
    period: String,
    value: f64,
    raw: String,
}

/// Turns a ready selection into a `FigureSpec`. Holds no state.
#[derive(Debug, Clone, Copy, Default)]
pub struct FigureBuilder;

impl FigureBuilder {
    /// A line over a single year is meaningless, so it degrades to a scatter.
    pub fn effective_kind(requested: ChartKind, year: &YearChoice) -> ChartKind {
        match (requested, year) {
            (ChartKind::Line, YearChoice::Period(_)) => ChartKind::Scatter,
            (kind, _) => kind,
        }
    }

    pub fn title(description: &str, year: &YearChoice) -> String {
        match year {
            YearChoice::All => format!("{} by year", description),
            YearChoice::Period(code) => format!("{} for Academic Year: {}", description, code),
        }
    }

    /// Build the chart for `selection` over `table`. `description` is the
    /// human label of the chosen metric.
    ///
    /// Fails with `IncompleteSelection` only when a required field is unset;
    /// a selection that matches no rows yields a figure with no series.
    pub fn build(&self, table: &Table, selection: &Selection, description: &str) -> Result<FigureSpec> {
        let (Some(year), Some(metric), true) =
            (selection.year(), selection.metric(), selection.is_ready())
        else {
            return Err(DashboardError::IncompleteSelection {
                missing: selection.missing_fields(),
            });
        };

        let mut observations = self.observations(table, selection, year, metric)?;
        if year.is_all() {
            observations.sort_by(|a, b| a.period.cmp(&b.period));
        }

        let kind = Self::effective_kind(selection.chart_kind(), year);
        if kind != selection.chart_kind() {
            debug!(
                requested = selection.chart_kind().as_str(),
                used = kind.as_str(),
                "chart kind fell back"
            );
        }

        let x_semantic = match kind {
            ChartKind::Scatter => XSemantic::Characteristic,
            _ if year.is_all() => XSemantic::TimePeriod,
            _ => XSemantic::Characteristic,
        };

        let mut x_axis = match (kind, x_semantic) {
            (ChartKind::Bar, XSemantic::TimePeriod) | (ChartKind::Line, _) => Axis::category("Year"),
            _ => Axis::category("Characteristic"),
        };
        if x_semantic == XSemantic::TimePeriod {
            x_axis.tick_labels = tick_labels(&observations);
        }

        let with_text = kind != ChartKind::Line;
        let series = group_series(observations, x_semantic, with_text);

        Ok(FigureSpec {
            kind,
            title: Self::title(description, year),
            x_semantic,
            x_axis,
            y_axis: Axis::linear(normalize_label(metric)),
            bar_mode: (kind == ChartKind::Bar).then_some(BarMode::Group),
            series,
        })
    }

    /// Rows matching the selection with a numeric metric value.
    fn observations(
        &self,
        table: &Table,
        selection: &Selection,
        year: &YearChoice,
        metric: &str,
    ) -> Result<Vec<Observation>> {
        let groups = table.column(CHARACTERISTIC_GROUP)?;
        let characteristics = table.column(CHARACTERISTIC)?;
        let genders = table.column(GENDER)?;
        let periods = table.column(TIME_PERIOD)?;
        let values = table.column(metric)?;

        let categories = selection.categories();
        let sub_categories = selection.sub_categories();
        let gender = selection.gender().as_str();
        let period = year.period();

        let in_set = |v: Option<&str>, wanted: &[String]| v.is_some_and(|v| wanted.iter().any(|w| w == v));

        let filtered = table.filter_rows(|i| {
            in_set(cell(groups, i), categories)
                && in_set(cell(characteristics, i), sub_categories)
                && cell(genders, i) == Some(gender)
                && !is_sentinel(cell(values, i))
                && period.map_or(true, |p| cell(periods, i).map(str::trim) == Some(p))
        })?;

        let characteristics = filtered.column(CHARACTERISTIC)?;
        let periods = filtered.column(TIME_PERIOD)?;
        let values = filtered.column(metric)?;

        let mut out = Vec::with_capacity(filtered.num_rows());
        for i in 0..filtered.num_rows() {
            let raw = cell(values, i).unwrap_or_default().trim();
            let value = match coerce(metric, raw) {
                Ok(v) => v,
                Err(err) => {
                    warn!(table = table.name(), row = i, "{}", err);
                    continue;
                }
            };
            out.push(Observation {
                characteristic: cell(characteristics, i).unwrap_or_default().to_string(),
                period: cell(periods, i).unwrap_or_default().trim().to_string(),
                value,
                raw: raw.to_string(),
            });
        }

        debug!(
            table = table.name(),
            metric,
            kept = out.len(),
            of = table.num_rows(),
            "filtered rows"
        );
        Ok(out)
    }
}

/// Parse a metric cell; sentinels should already be gone by now.
pub fn coerce(column: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| DashboardError::DataCoercion {
            column: column.to_string(),
            value: raw.to_string(),
        })
}

fn tick_labels(observations: &[Observation]) -> Vec<TickLabel> {
    let mut codes: Vec<&str> = observations.iter().map(|o| o.period.as_str()).collect();
    codes.sort_unstable();
    codes.dedup();
    codes
        .into_iter()
        .map(|code| TickLabel {
            value: code.to_string(),
            label: period_label(code),
        })
        .collect()
}

/// One series per characteristic, in first-appearance order.
fn group_series(observations: Vec<Observation>, x: XSemantic, with_text: bool) -> Vec<Series> {
    let mut series: Vec<Series> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for obs in observations {
        let idx = *index.entry(obs.characteristic.clone()).or_insert_with(|| {
            series.push(Series {
                name: obs.characteristic.clone(),
                points: Vec::new(),
            });
            series.len() - 1
        });
        let x_value = match x {
            XSemantic::TimePeriod => obs.period,
            XSemantic::Characteristic => obs.characteristic,
        };
        series[idx].points.push(Point {
            x: x_value,
            y: obs.value,
            text: with_text.then_some(obs.raw),
        });
    }
    series
}
