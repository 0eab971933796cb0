use serde::Serialize;

use crate::filter::ChartKind;

/// What the x-axis positions represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum XSemantic {
    Characteristic,
    TimePeriod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisType {
    Category,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BarMode {
    Group,
}

/// Replaces the tick text at `value` (e.g. `201617` → `2016-17`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickLabel {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: String,
    #[serde(rename = "type")]
    pub axis_type: AxisType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tick_labels: Vec<TickLabel>,
}

impl Axis {
    pub fn category(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            axis_type: AxisType::Category,
            tick_labels: Vec::new(),
        }
    }

    pub fn linear(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            axis_type: AxisType::Linear,
            tick_labels: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub x: String,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// One colour group: all points sharing a `characteristic`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: String,
    pub points: Vec<Point>,
}

impl Series {
    pub fn xs(&self) -> Vec<&str> {
        self.points.iter().map(|p| p.x.as_str()).collect()
    }

    pub fn ys(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }
}

/// Rendering-ready chart description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FigureSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_semantic: XSemantic,
    pub x_axis: Axis,
    pub y_axis: Axis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bar_mode: Option<BarMode>,
    pub series: Vec<Series>,
}

impl FigureSpec {
    /// Placeholder figure with no data.
    pub fn empty(title: impl Into<String>) -> Self {
        Self {
            kind: ChartKind::Scatter,
            title: title.into(),
            x_semantic: XSemantic::Characteristic,
            x_axis: Axis::category(""),
            y_axis: Axis::linear(""),
            bar_mode: None,
            series: Vec::new(),
        }
    }

    pub fn series(&self, name: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.name == name)
    }

    pub fn point_count(&self) -> usize {
        self.series.iter().map(|s| s.points.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.point_count() == 0
    }
}
