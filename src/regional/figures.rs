use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::boundaries::BoundarySet;
use super::RegionalData;
use crate::catalog::utils::period_label;
use crate::error::Result;

pub const VALUE_LABEL: &str = "% Passing";
pub const CATEGORY_LABEL: &str = "Local Authority";
pub const COLOR_SCALE: &str = "Hot_r";
pub const COLOR_RANGE: [f64; 2] = [55.0, 90.0];
pub const FRAME_DURATION_MS: u32 = 1000;

/// One local authority's value within a period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorityValue {
    pub la_name: String,
    pub value: f64,
}

/// Values for one animation step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub period: String,
    pub label: String,
    pub values: Vec<AuthorityValue>,
}

/// Horizontal bars, one per authority, animated over time periods.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingFigure {
    pub metric: String,
    pub value_label: &'static str,
    pub category_label: &'static str,
    pub value_range: [f64; 2],
    pub color_scale: &'static str,
    pub color_range: [f64; 2],
    pub frame_duration_ms: u32,
    pub frames: Vec<Frame>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapCenter {
    pub lat: f64,
    pub lon: f64,
}

/// Choropleth over the boundary set, animated over time periods.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapFigure<'a> {
    pub metric: String,
    pub feature_id_key: String,
    pub center: MapCenter,
    pub zoom: f64,
    pub opacity: f64,
    pub color_scale: &'static str,
    pub color_label: &'static str,
    pub color_range: [f64; 2],
    pub frame_duration_ms: u32,
    pub frames: Vec<Frame>,
    pub geojson: &'a Value,
}

impl RegionalData {
    /// Authority values sorted ascending by period, then value.
    pub fn la_ranking(&self, metric: &str) -> Result<RankingFigure> {
        let frames = frames(self.authority_values(metric)?);
        debug!(metric, frames = frames.len(), "built ranking");
        Ok(RankingFigure {
            metric: metric.to_string(),
            value_label: VALUE_LABEL,
            category_label: CATEGORY_LABEL,
            value_range: [0.0, 100.0],
            color_scale: COLOR_SCALE,
            color_range: COLOR_RANGE,
            frame_duration_ms: FRAME_DURATION_MS,
            frames,
        })
    }

    /// Map of `metric` keyed by authority name. Authorities the boundary set
    /// does not know are dropped.
    pub fn choropleth<'a>(&self, boundaries: &'a BoundarySet, metric: &str) -> Result<MapFigure<'a>> {
        let mut values = self.authority_values(metric)?;
        let before = values.len();
        values.retain(|(_, v)| boundaries.contains(&v.la_name));
        if values.len() < before {
            warn!(
                metric,
                dropped = before - values.len(),
                "authorities missing from boundary set"
            );
        }

        Ok(MapFigure {
            metric: metric.to_string(),
            feature_id_key: boundaries.feature_id_key(),
            center: MapCenter { lat: 53.0, lon: -1.5 },
            zoom: 4.5,
            opacity: 0.5,
            color_scale: COLOR_SCALE,
            color_label: VALUE_LABEL,
            color_range: COLOR_RANGE,
            frame_duration_ms: FRAME_DURATION_MS,
            frames: frames(values),
            geojson: boundaries.geojson(),
        })
    }
}

/// Split sorted `(period, value)` pairs into consecutive frames.
fn frames(values: Vec<(String, AuthorityValue)>) -> Vec<Frame> {
    let mut out: Vec<Frame> = Vec::new();
    for (period, value) in values {
        match out.last_mut() {
            Some(frame) if frame.period == period => frame.values.push(value),
            _ => out.push(Frame {
                label: period_label(&period),
                period,
                values: vec![value],
            }),
        }
    }
    out
}
