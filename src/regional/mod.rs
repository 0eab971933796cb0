pub mod boundaries;
pub mod figures;

pub use boundaries::BoundarySet;
pub use figures::{AuthorityValue, Frame, MapCenter, MapFigure, RankingFigure};

use anyhow::Context;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::catalog::table::cell;
use crate::catalog::utils::is_sentinel;
use crate::catalog::{Table, GENDER, GEOGRAPHIC_LEVEL, TIME_PERIOD};
use crate::error::Result;
use crate::figure::builder::coerce;
use crate::filter::Gender;

pub const LA_NAME: &str = "la_name";
pub const LOCAL_AUTHORITY: &str = "Local authority";

const REQUIRED: [&str; 4] = [GEOGRAPHIC_LEVEL, GENDER, TIME_PERIOD, LA_NAME];

/// The regional and local-authority attainment table.
#[derive(Debug, Clone)]
pub struct RegionalData {
    table: Table,
}

impl RegionalData {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let table = Table::from_path(path)?;
        let data = Self::from_table(table)
            .with_context(|| format!("validating regional table {}", path.display()))?;
        info!(path = %path.display(), rows = data.table.num_rows(), "loaded regional table");
        Ok(data)
    }

    pub fn from_table(table: Table) -> Result<Self> {
        for column in REQUIRED {
            table.column(column)?;
        }
        Ok(Self { table })
    }

    /// `(time_period, value)` for every usable local-authority total row,
    /// sorted by period and then value.
    fn authority_values(&self, metric: &str) -> Result<Vec<(String, AuthorityValue)>> {
        let levels = self.table.column(GEOGRAPHIC_LEVEL)?;
        let genders = self.table.column(GENDER)?;
        let periods = self.table.column(TIME_PERIOD)?;
        let names = self.table.column(LA_NAME)?;
        let values = self.table.column(metric)?;

        let mut out = Vec::new();
        for row in 0..self.table.num_rows() {
            if cell(levels, row) != Some(LOCAL_AUTHORITY)
                || cell(genders, row) != Some(Gender::Total.as_str())
            {
                continue;
            }
            let raw = cell(values, row);
            if is_sentinel(raw) {
                continue;
            }
            let (Some(period), Some(name), Some(raw)) = (cell(periods, row), cell(names, row), raw)
            else {
                continue;
            };
            match coerce(metric, raw) {
                Ok(value) => out.push((
                    period.to_string(),
                    AuthorityValue {
                        la_name: name.to_string(),
                        value,
                    },
                )),
                Err(err) => warn!(error = %err, row, "skipping row"),
            }
        }

        out.sort_by(|(pa, a), (pb, b)| pa.cmp(pb).then(a.value.total_cmp(&b.value)));
        debug!(metric, rows = out.len(), "authority values");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashboardError;
    use anyhow::Result;

    const REGIONAL: &str = "\
time_period,geographic_level,region_name,la_name,gender,pt_mat_met_expected_standard
201718,National,,,Total,76
201718,Local authority,Yorkshire,Leeds,Total,74
201718,Local authority,Yorkshire,York,Total,79
201718,Local authority,Yorkshire,Leeds,Boys,73
201617,Local authority,Yorkshire,York,Total,77
201617,Local authority,Yorkshire,Leeds,Total,c
201617,Local authority,Yorkshire,Leeds,Girls,72
201617,Local authority,Yorkshire,Isles of Scilly,Total,x
201819,Local authority,Yorkshire,Atlantis,Total,60
";

    fn regional() -> RegionalData {
        let table = Table::from_csv_str("ks2_regional", REGIONAL).unwrap();
        RegionalData::from_table(table).unwrap()
    }

    #[test]
    fn ranking_frames_are_sorted() -> Result<()> {
        let fig = regional().la_ranking("pt_mat_met_expected_standard")?;
        let periods: Vec<&str> = fig.frames.iter().map(|f| f.period.as_str()).collect();
        assert_eq!(periods, ["201617", "201718", "201819"]);
        assert_eq!(fig.frames[0].label, "2016-17");

        let names: Vec<&str> = fig.frames[1].values.iter().map(|v| v.la_name.as_str()).collect();
        assert_eq!(names, ["Leeds", "York"]);
        assert_eq!(fig.frames[0].values.len(), 1);
        assert_eq!(fig.value_range, [0.0, 100.0]);
        assert_eq!(fig.color_range, [55.0, 90.0]);
        Ok(())
    }

    #[test]
    fn choropleth_skips_unknown_authorities() -> Result<()> {
        crate::catalog::tests::init_test_logging();
        let boundaries =
            BoundarySet::from_json(boundaries::tests::GEOJSON, "CTYUA21NM")?;
        let fig = regional().choropleth(&boundaries, "pt_mat_met_expected_standard")?;
        assert_eq!(fig.frames.len(), 2);
        assert!(fig
            .frames
            .iter()
            .flat_map(|f| &f.values)
            .all(|v| v.la_name != "Atlantis"));
        assert_eq!(fig.feature_id_key, "properties.CTYUA21NM");
        assert_eq!(fig.center, MapCenter { lat: 53.0, lon: -1.5 });
        assert_eq!(fig.frame_duration_ms, 1000);

        let json = serde_json::to_value(&fig)?;
        assert_eq!(json["geojson"]["features"][0]["id"], "Leeds");
        Ok(())
    }

    #[test]
    fn unknown_metric_is_not_found() {
        let err = regional().la_ranking("pt_nope").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn missing_la_column_is_rejected() {
        let table = Table::from_csv_str("t", "time_period,geographic_level,gender\n201617,National,Total\n")
            .unwrap();
        let err = RegionalData::from_table(table).unwrap_err();
        assert_eq!(
            err,
            DashboardError::ColumnNotFound {
                table: "t".into(),
                column: LA_NAME.into()
            }
        );
    }
}
