use thiserror::Error;
use tracing::debug;

/// Failures raised by the catalog, resolver and figure builder.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DashboardError {
    #[error("table `{0}` not found in catalog")]
    TableNotFound(String),

    #[error("column `{column}` not found in table `{table}`")]
    ColumnNotFound { table: String, column: String },

    #[error("selection is incomplete, missing: {}", .missing.join(", "))]
    IncompleteSelection { missing: Vec<&'static str> },

    #[error("value `{value}` in column `{column}` is not numeric")]
    DataCoercion { column: String, value: String },

    #[error("arrow error: {0}")]
    Arrow(String),
}

impl DashboardError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DashboardError::TableNotFound(_) | DashboardError::ColumnNotFound { .. }
        )
    }
}

impl From<arrow::error::ArrowError> for DashboardError {
    /// The enum stays `Clone + Eq`, so only the message is kept; the full
    /// error is logged here before it is flattened.
    fn from(err: arrow::error::ArrowError) -> Self {
        debug!(error = ?err, "arrow error");
        DashboardError::Arrow(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::error::ArrowError;

    #[test]
    fn arrow_errors_keep_their_message() {
        let err: DashboardError = ArrowError::SchemaError("no field `la_name`".into()).into();
        assert!(matches!(&err, DashboardError::Arrow(msg) if msg.contains("la_name")));
        assert!(!err.is_not_found());
    }

    #[test]
    fn incomplete_selection_lists_missing_fields() {
        let err = DashboardError::IncompleteSelection {
            missing: vec!["categories", "metric"],
        };
        assert_eq!(
            err.to_string(),
            "selection is incomplete, missing: categories, metric"
        );
    }
}
