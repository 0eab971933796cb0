pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod figure;
pub mod filter;
pub mod regional;

pub use catalog::{DataCatalog, Guidance, Table};
pub use config::DashboardConfig;
pub use dashboard::{Dashboard, TableSummary};
pub use error::{DashboardError, Result};
pub use figure::{FigureBuilder, FigureCache, FigureSpec};
pub use filter::{ChartKind, FilterResolver, Gender, ResolvedControls, Selection, YearChoice};
pub use regional::{BoundarySet, RegionalData};
