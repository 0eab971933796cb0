pub mod builder;
pub mod cache;
pub mod spec;

pub use builder::FigureBuilder;
pub use cache::FigureCache;
pub use spec::{Axis, AxisType, BarMode, FigureSpec, Point, Series, TickLabel, XSemantic};
