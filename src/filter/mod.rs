pub mod resolver;
pub mod selection;

pub use resolver::{Control, DropdownOption, FilterResolver, ResolvedControls, ALL_YEARS_LABEL};
pub use selection::{ChartKind, Gender, Selection, Stage, YearChoice};
