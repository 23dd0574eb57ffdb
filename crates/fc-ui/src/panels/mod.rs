//! Side panels around the viewport

mod analysis_panel;
mod chat_panel;
mod filter_panel;
mod stats_panel;
mod toolbar;

pub use analysis_panel::{regional_rows, AnalysisKind, AnalysisPanel, PreparedSeries, RegionRow};
pub use chat_panel::{chat_panel, QUICK_PROMPTS};
pub use filter_panel::{filter_panel, FilterOptions};
pub use stats_panel::StatsPanel;
pub use toolbar::view_toolbar;
