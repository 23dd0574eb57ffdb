//! User interface components for the float explorer
//!
//! This crate provides the egui panels around the viewport: filter controls,
//! the view toolbar, dataset statistics, the analysis plots and the chat
//! assistant.

pub mod panels;
pub mod shell;
pub mod theme;

use std::time::{Duration, Instant};

use fc_core::FilterControls;

pub use panels::*;
pub use shell::{menu_bar, show_notices, ShellAction};
pub use theme::{apply_theme, Theme};

/// How long a notice stays on screen
const NOTICE_TTL: Duration = Duration::from_secs(10);

/// UI state that persists across frames
pub struct UiState {
    /// Errors and warnings to display
    pub notices: Vec<Notice>,

    pub show_filters: bool,
    pub show_stats: bool,
    pub show_chat: bool,
    pub show_analysis: bool,

    /// Filter values being edited, applied on demand
    pub filter_draft: FilterControls,

    pub chat_input: String,
    pub seed_input: u64,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            notices: Vec::new(),
            show_filters: true,
            show_stats: true,
            show_chat: true,
            show_analysis: false,
            filter_draft: FilterControls::default(),
            chat_input: String::new(),
            seed_input: 42,
        }
    }
}

impl UiState {
    pub fn push_error(&mut self, title: impl Into<String>, message: impl ToString) {
        self.push(NoticeLevel::Error, title, message);
    }

    pub fn push_warning(&mut self, title: impl Into<String>, message: impl ToString) {
        self.push(NoticeLevel::Warning, title, message);
    }

    fn push(&mut self, level: NoticeLevel, title: impl Into<String>, message: impl ToString) {
        self.notices.push(Notice {
            level,
            title: title.into(),
            message: message.to_string(),
            timestamp: Instant::now(),
        });
    }

    /// Drop notices older than the display window
    pub fn expire_notices(&mut self, now: Instant) {
        self.notices
            .retain(|notice| now.duration_since(notice.timestamp) < NOTICE_TTL);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Warning,
    Error,
}

/// Message to display
#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
    pub timestamp: Instant,
}

// Common icon definitions
pub mod icons {
    pub const GLOBE: &str = "🌍";
    pub const MAP: &str = "🗺";
    pub const CHAT: &str = "💬";
    pub const FILTER: &str = "🔍";
    pub const STATS: &str = "📊";
    pub const ROTATE: &str = "🔄";
    pub const RESET: &str = "⟲";
    pub const ZOOM_IN: &str = "➕";
    pub const ZOOM_OUT: &str = "➖";
    pub const DICE: &str = "🎲";
    pub const ANALYSIS: &str = "📈";
}

// Panel IDs
pub mod panel_ids {
    pub const FILTERS: &str = "filter_panel";
    pub const CHAT: &str = "chat_panel";
    pub const TOOLBAR: &str = "view_toolbar";
    pub const ANALYSIS: &str = "analysis_window";
}

pub fn icon_button(ui: &mut egui::Ui, icon: &str, tooltip: &str) -> egui::Response {
    ui.add(egui::Button::new(icon)).on_hover_text(tooltip)
}
