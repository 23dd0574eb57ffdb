//! View-local state shared by the renderer adapters' vocabulary
//!
//! View state is never routed through the store; each adapter keeps its own
//! copy because the renderers disagree on what "zoom" means.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Background / imagery mode broadcast to every mounted adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Satellite,
    #[default]
    Ocean,
    Terrain,
    Dark,
}

impl ViewMode {
    pub const ALL: [ViewMode; 4] = [ViewMode::Satellite, ViewMode::Ocean, ViewMode::Terrain, ViewMode::Dark];

    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Satellite => "satellite",
            ViewMode::Ocean => "ocean",
            ViewMode::Terrain => "terrain",
            ViewMode::Dark => "dark",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Satellite => "Satellite",
            ViewMode::Ocean => "Ocean",
            ViewMode::Terrain => "Terrain",
            ViewMode::Dark => "Dark",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ViewMode::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CoreError::invalid(format!("unknown view mode '{wanted}'")))
    }
}

/// Mode, zoom scalar and auto-rotation flag of one adapter
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub mode: ViewMode,
    pub zoom: f32,
    pub auto_rotate: bool,
}

impl ViewState {
    pub fn new(mode: ViewMode, zoom: f32) -> Self {
        Self {
            mode,
            zoom,
            auto_rotate: false,
        }
    }
}
