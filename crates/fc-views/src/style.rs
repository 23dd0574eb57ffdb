//! Colours shared by the three surfaces

use egui::Color32;
use fc_core::{FloatRecord, Quality, ViewMode};

pub(crate) const SELECTED: Color32 = Color32::from_rgb(255, 214, 10);

/// Marker fill: quality for active floats, grey for inactive ones
pub(crate) fn marker_color(record: &FloatRecord) -> Color32 {
    if !record.is_active() {
        return Color32::from_gray(140);
    }
    match record.quality {
        Quality::High => Color32::from_rgb(46, 204, 113),
        Quality::Medium => Color32::from_rgb(241, 196, 15),
        Quality::Low => Color32::from_rgb(231, 76, 60),
    }
}

pub(crate) fn background(mode: ViewMode) -> Color32 {
    match mode {
        ViewMode::Satellite => Color32::from_rgb(14, 30, 52),
        ViewMode::Ocean => Color32::from_rgb(20, 78, 130),
        ViewMode::Terrain => Color32::from_rgb(72, 96, 70),
        ViewMode::Dark => Color32::from_rgb(12, 12, 16),
    }
}

pub(crate) fn graticule(mode: ViewMode) -> Color32 {
    match mode {
        ViewMode::Dark => Color32::from_gray(45),
        _ => Color32::from_rgba_unmultiplied(255, 255, 255, 40),
    }
}
