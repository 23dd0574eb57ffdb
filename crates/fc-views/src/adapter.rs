//! Renderer adapter abstraction - base trait for every float surface

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use egui::Ui;
use fc_core::{CoreResult, FloatId, FloatRecord, ViewMode, ViewState};

/// Callback injected at mount time; the only way an adapter reports a click
pub type SelectHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// The three visual surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AdapterKind {
    DomGlobe,
    TileMap,
    Sphere,
}

impl AdapterKind {
    pub const ALL: [AdapterKind; 3] = [AdapterKind::DomGlobe, AdapterKind::TileMap, AdapterKind::Sphere];

    pub fn as_str(self) -> &'static str {
        match self {
            AdapterKind::DomGlobe => "dom-globe",
            AdapterKind::TileMap => "tile-map",
            AdapterKind::Sphere => "sphere",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            AdapterKind::DomGlobe => "Globe",
            AdapterKind::TileMap => "Map",
            AdapterKind::Sphere => "3D Globe",
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an adapter draws
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub id: String,
    pub width: f32,
    pub height: f32,

    /// Whether a GPU context exists for this container
    pub gpu_available: bool,
}

impl Container {
    pub fn new(id: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            gpu_available: true,
        }
    }

    pub fn without_gpu(mut self) -> Self {
        self.gpu_available = false;
        self
    }
}

/// Timing shared by every adapter's scheduled tasks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdapterSettings {
    pub frame_interval: Duration,
    pub rotation_speed_deg_per_sec: f32,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(16),
            rotation_speed_deg_per_sec: 6.0,
        }
    }
}

impl AdapterSettings {
    /// Rotation applied per frame task tick
    pub(crate) fn degrees_per_tick(&self) -> f32 {
        self.rotation_speed_deg_per_sec * self.frame_interval.as_secs_f32()
    }
}

/// A component translating store state into one visual technology.
///
/// Methods take `&self`: adapters keep their state behind a lock so that a
/// click handler can run (and re-enter the store) without any adapter lock
/// held. Every method is a no-op while unmounted.
pub trait RendererAdapter: Send + Sync {
    fn kind(&self) -> AdapterKind;

    fn display_name(&self) -> &str;

    /// Acquire drawing resources for `container`
    fn mount(&self, container: Container, on_user_select: SelectHandler) -> CoreResult<()>;

    /// Release every resource and scheduled task; idempotent
    fn unmount(&self);

    fn is_mounted(&self) -> bool;

    /// Reconcile rendered primitives against the visible records
    fn on_dataset_changed(&self, visible: &[Arc<FloatRecord>]);

    /// Move the highlight from `previous` to `current`
    fn on_selection_changed(&self, previous: Option<&str>, current: Option<&str>);

    fn set_view_mode(&self, mode: ViewMode);

    fn set_zoom(&self, delta: f32);

    fn reset_view(&self);

    fn start_auto_rotation(&self) -> CoreResult<()>;

    fn stop_auto_rotation(&self);

    fn view_state(&self) -> ViewState;

    /// Ids of the primitives currently rendered, in draw order
    fn primitive_ids(&self) -> Vec<FloatId>;

    /// Id the adapter currently highlights
    fn highlighted(&self) -> Option<FloatId>;

    /// Report a click on a rendered primitive through the mount handler
    fn user_select(&self, id: &str) -> bool;

    /// Draw the surface into the given ui
    fn ui(&self, ui: &mut Ui);
}
