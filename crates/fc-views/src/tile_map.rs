//! Slippy-map surface: floats as markers over a base-map tile layer
//!
//! Markers keep their real-world coordinates; web-mercator is only used to
//! place them on screen.

use std::f64::consts::PI;
use std::sync::Arc;

use egui::{Align2, Color32, FontId, Pos2, Rect, Rounding, Sense, Shape, Stroke, Ui, Vec2};
use fc_core::{CoreResult, FloatId, FloatRecord, GeoPosition, Scheduler, ViewMode, ViewState};
use tracing::debug;

use crate::adapter::{AdapterKind, AdapterSettings, Container, RendererAdapter, SelectHandler};
use crate::reconcile::PrimitiveSet;
use crate::style;
use crate::surface::{pick_nearest, Scene, SurfaceHost};

const TILE_SIZE: f64 = 256.0;
const MIN_ZOOM: u8 = 2;
const MAX_ZOOM: u8 = 18;
const DEFAULT_ZOOM: u8 = 3;
const DEFAULT_CENTER: (f64, f64) = (10.0, 75.0);
const MAX_MERCATOR_LAT: f64 = 85.051_128;
const MARKER_RADIUS: f32 = 6.0;

/// Base-map imagery source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLayer {
    pub name: &'static str,
    pub url_template: &'static str,
    pub attribution: &'static str,
}

impl TileLayer {
    pub fn for_mode(mode: ViewMode) -> Self {
        match mode {
            ViewMode::Satellite => TileLayer {
                name: "World Imagery",
                url_template: "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
                attribution: "Tiles © Esri",
            },
            ViewMode::Ocean => TileLayer {
                name: "Ocean Basemap",
                url_template: "https://server.arcgisonline.com/ArcGIS/rest/services/Ocean/World_Ocean_Base/MapServer/tile/{z}/{y}/{x}",
                attribution: "Tiles © Esri, GEBCO, NOAA",
            },
            ViewMode::Terrain => TileLayer {
                name: "OpenTopoMap",
                url_template: "https://{s}.tile.opentopomap.org/{z}/{x}/{y}.png",
                attribution: "© OpenStreetMap contributors, SRTM | © OpenTopoMap",
            },
            ViewMode::Dark => TileLayer {
                name: "Dark Matter",
                url_template: "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}.png",
                attribution: "© OpenStreetMap contributors © CARTO",
            },
        }
    }
}

/// World pixel coordinates of a position at `zoom`
fn world_pixel(lat: f64, lon: f64, zoom: u8) -> (f64, f64) {
    let size = TILE_SIZE * f64::from(1u32 << zoom);
    let lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    let x = (lon + 180.0) / 360.0 * size;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * size;
    (x, y)
}

#[derive(Debug, Clone)]
struct Marker {
    record: Arc<FloatRecord>,
    popup_open: bool,
}

struct MapScene {
    markers: PrimitiveSet<Marker>,
    center_lat: f64,
    center_lon: f64,
    zoom: u8,
    layer: TileLayer,
}

impl MapScene {
    fn new(mode: ViewMode) -> Self {
        Self {
            markers: PrimitiveSet::new(),
            center_lat: DEFAULT_CENTER.0,
            center_lon: DEFAULT_CENTER.1,
            zoom: DEFAULT_ZOOM,
            layer: TileLayer::for_mode(mode),
        }
    }

    fn set_view(&mut self, lat: f64, lon: f64) {
        self.center_lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
        self.center_lon = (lon + 180.0).rem_euclid(360.0) - 180.0;
    }

    /// Screen position of a coordinate relative to the map center
    fn to_screen(&self, rect: Rect, lat: f64, lon: f64) -> Pos2 {
        let world = TILE_SIZE * f64::from(1u32 << self.zoom);
        let (cx, cy) = world_pixel(self.center_lat, self.center_lon, self.zoom);
        let (px, py) = world_pixel(lat, lon, self.zoom);

        // Take the copy of the world closest to the center
        let mut dx = px - cx;
        if dx > world / 2.0 {
            dx -= world;
        } else if dx < -world / 2.0 {
            dx += world;
        }
        rect.center() + Vec2::new(dx as f32, (py - cy) as f32)
    }
}

impl Scene for MapScene {
    /// Auto-rotation pans the map eastwards
    fn rotate(&mut self, degrees: f32) {
        self.set_view(self.center_lat, self.center_lon + f64::from(degrees));
    }
}

/// Tile map adapter
pub struct TileMapAdapter {
    host: SurfaceHost<MapScene>,
}

impl TileMapAdapter {
    pub fn new(scheduler: Arc<Scheduler>, settings: AdapterSettings) -> Self {
        Self {
            host: SurfaceHost::new(AdapterKind::TileMap.as_str(), scheduler, settings),
        }
    }

    pub fn tile_layer(&self) -> Option<TileLayer> {
        self.host.with(|m| m.scene.layer)
    }

    pub fn center(&self) -> Option<GeoPosition> {
        self.host
            .with(|m| GeoPosition::new(m.scene.center_lat, m.scene.center_lon).ok())
            .flatten()
    }

    /// Id of the marker whose popup is open
    pub fn open_popup(&self) -> Option<FloatId> {
        self.host
            .with(|m| {
                m.scene
                    .markers
                    .iter()
                    .find(|(_, marker)| marker.popup_open)
                    .map(|(id, _)| id.clone())
            })
            .flatten()
    }

    /// Coordinates a marker was placed at
    pub fn marker_position(&self, id: &str) -> Option<GeoPosition> {
        self.host
            .with(|m| m.scene.markers.get(id).map(|marker| marker.record.position))
            .flatten()
    }
}

impl RendererAdapter for TileMapAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::TileMap
    }

    fn display_name(&self) -> &str {
        AdapterKind::TileMap.title()
    }

    fn mount(&self, container: Container, on_user_select: SelectHandler) -> CoreResult<()> {
        let mode = ViewMode::default();
        self.host.mount(
            container,
            on_user_select,
            MapScene::new(mode),
            ViewState::new(mode, f32::from(DEFAULT_ZOOM)),
        )
    }

    fn unmount(&self) {
        self.host.unmount();
    }

    fn is_mounted(&self) -> bool {
        self.host.is_mounted()
    }

    fn on_dataset_changed(&self, visible: &[Arc<FloatRecord>]) {
        self.host.with(|m| {
            let selection = m.selection.clone();
            let report = m.scene.markers.reconcile(
                visible,
                |record| Marker {
                    record: record.clone(),
                    popup_open: selection.as_deref() == Some(record.id.as_str()),
                },
                |record, marker| marker.record = record.clone(),
            );
            debug!(adapter = "tile-map", ?report, "markers reconciled");
        });
    }

    fn on_selection_changed(&self, previous: Option<&str>, current: Option<&str>) {
        self.host.with(|m| {
            if let Some(marker) = previous.and_then(|id| m.scene.markers.get_mut(id)) {
                marker.popup_open = false;
            }
            m.selection = current.map(str::to_string);

            let target = current.and_then(|id| m.scene.markers.get_mut(id)).map(|marker| {
                marker.popup_open = true;
                marker.record.position
            });
            if let Some(position) = target {
                m.scene.set_view(position.lat(), position.lon());
            }
        });
    }

    fn set_view_mode(&self, mode: ViewMode) {
        self.host.with(|m| {
            m.view.mode = mode;
            m.scene.layer = TileLayer::for_mode(mode);
        });
    }

    fn set_zoom(&self, delta: f32) {
        self.host.with(|m| {
            let level = (f32::from(m.scene.zoom) + delta)
                .round()
                .clamp(f32::from(MIN_ZOOM), f32::from(MAX_ZOOM));
            m.scene.zoom = level as u8;
            m.view.zoom = level;
        });
    }

    fn reset_view(&self) {
        self.host.with(|m| {
            m.scene.set_view(DEFAULT_CENTER.0, DEFAULT_CENTER.1);
            m.scene.zoom = DEFAULT_ZOOM;
            m.view.zoom = f32::from(DEFAULT_ZOOM);
        });
    }

    fn start_auto_rotation(&self) -> CoreResult<()> {
        self.host.start_rotation()
    }

    fn stop_auto_rotation(&self) {
        self.host.stop_rotation();
    }

    fn view_state(&self) -> ViewState {
        self.host.view_state(f32::from(DEFAULT_ZOOM))
    }

    fn primitive_ids(&self) -> Vec<FloatId> {
        self.host.with(|m| m.scene.markers.ids()).unwrap_or_default()
    }

    fn highlighted(&self) -> Option<FloatId> {
        self.open_popup()
    }

    fn user_select(&self, id: &str) -> bool {
        self.host.report_click(id, |m| m.scene.markers.contains(id))
    }

    fn ui(&self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());

        let clicked = self.host.with(|m| {
            m.container.width = rect.width();
            m.container.height = rect.height();

            if response.dragged() {
                let world = (TILE_SIZE * f64::from(1u32 << m.scene.zoom)) as f32;
                let delta = response.drag_delta();
                let lon = m.scene.center_lon - f64::from(delta.x / world * 360.0);
                let lat = m.scene.center_lat + f64::from(delta.y / world * 170.0);
                m.scene.set_view(lat, lon);
            }

            let painter = ui.painter_at(rect);
            painter.rect_filled(rect, Rounding::ZERO, style::background(m.view.mode));

            let grid = Stroke::new(0.5, style::graticule(m.view.mode));
            for lat in (-60..=60).step_by(30) {
                let y = m.scene.to_screen(rect, f64::from(lat), m.scene.center_lon).y;
                painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], grid);
            }
            for lon in (-180..180).step_by(30) {
                let x = m.scene.to_screen(rect, 0.0, f64::from(lon)).x;
                painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], grid);
            }

            let mut screen = Vec::with_capacity(m.scene.markers.len());
            let mut popup = None;
            for (id, marker) in m.scene.markers.iter() {
                let pos = m.scene.to_screen(rect, marker.record.position.lat(), marker.record.position.lon());
                if !rect.expand(MARKER_RADIUS).contains(pos) {
                    continue;
                }
                let head = pos - Vec2::new(0.0, MARKER_RADIUS * 1.6);
                painter.add(Shape::convex_polygon(
                    vec![pos, head + Vec2::new(-MARKER_RADIUS * 0.7, 0.0), head + Vec2::new(MARKER_RADIUS * 0.7, 0.0)],
                    style::marker_color(&marker.record),
                    Stroke::NONE,
                ));
                painter.circle_filled(head, MARKER_RADIUS, style::marker_color(&marker.record));
                painter.circle_stroke(head, MARKER_RADIUS, Stroke::new(1.0, Color32::WHITE));
                if marker.popup_open {
                    popup = Some((head, marker.record.tooltip_text()));
                }
                screen.push((id, head));
            }

            if let Some((anchor, text)) = popup {
                let galley = painter.layout(text, FontId::proportional(11.0), Color32::from_gray(20), 260.0);
                let origin = anchor + Vec2::new(MARKER_RADIUS + 6.0, -galley.size().y / 2.0);
                let frame = Rect::from_min_size(origin, galley.size()).expand(5.0);
                painter.rect(frame, Rounding::same(4.0), Color32::from_gray(248), Stroke::new(1.0, style::SELECTED));
                painter.galley(origin, galley);
            }

            painter.text(
                rect.right_bottom() + Vec2::new(-6.0, -6.0),
                Align2::RIGHT_BOTTOM,
                format!("{} · z{} · {}", m.scene.layer.name, m.scene.zoom, m.scene.layer.attribution),
                FontId::proportional(10.0),
                Color32::from_gray(210),
            );

            let hovered = response
                .hover_pos()
                .and_then(|pointer| pick_nearest(screen.iter().map(|(id, pos)| (*id, *pos)), pointer, MARKER_RADIUS * 2.0))
                .cloned();
            if response.clicked() { hovered } else { None }
        });

        match clicked {
            Some(Some(id)) => {
                self.user_select(&id);
            }
            Some(None) => {}
            None => {
                ui.painter().text(
                    rect.center(),
                    Align2::CENTER_CENTER,
                    "Map not mounted",
                    FontId::proportional(14.0),
                    Color32::GRAY,
                );
            }
        }
    }
}
