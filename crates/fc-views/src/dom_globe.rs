//! Flat "dot globe": floats as dots on an equirectangular canvas

use std::sync::Arc;
use std::time::Duration;

use egui::{Align2, Color32, FontId, Pos2, Rounding, Sense, Stroke, Ui, Vec2};
use fc_core::{
    CoreResult, Easing, FloatId, FloatRecord, Property, Repeat, Scheduler, Tween, ViewMode,
    ViewState,
};
use tracing::{debug, warn};

use crate::adapter::{AdapterKind, AdapterSettings, Container, RendererAdapter, SelectHandler};
use crate::reconcile::PrimitiveSet;
use crate::style;
use crate::surface::{pick_nearest, Scene, SurfaceHost};

const DOT_RADIUS: f32 = 4.0;
const DEFAULT_ZOOM: f32 = 1.0;
const MIN_ZOOM: f32 = 0.5;
const MAX_ZOOM: f32 = 4.0;
const PULSE: Duration = Duration::from_millis(700);

/// Project a position onto a `width` x `height` canvas.
///
/// Longitude -180 maps to the left edge, latitude 90 to the top edge.
pub fn equirectangular(lat: f64, lon: f64, width: f32, height: f32) -> (f32, f32) {
    let x = (lon + 180.0) / 360.0;
    let y = (90.0 - lat) / 180.0;
    (x as f32 * width, y as f32 * height)
}

/// Wrap a longitude into [-180, 180)
fn wrap_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

#[derive(Debug, Clone)]
struct Dot {
    record: Arc<FloatRecord>,
    x: f32,
    y: f32,
}

struct DotScene {
    dots: PrimitiveSet<Dot>,
    width: f32,
    height: f32,

    /// Longitude offset applied by auto-rotation, in degrees
    rotation: f32,
}

impl DotScene {
    fn new(container: &Container) -> Self {
        Self {
            dots: PrimitiveSet::new(),
            width: container.width,
            height: container.height,
            rotation: 0.0,
        }
    }

    fn place(&self, record: &FloatRecord) -> (f32, f32) {
        let lon = wrap_lon(record.position.lon() + f64::from(self.rotation));
        equirectangular(record.position.lat(), lon, self.width, self.height)
    }

    fn reposition(&mut self) {
        let placed: Vec<(f32, f32)> = self.dots.iter().map(|(_, dot)| self.place(&dot.record)).collect();
        for (dot, (x, y)) in self.dots.values_mut().zip(placed) {
            dot.x = x;
            dot.y = y;
        }
    }

    fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        self.reposition();
    }
}

impl Scene for DotScene {
    fn rotate(&mut self, degrees: f32) {
        self.rotation = (self.rotation + degrees).rem_euclid(360.0);
        self.reposition();
    }
}

/// Canvas dots adapter
pub struct DomGlobeAdapter {
    host: SurfaceHost<DotScene>,
}

impl DomGlobeAdapter {
    pub fn new(scheduler: Arc<Scheduler>, settings: AdapterSettings) -> Self {
        Self {
            host: SurfaceHost::new(AdapterKind::DomGlobe.as_str(), scheduler, settings),
        }
    }

    /// Canvas position of a rendered dot
    pub fn dot_position(&self, id: &str) -> Option<(f32, f32)> {
        self.host
            .with(|m| m.scene.dots.get(id).map(|dot| (dot.x, dot.y)))
            .flatten()
    }

    /// Current pulse scale of a dot (1.0 when not animating)
    pub fn dot_scale(&self, id: &str) -> Option<f32> {
        self.host.with(|m| m.animator.value(id, Property::Scale).unwrap_or(1.0))
    }

    pub fn rotation(&self) -> f32 {
        self.host.with(|m| m.scene.rotation).unwrap_or(0.0)
    }

    pub fn resize(&self, width: f32, height: f32) {
        self.host.with(|m| {
            m.container.width = width;
            m.container.height = height;
            m.scene.resize(width, height);
        });
    }
}

impl RendererAdapter for DomGlobeAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::DomGlobe
    }

    fn display_name(&self) -> &str {
        AdapterKind::DomGlobe.title()
    }

    fn mount(&self, container: Container, on_user_select: SelectHandler) -> CoreResult<()> {
        let scene = DotScene::new(&container);
        self.host.mount(
            container,
            on_user_select,
            scene,
            ViewState::new(ViewMode::default(), DEFAULT_ZOOM),
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
            let scene = &mut m.scene;
            let (width, height, rotation) = (scene.width, scene.height, scene.rotation);
            let place = |record: &FloatRecord| {
                let lon = wrap_lon(record.position.lon() + f64::from(rotation));
                equirectangular(record.position.lat(), lon, width, height)
            };
            let report = scene.dots.reconcile(
                visible,
                |record| {
                    let (x, y) = place(&**record);
                    Dot {
                        record: record.clone(),
                        x,
                        y,
                    }
                },
                |record, dot| {
                    dot.record = record.clone();
                    (dot.x, dot.y) = place(&**record);
                },
            );
            debug!(adapter = "dom-globe", ?report, "dots reconciled");
        });
    }

    fn on_selection_changed(&self, previous: Option<&str>, current: Option<&str>) {
        self.host.with(|m| {
            if let Some(previous) = previous {
                m.animator.cancel_target(previous);
            }
            m.selection = current.map(str::to_string);
            if let Some(current) = current {
                let pulse = Tween::new(1.0, 1.8, PULSE)
                    .with_easing(Easing::EaseInOutSine)
                    .with_repeat(Repeat::PingPong);
                if let Err(e) = m.animator.animate(current, Property::Scale, pulse) {
                    warn!(adapter = "dom-globe", "pulse skipped: {}", e);
                }
            }
        });
    }

    fn set_view_mode(&self, mode: ViewMode) {
        self.host.set_mode(mode);
    }

    fn set_zoom(&self, delta: f32) {
        self.host.with(|m| {
            m.view.zoom = (m.view.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
        });
    }

    fn reset_view(&self) {
        self.host.with(|m| {
            m.view.zoom = DEFAULT_ZOOM;
            m.scene.rotation = 0.0;
            m.scene.reposition();
        });
    }

    fn start_auto_rotation(&self) -> CoreResult<()> {
        self.host.start_rotation()
    }

    fn stop_auto_rotation(&self) {
        self.host.stop_rotation();
    }

    fn view_state(&self) -> ViewState {
        self.host.view_state(DEFAULT_ZOOM)
    }

    fn primitive_ids(&self) -> Vec<FloatId> {
        self.host.with(|m| m.scene.dots.ids()).unwrap_or_default()
    }

    fn highlighted(&self) -> Option<FloatId> {
        self.host
            .with(|m| m.selection.clone().filter(|id| m.scene.dots.contains(id)))
            .flatten()
    }

    fn user_select(&self, id: &str) -> bool {
        self.host.report_click(id, |m| m.scene.dots.contains(id))
    }

    fn ui(&self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click());

        let clicked = self.host.with(|m| {
            if (m.container.width - rect.width()).abs() > 0.5
                || (m.container.height - rect.height()).abs() > 0.5
            {
                m.container.width = rect.width();
                m.container.height = rect.height();
                m.scene.resize(rect.width(), rect.height());
            }

            let painter = ui.painter_at(rect);
            painter.rect_filled(rect, Rounding::ZERO, style::background(m.view.mode));

            let zoom = m.view.zoom;
            let to_screen = |x: f32, y: f32| {
                let center = rect.center();
                let local = Pos2::new(rect.left() + x, rect.top() + y);
                center + (local - center) * zoom
            };

            let grid = Stroke::new(0.5, style::graticule(m.view.mode));
            for lat in (-60..=60).step_by(30) {
                let (_, y) = equirectangular(f64::from(lat), 0.0, rect.width(), rect.height());
                painter.line_segment([to_screen(0.0, y), to_screen(rect.width(), y)], grid);
            }
            for lon in (-180..=180).step_by(60) {
                let (x, _) = equirectangular(0.0, f64::from(lon), rect.width(), rect.height());
                painter.line_segment([to_screen(x, 0.0), to_screen(x, rect.height())], grid);
            }

            let mut screen = Vec::with_capacity(m.scene.dots.len());
            for (id, dot) in m.scene.dots.iter() {
                let pos = to_screen(dot.x, dot.y);
                let scale = m.animator.value(id, Property::Scale).unwrap_or(1.0);
                let radius = DOT_RADIUS * zoom.sqrt() * scale;
                let selected = m.selection.as_deref() == Some(id.as_str());

                painter.circle_filled(pos, radius, style::marker_color(&dot.record));
                if selected {
                    painter.circle_stroke(pos, radius + 2.0, Stroke::new(2.0, style::SELECTED));
                } else {
                    painter.circle_stroke(pos, radius, Stroke::new(0.5, Color32::WHITE));
                }
                screen.push((id, pos));
            }

            painter.text(
                rect.left_bottom() + Vec2::new(6.0, -6.0),
                Align2::LEFT_BOTTOM,
                format!("{} floats · {}", m.scene.dots.len(), m.view.mode.label()),
                FontId::proportional(11.0),
                Color32::from_gray(200),
            );

            let hovered = response
                .hover_pos()
                .and_then(|pointer| pick_nearest(screen.iter().map(|(id, pos)| (*id, *pos)), pointer, DOT_RADIUS * 3.0))
                .cloned();
            if let Some(id) = &hovered {
                if let Some(dot) = m.scene.dots.get(id) {
                    let text = dot.record.tooltip_text();
                    egui::show_tooltip_at_pointer(ui.ctx(), response.id.with("dot"), |ui| {
                        ui.label(text);
                    });
                }
            }
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
                    "Globe not mounted",
                    FontId::proportional(14.0),
                    Color32::GRAY,
                );
            }
        }
    }
}
