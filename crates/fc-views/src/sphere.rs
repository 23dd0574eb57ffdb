//! 3D globe: floats as points on a perspective-projected sphere

use std::f32::consts::{PI, TAU};
use std::sync::Arc;
use std::time::Duration;

use egui::{Align2, Color32, FontId, Pos2, Rect, Rounding, Sense, Stroke, Ui, Vec2};
use fc_core::{
    CoreError, CoreResult, Easing, FloatId, FloatRecord, Property, Scheduler, Tween, ViewMode,
    ViewState,
};
use glam::{Mat4, Quat, Vec3};
use tracing::{debug, warn};

use crate::adapter::{AdapterKind, AdapterSettings, Container, RendererAdapter, SelectHandler};
use crate::reconcile::PrimitiveSet;
use crate::style;
use crate::surface::{pick_nearest, Scene, SurfaceHost};

pub const GLOBE_RADIUS: f32 = 1.0;

/// Height of the float points above the globe surface
pub const POINT_OFFSET: f32 = 0.02;

const DEFAULT_DISTANCE: f32 = 3.0;
const MIN_DISTANCE: f32 = 1.5;
const MAX_DISTANCE: f32 = 6.0;
const POINT_RADIUS: f32 = 3.5;
const SELECTED_SCALE: f32 = 2.0;
const GROW: Duration = Duration::from_millis(300);

/// Position on a sphere of `radius` for the given coordinates.
///
/// Latitude 90 lies on +Y; longitude -180 on +X.
pub fn lat_lon_to_cartesian(lat: f64, lon: f64, radius: f32) -> Vec3 {
    let phi = (90.0 - lat).to_radians() as f32;
    let theta = (lon + 180.0).to_radians() as f32;
    Vec3::new(
        -radius * phi.sin() * theta.cos(),
        radius * phi.cos(),
        radius * phi.sin() * theta.sin(),
    )
}

/// Orbit camera looking at the globe center
#[derive(Debug, Clone)]
struct Camera3D {
    position: Vec3,
    target: Vec3,
    up: Vec3,
    fov: f32,
    yaw: f32,
    pitch: f32,
    distance: f32,
}

impl Default for Camera3D {
    fn default() -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: 45.0_f32.to_radians(),
            yaw: PI / 2.0,
            pitch: 0.2,
            distance: DEFAULT_DISTANCE,
        };
        camera.update_from_angles();
        camera
    }
}

impl Camera3D {
    fn update_from_angles(&mut self) {
        self.position = Vec3::new(
            self.distance * self.yaw.cos() * self.pitch.cos(),
            self.distance * self.pitch.sin(),
            self.distance * self.yaw.sin() * self.pitch.cos(),
        );
    }

    fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    fn projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov, aspect_ratio, 0.1, 100.0)
    }

    fn orbit(&mut self, delta: Vec2) {
        self.yaw += delta.x * 0.01;
        self.pitch = (self.pitch + delta.y * 0.01).clamp(-1.4, 1.4);
        self.update_from_angles();
    }

    fn set_distance(&mut self, distance: f32) {
        self.distance = distance.clamp(MIN_DISTANCE, MAX_DISTANCE);
        self.update_from_angles();
    }

    /// Zoom factor reported in the view state
    fn zoom(&self) -> f32 {
        DEFAULT_DISTANCE / self.distance
    }

    /// Whether a point on the globe faces the camera
    fn sees(&self, point: Vec3) -> bool {
        point.dot(self.position) > GLOBE_RADIUS * GLOBE_RADIUS
    }
}

#[derive(Debug, Clone)]
struct GlobePoint {
    record: Arc<FloatRecord>,
    local: Vec3,

    /// Resting scale once any grow/shrink tween has finished
    scale: f32,
}

struct SphereScene {
    points: PrimitiveSet<GlobePoint>,
    camera: Camera3D,

    /// Globe spin around +Y, radians
    spin: f32,
}

impl SphereScene {
    fn new() -> Self {
        Self {
            points: PrimitiveSet::new(),
            camera: Camera3D::default(),
            spin: 0.0,
        }
    }

    fn world(&self, local: Vec3) -> Vec3 {
        Quat::from_rotation_y(self.spin) * local
    }

    /// Screen position and NDC depth, or `None` behind the camera
    fn project_point(&self, point: Vec3, rect: &Rect) -> Option<(Pos2, f32)> {
        let aspect_ratio = rect.width() / rect.height().max(1.0);
        let mvp = self.camera.projection_matrix(aspect_ratio) * self.camera.view_matrix();
        let transformed = mvp * point.extend(1.0);
        if transformed.w <= 0.0 {
            return None;
        }

        let ndc = transformed.truncate() / transformed.w;
        let x = (ndc.x + 1.0) * 0.5 * rect.width() + rect.left();
        let y = (1.0 - ndc.y) * 0.5 * rect.height() + rect.top();
        Some((Pos2::new(x, y), ndc.z))
    }
}

impl Scene for SphereScene {
    fn rotate(&mut self, degrees: f32) {
        self.spin = (self.spin + degrees.to_radians()).rem_euclid(TAU);
    }
}

/// WebGL-style sphere adapter; needs a GPU-capable container
pub struct SphereAdapter {
    host: SurfaceHost<SphereScene>,
}

impl SphereAdapter {
    pub fn new(scheduler: Arc<Scheduler>, settings: AdapterSettings) -> Self {
        Self {
            host: SurfaceHost::new(AdapterKind::Sphere.as_str(), scheduler, settings),
        }
    }

    /// Unrotated position of a rendered point
    pub fn point_position(&self, id: &str) -> Option<Vec3> {
        self.host
            .with(|m| m.scene.points.get(id).map(|point| point.local))
            .flatten()
    }

    /// Current display scale of a point
    pub fn point_scale(&self, id: &str) -> Option<f32> {
        self.host
            .with(|m| {
                let point = m.scene.points.get(id)?;
                Some(m.animator.value(id, Property::Scale).unwrap_or(point.scale))
            })
            .flatten()
    }

    pub fn camera_distance(&self) -> Option<f32> {
        self.host.with(|m| m.scene.camera.distance)
    }

    /// Globe spin in degrees
    pub fn spin(&self) -> f32 {
        self.host.with(|m| m.scene.spin.to_degrees()).unwrap_or(0.0)
    }
}

impl RendererAdapter for SphereAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Sphere
    }

    fn display_name(&self) -> &str {
        AdapterKind::Sphere.title()
    }

    fn mount(&self, container: Container, on_user_select: SelectHandler) -> CoreResult<()> {
        if !container.gpu_available {
            return Err(CoreError::ResourceUnavailable {
                adapter: AdapterKind::Sphere.as_str().to_string(),
                reason: format!("no GPU context for container '{}'", container.id),
            });
        }
        self.host.mount(
            container,
            on_user_select,
            SphereScene::new(),
            ViewState::new(ViewMode::default(), 1.0),
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
            let report = m.scene.points.reconcile(
                visible,
                |record| GlobePoint {
                    record: record.clone(),
                    local: lat_lon_to_cartesian(
                        record.position.lat(),
                        record.position.lon(),
                        GLOBE_RADIUS + POINT_OFFSET,
                    ),
                    scale: if selection.as_deref() == Some(record.id.as_str()) {
                        SELECTED_SCALE
                    } else {
                        1.0
                    },
                },
                |record, point| {
                    point.local = lat_lon_to_cartesian(
                        record.position.lat(),
                        record.position.lon(),
                        GLOBE_RADIUS + POINT_OFFSET,
                    );
                    point.record = record.clone();
                },
            );
            debug!(adapter = "sphere", ?report, "points reconciled");
        });
    }

    fn on_selection_changed(&self, previous: Option<&str>, current: Option<&str>) {
        self.host.with(|m| {
            m.selection = current.map(str::to_string);

            let mut resize = |id: &str, to: f32| {
                let Some(point) = m.scene.points.get_mut(id) else {
                    return;
                };
                let from = m.animator.value(id, Property::Scale).unwrap_or(point.scale);
                point.scale = to;
                let tween = Tween::new(from, to, GROW).with_easing(Easing::EaseOutQuad);
                if let Err(e) = m.animator.animate(id, Property::Scale, tween) {
                    warn!(adapter = "sphere", "scale animation skipped: {}", e);
                }
            };

            if let Some(previous) = previous.filter(|p| Some(*p) != current) {
                resize(previous, 1.0);
            }
            if let Some(current) = current {
                resize(current, SELECTED_SCALE);
            }
        });
    }

    fn set_view_mode(&self, mode: ViewMode) {
        self.host.set_mode(mode);
    }

    fn set_zoom(&self, delta: f32) {
        self.host.with(|m| {
            let distance = m.scene.camera.distance - delta;
            m.scene.camera.set_distance(distance);
            m.view.zoom = m.scene.camera.zoom();
        });
    }

    fn reset_view(&self) {
        self.host.with(|m| {
            m.scene.camera = Camera3D::default();
            m.scene.spin = 0.0;
            m.view.zoom = m.scene.camera.zoom();
        });
    }

    fn start_auto_rotation(&self) -> CoreResult<()> {
        self.host.start_rotation()
    }

    fn stop_auto_rotation(&self) {
        self.host.stop_rotation();
    }

    fn view_state(&self) -> ViewState {
        self.host.view_state(1.0)
    }

    fn primitive_ids(&self) -> Vec<FloatId> {
        self.host.with(|m| m.scene.points.ids()).unwrap_or_default()
    }

    fn highlighted(&self) -> Option<FloatId> {
        self.host
            .with(|m| m.selection.clone().filter(|id| m.scene.points.contains(id)))
            .flatten()
    }

    fn user_select(&self, id: &str) -> bool {
        self.host.report_click(id, |m| m.scene.points.contains(id))
    }

    fn ui(&self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let scroll = ui.input(|i| i.scroll_delta.y);

        let clicked = self.host.with(|m| {
            if response.dragged() {
                m.scene.camera.orbit(response.drag_delta());
            }
            if scroll != 0.0 && response.hovered() {
                let distance = m.scene.camera.distance * (1.0 - scroll * 0.001);
                m.scene.camera.set_distance(distance);
                m.view.zoom = m.scene.camera.zoom();
            }

            let painter = ui.painter_at(rect);
            painter.rect_filled(rect, Rounding::ZERO, Color32::from_rgb(5, 8, 20));

            // Globe silhouette from the projected center and a point on the rim
            let scene = &m.scene;
            let rim = scene.camera.view_matrix().inverse().transform_vector3(Vec3::X) * GLOBE_RADIUS;
            if let (Some((center, _)), Some((edge, _))) =
                (scene.project_point(Vec3::ZERO, &rect), scene.project_point(rim, &rect))
            {
                painter.circle_filled(center, center.distance(edge), style::background(m.view.mode));
            }

            let grid = Stroke::new(0.6, style::graticule(m.view.mode));
            for lat in (-60..=60).step_by(30) {
                let ring: Vec<Vec3> = (0..=36)
                    .map(|i| scene.world(lat_lon_to_cartesian(f64::from(lat), f64::from(i * 10 - 180), GLOBE_RADIUS)))
                    .collect();
                for pair in ring.windows(2) {
                    if !(scene.camera.sees(pair[0]) && scene.camera.sees(pair[1])) {
                        continue;
                    }
                    if let (Some((a, _)), Some((b, _))) =
                        (scene.project_point(pair[0], &rect), scene.project_point(pair[1], &rect))
                    {
                        painter.line_segment([a, b], grid);
                    }
                }
            }

            // Far points first
            let mut projected: Vec<(&FloatId, &GlobePoint, Pos2, f32)> = scene
                .points
                .iter()
                .filter_map(|(id, point)| {
                    let world = scene.world(point.local);
                    if !scene.camera.sees(world) {
                        return None;
                    }
                    let (pos, depth) = scene.project_point(world, &rect)?;
                    Some((id, point, pos, depth))
                })
                .collect();
            projected.sort_by(|a, b| b.3.total_cmp(&a.3));

            let perspective = DEFAULT_DISTANCE / scene.camera.distance;
            for (id, point, pos, _) in &projected {
                let scale = m.animator.value(id, Property::Scale).unwrap_or(point.scale);
                let radius = POINT_RADIUS * scale * perspective.sqrt();
                painter.circle_filled(*pos, radius, style::marker_color(&point.record));
                if m.selection.as_deref() == Some(id.as_str()) {
                    painter.circle_stroke(*pos, radius + 2.0, Stroke::new(1.5, style::SELECTED));
                }
            }

            painter.text(
                rect.left_bottom() + Vec2::new(6.0, -6.0),
                Align2::LEFT_BOTTOM,
                format!("{} points · drag to orbit · scroll to zoom", scene.points.len()),
                FontId::proportional(11.0),
                Color32::from_gray(190),
            );

            let hovered = response
                .hover_pos()
                .and_then(|pointer| {
                    pick_nearest(projected.iter().map(|(id, _, pos, _)| (*id, *pos)), pointer, POINT_RADIUS * 3.0)
                })
                .cloned();
            if let Some(point) = hovered.as_ref().and_then(|id| scene.points.get(id)) {
                let text = point.record.tooltip_text();
                egui::show_tooltip_at_pointer(ui.ctx(), response.id.with("point"), |ui| {
                    ui.label(text);
                });
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
                    "3D globe not mounted",
                    FontId::proportional(14.0),
                    Color32::GRAY,
                );
            }
        }
    }
}
