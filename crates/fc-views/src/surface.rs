//! Mount lifecycle shared by the adapters
//!
//! A [`SurfaceHost`] owns the mounted state of one adapter and the scheduler
//! tasks created for it. Unmounting drops the state and cancels every task,
//! so no callback can reach a torn-down surface: tasks only hold a weak
//! reference to the slot and find it empty afterwards.

use std::sync::{Arc, Weak};

use fc_core::{Animator, CoreResult, FloatId, Scheduler, TaskHandle, ViewMode, ViewState};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::adapter::{AdapterSettings, Container, SelectHandler};

/// Variant-specific drawing state
pub(crate) trait Scene: Send + 'static {
    /// Spin the surface by `degrees` of longitude
    fn rotate(&mut self, degrees: f32);
}

/// State that exists only while mounted
pub(crate) struct Mounted<S> {
    pub container: Container,
    pub on_user_select: SelectHandler,
    pub selection: Option<FloatId>,
    pub view: ViewState,
    pub animator: Animator,
    pub scene: S,
    frame_task: Option<TaskHandle>,
    rotation_task: Option<TaskHandle>,
}

type Slot<S> = Arc<Mutex<Option<Mounted<S>>>>;

pub(crate) struct SurfaceHost<S> {
    name: &'static str,
    scheduler: Arc<Scheduler>,
    settings: AdapterSettings,
    slot: Slot<S>,
}

impl<S: Scene> SurfaceHost<S> {
    pub fn new(name: &'static str, scheduler: Arc<Scheduler>, settings: AdapterSettings) -> Self {
        Self {
            name,
            scheduler,
            settings,
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Install freshly built state and start the frame task.
    ///
    /// Mounting an already mounted surface releases the old state first.
    pub fn mount(
        &self,
        container: Container,
        on_user_select: SelectHandler,
        scene: S,
        view: ViewState,
    ) -> CoreResult<()> {
        self.unmount();

        let weak = Arc::downgrade(&self.slot);
        let dt = self.settings.frame_interval;
        let frame_task = self.scheduler.schedule_repeating(self.name, dt, move || {
            if let Some(slot) = weak.upgrade() {
                if let Some(mounted) = slot.lock().as_mut() {
                    mounted.animator.tick(dt);
                }
            }
        })?;

        info!(adapter = self.name, container = %container.id, "adapter mounted");
        *self.slot.lock() = Some(Mounted {
            container,
            on_user_select,
            selection: None,
            view,
            animator: Animator::new(),
            scene,
            frame_task: Some(frame_task),
            rotation_task: None,
        });
        Ok(())
    }

    /// Drop the mounted state and cancel its tasks. Returns false when
    /// nothing was mounted.
    pub fn unmount(&self) -> bool {
        let Some(mut mounted) = self.slot.lock().take() else {
            return false;
        };
        mounted.cancel_tasks(&self.scheduler);
        info!(adapter = self.name, container = %mounted.container.id, "adapter unmounted");
        true
    }

    pub fn is_mounted(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Run `f` against the mounted state, or return `None` while unmounted
    pub fn with<R>(&self, f: impl FnOnce(&mut Mounted<S>) -> R) -> Option<R> {
        self.slot.lock().as_mut().map(f)
    }

    pub fn view_state(&self, unmounted_zoom: f32) -> ViewState {
        self.with(|m| m.view.clone())
            .unwrap_or_else(|| ViewState::new(ViewMode::default(), unmounted_zoom))
    }

    pub fn set_mode(&self, mode: ViewMode) -> bool {
        self.with(|m| {
            let changed = m.view.mode != mode;
            m.view.mode = mode;
            changed
        })
        .unwrap_or(false)
    }

    pub fn start_rotation(&self) -> CoreResult<()> {
        let mut guard = self.slot.lock();
        let Some(mounted) = guard.as_mut() else {
            return Ok(());
        };
        if mounted.rotation_task.is_some() {
            return Ok(());
        }

        let weak: Weak<Mutex<Option<Mounted<S>>>> = Arc::downgrade(&self.slot);
        let step = self.settings.degrees_per_tick();
        let handle = self.scheduler.schedule_repeating(
            self.name,
            self.settings.frame_interval,
            move || {
                if let Some(slot) = weak.upgrade() {
                    if let Some(mounted) = slot.lock().as_mut() {
                        mounted.scene.rotate(step);
                    }
                }
            },
        )?;
        mounted.rotation_task = Some(handle);
        mounted.view.auto_rotate = true;
        debug!(adapter = self.name, "auto-rotation started");
        Ok(())
    }

    pub fn stop_rotation(&self) {
        let mut guard = self.slot.lock();
        let Some(mounted) = guard.as_mut() else {
            return;
        };
        if let Some(handle) = mounted.rotation_task.take() {
            self.scheduler.cancel(handle);
            debug!(adapter = self.name, "auto-rotation stopped");
        }
        mounted.view.auto_rotate = false;
    }

    /// Invoke the mount handler for `id` with no lock held.
    ///
    /// `accept` decides whether the id names a clickable primitive.
    pub fn report_click(&self, id: &str, accept: impl FnOnce(&Mounted<S>) -> bool) -> bool {
        let handler = {
            let guard = self.slot.lock();
            let Some(mounted) = guard.as_ref() else {
                return false;
            };
            if !accept(mounted) {
                return false;
            }
            mounted.on_user_select.clone()
        };
        debug!(adapter = self.name, float = id, "user selected float");
        handler(id);
        true
    }
}

/// Id of the primitive closest to `pointer`, if any lies within `max_distance`
pub(crate) fn pick_nearest<'a, I>(candidates: I, pointer: egui::Pos2, max_distance: f32) -> Option<&'a FloatId>
where
    I: IntoIterator<Item = (&'a FloatId, egui::Pos2)>,
{
    candidates
        .into_iter()
        .map(|(id, pos)| (id, pos.distance(pointer)))
        .filter(|(_, distance)| *distance <= max_distance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

impl<S> Mounted<S> {
    fn cancel_tasks(&mut self, scheduler: &Scheduler) {
        for handle in [self.frame_task.take(), self.rotation_task.take()]
            .into_iter()
            .flatten()
        {
            scheduler.cancel(handle);
        }
    }
}

impl<S> Drop for SurfaceHost<S> {
    fn drop(&mut self) {
        if let Some(mut mounted) = self.slot.lock().take() {
            mounted.cancel_tasks(&self.scheduler);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct Spinner {
        degrees: f32,
    }

    impl Scene for Spinner {
        fn rotate(&mut self, degrees: f32) {
            self.degrees += degrees;
        }
    }

    fn host(scheduler: &Arc<Scheduler>) -> SurfaceHost<Spinner> {
        let settings = AdapterSettings {
            frame_interval: Duration::from_millis(10),
            rotation_speed_deg_per_sec: 100.0,
        };
        SurfaceHost::new("test", scheduler.clone(), settings)
    }

    fn noop_handler() -> SelectHandler {
        Arc::new(|_: &str| {})
    }

    fn mount(host: &SurfaceHost<Spinner>, handler: SelectHandler) {
        host.mount(
            Container::new("c", 100.0, 100.0),
            handler,
            Spinner::default(),
            ViewState::new(ViewMode::Ocean, 1.0),
        )
        .unwrap();
    }

    #[test]
    fn test_unmount_cancels_every_task() {
        let scheduler = Arc::new(Scheduler::new());
        let before = scheduler.active_count();
        let host = host(&scheduler);

        mount(&host, noop_handler());
        host.start_rotation().unwrap();
        assert_eq!(scheduler.active_count(), before + 2);

        scheduler.advance(Duration::from_millis(100));
        let spun = host.with(|m| m.scene.degrees).unwrap();
        assert!((spun - 10.0).abs() < 1e-3);

        assert!(host.unmount());
        assert!(!host.unmount());
        assert_eq!(scheduler.active_count(), before);
        assert_eq!(scheduler.advance(Duration::from_secs(1)), 0);
    }

    #[test]
    fn test_stop_rotation_keeps_frame_task() {
        let scheduler = Arc::new(Scheduler::new());
        let host = host(&scheduler);
        mount(&host, noop_handler());
        host.start_rotation().unwrap();
        host.start_rotation().unwrap();
        assert_eq!(scheduler.active_count(), 2);

        host.stop_rotation();
        assert_eq!(scheduler.active_count(), 1);
        assert!(!host.view_state(1.0).auto_rotate);
    }

    #[test]
    fn test_remount_releases_previous_tasks() {
        let scheduler = Arc::new(Scheduler::new());
        let host = host(&scheduler);
        for _ in 0..3 {
            mount(&host, noop_handler());
        }
        assert_eq!(scheduler.active_count(), 1);
        drop(host);
        assert_eq!(scheduler.active_count(), 0);
    }

    #[test]
    fn test_click_runs_handler_without_lock() {
        let scheduler = Arc::new(Scheduler::new());
        let host = Arc::new(host(&scheduler));
        let clicks = Arc::new(AtomicUsize::new(0));

        let weak_host = Arc::downgrade(&host);
        let counter = clicks.clone();
        let handler: SelectHandler = Arc::new(move |_: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            // re-entering the host must not deadlock
            if let Some(host) = weak_host.upgrade() {
                assert!(host.is_mounted());
            }
        });
        mount(&host, handler);

        assert!(host.report_click("f1", |_| true));
        assert!(!host.report_click("f2", |_| false));
        assert_eq!(clicks.load(Ordering::SeqCst), 1);

        host.unmount();
        assert!(!host.report_click("f1", |_| true));
    }
}
