//! View/filter controller
//!
//! Turns UI control actions into store mutations (dataset, filter, selection)
//! and into broadcasts to every mounted adapter (view mode, zoom, rotation).

use std::sync::Arc;

use fc_core::events::events::{AdapterDisabled, DatasetLoaded, ViewModeChanged};
use fc_core::{AppState, CoreError, CoreResult, FilterControls, FilterCriteria, ViewMode};
use fc_data::FloatGenerator;
use indexmap::IndexMap;
use tracing::{error, info, warn};

use crate::adapter::{AdapterKind, Container, RendererAdapter};
use crate::binding::AdapterBinding;

pub struct ViewController {
    state: AppState,
    generator: FloatGenerator,
    float_count: i64,
    bindings: IndexMap<AdapterKind, Arc<AdapterBinding>>,

    /// Adapters that failed to acquire resources, with the reason
    disabled: IndexMap<AdapterKind, String>,

    /// Control values behind the active filter, for display
    controls: FilterControls,
    view_mode: ViewMode,
    auto_rotate: bool,
}

impl ViewController {
    pub fn new(state: AppState, generator: FloatGenerator, float_count: i64) -> Self {
        Self {
            state,
            generator,
            float_count,
            bindings: IndexMap::new(),
            disabled: IndexMap::new(),
            controls: FilterControls::default(),
            view_mode: ViewMode::default(),
            auto_rotate: false,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn seed(&self) -> u64 {
        self.generator.config().seed
    }

    pub fn float_count(&self) -> i64 {
        self.float_count
    }

    /// Generate a dataset with the current seed and load it into the store.
    ///
    /// Nothing is mutated when generation fails.
    pub fn load_dataset(&mut self) -> CoreResult<usize> {
        let records = self.generator.generate(self.float_count)?;
        let count = records.len();
        self.state.store.load(records)?;

        let seed = self.seed();
        info!(count, seed, "dataset loaded");
        self.state.event_bus.publish(DatasetLoaded { count, seed });
        Ok(count)
    }

    /// Replace the dataset with one generated from `seed`
    pub fn regenerate(&mut self, seed: u64) -> CoreResult<usize> {
        let next = self.generator.clone().with_seed(seed);
        let previous = std::mem::replace(&mut self.generator, next);
        match self.load_dataset() {
            Ok(count) => Ok(count),
            Err(e) => {
                self.generator = previous;
                Err(e)
            }
        }
    }

    /// Change the dataset size used by the next load
    pub fn set_float_count(&mut self, count: i64) -> CoreResult<()> {
        if count < 0 {
            return Err(CoreError::invalid(format!("float count {count} is negative")));
        }
        self.float_count = count;
        Ok(())
    }

    /// Bind `adapter` to the store inside `container`.
    ///
    /// An adapter that reports missing resources is disabled: the failure is
    /// logged and published once, and later mount attempts fail fast without
    /// touching the adapter again.
    pub fn mount(&mut self, adapter: Arc<dyn RendererAdapter>, container: Container) -> CoreResult<()> {
        let kind = adapter.kind();
        if let Some(reason) = self.disabled.get(&kind) {
            return Err(CoreError::ResourceUnavailable {
                adapter: kind.as_str().to_string(),
                reason: reason.clone(),
            });
        }
        self.unmount(kind);

        let binding = match AdapterBinding::bind(&self.state.store, adapter, container) {
            Ok(binding) => binding,
            Err(CoreError::ResourceUnavailable { adapter, reason }) => {
                error!(adapter = %adapter, "adapter disabled: {}", reason);
                self.disabled.insert(kind, reason.clone());
                self.state.event_bus.publish(AdapterDisabled {
                    adapter: adapter.clone(),
                    reason: reason.clone(),
                });
                return Err(CoreError::ResourceUnavailable { adapter, reason });
            }
            Err(e) => return Err(e),
        };

        let adapter = binding.adapter();
        adapter.set_view_mode(self.view_mode);
        if self.auto_rotate {
            if let Err(e) = adapter.start_auto_rotation() {
                warn!(adapter = kind.as_str(), "auto-rotation not started: {}", e);
            }
        }
        self.bindings.insert(kind, binding);
        Ok(())
    }

    /// Release the adapter of `kind`; returns false when it was not mounted
    pub fn unmount(&mut self, kind: AdapterKind) -> bool {
        match self.bindings.shift_remove(&kind) {
            Some(binding) => {
                binding.release(&self.state.store);
                true
            }
            None => false,
        }
    }

    pub fn is_mounted(&self, kind: AdapterKind) -> bool {
        self.bindings.contains_key(&kind)
    }

    pub fn mounted_kinds(&self) -> Vec<AdapterKind> {
        self.bindings.keys().copied().collect()
    }

    pub fn adapter(&self, kind: AdapterKind) -> Option<Arc<dyn RendererAdapter>> {
        self.bindings.get(&kind).map(|b| b.adapter().clone())
    }

    /// Why an adapter was disabled, if it was
    pub fn disabled_reason(&self, kind: AdapterKind) -> Option<&str> {
        self.disabled.get(&kind).map(String::as_str)
    }

    pub fn controls(&self) -> &FilterControls {
        &self.controls
    }

    /// Parse `controls` and apply them; malformed values leave the store untouched
    pub fn apply_filter_controls(&mut self, controls: FilterControls) -> CoreResult<()> {
        let criteria = controls.to_criteria()?;
        info!(filter = %describe(&criteria), "filter applied");
        self.state.store.apply_filter(criteria);
        self.controls = controls;
        Ok(())
    }

    pub fn clear_filter(&mut self) {
        self.state.store.clear_filter();
        self.controls = FilterControls::default();
    }

    pub fn select(&self, id: &str) -> CoreResult<()> {
        self.state.store.select(id)
    }

    pub fn deselect(&self) {
        self.state.store.deselect();
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
        self.for_each_adapter(|adapter| adapter.set_view_mode(mode));
        self.state.event_bus.publish(ViewModeChanged { mode });
    }

    pub fn zoom(&self, delta: f32) {
        self.for_each_adapter(|adapter| adapter.set_zoom(delta));
    }

    pub fn reset_view(&self) {
        self.for_each_adapter(|adapter| adapter.reset_view());
    }

    pub fn auto_rotate(&self) -> bool {
        self.auto_rotate
    }

    pub fn set_auto_rotation(&mut self, enabled: bool) {
        self.auto_rotate = enabled;
        self.for_each_adapter(|adapter| {
            if !enabled {
                adapter.stop_auto_rotation();
            } else if let Err(e) = adapter.start_auto_rotation() {
                warn!(adapter = adapter.kind().as_str(), "auto-rotation not started: {}", e);
            }
        });
    }

    /// Unmount every adapter
    pub fn teardown(&mut self) {
        let kinds = self.mounted_kinds();
        for kind in kinds {
            self.unmount(kind);
        }
    }

    fn for_each_adapter(&self, f: impl Fn(&dyn RendererAdapter)) {
        for binding in self.bindings.values() {
            f(binding.adapter().as_ref());
        }
    }
}

fn describe(criteria: &FilterCriteria) -> String {
    if criteria.is_match_all() {
        "all floats".to_string()
    } else {
        criteria.describe()
    }
}

impl Drop for ViewController {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::AdapterSettings;
    use crate::dom_globe::DomGlobeAdapter;
    use crate::sphere::SphereAdapter;
    use crate::tile_map::TileMapAdapter;
    use fc_core::events::handler_from_fn;
    use fc_core::Scheduler;
    use fc_data::GeneratorConfig;
    use parking_lot::Mutex;
    use std::time::Duration;

    fn controller(count: i64) -> ViewController {
        let generator = FloatGenerator::new(GeneratorConfig::default()).unwrap();
        ViewController::new(AppState::new(), generator, count)
    }

    fn adapters(scheduler: &Arc<Scheduler>) -> Vec<Arc<dyn RendererAdapter>> {
        let settings = AdapterSettings::default();
        vec![
            Arc::new(DomGlobeAdapter::new(scheduler.clone(), settings)),
            Arc::new(TileMapAdapter::new(scheduler.clone(), settings)),
            Arc::new(SphereAdapter::new(scheduler.clone(), settings)),
        ]
    }

    fn mount_all(controller: &mut ViewController) -> Vec<Arc<dyn RendererAdapter>> {
        let scheduler = controller.state().scheduler.clone();
        let adapters = adapters(&scheduler);
        for adapter in &adapters {
            controller
                .mount(adapter.clone(), Container::new(adapter.kind().as_str(), 640.0, 320.0))
                .unwrap();
        }
        adapters
    }

    fn controls(quality: &str) -> FilterControls {
        FilterControls {
            quality: quality.to_string(),
            ..FilterControls::default()
        }
    }

    #[test]
    fn test_adapters_track_visible_set() {
        let mut controller = controller(120);
        let adapters = mount_all(&mut controller);
        controller.load_dataset().unwrap();

        let store = controller.state().store.clone();
        for adapter in &adapters {
            assert_eq!(adapter.primitive_ids(), store.visible_ids());
        }

        controller.apply_filter_controls(controls("high")).unwrap();
        controller.regenerate(7).unwrap();
        controller.apply_filter_controls(controls("medium")).unwrap();
        assert!(store.visible_ids().len() < 120);
        for adapter in &adapters {
            assert_eq!(adapter.primitive_ids(), store.visible_ids());
        }

        controller.clear_filter();
        for adapter in &adapters {
            assert_eq!(adapter.primitive_ids().len(), 120);
        }
    }

    #[test]
    fn test_malformed_controls_leave_store_untouched() {
        let mut controller = controller(30);
        controller.load_dataset().unwrap();
        let before = controller.state().store.snapshot().revision;

        let bad = FilterControls {
            year: "last year".to_string(),
            ..FilterControls::default()
        };
        assert!(matches!(
            controller.apply_filter_controls(bad),
            Err(CoreError::InvalidInput(_))
        ));
        assert_eq!(controller.state().store.snapshot().revision, before);
        assert_eq!(controller.controls(), &FilterControls::default());
    }

    #[test]
    fn test_negative_count_rejected_without_mutation() {
        let mut controller = controller(20);
        controller.load_dataset().unwrap();
        assert!(controller.set_float_count(-1).is_err());

        controller.float_count = -5;
        assert!(matches!(controller.load_dataset(), Err(CoreError::InvalidInput(_))));
        assert_eq!(controller.state().store.len(), 20);
    }

    #[test]
    fn test_view_commands_broadcast_to_mounted_adapters() {
        let mut controller = controller(10);
        let adapters = mount_all(&mut controller);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        controller.state().event_bus.subscribe::<ViewModeChanged>(handler_from_fn(move |event| {
            if let Some(changed) = event.as_any().downcast_ref::<ViewModeChanged>() {
                sink.lock().push(changed.mode);
            }
        }));

        controller.set_view_mode(ViewMode::Terrain);
        for adapter in &adapters {
            assert_eq!(adapter.view_state().mode, ViewMode::Terrain);
        }
        assert_eq!(*seen.lock(), vec![ViewMode::Terrain]);

        controller.set_auto_rotation(true);
        assert!(adapters.iter().all(|a| a.view_state().auto_rotate));
        controller.set_auto_rotation(false);
        assert!(adapters.iter().all(|a| !a.view_state().auto_rotate));

        controller.zoom(1.0);
        controller.reset_view();
        // view mode is adapter-local and survives a reset
        assert!(adapters.iter().all(|a| a.view_state().mode == ViewMode::Terrain));
    }

    #[test]
    fn test_late_mount_inherits_view_settings() {
        let mut controller = controller(10);
        controller.load_dataset().unwrap();
        controller.set_view_mode(ViewMode::Dark);
        controller.set_auto_rotation(true);

        let adapters = mount_all(&mut controller);
        for adapter in &adapters {
            let view = adapter.view_state();
            assert_eq!(view.mode, ViewMode::Dark);
            assert!(view.auto_rotate);
            assert_eq!(adapter.primitive_ids().len(), 10);
        }
    }

    #[test]
    fn test_missing_gpu_disables_only_sphere() {
        let mut controller = controller(25);
        controller.load_dataset().unwrap();
        let scheduler = controller.state().scheduler.clone();
        let disabled = Arc::new(Mutex::new(Vec::new()));
        let sink = disabled.clone();
        controller.state().event_bus.subscribe::<AdapterDisabled>(handler_from_fn(move |event| {
            if let Some(event) = event.as_any().downcast_ref::<AdapterDisabled>() {
                sink.lock().push(event.adapter.clone());
            }
        }));

        for adapter in adapters(&scheduler) {
            let kind = adapter.kind();
            let container = Container::new(kind.as_str(), 640.0, 320.0).without_gpu();
            let result = controller.mount(adapter, container);
            if kind == AdapterKind::Sphere {
                assert!(matches!(result, Err(CoreError::ResourceUnavailable { .. })));
            } else {
                assert!(result.is_ok());
            }
        }
        assert_eq!(controller.mounted_kinds(), vec![AdapterKind::DomGlobe, AdapterKind::TileMap]);
        assert!(controller.disabled_reason(AdapterKind::Sphere).is_some());

        // no retry: a second attempt fails fast and is not reported again
        let sphere = Arc::new(SphereAdapter::new(scheduler.clone(), AdapterSettings::default()));
        assert!(controller.mount(sphere, Container::new("sphere", 640.0, 320.0)).is_err());
        assert_eq!(*disabled.lock(), vec!["sphere".to_string()]);

        controller.apply_filter_controls(controls("low")).unwrap();
        let visible = controller.state().store.visible_ids();
        for kind in controller.mounted_kinds() {
            assert_eq!(controller.adapter(kind).unwrap().primitive_ids(), visible);
        }
    }

    #[test]
    fn test_teardown_releases_tasks_and_subscriptions() {
        let mut controller = controller(40);
        controller.load_dataset().unwrap();
        let state = controller.state().clone();
        let adapters = mount_all(&mut controller);
        controller.set_auto_rotation(true);
        assert_eq!(state.scheduler.active_count(), 6);
        assert_eq!(state.store.subscriber_count(), 3);

        controller.teardown();
        controller.teardown();
        assert_eq!(state.scheduler.active_count(), 0);
        assert_eq!(state.store.subscriber_count(), 0);

        // store notifications after teardown have no effect on the adapters
        controller.regenerate(99).unwrap();
        assert!(adapters.iter().all(|a| a.primitive_ids().is_empty()));
        assert_eq!(state.scheduler.advance(Duration::from_secs(1)), 0);
    }

    #[test]
    fn test_click_selects_through_store() {
        let mut controller = controller(12);
        controller.load_dataset().unwrap();
        let adapters = mount_all(&mut controller);

        let target = controller.state().store.visible_ids()[3].clone();
        assert!(adapters[0].user_select(&target));
        assert_eq!(controller.state().store.selection(), Some(target.clone()));
        for adapter in &adapters {
            assert_eq!(adapter.highlighted(), Some(target.clone()));
        }

        controller.deselect();
        assert!(adapters.iter().all(|a| a.highlighted().is_none()));
    }
}
