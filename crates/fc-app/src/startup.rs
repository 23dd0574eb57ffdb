//! Everything built before the window opens

use std::sync::Arc;

use anyhow::{Context as _, Result};
use fc_core::events::events::{AdapterDisabled, ChatModeChanged, DatasetLoaded};
use fc_core::{handler_from_fn, AppState, CoreError, CoreResult, DatasetSummary, Scheduler};
use fc_data::{
    AppConfig, CannedResponder, Conversation, FileKeyValueStore, FloatGenerator, SessionStore,
};
use fc_views::{
    AdapterKind, AdapterSettings, Container, DomGlobeAdapter, RendererAdapter, SphereAdapter,
    TileMapAdapter, ViewController,
};
use parking_lot::Mutex;
use tracing::info;

/// Container size used until the first layout pass resizes the surfaces
const INITIAL_CONTAINER: (f32, f32) = (800.0, 600.0);

pub struct Startup {
    pub config: AppConfig,
    pub controller: ViewController,
    pub conversation: Conversation,
    pub session: SessionStore,
    pub adapter_settings: AdapterSettings,

    /// Adapter failures reported on the event bus, drained by the UI
    pub disabled: Arc<Mutex<Vec<AdapterDisabled>>>,
}

impl Startup {
    /// Wire store, generator, assistant and session together and load the
    /// first dataset
    pub fn build(config: AppConfig) -> Result<Self> {
        let state = AppState::new();
        let generator = FloatGenerator::new(config.dataset.generator_config())
            .context("invalid dataset configuration")?;

        let responder = Arc::new(CannedResponder::new());
        let disabled = Arc::new(Mutex::new(Vec::new()));
        subscribe_handlers(&state, &responder, &disabled);

        let mut controller = ViewController::new(state.clone(), generator, config.dataset.float_count);
        controller.set_view_mode(config.view.default_mode);
        controller.set_auto_rotation(config.view.auto_rotate);
        controller.load_dataset().context("failed to generate floats")?;

        let conversation = Conversation::new(
            state.scheduler.clone(),
            responder,
            config.chat.typing_settings()?,
        )?;
        let session = SessionStore::new(
            Box::new(FileKeyValueStore::new(config.session.data_dir.clone())),
            config.session.key.clone(),
        );
        let stored = session.load_or_default();
        let has_mode = !stored.mode.is_empty();
        conversation.restore(stored);
        if !has_mode {
            conversation.set_mode(config.chat.default_mode);
        }

        let adapter_settings = AdapterSettings {
            frame_interval: config.view.frame_interval()?,
            rotation_speed_deg_per_sec: config.view.rotation_speed_deg_per_sec,
        };

        info!(
            floats = controller.state().store.len(),
            mode = conversation.mode().as_str(),
            "startup complete"
        );
        Ok(Self {
            config,
            controller,
            conversation,
            session,
            adapter_settings,
            disabled,
        })
    }
}

fn subscribe_handlers(
    state: &AppState,
    responder: &Arc<CannedResponder>,
    disabled: &Arc<Mutex<Vec<AdapterDisabled>>>,
) {
    // Keep the assistant's figures in step with the dataset
    let store = Arc::downgrade(&state.store);
    let summary_sink = responder.clone();
    state.event_bus.subscribe::<DatasetLoaded>(handler_from_fn(move |_| {
        if let Some(store) = store.upgrade() {
            let records = store.records();
            summary_sink.set_summary(DatasetSummary::from_records(records.iter().map(|r| &**r)));
        }
    }));

    let sink = disabled.clone();
    state.event_bus.subscribe::<AdapterDisabled>(handler_from_fn(move |event| {
        if let Some(event) = event.as_any().downcast_ref::<AdapterDisabled>() {
            sink.lock().push(event.clone());
        }
    }));

    state.event_bus.subscribe::<ChatModeChanged>(handler_from_fn(|event| {
        if let Some(event) = event.as_any().downcast_ref::<ChatModeChanged>() {
            info!(mode = %event.mode, "assistant mode changed");
        }
    }));
}

/// One adapter of each kind, sharing the scheduler
pub fn build_adapters(scheduler: &Arc<Scheduler>, settings: AdapterSettings) -> Vec<Arc<dyn RendererAdapter>> {
    vec![
        Arc::new(DomGlobeAdapter::new(scheduler.clone(), settings)),
        Arc::new(TileMapAdapter::new(scheduler.clone(), settings)),
        Arc::new(SphereAdapter::new(scheduler.clone(), settings)),
    ]
}

/// Mount `adapter` in a fresh container
pub fn mount_adapter(
    controller: &mut ViewController,
    adapter: Arc<dyn RendererAdapter>,
    gpu_available: bool,
) -> CoreResult<()> {
    let kind: AdapterKind = adapter.kind();
    let mut container = Container::new(kind.as_str(), INITIAL_CONTAINER.0, INITIAL_CONTAINER.1);
    if !gpu_available {
        container = container.without_gpu();
    }
    controller.mount(adapter, container)
}

/// Whether a mount error was already reported through the event bus
pub fn reported_on_bus(error: &CoreError) -> bool {
    matches!(error, CoreError::ResourceUnavailable { .. })
}
