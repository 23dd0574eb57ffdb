//! The eframe application

use std::sync::Arc;
use std::time::{Duration, Instant};

use eframe::egui::{self, Context};
use fc_core::events::events::AdapterDisabled;
use fc_data::{Conversation, SessionStore};
use fc_ui::{icons, panel_ids, AnalysisPanel, ShellAction, StatsPanel, Theme, UiState};
use fc_views::{AdapterKind, ViewController, Viewport};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::startup::{self, Startup};

/// Longest step the scheduler is advanced by in one frame
const MAX_FRAME_STEP: Duration = Duration::from_millis(250);

/// Zoom step bound to the +/- keys
const KEY_ZOOM_STEP: f32 = 0.5;

pub struct FloatChatApp {
    controller: ViewController,
    viewport: Viewport,
    conversation: Conversation,
    session: SessionStore,

    /// Conversation revision last written to the session slot
    saved_revision: u64,

    disabled: Arc<Mutex<Vec<AdapterDisabled>>>,
    ui_state: UiState,
    stats: StatsPanel,
    analysis: AnalysisPanel,
    gpu_available: bool,
    frame_interval: Duration,
    last_frame: Instant,
}

impl FloatChatApp {
    pub fn new(cc: &eframe::CreationContext<'_>, startup: Startup) -> Self {
        fc_ui::apply_theme(&cc.egui_ctx, &Theme::default());

        let Startup {
            config,
            controller,
            conversation,
            session,
            adapter_settings,
            disabled,
        } = startup;

        let gpu_available = cc.gl.is_some();
        if !gpu_available {
            warn!("no GL context, the 3D globe will be disabled");
        }

        let mut ui_state = UiState::default();
        ui_state.seed_input = config.dataset.seed;

        let mut app = Self {
            saved_revision: conversation.revision(),
            controller,
            viewport: Viewport::new(),
            conversation,
            session,
            disabled,
            ui_state,
            stats: StatsPanel::new(),
            analysis: AnalysisPanel::new(config.analysis),
            gpu_available,
            frame_interval: adapter_settings.frame_interval,
            last_frame: Instant::now(),
        };

        let scheduler = app.controller.state().scheduler.clone();
        for adapter in startup::build_adapters(&scheduler, adapter_settings) {
            let kind = adapter.kind();
            app.viewport.add_adapter(adapter);
            app.mount(kind);
        }
        app
    }

    fn mount(&mut self, kind: AdapterKind) {
        if self.controller.is_mounted(kind) {
            return;
        }
        let Some(adapter) = self.viewport.adapter(kind).cloned() else {
            return;
        };
        if let Err(e) = startup::mount_adapter(&mut self.controller, adapter, self.gpu_available) {
            if !startup::reported_on_bus(&e) {
                self.ui_state.push_error(kind.title(), e);
            }
        }
    }

    /// Run every task due since the last frame
    fn tick(&mut self) {
        let now = Instant::now();
        let dt = now.saturating_duration_since(self.last_frame).min(MAX_FRAME_STEP);
        self.last_frame = now;
        self.controller.state().scheduler.advance(dt);
    }

    fn drain_disabled(&mut self) {
        let reports: Vec<AdapterDisabled> = std::mem::take(&mut *self.disabled.lock());
        for report in reports {
            self.ui_state
                .push_warning(format!("{} disabled", report.adapter), report.reason);
        }
    }

    fn handle_action(&mut self, ctx: &Context, action: ShellAction) {
        match action {
            ShellAction::Regenerate => match self.controller.regenerate(self.ui_state.seed_input) {
                Ok(count) => info!(count, "floats regenerated"),
                Err(e) => self.ui_state.push_error("Regenerate", e),
            },
            ShellAction::ClearFilter => {
                self.controller.clear_filter();
                self.ui_state.filter_draft = Default::default();
            }
            ShellAction::OpenView(kind) => {
                self.mount(kind);
                self.viewport.open(kind);
            }
            ShellAction::ClearChat => self.conversation.clear_history(),
            ShellAction::Quit => ctx.send_viewport_cmd(egui::ViewportCommand::Close),
        }
    }

    fn handle_shortcuts(&mut self, ctx: &Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let (toggle, zoom_in, zoom_out, escape) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Space),
                i.key_pressed(egui::Key::PlusEquals),
                i.key_pressed(egui::Key::Minus),
                i.key_pressed(egui::Key::Escape),
            )
        });
        if toggle {
            let enabled = !self.controller.auto_rotate();
            self.controller.set_auto_rotation(enabled);
        }
        if zoom_in {
            self.controller.zoom(KEY_ZOOM_STEP);
        }
        if zoom_out {
            self.controller.zoom(-KEY_ZOOM_STEP);
        }
        if escape {
            self.controller.deselect();
        }
    }

    fn persist_session(&mut self) {
        let revision = self.conversation.revision();
        if revision == self.saved_revision {
            return;
        }
        match self.session.save(&self.conversation.to_session()) {
            Ok(()) => self.saved_revision = revision,
            Err(e) => {
                warn!("failed to save session: {}", e);
                // Retry on the next change rather than every frame
                self.saved_revision = revision;
            }
        }
    }
}

impl eframe::App for FloatChatApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.tick();
        self.drain_disabled();
        self.handle_shortcuts(ctx);

        if let Some(action) = fc_ui::menu_bar(ctx, &mut self.ui_state, &self.controller) {
            self.handle_action(ctx, action);
        }

        egui::TopBottomPanel::top(panel_ids::TOOLBAR).show(ctx, |ui| {
            fc_ui::view_toolbar(ui, &mut self.ui_state, &mut self.controller);
        });

        if self.ui_state.show_filters || self.ui_state.show_stats {
            egui::SidePanel::left(panel_ids::FILTERS)
                .resizable(true)
                .default_width(250.0)
                .show(ctx, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        if self.ui_state.show_filters {
                            fc_ui::filter_panel(ui, &mut self.ui_state, &mut self.controller);
                            ui.separator();
                        }
                        if self.ui_state.show_stats {
                            self.stats.ui(ui, &self.controller.state().store);
                        }
                    });
                });
        }

        if self.ui_state.show_chat {
            egui::SidePanel::right(panel_ids::CHAT)
                .resizable(true)
                .default_width(340.0)
                .show(ctx, |ui| {
                    fc_ui::chat_panel(
                        ui,
                        &mut self.ui_state,
                        &self.conversation,
                        &self.controller.state().event_bus,
                    );
                });
        }

        if self.ui_state.show_analysis {
            let seed = self.controller.seed();
            let store = &self.controller.state().store;
            let analysis = &mut self.analysis;
            egui::Window::new(format!("{} Data Analysis", icons::ANALYSIS))
                .id(egui::Id::new(panel_ids::ANALYSIS))
                .open(&mut self.ui_state.show_analysis)
                .default_size([760.0, 540.0])
                .show(ctx, |ui| analysis.ui(ui, store, seed));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            fc_ui::show_notices(ui, &mut self.ui_state);
            for kind in self.viewport.ui(ui, &self.controller) {
                self.controller.unmount(kind);
            }
        });

        self.persist_session();
        ctx.request_repaint_after(self.frame_interval);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.conversation.cancel();
        if let Err(e) = self.session.save(&self.conversation.to_session()) {
            warn!("failed to save session on exit: {}", e);
        }
        self.controller.teardown();
        info!("FloatChat closed");
    }
}
