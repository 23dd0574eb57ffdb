//! Viewport - hosts the adapters as dockable tabs

use std::sync::Arc;

use ahash::AHashMap;
use egui::{Color32, RichText, Ui};
use egui_dock::{DockArea, DockState, TabViewer};

use crate::adapter::{AdapterKind, RendererAdapter};
use crate::controller::ViewController;

/// The main viewport; one tab per adapter
pub struct Viewport {
    dock_state: DockState<AdapterKind>,
    adapters: AHashMap<AdapterKind, Arc<dyn RendererAdapter>>,
    open: Vec<AdapterKind>,
}

impl Viewport {
    pub fn new() -> Self {
        Self {
            dock_state: DockState::new(vec![]),
            adapters: AHashMap::new(),
            open: Vec::new(),
        }
    }

    /// Register an adapter and show its tab
    pub fn add_adapter(&mut self, adapter: Arc<dyn RendererAdapter>) {
        let kind = adapter.kind();
        self.adapters.insert(kind, adapter);
        self.open(kind);
    }

    pub fn adapter(&self, kind: AdapterKind) -> Option<&Arc<dyn RendererAdapter>> {
        self.adapters.get(&kind)
    }

    /// Show the tab for `kind` if it is registered and not already open
    pub fn open(&mut self, kind: AdapterKind) -> bool {
        if !self.adapters.contains_key(&kind) || self.open.contains(&kind) {
            return false;
        }
        if self.open.is_empty() {
            // First tab becomes the main surface
            self.dock_state = DockState::new(vec![kind]);
        } else {
            self.dock_state.push_to_first_leaf(kind);
        }
        self.open.push(kind);
        true
    }

    pub fn is_open(&self, kind: AdapterKind) -> bool {
        self.open.contains(&kind)
    }

    /// Draw the tabs. Returns the adapters whose tab was closed this frame so
    /// the caller can unmount them.
    pub fn ui(&mut self, ui: &mut Ui, controller: &ViewController) -> Vec<AdapterKind> {
        let mut closed = Vec::new();
        let available_rect = ui.available_rect_before_wrap();

        ui.allocate_ui(available_rect.size(), |ui| {
            DockArea::new(&mut self.dock_state)
                .show_close_buttons(true)
                .draggable_tabs(true)
                .show_tab_name_on_hover(true)
                .show_inside(ui, &mut ViewportTabViewer {
                    adapters: &self.adapters,
                    controller,
                    closed: &mut closed,
                });
        });

        self.open.retain(|kind| !closed.contains(kind));
        closed
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

/// Tab viewer for egui_dock
struct ViewportTabViewer<'a> {
    adapters: &'a AHashMap<AdapterKind, Arc<dyn RendererAdapter>>,
    controller: &'a ViewController,
    closed: &'a mut Vec<AdapterKind>,
}

impl<'a> TabViewer for ViewportTabViewer<'a> {
    type Tab = AdapterKind;

    fn title(&mut self, tab: &mut Self::Tab) -> egui::WidgetText {
        match self.adapters.get(tab) {
            Some(adapter) => adapter.display_name().into(),
            None => tab.title().into(),
        }
    }

    fn ui(&mut self, ui: &mut Ui, tab: &mut Self::Tab) {
        if let Some(reason) = self.controller.disabled_reason(*tab) {
            ui.vertical_centered(|ui| {
                ui.add_space(40.0);
                ui.label(RichText::new(format!("{} is unavailable", tab.title())).strong());
                ui.label(RichText::new(reason).color(Color32::from_rgb(220, 120, 90)));
                ui.label("The other views keep working.");
            });
            return;
        }
        if let Some(adapter) = self.adapters.get(tab) {
            adapter.ui(ui);
        }
    }

    fn on_close(&mut self, tab: &mut Self::Tab) -> bool {
        self.closed.push(*tab);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::AdapterSettings;
    use crate::dom_globe::DomGlobeAdapter;
    use crate::tile_map::TileMapAdapter;
    use fc_core::Scheduler;

    #[test]
    fn test_open_registers_each_tab_once() {
        let scheduler = Arc::new(Scheduler::new());
        let mut viewport = Viewport::new();
        assert!(!viewport.open(AdapterKind::DomGlobe));

        viewport.add_adapter(Arc::new(DomGlobeAdapter::new(scheduler.clone(), AdapterSettings::default())));
        viewport.add_adapter(Arc::new(TileMapAdapter::new(scheduler, AdapterSettings::default())));
        assert!(viewport.is_open(AdapterKind::DomGlobe));
        assert!(viewport.is_open(AdapterKind::TileMap));
        assert!(!viewport.open(AdapterKind::TileMap));
        assert!(!viewport.is_open(AdapterKind::Sphere));
        assert_eq!(viewport.adapter(AdapterKind::TileMap).map(|a| a.kind()), Some(AdapterKind::TileMap));
    }
}
