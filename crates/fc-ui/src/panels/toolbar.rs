use egui::{DragValue, Ui};
use fc_core::ViewMode;
use fc_views::ViewController;
use tracing::info;

use crate::{icon_button, icons, UiState};

/// Zoom step sent by the toolbar buttons
const ZOOM_STEP: f32 = 0.5;

/// View-mode buttons, camera controls and dataset regeneration
pub fn view_toolbar(ui: &mut Ui, ui_state: &mut UiState, controller: &mut ViewController) {
    ui.horizontal(|ui| {
        let current = controller.view_mode();
        for mode in ViewMode::ALL {
            if ui.selectable_label(current == mode, mode.label()).clicked() && current != mode {
                controller.set_view_mode(mode);
            }
        }

        ui.separator();

        if icon_button(ui, icons::ZOOM_IN, "Zoom in").clicked() {
            controller.zoom(ZOOM_STEP);
        }
        if icon_button(ui, icons::ZOOM_OUT, "Zoom out").clicked() {
            controller.zoom(-ZOOM_STEP);
        }
        if icon_button(ui, icons::RESET, "Reset view").clicked() {
            controller.reset_view();
        }

        let mut rotate = controller.auto_rotate();
        if ui
            .toggle_value(&mut rotate, format!("{} Rotate", icons::ROTATE))
            .on_hover_text("Spin every view slowly")
            .changed()
        {
            controller.set_auto_rotation(rotate);
        }

        ui.separator();

        ui.label("Seed");
        ui.add(DragValue::new(&mut ui_state.seed_input).speed(1.0));
        if icon_button(ui, icons::DICE, "Regenerate floats with this seed").clicked() {
            match controller.regenerate(ui_state.seed_input) {
                Ok(count) => info!(count, seed = ui_state.seed_input, "floats regenerated"),
                Err(e) => ui_state.push_error("Regenerate", e),
            }
        }
    });
}
