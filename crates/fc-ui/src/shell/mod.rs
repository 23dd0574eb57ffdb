use egui::{Context, TopBottomPanel};
use fc_views::{AdapterKind, ViewController};

use crate::{icons, theme, NoticeLevel, UiState};

/// Menu actions the application carries out after the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellAction {
    Regenerate,
    ClearFilter,
    OpenView(AdapterKind),
    ClearChat,
    Quit,
}

/// Render the main menu bar
pub fn menu_bar(ctx: &Context, ui_state: &mut UiState, controller: &ViewController) -> Option<ShellAction> {
    let mut action = None;

    TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("Data", |ui| {
                if ui.button("Regenerate floats").clicked() {
                    action = Some(ShellAction::Regenerate);
                    ui.close_menu();
                }
                if ui.button("Clear filter").clicked() {
                    action = Some(ShellAction::ClearFilter);
                    ui.close_menu();
                }

                ui.separator();

                if ui.button("Exit").clicked() {
                    action = Some(ShellAction::Quit);
                    ui.close_menu();
                }
            });

            ui.menu_button("View", |ui| {
                for kind in AdapterKind::ALL {
                    let icon = match kind {
                        AdapterKind::TileMap => icons::MAP,
                        AdapterKind::DomGlobe | AdapterKind::Sphere => icons::GLOBE,
                    };
                    if ui.button(format!("{} Open {}", icon, kind.title())).clicked() {
                        action = Some(ShellAction::OpenView(kind));
                        ui.close_menu();
                    }
                }

                ui.separator();

                ui.checkbox(&mut ui_state.show_filters, format!("{} Filters", icons::FILTER));
                ui.checkbox(&mut ui_state.show_stats, format!("{} Statistics", icons::STATS));
                ui.checkbox(&mut ui_state.show_chat, format!("{} Assistant", icons::CHAT));
                ui.checkbox(&mut ui_state.show_analysis, format!("{} Data analysis", icons::ANALYSIS));
            });

            ui.menu_button("Assistant", |ui| {
                if ui.button("Clear conversation").clicked() {
                    action = Some(ShellAction::ClearChat);
                    ui.close_menu();
                }
            });

            // Right-aligned status
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let snapshot = controller.state().store.snapshot();
                ui.label(format!("{} / {} floats", snapshot.visible.len(), snapshot.total));
                ui.separator();
                ui.label(format!("seed {}", controller.seed()));
                for kind in AdapterKind::ALL {
                    if controller.disabled_reason(kind).is_some() {
                        ui.separator();
                        ui.colored_label(theme::warning_color(), format!("{} disabled", kind.title()));
                    }
                }
            });
        });
    });

    action
}

/// Show the queued notices, newest last
pub fn show_notices(ui: &mut egui::Ui, ui_state: &mut UiState) {
    ui_state.expire_notices(std::time::Instant::now());

    for notice in &ui_state.notices {
        let color = match notice.level {
            NoticeLevel::Error => theme::error_color(),
            NoticeLevel::Warning => theme::warning_color(),
        };
        egui::Frame::none()
            .fill(color.linear_multiply(0.2))
            .stroke(egui::Stroke::new(1.0, color))
            .rounding(4.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new("⚠").color(color));
                    ui.label(&notice.title);
                    ui.separator();
                    ui.label(&notice.message);
                });
            });
    }
}
