//! Filter controls
//!
//! Every change is applied immediately, the way the dataset selects behave;
//! a malformed value is reported and leaves the current filter in place.

use std::collections::BTreeSet;
use std::sync::Arc;

use egui::{ComboBox, Ui};
use fc_core::filter::ANY;
use fc_core::{FilterControls, FloatRecord, Parameter, Quality, Region, Status};
use fc_views::ViewController;
use tracing::debug;

use crate::UiState;

/// Choices offered by the country and year selects, taken from the dataset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub countries: Vec<String>,

    /// Newest first
    pub years: Vec<i32>,
}

impl FilterOptions {
    pub fn from_records(records: &[Arc<FloatRecord>]) -> Self {
        let countries: BTreeSet<&str> = records
            .iter()
            .filter_map(|r| r.country.as_deref())
            .collect();
        let years: BTreeSet<i32> = records.iter().map(|r| r.year()).collect();
        Self {
            countries: countries.into_iter().map(str::to_string).collect(),
            years: years.into_iter().rev().collect(),
        }
    }
}

fn display(value: &str) -> &str {
    if value.eq_ignore_ascii_case(ANY) { "All" } else { value }
}

/// A select whose first option is "All"; returns true when the value changed
fn select(ui: &mut Ui, label: &str, value: &mut String, options: &[String]) -> bool {
    let before = value.clone();
    ui.label(label);
    ComboBox::from_id_source(("filter", label))
        .width(ui.available_width())
        .selected_text(display(value).to_string())
        .show_ui(ui, |ui| {
            ui.selectable_value(value, ANY.to_string(), "All");
            for option in options {
                ui.selectable_value(value, option.clone(), option.as_str());
            }
        });
    *value != before
}

pub fn filter_panel(ui: &mut Ui, ui_state: &mut UiState, controller: &mut ViewController) {
    ui.heading("Filters");
    ui.add_space(4.0);

    let options = FilterOptions::from_records(&controller.state().store.records());
    let regions: Vec<String> = Region::ALL.iter().map(|r| r.name().to_string()).collect();
    let qualities: Vec<String> = Quality::ALL.iter().map(|q| q.as_str().to_string()).collect();
    let statuses: Vec<String> = [Status::Active, Status::Inactive]
        .iter()
        .map(|s| s.as_str().to_string())
        .collect();
    let years: Vec<String> = options.years.iter().map(i32::to_string).collect();

    let draft = &mut ui_state.filter_draft;
    let mut changed = false;
    changed |= select(ui, "Region", &mut draft.region, &regions);
    changed |= select(ui, "Country", &mut draft.country, &options.countries);
    changed |= select(ui, "Year", &mut draft.year, &years);
    changed |= select(ui, "Quality", &mut draft.quality, &qualities);
    changed |= select(ui, "Status", &mut draft.status, &statuses);

    ui.label("Measures");
    ui.horizontal_wrapped(|ui| {
        for parameter in Parameter::ALL {
            let name = parameter.as_str().to_string();
            let mut checked = draft.parameters.contains(&name);
            if ui.checkbox(&mut checked, parameter.as_str()).changed() {
                if checked {
                    draft.parameters.push(name);
                } else {
                    draft.parameters.retain(|p| *p != name);
                }
                changed = true;
            }
        }
    });

    ui.add_space(6.0);
    ui.horizontal(|ui| {
        if ui.button("Clear").clicked() {
            controller.clear_filter();
            ui_state.filter_draft = FilterControls::default();
        }
        let snapshot = controller.state().store.snapshot();
        ui.label(format!("Showing {} of {}", snapshot.visible.len(), snapshot.total));
    });

    if changed {
        let draft = ui_state.filter_draft.clone();
        debug!(?draft, "filter controls changed");
        if let Err(e) = controller.apply_filter_controls(draft) {
            ui_state.push_error("Filter", e);
        }
    }
}
