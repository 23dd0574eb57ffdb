//! Dataset statistics and the selected float

use egui::{Grid, ProgressBar, RichText, Ui};
use fc_core::{DatasetSnapshot, DatasetSummary, FloatStore, Quality};

use crate::theme;

/// Statistics over the visible floats, recomputed when the snapshot revision moves
#[derive(Default)]
pub struct StatsPanel {
    cached: Option<(u64, DatasetSummary)>,
}

impl StatsPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&mut self, snapshot: &DatasetSnapshot) -> &DatasetSummary {
        if !matches!(&self.cached, Some((revision, _)) if *revision == snapshot.revision) {
            self.cached = None;
        }
        let (_, summary) = self.cached.get_or_insert_with(|| {
            let summary = DatasetSummary::from_records(snapshot.visible.iter().map(|r| &**r));
            (snapshot.revision, summary)
        });
        summary
    }

    pub fn ui(&mut self, ui: &mut Ui, store: &FloatStore) {
        let snapshot = store.snapshot();
        ui.heading("Statistics");

        let summary = self.summary(&snapshot).clone();
        if summary.total == 0 {
            ui.label(RichText::new("No floats match the current filter.").weak());
        } else {
            overview(ui, &summary);
        }

        ui.separator();
        ui.label(RichText::new("Selected float").strong());
        match snapshot.selection.as_deref().and_then(|id| store.get(id)) {
            Some(record) => {
                ui.label(record.tooltip_text());
                if !snapshot.is_visible(&record.id) {
                    ui.label(RichText::new("Hidden by the current filter").color(theme::warning_color()));
                }
                if ui.button("Deselect").clicked() {
                    store.deselect();
                }
            }
            None => {
                ui.label(RichText::new("Click a float on any view").weak());
            }
        }
    }
}

fn overview(ui: &mut Ui, summary: &DatasetSummary) {
    Grid::new("stats_overview").num_columns(2).striped(true).show(ui, |ui| {
        ui.label("Floats");
        ui.label(summary.total.to_string());
        ui.end_row();

        ui.label("Active");
        ui.label(format!("{} ({:.0}%)", summary.active, summary.active_percent()));
        ui.end_row();

        ui.label("Biogeochemical");
        ui.label(summary.biogeochemical.to_string());
        ui.end_row();

        if let Some(mean) = summary.mean_temperature() {
            ui.label("Mean temperature");
            ui.label(format!("{mean:.1} °C"));
            ui.end_row();
        }
        if let Some(region) = summary.busiest_region() {
            ui.label("Busiest region");
            ui.label(region.name());
            ui.end_row();
        }
    });

    ui.add_space(6.0);
    for quality in Quality::ALL {
        let count = summary.by_quality.get(&quality).copied().unwrap_or(0);
        let fraction = count as f32 / summary.total as f32;
        ui.add(
            ProgressBar::new(fraction)
                .fill(theme::quality_color(quality))
                .text(format!("{quality} · {count}")),
        );
    }

    ui.add_space(6.0);
    Grid::new("stats_regions").num_columns(4).striped(true).show(ui, |ui| {
        ui.label(RichText::new("Region").strong());
        ui.label(RichText::new("Floats").strong());
        ui.label(RichText::new("°C").strong());
        ui.label(RichText::new("PSU").strong());
        ui.end_row();
        for (region, stats) in &summary.by_region {
            ui.label(region.name());
            ui.label(stats.count.to_string());
            ui.label(format!("{:.1}", stats.mean_temperature));
            ui.label(format!("{:.2}", stats.mean_salinity));
            ui.end_row();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use fc_data::{FloatGenerator, GeneratorConfig};

    #[test]
    fn test_summary_follows_revision() {
        let store = FloatStore::new();
        let records = FloatGenerator::new(GeneratorConfig::default())
            .unwrap()
            .generate(50)
            .unwrap();
        store.load(records).unwrap();

        let mut panel = StatsPanel::new();
        assert_eq!(panel.summary(&store.snapshot()).total, 50);

        store.apply_filter(fc_core::FilterCriteria::match_all().with_quality(Quality::High));
        let snapshot = store.snapshot();
        let high = snapshot.visible.len();
        assert_eq!(panel.summary(&snapshot).total, high);
        assert_eq!(panel.summary(&snapshot).by_quality.get(&Quality::High).copied().unwrap_or(0), high);
    }
}
