//! Data analysis plots: profile comparison, surface time series, regional
//! statistics and anomaly detection

use chrono::{Datelike, NaiveDate};
use egui::{Color32, ComboBox, Grid, RichText, Ui};
use egui_plot::{
    Bar, BarChart, HLine, Legend, Line, LineStyle, MarkerShape, Plot, PlotPoints, Points,
};
use fc_core::{AnomalyReport, CoreResult, DatasetSummary, FloatStore, Region};
use fc_data::{AnalysisConfig, AnalysisGenerator, AnalysisSeries, DepthProfile};

use super::StatsPanel;
use crate::theme;

const PLOT_HEIGHT: f32 = 260.0;

const TEMPERATURE_COLORS: [Color32; 2] =
    [Color32::from_rgb(230, 80, 70), Color32::from_rgb(255, 165, 0)];
const SALINITY_COLORS: [Color32; 2] =
    [Color32::from_rgb(70, 120, 230), Color32::from_rgb(0, 200, 220)];
const COUNT_COLOR: Color32 = Color32::from_rgb(90, 180, 90);
const NORMAL_COLOR: Color32 = Color32::from_rgb(100, 150, 250);
const BAND_COLOR: Color32 = Color32::from_rgb(255, 200, 100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisKind {
    #[default]
    ProfileComparison,
    TimeSeries,
    RegionalStatistics,
    AnomalyDetection,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 4] = [
        AnalysisKind::ProfileComparison,
        AnalysisKind::TimeSeries,
        AnalysisKind::RegionalStatistics,
        AnalysisKind::AnomalyDetection,
    ];

    pub fn title(self) -> &'static str {
        match self {
            AnalysisKind::ProfileComparison => "Profile Comparison",
            AnalysisKind::TimeSeries => "Time Series Analysis",
            AnalysisKind::RegionalStatistics => "Regional Statistics",
            AnalysisKind::AnomalyDetection => "Anomaly Detection",
        }
    }
}

/// Series generated for one seed together with their anomaly scan
pub struct PreparedSeries {
    pub series: AnalysisSeries,
    pub anomalies: Option<AnomalyReport>,
}

pub struct AnalysisPanel {
    config: AnalysisConfig,
    pub kind: AnalysisKind,
    prepared: Option<PreparedSeries>,
    regional: StatsPanel,
}

impl AnalysisPanel {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            kind: AnalysisKind::default(),
            prepared: None,
            regional: StatsPanel::new(),
        }
    }

    /// Series for `seed`, regenerated only when the seed moves
    pub fn prepare(&mut self, seed: u64) -> CoreResult<&PreparedSeries> {
        let prepared = match self.prepared.take() {
            Some(prepared) if prepared.series.seed == seed => prepared,
            _ => {
                let series = AnalysisGenerator::new(self.config.clone(), seed)?.generate()?;
                let temperatures = series.daily_temperatures();
                let anomalies = AnomalyReport::detect(&temperatures, self.config.anomaly_sigmas);
                PreparedSeries { series, anomalies }
            }
        };
        Ok(self.prepared.insert(prepared))
    }

    pub fn ui(&mut self, ui: &mut Ui, store: &FloatStore, seed: u64) {
        ComboBox::from_label("Analysis")
            .selected_text(self.kind.title())
            .show_ui(ui, |ui| {
                for kind in AnalysisKind::ALL {
                    ui.selectable_value(&mut self.kind, kind, kind.title());
                }
            });
        ui.separator();

        if self.kind == AnalysisKind::RegionalStatistics {
            let summary = self.regional.summary(&store.snapshot()).clone();
            regional_statistics(ui, &summary);
            return;
        }

        let kind = self.kind;
        match self.prepare(seed) {
            Ok(prepared) => match kind {
                AnalysisKind::ProfileComparison => {
                    profile_comparison(ui, &prepared.series.profiles)
                }
                AnalysisKind::TimeSeries => time_series(ui, &prepared.series),
                AnalysisKind::AnomalyDetection => anomaly_detection(ui, prepared),
                AnalysisKind::RegionalStatistics => {}
            },
            Err(e) => {
                ui.colored_label(theme::error_color(), e.to_string());
            }
        }
    }
}

fn profile_comparison(ui: &mut Ui, profiles: &[DepthProfile]) {
    ui.label("Temperature and salinity against depth for two regions");
    ui.columns(2, |columns| {
        depth_plot(
            &mut columns[0],
            "profile_temperature",
            "Temperature (°C)",
            profiles,
            |p| p.temperature.as_slice(),
            &TEMPERATURE_COLORS,
        );
        depth_plot(
            &mut columns[1],
            "profile_salinity",
            "Salinity (PSU)",
            profiles,
            |p| p.salinity.as_slice(),
            &SALINITY_COLORS,
        );
    });
}

fn depth_plot(
    ui: &mut Ui,
    id: &str,
    x_label: &str,
    profiles: &[DepthProfile],
    values: impl Fn(&DepthProfile) -> &[f64],
    colors: &[Color32; 2],
) {
    Plot::new(id)
        .legend(Legend::default())
        .height(PLOT_HEIGHT)
        .x_axis_label(x_label)
        .y_axis_label("Depth (m, negative down)")
        .show(ui, |plot_ui| {
            for (i, profile) in profiles.iter().enumerate() {
                let points: Vec<[f64; 2]> = values(profile)
                    .iter()
                    .zip(&profile.depths)
                    .map(|(&value, &depth)| [value, -depth])
                    .collect();
                plot_ui.line(
                    Line::new(PlotPoints::new(points))
                        .color(colors[i % colors.len()])
                        .width(2.0)
                        .name(profile.region.name()),
                );
            }
        });
}

fn time_series(ui: &mut Ui, series: &AnalysisSeries) {
    ui.label("Monthly surface readings");
    let years: Vec<f64> = series.monthly.iter().map(|s| fractional_year(s.month)).collect();

    let temperature: Vec<[f64; 2]> = years
        .iter()
        .zip(&series.monthly)
        .map(|(&x, s)| [x, s.temperature])
        .collect();
    let salinity: Vec<[f64; 2]> = years
        .iter()
        .zip(&series.monthly)
        .map(|(&x, s)| [x, s.salinity])
        .collect();

    trend_plot(ui, "surface_temperature", "Temperature (°C)", temperature, TEMPERATURE_COLORS[0]);
    trend_plot(ui, "surface_salinity", "Salinity (PSU)", salinity, SALINITY_COLORS[0]);
}

fn trend_plot(ui: &mut Ui, id: &str, y_label: &str, points: Vec<[f64; 2]>, color: Color32) {
    Plot::new(id)
        .height(PLOT_HEIGHT / 2.0 + 20.0)
        .x_axis_label("Year")
        .y_axis_label(y_label)
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(PlotPoints::new(points.clone())).color(color).width(1.5));
            plot_ui.points(Points::new(points).color(color).radius(2.5));
        });
}

fn regional_statistics(ui: &mut Ui, summary: &DatasetSummary) {
    if summary.total == 0 {
        ui.label(RichText::new("No floats match the current filter.").weak());
        return;
    }
    let rows = regional_rows(summary);

    ui.columns(3, |columns| {
        let charts: [(&str, &str, fn(&RegionRow) -> f64, Color32); 3] = [
            ("regional_temperature", "Mean °C", |r| r.1, TEMPERATURE_COLORS[0]),
            ("regional_salinity", "Mean PSU", |r| r.2, SALINITY_COLORS[0]),
            ("regional_count", "Floats", |r| r.3 as f64, COUNT_COLOR),
        ];
        for (column, (id, title, value, color)) in columns.iter_mut().zip(charts) {
            region_bars(column, id, title, &rows, value, color);
        }
    });

    ui.add_space(6.0);
    Grid::new("regional_table").num_columns(4).striped(true).show(ui, |ui| {
        ui.label(RichText::new("Region").strong());
        ui.label(RichText::new("Mean °C").strong());
        ui.label(RichText::new("Mean PSU").strong());
        ui.label(RichText::new("Floats").strong());
        ui.end_row();
        for (region, temperature, salinity, count) in &rows {
            ui.label(region.name());
            ui.label(format!("{temperature:.1}"));
            ui.label(format!("{salinity:.2}"));
            ui.label(count.to_string());
            ui.end_row();
        }
    });
}

/// (region, mean temperature, mean salinity, float count)
pub type RegionRow = (Region, f64, f64, usize);

/// One row per region holding visible floats, in region order
pub fn regional_rows(summary: &DatasetSummary) -> Vec<RegionRow> {
    summary
        .by_region
        .iter()
        .map(|(region, stats)| (*region, stats.mean_temperature, stats.mean_salinity, stats.count))
        .collect()
}

fn region_bars(
    ui: &mut Ui,
    id: &str,
    title: &str,
    rows: &[RegionRow],
    value: fn(&RegionRow) -> f64,
    color: Color32,
) {
    ui.label(RichText::new(title).strong());
    let bars: Vec<Bar> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| Bar::new(i as f64, value(row)).width(0.6).name(row.0.name()))
        .collect();
    Plot::new(id)
        .height(PLOT_HEIGHT / 2.0 + 40.0)
        .show_x(false)
        .allow_drag(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(color).name(title));
        });
}

fn anomaly_detection(ui: &mut Ui, prepared: &PreparedSeries) {
    let Some(report) = &prepared.anomalies else {
        ui.label(RichText::new("No readings to scan").weak());
        return;
    };
    let daily = &prepared.series.daily;

    ui.horizontal(|ui| {
        ui.label(format!("Mean: {:.2} °C", report.mean));
        ui.separator();
        ui.label(format!("σ: {:.2}", report.std_dev));
        ui.separator();
        ui.label(format!("Band: ±{:.2} °C", report.threshold));
    });

    let mut normal = Vec::with_capacity(daily.len());
    let mut flagged = Vec::with_capacity(report.count());
    for (i, sample) in daily.iter().enumerate() {
        let point = [i as f64 + 1.0, sample.temperature];
        if report.is_anomaly(i) {
            flagged.push(point);
        } else {
            normal.push(point);
        }
    }

    Plot::new("anomaly_detection")
        .legend(Legend::default())
        .height(PLOT_HEIGHT)
        .x_axis_label("Day of year")
        .y_axis_label("Temperature (°C)")
        .show(ui, |plot_ui| {
            plot_ui.points(Points::new(normal).color(NORMAL_COLOR).radius(2.0).name("Normal"));
            if !flagged.is_empty() {
                plot_ui.points(
                    Points::new(flagged)
                        .color(theme::error_color())
                        .radius(5.0)
                        .shape(MarkerShape::Asterisk)
                        .name("Anomalies"),
                );
            }
            for bound in [report.upper_bound(), report.lower_bound()] {
                plot_ui.hline(
                    HLine::new(bound)
                        .color(BAND_COLOR)
                        .width(1.5)
                        .style(LineStyle::Dashed { length: 10.0 }),
                );
            }
        });

    ui.add_space(6.0);
    Grid::new("anomaly_summary").num_columns(2).striped(true).show(ui, |ui| {
        ui.label("Total anomalies");
        ui.label(report.count().to_string());
        ui.end_row();

        ui.label("Anomaly rate");
        ui.label(format!("{:.1}%", report.rate_percent()));
        ui.end_row();

        ui.label("Max deviation");
        ui.label(format!("{:.1} °C", report.max_deviation));
        ui.end_row();
    });
}

/// `2021-07-01` becomes 2021.5
fn fractional_year(date: NaiveDate) -> f64 {
    date.year() as f64 + date.month0() as f64 / 12.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use fc_data::{FloatGenerator, GeneratorConfig};

    #[test]
    fn test_series_are_cached_per_seed() {
        let mut panel = AnalysisPanel::new(AnalysisConfig::default());
        let first = panel.prepare(42).unwrap();
        assert_eq!(first.series.seed, 42);
        assert_eq!(first.series.daily.len(), 365);
        let daily = first.series.daily.clone();

        let again = panel.prepare(42).unwrap();
        assert_eq!(again.series.daily, daily);

        let other = panel.prepare(7).unwrap();
        assert_eq!(other.series.seed, 7);
        assert_ne!(other.series.daily, daily);
    }

    #[test]
    fn test_anomaly_scan_uses_configured_band() {
        let mut panel = AnalysisPanel::new(AnalysisConfig::default());
        let prepared = panel.prepare(42).unwrap();
        let report = prepared.anomalies.as_ref().unwrap();

        let expected = AnomalyReport::detect(&prepared.series.daily_temperatures(), 2.0).unwrap();
        assert_eq!(report, &expected);
        assert_eq!(report.samples, 365);
        assert!(report.count() <= 365);
        assert!(report.max_deviation >= report.threshold || report.count() == 0);
    }

    #[test]
    fn test_invalid_config_surfaces_as_error() {
        let config = AnalysisConfig {
            profile_levels: 0,
            ..AnalysisConfig::default()
        };
        let mut panel = AnalysisPanel::new(config);
        assert!(panel.prepare(1).is_err());
    }

    #[test]
    fn test_regional_rows_follow_visible_floats() {
        let store = FloatStore::new();
        let records = FloatGenerator::new(GeneratorConfig::default())
            .unwrap()
            .generate(120)
            .unwrap();
        store.load(records).unwrap();

        let summary = DatasetSummary::from_records(store.snapshot().visible.iter().map(|r| &**r));
        let rows = regional_rows(&summary);
        assert_eq!(rows.iter().map(|r| r.3).sum::<usize>(), 120);
        assert!(rows.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_fractional_year() {
        let july = NaiveDate::from_ymd_opt(2021, 7, 1).unwrap();
        assert_eq!(fractional_year(july), 2021.5);
    }
}
