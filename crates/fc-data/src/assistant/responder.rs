//! Template-based replies

use std::fmt::Write as _;

use fc_core::{DatasetSummary, Region};
use parking_lot::RwLock;
use tracing::debug;

use super::classifier::{Intent, IntentClassifier, UserMode};

/// Stable interface between the chat surface and whatever produces replies
pub trait ResponseGenerator: Send + Sync {
    fn generate_response(&self, message: &str, mode: UserMode) -> String;
}

/// Lookup-table responder, optionally enriched with dataset figures
#[derive(Debug, Default)]
pub struct CannedResponder {
    classifier: IntentClassifier,
    summary: RwLock<Option<DatasetSummary>>,
}

impl CannedResponder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Figures quoted in subsequent replies
    pub fn set_summary(&self, summary: DatasetSummary) {
        *self.summary.write() = Some(summary);
    }

    fn opening(mode: UserMode, intent: Intent) -> &'static str {
        use Intent::*;
        use UserMode::*;
        match (mode, intent) {
            (Scientist, Temperature) => "Based on the ARGO data analysis, here are the temperature findings:",
            (Scientist, Salinity) => "Salinity analysis from the oceanographic data reveals:",
            (Scientist, Location) => "ARGO float locations and measurements:",
            (Scientist, Time) => "Temporal coverage of the float records:",
            (Scientist, Comparison) => "Comparative analysis of the requested parameters:",
            (Scientist, Anomaly) => "Anomaly detection results from the dataset:",
            (Scientist, Depth) => "Vertical sampling of the profiling floats:",
            (Scientist, General) => "Scientific analysis of the ARGO oceanographic data:",

            (Student, Temperature) => "Let me explain ocean temperature in simple terms!",
            (Student, Salinity) => "Here's what salinity means for our oceans!",
            (Student, Location) => "Let's explore where these ocean measurements come from!",
            (Student, Time) => "Let's look at when these floats reported!",
            (Student, Comparison) => "Let's compare these ocean features!",
            (Student, Anomaly) => "Something unusual is happening in the ocean!",
            (Student, Depth) => "Let's dive into how deep the floats go!",
            (Student, General) => "Let's learn about the ocean together!",

            (Fisherman, Temperature) => "Here's what the water temperature means for fishing!",
            (Fisherman, Salinity) => "How salt levels affect your catch!",
            (Fisherman, Location) => "Best fishing spots based on ocean data!",
            (Fisherman, Time) => "Recent conditions out on the water:",
            (Fisherman, Comparison) => "Comparing fishing conditions!",
            (Fisherman, Anomaly) => "Unusual ocean conditions that might affect fishing!",
            (Fisherman, Depth) => "What's happening below the surface:",
            (Fisherman, General) => "Ocean conditions for your fishing trip!",
        }
    }

    fn closing(mode: UserMode, intent: Intent) -> &'static str {
        match (mode, intent) {
            (UserMode::Student, Intent::Salinity) => {
                "Salinity measures dissolved salt. Most seawater sits between 34 and 36 PSU; rivers and rain push it lower."
            }
            (UserMode::Student, Intent::Temperature) => {
                "Surface water is warmest near the equator and cools towards the poles."
            }
            (UserMode::Student, _) => "ARGO floats drift with the currents and surface every ten days to report.",
            (UserMode::Fisherman, Intent::Temperature) => {
                "Many pelagic species follow temperature fronts, so watch for sharp changes."
            }
            (UserMode::Fisherman, _) => "Check local forecasts before heading out.",
            (UserMode::Scientist, Intent::Depth) => {
                "Profiles sample pressure from the surface to roughly 2000 dbar."
            }
            (UserMode::Scientist, _) => "Values are synthetic and intended for demonstration only.",
        }
    }

    fn figures(summary: &DatasetSummary, intent: Intent, regions: &[Region]) -> String {
        let mut body = String::new();
        if summary.total == 0 {
            body.push_str("No floats are loaded at the moment.");
            return body;
        }

        let _ = write!(
            body,
            "{} floats tracked, {} active ({:.0}%).",
            summary.total,
            summary.active,
            summary.active_percent()
        );

        let focus: Vec<Region> = if regions.is_empty() {
            summary.busiest_region().into_iter().collect()
        } else {
            regions.to_vec()
        };

        for region in focus {
            match summary.by_region.get(&region) {
                Some(r) => {
                    let _ = match intent {
                        Intent::Salinity => write!(
                            body,
                            "\n- {}: {} floats, mean salinity {:.2} PSU",
                            region, r.count, r.mean_salinity
                        ),
                        _ => write!(
                            body,
                            "\n- {}: {} floats, mean temperature {:.1}°C, mean salinity {:.2} PSU",
                            region, r.count, r.mean_temperature, r.mean_salinity
                        ),
                    };
                }
                None => {
                    let _ = write!(body, "\n- {region}: no floats in the current dataset");
                }
            }
        }
        body
    }
}

impl ResponseGenerator for CannedResponder {
    fn generate_response(&self, message: &str, mode: UserMode) -> String {
        let intent = self.classifier.classify(message);
        let regions = self.classifier.regions_mentioned(message);
        debug!(intent = intent.as_str(), mode = mode.as_str(), "composing reply");

        let mut reply = String::from(Self::opening(mode, intent));
        if let Some(summary) = self.summary.read().as_ref() {
            reply.push_str("\n\n");
            reply.push_str(&Self::figures(summary, intent, &regions));
        }
        reply.push_str("\n\n");
        reply.push_str(Self::closing(mode, intent));
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fc_core::{FloatRecord, GeoPosition, Measurements, Quality, Status};

    fn record(id: &str, region: Region, temperature: f64) -> FloatRecord {
        FloatRecord {
            id: id.to_string(),
            platform_number: "2900001".to_string(),
            cycle_number: 1,
            position: GeoPosition::new(15.0, 65.0).unwrap(),
            region,
            country: None,
            measurements: Measurements {
                temperature_c: temperature,
                salinity_psu: 35.0,
                pressure_dbar: 500.0,
                oxygen_umol_kg: None,
            },
            quality: Quality::High,
            status: Status::Active,
            last_update: chrono::Utc::now(),
            parameters: Default::default(),
        }
    }

    #[test]
    fn test_template_depends_on_mode_and_intent() {
        let responder = CannedResponder::new();
        let scientist = responder.generate_response("temperature trends", UserMode::Scientist);
        let fisher = responder.generate_response("temperature trends", UserMode::Fisherman);

        assert!(scientist.starts_with("Based on the ARGO data analysis"));
        assert!(fisher.starts_with("Here's what the water temperature means for fishing"));
        assert_ne!(scientist, fisher);
    }

    #[test]
    fn test_same_input_same_reply() {
        let responder = CannedResponder::new();
        let a = responder.generate_response("hello", UserMode::Student);
        let b = responder.generate_response("hello", UserMode::Student);
        assert_eq!(a, b);
        assert!(a.starts_with("Let's learn about the ocean together!"));
    }

    #[test]
    fn test_summary_figures_are_quoted() {
        let responder = CannedResponder::new();
        let records = [
            record("a", Region::ArabianSea, 28.0),
            record("b", Region::ArabianSea, 26.0),
        ];
        responder.set_summary(DatasetSummary::from_records(&records));

        let reply = responder.generate_response("How warm is the Arabian Sea?", UserMode::Scientist);
        assert!(reply.contains("2 floats tracked"));
        assert!(reply.contains("Arabian Sea: 2 floats, mean temperature 27.0°C"));

        let missing = responder.generate_response("temperature in the Arctic Ocean", UserMode::Scientist);
        assert!(missing.contains("Arctic Ocean: no floats"));
    }
}
