//! Dataset summary figures for the stats panel and the assistant, plus the
//! series math behind the analysis views

mod anomaly;
mod profile;

use std::collections::BTreeMap;

use crate::model::{FloatRecord, Quality, Region};

pub use anomaly::{mean, std_dev, AnomalyReport, DEFAULT_SIGMAS};
pub use profile::{depth_levels, ProfileModel, SeasonalCycle};

/// Per-region counts and mean readings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionSummary {
    pub count: usize,
    pub mean_temperature: f64,
    pub mean_salinity: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetSummary {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,

    /// Floats carrying an oxygen sensor
    pub biogeochemical: usize,

    pub by_quality: BTreeMap<Quality, usize>,
    pub by_region: BTreeMap<Region, RegionSummary>,
}

impl DatasetSummary {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a FloatRecord>,
    {
        let mut summary = DatasetSummary::default();
        // (count, temperature sum, salinity sum)
        let mut sums: BTreeMap<Region, (usize, f64, f64)> = BTreeMap::new();

        for record in records {
            summary.total += 1;
            if record.is_active() {
                summary.active += 1;
            } else {
                summary.inactive += 1;
            }
            if record.measurements.oxygen_umol_kg.is_some() {
                summary.biogeochemical += 1;
            }
            *summary.by_quality.entry(record.quality).or_insert(0) += 1;

            let entry = sums.entry(record.region).or_insert((0, 0.0, 0.0));
            entry.0 += 1;
            entry.1 += record.measurements.temperature_c;
            entry.2 += record.measurements.salinity_psu;
        }

        summary.by_region = sums
            .into_iter()
            .map(|(region, (count, temperature, salinity))| {
                let n = count as f64;
                let region_summary = RegionSummary {
                    count,
                    mean_temperature: temperature / n,
                    mean_salinity: salinity / n,
                };
                (region, region_summary)
            })
            .collect();
        summary
    }

    /// Share of active floats in percent
    pub fn active_percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.active as f64 * 100.0 / self.total as f64
        }
    }

    /// Mean temperature across the whole dataset
    pub fn mean_temperature(&self) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        let sum: f64 = self
            .by_region
            .values()
            .map(|r| r.mean_temperature * r.count as f64)
            .sum();
        Some(sum / self.total as f64)
    }

    /// Region holding the most floats
    pub fn busiest_region(&self) -> Option<Region> {
        self.by_region
            .iter()
            .max_by_key(|(_, r)| r.count)
            .map(|(region, _)| *region)
    }
}
