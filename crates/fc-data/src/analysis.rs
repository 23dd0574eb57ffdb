//! Seeded series behind the analysis views
//!
//! Regional depth profiles, a monthly surface record and a daily
//! temperature record with injected spikes. Like the float generator, the
//! same seed always yields the same series.

use std::f64::consts::FRAC_PI_4;

use chrono::{Datelike, NaiveDate};
use fc_core::stats::{depth_levels, ProfileModel, SeasonalCycle, DEFAULT_SIGMAS};
use fc_core::{CoreError, CoreResult, Region};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Regions shown side by side in the profile comparison
pub const COMPARED_REGIONS: [Region; 2] = [Region::ArabianSea, Region::BayOfBengal];

// Independent random stream per series
const PROFILE_STREAM: u64 = 0x5052_4f46;
const MONTHLY_STREAM: u64 = 0x4d4f_4e54;
const DAILY_STREAM: u64 = 0x4441_494c;
const SPIKE_STREAM: u64 = 0x5350_494b;

/// Size of an injected spike, °C
const SPIKE_RANGE: (f64, f64) = (4.0, 6.0);

const PROFILE_TEMPERATURE_NOISE: f64 = 0.3;
const PROFILE_SALINITY_NOISE: f64 = 0.05;
const SURFACE_TEMPERATURE_NOISE: f64 = 0.5;
const SURFACE_SALINITY_NOISE: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// First and last year of the monthly surface record
    pub first_year: i32,
    pub last_year: i32,

    /// Year covered by the daily anomaly record
    pub anomaly_year: i32,

    /// Days pushed off the seasonal curve
    pub anomaly_spikes: usize,

    /// Width of the normal band in standard deviations
    pub anomaly_sigmas: f64,

    pub profile_levels: usize,
    pub profile_max_depth_m: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            first_year: 2020,
            last_year: 2023,
            anomaly_year: 2023,
            anomaly_spikes: 20,
            anomaly_sigmas: DEFAULT_SIGMAS,
            profile_levels: 50,
            profile_max_depth_m: 2000.0,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.first_year > self.last_year {
            return Err(CoreError::invalid(format!(
                "analysis years {}..{} are reversed",
                self.first_year, self.last_year
            )));
        }
        if !self.anomaly_sigmas.is_finite() || self.anomaly_sigmas <= 0.0 {
            return Err(CoreError::invalid(format!(
                "anomaly_sigmas {} must be positive",
                self.anomaly_sigmas
            )));
        }
        if self.profile_levels < 2 {
            return Err(CoreError::invalid("profile_levels must be at least 2"));
        }
        if !self.profile_max_depth_m.is_finite() || self.profile_max_depth_m <= 0.0 {
            return Err(CoreError::invalid("profile_max_depth_m must be positive"));
        }
        Ok(())
    }
}

/// Temperature and salinity against depth for one region
#[derive(Debug, Clone, PartialEq)]
pub struct DepthProfile {
    pub region: Region,
    pub depths: Vec<f64>,
    pub temperature: Vec<f64>,
    pub salinity: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlySample {
    /// First day of the month
    pub month: NaiveDate,
    pub temperature: f64,
    pub salinity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailySample {
    pub day: NaiveDate,
    pub temperature: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSeries {
    pub seed: u64,
    pub profiles: Vec<DepthProfile>,
    pub monthly: Vec<MonthlySample>,
    pub daily: Vec<DailySample>,
}

impl AnalysisSeries {
    pub fn daily_temperatures(&self) -> Vec<f64> {
        self.daily.iter().map(|s| s.temperature).collect()
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisGenerator {
    config: AnalysisConfig,
    seed: u64,
}

impl AnalysisGenerator {
    pub fn new(config: AnalysisConfig, seed: u64) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self { config, seed })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn generate(&self) -> CoreResult<AnalysisSeries> {
        let series = AnalysisSeries {
            seed: self.seed,
            profiles: COMPARED_REGIONS.iter().map(|&r| self.profile(r)).collect(),
            monthly: self.monthly_surface()?,
            daily: self.daily_temperature()?,
        };
        debug!(
            seed = self.seed,
            months = series.monthly.len(),
            days = series.daily.len(),
            "generated analysis series"
        );
        Ok(series)
    }

    /// Model profile for `region` with measurement noise
    pub fn profile(&self, region: Region) -> DepthProfile {
        let mut rng = StdRng::seed_from_u64(self.seed ^ PROFILE_STREAM ^ region as u64);
        let model = ProfileModel::for_region(region);
        let depths = depth_levels(self.config.profile_max_depth_m, self.config.profile_levels);

        let mut temperature = Vec::with_capacity(depths.len());
        let mut salinity = Vec::with_capacity(depths.len());
        for &depth in &depths {
            let t_noise = jitter(&mut rng, PROFILE_TEMPERATURE_NOISE);
            let s_noise = jitter(&mut rng, PROFILE_SALINITY_NOISE);
            temperature.push(model.temperature_at(depth) + t_noise);
            salinity.push(model.salinity_at(depth) + s_noise);
        }

        DepthProfile {
            region,
            depths,
            temperature,
            salinity,
        }
    }

    /// One surface reading per month from January of `first_year` to
    /// December of `last_year`
    pub fn monthly_surface(&self) -> CoreResult<Vec<MonthlySample>> {
        let mut rng = StdRng::seed_from_u64(self.seed ^ MONTHLY_STREAM);
        let temperature = SeasonalCycle::new(26.0, 2.0, 12.0);
        let salinity = SeasonalCycle::new(34.5, 0.3, 12.0).with_phase(FRAC_PI_4);

        let mut samples = Vec::new();
        for year in self.config.first_year..=self.config.last_year {
            for month in 1..=12 {
                let start = first_day(year, month)?;
                let step = samples.len() as f64;
                let t_noise = jitter(&mut rng, SURFACE_TEMPERATURE_NOISE);
                let s_noise = jitter(&mut rng, SURFACE_SALINITY_NOISE);
                samples.push(MonthlySample {
                    month: start,
                    temperature: temperature.value_at(step) + t_noise,
                    salinity: salinity.value_at(step) + s_noise,
                });
            }
        }
        Ok(samples)
    }

    /// One reading per day of `anomaly_year`, `anomaly_spikes` of them
    /// pushed 4 to 6 °C off the seasonal curve
    pub fn daily_temperature(&self) -> CoreResult<Vec<DailySample>> {
        let year = self.config.anomaly_year;
        let start = first_day(year, 1)?;
        let cycle = SeasonalCycle::new(26.0, 2.0, 365.0);

        let mut rng = StdRng::seed_from_u64(self.seed ^ DAILY_STREAM);
        let mut samples: Vec<DailySample> = start
            .iter_days()
            .take_while(|day| day.year() == year)
            .enumerate()
            .map(|(i, day)| {
                let noise = jitter(&mut rng, SURFACE_TEMPERATURE_NOISE);
                DailySample {
                    day,
                    temperature: cycle.value_at(i as f64) + noise,
                }
            })
            .collect();

        let mut spike_rng = StdRng::seed_from_u64(self.seed ^ SPIKE_STREAM);
        let amount = self.config.anomaly_spikes.min(samples.len());
        let picked = index::sample(&mut spike_rng, samples.len(), amount).into_vec();
        for i in picked {
            let magnitude = spike_rng.gen_range(SPIKE_RANGE.0..=SPIKE_RANGE.1);
            let sign = if spike_rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            samples[i].temperature += sign * magnitude;
        }
        Ok(samples)
    }
}

fn first_day(year: i32, month: u32) -> CoreResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| CoreError::invalid(format!("year {year} is out of range")))
}

fn jitter(rng: &mut StdRng, amplitude: f64) -> f64 {
    rng.gen_range(-amplitude..=amplitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(config: AnalysisConfig) -> AnalysisGenerator {
        AnalysisGenerator::new(config, 42).unwrap()
    }

    #[test]
    fn test_series_cover_the_configured_ranges() {
        let series = generator(AnalysisConfig::default()).generate().unwrap();

        assert_eq!(series.profiles.len(), 2);
        assert_eq!(series.profiles[0].region, Region::ArabianSea);
        assert_eq!(series.profiles[1].region, Region::BayOfBengal);
        for profile in &series.profiles {
            assert_eq!(profile.depths.len(), 50);
            assert_eq!(profile.depths[0], 0.0);
            assert_eq!(profile.depths[49], 2000.0);
            assert_eq!(profile.temperature.len(), 50);
            assert_eq!(profile.salinity.len(), 50);
        }

        assert_eq!(series.monthly.len(), 48);
        assert_eq!(series.monthly[0].month, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(series.monthly[47].month, NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());

        assert_eq!(series.daily.len(), 365);
        assert_eq!(series.daily[0].day, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(series.daily[364].day, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }

    #[test]
    fn test_leap_year_has_every_day() {
        let config = AnalysisConfig {
            anomaly_year: 2024,
            ..AnalysisConfig::default()
        };
        let daily = generator(config).daily_temperature().unwrap();
        assert_eq!(daily.len(), 366);
    }

    #[test]
    fn test_same_seed_same_series() {
        let a = generator(AnalysisConfig::default()).generate().unwrap();
        let b = generator(AnalysisConfig::default()).generate().unwrap();
        assert_eq!(a, b);

        let c = AnalysisGenerator::new(AnalysisConfig::default(), 7)
            .unwrap()
            .generate()
            .unwrap();
        assert_ne!(a.daily, c.daily);
        assert_ne!(a.profiles, c.profiles);
    }

    #[test]
    fn test_profiles_stay_near_the_model() {
        let generator = generator(AnalysisConfig::default());
        for region in COMPARED_REGIONS {
            let profile = generator.profile(region);
            let model = ProfileModel::for_region(region);
            for (i, &depth) in profile.depths.iter().enumerate() {
                let dt = (profile.temperature[i] - model.temperature_at(depth)).abs();
                let ds = (profile.salinity[i] - model.salinity_at(depth)).abs();
                assert!(dt <= PROFILE_TEMPERATURE_NOISE + 1e-9, "{region} {depth}m: {dt}");
                assert!(ds <= PROFILE_SALINITY_NOISE + 1e-9, "{region} {depth}m: {ds}");
            }
        }
    }

    #[test]
    fn test_spikes_move_only_the_chosen_days() {
        let quiet = generator(AnalysisConfig {
            anomaly_spikes: 0,
            ..AnalysisConfig::default()
        })
        .daily_temperature()
        .unwrap();
        let spiked = generator(AnalysisConfig::default()).daily_temperature().unwrap();

        let moved: Vec<f64> = quiet
            .iter()
            .zip(&spiked)
            .map(|(a, b)| (b.temperature - a.temperature).abs())
            .filter(|d| *d > 0.0)
            .collect();
        assert_eq!(moved.len(), 20);
        assert!(moved.iter().all(|d| *d >= SPIKE_RANGE.0 - 1e-9 && *d <= SPIKE_RANGE.1 + 1e-9));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let reversed = AnalysisConfig {
            first_year: 2024,
            last_year: 2020,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            AnalysisGenerator::new(reversed, 1),
            Err(CoreError::InvalidInput(_))
        ));

        let flat_band = AnalysisConfig {
            anomaly_sigmas: 0.0,
            ..AnalysisConfig::default()
        };
        assert!(AnalysisGenerator::new(flat_band, 1).is_err());

        let single_level = AnalysisConfig {
            profile_levels: 1,
            ..AnalysisConfig::default()
        };
        assert!(AnalysisGenerator::new(single_level, 1).is_err());
    }
}
