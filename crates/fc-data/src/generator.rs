//! Synthetic ARGO float generator
//!
//! Produces a deterministic dataset for a given seed: the same
//! configuration always yields the same records.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use fc_core::{
    CoreError, CoreResult, FloatRecord, GeoPosition, Measurements, Parameter, Quality, Region,
    Status,
};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

const COUNTRIES: [&str; 8] = [
    "India",
    "USA",
    "France",
    "Japan",
    "Australia",
    "China",
    "UK",
    "Germany",
];

/// Probability that a float carries no country attribution
const UNATTRIBUTED_PROBABILITY: f64 = 0.1;

const SECONDS_PER_YEAR: f64 = 365.25 * 86_400.0;

/// Bounding box a float can be placed in
#[derive(Debug, Clone, PartialEq)]
pub struct RegionBounds {
    pub region: Region,
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,

    /// Relative share of floats placed in this box
    pub weight: f64,
}

impl RegionBounds {
    pub fn new(region: Region, lat: (f64, f64), lon: (f64, f64), weight: f64) -> Self {
        Self {
            region,
            lat_min: lat.0,
            lat_max: lat.1,
            lon_min: lon.0,
            lon_max: lon.1,
            weight,
        }
    }

    fn validate(&self) -> CoreResult<()> {
        let lat_ok = (-90.0..=90.0).contains(&self.lat_min)
            && (-90.0..=90.0).contains(&self.lat_max)
            && self.lat_min <= self.lat_max;
        let lon_ok = (-180.0..=180.0).contains(&self.lon_min)
            && (-180.0..=180.0).contains(&self.lon_max)
            && self.lon_min <= self.lon_max;
        if !lat_ok || !lon_ok {
            return Err(CoreError::invalid(format!(
                "bad bounding box for {}: lat {}..{}, lon {}..{}",
                self.region, self.lat_min, self.lat_max, self.lon_min, self.lon_max
            )));
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(CoreError::invalid(format!(
                "weight for {} must be a non-negative number",
                self.region
            )));
        }
        Ok(())
    }

    /// Boxes for the basins the explorer knows about.
    ///
    /// The Pacific straddles the antimeridian, so it is split in two.
    pub fn defaults() -> Vec<RegionBounds> {
        vec![
            RegionBounds::new(Region::IndianOcean, (-40.0, 0.0), (40.0, 110.0), 3.0),
            RegionBounds::new(Region::ArabianSea, (8.0, 24.0), (52.0, 74.0), 1.5),
            RegionBounds::new(Region::BayOfBengal, (6.0, 21.0), (81.0, 94.0), 1.5),
            RegionBounds::new(Region::PacificOcean, (-40.0, 45.0), (130.0, 180.0), 1.0),
            RegionBounds::new(Region::PacificOcean, (-40.0, 45.0), (-180.0, -80.0), 1.0),
            RegionBounds::new(Region::AtlanticOcean, (-40.0, 55.0), (-50.0, -15.0), 1.5),
            RegionBounds::new(Region::SouthernOcean, (-70.0, -61.0), (-180.0, 180.0), 0.7),
            RegionBounds::new(Region::ArcticOcean, (70.0, 84.0), (-180.0, 180.0), 0.3),
        ]
    }
}

/// Generator settings
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub seed: u64,
    pub regions: Vec<RegionBounds>,

    /// Chance that a float is active (at least 0.9)
    pub active_probability: f64,

    /// Chance that a float also measures dissolved oxygen
    pub oxygen_probability: f64,

    /// `last_update` values fall within `history_years` before this instant
    pub reference_time: DateTime<Utc>,
    pub history_years: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            regions: RegionBounds::defaults(),
            active_probability: 0.92,
            oxygen_probability: 0.25,
            reference_time: Utc
                .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or_default(),
            history_years: 5,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.regions.is_empty() {
            return Err(CoreError::invalid("region set is empty"));
        }
        for bounds in &self.regions {
            bounds.validate()?;
        }
        if !(0.9..=1.0).contains(&self.active_probability) {
            return Err(CoreError::invalid(format!(
                "active probability {} must lie in [0.9, 1.0]",
                self.active_probability
            )));
        }
        if !(0.0..=1.0).contains(&self.oxygen_probability) {
            return Err(CoreError::invalid(format!(
                "oxygen probability {} must lie in [0, 1]",
                self.oxygen_probability
            )));
        }
        Ok(())
    }
}

/// Seeded float generator
#[derive(Debug, Clone)]
pub struct FloatGenerator {
    config: GeneratorConfig,
    weights: WeightedIndex<f64>,
}

impl FloatGenerator {
    pub fn new(config: GeneratorConfig) -> CoreResult<Self> {
        config.validate()?;
        let weights = WeightedIndex::new(config.regions.iter().map(|b| b.weight))
            .map_err(|e| CoreError::invalid(format!("region weights: {e}")))?;
        Ok(Self { config, weights })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Same generator with another seed, used by "regenerate"
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Produce `count` records with ids `f0..f{count-1}`
    pub fn generate(&self, count: i64) -> CoreResult<Vec<FloatRecord>> {
        if count < 0 {
            return Err(CoreError::invalid(format!("float count {count} is negative")));
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let records = (0..count as usize)
            .map(|i| self.generate_one(&mut rng, i))
            .collect::<CoreResult<Vec<_>>>()?;

        debug!(count = records.len(), seed = self.config.seed, "generated floats");
        Ok(records)
    }

    fn generate_one(&self, rng: &mut StdRng, index: usize) -> CoreResult<FloatRecord> {
        let bounds = &self.config.regions[self.weights.sample(rng)];
        let lat = rng.gen_range(bounds.lat_min..=bounds.lat_max);
        let lon = rng.gen_range(bounds.lon_min..=bounds.lon_max);
        let position = GeoPosition::new(lat, lon)?;

        let quality = Quality::ALL[rng.gen_range(0..Quality::ALL.len())];
        let status = if rng.gen_bool(self.config.active_probability) {
            Status::Active
        } else {
            Status::Inactive
        };

        let measurements = Measurements {
            temperature_c: surface_temperature(rng, lat),
            salinity_psu: salinity(rng, bounds.region),
            pressure_dbar: rng.gen_range(0.0..=2500.0),
            oxygen_umol_kg: rng
                .gen_bool(self.config.oxygen_probability)
                .then(|| rng.gen_range(150.0..=320.0)),
        };

        let mut parameters: BTreeSet<Parameter> =
            [Parameter::Temperature, Parameter::Salinity, Parameter::Pressure].into();
        if measurements.oxygen_umol_kg.is_some() {
            parameters.insert(Parameter::Oxygen);
        }

        let country = (!rng.gen_bool(UNATTRIBUTED_PROBABILITY))
            .then(|| COUNTRIES[rng.gen_range(0..COUNTRIES.len())].to_string());

        let history = f64::from(self.config.history_years) * SECONDS_PER_YEAR;
        let age = rng.gen_range(0.0..=history) as i64;
        let last_update = self.config.reference_time - ChronoDuration::seconds(age);

        Ok(FloatRecord {
            id: format!("f{index}"),
            platform_number: format!("29{index:05}"),
            cycle_number: rng.gen_range(1..=300),
            position,
            region: bounds.region,
            country,
            measurements,
            quality,
            status,
            last_update,
            parameters,
        })
    }
}

/// Warm at the equator, near freezing at the poles
fn surface_temperature(rng: &mut StdRng, lat: f64) -> f64 {
    let base = 29.0 - 0.38 * lat.abs();
    (base + rng.gen_range(-2.5..=2.5)).clamp(-2.0, 32.0)
}

/// River runoff freshens the Bay of Bengal; evaporation salts the Arabian Sea
fn salinity(rng: &mut StdRng, region: Region) -> f64 {
    let value: f64 = match region {
        Region::BayOfBengal => rng.gen_range(30.0..=34.0),
        Region::ArabianSea => rng.gen_range(35.5..=36.0),
        Region::ArcticOcean => rng.gen_range(30.0..=34.5),
        _ => rng.gen_range(33.5..=35.8),
    };
    value.clamp(30.0, 36.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::AHashSet;

    fn generator() -> FloatGenerator {
        FloatGenerator::new(GeneratorConfig::default()).unwrap()
    }

    #[test]
    fn test_ids_are_unique() {
        let records = generator().generate(500).unwrap();
        let ids: AHashSet<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), 500);
        assert_eq!(records[0].id, "f0");
        assert_eq!(records[499].id, "f499");
    }

    #[test]
    fn test_same_seed_same_dataset() {
        let a = generator().generate(50).unwrap();
        let b = generator().generate(50).unwrap();
        assert_eq!(a, b);

        let c = generator().with_seed(7).generate(50).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_values_stay_in_physical_ranges() {
        let config = GeneratorConfig::default();
        let earliest = config.reference_time - ChronoDuration::days(5 * 366);
        let records = FloatGenerator::new(config.clone()).unwrap().generate(400).unwrap();

        for r in &records {
            let m = &r.measurements;
            assert!((-2.0..=32.0).contains(&m.temperature_c), "{}", m.temperature_c);
            assert!((30.0..=36.0).contains(&m.salinity_psu));
            assert!((0.0..=2500.0).contains(&m.pressure_dbar));
            assert_eq!(m.oxygen_umol_kg.is_some(), r.measures(Parameter::Oxygen));
            if let Some(o2) = m.oxygen_umol_kg {
                assert!((150.0..=320.0).contains(&o2));
            }
            assert!(r.last_update <= config.reference_time);
            assert!(r.last_update >= earliest);
            assert!(config
                .regions
                .iter()
                .any(|b| b.region == r.region
                    && (b.lat_min..=b.lat_max).contains(&r.position.lat())
                    && (b.lon_min..=b.lon_max).contains(&r.position.lon())));
        }

        let active = records.iter().filter(|r| r.is_active()).count();
        assert!(active as f64 / records.len() as f64 > 0.8);
    }

    #[test]
    fn test_negative_count_is_invalid() {
        let result = generator().generate(-1);
        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
        assert!(generator().generate(0).unwrap().is_empty());
    }

    #[test]
    fn test_empty_region_set_is_invalid() {
        let config = GeneratorConfig {
            regions: Vec::new(),
            ..GeneratorConfig::default()
        };
        assert!(matches!(FloatGenerator::new(config), Err(CoreError::InvalidInput(_))));
    }

    #[test]
    fn test_bad_bounds_and_probabilities_are_invalid() {
        let inverted = GeneratorConfig {
            regions: vec![RegionBounds::new(Region::IndianOcean, (10.0, -10.0), (40.0, 80.0), 1.0)],
            ..GeneratorConfig::default()
        };
        assert!(FloatGenerator::new(inverted).is_err());

        let zero_weights = GeneratorConfig {
            regions: vec![RegionBounds::new(Region::IndianOcean, (-10.0, 10.0), (40.0, 80.0), 0.0)],
            ..GeneratorConfig::default()
        };
        assert!(FloatGenerator::new(zero_weights).is_err());

        let mostly_dead = GeneratorConfig {
            active_probability: 0.5,
            ..GeneratorConfig::default()
        };
        assert!(FloatGenerator::new(mostly_dead).is_err());
    }

    #[test]
    fn test_single_region_dataset() {
        let config = GeneratorConfig {
            regions: vec![RegionBounds::new(Region::IndianOcean, (-20.0, -5.0), (60.0, 90.0), 1.0)],
            ..GeneratorConfig::default()
        };
        let records = FloatGenerator::new(config).unwrap().generate(15).unwrap();
        assert!(records.iter().all(|r| r.region == Region::IndianOcean));
    }
}
