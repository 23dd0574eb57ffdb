//! Idealised depth profiles and seasonal cycles used by the analysis views

use std::f64::consts::TAU;

use crate::model::Region;

/// `count` evenly spaced depths from the surface down to `max_depth_m`, inclusive
pub fn depth_levels(max_depth_m: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            let last = (count - 1) as f64;
            (0..count).map(|i| max_depth_m * i as f64 / last).collect()
        }
    }
}

/// Temperature decaying exponentially towards a deep value, salinity rising
/// linearly with depth
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileModel {
    /// Surface excess over the deep temperature, °C
    pub thermocline_amplitude: f64,

    /// e-folding depth of the thermocline, m
    pub decay_depth_m: f64,

    pub deep_temperature: f64,
    pub surface_salinity: f64,

    /// PSU gained per 1000 m
    pub salinity_gradient: f64,
}

impl ProfileModel {
    pub fn for_region(region: Region) -> Self {
        match region {
            Region::ArabianSea => Self {
                thermocline_amplitude: 28.0,
                decay_depth_m: 800.0,
                deep_temperature: 3.0,
                surface_salinity: 35.2,
                salinity_gradient: 0.3,
            },
            // Fresh river-fed surface layer
            Region::BayOfBengal => Self {
                thermocline_amplitude: 29.0,
                decay_depth_m: 900.0,
                deep_temperature: 2.5,
                surface_salinity: 34.0,
                salinity_gradient: 0.8,
            },
            Region::SouthernOcean | Region::ArcticOcean => Self {
                thermocline_amplitude: 4.0,
                decay_depth_m: 500.0,
                deep_temperature: 0.5,
                surface_salinity: 33.9,
                salinity_gradient: 0.8,
            },
            Region::IndianOcean | Region::PacificOcean | Region::AtlanticOcean => Self {
                thermocline_amplitude: 24.0,
                decay_depth_m: 850.0,
                deep_temperature: 3.0,
                surface_salinity: 34.8,
                salinity_gradient: 0.2,
            },
        }
    }

    pub fn temperature_at(&self, depth_m: f64) -> f64 {
        let decay = (-depth_m.max(0.0) / self.decay_depth_m).exp();
        self.thermocline_amplitude * decay + self.deep_temperature
    }

    pub fn salinity_at(&self, depth_m: f64) -> f64 {
        self.surface_salinity + self.salinity_gradient * depth_m.max(0.0) / 1000.0
    }
}

/// Sinusoidal annual cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonalCycle {
    pub mean: f64,
    pub amplitude: f64,

    /// Samples per full cycle
    pub period: f64,

    /// Phase offset in radians
    pub phase: f64,
}

impl SeasonalCycle {
    pub fn new(mean: f64, amplitude: f64, period: f64) -> Self {
        Self {
            mean,
            amplitude,
            period,
            phase: 0.0,
        }
    }

    pub fn with_phase(mut self, phase: f64) -> Self {
        self.phase = phase;
        self
    }

    /// Value at sample `step`; a non-positive period yields the mean
    pub fn value_at(&self, step: f64) -> f64 {
        if self.period <= 0.0 {
            return self.mean;
        }
        self.mean + self.amplitude * (TAU * step / self.period + self.phase).sin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_depth_levels() {
        let levels = depth_levels(2000.0, 5);
        assert_eq!(levels, vec![0.0, 500.0, 1000.0, 1500.0, 2000.0]);
        assert!(depth_levels(2000.0, 0).is_empty());
        assert_eq!(depth_levels(2000.0, 1), vec![0.0]);
    }

    #[test]
    fn test_profile_cools_and_salts_with_depth() {
        let arabian = ProfileModel::for_region(Region::ArabianSea);
        assert!(close(arabian.temperature_at(0.0), 31.0));
        assert!(close(arabian.temperature_at(800.0), 28.0 / std::f64::consts::E + 3.0));
        assert!(close(arabian.salinity_at(2000.0), 35.8));

        for region in Region::ALL {
            let model = ProfileModel::for_region(region);
            assert!(model.temperature_at(0.0) > model.temperature_at(1000.0));
            assert!(model.salinity_at(0.0) < model.salinity_at(1000.0));
        }
    }

    #[test]
    fn test_bay_of_bengal_is_fresher_than_arabian_sea() {
        let bay = ProfileModel::for_region(Region::BayOfBengal);
        let arabian = ProfileModel::for_region(Region::ArabianSea);
        assert!(bay.salinity_at(0.0) < arabian.salinity_at(0.0));
    }

    #[test]
    fn test_seasonal_cycle() {
        let cycle = SeasonalCycle::new(26.0, 2.0, 12.0);
        assert!(close(cycle.value_at(0.0), 26.0));
        assert!(close(cycle.value_at(3.0), 28.0));
        assert!(close(cycle.value_at(9.0), 24.0));
        assert!(close(cycle.value_at(12.0), 26.0));

        let shifted = cycle.with_phase(std::f64::consts::FRAC_PI_2);
        assert!(close(shifted.value_at(0.0), 28.0));

        let flat = SeasonalCycle::new(34.5, 0.3, 0.0);
        assert_eq!(flat.value_at(5.0), 34.5);
    }
}
