//! Float data model
//!
//! A [`FloatRecord`] is created once (at startup or on regenerate) and is read
//! only afterwards. Records are shared between the store and the renderers as
//! `Arc<FloatRecord>`.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// Unique identifier for a float within a dataset snapshot
pub type FloatId = String;

/// Ocean basins a float can be attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Region {
    IndianOcean,
    ArabianSea,
    BayOfBengal,
    PacificOcean,
    AtlanticOcean,
    SouthernOcean,
    ArcticOcean,
}

impl Region {
    pub const ALL: [Region; 7] = [
        Region::IndianOcean,
        Region::ArabianSea,
        Region::BayOfBengal,
        Region::PacificOcean,
        Region::AtlanticOcean,
        Region::SouthernOcean,
        Region::ArcticOcean,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Region::IndianOcean => "Indian Ocean",
            Region::ArabianSea => "Arabian Sea",
            Region::BayOfBengal => "Bay of Bengal",
            Region::PacificOcean => "Pacific Ocean",
            Region::AtlanticOcean => "Atlantic Ocean",
            Region::SouthernOcean => "Southern Ocean",
            Region::ArcticOcean => "Arctic Ocean",
        }
    }

    /// Assign a basin from coordinates.
    ///
    /// Polar bands win over longitude bands; the two Indian Ocean sub-basins
    /// are checked before the Indian Ocean itself.
    pub fn classify(position: GeoPosition) -> Region {
        let lat = position.lat();
        let lon = if position.lon() < 0.0 { position.lon() + 360.0 } else { position.lon() };

        if lat < -60.0 {
            return Region::SouthernOcean;
        }
        if lat > 66.0 {
            return Region::ArcticOcean;
        }
        if (5.0..=25.0).contains(&lat) && (50.0..=78.0).contains(&lon) {
            return Region::ArabianSea;
        }
        if (5.0..=23.0).contains(&lat) && (80.0..=95.0).contains(&lon) {
            return Region::BayOfBengal;
        }
        if (-60.0..=30.0).contains(&lat) && (20.0..=120.0).contains(&lon) {
            return Region::IndianOcean;
        }
        if (120.0..=290.0).contains(&lon) {
            return Region::PacificOcean;
        }
        Region::AtlanticOcean
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Region {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Region::ALL
            .into_iter()
            .find(|region| region.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CoreError::invalid(format!("unknown region '{wanted}'")))
    }
}

/// Data quality rating reported by a float
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    High,
    Medium,
    Low,
}

impl Quality {
    pub const ALL: [Quality; 3] = [Quality::High, Quality::Medium, Quality::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Quality::High => "high",
            Quality::Medium => "medium",
            Quality::Low => "low",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Quality::High),
            "medium" => Ok(Quality::Medium),
            "low" => Ok(Quality::Low),
            other => Err(CoreError::invalid(format!("unknown quality '{other}'"))),
        }
    }
}

/// Operational status, independent from [`Quality`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    Inactive,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Inactive => "inactive",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Status::Active),
            "inactive" => Ok(Status::Inactive),
            other => Err(CoreError::invalid(format!("unknown status '{other}'"))),
        }
    }
}

/// Measured parameter names
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parameter {
    Temperature,
    Salinity,
    Pressure,
    Oxygen,
}

impl Parameter {
    pub const ALL: [Parameter; 4] = [
        Parameter::Temperature,
        Parameter::Salinity,
        Parameter::Pressure,
        Parameter::Oxygen,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Parameter::Temperature => "temperature",
            Parameter::Salinity => "salinity",
            Parameter::Pressure => "pressure",
            Parameter::Oxygen => "oxygen",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Parameter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Parameter::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CoreError::invalid(format!("unknown parameter '{wanted}'")))
    }
}

/// A latitude/longitude pair in degrees, always within range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPosition")]
pub struct GeoPosition {
    lat: f64,
    lon: f64,
}

impl GeoPosition {
    /// Create a validated position (lat in [-90, 90], lon in [-180, 180])
    pub fn new(lat: f64, lon: f64) -> CoreResult<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(CoreError::invalid(format!("latitude {lat} out of range")));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(CoreError::invalid(format!("longitude {lon} out of range")));
        }
        Ok(Self { lat, lon })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }
}

/// Unchecked wire form, validated on the way in
#[derive(Deserialize)]
struct RawPosition {
    lat: f64,
    lon: f64,
}

impl TryFrom<RawPosition> for GeoPosition {
    type Error = CoreError;

    fn try_from(raw: RawPosition) -> CoreResult<Self> {
        GeoPosition::new(raw.lat, raw.lon)
    }
}

/// Physical readings from the latest profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    /// Temperature in °C
    pub temperature_c: f64,

    /// Salinity in PSU
    pub salinity_psu: f64,

    /// Pressure in dbar (≈ depth in metres)
    pub pressure_dbar: f64,

    /// Dissolved oxygen in µmol/kg, only for BGC floats
    pub oxygen_umol_kg: Option<f64>,
}

impl Measurements {
    /// Approximate depth in metres; 1 dbar is close enough to 1 m for display
    pub fn depth_m(&self) -> f64 {
        self.pressure_dbar
    }
}

/// One ARGO float
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatRecord {
    pub id: FloatId,

    /// WMO platform number
    pub platform_number: String,

    /// Profile cycle counter
    pub cycle_number: u32,

    pub position: GeoPosition,
    pub region: Region,
    pub country: Option<String>,
    pub measurements: Measurements,
    pub quality: Quality,
    pub status: Status,
    pub last_update: DateTime<Utc>,
    pub parameters: BTreeSet<Parameter>,
}

impl FloatRecord {
    pub fn year(&self) -> i32 {
        self.last_update.year()
    }

    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }

    pub fn measures(&self, parameter: Parameter) -> bool {
        self.parameters.contains(&parameter)
    }

    /// Multi-line text shown by every renderer on hover or in a popup
    pub fn tooltip_text(&self) -> String {
        let mut text = format!(
            "Float {} ({})\n{} · {:.2}°, {:.2}°\nTemp {:.1}°C · Sal {:.2} PSU · {:.0} dbar",
            self.id,
            self.platform_number,
            self.region,
            self.position.lat(),
            self.position.lon(),
            self.measurements.temperature_c,
            self.measurements.salinity_psu,
            self.measurements.pressure_dbar,
        );
        if let Some(oxygen) = self.measurements.oxygen_umol_kg {
            text.push_str(&format!(" · O₂ {oxygen:.0} µmol/kg"));
        }
        if let Some(country) = &self.country {
            text.push_str(&format!("\n{country}"));
        }
        text.push_str(&format!(
            "\n{} · {} quality · updated {}",
            self.status,
            self.quality,
            self.last_update.format("%Y-%m-%d"),
        ));
        text
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    /// Build a record with predictable fields for tests
    pub fn record(id: &str, region: Region, quality: Quality) -> FloatRecord {
        FloatRecord {
            id: id.to_string(),
            platform_number: format!("29{:05}", id.trim_start_matches('f').parse::<u32>().unwrap_or(0)),
            cycle_number: 1,
            position: GeoPosition::new(-10.0, 75.0).unwrap(),
            region,
            country: Some("India".to_string()),
            measurements: Measurements {
                temperature_c: 26.5,
                salinity_psu: 34.8,
                pressure_dbar: 1000.0,
                oxygen_umol_kg: None,
            },
            quality,
            status: Status::Active,
            last_update: Utc.with_ymd_and_hms(2023, 8, 15, 0, 0, 0).unwrap(),
            parameters: [Parameter::Temperature, Parameter::Salinity, Parameter::Pressure]
                .into_iter()
                .collect(),
        }
    }

    /// Fifteen Indian Ocean floats `f0..f14`; f0, f3, f6, f9 and f12 are high quality
    pub fn indian_ocean_fifteen() -> Vec<FloatRecord> {
        (0..15)
            .map(|i| {
                let quality = match i % 3 {
                    0 => Quality::High,
                    1 => Quality::Medium,
                    _ => Quality::Low,
                };
                record(&format!("f{i}"), Region::IndianOcean, quality)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_round_trips_through_name() {
        for region in Region::ALL {
            assert_eq!(region.name().parse::<Region>().unwrap(), region);
        }
        assert_eq!("indian ocean".parse::<Region>().unwrap(), Region::IndianOcean);
        assert!(matches!("Mars Sea".parse::<Region>(), Err(CoreError::InvalidInput(_))));
    }

    #[test]
    fn test_record_json_round_trip_checks_position() {
        let record = fixtures::record("f4", Region::ArabianSea, Quality::Medium);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["quality"], "medium");
        assert_eq!(json["status"], "active");
        assert_eq!(json["position"]["lon"], 75.0);

        let back: FloatRecord = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(back, record);

        let mut outside = json;
        outside["position"]["lat"] = serde_json::json!(120.0);
        assert!(serde_json::from_value::<FloatRecord>(outside).is_err());
    }

    #[test]
    fn test_region_classification() {
        let at = |lat, lon| Region::classify(GeoPosition::new(lat, lon).unwrap());
        assert_eq!(at(-70.0, 10.0), Region::SouthernOcean);
        assert_eq!(at(75.0, -30.0), Region::ArcticOcean);
        assert_eq!(at(15.0, 65.0), Region::ArabianSea);
        assert_eq!(at(15.0, 88.0), Region::BayOfBengal);
        assert_eq!(at(-20.0, 80.0), Region::IndianOcean);
        assert_eq!(at(0.0, -140.0), Region::PacificOcean);
        assert_eq!(at(30.0, -40.0), Region::AtlanticOcean);
    }

    #[test]
    fn test_position_validation() {
        assert!(GeoPosition::new(90.0, 180.0).is_ok());
        assert!(GeoPosition::new(90.5, 0.0).is_err());
        assert!(GeoPosition::new(0.0, -181.0).is_err());
        assert!(GeoPosition::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_enum_parsing_is_case_insensitive() {
        assert_eq!("HIGH".parse::<Quality>().unwrap(), Quality::High);
        assert_eq!(" inactive ".parse::<Status>().unwrap(), Status::Inactive);
        assert_eq!("Oxygen".parse::<Parameter>().unwrap(), Parameter::Oxygen);
        assert!("excellent".parse::<Quality>().is_err());
    }

    #[test]
    fn test_tooltip_mentions_identity_and_readings() {
        let record = fixtures::record("f3", Region::IndianOcean, Quality::High);
        let text = record.tooltip_text();
        assert!(text.contains("Float f3"));
        assert!(text.contains("Indian Ocean"));
        assert!(text.contains("high quality"));
        assert!(text.contains("2023-08-15"));
    }
}
