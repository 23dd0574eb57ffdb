//! Filter predicates over float records

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::{FloatRecord, Parameter, Quality, Region, Status};
use crate::{CoreError, CoreResult};

/// Control value meaning "no constraint"
pub const ANY: &str = "all";

/// Earliest year an ARGO profile can carry
const FIRST_ARGO_YEAR: i32 = 1999;

/// Optional equality/membership predicates; every `None` (or empty set) field
/// matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub region: Option<Region>,
    pub country: Option<String>,
    pub year: Option<i32>,
    pub quality: Option<Quality>,
    pub status: Option<Status>,

    /// A record matches when it measures every listed parameter
    pub parameters: BTreeSet<Parameter>,
}

impl FilterCriteria {
    /// Criteria that match every record
    pub fn match_all() -> Self {
        Self::default()
    }

    pub fn is_match_all(&self) -> bool {
        *self == Self::default()
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.insert(parameter);
        self
    }

    /// True iff every non-default field is satisfied by `record`
    pub fn matches(&self, record: &FloatRecord) -> bool {
        self.region.map_or(true, |r| record.region == r)
            && self
                .country
                .as_deref()
                .map_or(true, |c| record.country.as_deref() == Some(c))
            && self.year.map_or(true, |y| record.year() == y)
            && self.quality.map_or(true, |q| record.quality == q)
            && self.status.map_or(true, |s| record.status == s)
            && self.parameters.iter().all(|p| record.measures(*p))
    }

    /// Short human readable description for status bars
    pub fn describe(&self) -> String {
        if self.is_match_all() {
            return "all floats".to_string();
        }

        let mut parts = Vec::new();
        if let Some(region) = self.region {
            parts.push(region.name().to_string());
        }
        if let Some(country) = &self.country {
            parts.push(country.clone());
        }
        if let Some(year) = self.year {
            parts.push(year.to_string());
        }
        if let Some(quality) = self.quality {
            parts.push(format!("{quality} quality"));
        }
        if let Some(status) = self.status {
            parts.push(status.to_string());
        }
        if !self.parameters.is_empty() {
            let names: Vec<&str> = self.parameters.iter().map(|p| p.as_str()).collect();
            parts.push(format!("measuring {}", names.join("+")));
        }
        parts.join(", ")
    }
}

/// Raw values of the filter controls, as the UI holds them.
///
/// Every field uses [`ANY`] (or an empty string) for "no constraint".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterControls {
    pub region: String,
    pub country: String,
    pub year: String,
    pub quality: String,
    pub status: String,
    pub parameters: Vec<String>,
}

impl Default for FilterControls {
    fn default() -> Self {
        Self {
            region: ANY.to_string(),
            country: ANY.to_string(),
            year: ANY.to_string(),
            quality: ANY.to_string(),
            status: ANY.to_string(),
            parameters: Vec::new(),
        }
    }
}

fn is_unconstrained(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case(ANY) || value.eq_ignore_ascii_case("all regions")
}

fn parse_optional<T>(value: &str, parse: impl FnOnce(&str) -> CoreResult<T>) -> CoreResult<Option<T>> {
    if is_unconstrained(value) {
        Ok(None)
    } else {
        parse(value).map(Some)
    }
}

impl FilterControls {
    /// Build criteria from control values, rejecting malformed values
    pub fn to_criteria(&self) -> CoreResult<FilterCriteria> {
        let year = parse_optional(&self.year, |v| {
            let year: i32 = v
                .trim()
                .parse()
                .map_err(|_| CoreError::invalid(format!("year '{v}' is not a number")))?;
            if year < FIRST_ARGO_YEAR || year > 2100 {
                return Err(CoreError::invalid(format!("year {year} outside {FIRST_ARGO_YEAR}..=2100")));
            }
            Ok(year)
        })?;

        let parameters = self
            .parameters
            .iter()
            .filter(|p| !is_unconstrained(p))
            .map(|p| p.parse::<Parameter>())
            .collect::<CoreResult<BTreeSet<_>>>()?;

        Ok(FilterCriteria {
            region: parse_optional(&self.region, |v| v.parse())?,
            country: parse_optional(&self.country, |v| Ok(v.trim().to_string()))?,
            year,
            quality: parse_optional(&self.quality, |v| v.parse())?,
            status: parse_optional(&self.status, |v| v.parse())?,
            parameters,
        })
    }

    /// Control values that display `criteria`
    pub fn from_criteria(criteria: &FilterCriteria) -> Self {
        let or_any = |value: Option<String>| value.unwrap_or_else(|| ANY.to_string());
        Self {
            region: or_any(criteria.region.map(|r| r.name().to_string())),
            country: or_any(criteria.country.clone()),
            year: or_any(criteria.year.map(|y| y.to_string())),
            quality: or_any(criteria.quality.map(|q| q.as_str().to_string())),
            status: or_any(criteria.status.map(|s| s.as_str().to_string())),
            parameters: criteria.parameters.iter().map(|p| p.as_str().to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::record;

    #[test]
    fn test_default_matches_everything() {
        let criteria = FilterCriteria::match_all();
        assert!(criteria.is_match_all());
        assert!(criteria.matches(&record("f1", Region::PacificOcean, Quality::Low)));
    }

    #[test]
    fn test_every_field_must_hold() {
        let mut inactive = record("f2", Region::IndianOcean, Quality::High);
        inactive.status = Status::Inactive;

        let criteria = FilterCriteria::match_all()
            .with_region(Region::IndianOcean)
            .with_quality(Quality::High);
        assert!(criteria.matches(&inactive));
        assert!(!criteria.clone().with_status(Status::Active).matches(&inactive));
        assert!(!criteria.clone().with_year(2020).matches(&inactive));
        assert!(criteria.clone().with_year(2023).matches(&inactive));
        assert!(!criteria.clone().with_country("Japan").matches(&inactive));
    }

    #[test]
    fn test_parameter_membership() {
        let mut bgc = record("f4", Region::ArabianSea, Quality::Medium);
        let plain = bgc.clone();
        bgc.parameters.insert(Parameter::Oxygen);

        let criteria = FilterCriteria::match_all().with_parameter(Parameter::Oxygen);
        assert!(criteria.matches(&bgc));
        assert!(!criteria.matches(&plain));
    }

    #[test]
    fn test_controls_parse_into_criteria() {
        let controls = FilterControls {
            region: "Indian Ocean".to_string(),
            quality: "high".to_string(),
            year: "2023".to_string(),
            parameters: vec!["oxygen".to_string()],
            ..FilterControls::default()
        };
        let criteria = controls.to_criteria().unwrap();
        assert_eq!(criteria.region, Some(Region::IndianOcean));
        assert_eq!(criteria.quality, Some(Quality::High));
        assert_eq!(criteria.year, Some(2023));
        assert!(criteria.country.is_none());
        assert!(criteria.parameters.contains(&Parameter::Oxygen));

        assert_eq!(FilterControls::from_criteria(&criteria).to_criteria().unwrap(), criteria);
    }

    #[test]
    fn test_all_regions_sentinel_is_unconstrained() {
        let controls = FilterControls {
            region: "All Regions".to_string(),
            ..FilterControls::default()
        };
        assert!(controls.to_criteria().unwrap().is_match_all());
    }

    #[test]
    fn test_malformed_controls_are_rejected() {
        let bad_year = FilterControls { year: "twenty".to_string(), ..FilterControls::default() };
        assert!(matches!(bad_year.to_criteria(), Err(CoreError::InvalidInput(_))));

        let old_year = FilterControls { year: "1980".to_string(), ..FilterControls::default() };
        assert!(old_year.to_criteria().is_err());

        let bad_quality = FilterControls { quality: "superb".to_string(), ..FilterControls::default() };
        assert!(bad_quality.to_criteria().is_err());
    }

    #[test]
    fn test_describe() {
        assert_eq!(FilterCriteria::match_all().describe(), "all floats");
        let described = FilterCriteria::match_all()
            .with_region(Region::BayOfBengal)
            .with_quality(Quality::Low)
            .describe();
        assert_eq!(described, "Bay of Bengal, low quality");
    }
}
