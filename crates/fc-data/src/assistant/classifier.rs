//! Keyword-based intent classification

use std::fmt;
use std::str::FromStr;

use fc_core::{CoreError, Region};
use serde::{Deserialize, Serialize};

/// What the user is asking about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Temperature,
    Salinity,
    Location,
    Time,
    Comparison,
    Anomaly,
    Depth,
    General,
}

impl Intent {
    /// Scored intents, in tie-break order
    const SCORED: [Intent; 7] = [
        Intent::Temperature,
        Intent::Salinity,
        Intent::Location,
        Intent::Time,
        Intent::Comparison,
        Intent::Anomaly,
        Intent::Depth,
    ];

    fn keywords(self) -> &'static [&'static str] {
        match self {
            Intent::Temperature => &[
                "temperature", "temp", "warm", "cold", "heat", "thermal", "°c", "celsius",
                "warming", "cooling",
            ],
            Intent::Salinity => &[
                "salinity", "salt", "fresh", "brackish", "psu", "conductivity", "density",
            ],
            Intent::Location => &[
                "near", "location", "where", "find", "float", "coordinates", "latitude",
                "longitude", "region",
            ],
            Intent::Time => &[
                "when", "time", "date", "year", "month", "recent", "latest", "historical", "trend",
            ],
            Intent::Comparison => &[
                "compare", "versus", " vs", "difference", "between", "contrast", "relative", "ratio",
            ],
            Intent::Anomaly => &[
                "anomaly", "unusual", "extreme", "outlier", "abnormal", "deviation", "exceptional",
            ],
            Intent::Depth => &[
                "depth", "deep", "surface", "bottom", "layer", "profile", "vertical", "column",
            ],
            Intent::General => &[],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Temperature => "temperature",
            Intent::Salinity => "salinity",
            Intent::Location => "location",
            Intent::Time => "time",
            Intent::Comparison => "comparison",
            Intent::Anomaly => "anomaly",
            Intent::Depth => "depth",
            Intent::General => "general",
        }
    }
}

/// Audience the assistant writes for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserMode {
    #[default]
    Scientist,
    Student,
    Fisherman,
}

impl UserMode {
    pub const ALL: [UserMode; 3] = [UserMode::Scientist, UserMode::Student, UserMode::Fisherman];

    pub fn as_str(self) -> &'static str {
        match self {
            UserMode::Scientist => "scientist",
            UserMode::Student => "student",
            UserMode::Fisherman => "fisherman",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UserMode::Scientist => "Scientist",
            UserMode::Student => "Student",
            UserMode::Fisherman => "Fisherman",
        }
    }
}

impl fmt::Display for UserMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        UserMode::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CoreError::invalid(format!("unknown user mode '{wanted}'")))
    }
}

#[derive(Debug, Clone, Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Number of keyword hits for `intent` in an already lowercased message
    fn score(intent: Intent, message: &str) -> usize {
        intent
            .keywords()
            .iter()
            .map(|keyword| message.matches(keyword).count())
            .sum()
    }

    /// Highest-scoring intent; ties go to the earlier intent, no hits to `General`
    pub fn classify(&self, message: &str) -> Intent {
        let lowered = message.to_lowercase();
        let mut best = (Intent::General, 0);
        for intent in Intent::SCORED {
            let score = Self::score(intent, &lowered);
            if score > best.1 {
                best = (intent, score);
            }
        }
        best.0
    }

    /// Ocean basins named in the message
    pub fn regions_mentioned(&self, message: &str) -> Vec<Region> {
        let lowered = message.to_lowercase();
        Region::ALL
            .into_iter()
            .filter(|region| lowered.contains(&region.name().to_lowercase()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_scoring() {
        let classifier = IntentClassifier::new();
        assert_eq!(classifier.classify("How warm is the water?"), Intent::Temperature);
        assert_eq!(classifier.classify("Salinity in PSU please"), Intent::Salinity);
        assert_eq!(classifier.classify("Where is the nearest float?"), Intent::Location);
        assert_eq!(classifier.classify("Any unusual outlier readings?"), Intent::Anomaly);
        assert_eq!(classifier.classify("Show the vertical profile"), Intent::Depth);
        assert_eq!(classifier.classify("hello there"), Intent::General);
    }

    #[test]
    fn test_ties_prefer_earlier_intent() {
        let classifier = IntentClassifier::new();
        // one temperature hit, one salinity hit
        assert_eq!(classifier.classify("heat and salt"), Intent::Temperature);
    }

    #[test]
    fn test_regions_mentioned() {
        let classifier = IntentClassifier::new();
        let regions = classifier.regions_mentioned("Compare the Arabian Sea with the Bay of Bengal");
        assert_eq!(regions, vec![Region::ArabianSea, Region::BayOfBengal]);
        assert!(classifier.regions_mentioned("nothing here").is_empty());
    }

    #[test]
    fn test_user_mode_parsing() {
        assert_eq!("Fisherman".parse::<UserMode>().unwrap(), UserMode::Fisherman);
        assert!("pirate".parse::<UserMode>().is_err());
        assert_eq!(UserMode::default(), UserMode::Scientist);
    }
}
