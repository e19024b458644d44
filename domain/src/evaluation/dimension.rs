//! Dimension value objects and scores

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Axis of quality measurement (Value Object)
///
/// The five built-in dimensions carry default weights; `Custom` covers
/// evaluators registered by name at startup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dimension {
    ResponseQuality,
    BusinessValue,
    CommunicationStyle,
    ToolUsage,
    Performance,
    Custom(String),
}

impl Dimension {
    /// Built-in dimensions in report order
    pub const BUILTIN: [Dimension; 5] = [
        Dimension::ResponseQuality,
        Dimension::BusinessValue,
        Dimension::CommunicationStyle,
        Dimension::ToolUsage,
        Dimension::Performance,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Dimension::ResponseQuality => "response_quality",
            Dimension::BusinessValue => "business_value",
            Dimension::CommunicationStyle => "communication_style",
            Dimension::ToolUsage => "tool_usage",
            Dimension::Performance => "performance",
            Dimension::Custom(s) => s,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Dimension::ResponseQuality => "Response Quality",
            Dimension::BusinessValue => "Business Value",
            Dimension::CommunicationStyle => "Communication Style",
            Dimension::ToolUsage => "Tool Usage",
            Dimension::Performance => "Performance",
            Dimension::Custom(s) => s,
        }
    }

    /// Default weight of a built-in dimension
    pub fn default_weight(&self) -> Option<f64> {
        match self {
            Dimension::ResponseQuality | Dimension::BusinessValue => Some(0.25),
            Dimension::CommunicationStyle | Dimension::ToolUsage => Some(0.20),
            Dimension::Performance => Some(0.10),
            Dimension::Custom(_) => None,
        }
    }

    pub fn is_builtin(&self) -> bool {
        !matches!(self, Dimension::Custom(_))
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Dimension {
    type Err = std::convert::Infallible;

    /// Accepts `response_quality` as well as `response-quality`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Ok(match normalized.as_str() {
            "response_quality" => Dimension::ResponseQuality,
            "business_value" => Dimension::BusinessValue,
            "communication_style" => Dimension::CommunicationStyle,
            "tool_usage" => Dimension::ToolUsage,
            "performance" => Dimension::Performance,
            _ => Dimension::Custom(normalized),
        })
    }
}

impl Serialize for Dimension {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Dimension {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One named sub-criterion of a dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    pub name: String,
    /// Fixed sub-weight within the dimension
    pub weight: f64,
    /// Value in [0, 1]
    pub score: f64,
}

impl CriterionScore {
    pub fn new(name: impl Into<String>, weight: f64, score: f64) -> Self {
        Self {
            name: name.into(),
            weight,
            score: clamp_unit(score),
        }
    }
}

/// Score of one conversation on one dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: Dimension,
    /// Value in [0, 1]
    pub score: f64,
    pub feedback: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub criteria: Vec<CriterionScore>,
}

impl DimensionScore {
    pub fn new(dimension: Dimension, score: f64, feedback: Vec<String>) -> Self {
        Self {
            dimension,
            score: clamp_unit(score),
            feedback,
            criteria: Vec::new(),
        }
    }

    /// Weighted combination of sub-criteria
    pub fn from_criteria(
        dimension: Dimension,
        criteria: Vec<CriterionScore>,
        feedback: Vec<String>,
    ) -> Self {
        let total_weight: f64 = criteria.iter().map(|c| c.weight).sum();
        let score = if total_weight > 0.0 {
            criteria.iter().map(|c| c.weight * c.score).sum::<f64>() / total_weight
        } else {
            0.0
        };
        Self {
            dimension,
            score: clamp_unit(score),
            feedback,
            criteria,
        }
    }

    pub fn criterion(&self, name: &str) -> Option<f64> {
        self.criteria.iter().find(|c| c.name == name).map(|c| c.score)
    }
}

/// Clamp into [0, 1], mapping NaN to 0
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}
