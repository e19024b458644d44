//! Model identifier value object

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identifier of a model under evaluation (Value Object)
///
/// Models are opaque to the domain: the identifier is whatever name the
/// provider configuration uses (`gpt-4o`, `claude-sonnet-4.5`, `scripted`).
/// Ordering is lexical so summaries render deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string identifier for this model
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ModelId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(ModelId::new(s.trim()))
    }
}

impl From<&str> for ModelId {
    fn from(s: &str) -> Self {
        ModelId::new(s)
    }
}

impl Serialize for ModelId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ModelId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(ModelId::new(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_id_parse_trims() {
        let model: ModelId = "  gpt-4o ".parse().unwrap();
        assert_eq!(model.as_str(), "gpt-4o");
        assert_eq!(model.to_string(), "gpt-4o");
    }

    #[test]
    fn test_model_id_serializes_as_string() {
        let model = ModelId::new("claude-sonnet-4.5");
        let json = serde_json::to_string(&model).unwrap();
        assert_eq!(json, "\"claude-sonnet-4.5\"");
        let back: ModelId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, model);
    }

    #[test]
    fn test_model_id_ordering_is_lexical() {
        let mut ids = vec![ModelId::new("b"), ModelId::new("a")];
        ids.sort();
        assert_eq!(ids[0].as_str(), "a");
    }
}
