//! Scenario catalog
//!
//! Scenarios are JSON documents deserializing into [`Scenario`]. Nine are
//! built in; more can be loaded from a directory of `*.json` files.
//!
//! ```ignore
//! let catalog = ScenarioCatalog::builtin()?.with_directory(Path::new("scenarios"))?;
//! let selected = catalog.select(&["product_inquiry".to_string()])?;
//! ```

use bizeval_domain::{DomainError, Scenario};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const BUILTIN: [(&str, &str); 9] = [
    (
        "appointment_scheduling.json",
        include_str!("data/appointment_scheduling.json"),
    ),
    (
        "compliance_inquiry.json",
        include_str!("data/compliance_inquiry.json"),
    ),
    (
        "contract_negotiation.json",
        include_str!("data/contract_negotiation.json"),
    ),
    (
        "implementation_planning.json",
        include_str!("data/implementation_planning.json"),
    ),
    (
        "multi_department.json",
        include_str!("data/multi_department.json"),
    ),
    ("product_inquiry.json", include_str!("data/product_inquiry.json")),
    (
        "service_complaints.json",
        include_str!("data/service_complaints.json"),
    ),
    (
        "support_escalation.json",
        include_str!("data/support_escalation.json"),
    ),
    (
        "technical_support.json",
        include_str!("data/technical_support.json"),
    ),
];

/// Errors raised while building the catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse scenario {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error("Duplicate scenario id '{0}'")]
    Duplicate(String),

    #[error("Unknown scenario '{0}'")]
    Unknown(String),
}

/// Ordered, id-unique collection of scenarios
#[derive(Debug, Clone, Default)]
pub struct ScenarioCatalog {
    scenarios: Vec<Scenario>,
}

impl ScenarioCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding the built-in scenarios
    pub fn builtin() -> Result<Self, CatalogError> {
        BUILTIN
            .iter()
            .try_fold(Self::new(), |catalog, (origin, json)| {
                catalog.with_scenario(parse(origin, json)?)
            })
    }

    /// Add every `*.json` file in `dir`, in file name order
    pub fn with_directory(self, dir: &Path) -> Result<Self, CatalogError> {
        let io_error = |source| CatalogError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(io_error)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut catalog = self;
        for path in paths {
            let json = fs::read_to_string(&path).map_err(|source| CatalogError::Io {
                path: path.clone(),
                source,
            })?;
            let scenario = parse(&path.display().to_string(), &json)?;
            debug!("Loaded scenario '{}' from {}", scenario.id, path.display());
            catalog = catalog.with_scenario(scenario)?;
        }
        info!("Scenario catalog holds {} scenarios", catalog.len());
        Ok(catalog)
    }

    /// Add a scenario after validating it
    pub fn with_scenario(mut self, scenario: Scenario) -> Result<Self, CatalogError> {
        scenario.validate()?;
        if self.get(&scenario.id).is_some() {
            return Err(CatalogError::Duplicate(scenario.id));
        }
        self.scenarios.push(scenario);
        Ok(self)
    }

    pub fn get(&self, id: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.id == id)
    }

    pub fn all(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Scenarios with the given ids, in request order; all scenarios when
    /// `ids` is empty
    pub fn select(&self, ids: &[String]) -> Result<Vec<Scenario>, CatalogError> {
        if ids.is_empty() {
            return Ok(self.scenarios.clone());
        }
        ids.iter()
            .map(|id| {
                self.get(id)
                    .cloned()
                    .ok_or_else(|| CatalogError::Unknown(id.clone()))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

fn parse(origin: &str, json: &str) -> Result<Scenario, CatalogError> {
    serde_json::from_str(json).map_err(|source| CatalogError::Parse {
        origin: origin.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{SimulatedTools, standard_tool_spec};
    use bizeval_application::ToolBackend;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_scenarios_load() {
        let catalog = ScenarioCatalog::builtin().unwrap();
        let ids: Vec<&str> = catalog.all().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "appointment_scheduling",
                "compliance_inquiry",
                "contract_negotiation",
                "implementation_planning",
                "multi_department",
                "product_inquiry",
                "service_complaints",
                "support_escalation",
                "technical_support"
            ]
        );
    }

    #[test]
    fn test_builtin_scenarios_only_use_simulated_tools() {
        let spec = standard_tool_spec();
        let catalog = ScenarioCatalog::builtin().unwrap();
        for scenario in catalog.all() {
            for tool in scenario.offered_tool_ids() {
                assert!(spec.contains(tool), "{} offers {}", scenario.id, tool);
            }
        }

        // every simulated tool is expected somewhere
        for name in spec.names() {
            assert!(
                catalog
                    .all()
                    .iter()
                    .any(|s| s.expected_tool_ids().contains(name)),
                "no built-in scenario expects {}",
                name
            );
        }
    }

    #[tokio::test]
    async fn test_builtin_expected_calls_succeed_against_simulated_tools() {
        let today = chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let tools = SimulatedTools::standard_at(today).unwrap();
        for scenario in ScenarioCatalog::builtin().unwrap().all() {
            for (index, turn) in scenario.turns.iter().enumerate() {
                for call in &turn.expected_tool_calls {
                    let outcome = tools.execute(&call.tool_id, &call.parameters).await;
                    assert!(
                        outcome.is_ok(),
                        "{} turn {} {}: {:?}",
                        scenario.id,
                        index,
                        call.tool_id,
                        outcome
                    );
                }
            }
        }
    }

    #[test]
    fn test_select_by_id() {
        let catalog = ScenarioCatalog::builtin().unwrap();
        let selected = catalog
            .select(&["support_escalation".to_string()])
            .unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].turns.len(), 3);

        let err = catalog.select(&["nope".to_string()]).unwrap_err();
        assert!(matches!(err, CatalogError::Unknown(id) if id == "nope"));
    }

    #[test]
    fn test_directory_loading_and_duplicates() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("renewal.json"),
            r#"{"id": "renewal", "name": "Renewal", "turns": [{"user_message": "Renew my plan"}]}"#,
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let catalog = ScenarioCatalog::builtin()
            .unwrap()
            .with_directory(dir.path())
            .unwrap();
        assert_eq!(catalog.len(), 10);
        assert!(catalog.get("renewal").is_some());

        fs::write(
            dir.path().join("dup.json"),
            r#"{"id": "product_inquiry", "name": "Dup", "turns": [{"user_message": "Hi"}]}"#,
        )
        .unwrap();
        let err = ScenarioCatalog::builtin()
            .unwrap()
            .with_directory(dir.path())
            .unwrap_err();
        assert!(matches!(err, CatalogError::Duplicate(id) if id == "product_inquiry"));
    }

    #[test]
    fn test_invalid_json_reports_origin() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        let err = ScenarioCatalog::new()
            .with_directory(dir.path())
            .unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
