use crate::{Entity, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Recommendations for one test user next to what the user actually did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub user: Entity,
    /// Neighbors in the training graph.
    pub training: Vec<Entity>,
    /// Ranked output, best first.
    pub recommended: Vec<Entity>,
    /// Neighbors in the test graph.
    pub groundtruth: Vec<Entity>,
}

/// Outcome of one experiment run.
///
/// Entities serialize as `{"type": ..., "id": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub users: Vec<Entity>,
    pub repos: Vec<Entity>,
    pub user_count: usize,
    pub repo_count: usize,
    pub recommendation: Vec<RecommendationRecord>,
    /// Requested list length; `None` asked for every candidate.
    pub recommendation_length: Option<usize>,
}

impl Report {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    pub fn read_json(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report() -> Report {
        Report {
            name: Some("item_cf".into()),
            users: vec![Entity::user(1)],
            repos: vec![Entity::repository(1), Entity::repository(2)],
            user_count: 1,
            repo_count: 2,
            recommendation: vec![RecommendationRecord {
                user: Entity::user(1),
                training: vec![Entity::repository(1)],
                recommended: vec![Entity::repository(2)],
                groundtruth: vec![Entity::repository(2)],
            }],
            recommendation_length: Some(1),
        }
    }

    #[test]
    fn test_entity_references_in_json() {
        let value: serde_json::Value = serde_json::from_str(&report().to_json().unwrap()).unwrap();
        assert_eq!(
            value["recommendation"][0]["user"],
            json!({"type": "User", "id": 1})
        );
        assert_eq!(value["recommendation_length"], json!(1));
    }

    #[test]
    fn test_read_back() {
        let r = report();
        assert_eq!(Report::from_json(&r.to_json().unwrap()).unwrap(), r);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        r.write_json(&path).unwrap();
        assert_eq!(Report::read_json(&path).unwrap(), r);
    }

    #[test]
    fn test_unnamed_report_without_length() {
        let json = r#"{"users": [], "repos": [], "user_count": 0, "repo_count": 0,
                       "recommendation": [], "recommendation_length": null}"#;
        let r = Report::from_json(json).unwrap();
        assert!(r.name.is_none());
        assert!(r.recommendation_length.is_none());
    }
}
