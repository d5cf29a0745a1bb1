//! JSON-lines loaders for crawled account and repository data.
//!
//! Each file holds one JSON object per line. Blank lines are skipped, as are
//! records without a usable `id`.
//!
//! | File | Loader |
//! |------|--------|
//! | `AccountSummary.jsonl` | [`load_accounts`] |
//! | `RepositorySummary.jsonl` | [`load_repositories`], [`load_repository_descriptions`] |
//! | `Languages.jsonl` | [`load_repository_languages`] |
//!
//! Whole graphs are stored as node-link JSON by [`write_json_graph`] and read
//! back by [`read_json_graph`]: a `nodes` list whose `id` is the entity
//! reference `{"type": ..., "id": ...}` plus the node attributes, and a
//! `links` list of `source`/`target` references plus the edge attributes.

use crate::features::{DescriptionTable, EntityTable, LanguageTable};
use crate::graph::{scalar, Attributes};
use crate::{Entity, EntityId, EntityKind, Result, SocialGraph};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

pub const ACCOUNTS_FILE: &str = "AccountSummary.jsonl";
pub const REPOSITORIES_FILE: &str = "RepositorySummary.jsonl";
pub const LANGUAGES_FILE: &str = "Languages.jsonl";

/// Parse every non-blank line of `path` as a JSON value.
pub fn read_json_lines(path: impl AsRef<Path>) -> Result<Vec<Value>> {
    let reader = BufReader::new(File::open(path)?);
    let mut values = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        values.push(serde_json::from_str(&line)?);
    }
    Ok(values)
}

fn entity_id(value: &Value) -> Option<EntityId> {
    match value {
        Value::Number(n) => n.as_u64().map(EntityId::Number),
        Value::String(s) => Some(EntityId::Name(s.clone())),
        _ => None,
    }
}

fn record_id(record: &Value) -> Option<EntityId> {
    record.get("id").and_then(entity_id)
}

/// Records of `path` keyed by their `id`.
pub fn load_entities(path: impl AsRef<Path>) -> Result<EntityTable> {
    let mut table = EntityTable::new();
    for record in read_json_lines(path)? {
        let Some(id) = record_id(&record) else {
            continue;
        };
        if let Value::Object(fields) = record {
            let attributes: Attributes = fields.into_iter().collect();
            table.insert(id, attributes);
        }
    }
    Ok(table)
}

/// Account records from `dir/AccountSummary.jsonl`.
pub fn load_accounts(dir: impl AsRef<Path>) -> Result<EntityTable> {
    load_entities(dir.as_ref().join(ACCOUNTS_FILE))
}

/// Repository records from `dir/RepositorySummary.jsonl`.
pub fn load_repositories(dir: impl AsRef<Path>) -> Result<EntityTable> {
    load_entities(dir.as_ref().join(REPOSITORIES_FILE))
}

/// Language byte counts per repository from `dir/Languages.jsonl`, whose
/// lines look like `{"repo": {"id": 1}, "languages": {"Rust": 1024}}`.
pub fn load_repository_languages(dir: impl AsRef<Path>) -> Result<LanguageTable> {
    let mut table = LanguageTable::new();
    for record in read_json_lines(dir.as_ref().join(LANGUAGES_FILE))? {
        let Some(id) = record.get("repo").and_then(record_id) else {
            continue;
        };
        let languages = match record.get("languages") {
            Some(Value::Object(map)) => map
                .iter()
                .map(|(name, bytes)| (name.clone(), scalar(bytes)))
                .collect(),
            _ => Default::default(),
        };
        table.insert(id, languages);
    }
    Ok(table)
}

/// Descriptions per repository from `dir/RepositorySummary.jsonl`.
///
/// Forks are left out unless `show_fork` is set; a missing description is
/// the empty string.
pub fn load_repository_descriptions(
    dir: impl AsRef<Path>,
    show_fork: bool,
) -> Result<DescriptionTable> {
    let mut table = DescriptionTable::new();
    for record in read_json_lines(dir.as_ref().join(REPOSITORIES_FILE))? {
        let Some(id) = record_id(&record) else {
            continue;
        };
        let fork = record.get("fork").map(scalar).unwrap_or(0.0) != 0.0;
        if fork && !show_fork {
            continue;
        }
        let description = record
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        table.insert(id, description);
    }
    Ok(table)
}

/// Merge the account and repository records of `dir` into the matching
/// nodes of `graph`. Returns how many nodes received a record.
pub fn load_node_attributes(dir: impl AsRef<Path>, graph: &mut SocialGraph) -> Result<usize> {
    let accounts = load_accounts(&dir)?;
    let repositories = load_repositories(&dir)?;
    Ok(graph.merge_node_attributes(&accounts, EntityKind::Account)
        + graph.merge_node_attributes(&repositories, EntityKind::Repository))
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeLinkGraph {
    directed: bool,
    #[serde(default)]
    multigraph: bool,
    #[serde(default)]
    graph: Attributes,
    nodes: Vec<NodeLinkNode>,
    links: Vec<NodeLinkEdge>,
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeLinkNode {
    id: Value,
    #[serde(flatten)]
    attributes: Attributes,
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeLinkEdge {
    source: Value,
    target: Value,
    #[serde(flatten)]
    attributes: Attributes,
}

fn without_keys(attributes: &Attributes, reserved: &[&str]) -> Attributes {
    attributes
        .iter()
        .filter(|(key, _)| !reserved.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn entity_reference(entity: &Entity) -> Result<Value> {
    Ok(serde_json::to_value(entity)?)
}

/// Write `graph` as node-link JSON.
pub fn write_json_graph(path: impl AsRef<Path>, graph: &SocialGraph, pretty: bool) -> Result<()> {
    let mut nodes = Vec::with_capacity(graph.node_count());
    for entity in graph.nodes() {
        let attributes = graph
            .node_attributes(entity)
            .map(|attrs| without_keys(attrs, &["id"]))
            .unwrap_or_default();
        nodes.push(NodeLinkNode {
            id: entity_reference(entity)?,
            attributes,
        });
    }
    let mut links = Vec::with_capacity(graph.edge_count());
    for (u, v, attrs) in graph.edges() {
        links.push(NodeLinkEdge {
            source: entity_reference(u)?,
            target: entity_reference(v)?,
            attributes: without_keys(attrs, &["source", "target"]),
        });
    }
    let data = NodeLinkGraph {
        directed: graph.is_directed(),
        multigraph: false,
        graph: Attributes::new(),
        nodes,
        links,
    };

    let mut writer = BufWriter::new(File::create(path)?);
    if pretty {
        serde_json::to_writer_pretty(&mut writer, &data)?;
    } else {
        serde_json::to_writer(&mut writer, &data)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a node-link JSON graph.
///
/// Nodes whose reference is not a known entity are dropped together with
/// their links; parallel links merge their attributes.
pub fn read_json_graph(path: impl AsRef<Path>) -> Result<SocialGraph> {
    let data: NodeLinkGraph = serde_json::from_reader(BufReader::new(File::open(path)?))?;
    let mut graph = if data.directed {
        SocialGraph::new_directed()
    } else {
        SocialGraph::new_undirected()
    };

    let mut skipped = 0usize;
    for node in data.nodes {
        match serde_json::from_value::<Entity>(node.id) {
            Ok(entity) => graph.add_node_with(entity, node.attributes),
            Err(_) => skipped += 1,
        }
    }
    for link in data.links {
        let source = serde_json::from_value::<Entity>(link.source).ok();
        let target = serde_json::from_value::<Entity>(link.target).ok();
        match (source, target) {
            (Some(u), Some(v)) if graph.contains(&u) && graph.contains(&v) => {
                graph.add_edge(u, v, link.attributes);
            }
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!(skipped, "dropped unknown nodes and links");
    }
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::NodeFeature;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn fixture(files: &[(&str, &str)]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (file, content) in files {
            fs::write(dir.path().join(file), content).unwrap();
        }
        dir
    }

    #[test]
    fn test_entity_tables() {
        let dir = fixture(&[(
            ACCOUNTS_FILE,
            "{\"id\": 1, \"login\": \"a\", \"followers\": 3}\n\n{\"login\": \"no-id\"}\n{\"id\": 2}\n",
        )]);
        let accounts = load_accounts(dir.path()).unwrap();

        assert_eq!(accounts.len(), 2);
        let first = &accounts[&EntityId::Number(1)];
        assert_eq!(first["followers"], json!(3));
        assert_eq!(first["login"], json!("a"));
    }

    #[test]
    fn test_languages() {
        let dir = fixture(&[(
            LANGUAGES_FILE,
            "{\"repo\": {\"id\": 7}, \"languages\": {\"Rust\": 100, \"C\": 5}}\n{\"repo\": {\"id\": 8}}\n",
        )]);
        let languages = load_repository_languages(dir.path()).unwrap();

        assert_eq!(languages[&EntityId::Number(7)]["Rust"], 100.0);
        assert_eq!(languages[&EntityId::Number(7)].len(), 2);
        assert!(languages[&EntityId::Number(8)].is_empty());
    }

    #[test]
    fn test_descriptions_skip_forks() {
        let content = concat!(
            "{\"id\": 1, \"description\": \"graph toolkit\", \"fork\": false}\n",
            "{\"id\": 2, \"description\": \"copy\", \"fork\": true}\n",
            "{\"id\": 3, \"description\": null}\n",
        );
        let dir = fixture(&[(REPOSITORIES_FILE, content)]);
        let own = load_repository_descriptions(dir.path(), false).unwrap();
        let all = load_repository_descriptions(dir.path(), true).unwrap();
        let repositories = load_repositories(dir.path()).unwrap();

        assert_eq!(own.len(), 2);
        assert_eq!(own[&EntityId::Number(1)], "graph toolkit");
        assert_eq!(own[&EntityId::Number(3)], "");
        assert_eq!(all.len(), 3);
        assert_eq!(repositories.len(), 3);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_accounts(dir.path().join("missing")),
            Err(crate::Error::Io(_))
        ));
    }

    #[test]
    fn test_node_attributes_feed_node_features() {
        let dir = fixture(&[
            (
                ACCOUNTS_FILE,
                "{\"id\": 1, \"followers\": 3, \"hireable\": true}\n{\"id\": 5, \"followers\": 9}\n",
            ),
            (REPOSITORIES_FILE, "{\"id\": 7, \"stargazers_count\": 40}\n"),
        ]);
        let mut g = SocialGraph::new_undirected();
        g.add_edge(Entity::user(1), Entity::repository(7), Attributes::new());
        g.add_edge(Entity::user(2), Entity::repository(7), Attributes::new());

        assert_eq!(load_node_attributes(dir.path(), &mut g).unwrap(), 2);
        assert!(!g.node_attributes(&Entity::user(1)).unwrap().contains_key("id"));
        assert!(g.node_attributes(&Entity::user(2)).unwrap().is_empty());

        let users = NodeFeature::user(EntityTable::new());
        assert_eq!(
            users.extract(&g, &Entity::user(1)),
            vec![0.0, 0.0, 3.0, 0.0, 1.0]
        );
        let repositories = NodeFeature::repository(EntityTable::new());
        assert_eq!(repositories.extract(&g, &Entity::repository(7))[6], 40.0);
    }

    fn attributed_graph(directed: bool) -> SocialGraph {
        let mut g = if directed {
            SocialGraph::new_directed()
        } else {
            SocialGraph::new_undirected()
        };
        let mut node = Attributes::new();
        node.insert("login".into(), json!("octo"));
        g.add_node_with(Entity::user(1), node);
        let mut edge = Attributes::new();
        edge.insert("weight".into(), json!(2.5));
        g.add_edge(Entity::user(1), Entity::repository(10), edge);
        g.add_edge(Entity::repository(10), Entity::language("Rust"), Attributes::new());
        g.add_edge(Entity::user(2), Entity::user(1), Attributes::new());
        g
    }

    #[test]
    fn test_json_graph_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        for directed in [false, true] {
            let g = attributed_graph(directed);
            let path = dir.path().join(format!("graph-{}.json", directed));
            write_json_graph(&path, &g, directed).unwrap();
            let back = read_json_graph(&path).unwrap();

            assert_eq!(back.is_directed(), directed);
            assert_eq!(back.nodes().collect::<Vec<_>>(), g.nodes().collect::<Vec<_>>());
            assert_eq!(back.edge_list(), g.edge_list());
            assert_eq!(
                back.node_attributes(&Entity::user(1)).unwrap()["login"],
                json!("octo")
            );
            let edge = back
                .edge_attributes(&Entity::user(1), &Entity::repository(10))
                .unwrap();
            assert_eq!(edge["weight"], json!(2.5));
        }
    }

    #[test]
    fn test_json_graph_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        write_json_graph(&path, &attributed_graph(false), false).unwrap();
        let value: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(value["directed"], json!(false));
        assert_eq!(value["nodes"][0], json!({"id": {"type": "User", "id": 1}, "login": "octo"}));
        assert_eq!(
            value["links"][0],
            json!({
                "source": {"type": "User", "id": 1},
                "target": {"type": "Repository", "id": 10},
                "weight": 2.5
            })
        );
    }

    #[test]
    fn test_unknown_entities_are_dropped() {
        let content = r#"{
            "directed": true,
            "nodes": [
                {"id": {"type": "User", "id": 1}},
                {"id": {"type": "Gist", "id": 2}},
                {"id": {"type": "Repository", "id": 3}}
            ],
            "links": [
                {"source": {"type": "User", "id": 1}, "target": {"type": "Gist", "id": 2}},
                {"source": {"type": "User", "id": 1}, "target": {"type": "Repository", "id": 3}}
            ]
        }"#;
        let dir = fixture(&[("graph.json", content)]);
        let g = read_json_graph(dir.path().join("graph.json")).unwrap();

        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 1);
        assert!(g.has_edge(&Entity::user(1), &Entity::repository(3)));
    }
}
