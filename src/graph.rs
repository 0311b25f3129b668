//! City nodes and the links between them.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

use log::warn;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::error::{MapError, Result};

/// Health of a node, shown as its marker colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeStatus {
    /// Not reporting (red)
    Offline,
    /// Reporting, but part of it is hidden or down (orange)
    Degraded,
    /// Fully reporting (black)
    #[default]
    Online,
}

impl NodeStatus {
    pub fn label(&self) -> &'static str {
        match self {
            NodeStatus::Offline => "offline",
            NodeStatus::Degraded => "degraded",
            NodeStatus::Online => "online",
        }
    }

    pub fn svg_fill(&self) -> &'static str {
        match self {
            NodeStatus::Offline => "red",
            NodeStatus::Degraded => "orange",
            NodeStatus::Online => "black",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    /// (lon, lat)
    pub coordinates: (f64, f64),
    pub status: NodeStatus,
}

impl Node {
    pub fn new(id: &str, lon: f64, lat: f64) -> Self {
        Self {
            id: id.to_string(),
            coordinates: (lon, lat),
            status: NodeStatus::Online,
        }
    }
}

/// Undirected connection, referencing nodes by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub source: String,
    pub target: String,
}

impl Link {
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
        }
    }
}

/// Nodes and links with an id index for link resolution.
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    links: Vec<Link>,
    index: HashMap<String, usize>,
}

impl Graph {
    /// Build a graph, rejecting duplicate node ids. Links are not checked
    /// here; resolution fails later if an endpoint is missing.
    pub fn new(nodes: Vec<Node>, links: Vec<Link>) -> Result<Self> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(MapError::DuplicateNode(node.id.clone()));
            }
        }
        Ok(Self {
            nodes,
            links,
            index,
        })
    }

    /// Four cities joined in a ring.
    pub fn builtin() -> Self {
        let nodes = vec![
            Node::new("Barcelona", 2.1734, 41.3851),
            Node::new("Madrid", -3.7038, 40.4168),
            Node::new("Sevilla", -5.9869, 37.3886),
            Node::new("Bilbao", -2.9253, 43.263),
        ];
        let links = vec![
            Link::new("Barcelona", "Madrid"),
            Link::new("Madrid", "Sevilla"),
            Link::new("Sevilla", "Bilbao"),
            Link::new("Bilbao", "Barcelona"),
        ];
        let index = build_index(&nodes);
        Self {
            nodes,
            links,
            index,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn node(&self, id: &str) -> Result<&Node> {
        self.index
            .get(id)
            .map(|&i| &self.nodes[i])
            .ok_or_else(|| MapError::UnknownNode(id.to_string()))
    }

    /// Both endpoints of a link.
    pub fn resolve(&self, link: &Link) -> Result<(&Node, &Node)> {
        Ok((self.node(&link.source)?, self.node(&link.target)?))
    }

    /// Check every link resolves.
    pub fn validate(&self) -> Result<()> {
        self.links.iter().try_for_each(|l| self.resolve(l).map(|_| ()))
    }

    /// Load a geo-info file: one entry per node with its position, health
    /// and outgoing connections. Connections to ids not in the file are
    /// dropped with a warning; an id listed twice is a `DuplicateNode` error.
    pub fn from_geo_info(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| MapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let entries: GeoInfo = serde_json::from_str(&content).map_err(|source| MapError::Graph {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_entries(entries)
    }

    fn from_entries(GeoInfo(entries): GeoInfo) -> Result<Self> {
        let ids: HashSet<&str> = entries.iter().map(|(id, _)| id.as_str()).collect();
        let mut nodes = Vec::with_capacity(entries.len());
        let mut links = Vec::new();

        for (id, entry) in &entries {
            let status = match (entry.show, entry.degraded) {
                (false, _) => NodeStatus::Offline,
                (true, true) => NodeStatus::Degraded,
                (true, false) => NodeStatus::Online,
            };
            nodes.push(Node {
                id: id.clone(),
                coordinates: (entry.position.x, entry.position.y),
                status,
            });

            for target in &entry.connections {
                if ids.contains(target.as_str()) {
                    links.push(Link::new(id, target));
                } else {
                    warn!("dropping link {id} -> {target}: unknown node");
                }
            }
        }

        Self::new(nodes, links)
    }
}

fn build_index(nodes: &[Node]) -> HashMap<String, usize> {
    nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.clone(), i))
        .collect()
}

/// Geo-info entries in file order. Repeated ids are kept so they can be
/// reported instead of the last one silently winning.
struct GeoInfo(Vec<(String, GeoInfoEntry)>);

impl<'de> Deserialize<'de> for GeoInfo {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = GeoInfo;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from node id to geo-info entry")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<GeoInfo, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, GeoInfoEntry>()? {
                    entries.push(entry);
                }
                Ok(GeoInfo(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

#[derive(Debug, Deserialize)]
struct GeoInfoEntry {
    position: Position,
    #[serde(default = "default_show")]
    show: bool,
    #[serde(default)]
    degraded: bool,
    #[serde(default)]
    connections: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Position {
    x: f64,
    y: f64,
}

fn default_show() -> bool {
    true
}
