//! Load stage: read the topology and graph, derive region and boundary
//! geometry. Everything returned here is read-only for the rest of the run.

use std::fs;
use std::path::{Path, PathBuf};

use geojson::{FeatureCollection, Geometry, Value};
use log::{debug, info};

use crate::config::MapConfig;
use crate::error::{MapError, Result};
use crate::graph::Graph;
use crate::map::LineString;
use crate::topo::{self, Topology};

/// Everything the render stage needs.
#[derive(Debug, Clone)]
pub struct LoadedMap {
    pub source: PathBuf,
    /// One feature per region
    pub regions: FeatureCollection,
    /// Borders shared by two different regions
    pub boundaries: Geometry,
    pub graph: Graph,
}

impl LoadedMap {
    /// Derive region and boundary geometry from a parsed topology.
    pub fn from_topology(
        source: PathBuf,
        topology: &Topology,
        key: &str,
        graph: Graph,
    ) -> Result<Self> {
        let object = topology.object(key)?;
        let regions = topo::feature(topology, key)?;
        let boundaries = topo::mesh(topology, object, Some(topo::distinct))?;
        graph.validate()?;

        debug!(
            "object {key:?}: {} regions, {} boundary lines",
            regions.features.len(),
            geometry_lines(&boundaries).len()
        );

        Ok(Self {
            source,
            regions,
            boundaries,
            graph,
        })
    }

    pub fn region_names(&self) -> Vec<String> {
        self.regions
            .features
            .iter()
            .filter_map(|f| f.property("name").and_then(|v| v.as_str()))
            .map(str::to_string)
            .collect()
    }

    /// All region rings, outer and inner.
    pub fn region_lines(&self) -> Vec<LineString> {
        let mut lines = Vec::new();
        for feature in &self.regions.features {
            if let Some(geometry) = &feature.geometry {
                collect_lines(geometry, &mut lines);
            }
        }
        lines
    }
}

/// Read a TopoJSON file.
pub fn load_topology(path: &Path) -> Result<Topology> {
    let mut bytes = fs::read(path).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let topology = Topology::from_slice(&mut bytes).map_err(|reason| MapError::Topology {
        path: path.to_path_buf(),
        reason,
    })?;
    info!(
        "loaded {} ({} arcs, {} objects)",
        path.display(),
        topology.arcs.len(),
        topology.objects.len()
    );
    Ok(topology)
}

/// Load everything named by the config. Any failure aborts the load.
pub fn load_map(config: &MapConfig) -> Result<LoadedMap> {
    let topology = load_topology(&config.topology)?;
    let graph = match &config.graph {
        Some(path) => {
            let graph = Graph::from_geo_info(path)?;
            info!(
                "loaded graph {} ({} nodes, {} links)",
                path.display(),
                graph.nodes().len(),
                graph.links().len()
            );
            graph
        }
        None => Graph::builtin(),
    };
    LoadedMap::from_topology(config.topology.clone(), &topology, &config.object, graph)
}

/// Every ring or line of a geometry as (lon, lat) sequences
pub fn geometry_lines(geometry: &Geometry) -> Vec<LineString> {
    let mut lines = Vec::new();
    collect_lines(geometry, &mut lines);
    lines
}

fn to_line(coords: &[Vec<f64>]) -> LineString {
    coords.iter().map(|c| (c[0], c[1])).collect()
}

fn collect_lines(geometry: &Geometry, lines: &mut Vec<LineString>) {
    match &geometry.value {
        Value::LineString(coords) => lines.push(to_line(coords)),
        Value::MultiLineString(parts) | Value::Polygon(parts) => {
            lines.extend(parts.iter().map(|coords| to_line(coords)));
        }
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                lines.extend(rings.iter().map(|coords| to_line(coords)));
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_lines(g, lines);
            }
        }
        _ => {}
    }
}
