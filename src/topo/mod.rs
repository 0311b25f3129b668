//! TopoJSON decoding.
//!
//! A topology stores every shared boundary once as an "arc"; regions
//! reference arcs by index, with `!i` (i.e. `-i - 1`) meaning arc `i`
//! walked backwards. [`feature`] turns an object back into polygons and
//! [`mesh`] extracts the arcs matching a predicate on the regions that
//! share them.

mod feature;
mod mesh;

use std::collections::HashMap;
use std::convert::TryFrom;

use serde::Deserialize;

use crate::error::{MapError, Result};
use crate::map::LineString;

pub use feature::{feature, geometry};
pub use mesh::{distinct, mesh, mesh_arcs, RegionRef};

/// Quantization transform: `position = quantized * scale + translate`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct QuantizeTransform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

impl QuantizeTransform {
    #[inline]
    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x * self.scale[0] + self.translate[0],
            y * self.scale[1] + self.translate[1],
        )
    }
}

/// A parsed TopoJSON document.
#[derive(Debug, Clone, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub transform: Option<QuantizeTransform>,
    #[serde(default)]
    pub arcs: Vec<Vec<Vec<f64>>>,
    #[serde(default)]
    pub objects: HashMap<String, TopoGeometry>,
}

impl Topology {
    /// Parse a TopoJSON document. The buffer is used as scratch space by
    /// the SIMD parser and is left modified.
    pub fn from_slice(bytes: &mut [u8]) -> std::result::Result<Self, String> {
        let topology: Topology = simd_json::serde::from_slice(bytes).map_err(|e| e.to_string())?;
        topology.validate()?;
        Ok(topology)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        for (i, arc) in self.arcs.iter().enumerate() {
            if arc.iter().any(|p| p.len() < 2) {
                return Err(format!("arc {i} has a position with fewer than two values"));
            }
        }
        Ok(())
    }

    /// Look up a named object. The key must match exactly.
    pub fn object(&self, key: &str) -> Result<&TopoGeometry> {
        self.objects
            .get(key)
            .ok_or_else(|| MapError::MissingObject(key.to_string()))
    }
}

/// One geometry of a topology object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawGeometry")]
pub struct TopoGeometry {
    pub id: Option<serde_json::Value>,
    pub properties: Option<serde_json::Map<String, serde_json::Value>>,
    pub shape: Shape,
}

/// Geometry payload. Arc references are signed indices into
/// [`Topology::arcs`]; point coordinates are (possibly quantized) positions.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Collection(Vec<TopoGeometry>),
    Point(Vec<f64>),
    MultiPoint(Vec<Vec<f64>>),
    LineString(Vec<i64>),
    MultiLineString(Vec<Vec<i64>>),
    Polygon(Vec<Vec<i64>>),
    MultiPolygon(Vec<Vec<Vec<i64>>>),
    Null,
}

impl Shape {
    pub fn type_name(&self) -> &'static str {
        match self {
            Shape::Collection(_) => "GeometryCollection",
            Shape::Point(_) => "Point",
            Shape::MultiPoint(_) => "MultiPoint",
            Shape::LineString(_) => "LineString",
            Shape::MultiLineString(_) => "MultiLineString",
            Shape::Polygon(_) => "Polygon",
            Shape::MultiPolygon(_) => "MultiPolygon",
            Shape::Null => "null",
        }
    }
}

#[derive(Deserialize)]
struct RawGeometry {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    properties: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    geometries: Option<Vec<TopoGeometry>>,
    #[serde(default)]
    arcs: Option<serde_json::Value>,
    #[serde(default)]
    coordinates: Option<serde_json::Value>,
}

fn take<T: serde::de::DeserializeOwned>(
    value: Option<serde_json::Value>,
    kind: &str,
    field: &str,
) -> std::result::Result<T, String> {
    let value = value.ok_or_else(|| format!("{kind} without {field}"))?;
    serde_json::from_value(value).map_err(|e| format!("{kind} has invalid {field}: {e}"))
}

impl TryFrom<RawGeometry> for TopoGeometry {
    type Error = String;

    fn try_from(raw: RawGeometry) -> std::result::Result<Self, Self::Error> {
        let shape = match raw.kind.as_deref() {
            None => Shape::Null,
            Some("GeometryCollection") => Shape::Collection(raw.geometries.unwrap_or_default()),
            Some(kind @ "Point") => Shape::Point(take(raw.coordinates, kind, "coordinates")?),
            Some(kind @ "MultiPoint") => {
                Shape::MultiPoint(take(raw.coordinates, kind, "coordinates")?)
            }
            Some(kind @ "LineString") => Shape::LineString(take(raw.arcs, kind, "arcs")?),
            Some(kind @ "MultiLineString") => {
                Shape::MultiLineString(take(raw.arcs, kind, "arcs")?)
            }
            Some(kind @ "Polygon") => Shape::Polygon(take(raw.arcs, kind, "arcs")?),
            Some(kind @ "MultiPolygon") => Shape::MultiPolygon(take(raw.arcs, kind, "arcs")?),
            Some(other) => return Err(format!("unknown geometry type {other:?}")),
        };
        Ok(TopoGeometry {
            id: raw.id,
            properties: raw.properties,
            shape,
        })
    }
}

/// Arcs decoded to absolute longitude/latitude.
pub struct ArcTable {
    arcs: Vec<LineString>,
    transform: Option<QuantizeTransform>,
}

impl ArcTable {
    /// Delta-decode (when quantized) and georeference every arc.
    pub fn decode(topology: &Topology) -> Self {
        let arcs = topology
            .arcs
            .iter()
            .map(|arc| match &topology.transform {
                Some(t) => {
                    let (mut x, mut y) = (0.0, 0.0);
                    arc.iter()
                        .map(|p| {
                            x += p[0];
                            y += p[1];
                            t.apply(x, y)
                        })
                        .collect()
                }
                None => arc.iter().map(|p| (p[0], p[1])).collect(),
            })
            .collect();

        Self {
            arcs,
            transform: topology.transform,
        }
    }

    /// Decoded points of arc `index`; negative indices are reversed.
    pub fn arc(&self, index: i64) -> Result<Vec<(f64, f64)>> {
        let (slot, reversed) = if index < 0 {
            (!index, true)
        } else {
            (index, false)
        };
        let arc = usize::try_from(slot)
            .ok()
            .and_then(|slot| self.arcs.get(slot))
            .ok_or(MapError::ArcOutOfRange(index))?;

        let mut points = arc.clone();
        if reversed {
            points.reverse();
        }
        Ok(points)
    }

    /// First and last point of an arc, honouring direction.
    pub fn endpoints(&self, index: i64) -> Result<((f64, f64), (f64, f64))> {
        let points = self.arc(index)?;
        match (points.first(), points.last()) {
            (Some(&first), Some(&last)) => Ok((first, last)),
            _ => Err(MapError::Geometry {
                kind: "arc".to_string(),
                reason: format!("arc {index} has no points"),
            }),
        }
    }

    /// Join arcs into one line. Consecutive arcs share an endpoint, so
    /// the first point of every arc after the first is dropped.
    pub fn line(&self, refs: &[i64]) -> Result<LineString> {
        let mut points: LineString = Vec::new();
        for (k, &index) in refs.iter().enumerate() {
            let arc = self.arc(index)?;
            let skip = usize::from(k > 0 && !arc.is_empty());
            points.extend(arc.into_iter().skip(skip));
        }
        if points.len() < 2 {
            if let Some(&p) = points.first() {
                points.push(p);
            }
        }
        Ok(points)
    }

    /// Like [`line`](Self::line) but guarantees at least four points so
    /// degenerate rings stay closed.
    pub fn ring(&self, refs: &[i64]) -> Result<LineString> {
        let mut points = self.line(refs)?;
        while !points.is_empty() && points.len() < 4 {
            points.push(points[0]);
        }
        Ok(points)
    }

    /// Georeference a point position.
    pub fn point(&self, position: &[f64]) -> Result<(f64, f64)> {
        match position {
            [x, y, ..] => Ok(match &self.transform {
                Some(t) => t.apply(*x, *y),
                None => (*x, *y),
            }),
            _ => Err(MapError::Geometry {
                kind: "Point".to_string(),
                reason: "position needs two values".to_string(),
            }),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_quantized_arcs_are_delta_decoded() {
        let json = serde_json::json!({
            "type": "Topology",
            "transform": { "scale": [0.5, 2.0], "translate": [10.0, 20.0] },
            "arcs": [[[0, 0], [2, 1], [2, -1]]],
            "objects": {}
        });
        let mut bytes = serde_json::to_vec(&json).unwrap();
        let topology = Topology::from_slice(&mut bytes).unwrap();
        let arcs = ArcTable::decode(&topology);

        assert_eq!(
            arcs.arc(0).unwrap(),
            vec![(10.0, 20.0), (11.0, 22.0), (12.0, 20.0)]
        );
        assert_eq!(arcs.point(&[4.0, 1.0]).unwrap(), (12.0, 22.0));
    }

    #[test]
    fn test_negative_index_reverses_arc() {
        let arcs = ArcTable::decode(&two_squares());
        assert_eq!(arcs.arc(-1).unwrap(), vec![(1.0, 1.0), (1.0, 0.0)]);
        assert!(matches!(arcs.arc(3), Err(MapError::ArcOutOfRange(3))));
        assert!(matches!(arcs.arc(-4), Err(MapError::ArcOutOfRange(-4))));
    }

    #[test]
    fn test_ring_joins_arcs_without_duplicates() {
        let arcs = ArcTable::decode(&two_squares());
        let ring = arcs.ring(&[0, 1]).unwrap();
        assert_eq!(
            ring,
            vec![(1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0), (1.0, 0.0)]
        );
    }

    #[test]
    fn test_missing_object_key() {
        let topology = two_squares();
        assert!(topology.object("regions").is_ok());
        let err = topology.object("autonomous_region").unwrap_err();
        assert!(matches!(err, MapError::MissingObject(ref key) if key == "autonomous_region"));
    }

    #[test]
    fn test_unknown_geometry_type_is_rejected() {
        let json = r#"{"type":"Topology","arcs":[],"objects":{"x":{"type":"Circle"}}}"#;
        let mut bytes = json.as_bytes().to_vec();
        assert!(Topology::from_slice(&mut bytes).is_err());
    }

    #[test]
    fn test_null_geometry_parses() {
        let json = r#"{"type":"Topology","arcs":[],"objects":{"x":{"type":"GeometryCollection","geometries":[{"type":null,"id":"ghost"}]}}}"#;
        let mut bytes = json.as_bytes().to_vec();
        let topology = Topology::from_slice(&mut bytes).unwrap();
        match &topology.object("x").unwrap().shape {
            Shape::Collection(items) => assert_eq!(items[0].shape, Shape::Null),
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn test_sample_has_four_named_regions() {
        let topology = sample_topology();
        let object = topology.object("autonomous_regions").unwrap();
        let Shape::Collection(regions) = &object.shape else {
            panic!("expected a collection");
        };
        let names: Vec<_> = regions
            .iter()
            .filter_map(|r| r.properties.as_ref()?.get("name")?.as_str())
            .collect();
        assert_eq!(names.len(), 4);
        assert!(names.contains(&"Cataluña"));
    }
}
