use geojson::{feature::Id, Feature, FeatureCollection, Geometry, Value};

use super::{ArcTable, Shape, TopoGeometry, Topology};
use crate::error::{MapError, Result};

/// Convert a named object into GeoJSON features.
///
/// A geometry collection yields one feature per member; any other object
/// yields a collection holding a single feature.
pub fn feature(topology: &Topology, key: &str) -> Result<FeatureCollection> {
    let object = topology.object(key)?;
    let arcs = ArcTable::decode(topology);

    let features = match &object.shape {
        Shape::Collection(members) => members
            .iter()
            .map(|member| to_feature(&arcs, member))
            .collect::<Result<Vec<_>>>()?,
        _ => vec![to_feature(&arcs, object)?],
    };

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

fn to_feature(arcs: &ArcTable, object: &TopoGeometry) -> Result<Feature> {
    let id = match &object.id {
        Some(serde_json::Value::String(s)) => Some(Id::String(s.clone())),
        Some(serde_json::Value::Number(n)) => Some(Id::Number(n.clone())),
        _ => None,
    };

    Ok(Feature {
        bbox: None,
        geometry: geometry(arcs, object)?,
        id,
        properties: object.properties.clone(),
        foreign_members: None,
    })
}

fn position((x, y): (f64, f64)) -> Vec<f64> {
    vec![x, y]
}

fn positions(line: Vec<(f64, f64)>) -> Vec<Vec<f64>> {
    line.into_iter().map(position).collect()
}

fn rings(arcs: &ArcTable, polygon: &[Vec<i64>]) -> Result<Vec<Vec<Vec<f64>>>> {
    polygon
        .iter()
        .map(|ring| arcs.ring(ring).map(positions))
        .collect()
}

/// Build the GeoJSON geometry for one topology geometry. Null geometries
/// map to `None`.
pub fn geometry(arcs: &ArcTable, object: &TopoGeometry) -> Result<Option<Geometry>> {
    let value = match &object.shape {
        Shape::Null => return Ok(None),
        Shape::Point(p) => Value::Point(position(arcs.point(p)?)),
        Shape::MultiPoint(points) => Value::MultiPoint(
            points
                .iter()
                .map(|p| arcs.point(p).map(position))
                .collect::<Result<_>>()?,
        ),
        Shape::LineString(refs) => Value::LineString(positions(arcs.line(refs)?)),
        Shape::MultiLineString(lines) => Value::MultiLineString(
            lines
                .iter()
                .map(|refs| arcs.line(refs).map(positions))
                .collect::<Result<_>>()?,
        ),
        Shape::Polygon(polygon) => Value::Polygon(rings(arcs, polygon)?),
        Shape::MultiPolygon(polygons) => Value::MultiPolygon(
            polygons
                .iter()
                .map(|polygon| rings(arcs, polygon))
                .collect::<Result<_>>()?,
        ),
        Shape::Collection(members) => {
            let mut geometries = Vec::with_capacity(members.len());
            for member in members {
                match geometry(arcs, member)? {
                    Some(g) => geometries.push(g),
                    None => {
                        return Err(MapError::Geometry {
                            kind: object.shape.type_name().to_string(),
                            reason: "nested null geometry".to_string(),
                        })
                    }
                }
            }
            Value::GeometryCollection(geometries)
        }
    };

    Ok(Some(Geometry::new(value)))
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;

    #[test]
    fn test_feature_per_region() {
        let fc = feature(&sample_topology(), "autonomous_regions").unwrap();
        assert_eq!(fc.features.len(), 4);

        let catalonia = &fc.features[1];
        assert_eq!(catalonia.id, Some(Id::String("CT".to_string())));
        assert_eq!(
            catalonia.property("name").and_then(|v| v.as_str()),
            Some("Cataluña")
        );
        match &catalonia.geometry.as_ref().unwrap().value {
            Value::Polygon(rings) => {
                assert_eq!(rings.len(), 1);
                let ring = &rings[0];
                assert_eq!(ring.first(), ring.last());
                assert!(ring.contains(&vec![3.5, 44.0]));
            }
            other => panic!("expected polygon, got {other:?}"),
        }
    }

    #[test]
    fn test_multi_polygon_keeps_every_part() {
        let fc = feature(&island_and_neighbour(), "regions").unwrap();
        assert_eq!(fc.features.len(), 2);

        match &fc.features[0].geometry.as_ref().unwrap().value {
            Value::MultiPolygon(polygons) => {
                assert_eq!(polygons.len(), 2);
                for rings in polygons {
                    assert_eq!(rings.len(), 1);
                    assert_eq!(rings[0].first(), rings[0].last());
                }
                assert!(polygons[0][0].contains(&vec![0.0, 0.0]));
                assert!(polygons[1][0].contains(&vec![6.0, 6.0]));
            }
            other => panic!("expected multi-polygon, got {other:?}"),
        }
        assert!(matches!(
            fc.features[1].geometry.as_ref().unwrap().value,
            Value::Polygon(_)
        ));
    }

    #[test]
    fn test_feature_missing_key_fails() {
        let err = feature(&two_squares(), "autonomous_regions").unwrap_err();
        assert!(matches!(err, MapError::MissingObject(_)));
    }

    #[test]
    fn test_bad_arc_reference_fails() {
        let json = serde_json::json!({
            "type": "Topology",
            "arcs": [[[0.0, 0.0], [1.0, 0.0]]],
            "objects": { "o": { "type": "LineString", "arcs": [0, 7] } }
        });
        let mut bytes = serde_json::to_vec(&json).unwrap();
        let topology = Topology::from_slice(&mut bytes).unwrap();
        let err = feature(&topology, "o").unwrap_err();
        assert!(matches!(err, MapError::ArcOutOfRange(7)));
    }

    #[test]
    fn test_single_object_becomes_one_feature() {
        let json = serde_json::json!({
            "type": "Topology",
            "transform": { "scale": [1.0, 1.0], "translate": [0.0, 0.0] },
            "arcs": [],
            "objects": { "capital": { "type": "Point", "coordinates": [3, 4] } }
        });
        let mut bytes = serde_json::to_vec(&json).unwrap();
        let topology = Topology::from_slice(&mut bytes).unwrap();
        let fc = feature(&topology, "capital").unwrap();
        assert_eq!(fc.features.len(), 1);
        assert_eq!(
            fc.features[0].geometry.as_ref().unwrap().value,
            Value::Point(vec![3.0, 4.0])
        );
    }
}
