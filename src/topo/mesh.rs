use std::collections::HashMap;

use geojson::{Geometry, Value};

use super::{ArcTable, Shape, TopoGeometry, Topology};
use crate::error::Result;

/// A leaf geometry that references an arc, compared by identity.
///
/// `index` is the visiting order of the geometry inside the object, so two
/// refs are equal exactly when they denote the same region.
#[derive(Debug, Clone, Copy)]
pub struct RegionRef<'a> {
    pub index: usize,
    pub geometry: &'a TopoGeometry,
}

impl PartialEq for RegionRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for RegionRef<'_> {}

/// Mesh filter keeping only arcs between two different regions.
pub fn distinct(a: RegionRef<'_>, b: RegionRef<'_>) -> bool {
    a != b
}

/// Select arcs of `object` as signed indices, in arc order.
///
/// Each arc is tested with the first and last geometries that reference
/// it; an arc used by a single geometry is tested against itself. The
/// direction of the first reference is kept.
pub fn mesh_arcs<'a, F>(object: &'a TopoGeometry, mut filter: Option<F>) -> Vec<i64>
where
    F: FnMut(RegionRef<'a>, RegionRef<'a>) -> bool,
{
    let mut by_arc: HashMap<i64, Vec<(i64, RegionRef<'a>)>> = HashMap::new();
    let mut next = 0usize;
    collect(object, &mut next, &mut by_arc);

    let mut slots: Vec<_> = by_arc.into_iter().collect();
    slots.sort_unstable_by_key(|(slot, _)| *slot);

    slots
        .into_iter()
        .filter_map(|(_, refs)| {
            let (signed, first) = *refs.first()?;
            let (_, last) = *refs.last()?;
            match filter.as_mut() {
                Some(f) => f(first, last).then_some(signed),
                None => Some(signed),
            }
        })
        .collect()
}

fn collect<'a>(
    object: &'a TopoGeometry,
    next: &mut usize,
    by_arc: &mut HashMap<i64, Vec<(i64, RegionRef<'a>)>>,
) {
    if let Shape::Collection(members) = &object.shape {
        for member in members {
            collect(member, next, by_arc);
        }
        return;
    }

    let region = RegionRef {
        index: *next,
        geometry: object,
    };
    *next += 1;

    let mut add = |signed: i64| {
        let slot = if signed < 0 { !signed } else { signed };
        by_arc.entry(slot).or_default().push((signed, region));
    };

    match &object.shape {
        Shape::LineString(refs) => refs.iter().copied().for_each(&mut add),
        Shape::MultiLineString(lines) | Shape::Polygon(lines) => {
            lines.iter().flatten().copied().for_each(&mut add)
        }
        Shape::MultiPolygon(polygons) => polygons
            .iter()
            .flatten()
            .flatten()
            .copied()
            .for_each(&mut add),
        _ => {}
    }
}

/// Shared boundaries of `object` as a single multi-line geometry.
///
/// With `filter` set to [`distinct`] this yields the internal borders
/// between regions and leaves out the outer coastline.
pub fn mesh<'a, F>(topology: &Topology, object: &'a TopoGeometry, filter: Option<F>) -> Result<Geometry>
where
    F: FnMut(RegionRef<'a>, RegionRef<'a>) -> bool,
{
    let arcs = ArcTable::decode(topology);
    let selected = mesh_arcs(object, filter);
    let lines = stitch(&arcs, &selected)?
        .iter()
        .map(|fragment| {
            arcs.line(fragment)
                .map(|line| line.into_iter().map(|(x, y)| vec![x, y]).collect())
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Geometry::new(Value::MultiLineString(lines)))
}

type Key = (u64, u64);

fn key((x, y): (f64, f64)) -> Key {
    (x.to_bits(), y.to_bits())
}

struct Fragment {
    arcs: Vec<i64>,
    start: Key,
    end: Key,
}

/// Chain arcs whose endpoints meet into longer fragments.
fn stitch(arcs: &ArcTable, selected: &[i64]) -> Result<Vec<Vec<i64>>> {
    let mut slab: Vec<Option<Fragment>> = Vec::new();
    let mut by_start: HashMap<Key, usize> = HashMap::new();
    let mut by_end: HashMap<Key, usize> = HashMap::new();

    // Several fragments can share an endpoint, so map entries may go stale;
    // an entry only counts if the fragment still starts/ends there.
    let live_end = |slab: &Vec<Option<Fragment>>, map: &mut HashMap<Key, usize>, k: Key| {
        let idx = map.remove(&k)?;
        slab[idx].as_ref().filter(|f| f.end == k).map(|_| idx)
    };
    let live_start = |slab: &Vec<Option<Fragment>>, map: &mut HashMap<Key, usize>, k: Key| {
        let idx = map.remove(&k)?;
        slab[idx].as_ref().filter(|f| f.start == k).map(|_| idx)
    };

    for &index in selected {
        let (p0, p1) = arcs.endpoints(index)?;
        let (start, end) = (key(p0), key(p1));

        if let Some(fi) = live_end(&slab, &mut by_end, start) {
            let merged = match live_start(&slab, &mut by_start, end) {
                Some(gi) if gi != fi => slab[gi].take(),
                _ => None,
            };
            if let Some(f) = slab[fi].as_mut() {
                f.arcs.push(index);
                f.end = end;
                if let Some(g) = merged {
                    f.arcs.extend(g.arcs);
                    f.end = g.end;
                }
                by_start.insert(f.start, fi);
                by_end.insert(f.end, fi);
            }
        } else if let Some(fi) = live_start(&slab, &mut by_start, end) {
            let merged = match live_end(&slab, &mut by_end, start) {
                Some(gi) if gi != fi => slab[gi].take(),
                _ => None,
            };
            if let Some(f) = slab[fi].as_mut() {
                f.arcs.insert(0, index);
                f.start = start;
                if let Some(mut g) = merged {
                    g.arcs.append(&mut f.arcs);
                    f.arcs = g.arcs;
                    f.start = g.start;
                }
                by_start.insert(f.start, fi);
                by_end.insert(f.end, fi);
            }
        } else {
            let fi = slab.len();
            slab.push(Some(Fragment {
                arcs: vec![index],
                start,
                end,
            }));
            by_start.insert(start, fi);
            by_end.insert(end, fi);
        }
    }

    Ok(slab.into_iter().flatten().map(|f| f.arcs).collect())
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;

    fn lines(geometry: &Geometry) -> Vec<Vec<Vec<f64>>> {
        match &geometry.value {
            Value::MultiLineString(lines) => lines.clone(),
            other => panic!("expected multi-line string, got {other:?}"),
        }
    }

    #[test]
    fn test_mesh_arcs_keeps_only_shared_edges() {
        let topology = two_squares();
        let object = topology.object("regions").unwrap();
        assert_eq!(mesh_arcs(object, Some(distinct)), vec![0]);
    }

    #[test]
    fn test_mesh_arcs_without_filter_keeps_everything() {
        let topology = two_squares();
        let object = topology.object("regions").unwrap();
        let none: Option<fn(RegionRef<'_>, RegionRef<'_>) -> bool> = None;
        assert_eq!(mesh_arcs(object, none), vec![0, 1, 2]);
    }

    #[test]
    fn test_mesh_never_pairs_a_region_with_itself() {
        let topology = sample_topology();
        let object = topology.object("autonomous_regions").unwrap();

        let mut pairs = Vec::new();
        let selected = mesh_arcs(
            object,
            Some(|a: RegionRef<'_>, b: RegionRef<'_>| {
                pairs.push((a.index, b.index));
                distinct(a, b)
            }),
        );

        assert_eq!(selected, vec![-1, -2, -3, 3]);
        let kept: Vec<_> = pairs.iter().filter(|(a, b)| a != b).collect();
        assert_eq!(kept.len(), selected.len());
    }

    #[test]
    fn test_mesh_excludes_outer_boundary() {
        let topology = sample_topology();
        let object = topology.object("autonomous_regions").unwrap();
        let mesh = mesh(&topology, object, Some(distinct)).unwrap();
        let lines = lines(&mesh);

        let points: Vec<_> = lines.iter().flatten().collect();
        // Outer corners of the peninsula box belong to one region each.
        for corner in [[-9.5, 44.0], [3.5, 44.0], [3.5, 36.0], [-9.5, 36.0]] {
            assert!(!points.iter().any(|p| p.as_slice() == corner));
        }
        // All four internal spokes meet at the shared centre.
        assert!(points.iter().any(|p| p.as_slice() == [-2.5, 40.0]));
    }

    #[test]
    fn test_mesh_drops_single_owner_island() {
        let topology = island_and_neighbour();
        let object = topology.object("regions").unwrap();

        assert_eq!(mesh_arcs(object, Some(distinct)), vec![0]);
        let none: Option<fn(RegionRef<'_>, RegionRef<'_>) -> bool> = None;
        assert_eq!(mesh_arcs(object, none), vec![0, 1, 2, 3]);

        let mesh = mesh(&topology, object, Some(distinct)).unwrap();
        assert_eq!(lines(&mesh), vec![vec![vec![1.0, 0.0], vec![1.0, 1.0]]]);
    }

    #[test]
    fn test_mesh_filter_sees_first_and_last_owner() {
        let topology = island_and_neighbour();
        let object = topology.object("regions").unwrap();

        let mut seen = Vec::new();
        mesh_arcs(
            object,
            Some(|a: RegionRef<'_>, b: RegionRef<'_>| {
                seen.push((a.index, b.index));
                true
            }),
        );
        assert_eq!(seen, vec![(0, 1), (0, 0), (1, 1), (0, 0)]);
    }

    #[test]
    fn test_stitch_joins_touching_arcs() {
        let topology = sample_topology();
        let arcs = ArcTable::decode(&topology);
        // -3 ends at the centre where 3 starts.
        let fragments = stitch(&arcs, &[-3, 3]).unwrap();
        assert_eq!(fragments, vec![vec![-3, 3]]);

        let line = arcs.line(&fragments[0]).unwrap();
        assert_eq!(line, vec![(-2.5, 36.0), (-2.5, 40.0), (-9.5, 40.0)]);
    }

    #[test]
    fn test_stitch_closes_rings() {
        let topology = two_squares();
        let arcs = ArcTable::decode(&topology);
        let fragments = stitch(&arcs, &[1, 2]).unwrap();
        assert_eq!(fragments, vec![vec![1, 2]]);
    }
}
