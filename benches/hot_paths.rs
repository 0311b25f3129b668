use std::hint::black_box;
use std::path::PathBuf;

use criterion::{criterion_group, criterion_main, Criterion};
use region_map::data::LoadedMap;
use region_map::graph::Graph;
use region_map::map::{
    frame_projection, render_scene, MapRenderer, Scene, SceneStyle, Viewport, ZoomTransform,
};
use region_map::topo::{self, Topology};
use region_map::MapConfig;

const SAMPLE: &str = include_str!("../data/sample_regions.json");
const OBJECT: &str = "autonomous_regions";

fn topology() -> Topology {
    let mut bytes = SAMPLE.as_bytes().to_vec();
    Topology::from_slice(&mut bytes).expect("sample topology parses")
}

fn bench_topology(c: &mut Criterion) {
    c.bench_function("parse_topology", |b| {
        b.iter(|| {
            let mut bytes = SAMPLE.as_bytes().to_vec();
            black_box(Topology::from_slice(&mut bytes).expect("parses"))
        })
    });

    let topology = topology();
    c.bench_function("feature", |b| {
        b.iter(|| black_box(topo::feature(&topology, OBJECT).expect("feature")))
    });

    let object = topology.object(OBJECT).expect("object");
    c.bench_function("mesh_distinct", |b| {
        b.iter(|| black_box(topo::mesh(&topology, object, Some(topo::distinct)).expect("mesh")))
    });
}

fn bench_render(c: &mut Criterion) {
    let config = MapConfig::default();
    let map = LoadedMap::from_topology(PathBuf::from("sample"), &topology(), OBJECT, Graph::builtin())
        .expect("sample map");
    let (width, height) = (320.0, 160.0);
    let projection = frame_projection(config.terminal_framing, width, height, &map);
    let style = SceneStyle::from(&config);

    c.bench_function("render_scene", |b| {
        b.iter(|| {
            let mut scene = Scene::new(width, height);
            render_scene(&mut scene, &map, &projection, &style).expect("scene");
            black_box(scene)
        })
    });

    let mut scene = Scene::new(width, height);
    render_scene(&mut scene, &map, &projection, &style).expect("scene");
    scene.apply_transform(ZoomTransform {
        k: 4.0,
        x: -480.0,
        y: -240.0,
    });
    let viewport = Viewport::new(320, 160, config.scale_extent, config.zoom_step);
    let renderer = MapRenderer::new();
    c.bench_function("rasterise_zoomed", |b| {
        b.iter(|| black_box(renderer.render(&scene, 160, 40, &viewport)))
    });
}

criterion_group!(benches, bench_topology, bench_render);
criterion_main!(benches);
