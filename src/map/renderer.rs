use glam::DVec2;

use crate::braille::BrailleCanvas;
use crate::config::{Framing, MapConfig};
use crate::data::{geometry_lines, LoadedMap};
use crate::error::Result;
use crate::graph::NodeStatus;
use crate::map::geometry::{draw_circle, draw_polyline, draw_wide_line};
use crate::map::projection::Projection;
use crate::map::scene::{Scene, Shape};
use crate::map::viewport::Viewport;

/// Label offset from the node centre, in surface pixels.
const LABEL_OFFSET: DVec2 = DVec2::new(10.0, -5.0);

/// Fixed sizes for scene primitives.
#[derive(Debug, Clone, Copy)]
pub struct SceneStyle {
    pub node_radius: f64,
    pub link_width: f64,
    pub show_labels: bool,
}

impl From<&MapConfig> for SceneStyle {
    fn from(config: &MapConfig) -> Self {
        Self {
            node_radius: config.node_radius,
            link_width: config.link_width,
            show_labels: config.show_labels,
        }
    }
}

/// Place the projection on a `width` x `height` surface.
pub fn frame_projection(framing: Framing, width: f64, height: f64, map: &LoadedMap) -> Projection {
    match framing {
        Framing::Fixed { scale, translate } => Projection::natural_earth()
            .scale(scale)
            .translate([width * translate[0], height * translate[1]]),
        Framing::Fit { padding } => {
            let mut points: Vec<(f64, f64)> = map.region_lines().into_iter().flatten().collect();
            points.extend(map.graph.nodes().iter().map(|n| n.coordinates));
            let pad = padding.min(width / 4.0).min(height / 4.0).max(0.0);
            Projection::natural_earth().fit_extent(
                DVec2::splat(pad),
                DVec2::new(width - pad, height - pad),
                points.iter(),
            )
        }
    }
}

/// Append the map to `scene`: one land path, one boundary path, one line
/// per link, one circle per node, then the labels.
///
/// Fails if a link names a node that does not exist; nothing is appended
/// for links or nodes in that case.
pub fn render_scene(
    scene: &mut Scene,
    map: &LoadedMap,
    projection: &Projection,
    style: &SceneStyle,
) -> Result<()> {
    let graph = &map.graph;
    let endpoints = graph
        .links()
        .iter()
        .map(|link| {
            let (a, b) = graph.resolve(link)?;
            Ok((
                projection.project(a.coordinates.0, a.coordinates.1),
                projection.project(b.coordinates.0, b.coordinates.1),
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    scene.append(
        "land",
        Shape::Path {
            subpaths: projection.project_lines(&map.region_lines()),
            closed: true,
        },
    );
    scene.append(
        "boundary",
        Shape::Path {
            subpaths: projection.project_lines(&geometry_lines(&map.boundaries)),
            closed: false,
        },
    );

    for (from, to) in endpoints {
        scene.append(
            "link",
            Shape::Line {
                from,
                to,
                stroke_width: style.link_width,
            },
        );
    }

    let centres: Vec<_> = graph
        .nodes()
        .iter()
        .map(|node| (node, projection.project(node.coordinates.0, node.coordinates.1)))
        .collect();

    for &(node, center) in &centres {
        scene
            .append(
                "node",
                Shape::Circle {
                    center,
                    radius: style.node_radius,
                    status: node.status,
                },
            )
            .datum = Some(node.id.clone());
    }

    if style.show_labels {
        for &(node, center) in &centres {
            scene
                .append(
                    "node-label",
                    Shape::Text {
                        anchor: center + LABEL_OFFSET,
                        content: node.id.clone(),
                    },
                )
                .datum = Some(node.id.clone());
        }
    }

    Ok(())
}

/// Which scene layers the terminal draws
#[derive(Clone)]
pub struct DisplaySettings {
    pub show_land: bool,
    pub show_boundaries: bool,
    pub show_network: bool,
    pub show_labels: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_land: true,
            show_boundaries: true,
            show_network: true,
            show_labels: true,
        }
    }
}

/// Node markers of one status
pub struct NodeLayer {
    pub status: NodeStatus,
    pub canvas: BrailleCanvas,
}

/// Rasterised layers, drawn back to front by the UI
pub struct MapLayers {
    pub land: BrailleCanvas,
    pub boundaries: BrailleCanvas,
    pub links: BrailleCanvas,
    pub nodes: Vec<NodeLayer>,
    /// (column, row, text)
    pub labels: Vec<(u16, u16, String)>,
}

impl MapLayers {
    fn new(width: usize, height: usize) -> Self {
        let nodes = [NodeStatus::Online, NodeStatus::Degraded, NodeStatus::Offline]
            .into_iter()
            .map(|status| NodeLayer {
                status,
                canvas: BrailleCanvas::new(width, height),
            })
            .collect();
        Self {
            land: BrailleCanvas::new(width, height),
            boundaries: BrailleCanvas::new(width, height),
            links: BrailleCanvas::new(width, height),
            nodes,
            labels: Vec::new(),
        }
    }

    fn node_canvas(&mut self, status: NodeStatus) -> Option<&mut BrailleCanvas> {
        self.nodes
            .iter_mut()
            .find(|layer| layer.status == status)
            .map(|layer| &mut layer.canvas)
    }
}

/// Terminal rasteriser for a [`Scene`]
pub struct MapRenderer {
    pub settings: DisplaySettings,
}

impl MapRenderer {
    pub fn new() -> Self {
        Self {
            settings: DisplaySettings::default(),
        }
    }

    /// Rasterise every primitive with its own transform onto a canvas of
    /// `width` x `height` characters.
    pub fn render(&self, scene: &Scene, width: usize, height: usize, viewport: &Viewport) -> MapLayers {
        let mut layers = MapLayers::new(width, height);

        for primitive in scene.primitives() {
            let t = primitive.transform.unwrap_or_default();
            let screen = |p: DVec2| {
                let q = t.apply(p);
                (q.x.round() as i32, q.y.round() as i32)
            };

            match (&primitive.shape, primitive.class) {
                (Shape::Path { subpaths, .. }, class) => {
                    let (visible, canvas) = if class == "boundary" {
                        (self.settings.show_boundaries, &mut layers.boundaries)
                    } else {
                        (self.settings.show_land, &mut layers.land)
                    };
                    if !visible {
                        continue;
                    }
                    for subpath in subpaths {
                        let points: Vec<_> = subpath.iter().map(|&p| screen(p)).collect();
                        draw_polyline(canvas, &points, viewport);
                    }
                }
                (Shape::Line { from, to, stroke_width }, _) if self.settings.show_network => {
                    let (a, b) = (screen(*from), screen(*to));
                    if viewport.line_might_be_visible(a, b) {
                        let width = stroke_width.round().max(1.0) as u32;
                        draw_wide_line(&mut layers.links, a, b, width);
                    }
                }
                (Shape::Circle { center, radius, status }, _) if self.settings.show_network => {
                    let c = screen(*center);
                    // Markers keep their size; scaling them with zoom would
                    // swamp a terminal-sized canvas.
                    if viewport.is_visible(c.0, c.1) {
                        if let Some(canvas) = layers.node_canvas(*status) {
                            draw_circle(canvas, c, radius.round() as i32);
                        }
                    }
                }
                (Shape::Text { anchor, content }, _)
                    if self.settings.show_labels && self.settings.show_network =>
                {
                    let (px, py) = screen(*anchor);
                    if px >= 0 && py >= 0 && viewport.is_visible(px, py) {
                        // Braille cells are 2x4 pixels.
                        layers.labels.push(((px / 2) as u16, (py / 4) as u16, content.clone()));
                    }
                }
                _ => {}
            }
        }

        layers
    }

    pub fn toggle_land(&mut self) {
        self.settings.show_land = !self.settings.show_land;
    }

    pub fn toggle_boundaries(&mut self) {
        self.settings.show_boundaries = !self.settings.show_boundaries;
    }

    pub fn toggle_network(&mut self) {
        self.settings.show_network = !self.settings.show_network;
    }

    pub fn toggle_labels(&mut self) {
        self.settings.show_labels = !self.settings.show_labels;
    }
}

impl Default for MapRenderer {
    fn default() -> Self {
        Self::new()
    }
}
