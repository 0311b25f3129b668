//! SVG serialisation of a [`Scene`].
//!
//! One element per primitive, in scene order, under a root `<svg>` with
//! id `map-container`. Each primitive's transform, when set, becomes its
//! `transform` attribute.

use std::fs;
use std::path::Path as FsPath;

use log::info;
use svg::node::element::path::Data;
use svg::node::element::Element;
use svg::node::{Node, Text};
use svg::Document;

use crate::error::{MapError, Result};
use crate::map::{Primitive, Scene, Shape};

const LAND_FILL: &str = "#d9d9d9";
const BOUNDARY_STROKE: &str = "#ffffff";
const LINK_STROKE: &str = "#1f77b4";

fn path_data(subpaths: &[Vec<glam::DVec2>], closed: bool) -> Data {
    let mut data = Data::new();
    for subpath in subpaths.iter().filter(|s| s.len() >= 2) {
        data = data.move_to((subpath[0].x, subpath[0].y));
        for p in &subpath[1..] {
            data = data.line_to((p.x, p.y));
        }
        if closed {
            data = data.close();
        }
    }
    data
}

fn element(primitive: &Primitive) -> Element {
    let mut element = match &primitive.shape {
        Shape::Path { subpaths, closed } => {
            let mut path = Element::new("path");
            path.assign("d", path_data(subpaths, *closed));
            if *closed {
                path.assign("fill", LAND_FILL);
                path.assign("stroke", "none");
            } else {
                path.assign("fill", "none");
                path.assign("stroke", BOUNDARY_STROKE);
            }
            path
        }
        Shape::Line {
            from,
            to,
            stroke_width,
        } => {
            let mut line = Element::new("line");
            line.assign("x1", from.x);
            line.assign("y1", from.y);
            line.assign("x2", to.x);
            line.assign("y2", to.y);
            line.assign("stroke", LINK_STROKE);
            line.assign("style", format!("stroke-width: {stroke_width}"));
            line
        }
        Shape::Circle {
            center,
            radius,
            status,
        } => {
            let mut circle = Element::new("circle");
            circle.assign("cx", center.x);
            circle.assign("cy", center.y);
            circle.assign("r", *radius);
            circle.assign("fill", status.svg_fill());
            circle
        }
        Shape::Text { anchor, content } => {
            let mut text = Element::new("text");
            text.assign("x", anchor.x);
            text.assign("y", anchor.y);
            text.append(Text::new(content.as_str()));
            text
        }
    };

    element.assign("class", primitive.class);
    if let Some(id) = &primitive.datum {
        element.assign("data-id", id.as_str());
    }
    if let Some(transform) = primitive.transform {
        element.assign("transform", transform.to_string());
    }
    element
}

/// Serialise the scene as a standalone SVG document.
#[must_use]
pub fn to_svg(scene: &Scene) -> String {
    let mut doc = Document::new()
        .set("id", "map-container")
        .set("width", scene.width)
        .set("height", scene.height)
        .set("viewBox", (0.0, 0.0, scene.width, scene.height));

    for primitive in scene.primitives() {
        doc = doc.add(element(primitive));
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

pub fn write_svg(scene: &Scene, path: &FsPath) -> Result<()> {
    fs::write(path, to_svg(scene)).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        "wrote {} ({} primitives)",
        path.display(),
        scene.primitives().len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeStatus;
    use crate::map::ZoomTransform;
    use glam::DVec2;

    fn scene() -> Scene {
        let mut scene = Scene::new(2560.0, 960.0);
        scene.append(
            "land",
            Shape::Path {
                subpaths: vec![vec![DVec2::ZERO, DVec2::new(10.0, 0.0), DVec2::new(10.0, 10.0)]],
                closed: true,
            },
        );
        scene.append(
            "boundary",
            Shape::Path {
                subpaths: vec![vec![DVec2::ZERO, DVec2::new(10.0, 10.0)]],
                closed: false,
            },
        );
        for (from, to) in [(0.0, 10.0), (10.0, 20.0)] {
            scene.append(
                "link",
                Shape::Line {
                    from: DVec2::splat(from),
                    to: DVec2::splat(to),
                    stroke_width: 2.0,
                },
            );
        }
        scene
            .append(
                "node",
                Shape::Circle {
                    center: DVec2::new(5.0, 5.0),
                    radius: 3.0,
                    status: NodeStatus::Offline,
                },
            )
            .datum = Some("Sevilla".to_string());
        scene.append(
            "node-label",
            Shape::Text {
                anchor: DVec2::new(15.0, 0.0),
                content: "Sevilla & co".to_string(),
            },
        );
        scene
    }

    #[test]
    fn test_one_element_per_primitive() {
        let svg = to_svg(&scene());
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains("id=\"map-container\""));
        assert_eq!(svg.matches("<path").count(), 2);
        assert_eq!(svg.matches("class=\"link\"").count(), 2);
        assert_eq!(svg.matches("<circle").count(), 1);
        assert_eq!(svg.matches("<text").count(), 1);
    }

    #[test]
    fn test_node_attributes() {
        let svg = to_svg(&scene());
        assert!(svg.contains("r=\"3\""));
        assert!(svg.contains("fill=\"red\""));
        assert!(svg.contains("data-id=\"Sevilla\""));
        assert!(svg.contains("stroke-width: 2"));
        assert!(svg.contains("Sevilla &amp; co"));
    }

    #[test]
    fn test_transform_attribute_after_zoom() {
        let mut scene = scene();
        assert!(!to_svg(&scene).contains("transform="));

        scene.apply_transform(ZoomTransform {
            k: 2.0,
            x: 10.0,
            y: 5.0,
        });
        let svg = to_svg(&scene);
        assert_eq!(
            svg.matches("transform=\"translate(10,5) scale(2)\"").count(),
            scene.primitives().len()
        );
    }

    #[test]
    fn test_write_svg_to_missing_dir_is_io_error() {
        let err = write_svg(&scene(), FsPath::new("/no/such/dir/map.svg")).unwrap_err();
        assert!(matches!(err, MapError::Io { .. }));
    }
}
