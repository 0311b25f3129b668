//! The drawing surface as plain data.
//!
//! A [`Scene`] is an append-only list of primitives in surface
//! coordinates. Every primitive carries its own `transform`, set in one
//! go by [`Scene::apply_transform`] whenever the viewport changes.

use glam::DVec2;

use crate::graph::NodeStatus;
use crate::map::viewport::ZoomTransform;

/// Element type, mirroring the SVG tag it exports to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Path,
    Line,
    Circle,
    Text,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Subpaths; `closed` paths are filled.
    Path {
        subpaths: Vec<Vec<DVec2>>,
        closed: bool,
    },
    Line {
        from: DVec2,
        to: DVec2,
        stroke_width: f64,
    },
    Circle {
        center: DVec2,
        radius: f64,
        status: NodeStatus,
    },
    Text {
        anchor: DVec2,
        content: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub class: &'static str,
    /// Id of the node a circle or label was drawn for.
    pub datum: Option<String>,
    pub shape: Shape,
    pub transform: Option<ZoomTransform>,
}

impl Primitive {
    pub fn kind(&self) -> Kind {
        match self.shape {
            Shape::Path { .. } => Kind::Path,
            Shape::Line { .. } => Kind::Line,
            Shape::Circle { .. } => Kind::Circle,
            Shape::Text { .. } => Kind::Text,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    primitives: Vec<Primitive>,
}

impl Scene {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            primitives: Vec::new(),
        }
    }

    pub fn append(&mut self, class: &'static str, shape: Shape) -> &mut Primitive {
        self.primitives.push(Primitive {
            class,
            datum: None,
            shape,
            transform: None,
        });
        let last = self.primitives.len() - 1;
        &mut self.primitives[last]
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn select<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a Primitive> + 'a {
        self.primitives.iter().filter(move |p| p.class == class)
    }

    pub fn count(&self, kind: Kind) -> usize {
        self.primitives.iter().filter(|p| p.kind() == kind).count()
    }

    /// Zoom handler: set `transform` on every primitive. Overwrites, so
    /// applying the same transform twice leaves the scene unchanged.
    pub fn apply_transform(&mut self, transform: ZoomTransform) {
        for primitive in &mut self.primitives {
            primitive.transform = Some(transform);
        }
    }

    /// Node whose marker is drawn closest to `screen`, within `tolerance`
    /// pixels of its rim.
    pub fn node_at(&self, screen: DVec2, tolerance: f64) -> Option<&str> {
        self.primitives
            .iter()
            .filter_map(|p| match (&p.shape, &p.datum) {
                (Shape::Circle { center, radius, .. }, Some(id)) => {
                    let t = p.transform.unwrap_or_default();
                    let distance = t.apply(*center).distance(screen);
                    (distance <= radius * t.k + tolerance).then_some((distance, id.as_str()))
                }
                _ => None,
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, id)| id)
    }
}
