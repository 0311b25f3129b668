mod geometry;
mod projection;
mod renderer;
mod scene;
mod viewport;

/// A sequence of (lon, lat) points
pub type LineString = Vec<(f64, f64)>;

pub use projection::Projection;
pub use renderer::{
    frame_projection, render_scene, DisplaySettings, MapLayers, MapRenderer, NodeLayer,
    SceneStyle,
};
pub use scene::{Kind, Primitive, Scene, Shape};
pub use viewport::{Viewport, ZoomTransform};
