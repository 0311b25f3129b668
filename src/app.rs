use glam::DVec2;
use log::debug;

use region_map::data::LoadedMap;
use region_map::map::{
    frame_projection, render_scene, MapRenderer, Projection, Scene, SceneStyle, Viewport,
    ZoomTransform,
};
use region_map::{MapConfig, Result};

/// Node markers in braille pixels; fixed so they stay legible at any zoom.
const TERMINAL_NODE_RADIUS: f64 = 2.0;
/// Extra pick distance around a node marker, in braille pixels.
const PICK_TOLERANCE: f64 = 4.0;

/// Application state
pub struct App {
    pub config: MapConfig,
    pub map: LoadedMap,
    pub projection: Projection,
    pub scene: Scene,
    pub viewport: Viewport,
    pub map_renderer: MapRenderer,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position for cursor marker
    pub mouse_pos: Option<(u16, u16)>,
    /// Id of the node picked with the mouse
    pub selected: Option<String>,
}

/// Braille pixel size of the map area inside the border and above the
/// status bar.
fn surface_pixels(width: usize, height: usize) -> (usize, usize) {
    let inner_width = width.saturating_sub(2);
    let inner_height = height.saturating_sub(3); // 2 for border + 1 for status bar
    (inner_width * 2, inner_height * 4)
}

/// Terminal cell to braille pixel, accounting for the 1 cell border.
fn cell_to_pixel(col: u16, row: u16) -> (i32, i32) {
    (
        (col.saturating_sub(1) as i32) * 2,
        (row.saturating_sub(1) as i32) * 4,
    )
}

impl App {
    pub fn new(map: LoadedMap, config: MapConfig, width: usize, height: usize) -> Result<Self> {
        let (pixel_width, pixel_height) = surface_pixels(width, height);
        let mut map_renderer = MapRenderer::new();
        map_renderer.settings.show_labels = config.show_labels;

        let mut app = Self {
            viewport: Viewport::new(pixel_width, pixel_height, config.scale_extent, config.zoom_step),
            projection: Projection::natural_earth(),
            scene: Scene::default(),
            config,
            map,
            map_renderer,
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
            selected: None,
        };
        app.rebuild_scene()?;
        Ok(app)
    }

    /// Project the map onto the current surface and redraw the scene,
    /// keeping the current zoom.
    fn rebuild_scene(&mut self) -> Result<()> {
        let (w, h) = (self.viewport.width as f64, self.viewport.height as f64);
        self.projection = frame_projection(self.config.terminal_framing, w, h, &self.map);

        let style = SceneStyle {
            node_radius: TERMINAL_NODE_RADIUS,
            // Labels are always in the scene; the renderer decides whether to show them.
            show_labels: true,
            ..SceneStyle::from(&self.config)
        };
        let mut scene = Scene::new(w, h);
        render_scene(&mut scene, &self.map, &self.projection, &style)?;
        scene.apply_transform(self.viewport.transform);
        self.scene = scene;
        debug!(
            "scene rebuilt for {}x{} surface, {} primitives",
            self.viewport.width,
            self.viewport.height,
            self.scene.primitives().len()
        );
        Ok(())
    }

    /// Zoom handler: push the new transform to every primitive.
    fn zoomed(&mut self, transform: ZoomTransform) {
        self.scene.apply_transform(transform);
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) -> Result<()> {
        let (pixel_width, pixel_height) = surface_pixels(width, height);
        self.viewport.width = pixel_width;
        self.viewport.height = pixel_height;
        self.rebuild_scene()
    }

    /// Pan the map
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let t = self.viewport.pan(dx, dy);
        self.zoomed(t);
    }

    pub fn zoom_in(&mut self) {
        let t = self.viewport.zoom_in();
        self.zoomed(t);
    }

    pub fn zoom_out(&mut self) {
        let t = self.viewport.zoom_out();
        self.zoomed(t);
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_pixel(col, row);
        let t = self.viewport.zoom_in_at(px, py);
        self.zoomed(t);
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_pixel(col, row);
        let t = self.viewport.zoom_out_at(px, py);
        self.zoomed(t);
    }

    pub fn reset(&mut self) {
        let t = self.viewport.reset();
        self.zoomed(t);
        self.selected = None;
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.transform.k)
    }

    /// Geographic coordinates under the centre of the view
    pub fn center_coords(&self) -> String {
        let center = self.viewport.invert(
            self.viewport.width as i32 / 2,
            self.viewport.height as i32 / 2,
        );
        let (lon, lat) = self.projection.invert(center);
        format!(
            "{:.1}°{}, {:.1}°{}",
            lat.abs(),
            if lat >= 0.0 { "N" } else { "S" },
            lon.abs(),
            if lon >= 0.0 { "E" } else { "W" }
        )
    }

    /// Handle mouse drag
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            // One cell is 2x4 braille pixels.
            let dx = (last_x as i32 - x as i32) * 2;
            let dy = (last_y as i32 - y as i32) * 4;
            self.pan(dx, dy);
        }
        self.last_mouse = Some((x, y));
    }

    /// Reset drag state when mouse button released
    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    /// Update mouse cursor position
    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
    }

    /// Get mouse position in braille pixel coordinates (for rendering marker)
    pub fn mouse_pixel_pos(&self) -> Option<(i32, i32)> {
        self.mouse_pos.map(|(col, row)| cell_to_pixel(col, row))
    }

    /// Pick the node under a terminal cell; clears the selection on a miss.
    pub fn select_at(&mut self, col: u16, row: u16) {
        let (px, py) = cell_to_pixel(col, row);
        self.selected = self
            .scene
            .node_at(DVec2::new(px as f64, py as f64), PICK_TOLERANCE)
            .map(str::to_string);
        if let Some(id) = &self.selected {
            debug!("selected node {id}");
        }
    }

    /// Map block title: the topology file and how many regions it holds
    pub fn title(&self) -> String {
        let file = self
            .map
            .source
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.map.source.display().to_string());
        format!(" {file} · {} regions ", self.map.region_names().len())
    }

    /// "Madrid (online)" for the selected node
    pub fn selected_info(&self) -> Option<String> {
        let id = self.selected.as_deref()?;
        let node = self.map.graph.node(id).ok()?;
        Some(format!("{} ({})", node.id, node.status.label()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use region_map::graph::Graph;
    use region_map::map::Shape;
    use region_map::topo::Topology;
    use std::path::PathBuf;

    const SAMPLE: &str = include_str!("../data/sample_regions.json");

    fn app() -> App {
        let mut bytes = SAMPLE.as_bytes().to_vec();
        let topology = Topology::from_slice(&mut bytes).unwrap();
        let map = LoadedMap::from_topology(
            PathBuf::from("data/sample_regions.json"),
            &topology,
            "autonomous_regions",
            Graph::builtin(),
        )
        .unwrap();
        App::new(map, MapConfig::default(), 100, 40).unwrap()
    }

    fn node_cell(app: &App, id: &str) -> (u16, u16) {
        let primitive = app
            .scene
            .select("node")
            .find(|p| p.datum.as_deref() == Some(id))
            .unwrap();
        let Shape::Circle { center, .. } = &primitive.shape else {
            panic!("node must be a circle");
        };
        let p = app.viewport.transform.apply(*center);
        ((p.x / 2.0).round() as u16 + 1, (p.y / 4.0).round() as u16 + 1)
    }

    #[test]
    fn test_surface_excludes_border_and_status_bar() {
        let app = app();
        assert_eq!((app.viewport.width, app.viewport.height), (196, 148));
        assert_eq!(app.scene.select("node").count(), 4);
    }

    #[test]
    fn test_zoom_updates_every_primitive() {
        let mut app = app();
        app.zoom_in();
        let t = app.viewport.transform;
        assert_eq!(t.k, 1.5);
        assert!(app.scene.primitives().iter().all(|p| p.transform == Some(t)));
        assert_eq!(app.zoom_level(), "1.5x");
    }

    #[test]
    fn test_zoom_saturates_at_extent() {
        let mut app = app();
        for _ in 0..30 {
            app.zoom_in_at(10, 10);
        }
        assert_eq!(app.viewport.transform.k, 20.0);
        app.reset();
        assert_eq!(app.viewport.transform, ZoomTransform::IDENTITY);
    }

    #[test]
    fn test_drag_pans_by_cells() {
        let mut app = app();
        app.last_mouse = Some((10, 10));
        app.handle_drag(12, 9);
        let t = app.viewport.transform;
        assert_eq!((t.x, t.y), (4.0, -4.0));
        app.end_drag();
        assert!(app.last_mouse.is_none());
    }

    #[test]
    fn test_click_selects_node() {
        let mut app = app();
        let (col, row) = node_cell(&app, "Madrid");
        app.select_at(col, row);
        assert_eq!(app.selected.as_deref(), Some("Madrid"));
        assert_eq!(app.selected_info().as_deref(), Some("Madrid (online)"));

        app.select_at(1, 1);
        assert!(app.selected.is_none());
    }

    #[test]
    fn test_resize_keeps_zoom() {
        let mut app = app();
        app.zoom_in();
        app.resize(60, 20).unwrap();
        assert_eq!(app.viewport.width, 116);
        assert!(app
            .scene
            .primitives()
            .iter()
            .all(|p| p.transform == Some(app.viewport.transform)));
    }

    #[test]
    fn test_title_names_source_and_regions() {
        assert_eq!(app().title(), " sample_regions.json · 4 regions ");
    }

    #[test]
    fn test_center_coords_inside_map() {
        let app = app();
        let text = app.center_coords();
        assert!(text.ends_with("W") || text.ends_with("E"), "{text}");
        assert!(text.contains("°N"), "{text}");
    }
}
