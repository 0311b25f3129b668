use crate::app::App;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
    Frame,
};
use region_map::braille::BrailleCanvas;
use region_map::graph::NodeStatus;
use region_map::map::MapLayers;

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Split into map area and status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_map(frame, app, chunks[0]);
    render_status_bar(frame, app, chunks[1]);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            app.title(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let layers = app.map_renderer.render(
        &app.scene,
        inner.width as usize,
        inner.height as usize,
        &app.viewport,
    );

    let cursor_pos = app.mouse_pixel_pos().and_then(|(px, py)| {
        let cx = (px / 2) as u16;
        let cy = (py / 4) as u16;
        (cx < inner.width && cy < inner.height).then_some((cx, cy))
    });

    frame.render_widget(
        MapWidget {
            layers,
            cursor_pos,
            selected: app.selected.clone(),
        },
        inner,
    );
}

fn status_color(status: NodeStatus) -> Color {
    match status {
        NodeStatus::Offline => Color::Red,
        NodeStatus::Degraded => Color::Rgb(255, 165, 0),
        // Black is invisible on most terminals.
        NodeStatus::Online => Color::White,
    }
}

/// Braille map layers with text labels overlaid
struct MapWidget {
    layers: MapLayers,
    cursor_pos: Option<(u16, u16)>,
    selected: Option<String>,
}

impl MapWidget {
    /// Render a braille canvas layer with a specific color
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for (row_idx, row_str) in canvas.rows().enumerate().take(area.height as usize) {
            let y = area.y + row_idx as u16;
            for (col_idx, ch) in row_str.chars().enumerate().take(area.width as usize) {
                // Skip empty braille characters (U+2800)
                if ch == '\u{2800}' {
                    continue;
                }
                let x = area.x + col_idx as u16;
                buf[(x, y)].set_char(ch).set_fg(color);
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Back to front: land, boundaries, links, nodes.
        Self::render_layer(&self.layers.land, Color::DarkGray, area, buf);
        Self::render_layer(&self.layers.boundaries, Color::Yellow, area, buf);
        Self::render_layer(&self.layers.links, Color::Cyan, area, buf);
        for layer in &self.layers.nodes {
            Self::render_layer(&layer.canvas, status_color(layer.status), area, buf);
        }

        for (lx, ly, text) in &self.layers.labels {
            if *ly >= area.height || *lx >= area.width {
                continue;
            }
            let style = if self.selected.as_deref() == Some(text.as_str()) {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let max_len = area.width.saturating_sub(*lx) as usize;
            for (i, ch) in text.chars().take(max_len).enumerate() {
                buf[(area.x + lx + i as u16, area.y + ly)]
                    .set_char(ch)
                    .set_style(style);
            }
        }

        if let Some((cx, cy)) = self.cursor_pos {
            buf[(area.x + cx, area.y + cy)]
                .set_char('╋')
                .set_fg(Color::Red);
        }
    }
}

fn toggle(on: bool, on_text: &'static str, off_text: &'static str) -> Span<'static> {
    Span::styled(
        if on { on_text } else { off_text },
        Style::default().fg(if on { Color::Green } else { Color::DarkGray }),
    )
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let settings = &app.map_renderer.settings;

    let mut spans = vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        toggle(settings.show_land, "[A]rea ", "[a]rea "),
        toggle(settings.show_boundaries, "[B]ound ", "[b]ound "),
        toggle(settings.show_network, "[N]odes ", "[n]odes "),
        toggle(settings.show_labels, "[L]abels ", "[l]abels "),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
    ];
    if let Some(info) = app.selected_info() {
        spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(
            info,
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
    }
    spans.push(Span::styled(
        " | hjkl:pan +/-:zoom r:reset q:quit",
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
