mod app;
mod ui;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use log::{debug, error, info, LevelFilter};
use ratatui::DefaultTerminal;
use region_map::data::{self, LoadedMap};
use region_map::map::{frame_projection, render_scene, Scene, SceneStyle};
use region_map::config::ConfigOverrides;
use region_map::{export, MapConfig};

/// Spain's autonomous regions with a city network overlay, in the
/// terminal or as SVG.
#[derive(Parser)]
#[command(version)]
struct Cli {
    /// TopoJSON file with the regions.
    #[arg(long)]
    topology: Option<PathBuf>,

    /// Object inside the topology holding the regions.
    #[arg(long)]
    object: Option<String>,

    /// Geo-info JSON file replacing the built-in cities.
    #[arg(long)]
    graph: Option<PathBuf>,

    /// JSON config file; command line flags override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write an SVG to this path instead of starting the terminal UI.
    #[arg(long, value_name = "OUT")]
    svg: Option<PathBuf>,

    /// Window width; the SVG surface is twice as wide.
    #[arg(long)]
    width: Option<f64>,

    /// Window height.
    #[arg(long)]
    height: Option<f64>,

    /// Log file for the terminal UI, which owns stderr while it runs.
    #[arg(long, default_value = "region-map.log")]
    log_file: PathBuf,

    /// More logging (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn config(&self) -> Result<MapConfig> {
        let overrides = ConfigOverrides {
            topology: self.topology.clone(),
            object: self.object.clone(),
            graph: self.graph.clone(),
            window_width: self.width,
            window_height: self.height,
        };
        Ok(MapConfig::resolve(self.config.as_deref(), &overrides)?)
    }

    fn level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// `RUST_LOG` wins over `-v`. The terminal UI logs to a file.
fn init_logging(cli: &Cli) -> Result<()> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(cli.level()).parse_default_env();
    if cli.svg.is_none() {
        let file = File::create(&cli.log_file)
            .with_context(|| format!("creating log file {}", cli.log_file.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        error!("{err:#}");
        eprintln!("region-map: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    init_logging(cli)?;
    let config = cli.config()?;

    // Nothing is drawn unless the whole load succeeds.
    let map = data::load_map(&config)
        .with_context(|| format!("loading map data from {}", config.topology.display()))?;
    info!(
        "{} regions, {} nodes, {} links",
        map.regions.features.len(),
        map.graph.nodes().len(),
        map.graph.links().len()
    );
    debug!("regions: {}", map.region_names().join(", "));

    match &cli.svg {
        Some(out) => write_svg(&map, &config, out),
        None => run_terminal(map, config),
    }
}

/// Static render of the full scene to an SVG file.
fn write_svg(map: &LoadedMap, config: &MapConfig, out: &Path) -> Result<()> {
    let (width, height) = config.surface_size();
    let projection = frame_projection(config.framing, width, height, map);
    let mut scene = Scene::new(width, height);
    render_scene(&mut scene, map, &projection, &SceneStyle::from(config))?;
    export::write_svg(&scene, out)?;
    Ok(())
}

fn run_terminal(map: LoadedMap, config: MapConfig) -> Result<()> {
    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run_loop(&mut terminal, map, config);

    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Handle mouse events for panning, zooming and picking
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    // Always track mouse position for cursor marker
    app.set_mouse_pos(mouse.column, mouse.row);

    match mouse.kind {
        // Scroll wheel zooms towards the mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        // Click picks a node, drag pans
        MouseEventKind::Down(MouseButton::Left) => {
            app.select_at(mouse.column, mouse.row);
            app.last_mouse = Some((mouse.column, mouse.row));
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.end_drag();
        }
        _ => {}
    }
}

fn run_loop(terminal: &mut DefaultTerminal, map: LoadedMap, config: MapConfig) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(map, config, size.width as usize, size.height as usize)?;

    loop {
        terminal.draw(|frame| ui::render(frame, &app))?;

        // ~60fps
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.quit(),

                    // Pan with hjkl or arrow keys
                    KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
                    KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
                    KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
                    KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

                    // Zoom
                    KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                    KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                    // Layer toggles
                    KeyCode::Char('a') | KeyCode::Char('A') => app.map_renderer.toggle_land(),
                    KeyCode::Char('b') | KeyCode::Char('B') => {
                        app.map_renderer.toggle_boundaries();
                    }
                    KeyCode::Char('n') | KeyCode::Char('N') => app.map_renderer.toggle_network(),
                    KeyCode::Char('L') => app.map_renderer.toggle_labels(),

                    // Reset view
                    KeyCode::Char('r') | KeyCode::Char('0') => app.reset(),

                    _ => {}
                },
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width as usize, height as usize)?,
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
