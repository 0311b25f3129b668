use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{MapError, Result};

/// How the projection is placed on the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum Framing {
    /// Fixed scale, translation proportional to the surface size.
    Fixed {
        scale: f64,
        /// Translation as fractions of (surface width, surface height).
        translate: [f64; 2],
    },
    /// Scale and centre chosen so the map fills the surface.
    Fit {
        /// Margin in surface pixels kept free on every side.
        padding: f64,
    },
}

impl Framing {
    pub fn fixed() -> Self {
        Framing::Fixed {
            scale: 5000.0,
            translate: [1.0 / 3.0, 4.3],
        }
    }
}

/// Runtime settings. Every field has a default, so a config file only
/// needs the keys it changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub topology: PathBuf,
    /// Object inside the topology holding the regions. Must match exactly.
    pub object: String,
    /// Optional geo-info file replacing the built-in city graph.
    pub graph: Option<PathBuf>,
    pub window_width: f64,
    pub window_height: f64,
    /// Framing for SVG output.
    pub framing: Framing,
    /// Framing for the terminal, whose pixel surface is much smaller.
    pub terminal_framing: Framing,
    pub scale_extent: [f64; 2],
    pub zoom_step: f64,
    pub node_radius: f64,
    pub link_width: f64,
    pub show_labels: bool,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            topology: PathBuf::from("data/spain.json"),
            object: "autonomous_regions".to_string(),
            graph: None,
            window_width: 1280.0,
            window_height: 960.0,
            framing: Framing::fixed(),
            terminal_framing: Framing::Fit { padding: 4.0 },
            scale_extent: [1.0, 20.0],
            zoom_step: 1.5,
            node_radius: 3.0,
            link_width: 2.0,
            show_labels: true,
        }
    }
}

/// Values given on the command line; `None` keeps the configured value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub topology: Option<PathBuf>,
    pub object: Option<String>,
    pub graph: Option<PathBuf>,
    pub window_width: Option<f64>,
    pub window_height: Option<f64>,
}

impl MapConfig {
    /// Read a JSON config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| MapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| MapError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults, then the config file if one is given, then `overrides`.
    pub fn resolve(file: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply(overrides);
        Ok(config)
    }

    /// Replace every field `overrides` sets.
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(topology) = &overrides.topology {
            self.topology = topology.clone();
        }
        if let Some(object) = &overrides.object {
            self.object = object.clone();
        }
        if let Some(graph) = &overrides.graph {
            self.graph = Some(graph.clone());
        }
        if let Some(width) = overrides.window_width {
            self.window_width = width;
        }
        if let Some(height) = overrides.window_height {
            self.window_height = height;
        }
    }

    /// Surface size for SVG output: twice the window width by the window height.
    pub fn surface_size(&self) -> (f64, f64) {
        (self.window_width * 2.0, self.window_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = MapConfig::default();
        assert_eq!(config.object, "autonomous_regions");
        assert_eq!(config.scale_extent, [1.0, 20.0]);
        assert_eq!(config.surface_size(), (2560.0, 960.0));
        assert_eq!(config.framing, Framing::fixed());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: MapConfig = serde_json::from_str(
            r#"{ "object": "provinces", "framing": { "mode": "fit", "padding": 10.0 } }"#,
        )
        .unwrap();
        assert_eq!(config.object, "provinces");
        assert_eq!(config.framing, Framing::Fit { padding: 10.0 });
        assert_eq!(config.node_radius, 3.0);
        assert_eq!(config.topology, PathBuf::from("data/spain.json"));
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = std::env::temp_dir().join(format!("region-map-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        fs::write(
            &path,
            r#"{ "object": "provinces", "window_width": 800.0, "window_height": 600.0 }"#,
        )
        .unwrap();

        let overrides = ConfigOverrides {
            topology: Some(PathBuf::from("other.json")),
            window_width: Some(1000.0),
            ..ConfigOverrides::default()
        };
        let config = MapConfig::resolve(Some(&path), &overrides).unwrap();

        assert_eq!(config.topology, PathBuf::from("other.json"));
        assert_eq!(config.object, "provinces");
        assert_eq!(config.window_width, 1000.0);
        assert_eq!(config.window_height, 600.0);
        assert_eq!(config.graph, None);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_no_file_no_flags_is_default() {
        let config = MapConfig::resolve(None, &ConfigOverrides::default()).unwrap();
        assert_eq!(config.object, MapConfig::default().object);
        assert_eq!(config.surface_size(), (2560.0, 960.0));
    }

    #[test]
    fn test_missing_config_file_is_io_error() {
        let err = MapConfig::from_file(Path::new("does/not/exist.json")).unwrap_err();
        assert!(matches!(err, MapError::Io { .. }));
    }
}
