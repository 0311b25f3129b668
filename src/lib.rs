//! Spain's autonomous regions drawn from TopoJSON, with a small network
//! of cities overlaid. The map is built as a [`map::Scene`] that the
//! terminal UI rasterises and [`export`] writes out as SVG.

pub mod braille;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod graph;
pub mod map;
pub mod topo;

pub use config::MapConfig;
pub use error::{MapError, Result};
