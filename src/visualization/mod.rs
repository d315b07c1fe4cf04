/// Minimal SVG document builder
pub mod svg;

/// Per-cycle chart rendering
pub mod visualizer;

pub use visualizer::{ChartKind, Visualizer};
