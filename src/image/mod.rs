//! Raster containers used throughout the pipeline.
//!
//! - [`RgbaImage`]: borrowed view over decoded RGBA8 input.
//! - [`Grid`]: owned row-major 2D storage with bounds-safe accessors, backing
//!   the colour-index map, the facet map and the scratch bitmaps.
pub mod grid;
pub mod io;
pub mod rgba;

pub use self::grid::Grid;
pub use self::rgba::{OwnedRgbaImage, RgbaImage};
