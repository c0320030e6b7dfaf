//! Tilegrid is a small library for laying out equally-sized tiles into a
//! row-major grid. It was built for gazeatlas, which packs per-angle face
//! frames into a single sprite atlas.
//!
//! Unlike general rectangle packers, tilegrid never reorders or rotates its
//! inputs: tile `i` always lands in cell `(i / columns, i % columns)`, which
//! lets consumers recompute any tile's position from its index alone.
//!
//! ## Example
//! ```
//! use tilegrid::GridPacker;
//!
//! // Twelve 128x160 tiles, with at most 512 pixels of width to spend.
//! let packer = GridPacker::new().max_width(512);
//! let layout = packer.pack((128, 160), 12).unwrap();
//!
//! assert_eq!(layout.columns(), 4);
//! assert_eq!(layout.rows(), 3);
//!
//! // Tile 5 sits in the second row, second column.
//! let rect = layout.cell_rect(5).unwrap();
//! assert_eq!(rect.pos, (128, 160));
//! ```

mod geometry;
mod packer;
mod types;

pub use geometry::*;
pub use packer::*;
pub use types::*;
