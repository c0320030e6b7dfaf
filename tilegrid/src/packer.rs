use std::convert::TryFrom;

use crate::types::{checked_size, GridLayout};

/// Lays out a run of equally-sized tiles into a row-major grid.
///
/// The packer picks the widest grid that fits inside `max_width`, which
/// minimizes the number of rows. It never produces more columns than there are
/// tiles, and never fewer than one, even if a single tile is wider than
/// `max_width`.
#[derive(Debug, Clone)]
pub struct GridPacker {
    max_width: u32,
}

impl Default for GridPacker {
    fn default() -> Self {
        Self::new()
    }
}

impl GridPacker {
    pub fn new() -> Self {
        Self { max_width: 4096 }
    }

    pub fn max_width(self, max_width: u32) -> Self {
        Self { max_width }
    }

    /// Computes a layout for `count` tiles of `tile_size`.
    ///
    /// Returns `None` if there is nothing to lay out, if the tile has a zero
    /// dimension, or if the grid would be too large to address in pixels.
    pub fn pack(&self, tile_size: (u32, u32), count: usize) -> Option<GridLayout> {
        if count == 0 || tile_size.0 == 0 || tile_size.1 == 0 {
            return None;
        }

        let count = u32::try_from(count).ok()?;
        let fitting = (self.max_width / tile_size.0).max(1);
        let columns = fitting.min(count);
        let rows = count / columns + u32::from(count % columns != 0);

        if checked_size(tile_size, columns, rows).is_none() {
            log::debug!(
                "{} rows of {}x{} tiles overflow the pixel grid",
                rows,
                tile_size.0,
                tile_size.1
            );

            return None;
        }

        if tile_size.0 > self.max_width {
            log::debug!(
                "Tile width {} exceeds max width {}, forcing a single column",
                tile_size.0,
                self.max_width
            );
        }

        log::trace!(
            "Packed {} tiles of {}x{} into {} columns and {} rows",
            count,
            tile_size.0,
            tile_size.1,
            columns,
            rows
        );

        Some(GridLayout {
            tile_size,
            columns,
            rows,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn single_tile() {
        let layout = GridPacker::new().pack((64, 80), 1).unwrap();

        assert_eq!(layout.columns(), 1);
        assert_eq!(layout.rows(), 1);
        assert_eq!(layout.size(), (64, 80));
    }

    #[test]
    fn nothing_to_pack() {
        assert!(GridPacker::new().pack((64, 64), 0).is_none());
        assert!(GridPacker::new().pack((0, 64), 4).is_none());
    }

    #[test]
    fn rows_are_ceiling_of_count_over_columns() {
        let packer = GridPacker::new().max_width(1000);

        for count in 1..=40 {
            let layout = packer.pack((100, 120), count).unwrap();
            let expected_columns = 10.min(count as u32);

            assert_eq!(layout.columns(), expected_columns);
            assert_eq!(
                layout.rows(),
                (count as u32 + expected_columns - 1) / expected_columns
            );
            assert!(layout.columns() as usize <= count);
        }
    }

    #[test]
    fn wide_tile_still_gets_one_column() {
        let layout = GridPacker::new().max_width(100).pack((256, 256), 3).unwrap();

        assert_eq!(layout.columns(), 1);
        assert_eq!(layout.rows(), 3);
        assert_eq!(layout.size(), (256, 768));
    }

    #[test]
    fn overflowing_grid() {
        let packer = GridPacker::new().max_width(4096);

        assert!(packer.pack((70_000, 70_000), 70_000).is_none());
        assert!(packer.pack((1, 1), (u64::from(u32::MAX) + 1) as usize).is_none());
    }

    #[test]
    fn width_stays_within_budget() {
        let layout = GridPacker::new().max_width(1000).pack((300, 300), 12).unwrap();

        assert_eq!(layout.columns(), 3);
        assert_eq!(layout.rows(), 4);
        assert!(layout.size().0 <= 1000);
    }
}
