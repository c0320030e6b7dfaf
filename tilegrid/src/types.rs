use crate::geometry::Rect;

/// The result of a packing run: a grid of `columns × rows` cells, each the size
/// of one tile.
///
/// Tiles are addressed by a global index in row-major order. `GridLayout` is a
/// pure description of geometry; it owns no pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub(crate) tile_size: (u32, u32),
    pub(crate) columns: u32,
    pub(crate) rows: u32,
}

impl GridLayout {
    /// Reconstructs a layout from stored geometry, like a previously written
    /// manifest. Returns `None` if any dimension is zero, or if the grid is
    /// too large for its pixel size to fit in a `u32`.
    pub fn from_parts(tile_size: (u32, u32), columns: u32, rows: u32) -> Option<Self> {
        if tile_size.0 == 0 || tile_size.1 == 0 || columns == 0 || rows == 0 {
            return None;
        }

        checked_size(tile_size, columns, rows)?;

        Some(Self {
            tile_size,
            columns,
            rows,
        })
    }

    #[inline]
    pub fn tile_size(&self) -> (u32, u32) {
        self.tile_size
    }

    #[inline]
    pub fn columns(&self) -> u32 {
        self.columns
    }

    #[inline]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of cells in the grid, used or not.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// Pixel size of the whole grid. Every constructor checks that this fits.
    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (
            self.columns * self.tile_size.0,
            self.rows * self.tile_size.1,
        )
    }

    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::new((0, 0), self.size())
    }

    /// The `(row, column)` cell for a global tile index.
    pub fn cell(&self, index: usize) -> Option<(u32, u32)> {
        if index >= self.capacity() {
            return None;
        }

        let columns = self.columns as usize;
        Some(((index / columns) as u32, (index % columns) as u32))
    }

    /// The pixel rectangle covered by the tile at a global index.
    pub fn cell_rect(&self, index: usize) -> Option<Rect> {
        let (row, column) = self.cell(index)?;

        Some(Rect::new(
            (column * self.tile_size.0, row * self.tile_size.1),
            self.tile_size,
        ))
    }

    /// Iterates over the placements of the first `count` tiles.
    pub fn placements(&self, count: usize) -> impl Iterator<Item = Placement> + '_ {
        (0..count.min(self.capacity())).filter_map(move |index| {
            let (row, column) = self.cell(index)?;
            let rect = self.cell_rect(index)?;

            Some(Placement {
                index,
                row,
                column,
                rect,
            })
        })
    }
}

pub(crate) fn checked_size(tile_size: (u32, u32), columns: u32, rows: u32) -> Option<(u32, u32)> {
    Some((
        columns.checked_mul(tile_size.0)?,
        rows.checked_mul(tile_size.1)?,
    ))
}

/// Where a single tile landed in a `GridLayout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub index: usize,
    pub row: u32,
    pub column: u32,
    pub rect: Rect,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn row_major_cells() {
        let layout = GridLayout::from_parts((10, 20), 3, 2).unwrap();

        assert_eq!(layout.cell(0), Some((0, 0)));
        assert_eq!(layout.cell(2), Some((0, 2)));
        assert_eq!(layout.cell(3), Some((1, 0)));
        assert_eq!(layout.cell(5), Some((1, 2)));
        assert_eq!(layout.cell(6), None);
    }

    #[test]
    fn cell_rects() {
        let layout = GridLayout::from_parts((10, 20), 3, 2).unwrap();

        assert_eq!(layout.cell_rect(4), Some(Rect::new((10, 20), (10, 20))));
        assert_eq!(layout.size(), (30, 40));
    }

    #[test]
    fn placements_are_disjoint_and_in_bounds() {
        let layout = GridLayout::from_parts((7, 9), 4, 3).unwrap();
        let placements: Vec<_> = layout.placements(10).collect();

        assert_eq!(placements.len(), 10);

        for (i, a) in placements.iter().enumerate() {
            assert!(layout.bounds().contains(&a.rect));

            for b in &placements[i + 1..] {
                assert!(!a.rect.intersects(&b.rect));
            }
        }
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert!(GridLayout::from_parts((0, 10), 1, 1).is_none());
        assert!(GridLayout::from_parts((10, 10), 0, 1).is_none());
    }

    #[test]
    fn oversized_grids_are_rejected() {
        assert!(GridLayout::from_parts((70_000, 10), 70_000, 1).is_none());
        assert!(GridLayout::from_parts((10, u32::MAX), 1, 2).is_none());

        let layout = GridLayout::from_parts((65_536, 1), 65_535, 1).unwrap();
        assert_eq!(layout.size(), (u32::MAX - 65_535, 1));
    }
}
