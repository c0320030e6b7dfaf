use std::path::Path;

use fs_err as fs;
use serde::{Deserialize, Serialize};
use tilegrid::GridLayout;

use crate::{angle::Degrees, error::AtlasError};

/// Describes where every frame of every section lives inside an atlas image.
///
/// The manifest is written next to the atlas and is all a viewer needs to turn
/// a `(section, angle)` pair into a pixel rectangle; nothing is recomputed from
/// the image itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub tile_width: u32,
    pub tile_height: u32,
    pub columns: u32,
    pub rows: u32,
    pub sections: Vec<ManifestSection>,
}

/// A run of contiguous tiles sharing one rendering style.
///
/// Tile indices are never stored per angle: the tile for `angles[i]` is always
/// `start_index + i`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestSection {
    pub name: String,
    pub start_index: usize,
    pub angles: Vec<Degrees>,
}

impl ManifestSection {
    /// The global tile index of the frame at `angle`, if this section has one.
    pub fn angle_to_index(&self, angle: Degrees) -> Option<usize> {
        self.angles
            .iter()
            .position(|&candidate| candidate == angle)
            .and_then(|position| self.start_index.checked_add(position))
    }

    /// One past the last tile index used by this section, or `None` if that
    /// can't be represented.
    pub fn end_index(&self) -> Option<usize> {
        self.start_index.checked_add(self.angles.len())
    }
}

impl Manifest {
    pub fn layout(&self) -> Result<GridLayout, AtlasError> {
        GridLayout::from_parts(
            (self.tile_width, self.tile_height),
            self.columns,
            self.rows,
        )
        .ok_or_else(|| {
            AtlasError::mismatch(format!(
                "grid of {}x{} tiles sized {}x{} is empty or too large",
                self.columns, self.rows, self.tile_width, self.tile_height
            ))
        })
    }

    /// Pixel size of the atlas this manifest describes.
    pub fn atlas_size(&self) -> Result<(u32, u32), AtlasError> {
        let layout = self.layout()?;
        Ok(layout.size())
    }

    pub fn section_index(&self, name: &str) -> Option<usize> {
        self.sections.iter().position(|section| section.name == name)
    }

    /// Checks that the manifest is internally consistent: every section fits in
    /// the grid, sections don't share tiles, and angles are sorted, unique and
    /// below 360.
    pub fn validate(&self) -> Result<(), AtlasError> {
        let layout = self.layout()?;
        let mut ranges = Vec::with_capacity(self.sections.len());

        for section in &self.sections {
            let end_index = match section.end_index() {
                Some(end_index) if end_index <= layout.capacity() => end_index,
                _ => {
                    return Err(AtlasError::mismatch(format!(
                        "section '{}' starts at tile {} with {} frames but the {}x{} grid only has {}",
                        section.name,
                        section.start_index,
                        section.angles.len(),
                        self.columns,
                        self.rows,
                        layout.capacity()
                    )));
                }
            };

            if section.angles.iter().any(|&angle| angle >= 360)
                || section.angles.windows(2).any(|pair| pair[0] >= pair[1])
            {
                return Err(AtlasError::mismatch(format!(
                    "section '{}' has angles that aren't strictly ascending within [0, 360)",
                    section.name
                )));
            }

            if end_index > section.start_index {
                ranges.push((section.start_index, end_index, section.name.as_str()));
            }
        }

        ranges.sort();

        for pair in ranges.windows(2) {
            if pair[1].0 < pair[0].1 {
                return Err(AtlasError::mismatch(format!(
                    "sections '{}' and '{}' share tiles",
                    pair[0].2, pair[1].2
                )));
            }
        }

        Ok(())
    }

    /// Checks the manifest against the pixel size of the atlas it was loaded
    /// with.
    pub fn check_atlas_size(&self, actual: (u32, u32)) -> Result<(), AtlasError> {
        let expected = self.atlas_size()?;

        if expected != actual {
            return Err(AtlasError::mismatch(format!(
                "manifest describes a {}x{} atlas ({} columns, {} rows of {}x{} tiles) but the image is {}x{}",
                expected.0,
                expected.1,
                self.columns,
                self.rows,
                self.tile_width,
                self.tile_height,
                actual.0,
                actual.1
            )));
        }

        Ok(())
    }

    pub fn to_json(&self) -> Result<String, AtlasError> {
        serde_json::to_string_pretty(self).map_err(|err| AtlasError::Encode {
            message: err.to_string(),
        })
    }

    pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Self, AtlasError> {
        let path = path.as_ref();
        let contents = fs::read(path)?;

        let manifest = serde_json::from_slice(&contents).map_err(|source| AtlasError::Manifest {
            path: path.to_owned(),
            source,
        })?;

        log::trace!("Loaded manifest from {}", path.display());

        Ok(manifest)
    }
}

#[cfg(test)]
impl Manifest {
    pub fn section(&self, name: &str) -> Option<&ManifestSection> {
        self.sections.iter().find(|section| section.name == name)
    }

    /// The rectangle of the atlas holding a section's frame at `angle`.
    pub fn crop_rect(&self, section: &str, angle: Degrees) -> Option<tilegrid::Rect> {
        let index = self.section(section)?.angle_to_index(angle)?;
        let layout = self.layout().ok()?;

        layout.cell_rect(index)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use tilegrid::Rect;

    fn two_sections() -> Manifest {
        Manifest {
            tile_width: 100,
            tile_height: 120,
            columns: 4,
            rows: 2,
            sections: vec![
                ManifestSection {
                    name: "default".to_owned(),
                    start_index: 0,
                    angles: vec![0, 90, 180, 270],
                },
                ManifestSection {
                    name: "cowboy".to_owned(),
                    start_index: 4,
                    angles: vec![0, 90, 180],
                },
            ],
        }
    }

    #[test]
    fn angle_to_index_is_derived_from_start() {
        let manifest = two_sections();
        let cowboy = manifest.section("cowboy").unwrap();

        assert_eq!(cowboy.angle_to_index(0), Some(4));
        assert_eq!(cowboy.angle_to_index(180), Some(6));
        assert_eq!(cowboy.angle_to_index(270), None);
    }

    #[test]
    fn crop_rects() {
        let manifest = two_sections();

        assert_eq!(
            manifest.crop_rect("default", 270),
            Some(Rect::new((300, 0), (100, 120)))
        );
        assert_eq!(
            manifest.crop_rect("cowboy", 90),
            Some(Rect::new((100, 120), (100, 120)))
        );
        assert_eq!(manifest.crop_rect("hippie", 0), None);
    }

    #[test]
    fn serialized_field_names() {
        let json = two_sections().to_json().unwrap();

        assert!(json.contains("\"tileWidth\": 100"));
        assert!(json.contains("\"tileHeight\": 120"));
        assert!(json.contains("\"startIndex\": 4"));
        assert!(!json.contains("angleToIndex"));
    }

    #[test]
    fn reloaded_manifest_gives_same_rects() {
        let manifest = two_sections();
        let reloaded: Manifest = serde_json::from_str(&manifest.to_json().unwrap()).unwrap();

        for section in &manifest.sections {
            for &angle in &section.angles {
                assert_eq!(
                    manifest.crop_rect(&section.name, angle),
                    reloaded.crop_rect(&section.name, angle)
                );
            }
        }
    }

    #[test]
    fn valid_manifest() {
        two_sections().validate().unwrap();
    }

    #[test]
    fn section_past_grid_end() {
        let mut manifest = two_sections();
        manifest.rows = 1;

        assert!(matches!(
            manifest.validate(),
            Err(AtlasError::ManifestMismatch { .. })
        ));
    }

    #[test]
    fn overlapping_sections() {
        let mut manifest = two_sections();
        manifest.sections[1].start_index = 3;

        assert!(manifest.validate().is_err());
    }

    #[test]
    fn unsorted_angles() {
        let mut manifest = two_sections();
        manifest.sections[0].angles = vec![90, 0];

        assert!(manifest.validate().is_err());
    }

    #[test]
    fn atlas_size_check() {
        let manifest = two_sections();

        manifest.check_atlas_size((400, 240)).unwrap();
        assert!(matches!(
            manifest.check_atlas_size((400, 120)),
            Err(AtlasError::ManifestMismatch { .. })
        ));
    }

    #[test]
    fn section_index_overflow() {
        let mut manifest = two_sections();
        manifest.sections[1].start_index = usize::MAX;

        assert!(matches!(
            manifest.validate(),
            Err(AtlasError::ManifestMismatch { .. })
        ));
        assert_eq!(manifest.sections[1].angle_to_index(90), None);
    }

    #[test]
    fn oversized_grid() {
        let mut manifest = two_sections();
        manifest.tile_width = 70_000;
        manifest.columns = 70_000;

        assert!(matches!(
            manifest.atlas_size(),
            Err(AtlasError::ManifestMismatch { .. })
        ));
        assert!(matches!(
            manifest.check_atlas_size((400, 240)),
            Err(AtlasError::ManifestMismatch { .. })
        ));
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn empty_section_between_others() {
        let mut manifest = two_sections();
        manifest.sections.insert(
            1,
            ManifestSection {
                name: "broken".to_owned(),
                start_index: 4,
                angles: vec![],
            },
        );

        manifest.validate().unwrap();
    }

    #[test]
    fn zero_sized_grid() {
        let mut manifest = two_sections();
        manifest.columns = 0;

        assert!(manifest.layout().is_err());
    }
}
