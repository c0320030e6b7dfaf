//! The runtime side of an atlas: turns pointer positions and section switches
//! into the tile that should be on screen.

use std::path::Path;

use tilegrid::{GridLayout, Rect};

use crate::{
    angle::{nearest_angle, normalize, pointer_angle, Degrees},
    error::AtlasError,
    image::{Image, Pixel},
    manifest::{Manifest, ManifestSection},
    packer::load_frame,
};

/// One resolved tile of the atlas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub section: String,
    pub angle: Degrees,
    pub index: usize,
    pub row: u32,
    pub column: u32,
    pub rect: Rect,
}

impl Tile {
    /// The CSS `background-position` that shows only this tile when the atlas
    /// is used as an element's background image.
    pub fn background_position(&self) -> String {
        format!("-{}px -{}px", self.rect.pos.0, self.rect.pos.1)
    }
}

/// Interaction state for a single atlas.
///
/// Events are handled one at a time and each returns the tile to draw, or
/// `None` if the active section has no frames.
#[derive(Debug, Clone)]
pub struct Viewer {
    manifest: Manifest,
    layout: GridLayout,
    active_section: usize,

    /// The last requested angle, before snapping to a frame. Keeping the raw
    /// value lets a section switch pick its own nearest frame.
    current_angle: f64,
}

impl Viewer {
    /// Creates a viewer for a manifest and the pixel size of the atlas it was
    /// loaded alongside.
    pub fn new(manifest: Manifest, atlas_size: (u32, u32)) -> Result<Self, AtlasError> {
        manifest.check_atlas_size(atlas_size)?;
        manifest.validate()?;

        let layout = manifest.layout()?;

        Ok(Self {
            manifest,
            layout,
            active_section: 0,
            current_angle: 0.0,
        })
    }

    pub fn active_section(&self) -> Option<&ManifestSection> {
        self.manifest.sections.get(self.active_section)
    }

    pub fn current_angle(&self) -> f64 {
        self.current_angle
    }

    /// Handles the pointer moving to `pointer`, measured from `anchor`, which
    /// is normally the visual center of the face.
    pub fn on_pointer_move(&mut self, anchor: (f64, f64), pointer: (f64, f64)) -> Option<Tile> {
        self.on_drag_angle(pointer_angle(anchor, pointer))
    }

    pub fn on_drag_angle(&mut self, degrees: f64) -> Option<Tile> {
        self.current_angle = normalize(degrees);
        self.current_tile()
    }

    /// Advances to the next section, wrapping around after the last one.
    ///
    /// The new section resolves the unsnapped pointer angle, not the frame
    /// angle the previous section snapped to.
    pub fn on_double_click(&mut self) -> Option<Tile> {
        let count = self.manifest.sections.len();

        if count > 0 {
            self.active_section = (self.active_section + 1) % count;
        }

        if let Some(section) = self.active_section() {
            log::debug!("Switched to section '{}'", section.name);
        }

        self.current_tile()
    }

    /// Jumps straight to a named section. Returns false if there is no such
    /// section.
    pub fn select_section(&mut self, name: &str) -> bool {
        match self.manifest.section_index(name) {
            Some(index) => {
                self.active_section = index;
                true
            }
            None => false,
        }
    }

    /// The tile for the active section at the current angle.
    pub fn current_tile(&self) -> Option<Tile> {
        let section = self.active_section()?;
        let angle = nearest_angle(&section.angles, self.current_angle)?;
        let index = section.angle_to_index(angle)?;
        let (row, column) = self.layout.cell(index)?;
        let rect = self.layout.cell_rect(index)?;

        Some(Tile {
            section: section.name.clone(),
            angle,
            index,
            row,
            column,
            rect,
        })
    }
}

/// An atlas image decoded into memory together with its manifest.
#[derive(Debug, Clone)]
pub struct LoadedAtlas {
    image: Image,
    manifest: Manifest,
}

impl LoadedAtlas {
    /// Loads and cross-checks an atlas and its manifest. A manifest that
    /// disagrees with the image is rejected here rather than at draw time.
    pub fn open(atlas_path: &Path, manifest_path: &Path) -> Result<Self, AtlasError> {
        let manifest = Manifest::read_from_file(manifest_path)?;
        let image = load_frame(atlas_path, Pixel::WHITE)?;

        manifest.check_atlas_size(image.size())?;
        manifest.validate()?;

        log::debug!(
            "Opened {}x{} atlas with {} sections",
            image.size().0,
            image.size().1,
            manifest.sections.len()
        );

        Ok(Self { image, manifest })
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn viewer(&self) -> Result<Viewer, AtlasError> {
        Viewer::new(self.manifest.clone(), self.image.size())
    }

    /// Copies out just the pixels of one tile.
    pub fn render(&self, tile: &Tile) -> Image {
        self.image.crop(tile.rect)
    }
}
