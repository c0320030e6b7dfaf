//! Composites the frames of every section into a single grid atlas and
//! describes the result with a manifest.

use std::path::{Path, PathBuf};

use fs_err as fs;
use tilegrid::GridPacker;

use crate::{
    error::AtlasError,
    frames::{Frame, FrameSet},
    image::{self, Image, Pixel},
    manifest::{Manifest, ManifestSection},
};

#[derive(Debug, Clone)]
pub struct PackOptions {
    /// The widest the atlas should be. A single tile wider than this still gets
    /// a column of its own.
    pub max_width: u32,

    /// Scale every frame to this width. If unset, the first frame's size is
    /// used for every tile.
    pub tile_width: Option<u32>,

    /// Fill for cells that no frame occupies.
    pub background: Pixel,

    /// The longest either side of the atlas may be, if the output format
    /// imposes a limit.
    pub max_side: Option<u32>,
}

/// The canvas is held in memory as RGBA8; refuse to build one past 4 GiB.
const MAX_CANVAS_BYTES: usize = u32::MAX as usize;

impl PackOptions {
    fn validate(&self) -> Result<(), AtlasError> {
        if self.max_width == 0 {
            return Err(AtlasError::configuration("max width must be at least 1"));
        }

        if self.tile_width == Some(0) {
            return Err(AtlasError::configuration("tile width must be at least 1"));
        }

        Ok(())
    }

    fn check_canvas(&self, size: (u32, u32), count: usize) -> Result<(), AtlasError> {
        if let Some(max_side) = self.max_side {
            if size.0 > max_side || size.1 > max_side {
                return Err(AtlasError::configuration(format!(
                    "a {}x{} atlas for {} frames is over the {} pixel limit of its format; \
                     use a smaller tile width, a larger step or a png atlas",
                    size.0, size.1, count, max_side
                )));
            }
        }

        match image::byte_len(size) {
            Some(bytes) if bytes <= MAX_CANVAS_BYTES => Ok(()),
            _ => Err(AtlasError::configuration(format!(
                "a {}x{} atlas for {} frames is too large to build in memory; \
                 use a smaller tile width or a larger step",
                size.0, size.1, count
            ))),
        }
    }

    /// The tile size for a run whose first frame is `first`.
    fn tile_size(&self, first: (u32, u32)) -> (u32, u32) {
        match self.tile_width {
            Some(tile_width) => {
                let scaled = f64::from(first.1) * f64::from(tile_width) / f64::from(first.0);
                (tile_width, (scaled.round() as u32).max(1))
            }
            None => first,
        }
    }
}

/// An atlas and its manifest, fully built in memory.
#[derive(Debug, Clone)]
pub struct PackedAtlas {
    pub image: Image,
    pub manifest: Manifest,
}

/// Loads a frame from disk, flattening any transparency onto `background`.
pub fn load_frame(path: &Path, background: Pixel) -> Result<Image, AtlasError> {
    let contents = fs::read(path)?;

    Image::decode(&contents, background).map_err(|source| AtlasError::Decode {
        path: path.to_owned(),
        source,
    })
}

/// Packs every frame in `frames` into one atlas.
///
/// Frames are fetched one at a time through `load`, rescaled to the tile size
/// and pasted into their cell, so only the canvas and a single frame are held
/// in memory at once.
pub fn pack_frames<L>(
    frames: &FrameSet,
    options: &PackOptions,
    mut load: L,
) -> Result<PackedAtlas, AtlasError>
where
    L: FnMut(&Frame) -> Result<Image, AtlasError>,
{
    options.validate()?;

    let count = frames.frame_count();
    let mut ordered = frames.frames();

    let (first_section, first_frame) = ordered.next().ok_or_else(|| {
        AtlasError::missing_frames(
            frames
                .sections()
                .first()
                .map(|section| section.name.as_str())
                .unwrap_or("default"),
            "nothing to pack",
        )
    })?;

    let first_image = load(first_frame)?;
    let native_size = first_image.size();
    let tile_size = options.tile_size(native_size);

    log::debug!(
        "Using {}x{} tiles, from {}x{} frame {} of section '{}'",
        tile_size.0,
        tile_size.1,
        native_size.0,
        native_size.1,
        first_frame.path.display(),
        first_section.name
    );

    if tile_size.0 > options.max_width {
        log::warn!(
            "Tile width {} is wider than the max width {}; the atlas will be {} pixels wide",
            tile_size.0,
            options.max_width,
            tile_size.0
        );
    }

    let layout = GridPacker::new()
        .max_width(options.max_width)
        .pack(tile_size, count)
        .ok_or_else(|| {
            AtlasError::configuration(format!(
                "can't lay out {} tiles of {}x{}",
                count, tile_size.0, tile_size.1
            ))
        })?;

    options.check_canvas(layout.size(), count)?;

    let mut canvas = Image::new_filled(layout.size(), options.background);

    let mut place = |index: usize, frame: &Frame, image: Image| -> Result<(), AtlasError> {
        if image.size() != native_size && options.tile_width.is_none() {
            log::warn!(
                "Frame {} is {}x{} instead of {}x{}, resampling it",
                frame.path.display(),
                image.size().0,
                image.size().1,
                native_size.0,
                native_size.1
            );
        }

        let tile = image.resized(tile_size);
        let rect = layout.cell_rect(index).ok_or_else(|| {
            AtlasError::configuration(format!("tile {} doesn't fit in the grid", index))
        })?;

        log::trace!("Placing {} at {:?}", frame.path.display(), rect.pos);
        canvas.blit(&tile, rect.pos);

        Ok(())
    };

    place(0, first_frame, first_image)?;

    for (offset, (_, frame)) in ordered.enumerate() {
        let image = load(frame)?;
        place(offset + 1, frame, image)?;
    }

    let mut start_index = 0;
    let sections = frames
        .sections()
        .iter()
        .map(|section| {
            let manifest_section = ManifestSection {
                name: section.name.clone(),
                start_index,
                angles: section.angles(),
            };
            start_index += section.frames.len();
            manifest_section
        })
        .collect();

    let manifest = Manifest {
        tile_width: tile_size.0,
        tile_height: tile_size.1,
        columns: layout.columns(),
        rows: layout.rows(),
        sections,
    };

    log::info!(
        "Packed {} frames into {} columns and {} rows ({}x{} pixels)",
        count,
        manifest.columns,
        manifest.rows,
        layout.size().0,
        layout.size().1
    );

    Ok(PackedAtlas {
        image: canvas,
        manifest,
    })
}

/// Raster formats an atlas can be written as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtlasFormat {
    Png,
    Jpeg { quality: u8 },
}

impl AtlasFormat {
    /// Picks the format from the atlas file extension.
    pub fn from_path(path: &Path, jpeg_quality: u8) -> Result<Self, AtlasError> {
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(|extension| extension.to_ascii_lowercase());

        match extension.as_deref() {
            Some("png") => Ok(AtlasFormat::Png),
            Some("jpg") | Some("jpeg") => {
                if jpeg_quality == 0 || jpeg_quality > 100 {
                    return Err(AtlasError::configuration(format!(
                        "jpeg quality must be between 1 and 100, got {}",
                        jpeg_quality
                    )));
                }

                Ok(AtlasFormat::Jpeg {
                    quality: jpeg_quality,
                })
            }
            _ => Err(AtlasError::configuration(format!(
                "atlas {} must end in .png, .jpg or .jpeg",
                path.display()
            ))),
        }
    }

    /// The largest side length the format can store.
    pub fn max_side(&self) -> Option<u32> {
        match self {
            AtlasFormat::Png => None,
            AtlasFormat::Jpeg { .. } => Some(u32::from(u16::MAX)),
        }
    }

    pub fn encode(&self, image: &Image) -> Result<Vec<u8>, AtlasError> {
        let mut encoded = Vec::new();

        match self {
            AtlasFormat::Png => image.encode_png(&mut encoded).map_err(|err| AtlasError::Encode {
                message: err.to_string(),
            })?,
            AtlasFormat::Jpeg { quality } => image
                .encode_jpeg(&mut encoded, *quality)
                .map_err(|err| AtlasError::Encode {
                    message: err.to_string(),
                })?,
        }

        Ok(encoded)
    }
}

/// Writes the atlas and manifest side by side.
///
/// Both files are encoded in memory and written to temporary siblings first;
/// the real files are only replaced once everything has been written, and
/// temporaries are removed whenever a step fails.
pub fn write_atlas(
    packed: &PackedAtlas,
    format: AtlasFormat,
    atlas_path: &Path,
    manifest_path: &Path,
) -> Result<(), AtlasError> {
    let atlas_contents = format.encode(&packed.image)?;
    let manifest_contents = packed.manifest.to_json()?;

    for path in &[atlas_path, manifest_path] {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
    }

    let atlas_temp = temp_path(atlas_path);
    let manifest_temp = temp_path(manifest_path);

    let staged = fs::write(&atlas_temp, &atlas_contents)
        .and_then(|_| fs::write(&manifest_temp, &manifest_contents));

    if let Err(err) = staged {
        let _ = fs::remove_file(&atlas_temp);
        let _ = fs::remove_file(&manifest_temp);
        return Err(err.into());
    }

    // The manifest goes first. If only it lands, the viewer sees a manifest
    // that disagrees with the old atlas and rejects the pair at load.
    if let Err(err) = fs::rename(&manifest_temp, manifest_path) {
        let _ = fs::remove_file(&atlas_temp);
        let _ = fs::remove_file(&manifest_temp);
        return Err(err.into());
    }

    if let Err(err) = fs::rename(&atlas_temp, atlas_path) {
        let _ = fs::remove_file(&atlas_temp);

        log::error!(
            "{} was replaced but {} was not; rerun to write a matching pair",
            manifest_path.display(),
            atlas_path.display()
        );

        return Err(err.into());
    }

    log::info!(
        "Wrote {} and {}",
        atlas_path.display(),
        manifest_path.display()
    );

    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    path.with_file_name(format!(".{}.tmp", file_name))
}
