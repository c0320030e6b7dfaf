use crate::{
    config::Config,
    error::AtlasError,
    frames::{discover_frames, DiscoverOptions},
    image::Pixel,
    manifest::Manifest,
    options::{GlobalOptions, OptimizeOptions},
    packer::{load_frame, pack_frames, write_atlas, AtlasFormat, PackOptions},
};

use super::load_config;

pub fn optimize(global: GlobalOptions, options: OptimizeOptions) -> anyhow::Result<()> {
    let mut config = load_config(&global)?;
    options.apply(&mut config);

    let manifest = build_atlas(&config)?;

    println!(
        "{} ({} sections, {}x{} tiles of {}x{})",
        config.atlas_path().display(),
        manifest.sections.len(),
        manifest.columns,
        manifest.rows,
        manifest.tile_width,
        manifest.tile_height
    );

    Ok(())
}

/// Discovers frames, packs them and writes the atlas and manifest described by
/// `config`. Nothing is written unless every step succeeds.
pub fn build_atlas(config: &Config) -> Result<Manifest, AtlasError> {
    let atlas_path = config.atlas_path();
    let format = AtlasFormat::from_path(&atlas_path, config.jpeg_quality)?;

    let frames = discover_frames(
        &config.frames_path(),
        &DiscoverOptions {
            step: Some(config.step),
            policy: config.angle_policy,
            order: &config.sections,
        },
    )?;

    log::debug!(
        "Packing {} frames from {} sections",
        frames.frame_count(),
        frames.sections().len()
    );

    let pack_options = PackOptions {
        max_width: config.max_width,
        tile_width: config.tile_width,
        background: config.background(),
        max_side: format.max_side(),
    };

    let packed = pack_frames(&frames, &pack_options, |frame| {
        load_frame(&frame.path, Pixel::WHITE)
    })?;

    write_atlas(&packed, format, &atlas_path, &config.manifest_path())?;

    Ok(packed.manifest)
}
