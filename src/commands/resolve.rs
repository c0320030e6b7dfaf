use anyhow::bail;
use fs_err as fs;

use crate::{
    options::{GlobalOptions, Point, ResolveOptions},
    viewer::{LoadedAtlas, Tile, Viewer},
};

use super::load_config;

pub fn resolve(global: GlobalOptions, options: ResolveOptions) -> anyhow::Result<()> {
    let config = load_config(&global)?;
    let atlas = LoadedAtlas::open(&config.atlas_path(), &config.manifest_path())?;
    let mut viewer = atlas.viewer()?;

    let manifest = atlas.manifest();
    log::debug!(
        "{} sections in {}x{} tiles of {}x{}",
        manifest.sections.len(),
        manifest.columns,
        manifest.rows,
        manifest.tile_width,
        manifest.tile_height
    );

    let tile = match resolve_tile(&mut viewer, &options)? {
        Some(tile) => tile,
        None => {
            let section = viewer
                .active_section()
                .map(|section| section.name.as_str())
                .unwrap_or("<none>");

            println!("section '{}' has no frames, nothing to show", section);
            return Ok(());
        }
    };

    println!("section: {}", tile.section);
    println!("angle: {} (requested {:.1})", tile.angle, viewer.current_angle());
    println!("index: {} (row {}, column {})", tile.index, tile.row, tile.column);
    println!(
        "rect: {} {} {} {}",
        tile.rect.pos.0, tile.rect.pos.1, tile.rect.size.0, tile.rect.size.1
    );
    println!("background-position: {}", tile.background_position());

    if let Some(path) = &options.extract {
        let mut file = fs::File::create(path)?;
        atlas.render(&tile).encode_png(&mut file)?;

        log::info!("Wrote tile to {}", path.display());
    }

    Ok(())
}

/// Replays the requested events against `viewer`: section selection, then
/// double clicks, then a drag angle or pointer position.
pub fn resolve_tile(viewer: &mut Viewer, options: &ResolveOptions) -> anyhow::Result<Option<Tile>> {
    if let Some(section) = &options.section {
        if !viewer.select_section(section) {
            bail!("the atlas has no section named '{}'", section);
        }
    }

    for _ in 0..options.switch {
        viewer.on_double_click();
    }

    let tile = match (options.angle, options.pointer) {
        (Some(angle), _) => viewer.on_drag_angle(angle),
        (None, Some(pointer)) => {
            let anchor = options.anchor.unwrap_or(Point { x: 0.0, y: 0.0 });
            viewer.on_pointer_move((anchor.x, anchor.y), (pointer.x, pointer.y))
        }
        (None, None) => viewer.current_tile(),
    };

    Ok(tile)
}
