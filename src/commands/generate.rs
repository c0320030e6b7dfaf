use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use fs_err as fs;
use indicatif::{ProgressBar, ProgressStyle};
use walkdir::WalkDir;

use crate::{
    angle::{angles_for_step, Degrees},
    config::Config,
    error::AtlasError,
    frame_name::{frame_file_name, photo_section, DEFAULT_SECTION},
    frame_source::{FrameSource, GazeParams, HttpFrameSource},
    image::{Image, Pixel},
    options::{GenerateOptions, GlobalOptions},
};

use super::load_config;

/// JPEG quality of individual frames. Higher than the atlas default, since
/// frames get resampled again when packed.
const FRAME_QUALITY: u8 = 95;

pub fn generate(global: GlobalOptions, options: GenerateOptions) -> anyhow::Result<()> {
    let mut config = load_config(&global)?;
    options.apply(&mut config);

    let mut source = HttpFrameSource::from_env(config.endpoint.clone())?;
    let summary = generate_frames(&config, &mut source, options.force)?;

    log::info!(
        "Done: {} frames written, {} already existed. Files in {}",
        summary.written,
        summary.skipped,
        config.frames_path().display()
    );

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GenerateSummary {
    pub written: usize,
    pub skipped: usize,
}

/// A source photo and the section its frames belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Photo {
    section: String,
    path: PathBuf,
}

/// Renders every angle of every source photo into the frames folder.
///
/// A frame that fails to render doesn't stop the sweep; the remaining frames
/// are still attempted and the whole run fails at the end.
pub fn generate_frames<S: FrameSource>(
    config: &Config,
    source: &mut S,
    force: bool,
) -> anyhow::Result<GenerateSummary> {
    let angles = angles_for_step(config.step)?;
    let photos = find_photos(&config.input_path(), &config.photo_stem)?;
    let frames_path = config.frames_path();

    fs::create_dir_all(&frames_path)?;

    let total = photos.len() * angles.len();
    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40}] {pos}/{len}")
            .progress_chars("=> "),
    );

    let mut summary = GenerateSummary::default();
    let mut failed = 0;

    for photo in &photos {
        let contents = fs::read(&photo.path)?;

        for &angle in &angles {
            let target = frames_path.join(frame_file_name(&photo.section, angle));
            progress.set_message(format!("{} {}°", photo.section, angle));

            if !force && target.exists() {
                log::debug!("Skipping {}, it already exists", target.display());
                summary.skipped += 1;
                progress.inc(1);
                continue;
            }

            match render_frame(source, &contents, angle, &target) {
                Ok(()) => {
                    log::info!("Wrote {}", target.display());
                    summary.written += 1;
                }
                Err(err) => {
                    log::error!("{}° of section '{}': {:#}", angle, photo.section, err);
                    failed += 1;
                }
            }

            progress.inc(1);
        }
    }

    progress.finish_and_clear();

    if failed > 0 {
        bail!("{} of {} frames failed to generate", failed, total);
    }

    Ok(summary)
}

fn render_frame<S: FrameSource>(
    source: &mut S,
    photo: &[u8],
    angle: Degrees,
    target: &Path,
) -> anyhow::Result<()> {
    let gaze = GazeParams::for_angle(angle);
    log::trace!("Requesting {}° with {:?}", angle, gaze);

    let rendered = source.render(photo, &gaze)?;
    let image = Image::decode(&rendered, Pixel::WHITE).map_err(|source| AtlasError::Decode {
        path: target.to_owned(),
        source,
    })?;

    let mut encoded = Vec::new();
    image
        .encode_jpeg(&mut encoded, FRAME_QUALITY)
        .with_context(|| format!("couldn't encode {}", target.display()))?;

    fs::write(target, encoded)?;

    Ok(())
}

/// Finds source photos in `folder`, one per section.
fn find_photos(folder: &Path, photo_stem: &str) -> Result<Vec<Photo>, AtlasError> {
    let mut photos: Vec<Photo> = Vec::new();

    if folder.is_dir() {
        let entries = WalkDir::new(folder)
            .min_depth(1)
            .max_depth(1)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()));

        for entry in entries {
            let entry = entry.map_err(std::io::Error::from)?;

            if !entry.file_type().is_file() {
                continue;
            }

            let section = match photo_section(entry.path(), photo_stem) {
                Some(section) => section,
                None => continue,
            };

            if let Some(existing) = photos.iter().find(|photo| photo.section == section) {
                return Err(AtlasError::configuration(format!(
                    "both {} and {} are photos for section '{}'",
                    existing.path.display(),
                    entry.path().display(),
                    section
                )));
            }

            log::trace!("Found photo {} for section '{}'", entry.path().display(), section);

            photos.push(Photo {
                section,
                path: entry.into_path(),
            });
        }
    }

    if photos.is_empty() {
        return Err(AtlasError::missing_frames(
            DEFAULT_SECTION,
            format!(
                "no photos named '{}' found in {}",
                photo_stem,
                folder.display()
            ),
        ));
    }

    Ok(photos)
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::{frame_source::FrameSourceError, test_util::TestFolder};

    /// Paints each frame a shade that depends on the requested gaze.
    struct FakeSource {
        calls: usize,
        fail_at: Option<usize>,
    }

    impl FakeSource {
        fn new() -> Self {
            Self {
                calls: 0,
                fail_at: None,
            }
        }
    }

    impl FrameSource for FakeSource {
        fn render(&mut self, photo: &[u8], gaze: &GazeParams) -> Result<Vec<u8>, FrameSourceError> {
            assert_eq!(photo, b"photo");

            self.calls += 1;
            if self.fail_at == Some(self.calls) {
                return Err(FrameSourceError::EmptyOutput);
            }

            let shade = (gaze.pupil_x + 15.0) as u8 * 8;
            let mut encoded = Vec::new();
            Image::new_filled((8, 6), Pixel::new(shade, shade, shade, 255))
                .encode_png(&mut encoded)
                .unwrap();

            Ok(encoded)
        }
    }

    fn project(name: &str) -> (TestFolder, Config) {
        let folder = TestFolder::new(name);
        folder.write("in/my_face.jpg", b"photo");
        folder.write("in/my_face_cowboy.jpg", b"photo");
        folder.write("in/unrelated.jpg", b"nope");

        let config = Config {
            file_path: folder.join("gazeatlas.toml"),
            step: 90,
            ..Config::default()
        };

        (folder, config)
    }

    #[test]
    fn writes_every_angle_of_every_photo() {
        let (folder, config) = project("generate-all");
        let mut source = FakeSource::new();

        let summary = generate_frames(&config, &mut source, false).unwrap();

        assert_eq!(summary, GenerateSummary { written: 8, skipped: 0 });
        assert_eq!(source.calls, 8);

        for name in &["0.jpg", "90.jpg", "180.jpg", "270.jpg", "cowboy_0.jpg", "cowboy_270.jpg"] {
            let path = folder.join("out").join(name);
            let frame = crate::packer::load_frame(&path, Pixel::WHITE).unwrap();
            assert_eq!(frame.size(), (8, 6));
        }
    }

    #[test]
    fn existing_frames_are_skipped_unless_forced() {
        let (folder, config) = project("generate-skip");
        folder.write("out/90.jpg", b"already here");

        let mut source = FakeSource::new();
        let summary = generate_frames(&config, &mut source, false).unwrap();
        assert_eq!(summary, GenerateSummary { written: 7, skipped: 1 });
        assert_eq!(fs::read(folder.join("out/90.jpg")).unwrap(), b"already here");

        let mut source = FakeSource::new();
        let summary = generate_frames(&config, &mut source, true).unwrap();
        assert_eq!(summary, GenerateSummary { written: 8, skipped: 0 });
    }

    #[test]
    fn failed_frame_fails_run_after_finishing() {
        let (folder, config) = project("generate-fail");
        let mut source = FakeSource {
            calls: 0,
            fail_at: Some(2),
        };

        assert!(generate_frames(&config, &mut source, false).is_err());
        assert_eq!(source.calls, 8);
        assert!(!folder.join("out/90.jpg").exists());
        assert!(folder.join("out/180.jpg").exists());
    }

    #[test]
    fn no_photos() {
        let folder = TestFolder::new("generate-none");
        let config = Config {
            file_path: folder.join("gazeatlas.toml"),
            ..Config::default()
        };

        assert!(generate_frames(&config, &mut FakeSource::new(), false).is_err());
    }

    #[test]
    fn photos_are_found_by_stem() {
        let (folder, _) = project("generate-photos");
        let photos = find_photos(&folder.join("in"), "my_face").unwrap();

        let sections: Vec<&str> = photos.iter().map(|photo| photo.section.as_str()).collect();
        assert_eq!(sections, vec!["default", "cowboy"]);
    }
}
