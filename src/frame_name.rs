use std::path::Path;

use regex::Regex;

use crate::angle::Degrees;

/// The name of the section that frames without a prefix belong to.
pub const DEFAULT_SECTION: &str = "default";

/// The extension of frames written by the generator.
pub const FRAME_EXTENSION: &str = "jpg";

/// Section and angle parsed out of a frame's file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameName {
    pub section: String,
    pub angle: Degrees,
}

/// Given a path, figures out which section and angle the frame belongs to.
///
/// Examples of the convention:
///
/// - 30.jpg (default section, 30°)
/// - cowboy_30.jpg (section "cowboy", 30°)
/// - tall_hat_330.png (section "tall_hat", 330°)
///
/// Returns `None` for files that don't follow the convention, including angles
/// outside of `[0, 360)`.
pub fn parse_frame_name<P: AsRef<Path>>(path: P) -> Option<FrameName> {
    lazy_static::lazy_static! {
        static ref FRAME_PATTERN: Regex =
            Regex::new(r"(?i)^(?:(.+)_)?(\d+)\.(?:jpe?g|png)$").unwrap();
    }

    let path = path.as_ref();

    let file_name = match path.file_name()?.to_str() {
        Some(name) => name,
        None => {
            log::warn!(
                "Path {} had invalid Unicode, skipping it...",
                path.display()
            );

            return None;
        }
    };

    let captures = FRAME_PATTERN.captures(file_name)?;
    let angle: u32 = captures.get(2)?.as_str().parse().ok()?;

    if angle >= 360 {
        return None;
    }

    let section = captures
        .get(1)
        .map(|prefix| prefix.as_str().to_owned())
        .unwrap_or_else(|| DEFAULT_SECTION.to_owned());

    Some(FrameName {
        section,
        angle: angle as Degrees,
    })
}

/// The file name the generator uses for a section's frame at an angle.
pub fn frame_file_name(section: &str, angle: Degrees) -> String {
    if section == DEFAULT_SECTION {
        format!("{}.{}", angle, FRAME_EXTENSION)
    } else {
        format!("{}_{}.{}", section, angle, FRAME_EXTENSION)
    }
}

/// Figures out which section a source photo belongs to, given the stem shared
/// by all photos of the subject.
///
/// With a stem of `my_face`, `my_face.jpg` is the default section and
/// `my_face_cowboy.jpg` is the section "cowboy".
pub fn photo_section<P: AsRef<Path>>(path: P, photo_stem: &str) -> Option<String> {
    let path = path.as_ref();

    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    if !matches!(extension.as_str(), "jpg" | "jpeg" | "png") {
        return None;
    }

    let file_stem = path.file_stem()?.to_str()?;

    if file_stem == photo_stem {
        return Some(DEFAULT_SECTION.to_owned());
    }

    let postfix = file_stem.strip_prefix(photo_stem)?.strip_prefix('_')?;

    if postfix.is_empty() {
        return None;
    }

    Some(postfix.to_owned())
}
