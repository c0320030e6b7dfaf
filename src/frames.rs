//! Discovery of per-angle frames on disk, grouped into ordered sections.

use std::{
    collections::{BTreeMap, BTreeSet},
    io,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use crate::{
    angle::{angles_for_step, Degrees},
    config::AnglePolicy,
    error::AtlasError,
    frame_name::{parse_frame_name, DEFAULT_SECTION},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub angle: Degrees,
    pub path: PathBuf,
}

/// The frames of one section, sorted by ascending angle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionFrames {
    pub name: String,
    pub frames: Vec<Frame>,
}

impl SectionFrames {
    pub fn angles(&self) -> Vec<Degrees> {
        self.frames.iter().map(|frame| frame.angle).collect()
    }
}

/// Every section that will go into one atlas, in declared order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSet {
    sections: Vec<SectionFrames>,
}

impl FrameSet {
    /// Builds a frame set from sections that are already ordered. Frames within
    /// each section are sorted by angle.
    pub fn new(mut sections: Vec<SectionFrames>) -> Self {
        for section in &mut sections {
            section.frames.sort_by_key(|frame| frame.angle);
        }

        Self { sections }
    }

    pub fn sections(&self) -> &[SectionFrames] {
        &self.sections
    }

    pub fn frame_count(&self) -> usize {
        self.sections.iter().map(|section| section.frames.len()).sum()
    }

    /// All frames in atlas order: sections in declared order, angles ascending.
    pub fn frames(&self) -> impl Iterator<Item = (&SectionFrames, &Frame)> {
        self.sections
            .iter()
            .flat_map(|section| section.frames.iter().map(move |frame| (section, frame)))
    }
}

#[derive(Debug, Clone)]
pub struct DiscoverOptions<'a> {
    /// If set, only angles on this step's grid are expected and used.
    pub step: Option<u32>,

    pub policy: AnglePolicy,

    /// Sections that should come first, in this order.
    pub order: &'a [String],
}

/// Scans `folder` (non-recursively) for frames and groups them into sections.
pub fn discover_frames(folder: &Path, options: &DiscoverOptions) -> Result<FrameSet, AtlasError> {
    if !folder.is_dir() {
        return Err(AtlasError::missing_frames(
            DEFAULT_SECTION,
            format!("frames folder {} doesn't exist", folder.display()),
        ));
    }

    log::trace!("Searching for frames in '{}'", folder.display());

    let mut found: BTreeMap<String, BTreeMap<Degrees, PathBuf>> = BTreeMap::new();

    let entries = WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()));

    for entry in entries {
        let entry = entry.map_err(io::Error::from)?;

        if !entry.file_type().is_file() {
            continue;
        }

        let name = match parse_frame_name(entry.path()) {
            Some(name) => name,
            None => {
                log::warn!("Skipping {}, it isn't named like a frame", entry.path().display());
                continue;
            }
        };

        log::trace!("Found frame {} at {}°", name.section, name.angle);

        let section = found.entry(name.section.clone()).or_default();
        if let Some(existing) = section.insert(name.angle, entry.into_path()) {
            return Err(AtlasError::configuration(format!(
                "section '{}' has more than one frame for {}°, including {}",
                name.section,
                name.angle,
                existing.display()
            )));
        }
    }

    if found.is_empty() {
        return Err(AtlasError::missing_frames(
            DEFAULT_SECTION,
            format!("no frames found in {}", folder.display()),
        ));
    }

    let expected = match options.step {
        Some(step) => Some(angles_for_step(step)?.into_iter().collect::<BTreeSet<_>>()),
        None => None,
    };

    if let Some(expected) = &expected {
        for (section, frames) in &mut found {
            let off_grid: Vec<Degrees> = frames
                .keys()
                .copied()
                .filter(|angle| !expected.contains(angle))
                .collect();

            for angle in off_grid {
                log::warn!(
                    "Ignoring frame at {}° in section '{}', it isn't on the {}° step",
                    angle,
                    section,
                    options.step.unwrap_or_default()
                );
                frames.remove(&angle);
            }
        }
    }

    let mut sections = Vec::with_capacity(found.len());
    for name in section_order(&found, options.order) {
        let frames = found.remove(&name).unwrap_or_default();

        if frames.is_empty() {
            return Err(AtlasError::missing_frames(name, "section has no frames"));
        }

        sections.push(SectionFrames {
            name,
            frames: frames
                .into_iter()
                .map(|(angle, path)| Frame { angle, path })
                .collect(),
        });
    }

    check_angle_sets(&sections, expected.as_ref(), options.policy)?;

    Ok(FrameSet::new(sections))
}

/// Explicitly ordered sections first, then the default section, then the rest
/// alphabetically.
fn section_order<T>(found: &BTreeMap<String, T>, order: &[String]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();

    for name in order {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }

    if found.contains_key(DEFAULT_SECTION) && !names.iter().any(|name| name == DEFAULT_SECTION) {
        names.push(DEFAULT_SECTION.to_owned());
    }

    for name in found.keys() {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }

    names
}

fn check_angle_sets(
    sections: &[SectionFrames],
    expected: Option<&BTreeSet<Degrees>>,
    policy: AnglePolicy,
) -> Result<(), AtlasError> {
    let reference: BTreeSet<Degrees> = match expected {
        Some(expected) => expected.clone(),
        None => match sections.first() {
            Some(first) => first.angles().into_iter().collect(),
            None => return Ok(()),
        },
    };

    for section in sections {
        let angles: BTreeSet<Degrees> = section.angles().into_iter().collect();

        if angles == reference {
            continue;
        }

        let missing: Vec<Degrees> = reference.difference(&angles).copied().collect();
        let extra: Vec<Degrees> = angles.difference(&reference).copied().collect();

        match policy {
            AnglePolicy::Strict if expected.is_some() => {
                return Err(AtlasError::missing_frames(
                    section.name.as_str(),
                    format!("missing angles {:?}", missing),
                ));
            }
            AnglePolicy::Strict => {
                return Err(AtlasError::configuration(format!(
                    "section '{}' doesn't have the same angles as section '{}' \
                     (missing {:?}, extra {:?}); use the independent angle policy to allow this",
                    section.name, sections[0].name, missing, extra
                )));
            }
            AnglePolicy::Independent => {
                log::warn!(
                    "Section '{}' has its own angle set (missing {:?}, extra {:?})",
                    section.name,
                    missing,
                    extra
                );
            }
        }
    }

    Ok(())
}
