use std::{
    io,
    path::{Path, PathBuf},
};

use fs_err as fs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::image::Pixel;

pub static CONFIG_FILENAME: &str = "gazeatlas.toml";

/// Project configuration, contained in an optional gazeatlas.toml file.
///
/// Every field has a default, so a project without a config file behaves as if
/// it had an empty one. Command line flags override values from the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct Config {
    /// The file stem shared by all source photos of the subject. Photos named
    /// `<stem>_<postfix>` become the section `<postfix>`.
    pub photo_stem: String,

    /// Where source photos are read from.
    pub input_dir: PathBuf,

    /// Where generated per-angle frames are written, and read back from when
    /// packing.
    pub frames_dir: PathBuf,

    /// Where the atlas and manifest are written.
    pub output_dir: PathBuf,

    /// File name of the atlas. The extension picks the format: png, jpg or
    /// jpeg.
    pub atlas_name: String,

    /// File name of the manifest.
    pub manifest_name: String,

    /// Angular distance between frames, in degrees.
    pub step: u32,

    /// The widest the atlas is allowed to be, in pixels.
    pub max_width: u32,

    /// If set, every frame is scaled to this width, keeping its aspect ratio.
    pub tile_width: Option<u32>,

    /// What to do when sections don't share the same set of angles.
    pub angle_policy: AnglePolicy,

    /// RGBA color used for transparent pixels and for unused atlas cells.
    pub background: (u8, u8, u8, u8),

    /// Quality used when the atlas is written as a JPEG.
    pub jpeg_quality: u8,

    /// Explicit section order. Sections not listed here follow in
    /// alphabetical order, after the default section.
    pub sections: Vec<String>,

    /// URL of the service that renders gaze frames.
    pub endpoint: Option<String>,

    /// The path that this config came from. Paths from this config are
    /// relative to the folder containing this file.
    #[serde(skip)]
    pub file_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            photo_stem: "my_face".to_owned(),
            input_dir: PathBuf::from("in"),
            frames_dir: PathBuf::from("out"),
            output_dir: PathBuf::from("viewer"),
            atlas_name: "optimized.jpg".to_owned(),
            manifest_name: "optimized.json".to_owned(),
            step: 30,
            max_width: 4096,
            tile_width: None,
            angle_policy: AnglePolicy::Strict,
            background: (255, 255, 255, 255),
            jpeg_quality: 90,
            sections: Vec::new(),
            endpoint: None,
            file_path: PathBuf::from(CONFIG_FILENAME),
        }
    }
}

impl Config {
    /// Reads the config in `folder_path`, falling back to defaults if the
    /// folder has no config file.
    pub fn load_from_folder<P: AsRef<Path>>(folder_path: P) -> Result<Self, ConfigError> {
        let folder_path = folder_path.as_ref();

        match Self::read_from_folder(folder_path) {
            Ok(config) => Ok(config),
            Err(err) if err.is_not_found() => {
                log::debug!(
                    "No {} in {}, using defaults",
                    CONFIG_FILENAME,
                    folder_path.display()
                );

                Ok(Self {
                    file_path: folder_path.join(CONFIG_FILENAME),
                    ..Self::default()
                })
            }
            Err(err) => Err(err),
        }
    }

    pub fn read_from_folder<P: AsRef<Path>>(folder_path: P) -> Result<Self, ConfigError> {
        let folder_path = folder_path.as_ref();
        let file_path = &folder_path.join(CONFIG_FILENAME);

        Self::read_from_file(file_path)
    }

    pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;

        let mut config: Self = toml::from_slice(&contents).map_err(|source| ConfigError::Toml {
            path: path.to_owned(),
            source,
        })?;
        config.file_path = path.to_owned();

        log::trace!("Loaded config from {}", path.display());

        Ok(config)
    }

    /// The path that paths in this Config should be considered relative to.
    pub fn folder(&self) -> &Path {
        match self.file_path.parent() {
            Some(parent) => parent,
            None => Path::new("."),
        }
    }

    pub fn input_path(&self) -> PathBuf {
        self.folder().join(&self.input_dir)
    }

    pub fn frames_path(&self) -> PathBuf {
        self.folder().join(&self.frames_dir)
    }

    pub fn atlas_path(&self) -> PathBuf {
        self.folder().join(&self.output_dir).join(&self.atlas_name)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.folder().join(&self.output_dir).join(&self.manifest_name)
    }

    pub fn background(&self) -> Pixel {
        let (r, g, b, a) = self.background;
        Pixel::new(r, g, b, a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnglePolicy {
    /// Every section must have exactly the same angles. Anything else is a
    /// configuration error.
    Strict,

    /// Sections keep whatever angles they have. The viewer matches each
    /// section's angles independently.
    Independent,
}

impl Default for AnglePolicy {
    fn default() -> Self {
        AnglePolicy::Strict
    }
}

impl std::str::FromStr for AnglePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<AnglePolicy, Self::Err> {
        match value {
            "strict" => Ok(AnglePolicy::Strict),
            "independent" => Ok(AnglePolicy::Independent),

            _ => Err(String::from(
                "Invalid angle policy. Valid options are 'strict' and 'independent'.",
            )),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{} in {}", .source, .path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("{source}")]
    Io { path: PathBuf, source: io::Error },
}

impl ConfigError {
    /// Tells whether this ConfigError originated because of a path not
    /// existing.
    pub fn is_not_found(&self) -> bool {
        match self {
            ConfigError::Io { source, .. } => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_config_is_default() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn kebab_case_keys() {
        let config: Config = toml::from_str(
            r#"
            step = 45
            max-width = 2048
            tile-width = 256
            angle-policy = "independent"
            sections = ["default", "cowboy", "hippie"]
            background = [0, 0, 0, 0]
            "#,
        )
        .unwrap();

        assert_eq!(config.step, 45);
        assert_eq!(config.max_width, 2048);
        assert_eq!(config.tile_width, Some(256));
        assert_eq!(config.angle_policy, AnglePolicy::Independent);
        assert_eq!(config.sections, vec!["default", "cowboy", "hippie"]);
        assert_eq!(config.background(), Pixel::new(0, 0, 0, 0));
        assert_eq!(config.atlas_name, "optimized.jpg");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<Config>("max-height = 5").is_err());
    }

    #[test]
    fn paths_are_relative_to_config_folder() {
        let config = Config {
            file_path: PathBuf::from("project/gazeatlas.toml"),
            ..Config::default()
        };

        assert_eq!(config.frames_path(), Path::new("project/out"));
        assert_eq!(config.atlas_path(), Path::new("project/viewer/optimized.jpg"));
        assert_eq!(
            config.manifest_path(),
            Path::new("project/viewer/optimized.json")
        );
    }

    #[test]
    fn missing_folder_config_uses_defaults() {
        let folder = std::env::temp_dir().join("gazeatlas-config-missing");
        let config = Config::load_from_folder(&folder).unwrap();

        assert_eq!(config.step, 30);
        assert_eq!(config.folder(), folder.as_path());
    }
}
