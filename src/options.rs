use std::{path::PathBuf, str::FromStr};

use structopt::StructOpt;

use crate::config::{AnglePolicy, Config};

#[derive(Debug, StructOpt)]
#[structopt(about = "Turns per-angle face frames into a sprite atlas that follows the pointer")]
pub struct Options {
    #[structopt(flatten)]
    pub global: GlobalOptions,

    #[structopt(subcommand)]
    pub command: Subcommand,
}

#[derive(Debug, Clone, StructOpt)]
pub struct GlobalOptions {
    /// The project folder, containing gazeatlas.toml if there is one. Defaults
    /// to the current working directory.
    #[structopt(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Debug, StructOpt)]
pub enum Subcommand {
    /// Render one frame per angle for every source photo, using the
    /// configured frame generator. Frames that already exist are skipped.
    Generate(GenerateOptions),

    /// Pack the generated frames into a single atlas image and write a
    /// manifest describing where each frame ended up.
    Optimize(OptimizeOptions),

    /// Run 'generate' followed by 'optimize'.
    All(AllOptions),

    /// Resolve a pointer position or angle to the atlas tile a viewer would
    /// show for it.
    Resolve(ResolveOptions),
}

#[derive(Debug, Clone, StructOpt)]
pub struct GenerateOptions {
    /// Degrees between two frames, from 1 to 360.
    #[structopt(long)]
    pub step: Option<u32>,

    /// Regenerate frames even if they already exist.
    #[structopt(long)]
    pub force: bool,

    /// URL of the frame generator. Overrides the `endpoint` config value.
    #[structopt(long)]
    pub endpoint: Option<String>,
}

impl GenerateOptions {
    pub fn apply(&self, config: &mut Config) {
        if let Some(step) = self.step {
            config.step = step;
        }

        if let Some(endpoint) = &self.endpoint {
            config.endpoint = Some(endpoint.clone());
        }
    }
}

#[derive(Debug, Clone, StructOpt)]
pub struct OptimizeOptions {
    /// Degrees between two frames. Must match the step frames were generated
    /// with.
    #[structopt(long)]
    pub step: Option<u32>,

    /// The widest the atlas is allowed to be, in pixels.
    #[structopt(long)]
    pub max_width: Option<u32>,

    /// Scale every frame to this width before packing.
    #[structopt(long)]
    pub tile_width: Option<u32>,

    /// How to treat sections with different angles.
    ///
    /// Options:
    ///
    /// - strict: every section must have the same angles
    ///
    /// - independent: sections keep their own angles
    #[structopt(long)]
    pub angle_policy: Option<AnglePolicy>,
}

impl OptimizeOptions {
    pub fn apply(&self, config: &mut Config) {
        if let Some(step) = self.step {
            config.step = step;
        }

        if let Some(max_width) = self.max_width {
            config.max_width = max_width;
        }

        if let Some(tile_width) = self.tile_width {
            config.tile_width = Some(tile_width);
        }

        if let Some(angle_policy) = self.angle_policy {
            config.angle_policy = angle_policy;
        }
    }
}

#[derive(Debug, Clone, StructOpt)]
pub struct AllOptions {
    /// Degrees between two frames, from 1 to 360.
    #[structopt(long)]
    pub step: Option<u32>,

    /// Regenerate frames even if they already exist.
    #[structopt(long)]
    pub force: bool,

    /// URL of the frame generator.
    #[structopt(long)]
    pub endpoint: Option<String>,

    /// The widest the atlas is allowed to be, in pixels.
    #[structopt(long)]
    pub max_width: Option<u32>,

    /// Scale every frame to this width before packing.
    #[structopt(long)]
    pub tile_width: Option<u32>,

    /// How to treat sections with different angles: strict or independent.
    #[structopt(long)]
    pub angle_policy: Option<AnglePolicy>,
}

impl AllOptions {
    pub fn split(self) -> (GenerateOptions, OptimizeOptions) {
        let generate = GenerateOptions {
            step: self.step,
            force: self.force,
            endpoint: self.endpoint,
        };

        let optimize = OptimizeOptions {
            step: self.step,
            max_width: self.max_width,
            tile_width: self.tile_width,
            angle_policy: self.angle_policy,
        };

        (generate, optimize)
    }
}

#[derive(Debug, Clone, StructOpt)]
pub struct ResolveOptions {
    /// Resolve this angle directly, in degrees: 0 is right, 90 is up.
    #[structopt(long, allow_hyphen_values = true)]
    pub angle: Option<f64>,

    /// Pointer position as `x,y`, in screen coordinates.
    #[structopt(long, conflicts_with = "angle")]
    pub pointer: Option<Point>,

    /// Center of the face as `x,y`, in screen coordinates. Defaults to `0,0`.
    #[structopt(long, requires = "pointer")]
    pub anchor: Option<Point>,

    /// Start in this section instead of the first one.
    #[structopt(long)]
    pub section: Option<String>,

    /// Number of double clicks to simulate before resolving.
    #[structopt(long, default_value = "0")]
    pub switch: u32,

    /// Write the resolved tile to this PNG file.
    #[structopt(long)]
    pub extract: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl FromStr for Point {
    type Err = String;

    fn from_str(value: &str) -> Result<Point, Self::Err> {
        let mut parts = value.splitn(2, ',');

        let mut coordinate = || -> Result<f64, String> {
            parts
                .next()
                .map(str::trim)
                .ok_or_else(|| format!("Invalid point '{}', expected 'x,y'.", value))?
                .parse()
                .map_err(|_| format!("Invalid point '{}', expected 'x,y'.", value))
        };

        let x = coordinate()?;
        let y = coordinate()?;

        Ok(Point { x, y })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_points() {
        assert_eq!("3,4".parse::<Point>(), Ok(Point { x: 3.0, y: 4.0 }));
        assert_eq!(" -1.5 , 2 ".parse::<Point>(), Ok(Point { x: -1.5, y: 2.0 }));
        assert!("3".parse::<Point>().is_err());
        assert!("a,b".parse::<Point>().is_err());
    }

    #[test]
    fn optimize_flags() {
        let options = Options::from_iter_safe(&[
            "gazeatlas",
            "optimize",
            "--step",
            "45",
            "--max-width",
            "2048",
            "--tile-width",
            "256",
            "--angle-policy",
            "independent",
        ])
        .unwrap();

        let optimize = match options.command {
            Subcommand::Optimize(optimize) => optimize,
            other => panic!("parsed the wrong command: {:?}", other),
        };

        let mut config = Config::default();
        optimize.apply(&mut config);

        assert_eq!(config.step, 45);
        assert_eq!(config.max_width, 2048);
        assert_eq!(config.tile_width, Some(256));
        assert_eq!(config.angle_policy, AnglePolicy::Independent);
    }

    #[test]
    fn unset_flags_keep_config() {
        let mut config = Config::default();
        OptimizeOptions {
            step: None,
            max_width: None,
            tile_width: None,
            angle_policy: None,
        }
        .apply(&mut config);

        assert_eq!(config, Config::default());
    }

    #[test]
    fn all_splits_into_both_commands() {
        let options =
            Options::from_iter_safe(&["gazeatlas", "all", "--step", "90", "--force"]).unwrap();

        let (generate, optimize) = match options.command {
            Subcommand::All(all) => all.split(),
            other => panic!("parsed the wrong command: {:?}", other),
        };

        assert_eq!(generate.step, Some(90));
        assert!(generate.force);
        assert_eq!(optimize.step, Some(90));
    }

    #[test]
    fn resolve_pointer() {
        let options = Options::from_iter_safe(&[
            "gazeatlas",
            "resolve",
            "--pointer",
            "10,-20",
            "--anchor",
            "0,0",
            "--switch",
            "2",
        ])
        .unwrap();

        match options.command {
            Subcommand::Resolve(resolve) => {
                assert_eq!(resolve.pointer, Some(Point { x: 10.0, y: -20.0 }));
                assert_eq!(resolve.switch, 2);
                assert_eq!(resolve.angle, None);
            }
            other => panic!("parsed the wrong command: {:?}", other),
        }
    }
}
