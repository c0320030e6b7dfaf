mod all;
mod generate;
mod optimize;
mod resolve;

pub use all::*;
pub use generate::*;
pub use optimize::*;
pub use resolve::*;

use std::env;

use crate::{config::Config, options::GlobalOptions};

/// Loads the project config from `--project`, or the current directory.
fn load_config(global: &GlobalOptions) -> anyhow::Result<Config> {
    let project_path = match &global.project {
        Some(path) => path.clone(),
        None => env::current_dir()?,
    };

    Ok(Config::load_from_folder(&project_path)?)
}
