use crate::options::{AllOptions, GlobalOptions};

use super::{generate, optimize};

pub fn all(global: GlobalOptions, options: AllOptions) -> anyhow::Result<()> {
    let (generate_options, optimize_options) = options.split();

    generate(global.clone(), generate_options)?;
    optimize(global, optimize_options)?;

    Ok(())
}
