mod angle;
mod commands;
mod config;
mod error;
mod frame_name;
mod frame_source;
mod frames;
mod image;
mod manifest;
mod options;
mod packer;
mod viewer;

#[cfg(test)]
mod test_util;

use std::process;

use structopt::StructOpt;

use crate::options::{Options, Subcommand};

fn main() {
    env_logger::init();

    let options = Options::from_args();

    match run(options) {
        Ok(_) => {}
        Err(err) => {
            eprintln!("Error: {:?}", err);
            process::exit(1);
        }
    }
}

fn run(options: Options) -> anyhow::Result<()> {
    match options.command {
        Subcommand::Generate(generate_options) => {
            commands::generate(options.global, generate_options)?
        }
        Subcommand::Optimize(optimize_options) => {
            commands::optimize(options.global, optimize_options)?
        }
        Subcommand::All(all_options) => commands::all(options.global, all_options)?,
        Subcommand::Resolve(resolve_options) => {
            commands::resolve(options.global, resolve_options)?
        }
    }

    Ok(())
}
